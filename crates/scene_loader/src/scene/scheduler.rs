//! Load Queue Scheduler
//!
//! Serializes scene load requests. Requests run strictly in submission order
//! and the scenes of a request strictly in list order: each scene is staged
//! with activation deferred, activated once staging reaches the configured
//! threshold, and recorded when the host confirms the activation. After the
//! last scene of a request is live, its payload is sent to the root objects
//! of every loaded scene and its completion callback runs.
//!
//! The run loop is a step function. The host calls [`tick`] once per frame;
//! each call advances as far as it can and returns at the next suspension
//! point (staging still in progress, or activation not yet confirmed).
//!
//! ```text
//! Idle --submit--> RunLoopActive --queue drained--> Idle
//!
//! per scene: Unstaged -> Staging -> ActivationPending -> Loaded
//! ```
//!
//! [`tick`]: LoadQueueScheduler::tick

use std::collections::VecDeque;
use std::fmt;

use crossbeam_channel::{unbounded, Receiver, Sender};

use super::activation::{ActivationChannel, ActivationNotice, ActivationSubscription, ActivationToken};
use super::error::{LoadError, SubmitError};
use super::host::{LoadMode, SceneHost, StagingOperation};
use super::request::LoadRequest;
use crate::config::ConfigError;
use crate::core::config::LoaderConfig;
use crate::events::MessageKind;

/// Request type accepted by a scheduler driving host `H`
pub type HostRequest<H> = LoadRequest<<H as SceneHost>::Scene, <H as SceneHost>::Payload>;

/// Identifies one run of the scheduler's run loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunLoopId(u64);

impl fmt::Display for RunLoopId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "run-loop#{}", self.0)
    }
}

/// Scheduler lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Nothing queued, no run loop
    Idle,
    /// A run loop is processing the queue
    RunLoopActive,
}

/// Progress of the scene currently being loaded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryPhase {
    /// Staging has not started
    Unstaged,
    /// Waiting for staging progress to reach the threshold
    Staging,
    /// Activation triggered, waiting for the host's notice
    ActivationPending,
    /// Scene is live and recorded
    Loaded,
}

/// Counters over the scheduler's lifetime
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    /// Run loops started
    pub run_loops: u64,
    /// Requests that completed
    pub completed: u64,
    /// Requests abandoned on a host error or timeout
    pub failed: u64,
    /// Scenes staged and activated
    pub scenes_loaded: u64,
    /// Activation notices that did not belong to this scheduler
    pub ignored_notices: u64,
}

/// Cloneable handle for submitting requests from outside the scheduler's borrow
///
/// Completion callbacks receive only the finished request, so follow-up
/// requests are submitted through one of these. Requests sent here are
/// picked up by the next [`tick`](LoadQueueScheduler::tick), or right after
/// the active request finishes when sent from its callback.
pub struct RequestSender<S, P> {
    sender: Sender<LoadRequest<S, P>>,
}

impl<S, P> RequestSender<S, P> {
    /// Queue a request
    pub fn submit(&self, request: LoadRequest<S, P>) -> Result<(), SubmitError> {
        self.sender.send(request).map_err(|_| SubmitError)
    }
}

impl<S, P> Clone for RequestSender<S, P> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<S, P> fmt::Debug for RequestSender<S, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestSender").finish_non_exhaustive()
    }
}

enum EntryStage<O> {
    Unstaged,
    Staging {
        operation: O,
        ticks_waited: u32,
    },
    ActivationPending {
        // Kept alive until the host confirms the activation
        _operation: O,
        token: ActivationToken,
        ticks_waited: u32,
    },
}

impl<O> EntryStage<O> {
    const fn phase(&self) -> EntryPhase {
        match self {
            Self::Unstaged => EntryPhase::Unstaged,
            Self::Staging { .. } => EntryPhase::Staging,
            Self::ActivationPending { .. } => EntryPhase::ActivationPending,
        }
    }

    const fn pending_token(&self) -> Option<ActivationToken> {
        match self {
            Self::ActivationPending { token, .. } => Some(*token),
            _ => None,
        }
    }
}

enum Advance {
    Suspended,
    Completed,
    Failed(LoadError),
}

struct ActiveRequest<H: SceneHost> {
    request: HostRequest<H>,
    cursor: usize,
    stage: EntryStage<H::Operation>,
    activated: Option<H::Scene>,
}

impl<H: SceneHost> ActiveRequest<H> {
    const fn new(request: HostRequest<H>) -> Self {
        Self {
            request,
            cursor: 0,
            stage: EntryStage::Unstaged,
            activated: None,
        }
    }

    fn current_identifier(&self) -> String {
        self.request
            .scenes()
            .get(self.cursor)
            .map(|entry| entry.scene_identifier().to_string())
            .unwrap_or_default()
    }

    /// Run the request until it suspends, completes or fails
    fn advance(&mut self, host: &mut H, config: &LoaderConfig) -> Advance {
        loop {
            if self.cursor >= self.request.scene_count() {
                return Advance::Completed;
            }

            match std::mem::replace(&mut self.stage, EntryStage::Unstaged) {
                EntryStage::Unstaged => {
                    let identifier = self.current_identifier();
                    log::debug!("Staging scene '{identifier}' (additive, activation deferred)");
                    match host.begin_load(&identifier, LoadMode::Additive) {
                        Ok(operation) => {
                            // Progress is checked in this same step
                            self.stage = EntryStage::Staging {
                                operation,
                                ticks_waited: 0,
                            };
                        }
                        Err(source) => {
                            return Advance::Failed(LoadError::Host {
                                scene: identifier,
                                source,
                            });
                        }
                    }
                }

                EntryStage::Staging {
                    mut operation,
                    ticks_waited,
                } => {
                    let progress = operation.progress();
                    if progress < config.activation_threshold {
                        if config.staging_timeout_ticks.is_some_and(|limit| ticks_waited >= limit) {
                            return Advance::Failed(LoadError::StagingTimedOut {
                                scene: self.current_identifier(),
                                ticks: ticks_waited,
                            });
                        }
                        log::trace!(
                            "Scene '{}' staging at {:.0}%",
                            self.current_identifier(),
                            progress * 100.0
                        );
                        self.stage = EntryStage::Staging {
                            operation,
                            ticks_waited: ticks_waited + 1,
                        };
                        return Advance::Suspended;
                    }

                    let token = ActivationToken::next();
                    log::debug!(
                        "Scene '{}' staged, allowing activation ({token})",
                        self.current_identifier()
                    );
                    operation.allow_activation(token);
                    self.activated = None;
                    self.stage = EntryStage::ActivationPending {
                        _operation: operation,
                        token,
                        ticks_waited: 1,
                    };
                    // The host activates on a later tick
                    return Advance::Suspended;
                }

                EntryStage::ActivationPending {
                    _operation,
                    token,
                    ticks_waited,
                } => {
                    if let Some(scene) = self.activated.take() {
                        log::debug!(
                            "Scene '{}' is live as {scene:?}",
                            self.current_identifier()
                        );
                        if let Some(entry) = self.request.entry_mut(self.cursor) {
                            entry.set_loaded(scene);
                        }
                        self.cursor += 1;
                        continue;
                    }

                    if config.activation_timeout_ticks.is_some_and(|limit| ticks_waited >= limit) {
                        return Advance::Failed(LoadError::ActivationTimedOut {
                            scene: self.current_identifier(),
                            ticks: ticks_waited,
                        });
                    }
                    self.stage = EntryStage::ActivationPending {
                        _operation,
                        token,
                        ticks_waited: ticks_waited + 1,
                    };
                    return Advance::Suspended;
                }
            }
        }
    }
}

/// Sequential scene load queue
pub struct LoadQueueScheduler<H: SceneHost> {
    config: LoaderConfig,
    pending: VecDeque<HostRequest<H>>,
    active: Option<ActiveRequest<H>>,
    run_loop: Option<RunLoopId>,
    next_run_loop: u64,
    subscription: Option<ActivationSubscription<H::Scene>>,
    inbox: Receiver<HostRequest<H>>,
    inbox_sender: Sender<HostRequest<H>>,
    stats: SchedulerStats,
}

impl<H: SceneHost> LoadQueueScheduler<H> {
    /// Create a scheduler with the default configuration
    ///
    /// Subscribes to `channel` immediately; the subscription lasts until the
    /// scheduler is shut down or dropped.
    pub fn new(channel: &ActivationChannel<H::Scene>) -> Self {
        Self::build(LoaderConfig::default(), channel)
    }

    /// Create a scheduler with a custom configuration
    pub fn with_config(config: LoaderConfig, channel: &ActivationChannel<H::Scene>) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config, channel))
    }

    fn build(config: LoaderConfig, channel: &ActivationChannel<H::Scene>) -> Self {
        let (inbox_sender, inbox) = unbounded();
        Self {
            config,
            pending: VecDeque::new(),
            active: None,
            run_loop: None,
            next_run_loop: 1,
            subscription: Some(channel.subscribe()),
            inbox,
            inbox_sender,
            stats: SchedulerStats::default(),
        }
    }

    /// Queue a request, starting a run loop if none is active
    ///
    /// Never blocks and never touches the host; work starts on the next tick.
    pub fn submit(&mut self, request: HostRequest<H>) {
        log::trace!("Queued load request with {} scene(s)", request.scene_count());
        self.pending.push_back(request);

        if self.run_loop.is_none() {
            let id = RunLoopId(self.next_run_loop);
            self.next_run_loop += 1;
            self.run_loop = Some(id);
            self.stats.run_loops += 1;
            log::info!("Starting load {id} ({} request(s) queued)", self.pending.len());
        }
    }

    /// Handle for submitting requests from callbacks or other systems
    pub fn sender(&self) -> RequestSender<H::Scene, H::Payload> {
        RequestSender {
            sender: self.inbox_sender.clone(),
        }
    }

    /// Advance the run loop by one host tick
    pub fn tick(&mut self, host: &mut H) -> SchedulerState {
        self.drain_inbox();
        self.collect_notices();

        let Some(run_loop) = self.run_loop else {
            return SchedulerState::Idle;
        };

        loop {
            let Some(active) = self.active.as_mut() else {
                // Follow-ups sent from callbacks join this run loop
                self.drain_inbox();
                match self.pending.pop_front() {
                    Some(request) => {
                        self.active = Some(ActiveRequest::new(request));
                        continue;
                    }
                    None => {
                        self.run_loop = None;
                        log::info!("Load {run_loop} finished, queue idle");
                        return SchedulerState::Idle;
                    }
                }
            };

            match active.advance(host, &self.config) {
                Advance::Suspended => return SchedulerState::RunLoopActive,
                Advance::Completed => self.complete_active(host),
                Advance::Failed(error) => self.fail_active(&error),
            }
        }
    }

    fn drain_inbox(&mut self) {
        while let Ok(request) = self.inbox.try_recv() {
            self.submit(request);
        }
    }

    /// Move this tick's activation notices to the request waiting on them
    fn collect_notices(&mut self) {
        let Some(subscription) = self.subscription.as_ref() else {
            return;
        };
        let expected = self.active.as_ref().and_then(|active| active.stage.pending_token());

        for ActivationNotice { token, scene } in subscription.drain() {
            match (token, expected, self.active.as_mut()) {
                (Some(token), Some(expected), Some(active)) if token == expected => {
                    active.activated = Some(scene);
                }
                _ => {
                    log::debug!("Ignoring activation notice for {scene:?} (token {token:?})");
                    self.stats.ignored_notices += 1;
                }
            }
        }
    }

    fn complete_active(&mut self, host: &mut H) {
        let Some(active) = self.active.take() else {
            return;
        };
        let mut request = active.request;
        self.stats.completed += 1;
        self.stats.scenes_loaded += request.scene_count() as u64;

        if let Some(payload) = request.completion_payload() {
            let objects: Vec<_> = request
                .loaded_scenes()
                .flat_map(|scene| host.root_objects(scene))
                .collect();
            let reached = host
                .listeners()
                .broadcast(&objects, MessageKind::LoadRequestCompleted, payload);
            log::debug!(
                "Sent {} to {reached} of {} root object(s)",
                MessageKind::LoadRequestCompleted,
                objects.len()
            );
        }

        log::info!("Load request with {} scene(s) completed", request.scene_count());
        if let Some(callback) = request.take_on_completed() {
            callback(&request);
        }
    }

    fn fail_active(&mut self, error: &LoadError) {
        let Some(active) = self.active.take() else {
            return;
        };
        let mut request = active.request;
        self.stats.failed += 1;
        self.stats.scenes_loaded += request.loaded_scenes().count() as u64;

        log::warn!("Abandoning load request: {error}");
        if let Some(callback) = request.take_on_failed() {
            callback(&request, error);
        }
    }

    /// Current lifecycle state
    pub const fn state(&self) -> SchedulerState {
        if self.run_loop.is_some() {
            SchedulerState::RunLoopActive
        } else {
            SchedulerState::Idle
        }
    }

    /// Whether no run loop is active
    pub const fn is_idle(&self) -> bool {
        self.run_loop.is_none()
    }

    /// Identifier of the active run loop
    pub const fn run_loop_id(&self) -> Option<RunLoopId> {
        self.run_loop
    }

    /// Requests waiting behind the active one
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// The request being processed
    pub fn active_request(&self) -> Option<&HostRequest<H>> {
        self.active.as_ref().map(|active| &active.request)
    }

    /// Index and phase of the scene being processed
    pub fn active_entry(&self) -> Option<(usize, EntryPhase)> {
        self.active.as_ref().map(|active| {
            let phase = if active.cursor >= active.request.scene_count() {
                EntryPhase::Loaded
            } else {
                active.stage.phase()
            };
            (active.cursor, phase)
        })
    }

    /// Lifetime counters
    pub const fn stats(&self) -> SchedulerStats {
        self.stats
    }

    /// Loader configuration
    pub const fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Stop the run loop and detach from the activation channel
    ///
    /// Queued and in-flight requests are dropped without running their
    /// callbacks. Returns how many requests were dropped.
    pub fn shutdown(mut self) -> usize {
        self.teardown()
    }

    fn teardown(&mut self) -> usize {
        let dropped = self.pending.len()
            + usize::from(self.active.is_some())
            + self.inbox.try_iter().count();
        if dropped > 0 {
            log::warn!("Load queue torn down with {dropped} unfinished request(s)");
        }

        self.pending.clear();
        self.active = None;
        self.run_loop = None;
        self.subscription = None;
        dropped
    }
}

impl<H: SceneHost> Drop for LoadQueueScheduler<H> {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl<H: SceneHost> fmt::Debug for LoadQueueScheduler<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadQueueScheduler")
            .field("state", &self.state())
            .field("run_loop", &self.run_loop)
            .field("pending", &self.pending.len())
            .field("active_entry", &self.active_entry())
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}
