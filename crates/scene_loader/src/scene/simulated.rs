//! In-memory scene host
//!
//! Behaves like an engine's staged loader without any content: scenes are
//! registered by name with a staging duration, staging progress stops at
//! `0.9` until activation is allowed, and the activation itself happens on
//! the host tick after it was allowed. Used for headless runs and tests.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use super::activation::{ActivationChannel, ActivationNotice, ActivationToken};
use super::error::HostError;
use super::host::{LoadMode, ObjectId, SceneHost, StagingOperation};
use crate::core::config::DEFAULT_ACTIVATION_THRESHOLD;
use crate::events::MessageRegistry;
use crate::foundation::collections::{insert_typed, HandleMap, TypedHandle};

/// Progress reported once content is staged but not yet activated
const STAGED_PROGRESS: f32 = DEFAULT_ACTIVATION_THRESHOLD;

/// Handle to a scene activated by a [`SimulatedHost`]
pub type SimulatedSceneHandle = TypedHandle<SimulatedScene>;

/// Called for every root object a scene spawns, so its owner can register handlers
pub type SpawnHook<P> = Box<dyn FnMut(&str, ObjectId, &mut MessageRegistry<P>)>;

/// A live scene
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulatedScene {
    name: String,
    mode: LoadMode,
    root_objects: Vec<ObjectId>,
    activated_on_tick: u64,
}

impl SimulatedScene {
    /// Scene name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Mode the scene was loaded with
    pub const fn mode(&self) -> LoadMode {
        self.mode
    }

    /// Root-level objects spawned by the scene
    pub fn root_objects(&self) -> &[ObjectId] {
        &self.root_objects
    }

    /// Host tick on which the scene became live
    pub const fn activated_on_tick(&self) -> u64 {
        self.activated_on_tick
    }
}

/// How a registered scene loads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneBlueprint {
    /// Host ticks until staging reaches `0.9`
    pub staging_ticks: u32,
    /// Root objects spawned on activation
    pub root_objects: usize,
}

impl SceneBlueprint {
    /// Create a blueprint
    pub const fn new(staging_ticks: u32, root_objects: usize) -> Self {
        Self {
            staging_ticks,
            root_objects,
        }
    }
}

/// Order in which one tick's activation notices are published
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NoticeOrder {
    /// Same order as the activations
    #[default]
    InOrder,
    /// Reverse order, as engines that batch activations may do
    Reversed,
}

#[derive(Debug)]
struct OperationState {
    identifier: String,
    mode: LoadMode,
    // None: the name never resolves and staging never progresses
    staging_ticks: Option<u32>,
    elapsed: u32,
    progress: f32,
    activation: Option<ActivationToken>,
}

impl OperationState {
    fn step(&mut self) {
        let Some(total) = self.staging_ticks else {
            return;
        };
        self.elapsed += 1;
        self.progress = if self.elapsed >= total {
            STAGED_PROGRESS
        } else {
            STAGED_PROGRESS * (self.elapsed as f32 / total as f32)
        };
    }
}

/// Staged load handed out by [`SimulatedHost::begin_load`]
#[derive(Debug)]
pub struct SimulatedOperation {
    state: Rc<RefCell<OperationState>>,
}

impl StagingOperation for SimulatedOperation {
    fn progress(&self) -> f32 {
        self.state.borrow().progress
    }

    fn allow_activation(&mut self, token: ActivationToken) {
        self.state.borrow_mut().activation = Some(token);
    }
}

/// In-memory [`SceneHost`]
pub struct SimulatedHost<P> {
    catalog: HashMap<String, SceneBlueprint>,
    strict_catalog: bool,
    notify_activations: bool,
    notice_order: NoticeOrder,
    operations: Vec<Rc<RefCell<OperationState>>>,
    unrelated: Vec<String>,
    scenes: HandleMap<SimulatedScene>,
    channel: ActivationChannel<SimulatedSceneHandle>,
    listeners: MessageRegistry<P>,
    spawn_hook: Option<SpawnHook<P>>,
    next_object: u64,
    tick: u64,
    staging_log: Vec<String>,
    activation_log: Vec<String>,
}

impl<P> SimulatedHost<P> {
    /// Create a host with an empty catalog and its own activation channel
    pub fn new() -> Self {
        Self {
            catalog: HashMap::new(),
            strict_catalog: false,
            notify_activations: true,
            notice_order: NoticeOrder::default(),
            operations: Vec::new(),
            unrelated: Vec::new(),
            scenes: HandleMap::new(),
            channel: ActivationChannel::new(),
            listeners: MessageRegistry::new(),
            spawn_hook: None,
            next_object: 1,
            tick: 0,
            staging_log: Vec::new(),
            activation_log: Vec::new(),
        }
    }

    /// Make `name` loadable
    pub fn register_scene(&mut self, name: impl Into<String>, blueprint: SceneBlueprint) -> &mut Self {
        self.catalog.insert(name.into(), blueprint);
        self
    }

    /// Refuse unknown names in `begin_load` instead of staging them forever
    pub fn set_strict_catalog(&mut self, strict: bool) -> &mut Self {
        self.strict_catalog = strict;
        self
    }

    /// Stop (or resume) publishing activation notices
    pub fn set_notify_activations(&mut self, notify: bool) -> &mut Self {
        self.notify_activations = notify;
        self
    }

    /// Order of notices published within one tick
    pub fn set_notice_order(&mut self, order: NoticeOrder) -> &mut Self {
        self.notice_order = order;
        self
    }

    /// Install the hook run for every spawned root object
    pub fn set_spawn_hook(&mut self, hook: SpawnHook<P>) -> &mut Self {
        self.spawn_hook = Some(hook);
        self
    }

    /// Activate `name` on the next tick without going through a loader
    ///
    /// Its notice carries no token, like scenes the engine loads on its own.
    pub fn activate_unrelated(&mut self, name: impl Into<String>) {
        self.unrelated.push(name.into());
    }

    /// Activation channel the host publishes on
    pub const fn channel(&self) -> &ActivationChannel<SimulatedSceneHandle> {
        &self.channel
    }

    /// Object message handlers
    pub fn listeners_mut(&mut self) -> &mut MessageRegistry<P> {
        &mut self.listeners
    }

    /// Host tick counter
    pub const fn current_tick(&self) -> u64 {
        self.tick
    }

    /// Scene names in the order staging began
    pub fn staging_log(&self) -> &[String] {
        &self.staging_log
    }

    /// Scene names in the order they became live
    pub fn activation_log(&self) -> &[String] {
        &self.activation_log
    }

    /// Number of live scenes
    pub fn loaded_scene_count(&self) -> usize {
        self.scenes.len()
    }

    /// Staged loads not yet activated
    pub fn in_flight(&self) -> usize {
        self.operations.len()
    }

    /// Look up a live scene
    pub fn scene(&self, handle: SimulatedSceneHandle) -> Option<&SimulatedScene> {
        self.scenes.get(handle.key())
    }

    /// Find a live scene by name
    pub fn scene_named(&self, name: &str) -> Option<SimulatedSceneHandle> {
        self.scenes
            .iter()
            .find(|(_, scene)| scene.name == name)
            .map(|(key, _)| TypedHandle::new(key))
    }

    /// Advance the host by one tick
    ///
    /// Steps staging, activates every allowed and staged operation, and
    /// publishes the resulting notices. Returns the number of activations.
    pub fn advance(&mut self) -> usize {
        self.tick += 1;
        let mut notices = Vec::new();

        for name in std::mem::take(&mut self.unrelated) {
            let scene = self.instantiate(&name, LoadMode::Additive);
            notices.push(ActivationNotice { token: None, scene });
        }

        for operation in std::mem::take(&mut self.operations) {
            let ready = {
                let mut state = operation.borrow_mut();
                if state.progress < STAGED_PROGRESS {
                    state.step();
                    None
                } else {
                    state.activation.map(|token| (token, state.identifier.clone(), state.mode))
                }
            };

            match ready {
                Some((token, identifier, mode)) => {
                    let scene = self.instantiate(&identifier, mode);
                    notices.push(ActivationNotice { token: Some(token), scene });
                }
                None => self.operations.push(operation),
            }
        }

        let activations = notices.len();
        if self.notice_order == NoticeOrder::Reversed {
            notices.reverse();
        }
        if self.notify_activations {
            for notice in &notices {
                self.channel.publish(notice);
            }
        }
        activations
    }

    fn instantiate(&mut self, name: &str, mode: LoadMode) -> SimulatedSceneHandle {
        let count = self.catalog.get(name).map_or(0, |blueprint| blueprint.root_objects);
        let root_objects: Vec<ObjectId> = (0..count)
            .map(|_| {
                let id = ObjectId(self.next_object);
                self.next_object += 1;
                id
            })
            .collect();

        if let Some(hook) = self.spawn_hook.as_mut() {
            for object in &root_objects {
                hook(name, *object, &mut self.listeners);
            }
        }

        log::debug!("Simulated host: '{name}' live on tick {}", self.tick);
        self.activation_log.push(name.to_string());
        insert_typed(
            &mut self.scenes,
            SimulatedScene {
                name: name.to_string(),
                mode,
                root_objects,
                activated_on_tick: self.tick,
            },
        )
    }
}

impl<P> SceneHost for SimulatedHost<P> {
    type Scene = SimulatedSceneHandle;
    type Operation = SimulatedOperation;
    type Payload = P;

    fn begin_load(&mut self, identifier: &str, mode: LoadMode) -> Result<Self::Operation, HostError> {
        let blueprint = self.catalog.get(identifier).copied();
        if blueprint.is_none() && self.strict_catalog {
            return Err(HostError::UnknownScene(identifier.to_string()));
        }

        self.staging_log.push(identifier.to_string());
        let staging_ticks = blueprint.map(|blueprint| blueprint.staging_ticks);
        let progress = if staging_ticks == Some(0) { STAGED_PROGRESS } else { 0.0 };
        let state = Rc::new(RefCell::new(OperationState {
            identifier: identifier.to_string(),
            mode,
            staging_ticks,
            elapsed: 0,
            progress,
            activation: None,
        }));
        self.operations.push(Rc::clone(&state));

        Ok(SimulatedOperation { state })
    }

    fn root_objects(&self, scene: &Self::Scene) -> Vec<ObjectId> {
        self.scene(*scene)
            .map(|scene| scene.root_objects.clone())
            .unwrap_or_default()
    }

    fn listeners(&mut self) -> &mut MessageRegistry<P> {
        &mut self.listeners
    }
}

impl<P> Default for SimulatedHost<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> fmt::Debug for SimulatedHost<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimulatedHost")
            .field("tick", &self.tick)
            .field("scenes", &self.scenes.len())
            .field("in_flight", &self.operations.len())
            .field("listeners", &self.listeners)
            .finish_non_exhaustive()
    }
}
