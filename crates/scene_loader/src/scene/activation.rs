//! Scene activation notifications
//!
//! The engine announces every scene it activates on an [`ActivationChannel`].
//! Activations triggered by the loader carry the [`ActivationToken`] the
//! loader handed to [`StagingOperation::allow_activation`], so a notice can
//! be matched to the exact activation that caused it no matter how the host
//! batches or orders them within a tick.
//!
//! [`StagingOperation::allow_activation`]: super::StagingOperation::allow_activation

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crossbeam_channel::{unbounded, Receiver, Sender};

static NEXT_TOKEN: AtomicU64 = AtomicU64::new(1);

/// Correlates one triggered activation with its notice
///
/// Tokens are unique for the lifetime of the process, so several schedulers
/// can share one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActivationToken(u64);

impl ActivationToken {
    /// Allocate a fresh token
    pub fn next() -> Self {
        Self(NEXT_TOKEN.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw token value
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ActivationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "activation#{}", self.0)
    }
}

/// A scene became live
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivationNotice<S> {
    /// Token of the activation request, `None` for activations the loader did not trigger
    pub token: Option<ActivationToken>,
    /// The newly activated scene
    pub scene: S,
}

/// Identifies one subscriber of an [`ActivationChannel`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct ChannelInner<S> {
    next_id: u64,
    subscribers: HashMap<SubscriptionId, Sender<ActivationNotice<S>>>,
}

/// Process-wide scene activation bus
///
/// Cloning yields another handle to the same bus.
pub struct ActivationChannel<S> {
    inner: Arc<Mutex<ChannelInner<S>>>,
}

impl<S> ActivationChannel<S> {
    /// Create a bus with no subscribers
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(ChannelInner {
                next_id: 1,
                subscribers: HashMap::new(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ChannelInner<S>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start receiving notices
    ///
    /// The subscription detaches itself when dropped.
    pub fn subscribe(&self) -> ActivationSubscription<S> {
        let (sender, receiver) = unbounded();
        let mut inner = self.lock();
        let id = SubscriptionId(inner.next_id);
        inner.next_id += 1;
        inner.subscribers.insert(id, sender);
        log::debug!("Activation channel: subscriber {} attached", id.0);

        ActivationSubscription {
            id,
            receiver,
            channel: self.clone(),
        }
    }

    /// Detach a subscriber, returning whether it was attached
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let removed = self.lock().subscribers.remove(&id).is_some();
        if removed {
            log::debug!("Activation channel: subscriber {} detached", id.0);
        }
        removed
    }

    /// Number of attached subscribers
    pub fn subscriber_count(&self) -> usize {
        self.lock().subscribers.len()
    }
}

impl<S: Clone> ActivationChannel<S> {
    /// Deliver a notice to every subscriber, returning how many received it
    pub fn publish(&self, notice: &ActivationNotice<S>) -> usize {
        let mut inner = self.lock();
        let mut delivered = 0;
        inner.subscribers.retain(|id, sender| {
            if sender.send(notice.clone()).is_ok() {
                delivered += 1;
                true
            } else {
                log::debug!("Activation channel: dropping disconnected subscriber {}", id.0);
                false
            }
        });
        delivered
    }
}

impl<S> Clone for ActivationChannel<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S> Default for ActivationChannel<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> fmt::Debug for ActivationChannel<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActivationChannel")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// Receiving end of an [`ActivationChannel`]
pub struct ActivationSubscription<S> {
    id: SubscriptionId,
    receiver: Receiver<ActivationNotice<S>>,
    channel: ActivationChannel<S>,
}

impl<S> ActivationSubscription<S> {
    /// This subscription's identifier
    pub const fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Take every notice received so far, oldest first
    pub fn drain(&self) -> Vec<ActivationNotice<S>> {
        self.receiver.try_iter().collect()
    }
}

impl<S> Drop for ActivationSubscription<S> {
    fn drop(&mut self) {
        self.channel.unsubscribe(self.id);
    }
}

impl<S> fmt::Debug for ActivationSubscription<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActivationSubscription")
            .field("id", &self.id)
            .field("queued", &self.receiver.len())
            .finish()
    }
}
