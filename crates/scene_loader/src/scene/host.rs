//! Host engine abstractions
//!
//! The loader never touches scene content itself. Everything it needs from
//! the engine goes through these traits: starting a staged load, asking for
//! a scene's root objects, and the object message registry.

use std::fmt;

use super::activation::ActivationToken;
use super::error::HostError;
use crate::events::MessageRegistry;

/// Identifier of a root-level object inside a loaded scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u64);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "object#{}", self.0)
    }
}

/// How a scene is combined with the scenes already live
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadMode {
    /// Replace the live scenes
    Single,
    /// Keep the live scenes and add the new one
    Additive,
}

/// An in-flight staged load
///
/// Created with activation deferred: content is prepared in memory but not
/// inserted into the live scene graph until [`allow_activation`] is called.
///
/// [`allow_activation`]: StagingOperation::allow_activation
pub trait StagingOperation {
    /// Staging progress in `[0, 1]`
    fn progress(&self) -> f32;

    /// Let the host activate the staged content on a later tick
    ///
    /// The host must echo `token` in the [`ActivationNotice`] it publishes
    /// for this activation.
    ///
    /// [`ActivationNotice`]: super::ActivationNotice
    fn allow_activation(&mut self, token: ActivationToken);
}

/// Scene staging service exposed by the engine
pub trait SceneHost {
    /// Handle to a live scene
    type Scene: Clone + fmt::Debug;
    /// Staged load returned by [`begin_load`](SceneHost::begin_load)
    type Operation: StagingOperation;
    /// Completion payload delivered to root objects
    type Payload;

    /// Start staging `identifier` with activation deferred
    fn begin_load(&mut self, identifier: &str, mode: LoadMode) -> Result<Self::Operation, HostError>;

    /// Root-level objects of a live scene
    fn root_objects(&self, scene: &Self::Scene) -> Vec<ObjectId>;

    /// Message handlers of the objects this host owns
    fn listeners(&mut self) -> &mut MessageRegistry<Self::Payload>;
}
