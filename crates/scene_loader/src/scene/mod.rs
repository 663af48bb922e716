//! Scene loading
//!
//! Sequential, additive scene loading on top of an engine's staged-load
//! primitive. Following Game Engine Architecture Chapter 7.5 - Streaming
//! and Chapter 15.7 - Loading and Streaming Game Worlds.
//!
//! ## Architecture
//!
//! ```text
//! caller --submit--> LoadQueueScheduler --begin_load/allow_activation--> SceneHost
//!                          ^                                                 |
//!                          +----------- ActivationChannel (notices) <--------+
//! ```
//!
//! The scheduler:
//! - Runs requests in submission order, one at a time
//! - Stages each scene of a request with activation deferred, in list order
//! - Matches activation notices to the activation it triggered by token
//! - Sends the request payload to the loaded scenes' root objects on completion

mod activation;
mod error;
mod host;
mod request;
mod scheduler;
pub mod simulated;

#[cfg(test)]
mod tests;

pub use activation::{
    ActivationChannel, ActivationNotice, ActivationSubscription, ActivationToken, SubscriptionId,
};
pub use error::{HostError, LoadError, SubmitError};
pub use host::{LoadMode, ObjectId, SceneHost, StagingOperation};
pub use request::{CompletionCallback, FailureCallback, LoadRequest, SceneLoadEntry};
pub use scheduler::{
    EntryPhase, HostRequest, LoadQueueScheduler, RequestSender, RunLoopId, SchedulerState, SchedulerStats,
};
