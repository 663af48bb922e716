//! # Scene Loader
//!
//! A sequential scene load queue for engines with a staged, additive scene
//! loading primitive.
//!
//! ## Features
//!
//! - **Strict Ordering**: Requests run in submission order, scenes in list order
//! - **Deferred Activation**: Each scene is fully staged before it goes live
//! - **Correlated Notices**: Activations are matched to the loader by token
//! - **Completion Messages**: Loaded scenes' root objects receive the request payload
//! - **Opt-in Timeouts**: Stalled scenes can fail their request instead of blocking
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use scene_loader::prelude::*;
//!
//! let mut host: SimulatedHost<String> = SimulatedHost::new();
//! host.register_scene("Hangar", SceneBlueprint::new(3, 2));
//!
//! let mut loader = LoadQueueScheduler::new(host.channel());
//! loader.submit(
//!     LoadRequest::with_payload("ready".to_string())
//!         .scene("Hangar")
//!         .on_completed(|request| log::info!("{} scene(s) live", request.scene_count())),
//! );
//!
//! loop {
//!     host.advance();
//!     if loader.tick(&mut host) == SchedulerState::Idle {
//!         break;
//!     }
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

// Core modules
pub mod core;
pub mod config;
pub mod foundation;

// Loader modules
pub mod events;
pub mod scene;

/// Common imports for loader users
pub mod prelude {
    pub use crate::{
        core::config::{ApplicationConfig, Config, ConfigError, LoaderConfig},
        events::{Message, MessageHandler, MessageKind, MessageRegistry},
        foundation::logging,
        scene::{
            simulated::{SceneBlueprint, SimulatedHost, SimulatedSceneHandle},
            ActivationChannel, ActivationToken, HostError, LoadError, LoadMode, LoadQueueScheduler,
            LoadRequest, ObjectId, RequestSender, SceneHost, SchedulerState, StagingOperation,
        },
    };
}
