//! Load queue errors

use thiserror::Error;

/// Errors reported by a [`SceneHost`](super::SceneHost)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    /// The host does not know a scene by this name
    #[error("unknown scene: {0}")]
    UnknownScene(String),

    /// Backend-specific failure while starting a load
    #[error("scene backend error: {0}")]
    Backend(String),
}

/// Why a load request did not complete
///
/// Only hosts that report errors and configurations with timeouts produce
/// these; with the defaults a stuck scene stalls the queue instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// The host refused to start loading a scene
    #[error("host refused to load scene '{scene}': {source}")]
    Host {
        /// Scene identifier
        scene: String,
        /// Host-side error
        #[source]
        source: HostError,
    },

    /// Staging did not reach the activation threshold in time
    #[error("scene '{scene}' did not finish staging within {ticks} ticks")]
    StagingTimedOut {
        /// Scene identifier
        scene: String,
        /// Ticks waited
        ticks: u32,
    },

    /// No activation notice arrived for a triggered activation
    #[error("scene '{scene}' was not activated within {ticks} ticks")]
    ActivationTimedOut {
        /// Scene identifier
        scene: String,
        /// Ticks waited
        ticks: u32,
    },
}

impl LoadError {
    /// Identifier of the scene that failed
    pub fn scene(&self) -> &str {
        match self {
            Self::Host { scene, .. }
            | Self::StagingTimedOut { scene, .. }
            | Self::ActivationTimedOut { scene, .. } => scene,
        }
    }
}

/// A request could not be handed to the scheduler
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("load queue scheduler has shut down")]
pub struct SubmitError;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_host_error_is_source() {
        let error = LoadError::Host {
            scene: "Hangar".to_string(),
            source: HostError::UnknownScene("Hangar".to_string()),
        };

        assert_eq!(error.scene(), "Hangar");
        assert_eq!(error.source().map(ToString::to_string), Some("unknown scene: Hangar".to_string()));
    }

    #[test]
    fn test_timeout_messages() {
        let error = LoadError::StagingTimedOut { scene: "Hud".to_string(), ticks: 3 };
        assert_eq!(error.to_string(), "scene 'Hud' did not finish staging within 3 ticks");
        assert!(error.source().is_none());
    }
}
