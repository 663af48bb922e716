//! Load requests
//!
//! A [`LoadRequest`] is an ordered list of scenes to load additively, plus an
//! optional payload for the loaded scenes' root objects and optional
//! callbacks. It is built by the caller, moved into the scheduler on submit,
//! filled in as its scenes activate, and dropped after its callback ran.

use std::fmt;

use super::error::LoadError;

/// Invoked once after every scene of the request is live
pub type CompletionCallback<S, P> = Box<dyn FnOnce(&LoadRequest<S, P>)>;

/// Invoked once when the request is abandoned
pub type FailureCallback<S, P> = Box<dyn FnOnce(&LoadRequest<S, P>, &LoadError)>;

/// One scene of a load request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneLoadEntry<S> {
    scene_identifier: String,
    loaded_scene: Option<S>,
}

impl<S> SceneLoadEntry<S> {
    fn new(scene_identifier: String) -> Self {
        Self {
            scene_identifier,
            loaded_scene: None,
        }
    }

    /// Name of the scene to load
    pub fn scene_identifier(&self) -> &str {
        &self.scene_identifier
    }

    /// Handle of the live scene, once staged and activated
    pub const fn loaded_scene(&self) -> Option<&S> {
        self.loaded_scene.as_ref()
    }

    /// Whether this entry's scene has been activated
    pub const fn is_loaded(&self) -> bool {
        self.loaded_scene.is_some()
    }

    pub(crate) fn set_loaded(&mut self, scene: S) {
        self.loaded_scene = Some(scene);
    }
}

/// An ordered batch of scenes to load, one after another
pub struct LoadRequest<S, P> {
    scenes: Vec<SceneLoadEntry<S>>,
    completion_payload: Option<P>,
    on_completed: Option<CompletionCallback<S, P>>,
    on_failed: Option<FailureCallback<S, P>>,
}

impl<S, P> LoadRequest<S, P> {
    /// Create an empty request without a payload
    pub fn new() -> Self {
        Self {
            scenes: Vec::new(),
            completion_payload: None,
            on_completed: None,
            on_failed: None,
        }
    }

    /// Create an empty request whose payload is sent to the loaded scenes' root objects
    pub fn with_payload(payload: P) -> Self {
        Self {
            scenes: Vec::new(),
            completion_payload: Some(payload),
            on_completed: None,
            on_failed: None,
        }
    }

    /// Append a scene; scenes load in the order they were added
    pub fn add_scene(&mut self, scene_identifier: impl Into<String>) -> &mut Self {
        self.scenes.push(SceneLoadEntry::new(scene_identifier.into()));
        self
    }

    /// Builder form of [`add_scene`](Self::add_scene)
    #[must_use]
    pub fn scene(mut self, scene_identifier: impl Into<String>) -> Self {
        self.add_scene(scene_identifier);
        self
    }

    /// Set the completion callback
    #[must_use]
    pub fn on_completed(mut self, callback: impl FnOnce(&Self) + 'static) -> Self {
        self.on_completed = Some(Box::new(callback));
        self
    }

    /// Set the failure callback
    ///
    /// Only fires for host errors and configured timeouts.
    #[must_use]
    pub fn on_failed(mut self, callback: impl FnOnce(&Self, &LoadError) + 'static) -> Self {
        self.on_failed = Some(Box::new(callback));
        self
    }

    /// Scenes in load order
    pub fn scenes(&self) -> &[SceneLoadEntry<S>] {
        &self.scenes
    }

    /// Number of scenes in the request
    pub fn scene_count(&self) -> usize {
        self.scenes.len()
    }

    /// Payload for the loaded scenes' root objects
    pub const fn completion_payload(&self) -> Option<&P> {
        self.completion_payload.as_ref()
    }

    /// Handles of the scenes activated so far, in load order
    pub fn loaded_scenes(&self) -> impl Iterator<Item = &S> {
        self.scenes.iter().filter_map(SceneLoadEntry::loaded_scene)
    }

    /// Whether every scene has been activated
    pub fn is_complete(&self) -> bool {
        self.scenes.iter().all(SceneLoadEntry::is_loaded)
    }

    pub(crate) fn entry_mut(&mut self, index: usize) -> Option<&mut SceneLoadEntry<S>> {
        self.scenes.get_mut(index)
    }

    pub(crate) fn take_on_completed(&mut self) -> Option<CompletionCallback<S, P>> {
        self.on_completed.take()
    }

    pub(crate) fn take_on_failed(&mut self) -> Option<FailureCallback<S, P>> {
        self.on_failed.take()
    }
}

impl<S, P> Default for LoadRequest<S, P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: fmt::Debug, P: fmt::Debug> fmt::Debug for LoadRequest<S, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadRequest")
            .field("scenes", &self.scenes)
            .field("completion_payload", &self.completion_payload)
            .field("on_completed", &self.on_completed.is_some())
            .field("on_failed", &self.on_failed.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scenes_keep_insertion_order() {
        let mut request: LoadRequest<u32, ()> = LoadRequest::new();
        request.add_scene("Hangar").add_scene("Asteroids");
        let request = request.scene("Hud");

        let names: Vec<&str> = request.scenes().iter().map(SceneLoadEntry::scene_identifier).collect();
        assert_eq!(names, vec!["Hangar", "Asteroids", "Hud"]);
        assert_eq!(request.scene_count(), 3);
        assert!(request.completion_payload().is_none());
    }

    #[test]
    fn test_completion_tracks_entries() {
        let mut request: LoadRequest<u32, &str> = LoadRequest::with_payload("X").scene("A").scene("B");
        assert!(!request.is_complete());

        if let Some(entry) = request.entry_mut(0) {
            entry.set_loaded(10);
        }
        assert!(!request.is_complete());
        assert_eq!(request.loaded_scenes().copied().collect::<Vec<_>>(), vec![10]);

        if let Some(entry) = request.entry_mut(1) {
            entry.set_loaded(11);
        }
        assert!(request.is_complete());
        assert_eq!(request.completion_payload(), Some(&"X"));
    }

    #[test]
    fn test_empty_request_is_complete() {
        let request: LoadRequest<u32, ()> = LoadRequest::default();
        assert!(request.is_complete());
        assert_eq!(request.loaded_scenes().count(), 0);
    }

    #[test]
    fn test_callbacks_are_taken_once() {
        let mut request: LoadRequest<u32, ()> = LoadRequest::new()
            .on_completed(|_| {})
            .on_failed(|_, _| {});

        assert!(request.take_on_completed().is_some());
        assert!(request.take_on_completed().is_none());
        assert!(request.take_on_failed().is_some());
        assert!(format!("{request:?}").contains("on_completed: false"));
    }
}
