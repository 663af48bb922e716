//! Object messaging following Game Engine Architecture Ch 16.8
//! Key principles:
//! - Typed payloads (no boxing, no string lookup at the call site)
//! - Registration system (only objects that registered a handler are notified)
//! - Objects without a handler are skipped, and the sender can tell

use std::collections::HashMap;
use std::fmt;

use crate::scene::ObjectId;

/// Messages the loader sends to scene objects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// Every scene of a load request has been activated
    LoadRequestCompleted,
}

impl MessageKind {
    /// Engine-facing message name
    pub const fn name(self) -> &'static str {
        match self {
            Self::LoadRequestCompleted => "OnLoadRequestCompleted",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Message delivered to a single object
#[derive(Debug)]
pub struct Message<'a, P> {
    /// Which message this is
    pub kind: MessageKind,
    /// Receiving object
    pub target: ObjectId,
    /// Payload supplied by the sender
    pub payload: &'a P,
}

/// Message handler trait
pub trait MessageHandler<P> {
    /// Handle a message addressed to an object this handler is registered on
    fn on_message(&mut self, message: &Message<'_, P>);
}

impl<P, F> MessageHandler<P> for F
where
    F: FnMut(&Message<'_, P>),
{
    fn on_message(&mut self, message: &Message<'_, P>) {
        self(message);
    }
}

/// Registry of per-object message handlers
///
/// Owned by whatever module owns the scene objects; the loader only sends.
pub struct MessageRegistry<P> {
    handlers: HashMap<(ObjectId, MessageKind), Vec<Box<dyn MessageHandler<P>>>>,
    delivered: u64,
}

impl<P> MessageRegistry<P> {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
            delivered: 0,
        }
    }

    /// Register a handler for `kind` on `object`
    ///
    /// An object may carry several handlers for the same message; all of them
    /// run, in registration order.
    pub fn register(&mut self, object: ObjectId, kind: MessageKind, handler: Box<dyn MessageHandler<P>>) {
        self.handlers.entry((object, kind)).or_default().push(handler);
    }

    /// Drop every handler attached to `object`, returning how many were removed
    pub fn unregister_object(&mut self, object: ObjectId) -> usize {
        let mut removed = 0;
        self.handlers.retain(|(owner, _), handlers| {
            if *owner == object {
                removed += handlers.len();
                false
            } else {
                true
            }
        });
        removed
    }

    /// Whether `object` has at least one handler for `kind`
    pub fn has_handler(&self, object: ObjectId, kind: MessageKind) -> bool {
        self.handlers.contains_key(&(object, kind))
    }

    /// Total number of registered handlers
    pub fn handler_count(&self) -> usize {
        self.handlers.values().map(Vec::len).sum()
    }

    /// Number of messages delivered since creation
    pub const fn delivered_count(&self) -> u64 {
        self.delivered
    }

    /// Send a message to one object
    ///
    /// Returns `false` when the object has no handler for `kind`.
    pub fn send(&mut self, object: ObjectId, kind: MessageKind, payload: &P) -> bool {
        let Some(handlers) = self.handlers.get_mut(&(object, kind)) else {
            log::trace!("{object:?} has no {kind} handler, skipping");
            return false;
        };

        let message = Message {
            kind,
            target: object,
            payload,
        };
        for handler in handlers.iter_mut() {
            handler.on_message(&message);
        }
        self.delivered += 1;
        true
    }

    /// Send the same message to several objects
    ///
    /// Returns the number of objects that had a handler.
    pub fn broadcast(&mut self, objects: &[ObjectId], kind: MessageKind, payload: &P) -> usize {
        objects
            .iter()
            .filter(|object| self.send(**object, kind, payload))
            .count()
    }
}

impl<P> Default for MessageRegistry<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> fmt::Debug for MessageRegistry<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageRegistry")
            .field("handlers", &self.handler_count())
            .field("delivered", &self.delivered)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct RecordingHandler {
        received: Rc<RefCell<Vec<(ObjectId, String)>>>,
    }

    impl MessageHandler<String> for RecordingHandler {
        fn on_message(&mut self, message: &Message<'_, String>) {
            self.received
                .borrow_mut()
                .push((message.target, message.payload.clone()));
        }
    }

    #[test]
    fn test_message_name() {
        assert_eq!(MessageKind::LoadRequestCompleted.name(), "OnLoadRequestCompleted");
        assert_eq!(MessageKind::LoadRequestCompleted.to_string(), "OnLoadRequestCompleted");
    }

    #[test]
    fn test_send_to_registered_object() {
        let received = Rc::new(RefCell::new(Vec::new()));
        let mut registry: MessageRegistry<String> = MessageRegistry::new();
        registry.register(
            ObjectId(7),
            MessageKind::LoadRequestCompleted,
            Box::new(RecordingHandler { received: Rc::clone(&received) }),
        );

        let delivered = registry.send(ObjectId(7), MessageKind::LoadRequestCompleted, &"X".to_string());

        assert!(delivered);
        assert_eq!(*received.borrow(), vec![(ObjectId(7), "X".to_string())]);
        assert_eq!(registry.delivered_count(), 1);
    }

    #[test]
    fn test_objects_without_handler_are_skipped() {
        let received = Rc::new(RefCell::new(Vec::new()));
        let mut registry: MessageRegistry<String> = MessageRegistry::new();
        registry.register(
            ObjectId(2),
            MessageKind::LoadRequestCompleted,
            Box::new(RecordingHandler { received: Rc::clone(&received) }),
        );

        let objects = [ObjectId(1), ObjectId(2), ObjectId(3)];
        let reached = registry.broadcast(&objects, MessageKind::LoadRequestCompleted, &"payload".to_string());

        assert_eq!(reached, 1);
        assert_eq!(received.borrow().len(), 1);
        assert!(!registry.send(ObjectId(3), MessageKind::LoadRequestCompleted, &String::new()));
    }

    #[test]
    fn test_closure_handlers_run_in_order() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let mut registry: MessageRegistry<u32> = MessageRegistry::new();
        for tag in ["first", "second"] {
            let order = Rc::clone(&order);
            registry.register(
                ObjectId(1),
                MessageKind::LoadRequestCompleted,
                Box::new(move |message: &Message<'_, u32>| {
                    order.borrow_mut().push(format!("{tag}:{}", message.payload));
                }),
            );
        }

        registry.send(ObjectId(1), MessageKind::LoadRequestCompleted, &5);

        assert_eq!(*order.borrow(), vec!["first:5".to_string(), "second:5".to_string()]);
        assert_eq!(registry.handler_count(), 2);
    }

    #[test]
    fn test_unregister_object() {
        let mut registry: MessageRegistry<()> = MessageRegistry::new();
        registry.register(ObjectId(1), MessageKind::LoadRequestCompleted, Box::new(|_: &Message<'_, ()>| {}));
        registry.register(ObjectId(2), MessageKind::LoadRequestCompleted, Box::new(|_: &Message<'_, ()>| {}));

        assert_eq!(registry.unregister_object(ObjectId(1)), 1);
        assert!(!registry.has_handler(ObjectId(1), MessageKind::LoadRequestCompleted));
        assert!(registry.has_handler(ObjectId(2), MessageKind::LoadRequestCompleted));
    }
}
