//! Specialized collection types

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

pub use slotmap::{DefaultKey, SlotMap};

/// Handle-based map using slot map for stable references
pub type HandleMap<T> = SlotMap<DefaultKey, T>;

/// Handle type for stable references
pub type Handle = DefaultKey;

/// Typed handle for type-safe references into a [`HandleMap`]
///
/// The trait impls are written by hand so that `T` itself does not need to
/// be `Copy`, `Eq` or `Debug` for the handle to be.
pub struct TypedHandle<T> {
    key: DefaultKey,
    _phantom: PhantomData<fn() -> T>,
}

impl<T> TypedHandle<T> {
    /// Create a new typed handle from a key
    pub const fn new(key: DefaultKey) -> Self {
        Self {
            key,
            _phantom: PhantomData,
        }
    }

    /// Get the underlying key
    pub const fn key(&self) -> DefaultKey {
        self.key
    }
}

impl<T> Clone for TypedHandle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for TypedHandle<T> {}

impl<T> PartialEq for TypedHandle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl<T> Eq for TypedHandle<T> {}

impl<T> Hash for TypedHandle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl<T> fmt::Debug for TypedHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypedHandle").field(&self.key).finish()
    }
}

/// Insert into a [`HandleMap`] and wrap the key in a [`TypedHandle`]
pub fn insert_typed<T>(map: &mut HandleMap<T>, value: T) -> TypedHandle<T> {
    TypedHandle::new(map.insert(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NotCopy {
        name: String,
    }

    #[test]
    fn test_typed_handle_without_copy_payload() {
        let mut map: HandleMap<NotCopy> = HandleMap::new();
        let handle = insert_typed(&mut map, NotCopy { name: "Hangar".to_string() });
        let copy = handle;

        assert_eq!(handle, copy);
        assert_eq!(map[copy.key()].name, "Hangar");
    }

    #[test]
    fn test_removed_handle_is_stale() {
        let mut map: HandleMap<u32> = HandleMap::new();
        let first = insert_typed(&mut map, 1);
        map.remove(first.key());
        let second = insert_typed(&mut map, 2);

        assert_ne!(first, second);
        assert!(map.get(first.key()).is_none());
    }
}
