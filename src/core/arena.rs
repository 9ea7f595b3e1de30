//! Generation-checked entity storage.
//!
//! Balls and walls are never removed mid-level, so an arena is an
//! append-only `Vec` plus a level generation. `clear()` bumps the
//! generation, which invalidates every handle issued before it: a ball id
//! kept from a previous level can never resolve to a ball of the new one.
//!
//! Handles carry no arena identity. Every new arena starts at generation 0,
//! so the first ball of two independent simulations gets the same handle;
//! that is what lets two runs of one replay compare equal. A handle is only
//! meaningful to the arena that issued it, and only `clear()` guarantees a
//! stale one is rejected.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use serde::{Serialize, Deserialize};

/// Stable handle into an [`Arena`]. Positional: equal handles from two
/// different arenas name unrelated entities.
#[derive(Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Handle<T> {
    index: u32,
    generation: u32,
    #[serde(skip)]
    _marker: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    const fn new(index: u32, generation: u32) -> Self {
        Self {
            index,
            generation,
            _marker: PhantomData,
        }
    }

    /// Position of the entity in creation order.
    #[inline]
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Level generation the handle was issued in.
    #[inline]
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

// Manual impls: derives would require `T: Clone` etc.
impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.generation == other.generation
    }
}

impl<T> Eq for Handle<T> {}

impl<T> PartialOrd for Handle<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Handle<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.generation
            .cmp(&other.generation)
            .then(self.index.cmp(&other.index))
    }
}

impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
        self.generation.hash(state);
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}@{}", self.index, self.generation)
    }
}

impl<T> fmt::Display for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index)
    }
}

/// Append-only storage with level generations.
#[derive(Clone, Debug)]
pub struct Arena<T> {
    items: Vec<T>,
    generation: u32,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Arena<T> {
    /// Empty arena at generation 0.
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            generation: 0,
        }
    }

    /// Insert an entity built from its own handle.
    pub fn insert_with(&mut self, build: impl FnOnce(Handle<T>) -> T) -> Handle<T> {
        let handle = Handle::new(self.items.len() as u32, self.generation);
        self.items.push(build(handle));
        handle
    }

    /// Look up an entity; `None` for stale or foreign handles.
    pub fn get(&self, handle: Handle<T>) -> Option<&T> {
        if handle.generation != self.generation {
            return None;
        }
        self.items.get(handle.index as usize)
    }

    /// Mutable lookup; `None` for stale or foreign handles.
    pub fn get_mut(&mut self, handle: Handle<T>) -> Option<&mut T> {
        if handle.generation != self.generation {
            return None;
        }
        self.items.get_mut(handle.index as usize)
    }

    /// Drop every entity and invalidate all outstanding handles.
    pub fn clear(&mut self) {
        self.items.clear();
        self.generation = self.generation.wrapping_add(1);
    }

    /// Current generation.
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Number of entities.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when no entity has been inserted this generation.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Entities in creation order.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    /// Mutable entities in creation order.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.items.iter_mut()
    }

    /// Entities as a slice, indexable by `Handle::index`.
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    /// Mutable slice, indexable by `Handle::index`.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Thing {
        id: Handle<Thing>,
        value: u8,
    }

    #[test]
    fn test_insert_and_get() {
        let mut arena = Arena::new();
        let a = arena.insert_with(|id| Thing { id, value: 1 });
        let b = arena.insert_with(|id| Thing { id, value: 2 });

        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
        assert_eq!(arena.get(b).map(|t| t.value), Some(2));
        assert_eq!(arena.get(a).map(|t| t.id), Some(a));
    }

    #[test]
    fn test_clear_invalidates_handles() {
        let mut arena = Arena::new();
        let old = arena.insert_with(|id| Thing { id, value: 1 });
        arena.clear();
        let new = arena.insert_with(|id| Thing { id, value: 9 });

        // Same slot, different generation: the old id must not alias.
        assert_eq!(old.index(), new.index());
        assert!(arena.get(old).is_none());
        assert!(arena.get_mut(old).is_none());
        assert_eq!(arena.get(new).map(|t| t.value), Some(9));
    }

    #[test]
    fn test_handle_serde_roundtrip() {
        let mut arena: Arena<Thing> = Arena::new();
        arena.clear();
        let handle = arena.insert_with(|id| Thing { id, value: 0 });

        let json = serde_json::to_string(&handle).unwrap();
        let decoded: Handle<Thing> = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, handle);
        assert_eq!(decoded.generation(), 1);
    }
}
