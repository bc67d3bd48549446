//! Generational actor ids
//!
//! Actors refer to each other (current target, nearest enemy, victim) through
//! [`ActorId`]s instead of pointers. Every slot in the [`ActorRegistry`]
//! carries a generation that is bumped when the actor is removed, so a stale
//! id simply stops resolving.

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A generational reference to an actor
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActorId {
    index: u32,
    generation: u32,
}

impl ActorId {
    /// Create an id from raw parts
    #[inline]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Slot index
    #[inline]
    pub const fn index(&self) -> u32 {
        self.index
    }

    /// Slot generation
    #[inline]
    pub const fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ActorId({}v{})", self.index, self.generation)
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

/// Slot storage for actors with stable registration order
///
/// Iteration always follows the order in which actors were inserted, which
/// is the order the world ticks them in.
pub struct ActorRegistry<T> {
    /// Current generation for each slot
    generations: Vec<u32>,
    /// Slot contents; `None` for free slots and for checked-out actors
    values: Vec<Option<T>>,
    /// Indices available for reuse
    free_list: Vec<u32>,
    /// Live ids in registration order
    order: Vec<ActorId>,
}

impl<T> ActorRegistry<T> {
    /// Maximum number of slots
    pub const MAX_SLOTS: usize = u32::MAX as usize;

    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            generations: Vec::new(),
            values: Vec::new(),
            free_list: Vec::new(),
            order: Vec::new(),
        }
    }

    /// Rebuild an empty registry with a saved slot layout.
    ///
    /// Used when loading: actors are then put back with [`insert_at`](Self::insert_at)
    /// so ids written into the save stay valid.
    pub fn with_layout(generations: Vec<u32>, mut free_list: Vec<u32>) -> Self {
        free_list.retain(|&i| (i as usize) < generations.len());
        let mut values = Vec::with_capacity(generations.len());
        values.resize_with(generations.len(), || None);
        Self {
            generations,
            values,
            free_list,
            order: Vec::new(),
        }
    }

    /// Insert an actor and return its id
    pub fn insert(&mut self, value: T) -> Result<ActorId> {
        let id = if let Some(index) = self.free_list.pop() {
            ActorId::new(index, self.generations[index as usize])
        } else {
            if self.generations.len() >= Self::MAX_SLOTS {
                return Err(CoreError::RegistryExhausted);
            }
            self.generations.push(0);
            self.values.push(None);
            ActorId::new((self.generations.len() - 1) as u32, 0)
        };

        self.values[id.index as usize] = Some(value);
        self.order.push(id);
        Ok(id)
    }

    /// Put an actor back into the exact slot named by `id`
    ///
    /// The slot must exist in the layout the registry was built with.
    pub fn insert_at(&mut self, id: ActorId, value: T) -> Result<()> {
        let index = id.index as usize;
        if index >= self.generations.len() {
            return Err(CoreError::SlotOutOfRange(id));
        }
        if self.values[index].is_some() || self.order.contains(&id) {
            return Err(CoreError::SlotOccupied(id));
        }

        self.generations[index] = id.generation;
        self.free_list.retain(|&i| i != id.index);
        self.values[index] = Some(value);
        self.order.push(id);
        Ok(())
    }

    /// Remove an actor, invalidating every copy of its id
    pub fn remove(&mut self, id: ActorId) -> Option<T> {
        if !self.contains(id) {
            return None;
        }

        let index = id.index as usize;
        self.generations[index] = self.generations[index].wrapping_add(1);
        self.free_list.push(id.index);
        self.order.retain(|&other| other != id);
        self.values[index].take()
    }

    /// Check whether `id` names a registered actor
    pub fn contains(&self, id: ActorId) -> bool {
        self.generations
            .get(id.index as usize)
            .map(|&gen| gen == id.generation)
            .unwrap_or(false)
            && self.order.contains(&id)
    }

    /// Resolve an id
    pub fn get(&self, id: ActorId) -> Option<&T> {
        if self.generations.get(id.index as usize) != Some(&id.generation) {
            return None;
        }
        self.values.get(id.index as usize)?.as_ref()
    }

    /// Resolve an id mutably
    pub fn get_mut(&mut self, id: ActorId) -> Option<&mut T> {
        if self.generations.get(id.index as usize) != Some(&id.generation) {
            return None;
        }
        self.values.get_mut(id.index as usize)?.as_mut()
    }

    /// Check an actor out of its slot without freeing it.
    ///
    /// While checked out the id does not resolve; [`restore`](Self::restore)
    /// puts it back. The world uses this to tick one actor mutably while
    /// reading the others.
    pub fn take(&mut self, id: ActorId) -> Option<T> {
        if self.generations.get(id.index as usize) != Some(&id.generation) {
            return None;
        }
        self.values.get_mut(id.index as usize)?.take()
    }

    /// Return a checked-out actor
    pub fn restore(&mut self, id: ActorId, value: T) {
        if self.generations.get(id.index as usize) == Some(&id.generation) {
            self.values[id.index as usize] = Some(value);
        }
    }

    /// Live ids in registration order
    pub fn ids(&self) -> &[ActorId] {
        &self.order
    }

    /// Number of registered actors
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Slot generations, for saving
    pub fn generations(&self) -> &[u32] {
        &self.generations
    }

    /// Free slot indices, for saving
    pub fn free_list(&self) -> &[u32] {
        &self.free_list
    }

    /// Iterate in registration order, skipping checked-out actors
    pub fn iter(&self) -> impl Iterator<Item = (ActorId, &T)> {
        self.order
            .iter()
            .filter_map(move |&id| self.values[id.index as usize].as_ref().map(|v| (id, v)))
    }

    /// Iterate mutably in registration order, skipping checked-out actors
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (ActorId, &mut T)> {
        let mut slots: Vec<Option<&mut T>> = self.values.iter_mut().map(Option::as_mut).collect();
        self.order
            .iter()
            .filter_map(move |&id| slots[id.index as usize].take().map(|v| (id, v)))
    }
}

impl<T> Default for ActorRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_remove() {
        let mut reg: ActorRegistry<&str> = ActorRegistry::new();
        let a = reg.insert("a").unwrap();
        let b = reg.insert("b").unwrap();

        assert_eq!(reg.get(a), Some(&"a"));
        assert_eq!(reg.len(), 2);

        assert_eq!(reg.remove(a), Some("a"));
        assert_eq!(reg.get(a), None);
        assert!(!reg.contains(a));
        assert!(reg.contains(b));

        // Reused slot gets a new generation
        let c = reg.insert("c").unwrap();
        assert_eq!(c.index(), a.index());
        assert_ne!(c.generation(), a.generation());
        assert_eq!(reg.get(a), None);
    }

    #[test]
    fn test_registration_order() {
        let mut reg = ActorRegistry::new();
        let a = reg.insert(1).unwrap();
        let b = reg.insert(2).unwrap();
        let c = reg.insert(3).unwrap();
        reg.remove(b);
        let d = reg.insert(4).unwrap();

        assert_eq!(reg.ids(), &[a, c, d]);
        let values: Vec<i32> = reg.iter().map(|(_, v)| *v).collect();
        assert_eq!(values, vec![1, 3, 4]);

        // d reused b's slot but still comes last
        assert_eq!(d.index(), b.index());
        let ids: Vec<ActorId> = reg.iter_mut().map(|(id, v)| {
            *v *= 10;
            id
        }).collect();
        assert_eq!(ids, vec![a, c, d]);
        assert_eq!(reg.get(d), Some(&40));
    }

    #[test]
    fn test_take_and_restore() {
        let mut reg = ActorRegistry::new();
        let a = reg.insert(String::from("hero")).unwrap();

        let hero = reg.take(a).unwrap();
        assert!(reg.get(a).is_none());
        assert_eq!(reg.len(), 1);

        reg.restore(a, hero);
        assert_eq!(reg.get(a).map(String::as_str), Some("hero"));
    }

    #[test]
    fn test_layout_restore() {
        let mut reg = ActorRegistry::new();
        let a = reg.insert('a').unwrap();
        let b = reg.insert('b').unwrap();
        reg.remove(a);
        let a2 = reg.insert('x').unwrap();

        let mut loaded = ActorRegistry::with_layout(
            reg.generations().to_vec(),
            reg.free_list().to_vec(),
        );
        loaded.insert_at(b, 'b').unwrap();
        loaded.insert_at(a2, 'x').unwrap();

        assert_eq!(loaded.get(b), Some(&'b'));
        assert_eq!(loaded.get(a2), Some(&'x'));
        assert_eq!(loaded.get(a), None);
        assert_eq!(loaded.insert_at(b, 'y'), Err(CoreError::SlotOccupied(b)));
    }

    #[test]
    fn test_layout_rejects_foreign_slots() {
        let mut loaded: ActorRegistry<char> = ActorRegistry::with_layout(vec![0, 3], vec![1, 9000]);
        let far = ActorId::new(u32::MAX - 1, 0);
        assert_eq!(loaded.insert_at(far, 'x'), Err(CoreError::SlotOutOfRange(far)));
        assert_eq!(loaded.free_list(), &[1]);
        assert_eq!(loaded.generations().len(), 2);

        loaded.insert_at(ActorId::new(1, 3), 'y').unwrap();
        assert!(loaded.free_list().is_empty());
    }

    #[test]
    fn test_id_serialization() {
        let id = ActorId::new(7, 3);
        let bytes = bincode::serialize(&id).unwrap();
        let back: ActorId = bincode::deserialize(&bytes).unwrap();
        assert_eq!(id, back);
        assert_eq!(format!("{:?}", id), "ActorId(7v3)");
    }
}
