//! Slot arena with reusable indices.

use std::collections::BTreeSet;

/// A list of values addressed by dense `u32` slots.
///
/// Removing a value leaves a vacant slot that the next [`insert`](Self::insert)
/// reuses (lowest vacant slot first). [`insert_at`](Self::insert_at) places a
/// value at an exact slot, which undo/redo uses to reproduce indices.
#[derive(Debug, Clone)]
pub struct IndexedList<T> {
    slots: Vec<Option<T>>,
    vacant: BTreeSet<u32>,
}

impl<T> Default for IndexedList<T> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            vacant: BTreeSet::new(),
        }
    }
}

impl<T> IndexedList<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Slot the next [`insert`](Self::insert) will use
    pub fn next_index(&self) -> u32 {
        match self.vacant.first() {
            Some(&index) => index,
            None => slot_index(self.slots.len()),
        }
    }

    /// Insert a value at the lowest vacant slot.
    pub fn insert(&mut self, value: T) -> u32 {
        let index = self.next_index();
        self.insert_at(index, value);
        index
    }

    /// Insert a value at an exact slot.
    ///
    /// # Panics
    /// If the slot is occupied.
    pub fn insert_at(&mut self, index: u32, value: T) {
        let slot = index as usize;
        while self.slots.len() <= slot {
            self.vacant.insert(slot_index(self.slots.len()));
            self.slots.push(None);
        }
        assert!(
            self.slots[slot].is_none(),
            "slot {} is already occupied",
            index
        );
        self.vacant.remove(&index);
        self.slots[slot] = Some(value);
    }

    /// Remove and return the value at `index`, if any.
    pub fn remove(&mut self, index: u32) -> Option<T> {
        let value = self.slots.get_mut(index as usize)?.take()?;
        self.vacant.insert(index);
        Some(value)
    }

    pub fn get(&self, index: u32) -> Option<&T> {
        self.slots.get(index as usize)?.as_ref()
    }

    pub fn get_mut(&mut self, index: u32) -> Option<&mut T> {
        self.slots.get_mut(index as usize)?.as_mut()
    }

    pub fn contains(&self, index: u32) -> bool {
        self.get(index).is_some()
    }

    /// Number of live values
    pub fn len(&self) -> usize {
        self.slots.len() - self.vacant.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of slots, live or vacant
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Highest live slot
    pub fn last_index(&self) -> Option<u32> {
        self.slots
            .iter()
            .rposition(Option::is_some)
            .map(slot_index)
    }

    /// Iterate live values in slot order
    pub fn iter(&self) -> impl Iterator<Item = (u32, &T)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|value| (slot_index(i), value)))
    }

    /// Live slots in ascending order
    pub fn indices(&self) -> impl Iterator<Item = u32> + '_ {
        self.iter().map(|(i, _)| i)
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.vacant.clear();
    }
}

fn slot_index(slot: usize) -> u32 {
    u32::try_from(slot).expect("index space exhausted")
}
