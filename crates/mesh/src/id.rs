//! Identifiers for mesh elements.
//!
//! Vertices and faces are addressed by dense, reusable slot indices that line
//! up with the render buffers. Edges have no buffer slot and carry a stable id
//! instead, so an edge keeps its identity across deletion and re-creation.

use serde::{Deserialize, Serialize};

/// Dense slot of a vertex (also its slot in the position buffer)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VertexIndex(pub u32);

/// Dense slot of a face (its index triple lives at `3 * index`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FaceIndex(pub u32);

/// Stable identifier of an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EdgeId(pub u64);

/// Stable identifier of a mesh within a registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MeshId(pub u64);

impl VertexIndex {
    pub fn slot(self) -> usize {
        self.0 as usize
    }
}

impl FaceIndex {
    pub fn slot(self) -> usize {
        self.0 as usize
    }

    /// First slot of this face's triple in the index buffer
    pub fn first_index_slot(self) -> usize {
        3 * self.0 as usize
    }
}

/// Monotonic generator for stable identifiers.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    next: u64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand out a fresh identifier.
    ///
    /// Running out of identifier space is fatal.
    pub fn next_id(&mut self) -> u64 {
        let id = self.next;
        self.next = self
            .next
            .checked_add(1)
            .expect("identifier space exhausted");
        id
    }

    /// Record that `id` was handed out elsewhere (e.g. re-created by redo) so
    /// it is never generated again.
    pub fn reserve(&mut self, id: u64) {
        if id >= self.next {
            self.next = id.checked_add(1).expect("identifier space exhausted");
        }
    }

    /// The identifier the next call to [`next_id`](Self::next_id) returns
    pub fn peek(&self) -> u64 {
        self.next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generator_is_monotonic() {
        let mut ids = IdGenerator::new();
        assert_eq!(ids.next_id(), 0);
        assert_eq!(ids.next_id(), 1);
        assert_eq!(ids.peek(), 2);
    }

    #[test]
    fn test_reserve_skips_used_ids() {
        let mut ids = IdGenerator::new();
        ids.reserve(10);
        assert_eq!(ids.next_id(), 11);

        // Reserving an already passed id changes nothing
        ids.reserve(3);
        assert_eq!(ids.next_id(), 12);
    }

    #[test]
    fn test_index_slots() {
        assert_eq!(FaceIndex(4).first_index_slot(), 12);
        assert_eq!(VertexIndex(7).slot(), 7);
    }
}
