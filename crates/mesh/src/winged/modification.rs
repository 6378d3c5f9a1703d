//! Atomic mutation primitives for WingedMesh.
//!
//! Every primitive performs exactly one change and panics when its
//! precondition does not hold: elements must be unlinked before deletion and
//! explicit slots or ids must be vacant. The action layer records these calls
//! so that each one can be inverted.

use std::mem;

use glam::Vec3;
use tracing::trace;

use super::types::{Edge, Face, Vertex};
use super::WingedMesh;
use crate::id::{EdgeId, FaceIndex, VertexIndex};
use crate::octree::OctreeRoot;

impl WingedMesh {
    // ========================================================================
    // Addition
    // ========================================================================

    /// Add an unlinked vertex at the lowest vacant slot
    pub fn add_vertex(&mut self, position: Vec3, level: u32) -> VertexIndex {
        let index = VertexIndex(self.vertices.next_index());
        self.add_vertex_at(Vertex::new(index, position, level));
        index
    }

    /// Add an unlinked vertex at the slot named by its record
    pub fn add_vertex_at(&mut self, vertex: Vertex) {
        assert!(
            vertex.edge.is_none(),
            "vertex {:?} must be added unlinked",
            vertex.index
        );
        self.vertices.insert_at(vertex.index.0, vertex);
        self.buffers.set_position(vertex.index, vertex.position);
        trace!("Added vertex {:?} at {:?}", vertex.index, vertex.position);
    }

    /// Add an unlinked edge with a fresh id
    pub fn add_edge(&mut self, level: u32) -> EdgeId {
        let id = EdgeId(self.edge_ids.next_id());
        self.add_edge_with_id(Edge::new(id, level));
        id
    }

    /// Add an unlinked edge with the id named by its record
    pub fn add_edge_with_id(&mut self, edge: Edge) {
        assert!(edge.is_unlinked(), "edge {:?} must be added unlinked", edge.id);
        assert!(
            !self.edges.contains_key(&edge.id),
            "edge id {:?} is already in use",
            edge.id
        );
        self.edge_ids.reserve(edge.id.0);
        self.edges.insert(edge.id, edge);
    }

    /// Add an unlinked face at the lowest vacant slot, buffering `triangle`
    /// as its index triple and inserting it into the octree
    pub fn add_face(&mut self, level: u32, triangle: [VertexIndex; 3]) -> FaceIndex {
        let index = FaceIndex(self.faces.next_index());
        self.add_face_at(Face::new(index, level), triangle);
        index
    }

    pub fn add_face_at(&mut self, face: Face, triangle: [VertexIndex; 3]) {
        assert!(face.is_unlinked(), "face {:?} must be added unlinked", face.index);
        self.faces.insert_at(face.index.0, face);
        self.buffers.set_face_indices(face.index, triangle);
        self.octree
            .insert(face.index, self.buffers.triangle(face.index));
        self.dirty_faces.remove(&face.index);
        trace!("Added face {:?} {:?}", face.index, triangle);
    }

    // ========================================================================
    // Deletion
    // ========================================================================

    /// Delete an unlinked vertex and return its record
    pub fn delete_vertex(&mut self, index: VertexIndex) -> Vertex {
        let vertex = self.expect_vertex(index);
        assert!(
            vertex.edge.is_none(),
            "vertex {:?} is deleted while still linked to {:?}",
            index,
            vertex.edge
        );
        self.vertices.remove(index.0);
        self.dirty_vertices.remove(&index);
        trace!("Deleted vertex {:?}", index);
        vertex
    }

    /// Delete an unlinked edge and return its record
    pub fn delete_edge(&mut self, id: EdgeId) -> Edge {
        let edge = self.expect_edge(id);
        assert!(edge.is_unlinked(), "edge {:?} is deleted while still linked", id);
        self.edges.remove(&id);
        edge
    }

    /// Delete an unlinked face, removing it from the octree. Returns the
    /// record and the index triple it was buffered with.
    pub fn delete_face(&mut self, index: FaceIndex) -> (Face, [VertexIndex; 3]) {
        let face = self.expect_face(index);
        assert!(
            face.is_unlinked(),
            "face {:?} is deleted while still linked",
            index
        );
        let triangle = self.buffers.face_indices(index);
        self.faces.remove(index.0);
        self.octree.remove(index);
        self.dirty_faces.remove(&index);
        trace!("Deleted face {:?}", index);
        (face, triangle)
    }

    // ========================================================================
    // Modification
    // ========================================================================

    /// Replace a vertex record and return the previous one
    pub fn write_vertex(&mut self, vertex: Vertex) -> Vertex {
        let Some(slot) = self.vertices.get_mut(vertex.index.0) else {
            panic!("vertex {:?} does not exist", vertex.index);
        };
        let old = mem::replace(slot, vertex);
        if old.position != vertex.position {
            self.buffers.set_position(vertex.index, vertex.position);
            self.dirty_vertices.insert(vertex.index);
        }
        old
    }

    /// Replace an edge record and return the previous one
    pub fn write_edge(&mut self, edge: Edge) -> Edge {
        let Some(slot) = self.edges.get_mut(&edge.id) else {
            panic!("edge {:?} does not exist", edge.id);
        };
        mem::replace(slot, edge)
    }

    /// Replace a face record and return the previous one
    pub fn write_face(&mut self, face: Face) -> Face {
        let Some(slot) = self.faces.get_mut(face.index.0) else {
            panic!("face {:?} does not exist", face.index);
        };
        mem::replace(slot, face)
    }

    /// Point one slot of the index buffer at a vertex and return the vertex
    /// it referenced before
    pub fn set_index(&mut self, slot: usize, vertex: VertexIndex) -> VertexIndex {
        let old = self.buffers.set_index(slot, vertex);
        if old != vertex {
            self.dirty_faces.insert(FaceIndex((slot / 3) as u32));
        }
        old
    }

    /// Replace the octree root and return the previous one.
    ///
    /// # Panics
    /// If the octree still holds faces.
    pub fn init_octree_root(&mut self, root: Option<OctreeRoot>) -> Option<OctreeRoot> {
        self.octree.set_root(root)
    }

    /// Whether the octree lags behind buffered geometry
    pub fn needs_sync(&self) -> bool {
        !self.dirty_faces.is_empty() || !self.dirty_vertices.is_empty()
    }

    /// Re-place faces whose buffered triangle changed since the last sync.
    ///
    /// Requires consistent topology, since moved vertices find their faces
    /// through their edge ring.
    pub fn sync_octree(&mut self) {
        for vertex in mem::take(&mut self.dirty_vertices) {
            if self.vertex(vertex).is_some_and(|v| v.edge.is_some()) {
                let faces = self.vertex_faces(vertex);
                self.dirty_faces.extend(faces);
            }
        }

        let dirty = mem::take(&mut self.dirty_faces);
        let mut moved = 0;
        for face in dirty {
            if !self.faces.contains(face.0) {
                continue;
            }
            let triangle = self.buffers.triangle(face);
            if self.octree.triangle(face) != Some(triangle) {
                self.octree.update(face, triangle);
                moved += 1;
            }
        }
        if moved > 0 {
            trace!("Re-placed {} faces in the octree of {:?}", moved, self.id);
        }
    }

    /// Drop every element, keeping the octree root
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.edges.clear();
        self.faces.clear();
        self.buffers.clear();
        self.octree.clear();
        self.dirty_faces.clear();
        self.dirty_vertices.clear();
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;
    use sculpt_config::OctreeConfig;

    use super::super::test_support::*;
    use super::*;
    use crate::id::MeshId;
    use crate::primitive::Sphere;

    fn empty_mesh() -> WingedMesh {
        let mut mesh = WingedMesh::new(MeshId(1), OctreeConfig::default());
        mesh.init_octree_root(Some(OctreeRoot::new(Vec3::ZERO, 2.0)));
        mesh
    }

    #[test]
    fn test_slots_are_reused() {
        let mut mesh = empty_mesh();
        let a = mesh.add_vertex(Vec3::ZERO, 0);
        let b = mesh.add_vertex(Vec3::X, 0);
        assert_eq!((a, b), (VertexIndex(0), VertexIndex(1)));

        mesh.delete_vertex(a);
        assert_eq!(mesh.add_vertex(Vec3::Y, 0), VertexIndex(0));
        assert_eq!(mesh.buffers().position(VertexIndex(0)), Vec3::Y);
    }

    #[test]
    fn test_edge_ids_are_not_reused() {
        let mut mesh = empty_mesh();
        let e0 = mesh.add_edge(0);
        mesh.delete_edge(e0);
        let e1 = mesh.add_edge(0);
        assert_ne!(e0, e1);

        mesh.add_edge_with_id(Edge::new(EdgeId(40), 0));
        assert_eq!(mesh.add_edge(0), EdgeId(41));
    }

    #[test]
    #[should_panic(expected = "still linked")]
    fn test_delete_linked_vertex_panics() {
        let mut mesh = single_triangle();
        mesh.delete_vertex(VertexIndex(0));
    }

    #[test]
    #[should_panic(expected = "already in use")]
    fn test_edge_id_collision_panics() {
        let mut mesh = empty_mesh();
        let id = mesh.add_edge(0);
        mesh.add_edge_with_id(Edge::new(id, 0));
    }

    #[test]
    fn test_face_enters_and_leaves_octree() {
        let mut mesh = empty_mesh();
        let v = [Vec3::ZERO, Vec3::X, Vec3::Y].map(|p| mesh.add_vertex(p, 0));
        let face = mesh.add_face(0, v);

        let sphere = Sphere::new(Vec3::new(0.2, 0.2, 0.1), 0.2);
        assert_eq!(mesh.intersects_sphere(&sphere), vec![face]);

        let (record, triangle) = mesh.delete_face(face);
        assert_eq!(record.index, face);
        assert_eq!(triangle, v);
        assert!(mesh.intersects_sphere(&sphere).is_empty());
    }

    #[test]
    fn test_sync_follows_moved_vertices() {
        let mut mesh = single_triangle();
        let sphere = Sphere::new(Vec3::new(0.0, 0.0, 1.0), 0.1);
        assert!(mesh.intersects_sphere(&sphere).is_empty());

        let mut vertex = mesh.expect_vertex(VertexIndex(0));
        vertex.position = Vec3::new(0.0, 0.0, 1.0);
        mesh.write_vertex(vertex);
        assert!(mesh.needs_sync());

        mesh.sync_octree();
        assert!(!mesh.needs_sync());
        assert_eq!(mesh.intersects_sphere(&sphere), vec![FaceIndex(0)]);
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn test_set_index_marks_face_dirty() {
        let mut mesh = single_triangle();
        let old = mesh.set_index(0, VertexIndex(0));
        assert_eq!(old, VertexIndex(0));
        assert!(!mesh.needs_sync());

        // Rotating the triple keeps the same triangle
        let rotated = [VertexIndex(1), VertexIndex(2), VertexIndex(0)];
        for (slot, v) in rotated.into_iter().enumerate() {
            mesh.set_index(slot, v);
        }
        assert!(mesh.needs_sync());
        mesh.sync_octree();
        assert!(mesh.validate().is_ok());
    }
}
