//! Topology query methods for WingedMesh.

use glam::Vec3;

use super::buffers::MeshBuffers;
use super::types::{Edge, Face, Vertex};
use super::WingedMesh;
use crate::id::{EdgeId, FaceIndex, VertexIndex};
use crate::octree::{Octree, OctreeHit};
use crate::primitive::{Aabb, Ray, Sphere, Triangle};

impl WingedMesh {
    // ========================================================================
    // Accessors
    // ========================================================================

    /// Get vertex by index
    pub fn vertex(&self, index: VertexIndex) -> Option<&Vertex> {
        self.vertices.get(index.0)
    }

    /// Get edge by id
    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(&id)
    }

    /// Get face by index
    pub fn face(&self, index: FaceIndex) -> Option<&Face> {
        self.faces.get(index.0)
    }

    /// Copy of a vertex record that must exist
    pub fn expect_vertex(&self, index: VertexIndex) -> Vertex {
        match self.vertex(index) {
            Some(vertex) => *vertex,
            None => panic!("vertex {:?} does not exist", index),
        }
    }

    /// Copy of an edge record that must exist
    pub fn expect_edge(&self, id: EdgeId) -> Edge {
        match self.edge(id) {
            Some(edge) => *edge,
            None => panic!("edge {:?} does not exist", id),
        }
    }

    /// Copy of a face record that must exist
    pub fn expect_face(&self, index: FaceIndex) -> Face {
        match self.face(index) {
            Some(face) => *face,
            None => panic!("face {:?} does not exist", index),
        }
    }

    /// All vertices in slot order
    pub fn vertices(&self) -> impl Iterator<Item = &Vertex> + '_ {
        self.vertices.iter().map(|(_, v)| v)
    }

    /// All edges in unspecified order
    pub fn edges(&self) -> impl Iterator<Item = &Edge> + '_ {
        self.edges.values()
    }

    /// All edge ids in ascending order
    pub fn edge_ids(&self) -> Vec<EdgeId> {
        let mut ids: Vec<_> = self.edges.keys().copied().collect();
        ids.sort();
        ids
    }

    /// All faces in slot order
    pub fn faces(&self) -> impl Iterator<Item = &Face> + '_ {
        self.faces.iter().map(|(_, f)| f)
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() && self.edges.is_empty() && self.faces.is_empty()
    }

    pub fn buffers(&self) -> &MeshBuffers {
        &self.buffers
    }

    pub fn octree(&self) -> &Octree {
        &self.octree
    }

    pub fn position(&self, index: VertexIndex) -> Vec3 {
        self.expect_vertex(index).position
    }

    // ========================================================================
    // Topology Queries
    // ========================================================================

    /// Edges of a face in loop order, starting at the face's edge
    pub fn face_edges(&self, face: FaceIndex) -> Vec<EdgeId> {
        self.try_face_edges(face)
            .unwrap_or_else(|| panic!("face {:?} has a broken edge loop", face))
    }

    pub(crate) fn try_face_edges(&self, face: FaceIndex) -> Option<Vec<EdgeId>> {
        let start = self.face(face)?.edge?;
        let mut edges = vec![start];
        let mut current = start;
        loop {
            let edge = self.edge(current)?;
            if !edge.is_left_face(face) && !edge.is_right_face(face) {
                return None;
            }
            current = if edge.is_left_face(face) {
                edge.left_successor?
            } else {
                edge.right_successor?
            };
            if current == start {
                return Some(edges);
            }
            if edges.len() > self.edges.len() {
                return None;
            }
            edges.push(current);
        }
    }

    /// Vertices of a face in loop order
    pub fn face_vertices(&self, face: FaceIndex) -> Vec<VertexIndex> {
        self.face_edges(face)
            .into_iter()
            .map(|e| self.expect_edge(e).first_vertex(face))
            .collect()
    }

    /// Triangle of a face derived from its edge loop
    pub fn face_triangle(&self, face: FaceIndex) -> Triangle {
        let vertices = self.face_vertices(face);
        match vertices.as_slice() {
            &[a, b, c] => Triangle::new(self.position(a), self.position(b), self.position(c)),
            other => panic!("face {:?} has {} vertices", face, other.len()),
        }
    }

    /// Triangle of a face as seen by the renderer and the octree
    pub fn buffered_triangle(&self, face: FaceIndex) -> Triangle {
        self.buffers.triangle(face)
    }

    /// Index triple of a face in the index buffer
    pub fn buffered_indices(&self, face: FaceIndex) -> [VertexIndex; 3] {
        self.buffers.face_indices(face)
    }

    pub fn face_normal(&self, face: FaceIndex) -> Vec3 {
        self.buffered_triangle(face).normal()
    }

    /// Edges around a vertex in ring order.
    ///
    /// For a vertex on the boundary the ring starts at one boundary edge and
    /// ends at the other.
    pub fn vertex_edges(&self, vertex: VertexIndex) -> Vec<EdgeId> {
        self.try_vertex_edges(vertex)
            .unwrap_or_else(|| panic!("vertex {:?} has a broken edge ring", vertex))
    }

    pub(crate) fn try_vertex_edges(&self, vertex: VertexIndex) -> Option<Vec<EdgeId>> {
        let Some(start) = self.vertex(vertex)?.edge else {
            return Some(Vec::new());
        };
        let limit = self.edges.len();

        // Walk forward: from the face an edge leaves the vertex in, the
        // predecessor in that face enters the vertex and leaves it in the
        // next face
        let mut forward = vec![start];
        let mut current = start;
        loop {
            let edge = self.edge(current)?;
            if !edge.is_incident_to(vertex) {
                return None;
            }
            let Some(face) = edge.face_leaving(vertex) else {
                break;
            };
            current = if edge.is_left_face(face) {
                edge.left_predecessor?
            } else {
                edge.right_predecessor?
            };
            if current == start {
                return Some(forward);
            }
            if forward.len() > limit {
                return None;
            }
            forward.push(current);
        }

        // Hit the boundary: walk backwards from the start to the other side
        let mut backward = Vec::new();
        let mut current = start;
        loop {
            let edge = self.edge(current)?;
            if !edge.is_incident_to(vertex) {
                return None;
            }
            let Some(face) = edge.face_entering(vertex) else {
                break;
            };
            current = if edge.is_left_face(face) {
                edge.left_successor?
            } else {
                edge.right_successor?
            };
            if current == start || backward.len() + forward.len() > limit {
                return None;
            }
            backward.push(current);
        }

        backward.reverse();
        backward.extend(forward);
        Some(backward)
    }

    /// Faces around a vertex in ring order
    pub fn vertex_faces(&self, vertex: VertexIndex) -> Vec<FaceIndex> {
        self.vertex_edges(vertex)
            .into_iter()
            .filter_map(|e| self.expect_edge(e).face_leaving(vertex))
            .collect()
    }

    /// Vertices connected to a vertex by an edge, in ring order
    pub fn adjacent_vertices(&self, vertex: VertexIndex) -> Vec<VertexIndex> {
        self.vertex_edges(vertex)
            .into_iter()
            .map(|e| self.expect_edge(e).other_vertex(vertex))
            .collect()
    }

    /// Faces sharing an edge with `face`, paired with that edge
    pub fn adjacent_faces(&self, face: FaceIndex) -> Vec<(EdgeId, FaceIndex)> {
        self.face_edges(face)
            .into_iter()
            .filter_map(|e| self.expect_edge(e).other_face(face).map(|f| (e, f)))
            .collect()
    }

    pub fn valence(&self, vertex: VertexIndex) -> usize {
        self.vertex_edges(vertex).len()
    }

    /// Normalized mean of the normals of the faces around a vertex
    pub fn vertex_normal(&self, vertex: VertexIndex) -> Vec3 {
        let faces = self.vertex_faces(vertex);
        if faces.is_empty() {
            return Vec3::ZERO;
        }
        let sum: Vec3 = faces.iter().map(|&f| self.face_normal(f)).sum();
        (sum / faces.len() as f32).normalize_or_zero()
    }

    /// The edge connecting two vertices, if any
    pub fn edge_between(&self, a: VertexIndex, b: VertexIndex) -> Option<EdgeId> {
        self.vertex_edges(a)
            .into_iter()
            .find(|&e| self.expect_edge(e).is_incident_to(b))
    }

    pub fn is_boundary_vertex(&self, vertex: VertexIndex) -> bool {
        self.vertex_edges(vertex)
            .into_iter()
            .any(|e| self.expect_edge(e).is_boundary())
    }

    /// Whether no edge is missing a face
    pub fn is_closed(&self) -> bool {
        self.edges.values().all(|e| !e.is_boundary())
    }

    /// Bounding box of all vertices
    pub fn bounds(&self) -> Aabb {
        Aabb::from_points(self.vertices().map(|v| v.position))
    }

    // ========================================================================
    // Spatial Queries
    // ========================================================================

    /// Faces whose geometry intersects the sphere
    pub fn intersects_sphere(&self, sphere: &Sphere) -> Vec<FaceIndex> {
        self.octree.intersects_sphere(sphere)
    }

    /// Nearest face hit by the ray
    pub fn intersects_ray(&self, ray: &Ray) -> Option<OctreeHit> {
        self.octree.intersects_ray(ray)
    }

    /// Any face of the mesh, in unspecified order
    pub fn some_face(&self) -> Option<FaceIndex> {
        self.octree.some_face()
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;

    /// Two triangles sharing the diagonal of the unit square
    fn square() -> WingedMesh {
        link(
            &[Vec3::ZERO, Vec3::X, Vec3::new(1.0, 1.0, 0.0), Vec3::Y],
            &[[0, 1, 2], [0, 2, 3]],
        )
    }

    #[test]
    fn test_ring_on_closed_mesh() {
        let mesh = tetrahedron();
        for v in 0..4 {
            let vertex = VertexIndex(v);
            assert_eq!(mesh.valence(vertex), 3);
            assert!(!mesh.is_boundary_vertex(vertex));
            let mut neighbours = mesh.adjacent_vertices(vertex);
            neighbours.sort();
            let expected: Vec<_> = (0..4).filter(|&u| u != v).map(VertexIndex).collect();
            assert_eq!(neighbours, expected);
        }
    }

    #[test]
    fn test_ring_on_boundary_vertex() {
        let mesh = square();
        // Vertex 0 touches both triangles; its ring runs boundary to boundary
        let ring = mesh.vertex_edges(VertexIndex(0));
        assert_eq!(ring.len(), 3);
        assert!(mesh.expect_edge(ring[0]).is_boundary());
        assert!(!mesh.expect_edge(ring[1]).is_boundary());
        assert!(mesh.expect_edge(ring[2]).is_boundary());
        assert!(mesh.is_boundary_vertex(VertexIndex(0)));

        let mut faces = mesh.vertex_faces(VertexIndex(0));
        faces.sort();
        assert_eq!(faces, vec![FaceIndex(0), FaceIndex(1)]);
        assert_eq!(mesh.vertex_faces(VertexIndex(1)), vec![FaceIndex(0)]);
    }

    #[test]
    fn test_adjacent_faces() {
        let mesh = square();
        let adjacent = mesh.adjacent_faces(FaceIndex(0));
        assert_eq!(adjacent.len(), 1);
        assert_eq!(adjacent[0].1, FaceIndex(1));
        assert_eq!(
            mesh.edge_between(VertexIndex(0), VertexIndex(2)),
            Some(adjacent[0].0)
        );
        assert_eq!(mesh.edge_between(VertexIndex(1), VertexIndex(3)), None);
    }

    #[test]
    fn test_normals() {
        let mesh = square();
        assert_eq!(mesh.face_normal(FaceIndex(0)), Vec3::Z);
        assert!((mesh.vertex_normal(VertexIndex(0)) - Vec3::Z).length() < 1e-6);

        let mesh = tetrahedron();
        let n = mesh.vertex_normal(VertexIndex(0));
        assert!((n - Vec3::ONE.normalize()).length() < 1e-5);
    }

    #[test]
    fn test_face_triangle_matches_buffer() {
        let mesh = tetrahedron();
        for face in mesh.faces() {
            let topo = mesh.face_triangle(face.index);
            let buffered = mesh.buffered_triangle(face.index);
            assert!((topo.normal() - buffered.normal()).length() < 1e-6);
        }
    }

    #[test]
    fn test_bounds() {
        let bounds = tetrahedron().bounds();
        assert_eq!(bounds.min, Vec3::splat(-1.0));
        assert_eq!(bounds.max, Vec3::splat(1.0));
    }
}
