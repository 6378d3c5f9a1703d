//! Winged-edge mesh data structure for sculpting operations
//!
//! All vertices, edges and faces live in containers owned by the mesh and
//! refer to each other by identifier. Vertex and face slots mirror the
//! render buffers; the octree indexes the buffered triangle of every face.

mod buffers;
mod modification;
mod topology;
mod types;
mod validation;

use std::collections::{BTreeSet, HashMap};

use sculpt_config::OctreeConfig;

pub use buffers::MeshBuffers;
pub use types::{Edge, Face, Vertex};
pub use validation::TopologyError;

use crate::arena::IndexedList;
use crate::id::{EdgeId, FaceIndex, IdGenerator, MeshId, VertexIndex};
use crate::octree::Octree;

/// Winged-edge mesh
///
/// Mutation goes through the atomic add/delete/write primitives; callers
/// that need undo record those primitives (see the action layer). Derived
/// state (render buffers, octree) is kept in sync by the mesh itself.
#[derive(Debug, Clone)]
pub struct WingedMesh {
    pub(crate) id: MeshId,
    pub(crate) vertices: IndexedList<Vertex>,
    pub(crate) edges: HashMap<EdgeId, Edge>,
    pub(crate) faces: IndexedList<Face>,
    pub(crate) buffers: MeshBuffers,
    pub(crate) octree: Octree,
    pub(crate) edge_ids: IdGenerator,
    /// Faces whose buffered triangle may differ from their octree placement
    pub(crate) dirty_faces: BTreeSet<FaceIndex>,
    /// Vertices moved since the last octree sync
    pub(crate) dirty_vertices: BTreeSet<VertexIndex>,
}

impl WingedMesh {
    /// An empty mesh without an octree root
    pub fn new(id: MeshId, octree: OctreeConfig) -> Self {
        Self {
            id,
            vertices: IndexedList::new(),
            edges: HashMap::new(),
            faces: IndexedList::new(),
            buffers: MeshBuffers::new(),
            octree: Octree::new(octree),
            edge_ids: IdGenerator::new(),
            dirty_faces: BTreeSet::new(),
            dirty_vertices: BTreeSet::new(),
        }
    }

    pub fn id(&self) -> MeshId {
        self.id
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Hand-linked meshes for topology tests.

    use glam::Vec3;

    use super::*;
    use crate::octree::OctreeRoot;

    /// Link triangles given as vertex index triples (counter-clockwise).
    ///
    /// Edges are created in first-seen order; a directed edge `a -> b` makes
    /// its triangle the left face, the reverse direction the right face.
    pub(crate) fn link(positions: &[Vec3], triangles: &[[u32; 3]]) -> WingedMesh {
        let mut mesh = WingedMesh::new(MeshId(0), OctreeConfig::default());
        mesh.init_octree_root(Some(OctreeRoot::new(Vec3::ZERO, 4.0)));

        for &p in positions {
            mesh.add_vertex(p, 0);
        }

        let mut directed: HashMap<(u32, u32), EdgeId> = HashMap::new();
        let mut loops = Vec::new();
        for tri in triangles {
            let vertices = tri.map(VertexIndex);
            let face = mesh.add_face(0, vertices);
            let mut ids = [EdgeId(0); 3];
            for k in 0..3 {
                let (a, b) = (tri[k], tri[(k + 1) % 3]);
                let id = match directed.get(&(b, a)) {
                    Some(&id) => {
                        let mut edge = mesh.expect_edge(id);
                        edge.right_face = Some(face);
                        mesh.write_edge(edge);
                        id
                    }
                    None => {
                        let id = mesh.add_edge(0);
                        let mut edge = mesh.expect_edge(id);
                        edge.vertex1 = Some(VertexIndex(a));
                        edge.vertex2 = Some(VertexIndex(b));
                        edge.left_face = Some(face);
                        mesh.write_edge(edge);
                        directed.insert((a, b), id);
                        id
                    }
                };
                ids[k] = id;
            }
            loops.push((face, ids));
        }

        for (face, ids) in loops {
            for k in 0..3 {
                let mut edge = mesh.expect_edge(ids[k]);
                edge.set_predecessor(face, ids[(k + 2) % 3]);
                edge.set_successor(face, ids[(k + 1) % 3]);
                mesh.write_edge(edge);

                let v = edge.first_vertex(face);
                let mut vertex = mesh.expect_vertex(v);
                if vertex.edge.is_none() {
                    vertex.edge = Some(ids[k]);
                    mesh.write_vertex(vertex);
                }
            }
            let mut record = mesh.expect_face(face);
            record.edge = Some(ids[0]);
            mesh.write_face(record);
        }

        mesh.sync_octree();
        mesh
    }

    pub(crate) fn single_triangle() -> WingedMesh {
        link(
            &[Vec3::ZERO, Vec3::X, Vec3::Y],
            &[[0, 1, 2]],
        )
    }

    pub(crate) fn tetrahedron() -> WingedMesh {
        link(
            &[
                Vec3::new(1.0, 1.0, 1.0),
                Vec3::new(1.0, -1.0, -1.0),
                Vec3::new(-1.0, 1.0, -1.0),
                Vec3::new(-1.0, -1.0, 1.0),
            ],
            &[[0, 1, 2], [0, 3, 1], [0, 2, 3], [1, 3, 2]],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn test_single_triangle() {
        let mesh = single_triangle();
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.edge_count(), 3);
        assert_eq!(mesh.face_count(), 1);
        assert!(!mesh.is_closed());
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn test_tetrahedron_is_closed() {
        let mesh = tetrahedron();
        assert_eq!(mesh.edge_count(), 6);
        assert!(mesh.is_closed());
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn test_face_vertices() {
        let mesh = tetrahedron();
        let verts = mesh.face_vertices(FaceIndex(1));
        assert_eq!(verts.len(), 3);
        // Loop order is a rotation of the input triangle
        let start = verts.iter().position(|&v| v == VertexIndex(0)).unwrap();
        assert_eq!(verts[(start + 1) % 3], VertexIndex(3));
        assert_eq!(verts[(start + 2) % 3], VertexIndex(1));
    }

    #[test]
    fn test_vertex_faces() {
        let mesh = single_triangle();
        assert_eq!(mesh.vertex_faces(VertexIndex(0)), vec![FaceIndex(0)]);

        let mesh = tetrahedron();
        let mut faces = mesh.vertex_faces(VertexIndex(0));
        faces.sort();
        assert_eq!(faces, vec![FaceIndex(0), FaceIndex(1), FaceIndex(2)]);
    }
}
