//! The atomic, invertible mesh changes an action unit is made of.

use sculpt_mesh::{Edge, Face, OctreeRoot, Vertex, VertexIndex, WingedMesh};

/// One recorded mesh mutation
///
/// Add variants carry the record as it was added (unlinked), delete
/// variants the record as it was deleted (also unlinked, since elements are
/// reset before deletion). Replaying an add re-creates the element at the
/// same slot or id; the mesh asserts that the slot is vacant.
#[derive(Debug, Clone, PartialEq)]
pub enum PartialAction {
    AddVertex {
        vertex: Vertex,
    },
    DeleteVertex {
        vertex: Vertex,
    },
    AddEdge {
        edge: Edge,
    },
    DeleteEdge {
        edge: Edge,
    },
    AddFace {
        face: Face,
        triangle: [VertexIndex; 3],
    },
    DeleteFace {
        face: Face,
        triangle: [VertexIndex; 3],
    },
    SetIndex {
        slot: usize,
        old: VertexIndex,
        new: VertexIndex,
    },
    InitOctreeRoot {
        old: Option<OctreeRoot>,
        new: Option<OctreeRoot>,
    },
    ModifyVertex {
        old: Vertex,
        new: Vertex,
    },
    ModifyEdge {
        old: Edge,
        new: Edge,
    },
    ModifyFace {
        old: Face,
        new: Face,
    },
}

impl PartialAction {
    /// Revert this change. Must run in reverse recording order.
    pub fn undo(&self, mesh: &mut WingedMesh) {
        match *self {
            PartialAction::AddVertex { vertex } => {
                mesh.delete_vertex(vertex.index);
            }
            PartialAction::DeleteVertex { vertex } => mesh.add_vertex_at(vertex),
            PartialAction::AddEdge { edge } => {
                mesh.delete_edge(edge.id);
            }
            PartialAction::DeleteEdge { edge } => mesh.add_edge_with_id(edge),
            PartialAction::AddFace { face, .. } => {
                mesh.delete_face(face.index);
            }
            PartialAction::DeleteFace { face, triangle } => mesh.add_face_at(face, triangle),
            PartialAction::SetIndex { slot, old, .. } => {
                mesh.set_index(slot, old);
            }
            PartialAction::InitOctreeRoot { old, .. } => {
                mesh.init_octree_root(old);
            }
            PartialAction::ModifyVertex { old, .. } => {
                mesh.write_vertex(old);
            }
            PartialAction::ModifyEdge { old, .. } => {
                mesh.write_edge(old);
            }
            PartialAction::ModifyFace { old, .. } => {
                mesh.write_face(old);
            }
        }
    }

    /// Re-apply this change. Must run in recording order.
    pub fn redo(&self, mesh: &mut WingedMesh) {
        match *self {
            PartialAction::AddVertex { vertex } => mesh.add_vertex_at(vertex),
            PartialAction::DeleteVertex { vertex } => {
                mesh.delete_vertex(vertex.index);
            }
            PartialAction::AddEdge { edge } => mesh.add_edge_with_id(edge),
            PartialAction::DeleteEdge { edge } => {
                mesh.delete_edge(edge.id);
            }
            PartialAction::AddFace { face, triangle } => mesh.add_face_at(face, triangle),
            PartialAction::DeleteFace { face, .. } => {
                mesh.delete_face(face.index);
            }
            PartialAction::SetIndex { slot, new, .. } => {
                mesh.set_index(slot, new);
            }
            PartialAction::InitOctreeRoot { new, .. } => {
                mesh.init_octree_root(new);
            }
            PartialAction::ModifyVertex { new, .. } => {
                mesh.write_vertex(new);
            }
            PartialAction::ModifyEdge { new, .. } => {
                mesh.write_edge(new);
            }
            PartialAction::ModifyFace { new, .. } => {
                mesh.write_face(new);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;
    use sculpt_config::OctreeConfig;
    use sculpt_mesh::{MeshId, OctreeRoot};

    use super::*;

    fn empty_mesh() -> WingedMesh {
        let mut mesh = WingedMesh::new(MeshId(0), OctreeConfig::default());
        mesh.init_octree_root(Some(OctreeRoot::new(Vec3::ZERO, 4.0)));
        mesh
    }

    #[test]
    fn test_add_vertex_round_trip() {
        let mut mesh = empty_mesh();
        let index = mesh.add_vertex(Vec3::X, 0);
        let action = PartialAction::AddVertex {
            vertex: mesh.expect_vertex(index),
        };

        action.undo(&mut mesh);
        assert_eq!(mesh.vertex_count(), 0);

        action.redo(&mut mesh);
        assert_eq!(mesh.expect_vertex(index).position, Vec3::X);
    }

    #[test]
    fn test_modify_edge_restores_record() {
        let mut mesh = empty_mesh();
        let id = mesh.add_edge(0);
        let old = mesh.expect_edge(id);
        let mut new = old;
        new.is_t_edge = true;
        new.level = 2;
        mesh.write_edge(new);

        let action = PartialAction::ModifyEdge { old, new };
        action.undo(&mut mesh);
        assert_eq!(mesh.expect_edge(id), old);
        action.redo(&mut mesh);
        assert_eq!(mesh.expect_edge(id), new);
    }

    #[test]
    fn test_octree_root_round_trip() {
        let mut mesh = WingedMesh::new(MeshId(0), OctreeConfig::default());
        let root = Some(OctreeRoot::new(Vec3::ZERO, 2.0));
        let old = mesh.init_octree_root(root);
        let action = PartialAction::InitOctreeRoot { old, new: root };

        action.undo(&mut mesh);
        assert_eq!(mesh.octree().root(), None);
        action.redo(&mut mesh);
        assert_eq!(mesh.octree().root(), root);
    }

    #[test]
    #[should_panic(expected = "already occupied")]
    fn test_redo_into_occupied_slot_panics() {
        let mut mesh = empty_mesh();
        let index = mesh.add_vertex(Vec3::X, 0);
        let action = PartialAction::AddVertex {
            vertex: mesh.expect_vertex(index),
        };
        action.redo(&mut mesh);
    }
}
