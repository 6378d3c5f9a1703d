//! Recording of mesh mutations into an undoable unit.

use glam::Vec3;
use sculpt_mesh::{Edge, EdgeId, Face, FaceIndex, OctreeRoot, Vertex, VertexIndex, WingedMesh};
use tracing::trace;

use super::PartialAction;

/// An ordered list of partial actions recorded against one mesh
///
/// Every mutation an editing operation performs goes through the methods
/// here, which apply it to the mesh and record how to revert it. Undo
/// replays the list backwards, redo forwards. Both finish by syncing the
/// octree; debug builds also validate the mesh afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionUnit {
    actions: Vec<PartialAction>,
}

impl ActionUnit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn actions(&self) -> &[PartialAction] {
        &self.actions
    }

    /// Move the actions of `other` to the end of this unit
    pub fn append(&mut self, other: &mut ActionUnit) {
        self.actions.append(&mut other.actions);
    }

    fn push(&mut self, action: PartialAction) {
        self.actions.push(action);
    }

    // ========================================================================
    // Addition and deletion
    // ========================================================================

    pub fn add_vertex(&mut self, mesh: &mut WingedMesh, position: Vec3, level: u32) -> VertexIndex {
        let index = mesh.add_vertex(position, level);
        self.push(PartialAction::AddVertex {
            vertex: mesh.expect_vertex(index),
        });
        index
    }

    pub fn add_edge(&mut self, mesh: &mut WingedMesh, level: u32) -> EdgeId {
        let id = mesh.add_edge(level);
        self.push(PartialAction::AddEdge {
            edge: mesh.expect_edge(id),
        });
        id
    }

    pub fn add_face(
        &mut self,
        mesh: &mut WingedMesh,
        level: u32,
        triangle: [VertexIndex; 3],
    ) -> FaceIndex {
        let index = mesh.add_face(level, triangle);
        self.push(PartialAction::AddFace {
            face: mesh.expect_face(index),
            triangle,
        });
        index
    }

    /// Delete a vertex that was reset beforehand
    pub fn delete_vertex(&mut self, mesh: &mut WingedMesh, index: VertexIndex) {
        let vertex = mesh.delete_vertex(index);
        self.push(PartialAction::DeleteVertex { vertex });
    }

    /// Delete an edge that was reset beforehand
    pub fn delete_edge(&mut self, mesh: &mut WingedMesh, id: EdgeId) {
        let edge = mesh.delete_edge(id);
        self.push(PartialAction::DeleteEdge { edge });
    }

    /// Delete a face that was reset beforehand
    pub fn delete_face(&mut self, mesh: &mut WingedMesh, index: FaceIndex) {
        let (face, triangle) = mesh.delete_face(index);
        self.push(PartialAction::DeleteFace { face, triangle });
    }

    // ========================================================================
    // Modification
    // ========================================================================

    /// Edit a vertex record in place. Records nothing if the edit leaves the
    /// record unchanged.
    pub fn modify_vertex(
        &mut self,
        mesh: &mut WingedMesh,
        index: VertexIndex,
        edit: impl FnOnce(&mut Vertex),
    ) {
        let old = mesh.expect_vertex(index);
        let mut new = old;
        edit(&mut new);
        if new != old {
            mesh.write_vertex(new);
            self.push(PartialAction::ModifyVertex { old, new });
        }
    }

    pub fn modify_edge(&mut self, mesh: &mut WingedMesh, id: EdgeId, edit: impl FnOnce(&mut Edge)) {
        let old = mesh.expect_edge(id);
        let mut new = old;
        edit(&mut new);
        if new != old {
            mesh.write_edge(new);
            self.push(PartialAction::ModifyEdge { old, new });
        }
    }

    pub fn modify_face(
        &mut self,
        mesh: &mut WingedMesh,
        index: FaceIndex,
        edit: impl FnOnce(&mut Face),
    ) {
        let old = mesh.expect_face(index);
        let mut new = old;
        edit(&mut new);
        if new != old {
            mesh.write_face(new);
            self.push(PartialAction::ModifyFace { old, new });
        }
    }

    pub fn move_vertex(&mut self, mesh: &mut WingedMesh, index: VertexIndex, position: Vec3) {
        self.modify_vertex(mesh, index, |v| v.position = position);
    }

    /// Unlink a vertex from its edge
    pub fn reset_vertex(&mut self, mesh: &mut WingedMesh, index: VertexIndex) {
        self.modify_vertex(mesh, index, |v| v.edge = None);
    }

    /// Unlink an edge from its endpoints, faces and loops
    pub fn reset_edge(&mut self, mesh: &mut WingedMesh, id: EdgeId) {
        self.modify_edge(mesh, id, Edge::reset);
    }

    /// Unlink a face from its loop and T-edge
    pub fn reset_face(&mut self, mesh: &mut WingedMesh, index: FaceIndex) {
        self.modify_face(mesh, index, |f| {
            f.edge = None;
            f.t_edge = None;
        });
    }

    pub fn set_index(&mut self, mesh: &mut WingedMesh, slot: usize, vertex: VertexIndex) {
        let old = mesh.set_index(slot, vertex);
        if old != vertex {
            self.push(PartialAction::SetIndex {
                slot,
                old,
                new: vertex,
            });
        }
    }

    /// Rewrite the buffered index triple of a face
    pub fn write_face_indices(
        &mut self,
        mesh: &mut WingedMesh,
        face: FaceIndex,
        triangle: [VertexIndex; 3],
    ) {
        let first = face.first_index_slot();
        for (i, vertex) in triangle.into_iter().enumerate() {
            self.set_index(mesh, first + i, vertex);
        }
    }

    pub fn init_octree_root(&mut self, mesh: &mut WingedMesh, root: Option<OctreeRoot>) {
        let old = mesh.init_octree_root(root);
        if old != root {
            self.push(PartialAction::InitOctreeRoot { old, new: root });
        }
    }

    // ========================================================================
    // Replay
    // ========================================================================

    /// Close a freshly recorded unit
    pub fn finish(&self, mesh: &mut WingedMesh) {
        mesh.sync_octree();
        debug_validate(mesh);
    }

    pub fn undo(&self, mesh: &mut WingedMesh) {
        trace!("Undoing {} partial actions on {:?}", self.len(), mesh.id());
        for action in self.actions.iter().rev() {
            action.undo(mesh);
        }
        mesh.sync_octree();
        debug_validate(mesh);
    }

    pub fn redo(&self, mesh: &mut WingedMesh) {
        trace!("Redoing {} partial actions on {:?}", self.len(), mesh.id());
        for action in &self.actions {
            action.redo(mesh);
        }
        mesh.sync_octree();
        debug_validate(mesh);
    }
}

/// Mesh invariants must hold at every unit boundary
fn debug_validate(mesh: &WingedMesh) {
    if cfg!(debug_assertions) {
        if let Err(err) = mesh.validate() {
            panic!("mesh {:?} is inconsistent: {}", mesh.id(), err);
        }
    }
}

#[cfg(test)]
mod tests {
    use sculpt_config::OctreeConfig;
    use sculpt_mesh::{MeshId, OctreeRoot};

    use super::*;

    fn empty_mesh() -> WingedMesh {
        WingedMesh::new(MeshId(0), OctreeConfig::default())
    }

    /// Link a single triangle through a unit
    fn record_triangle(unit: &mut ActionUnit, mesh: &mut WingedMesh) -> FaceIndex {
        unit.init_octree_root(mesh, Some(OctreeRoot::new(Vec3::ZERO, 4.0)));
        let v = [Vec3::ZERO, Vec3::X, Vec3::Y].map(|p| unit.add_vertex(mesh, p, 0));
        let face = unit.add_face(mesh, 0, v);
        let e: Vec<EdgeId> = (0..3).map(|_| unit.add_edge(mesh, 0)).collect();
        for i in 0..3 {
            let (next, prev) = (e[(i + 1) % 3], e[(i + 2) % 3]);
            unit.modify_edge(mesh, e[i], |edge| {
                edge.vertex1 = Some(v[i]);
                edge.vertex2 = Some(v[(i + 1) % 3]);
                edge.left_face = Some(face);
                edge.left_successor = Some(next);
                edge.left_predecessor = Some(prev);
            });
            unit.modify_vertex(mesh, v[i], |vertex| vertex.edge = Some(e[i]));
        }
        unit.modify_face(mesh, face, |f| f.edge = Some(e[0]));
        unit.finish(mesh);
        face
    }

    #[test]
    fn test_undo_and_redo_whole_unit() {
        let mut mesh = empty_mesh();
        let mut unit = ActionUnit::new();
        record_triangle(&mut unit, &mut mesh);
        assert_eq!(mesh.face_count(), 1);
        let built = mesh.clone();

        unit.undo(&mut mesh);
        assert!(mesh.is_empty());
        assert_eq!(mesh.octree().root(), None);

        unit.redo(&mut mesh);
        assert_eq!(mesh.face_count(), 1);
        assert_eq!(mesh.buffers().indices(), built.buffers().indices());
        assert_eq!(mesh.edge_ids(), built.edge_ids());
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn test_unchanged_modification_is_not_recorded() {
        let mut mesh = empty_mesh();
        let mut unit = ActionUnit::new();
        record_triangle(&mut unit, &mut mesh);
        let len = unit.len();

        unit.move_vertex(&mut mesh, VertexIndex(0), Vec3::ZERO);
        unit.set_index(&mut mesh, 0, VertexIndex(0));
        let root = mesh.octree().root();
        unit.init_octree_root(&mut mesh, root);
        assert_eq!(unit.len(), len);
    }

    #[test]
    fn test_move_vertex_resyncs_octree_on_undo() {
        let mut mesh = empty_mesh();
        let mut setup = ActionUnit::new();
        let face = record_triangle(&mut setup, &mut mesh);

        let mut unit = ActionUnit::new();
        unit.move_vertex(&mut mesh, VertexIndex(1), Vec3::new(2.0, 0.0, 1.0));
        unit.finish(&mut mesh);
        assert_eq!(
            mesh.octree().triangle(face),
            Some(mesh.buffered_triangle(face))
        );

        unit.undo(&mut mesh);
        assert_eq!(mesh.position(VertexIndex(1)), Vec3::X);
        assert_eq!(
            mesh.octree().triangle(face),
            Some(mesh.buffered_triangle(face))
        );
    }

    #[test]
    fn test_append_keeps_order() {
        let mut mesh = empty_mesh();
        mesh.init_octree_root(Some(OctreeRoot::new(Vec3::ZERO, 4.0)));
        let mut first = ActionUnit::new();
        let a = first.add_vertex(&mut mesh, Vec3::X, 0);
        let mut second = ActionUnit::new();
        second.move_vertex(&mut mesh, a, Vec3::Y);

        first.append(&mut second);
        assert!(second.is_empty());
        assert!(matches!(
            first.actions(),
            [PartialAction::AddVertex { .. }, PartialAction::ModifyVertex { .. }]
        ));
    }
}
