//! Undoable mesh deletion.

use tracing::info;

use crate::action::{Action, ActionUnit};
use crate::error::SculptError;
use crate::history::History;
use crate::registry::MeshRegistry;
use sculpt_mesh::{FaceIndex, MeshId, VertexIndex};

/// Tear down every element of a mesh, unregister it and record the deletion.
///
/// Elements are unlinked before they are deleted, so undo re-creates them
/// unlinked and then restores their links. The octree root goes last, which
/// makes it the first thing undo restores.
pub fn delete_mesh(
    registry: &mut MeshRegistry,
    history: &mut History,
    id: MeshId,
) -> Result<(), SculptError> {
    let mesh = registry.get_mut(id).ok_or(SculptError::UnknownMesh(id))?;
    let mut unit = ActionUnit::new();

    let faces: Vec<FaceIndex> = mesh.faces().map(|f| f.index).collect();
    let vertices: Vec<VertexIndex> = mesh.vertices().map(|v| v.index).collect();
    let edges = mesh.edge_ids();
    info!(
        "Deleting mesh {:?}: {} vertices, {} faces, {} edges",
        id,
        vertices.len(),
        faces.len(),
        edges.len()
    );

    for &face in &faces {
        unit.reset_face(mesh, face);
    }
    for &vertex in &vertices {
        unit.reset_vertex(mesh, vertex);
    }
    for &edge in &edges {
        unit.reset_edge(mesh, edge);
    }

    while let Some(face) = mesh.some_face() {
        unit.delete_face(mesh, face);
    }
    assert_eq!(mesh.face_count(), 0, "faces of {:?} missing from the octree", id);
    for &vertex in vertices.iter().rev() {
        unit.delete_vertex(mesh, vertex);
    }
    for &edge in &edges {
        unit.delete_edge(mesh, edge);
    }
    unit.init_octree_root(mesh, None);
    unit.finish(mesh);

    registry.remove(id);
    history.add_action(Action::DeleteMesh { mesh: id, unit });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::construct::build_mesh;
    use sculpt_mesh::MeshGeometry;

    #[test]
    fn test_delete_and_restore() {
        let mut registry = MeshRegistry::default();
        let mut history = History::default();
        let id = build_mesh(&mut registry, &mut history, &MeshGeometry::icosahedron()).unwrap();
        let before = registry.get(id).unwrap().clone();

        delete_mesh(&mut registry, &mut history, id).unwrap();
        assert!(!registry.contains(id));

        assert!(history.undo(&mut registry));
        let restored = registry.get(id).unwrap();
        assert!(restored.validate().is_ok());
        assert_eq!(restored.buffers().indices(), before.buffers().indices());
        assert_eq!(restored.buffers().positions(), before.buffers().positions());
        assert_eq!(restored.edge_ids(), before.edge_ids());
        assert_eq!(restored.octree().root(), before.octree().root());
        for edge in before.edges() {
            assert_eq!(restored.edge(edge.id), Some(edge));
        }

        assert!(history.redo(&mut registry));
        assert!(!registry.contains(id));
    }

    #[test]
    fn test_unknown_mesh() {
        let mut registry = MeshRegistry::default();
        let mut history = History::default();
        let result = delete_mesh(&mut registry, &mut history, MeshId(3));
        assert!(matches!(result, Err(SculptError::UnknownMesh(MeshId(3)))));
        assert!(!history.can_undo());
    }
}
