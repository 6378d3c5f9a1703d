//! Owner of every live mesh.

use std::collections::BTreeMap;

use sculpt_config::OctreeConfig;
use sculpt_mesh::{IdGenerator, MeshId, WingedMesh};
use tracing::debug;

/// Registry of meshes addressed by [`MeshId`]
#[derive(Debug, Clone, Default)]
pub struct MeshRegistry {
    meshes: BTreeMap<MeshId, WingedMesh>,
    ids: IdGenerator,
    octree: OctreeConfig,
}

impl MeshRegistry {
    pub fn new(octree: OctreeConfig) -> Self {
        Self {
            meshes: BTreeMap::new(),
            ids: IdGenerator::new(),
            octree,
        }
    }

    pub fn octree_config(&self) -> &OctreeConfig {
        &self.octree
    }

    /// Register an empty mesh under a fresh id.
    ///
    /// Creating an empty mesh is not recorded; history only tracks meshes
    /// through the geometry they are built with.
    pub fn new_mesh(&mut self) -> MeshId {
        let id = MeshId(self.ids.next_id());
        self.meshes
            .insert(id, WingedMesh::new(id, self.octree.clone()));
        debug!("Created mesh {:?}", id);
        id
    }

    pub fn get(&self, id: MeshId) -> Option<&WingedMesh> {
        self.meshes.get(&id)
    }

    pub fn get_mut(&mut self, id: MeshId) -> Option<&mut WingedMesh> {
        self.meshes.get_mut(&id)
    }

    pub fn contains(&self, id: MeshId) -> bool {
        self.meshes.contains_key(&id)
    }

    pub fn ids(&self) -> impl Iterator<Item = MeshId> + '_ {
        self.meshes.keys().copied()
    }

    pub fn meshes(&self) -> impl Iterator<Item = &WingedMesh> + '_ {
        self.meshes.values()
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    /// A mesh that history expects to exist
    pub(crate) fn expect_mut(&mut self, id: MeshId) -> &mut WingedMesh {
        match self.meshes.get_mut(&id) {
            Some(mesh) => mesh,
            None => panic!("mesh {:?} is not registered", id),
        }
    }

    /// Re-register an empty mesh under a previously used id
    pub(crate) fn restore(&mut self, id: MeshId) -> &mut WingedMesh {
        assert!(!self.meshes.contains_key(&id), "mesh {:?} is already registered", id);
        self.ids.reserve(id.0);
        debug!("Restored mesh {:?}", id);
        self.meshes
            .entry(id)
            .or_insert_with(|| WingedMesh::new(id, self.octree.clone()))
    }

    /// Unregister a mesh that has been emptied
    pub(crate) fn remove(&mut self, id: MeshId) -> WingedMesh {
        let Some(mesh) = self.meshes.remove(&id) else {
            panic!("mesh {:?} is not registered", id);
        };
        assert!(mesh.is_empty(), "mesh {:?} is removed while holding elements", id);
        debug!("Removed mesh {:?}", id);
        mesh
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_not_reused() {
        let mut registry = MeshRegistry::default();
        let a = registry.new_mesh();
        let b = registry.new_mesh();
        assert_ne!(a, b);

        registry.remove(b);
        let c = registry.new_mesh();
        assert_ne!(b, c);
        assert_eq!(registry.ids().collect::<Vec<_>>(), vec![a, c]);
    }

    #[test]
    fn test_restore_reserves_id() {
        let mut registry = MeshRegistry::default();
        registry.restore(MeshId(7));
        assert!(registry.contains(MeshId(7)));
        assert_eq!(registry.new_mesh(), MeshId(8));
    }

    #[test]
    #[should_panic(expected = "already registered")]
    fn test_restore_existing_panics() {
        let mut registry = MeshRegistry::default();
        let id = registry.new_mesh();
        registry.restore(id);
    }
}
