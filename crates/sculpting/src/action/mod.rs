//! Undoable actions.
//!
//! An [`ActionUnit`] records the partial actions one operation performs on a
//! single mesh. An [`Action`] is what history stores: a unit tied to its
//! mesh, plus the registry bookkeeping for meshes that come and go.

mod partial;
mod unit;

pub use partial::PartialAction;
pub use unit::ActionUnit;

use sculpt_mesh::MeshId;
use tracing::debug;

use crate::registry::MeshRegistry;

/// A history entry
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Edit of an existing mesh
    Edit { mesh: MeshId, unit: ActionUnit },
    /// Mesh registered and built by `unit`
    NewMesh { mesh: MeshId, unit: ActionUnit },
    /// Mesh torn down by `unit` and unregistered
    DeleteMesh { mesh: MeshId, unit: ActionUnit },
    /// Actions undone and redone together, e.g. a kept speculation
    Group(Vec<Action>),
}

impl Action {
    pub fn is_empty(&self) -> bool {
        match self {
            Action::Edit { unit, .. } => unit.is_empty(),
            Action::NewMesh { .. } | Action::DeleteMesh { .. } => false,
            Action::Group(actions) => actions.iter().all(Action::is_empty),
        }
    }

    /// Number of partial actions, summed over groups
    pub fn partial_count(&self) -> usize {
        match self {
            Action::Edit { unit, .. }
            | Action::NewMesh { unit, .. }
            | Action::DeleteMesh { unit, .. } => unit.len(),
            Action::Group(actions) => actions.iter().map(Action::partial_count).sum(),
        }
    }

    pub fn undo(&self, registry: &mut MeshRegistry) {
        match self {
            Action::Edit { mesh, unit } => unit.undo(registry.expect_mut(*mesh)),
            Action::NewMesh { mesh, unit } => {
                unit.undo(registry.expect_mut(*mesh));
                registry.remove(*mesh);
            }
            Action::DeleteMesh { mesh, unit } => {
                unit.undo(registry.restore(*mesh));
                debug!("Undid deletion of {:?}", mesh);
            }
            Action::Group(actions) => {
                for action in actions.iter().rev() {
                    action.undo(registry);
                }
            }
        }
    }

    pub fn redo(&self, registry: &mut MeshRegistry) {
        match self {
            Action::Edit { mesh, unit } => unit.redo(registry.expect_mut(*mesh)),
            Action::NewMesh { mesh, unit } => unit.redo(registry.restore(*mesh)),
            Action::DeleteMesh { mesh, unit } => {
                unit.redo(registry.expect_mut(*mesh));
                registry.remove(*mesh);
            }
            Action::Group(actions) => {
                for action in actions {
                    action.redo(registry);
                }
            }
        }
    }
}
