//! Undoable editing on top of the winged-edge mesh kernel.
//!
//! This crate provides:
//! - Action units that record every mesh mutation for undo/redo
//! - A mesh registry and a linear history with speculative snapshots
//! - Mesh construction from indexed triangles and undoable deletion
//! - Adaptive butterfly subdivision with T-edge seams
//! - The carve brush and multi-dab sculpt strokes
//!
//! # Architecture
//!
//! Editing operations never touch a mesh directly. They record partial
//! actions into an [`ActionUnit`], which applies each change and remembers
//! how to revert it. A finished unit is wrapped in an [`Action`] and handed
//! to the [`History`].
//!
//! The octree is brought back in sync with the render buffers at every unit
//! boundary (finish, undo, redo) and between the dabs of a stroke.

pub mod action;
pub mod brush;
pub mod construct;
pub mod error;
pub mod history;
pub mod registry;
pub mod subdivide;
pub mod teardown;

pub use action::{Action, ActionUnit, PartialAction};
pub use brush::{sculpt, CarveBrush, Falloff, SculptStroke};
pub use construct::build_mesh;
pub use error::{Outcome, SculptError};
pub use history::History;
pub use registry::MeshRegistry;
pub use subdivide::{subdivide, Subdivider};
pub use teardown::delete_mesh;

pub use sculpt_config::KernelConfig;
pub use sculpt_mesh as mesh;

/// Registry and history set up from one configuration
#[derive(Debug, Default)]
pub struct Kernel {
    pub registry: MeshRegistry,
    pub history: History,
    pub brush: CarveBrush,
}

impl Kernel {
    pub fn new(config: &KernelConfig) -> Self {
        Self {
            registry: MeshRegistry::new(config.octree.clone()),
            history: History::new(&config.history),
            brush: CarveBrush::from_config(&config.brush),
        }
    }

    pub fn undo(&mut self) -> bool {
        self.history.undo(&mut self.registry)
    }

    pub fn redo(&mut self) -> bool {
        self.history.redo(&mut self.registry)
    }
}
