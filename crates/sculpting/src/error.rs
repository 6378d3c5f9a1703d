//! Operation-level failures and outcomes.
//!
//! Invariant violations inside the kernel panic. Everything a caller can
//! cause with bad input is reported here instead.

use serde::{Deserialize, Serialize};
use sculpt_mesh::{FaceIndex, MeshId, TopologyError};

/// Errors reported to callers of the editing entry points
#[derive(Debug, thiserror::Error)]
pub enum SculptError {
    #[error("Unknown mesh {0:?}")]
    UnknownMesh(MeshId),
    #[error("Unknown face {0:?}")]
    UnknownFace(FaceIndex),
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),
    #[error("Non-manifold geometry: {0}")]
    NonManifold(String),
    #[error("Invalid brush: {0}")]
    InvalidBrush(String),
    #[error(transparent)]
    Topology(#[from] TopologyError),
}

/// Result of one attempted operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// The operation changed the mesh; its action is kept
    Succeeded,
    /// Nothing to do; no history is registered
    NoOp,
    /// The operation could not produce a valid result and must be rolled back
    Failed,
}
