//! Mesh kernel for the sculpting engine.
//!
//! This crate provides:
//! - Element identifiers and the slot arena they address
//! - The winged-edge mesh with atomic add/delete/write primitives
//! - A loose octree over face geometry with sphere and ray queries
//! - Geometric primitives and primitive mesh generators

pub mod arena;
pub mod geometry;
pub mod id;
pub mod octree;
pub mod primitive;
pub mod winged;

pub use arena::IndexedList;
pub use geometry::MeshGeometry;
pub use id::{EdgeId, FaceIndex, IdGenerator, MeshId, VertexIndex};
pub use octree::{Octree, OctreeHit, OctreeRoot};
pub use primitive::{Aabb, Ray, Sphere, Triangle, TriangleHit};
pub use winged::{Edge, Face, MeshBuffers, TopologyError, Vertex, WingedMesh};
