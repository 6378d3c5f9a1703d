//! Validation methods for WingedMesh.
//!
//! Checks, in order:
//! - Edge links (endpoints, faces, loop pointers) are present and symmetric
//! - Every face loop is a triangle referencing the face
//! - T-edge markers agree between faces and edges
//! - Every vertex ring closes over all incident edges (no bow-ties)
//! - Render buffers match topology, and the octree holds exactly the live
//!   faces at placements that fit their geometry

use std::collections::HashMap;

use super::types::Edge;
use super::WingedMesh;
use crate::id::{EdgeId, FaceIndex, VertexIndex};

/// A violated mesh invariant
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TopologyError {
    #[error("Vertex {0:?}: {1}")]
    Vertex(VertexIndex, String),
    #[error("Edge {0:?}: {1}")]
    Edge(EdgeId, String),
    #[error("Face {0:?}: {1}")]
    Face(FaceIndex, String),
    #[error("Non-manifold vertex {0:?}")]
    NonManifoldVertex(VertexIndex),
    #[error("Render buffer mismatch at face {0:?}")]
    Buffer(FaceIndex),
    #[error("Octree out of sync: {0}")]
    Octree(String),
}

impl WingedMesh {
    /// Check every mesh invariant.
    ///
    /// Open patches are accepted: an edge may lack one of its faces, in
    /// which case that side carries no loop pointers.
    pub fn validate(&self) -> Result<(), TopologyError> {
        self.validate_edges()?;
        self.validate_faces()?;
        self.validate_vertices()?;
        self.validate_buffers()?;
        self.validate_octree()
    }

    fn validate_edges(&self) -> Result<(), TopologyError> {
        for edge in self.edges.values() {
            let err = |msg: String| TopologyError::Edge(edge.id, msg);

            let (Some(v1), Some(v2)) = (edge.vertex1, edge.vertex2) else {
                return Err(err("missing endpoint".to_string()));
            };
            if v1 == v2 {
                return Err(err(format!("both endpoints are {:?}", v1)));
            }
            for v in [v1, v2] {
                if self.vertex(v).is_none() {
                    return Err(err(format!("endpoint {:?} does not exist", v)));
                }
            }
            if edge.left_face.is_none() && edge.right_face.is_none() {
                return Err(err("no adjacent face".to_string()));
            }
            if edge.left_face.is_some() && edge.left_face == edge.right_face {
                return Err(err("same face on both sides".to_string()));
            }

            let sides = [
                (edge.left_face, edge.left_predecessor, edge.left_successor),
                (edge.right_face, edge.right_predecessor, edge.right_successor),
            ];
            for (face, predecessor, successor) in sides {
                let Some(face) = face else {
                    if predecessor.is_some() || successor.is_some() {
                        return Err(err("loop pointers on a face-less side".to_string()));
                    }
                    continue;
                };
                if self.face(face).is_none() {
                    return Err(err(format!("face {:?} does not exist", face)));
                }
                let (Some(pred), Some(succ)) = (predecessor, successor) else {
                    return Err(err(format!("missing loop pointer in {:?}", face)));
                };
                let (start, end) = if edge.is_left_face(face) { (v1, v2) } else { (v2, v1) };

                let Some(pred_side) = self.edge(pred).and_then(|e| side_of(e, face)) else {
                    return Err(err(format!("predecessor {:?} is not in {:?}", pred, face)));
                };
                if pred_side.successor != Some(edge.id) || pred_side.to != Some(start) {
                    return Err(err(format!("predecessor {:?} does not lead here", pred)));
                }

                let Some(succ_side) = self.edge(succ).and_then(|e| side_of(e, face)) else {
                    return Err(err(format!("successor {:?} is not in {:?}", succ, face)));
                };
                if succ_side.predecessor != Some(edge.id) || succ_side.from != Some(end) {
                    return Err(err(format!("successor {:?} does not follow here", succ)));
                }
            }
        }
        Ok(())
    }

    fn validate_faces(&self) -> Result<(), TopologyError> {
        for face in self.faces() {
            let err = |msg: String| TopologyError::Face(face.index, msg);

            let Some(loop_edges) = self.try_face_edges(face.index) else {
                return Err(err("broken edge loop".to_string()));
            };
            if loop_edges.len() != 3 {
                return Err(err(format!("loop has {} edges", loop_edges.len())));
            }

            if let Some(t) = face.t_edge {
                if !loop_edges.contains(&t) {
                    return Err(err(format!("T-edge {:?} is not in the loop", t)));
                }
                if !self.edge(t).is_some_and(|e| e.is_t_edge) {
                    return Err(err(format!("T-edge {:?} is not marked", t)));
                }
            }
        }

        for edge in self.edges.values().filter(|e| e.is_t_edge) {
            let marked = [edge.left_face, edge.right_face]
                .into_iter()
                .all(|f| f.and_then(|f| self.face(f)).is_some_and(|f| f.t_edge == Some(edge.id)));
            if !marked {
                return Err(TopologyError::Edge(
                    edge.id,
                    "T-edge not referenced by both faces".to_string(),
                ));
            }
        }
        Ok(())
    }

    fn validate_vertices(&self) -> Result<(), TopologyError> {
        let mut incident: HashMap<VertexIndex, usize> = HashMap::new();
        for edge in self.edges.values() {
            let (v1, v2) = edge.vertices();
            *incident.entry(v1).or_default() += 1;
            *incident.entry(v2).or_default() += 1;
        }

        for vertex in self.vertices() {
            let err = |msg: String| TopologyError::Vertex(vertex.index, msg);

            let Some(edge) = vertex.edge else {
                return Err(err("no incident edge".to_string()));
            };
            if !self.edge(edge).is_some_and(|e| e.is_incident_to(vertex.index)) {
                return Err(err(format!("edge {:?} is not incident", edge)));
            }
            let Some(ring) = self.try_vertex_edges(vertex.index) else {
                return Err(err("broken edge ring".to_string()));
            };
            if ring.len() != incident.get(&vertex.index).copied().unwrap_or(0) {
                return Err(TopologyError::NonManifoldVertex(vertex.index));
            }
        }
        Ok(())
    }

    fn validate_buffers(&self) -> Result<(), TopologyError> {
        for vertex in self.vertices() {
            if self.buffers.position(vertex.index) != vertex.position {
                return Err(TopologyError::Vertex(
                    vertex.index,
                    "buffered position differs".to_string(),
                ));
            }
        }

        for face in self.faces() {
            let topology = self.face_vertices(face.index);
            let buffered = self.buffers.face_indices(face.index);
            let rotation_matches =
                (0..3).any(|r| (0..3).all(|i| buffered[(i + r) % 3] == topology[i]));
            if !rotation_matches {
                return Err(TopologyError::Buffer(face.index));
            }
        }
        Ok(())
    }

    fn validate_octree(&self) -> Result<(), TopologyError> {
        let live: Vec<FaceIndex> = self.faces().map(|f| f.index).collect();
        let indexed = self.octree.faces();
        if live != indexed {
            return Err(TopologyError::Octree(format!(
                "{} live faces, {} indexed",
                live.len(),
                indexed.len()
            )));
        }

        let mut stale = None;
        self.octree.for_each_face(|face, triangle| {
            if stale.is_none() && *triangle != self.buffers.triangle(face) {
                stale = Some(face);
            }
        });
        if let Some(face) = stale {
            return Err(TopologyError::Octree(format!("{:?} has stale geometry", face)));
        }

        for face in live {
            if !self.octree.placement_fits(face) {
                return Err(TopologyError::Octree(format!("{:?} does not fit its node", face)));
            }
        }
        Ok(())
    }
}

/// One side of an edge as seen from a face's loop
struct Side {
    predecessor: Option<EdgeId>,
    successor: Option<EdgeId>,
    from: Option<VertexIndex>,
    to: Option<VertexIndex>,
}

fn side_of(edge: &Edge, face: FaceIndex) -> Option<Side> {
    if edge.is_left_face(face) {
        Some(Side {
            predecessor: edge.left_predecessor,
            successor: edge.left_successor,
            from: edge.vertex1,
            to: edge.vertex2,
        })
    } else if edge.is_right_face(face) {
        Some(Side {
            predecessor: edge.right_predecessor,
            successor: edge.right_successor,
            from: edge.vertex2,
            to: edge.vertex1,
        })
    } else {
        None
    }
}
