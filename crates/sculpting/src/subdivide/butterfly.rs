//! Modified butterfly stencil for placing new edge vertices.
//!
//! The stencil reads the ring of each endpoint as it was at the level being
//! refined: T-edges are skipped, and neighbours created by finer refinement
//! are traced back through their parents to the coarse vertex they replace.

use std::f32::consts::TAU;

use glam::Vec3;
use sculpt_mesh::{EdgeId, VertexIndex, WingedMesh};

const REGULAR_VALENCE: usize = 6;

/// Position of the vertex inserted on `edge` while refining faces of `level`
///
/// Falls back to the edge midpoint near boundaries and where the coarse
/// ring cannot be reconstructed.
pub fn subdivide_edge(mesh: &WingedMesh, edge: EdgeId, level: u32) -> Vec3 {
    let record = mesh.expect_edge(edge);
    let (a, b) = record.vertices();
    let (pa, pb) = (mesh.position(a), mesh.position(b));
    let midpoint = (pa + pb) * 0.5;

    if record.is_boundary() {
        return midpoint;
    }
    let (Some(ring_a), Some(ring_b)) = (coarse_ring(mesh, a, b, level), coarse_ring(mesh, b, a, level))
    else {
        return midpoint;
    };
    if ring_a.len() < 3 || ring_b.len() < 3 {
        return midpoint;
    }

    match (ring_a.len() == REGULAR_VALENCE, ring_b.len() == REGULAR_VALENCE) {
        (true, true) => regular(pa, pb, &ring_a, &ring_b),
        (false, true) => extraordinary(pa, &ring_a),
        (true, false) => extraordinary(pb, &ring_b),
        (false, false) => (extraordinary(pa, &ring_a) + extraordinary(pb, &ring_b)) * 0.5,
    }
}

/// Positions of the coarse ring of `center`, starting at `first`
fn coarse_ring(mesh: &WingedMesh, center: VertexIndex, first: VertexIndex, level: u32) -> Option<Vec<Vec3>> {
    if mesh.is_boundary_vertex(center) {
        return None;
    }

    let mut ring = Vec::new();
    for e in mesh.vertex_edges(center) {
        let edge = mesh.expect_edge(e);
        if edge.is_t_edge {
            continue;
        }
        let mut neighbour = edge.other_vertex(center);
        loop {
            let vertex = mesh.expect_vertex(neighbour);
            if vertex.level <= level {
                break;
            }
            neighbour = vertex.other_parent(center)?;
        }
        ring.push(neighbour);
    }

    let start = ring.iter().position(|&v| v == first)?;
    ring.rotate_left(start);
    Some(ring.into_iter().map(|v| mesh.position(v)).collect())
}

/// Both endpoints have valence six
fn regular(a: Vec3, b: Vec3, ring_a: &[Vec3], ring_b: &[Vec3]) -> Vec3 {
    (a + b) * 0.5 + (ring_a[1] + ring_a[5]) * 0.125
        - (ring_a[2] + ring_a[4] + ring_b[2] + ring_b[4]) * 0.0625
}

/// Stencil around one extraordinary endpoint; `ring[0]` is the other endpoint
fn extraordinary(center: Vec3, ring: &[Vec3]) -> Vec3 {
    let weights = extraordinary_weights(ring.len());
    ring.iter()
        .zip(weights)
        .fold(center * 0.75, |acc, (&p, w)| acc + p * w)
}

fn extraordinary_weights(valence: usize) -> Vec<f32> {
    match valence {
        3 => vec![5.0 / 12.0, -1.0 / 12.0, -1.0 / 12.0],
        4 => vec![3.0 / 8.0, 0.0, -1.0 / 8.0, 0.0],
        k => (0..k)
            .map(|j| {
                let angle = TAU * j as f32 / k as f32;
                (0.25 + angle.cos() + 0.5 * (2.0 * angle).cos()) / k as f32
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::construct::build_mesh;
    use crate::history::History;
    use crate::registry::MeshRegistry;
    use sculpt_mesh::MeshGeometry;

    fn build(geometry: &MeshGeometry) -> (MeshRegistry, sculpt_mesh::MeshId) {
        let mut registry = MeshRegistry::default();
        let mut history = History::default();
        let id = build_mesh(&mut registry, &mut history, geometry).unwrap();
        (registry, id)
    }

    #[test]
    fn test_weights_sum_to_quarter() {
        // 3/4 on the centre plus the ring weights must reproduce constants
        for k in 3..10 {
            let sum: f32 = extraordinary_weights(k).iter().sum();
            assert!((sum - 0.25).abs() < 1e-5, "valence {}: {}", k, sum);
        }
    }

    #[test]
    fn test_boundary_edge_uses_midpoint() {
        let (registry, id) = build(&MeshGeometry::triangle());
        let mesh = registry.get(id).unwrap();
        let edge = mesh.edge_ids()[0];
        let (a, b) = mesh.expect_edge(edge).vertices();
        let expected = (mesh.position(a) + mesh.position(b)) * 0.5;
        assert_eq!(subdivide_edge(mesh, edge, 0), expected);
    }

    #[test]
    fn test_flat_regular_region_stays_flat() {
        let (registry, id) = build(&MeshGeometry::grid(6, 1.0));
        let mesh = registry.get(id).unwrap();
        let centre = VertexIndex(3 * 7 + 3);
        assert_eq!(mesh.valence(centre), 6);
        for e in mesh.vertex_edges(centre) {
            let p = subdivide_edge(mesh, e, 0);
            assert!(p.z.abs() < 1e-6);
        }
    }

    #[test]
    fn test_octahedron_stencil_is_symmetric() {
        // Every edge of the octahedron joins two valence-4 vertices on the
        // unit sphere; the inserted vertex sits on the edge's bisector
        let (registry, id) = build(&MeshGeometry::octahedron());
        let mesh = registry.get(id).unwrap();
        for e in mesh.edge_ids() {
            let (a, b) = mesh.expect_edge(e).vertices();
            let p = subdivide_edge(mesh, e, 0);
            let (pa, pb) = (mesh.position(a), mesh.position(b));
            assert!((p.distance(pa) - p.distance(pb)).abs() < 1e-5);
            // Pushed outward past the flat midpoint
            assert!(p.length() > ((pa + pb) * 0.5).length());
        }
    }
}
