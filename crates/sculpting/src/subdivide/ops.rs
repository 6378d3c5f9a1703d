//! Local topology operations used by adaptive subdivision.
//!
//! Every change goes through an [`ActionUnit`], so each operation is undone
//! together with the subdivision that issued it.

use std::collections::BTreeSet;

use glam::Vec3;
use sculpt_mesh::{EdgeId, FaceIndex, VertexIndex, WingedMesh};
use tracing::trace;

use crate::action::ActionUnit;

/// Remove the T-edges of `faces`, merging each pair of T-faces back into the
/// quad they were split from. The left face of a T-edge survives.
///
/// Returns `faces` without the merged-away right faces.
pub fn delete_t_edges(
    unit: &mut ActionUnit,
    mesh: &mut WingedMesh,
    faces: &BTreeSet<FaceIndex>,
) -> BTreeSet<FaceIndex> {
    let t_edges: BTreeSet<EdgeId> = faces
        .iter()
        .filter_map(|&f| mesh.expect_face(f).t_edge)
        .collect();
    let mut remaining = faces.clone();

    for t in t_edges {
        let edge = mesh.expect_edge(t);
        let (Some(left), Some(right)) = (edge.left_face, edge.right_face) else {
            panic!("T-edge {:?} lacks a face", t);
        };
        let lp = edge.predecessor(left);
        let ls = edge.successor(left);
        let rp = edge.predecessor(right);
        let rs = edge.successor(right);

        for e in mesh.face_edges(right) {
            if e != t {
                unit.modify_edge(mesh, e, |x| x.replace_face(right, left));
            }
        }
        unit.modify_edge(mesh, lp, |x| x.set_successor(left, rs));
        unit.modify_edge(mesh, rs, |x| x.set_predecessor(left, lp));
        unit.modify_edge(mesh, rp, |x| x.set_successor(left, ls));
        unit.modify_edge(mesh, ls, |x| x.set_predecessor(left, rp));

        let (v1, v2) = edge.vertices();
        if mesh.expect_vertex(v1).edge == Some(t) {
            unit.modify_vertex(mesh, v1, |v| v.edge = Some(lp));
        }
        if mesh.expect_vertex(v2).edge == Some(t) {
            unit.modify_vertex(mesh, v2, |v| v.edge = Some(ls));
        }

        unit.modify_face(mesh, left, |f| {
            f.edge = Some(lp);
            f.t_edge = None;
        });
        unit.reset_face(mesh, right);
        unit.delete_face(mesh, right);
        unit.reset_edge(mesh, t);
        unit.delete_edge(mesh, t);

        remaining.remove(&right);
        trace!("Merged {:?} into {:?} across T-edge {:?}", right, left, t);
    }
    remaining
}

/// Split `edge` at a new vertex placed at `position`.
///
/// The original edge keeps its first half; a new edge covers the second.
/// The new vertex remembers both endpoints as its parents.
pub fn insert_edge_vertex(
    unit: &mut ActionUnit,
    mesh: &mut WingedMesh,
    edge: EdgeId,
    position: Vec3,
    level: u32,
) -> VertexIndex {
    let record = mesh.expect_edge(edge);
    let (v1, v2) = record.vertices();
    let (left, right) = (record.left_face, record.right_face);

    let middle = unit.add_vertex(mesh, position, level);
    let second = unit.add_edge(mesh, level);

    unit.modify_vertex(mesh, middle, |v| {
        v.edge = Some(edge);
        v.parents = Some((v1, v2));
    });
    unit.modify_edge(mesh, second, |e| {
        e.vertex1 = Some(middle);
        e.vertex2 = Some(v2);
        e.left_face = left;
        e.right_face = right;
        if left.is_some() {
            e.left_predecessor = Some(edge);
            e.left_successor = record.left_successor;
        }
        if right.is_some() {
            e.right_predecessor = record.right_predecessor;
            e.right_successor = Some(edge);
        }
    });
    unit.modify_edge(mesh, edge, |e| {
        e.vertex2 = Some(middle);
        e.level = level;
        if left.is_some() {
            e.left_successor = Some(second);
        }
        if right.is_some() {
            e.right_predecessor = Some(second);
        }
    });

    if let (Some(face), Some(ls)) = (left, record.left_successor) {
        unit.modify_edge(mesh, ls, |e| e.set_predecessor(face, second));
    }
    if let (Some(face), Some(rp)) = (right, record.right_predecessor) {
        unit.modify_edge(mesh, rp, |e| e.set_successor(face, second));
    }
    if mesh.expect_vertex(v2).edge == Some(edge) {
        unit.modify_vertex(mesh, v2, |v| v.edge = Some(second));
    }
    middle
}

/// Split a six-gon (a triangle with a new vertex on each edge) into four
/// triangles one level finer. The face keeps its index as the centre child.
pub fn triangulate_six_gon(
    unit: &mut ActionUnit,
    mesh: &mut WingedMesh,
    face: FaceIndex,
    affected: &mut BTreeSet<FaceIndex>,
) {
    let level = mesh.expect_face(face).level;
    let loop_edges = mesh.face_edges(face);
    assert_eq!(loop_edges.len(), 6, "face {:?} is not a six-gon", face);

    let is_corner = |mesh: &WingedMesh, e: EdgeId| {
        let v = mesh.expect_edge(e).first_vertex(face);
        mesh.expect_vertex(v).level <= level
    };
    let Some(start) = loop_edges.iter().position(|&e| is_corner(mesh, e)) else {
        panic!("six-gon {:?} has no corner", face);
    };
    let edge_at = |i: usize| loop_edges[(start + i) % 6];
    let a = [edge_at(0), edge_at(2), edge_at(4)];
    let b = [edge_at(1), edge_at(3), edge_at(5)];
    debug_assert!(b.iter().all(|&e| !is_corner(mesh, e)));

    let corners = a.map(|e| mesh.expect_edge(e).first_vertex(face));
    let middles = b.map(|e| mesh.expect_edge(e).first_vertex(face));

    let children: [FaceIndex; 3] = std::array::from_fn(|k| {
        unit.add_face(mesh, level + 1, [corners[k], middles[k], middles[(k + 2) % 3]])
    });
    let inner: [EdgeId; 3] = std::array::from_fn(|_| unit.add_edge(mesh, level + 1));

    for k in 0..3 {
        let (child, prev) = (children[k], (k + 2) % 3);
        unit.modify_edge(mesh, inner[k], |e| {
            e.vertex1 = Some(middles[k]);
            e.vertex2 = Some(middles[prev]);
            e.left_face = Some(child);
            e.right_face = Some(face);
            e.left_predecessor = Some(a[k]);
            e.left_successor = Some(b[prev]);
            e.right_predecessor = Some(inner[prev]);
            e.right_successor = Some(inner[(k + 1) % 3]);
        });
        unit.modify_edge(mesh, a[k], |e| {
            e.replace_face(face, child);
            e.set_successor(child, inner[k]);
            e.set_predecessor(child, b[prev]);
        });
        unit.modify_edge(mesh, b[prev], |e| {
            e.replace_face(face, child);
            e.set_predecessor(child, inner[k]);
            e.set_successor(child, a[k]);
        });
        unit.modify_face(mesh, child, |f| f.edge = Some(a[k]));
    }

    unit.modify_face(mesh, face, |f| {
        f.edge = Some(inner[0]);
        f.t_edge = None;
        f.level = level + 1;
    });
    unit.write_face_indices(mesh, face, middles);

    affected.insert(face);
    affected.extend(children);
}

/// Split a quad (a triangle with a new vertex on one edge) into two
/// triangles joined by a T-edge. Both halves keep the face's level.
pub fn triangulate_quad(
    unit: &mut ActionUnit,
    mesh: &mut WingedMesh,
    face: FaceIndex,
    affected: &mut BTreeSet<FaceIndex>,
) {
    let level = mesh.expect_face(face).level;
    let loop_edges = mesh.face_edges(face);
    assert_eq!(loop_edges.len(), 4, "face {:?} is not a quad", face);

    let Some(start) = loop_edges.iter().position(|&e| {
        let v = mesh.expect_edge(e).first_vertex(face);
        mesh.expect_vertex(v).level > level
    }) else {
        panic!("quad {:?} has no inserted vertex", face);
    };
    let [x, y, z, w] = std::array::from_fn(|i| loop_edges[(start + i) % 4]);
    let [middle, c2, c0, c1] = [x, y, z, w].map(|e| mesh.expect_edge(e).first_vertex(face));

    let half = unit.add_face(mesh, level, [middle, c0, c1]);
    let t = unit.add_edge(mesh, level + 1);
    unit.modify_edge(mesh, t, |e| {
        e.vertex1 = Some(middle);
        e.vertex2 = Some(c0);
        e.left_face = Some(half);
        e.right_face = Some(face);
        e.left_predecessor = Some(w);
        e.left_successor = Some(z);
        e.right_predecessor = Some(y);
        e.right_successor = Some(x);
        e.is_t_edge = true;
    });

    unit.modify_edge(mesh, z, |e| {
        e.replace_face(face, half);
        e.set_predecessor(half, t);
        e.set_successor(half, w);
    });
    unit.modify_edge(mesh, w, |e| {
        e.replace_face(face, half);
        e.set_predecessor(half, z);
        e.set_successor(half, t);
    });
    unit.modify_edge(mesh, x, |e| {
        e.set_predecessor(face, t);
        e.set_successor(face, y);
    });
    unit.modify_edge(mesh, y, |e| {
        e.set_predecessor(face, x);
        e.set_successor(face, t);
    });

    unit.modify_face(mesh, face, |f| {
        f.edge = Some(x);
        f.t_edge = Some(t);
    });
    unit.modify_face(mesh, half, |f| {
        f.edge = Some(t);
        f.t_edge = Some(t);
    });
    unit.modify_vertex(mesh, middle, |v| v.is_t_vertex = true);
    unit.write_face_indices(mesh, face, [middle, c2, c0]);

    affected.insert(face);
    affected.insert(half);
}
