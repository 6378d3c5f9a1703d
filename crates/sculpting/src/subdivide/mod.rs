//! Adaptive butterfly subdivision.
//!
//! Subdividing a face refines it together with a neighbourhood of faces at
//! the same level, so that levels of adjacent faces never differ by more
//! than one. Faces bordering the refined region are split in two by a
//! T-edge; the next subdivision that reaches them merges them back first.
//!
//! Adjacent coarser faces are subdivided before the neighbourhood is
//! refined, which may recurse.

mod butterfly;
mod ops;

pub use butterfly::subdivide_edge;
pub use ops::{delete_t_edges, insert_edge_vertex, triangulate_quad, triangulate_six_gon};

use std::collections::BTreeSet;

use sculpt_mesh::{FaceIndex, MeshId, WingedMesh};
use tracing::{debug, info};

use crate::action::{Action, ActionUnit};
use crate::error::{Outcome, SculptError};
use crate::history::History;
use crate::registry::MeshRegistry;

/// Subdivide `face` of a registered mesh and record the change.
///
/// Returns [`Outcome::NoOp`] if nothing needed refining.
pub fn subdivide(
    registry: &mut MeshRegistry,
    history: &mut History,
    id: MeshId,
    face: FaceIndex,
) -> Result<Outcome, SculptError> {
    let mesh = registry.get_mut(id).ok_or(SculptError::UnknownMesh(id))?;
    if mesh.face(face).is_none() {
        return Err(SculptError::UnknownFace(face));
    }

    let mut unit = ActionUnit::new();
    let mut affected = BTreeSet::new();
    Subdivider::run(&mut unit, mesh, face, &mut affected);
    unit.finish(mesh);

    if unit.is_empty() {
        return Ok(Outcome::NoOp);
    }
    info!(
        "Subdivided {:?} of {:?}: {} faces affected, {} faces total",
        face,
        id,
        affected.len(),
        mesh.face_count()
    );
    history.add_action(Action::Edit { mesh: id, unit });
    Ok(Outcome::Succeeded)
}

/// One subdivision run, recording into a caller-owned unit
pub struct Subdivider<'a> {
    unit: &'a mut ActionUnit,
    mesh: &'a mut WingedMesh,
    affected: &'a mut BTreeSet<FaceIndex>,
}

impl<'a> Subdivider<'a> {
    /// Subdivide `face` and collect every live face the run created or
    /// changed into `affected`. Returns the face the selection ended up in.
    pub fn run(
        unit: &'a mut ActionUnit,
        mesh: &'a mut WingedMesh,
        face: FaceIndex,
        affected: &'a mut BTreeSet<FaceIndex>,
    ) -> FaceIndex {
        let mut run = Self {
            unit,
            mesh,
            affected,
        };
        let selection = run.subdivide(face);
        let mesh = &*run.mesh;
        run.affected.retain(|&f| mesh.face(f).is_some());
        selection
    }

    fn subdivide(&mut self, face: FaceIndex) -> FaceIndex {
        let selection = self.refine_selection(face);
        let level = self.mesh.expect_face(selection).level;

        loop {
            match self.mesh.face(selection) {
                Some(f) if f.level <= level => {}
                _ => return selection,
            }
            let Some(neighbourhood) = self.neighbourhood(selection, level) else {
                continue;
            };
            let Some(border) = self.border(&neighbourhood, level) else {
                continue;
            };
            debug!(
                "Refining {} faces at level {} ({} border faces)",
                neighbourhood.len(),
                level,
                border.len()
            );
            self.subdivide_faces(&neighbourhood, level);
            self.refine_border(&border, level);
            return selection;
        }
    }

    /// The face that survives when the T-edge of `face` is removed
    fn refine_selection(&self, face: FaceIndex) -> FaceIndex {
        let record = self.mesh.expect_face(face);
        match record.t_edge.map(|t| self.mesh.expect_edge(t)) {
            Some(t) if t.is_right_face(face) => t.left_face.unwrap_or(face),
            _ => face,
        }
    }

    /// Faces at `level` refined together with `selection`.
    ///
    /// Returns `None` if a coarser neighbour had to be subdivided first, in
    /// which case the neighbourhood must be collected again.
    fn neighbourhood(&mut self, selection: FaceIndex, level: u32) -> Option<BTreeSet<FaceIndex>> {
        let mut members = BTreeSet::new();
        let mut queue = Vec::new();
        self.join(&mut members, &mut queue, selection);

        while let Some(member) = queue.pop() {
            for (_, face) in self.mesh.adjacent_faces(member) {
                if members.contains(&face) {
                    continue;
                }
                let record = self.mesh.expect_face(face);
                if record.level < level {
                    debug!("Subdividing coarser neighbour {:?} first", face);
                    self.subdivide(face);
                    return None;
                }
                if record.level == level
                    && (record.t_edge.is_some() || self.contacts(&members, face) >= 2)
                {
                    self.join(&mut members, &mut queue, face);
                }
            }
        }
        Some(members)
    }

    /// Add a face and its T-edge partner to the neighbourhood
    fn join(&self, members: &mut BTreeSet<FaceIndex>, queue: &mut Vec<FaceIndex>, face: FaceIndex) {
        let partner = self
            .mesh
            .expect_face(face)
            .t_edge
            .and_then(|t| self.mesh.expect_edge(t).other_face(face));
        for f in std::iter::once(face).chain(partner) {
            if members.insert(f) {
                queue.push(f);
            }
        }
    }

    fn contacts(&self, members: &BTreeSet<FaceIndex>, face: FaceIndex) -> usize {
        self.mesh
            .adjacent_faces(face)
            .into_iter()
            .filter(|(_, f)| members.contains(f))
            .count()
    }

    /// Faces at `level` sharing an edge with the neighbourhood.
    ///
    /// The one-ring of the neighbourhood must not be coarser than `level`;
    /// returns `None` after subdividing a face that was.
    fn border(&mut self, members: &BTreeSet<FaceIndex>, level: u32) -> Option<BTreeSet<FaceIndex>> {
        for &member in members {
            for vertex in self.mesh.face_vertices(member) {
                let coarser = self
                    .mesh
                    .vertex_faces(vertex)
                    .into_iter()
                    .find(|f| !members.contains(f) && self.mesh.expect_face(*f).level < level);
                if let Some(face) = coarser {
                    debug!("Subdividing coarser one-ring face {:?} first", face);
                    self.subdivide(face);
                    return None;
                }
            }
        }

        let mut border = BTreeSet::new();
        for &member in members {
            for (_, face) in self.mesh.adjacent_faces(member) {
                if members.contains(&face) {
                    continue;
                }
                let record = self.mesh.expect_face(face);
                assert!(
                    record.t_edge.is_none(),
                    "border face {:?} still has a T-edge",
                    face
                );
                if record.level == level {
                    border.insert(face);
                }
            }
        }
        Some(border)
    }

    fn subdivide_faces(&mut self, members: &BTreeSet<FaceIndex>, level: u32) {
        let members = delete_t_edges(self.unit, self.mesh, members);

        for &face in &members {
            for edge in self.mesh.face_edges(face) {
                let (v1, v2) = self.mesh.expect_edge(edge).vertices();
                for v in [v1, v2] {
                    self.unit.modify_vertex(self.mesh, v, |v| v.is_t_vertex = false);
                }
                let coarse = [v1, v2]
                    .iter()
                    .all(|&v| self.mesh.expect_vertex(v).level <= level);
                if coarse {
                    let position = subdivide_edge(self.mesh, edge, level);
                    insert_edge_vertex(self.unit, self.mesh, edge, position, level + 1);
                }
            }
        }

        for &face in &members {
            triangulate_six_gon(self.unit, self.mesh, face, self.affected);
        }
    }

    fn refine_border(&mut self, border: &BTreeSet<FaceIndex>, level: u32) {
        for &face in border {
            assert_eq!(self.mesh.expect_face(face).level, level);
            triangulate_quad(self.unit, self.mesh, face, self.affected);
        }
    }
}
