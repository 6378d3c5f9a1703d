//! Carve brush and sculpt strokes.
//!
//! A stroke is a sequence of dabs recorded into one action unit. Each dab
//! gathers the faces near the brush, then displaces their vertices along a
//! common direction by an amount that falls off with distance.

use std::collections::BTreeSet;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use sculpt_config::BrushConfig;
use sculpt_mesh::{FaceIndex, MeshId, Sphere, VertexIndex, WingedMesh};
use tracing::{debug, warn};

use crate::action::{Action, ActionUnit};
use crate::error::{Outcome, SculptError};
use crate::history::History;
use crate::registry::MeshRegistry;

/// Smallest exponent the polynomial falloff uses
const MIN_FLATNESS: u32 = 3;

/// Falloff curve for brush influence.
///
/// Determines how displacement decreases from center to rim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Falloff {
    /// `(f-1)x^f - f x^(f-1) + 1`: flat near the centre, zero slope at the
    /// rim; larger flatness widens the plateau
    #[default]
    Polynomial,
    /// strength = 1 - distance/radius
    Linear,
    /// Hermite smoothstep
    Smooth,
}

impl Falloff {
    /// Weight at a normalized distance (0.0 = center, 1.0 = rim). Zero at
    /// and beyond the rim.
    pub fn evaluate(&self, normalized_distance: f32, flatness: u32) -> f32 {
        if normalized_distance >= 1.0 {
            return 0.0;
        }
        let x = normalized_distance.max(0.0);
        match self {
            Falloff::Polynomial => {
                let f = flatness.max(MIN_FLATNESS) as i32;
                let ff = f as f32;
                (ff - 1.0) * x.powi(f) - ff * x.powi(f - 1) + 1.0
            }
            Falloff::Linear => 1.0 - x,
            Falloff::Smooth => {
                let t = 1.0 - x;
                t * t * (3.0 - 2.0 * t)
            }
        }
    }
}

/// Carve brush settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarveBrush {
    /// Radius in world units
    pub radius: f32,
    /// Peak displacement as a fraction of the radius
    pub intensity_factor: f32,
    pub flatness: u32,
    /// Carve inward instead of outward
    pub invert: bool,
    pub falloff: Falloff,
    /// Fixed displacement direction; the mean vertex normal otherwise
    pub direction: Option<Vec3>,
    /// Gather faces with an octree query instead of growing from a seed face.
    /// On by default so a dab needs no picked face.
    pub use_intersection: bool,
    /// Centre each dab on the previous dab's position
    pub use_last_position: bool,
}

impl Default for CarveBrush {
    fn default() -> Self {
        Self::from_config(&BrushConfig::default())
    }
}

impl CarveBrush {
    pub fn from_config(config: &BrushConfig) -> Self {
        Self {
            radius: config.radius,
            intensity_factor: config.intensity_factor,
            flatness: config.flatness,
            invert: config.invert,
            falloff: Falloff::default(),
            direction: None,
            use_intersection: true,
            use_last_position: false,
        }
    }

    /// Peak displacement in world units
    pub fn intensity(&self) -> f32 {
        self.intensity_factor * self.radius
    }

    pub fn toggle_invert(&mut self) {
        self.invert = !self.invert;
    }

    pub fn validate(&self) -> Result<(), SculptError> {
        if !(self.radius.is_finite() && self.radius > 0.0) {
            return Err(SculptError::InvalidBrush(format!(
                "radius must be positive, got {}",
                self.radius
            )));
        }
        if !(self.intensity_factor.is_finite() && self.intensity_factor >= 0.0) {
            return Err(SculptError::InvalidBrush(format!(
                "intensity factor must be non-negative, got {}",
                self.intensity_factor
            )));
        }
        if self.direction.is_some_and(|d| !d.is_finite()) {
            return Err(SculptError::InvalidBrush("direction is not finite".to_string()));
        }
        Ok(())
    }

    /// Signed displacement of a vertex at `position` for a dab at `center`
    pub fn sculpt_delta(&self, center: Vec3, position: Vec3) -> f32 {
        let distance = position.distance(center);
        if distance >= self.radius {
            return 0.0;
        }
        let sign = if self.invert { -1.0 } else { 1.0 };
        self.intensity() * sign * self.falloff.evaluate(distance / self.radius, self.flatness)
    }
}

/// Faces reachable from `seed` across shared edges whose buffered triangle
/// intersects `sphere`
pub fn extend_from_face(mesh: &WingedMesh, sphere: &Sphere, seed: FaceIndex) -> Vec<FaceIndex> {
    let touches = |f: FaceIndex| sphere.intersects_triangle(&mesh.buffered_triangle(f));

    let mut visited = BTreeSet::from([seed]);
    let mut queue = vec![seed];
    let mut faces = Vec::new();
    while let Some(face) = queue.pop() {
        if !touches(face) {
            continue;
        }
        faces.push(face);
        for (_, neighbour) in mesh.adjacent_faces(face) {
            if visited.insert(neighbour) {
                queue.push(neighbour);
            }
        }
    }
    faces.sort_unstable();
    faces
}

/// An in-progress carve stroke on one mesh
#[derive(Debug)]
pub struct SculptStroke {
    mesh: MeshId,
    brush: CarveBrush,
    unit: ActionUnit,
    last_position: Option<Vec3>,
    dabs: usize,
}

impl SculptStroke {
    pub fn begin(mesh: MeshId, brush: CarveBrush) -> Result<Self, SculptError> {
        brush.validate()?;
        debug!("Beginning stroke on {:?}", mesh);
        Ok(Self {
            mesh,
            brush,
            unit: ActionUnit::new(),
            last_position: None,
            dabs: 0,
        })
    }

    pub fn mesh(&self) -> MeshId {
        self.mesh
    }

    pub fn brush(&self) -> &CarveBrush {
        &self.brush
    }

    /// Dabs that displaced at least one vertex
    pub fn dab_count(&self) -> usize {
        self.dabs
    }

    /// Apply one dab at `position`.
    ///
    /// `face` seeds the face search when the brush does not use the octree
    /// query. A dab that would produce non-finite positions changes nothing
    /// and reports [`Outcome::Failed`].
    pub fn dab(
        &mut self,
        registry: &mut MeshRegistry,
        position: Vec3,
        face: Option<FaceIndex>,
    ) -> Result<Outcome, SculptError> {
        let mesh = registry
            .get_mut(self.mesh)
            .ok_or(SculptError::UnknownMesh(self.mesh))?;

        let center = match (self.brush.use_last_position, self.last_position) {
            (true, Some(last)) => last,
            _ => position,
        };
        let sphere = Sphere::new(center, self.brush.radius);
        let faces = if self.brush.use_intersection {
            mesh.intersects_sphere(&sphere)
        } else {
            let seed = face.ok_or_else(|| {
                SculptError::InvalidBrush("a seed face is required without intersection".to_string())
            })?;
            if mesh.face(seed).is_none() {
                return Err(SculptError::UnknownFace(seed));
            }
            extend_from_face(mesh, &sphere, seed)
        };
        self.last_position = Some(position);

        let vertices: BTreeSet<VertexIndex> = faces
            .iter()
            .flat_map(|&f| mesh.buffered_indices(f))
            .collect();
        if vertices.is_empty() {
            return Ok(Outcome::NoOp);
        }

        let direction = self.brush.direction.unwrap_or_else(|| {
            let sum: Vec3 = vertices.iter().map(|&v| mesh.vertex_normal(v)).sum();
            sum / vertices.len() as f32
        });
        let moves: Vec<(VertexIndex, Vec3)> = vertices
            .iter()
            .map(|&v| {
                let old = mesh.position(v);
                (v, old + direction * self.brush.sculpt_delta(center, old))
            })
            .filter(|&(v, new)| new != mesh.position(v))
            .collect();
        if moves.iter().any(|(_, p)| !p.is_finite()) {
            warn!("Dab at {:?} produced non-finite positions", center);
            return Ok(Outcome::Failed);
        }
        if moves.is_empty() {
            return Ok(Outcome::NoOp);
        }

        for (vertex, new) in moves {
            self.unit.move_vertex(mesh, vertex, new);
        }
        mesh.sync_octree();
        self.dabs += 1;
        Ok(Outcome::Succeeded)
    }

    /// Close the stroke and record it as a single undo step
    pub fn finish(self, registry: &mut MeshRegistry, history: &mut History) -> Result<Outcome, SculptError> {
        let mesh = registry
            .get_mut(self.mesh)
            .ok_or(SculptError::UnknownMesh(self.mesh))?;
        self.unit.finish(mesh);
        if self.unit.is_empty() {
            return Ok(Outcome::NoOp);
        }
        debug!("Finished stroke on {:?} after {} dabs", self.mesh, self.dabs);
        history.add_action(Action::Edit {
            mesh: self.mesh,
            unit: self.unit,
        });
        Ok(Outcome::Succeeded)
    }

    /// Revert every dab of the stroke
    pub fn abort(self, registry: &mut MeshRegistry) {
        if let Some(mesh) = registry.get_mut(self.mesh) {
            self.unit.undo(mesh);
        }
    }
}

/// Apply a single carve dab as its own undo step
pub fn sculpt(
    registry: &mut MeshRegistry,
    history: &mut History,
    mesh: MeshId,
    brush: &CarveBrush,
    position: Vec3,
    face: Option<FaceIndex>,
) -> Result<Outcome, SculptError> {
    history.speculate(registry, |registry, history| {
        let mut stroke = SculptStroke::begin(mesh, brush.clone())?;
        match stroke.dab(registry, position, face)? {
            Outcome::Succeeded => stroke.finish(registry, history),
            other => {
                stroke.abort(registry);
                Ok(other)
            }
        }
    })
}
