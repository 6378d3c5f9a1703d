//! Indexed triangle geometry and primitive generators.
//!
//! `MeshGeometry` is the input format for building a winged-edge mesh:
//! positions plus counter-clockwise index triples.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::primitive::Aabb;

/// An indexed triangle soup
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshGeometry {
    pub positions: Vec<Vec3>,
    pub triangles: Vec<[u32; 3]>,
}

impl MeshGeometry {
    pub fn new(positions: Vec<Vec3>, triangles: Vec<[u32; 3]>) -> Self {
        Self {
            positions,
            triangles,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::from_points(self.positions.iter().copied())
    }

    /// Uniformly scale all positions about the origin
    pub fn scaled(mut self, factor: f32) -> Self {
        for p in &mut self.positions {
            *p *= factor;
        }
        self
    }

    pub fn translated(mut self, offset: Vec3) -> Self {
        for p in &mut self.positions {
            *p += offset;
        }
        self
    }

    /// A single equilateral triangle with unit sides in the XY plane
    pub fn triangle() -> Self {
        Self::new(
            vec![
                Vec3::ZERO,
                Vec3::X,
                Vec3::new(0.5, 3f32.sqrt() * 0.5, 0.0),
            ],
            vec![[0, 1, 2]],
        )
    }

    /// Regular tetrahedron inscribed in the cube [-1, 1]^3
    pub fn tetrahedron() -> Self {
        Self::new(
            vec![
                Vec3::new(1.0, 1.0, 1.0),
                Vec3::new(1.0, -1.0, -1.0),
                Vec3::new(-1.0, 1.0, -1.0),
                Vec3::new(-1.0, -1.0, 1.0),
            ],
            vec![[0, 1, 2], [0, 3, 1], [0, 2, 3], [1, 3, 2]],
        )
    }

    /// Octahedron with its corners on the unit axes
    pub fn octahedron() -> Self {
        Self::new(
            vec![Vec3::X, Vec3::NEG_X, Vec3::Y, Vec3::NEG_Y, Vec3::Z, Vec3::NEG_Z],
            vec![
                [0, 2, 4],
                [2, 1, 4],
                [1, 3, 4],
                [3, 0, 4],
                [2, 0, 5],
                [1, 2, 5],
                [3, 1, 5],
                [0, 3, 5],
            ],
        )
    }

    /// Icosahedron inscribed in the unit sphere
    pub fn icosahedron() -> Self {
        let t = (1.0 + 5f32.sqrt()) * 0.5;
        let positions = [
            (-1.0, t, 0.0),
            (1.0, t, 0.0),
            (-1.0, -t, 0.0),
            (1.0, -t, 0.0),
            (0.0, -1.0, t),
            (0.0, 1.0, t),
            (0.0, -1.0, -t),
            (0.0, 1.0, -t),
            (t, 0.0, -1.0),
            (t, 0.0, 1.0),
            (-t, 0.0, -1.0),
            (-t, 0.0, 1.0),
        ]
        .into_iter()
        .map(|(x, y, z)| Vec3::new(x, y, z).normalize())
        .collect();

        Self::new(
            positions,
            vec![
                [0, 11, 5],
                [0, 5, 1],
                [0, 1, 7],
                [0, 7, 10],
                [0, 10, 11],
                [1, 5, 9],
                [5, 11, 4],
                [11, 10, 2],
                [10, 7, 6],
                [7, 1, 8],
                [3, 9, 4],
                [3, 4, 2],
                [3, 2, 6],
                [3, 6, 8],
                [3, 8, 9],
                [4, 9, 5],
                [2, 4, 11],
                [6, 2, 10],
                [8, 6, 7],
                [9, 8, 1],
            ],
        )
    }

    /// Flat open patch of `cells x cells` quads (two triangles each) in the
    /// XY plane, centred at the origin and facing +Z
    pub fn grid(cells: u32, spacing: f32) -> Self {
        let side = cells + 1;
        let offset = cells as f32 * spacing * 0.5;

        let mut positions = Vec::with_capacity((side * side) as usize);
        for j in 0..side {
            for i in 0..side {
                positions.push(Vec3::new(
                    i as f32 * spacing - offset,
                    j as f32 * spacing - offset,
                    0.0,
                ));
            }
        }

        let mut triangles = Vec::with_capacity((2 * cells * cells) as usize);
        for j in 0..cells {
            for i in 0..cells {
                let v00 = j * side + i;
                let v10 = v00 + 1;
                let v01 = v00 + side;
                let v11 = v01 + 1;
                triangles.push([v00, v10, v11]);
                triangles.push([v00, v11, v01]);
            }
        }

        Self::new(positions, triangles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitive::Triangle;

    fn outward(geometry: &MeshGeometry) -> bool {
        let center = geometry.bounds().center();
        geometry.triangles.iter().all(|t| {
            let [a, b, c] = t.map(|i| geometry.positions[i as usize]);
            let tri = Triangle::new(a, b, c);
            tri.normal().dot(tri.center() - center) > 0.0
        })
    }

    #[test]
    fn test_closed_solids_face_outward() {
        for geometry in [
            MeshGeometry::tetrahedron(),
            MeshGeometry::octahedron(),
            MeshGeometry::icosahedron(),
        ] {
            assert!(outward(&geometry));
            // Euler characteristic of a sphere: V - E + F = 2 with E = 3F/2
            let v = geometry.vertex_count() as i64;
            let f = geometry.triangle_count() as i64;
            assert_eq!(v - 3 * f / 2 + f, 2);
        }
    }

    #[test]
    fn test_grid_layout() {
        let grid = MeshGeometry::grid(4, 0.5);
        assert_eq!(grid.vertex_count(), 25);
        assert_eq!(grid.triangle_count(), 32);
        let bounds = grid.bounds();
        assert_eq!(bounds.min, Vec3::new(-1.0, -1.0, 0.0));
        assert_eq!(bounds.max, Vec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn test_transforms() {
        let tri = MeshGeometry::triangle().scaled(2.0).translated(Vec3::Z);
        assert_eq!(tri.positions[1], Vec3::new(2.0, 0.0, 1.0));
    }
}
