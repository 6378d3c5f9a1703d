//! Geometric primitives and exact intersection tests.
//!
//! Triangles, spheres, rays and boxes used by the spatial index and the
//! sculpt brushes. The ray test is Moller-Trumbore.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Epsilon for floating point comparisons in ray intersection
const EPSILON: f32 = 1e-6;

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    pub fn empty() -> Self {
        Self {
            min: Vec3::splat(f32::MAX),
            max: Vec3::splat(f32::MIN),
        }
    }

    /// Cube centred at `center` reaching `half_width` along every axis
    pub fn cube(center: Vec3, half_width: f32) -> Self {
        Self::new(center - Vec3::splat(half_width), center + Vec3::splat(half_width))
    }

    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Self {
        let mut bounds = Self::empty();
        for point in points {
            bounds.include_point(point);
        }
        bounds
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    pub fn include_point(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn contains_point(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    pub fn contains(&self, other: &Aabb) -> bool {
        self.contains_point(other.min) && self.contains_point(other.max)
    }

    pub fn intersects_sphere(&self, center: Vec3, radius: f32) -> bool {
        let closest = center.clamp(self.min, self.max);
        closest.distance_squared(center) <= radius * radius
    }

    /// Slab test. Returns the entry distance along the ray if the ray hits
    /// the box in front of its origin.
    pub fn intersect_ray(&self, ray: &Ray) -> Option<f32> {
        let inv = ray.direction.recip();
        let t1 = (self.min - ray.origin) * inv;
        let t2 = (self.max - ray.origin) * inv;
        let t_min = t1.min(t2).max_element();
        let t_max = t1.max(t2).min_element();

        let entry = t_min.max(0.0);
        (t_max >= entry).then_some(entry)
    }
}

/// A triangle given by its three corners in counter-clockwise order
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Triangle {
    pub a: Vec3,
    pub b: Vec3,
    pub c: Vec3,
}

impl Triangle {
    pub fn new(a: Vec3, b: Vec3, c: Vec3) -> Self {
        Self { a, b, c }
    }

    pub fn vertices(&self) -> [Vec3; 3] {
        [self.a, self.b, self.c]
    }

    /// Unnormalized normal (length is twice the area)
    pub fn cross(&self) -> Vec3 {
        (self.b - self.a).cross(self.c - self.a)
    }

    pub fn normal(&self) -> Vec3 {
        self.cross().normalize_or_zero()
    }

    pub fn area(&self) -> f32 {
        self.cross().length() * 0.5
    }

    pub fn center(&self) -> Vec3 {
        (self.a + self.b + self.c) / 3.0
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::from_points(self.vertices())
    }

    pub fn is_finite(&self) -> bool {
        self.a.is_finite() && self.b.is_finite() && self.c.is_finite()
    }

    pub fn is_degenerate(&self) -> bool {
        self.cross().length_squared() <= f32::EPSILON * f32::EPSILON
    }

    /// Closest point on the triangle to `p` (Ericson, Real-Time Collision
    /// Detection, 5.1.5)
    pub fn closest_point(&self, p: Vec3) -> Vec3 {
        let (a, b, c) = (self.a, self.b, self.c);
        let ab = b - a;
        let ac = c - a;

        let ap = p - a;
        let d1 = ab.dot(ap);
        let d2 = ac.dot(ap);
        if d1 <= 0.0 && d2 <= 0.0 {
            return a;
        }

        let bp = p - b;
        let d3 = ab.dot(bp);
        let d4 = ac.dot(bp);
        if d3 >= 0.0 && d4 <= d3 {
            return b;
        }

        let vc = d1 * d4 - d3 * d2;
        if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
            return a + ab * (d1 / (d1 - d3));
        }

        let cp = p - c;
        let d5 = ab.dot(cp);
        let d6 = ac.dot(cp);
        if d6 >= 0.0 && d5 <= d6 {
            return c;
        }

        let vb = d5 * d2 - d1 * d6;
        if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
            return a + ac * (d2 / (d2 - d6));
        }

        let va = d3 * d6 - d5 * d4;
        if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
            return b + (c - b) * ((d4 - d3) / ((d4 - d3) + (d5 - d6)));
        }

        let denom = 1.0 / (va + vb + vc);
        a + ab * (vb * denom) + ac * (vc * denom)
    }
}

/// A sphere query volume
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sphere {
    pub center: Vec3,
    pub radius: f32,
}

impl Sphere {
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    pub fn contains_point(&self, point: Vec3) -> bool {
        point.distance_squared(self.center) <= self.radius * self.radius
    }

    pub fn intersects_aabb(&self, bounds: &Aabb) -> bool {
        bounds.intersects_sphere(self.center, self.radius)
    }

    /// Exact sphere-triangle overlap test
    pub fn intersects_triangle(&self, triangle: &Triangle) -> bool {
        self.contains_point(triangle.closest_point(self.center))
    }
}

/// A half-line with a normalized direction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    /// Create a ray; the direction is normalized so hit distances are in
    /// world units
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    pub fn point_at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Moller-Trumbore ray-triangle intersection.
    ///
    /// Returns the hit distance and barycentric coordinates if the ray
    /// intersects the triangle in front of its origin.
    pub fn intersect_triangle(&self, triangle: &Triangle) -> Option<TriangleHit> {
        let edge1 = triangle.b - triangle.a;
        let edge2 = triangle.c - triangle.a;

        let pvec = self.direction.cross(edge2);
        let det = edge1.dot(pvec);

        // Ray parallel to the triangle plane
        if det.abs() < EPSILON {
            return None;
        }
        let inv_det = 1.0 / det;

        let tvec = self.origin - triangle.a;
        let u = tvec.dot(pvec) * inv_det;
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let qvec = tvec.cross(edge1);
        let v = self.direction.dot(qvec) * inv_det;
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = edge2.dot(qvec) * inv_det;
        if t < EPSILON {
            return None;
        }

        Some(TriangleHit { t, u, v })
    }
}

/// Result of a ray-triangle intersection test
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriangleHit {
    /// Distance along the ray to the intersection point
    pub t: f32,
    /// Barycentric coordinate u (weight for vertex b)
    pub u: f32,
    /// Barycentric coordinate v (weight for vertex c)
    pub v: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_triangle() -> Triangle {
        Triangle::new(Vec3::ZERO, Vec3::X, Vec3::Y)
    }

    #[test]
    fn test_ray_hits_triangle() {
        let ray = Ray::new(Vec3::new(0.25, 0.25, 1.0), Vec3::NEG_Z);
        let hit = ray.intersect_triangle(&unit_triangle()).unwrap();
        assert!((hit.t - 1.0).abs() < 1e-5);
        assert!((hit.u - 0.25).abs() < 1e-5);
        assert!((hit.v - 0.25).abs() < 1e-5);
    }

    #[test]
    fn test_ray_misses_triangle() {
        let behind = Ray::new(Vec3::new(0.25, 0.25, 1.0), Vec3::Z);
        assert!(behind.intersect_triangle(&unit_triangle()).is_none());

        let outside = Ray::new(Vec3::new(2.0, 2.0, 1.0), Vec3::NEG_Z);
        assert!(outside.intersect_triangle(&unit_triangle()).is_none());

        let parallel = Ray::new(Vec3::new(-1.0, 0.25, 0.0), Vec3::X);
        assert!(parallel.intersect_triangle(&unit_triangle()).is_none());
    }

    #[test]
    fn test_closest_point_regions() {
        let tri = unit_triangle();
        // Above the interior
        let p = tri.closest_point(Vec3::new(0.2, 0.2, 3.0));
        assert!((p - Vec3::new(0.2, 0.2, 0.0)).length() < 1e-6);
        // Vertex region
        assert_eq!(tri.closest_point(Vec3::new(-1.0, -1.0, 0.0)), Vec3::ZERO);
        // Edge region
        let p = tri.closest_point(Vec3::new(0.5, -2.0, 0.0));
        assert!((p - Vec3::new(0.5, 0.0, 0.0)).length() < 1e-6);
        // Hypotenuse region
        let p = tri.closest_point(Vec3::new(1.0, 1.0, 0.0));
        assert!((p - Vec3::new(0.5, 0.5, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_sphere_triangle_overlap() {
        let tri = unit_triangle();
        assert!(Sphere::new(Vec3::new(0.2, 0.2, 0.5), 0.6).intersects_triangle(&tri));
        assert!(!Sphere::new(Vec3::new(0.2, 0.2, 0.5), 0.4).intersects_triangle(&tri));
        // Sphere touching only the hypotenuse
        let center = Vec3::new(1.0, 1.0, 0.0);
        let dist = (center - Vec3::new(0.5, 0.5, 0.0)).length();
        assert!(Sphere::new(center, dist + 1e-4).intersects_triangle(&tri));
        assert!(!Sphere::new(center, dist - 1e-4).intersects_triangle(&tri));
    }

    #[test]
    fn test_aabb_ray_slab() {
        let bounds = Aabb::cube(Vec3::ZERO, 1.0);
        let ray = Ray::new(Vec3::new(-5.0, 0.0, 0.0), Vec3::X);
        assert_eq!(bounds.intersect_ray(&ray), Some(4.0));

        let away = Ray::new(Vec3::new(-5.0, 0.0, 0.0), Vec3::NEG_X);
        assert!(bounds.intersect_ray(&away).is_none());

        let inside = Ray::new(Vec3::ZERO, Vec3::Y);
        assert_eq!(bounds.intersect_ray(&inside), Some(0.0));

        let offset = Ray::new(Vec3::new(-5.0, 3.0, 0.0), Vec3::X);
        assert!(bounds.intersect_ray(&offset).is_none());
    }

    #[test]
    fn test_triangle_measures() {
        let tri = unit_triangle();
        assert_eq!(tri.normal(), Vec3::Z);
        assert!((tri.area() - 0.5).abs() < 1e-6);
        assert!(!tri.is_degenerate());
        assert!(Triangle::new(Vec3::ZERO, Vec3::X, Vec3::X * 2.0).is_degenerate());
        let bounds = tri.bounds();
        assert_eq!(bounds.min, Vec3::ZERO);
        assert_eq!(bounds.max, Vec3::new(1.0, 1.0, 0.0));
    }
}
