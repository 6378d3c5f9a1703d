//! Loose octree over face geometry.
//!
//! Each node is a cube `(center, width)` whose loose bound reaches twice as
//! far, so a face only has to fit the node by its bounding-box centre and
//! extent. Faces descend into the octant containing their centre while they
//! are small enough for it; larger faces stay at the parent level. Nodes live
//! in an index arena and a locator map gives each face's node for O(1)
//! removal. Empty childless nodes are pruned on removal.

use std::collections::HashMap;

use glam::Vec3;
use sculpt_config::OctreeConfig;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::arena::IndexedList;
use crate::id::FaceIndex;
use crate::primitive::{Aabb, Ray, Sphere, Triangle};

/// Centre and width of the root cube
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OctreeRoot {
    pub center: Vec3,
    pub width: f32,
}

impl OctreeRoot {
    pub fn new(center: Vec3, width: f32) -> Self {
        Self { center, width }
    }

    /// A root cube enclosing `bounds`, padded by `margin` times the largest
    /// extent on every side.
    pub fn enclosing(bounds: &Aabb, margin: f32) -> Self {
        if bounds.is_empty() {
            return Self::new(Vec3::ZERO, 1.0);
        }
        let extent = bounds.size().max_element();
        let width = if extent > 0.0 {
            extent * (1.0 + 2.0 * margin)
        } else {
            1.0
        };
        Self::new(bounds.center(), width)
    }
}

/// Nearest face hit by a ray
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OctreeHit {
    pub face: FaceIndex,
    pub distance: f32,
    pub point: Vec3,
}

/// A face and the geometry it was placed with
#[derive(Debug, Clone, Copy)]
struct OctreeItem {
    face: FaceIndex,
    triangle: Triangle,
}

#[derive(Debug, Clone)]
struct Node {
    center: Vec3,
    width: f32,
    parent: Option<u32>,
    children: [Option<u32>; 8],
    items: Vec<OctreeItem>,
    /// Set once the node has overflowed; new faces then descend eagerly
    split: bool,
}

impl Node {
    fn new(center: Vec3, width: f32, parent: Option<u32>) -> Self {
        Self {
            center,
            width,
            parent,
            children: [None; 8],
            items: Vec::new(),
            split: false,
        }
    }

    fn loose_bounds(&self) -> Aabb {
        Aabb::cube(self.center, self.width)
    }

    /// Whether a face with bounding-box `center` and half-extent `half` fits
    fn fits(&self, center: Vec3, half: f32) -> bool {
        let offset = (center - self.center).abs().max_element();
        offset <= self.width * 0.5 && half <= self.width * 0.5
    }

    /// Get the octant index for a point (0-7).
    fn octant_for_point(&self, point: Vec3) -> usize {
        let mut index = 0;
        if point.x >= self.center.x {
            index |= 1;
        }
        if point.y >= self.center.y {
            index |= 2;
        }
        if point.z >= self.center.z {
            index |= 4;
        }
        index
    }

    fn child_center(&self, octant: usize) -> Vec3 {
        let q = self.width * 0.25;
        self.center
            + Vec3::new(
                if octant & 1 != 0 { q } else { -q },
                if octant & 2 != 0 { q } else { -q },
                if octant & 4 != 0 { q } else { -q },
            )
    }

    fn has_children(&self) -> bool {
        self.children.iter().any(Option::is_some)
    }
}

/// Spatial index over the faces of one mesh
#[derive(Debug, Clone)]
pub struct Octree {
    config: OctreeConfig,
    nodes: IndexedList<Node>,
    root: Option<u32>,
    locator: HashMap<FaceIndex, u32>,
}

impl Octree {
    /// Create an octree without a root. The root must be set with
    /// [`set_root`](Self::set_root) before faces are inserted.
    pub fn new(config: OctreeConfig) -> Self {
        Self {
            config,
            nodes: IndexedList::new(),
            root: None,
            locator: HashMap::new(),
        }
    }

    pub fn config(&self) -> &OctreeConfig {
        &self.config
    }

    /// Current root cube, if initialised. Grows as faces outside it arrive.
    pub fn root(&self) -> Option<OctreeRoot> {
        let node = self.nodes.get(self.root?)?;
        Some(OctreeRoot::new(node.center, node.width))
    }

    /// Replace the root cube and return the previous one.
    ///
    /// # Panics
    /// If the octree still holds faces.
    pub fn set_root(&mut self, root: Option<OctreeRoot>) -> Option<OctreeRoot> {
        assert!(
            self.is_empty(),
            "octree root replaced while it holds {} faces",
            self.len()
        );
        let old = self.root();
        self.nodes.clear();
        self.root = root.map(|r| self.nodes.insert(Node::new(r.center, r.width, None)));
        old
    }

    pub fn len(&self) -> usize {
        self.locator.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locator.is_empty()
    }

    pub fn contains(&self, face: FaceIndex) -> bool {
        self.locator.contains_key(&face)
    }

    /// Number of live nodes, including the root
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Geometry a face was placed with
    pub fn triangle(&self, face: FaceIndex) -> Option<Triangle> {
        let node = self.nodes.get(*self.locator.get(&face)?)?;
        node.items
            .iter()
            .find(|item| item.face == face)
            .map(|item| item.triangle)
    }

    /// Insert a face with its current geometry.
    ///
    /// # Panics
    /// If the root is not initialised, the face is already present, or the
    /// geometry is not finite.
    pub fn insert(&mut self, face: FaceIndex, triangle: Triangle) {
        assert!(triangle.is_finite(), "face {:?} has non-finite geometry", face);
        assert!(
            !self.locator.contains_key(&face),
            "face {:?} is already in the octree",
            face
        );
        let Some(mut root) = self.root else {
            panic!("octree root is not initialised");
        };

        let bounds = triangle.bounds();
        let center = bounds.center();
        let half = bounds.size().max_element() * 0.5;
        while !self.nodes.get(root).is_some_and(|n| n.fits(center, half)) {
            root = self.grow_root(root, center);
        }

        self.place(root, OctreeItem { face, triangle });
    }

    /// Remove a face and return the geometry it was placed with.
    pub fn remove(&mut self, face: FaceIndex) -> Option<Triangle> {
        let node_id = self.locator.remove(&face)?;
        let node = self.nodes.get_mut(node_id)?;
        let position = node.items.iter().position(|item| item.face == face)?;
        let item = node.items.swap_remove(position);
        self.prune(node_id);
        Some(item.triangle)
    }

    /// Re-place a face after its geometry changed.
    pub fn update(&mut self, face: FaceIndex, triangle: Triangle) {
        self.remove(face);
        self.insert(face, triangle);
    }

    /// Remove every face, keeping the root cube.
    pub fn clear(&mut self) {
        let root = self.root();
        self.locator.clear();
        self.nodes.clear();
        self.root = root.map(|r| self.nodes.insert(Node::new(r.center, r.width, None)));
    }

    /// Any face in the octree. Callers must not rely on which one.
    pub fn some_face(&self) -> Option<FaceIndex> {
        self.nodes
            .iter()
            .find_map(|(_, node)| node.items.first())
            .map(|item| item.face)
    }

    pub fn for_each_face(&self, mut f: impl FnMut(FaceIndex, &Triangle)) {
        for (_, node) in self.nodes.iter() {
            for item in &node.items {
                f(item.face, &item.triangle);
            }
        }
    }

    /// All faces in ascending order
    pub fn faces(&self) -> Vec<FaceIndex> {
        let mut faces: Vec<_> = self.locator.keys().copied().collect();
        faces.sort();
        faces
    }

    /// Whether a face's stored geometry lies within its node's loose bound
    pub fn placement_fits(&self, face: FaceIndex) -> bool {
        let Some(node) = self.locator.get(&face).and_then(|&id| self.nodes.get(id)) else {
            return false;
        };
        node.items
            .iter()
            .find(|item| item.face == face)
            .is_some_and(|item| node.loose_bounds().contains(&item.triangle.bounds()))
    }

    /// All faces whose geometry intersects the sphere, in ascending order.
    pub fn intersects_sphere(&self, sphere: &Sphere) -> Vec<FaceIndex> {
        let mut results = Vec::new();
        let mut stack: Vec<u32> = self.root.into_iter().collect();

        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get(id) else {
                continue;
            };
            if !sphere.intersects_aabb(&node.loose_bounds()) {
                continue;
            }
            results.extend(
                node.items
                    .iter()
                    .filter(|item| sphere.intersects_triangle(&item.triangle))
                    .map(|item| item.face),
            );
            stack.extend(node.children.iter().flatten());
        }

        results.sort();
        results
    }

    /// The nearest face hit by the ray.
    pub fn intersects_ray(&self, ray: &Ray) -> Option<OctreeHit> {
        let mut best: Option<(FaceIndex, f32)> = None;
        let mut stack: Vec<u32> = self.root.into_iter().collect();

        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get(id) else {
                continue;
            };
            let Some(entry) = node.loose_bounds().intersect_ray(ray) else {
                continue;
            };
            if best.is_some_and(|(_, t)| entry > t) {
                continue;
            }
            for item in &node.items {
                if let Some(hit) = ray.intersect_triangle(&item.triangle) {
                    if best.is_none_or(|(_, t)| hit.t < t) {
                        best = Some((item.face, hit.t));
                    }
                }
            }
            stack.extend(node.children.iter().flatten());
        }

        best.map(|(face, distance)| OctreeHit {
            face,
            distance,
            point: ray.point_at(distance),
        })
    }

    fn place(&mut self, start: u32, item: OctreeItem) {
        let bounds = item.triangle.bounds();
        let center = bounds.center();
        let half = bounds.size().max_element() * 0.5;

        let mut node_id = start;
        while let Some(child) = self.descend(node_id, center, half) {
            node_id = child;
        }

        let Some(node) = self.nodes.get_mut(node_id) else {
            return;
        };
        node.items.push(item);
        let overflow = !node.split && node.items.len() > self.config.max_faces_per_node;
        self.locator.insert(item.face, node_id);

        if overflow {
            self.split(node_id);
        }
    }

    /// The child a face should move into, created on demand.
    fn descend(&mut self, node_id: u32, center: Vec3, half: f32) -> Option<u32> {
        let node = self.nodes.get(node_id)?;
        let child_width = node.width * 0.5;
        if !node.split || child_width < self.config.min_node_width || half > child_width * 0.5 {
            return None;
        }
        let octant = node.octant_for_point(center);
        if let Some(child) = node.children[octant] {
            return Some(child);
        }

        let child_center = node.child_center(octant);
        let child = self
            .nodes
            .insert(Node::new(child_center, child_width, Some(node_id)));
        if let Some(node) = self.nodes.get_mut(node_id) {
            node.children[octant] = Some(child);
        }
        Some(child)
    }

    fn split(&mut self, node_id: u32) {
        let Some(node) = self.nodes.get_mut(node_id) else {
            return;
        };
        node.split = true;
        let items = std::mem::take(&mut node.items);
        trace!("Splitting octree node {} ({} faces)", node_id, items.len());

        for item in items {
            self.locator.remove(&item.face);
            self.place(node_id, item);
        }
    }

    /// Double the root so that the old root becomes the octant facing away
    /// from `toward`.
    fn grow_root(&mut self, old_root: u32, toward: Vec3) -> u32 {
        let Some(old) = self.nodes.get(old_root) else {
            panic!("octree root node {} is missing", old_root);
        };
        let (center, width) = (old.center, old.width);
        let half = width * 0.5;
        let offset = Vec3::new(
            if toward.x >= center.x { half } else { -half },
            if toward.y >= center.y { half } else { -half },
            if toward.z >= center.z { half } else { -half },
        );

        let mut grown = Node::new(center + offset, width * 2.0, None);
        grown.split = true;
        let octant = grown.octant_for_point(center);
        grown.children[octant] = Some(old_root);

        let new_root = self.nodes.insert(grown);
        if let Some(old) = self.nodes.get_mut(old_root) {
            old.parent = Some(new_root);
        }
        self.root = Some(new_root);
        trace!("Grew octree root to width {}", width * 2.0);
        new_root
    }

    fn prune(&mut self, mut node_id: u32) {
        loop {
            let Some(node) = self.nodes.get(node_id) else {
                return;
            };
            if !node.items.is_empty() || node.has_children() {
                return;
            }
            let Some(parent) = node.parent else {
                return;
            };
            self.nodes.remove(node_id);
            if let Some(parent_node) = self.nodes.get_mut(parent) {
                for child in parent_node.children.iter_mut() {
                    if *child == Some(node_id) {
                        *child = None;
                    }
                }
            }
            node_id = parent;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> OctreeConfig {
        OctreeConfig {
            max_faces_per_node: 2,
            min_node_width: 0.05,
            root_margin: 0.1,
        }
    }

    fn rooted(width: f32) -> Octree {
        let mut octree = Octree::new(small_config());
        octree.set_root(Some(OctreeRoot::new(Vec3::ZERO, width)));
        octree
    }

    /// Small triangles scattered over [-1, 1]^3 with a fixed LCG
    fn scattered_triangles(count: usize) -> Vec<Triangle> {
        let mut state: u32 = 0x2545_f491;
        let mut next = move || {
            state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            (state >> 8) as f32 / (1u32 << 24) as f32 * 2.0 - 1.0
        };
        (0..count)
            .map(|_| {
                let a = Vec3::new(next(), next(), next());
                let size = 0.02 + 0.2 * (next() + 1.0) * 0.5;
                Triangle::new(a, a + Vec3::X * size, a + Vec3::new(0.0, size, size * 0.5))
            })
            .collect()
    }

    #[test]
    fn test_sphere_query_matches_brute_force() {
        let triangles = scattered_triangles(200);
        let mut octree = rooted(2.5);
        for (i, tri) in triangles.iter().enumerate() {
            octree.insert(FaceIndex(i as u32), *tri);
        }
        assert_eq!(octree.len(), 200);
        assert!(octree.node_count() > 1);

        for (center, radius) in [
            (Vec3::ZERO, 0.5),
            (Vec3::new(0.7, -0.3, 0.2), 0.25),
            (Vec3::new(-1.0, 1.0, -1.0), 0.8),
            (Vec3::splat(3.0), 0.1),
        ] {
            let sphere = Sphere::new(center, radius);
            let expected: Vec<FaceIndex> = triangles
                .iter()
                .enumerate()
                .filter(|(_, tri)| sphere.intersects_triangle(tri))
                .map(|(i, _)| FaceIndex(i as u32))
                .collect();
            assert_eq!(octree.intersects_sphere(&sphere), expected);
        }
    }

    #[test]
    fn test_every_face_fits_its_node() {
        let triangles = scattered_triangles(100);
        let mut octree = rooted(2.5);
        for (i, tri) in triangles.iter().enumerate() {
            octree.insert(FaceIndex(i as u32), *tri);
        }
        for i in 0..100 {
            assert!(octree.placement_fits(FaceIndex(i)));
        }
    }

    #[test]
    fn test_for_each_face_visits_stored_geometry() {
        let triangles = scattered_triangles(40);
        let mut octree = rooted(2.5);
        for (i, tri) in triangles.iter().enumerate() {
            octree.insert(FaceIndex(i as u32), *tri);
        }
        octree.remove(FaceIndex(7));

        let mut seen = Vec::new();
        octree.for_each_face(|face, triangle| {
            assert_eq!(*triangle, triangles[face.0 as usize]);
            seen.push(face);
        });
        seen.sort();
        assert_eq!(seen, octree.faces());
        assert_eq!(seen.len(), 39);
        assert!(!seen.contains(&FaceIndex(7)));
    }

    #[test]
    fn test_remove_prunes_empty_nodes() {
        let triangles = scattered_triangles(50);
        let mut octree = rooted(2.5);
        for (i, tri) in triangles.iter().enumerate() {
            octree.insert(FaceIndex(i as u32), *tri);
        }

        for i in 0..50 {
            assert_eq!(octree.remove(FaceIndex(i)), Some(triangles[i as usize]));
        }
        assert!(octree.is_empty());
        assert_eq!(octree.node_count(), 1);
        assert!(octree.remove(FaceIndex(0)).is_none());
    }

    #[test]
    fn test_root_grows_for_distant_faces() {
        let mut octree = rooted(1.0);
        let far = Triangle::new(
            Vec3::new(5.0, 5.0, 5.0),
            Vec3::new(5.5, 5.0, 5.0),
            Vec3::new(5.0, 5.5, 5.0),
        );
        octree.insert(FaceIndex(0), far);

        let root = octree.root().unwrap();
        assert!(root.width > 1.0);
        assert!(octree.placement_fits(FaceIndex(0)));
        assert_eq!(
            octree.intersects_sphere(&Sphere::new(Vec3::splat(5.1), 0.2)),
            vec![FaceIndex(0)]
        );
    }

    #[test]
    fn test_ray_returns_nearest_face() {
        let mut octree = rooted(4.0);
        let square = |z: f32| Triangle::new(Vec3::new(-1.0, -1.0, z), Vec3::new(1.0, -1.0, z), Vec3::new(0.0, 1.0, z));
        octree.insert(FaceIndex(0), square(-1.0));
        octree.insert(FaceIndex(1), square(0.5));
        octree.insert(FaceIndex(2), square(1.5));

        let hit = octree
            .intersects_ray(&Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z))
            .unwrap();
        assert_eq!(hit.face, FaceIndex(2));
        assert!((hit.distance - 3.5).abs() < 1e-5);
        assert!((hit.point.z - 1.5).abs() < 1e-5);

        assert!(octree
            .intersects_ray(&Ray::new(Vec3::new(3.0, 3.0, 5.0), Vec3::NEG_Z))
            .is_none());
    }

    #[test]
    fn test_some_face_drains() {
        let triangles = scattered_triangles(20);
        let mut octree = rooted(2.5);
        for (i, tri) in triangles.iter().enumerate() {
            octree.insert(FaceIndex(i as u32), *tri);
        }
        let mut drained = 0;
        while let Some(face) = octree.some_face() {
            octree.remove(face);
            drained += 1;
        }
        assert_eq!(drained, 20);
    }

    #[test]
    fn test_set_root_returns_previous() {
        let mut octree = Octree::new(small_config());
        assert_eq!(octree.root(), None);
        let root = OctreeRoot::new(Vec3::ONE, 2.0);
        assert_eq!(octree.set_root(Some(root)), None);
        assert_eq!(octree.set_root(None), Some(root));
    }

    #[test]
    #[should_panic(expected = "root replaced")]
    fn test_set_root_on_populated_octree_panics() {
        let mut octree = rooted(2.0);
        octree.insert(FaceIndex(0), Triangle::new(Vec3::ZERO, Vec3::X * 0.1, Vec3::Y * 0.1));
        octree.set_root(None);
    }

    #[test]
    #[should_panic(expected = "not initialised")]
    fn test_insert_without_root_panics() {
        let mut octree = Octree::new(small_config());
        octree.insert(FaceIndex(0), Triangle::new(Vec3::ZERO, Vec3::X, Vec3::Y));
    }

    #[test]
    fn test_enclosing_root() {
        let bounds = Aabb::new(Vec3::new(-1.0, 0.0, 0.0), Vec3::new(1.0, 1.0, 0.5));
        let root = OctreeRoot::enclosing(&bounds, 0.1);
        assert_eq!(root.center, Vec3::new(0.0, 0.5, 0.25));
        assert!((root.width - 2.4).abs() < 1e-6);
    }
}
