//! Collision models and the dual-tree query
//!
//! A model is built once from a triangle stream through
//! [`CollisionModelBuilder`] and is immutable afterwards apart from its
//! world transform. Two models are tested against each other by walking both
//! box trees at once with a stack of node pairs.
//!
//! Traversal order is fixed so that first-hit results are reproducible:
//!
//! - pairs are popped last-in first-out, starting from the two roots;
//! - when a node is expanded its present children are pushed first then
//!   second, so the second child is examined first;
//! - when both nodes can be expanded, the one with the larger box volume is
//!   expanded, and a tie expands the node of the other model.

use std::ops::ControlFlow;

use crate::core::config::ColdetConfig;
use crate::foundation::math::{Mat3, RigidTransform, Vec3};
use crate::spatial::box_tree::{BoxTree, Node, SplitHeuristic};

use super::bounding_box::BoundingBox;
use super::sphere::BoundingSphere;
use super::triangle::Triangle;

/// Smallest initial size of the per-query work queue
pub const DEFAULT_MIN_QUEUE_CAPACITY: usize = 64;

/// Triangle capacity reserved when no hint is given
const DEFAULT_TRIANGLE_CAPACITY: usize = 10;

/// Errors raised while feeding indexed geometry into a builder
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MeshError {
    /// Index count is not a multiple of three
    #[error("index count {0} is not a multiple of 3")]
    IncompleteTriangle(usize),

    /// An index points past the end of the vertex list
    #[error("vertex index {index} out of range for {vertex_count} vertices")]
    IndexOutOfRange {
        /// Offending index
        index: u32,
        /// Length of the vertex list
        vertex_count: usize,
    },
}

/// Accumulates triangles for a model that has not been finished yet
#[derive(Debug, Clone)]
pub struct CollisionModelBuilder {
    triangles: Vec<Triangle>,
    is_static: bool,
    heuristic: SplitHeuristic,
    min_queue_capacity: usize,
}

impl CollisionModelBuilder {
    /// Start a model
    ///
    /// Static models cache the inverse of their transform. The hint only
    /// sizes the triangle storage.
    pub fn new(is_static: bool, triangle_count_hint: Option<usize>) -> Self {
        Self {
            triangles: Vec::with_capacity(triangle_count_hint.unwrap_or(DEFAULT_TRIANGLE_CAPACITY)),
            is_static,
            heuristic: SplitHeuristic::default(),
            min_queue_capacity: DEFAULT_MIN_QUEUE_CAPACITY,
        }
    }

    /// Start a model using the heuristic and queue sizing from `config`
    pub fn from_config(
        is_static: bool,
        triangle_count_hint: Option<usize>,
        config: &ColdetConfig,
    ) -> Self {
        let mut builder =
            Self::new(is_static, triangle_count_hint).with_heuristic(config.split_heuristic);
        builder.min_queue_capacity = config.min_queue_capacity.max(1);
        builder
    }

    /// Choose the split heuristic used by [`finish`](Self::finish)
    pub fn with_heuristic(mut self, heuristic: SplitHeuristic) -> Self {
        self.heuristic = heuristic;
        self
    }

    /// Append one triangle
    pub fn add_triangle(&mut self, p1: Vec3, p2: Vec3, p3: Vec3) -> &mut Self {
        self.triangles.push(Triangle::new(p1, p2, p3));
        self
    }

    /// Append an indexed triangle list
    ///
    /// Nothing is added when any index is invalid.
    pub fn add_indexed_mesh(
        &mut self,
        vertices: &[Vec3],
        indices: &[u32],
    ) -> Result<&mut Self, MeshError> {
        if indices.len() % 3 != 0 {
            return Err(MeshError::IncompleteTriangle(indices.len()));
        }
        if let Some(&index) = indices.iter().find(|&&i| i as usize >= vertices.len()) {
            return Err(MeshError::IndexOutOfRange { index, vertex_count: vertices.len() });
        }

        self.triangles.reserve(indices.len() / 3);
        for chunk in indices.chunks_exact(3) {
            let corner = |k: usize| vertices[chunk[k] as usize];
            self.triangles.push(Triangle::new(corner(0), corner(1), corner(2)));
        }
        Ok(self)
    }

    /// Number of triangles added so far
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Build the box tree and freeze the triangle list
    pub fn finish(self) -> CollisionModel {
        let tree = BoxTree::build(&self.triangles, self.heuristic);
        let sphere = BoundingSphere::enclosing(tree.root().bounds().center(), &self.triangles);
        let transform = RigidTransform::identity();

        CollisionModel {
            cached_inverse: self.is_static.then_some(transform),
            triangles: self.triangles,
            tree,
            transform,
            is_static: self.is_static,
            sphere,
            min_queue_capacity: self.min_queue_capacity,
        }
    }
}

/// Frame in which [`Collision::triangles`] reports the colliding triangles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Space {
    /// Each triangle in its own model's frame
    Model,
    /// Both triangles in the shared world frame
    World,
}

/// First pair of intersecting triangles found by a query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Collision {
    index_a: usize,
    index_b: usize,
    triangle_a: Triangle,
    triangle_b: Triangle,
    transform_a: RigidTransform,
    transform_b: RigidTransform,
}

impl Collision {
    /// Triangle indices in the queried model and the other model
    pub fn indices(&self) -> (usize, usize) {
        (self.index_a, self.index_b)
    }

    /// The two triangles, expressed in `space`
    pub fn triangles(&self, space: Space) -> (Triangle, Triangle) {
        match space {
            Space::Model => (self.triangle_a, self.triangle_b),
            Space::World => (
                self.triangle_a.transformed(self.transform_a.matrix()),
                self.triangle_b.transformed(self.transform_b.matrix()),
            ),
        }
    }

    /// World transforms of the two models at query time
    pub fn transforms(&self) -> (RigidTransform, RigidTransform) {
        (self.transform_a, self.transform_b)
    }
}

/// Indices of one intersecting triangle pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CollisionPair {
    /// Triangle in the queried model
    pub index_a: usize,
    /// Triangle in the other model
    pub index_b: usize,
}

/// Work done by a single query
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryStats {
    /// Node pairs put through the box test
    pub box_tests: usize,
    /// Node pairs rejected by the box test
    pub pruned: usize,
    /// Exact triangle tests run
    pub triangle_tests: usize,
    /// Intersecting triangle pairs seen
    pub hits: usize,
    /// Largest number of pending pairs
    pub peak_queue: usize,
    /// Queue capacity when the query ended
    pub queue_capacity: usize,
}

/// A finished, queryable triangle model
#[derive(Debug, Clone)]
pub struct CollisionModel {
    triangles: Vec<Triangle>,
    tree: BoxTree,
    transform: RigidTransform,
    cached_inverse: Option<RigidTransform>,
    is_static: bool,
    sphere: BoundingSphere,
    min_queue_capacity: usize,
}

impl CollisionModel {
    /// Place the model in the world
    pub fn set_transform(&mut self, transform: RigidTransform) {
        self.transform = transform;
        if self.is_static {
            self.cached_inverse = Some(transform.inverse());
        }
    }

    /// Current world transform
    pub fn transform(&self) -> &RigidTransform {
        &self.transform
    }

    /// Whether the inverse transform is cached
    pub fn is_static(&self) -> bool {
        self.is_static
    }

    /// Number of triangles
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Triangle by index, in model space
    pub fn triangle(&self, index: usize) -> Option<&Triangle> {
        self.triangles.get(index)
    }

    /// All triangles in model space
    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    /// The box tree
    pub fn tree(&self) -> &BoxTree {
        &self.tree
    }

    /// Heuristic the tree was built with
    pub fn heuristic(&self) -> SplitHeuristic {
        self.tree.heuristic()
    }

    /// Bounding sphere in model space
    pub fn bounding_sphere(&self) -> &BoundingSphere {
        &self.sphere
    }

    /// Axis-aligned world box around the model's root box
    pub fn world_bounds(&self) -> BoundingBox {
        self.tree.root().bounds().transformed(&self.transform)
    }

    fn inverse_transform(&self) -> RigidTransform {
        self.cached_inverse.unwrap_or_else(|| self.transform.inverse())
    }

    /// Transform from `other`'s model space into this model's space
    ///
    /// `override_transform` replaces `other`'s own world transform.
    pub fn relative_transform(
        &self,
        other: &CollisionModel,
        override_transform: Option<&RigidTransform>,
    ) -> RigidTransform {
        let other_transform = override_transform.unwrap_or(&other.transform);
        self.inverse_transform().compose(other_transform)
    }

    /// Cheap reject: do the two bounding spheres touch
    pub fn spheres_overlap(&self, other: &CollisionModel, relative: &RigidTransform) -> bool {
        self.sphere.intersects(&other.sphere.transformed(relative))
    }

    /// Oriented box test on the two root boxes
    pub fn root_boxes_overlap(&self, other: &CollisionModel, relative: &RigidTransform) -> bool {
        self.tree.root().bounds().overlaps(
            other.tree.root().bounds(),
            &relative.rotation(),
            &relative.translation(),
        )
    }

    /// First intersecting triangle pair, if any
    pub fn collision(
        &self,
        other: &CollisionModel,
        override_transform: Option<&RigidTransform>,
    ) -> Option<Collision> {
        self.collision_with_stats(other, override_transform).0
    }

    /// Like [`collision`](Self::collision), also reporting the work done
    pub fn collision_with_stats(
        &self,
        other: &CollisionModel,
        override_transform: Option<&RigidTransform>,
    ) -> (Option<Collision>, QueryStats) {
        let relative = self.relative_transform(other, override_transform);
        let mut found = None;
        let stats = self.walk_pairs(other, &relative, |a, b| {
            found = Some((a, b));
            ControlFlow::Break(())
        });

        let collision = found.map(|(index_a, index_b)| Collision {
            index_a,
            index_b,
            triangle_a: self.triangles[index_a],
            triangle_b: other.triangles[index_b],
            transform_a: self.transform,
            transform_b: *override_transform.unwrap_or(&other.transform),
        });
        (collision, stats)
    }

    /// Every intersecting triangle pair, sorted by index
    pub fn collisions(
        &self,
        other: &CollisionModel,
        override_transform: Option<&RigidTransform>,
    ) -> Vec<CollisionPair> {
        let relative = self.relative_transform(other, override_transform);
        let mut pairs = Vec::new();
        self.walk_pairs(other, &relative, |index_a, index_b| {
            pairs.push(CollisionPair { index_a, index_b });
            ControlFlow::Continue(())
        });
        pairs.sort_unstable();
        pairs.dedup();
        pairs
    }

    fn queue_capacity(&self, other: &CollisionModel) -> usize {
        let largest = self.triangles.len().max(other.triangles.len());
        self.min_queue_capacity.max(largest >> 4)
    }

    /// Walk both trees, calling `on_hit` for each intersecting triangle pair
    /// until it breaks
    fn walk_pairs<F>(
        &self,
        other: &CollisionModel,
        relative: &RigidTransform,
        mut on_hit: F,
    ) -> QueryStats
    where
        F: FnMut(usize, usize) -> ControlFlow<()>,
    {
        let mut stats = QueryStats::default();
        if self.triangles.is_empty() || other.triangles.is_empty() {
            return stats;
        }

        let mut queue = WorkQueue::with_capacity(self.queue_capacity(other));
        queue.push(self.tree.root(), other.tree.root());

        let pass = Pass {
            a: self,
            b: other,
            relative: *relative,
            rotation: relative.rotation(),
            translation: relative.translation(),
        };
        pass.run(&mut queue, &mut stats, &mut on_hit);

        stats.peak_queue = queue.peak;
        stats.queue_capacity = queue.capacity;
        log::trace!(
            "Collision query: {} box tests, {} pruned, {} triangle tests, {} hits, \
             queue peak {} of {}",
            stats.box_tests,
            stats.pruned,
            stats.triangle_tests,
            stats.hits,
            stats.peak_queue,
            stats.queue_capacity
        );
        stats
    }
}

/// One traversal of a model pair
struct Pass<'a> {
    a: &'a CollisionModel,
    b: &'a CollisionModel,
    relative: RigidTransform,
    rotation: Mat3,
    translation: Vec3,
}

impl<'a> Pass<'a> {
    fn run<F>(&self, queue: &mut WorkQueue<'a>, stats: &mut QueryStats, on_hit: &mut F)
    where
        F: FnMut(usize, usize) -> ControlFlow<()>,
    {
        while let Some((node_a, node_b)) = queue.pop() {
            stats.box_tests += 1;
            if !node_a
                .bounds()
                .overlaps(node_b.bounds(), &self.rotation, &self.translation)
            {
                stats.pruned += 1;
                continue;
            }

            let (list_a, list_b) = (node_a.triangles(), node_b.triangles());
            if !list_a.is_empty() && !list_b.is_empty() {
                if self.test_triangles(list_a, list_b, stats, on_hit).is_break() {
                    return;
                }
                continue;
            }

            if !node_a.has_children() {
                for child in node_b.children() {
                    queue.push(node_a, child);
                }
            } else if !node_b.has_children() {
                for child in node_a.children() {
                    queue.push(child, node_b);
                }
            } else if node_a.bounds().volume() > node_b.bounds().volume() {
                for child in node_a.children() {
                    queue.push(child, node_b);
                }
            } else {
                for child in node_b.children() {
                    queue.push(node_a, child);
                }
            }
        }
    }

    fn test_triangles<F>(
        &self,
        list_a: &[u32],
        list_b: &[u32],
        stats: &mut QueryStats,
        on_hit: &mut F,
    ) -> ControlFlow<()>
    where
        F: FnMut(usize, usize) -> ControlFlow<()>,
    {
        for &i in list_a {
            let triangle_a = &self.a.triangles[i as usize];
            for &j in list_b {
                stats.triangle_tests += 1;
                let triangle_b = self.b.triangles[j as usize].transformed(self.relative.matrix());
                if triangle_a.intersects(&triangle_b) {
                    stats.hits += 1;
                    if on_hit(i as usize, j as usize).is_break() {
                        return ControlFlow::Break(());
                    }
                }
            }
        }
        ControlFlow::Continue(())
    }
}

/// Stack of pending node pairs whose reserved size doubles once it is more
/// than half full
struct WorkQueue<'a> {
    pairs: Vec<(&'a Node, &'a Node)>,
    capacity: usize,
    peak: usize,
}

impl<'a> WorkQueue<'a> {
    fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            pairs: Vec::with_capacity(capacity),
            capacity,
            peak: 0,
        }
    }

    fn push(&mut self, a: &'a Node, b: &'a Node) {
        self.pairs.push((a, b));
        self.peak = self.peak.max(self.pairs.len());
        if self.pairs.len() > self.capacity / 2 {
            self.capacity *= 2;
            self.pairs.reserve(self.capacity - self.pairs.len());
            log::trace!("Collision work queue grown to {}", self.capacity);
        }
    }

    fn pop(&mut self) -> Option<(&'a Node, &'a Node)> {
        self.pairs.pop()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::logging;
    use crate::foundation::math::Quat;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    const HEURISTICS: [SplitHeuristic; 2] =
        [SplitHeuristic::LargestSpread, SplitHeuristic::BestBalance];

    fn random_vec(rng: &mut StdRng, reach: f64) -> Vec3 {
        Vec3::new(
            rng.gen_range(-reach..reach),
            rng.gen_range(-reach..reach),
            rng.gen_range(-reach..reach),
        )
    }

    fn random_rotation(rng: &mut StdRng) -> Quat {
        Quat::from_euler_angles(
            rng.gen_range(-3.0..3.0),
            rng.gen_range(-1.5..1.5),
            rng.gen_range(-3.0..3.0),
        )
    }

    fn cube(is_static: bool, heuristic: SplitHeuristic) -> CollisionModel {
        let vertices: Vec<Vec3> = (0..8)
            .map(|i| {
                let coord = |bit: u32| if i & bit == 0 { -0.5 } else { 0.5 };
                Vec3::new(coord(1), coord(2), coord(4))
            })
            .collect();
        let indices = [
            0, 4, 6, 0, 6, 2, // -x
            1, 3, 7, 1, 7, 5, // +x
            0, 1, 5, 0, 5, 4, // -y
            2, 6, 7, 2, 7, 3, // +y
            0, 2, 3, 0, 3, 1, // -z
            4, 5, 7, 4, 7, 6, // +z
        ];
        let mut builder = CollisionModelBuilder::new(is_static, Some(12)).with_heuristic(heuristic);
        builder.add_indexed_mesh(&vertices, &indices).unwrap();
        builder.finish()
    }

    fn soup(rng: &mut StdRng, count: usize, heuristic: SplitHeuristic) -> CollisionModel {
        let mut builder = CollisionModelBuilder::new(false, Some(count)).with_heuristic(heuristic);
        for _ in 0..count {
            let base = random_vec(rng, 2.0);
            let (p2, p3) = (base + random_vec(rng, 0.6), base + random_vec(rng, 0.6));
            builder.add_triangle(base, p2, p3);
        }
        builder.finish()
    }

    fn random_transform(rng: &mut StdRng, reach: f64) -> RigidTransform {
        let position = Vec3::new(
            rng.gen_range(-reach..reach),
            rng.gen_range(-reach..reach),
            rng.gen_range(-reach..reach),
        );
        RigidTransform::from_position_euler_degrees(
            position,
            rng.gen_range(-180.0..180.0),
            rng.gen_range(-90.0..90.0),
            rng.gen_range(-180.0..180.0),
        )
    }

    fn brute_force(a: &CollisionModel, b: &CollisionModel) -> Vec<CollisionPair> {
        let relative = a.relative_transform(b, None);
        let mut pairs = Vec::new();
        for (index_a, ta) in a.triangles().iter().enumerate() {
            for (index_b, tb) in b.triangles().iter().enumerate() {
                if ta.intersects(&tb.transformed(relative.matrix())) {
                    pairs.push(CollisionPair { index_a, index_b });
                }
            }
        }
        pairs
    }

    #[test]
    fn test_cube_has_twelve_triangles() {
        let model = cube(false, SplitHeuristic::LargestSpread);
        assert_eq!(model.triangle_count(), 12);
        assert!(model.tree().stats().leaves > 0);
    }

    #[test]
    fn test_self_copy_at_identity_collides() {
        for heuristic in HEURISTICS {
            let a = cube(false, heuristic);
            let b = cube(true, heuristic);
            assert!(a.collision(&b, None).is_some());
            assert!(b.collision(&a, None).is_some());
        }
    }

    #[test]
    fn test_cubes_beyond_diagonal_never_collide() {
        let mut rng = StdRng::seed_from_u64(7);
        for heuristic in HEURISTICS {
            let a = cube(false, heuristic);
            let mut b = cube(false, heuristic);
            for _ in 0..50 {
                let direction =
                    random_vec(&mut rng, 1.0).try_normalize(1.0e-3).unwrap_or_else(Vec3::x);
                let rotation = random_rotation(&mut rng);
                b.set_transform(RigidTransform::from_position_rotation(direction * 1.75, rotation));
                assert!(a.collision(&b, None).is_none());
            }
        }
    }

    #[test]
    fn test_interpenetrating_cubes_collide() {
        let mut rng = StdRng::seed_from_u64(11);
        for heuristic in HEURISTICS {
            let a = cube(true, heuristic);
            let mut b = cube(false, heuristic);
            for _ in 0..50 {
                let direction =
                    random_vec(&mut rng, 1.0).try_normalize(1.0e-3).unwrap_or_else(Vec3::y);
                let rotation = random_rotation(&mut rng);
                b.set_transform(RigidTransform::from_position_rotation(direction * 0.6, rotation));
                assert!(a.collision(&b, None).is_some());
            }
        }
    }

    #[test]
    fn test_cube_face_contact_is_collision() {
        for heuristic in HEURISTICS {
            let mut a = cube(false, heuristic);
            let mut b = cube(true, heuristic);
            let bases = [
                Vec3::zeros(),
                Vec3::new(3.7, -1.2, 0.4),
                Vec3::new(57.3, 28.65, -40.11),
                Vec3::new(512.9, 256.45, -359.03),
            ];
            for base in bases {
                let frame = RigidTransform::from_position_euler_degrees(base, 30.0, 40.0, 50.0);
                // +x face of `a` lies flat on the -x face of `b`, shifted within the plane
                let offset = frame.rotation() * Vec3::new(1.0, 0.3, 0.2);
                a.set_transform(frame);
                b.set_transform(RigidTransform::from_position_euler_degrees(
                    base + offset,
                    30.0,
                    40.0,
                    50.0,
                ));
                assert!(a.collision(&b, None).is_some(), "{heuristic:?} at {base:?}");
                assert!(b.collision(&a, None).is_some(), "{heuristic:?} at {base:?}");
            }
        }
    }

    #[test]
    fn test_coplanar_containment_under_shared_transform() {
        let model = |p1: Vec3, p2: Vec3, p3: Vec3| {
            let mut builder = CollisionModelBuilder::new(false, Some(1));
            builder.add_triangle(p1, p2, p3);
            builder.finish()
        };
        let mut outer = model(Vec3::zeros(), Vec3::new(10.0, 0.0, 0.0), Vec3::new(0.0, 10.0, 0.0));
        let mut inner =
            model(Vec3::new(1.0, 1.0, 0.0), Vec3::new(2.0, 1.0, 0.0), Vec3::new(1.0, 2.0, 0.0));

        for reach in [0.0, 1.0, 10.0, 1000.0] {
            let shared = RigidTransform::from_position_euler_degrees(
                Vec3::new(reach, reach / 2.0, -0.7 * reach),
                30.0,
                40.0,
                50.0,
            );
            outer.set_transform(shared);
            inner.set_transform(shared);
            assert!(outer.collision(&inner, None).is_some(), "reach {reach}");
            assert!(inner.collision(&outer, None).is_some(), "reach {reach}");
        }
    }

    #[test]
    fn test_far_apart_pruned_at_root() {
        let a = cube(false, SplitHeuristic::LargestSpread);
        let mut b = cube(false, SplitHeuristic::LargestSpread);
        b.set_transform(RigidTransform::from_translation(Vec3::new(10.0, 0.0, 0.0)));
        let (hit, stats) = a.collision_with_stats(&b, None);
        assert!(hit.is_none());
        assert_eq!(stats.box_tests, 1);
        assert_eq!(stats.pruned, 1);
        assert_eq!(stats.triangle_tests, 0);
        assert_eq!(stats.queue_capacity, DEFAULT_MIN_QUEUE_CAPACITY);
    }

    #[test]
    fn test_verdict_is_symmetric() {
        logging::init_for_tests();
        let mut rng = StdRng::seed_from_u64(3);
        for heuristic in HEURISTICS {
            let mut a = cube(false, heuristic);
            let mut b = soup(&mut rng, 30, heuristic);
            for _ in 0..40 {
                a.set_transform(random_transform(&mut rng, 2.0));
                b.set_transform(random_transform(&mut rng, 2.0));
                assert_eq!(a.collision(&b, None).is_some(), b.collision(&a, None).is_some());
            }
        }
    }

    #[test]
    fn test_disjoint_world_boxes_never_collide() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut a = soup(&mut rng, 20, SplitHeuristic::BestBalance);
        let mut b = soup(&mut rng, 20, SplitHeuristic::LargestSpread);
        for _ in 0..60 {
            a.set_transform(random_transform(&mut rng, 6.0));
            b.set_transform(random_transform(&mut rng, 6.0));
            if !a.world_bounds().intersects(&b.world_bounds()) {
                assert!(a.collision(&b, None).is_none());
            }
        }
    }

    #[test]
    fn test_set_transform_is_idempotent() {
        let mut rng = StdRng::seed_from_u64(13);
        let a = soup(&mut rng, 25, SplitHeuristic::LargestSpread);
        let mut b = soup(&mut rng, 25, SplitHeuristic::LargestSpread);
        let transform = random_transform(&mut rng, 1.0);
        b.set_transform(transform);
        let first = a.collisions(&b, None);
        b.set_transform(transform);
        assert_eq!(a.collisions(&b, None), first);
    }

    #[test]
    fn test_static_and_dynamic_agree() {
        let mut rng = StdRng::seed_from_u64(17);
        let mut dynamic = soup(&mut rng, 25, SplitHeuristic::BestBalance);
        let mut builder =
            CollisionModelBuilder::new(true, None).with_heuristic(SplitHeuristic::BestBalance);
        for t in dynamic.triangles() {
            builder.add_triangle(t.v1, t.v2, t.v3);
        }
        let mut fixed = builder.finish();
        let other = soup(&mut rng, 25, SplitHeuristic::BestBalance);

        for _ in 0..20 {
            let transform = random_transform(&mut rng, 1.5);
            fixed.set_transform(transform);
            dynamic.set_transform(transform);
            assert_eq!(fixed.collisions(&other, None), dynamic.collisions(&other, None));
        }
    }

    #[test]
    fn test_override_matches_set_transform() {
        let mut rng = StdRng::seed_from_u64(19);
        let a = soup(&mut rng, 25, SplitHeuristic::LargestSpread);
        let mut b = soup(&mut rng, 25, SplitHeuristic::LargestSpread);
        for _ in 0..20 {
            let transform = random_transform(&mut rng, 1.5);
            let via_override = a.collisions(&b, Some(&transform));
            b.set_transform(transform);
            assert_eq!(a.collisions(&b, None), via_override);
            b.set_transform(RigidTransform::identity());
        }
    }

    #[test]
    fn test_heuristics_agree_with_brute_force() {
        let mut rng = StdRng::seed_from_u64(23);
        for _ in 0..10 {
            let seed_a: u64 = rng.gen();
            let seed_b: u64 = rng.gen();
            let placement = random_transform(&mut rng, 1.5);

            let mut results = Vec::new();
            for heuristic in HEURISTICS {
                let a = soup(&mut StdRng::seed_from_u64(seed_a), 40, heuristic);
                let mut b = soup(&mut StdRng::seed_from_u64(seed_b), 40, heuristic);
                b.set_transform(placement);

                let expected = brute_force(&a, &b);
                let pairs = a.collisions(&b, None);
                assert_eq!(pairs, expected);

                match a.collision(&b, None) {
                    Some(hit) => {
                        let (index_a, index_b) = hit.indices();
                        assert!(expected.contains(&CollisionPair { index_a, index_b }));
                    }
                    None => assert!(expected.is_empty()),
                }
                results.push(pairs);
            }
            assert_eq!(results[0], results[1]);
        }
    }

    #[test]
    fn test_collision_reports_triangles_in_both_spaces() {
        let a = cube(false, SplitHeuristic::LargestSpread);
        let mut b = cube(false, SplitHeuristic::LargestSpread);
        let transform = RigidTransform::from_translation(Vec3::new(0.5, 0.25, 0.0));
        b.set_transform(transform);

        let hit = a.collision(&b, None).unwrap();
        let (index_a, index_b) = hit.indices();
        let (model_a, model_b) = hit.triangles(Space::Model);
        assert_eq!(&model_a, a.triangle(index_a).unwrap());
        assert_eq!(&model_b, b.triangle(index_b).unwrap());

        let (world_a, world_b) = hit.triangles(Space::World);
        assert_eq!(world_a, model_a);
        assert_eq!(world_b, model_b.transformed(transform.matrix()));
        assert!(world_a.intersects(&world_b));
    }

    #[test]
    fn test_empty_model_never_collides() {
        let empty = CollisionModelBuilder::new(false, None).finish();
        let full = cube(false, SplitHeuristic::LargestSpread);
        assert!(empty.collision(&full, None).is_none());
        assert!(full.collision(&empty, None).is_none());
        assert!(full.collisions(&empty, None).is_empty());
    }

    #[test]
    fn test_sphere_pretest() {
        let a = cube(false, SplitHeuristic::LargestSpread);
        let b = cube(false, SplitHeuristic::LargestSpread);
        let near = RigidTransform::from_translation(Vec3::new(1.5, 0.0, 0.0));
        let far = RigidTransform::from_translation(Vec3::new(1.8, 0.0, 0.0));
        assert!(a.spheres_overlap(&b, &a.relative_transform(&b, Some(&near))));
        assert!(!a.spheres_overlap(&b, &a.relative_transform(&b, Some(&far))));
    }

    #[test]
    fn test_indexed_mesh_errors() {
        let vertices = [Vec3::zeros(), Vec3::x(), Vec3::y()];
        let mut builder = CollisionModelBuilder::new(false, None);
        assert_eq!(
            builder.add_indexed_mesh(&vertices, &[0, 1]).err(),
            Some(MeshError::IncompleteTriangle(2))
        );
        assert_eq!(
            builder.add_indexed_mesh(&vertices, &[0, 1, 3]).err(),
            Some(MeshError::IndexOutOfRange { index: 3, vertex_count: 3 })
        );
        assert_eq!(builder.triangle_count(), 0);
        builder.add_indexed_mesh(&vertices, &[0, 1, 2]).unwrap();
        assert_eq!(builder.triangle_count(), 1);
    }

    #[test]
    fn test_config_sets_heuristic_and_queue() {
        let config = ColdetConfig {
            split_heuristic: SplitHeuristic::BestBalance,
            min_queue_capacity: 8,
            ..ColdetConfig::default()
        };
        let mut builder = CollisionModelBuilder::from_config(false, None, &config);
        builder.add_triangle(Vec3::zeros(), Vec3::x(), Vec3::y());
        let model = builder.finish();
        assert_eq!(model.heuristic(), SplitHeuristic::BestBalance);
        let (_, stats) = model.collision_with_stats(&model, None);
        assert_eq!(stats.queue_capacity, 8);
    }

    #[test]
    fn test_work_queue_doubles_past_half() {
        let triangles = [Triangle::new(Vec3::zeros(), Vec3::x(), Vec3::y())];
        let tree = BoxTree::build(&triangles, SplitHeuristic::LargestSpread);
        let node = tree.root();

        let mut queue = WorkQueue::with_capacity(64);
        for _ in 0..32 {
            queue.push(node, node);
        }
        assert_eq!(queue.capacity, 64);
        queue.push(node, node);
        assert_eq!(queue.capacity, 128);
        for _ in 33..100 {
            queue.push(node, node);
        }
        assert_eq!(queue.capacity, 256);
        assert_eq!(queue.peak, 100);
        assert!(queue.pop().is_some());
    }

    #[test]
    fn test_model_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CollisionModel>();
    }
}
