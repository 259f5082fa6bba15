//! Collision system over many placed models
//!
//! Each model pair goes through three phases, cheapest first:
//! bounding spheres, then the oriented root boxes, then the full dual-tree
//! query. The first phase can be switched off through [`ColdetConfig`].

use slotmap::{new_key_type, SlotMap};

use crate::core::config::ColdetConfig;
use crate::foundation::math::RigidTransform;
use crate::physics::collision::{Collision, CollisionModel};

new_key_type! {
    /// Handle to a model stored in a [`MeshCollisionSystem`]
    pub struct ModelKey;
}

/// Two stored models whose triangles intersect
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelCollision {
    /// Queried model
    pub key_a: ModelKey,
    /// Other model
    pub key_b: ModelKey,
    /// First intersecting triangle pair
    pub collision: Collision,
}

/// Counters from the last [`MeshCollisionSystem::detect_collisions`] run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhaseStats {
    /// Model pairs considered
    pub pairs: usize,
    /// Pairs rejected by the bounding spheres
    pub sphere_rejects: usize,
    /// Pairs rejected by the root boxes
    pub box_rejects: usize,
    /// Pairs that needed the full tree query
    pub tree_queries: usize,
    /// Pairs found colliding
    pub hits: usize,
}

enum PairOutcome {
    SphereReject,
    BoxReject,
    Miss,
    Hit(Collision),
}

/// Stores finished models under stable keys and tests them against each other
pub struct MeshCollisionSystem {
    models: SlotMap<ModelKey, CollisionModel>,
    config: ColdetConfig,
    last_stats: PhaseStats,
}

impl Default for MeshCollisionSystem {
    fn default() -> Self {
        Self::new(ColdetConfig::default())
    }
}

impl MeshCollisionSystem {
    /// Create an empty system
    pub fn new(config: ColdetConfig) -> Self {
        Self {
            models: SlotMap::with_key(),
            config,
            last_stats: PhaseStats::default(),
        }
    }

    /// Settings in use
    pub fn config(&self) -> &ColdetConfig {
        &self.config
    }

    /// Store a finished model
    pub fn insert(&mut self, model: CollisionModel) -> ModelKey {
        let key = self.models.insert(model);
        log::debug!("Registered collision model {key:?}");
        key
    }

    /// Remove a model, handing it back
    pub fn remove(&mut self, key: ModelKey) -> Option<CollisionModel> {
        self.models.remove(key)
    }

    /// Move a model; returns `false` for an unknown key
    pub fn set_transform(&mut self, key: ModelKey, transform: RigidTransform) -> bool {
        match self.models.get_mut(key) {
            Some(model) => {
                model.set_transform(transform);
                true
            }
            None => {
                log::warn!("set_transform on unknown collision model {key:?}");
                false
            }
        }
    }

    /// Look up a model
    pub fn get(&self, key: ModelKey) -> Option<&CollisionModel> {
        self.models.get(key)
    }

    /// Check if a key is registered
    pub fn contains(&self, key: ModelKey) -> bool {
        self.models.contains_key(key)
    }

    /// Number of stored models
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Check if no models are stored
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Counters from the last full detection pass
    pub fn last_stats(&self) -> PhaseStats {
        self.last_stats
    }

    /// Test two stored models; unknown keys never collide
    pub fn test_pair(&self, a: ModelKey, b: ModelKey) -> Option<Collision> {
        match self.classify(a, b)? {
            PairOutcome::Hit(collision) => Some(collision),
            _ => None,
        }
    }

    fn classify(&self, a: ModelKey, b: ModelKey) -> Option<PairOutcome> {
        let model_a = self.models.get(a)?;
        let model_b = self.models.get(b)?;
        let relative = model_a.relative_transform(model_b, None);

        if self.config.sphere_pretest && !model_a.spheres_overlap(model_b, &relative) {
            return Some(PairOutcome::SphereReject);
        }
        if !model_a.root_boxes_overlap(model_b, &relative) {
            return Some(PairOutcome::BoxReject);
        }
        Some(match model_a.collision(model_b, None) {
            Some(collision) => PairOutcome::Hit(collision),
            None => PairOutcome::Miss,
        })
    }

    /// Test every unordered pair of stored models
    pub fn detect_collisions(&mut self) -> Vec<ModelCollision> {
        let keys: Vec<ModelKey> = self.models.keys().collect();
        let mut stats = PhaseStats::default();
        let mut found = Vec::new();

        for (i, &key_a) in keys.iter().enumerate() {
            for &key_b in &keys[i + 1..] {
                stats.pairs += 1;
                match self.classify(key_a, key_b) {
                    Some(PairOutcome::SphereReject) => stats.sphere_rejects += 1,
                    Some(PairOutcome::BoxReject) => stats.box_rejects += 1,
                    Some(PairOutcome::Miss) => stats.tree_queries += 1,
                    Some(PairOutcome::Hit(collision)) => {
                        stats.tree_queries += 1;
                        stats.hits += 1;
                        found.push(ModelCollision { key_a, key_b, collision });
                    }
                    None => {}
                }
            }
        }

        log::debug!(
            "Collision pass over {} models: {} pairs, {} sphere rejects, {} box rejects, \
             {} tree queries, {} hits",
            keys.len(),
            stats.pairs,
            stats.sphere_rejects,
            stats.box_rejects,
            stats.tree_queries,
            stats.hits
        );
        self.last_stats = stats;
        found
    }

    /// First collision between any model of `set_a` and any model of `set_b`
    ///
    /// A key present in both sets is tested against itself.
    pub fn test_sets(&self, set_a: &[ModelKey], set_b: &[ModelKey]) -> Option<ModelCollision> {
        set_a.iter().find_map(|&key_a| {
            set_b.iter().find_map(|&key_b| {
                self.test_pair(key_a, key_b)
                    .map(|collision| ModelCollision { key_a, key_b, collision })
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;
    use crate::physics::collision::CollisionModelBuilder;

    /// Flat square of two triangles in the z = 0 plane
    fn plate(size: f64) -> CollisionModel {
        let h = size * 0.5;
        let mut builder = CollisionModelBuilder::new(false, Some(2));
        builder
            .add_triangle(Vec3::new(-h, -h, 0.0), Vec3::new(h, -h, 0.0), Vec3::new(h, h, 0.0))
            .add_triangle(Vec3::new(-h, -h, 0.0), Vec3::new(h, h, 0.0), Vec3::new(-h, h, 0.0));
        builder.finish()
    }

    fn at(x: f64, y: f64, z: f64) -> RigidTransform {
        RigidTransform::from_translation(Vec3::new(x, y, z))
    }

    fn standing_at(x: f64) -> RigidTransform {
        RigidTransform::from_position_euler_degrees(Vec3::new(x, 0.0, 0.0), 90.0, 0.0, 0.0)
    }

    #[test]
    fn test_crossing_plates_collide() {
        let mut system = MeshCollisionSystem::default();
        let a = system.insert(plate(2.0));
        let b = system.insert(plate(2.0));
        system.set_transform(b, standing_at(0.2));

        let hit = system.test_pair(a, b).unwrap();
        assert!(hit.indices().0 < 2 && hit.indices().1 < 2);
        assert!(system.test_pair(b, a).is_some());
    }

    #[test]
    fn test_detect_collisions_counts_phases() {
        let mut system = MeshCollisionSystem::default();
        let a = system.insert(plate(2.0));
        let b = system.insert(plate(2.0));
        let far = system.insert(plate(2.0));
        let stacked = system.insert(plate(2.0));
        system.set_transform(b, standing_at(0.5));
        system.set_transform(far, at(50.0, 0.0, 0.0));
        // spheres overlap but the flat boxes are apart
        system.set_transform(stacked, at(0.0, 0.0, 1.0));

        let found = system.detect_collisions();
        let stats = system.last_stats();
        assert_eq!(stats.pairs, 6);
        assert!(stats.sphere_rejects >= 3);
        assert!(stats.hits >= 1);
        assert!(found.iter().any(|c| (c.key_a, c.key_b) == (a, b) || (c.key_a, c.key_b) == (b, a)));
        assert!(found.iter().all(|c| c.key_a != far && c.key_b != far));
        assert_eq!(stats.sphere_rejects + stats.box_rejects + stats.tree_queries, stats.pairs);
    }

    #[test]
    fn test_sphere_pretest_can_be_disabled() {
        let config = ColdetConfig {
            sphere_pretest: false,
            ..ColdetConfig::default()
        };
        let mut system = MeshCollisionSystem::new(config);
        system.insert(plate(1.0));
        let far = system.insert(plate(1.0));
        system.set_transform(far, at(20.0, 0.0, 0.0));

        assert!(system.detect_collisions().is_empty());
        let stats = system.last_stats();
        assert_eq!(stats.sphere_rejects, 0);
        assert_eq!(stats.box_rejects, 1);
    }

    #[test]
    fn test_sets_include_self_collision() {
        let mut system = MeshCollisionSystem::default();
        let a = system.insert(plate(1.0));
        let b = system.insert(plate(1.0));
        system.set_transform(b, at(10.0, 0.0, 0.0));

        assert!(system.test_sets(&[a], &[b]).is_none());
        let hit = system.test_sets(&[a, b], &[b]).unwrap();
        assert_eq!((hit.key_a, hit.key_b), (b, b));
    }

    #[test]
    fn test_removed_and_unknown_keys() {
        let mut system = MeshCollisionSystem::default();
        let a = system.insert(plate(1.0));
        let b = system.insert(plate(1.0));
        assert!(system.remove(b).is_some());
        assert!(!system.contains(b));
        assert!(!system.set_transform(b, at(1.0, 0.0, 0.0)));
        assert!(system.test_pair(a, b).is_none());
        assert_eq!(system.len(), 1);
    }
}
