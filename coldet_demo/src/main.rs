//! Cube sweep demo
//!
//! Slides one cube through another along an axis and logs, per step, the
//! first colliding triangle pair, the total number of colliding pairs and
//! the traversal counters. Finishes with a small scene run through the
//! collision system.
//!
//! Usage: `coldet_demo [scene.toml | scene.ron]`

use coldet_engine::foundation::logging;
use coldet_engine::prelude::*;
use serde::{Deserialize, Serialize};

/// Scene description for the demo
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
struct DemoConfig {
    /// Engine settings used for every model
    engine: ColdetConfig,
    /// Edge length of the cubes
    cube_size: f64,
    /// Orientation of the moving cube (roll, pitch, yaw in degrees)
    rotation_degrees: [f64; 3],
    /// Direction of the sweep
    axis: [f64; 3],
    /// Offset of the moving cube at the first step
    start: f64,
    /// Offset of the moving cube at the last step
    end: f64,
    /// Number of intervals between start and end
    steps: u32,
    /// Cubes placed in a row for the collision system pass
    scene_cubes: u32,
    /// Distance between neighboring cubes in that row
    scene_spacing: f64,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            engine: ColdetConfig::default(),
            cube_size: 1.0,
            rotation_degrees: [0.0, 30.0, 45.0],
            axis: [1.0, 0.0, 0.0],
            start: -2.5,
            end: 2.5,
            steps: 20,
            scene_cubes: 6,
            scene_spacing: 0.9,
        }
    }
}

impl Config for DemoConfig {}

/// Closed cube of 12 triangles centered on the origin
fn cube(size: f64, is_static: bool, config: &ColdetConfig) -> Result<CollisionModel, MeshError> {
    let h = size * 0.5;
    let vertices: Vec<Vec3> = (0..8)
        .map(|i| {
            let coord = |bit: u32| if i & bit == 0 { -h } else { h };
            Vec3::new(coord(1), coord(2), coord(4))
        })
        .collect();
    let indices = [
        0, 4, 6, 0, 6, 2, 1, 3, 7, 1, 7, 5, 0, 1, 5, 0, 5, 4, 2, 6, 7, 2, 7, 3, 0, 2, 3, 0, 3, 1,
        4, 5, 7, 4, 7, 6,
    ];

    let mut builder = CollisionModelBuilder::from_config(is_static, Some(12), config);
    builder.add_indexed_mesh(&vertices, &indices)?;
    Ok(builder.finish())
}

/// Offsets visited by the sweep, both ends included
fn sweep_offsets(config: &DemoConfig) -> Vec<f64> {
    let steps = config.steps.max(1);
    (0..=steps)
        .map(|i| config.start + (config.end - config.start) * f64::from(i) / f64::from(steps))
        .collect()
}

/// Run the sweep; returns how many steps collided
fn run_sweep(config: &DemoConfig) -> Result<usize, MeshError> {
    let fixed = cube(config.cube_size, true, &config.engine)?;
    let mut moving = cube(config.cube_size, false, &config.engine)?;
    let axis = Vec3::from(config.axis).try_normalize(1.0e-6).unwrap_or_else(Vec3::x);
    let [roll, pitch, yaw] = config.rotation_degrees;

    let mut colliding_steps = 0;
    for offset in sweep_offsets(config) {
        let placement =
            RigidTransform::from_position_euler_degrees(axis * offset, roll, pitch, yaw);
        moving.set_transform(placement);
        let (hit, stats) = fixed.collision_with_stats(&moving, None);
        let pairs = fixed.collisions(&moving, None);

        match hit {
            Some(collision) => {
                colliding_steps += 1;
                let (a, b) = collision.indices();
                log::info!(
                    "offset {offset:+.3}: hit triangles ({a}, {b}), {} colliding pairs, \
                     {} box tests, {} triangle tests",
                    pairs.len(),
                    stats.box_tests,
                    stats.triangle_tests
                );
            }
            None => log::info!(
                "offset {offset:+.3}: clear, {} box tests ({} pruned)",
                stats.box_tests,
                stats.pruned
            ),
        }
    }
    Ok(colliding_steps)
}

/// Place a row of cubes and run a full detection pass
fn run_scene(config: &DemoConfig) -> Result<Vec<ModelCollision>, MeshError> {
    let mut system = MeshCollisionSystem::new(config.engine.clone());
    let mut keys: Vec<ModelKey> = Vec::with_capacity(config.scene_cubes as usize);
    for i in 0..config.scene_cubes {
        let key = system.insert(cube(config.cube_size, false, &config.engine)?);
        let position = Vec3::new(f64::from(i) * config.scene_spacing, 0.0, 0.0);
        system.set_transform(key, RigidTransform::from_translation(position));
        keys.push(key);
    }

    let found = system.detect_collisions();
    for hit in &found {
        let index_a = keys.iter().position(|&k| k == hit.key_a).unwrap_or_default();
        let index_b = keys.iter().position(|&k| k == hit.key_b).unwrap_or_default();
        log::info!("scene: cube {index_a} touches cube {index_b}");
    }
    log::info!("scene: {:?}", system.last_stats());
    Ok(found)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_with_default("info");

    let config = match std::env::args().nth(1) {
        Some(path) => {
            log::info!("Loading scene from {path}");
            DemoConfig::load_from_file(&path)?
        }
        None => DemoConfig::default(),
    };

    println!("=== Cube Sweep Demo ===");
    println!("Heuristic: {:?}", config.engine.split_heuristic);
    println!();

    let colliding = run_sweep(&config)?;
    println!("{colliding} of {} sweep steps collided", sweep_offsets(&config).len());

    let found = run_scene(&config)?;
    println!("{} touching cube pairs in the scene", found.len());
    Ok(())
}
