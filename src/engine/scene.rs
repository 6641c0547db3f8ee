// Static scenery: ground, mountains, river, village, trees.
// Fire-and-forget construction at startup; populates the ECS world
// with Transform + Shape + Color entities the renderer batches up.

use bevy_ecs::world::World;
use glam::Vec3;
use rand::Rng;
use std::f32::consts::FRAC_PI_4;

use super::components::{Color, Primitive, Shape, Transform};
use super::config::Config;

const GROUND_COLOR: u32 = 0x3b7d3b;
const ROCK_COLOR: u32 = 0x5a4b41;
const FAR_ROCK_COLOR: u32 = 0x6a5c52;
const SNOW_COLOR: u32 = 0xffffff;
const WATER_COLOR: u32 = 0x42a5f5;
const WOOD_COLOR: u32 = 0x8b4513;
const ROOF_COLOR: u32 = 0x61341c;
const LEAF_COLOR: u32 = 0x228b22;

/// Build the whole static map. The only caller is simulation startup,
/// but it takes the Rng by parameter so tests can replay placement.
pub fn build_scene(world: &mut World, rng: &mut impl Rng, config: &Config) {
    spawn_ground(world, config);
    spawn_mountains(world);
    spawn_river(world);
    spawn_village(world, rng, config);
    spawn_trees(world, rng, config);
}

fn spawn_ground(world: &mut World, config: &Config) {
    world.spawn((
        Transform::from_position(Vec3::ZERO),
        Shape::new(
            Primitive::Quad,
            Vec3::new(config.map_size, 1.0, config.map_size),
        ),
        Color::from_hex(GROUND_COLOR),
    ));
}

fn spawn_mountains(world: &mut World) {
    // Large peak on the right.
    world.spawn((
        Transform::from_position(Vec3::new(80.0, 30.0, -50.0)),
        Shape::new(Primitive::Cone, Vec3::new(80.0, 60.0, 80.0)),
        Color::from_hex(ROCK_COLOR),
    ));
    // Far peak at the back, with a snow cap above it.
    world.spawn((
        Transform::from_position(Vec3::new(-100.0, 40.0, -120.0)),
        Shape::new(Primitive::Cone, Vec3::new(100.0, 80.0, 100.0)),
        Color::from_hex(FAR_ROCK_COLOR),
    ));
    world.spawn((
        Transform::from_position(Vec3::new(-100.0, 75.0, -120.0)),
        Shape::new(Primitive::Cone, Vec3::new(40.0, 15.0, 40.0)),
        Color::from_hex(SNOW_COLOR),
    ));
}

fn spawn_river(world: &mut World) {
    // Long thin slab sunk slightly below the ground plane.
    world.spawn((
        Transform::from_position(Vec3::new(40.0, -0.1, 0.0)),
        Shape::new(Primitive::Cube, Vec3::new(20.0, 0.5, 250.0)),
        Color::from_hex(WATER_COLOR),
    ));
}

fn spawn_village(world: &mut World, rng: &mut impl Rng, config: &Config) {
    for _ in 0..config.house_count {
        let x = config.village_center.x + (rng.r#gen::<f32>() - 0.5) * config.village_jitter;
        let z = config.village_center.y + (rng.r#gen::<f32>() - 0.5) * config.village_jitter;
        let size_x = rng.r#gen::<f32>() * 4.0 + 3.0;
        let size_z = rng.r#gen::<f32>() * 4.0 + 3.0;
        spawn_house(world, rng, x, z, size_x, size_z);
    }
}

fn spawn_house(world: &mut World, rng: &mut impl Rng, x: f32, z: f32, size_x: f32, size_z: f32) {
    let height = rng.r#gen::<f32>() * 3.0 + 4.0;
    world.spawn((
        Transform::from_position(Vec3::new(x, height / 2.0, z)),
        Shape::new(Primitive::Cube, Vec3::new(size_x, height, size_z)),
        Color::from_hex(WOOD_COLOR),
    ));

    // Pyramid roof, rotated 45 degrees so its edges line up with the walls.
    let roof_radius = size_x.max(size_z) / 1.5;
    world.spawn((
        Transform {
            position: Vec3::new(x, height + height / 4.0, z),
            yaw: FRAC_PI_4,
        },
        Shape::new(
            Primitive::Pyramid,
            Vec3::new(roof_radius * 2.0, height / 2.0, roof_radius * 2.0),
        ),
        Color::from_hex(ROOF_COLOR),
    ));
}

fn spawn_trees(world: &mut World, rng: &mut impl Rng, config: &Config) {
    let half = config.half_range();
    for _ in 0..config.tree_count {
        let x = (rng.r#gen::<f32>() - 0.5) * config.spawn_range;
        let z = (rng.r#gen::<f32>() - 0.5) * config.spawn_range;
        debug_assert!(x.abs() <= half && z.abs() <= half);

        // Keep trees out of the river and the village. Skipped draws
        // are not resampled, so the actual tree count runs under the
        // configured one.
        if config.river_zone.contains(x, z) || config.village_zone.contains(x, z) {
            continue;
        }

        world.spawn((
            Transform::from_position(Vec3::new(x, 1.5, z)),
            Shape::new(Primitive::Cylinder, Vec3::new(1.0, 3.0, 1.0)),
            Color::from_hex(WOOD_COLOR),
        ));
        world.spawn((
            Transform::from_position(Vec3::new(x, 5.0, z)),
            Shape::new(Primitive::Cone, Vec3::new(6.0, 6.0, 6.0)),
            Color::from_hex(LEAF_COLOR),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn built_world(seed: u64) -> (World, Config) {
        let mut world = World::new();
        let config = Config::default();
        let mut rng = StdRng::seed_from_u64(seed);
        build_scene(&mut world, &mut rng, &config);
        (world, config)
    }

    fn count_primitive(world: &mut World, primitive: Primitive) -> usize {
        world
            .query::<&Shape>()
            .iter(world)
            .filter(|s| s.primitive == primitive)
            .count()
    }

    #[test]
    fn one_ground_one_river() {
        let (mut world, _) = built_world(1);
        assert_eq!(count_primitive(&mut world, Primitive::Quad), 1);
        // The river is the only scenery cube besides the 10 house bodies.
        assert_eq!(count_primitive(&mut world, Primitive::Cube), 11);
    }

    #[test]
    fn every_house_gets_a_roof() {
        let (mut world, config) = built_world(2);
        assert_eq!(
            count_primitive(&mut world, Primitive::Pyramid),
            config.house_count
        );
    }

    #[test]
    fn leaves_match_trunks_and_mountains() {
        let (mut world, _) = built_world(3);
        let trunks = count_primitive(&mut world, Primitive::Cylinder);
        let cones = count_primitive(&mut world, Primitive::Cone);
        // 2 mountains + 1 snow cap + one leaf cone per trunk.
        assert_eq!(cones, trunks + 3);
        assert!(trunks > 0);
    }

    #[test]
    fn trees_avoid_river_and_village() {
        for seed in 0..20 {
            let (mut world, config) = built_world(seed);
            let mut q = world.query::<(&Transform, &Shape)>();
            for (t, s) in q.iter(&world) {
                if s.primitive != Primitive::Cylinder {
                    continue;
                }
                let (x, z) = (t.position.x, t.position.z);
                assert!(!config.river_zone.contains(x, z), "trunk in river at {x},{z}");
                assert!(
                    !config.village_zone.contains(x, z),
                    "trunk in village at {x},{z}"
                );
                assert!(x.abs() <= config.half_range());
                assert!(z.abs() <= config.half_range());
            }
        }
    }

    #[test]
    fn house_bodies_sit_on_the_ground() {
        let (mut world, config) = built_world(4);
        let mut q = world.query::<(&Transform, &Shape)>();
        let mut bodies = 0;
        for (t, s) in q.iter(&world) {
            if s.primitive != Primitive::Cube || s.scale.y < 1.0 {
                continue; // river slab
            }
            bodies += 1;
            // Center height is half the body height, so the base is at y=0.
            assert!((t.position.y - s.scale.y / 2.0).abs() < 1e-4);
            assert!(s.scale.y >= 4.0 && s.scale.y < 7.0);
            assert!((t.position.x - config.village_center.x).abs() <= config.village_jitter / 2.0);
            assert!((t.position.z - config.village_center.y).abs() <= config.village_jitter / 2.0);
        }
        assert_eq!(bodies, config.house_count);
    }
}
