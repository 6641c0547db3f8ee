// The simulation context: owns the ECS world, the RNG, and the config,
// and advances everything that moves. One instance per session,
// stepped once per rendered frame with the frame's elapsed seconds.

use bevy_ecs::prelude::*;
use glam::Vec3;
use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::FRAC_PI_2;

use super::components::{Color, Player, Primitive, Shape, Transform, Velocity, Wander};
use super::config::Config;
use super::joystick::Drive;
use super::scene;

/// Body colors drawn per enemy at spawn, one uniform pick each.
pub const ENEMY_PALETTE: [u32; 4] = [
    0x333333, // Dark Ops
    0x4682b4, // Camo Blue
    0x8b0000, // Red Squad
    0x006400, // Forest Green
];

/// Placeholder body color until (and unless) the player model loads.
pub const PLACEHOLDER_COLOR: u32 = 0xffcc00;

pub struct Simulation {
    pub world: World,
    pub player: Entity,
    pub config: Config,
    rng: StdRng,
}

impl Simulation {
    pub fn new(config: Config) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Deterministic construction for tests: same seed, same map, same
    /// spawns, same wander targets.
    pub fn with_seed(config: Config, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: Config, mut rng: StdRng) -> Self {
        let mut world = World::new();

        scene::build_scene(&mut world, &mut rng, &config);
        let player = spawn_player(&mut world);
        spawn_enemies(&mut world, &mut rng, &config);

        info!(
            "world ready: {} enemies, {} entities total",
            config.enemy_count,
            world.entities().len()
        );

        Self {
            world,
            player,
            config,
            rng,
        }
    }

    /// Enemies plus the player. Shown once on the HUD.
    pub fn alive_count(&self) -> usize {
        self.config.enemy_count + 1
    }

    pub fn player_position(&self) -> Vec3 {
        self.world
            .get::<Transform>(self.player)
            .map(|t| t.position)
            .unwrap_or(Vec3::ZERO)
    }

    /// One frame of simulation. `drive` is the joystick command (None
    /// while no pointer is captured), `dt` the elapsed seconds since
    /// the previous frame.
    pub fn advance(&mut self, drive: Option<Drive>, dt: f32) {
        self.step_player(drive, dt);
        self.step_enemies(dt);
    }

    fn step_player(&mut self, drive: Option<Drive>, dt: f32) {
        let mut query = self
            .world
            .query_filtered::<(&mut Transform, &mut Velocity), With<Player>>();
        let Some((mut transform, mut velocity)) = query.iter_mut(&mut self.world).next() else {
            return;
        };

        match drive {
            Some(d) => {
                velocity.linear = Vec3::new(d.velocity.x, 0.0, d.velocity.y);
                transform.position.x += velocity.linear.x * dt;
                transform.position.z += velocity.linear.z * dt;
                // Face the travel direction; screen angle is mirrored
                // onto the ground plane.
                transform.yaw = -d.angle - FRAC_PI_2;
            }
            None => velocity.linear = Vec3::ZERO,
        }
    }

    fn step_enemies(&mut self, dt: f32) {
        let half = self.config.half_range();
        let threshold = self.config.retarget_distance;
        let rng = &mut self.rng;

        let mut query = self.world.query::<(&mut Transform, &mut Wander)>();
        for (mut transform, mut wander) in query.iter_mut(&mut self.world) {
            let arrived = wander
                .target
                .map_or(true, |t| transform.position.distance(t) < threshold);
            if arrived {
                wander.target = Some(random_target(rng, half));
            }

            if let Some(target) = wander.target {
                let direction = (target - transform.position).normalize_or_zero();
                transform.position.x += direction.x * wander.speed * dt;
                transform.position.z += direction.z * wander.speed * dt;
                if direction != Vec3::ZERO {
                    transform.yaw = direction.x.atan2(direction.z);
                }
            }
        }
    }

    /// Recolor the player's placeholder body. A loaded model has no
    /// single recolorable surface, so this is a no-op once the
    /// placeholder shape is gone; returns whether a recolor happened.
    pub fn apply_skin(&mut self, color: u32) -> bool {
        if self.world.get::<Shape>(self.player).is_none() {
            return false;
        }
        if let Some(mut c) = self.world.get_mut::<Color>(self.player) {
            *c = Color::from_hex(color);
            return true;
        }
        false
    }

    /// The loaded model replaces the placeholder: drop the cube shape
    /// so the instanced batches skip the player from here on.
    pub fn replace_placeholder_with_model(&mut self) {
        self.world.entity_mut(self.player).remove::<Shape>();
    }
}

fn spawn_player(world: &mut World) -> Entity {
    world
        .spawn((
            Transform::from_position(Vec3::new(0.0, 1.0, 0.0)),
            Velocity { linear: Vec3::ZERO },
            Shape::new(Primitive::Cube, Vec3::new(1.0, 2.0, 1.0)),
            Color::from_hex(PLACEHOLDER_COLOR),
            Player,
        ))
        .id()
}

fn spawn_enemies(world: &mut World, rng: &mut impl Rng, config: &Config) {
    for _ in 0..config.enemy_count {
        let (x, z) = spawn_point(rng, config);
        let skin = ENEMY_PALETTE[rng.gen_range(0..ENEMY_PALETTE.len())];
        world.spawn((
            Transform::from_position(Vec3::new(x, 1.0, z)),
            Shape::new(Primitive::Cube, Vec3::new(1.0, 2.0, 1.0)),
            Color::from_hex(skin),
            Wander {
                target: None,
                speed: config.enemy_speed,
            },
        ));
    }
}

/// Rejection-sample a spawn point outside the safe zone around the
/// player's origin. Uncapped by default, matching the always-held
/// assumption that the safe zone is much smaller than the map; with a
/// cap configured, the last draw is kept once it runs out.
fn spawn_point(rng: &mut impl Rng, config: &Config) -> (f32, f32) {
    let half = config.half_range();
    let mut tries = 0u32;
    loop {
        let x = rng.gen_range(-half..half);
        let z = rng.gen_range(-half..half);
        let in_safe_zone = x.abs() < config.safe_zone_half && z.abs() < config.safe_zone_half;
        if !in_safe_zone {
            return (x, z);
        }
        tries += 1;
        if config.spawn_retry_cap.is_some_and(|cap| tries >= cap) {
            return (x, z);
        }
    }
}

/// Uniform wander destination inside the map bounds, at walking height.
fn random_target(rng: &mut impl Rng, half_range: f32) -> Vec3 {
    Vec3::new(
        rng.gen_range(-half_range..half_range),
        1.0,
        rng.gen_range(-half_range..half_range),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::joystick::Drive;
    use glam::Vec2;

    fn sim(seed: u64) -> Simulation {
        Simulation::with_seed(Config::default(), seed)
    }

    fn enemy_states(sim: &mut Simulation) -> Vec<(Vec3, Option<Vec3>)> {
        sim.world
            .query::<(&Transform, &Wander)>()
            .iter(&sim.world)
            .map(|(t, w)| (t.position, w.target))
            .collect()
    }

    #[test]
    fn spawns_expected_population() {
        let mut s = sim(11);
        assert_eq!(enemy_states(&mut s).len(), 31);
        assert_eq!(s.alive_count(), 32);
        assert_eq!(s.player_position(), Vec3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn enemies_spawn_outside_the_safe_zone() {
        for seed in 0..10 {
            let mut s = sim(seed);
            for (pos, _) in enemy_states(&mut s) {
                assert!(
                    pos.x.abs() >= 50.0 || pos.z.abs() >= 50.0,
                    "seed {seed}: enemy inside safe zone at {pos:?}"
                );
                assert!(pos.x.abs() <= 125.0 && pos.z.abs() <= 125.0);
            }
        }
    }

    #[test]
    fn idle_frame_moves_enemies_but_not_the_player() {
        let mut s = sim(42);
        let before = enemy_states(&mut s);

        s.advance(None, 0.5);

        assert_eq!(s.player_position(), Vec3::new(0.0, 1.0, 0.0));
        let velocity = s.world.get::<Velocity>(s.player).unwrap().linear;
        assert_eq!(velocity, Vec3::ZERO);

        let after = enemy_states(&mut s);
        for ((old_pos, _), (new_pos, target)) in before.iter().zip(after.iter()) {
            let target = target.expect("every enemy has a target after a step");
            let moved = *new_pos - *old_pos;
            assert!(moved.length() > 0.0, "enemy did not move");
            // Strictly toward the assigned target.
            assert!(moved.dot(target - *old_pos) > 0.0);
            // Frame-rate-independent step: speed 10 for half a second.
            assert!((moved.length() - 5.0).abs() < 1e-3);
        }
    }

    #[test]
    fn drive_advances_and_turns_the_player() {
        let mut s = sim(5);
        let drive = Drive {
            velocity: Vec2::new(0.0, 50.0),
            angle: 0.0,
        };
        s.advance(Some(drive), 0.1);

        let pos = s.player_position();
        assert!((pos.z - 5.0).abs() < 1e-4);
        assert!(pos.x.abs() < 1e-4);

        let yaw = s.world.get::<Transform>(s.player).unwrap().yaw;
        assert!((yaw - (-FRAC_PI_2)).abs() < 1e-6);
    }

    #[test]
    fn release_frame_zeroes_player_velocity() {
        let mut s = sim(5);
        let drive = Drive {
            velocity: Vec2::new(50.0, 0.0),
            angle: -FRAC_PI_2,
        };
        s.advance(Some(drive), 0.1);
        assert!(s.world.get::<Velocity>(s.player).unwrap().linear.length() > 0.0);

        s.advance(None, 0.1);
        assert_eq!(s.world.get::<Velocity>(s.player).unwrap().linear, Vec3::ZERO);
    }

    #[test]
    fn arrival_forces_a_fresh_target() {
        let mut s = sim(9);
        s.advance(None, 0.016);

        // Park the first enemy right next to its target.
        let (enemy, old_target) = {
            let mut q = s.world.query::<(Entity, &Wander)>();
            let (e, w) = q.iter(&s.world).next().unwrap();
            (e, w.target.unwrap())
        };
        s.world.get_mut::<Transform>(enemy).unwrap().position =
            old_target + Vec3::new(1.0, 0.0, 0.0);

        s.advance(None, 0.016);

        let new_target = s.world.get::<Wander>(enemy).unwrap().target.unwrap();
        assert_ne!(new_target, old_target, "target was not re-sampled");
    }

    #[test]
    fn enemies_stay_inside_map_bounds() {
        let mut s = sim(3);
        for _ in 0..600 {
            s.advance(None, 1.0 / 60.0);
        }
        for (pos, target) in enemy_states(&mut s) {
            // One integration step of overshoot past a boundary target
            // is the worst legal excursion.
            assert!(pos.x.abs() <= 125.5, "x drifted to {pos:?}");
            assert!(pos.z.abs() <= 125.5, "z drifted to {pos:?}");
            let t = target.unwrap();
            assert!(t.x.abs() <= 125.0 && t.z.abs() <= 125.0);
            assert_eq!(t.y, 1.0);
        }
    }

    #[test]
    fn skin_applies_to_placeholder_only() {
        let mut s = sim(7);
        assert!(s.apply_skin(0x8b0000));
        assert_eq!(
            *s.world.get::<Color>(s.player).unwrap(),
            Color::from_hex(0x8b0000)
        );

        s.replace_placeholder_with_model();
        assert!(!s.apply_skin(0x006400), "loaded model must not recolor");
        assert_eq!(
            *s.world.get::<Color>(s.player).unwrap(),
            Color::from_hex(0x8b0000)
        );
    }

    #[test]
    fn capped_rejection_keeps_the_last_draw() {
        let config = Config {
            // A safe zone covering the whole map makes every draw a
            // rejection, so only the cap ends the loop.
            safe_zone_half: 200.0,
            spawn_retry_cap: Some(8),
            ..Config::default()
        };
        let mut s = Simulation::with_seed(config, 1);
        assert_eq!(enemy_states(&mut s).len(), 31);
    }
}
