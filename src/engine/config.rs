// Scene and simulation tunables, collected in one place so tests can
// vary them and the spawn/update code stays free of magic numbers.

use glam::{Vec2, Vec3};

/// Axis-aligned rectangle on the XZ plane. Used for placement
/// exclusion zones (river corridor, village footprint).
#[derive(Debug, Clone, Copy)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Exclusive on both edges, matching strict comparisons in the
    /// placement checks.
    pub fn contains(&self, x: f32, z: f32) -> bool {
        x > self.min.x && x < self.max.x && z > self.min.y && z < self.max.y
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Ground plane side length.
    pub map_size: f32,
    /// Full width of the square in which enemies spawn, targets are
    /// drawn, and trees are scattered. Positions land in +/- half.
    pub spawn_range: f32,

    pub enemy_count: usize,
    pub enemy_speed: f32,
    pub player_speed: f32,
    /// An enemy within this distance of its target picks a new one.
    pub retarget_distance: f32,
    /// Half-extent of the square around the origin kept clear of
    /// enemy spawns.
    pub safe_zone_half: f32,
    /// Cap on rejection-sampling retries for one enemy spawn.
    /// `None` retries forever, which is what the current constants
    /// make practically safe; `Some(n)` keeps the last rejected draw
    /// once n tries are spent.
    pub spawn_retry_cap: Option<u32>,

    /// Maximum on-screen stick deflection in pixels.
    pub stick_radius: f32,

    /// Camera eye offset from the player.
    pub camera_offset: Vec3,
    /// Fraction of the remaining distance the eye covers per frame.
    pub camera_lerp: f32,
    /// The camera aims this far above the player's position.
    pub look_at_lift: f32,

    pub house_count: usize,
    pub tree_count: usize,
    /// Center of the village on XZ.
    pub village_center: Vec2,
    /// Full spread of house placement around the village center.
    pub village_jitter: f32,
    /// Trees drawn inside either zone are skipped, not resampled.
    pub river_zone: Rect,
    pub village_zone: Rect,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            map_size: 300.0,
            spawn_range: 250.0,
            enemy_count: 31,
            enemy_speed: 10.0,
            player_speed: 50.0,
            retarget_distance: 5.0,
            safe_zone_half: 50.0,
            spawn_retry_cap: None,
            stick_radius: 40.0,
            camera_offset: Vec3::new(0.0, 15.0, 20.0),
            camera_lerp: 0.1,
            look_at_lift: 5.0,
            house_count: 10,
            tree_count: 50,
            village_center: Vec2::new(-50.0, -50.0),
            village_jitter: 40.0,
            river_zone: Rect::new(Vec2::new(30.0, -120.0), Vec2::new(50.0, 120.0)),
            village_zone: Rect::new(Vec2::new(-70.0, -70.0), Vec2::new(-30.0, -30.0)),
        }
    }
}

impl Config {
    /// Half of `spawn_range`: the bound on each axis for random
    /// placement and wander targets.
    pub fn half_range(&self) -> f32 {
        self.spawn_range / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_scene_constants() {
        let c = Config::default();
        assert_eq!(c.enemy_count, 31);
        assert_eq!(c.player_speed, 50.0);
        assert_eq!(c.enemy_speed, 10.0);
        assert_eq!(c.retarget_distance, 5.0);
        assert_eq!(c.stick_radius, 40.0);
        assert_eq!(c.half_range(), 125.0);
        assert!(c.spawn_retry_cap.is_none());
    }

    #[test]
    fn rect_contains_is_exclusive() {
        let r = Rect::new(Vec2::new(30.0, -120.0), Vec2::new(50.0, 120.0));
        assert!(r.contains(40.0, 0.0));
        assert!(!r.contains(30.0, 0.0));
        assert!(!r.contains(50.0, 0.0));
        assert!(!r.contains(40.0, 120.0));
        assert!(!r.contains(0.0, 0.0));
    }
}
