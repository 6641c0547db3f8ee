// Third-person follow camera.
//
// Camera model:
//   - The eye chases a point offset from the player (up and behind)
//   - Each frame it covers a fixed fraction of the remaining distance,
//     so the chase eases out. The per-frame fraction makes the easing
//     frame-rate dependent; a known imprecision, not worth a dt term
//     at this camera speed
//   - The camera aims slightly above the player's position

use glam::{Mat4, Vec3};

use super::config::Config;

pub struct FollowCamera {
    /// World-space eye position. Smoothed; never snaps to the target.
    eye: Vec3,
    look_at: Vec3,

    /// Eye offset from the player (up, behind).
    pub offset: Vec3,
    /// Fraction of the remaining distance covered per frame.
    pub lerp_factor: f32,
    /// Aim point height above the player.
    pub look_lift: f32,

    /// Vertical field of view in radians.
    pub fov: f32,
    pub near: f32,
    pub far: f32,
}

impl FollowCamera {
    pub fn new(config: &Config) -> Self {
        Self {
            // Start at the player-origin offset so the first frames
            // ease in from a sensible pose.
            eye: config.camera_offset + Vec3::Y,
            look_at: Vec3::ZERO,
            offset: config.camera_offset,
            lerp_factor: config.camera_lerp,
            look_lift: config.look_at_lift,
            fov: 75.0_f32.to_radians(),
            near: 0.1,
            far: 1000.0,
        }
    }

    /// Chase the player. Call once per frame after the simulation step.
    pub fn follow(&mut self, player: Vec3) {
        let desired = player + self.offset;
        self.eye = self.eye.lerp(desired, self.lerp_factor);
        self.look_at = player + Vec3::new(0.0, self.look_lift, 0.0);
    }

    pub fn eye(&self) -> Vec3 {
        self.eye
    }

    /// View matrix: looks from the eye toward the aim point.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.look_at, Vec3::Y)
    }

    /// Perspective projection matrix.
    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov, aspect, self.near, self.far)
    }

    /// Combined view-projection matrix ready to upload to the GPU.
    pub fn view_projection(&self, aspect: f32) -> Mat4 {
        self.projection_matrix(aspect) * self.view_matrix()
    }
}
