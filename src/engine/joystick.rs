// Virtual joystick: one captured pointer drags a stick inside a fixed
// zone; the clamped offset becomes a planar velocity for the player.
//
// State machine: idle → dragging (pointer-down inside the zone captures
// that pointer's id) → idle (same id released). Moves from any other
// pointer are ignored while dragging. Velocity is a pure function of
// the current sample, not of accumulated motion.

use glam::Vec2;
use std::f32::consts::FRAC_PI_2;

/// Pointer id the mouse uses when it stands in for a touch.
pub const MOUSE_POINTER: u64 = u64::MAX;

/// Planar drive command produced while the stick is held.
#[derive(Debug, Clone, Copy)]
pub struct Drive {
    /// Velocity on the ground plane: x maps to world X, y to world Z.
    pub velocity: Vec2,
    /// Raw screen-space stick angle, used for player facing.
    pub angle: f32,
}

pub struct Joystick {
    /// Screen-space center of the stick zone. Fixed per layout; the
    /// capture point does not move it.
    center: Vec2,
    /// Pointer-downs further than this from the center are not ours.
    zone_radius: f32,
    /// Maximum stick deflection; larger drags clamp to this radius.
    max_radius: f32,
    speed: f32,

    active_id: Option<u64>,
    angle: f32,
    offset: Vec2,
    velocity: Vec2,
}

impl Joystick {
    pub fn new(speed: f32, max_radius: f32) -> Self {
        Self {
            center: Vec2::ZERO,
            zone_radius: max_radius * 2.0,
            max_radius,
            speed,
            active_id: None,
            angle: 0.0,
            offset: Vec2::ZERO,
            velocity: Vec2::ZERO,
        }
    }

    /// Reposition the zone, e.g. after a window resize. An in-flight
    /// drag keeps its captured pointer; offsets are measured from the
    /// new center from here on.
    pub fn set_center(&mut self, center: Vec2) {
        self.center = center;
    }

    pub fn center(&self) -> Vec2 {
        self.center
    }

    pub fn max_radius(&self) -> f32 {
        self.max_radius
    }

    /// Pointer-down. Captures the pointer when idle and inside the
    /// zone; returns whether the event was taken.
    pub fn press(&mut self, id: u64, at: Vec2) -> bool {
        if self.active_id.is_some() {
            return false;
        }
        if at.distance(self.center) > self.zone_radius {
            return false;
        }
        self.active_id = Some(id);
        self.sample(at);
        true
    }

    /// Pointer-move. Only the captured pointer updates the stick.
    pub fn drag(&mut self, id: u64, at: Vec2) {
        if self.active_id == Some(id) {
            self.sample(at);
        }
    }

    /// Pointer-up. Releasing the captured pointer stops all motion and
    /// re-centers the stick indicator.
    pub fn release(&mut self, id: u64) {
        if self.active_id == Some(id) {
            self.active_id = None;
            self.offset = Vec2::ZERO;
            self.velocity = Vec2::ZERO;
        }
    }

    pub fn is_active(&self) -> bool {
        self.active_id.is_some()
    }

    /// Clamped stick offset in screen pixels, for drawing the indicator.
    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    /// The current drive while dragging, `None` when idle.
    pub fn drive(&self) -> Option<Drive> {
        self.active_id.map(|_| Drive {
            velocity: self.velocity,
            angle: self.angle,
        })
    }

    fn sample(&mut self, at: Vec2) {
        let raw = at - self.center;
        self.angle = raw.y.atan2(raw.x);
        self.offset = if raw.length() > self.max_radius {
            Vec2::new(self.angle.cos(), self.angle.sin()) * self.max_radius
        } else {
            raw
        };

        // Screen-space up is ground-plane -Z, so the stick angle turns a
        // quarter turn before it becomes a direction on XZ.
        let ground = self.angle + FRAC_PI_2;
        self.velocity = Vec2::new(ground.cos(), ground.sin()) * self.speed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stick() -> Joystick {
        let mut j = Joystick::new(50.0, 40.0);
        j.set_center(Vec2::new(100.0, 500.0));
        j
    }

    #[test]
    fn press_outside_zone_is_ignored() {
        let mut j = stick();
        assert!(!j.press(1, Vec2::new(400.0, 400.0)));
        assert!(!j.is_active());
        assert_eq!(j.velocity(), Vec2::ZERO);
    }

    #[test]
    fn clamp_preserves_angle_at_max_radius() {
        let mut j = stick();
        assert!(j.press(1, j.center()));
        // Drag 100px toward lower-right: magnitude clamps to exactly 40,
        // angle unchanged.
        j.drag(1, j.center() + Vec2::new(60.0, 80.0));
        let offset = j.offset();
        assert!((offset.length() - 40.0).abs() < 1e-4);
        let expected = 80.0_f32.atan2(60.0);
        assert!((offset.y.atan2(offset.x) - expected).abs() < 1e-5);
    }

    #[test]
    fn short_drag_is_not_clamped() {
        let mut j = stick();
        j.press(1, j.center());
        j.drag(1, j.center() + Vec2::new(10.0, -5.0));
        assert_eq!(j.offset(), Vec2::new(10.0, -5.0));
    }

    #[test]
    fn rightward_drag_drives_forward_on_z() {
        let mut j = stick();
        j.press(1, j.center());
        j.drag(1, j.center() + Vec2::new(40.0, 0.0));
        let v = j.velocity();
        // Screen +X rotates onto the depth axis at full player speed.
        assert!(v.x.abs() < 1e-4, "vx = {}", v.x);
        assert!((v.y - 50.0).abs() < 1e-4, "vz = {}", v.y);
        assert!((v.length() - 50.0).abs() < 1e-4);
    }

    #[test]
    fn release_zeroes_velocity_and_offset() {
        let mut j = stick();
        j.press(7, j.center());
        j.drag(7, j.center() + Vec2::new(40.0, 40.0));
        assert!(j.velocity().length() > 0.0);
        j.release(7);
        assert!(!j.is_active());
        assert_eq!(j.velocity(), Vec2::ZERO);
        assert_eq!(j.offset(), Vec2::ZERO);
        assert!(j.drive().is_none());
    }

    #[test]
    fn only_captured_pointer_updates_state() {
        let mut j = stick();
        j.press(1, j.center());
        j.drag(1, j.center() + Vec2::new(20.0, 0.0));
        let held = j.offset();

        // A second touch neither drags nor releases the stick.
        assert!(!j.press(2, j.center()));
        j.drag(2, j.center() + Vec2::new(-40.0, 0.0));
        assert_eq!(j.offset(), held);
        j.release(2);
        assert!(j.is_active());

        j.release(1);
        assert!(!j.is_active());
    }
}
