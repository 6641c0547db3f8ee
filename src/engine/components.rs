// Core ECS components for the valley scene.
// Shared by the scene builder, the spawner, and the per-frame simulation.

use bevy_ecs::prelude::*;
use glam::Vec3;

/// Position and facing of an entity in 3D space.
#[derive(Component, Debug, Clone, Copy)]
pub struct Transform {
    pub position: Vec3,
    /// Rotation around +Y in radians. 0 faces +Z.
    pub yaw: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            yaw: 0.0,
        }
    }
}

impl Transform {
    pub fn from_position(position: Vec3) -> Self {
        Self { position, yaw: 0.0 }
    }
}

/// RGB color for rendering.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    /// Build from a 0xRRGGBB scalar, the form the skin palette uses.
    pub fn from_hex(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xff) as f32 / 255.0,
            g: ((hex >> 8) & 0xff) as f32 / 255.0,
            b: (hex & 0xff) as f32 / 255.0,
        }
    }
}

/// Velocity of an entity in 3D space (units per second).
#[derive(Component, Debug, Clone, Copy)]
pub struct Velocity {
    pub linear: Vec3,
}

/// Which shared primitive mesh an entity is drawn with.
///
/// Every renderable is an instance of one of these unit meshes; the
/// `Shape` scale stretches it to size, so a 40-radius mountain is the
/// unit cone scaled by 80 on X and Z.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    /// Unit cube, half-extent 0.5 on each axis.
    Cube,
    /// 16-segment cone, radius 0.5, height 1, origin at mid-height.
    Cone,
    /// 4-segment cone. House roofs, rotated 45 degrees at spawn.
    Pyramid,
    /// Tapered 8-segment trunk profile, height 1, origin at mid-height.
    Cylinder,
    /// Unit quad on the XZ plane, facing +Y.
    Quad,
}

impl Primitive {
    pub const COUNT: usize = 5;

    /// Stable index into the renderer's per-primitive batch arrays.
    pub fn index(self) -> usize {
        match self {
            Primitive::Cube => 0,
            Primitive::Cone => 1,
            Primitive::Pyramid => 2,
            Primitive::Cylinder => 3,
            Primitive::Quad => 4,
        }
    }
}

/// Visual representation of an entity: a shared primitive plus a scale.
/// Removing this component hides the entity from the instanced batches
/// (the player loses its placeholder cube once its model resolves).
#[derive(Component, Debug, Clone, Copy)]
pub struct Shape {
    pub primitive: Primitive,
    pub scale: Vec3,
}

impl Shape {
    pub fn new(primitive: Primitive, scale: Vec3) -> Self {
        Self { primitive, scale }
    }
}

/// Wandering state for an enemy: walk toward `target`, pick a new one
/// when close. `None` until the first simulation step.
#[derive(Component, Debug, Clone, Copy)]
pub struct Wander {
    pub target: Option<Vec3>,
    /// Walk speed in world units per second.
    pub speed: f32,
}

/// Marker for the single player entity.
#[derive(Component, Debug, Clone, Copy)]
pub struct Player;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_color_channels() {
        let c = Color::from_hex(0x4682b4);
        assert!((c.r - 0x46 as f32 / 255.0).abs() < 1e-6);
        assert!((c.g - 0x82 as f32 / 255.0).abs() < 1e-6);
        assert!((c.b - 0xb4 as f32 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn hex_color_extremes() {
        assert_eq!(Color::from_hex(0x000000), Color { r: 0.0, g: 0.0, b: 0.0 });
        assert_eq!(Color::from_hex(0xffffff), Color { r: 1.0, g: 1.0, b: 1.0 });
    }

    #[test]
    fn primitive_indices_are_distinct() {
        let all = [
            Primitive::Cube,
            Primitive::Cone,
            Primitive::Pyramid,
            Primitive::Cylinder,
            Primitive::Quad,
        ];
        for (i, a) in all.iter().enumerate() {
            assert!(a.index() < Primitive::COUNT);
            for b in &all[i + 1..] {
                assert_ne!(a.index(), b.index());
            }
        }
    }
}
