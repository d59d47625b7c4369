use glam::{Mat4, Quat, Vec3};

/// Orientation + position + uniform scale. The matrix is composed on demand,
/// never cached.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub orientation: Quat,
    pub position: Vec3,
    pub scale: f32,
}

impl Transform {
    pub fn new() -> Self {
        Self {
            orientation: Quat::IDENTITY,
            position: Vec3::ZERO,
            scale: 1.0,
        }
    }

    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::new()
        }
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            Vec3::splat(self.scale),
            self.orientation,
            self.position,
        )
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}
