use glam::{Mat4, Vec3};
use winit::keyboard::KeyCode;

/// Fly camera: yaw/pitch plus WASD movement flags. Produces only the view
/// matrix; the projection belongs to the graphics root.
pub struct Camera {
    pub position: Vec3,
    pub yaw: f32,   // degrees, rotation around Y
    pub pitch: f32, // degrees, rotation around X
    pub moving_forward: bool,
    pub moving_backward: bool,
    pub moving_left: bool,
    pub moving_right: bool,
    pub moving_up: bool,
    pub moving_down: bool,
}

impl Camera {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            yaw: -90.0,
            pitch: 0.0,
            moving_forward: false,
            moving_backward: false,
            moving_left: false,
            moving_right: false,
            moving_up: false,
            moving_down: false,
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        let target = self.position + self.view_direction();
        Mat4::look_at_rh(self.position, target, Vec3::Y)
    }

    pub fn forward(&self) -> Vec3 {
        let (yaw_sin, yaw_cos) = self.yaw.to_radians().sin_cos();
        Vec3::new(yaw_cos, 0.0, yaw_sin).normalize()
    }

    pub fn right(&self) -> Vec3 {
        self.forward().cross(Vec3::Y).normalize()
    }

    fn view_direction(&self) -> Vec3 {
        let (yaw_sin, yaw_cos) = self.yaw.to_radians().sin_cos();
        let (pitch_sin, pitch_cos) = self.pitch.to_radians().sin_cos();
        Vec3::new(yaw_cos * pitch_cos, pitch_sin, yaw_sin * pitch_cos).normalize()
    }

    pub fn process_mouse(&mut self, dx: f32, dy: f32) {
        const MOUSE_SENSITIVITY: f32 = 0.25;

        self.yaw += dx * MOUSE_SENSITIVITY;
        self.pitch = (self.pitch - dy * MOUSE_SENSITIVITY).clamp(-89.0, 89.0);
    }

    pub fn process_keyboard(&mut self, key: KeyCode, pressed: bool) {
        match key {
            KeyCode::KeyW => self.moving_forward = pressed,
            KeyCode::KeyS => self.moving_backward = pressed,
            KeyCode::KeyA => self.moving_left = pressed,
            KeyCode::KeyD => self.moving_right = pressed,
            KeyCode::Space => self.moving_up = pressed,
            KeyCode::ShiftLeft => self.moving_down = pressed,
            _ => (),
        }
    }

    pub fn update(&mut self, dt: f32) {
        const SPEED: f32 = 5.0;
        let velocity = SPEED * dt;

        let forward = self.forward();
        let right = self.right();

        if self.moving_forward {
            self.position += forward * velocity;
        }
        if self.moving_backward {
            self.position -= forward * velocity;
        }
        if self.moving_right {
            self.position += right * velocity;
        }
        if self.moving_left {
            self.position -= right * velocity;
        }
        if self.moving_up {
            self.position.y += velocity;
        }
        if self.moving_down {
            self.position.y -= velocity;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn initial_state() {
        let camera = Camera::new(Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(camera.position, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(camera.yaw, -90.0);
        assert_eq!(camera.pitch, 0.0);
        assert!(!camera.moving_forward);
    }

    #[test]
    fn view_direction_follows_yaw_and_pitch() {
        let mut camera = Camera::new(Vec3::ZERO);

        // Default: looking along -Z.
        let dir = camera.view_direction();
        assert_relative_eq!(dir.x, 0.0, epsilon = 0.001);
        assert_relative_eq!(dir.z, -1.0, epsilon = 0.001);

        camera.yaw = 0.0;
        let dir = camera.view_direction();
        assert_relative_eq!(dir.x, 1.0, epsilon = 0.001);
        assert_relative_eq!(dir.z, 0.0, epsilon = 0.001);

        camera.pitch = 90.0;
        let dir = camera.view_direction();
        assert_relative_eq!(dir.y, 1.0, epsilon = 0.001);
    }

    #[test]
    fn pitch_clamps() {
        let mut camera = Camera::new(Vec3::ZERO);
        camera.process_mouse(0.0, -1000.0);
        assert_relative_eq!(camera.pitch, 89.0, epsilon = 0.001);
        camera.process_mouse(0.0, 1000.0);
        assert_relative_eq!(camera.pitch, -89.0, epsilon = 0.001);
    }

    #[test]
    fn movement_updates_position() {
        let mut camera = Camera::new(Vec3::ZERO);
        camera.moving_forward = true;
        camera.update(1.0);
        assert_relative_eq!(camera.position.z, -5.0, epsilon = 0.001);

        let mut camera = Camera::new(Vec3::ZERO);
        camera.moving_up = true;
        camera.update(1.0);
        assert_relative_eq!(camera.position.y, 5.0, epsilon = 0.001);
    }

    #[test]
    fn keyboard_sets_and_clears_flags() {
        let mut camera = Camera::new(Vec3::ZERO);
        camera.process_keyboard(KeyCode::KeyW, true);
        assert!(camera.moving_forward);
        camera.process_keyboard(KeyCode::KeyW, false);
        assert!(!camera.moving_forward);
    }

    #[test]
    fn view_matrix_changes_with_position() {
        let mut camera = Camera::new(Vec3::new(0.0, 0.0, 5.0));
        let initial = camera.view_matrix();
        camera.position = Vec3::new(1.0, 1.0, 5.0);
        assert_ne!(initial, camera.view_matrix());
    }
}
