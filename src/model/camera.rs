use glam::{Mat4, Vec3};

use crate::config::CameraConfig;

/// Position/orientation triple that can be applied to a camera in one go.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    pub position: Vec3,
    pub front: Vec3,
    pub up: Vec3,
}

impl CameraPose {
    /// Fixed pose the camera snaps to while in orthographic mode.
    pub const ORTHOGRAPHIC: CameraPose = CameraPose {
        position: Vec3::new(0.0, 5.0, 14.0),
        front: Vec3::new(0.0, -0.2, -1.0),
        up: Vec3::Y,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProjectionMode {
    #[default]
    Perspective,
    Orthographic,
}

impl ProjectionMode {
    pub fn label(self) -> &'static str {
        match self {
            ProjectionMode::Perspective => "Perspective",
            ProjectionMode::Orthographic => "Orthographic",
        }
    }
}

/// First-person camera. Angles are stored in degrees.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    /// Unit view direction.
    pub front: Vec3,
    /// Unit up direction.
    pub up: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    /// Vertical field of view in degrees.
    pub zoom: f32,
    pub movement_speed: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self::from_config(&CameraConfig::default())
    }
}

impl Camera {
    pub fn from_config(config: &CameraConfig) -> Self {
        Self {
            position: Vec3::from_array(config.position),
            front: Vec3::from_array(config.front).try_normalize().unwrap_or(Vec3::NEG_Z),
            up: Vec3::from_array(config.up).try_normalize().unwrap_or(Vec3::Y),
            yaw: config.yaw,
            pitch: config.pitch,
            zoom: config.zoom,
            movement_speed: config.movement_speed,
        }
    }

    /// Unit direction for the given yaw/pitch (degrees).
    pub fn direction_from_angles(yaw: f32, pitch: f32) -> Vec3 {
        let (yaw, pitch) = (yaw.to_radians(), pitch.to_radians());
        Vec3::new(yaw.cos() * pitch.cos(), pitch.sin(), yaw.sin() * pitch.cos()).normalize()
    }

    /// Unit vector orthogonal to front and up (strafe direction).
    pub fn right(&self) -> Vec3 {
        self.front.cross(self.up).normalize_or_zero()
    }

    pub fn target(&self) -> Vec3 {
        self.position + self.front
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target(), self.up)
    }

    pub fn pose(&self) -> CameraPose {
        CameraPose {
            position: self.position,
            front: self.front,
            up: self.up,
        }
    }

    pub fn apply_pose(&mut self, pose: &CameraPose) {
        self.position = pose.position;
        self.front = pose.front.try_normalize().unwrap_or(Vec3::NEG_Z);
        self.up = pose.up.try_normalize().unwrap_or(Vec3::Y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_camera_pose() {
        let cam = Camera::default();
        assert_eq!(cam.position, Vec3::new(0.0, 3.3, 12.0));
        assert!((cam.front.length() - 1.0).abs() < 1e-6);
        assert!(cam.front.abs_diff_eq(Vec3::new(0.0, -0.5, -2.0).normalize(), 1e-6));
        assert_eq!(cam.up, Vec3::Y);
        assert_eq!(cam.yaw, -90.0);
        assert_eq!(cam.pitch, 0.0);
        assert_eq!(cam.zoom, 80.0);
    }

    #[test]
    fn test_direction_from_angles() {
        // yaw -90 looks down -Z
        let dir = Camera::direction_from_angles(-90.0, 0.0);
        assert!(dir.abs_diff_eq(Vec3::NEG_Z, 1e-6));

        let up = Camera::direction_from_angles(0.0, 89.0);
        assert!(up.y > 0.99);
        assert!((up.length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_right_is_orthogonal() {
        let cam = Camera::default();
        let right = cam.right();
        assert!((right.length() - 1.0).abs() < 1e-6);
        assert!(right.dot(cam.front).abs() < 1e-6);
        assert!(right.dot(cam.up).abs() < 1e-6);
        assert!(right.abs_diff_eq(Vec3::X, 1e-6));
    }

    #[test]
    fn test_apply_pose_normalizes_directions() {
        let mut cam = Camera::default();
        cam.apply_pose(&CameraPose::ORTHOGRAPHIC);
        assert_eq!(cam.position, Vec3::new(0.0, 5.0, 14.0));
        assert!(cam.front.abs_diff_eq(Vec3::new(0.0, -0.2, -1.0).normalize(), 1e-6));
        assert_eq!(cam.up, Vec3::Y);
    }

    #[test]
    fn test_view_matrix_moves_eye_to_origin() {
        let cam = Camera::default();
        let eye_in_view = cam.view_matrix().transform_point3(cam.position);
        assert!(eye_in_view.abs_diff_eq(Vec3::ZERO, 1e-5));
    }
}
