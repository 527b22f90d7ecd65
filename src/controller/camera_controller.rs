use glam::{Mat4, Vec3};
use tracing::{debug, info};

use crate::config::CameraConfig;
use crate::controller::input::{InputHandler, KeyActions};
use crate::model::{Camera, CameraPose, ProjectionMode};
use crate::view::uniforms::UniformSink;

pub const MIN_PITCH: f32 = -89.0;
pub const MAX_PITCH: f32 = 89.0;
/// Movement speed change per scroll line.
pub const SCROLL_SPEED_STEP: f32 = 0.1;
pub const MIN_MOVEMENT_SPEED: f32 = 0.1;
/// Speeds above this snap back to [`RESET_MOVEMENT_SPEED`].
pub const MAX_MOVEMENT_SPEED: f32 = 20.0;
pub const RESET_MOVEMENT_SPEED: f32 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameMatrices {
    pub view: Mat4,
    pub projection: Mat4,
}

/// Handles camera movement, orientation and projection
#[derive(Debug, Clone)]
pub struct CameraController {
    camera: Camera,
    mode: ProjectionMode,
    /// Last cursor sample; `None` until the first sample after (re)activation.
    last_cursor: Option<(f64, f64)>,
    mouse_sensitivity: f32,
    aspect: f32,
    z_near: f32,
    z_far: f32,
    orthographic_half_height: f32,
}

impl CameraController {
    pub fn new(config: &CameraConfig, aspect: f32) -> Self {
        Self {
            camera: Camera::from_config(config),
            mode: ProjectionMode::Perspective,
            last_cursor: None,
            mouse_sensitivity: config.mouse_sensitivity,
            aspect,
            z_near: config.z_near,
            z_far: config.z_far,
            orthographic_half_height: config.orthographic_half_height,
        }
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn mode(&self) -> ProjectionMode {
        self.mode
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    /// Seed the next cursor sample instead of turning by it.
    pub fn reset_mouse_seed(&mut self) {
        self.last_cursor = None;
    }

    /// Switch projection mode. Re-entering the current mode does nothing.
    pub fn set_mode(&mut self, mode: ProjectionMode) {
        if mode == self.mode {
            return;
        }
        self.mode = mode;
        match mode {
            ProjectionMode::Orthographic => self.camera.apply_pose(&CameraPose::ORTHOGRAPHIC),
            // avoid a jump from cursor motion made while the mouse was ignored
            ProjectionMode::Perspective => self.reset_mouse_seed(),
        }
        info!(mode = mode.label(), "projection mode changed");
    }

    pub fn projection_matrix(&self) -> Mat4 {
        match self.mode {
            ProjectionMode::Perspective => Mat4::perspective_rh(
                self.camera.zoom.to_radians(),
                self.aspect,
                self.z_near,
                self.z_far,
            ),
            ProjectionMode::Orthographic => {
                let half_h = self.orthographic_half_height;
                let half_w = half_h * self.aspect;
                Mat4::orthographic_rh(-half_w, half_w, -half_h, half_h, self.z_near, self.z_far)
            }
        }
    }

    pub fn compute_frame_matrices(&self) -> FrameMatrices {
        FrameMatrices {
            view: self.camera.view_matrix(),
            projection: self.projection_matrix(),
        }
    }

    /// Compute this frame's matrices and push them with the eye position.
    pub fn upload<S: UniformSink + ?Sized>(&self, sink: &mut S) -> FrameMatrices {
        let matrices = self.compute_frame_matrices();
        sink.set_mat4("view", matrices.view);
        sink.set_mat4("projection", matrices.projection);
        sink.set_vec3("view_position", self.camera.position);
        matrices
    }

    fn translate(&mut self, actions: &KeyActions, dt: f32) {
        let speed = self.camera.movement_speed * dt;
        let front = self.camera.front;
        let up = self.camera.up;
        let right = self.camera.right();

        let mut offset = Vec3::ZERO;
        if actions.forward {
            offset += front * speed;
        }
        if actions.backward {
            offset -= front * speed;
        }
        if actions.left {
            offset -= right * speed;
        }
        if actions.right {
            offset += right * speed;
        }
        if actions.up {
            offset += up * speed;
        }
        if actions.down {
            offset -= up * speed;
        }
        self.camera.position += offset;
    }
}

impl InputHandler for CameraController {
    fn on_cursor_move(&mut self, x: f64, y: f64) {
        if self.mode != ProjectionMode::Perspective {
            return;
        }

        let (last_x, last_y) = self.last_cursor.unwrap_or((x, y));
        self.last_cursor = Some((x, y));

        // screen y grows downwards
        let x_offset = (x - last_x) as f32 * self.mouse_sensitivity;
        let y_offset = (last_y - y) as f32 * self.mouse_sensitivity;

        self.camera.yaw += x_offset;
        self.camera.pitch = (self.camera.pitch + y_offset).clamp(MIN_PITCH, MAX_PITCH);
        self.camera.front = Camera::direction_from_angles(self.camera.yaw, self.camera.pitch);
    }

    fn on_scroll(&mut self, dy: f64) {
        let mut speed = self.camera.movement_speed + dy as f32 * SCROLL_SPEED_STEP;
        if speed < MIN_MOVEMENT_SPEED {
            speed = MIN_MOVEMENT_SPEED;
        }
        if speed > MAX_MOVEMENT_SPEED {
            speed = RESET_MOVEMENT_SPEED;
        }
        self.camera.movement_speed = speed;
        debug!(speed, "movement speed");
    }

    fn on_key_state(&mut self, actions: &KeyActions, dt: f32) {
        // O wins when both are held
        if actions.perspective {
            self.set_mode(ProjectionMode::Perspective);
        }
        if actions.orthographic {
            self.set_mode(ProjectionMode::Orthographic);
        }

        if self.mode == ProjectionMode::Perspective {
            self.translate(actions, dt);
        }
    }
}
