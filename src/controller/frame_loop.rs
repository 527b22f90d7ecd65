use std::time::Instant;

use tracing::info;
use winit::event::MouseScrollDelta;

use crate::config::AppConfig;
use crate::controller::camera_controller::CameraController;
use crate::controller::input::{scroll_lines, InputHandler, InputProcessor, InputState, VirtualCursor};
use crate::view::uniforms::UniformSink;

/// Upper bound for a single frame step, so a stall doesn't teleport the camera.
pub const MAX_FRAME_DT: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    Continue,
    Exit,
}

/// Wall-clock time step between frames
#[derive(Debug, Default, Clone)]
pub struct FrameClock {
    last: Option<Instant>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tick(&mut self) -> f32 {
        self.tick_at(Instant::now())
    }

    /// Seconds since the previous tick; the first tick returns 0.
    pub fn tick_at(&mut self, now: Instant) -> f32 {
        let dt = match self.last {
            Some(last) => now.saturating_duration_since(last).as_secs_f32(),
            None => 0.0,
        };
        self.last = Some(now);
        dt.clamp(0.0, MAX_FRAME_DT)
    }
}

/// Frames per second averaged over roughly half a second
#[derive(Debug, Default, Clone)]
pub struct FpsCounter {
    frames: u32,
    elapsed: f32,
    fps: f32,
}

impl FpsCounter {
    const WINDOW: f32 = 0.5;

    pub fn record(&mut self, dt: f32) {
        self.frames += 1;
        self.elapsed += dt;
        if self.elapsed >= Self::WINDOW {
            self.fps = self.frames as f32 / self.elapsed;
            self.frames = 0;
            self.elapsed = 0.0;
        }
    }

    pub fn fps(&self) -> f32 {
        self.fps
    }
}

/// Per-frame camera and input state driven by the window event loop
pub struct FrameLoopContext {
    pub controller: CameraController,
    pub input: InputState,
    pub processor: InputProcessor,
    pub cursor: VirtualCursor,
    pub clock: FrameClock,
    pub fps: FpsCounter,
    cursor_captured: bool,
}

impl FrameLoopContext {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            controller: CameraController::new(&config.camera, config.window.aspect()),
            input: InputState::new(),
            processor: InputProcessor::default(),
            cursor: VirtualCursor::centered(config.window.width, config.window.height),
            clock: FrameClock::new(),
            fps: FpsCounter::default(),
            cursor_captured: false,
        }
    }

    /// Track whether the window holds the cursor. Regaining it re-seeds the
    /// mouse so motion made elsewhere does not turn the camera.
    pub fn set_cursor_captured(&mut self, captured: bool) {
        if captured && !self.cursor_captured {
            self.controller.reset_mouse_seed();
        }
        self.cursor_captured = captured;
    }

    /// Raw mouse motion; ignored unless the cursor is captured.
    pub fn on_mouse_motion(&mut self, dx: f64, dy: f64) {
        if !self.cursor_captured {
            return;
        }
        let (x, y) = self.cursor.apply_delta(dx, dy);
        self.controller.on_cursor_move(x, y);
    }

    pub fn on_scroll(&mut self, delta: &MouseScrollDelta) {
        self.controller.on_scroll(scroll_lines(delta));
    }

    /// Advance the clock and prepare this frame's view.
    pub fn update<S: UniformSink + ?Sized>(&mut self, sink: &mut S) -> FrameStatus {
        let dt = self.clock.tick();
        self.fps.record(dt);
        self.prepare_scene_view(sink, dt)
    }

    /// Apply held keys for a step of `dt` seconds, then upload view,
    /// projection and eye position.
    pub fn prepare_scene_view<S: UniformSink + ?Sized>(&mut self, sink: &mut S, dt: f32) -> FrameStatus {
        let actions = self.processor.actions(&self.input);
        if actions.exit {
            info!("escape pressed, closing");
            return FrameStatus::Exit;
        }

        self.controller.on_key_state(&actions, dt);
        self.controller.upload(sink);
        FrameStatus::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use glam::Vec3;
    use winit::keyboard::KeyCode;

    use crate::model::ProjectionMode;
    use crate::view::uniforms::{FrameUniform, ShaderState};

    #[test]
    fn test_clock_first_tick_is_zero_and_clamped() {
        let mut clock = FrameClock::new();
        let start = Instant::now();
        assert_eq!(clock.tick_at(start), 0.0);
        let dt = clock.tick_at(start + Duration::from_millis(20));
        assert!((dt - 0.02).abs() < 1e-6);
        assert_eq!(clock.tick_at(start + Duration::from_secs(5)), MAX_FRAME_DT);
    }

    #[test]
    fn test_fps_counter() {
        let mut fps = FpsCounter::default();
        for _ in 0..40 {
            fps.record(1.0 / 60.0);
        }
        assert!((fps.fps() - 60.0).abs() < 0.5);
    }

    #[test]
    fn test_escape_exits_without_upload() {
        let mut ctx = FrameLoopContext::new(&AppConfig::default());
        let mut shader = ShaderState::new();
        ctx.input.key_down(KeyCode::Escape);
        assert_eq!(ctx.prepare_scene_view(&mut shader, 0.016), FrameStatus::Exit);
        assert_eq!(*shader.frame(), FrameUniform::default());
    }

    #[test]
    fn test_orthographic_pose_is_uploaded_same_frame() {
        let mut ctx = FrameLoopContext::new(&AppConfig::default());
        let mut shader = ShaderState::new();
        ctx.input.key_down(KeyCode::KeyO);
        assert_eq!(ctx.prepare_scene_view(&mut shader, 0.016), FrameStatus::Continue);
        assert_eq!(ctx.controller.mode(), ProjectionMode::Orthographic);
        assert_eq!(shader.frame().view_position, [0.0, 5.0, 14.0]);
    }

    #[test]
    fn test_held_key_moves_camera() {
        let mut ctx = FrameLoopContext::new(&AppConfig::default());
        let mut shader = ShaderState::new();
        let start = ctx.controller.camera().position;
        ctx.input.key_down(KeyCode::KeyQ);
        ctx.prepare_scene_view(&mut shader, 0.4);
        // 2.5 units/s for 0.4 s straight up
        assert!(ctx.controller.camera().position.abs_diff_eq(start + Vec3::Y, 1e-5));
    }

    #[test]
    fn test_mouse_motion_goes_through_virtual_cursor() {
        let mut ctx = FrameLoopContext::new(&AppConfig::default());
        ctx.set_cursor_captured(true);
        ctx.on_mouse_motion(0.0, 0.0);
        ctx.on_mouse_motion(100.0, 0.0);
        assert!((ctx.controller.camera().yaw - -80.0).abs() < 1e-4);
        assert_eq!(ctx.cursor.position(), (600.0, 400.0));
    }

    #[test]
    fn test_motion_ignored_without_focus() {
        let mut ctx = FrameLoopContext::new(&AppConfig::default());
        ctx.set_cursor_captured(true);
        ctx.on_mouse_motion(0.0, 0.0);

        ctx.set_cursor_captured(false);
        ctx.on_mouse_motion(250.0, -120.0);
        assert_eq!(ctx.controller.camera().yaw, -90.0);
        assert_eq!(ctx.controller.camera().pitch, 0.0);
        assert_eq!(ctx.cursor.position(), (500.0, 400.0));
    }

    #[test]
    fn test_regaining_focus_does_not_jump() {
        let mut ctx = FrameLoopContext::new(&AppConfig::default());
        ctx.set_cursor_captured(true);
        ctx.on_mouse_motion(0.0, 0.0);
        ctx.on_mouse_motion(50.0, 0.0);
        let yaw = ctx.controller.camera().yaw;

        ctx.set_cursor_captured(false);
        ctx.set_cursor_captured(true);
        // first sample after focus returns only seeds
        ctx.on_mouse_motion(300.0, 0.0);
        assert_eq!(ctx.controller.camera().yaw, yaw);
        ctx.on_mouse_motion(10.0, 0.0);
        assert!((ctx.controller.camera().yaw - (yaw + 1.0)).abs() < 1e-4);
    }
}
