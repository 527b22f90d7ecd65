/// Input state shared between the winit event handlers and the frame loop
use std::collections::HashSet;

use winit::event::MouseScrollDelta;
use winit::keyboard::KeyCode;

/// Pixels per scroll "line" when the platform reports pixel deltas.
pub const PIXELS_PER_LINE: f64 = 40.0;

/// Callbacks the windowing layer delivers to a camera.
pub trait InputHandler {
    /// Absolute cursor position in window pixels.
    fn on_cursor_move(&mut self, x: f64, y: f64);
    /// Vertical scroll in lines, positive away from the user.
    fn on_scroll(&mut self, dy: f64);
    /// Held-key state for this frame.
    fn on_key_state(&mut self, actions: &KeyActions, dt: f32);
}

/// Keys currently held down
#[derive(Debug, Default, Clone)]
pub struct InputState {
    pub pressed_keys: HashSet<KeyCode>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key_down(&mut self, key: KeyCode) {
        self.pressed_keys.insert(key);
    }

    pub fn key_up(&mut self, key: KeyCode) {
        self.pressed_keys.remove(&key);
    }

    pub fn is_key_pressed(&self, key: KeyCode) -> bool {
        self.pressed_keys.contains(&key)
    }

    /// Drop all held keys, e.g. when the window loses focus.
    pub fn clear_keys(&mut self) {
        self.pressed_keys.clear();
    }
}

/// Key mapping configuration
#[derive(Debug, Clone)]
pub struct KeyBindings {
    pub forward: KeyCode,
    pub backward: KeyCode,
    pub left: KeyCode,
    pub right: KeyCode,
    pub up: KeyCode,
    pub down: KeyCode,
    pub perspective: KeyCode,
    pub orthographic: KeyCode,
    pub exit: KeyCode,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            forward: KeyCode::KeyW,
            backward: KeyCode::KeyS,
            left: KeyCode::KeyA,
            right: KeyCode::KeyD,
            up: KeyCode::KeyQ,
            down: KeyCode::KeyE,
            perspective: KeyCode::KeyP,
            orthographic: KeyCode::KeyO,
            exit: KeyCode::Escape,
        }
    }
}

/// What the held keys ask for in one frame.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct KeyActions {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
    pub perspective: bool,
    pub orthographic: bool,
    pub exit: bool,
}

/// High-level input processor
#[derive(Debug, Clone, Default)]
pub struct InputProcessor {
    bindings: KeyBindings,
}

impl InputProcessor {
    pub fn new(bindings: KeyBindings) -> Self {
        Self { bindings }
    }

    pub fn is_moving_forward(&self, input: &InputState) -> bool {
        input.is_key_pressed(self.bindings.forward)
    }

    pub fn is_moving_backward(&self, input: &InputState) -> bool {
        input.is_key_pressed(self.bindings.backward)
    }

    pub fn is_moving_left(&self, input: &InputState) -> bool {
        input.is_key_pressed(self.bindings.left)
    }

    pub fn is_moving_right(&self, input: &InputState) -> bool {
        input.is_key_pressed(self.bindings.right)
    }

    pub fn wants_perspective(&self, input: &InputState) -> bool {
        input.is_key_pressed(self.bindings.perspective)
    }

    pub fn wants_orthographic(&self, input: &InputState) -> bool {
        input.is_key_pressed(self.bindings.orthographic)
    }

    pub fn is_escape(&self, input: &InputState) -> bool {
        input.is_key_pressed(self.bindings.exit)
    }

    pub fn actions(&self, input: &InputState) -> KeyActions {
        KeyActions {
            forward: self.is_moving_forward(input),
            backward: self.is_moving_backward(input),
            left: self.is_moving_left(input),
            right: self.is_moving_right(input),
            up: input.is_key_pressed(self.bindings.up),
            down: input.is_key_pressed(self.bindings.down),
            perspective: self.wants_perspective(input),
            orthographic: self.wants_orthographic(input),
            exit: self.is_escape(input),
        }
    }
}

/// Absolute cursor position rebuilt from raw mouse motion.
///
/// With the cursor locked the OS stops reporting positions, so deltas are
/// summed onto a starting point instead.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VirtualCursor {
    x: f64,
    y: f64,
}

impl VirtualCursor {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Centre of a window of the given size.
    pub fn centered(width: u32, height: u32) -> Self {
        Self::new(width as f64 / 2.0, height as f64 / 2.0)
    }

    pub fn apply_delta(&mut self, dx: f64, dy: f64) -> (f64, f64) {
        self.x += dx;
        self.y += dy;
        self.position()
    }

    pub fn position(&self) -> (f64, f64) {
        (self.x, self.y)
    }
}

/// Vertical scroll amount in lines.
pub fn scroll_lines(delta: &MouseScrollDelta) -> f64 {
    match delta {
        MouseScrollDelta::LineDelta(_, y) => *y as f64,
        MouseScrollDelta::PixelDelta(pos) => pos.y / PIXELS_PER_LINE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::dpi::PhysicalPosition;

    #[test]
    fn test_key_down_up() {
        let mut input = InputState::new();
        input.key_down(KeyCode::KeyW);
        input.key_down(KeyCode::KeyW);
        assert!(input.is_key_pressed(KeyCode::KeyW));
        input.key_up(KeyCode::KeyW);
        assert!(!input.is_key_pressed(KeyCode::KeyW));
    }

    #[test]
    fn test_actions_follow_bindings() {
        let processor = InputProcessor::default();
        let mut input = InputState::new();
        input.key_down(KeyCode::KeyW);
        input.key_down(KeyCode::KeyD);
        input.key_down(KeyCode::KeyQ);
        input.key_down(KeyCode::KeyO);

        let actions = processor.actions(&input);
        assert!(actions.forward && actions.right && actions.up && actions.orthographic);
        assert!(!actions.backward && !actions.left && !actions.down);
        assert!(!actions.perspective && !actions.exit);

        input.clear_keys();
        assert_eq!(processor.actions(&input), KeyActions::default());
    }

    #[test]
    fn test_custom_bindings() {
        let bindings = KeyBindings {
            forward: KeyCode::ArrowUp,
            ..KeyBindings::default()
        };
        let processor = InputProcessor::new(bindings);
        let mut input = InputState::new();
        input.key_down(KeyCode::KeyW);
        assert!(!processor.is_moving_forward(&input));
        input.key_down(KeyCode::ArrowUp);
        assert!(processor.is_moving_forward(&input));
    }

    #[test]
    fn test_virtual_cursor_accumulates() {
        let mut cursor = VirtualCursor::centered(1000, 800);
        assert_eq!(cursor.position(), (500.0, 400.0));
        cursor.apply_delta(10.0, -5.0);
        assert_eq!(cursor.apply_delta(2.5, 1.0), (512.5, 396.0));
    }

    #[test]
    fn test_scroll_lines() {
        assert_eq!(scroll_lines(&MouseScrollDelta::LineDelta(0.0, 2.0)), 2.0);
        let pixels = MouseScrollDelta::PixelDelta(PhysicalPosition::new(0.0, -80.0));
        assert_eq!(scroll_lines(&pixels), -2.0);
    }
}
