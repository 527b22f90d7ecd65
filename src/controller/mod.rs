// CONTROLLER: input, camera control and the per-frame update
pub mod camera_controller;
pub mod frame_loop;
pub mod input;

pub use camera_controller::{CameraController, FrameMatrices};
pub use frame_loop::{FpsCounter, FrameClock, FrameLoopContext, FrameStatus};
pub use input::{InputHandler, InputProcessor, InputState, KeyActions, KeyBindings, VirtualCursor};
