use egui::Context;

use crate::controller::CameraController;

const CONTROLS: [&str; 7] = [
    "WASD - Move",
    "Q / E - Up / Down",
    "Mouse - Look",
    "Scroll - Movement speed",
    "P - Perspective",
    "O - Orthographic",
    "Esc - Quit",
];

/// Build the overlay for one frame and return the egui output
pub fn build_ui(
    egui_ctx: &Context,
    raw_input: egui::RawInput,
    controller: &CameraController,
    fps: f32,
) -> egui::FullOutput {
    egui_ctx.run(raw_input, |ctx| {
        draw_debug_window(ctx, controller, fps);
    })
}

/// Text shown in the debug window, one entry per line.
pub fn debug_lines(controller: &CameraController, fps: f32) -> Vec<String> {
    let cam = controller.camera();
    vec![
        format!("FPS: {:.0}", fps),
        format!("Pos: {:.1}, {:.1}, {:.1}", cam.position.x, cam.position.y, cam.position.z),
        format!("Yaw: {:.1} Pitch: {:.1}", cam.yaw, cam.pitch),
        format!("Speed: {:.1}", cam.movement_speed),
        format!("Projection: {}", controller.mode().label()),
    ]
}

fn draw_debug_window(ctx: &Context, controller: &CameraController, fps: f32) {
    egui::Window::new("Debug")
        .default_pos([8.0, 8.0])
        .resizable(false)
        .show(ctx, |ui| {
            for line in debug_lines(controller, fps) {
                ui.label(egui::RichText::new(line).small());
            }
            ui.separator();
            ui.label(egui::RichText::new("Controls:").small());
            for line in CONTROLS {
                ui.label(egui::RichText::new(line).small());
            }
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CameraConfig;
    use crate::model::ProjectionMode;

    #[test]
    fn test_debug_lines_follow_camera() {
        let mut controller = CameraController::new(&CameraConfig::default(), 1.25);
        let lines = debug_lines(&controller, 59.6);
        assert_eq!(lines[0], "FPS: 60");
        assert_eq!(lines[4], "Projection: Perspective");

        controller.set_mode(ProjectionMode::Orthographic);
        let lines = debug_lines(&controller, 0.0);
        assert_eq!(lines[1], "Pos: 0.0, 5.0, 14.0");
        assert_eq!(lines[4], "Projection: Orthographic");
    }

    #[test]
    fn test_build_ui_runs_headless() {
        let ctx = Context::default();
        let controller = CameraController::new(&CameraConfig::default(), 1.25);
        let output = build_ui(&ctx, egui::RawInput::default(), &controller, 30.0);
        // font atlas is uploaded on the first frame
        assert!(!output.textures_delta.set.is_empty());
    }
}
