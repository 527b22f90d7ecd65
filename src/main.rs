use std::sync::Arc;

use tracing::{error, info, warn};
use winit::{
    application::ApplicationHandler,
    event::{DeviceEvent, DeviceId, ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::PhysicalKey,
    window::{CursorGrabMode, Window, WindowId},
};

// Import from the library crate
use deskscene::{
    config::AppConfig,
    controller::{FrameLoopContext, FrameStatus},
    error::AppError,
    logging,
    scene::SceneComposer,
    ui,
    view::{GpuContext, OverlayFrame, RenderState, ShaderState, WgpuTextureBackend},
};

/// Everything that exists once the window is up
struct AppState {
    window: Arc<Window>,
    gpu: GpuContext,
    render: RenderState,
    scene: SceneComposer<WgpuTextureBackend>,
    shader: ShaderState,
    frame_loop: FrameLoopContext,

    // egui
    egui_state: egui_winit::State,
    egui_ctx: egui::Context,
}

impl AppState {
    fn new(event_loop: &ActiveEventLoop, config: &AppConfig) -> Result<Self, AppError> {
        let attrs = Window::default_attributes()
            .with_title(config.window.title.clone())
            .with_inner_size(winit::dpi::LogicalSize::new(config.window.width, config.window.height))
            .with_resizable(false);
        let window = Arc::new(event_loop.create_window(attrs)?);

        let gpu = pollster::block_on(GpuContext::new(window.clone()))?;

        let backend = WgpuTextureBackend::new(gpu.device.clone(), gpu.queue.clone());
        let render = RenderState::new(&gpu, backend.bind_group_layout());

        let mut shader = ShaderState::new();
        let mut scene = SceneComposer::new(backend, config.assets.texture_dir.clone());
        scene.prepare_scene(&mut shader)?;

        let egui_ctx = egui::Context::default();
        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            None,
            None,
            None,
        );

        grab_cursor(&window);
        let mut frame_loop = FrameLoopContext::new(config);
        frame_loop.set_cursor_captured(true);

        Ok(Self {
            window,
            gpu,
            render,
            scene,
            shader,
            frame_loop,
            egui_state,
            egui_ctx,
        })
    }

    fn input(&mut self, event: &WindowEvent) -> bool {
        // First let egui process the event
        if self.egui_state.on_window_event(self.window.as_ref(), event).consumed {
            return true;
        }

        match event {
            WindowEvent::KeyboardInput {
                event: KeyEvent { state, physical_key: PhysicalKey::Code(code), .. },
                ..
            } => {
                match state {
                    ElementState::Pressed => self.frame_loop.input.key_down(*code),
                    ElementState::Released => self.frame_loop.input.key_up(*code),
                }
                true
            }
            WindowEvent::MouseWheel { delta, .. } => {
                self.frame_loop.on_scroll(delta);
                true
            }
            WindowEvent::Focused(false) => {
                self.frame_loop.input.clear_keys();
                self.frame_loop.set_cursor_captured(false);
                true
            }
            WindowEvent::Focused(true) => {
                grab_cursor(&self.window);
                self.frame_loop.set_cursor_captured(true);
                true
            }
            _ => false,
        }
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.gpu.resize(width, height);
        self.render.resize(&self.gpu.device, width, height);
    }

    /// Run one frame. Returns `FrameStatus::Exit` when the app should close.
    fn redraw(&mut self) -> FrameStatus {
        self.shader.clear_draws();
        if self.frame_loop.update(&mut self.shader) == FrameStatus::Exit {
            return FrameStatus::Exit;
        }
        self.scene.render_scene(&mut self.shader);

        let raw_input = self.egui_state.take_egui_input(&self.window);
        let output = ui::build_ui(
            &self.egui_ctx,
            raw_input,
            &self.frame_loop.controller,
            self.frame_loop.fps.fps(),
        );
        self.egui_state.handle_platform_output(&self.window, output.platform_output);
        let pixels_per_point = output.pixels_per_point;
        let overlay = OverlayFrame {
            primitives: self.egui_ctx.tessellate(output.shapes, pixels_per_point),
            textures_delta: output.textures_delta,
            pixels_per_point,
        };

        let textures = self.scene.registry().backend().bind_group();
        match self.render.draw_frame(&self.gpu, &self.shader, textures, overlay) {
            Ok(()) => FrameStatus::Continue,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.gpu.reconfigure();
                FrameStatus::Continue
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                error!("out of GPU memory");
                FrameStatus::Exit
            }
            Err(e) => {
                warn!(error = ?e, "frame skipped");
                FrameStatus::Continue
            }
        }
    }

    fn shutdown(&mut self) {
        self.scene.release();
        info!("scene resources released");
    }
}

/// Hide the cursor and keep it in the window. Falls back to confining it
/// where locking is not supported.
fn grab_cursor(window: &Window) {
    let grabbed = window
        .set_cursor_grab(CursorGrabMode::Locked)
        .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined));
    if let Err(e) = grabbed {
        warn!(error = %e, "could not capture the cursor");
    }
    window.set_cursor_visible(false);
}

struct App {
    config: AppConfig,
    state: Option<AppState>,
    failure: Option<AppError>,
}

impl App {
    fn new(config: AppConfig) -> Self {
        Self {
            config,
            state: None,
            failure: None,
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }
        match AppState::new(event_loop, &self.config) {
            Ok(state) => {
                state.window.request_redraw();
                self.state = Some(state);
            }
            Err(e) => {
                self.failure = Some(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let Some(state) = self.state.as_mut() else {
            return;
        };
        if state.input(&event) {
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                state.shutdown();
                event_loop.exit();
            }
            WindowEvent::Resized(size) => state.resize(size.width, size.height),
            WindowEvent::RedrawRequested => {
                if state.redraw() == FrameStatus::Exit {
                    state.shutdown();
                    event_loop.exit();
                }
            }
            _ => {}
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _id: DeviceId, event: DeviceEvent) {
        if let (Some(state), DeviceEvent::MouseMotion { delta }) = (self.state.as_mut(), event) {
            state.frame_loop.on_mouse_motion(delta.0, delta.1);
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(state) = &self.state {
            state.window.request_redraw();
        }
    }
}

fn run() -> Result<(), AppError> {
    let config = AppConfig::from_env()?;
    let event_loop = EventLoop::new()?;
    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;
    match app.failure {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn main() {
    logging::init();

    if let Err(e) = run() {
        error!(error = %e, "deskscene failed");
        std::process::exit(1);
    }
}
