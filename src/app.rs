//! Lifecycle controller: window, event routing, and the frame loop.
//!
//! [`Background`] is the builder entry point; it owns the winit event loop
//! and drives the Idle -> Running -> Disposed state machine. Each redraw
//! runs one simulation step and hands the scene, read-only, to the active
//! renderer. All event sources (resize, pointer, redraw) arrive serialized
//! on the event-loop thread, so the scene and viewport need no locking.

use std::sync::Arc;

use winit::application::ApplicationHandler;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use crate::clock::FrameClock;
use crate::error::AppError;
use crate::gpu::GpuContext;
use crate::renderer::{Renderer, RendererKind};
use crate::scene::Scene;
use crate::sim;
use crate::viewport::Viewport;

/// Lifecycle states. Disposed is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Running,
    Disposed,
}

/// Mark the controller disposed; returns whether this call did the work.
///
/// Safe to invoke from any phase, any number of times, including before
/// the first frame has fired.
fn begin_dispose(phase: &mut Phase) -> bool {
    if *phase == Phase::Disposed {
        return false;
    }
    *phase = Phase::Disposed;
    true
}

/// Builder for the animated background application.
///
/// # Example
///
/// ```ignore
/// use lavalamp::{Background, RendererKind};
///
/// Background::new()
///     .with_renderer(RendererKind::Raster)
///     .with_dark_mode(true)
///     .run()?;
/// ```
pub struct Background {
    renderer: RendererKind,
    dark_mode: bool,
    title: String,
}

impl Background {
    pub fn new() -> Self {
        Self {
            renderer: RendererKind::default(),
            dark_mode: false,
            title: "lavalamp".to_string(),
        }
    }

    /// Choose the rendering strategy (defaults to the field renderer).
    pub fn with_renderer(mut self, kind: RendererKind) -> Self {
        self.renderer = kind;
        self
    }

    /// Start in dark mode. The demo toggles it at runtime with `D`.
    pub fn with_dark_mode(mut self, dark_mode: bool) -> Self {
        self.dark_mode = dark_mode;
        self
    }

    /// Window title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Run until the window closes. Blocks the calling thread.
    ///
    /// A GPU bring-up failure is reported here after the loop winds down;
    /// the app never enters the running state in that case.
    pub fn run(self) -> Result<(), AppError> {
        let event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut app = App::new(self);
        event_loop.run_app(&mut app)?;

        match app.startup_error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl Default for Background {
    fn default() -> Self {
        Self::new()
    }
}

struct App {
    options: Background,
    phase: Phase,
    window: Option<Arc<Window>>,
    gpu: Option<GpuContext>,
    renderer: Option<Box<dyn Renderer>>,
    scene: Option<Scene>,
    viewport: Viewport,
    clock: FrameClock,
    startup_error: Option<AppError>,
}

impl App {
    fn new(options: Background) -> Self {
        let dark_mode = options.dark_mode;
        let mut viewport = Viewport::new(0.0, 0.0);
        viewport.dark_mode = dark_mode;
        Self {
            options,
            phase: Phase::Idle,
            window: None,
            gpu: None,
            renderer: None,
            scene: None,
            viewport,
            clock: FrameClock::new(),
            startup_error: None,
        }
    }

    /// Abort start-up: log once, remember the error, leave Idle, stop the
    /// loop. The surrounding application keeps running without the effect.
    fn fail_startup(&mut self, event_loop: &ActiveEventLoop, error: AppError) {
        log::error!("background disabled: {}", error);
        self.startup_error = Some(error);
        event_loop.exit();
    }

    fn dispose(&mut self, event_loop: &ActiveEventLoop) {
        if !begin_dispose(&mut self.phase) {
            return;
        }
        self.renderer = None;
        self.gpu = None;
        self.window = None;
        self.scene = None;
        event_loop.exit();
    }

    fn handle_resize(&mut self, width: u32, height: u32) {
        if self.phase != Phase::Running {
            // A resize can land before GPU init finishes; the init path
            // reads the window size itself, so this is safe to drop.
            return;
        }
        self.viewport.set_size(width as f32, height as f32);
        if let (Some(gpu), Some(renderer), Some(scene)) =
            (&mut self.gpu, &mut self.renderer, &mut self.scene)
        {
            gpu.resize(width, height);
            renderer.resized(gpu, scene, &self.viewport);
        }
    }

    fn render_frame(&mut self, event_loop: &ActiveEventLoop) {
        if self.phase != Phase::Running {
            return;
        }
        let (elapsed, _delta) = self.clock.update();

        if let Some(scene) = &mut self.scene {
            sim::advance(scene, &self.viewport);
        }

        // A dropped or late frame is acceptable; only OutOfMemory is fatal.
        let mut out_of_memory = false;
        let output = {
            let Some(gpu) = &mut self.gpu else { return };
            match gpu.surface.get_current_texture() {
                Ok(output) => Some(output),
                Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                    // Common mid-resize; reconfigure and let the next
                    // redraw pick it up.
                    gpu.reconfigure();
                    None
                }
                Err(wgpu::SurfaceError::Timeout) => None,
                Err(wgpu::SurfaceError::OutOfMemory) => {
                    out_of_memory = true;
                    None
                }
                Err(e) => {
                    log::warn!("skipping frame: {}", e);
                    None
                }
            }
        };
        if out_of_memory {
            log::error!("out of GPU memory, shutting the background down");
            self.dispose(event_loop);
            return;
        }
        let Some(output) = output else { return };

        let (Some(gpu), Some(renderer), Some(scene)) =
            (&self.gpu, &mut self.renderer, &self.scene)
        else {
            return;
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        renderer.render(gpu, &mut encoder, &view, scene, &self.viewport, elapsed);

        gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();
    }

    fn save_screenshot(&self) {
        let Some(renderer) = &self.renderer else {
            return;
        };
        match renderer.frame_rgba() {
            Some((data, width, height)) => {
                let path = format!("lavalamp-{:05}.png", self.clock.frame());
                match image::save_buffer(&path, data, width, height, image::ExtendedColorType::Rgba8)
                {
                    Ok(()) => log::info!("saved {}", path),
                    Err(e) => log::warn!("screenshot failed: {}", e),
                }
            }
            None => log::info!("screenshot unavailable: the field renderer keeps no CPU frame"),
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.phase != Phase::Idle || self.window.is_some() {
            return;
        }

        let window_attrs = Window::default_attributes()
            .with_title(self.options.title.clone())
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));

        let window = match event_loop.create_window(window_attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                self.fail_startup(event_loop, e.into());
                return;
            }
        };

        let size = window.inner_size();
        self.viewport.set_size(size.width as f32, size.height as f32);
        self.viewport.pointer = self.viewport.center();

        let gpu = match pollster::block_on(GpuContext::new(window.clone())) {
            Ok(gpu) => gpu,
            Err(e) => {
                self.fail_startup(event_loop, e.into());
                return;
            }
        };

        let renderer = match self.options.renderer.build(&gpu) {
            Ok(renderer) => renderer,
            Err(e) => {
                self.fail_startup(event_loop, e.into());
                return;
            }
        };

        self.scene = Some(Scene::generate(&self.viewport));
        self.window = Some(window.clone());
        self.gpu = Some(gpu);
        self.renderer = Some(renderer);
        self.phase = Phase::Running;

        window.request_redraw();
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                self.dispose(event_loop);
            }
            WindowEvent::Resized(size) => {
                self.handle_resize(size.width, size.height);
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.viewport.set_pointer(position.x as f32, position.y as f32);
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state != ElementState::Pressed {
                    return;
                }
                if let PhysicalKey::Code(code) = event.physical_key {
                    match code {
                        KeyCode::KeyD => {
                            self.viewport.dark_mode = !self.viewport.dark_mode;
                        }
                        KeyCode::KeyS => self.save_screenshot(),
                        KeyCode::Escape => self.dispose(event_loop),
                        _ => {}
                    }
                }
            }
            WindowEvent::RedrawRequested => {
                self.render_frame(event_loop);
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispose_is_idempotent() {
        let mut phase = Phase::Running;
        assert!(begin_dispose(&mut phase));
        assert_eq!(phase, Phase::Disposed);
        // Further calls are no-ops.
        assert!(!begin_dispose(&mut phase));
        assert!(!begin_dispose(&mut phase));
        assert_eq!(phase, Phase::Disposed);
    }

    #[test]
    fn test_dispose_before_first_frame() {
        let mut phase = Phase::Idle;
        assert!(begin_dispose(&mut phase));
        assert_eq!(phase, Phase::Disposed);
    }

    #[test]
    fn test_builder_defaults() {
        let bg = Background::new();
        assert_eq!(bg.renderer, RendererKind::Field);
        assert!(!bg.dark_mode);
    }

    #[test]
    fn test_builder_options() {
        let bg = Background::new()
            .with_renderer(RendererKind::Raster)
            .with_dark_mode(true)
            .with_title("demo");
        assert_eq!(bg.renderer, RendererKind::Raster);
        assert!(bg.dark_mode);
        assert_eq!(bg.title, "demo");
    }
}
