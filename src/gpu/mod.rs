//! GPU plumbing shared by both renderers.
//!
//! [`GpuContext`] owns the wgpu surface, device, and queue, and handles the
//! configure/reconfigure dance on init and resize. The renderer-specific
//! pipelines live in [`blit`] (raster frame presenter) and [`field_gpu`]
//! (analytic field pass).

pub mod blit;
pub mod field_gpu;

use std::sync::Arc;

use winit::window::Window;

use crate::error::GpuError;

/// Surface, device, queue, and the current swapchain configuration.
pub struct GpuContext {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
}

impl GpuContext {
    /// Bring up the GPU for the given window.
    ///
    /// Fails with [`GpuError`] when the host has no usable backend; the
    /// caller is expected to log and decline to render rather than panic.
    pub async fn new(window: Arc<Window>) -> Result<Self, GpuError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::LowPower,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GpuError::NoAdapter)?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Background Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        log::info!(
            "GPU ready: {}x{}, {:?}",
            config.width,
            config.height,
            config.format
        );

        Ok(Self {
            surface,
            device,
            queue,
            config,
        })
    }

    /// Reconfigure the swapchain for a new window size. Zero-sized resize
    /// notifications (minimize) are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.config.width = width;
            self.config.height = height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    /// Reconfigure with the current settings, e.g. after a lost surface.
    pub fn reconfigure(&self) {
        self.surface.configure(&self.device, &self.config);
    }
}

/// Run `build` inside a validation error scope and surface any captured
/// error as [`GpuError::ShaderBuild`] with the backend's diagnostic text.
///
/// wgpu reports invalid WGSL through error scopes rather than return
/// values; without this the device would be left with a partially linked
/// program and a background that silently fails per frame.
pub(crate) fn checked_pipeline<T>(
    device: &wgpu::Device,
    build: impl FnOnce() -> T,
) -> Result<T, GpuError> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let built = build();
    match pollster::block_on(device.pop_error_scope()) {
        None => Ok(built),
        Some(e) => Err(GpuError::ShaderBuild(e.to_string())),
    }
}

/// Fullscreen-triangle vertex stage shared by both render paths.
///
/// Three oversized vertices cover the viewport without any vertex buffer;
/// uv is derived from the vertex index.
pub(crate) const FULLSCREEN_VERTEX_WGSL: &str = r#"
struct VsOut {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_main(@builtin(vertex_index) vertex_index: u32) -> VsOut {
    let x = f32(i32(vertex_index & 1u) * 4 - 1);
    let y = f32(i32(vertex_index >> 1u) * 4 - 1);

    var out: VsOut;
    out.position = vec4<f32>(x, y, 0.0, 1.0);
    out.uv = vec2<f32>((x + 1.0) * 0.5, (1.0 - y) * 0.5);
    return out;
}
"#;
