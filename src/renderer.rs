//! The renderer capability: two strategies over one simulation.
//!
//! Blob kinematics live in [`crate::sim`] and are shared; a [`Renderer`]
//! only ever reads the scene. The two strategies differ in resize policy:
//! the raster path rerolls the scene (its radii and random positions are
//! functions of the canvas dimensions, and its buffers are rebuilt anyway),
//! while the field path keeps the scene alive across resizes - pixel-space
//! positions stay valid and only the resolution uniform moves.

use crate::error::GpuError;
use crate::gpu::blit::FramePresenter;
use crate::gpu::field_gpu::FieldPass;
use crate::gpu::GpuContext;
use crate::raster::Compositor;
use crate::scene::Scene;
use crate::viewport::Viewport;

/// Which rendering strategy draws the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RendererKind {
    /// CPU draw-and-blur compositing, presented via a texture blit.
    Raster,
    /// Analytic density field evaluated in a single fullscreen GPU pass.
    #[default]
    Field,
}

impl RendererKind {
    /// Construct the chosen renderer against an initialized GPU context.
    pub fn build(self, gpu: &GpuContext) -> Result<Box<dyn Renderer>, GpuError> {
        match self {
            RendererKind::Raster => Ok(Box::new(RasterRenderer::new(gpu)?)),
            RendererKind::Field => Ok(Box::new(FieldRenderer::new(gpu)?)),
        }
    }
}

/// One frame's worth of drawing, read-only over the scene.
pub trait Renderer {
    /// Record this frame into `encoder`, targeting `target`.
    fn render(
        &mut self,
        gpu: &GpuContext,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
        scene: &Scene,
        viewport: &Viewport,
        time: f32,
    );

    /// React to a viewport resize. May rebuild the scene (raster) or keep
    /// it (field); see the module docs for why the policies differ.
    fn resized(&mut self, gpu: &GpuContext, scene: &mut Scene, viewport: &Viewport);

    /// CPU copy of the most recent frame, when this strategy owns one.
    fn frame_rgba(&self) -> Option<(&[u8], u32, u32)> {
        None
    }
}

/// Renderer A: the CPU compositor plus its GPU presenter.
pub struct RasterRenderer {
    compositor: Compositor,
    presenter: FramePresenter,
    rgba: Vec<u8>,
    width: u32,
    height: u32,
}

impl RasterRenderer {
    pub fn new(gpu: &GpuContext) -> Result<Self, GpuError> {
        Ok(Self {
            compositor: Compositor::new(gpu.config.width as usize, gpu.config.height as usize),
            presenter: FramePresenter::new(gpu)?,
            rgba: Vec::new(),
            width: gpu.config.width,
            height: gpu.config.height,
        })
    }
}

impl Renderer for RasterRenderer {
    fn render(
        &mut self,
        gpu: &GpuContext,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
        scene: &Scene,
        viewport: &Viewport,
        _time: f32,
    ) {
        let frame = self.compositor.compose(scene, viewport);
        frame.write_rgba8(&mut self.rgba);
        self.presenter
            .upload(&gpu.queue, &self.rgba, self.width, self.height);
        self.presenter.draw(encoder, target);
    }

    fn resized(&mut self, gpu: &GpuContext, scene: &mut Scene, viewport: &Viewport) {
        self.width = gpu.config.width;
        self.height = gpu.config.height;
        self.compositor
            .resize(self.width as usize, self.height as usize);
        self.presenter.resize(gpu);
        // Radii and spawn positions were computed from the old dimensions;
        // a stale scene would render inconsistently, so reroll it.
        *scene = Scene::generate(viewport);
    }

    fn frame_rgba(&self) -> Option<(&[u8], u32, u32)> {
        if self.rgba.is_empty() {
            None
        } else {
            Some((&self.rgba, self.width, self.height))
        }
    }
}

/// Renderer B: the analytic field pass.
pub struct FieldRenderer {
    pass: FieldPass,
}

impl FieldRenderer {
    pub fn new(gpu: &GpuContext) -> Result<Self, GpuError> {
        Ok(Self {
            pass: FieldPass::new(gpu)?,
        })
    }
}

impl Renderer for FieldRenderer {
    fn render(
        &mut self,
        gpu: &GpuContext,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
        scene: &Scene,
        viewport: &Viewport,
        time: f32,
    ) {
        self.pass.update(&gpu.queue, scene, viewport, time);
        self.pass.draw(encoder, target);
    }

    fn resized(&mut self, _gpu: &GpuContext, _scene: &mut Scene, _viewport: &Viewport) {
        // The field math is purely pixel-space; existing positions stay
        // valid and the next uniform update carries the new resolution.
    }
}
