//! The analytic field renderer: one fullscreen fragment pass.
//!
//! The fragment shader below is the GPU twin of [`crate::field`]: same
//! gaussian falloff, same weighted color average, same intensity shaping
//! and theme branch. Scene state reaches it through a fixed six-slot
//! uniform block, zero-padded when the scene holds fewer blobs.

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::error::GpuError;
use crate::field;
use crate::gpu::{checked_pipeline, GpuContext, FULLSCREEN_VERTEX_WGSL};
use crate::scene::{Scene, BLOB_COUNT};
use crate::viewport::Viewport;

/// Uniform block layout. Must match the `Uniforms` struct in the WGSL
/// below, including the trailing padding (std140-style 16-byte alignment).
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct FieldUniforms {
    /// Viewport size in pixels.
    pub resolution: [f32; 2],
    /// Pointer position; carried per frame even though the color math does
    /// not read it yet.
    pub pointer: [f32; 2],
    /// Per slot: xy = position, z = radius, w unused.
    pub blobs: [[f32; 4]; BLOB_COUNT],
    /// Per slot: rgb = color, w unused.
    pub colors: [[f32; 4]; BLOB_COUNT],
    /// 1 when the dark theme is active.
    pub dark_mode: u32,
    /// Elapsed seconds.
    pub time: f32,
    pub _pad: [f32; 2],
}

impl FieldUniforms {
    /// Pack the current scene and viewport into the uniform layout,
    /// zero-padding unused blob slots.
    pub fn pack(scene: &Scene, viewport: &Viewport, time: f32) -> Self {
        let slots = field::pack_slots(scene);
        let mut blobs = [[0.0f32; 4]; BLOB_COUNT];
        let mut colors = [[0.0f32; 4]; BLOB_COUNT];
        for (i, slot) in slots.iter().enumerate() {
            blobs[i] = [slot.position.x, slot.position.y, slot.radius, 0.0];
            colors[i] = [slot.color.x, slot.color.y, slot.color.z, 0.0];
        }
        Self {
            resolution: [viewport.width, viewport.height],
            pointer: [viewport.pointer.x, viewport.pointer.y],
            blobs,
            colors,
            dark_mode: viewport.dark_mode as u32,
            time,
            _pad: [0.0; 2],
        }
    }
}

const FIELD_FRAGMENT_WGSL: &str = r#"
struct Uniforms {
    resolution: vec2<f32>,
    pointer: vec2<f32>,
    blobs: array<vec4<f32>, 6>,
    colors: array<vec4<f32>, 6>,
    dark_mode: u32,
    time: f32,
};

@group(0) @binding(0) var<uniform> uniforms: Uniforms;

const SIGMA_FACTOR: f32 = 0.5;
const INTENSITY_EXPONENT: f32 = 1.4;
const BACKDROP_TOP: vec3<f32> = vec3<f32>(0.4235294, 0.0, 0.6352941);
const BACKDROP_BOTTOM: vec3<f32> = vec3<f32>(0.0, 0.0666667, 0.3215686);

@fragment
fn fs_main(in: VsOut) -> @location(0) vec4<f32> {
    let st = in.uv * uniforms.resolution;
    let background = mix(BACKDROP_TOP, BACKDROP_BOTTOM, st.y / uniforms.resolution.y);

    var field_sum = 0.0;
    var weighted = vec3<f32>(0.0);
    for (var i = 0u; i < 6u; i = i + 1u) {
        let blob = uniforms.blobs[i];
        let radius = blob.z;
        if (radius <= 0.0) {
            continue;
        }
        let sigma = radius * SIGMA_FACTOR;
        let dist = distance(st, blob.xy);
        let value = exp(-dist * dist / (2.0 * sigma * sigma));
        field_sum = field_sum + value;
        weighted = weighted + uniforms.colors[i].rgb * value;
    }

    var resolved = vec3<f32>(0.0);
    if (field_sum > 0.0) {
        resolved = weighted / field_sum;
    }

    let intensity = clamp(pow(field_sum, INTENSITY_EXPONENT), 0.0, 1.0);

    var color: vec3<f32>;
    if (uniforms.dark_mode == 1u) {
        // Dark arm: tuned independently of the light arm; currently the
        // same image.
        color = background + (resolved - background) * intensity;
    } else {
        color = mix(background, resolved, intensity);
    }

    return vec4<f32>(color, 1.0);
}
"#;

pub(crate) fn shader_source() -> String {
    format!("{FULLSCREEN_VERTEX_WGSL}\n{FIELD_FRAGMENT_WGSL}")
}

/// Pipeline and uniform buffer for the field pass.
pub struct FieldPass {
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl FieldPass {
    pub fn new(gpu: &GpuContext) -> Result<Self, GpuError> {
        let device = &gpu.device;

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Field Uniform Buffer"),
            contents: bytemuck::bytes_of(&FieldUniforms::zeroed()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Field Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Field Bind Group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline = checked_pipeline(device, || {
            let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("Field Shader"),
                source: wgpu::ShaderSource::Wgsl(shader_source().into()),
            });

            let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Field Pipeline Layout"),
                bind_group_layouts: &[&bind_group_layout],
                push_constant_ranges: &[],
            });

            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("Field Pipeline"),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    buffers: &[],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: gpu.config.format,
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    ..Default::default()
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            })
        })?;

        Ok(Self {
            pipeline,
            uniform_buffer,
            bind_group,
        })
    }

    /// Push the current frame's scene state into the uniform buffer.
    pub fn update(&self, queue: &wgpu::Queue, scene: &Scene, viewport: &Viewport, time: f32) {
        let uniforms = FieldUniforms::pack(scene, viewport, time);
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));
    }

    /// Record the fullscreen field pass into `encoder`.
    pub fn draw(&self, encoder: &mut wgpu::CommandEncoder, target: &wgpu::TextureView) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Field Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.bind_group, &[]);
        pass.draw(0..3, 0..1);
    }
}
