use bytemuck::{Pod, Zeroable};

use crate::graphics::RenderTarget;

use super::pipeline::{self, create_geometry_pipeline};
use super::{
    uniform_bind_group, Frame, FrameUniforms, Light, ModelUniforms, Renderer, RendererKind,
    SharedLayouts, MAX_LIGHTS,
};

/// Fixed-size light array uniform, bounded by `MAX_LIGHTS`.
#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct GpuLights {
    position_size: [[f32; 4]; MAX_LIGHTS],
    color_kind: [[f32; 4]; MAX_LIGHTS],
    count: [u32; 4],
}

impl GpuLights {
    fn new(lights: &[Light], view: glam::Mat4) -> Self {
        let mut out = Self {
            position_size: [[0.0; 4]; MAX_LIGHTS],
            color_kind: [[0.0; 4]; MAX_LIGHTS],
            count: [lights.len().min(MAX_LIGHTS) as u32, 0, 0, 0],
        };
        for (slot, light) in lights.iter().take(MAX_LIGHTS).enumerate() {
            match *light {
                Light::Point {
                    position,
                    color,
                    size,
                } => {
                    let view_pos = view * position.extend(1.0);
                    out.position_size[slot] = [view_pos.x, view_pos.y, view_pos.z, size];
                    out.color_kind[slot] = [color.x, color.y, color.z, 1.0];
                }
                Light::Directional { direction, color } => {
                    let view_dir = (view * direction.normalize().extend(0.0)).truncate();
                    out.position_size[slot] = [view_dir.x, view_dir.y, view_dir.z, 0.0];
                    out.color_kind[slot] = [color.x, color.y, color.z, 0.0];
                }
            }
        }
        out
    }
}

/// Single-pass renderer: every light is applied while the geometry is drawn.
pub struct ForwardRenderer {
    pipeline: wgpu::RenderPipeline,
    model_layout: std::sync::Arc<wgpu::BindGroupLayout>,
    frame_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    lights_buffer: wgpu::Buffer,
    lights_bind_group: wgpu::BindGroup,
}

impl ForwardRenderer {
    pub fn new(device: &wgpu::Device, layouts: &SharedLayouts) -> Self {
        let module = pipeline::shader_module(
            device,
            "Forward Shader",
            include_str!("../shaders/forward.wgsl"),
        );

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Forward Pipeline Layout"),
            bind_group_layouts: &[
                &layouts.frame,
                &layouts.light,
                &layouts.model,
                &layouts.material,
            ],
            push_constant_ranges: &[],
        });

        let pipeline = create_geometry_pipeline(
            device,
            "Forward Pipeline",
            &pipeline_layout,
            &module,
            "fs_main",
            &[Some(wgpu::ColorTargetState {
                format: RenderTarget::COLOR_FORMAT,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        );

        let frame_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Forward Frame Buffer"),
            size: std::mem::size_of::<FrameUniforms>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Forward Frame Bind Group"),
            layout: &layouts.frame,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_buffer.as_entire_binding(),
            }],
        });

        let lights_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Forward Lights Buffer"),
            size: std::mem::size_of::<GpuLights>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let lights_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Forward Lights Bind Group"),
            layout: &layouts.light,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: lights_buffer.as_entire_binding(),
            }],
        });

        Self {
            pipeline,
            model_layout: layouts.model.clone(),
            frame_buffer,
            frame_bind_group,
            lights_buffer,
            lights_bind_group,
        }
    }
}

impl Renderer for ForwardRenderer {
    fn kind(&self) -> RendererKind {
        RendererKind::Forward
    }

    fn resize(&mut self, _device: &wgpu::Device, _width: u32, _height: u32) {
        // Draws straight into the shared target; nothing viewport-sized here.
    }

    fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        frame: &Frame<'_>,
        target: &RenderTarget,
    ) {
        queue.write_buffer(
            &self.frame_buffer,
            0,
            bytemuck::cast_slice(&[FrameUniforms::new(frame, target.width(), target.height())]),
        );
        queue.write_buffer(
            &self.lights_buffer,
            0,
            bytemuck::cast_slice(&[GpuLights::new(frame.lights, frame.view)]),
        );

        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Forward Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &target.color.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(frame.clear_color),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &target.depth.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            occlusion_query_set: None,
            timestamp_writes: None,
        });

        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, &self.frame_bind_group, &[]);
        render_pass.set_bind_group(1, &self.lights_bind_group, &[]);

        for command in frame.commands {
            let model_bind_group = uniform_bind_group(
                device,
                &self.model_layout,
                "Forward Model Bind Group",
                ModelUniforms {
                    world: command.transform.matrix().to_cols_array_2d(),
                },
            );
            render_pass.set_bind_group(2, &model_bind_group, &[]);
            render_pass.set_bind_group(3, command.material.bind_group(), &[]);
            command.mesh.draw(&mut render_pass);
        }
    }
}
