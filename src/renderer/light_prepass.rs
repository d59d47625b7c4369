use crate::graphics::RenderTarget;
use crate::model::Texture;

use super::pipeline::{
    self, create_geometry_pipeline, create_quad_pipeline, create_volume_pipeline, ScreenQuad,
    VolumeMesh, ADDITIVE_BLEND,
};
use super::{
    uniform_bind_group, Frame, FrameUniforms, Light, LightUniforms, ModelUniforms, Renderer,
    RendererKind, SharedLayouts,
};

const NORMAL_SPEC_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
const LINEAR_DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::R16Float;

/// Viewport-sized pass-1 targets, recreated wholesale on resize.
struct PrepassTargets {
    normal_spec: Texture,
    linear_depth: Texture,
    depth: Texture,
    width: u32,
    height: u32,
}

/// Two-pass renderer: normals + specular power first, then one additive
/// light-volume draw per light into the shared target.
pub struct LightPrepassRenderer {
    geometry_pipeline: wgpu::RenderPipeline,
    point_pipeline: wgpu::RenderPipeline,
    directional_pipeline: wgpu::RenderPipeline,
    model_layout: std::sync::Arc<wgpu::BindGroupLayout>,
    light_layout: std::sync::Arc<wgpu::BindGroupLayout>,
    gbuffer_layout: wgpu::BindGroupLayout,
    frame_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    volume: VolumeMesh,
    quad: ScreenQuad,
    targets: Option<PrepassTargets>,
    gbuffer_bind_group: Option<wgpu::BindGroup>,
}

impl LightPrepassRenderer {
    pub fn new(device: &wgpu::Device, layouts: &SharedLayouts) -> Self {
        let geometry_module = pipeline::shader_module(
            device,
            "Light Prepass Geometry Shader",
            include_str!("../shaders/light_prepass_geometry.wgsl"),
        );
        let light_module = pipeline::shader_module(
            device,
            "Light Prepass Light Shader",
            include_str!("../shaders/light_prepass_light.wgsl"),
        );

        let gbuffer_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Prepass GBuffer Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let geometry_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Prepass Geometry Pipeline Layout"),
            bind_group_layouts: &[&layouts.frame, &layouts.model, &layouts.material],
            push_constant_ranges: &[],
        });
        let geometry_pipeline = create_geometry_pipeline(
            device,
            "Prepass Geometry Pipeline",
            &geometry_layout,
            &geometry_module,
            "fs_main",
            &[
                Some(wgpu::ColorTargetState {
                    format: NORMAL_SPEC_FORMAT,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                }),
                Some(wgpu::ColorTargetState {
                    format: LINEAR_DEPTH_FORMAT,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                }),
            ],
        );

        let light_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Prepass Light Pipeline Layout"),
            bind_group_layouts: &[&layouts.frame, &layouts.light, &gbuffer_layout],
            push_constant_ranges: &[],
        });
        let point_pipeline = create_volume_pipeline(
            device,
            "Prepass Point Light Pipeline",
            &light_pipeline_layout,
            &light_module,
            "fs_point",
            RenderTarget::COLOR_FORMAT,
        );
        let directional_pipeline = create_quad_pipeline(
            device,
            "Prepass Directional Light Pipeline",
            &light_pipeline_layout,
            &light_module,
            "vs_fullscreen",
            "fs_directional",
            RenderTarget::COLOR_FORMAT,
            Some(ADDITIVE_BLEND),
            Some(pipeline::depth_state(false, wgpu::CompareFunction::Always)),
        );

        let frame_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Prepass Frame Buffer"),
            size: std::mem::size_of::<FrameUniforms>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Prepass Frame Bind Group"),
            layout: &layouts.frame,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_buffer.as_entire_binding(),
            }],
        });

        Self {
            geometry_pipeline,
            point_pipeline,
            directional_pipeline,
            model_layout: layouts.model.clone(),
            light_layout: layouts.light.clone(),
            gbuffer_layout,
            frame_buffer,
            frame_bind_group,
            volume: VolumeMesh::new(device),
            quad: ScreenQuad::new(device),
            targets: None,
            gbuffer_bind_group: None,
        }
    }

    pub fn target_size(&self) -> Option<(u32, u32)> {
        self.targets.as_ref().map(|t| (t.width, t.height))
    }
}

impl Renderer for LightPrepassRenderer {
    fn kind(&self) -> RendererKind {
        RendererKind::LightPrePass
    }

    fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        // Drop before recreating so the old textures are released first.
        self.gbuffer_bind_group = None;
        self.targets = None;

        let normal_spec = Texture::render_target(
            device,
            width,
            height,
            NORMAL_SPEC_FORMAT,
            Some("Prepass Normal+Spec Target"),
        );
        let linear_depth = Texture::render_target(
            device,
            width,
            height,
            LINEAR_DEPTH_FORMAT,
            Some("Prepass Linear Depth Target"),
        );
        let depth = Texture::depth(device, width, height, Some("Prepass Depth Target"));

        self.gbuffer_bind_group = Some(device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Prepass GBuffer Bind Group"),
            layout: &self.gbuffer_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&normal_spec.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&linear_depth.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&normal_spec.sampler),
                },
            ],
        }));
        self.targets = Some(PrepassTargets {
            normal_spec,
            linear_depth,
            depth,
            width,
            height,
        });
    }

    fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        frame: &Frame<'_>,
        target: &RenderTarget,
    ) {
        let targets = self
            .targets
            .as_ref()
            .expect("resize must run before render");
        let gbuffer_bind_group = self.gbuffer_bind_group.as_ref().unwrap();

        queue.write_buffer(
            &self.frame_buffer,
            0,
            bytemuck::cast_slice(&[FrameUniforms::new(frame, targets.width, targets.height)]),
        );

        // Pass 1: fill normal+spec and linear depth.
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Prepass Geometry Pass"),
                color_attachments: &[
                    Some(wgpu::RenderPassColorAttachment {
                        view: &targets.normal_spec.view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                            store: wgpu::StoreOp::Store,
                        },
                    }),
                    Some(wgpu::RenderPassColorAttachment {
                        view: &targets.linear_depth.view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            // Background reads as the far plane.
                            load: wgpu::LoadOp::Clear(wgpu::Color {
                                r: 1.0,
                                g: 0.0,
                                b: 0.0,
                                a: 1.0,
                            }),
                            store: wgpu::StoreOp::Store,
                        },
                    }),
                ],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &targets.depth.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_pipeline(&self.geometry_pipeline);
            render_pass.set_bind_group(0, &self.frame_bind_group, &[]);
            for command in frame.commands {
                let model_bind_group = uniform_bind_group(
                    device,
                    &self.model_layout,
                    "Prepass Model Bind Group",
                    ModelUniforms {
                        world: command.transform.matrix().to_cols_array_2d(),
                    },
                );
                render_pass.set_bind_group(1, &model_bind_group, &[]);
                render_pass.set_bind_group(2, command.material.bind_group(), &[]);
                command.mesh.draw(&mut render_pass);
            }
        }

        // Pass 2: accumulate lighting into the shared target, testing against
        // pass 1's depth without writing it.
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Prepass Light Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target.color.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &targets.depth.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_bind_group(0, &self.frame_bind_group, &[]);
            render_pass.set_bind_group(2, gbuffer_bind_group, &[]);

            for light in frame.lights {
                match *light {
                    Light::Point {
                        position,
                        color,
                        size,
                    } => {
                        let light_bind_group = uniform_bind_group(
                            device,
                            &self.light_layout,
                            "Prepass Light Bind Group",
                            LightUniforms::point(frame.view, position, color, size),
                        );
                        render_pass.set_pipeline(&self.point_pipeline);
                        render_pass.set_bind_group(1, &light_bind_group, &[]);
                        self.volume.draw(&mut render_pass);
                    }
                    Light::Directional { direction, color } => {
                        let light_bind_group = uniform_bind_group(
                            device,
                            &self.light_layout,
                            "Prepass Light Bind Group",
                            LightUniforms::directional(frame.view, direction, color),
                        );
                        render_pass.set_pipeline(&self.directional_pipeline);
                        render_pass.set_bind_group(1, &light_bind_group, &[]);
                        self.quad.draw(&mut render_pass);
                    }
                }
            }
        }
    }
}
