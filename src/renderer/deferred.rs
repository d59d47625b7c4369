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

const ALBEDO_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
const NORMAL_SPEC_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
const SPECULAR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
const LINEAR_DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::R16Float;

/// G-buffer attachment set. `Full` carries a dedicated specular target;
/// `Compact` folds specular power into the normal target's alpha and lights
/// with a neutral specular color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GBufferLayout {
    Compact,
    Full,
}

impl GBufferLayout {
    /// Simultaneous color attachments the geometry pass needs.
    pub fn color_target_count(self) -> u32 {
        match self {
            GBufferLayout::Compact => 3,
            GBufferLayout::Full => 4,
        }
    }
}

struct DeferredTargets {
    albedo: Texture,
    normal_spec: Texture,
    specular: Option<Texture>,
    linear_depth: Texture,
    depth: Texture,
    width: u32,
    height: u32,
}

/// Full deferred shading: geometry into the G-buffer, then one additive
/// volume draw per light producing final lit color.
pub struct DeferredRenderer {
    layout_kind: GBufferLayout,
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
    targets: Option<DeferredTargets>,
    gbuffer_bind_group: Option<wgpu::BindGroup>,
}

impl DeferredRenderer {
    pub fn new(device: &wgpu::Device, layouts: &SharedLayouts, layout_kind: GBufferLayout) -> Self {
        let geometry_module = pipeline::shader_module(
            device,
            "Deferred Geometry Shader",
            include_str!("../shaders/deferred_geometry.wgsl"),
        );
        let light_module = pipeline::shader_module(
            device,
            "Deferred Light Shader",
            include_str!("../shaders/deferred_light.wgsl"),
        );

        let texture_entry = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        };
        let sampler_entry = wgpu::BindGroupLayoutEntry {
            binding: 4,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            count: None,
        };
        // The compact layout skips binding 2 (specular); binding numbers
        // stay aligned with the shader across both variants.
        let gbuffer_entries: Vec<wgpu::BindGroupLayoutEntry> = match layout_kind {
            GBufferLayout::Full => vec![
                texture_entry(0),
                texture_entry(1),
                texture_entry(2),
                texture_entry(3),
                sampler_entry,
            ],
            GBufferLayout::Compact => vec![
                texture_entry(0),
                texture_entry(1),
                texture_entry(3),
                sampler_entry,
            ],
        };
        let gbuffer_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Deferred GBuffer Bind Group Layout"),
            entries: &gbuffer_entries,
        });

        let geometry_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Deferred Geometry Pipeline Layout"),
                bind_group_layouts: &[&layouts.frame, &layouts.model, &layouts.material],
                push_constant_ranges: &[],
            });
        let color_target = |format| {
            Some(wgpu::ColorTargetState {
                format,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })
        };
        let geometry_targets: Vec<Option<wgpu::ColorTargetState>> = match layout_kind {
            GBufferLayout::Full => vec![
                color_target(ALBEDO_FORMAT),
                color_target(NORMAL_SPEC_FORMAT),
                color_target(SPECULAR_FORMAT),
                color_target(LINEAR_DEPTH_FORMAT),
            ],
            GBufferLayout::Compact => vec![
                color_target(ALBEDO_FORMAT),
                color_target(NORMAL_SPEC_FORMAT),
                color_target(LINEAR_DEPTH_FORMAT),
            ],
        };
        let geometry_fs = match layout_kind {
            GBufferLayout::Full => "fs_full",
            GBufferLayout::Compact => "fs_compact",
        };
        let geometry_pipeline = create_geometry_pipeline(
            device,
            "Deferred Geometry Pipeline",
            &geometry_pipeline_layout,
            &geometry_module,
            geometry_fs,
            &geometry_targets,
        );

        let light_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Deferred Light Pipeline Layout"),
            bind_group_layouts: &[&layouts.frame, &layouts.light, &gbuffer_layout],
            push_constant_ranges: &[],
        });
        let (point_fs, directional_fs) = match layout_kind {
            GBufferLayout::Full => ("fs_point_full", "fs_directional_full"),
            GBufferLayout::Compact => ("fs_point_compact", "fs_directional_compact"),
        };
        let point_pipeline = create_volume_pipeline(
            device,
            "Deferred Point Light Pipeline",
            &light_pipeline_layout,
            &light_module,
            point_fs,
            RenderTarget::COLOR_FORMAT,
        );
        let directional_pipeline = create_quad_pipeline(
            device,
            "Deferred Directional Light Pipeline",
            &light_pipeline_layout,
            &light_module,
            "vs_fullscreen",
            directional_fs,
            RenderTarget::COLOR_FORMAT,
            Some(ADDITIVE_BLEND),
            Some(pipeline::depth_state(false, wgpu::CompareFunction::Always)),
        );

        let frame_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Deferred Frame Buffer"),
            size: std::mem::size_of::<FrameUniforms>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Deferred Frame Bind Group"),
            layout: &layouts.frame,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_buffer.as_entire_binding(),
            }],
        });

        Self {
            layout_kind,
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

    pub fn gbuffer_layout_kind(&self) -> GBufferLayout {
        self.layout_kind
    }

    pub fn target_size(&self) -> Option<(u32, u32)> {
        self.targets.as_ref().map(|t| (t.width, t.height))
    }
}

impl Renderer for DeferredRenderer {
    fn kind(&self) -> RendererKind {
        RendererKind::Deferred
    }

    fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.gbuffer_bind_group = None;
        self.targets = None;

        let albedo = Texture::render_target(
            device,
            width,
            height,
            ALBEDO_FORMAT,
            Some("Deferred Albedo Target"),
        );
        let normal_spec = Texture::render_target(
            device,
            width,
            height,
            NORMAL_SPEC_FORMAT,
            Some("Deferred Normal+Spec Target"),
        );
        let specular = match self.layout_kind {
            GBufferLayout::Full => Some(Texture::render_target(
                device,
                width,
                height,
                SPECULAR_FORMAT,
                Some("Deferred Specular Target"),
            )),
            GBufferLayout::Compact => None,
        };
        let linear_depth = Texture::render_target(
            device,
            width,
            height,
            LINEAR_DEPTH_FORMAT,
            Some("Deferred Linear Depth Target"),
        );
        let depth = Texture::depth(device, width, height, Some("Deferred Depth Target"));

        let mut entries = vec![
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&albedo.view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(&normal_spec.view),
            },
        ];
        if let Some(specular) = &specular {
            entries.push(wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::TextureView(&specular.view),
            });
        }
        entries.push(wgpu::BindGroupEntry {
            binding: 3,
            resource: wgpu::BindingResource::TextureView(&linear_depth.view),
        });
        entries.push(wgpu::BindGroupEntry {
            binding: 4,
            resource: wgpu::BindingResource::Sampler(&albedo.sampler),
        });

        self.gbuffer_bind_group = Some(device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Deferred GBuffer Bind Group"),
            layout: &self.gbuffer_layout,
            entries: &entries,
        }));
        self.targets = Some(DeferredTargets {
            albedo,
            normal_spec,
            specular,
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

        // Geometry pass.
        {
            fn clear_attachment(
                view: &wgpu::TextureView,
            ) -> Option<wgpu::RenderPassColorAttachment<'_>> {
                Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })
            }
            let mut color_attachments = vec![
                clear_attachment(&targets.albedo.view),
                clear_attachment(&targets.normal_spec.view),
            ];
            if let Some(specular) = &targets.specular {
                color_attachments.push(clear_attachment(&specular.view));
            }
            // Background reads as the far plane.
            color_attachments.push(Some(wgpu::RenderPassColorAttachment {
                view: &targets.linear_depth.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color {
                        r: 1.0,
                        g: 0.0,
                        b: 0.0,
                        a: 1.0,
                    }),
                    store: wgpu::StoreOp::Store,
                },
            }));

            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Deferred Geometry Pass"),
                color_attachments: &color_attachments,
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
                    "Deferred Model Bind Group",
                    ModelUniforms {
                        world: command.transform.matrix().to_cols_array_2d(),
                    },
                );
                render_pass.set_bind_group(1, &model_bind_group, &[]);
                render_pass.set_bind_group(2, command.material.bind_group(), &[]);
                command.mesh.draw(&mut render_pass);
            }
        }

        // Light pass: final lit color straight into the shared target.
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Deferred Light Pass"),
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
                            "Deferred Light Bind Group",
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
                            "Deferred Light Bind Group",
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
