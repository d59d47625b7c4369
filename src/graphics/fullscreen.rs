use crate::renderer::pipeline::{create_quad_pipeline, shader_module, ScreenQuad};

use super::RenderTarget;

/// Compositor: draws the offscreen color target over the presented surface
/// as a screen-covering textured quad.
pub struct FullscreenPass {
    pipeline: wgpu::RenderPipeline,
    layout: wgpu::BindGroupLayout,
    quad: ScreenQuad,
    bind_group: Option<wgpu::BindGroup>,
}

impl FullscreenPass {
    pub fn new(device: &wgpu::Device, surface_format: wgpu::TextureFormat) -> Self {
        let module = shader_module(
            device,
            "Fullscreen Shader",
            include_str!("../shaders/fullscreen.wgsl"),
        );
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Fullscreen Bind Group Layout"),
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
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Fullscreen Pipeline Layout"),
            bind_group_layouts: &[&layout],
            push_constant_ranges: &[],
        });
        let pipeline = create_quad_pipeline(
            device,
            "Fullscreen Pipeline",
            &pipeline_layout,
            &module,
            "vs_main",
            "fs_main",
            surface_format,
            Some(wgpu::BlendState::REPLACE),
            None,
        );

        Self {
            pipeline,
            layout,
            quad: ScreenQuad::new(device),
            bind_group: None,
        }
    }

    /// Re-points the pass at a freshly created offscreen target.
    pub fn rebind(&mut self, device: &wgpu::Device, target: &RenderTarget) {
        self.bind_group = Some(device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Fullscreen Bind Group"),
            layout: &self.layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&target.color.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&target.color.sampler),
                },
            ],
        }));
    }

    pub fn draw(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        let bind_group = self
            .bind_group
            .as_ref()
            .expect("rebind must run before draw");
        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, bind_group, &[]);
        self.quad.draw(render_pass);
    }
}
