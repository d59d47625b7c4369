use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use wgpu::util::DeviceExt;

use crate::graphics::RenderTarget;
use crate::model::{Material, Mesh};
use crate::scene::Transform;

mod deferred;
mod forward;
mod light_prepass;
pub(crate) mod pipeline;

pub use deferred::{DeferredRenderer, GBufferLayout};
pub use forward::ForwardRenderer;
pub use light_prepass::LightPrepassRenderer;

#[cfg(test)]
mod tests;

/// Hard caps on the per-frame submission lists. Exceeding either is an
/// explicit error from the graphics root, never a silent overrun.
pub const MAX_LIGHTS: usize = 128;
pub const MAX_RENDER_COMMANDS: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RendererKind {
    Forward,
    LightPrePass,
    Deferred,
}

impl RendererKind {
    /// Cycle order Forward -> LightPrePass -> Deferred -> Forward, skipping
    /// Deferred where the device cannot run it.
    pub fn next(self, caps: &RendererCaps) -> RendererKind {
        let next = match self {
            RendererKind::Forward => RendererKind::LightPrePass,
            RendererKind::LightPrePass => RendererKind::Deferred,
            RendererKind::Deferred => RendererKind::Forward,
        };
        if next == RendererKind::Deferred && !caps.supports_deferred() {
            RendererKind::Forward
        } else {
            next
        }
    }

    /// Resolves a startup request against device capabilities. With no
    /// request: Deferred when supported, else LightPrePass.
    pub fn select(requested: Option<RendererKind>, caps: &RendererCaps) -> RendererKind {
        match requested {
            Some(RendererKind::Deferred) | None if caps.supports_deferred() => {
                RendererKind::Deferred
            }
            Some(RendererKind::Deferred) | None => RendererKind::LightPrePass,
            Some(kind) => kind,
        }
    }
}

impl std::fmt::Display for RendererKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RendererKind::Forward => write!(f, "forward"),
            RendererKind::LightPrePass => write!(f, "light pre-pass"),
            RendererKind::Deferred => write!(f, "deferred"),
        }
    }
}

/// Device capabilities the renderer selection cares about.
#[derive(Debug, Clone, Copy)]
pub struct RendererCaps {
    pub max_color_attachments: u32,
}

impl RendererCaps {
    pub fn from_device(device: &wgpu::Device) -> Self {
        Self {
            max_color_attachments: device.limits().max_color_attachments,
        }
    }

    /// Deferred needs at least the compact G-buffer's simultaneous color
    /// attachments.
    pub fn supports_deferred(&self) -> bool {
        self.max_color_attachments >= GBufferLayout::Compact.color_target_count()
    }

    /// Full G-buffer when the device has attachments to spare, else compact.
    pub fn preferred_gbuffer_layout(&self) -> GBufferLayout {
        if self.max_color_attachments >= GBufferLayout::Full.color_target_count() {
            GBufferLayout::Full
        } else {
            GBufferLayout::Compact
        }
    }
}

/// One per-frame draw request: transform + mesh + material. Rebuilt by the
/// scene every frame; the mesh/material references are scene-owned.
#[derive(Clone)]
pub struct RenderCommand {
    pub transform: Transform,
    pub mesh: Arc<Mesh>,
    pub material: Arc<Material>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Light {
    Point {
        position: Vec3,
        color: Vec3,
        /// Influence radius; attenuation reaches zero here.
        size: f32,
    },
    Directional {
        direction: Vec3,
        color: Vec3,
    },
}

/// Everything a renderer variant needs for one frame.
pub struct Frame<'a> {
    pub proj: Mat4,
    pub view: Mat4,
    pub near: f32,
    pub far: f32,
    pub clear_color: wgpu::Color,
    pub commands: &'a [RenderCommand],
    pub lights: &'a [Light],
}

/// The one interface all renderer variants share.
pub trait Renderer {
    fn kind(&self) -> RendererKind;
    /// Destroys and recreates every viewport-sized resource.
    fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32);
    fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        frame: &Frame<'_>,
        target: &RenderTarget,
    );
}

/// Per-frame camera/viewport uniforms, shared by every pass.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub(crate) struct FrameUniforms {
    pub proj: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub inv_proj: [[f32; 4]; 4],
    /// (width, height, near, far)
    pub viewport: [f32; 4],
}

impl FrameUniforms {
    pub fn new(frame: &Frame<'_>, width: u32, height: u32) -> Self {
        Self {
            proj: frame.proj.to_cols_array_2d(),
            view: frame.view.to_cols_array_2d(),
            inv_proj: frame.proj.inverse().to_cols_array_2d(),
            viewport: [width as f32, height as f32, frame.near, frame.far],
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub(crate) struct ModelUniforms {
    pub world: [[f32; 4]; 4],
}

/// Per-light uniforms for the volume/fullscreen accumulation draws.
/// `position` holds the view-space position (w = influence radius) for point
/// lights, or the view-space direction (w = 0) for directional lights.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub(crate) struct LightUniforms {
    pub world: [[f32; 4]; 4],
    pub position: [f32; 4],
    pub color: [f32; 4],
}

impl LightUniforms {
    /// Volume transform + view-space light data for a point light.
    pub fn point(view: Mat4, position: Vec3, color: Vec3, size: f32) -> Self {
        let world = Mat4::from_translation(position) * Mat4::from_scale(Vec3::splat(size));
        let view_pos = view * position.extend(1.0);
        Self {
            world: world.to_cols_array_2d(),
            position: [view_pos.x, view_pos.y, view_pos.z, size],
            color: [color.x, color.y, color.z, 1.0],
        }
    }

    /// View-space direction for a fullscreen directional light.
    pub fn directional(view: Mat4, direction: Vec3, color: Vec3) -> Self {
        let view_dir = (view * direction.normalize().extend(0.0)).truncate();
        Self {
            world: Mat4::IDENTITY.to_cols_array_2d(),
            position: [view_dir.x, view_dir.y, view_dir.z, 0.0],
            color: [color.x, color.y, color.z, 1.0],
        }
    }
}

/// Bind group layouts shared by the renderer variants, the materials and the
/// compositor, created once by the graphics root.
pub struct SharedLayouts {
    pub frame: Arc<wgpu::BindGroupLayout>,
    pub model: Arc<wgpu::BindGroupLayout>,
    pub material: Arc<wgpu::BindGroupLayout>,
    pub light: Arc<wgpu::BindGroupLayout>,
}

impl SharedLayouts {
    pub fn new(device: &wgpu::Device) -> Self {
        let uniform_entry = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };
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

        let frame = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Frame Bind Group Layout"),
            entries: &[uniform_entry(0)],
        });
        let model = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Model Bind Group Layout"),
            entries: &[uniform_entry(0)],
        });
        let material = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Material Bind Group Layout"),
            entries: &[
                texture_entry(0),
                texture_entry(1),
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });
        let light = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Light Bind Group Layout"),
            entries: &[uniform_entry(0)],
        });

        Self {
            frame: Arc::new(frame),
            model: Arc::new(model),
            material: Arc::new(material),
            light: Arc::new(light),
        }
    }
}

/// Per-draw uniforms: a fresh init-buffer and bind group each draw, kept
/// alive by the pass until submission.
pub(crate) fn uniform_bind_group<T: Pod>(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    label: &str,
    value: T,
) -> wgpu::BindGroup {
    let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents: bytemuck::cast_slice(&[value]),
        usage: wgpu::BufferUsages::UNIFORM,
    });
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: buffer.as_entire_binding(),
        }],
    })
}
