use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use super::Texture;

/// Scalar material parameters mirrored into a uniform buffer.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct MaterialParams {
    specular_color: [f32; 4],
    // x = specular power, y = specular coefficient
    params: [f32; 4],
}

/// Surface description: optional albedo and normal maps plus specular
/// scalars. Missing maps are the common case and bind neutral 1x1 fallbacks
/// (white albedo, flat normal).
pub struct Material {
    pub name: String,
    pub albedo: Option<Texture>,
    pub normal: Option<Texture>,
    pub specular_color: [f32; 3],
    pub specular_power: f32,
    pub specular_coefficient: f32,
    bind_group: wgpu::BindGroup,
}

impl Material {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
        name: &str,
        albedo: Option<Texture>,
        normal: Option<Texture>,
        specular_color: [f32; 3],
        specular_power: f32,
        specular_coefficient: f32,
    ) -> Self {
        let params = MaterialParams {
            specular_color: [
                specular_color[0],
                specular_color[1],
                specular_color[2],
                0.0,
            ],
            params: [specular_power, specular_coefficient, 0.0, 0.0],
        };
        let params_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Material Params", name)),
            contents: bytemuck::cast_slice(&[params]),
            usage: wgpu::BufferUsages::UNIFORM,
        });

        // The bind group keeps fallback textures alive even though only the
        // real maps are stored on the struct.
        let fallback_albedo = if albedo.is_none() {
            Some(Texture::solid(
                device,
                queue,
                [255, 255, 255, 255],
                Texture::COLOR_FORMAT,
                Some("Fallback Albedo"),
            ))
        } else {
            None
        };
        let fallback_normal = if normal.is_none() {
            Some(Texture::solid(
                device,
                queue,
                [128, 128, 255, 255],
                Texture::LINEAR_FORMAT,
                Some("Fallback Normal"),
            ))
        } else {
            None
        };

        let albedo_tex = albedo.as_ref().or(fallback_albedo.as_ref()).unwrap();
        let normal_tex = normal.as_ref().or(fallback_normal.as_ref()).unwrap();

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{} Material Bind Group", name)),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&albedo_tex.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&normal_tex.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&albedo_tex.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: params_buffer.as_entire_binding(),
                },
            ],
        });

        Self {
            name: name.to_string(),
            albedo,
            normal,
            specular_color,
            specular_power,
            specular_coefficient,
            bind_group,
        }
    }

    /// Flat gray material for meshes whose material could not be resolved.
    pub fn fallback(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
    ) -> Self {
        Self::new(device, queue, layout, "default", None, None, [1.0; 3], 16.0, 0.5)
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }
}
