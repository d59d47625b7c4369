pub mod camera;
pub mod transform;

pub use camera::Camera;
pub use transform::Transform;

#[cfg(test)]
mod tests;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use glam::{Quat, Vec3};

use crate::graphics::Graphics;
use crate::model::obj::ObjScene;
use crate::model::{primitives, Material, Mesh, Texture};
use crate::renderer::{Light, RenderCommand, SharedLayouts};

struct SceneModel {
    mesh: Arc<Mesh>,
    material: Arc<Material>,
    transform: Transform,
}

/// Demo point light orbiting the scene center.
struct OrbitLight {
    color: Vec3,
    radius: f32,
    height: f32,
    speed: f32,
    phase: f32,
    size: f32,
}

/// Owns meshes and materials; re-submits models and lights to the graphics
/// root every frame.
pub struct Scene {
    pub camera: Camera,
    models: Vec<SceneModel>,
    orbit_lights: Vec<OrbitLight>,
    directional: Option<(Vec3, Vec3)>,
    time: f32,
}

impl Scene {
    /// Loads an OBJ scene: one model per `usemtl` group, materials resolved
    /// by name with textures read relative to the OBJ's directory.
    pub fn from_obj(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layouts: &SharedLayouts,
        path: &Path,
    ) -> Result<Self> {
        let parsed = ObjScene::load(path)?;
        let dir = path.parent().unwrap_or_else(|| Path::new(""));

        let mut materials: Vec<Arc<Material>> = Vec::with_capacity(parsed.materials.len());
        for data in &parsed.materials {
            let albedo = data
                .albedo_map
                .as_deref()
                .map(|file| {
                    Texture::from_path(
                        device,
                        queue,
                        &dir.join(file),
                        Texture::COLOR_FORMAT,
                        Some(file),
                    )
                })
                .transpose()
                .with_context(|| format!("material '{}'", data.name))?;
            let normal = data
                .normal_map
                .as_deref()
                .map(|file| {
                    Texture::from_path(
                        device,
                        queue,
                        &dir.join(file),
                        Texture::LINEAR_FORMAT,
                        Some(file),
                    )
                })
                .transpose()
                .with_context(|| format!("material '{}'", data.name))?;
            materials.push(Arc::new(Material::new(
                device,
                queue,
                &layouts.material,
                &data.name,
                albedo,
                normal,
                data.specular_color,
                data.specular_power,
                data.specular_coefficient,
            )));
        }
        let fallback = Arc::new(Material::fallback(device, queue, &layouts.material));

        // Meshes and model records come out of the parser in lockstep, one
        // pair per usemtl group.
        let mut models = Vec::with_capacity(parsed.meshes.len());
        for (mesh_data, model_data) in parsed.meshes.iter().zip(&parsed.models) {
            let mesh = Arc::new(Mesh::new(
                device,
                &mesh_data.name,
                &mesh_data.vertices,
                &mesh_data.indices,
            ));
            let material = materials
                .iter()
                .find(|m| m.name == model_data.material)
                .cloned()
                .unwrap_or_else(|| {
                    log::warn!(
                        "mesh '{}' references unknown material '{}'",
                        model_data.mesh,
                        model_data.material
                    );
                    fallback.clone()
                });
            models.push(SceneModel {
                mesh,
                material,
                transform: Transform::new(),
            });
        }

        let mut scene = Self {
            camera: Camera::new(Vec3::new(0.0, 8.0, 16.0)),
            models,
            orbit_lights: Vec::new(),
            directional: None,
            time: 0.0,
        };
        scene.add_demo_lights();
        Ok(scene)
    }

    /// Built-in scene used when no OBJ is given: checkerboard floor, a ring
    /// of cubes, orbiting colored lights.
    pub fn demo(device: &wgpu::Device, queue: &wgpu::Queue, layouts: &SharedLayouts) -> Self {
        let floor_pixels = primitives::checkerboard(512, 20);
        let floor_texture = Texture::from_rgba8(
            device,
            queue,
            512,
            512,
            &floor_pixels,
            Texture::COLOR_FORMAT,
            Some("Floor Texture"),
        );
        let floor_material = Arc::new(Material::new(
            device,
            queue,
            &layouts.material,
            "floor",
            Some(floor_texture),
            None,
            [1.0; 3],
            32.0,
            0.5,
        ));
        let (floor_vertices, floor_indices) = primitives::plane(10.0, 20.0);
        let floor_mesh = Arc::new(Mesh::new(device, "floor", &floor_vertices, &floor_indices));

        let cube_material = Arc::new(Material::new(
            device,
            queue,
            &layouts.material,
            "cube",
            Some(Texture::solid(
                device,
                queue,
                [200, 160, 90, 255],
                Texture::COLOR_FORMAT,
                Some("Cube Albedo"),
            )),
            None,
            [1.0; 3],
            64.0,
            1.0,
        ));
        let (cube_vertices, cube_indices) = primitives::cube(1.0);
        let cube_mesh = Arc::new(Mesh::new(device, "cube", &cube_vertices, &cube_indices));

        let mut models = vec![SceneModel {
            mesh: floor_mesh,
            material: floor_material,
            transform: Transform::new(),
        }];
        let cube_positions = [
            Vec3::new(-3.0, 1.0, -3.0),
            Vec3::new(3.0, 1.0, -3.0),
            Vec3::new(-3.0, 1.0, 3.0),
            Vec3::new(3.0, 1.0, 3.0),
        ];
        for (index, position) in cube_positions.into_iter().enumerate() {
            let mut transform = Transform::from_position(position);
            transform.orientation =
                Quat::from_rotation_y(index as f32 * std::f32::consts::FRAC_PI_2 * 0.5);
            models.push(SceneModel {
                mesh: cube_mesh.clone(),
                material: cube_material.clone(),
                transform,
            });
        }

        let mut scene = Self {
            camera: Camera::new(Vec3::new(0.0, 8.0, 16.0)),
            models,
            orbit_lights: Vec::new(),
            directional: None,
            time: 0.0,
        };
        scene.add_demo_lights();
        scene
    }

    fn add_demo_lights(&mut self) {
        self.directional = Some((
            Vec3::new(-0.5, -1.0, -0.5).normalize(),
            Vec3::splat(0.3),
        ));
        let colors = [
            Vec3::new(1.0, 0.2, 0.2),
            Vec3::new(0.2, 1.0, 0.2),
            Vec3::new(0.2, 0.2, 1.0),
        ];
        for (index, color) in colors.into_iter().enumerate() {
            self.orbit_lights.push(OrbitLight {
                color,
                radius: 5.0,
                height: 3.0,
                speed: 0.6 + index as f32 * 0.2,
                phase: index as f32 * std::f32::consts::TAU / 3.0,
                size: 8.0,
            });
        }
    }

    pub fn update(&mut self, dt: f32) {
        self.time += dt;
        self.camera.update(dt);
    }

    pub fn model_count(&self) -> usize {
        self.models.len()
    }

    pub fn light_count(&self) -> usize {
        self.orbit_lights.len() + usize::from(self.directional.is_some())
    }

    /// Submits this frame's models and lights to the graphics root.
    pub fn queue(&self, graphics: &mut Graphics) -> Result<()> {
        for model in &self.models {
            graphics.add_render_command(RenderCommand {
                transform: model.transform,
                mesh: model.mesh.clone(),
                material: model.material.clone(),
            })?;
        }
        if let Some((direction, color)) = self.directional {
            graphics.add_light(Light::Directional { direction, color })?;
        }
        for light in &self.orbit_lights {
            let angle = self.time * light.speed + light.phase;
            graphics.add_light(Light::Point {
                position: Vec3::new(
                    angle.cos() * light.radius,
                    light.height,
                    angle.sin() * light.radius,
                ),
                color: light.color,
                size: light.size,
            })?;
        }
        Ok(())
    }
}
