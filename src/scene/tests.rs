use super::*;
use glam::{Mat4, Quat, Vec3};
use pollster::FutureExt;

#[test]
fn transform_defaults_to_identity() {
    let transform = Transform::new();
    assert_eq!(transform.orientation, Quat::IDENTITY);
    assert_eq!(transform.position, Vec3::ZERO);
    assert_eq!(transform.scale, 1.0);
    assert_eq!(transform.matrix(), Mat4::IDENTITY);
}

#[test]
fn transform_matrix_translates() {
    let transform = Transform::from_position(Vec3::new(1.0, 2.0, 3.0));
    let matrix = transform.matrix();
    assert_eq!(matrix.col(3).truncate(), Vec3::new(1.0, 2.0, 3.0));
}

#[test]
fn transform_matrix_scales_uniformly() {
    let mut transform = Transform::new();
    transform.scale = 2.0;
    let matrix = transform.matrix();
    assert_eq!(matrix.col(0).x, 2.0);
    assert_eq!(matrix.col(1).y, 2.0);
    assert_eq!(matrix.col(2).z, 2.0);
}

#[test]
fn transform_matrix_rotates() {
    let mut transform = Transform::new();
    transform.orientation = Quat::from_rotation_y(std::f32::consts::FRAC_PI_2);
    let rotated = transform.matrix().transform_point3(Vec3::X);
    assert!((rotated - Vec3::new(0.0, 0.0, -1.0)).length() < 1e-5);
}

#[test]
fn transform_composes_scale_then_rotate_then_translate() {
    let transform = Transform {
        orientation: Quat::from_rotation_y(std::f32::consts::FRAC_PI_2),
        position: Vec3::new(10.0, 0.0, 0.0),
        scale: 2.0,
    };
    let point = transform.matrix().transform_point3(Vec3::X);
    assert!((point - Vec3::new(10.0, 0.0, -2.0)).length() < 1e-5);
}

fn test_device() -> Option<(wgpu::Device, wgpu::Queue)> {
    let instance = wgpu::Instance::default();
    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions::default())
        .block_on()?;
    adapter
        .request_device(
            &wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_defaults(),
                memory_hints: Default::default(),
            },
            None,
        )
        .block_on()
        .ok()
}

#[test]
fn demo_scene_stays_within_frame_capacities() {
    let Some((device, queue)) = test_device() else {
        eprintln!("skipping: no GPU adapter");
        return;
    };
    let layouts = SharedLayouts::new(&device);
    let scene = Scene::demo(&device, &queue, &layouts);
    // Floor + 4 cubes; 1 directional + 3 orbit lights.
    assert_eq!(scene.model_count(), 5);
    assert_eq!(scene.light_count(), 4);
    assert!(scene.light_count() <= crate::renderer::MAX_LIGHTS);
    assert!(scene.model_count() <= crate::renderer::MAX_RENDER_COMMANDS);
}

#[test]
fn obj_scene_resolves_materials_by_name() {
    let Some((device, queue)) = test_device() else {
        eprintln!("skipping: no GPU adapter");
        return;
    };
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("tri.obj"),
        "\
mtllib tri.mtl
usemtl shiny
v 0 0 0
v 1 0 0
v 0 1 0
vn 0 0 1
f 1//1 2//1 3//1
",
    )
    .unwrap();
    std::fs::write(dir.path().join("tri.mtl"), "newmtl shiny\nNs 4\n").unwrap();

    let layouts = SharedLayouts::new(&device);
    let scene = Scene::from_obj(&device, &queue, &layouts, &dir.path().join("tri.obj")).unwrap();
    assert_eq!(scene.model_count(), 1);
    assert_eq!(scene.models[0].material.name, "shiny");
    assert_eq!(scene.models[0].material.specular_coefficient, 4.0);
}

#[test]
fn obj_scene_with_unknown_material_falls_back() {
    let Some((device, queue)) = test_device() else {
        eprintln!("skipping: no GPU adapter");
        return;
    };
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("tri.obj"),
        "\
usemtl nowhere
v 0 0 0
v 1 0 0
v 0 1 0
vn 0 0 1
f 1//1 2//1 3//1
",
    )
    .unwrap();

    let layouts = SharedLayouts::new(&device);
    let scene = Scene::from_obj(&device, &queue, &layouts, &dir.path().join("tri.obj")).unwrap();
    assert_eq!(scene.models[0].material.name, "default");
}
