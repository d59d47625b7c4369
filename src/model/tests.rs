use super::obj::{compute_tangents, parse_mtl, parse_obj, ObjScene};
use super::*;
use anyhow::Result;
use pollster::FutureExt;
use std::io::Write;

/// 6 quad faces, 24 distinct position/uv/normal triples, no corner shared
/// across faces.
const CUBE_OBJ: &str = "\
mtllib cube.mtl
g cube
usemtl default
v -1 -1 -1
v 1 -1 -1
v 1 1 -1
v -1 1 -1
v -1 -1 1
v 1 -1 1
v 1 1 1
v -1 1 1
vt 0 0
vt 1 0
vt 1 1
vt 0 1
vn 0 0 -1
vn 0 0 1
vn 1 0 0
vn -1 0 0
vn 0 1 0
vn 0 -1 0
f 2/1/1 1/2/1 4/3/1 3/4/1
f 5/1/2 6/2/2 7/3/2 8/4/2
f 6/1/3 2/2/3 3/3/3 7/4/3
f 1/1/4 5/2/4 8/3/4 4/4/4
f 4/1/5 8/2/5 7/3/5 3/4/5
f 1/1/6 2/2/6 6/3/6 5/4/6
";

const CUBE_MTL: &str = "\
newmtl default
Ns 32.0
Ks 1 1 1
";

fn no_mtl(_name: &str) -> Result<String> {
    anyhow::bail!("no mtl expected")
}

fn parse_cube() -> ObjScene {
    parse_obj(CUBE_OBJ, |_| Ok(CUBE_MTL.to_string())).unwrap()
}

#[test]
fn cube_yields_one_mesh_with_24_vertices_and_36_indices() {
    let scene = parse_cube();
    assert_eq!(scene.meshes.len(), 1);
    assert_eq!(scene.meshes[0].name, "cube");
    assert_eq!(scene.meshes[0].vertices.len(), 24);
    assert_eq!(scene.meshes[0].indices.len(), 36);

    assert_eq!(scene.models.len(), 1);
    assert_eq!(scene.models[0].mesh, "cube");
    assert_eq!(scene.models[0].material, "default");
}

#[test]
fn mtl_routing_and_defaults() {
    let scene = parse_cube();
    assert_eq!(scene.materials.len(), 1);
    let material = &scene.materials[0];
    assert_eq!(material.name, "default");
    // newmtl seeds the power; Ns feeds the coefficient.
    assert_eq!(material.specular_power, 16.0);
    assert_eq!(material.specular_coefficient, 32.0);
    assert_eq!(material.specular_color, [1.0, 1.0, 1.0]);
    assert!(material.albedo_map.is_none());
}

#[test]
fn quad_face_splits_into_two_triangles_in_order() {
    let source = "\
usemtl m
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vt 0 0
vt 1 0
vt 1 1
vt 0 1
vn 0 0 1
f 1/1/1 2/2/1 3/3/1 4/4/1
";
    let scene = parse_obj(source, no_mtl).unwrap();
    assert_eq!(scene.meshes[0].indices, vec![0, 1, 2, 0, 2, 3]);
    assert_eq!(scene.meshes[0].vertices.len(), 4);
}

#[test]
fn texcoord_v_channel_is_flipped() {
    let source = "\
usemtl m
v 0 0 0
v 1 0 0
v 0 1 0
vt 0.25 0.25
vn 0 0 1
f 1/1/1 2/1/1 3/1/1
";
    let scene = parse_obj(source, no_mtl).unwrap();
    assert_eq!(scene.meshes[0].vertices[0].texcoord, [0.25, 0.75]);
}

#[test]
fn missing_uv_binds_reserved_center_slot() {
    let source = "\
usemtl m
v 0 0 0
v 1 0 0
v 0 1 0
vn 0 0 1
f 1//1 2//1 3//1
";
    let scene = parse_obj(source, no_mtl).unwrap();
    for vertex in &scene.meshes[0].vertices {
        assert_eq!(vertex.texcoord, [0.5, 0.5]);
    }
}

#[test]
fn shared_corners_are_deduplicated() {
    let source = "\
usemtl m
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vt 0 0
vt 1 0
vt 1 1
vt 0 1
vn 0 0 1
f 1/1/1 2/2/1 3/3/1
f 1/1/1 3/3/1 4/4/1
";
    let scene = parse_obj(source, no_mtl).unwrap();
    assert_eq!(scene.meshes[0].vertices.len(), 4);
    assert_eq!(scene.meshes[0].indices, vec![0, 1, 2, 0, 2, 3]);
}

#[test]
fn parsing_is_deterministic() {
    let a = parse_cube();
    let b = parse_cube();
    assert_eq!(a.meshes[0].vertices, b.meshes[0].vertices);
    assert_eq!(a.meshes[0].indices, b.meshes[0].indices);
}

#[test]
fn malformed_faces_fail_the_load() {
    let preamble = "\
usemtl m
v 0 0 0
v 1 0 0
v 0 1 0
vt 0 0
vn 0 0 1
";
    // Two corners.
    assert!(parse_obj(&format!("{preamble}f 1/1/1 2/1/1\n"), no_mtl).is_err());
    // Five corners.
    assert!(parse_obj(
        &format!("{preamble}f 1/1/1 2/1/1 3/1/1 1/1/1 2/1/1\n"),
        no_mtl
    )
    .is_err());
    // Unparsable index.
    assert!(parse_obj(&format!("{preamble}f a/b/c 2/1/1 3/1/1\n"), no_mtl).is_err());
    // Missing normal field.
    assert!(parse_obj(&format!("{preamble}f 1/1 2/1 3/1\n"), no_mtl).is_err());
    // Out-of-range position index.
    assert!(parse_obj(&format!("{preamble}f 1/1/1 2/1/1 9/1/1\n"), no_mtl).is_err());
}

#[test]
fn unnamed_group_gets_synthesized_name() {
    let source = "\
usemtl m
v 0 0 0
v 1 0 0
v 0 1 0
vn 0 0 1
f 1//1 2//1 3//1
";
    let scene = parse_obj(source, no_mtl).unwrap();
    assert_eq!(scene.meshes[0].name, "mesh0");
}

#[test]
fn tangents_solve_the_uv_gradient_system() {
    let mut vertices = vec![
        Vertex {
            position: [0.0, 0.0, 0.0],
            normal: [0.0, 0.0, 1.0],
            tangent: [0.0; 3],
            bitangent: [0.0; 3],
            texcoord: [0.0, 0.0],
        },
        Vertex {
            position: [1.0, 0.0, 0.0],
            normal: [0.0, 0.0, 1.0],
            tangent: [0.0; 3],
            bitangent: [0.0; 3],
            texcoord: [1.0, 0.0],
        },
        Vertex {
            position: [0.0, 1.0, 0.0],
            normal: [0.0, 0.0, 1.0],
            tangent: [0.0; 3],
            bitangent: [0.0; 3],
            texcoord: [0.0, 1.0],
        },
    ];
    compute_tangents(&mut vertices, &[0, 1, 2]);
    for vertex in &vertices {
        assert_eq!(vertex.tangent, [1.0, 0.0, 0.0]);
        assert_eq!(vertex.bitangent, [0.0, 1.0, 0.0]);
    }
}

#[test]
fn tangents_are_orthogonal_to_face_normals_and_reproducible() {
    let a = parse_cube();
    let b = parse_cube();
    for (va, vb) in a.meshes[0].vertices.iter().zip(&b.meshes[0].vertices) {
        let dot = va.tangent[0] * va.normal[0]
            + va.tangent[1] * va.normal[1]
            + va.tangent[2] * va.normal[2];
        assert!(dot.abs() < 1e-4, "tangent not orthogonal to normal: {dot}");
        // Bit-exact across runs.
        assert_eq!(va.tangent, vb.tangent);
        assert_eq!(va.bitangent, vb.bitangent);
    }
}

#[test]
fn shared_vertex_keeps_last_triangle_tangent() {
    let vertex = |position, texcoord| Vertex {
        position,
        normal: [0.0, 0.0, 1.0],
        tangent: [0.0; 3],
        bitangent: [0.0; 3],
        texcoord,
    };
    let base = vec![
        vertex([0.0, 0.0, 0.0], [0.0, 0.0]),
        vertex([1.0, 0.0, 0.0], [1.0, 0.0]),
        vertex([0.0, 1.0, 0.0], [0.0, 1.0]), // shared
        vertex([2.0, 1.0, 0.0], [1.0, 1.0]),
        vertex([0.0, 3.0, 0.0], [0.0, 2.0]),
    ];
    // Triangle [2,3,4] has double the position scale per UV unit, so its
    // tangent is (2,0,0) where triangle [0,1,2] produces (1,0,0).
    let mut forward_order = base.clone();
    compute_tangents(&mut forward_order, &[0, 1, 2, 2, 3, 4]);
    assert_eq!(forward_order[2].tangent, [2.0, 0.0, 0.0]);

    let mut reverse_order = base;
    compute_tangents(&mut reverse_order, &[2, 3, 4, 0, 1, 2]);
    assert_eq!(reverse_order[2].tangent, [1.0, 0.0, 0.0]);
}

#[test]
fn mtl_parses_multiple_materials_and_first_bump_wins() {
    let source = "\
newmtl stone
map_Kd stone_albedo.png
map_bump stone_normal.png
map_bump ignored.png
Ks 0.5 0.5 0.5
Ns 8
newmtl metal
map_Kd metal.png
";
    let mut materials = Vec::new();
    parse_mtl(source, &mut materials).unwrap();
    assert_eq!(materials.len(), 2);
    assert_eq!(materials[0].albedo_map.as_deref(), Some("stone_albedo.png"));
    assert_eq!(materials[0].normal_map.as_deref(), Some("stone_normal.png"));
    assert_eq!(materials[0].specular_color, [0.5, 0.5, 0.5]);
    assert_eq!(materials[0].specular_coefficient, 8.0);
    assert_eq!(materials[1].name, "metal");
    assert!(materials[1].normal_map.is_none());
}

#[test]
fn mtl_directive_before_newmtl_is_an_error() {
    let mut materials = Vec::new();
    assert!(parse_mtl("map_Kd orphan.png\n", &mut materials).is_err());
}

#[test]
fn load_resolves_mtllib_relative_to_obj() {
    let dir = tempfile::tempdir().unwrap();
    let obj_path = dir.path().join("cube.obj");
    std::fs::File::create(&obj_path)
        .unwrap()
        .write_all(CUBE_OBJ.as_bytes())
        .unwrap();
    std::fs::File::create(dir.path().join("cube.mtl"))
        .unwrap()
        .write_all(CUBE_MTL.as_bytes())
        .unwrap();

    let scene = ObjScene::load(&obj_path).unwrap();
    assert_eq!(scene.meshes.len(), 1);
    assert_eq!(scene.materials.len(), 1);

    assert!(ObjScene::load(&dir.path().join("missing.obj")).is_err());
}

#[test]
fn missing_mtllib_fails_the_load() {
    let dir = tempfile::tempdir().unwrap();
    let obj_path = dir.path().join("cube.obj");
    std::fs::File::create(&obj_path)
        .unwrap()
        .write_all(CUBE_OBJ.as_bytes())
        .unwrap();
    assert!(ObjScene::load(&obj_path).is_err());
}

#[test]
fn index_format_matches_vertex_count() {
    assert_eq!(choose_index_format(100), wgpu::IndexFormat::Uint16);
    assert_eq!(choose_index_format(65536), wgpu::IndexFormat::Uint16);
    assert_eq!(choose_index_format(65537), wgpu::IndexFormat::Uint32);
}

#[test]
fn primitives_have_expected_counts() {
    let (vertices, indices) = primitives::cube(1.0);
    assert_eq!(vertices.len(), 24);
    assert_eq!(indices.len(), 36);

    let (vertices, indices) = primitives::plane(10.0, 20.0);
    assert_eq!(vertices.len(), 4);
    assert_eq!(indices.len(), 6);

    assert_eq!(primitives::checkerboard(16, 4).len(), 16 * 16 * 4);
}

#[test]
fn vertex_layout_is_56_bytes_with_5_attributes() {
    assert_eq!(std::mem::size_of::<Vertex>(), 56);
    let layout = Vertex::desc();
    assert_eq!(layout.array_stride, 56);
    assert_eq!(layout.attributes.len(), 5);
    assert_eq!(std::mem::size_of::<PositionVertex>(), 12);
}

// GPU-dependent tests skip when no adapter is present.
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
fn mesh_upload_sizes_and_index_width() {
    let Some((device, _queue)) = test_device() else {
        eprintln!("skipping: no GPU adapter");
        return;
    };
    let scene = parse_cube();
    let mesh_data = &scene.meshes[0];
    let mesh = Mesh::new(&device, &mesh_data.name, &mesh_data.vertices, &mesh_data.indices);
    assert_eq!(mesh.vertex_buffer_size(), 24 * 56);
    assert_eq!(mesh.index_count(), 36);
    assert_eq!(mesh.index_format(), wgpu::IndexFormat::Uint16);
}

#[test]
fn solid_texture_is_one_pixel() {
    let Some((device, queue)) = test_device() else {
        eprintln!("skipping: no GPU adapter");
        return;
    };
    let texture = Texture::solid(
        &device,
        &queue,
        [255, 0, 255, 255],
        Texture::COLOR_FORMAT,
        Some("test"),
    );
    assert_eq!(texture.size(), (1, 1));
}

#[test]
fn texture_decodes_from_encoded_bytes() {
    let Some((device, queue)) = test_device() else {
        eprintln!("skipping: no GPU adapter");
        return;
    };
    let mut bytes = Vec::new();
    let img = image::RgbaImage::from_pixel(2, 2, image::Rgba([10, 20, 30, 255]));
    img.write_to(
        &mut std::io::Cursor::new(&mut bytes),
        image::ImageOutputFormat::Png,
    )
    .unwrap();
    let texture =
        Texture::from_bytes(&device, &queue, &bytes, Texture::COLOR_FORMAT, Some("bytes"))
            .unwrap();
    assert_eq!(texture.size(), (2, 2));

    assert!(Texture::from_bytes(&device, &queue, &[1, 2, 3], Texture::COLOR_FORMAT, None).is_err());
}

#[test]
fn material_without_maps_still_binds() {
    let Some((device, queue)) = test_device() else {
        eprintln!("skipping: no GPU adapter");
        return;
    };
    let layouts = crate::renderer::SharedLayouts::new(&device);
    let material = Material::fallback(&device, &queue, &layouts.material);
    assert!(material.albedo.is_none());
    assert!(material.normal.is_none());
    // The bind group exists regardless; missing maps are not an error.
    let _ = material.bind_group();
}
