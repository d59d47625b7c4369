use super::*;
use crate::graphics::RenderTarget;
use glam::Vec3;
use pollster::FutureExt;

fn caps(max_color_attachments: u32) -> RendererCaps {
    RendererCaps {
        max_color_attachments,
    }
}

#[test]
fn cycling_visits_all_renderers_when_deferred_is_supported() {
    let caps = caps(8);
    assert!(caps.supports_deferred());
    let mut kind = RendererKind::Forward;
    kind = kind.next(&caps);
    assert_eq!(kind, RendererKind::LightPrePass);
    kind = kind.next(&caps);
    assert_eq!(kind, RendererKind::Deferred);
    kind = kind.next(&caps);
    assert_eq!(kind, RendererKind::Forward);
}

#[test]
fn cycling_skips_deferred_when_unsupported() {
    let caps = caps(2);
    assert!(!caps.supports_deferred());
    assert_eq!(
        RendererKind::LightPrePass.next(&caps),
        RendererKind::Forward
    );
    assert_eq!(RendererKind::Forward.next(&caps), RendererKind::LightPrePass);
}

#[test]
fn selection_prefers_deferred_then_prepass() {
    assert_eq!(RendererKind::select(None, &caps(8)), RendererKind::Deferred);
    assert_eq!(
        RendererKind::select(None, &caps(2)),
        RendererKind::LightPrePass
    );
}

#[test]
fn requesting_deferred_on_small_device_falls_back_to_prepass() {
    assert_eq!(
        RendererKind::select(Some(RendererKind::Deferred), &caps(2)),
        RendererKind::LightPrePass
    );
    assert_eq!(
        RendererKind::select(Some(RendererKind::Forward), &caps(2)),
        RendererKind::Forward
    );
}

#[test]
fn gbuffer_layout_attachment_counts() {
    assert_eq!(GBufferLayout::Compact.color_target_count(), 3);
    assert_eq!(GBufferLayout::Full.color_target_count(), 4);
    assert_eq!(caps(3).preferred_gbuffer_layout(), GBufferLayout::Compact);
    assert_eq!(caps(4).preferred_gbuffer_layout(), GBufferLayout::Full);
}

fn test_frame<'a>() -> Frame<'a> {
    Frame {
        proj: glam::Mat4::perspective_rh(std::f32::consts::FRAC_PI_2, 1.0, 1.0, 100.0),
        view: glam::Mat4::IDENTITY,
        near: 1.0,
        far: 100.0,
        clear_color: wgpu::Color {
            r: 1.0,
            g: 0.0,
            b: 1.0,
            a: 1.0,
        },
        commands: &[],
        lights: &[],
    }
}

#[test]
fn frame_uniforms_pack_inverse_projection_and_viewport() {
    let frame = test_frame();
    let uniforms = FrameUniforms::new(&frame, 640, 360);
    assert_eq!(uniforms.viewport, [640.0, 360.0, 1.0, 100.0]);

    let inv = glam::Mat4::from_cols_array_2d(&uniforms.inv_proj);
    let round_trip = frame.proj * inv;
    for (i, col) in round_trip.to_cols_array_2d().iter().enumerate() {
        for (j, value) in col.iter().enumerate() {
            let expected = if i == j { 1.0 } else { 0.0 };
            assert!((value - expected).abs() < 1e-5);
        }
    }
}

#[test]
fn point_light_uniforms_scale_and_translate_the_volume() {
    let uniforms = LightUniforms::point(
        glam::Mat4::IDENTITY,
        Vec3::new(1.0, 2.0, 3.0),
        Vec3::ONE,
        4.0,
    );
    let world = glam::Mat4::from_cols_array_2d(&uniforms.world);
    // The unit cube corner lands at position + size.
    let corner = world.transform_point3(Vec3::ONE);
    assert!((corner - Vec3::new(5.0, 6.0, 7.0)).length() < 1e-5);
    assert_eq!(uniforms.position, [1.0, 2.0, 3.0, 4.0]);
}

#[test]
fn directional_light_uniforms_normalize_and_flag_zero_size() {
    let uniforms = LightUniforms::directional(
        glam::Mat4::IDENTITY,
        Vec3::new(0.0, -2.0, 0.0),
        Vec3::ONE,
    );
    assert_eq!(uniforms.position, [0.0, -1.0, 0.0, 0.0]);
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

/// Reads the target's color pixels back; width must keep rows 256-aligned.
fn read_target_pixels(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    target: &RenderTarget,
) -> Vec<u8> {
    let (width, height) = (target.width(), target.height());
    let bytes_per_row = width * 4;
    assert_eq!(bytes_per_row % wgpu::COPY_BYTES_PER_ROW_ALIGNMENT, 0);

    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Readback Buffer"),
        size: (bytes_per_row * height) as u64,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });
    let mut encoder =
        device.create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });
    encoder.copy_texture_to_buffer(
        target.color.texture.as_image_copy(),
        wgpu::ImageCopyBuffer {
            buffer: &buffer,
            layout: wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(bytes_per_row),
                rows_per_image: Some(height),
            },
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
    queue.submit(Some(encoder.finish()));

    let slice = buffer.slice(..);
    let (sender, receiver) = std::sync::mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        sender.send(result).unwrap();
    });
    device.poll(wgpu::Maintain::Wait);
    receiver.recv().unwrap().unwrap();
    let data = slice.get_mapped_range().to_vec();
    drop(buffer);
    data
}

#[test]
fn render_command_capacity_is_enforced() {
    let Some((device, queue)) = test_device() else {
        eprintln!("skipping: no GPU adapter");
        return;
    };
    let layouts = SharedLayouts::new(&device);
    let material = Arc::new(crate::model::Material::fallback(
        &device,
        &queue,
        &layouts.material,
    ));
    let (vertices, indices) = crate::model::primitives::cube(1.0);
    let mesh = Arc::new(crate::model::Mesh::new(&device, "cube", &vertices, &indices));

    let command = || RenderCommand {
        transform: crate::scene::Transform::new(),
        mesh: mesh.clone(),
        material: material.clone(),
    };
    let mut frame_queue = crate::graphics::FrameQueue::new();
    for _ in 0..MAX_RENDER_COMMANDS {
        frame_queue.add_command(command()).unwrap();
    }
    assert!(frame_queue.add_command(command()).is_err());
    assert_eq!(frame_queue.commands().len(), MAX_RENDER_COMMANDS);
}

#[test]
fn forward_with_no_commands_clears_to_the_clear_color() {
    let Some((device, queue)) = test_device() else {
        eprintln!("skipping: no GPU adapter");
        return;
    };
    let layouts = SharedLayouts::new(&device);
    let mut renderer = ForwardRenderer::new(&device, &layouts);
    let target = RenderTarget::new(&device, 64, 64);
    renderer.resize(&device, 64, 64);

    let frame = test_frame();
    let mut encoder =
        device.create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });
    renderer.render(&device, &queue, &mut encoder, &frame, &target);
    queue.submit(Some(encoder.finish()));

    let pixels = read_target_pixels(&device, &queue, &target);
    for pixel in pixels.chunks_exact(4) {
        assert_eq!(pixel, [255, 0, 255, 255]);
    }
}

#[test]
fn prepass_resize_is_idempotent() {
    let Some((device, _queue)) = test_device() else {
        eprintln!("skipping: no GPU adapter");
        return;
    };
    let layouts = SharedLayouts::new(&device);
    let mut renderer = LightPrepassRenderer::new(&device, &layouts);
    renderer.resize(&device, 320, 240);
    renderer.resize(&device, 320, 240);
    assert_eq!(renderer.target_size(), Some((320, 240)));
    renderer.resize(&device, 64, 64);
    assert_eq!(renderer.target_size(), Some((64, 64)));
}

#[test]
fn prepass_renders_an_empty_frame() {
    let Some((device, queue)) = test_device() else {
        eprintln!("skipping: no GPU adapter");
        return;
    };
    let layouts = SharedLayouts::new(&device);
    let mut renderer = LightPrepassRenderer::new(&device, &layouts);
    let target = RenderTarget::new(&device, 64, 64);
    renderer.resize(&device, 64, 64);

    let frame = test_frame();
    let mut encoder =
        device.create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });
    renderer.render(&device, &queue, &mut encoder, &frame, &target);
    queue.submit(Some(encoder.finish()));
    device.poll(wgpu::Maintain::Wait);
}

#[test]
fn deferred_renders_a_point_light_without_geometry() {
    let Some((device, queue)) = test_device() else {
        eprintln!("skipping: no GPU adapter");
        return;
    };
    let caps = RendererCaps::from_device(&device);
    if !caps.supports_deferred() {
        eprintln!("skipping: deferred unsupported on this adapter");
        return;
    }
    let layouts = SharedLayouts::new(&device);
    let mut renderer =
        DeferredRenderer::new(&device, &layouts, caps.preferred_gbuffer_layout());
    assert_eq!(renderer.gbuffer_layout_kind(), caps.preferred_gbuffer_layout());
    let target = RenderTarget::new(&device, 64, 64);
    renderer.resize(&device, 64, 64);
    renderer.resize(&device, 64, 64);
    assert_eq!(renderer.target_size(), Some((64, 64)));

    let lights = [Light::Point {
        position: Vec3::new(0.0, 0.0, -5.0),
        color: Vec3::ONE,
        size: 4.0,
    }];
    let mut frame = test_frame();
    frame.lights = &lights;

    let mut encoder =
        device.create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });
    renderer.render(&device, &queue, &mut encoder, &frame, &target);
    queue.submit(Some(encoder.finish()));
    device.poll(wgpu::Maintain::Wait);
}
