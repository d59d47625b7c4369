mod frame;
mod fullscreen;
mod target;

pub use frame::FrameQueue;
pub use target::RenderTarget;

use std::sync::Arc;

use anyhow::{Context, Result};
use glam::Mat4;

use crate::renderer::{
    DeferredRenderer, ForwardRenderer, Frame, Light, LightPrepassRenderer, RenderCommand,
    Renderer, RendererCaps, RendererKind, SharedLayouts,
};
use fullscreen::FullscreenPass;

/// Virtual render resolution used while static-size mode is on.
pub const STATIC_WIDTH: u32 = 1280;
pub const STATIC_HEIGHT: u32 = 720;

const FOV_Y: f32 = std::f32::consts::FRAC_PI_2;
const Z_NEAR: f32 = 1.0;
const Z_FAR: f32 = 100.0;

/// Owns the renderers, the offscreen target and the per-frame submission
/// lists; composites the active renderer's output to the surface each frame.
pub struct Graphics {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    surface: wgpu::Surface<'static>,
    config: wgpu::SurfaceConfiguration,
    caps: RendererCaps,
    layouts: SharedLayouts,

    forward: ForwardRenderer,
    light_prepass: LightPrepassRenderer,
    deferred: Option<DeferredRenderer>,
    active: RendererKind,

    target: RenderTarget,
    fullscreen: FullscreenPass,
    frame_queue: FrameQueue,

    proj: Mat4,
    view: Mat4,
    pub clear_color: wgpu::Color,

    // Virtual (render) size vs real (window) size; distinct on purpose.
    width: u32,
    height: u32,
    real_width: u32,
    real_height: u32,
    static_size: bool,
}

impl Graphics {
    pub fn new(
        device: Arc<wgpu::Device>,
        queue: Arc<wgpu::Queue>,
        surface: wgpu::Surface<'static>,
        config: wgpu::SurfaceConfiguration,
        requested: Option<RendererKind>,
        static_size: bool,
    ) -> Self {
        let caps = RendererCaps::from_device(&device);
        let layouts = SharedLayouts::new(&device);

        let forward = ForwardRenderer::new(&device, &layouts);
        let light_prepass = LightPrepassRenderer::new(&device, &layouts);
        let deferred = if caps.supports_deferred() {
            Some(DeferredRenderer::new(
                &device,
                &layouts,
                caps.preferred_gbuffer_layout(),
            ))
        } else {
            None
        };
        let active = RendererKind::select(requested, &caps);
        log::info!("renderer: {} (deferred supported: {})", active, deferred.is_some());

        let target = RenderTarget::new(&device, config.width.max(1), config.height.max(1));
        let mut fullscreen = FullscreenPass::new(&device, config.format);
        fullscreen.rebind(&device, &target);

        let mut graphics = Self {
            device,
            queue,
            surface,
            config: config.clone(),
            caps,
            layouts,
            forward,
            light_prepass,
            deferred,
            active,
            target,
            fullscreen,
            frame_queue: FrameQueue::new(),
            proj: Mat4::IDENTITY,
            view: Mat4::IDENTITY,
            clear_color: wgpu::Color {
                r: 1.0,
                g: 0.0,
                b: 1.0,
                a: 1.0,
            },
            width: 0,
            height: 0,
            real_width: 0,
            real_height: 0,
            static_size,
        };
        graphics.resize(config.width, config.height);
        graphics
    }

    pub fn device(&self) -> &Arc<wgpu::Device> {
        &self.device
    }

    pub fn queue(&self) -> &Arc<wgpu::Queue> {
        &self.queue
    }

    pub fn layouts(&self) -> &SharedLayouts {
        &self.layouts
    }

    pub fn caps(&self) -> RendererCaps {
        self.caps
    }

    /// Virtual render resolution (the offscreen target size).
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn real_size(&self) -> (u32, u32) {
        (self.real_width, self.real_height)
    }

    pub fn static_size(&self) -> bool {
        self.static_size
    }

    pub fn renderer_type(&self) -> RendererKind {
        self.active
    }

    pub fn cycle_renderers(&mut self) {
        self.active = self.active.next(&self.caps);
        log::info!("renderer: {}", self.active);
    }

    pub fn toggle_static_size(&mut self) {
        self.static_size = !self.static_size;
        self.resize(self.real_width, self.real_height);
    }

    pub fn set_view_matrix(&mut self, view: Mat4) {
        self.view = view;
    }

    pub fn add_render_command(&mut self, command: RenderCommand) -> Result<()> {
        self.frame_queue.add_command(command)
    }

    pub fn add_light(&mut self, light: Light) -> Result<()> {
        self.frame_queue.add_light(light)
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.real_width = width;
        self.real_height = height;
        if self.static_size {
            self.width = STATIC_WIDTH;
            self.height = STATIC_HEIGHT;
        } else {
            self.width = width;
            self.height = height;
        }

        // Aspect follows the real window even when rendering at the pinned
        // virtual resolution.
        self.proj = Mat4::perspective_rh(FOV_Y, width as f32 / height as f32, Z_NEAR, Z_FAR);

        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);

        self.target = RenderTarget::new(&self.device, self.width, self.height);
        self.fullscreen.rebind(&self.device, &self.target);

        self.forward.resize(&self.device, self.width, self.height);
        self.light_prepass.resize(&self.device, self.width, self.height);
        if let Some(deferred) = &mut self.deferred {
            deferred.resize(&self.device, self.width, self.height);
        }

        log::info!("graphics resized: {}x{} (render {}x{})", width, height, self.width, self.height);
    }

    pub fn render(&mut self) -> Result<()> {
        let surface_texture = self
            .surface
            .get_current_texture()
            .context("acquiring surface texture")?;
        let surface_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Graphics Encoder"),
            });

        {
            let frame = Frame {
                proj: self.proj,
                view: self.view,
                near: Z_NEAR,
                far: Z_FAR,
                clear_color: self.clear_color,
                commands: self.frame_queue.commands(),
                lights: self.frame_queue.lights(),
            };
            let renderer: &mut dyn Renderer = match self.active {
                RendererKind::Forward => &mut self.forward,
                RendererKind::LightPrePass => &mut self.light_prepass,
                RendererKind::Deferred => match self.deferred.as_mut() {
                    Some(deferred) => deferred,
                    // Capability fallback; cycle_renderers never lands here
                    // but a forced request can.
                    None => &mut self.light_prepass,
                },
            };
            renderer.render(&self.device, &self.queue, &mut encoder, &frame, &self.target);
        }
        self.frame_queue.clear();

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Composite Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &surface_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            self.fullscreen.draw(&mut render_pass);
        }

        self.queue.submit(Some(encoder.finish()));
        surface_texture.present();
        Ok(())
    }
}
