use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use winit::window::Window;

pub mod graphics;
pub mod model;
pub mod renderer;
pub mod scene;
pub mod timer;

use graphics::Graphics;
use renderer::RendererKind;
use scene::Scene;
use timer::Timer;

/// Startup options, usually filled from the command line.
#[derive(Debug, Clone, Default)]
pub struct ViewerOptions {
    pub renderer: Option<RendererKind>,
    pub scene_path: Option<PathBuf>,
    /// Render at the real window resolution instead of the pinned one.
    pub window_resolution: bool,
}

pub struct State {
    window: Arc<Window>,
    pub scene: Scene,
    pub graphics: Graphics,
    timer: Timer,
    log_accumulator: f32,
}

impl State {
    pub fn new(window: Window, options: ViewerOptions) -> Result<Self> {
        let window = Arc::new(window);
        let size = window.inner_size();

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("creating surface")?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("no suitable GPU adapter")?;

        let info = adapter.get_info();
        log::info!("adapter: {} ({:?})", info.name, info.backend);

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("Primary Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .context("requesting device")?;
        let device = Arc::new(device);
        let queue = Arc::new(queue);

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .unwrap_or(surface_caps.formats[0]);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: surface_caps.present_modes[0],
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        let graphics = Graphics::new(
            device,
            queue,
            surface,
            config,
            options.renderer,
            !options.window_resolution,
        );

        let scene = match &options.scene_path {
            Some(path) => Scene::from_obj(
                graphics.device(),
                graphics.queue(),
                graphics.layouts(),
                path,
            )
            .with_context(|| format!("loading scene {}", path.display()))?,
            None => Scene::demo(graphics.device(), graphics.queue(), graphics.layouts()),
        };

        Ok(Self {
            window,
            scene,
            graphics,
            timer: Timer::new(),
            log_accumulator: 0.0,
        })
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.graphics.resize(width, height);
    }

    pub fn update(&mut self) {
        let dt = self.timer.delta_time();
        self.scene.update(dt);

        self.log_accumulator += dt;
        if self.log_accumulator > 1.0 {
            log::debug!("running: {:.1}s", self.timer.running_time());
            self.log_accumulator -= 1.0;
        }
    }

    pub fn render(&mut self) -> Result<()> {
        self.graphics.set_view_matrix(self.scene.camera.view_matrix());
        self.scene.queue(&mut self.graphics)?;
        self.graphics.render()
    }

    pub fn cycle_renderers(&mut self) {
        self.graphics.cycle_renderers();
    }

    pub fn toggle_static_size(&mut self) {
        self.graphics.toggle_static_size();
    }
}
