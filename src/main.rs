use clap::{Parser, ValueEnum};
use winit::{
    event::*,
    keyboard::{KeyCode, PhysicalKey},
    window::WindowBuilder,
};

use wgpu_deferred_viewer::{renderer::RendererKind, State, ViewerOptions};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum RendererArg {
    Forward,
    Prepass,
    Deferred,
}

impl From<RendererArg> for RendererKind {
    fn from(arg: RendererArg) -> Self {
        match arg {
            RendererArg::Forward => RendererKind::Forward,
            RendererArg::Prepass => RendererKind::LightPrePass,
            RendererArg::Deferred => RendererKind::Deferred,
        }
    }
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Initial renderer (Tab cycles at runtime; deferred falls back when
    /// unsupported)
    #[arg(long, value_enum)]
    renderer: Option<RendererArg>,

    /// OBJ scene to load instead of the built-in demo scene
    #[arg(long)]
    scene: Option<std::path::PathBuf>,

    /// Render at the window resolution instead of the fixed 1280x720
    #[arg(long)]
    window_resolution: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let options = ViewerOptions {
        renderer: args.renderer.map(RendererKind::from),
        scene_path: args.scene,
        window_resolution: args.window_resolution,
    };

    let event_loop = winit::event_loop::EventLoop::new().expect("Failed to create event loop");

    let window = WindowBuilder::new()
        .with_title("Deferred Viewer")
        .with_visible(true)
        .build(&event_loop)?;

    let mut state = State::new(window, options)?;
    let mut mouse_captured = false;

    event_loop.run(move |event, window_target| {
        match event {
            Event::WindowEvent { window_id, event } if window_id == state.window().id() => {
                match event {
                    WindowEvent::KeyboardInput {
                        event:
                            KeyEvent {
                                physical_key: PhysicalKey::Code(key_code),
                                state: key_state,
                                ..
                            },
                        ..
                    } => {
                        let pressed = key_state == ElementState::Pressed;
                        match key_code {
                            KeyCode::Escape => {
                                if pressed {
                                    mouse_captured = false;
                                    let _ = state
                                        .window()
                                        .set_cursor_grab(winit::window::CursorGrabMode::None);
                                    state.window().set_cursor_visible(true);
                                }
                            }
                            KeyCode::Tab => {
                                if pressed {
                                    state.cycle_renderers();
                                }
                            }
                            KeyCode::KeyF => {
                                if pressed {
                                    state.toggle_static_size();
                                }
                            }
                            _ => state.scene.camera.process_keyboard(key_code, pressed),
                        }
                    }
                    WindowEvent::MouseInput {
                        state: ElementState::Pressed,
                        button: MouseButton::Left,
                        ..
                    } => {
                        mouse_captured = true;
                        let _ = state
                            .window()
                            .set_cursor_grab(winit::window::CursorGrabMode::Confined)
                            .or_else(|_| {
                                state
                                    .window()
                                    .set_cursor_grab(winit::window::CursorGrabMode::Locked)
                            });
                        state.window().set_cursor_visible(false);
                    }
                    WindowEvent::CloseRequested => {
                        window_target.exit();
                    }
                    WindowEvent::Resized(new_size) => {
                        if new_size.width > 0 && new_size.height > 0 {
                            state.resize(new_size.width, new_size.height);
                        }
                    }
                    WindowEvent::RedrawRequested => {
                        if let Err(e) = state.render() {
                            log::error!("render error: {e:#}");
                        }
                    }
                    _ => {}
                }
            }
            Event::DeviceEvent {
                event: DeviceEvent::MouseMotion { delta },
                ..
            } if mouse_captured => {
                state
                    .scene
                    .camera
                    .process_mouse(delta.0 as f32, delta.1 as f32);
            }
            Event::AboutToWait => {
                state.update();
                state.window().request_redraw();
            }
            _ => {}
        }
    })?;

    Ok(())
}
