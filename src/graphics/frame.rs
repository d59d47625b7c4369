use anyhow::{bail, Result};

use crate::renderer::{Light, RenderCommand, MAX_LIGHTS, MAX_RENDER_COMMANDS};

/// Per-frame submission lists. Bounded: going past the cap is an error the
/// caller must handle, never a silent overrun.
pub struct FrameQueue {
    commands: Vec<RenderCommand>,
    lights: Vec<Light>,
}

impl FrameQueue {
    pub fn new() -> Self {
        Self {
            commands: Vec::with_capacity(MAX_RENDER_COMMANDS),
            lights: Vec::with_capacity(MAX_LIGHTS),
        }
    }

    pub fn add_command(&mut self, command: RenderCommand) -> Result<()> {
        if self.commands.len() >= MAX_RENDER_COMMANDS {
            bail!("render command capacity exceeded ({MAX_RENDER_COMMANDS})");
        }
        self.commands.push(command);
        Ok(())
    }

    pub fn add_light(&mut self, light: Light) -> Result<()> {
        if self.lights.len() >= MAX_LIGHTS {
            bail!("light capacity exceeded ({MAX_LIGHTS})");
        }
        self.lights.push(light);
        Ok(())
    }

    pub fn commands(&self) -> &[RenderCommand] {
        &self.commands
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    /// Dropped after every frame; commands have no cross-frame identity.
    pub fn clear(&mut self) {
        self.commands.clear();
        self.lights.clear();
    }
}

impl Default for FrameQueue {
    fn default() -> Self {
        Self::new()
    }
}
