use crate::model::Texture;

/// Offscreen color+depth pair every renderer variant draws into. Sized to
/// the virtual resolution, which may differ from the window.
pub struct RenderTarget {
    pub color: Texture,
    pub depth: Texture,
    width: u32,
    height: u32,
}

impl RenderTarget {
    pub const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

    pub fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let color = Texture::render_target(
            device,
            width,
            height,
            Self::COLOR_FORMAT,
            Some("Offscreen Color Target"),
        );
        let depth = Texture::depth(device, width, height, Some("Offscreen Depth Target"));
        Self {
            color,
            depth,
            width,
            height,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}
