use wgpu::util::DeviceExt;

use super::Vertex;

/// Picks the narrowest index type able to address every vertex.
pub fn choose_index_format(vertex_count: usize) -> wgpu::IndexFormat {
    if vertex_count <= u16::MAX as usize + 1 {
        wgpu::IndexFormat::Uint16
    } else {
        wgpu::IndexFormat::Uint32
    }
}

/// Immutable GPU mesh: vertex + index buffer pair. Buffers are released when
/// the mesh is dropped.
pub struct Mesh {
    pub name: String,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    index_format: wgpu::IndexFormat,
}

impl Mesh {
    pub fn new(device: &wgpu::Device, name: &str, vertices: &[Vertex], indices: &[u32]) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Vertex Buffer", name)),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let index_format = choose_index_format(vertices.len());
        let index_buffer = match index_format {
            wgpu::IndexFormat::Uint16 => {
                let narrow: Vec<u16> = indices.iter().map(|&i| i as u16).collect();
                device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("{} Index Buffer", name)),
                    contents: bytemuck::cast_slice(&narrow),
                    usage: wgpu::BufferUsages::INDEX,
                })
            }
            wgpu::IndexFormat::Uint32 => {
                device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("{} Index Buffer", name)),
                    contents: bytemuck::cast_slice(indices),
                    usage: wgpu::BufferUsages::INDEX,
                })
            }
        };

        Self {
            name: name.to_string(),
            vertex_buffer,
            index_buffer,
            index_count: indices.len() as u32,
            index_format,
        }
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    pub fn index_format(&self) -> wgpu::IndexFormat {
        self.index_format
    }

    pub fn vertex_buffer_size(&self) -> u64 {
        self.vertex_buffer.size()
    }

    pub fn draw(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        render_pass.set_index_buffer(self.index_buffer.slice(..), self.index_format);
        render_pass.draw_indexed(0..self.index_count, 0, 0..1);
    }
}
