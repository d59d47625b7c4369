use super::{PositionVertex, Vertex};

/// Unit cube corners for light-volume proxies, wound counter-clockwise
/// viewed from outside. Scaled/translated per light at draw time.
pub const VOLUME_CUBE_VERTICES: [PositionVertex; 8] = [
    PositionVertex { position: [-1.0, -1.0, -1.0] }, // 0
    PositionVertex { position: [1.0, -1.0, -1.0] },  // 1
    PositionVertex { position: [1.0, 1.0, -1.0] },   // 2
    PositionVertex { position: [-1.0, 1.0, -1.0] },  // 3
    PositionVertex { position: [-1.0, -1.0, 1.0] },  // 4
    PositionVertex { position: [1.0, -1.0, 1.0] },   // 5
    PositionVertex { position: [1.0, 1.0, 1.0] },    // 6
    PositionVertex { position: [-1.0, 1.0, 1.0] },   // 7
];

pub const VOLUME_CUBE_INDICES: [u16; 36] = [
    4, 5, 6, 4, 6, 7, // +z
    1, 0, 3, 1, 3, 2, // -z
    5, 1, 2, 5, 2, 6, // +x
    0, 4, 7, 0, 7, 3, // -x
    3, 7, 6, 3, 6, 2, // +y
    0, 1, 5, 0, 5, 4, // -y
];

/// Full-vertex cube: 24 vertices (4 per face, unshared so per-face normals
/// and tangents stay crisp), 36 indices.
pub fn cube(half_extent: f32) -> (Vec<Vertex>, Vec<u32>) {
    // (normal, tangent) per face; bitangent = normal x tangent.
    const FACES: [([f32; 3], [f32; 3]); 6] = [
        ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0]),
        ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0]),
        ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
        ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
        ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0]),
        ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0]),
    ];

    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);
    for (face, (normal, tangent)) in FACES.iter().enumerate() {
        let bitangent = cross(*normal, *tangent);
        let base = (face * 4) as u32;
        let corners = [
            (-1.0f32, -1.0f32, [0.0f32, 0.0f32]),
            (1.0, -1.0, [1.0, 0.0]),
            (1.0, 1.0, [1.0, 1.0]),
            (-1.0, 1.0, [0.0, 1.0]),
        ];
        for (u, v, texcoord) in corners {
            let position = [
                (normal[0] + tangent[0] * u + bitangent[0] * v) * half_extent,
                (normal[1] + tangent[1] * u + bitangent[1] * v) * half_extent,
                (normal[2] + tangent[2] * u + bitangent[2] * v) * half_extent,
            ];
            vertices.push(Vertex {
                position,
                normal: *normal,
                tangent: *tangent,
                bitangent,
                texcoord,
            });
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
    (vertices, indices)
}

/// Ground plane at y = 0 facing +y, `uv_repeat` texture tiles across it.
pub fn plane(extent: f32, uv_repeat: f32) -> (Vec<Vertex>, Vec<u32>) {
    let normal = [0.0, 1.0, 0.0];
    let tangent = [1.0, 0.0, 0.0];
    let bitangent = cross(normal, tangent);
    let vertices = vec![
        Vertex {
            position: [-extent, 0.0, -extent],
            normal,
            tangent,
            bitangent,
            texcoord: [0.0, 0.0],
        },
        Vertex {
            position: [extent, 0.0, -extent],
            normal,
            tangent,
            bitangent,
            texcoord: [uv_repeat, 0.0],
        },
        Vertex {
            position: [extent, 0.0, extent],
            normal,
            tangent,
            bitangent,
            texcoord: [uv_repeat, uv_repeat],
        },
        Vertex {
            position: [-extent, 0.0, extent],
            normal,
            tangent,
            bitangent,
            texcoord: [0.0, uv_repeat],
        },
    ];
    let indices = vec![0, 2, 1, 0, 3, 2];
    (vertices, indices)
}

/// RGBA8 checkerboard pixels for the demo floor.
pub fn checkerboard(size: u32, squares_per_side: u32) -> Vec<u8> {
    let square_size = (size / squares_per_side).max(1);
    let mut data = Vec::with_capacity((size * size * 4) as usize);
    for y in 0..size {
        for x in 0..size {
            let is_light = ((x / square_size) + (y / square_size)) % 2 == 0;
            let color = if is_light {
                [200u8, 200, 200, 255]
            } else {
                [120u8, 120, 120, 255]
            };
            data.extend_from_slice(&color);
        }
    }
    data
}

fn cross(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}
