use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

/// Interleaved quad vertex: clip-space position + color.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct QuadVertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
}

impl QuadVertex {
    const ATTRS: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![
        0 => Float32x3, // position
        1 => Float32x3  // color
    ];

    /// Vertex buffer layout: location 0 = position, location 1 = color.
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<QuadVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

/// Full-screen quad corners, counter-clockwise from the top right.
pub const QUAD_VERTICES: [QuadVertex; 4] = [
    QuadVertex { position: [1.0, 1.0, 0.0], color: [1.0, 1.0, 0.5] },
    QuadVertex { position: [-1.0, 1.0, 0.0], color: [0.5, 1.0, 0.75] },
    QuadVertex { position: [-1.0, -1.0, 0.0], color: [0.6, 1.0, 0.2] },
    QuadVertex { position: [1.0, -1.0, 0.0], color: [1.0, 0.2, 1.0] },
];

/// Two triangles sharing the 0-2 diagonal.
pub const QUAD_INDICES: [u32; 6] = [0, 1, 2, 2, 3, 0];

/// Static quad covering the whole clip-space square.
///
/// Owns its vertex and index buffers; both are released when the mesh is
/// dropped.
pub struct QuadMesh {
    vbo: wgpu::Buffer,
    ibo: wgpu::Buffer,
    index_count: u32,
}

impl QuadMesh {
    pub fn new(device: &wgpu::Device) -> Self {
        let vbo = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("mandel quad vbo"),
            contents: bytemuck::cast_slice(&QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let ibo = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("mandel quad ibo"),
            contents: bytemuck::cast_slice(&QUAD_INDICES),
            usage: wgpu::BufferUsages::INDEX,
        });

        Self {
            vbo,
            ibo,
            index_count: QUAD_INDICES.len() as u32,
        }
    }

    /// Number of indices issued per draw.
    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    /// Binds the quad buffers and issues one indexed draw.
    ///
    /// The pipeline must already be set on `pass`.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_vertex_buffer(0, self.vbo.slice(..));
        pass.set_index_buffer(self.ibo.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..self.index_count, 0, 0..1);
    }
}

impl Drop for QuadMesh {
    fn drop(&mut self) {
        self.vbo.destroy();
        self.ibo.destroy();
        log::debug!("quad mesh buffers released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn xy(i: u32) -> (f32, f32) {
        let p = QUAD_VERTICES[i as usize].position;
        (p[0], p[1])
    }

    fn signed_area(a: (f32, f32), b: (f32, f32), c: (f32, f32)) -> f32 {
        0.5 * ((b.0 - a.0) * (c.1 - a.1) - (c.0 - a.0) * (b.1 - a.1))
    }

    fn inside(p: (f32, f32), tri: [u32; 3]) -> bool {
        let [a, b, c] = tri.map(xy);
        let d0 = signed_area(a, b, p);
        let d1 = signed_area(b, c, p);
        let d2 = signed_area(c, a, p);
        (d0 >= 0.0 && d1 >= 0.0 && d2 >= 0.0) || (d0 <= 0.0 && d1 <= 0.0 && d2 <= 0.0)
    }

    fn triangles() -> Vec<[u32; 3]> {
        QUAD_INDICES.chunks_exact(3).map(|t| [t[0], t[1], t[2]]).collect()
    }

    #[test]
    fn six_indices_two_triangles() {
        assert_eq!(QUAD_INDICES.len(), 6);
        assert_eq!(triangles().len(), 2);
        assert!(QUAD_INDICES.iter().all(|&i| (i as usize) < QUAD_VERTICES.len()));
    }

    #[test]
    fn triangles_share_an_edge() {
        let t = triangles();
        let shared = t[0].iter().filter(|i| t[1].contains(i)).count();
        assert_eq!(shared, 2);
    }

    #[test]
    fn quad_covers_clip_space() {
        let area: f32 = triangles()
            .iter()
            .map(|&[a, b, c]| signed_area(xy(a), xy(b), xy(c)).abs())
            .sum();
        assert!((area - 4.0).abs() < 1e-6);

        for v in QUAD_VERTICES {
            assert_eq!(v.position[0].abs(), 1.0);
            assert_eq!(v.position[1].abs(), 1.0);
        }

        let steps = [-1.0, -0.5, 0.0, 0.25, 0.99, 1.0];
        for &x in &steps {
            for &y in &steps {
                assert!(
                    triangles().iter().any(|&t| inside((x, y), t)),
                    "({x}, {y}) not covered"
                );
            }
        }
    }

    #[test]
    fn both_triangles_wind_the_same_way() {
        let signs: Vec<bool> = triangles()
            .iter()
            .map(|&[a, b, c]| signed_area(xy(a), xy(b), xy(c)) > 0.0)
            .collect();
        assert!(signs.iter().all(|&s| s == signs[0]));
    }

    #[test]
    fn layout_matches_vertex_size() {
        let layout = QuadVertex::layout();
        assert_eq!(layout.array_stride, 24);
        assert_eq!(layout.attributes.len(), 2);
        assert_eq!(layout.attributes[1].offset, 12);
    }
}
