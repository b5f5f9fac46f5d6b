//! Vertex format and box geometry

use strata_core::Vec3;

/// Vertex data for lit meshes
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct Vertex {
    /// Position in local space
    pub position: [f32; 3],
    /// Outward normal
    pub normal: [f32; 3],
}

impl Vertex {
    pub fn new(position: [f32; 3], normal: [f32; 3]) -> Self {
        Self { position, normal }
    }

    /// Vertex buffer layout matching `@location(0)` position, `@location(1)` normal
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
            wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &ATTRIBUTES,
        }
    }
}

/// Indexed triangle list
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Geometry {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl Geometry {
    pub fn from_data(vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }
}

/// Axis-aligned box centered on the origin
pub struct BoxGeometry;

impl BoxGeometry {
    /// Box with flat-shaded faces and counter-clockwise outward winding
    pub fn new(width: f32, height: f32, depth: f32) -> Geometry {
        let (hx, hy, hz) = (width * 0.5, height * 0.5, depth * 0.5);

        // (normal, u, v) with u x v == normal
        let faces = [
            (Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 0.0, -hz), Vec3::new(0.0, hy, 0.0)),
            (Vec3::new(-1.0, 0.0, 0.0), Vec3::new(0.0, 0.0, hz), Vec3::new(0.0, hy, 0.0)),
            (Vec3::new(0.0, 1.0, 0.0), Vec3::new(hx, 0.0, 0.0), Vec3::new(0.0, 0.0, -hz)),
            (Vec3::new(0.0, -1.0, 0.0), Vec3::new(hx, 0.0, 0.0), Vec3::new(0.0, 0.0, hz)),
            (Vec3::new(0.0, 0.0, 1.0), Vec3::new(hx, 0.0, 0.0), Vec3::new(0.0, hy, 0.0)),
            (Vec3::new(0.0, 0.0, -1.0), Vec3::new(-hx, 0.0, 0.0), Vec3::new(0.0, hy, 0.0)),
        ];

        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);
        for (normal, u, v) in faces {
            let center = Vec3::new(normal.x * hx, normal.y * hy, normal.z * hz);
            let base = vertices.len() as u32;
            for corner in [center - u - v, center + u - v, center + u + v, center - u + v] {
                vertices.push(Vertex::new(corner.to_array(), normal.to_array()));
            }
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }

        Geometry::from_data(vertices, indices)
    }
}
