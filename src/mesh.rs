use wgpu::util::DeviceExt;

use super::color::Color;
use super::primitives;
use super::renderer::Instance;

pub const DEFAULT_INSTANCE_CAPACITY: usize = 16;

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    position: glam::Vec3,
    normal: glam::Vec3,
}

impl Vertex {
    const ATTRIBS: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;

        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }
    pub const fn new(position: glam::Vec3, normal: glam::Vec3) -> Self {
        Self { position, normal }
    }
    pub fn position(&self) -> glam::Vec3 {
        self.position
    }
    pub fn normal(&self) -> glam::Vec3 {
        self.normal
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Geometry {
    Box { width: f32, height: f32, depth: f32 },
}

impl Geometry {
    pub fn unit_box() -> Self {
        Geometry::Box {
            width: 1.0,
            height: 1.0,
            depth: 1.0,
        }
    }

    pub fn build(&self) -> (Vec<Vertex>, Vec<u16>) {
        match *self {
            Geometry::Box {
                width,
                height,
                depth,
            } => primitives::box_geometry(width, height, depth),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct StandardMaterial {
    pub color: Color,
}

impl StandardMaterial {
    pub fn new(color: Color) -> Self {
        Self { color }
    }
}

#[derive(Debug, Clone)]
pub struct Mesh {
    pub geometry: Geometry,
    pub material: StandardMaterial,
    pub position: glam::Vec3,
    orientation: glam::Quat,
    accumulated_rotation: glam::DVec3,
}

impl Mesh {
    pub fn new(geometry: Geometry, material: StandardMaterial) -> Self {
        Self {
            geometry,
            material,
            position: glam::Vec3::ZERO,
            orientation: glam::Quat::IDENTITY,
            accumulated_rotation: glam::DVec3::ZERO,
        }
    }

    pub fn orientation(&self) -> glam::Quat {
        self.orientation
    }

    /// Total angle, in radians, applied about each local axis since creation.
    pub fn accumulated_rotation(&self) -> glam::DVec3 {
        self.accumulated_rotation
    }

    /// Rotates about `axis` expressed in the mesh's own (local) frame.
    pub fn rotate_on_axis(&mut self, axis: glam::Vec3, angle: f32) {
        let axis = axis.normalize();
        self.orientation = (self.orientation * glam::Quat::from_axis_angle(axis, angle)).normalize();
        self.accumulated_rotation += axis.as_dvec3() * angle as f64;
    }

    pub fn rotate_x(&mut self, angle: f32) {
        self.rotate_on_axis(glam::Vec3::X, angle);
    }

    pub fn rotate_y(&mut self, angle: f32) {
        self.rotate_on_axis(glam::Vec3::Y, angle);
    }

    pub fn model_matrix(&self) -> glam::Mat4 {
        glam::Mat4::from_rotation_translation(self.orientation, self.position)
    }
}

pub struct GpuMesh {
    pub geometry: Geometry,
    pub index_count: u32,
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub instance_buffer: wgpu::Buffer,
    pub instance_capacity: usize,
}

impl GpuMesh {
    pub fn realloc_instance_buffer(&mut self, device: &wgpu::Device, new_capacity: usize) {
        while self.instance_capacity < new_capacity {
            self.instance_capacity *= 2;
        }
        log::debug!("Growing instance buffer to {}", self.instance_capacity);
        self.instance_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Mesh Instance Buffer"),
            size: (self.instance_capacity * std::mem::size_of::<Instance>()) as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
    }

    pub fn new(device: &wgpu::Device, geometry: Geometry) -> Self {
        let (vertices, indices) = geometry.build();
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Vertex Buffer"),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Index Buffer"),
            contents: bytemuck::cast_slice(&indices),
            usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
        });
        let instance_capacity = DEFAULT_INSTANCE_CAPACITY;
        let instance_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Mesh Instance Buffer"),
            size: (instance_capacity * std::mem::size_of::<Instance>()) as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self {
            geometry,
            index_count: indices.len() as u32,
            vertex_buffer,
            index_buffer,
            instance_buffer,
            instance_capacity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn red_cube() -> Mesh {
        Mesh::new(
            Geometry::unit_box(),
            StandardMaterial::new(Color::from_hex(0xff0000)),
        )
    }

    #[test]
    fn rotations_accumulate_per_axis() {
        let mut mesh = red_cube();
        for _ in 0..10 {
            mesh.rotate_y(0.01);
            mesh.rotate_x(0.01);
        }
        let total = mesh.accumulated_rotation();
        assert!((total.y - 0.1).abs() < 1e-6);
        assert!((total.x - 0.1).abs() < 1e-6);
        assert_eq!(total.z, 0.0);
    }

    #[test]
    fn rotation_is_local() {
        // A quarter turn about Y maps local X onto world -Z, so a following
        // local X rotation must spin about world -Z, not world X.
        let mut mesh = red_cube();
        mesh.rotate_y(std::f32::consts::FRAC_PI_2);
        mesh.rotate_x(std::f32::consts::FRAC_PI_2);
        let up = mesh.orientation() * glam::Vec3::Y;
        assert!(up.abs_diff_eq(glam::Vec3::X, 1e-5), "{up}");
    }

    #[test]
    fn model_matrix_carries_translation() {
        let mut mesh = red_cube();
        mesh.position = glam::Vec3::new(1.0, 2.0, 3.0);
        let m = mesh.model_matrix();
        assert_eq!(m.w_axis.truncate(), mesh.position);
    }
}
