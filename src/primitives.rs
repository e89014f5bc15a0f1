use super::mesh::Vertex;

/// Outward normal and the in-plane (u, v) axes of each box face, chosen so
/// that `u × v = normal` and the faces wind counter-clockwise from outside.
#[rustfmt::skip]
const BOX_FACES: [[glam::Vec3; 3]; 6] = [
    // Right
    [glam::Vec3::X, glam::Vec3::NEG_Z, glam::Vec3::Y],
    // Left
    [glam::Vec3::NEG_X, glam::Vec3::Z, glam::Vec3::Y],
    // Top
    [glam::Vec3::Y, glam::Vec3::X, glam::Vec3::NEG_Z],
    // Bottom
    [glam::Vec3::NEG_Y, glam::Vec3::X, glam::Vec3::Z],
    // Front
    [glam::Vec3::Z, glam::Vec3::X, glam::Vec3::Y],
    // Back
    [glam::Vec3::NEG_Z, glam::Vec3::NEG_X, glam::Vec3::Y],
];

#[rustfmt::skip]
const FACE_INDICES: [u16; 6] = [
    0, 1, 2,
    0, 2, 3,
];

pub fn box_geometry(width: f32, height: f32, depth: f32) -> (Vec<Vertex>, Vec<u16>) {
    let half = glam::Vec3::new(width, height, depth) * 0.5;
    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);

    for [normal, u, v] in BOX_FACES {
        let base = vertices.len() as u16;
        for (su, sv) in [(-1.0f32, -1.0f32), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
            let corner = (normal + u * su + v * sv) * half;
            vertices.push(Vertex::new(corner, normal));
        }
        indices.extend(FACE_INDICES.iter().map(|i| base + i));
    }

    (vertices, indices)
}
