use super::color::Color;
use super::mesh::{Geometry, Mesh};
use super::renderer::Instance;

#[derive(Debug, Clone)]
pub struct DrawCommand {
    pub geometry: Geometry,
    pub instance: Instance,
}

impl DrawCommand {
    pub fn from_mesh(mesh: &Mesh) -> Self {
        DrawCommandBuilder::new(mesh.geometry)
            .with_position(mesh.position)
            .with_rotation(mesh.orientation())
            .with_color(mesh.material.color)
            .build()
    }
}

pub struct DrawCommandBuilder {
    pub geometry: Geometry,
    pub position: glam::Vec3,
    pub rotation: glam::Quat,
    pub color: Color,
}

impl DrawCommandBuilder {
    pub fn new(geometry: Geometry) -> Self {
        Self {
            geometry,
            position: glam::Vec3::default(),
            rotation: glam::Quat::IDENTITY,
            color: Color::WHITE,
        }
    }

    pub fn with_position(self, position: glam::Vec3) -> Self {
        Self { position, ..self }
    }

    pub fn with_rotation(self, rotation: glam::Quat) -> Self {
        Self { rotation, ..self }
    }

    pub fn with_color(self, color: Color) -> Self {
        Self { color, ..self }
    }

    pub fn build(self) -> DrawCommand {
        let DrawCommandBuilder {
            geometry,
            position,
            rotation,
            color,
        } = self;

        let model_matrix = glam::Mat4::from_rotation_translation(rotation, position);

        DrawCommand {
            geometry,
            instance: Instance {
                model_matrix,
                color: color.to_linear().extend(1.0),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::StandardMaterial;

    #[test]
    fn mesh_command_matches_model_matrix() {
        let mut mesh = Mesh::new(
            Geometry::unit_box(),
            StandardMaterial::new(Color::from_hex(0xff0000)),
        );
        mesh.rotate_y(0.3);
        mesh.rotate_x(0.2);

        let cmd = DrawCommand::from_mesh(&mesh);
        assert_eq!(cmd.geometry, Geometry::unit_box());
        assert!(
            cmd.instance
                .model_matrix
                .abs_diff_eq(mesh.model_matrix(), 1e-6)
        );
        assert!(
            cmd.instance
                .color
                .abs_diff_eq(glam::Vec4::new(1.0, 0.0, 0.0, 1.0), 1e-6)
        );
    }

    #[test]
    fn builder_defaults_to_white_at_origin() {
        let cmd = DrawCommandBuilder::new(Geometry::unit_box())
            .with_position(glam::Vec3::X)
            .build();
        let p = cmd.instance.model_matrix.transform_point3(glam::Vec3::ONE);
        assert_eq!(p, glam::Vec3::new(2.0, 1.0, 1.0));
        assert!(cmd.instance.color.abs_diff_eq(glam::Vec4::ONE, 1e-6));
    }
}
