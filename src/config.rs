use crate::color::Color;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub background: Color,

    pub ambient_sky_color: Color,
    pub ambient_ground_color: Color,
    pub ambient_intensity: f32,

    pub sun_color: Color,
    pub sun_intensity: f32,
    pub sun_position: glam::Vec3,

    // degrees
    pub camera_fov: f32,
    pub camera_near: f32,
    pub camera_far: f32,
    pub camera_position: glam::Vec3,

    pub cube_size: glam::Vec3,
    pub cube_color: Color,
    pub rotation_step: f32,

    pub antialias: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            background: Color::from_hex(0xaaaaaa),
            ambient_sky_color: Color::from_hex(0xffffff),
            ambient_ground_color: Color::from_hex(0xbbbbff),
            ambient_intensity: 0.3,
            sun_color: Color::from_hex(0xffffff),
            sun_intensity: 1.0,
            sun_position: glam::Vec3::new(0.2, 1.0, 1.0),
            camera_fov: 60.0,
            camera_near: 0.1,
            camera_far: 100.0,
            camera_position: glam::Vec3::new(0.0, 0.0, 4.0),
            cube_size: glam::Vec3::ONE,
            cube_color: Color::from_hex(0xff0000),
            rotation_step: 0.01,
            antialias: true,
        }
    }
}
