use core::f32;

use crate::camera::PerspectiveCamera;

/// The controls keep the camera on a sphere around the target described by
/// `distance`, `angle_yaw` (about world Y, zero looking down -Z) and
/// `angle_pitch` (elevation). Every input method re-places the camera.
#[derive(Debug)]
pub struct OrbitControls {
    pub target: glam::Vec3,
    pub distance: f32,
    pub angle_yaw: f32,
    pub angle_pitch: f32,
    pub distance_min: f32,
    pub distance_max: f32,
    pub angle_pitch_min: f32,
    pub angle_pitch_max: f32,
    pub mouse_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
}

impl OrbitControls {
    pub fn new(camera: &mut PerspectiveCamera) -> Self {
        Self::with_target(camera, glam::Vec3::ZERO)
    }

    pub fn with_target(camera: &mut PerspectiveCamera, target: glam::Vec3) -> Self {
        use f32::consts::FRAC_PI_2;
        let offset = camera.position() - target;
        let distance = offset.length();
        let (angle_yaw, angle_pitch) = if distance > f32::EPSILON {
            (
                offset.x.atan2(offset.z),
                (offset.y / distance).clamp(-1.0, 1.0).asin(),
            )
        } else {
            (0.0, 0.0)
        };

        let mut controls = Self {
            target,
            distance,
            angle_yaw,
            angle_pitch,
            distance_min: 0.5,
            distance_max: 50.0,
            angle_pitch_min: -FRAC_PI_2 + 0.01,
            angle_pitch_max: FRAC_PI_2 - 0.01,
            mouse_speed: 0.005,
            zoom_speed: 0.5,
            pan_speed: 0.001,
        };
        controls.update(camera);
        controls
    }

    fn offset_direction(&self) -> glam::Vec3 {
        let cos_p = self.angle_pitch.cos();
        glam::Vec3::new(
            cos_p * self.angle_yaw.sin(),
            self.angle_pitch.sin(),
            cos_p * self.angle_yaw.cos(),
        )
    }

    pub fn update(&mut self, camera: &mut PerspectiveCamera) {
        self.distance = f32::clamp(self.distance, self.distance_min, self.distance_max);
        self.angle_pitch = f32::clamp(self.angle_pitch, self.angle_pitch_min, self.angle_pitch_max);

        camera.set_position(self.target + self.offset_direction() * self.distance);
        camera.look_at(self.target);
    }

    pub fn orbit(&mut self, mouse_delta: glam::Vec2, camera: &mut PerspectiveCamera) {
        log::trace!("Mouse Delta: {mouse_delta}");
        self.angle_yaw -= mouse_delta.x * self.mouse_speed;
        self.angle_pitch += mouse_delta.y * self.mouse_speed;
        self.update(camera);
    }

    pub fn zoom(&mut self, mouse_scroll: f32, camera: &mut PerspectiveCamera) {
        log::trace!("Mouse Scroll: {mouse_scroll}");
        if mouse_scroll == 0.0 {
            return;
        }
        self.distance -= mouse_scroll * self.zoom_speed;
        self.update(camera);
    }

    pub fn pan(&mut self, mouse_delta: glam::Vec2, camera: &mut PerspectiveCamera) {
        log::trace!("Mouse Delta: {mouse_delta}");
        let fw = self.offset_direction();
        let rt = glam::Vec3::new(self.angle_yaw.cos(), 0.0, -self.angle_yaw.sin());
        let up = fw.cross(rt).normalize();
        let pan_distance = self.distance * self.pan_speed;
        self.target -= (rt * mouse_delta.x - up * mouse_delta.y) * pan_distance;
        self.update(camera);
    }
}
