pub trait Camera {
    fn view_matrix(&self) -> &glam::Mat4;
    fn proj_matrix(&self) -> &glam::Mat4;

    fn view_proj(&self) -> glam::Mat4 {
        *self.proj_matrix() * *self.view_matrix()
    }

    fn eye(&self) -> glam::Vec3 {
        self.view_matrix().inverse().w_axis.truncate()
    }
}

#[derive(Debug, Clone)]
pub struct PerspectiveCamera {
    // degrees
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    position: glam::Vec3,
    target: glam::Vec3,
    view_matrix: glam::Mat4,
    proj_matrix: glam::Mat4,
}

impl Camera for PerspectiveCamera {
    fn view_matrix(&self) -> &glam::Mat4 {
        &self.view_matrix
    }
    fn proj_matrix(&self) -> &glam::Mat4 {
        &self.proj_matrix
    }
}

impl Default for PerspectiveCamera {
    fn default() -> Self {
        Self::new(50.0, 1.0, 0.1, 2000.0)
    }
}

impl PerspectiveCamera {
    pub fn new(fov: f32, aspect: f32, near: f32, far: f32) -> Self {
        let position = glam::Vec3::ZERO;
        let target = glam::Vec3::NEG_Z;
        let mut cam = Self {
            fov,
            aspect,
            near,
            far,
            position,
            target,
            view_matrix: glam::Mat4::look_at_rh(position, target, glam::Vec3::Y),
            proj_matrix: glam::Mat4::IDENTITY,
        };
        cam.update_projection_matrix();
        cam
    }

    pub fn position(&self) -> glam::Vec3 {
        self.position
    }

    pub fn target(&self) -> glam::Vec3 {
        self.target
    }

    pub fn set_position(&mut self, position: glam::Vec3) {
        let forward = self.target - self.position;
        self.position = position;
        self.target = position + forward;
        self.update_view_matrix();
    }

    pub fn look_at(&mut self, target: glam::Vec3) {
        self.target = target;
        self.update_view_matrix();
    }

    pub fn update_projection_matrix(&mut self) {
        let aspect = if self.aspect.is_finite() && self.aspect > 0.0 {
            self.aspect
        } else {
            log::warn!("Invalid camera aspect {}, using 1.0", self.aspect);
            1.0
        };
        self.proj_matrix =
            glam::Mat4::perspective_rh(self.fov.to_radians(), aspect, self.near, self.far);
    }

    fn update_view_matrix(&mut self) {
        let forward = (self.target - self.position).normalize_or(glam::Vec3::NEG_Z);
        // Looking straight up or down needs a different up hint.
        let up = if forward.cross(glam::Vec3::Y).length_squared() < 1e-8 {
            glam::Vec3::Z
        } else {
            glam::Vec3::Y
        };
        self.view_matrix = glam::Mat4::look_at_rh(self.position, self.position + forward, up);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn projection_follows_aspect_after_update() {
        let mut cam = PerspectiveCamera::new(60.0, 1.0, 0.1, 100.0);
        let before = *cam.proj_matrix();
        cam.aspect = 2.0;
        assert_eq!(*cam.proj_matrix(), before);
        cam.update_projection_matrix();
        let proj = cam.proj_matrix();
        assert!((proj.y_axis.y / proj.x_axis.x - 2.0).abs() < 1e-5);
    }

    #[test]
    fn look_at_origin_from_z() {
        let mut cam = PerspectiveCamera::new(60.0, 1.0, 0.1, 100.0);
        cam.set_position(glam::Vec3::new(0.0, 0.0, 4.0));
        cam.look_at(glam::Vec3::ZERO);

        let origin_in_view = cam.view_matrix().transform_point3(glam::Vec3::ZERO);
        assert!(origin_in_view.abs_diff_eq(glam::Vec3::new(0.0, 0.0, -4.0), 1e-5));
        assert!(cam.eye().abs_diff_eq(glam::Vec3::new(0.0, 0.0, 4.0), 1e-5));
    }

    #[test]
    fn vertical_view_is_finite() {
        let mut cam = PerspectiveCamera::default();
        cam.set_position(glam::Vec3::new(0.0, 5.0, 0.0));
        cam.look_at(glam::Vec3::ZERO);
        assert!(cam.view_matrix().is_finite());
    }

    #[test]
    fn zero_aspect_does_not_poison_projection() {
        let mut cam = PerspectiveCamera::default();
        cam.aspect = 0.0;
        cam.update_projection_matrix();
        assert!(cam.proj_matrix().is_finite());
    }
}
