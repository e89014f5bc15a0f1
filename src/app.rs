use crate::camera::PerspectiveCamera;
use crate::config::AppConfig;
use crate::controls::OrbitControls;
use crate::light::{DirectionalLight, HemisphereLight};
use crate::mesh::{Geometry, Mesh, StandardMaterial};
use crate::renderer::RenderBackend;
use crate::scene::{NodeId, Scene};

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    pub pixel_ratio: f64,
}

impl Viewport {
    pub fn new(width: u32, height: u32, pixel_ratio: f64) -> Self {
        Self {
            width,
            height,
            pixel_ratio,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn aspect(&self) -> f32 {
        if self.is_empty() {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }
}

pub struct App<R> {
    pub scene: Scene,
    pub camera: PerspectiveCamera,
    pub controls: OrbitControls,
    pub renderer: R,
    cube: NodeId,
    rotation_step: f32,
    frame_count: u64,
}

impl<R: RenderBackend> App<R> {
    pub fn new(config: AppConfig, viewport: Viewport, mut renderer: R) -> Self {
        let mut scene = Scene::new(config.background);

        scene.add(HemisphereLight::new(
            config.ambient_sky_color,
            config.ambient_ground_color,
            config.ambient_intensity,
        ));
        scene.add(
            DirectionalLight::new(config.sun_color, config.sun_intensity)
                .with_position(config.sun_position),
        );

        let mut camera = PerspectiveCamera::new(
            config.camera_fov,
            viewport.aspect(),
            config.camera_near,
            config.camera_far,
        );
        camera.set_position(config.camera_position);

        renderer.set_pixel_ratio(viewport.pixel_ratio);
        if viewport.is_empty() {
            // The host reports the real size with its first resize.
            log::debug!(
                "Deferring renderer size for empty viewport {}x{}",
                viewport.width,
                viewport.height
            );
        } else {
            renderer.set_size(viewport.width, viewport.height);
        }

        let cube = scene.add(Mesh::new(
            Geometry::Box {
                width: config.cube_size.x,
                height: config.cube_size.y,
                depth: config.cube_size.z,
            },
            StandardMaterial::new(config.cube_color),
        ));

        let controls = OrbitControls::new(&mut camera);

        log::info!(
            "Scene ready: {} nodes, viewport {}x{} @{}",
            scene.len(),
            viewport.width,
            viewport.height,
            viewport.pixel_ratio
        );

        Self {
            scene,
            camera,
            controls,
            renderer,
            cube,
            rotation_step: config.rotation_step,
            frame_count: 0,
        }
    }

    pub fn cube(&self) -> Option<&Mesh> {
        self.scene.mesh(self.cube)
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn on_resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            log::debug!("Ignoring resize to {}x{}", width, height);
            return;
        }
        self.camera.aspect = width as f32 / height as f32;
        self.camera.update_projection_matrix();
        self.renderer.set_size(width, height);
        log::debug!("Viewport resized to {}x{}", width, height);
    }

    pub fn on_frame(&mut self) -> Result<(), R::Error> {
        log::trace!("Frame {}", self.frame_count);
        if let Some(cube) = self.scene.mesh_mut(self.cube) {
            cube.rotate_y(self.rotation_step);
            cube.rotate_x(self.rotation_step);
        }
        self.frame_count += 1;
        self.renderer.render(&self.scene, &self.camera)
    }

    pub fn orbit(&mut self, delta: glam::Vec2) {
        self.controls.orbit(delta, &mut self.camera);
    }

    pub fn pan(&mut self, delta: glam::Vec2) {
        self.controls.pan(delta, &mut self.camera);
    }

    pub fn zoom(&mut self, scroll: f32) {
        self.controls.zoom(scroll, &mut self.camera);
    }
}
