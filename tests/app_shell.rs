use spinning_cube::camera::{Camera, PerspectiveCamera};
use spinning_cube::renderer::RenderBackend;
use spinning_cube::scene::{Node, Scene};
use spinning_cube::{App, AppConfig, Viewport};

#[derive(Debug, Default)]
struct RecordingRenderer {
    pixel_ratio: f64,
    size: glam::UVec2,
    set_size_calls: usize,
    frames: Vec<Frame>,
    fail_next: bool,
}

#[derive(Debug)]
struct Frame {
    aspect: f32,
    view_proj: glam::Mat4,
    cube_rotation: glam::DVec3,
}

impl RenderBackend for RecordingRenderer {
    type Error = &'static str;

    fn set_pixel_ratio(&mut self, pixel_ratio: f64) {
        self.pixel_ratio = pixel_ratio;
    }

    fn pixel_ratio(&self) -> f64 {
        self.pixel_ratio
    }

    fn set_size(&mut self, width: u32, height: u32) {
        self.set_size_calls += 1;
        self.size = glam::UVec2::new(width, height);
    }

    fn size(&self) -> glam::UVec2 {
        self.size
    }

    fn render(&mut self, scene: &Scene, camera: &impl Camera) -> Result<(), Self::Error> {
        let proj = camera.proj_matrix();
        self.frames.push(Frame {
            aspect: proj.y_axis.y / proj.x_axis.x,
            view_proj: camera.view_proj(),
            cube_rotation: scene
                .meshes()
                .next()
                .map(|mesh| mesh.accumulated_rotation())
                .unwrap_or_default(),
        });
        if self.fail_next {
            self.fail_next = false;
            return Err("surface lost");
        }
        Ok(())
    }
}

fn build(width: u32, height: u32) -> App<RecordingRenderer> {
    App::new(
        AppConfig::default(),
        Viewport::new(width, height, 2.0),
        RecordingRenderer::default(),
    )
}

fn projected_aspect(camera: &PerspectiveCamera) -> f32 {
    let proj = camera.proj_matrix();
    proj.y_axis.y / proj.x_axis.x
}

#[test]
fn construct_builds_two_lights_and_one_mesh() {
    let app = build(800, 600);

    assert_eq!(app.scene.len(), 3);
    assert_eq!(app.scene.hemisphere_lights().count(), 1);
    assert_eq!(app.scene.directional_lights().count(), 1);
    assert_eq!(app.scene.meshes().count(), 1);
    assert!(matches!(app.scene.children()[2], Node::Mesh(_)));
}

#[test]
fn construct_uses_demo_parameters() {
    let app = build(800, 600);

    let ambient = app.scene.hemisphere_lights().next().unwrap();
    assert_eq!(ambient.intensity, 0.3);
    let sun = app.scene.directional_lights().next().unwrap();
    assert_eq!(sun.position, glam::Vec3::new(0.2, 1.0, 1.0));
    assert_eq!(app.camera.fov, 60.0);
    assert_eq!(app.camera.near, 0.1);
    assert_eq!(app.camera.far, 100.0);
    assert!(
        app.camera
            .position()
            .abs_diff_eq(glam::Vec3::new(0.0, 0.0, 4.0), 1e-5)
    );
    let cube = app.cube().unwrap();
    assert_eq!(cube.material.color, spinning_cube::color::Color::from_hex(0xff0000));
    assert_eq!(cube.accumulated_rotation(), glam::DVec3::ZERO);
}

#[test]
fn construct_sets_aspect_and_renderer_size() {
    let app = build(1280, 720);

    assert_eq!(app.camera.aspect, 1280.0 / 720.0);
    assert!((projected_aspect(&app.camera) - 1280.0 / 720.0).abs() < 1e-4);
    assert_eq!(app.renderer.size(), glam::UVec2::new(1280, 720));
    assert_eq!(app.renderer.pixel_ratio(), 2.0);
    assert!(app.renderer.frames.is_empty());
}

#[test]
fn resize_updates_aspect_and_size() {
    let mut app = build(800, 600);

    for (w, h) in [(1024, 768), (300, 900), (1, 1), (3840, 2160)] {
        app.on_resize(w, h);
        let expected = w as f32 / h as f32;
        assert_eq!(app.camera.aspect, expected);
        assert!((projected_aspect(&app.camera) - expected).abs() < 1e-4 * expected);
        assert_eq!(app.renderer.size(), glam::UVec2::new(w, h));
    }
}

#[test]
fn resize_is_idempotent() {
    let mut app = build(800, 600);

    app.on_resize(640, 480);
    let aspect = app.camera.aspect;
    let proj = *app.camera.proj_matrix();
    let size = app.renderer.size();

    app.on_resize(640, 480);
    assert_eq!(app.camera.aspect, aspect);
    assert_eq!(*app.camera.proj_matrix(), proj);
    assert_eq!(app.renderer.size(), size);
}

#[test]
fn resize_to_empty_viewport_is_ignored() {
    let mut app = build(800, 600);
    let calls = app.renderer.set_size_calls;

    app.on_resize(0, 600);
    app.on_resize(800, 0);
    assert_eq!(app.camera.aspect, 800.0 / 600.0);
    assert_eq!(app.renderer.size(), glam::UVec2::new(800, 600));
    assert_eq!(app.renderer.set_size_calls, calls);
}

#[test]
fn construct_with_empty_viewport_defers_sizing() {
    let mut app = App::new(
        AppConfig::default(),
        Viewport::new(0, 0, 1.0),
        RecordingRenderer::default(),
    );

    assert_eq!(app.camera.aspect, 1.0);
    assert!(app.camera.proj_matrix().is_finite());
    assert_eq!(app.renderer.set_size_calls, 0);
    assert_eq!(app.renderer.size(), glam::UVec2::ZERO);

    app.on_resize(800, 600);
    assert_eq!(app.camera.aspect, 800.0 / 600.0);
    assert_eq!(app.renderer.size(), glam::UVec2::new(800, 600));
}

#[test]
fn construct_with_zero_height_keeps_finite_aspect() {
    let app = App::new(
        AppConfig::default(),
        Viewport::new(800, 0, 2.0),
        RecordingRenderer::default(),
    );

    assert_eq!(app.camera.aspect, 1.0);
    assert_eq!(app.renderer.set_size_calls, 0);
    assert_eq!(app.renderer.pixel_ratio(), 2.0);
}

#[test]
fn frames_advance_rotation_monotonically() {
    let mut app = build(800, 600);
    let step = AppConfig::default().rotation_step as f64;

    for n in 1..=1000u64 {
        app.on_frame().unwrap();
        let rotation = app.cube().unwrap().accumulated_rotation();
        let expected = n as f64 * step;
        assert!((rotation.y - expected).abs() < 1e-6, "frame {n}: {rotation}");
        assert!((rotation.x - expected).abs() < 1e-6, "frame {n}: {rotation}");
        assert_eq!(rotation.z, 0.0);
    }
    assert_eq!(app.frame_count(), 1000);
}

#[test]
fn each_frame_rotates_once_then_renders_once() {
    let mut app = build(800, 600);
    let step = AppConfig::default().rotation_step as f64;

    for n in 1..=5usize {
        app.on_frame().unwrap();
        assert_eq!(app.renderer.frames.len(), n);
        // The submitted scene already contains this frame's step.
        let submitted = app.renderer.frames[n - 1].cube_rotation;
        assert!((submitted.y - n as f64 * step).abs() < 1e-9);
    }
}

#[test]
fn frame_step_survives_render_failure() {
    let mut app = build(800, 600);
    app.renderer.fail_next = true;

    assert_eq!(app.on_frame(), Err("surface lost"));
    assert_eq!(app.renderer.frames.len(), 1);
    assert!(app.cube().unwrap().accumulated_rotation().y > 0.0);

    app.on_frame().unwrap();
    assert_eq!(app.renderer.frames.len(), 2);
}

#[test]
fn rendered_frames_use_current_aspect() {
    let mut app = build(800, 600);
    app.on_frame().unwrap();
    app.on_resize(600, 800);
    app.on_frame().unwrap();

    assert!((app.renderer.frames[0].aspect - 800.0 / 600.0).abs() < 1e-4);
    assert!((app.renderer.frames[1].aspect - 600.0 / 800.0).abs() < 1e-4);
}

#[test]
fn orbit_input_changes_rendered_view() {
    let mut app = build(800, 600);
    app.on_frame().unwrap();
    app.orbit(glam::vec2(50.0, 10.0));
    app.on_frame().unwrap();

    let frames = &app.renderer.frames;
    assert!(!frames[0].view_proj.abs_diff_eq(frames[1].view_proj, 1e-4));
    assert!((app.camera.position().length() - 4.0).abs() < 1e-4);
}
