use std::collections::BTreeMap;
use std::sync::Arc;

use winit::{
    application::ApplicationHandler,
    dpi::{PhysicalPosition, PhysicalSize},
    event::*,
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::Window,
};

use crate::app::{App, Viewport};
use crate::config::AppConfig;
use crate::renderer::{RenderBackend, Renderer, RendererOptions};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

const PIXELS_PER_LINE: f32 = 50.0;

impl Renderer {
    pub async fn from_winit_window(
        window: Arc<Window>,
        options: RendererOptions,
    ) -> anyhow::Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            #[cfg(not(target_arch = "wasm32"))]
            backends: wgpu::Backends::PRIMARY,
            #[cfg(target_arch = "wasm32")]
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(window)?;
        log::debug!("Winit surface created.");
        Self::new_with_surface(surface, &instance, options).await
    }
}

pub fn viewport_of(window: &Window) -> Viewport {
    logical_viewport(window.inner_size(), window.scale_factor())
}

fn logical_viewport(size: PhysicalSize<u32>, scale_factor: f64) -> Viewport {
    let logical = size.to_logical::<f64>(scale_factor);
    Viewport::new(
        logical.width.round() as u32,
        logical.height.round() as u32,
        scale_factor,
    )
}

fn pinch_zoom(anchor: glam::Vec2, previous: glam::Vec2, moved: glam::Vec2) -> f32 {
    (anchor.distance(moved) - anchor.distance(previous)) / PIXELS_PER_LINE
}

#[derive(Debug, Default)]
pub struct MouseState {
    pub button_left: bool,
    pub button_right: bool,
    pub position: glam::Vec2,
    pub position_needs_update: bool,
    pub touches: BTreeMap<u64, PhysicalPosition<f64>>,
}

pub struct State {
    window: Arc<Window>,
    pub app: App<Renderer>,
    pub mouse_state: MouseState,
}

impl State {
    pub async fn new(window: Arc<Window>, config: AppConfig) -> anyhow::Result<Self> {
        let options = RendererOptions {
            antialias: config.antialias,
        };
        let renderer = Renderer::from_winit_window(window.clone(), options).await?;
        let app = App::new(config, viewport_of(&window), renderer);

        Ok(Self {
            window,
            app,
            mouse_state: MouseState::default(),
        })
    }

    pub fn resize(&mut self, size: PhysicalSize<u32>) {
        let viewport = logical_viewport(size, self.window.scale_factor());
        self.app.on_resize(viewport.width, viewport.height);
    }

    pub fn render(&mut self, event_loop: &ActiveEventLoop) {
        match self.app.on_frame() {
            Ok(_) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::debug!("Surface lost, reconfiguring");
                self.app.renderer.configure();
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("Out of GPU memory");
                event_loop.exit();
            }
            Err(e) => {
                log::error!("Unable to render {}", e);
            }
        }
        self.window.request_redraw();
    }

    pub fn handle_key(&self, event_loop: &ActiveEventLoop, code: KeyCode, is_pressed: bool) {
        if let (KeyCode::Escape, true) = (code, is_pressed) {
            event_loop.exit()
        }
    }

    fn handle_cursor(&mut self, position: PhysicalPosition<f64>) {
        let current = glam::vec2(position.x as f32, position.y as f32);
        if self.mouse_state.position_needs_update {
            self.mouse_state.position = current;
            self.mouse_state.position_needs_update = false;
            return;
        }
        let mouse_delta = current - self.mouse_state.position;
        if self.mouse_state.button_left {
            self.app.orbit(mouse_delta);
        }
        if self.mouse_state.button_right {
            self.app.pan(mouse_delta);
        }
        self.mouse_state.position = current;
    }

    fn handle_touch(&mut self, id: u64, location: PhysicalPosition<f64>, phase: TouchPhase) {
        let current = glam::vec2(location.x as f32, location.y as f32);
        match phase {
            TouchPhase::Started => {
                if self.mouse_state.touches.insert(id, location).is_none()
                    && self.mouse_state.touches.len() == 1
                {
                    self.mouse_state.position = current;
                }
            }
            TouchPhase::Moved => {
                let Some(prev_pos) = self.mouse_state.touches.insert(id, location) else {
                    return;
                };
                let previous = glam::vec2(prev_pos.x as f32, prev_pos.y as f32);
                let primary_touch = self.mouse_state.touches.keys().next().copied();
                match self.mouse_state.touches.len() {
                    1 => self.app.orbit(current - previous),
                    2 => {
                        // 2-finger pinch zoom
                        let other = self
                            .mouse_state
                            .touches
                            .iter()
                            .find(|(oid, _)| **oid != id)
                            .map(|(_, pos)| glam::vec2(pos.x as f32, pos.y as f32));
                        if let Some(other) = other {
                            self.app.zoom(pinch_zoom(other, previous, current));
                        }
                    }
                    3 if primary_touch == Some(id) => self.app.pan(current - previous),
                    _ => {}
                }
                if primary_touch == Some(id) {
                    self.mouse_state.position = current;
                }
            }
            TouchPhase::Ended | TouchPhase::Cancelled => {
                self.mouse_state.touches.remove(&id);
            }
        }
    }
}

pub struct WinitApp {
    #[cfg(target_arch = "wasm32")]
    proxy: Option<winit::event_loop::EventLoopProxy<State>>,
    config: AppConfig,
    state: Option<State>,
}

impl WinitApp {
    pub fn new(
        config: AppConfig,
        #[cfg(target_arch = "wasm32")] event_loop: &EventLoop<State>,
    ) -> Self {
        #[cfg(target_arch = "wasm32")]
        let proxy = Some(event_loop.create_proxy());
        Self {
            config,
            state: None,
            #[cfg(target_arch = "wasm32")]
            proxy,
        }
    }
}

impl ApplicationHandler<State> for WinitApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }

        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes().with_title("Spinning Cube");

        #[cfg(target_arch = "wasm32")]
        {
            use winit::platform::web::WindowAttributesExtWebSys;

            window_attributes = window_attributes.with_append(true);
            if let Some(document) = web_sys::window().and_then(|window| window.document()) {
                if let Some(loading_text) = document.get_element_by_id("loading_text") {
                    loading_text.remove();
                }
            }
        }

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Unable to create window: {}", e);
                event_loop.exit();
                return;
            }
        };

        #[cfg(not(target_arch = "wasm32"))]
        {
            match pollster::block_on(State::new(window, self.config.clone())) {
                Ok(state) => {
                    state.window.request_redraw();
                    self.state = Some(state);
                }
                Err(e) => {
                    log::error!("Unable to initialize renderer: {:#}", e);
                    event_loop.exit();
                }
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            if let Some(proxy) = self.proxy.take() {
                let config = self.config.clone();
                wasm_bindgen_futures::spawn_local(async move {
                    match State::new(window, config).await {
                        Ok(state) => {
                            if proxy.send_event(state).is_err() {
                                log::error!("Event loop closed before the renderer was ready");
                            }
                        }
                        Err(e) => log::error!("Unable to initialize renderer: {:#}", e),
                    }
                });
            }
        }
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, mut state: State) {
        // The canvas may have been laid out while the renderer was starting.
        let size = state.window.inner_size();
        state.app.renderer.set_pixel_ratio(state.window.scale_factor());
        state.resize(size);
        state.window.request_redraw();
        self.state = Some(state);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let state = match &mut self.state {
            Some(state) => state,
            None => return,
        };

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => state.resize(size),
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                state.app.renderer.set_pixel_ratio(scale_factor)
            }
            WindowEvent::RedrawRequested => state.render(event_loop),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state: key_state,
                        ..
                    },
                ..
            } => state.handle_key(event_loop, code, key_state.is_pressed()),
            WindowEvent::MouseInput {
                state: button_state,
                button,
                ..
            } => {
                match button {
                    MouseButton::Left => state.mouse_state.button_left = button_state.is_pressed(),
                    MouseButton::Right => {
                        state.mouse_state.button_right = button_state.is_pressed()
                    }
                    _ => {}
                };
                state.mouse_state.position_needs_update = true;
            }
            WindowEvent::MouseWheel { delta, .. } => match delta {
                MouseScrollDelta::LineDelta(_, vert) => state.app.zoom(vert),
                MouseScrollDelta::PixelDelta(delta) => {
                    state.app.zoom(delta.y as f32 / PIXELS_PER_LINE)
                }
            },
            WindowEvent::Touch(Touch {
                id,
                location,
                phase,
                ..
            }) => state.handle_touch(id, location, phase),
            WindowEvent::CursorMoved { position, .. } => state.handle_cursor(position),
            _ => {}
        }
    }
}

pub fn run() -> anyhow::Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        env_logger::init();
    }
    #[cfg(target_arch = "wasm32")]
    {
        std::panic::set_hook(Box::new(console_error_panic_hook::hook));
        console_log::init_with_level(log::Level::Info)?;
    }

    let event_loop = EventLoop::<State>::with_user_event().build()?;

    #[allow(unused_mut)]
    let mut app = WinitApp::new(
        AppConfig::default(),
        #[cfg(target_arch = "wasm32")]
        &event_loop,
    );

    #[cfg(not(target_arch = "wasm32"))]
    event_loop.run_app(&mut app)?;

    // The browser owns the loop; this returns immediately.
    #[cfg(target_arch = "wasm32")]
    {
        use winit::platform::web::EventLoopExtWebSys;
        event_loop.spawn_app(app);
    }

    Ok(())
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn run_web() -> Result<(), JsValue> {
    run().map_err(|e| JsValue::from_str(&format!("{e:#}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logical_viewport_divides_by_scale() {
        let viewport = logical_viewport(PhysicalSize::new(1600, 1200), 2.0);
        assert_eq!(viewport, Viewport::new(800, 600, 2.0));
    }

    #[test]
    fn pinch_spreading_zooms_in() {
        let anchor = glam::vec2(100.0, 100.0);
        let zoom = pinch_zoom(anchor, glam::vec2(200.0, 100.0), glam::vec2(250.0, 100.0));
        assert_eq!(zoom, 50.0 / PIXELS_PER_LINE);
        assert!(zoom > 0.0);
    }

    #[test]
    fn pinch_closing_zooms_out() {
        let anchor = glam::vec2(0.0, 0.0);
        let zoom = pinch_zoom(anchor, glam::vec2(0.0, 300.0), glam::vec2(0.0, 200.0));
        assert_eq!(zoom, -100.0 / PIXELS_PER_LINE);
    }

    #[test]
    fn pinch_rotating_around_anchor_does_not_zoom() {
        let anchor = glam::vec2(0.0, 0.0);
        let zoom = pinch_zoom(anchor, glam::vec2(30.0, 40.0), glam::vec2(-40.0, 30.0));
        assert!(zoom.abs() < 1e-6);
    }

    #[test]
    fn logical_viewport_rounds() {
        let viewport = logical_viewport(PhysicalSize::new(1001, 751), 1.5);
        assert_eq!(viewport.width, 667);
        assert_eq!(viewport.height, 501);
    }
}
