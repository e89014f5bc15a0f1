pub mod app;
pub mod camera;
pub mod color;
pub mod commands;
pub mod config;
pub mod controls;
pub mod light;
pub mod mesh;
pub mod primitives;
pub mod renderer;
pub mod scene;
#[cfg(feature = "winit")]
pub mod winit_integration;

pub use app::{App, Viewport};
pub use config::AppConfig;
