use super::camera::Camera;
use super::color::Color;
use super::commands::DrawCommand;
use super::mesh::{Geometry, GpuMesh, Vertex};
use super::scene::Scene;
use wgpu::util::DeviceExt;

pub const MAX_DIRECTIONAL_LIGHTS: usize = 4;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24Plus;

pub trait RenderBackend {
    type Error;

    fn set_pixel_ratio(&mut self, pixel_ratio: f64);
    fn pixel_ratio(&self) -> f64;
    fn set_size(&mut self, width: u32, height: u32);
    fn size(&self) -> glam::UVec2;
    fn render(&mut self, scene: &Scene, camera: &impl Camera) -> Result<(), Self::Error>;
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Uniforms {
    pub view_proj: glam::Mat4,
    pub hemisphere_sky: glam::Vec4,
    pub hemisphere_ground: glam::Vec4,
    pub directional_direction: [glam::Vec4; MAX_DIRECTIONAL_LIGHTS],
    pub directional_color: [glam::Vec4; MAX_DIRECTIONAL_LIGHTS],
    pub light_count: glam::UVec4,
}

impl Uniforms {
    pub fn from_scene(scene: &Scene, camera: &impl Camera) -> Self {
        let mut uniforms = Uniforms {
            view_proj: camera.view_proj(),
            hemisphere_sky: glam::Vec4::ZERO,
            hemisphere_ground: glam::Vec4::ZERO,
            directional_direction: [glam::Vec4::ZERO; MAX_DIRECTIONAL_LIGHTS],
            directional_color: [glam::Vec4::ZERO; MAX_DIRECTIONAL_LIGHTS],
            light_count: glam::UVec4::ZERO,
        };

        for light in scene.hemisphere_lights() {
            uniforms.hemisphere_sky += (light.sky_color.to_linear() * light.intensity).extend(0.0);
            uniforms.hemisphere_ground +=
                (light.ground_color.to_linear() * light.intensity).extend(0.0);
        }

        let mut count = 0;
        for light in scene.directional_lights() {
            if count == MAX_DIRECTIONAL_LIGHTS {
                log::warn!(
                    "Scene has more than {} directional lights, ignoring the rest",
                    MAX_DIRECTIONAL_LIGHTS
                );
                break;
            }
            uniforms.directional_direction[count] = light.direction().extend(0.0);
            uniforms.directional_color[count] =
                (light.color.to_linear() * light.intensity).extend(0.0);
            count += 1;
        }
        uniforms.light_count.x = count as u32;

        uniforms
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Instance {
    pub model_matrix: glam::Mat4,
    pub color: glam::Vec4,
}

impl Instance {
    const ATTRIBS: [wgpu::VertexAttribute; 5] = wgpu::vertex_attr_array![
        2 => Float32x4,
        3 => Float32x4,
        4 => Float32x4,
        5 => Float32x4,
        6 => Float32x4
    ];
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;

        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<Instance>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRIBS,
        }
    }
}

#[derive(Debug, Copy, Clone)]
pub struct RendererOptions {
    pub antialias: bool,
}

impl Default for RendererOptions {
    fn default() -> Self {
        Self { antialias: true }
    }
}

/// Drawing-buffer size for a logical size, kept within `max_dim` on both
/// axes without changing the aspect ratio.
pub fn drawing_buffer_size(size: glam::UVec2, pixel_ratio: f64, max_dim: u32) -> glam::UVec2 {
    let width = (size.x as f64 * pixel_ratio).round();
    let height = (size.y as f64 * pixel_ratio).round();
    let largest = width.max(height);
    let scale = if largest > max_dim as f64 {
        max_dim as f64 / largest
    } else {
        1.0
    };
    if scale < 1.0 {
        // Never let the short side collapse to nothing.
        glam::UVec2::new(
            ((width * scale).round() as u32).max(1),
            ((height * scale).round() as u32).max(1),
        )
    } else {
        glam::UVec2::new(width as u32, height as u32)
    }
}

pub struct Renderer {
    pub adapter: wgpu::Adapter,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub surface: wgpu::Surface<'static>,
    pub surface_config: wgpu::SurfaceConfiguration,
    pub is_surface_configured: bool,
    pub solid_pipeline: wgpu::RenderPipeline,
    pub uniform_buffer: wgpu::Buffer,
    pub uniform_bind_group: wgpu::BindGroup,
    pub depth_texture_view: wgpu::TextureView,
    pub msaa_texture_view: Option<wgpu::TextureView>,
    pub sample_count: u32,
    pub commands: Vec<DrawCommand>,
    pub meshes: Vec<GpuMesh>,
    pixel_ratio: f64,
    size: glam::UVec2,
}

impl Renderer {
    pub async fn new_with_surface(
        surface: wgpu::Surface<'static>,
        instance: &wgpu::Instance,
        options: RendererOptions,
    ) -> anyhow::Result<Self> {
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                compatible_surface: Some(&surface),
                power_preference: wgpu::PowerPreference::HighPerformance,
                force_fallback_adapter: false,
            })
            .await?;
        log::info!("Using adapter: {:?}", adapter.get_info());

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| anyhow::anyhow!("Surface is incompatible with the adapter"))?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);
        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: 0,
            height: 0,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Device"),
                required_features: wgpu::Features::empty(),
                required_limits: if cfg!(target_arch = "wasm32") {
                    wgpu::Limits::downlevel_webgl2_defaults()
                } else {
                    wgpu::Limits::default()
                },
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
            })
            .await?;

        let sample_count = if options.antialias
            && adapter
                .get_texture_format_features(surface_format)
                .flags
                .sample_count_supported(4)
        {
            4
        } else {
            1
        };
        log::debug!("Surface format {:?}, {}x MSAA", surface_format, sample_count);

        // Placeholder targets until the first set_size.
        let depth_texture_view =
            create_depth_view(&device, glam::UVec2::ONE, sample_count);
        let msaa_texture_view = (sample_count > 1).then(|| {
            create_msaa_view(&device, glam::UVec2::ONE, surface_format, sample_count)
        });

        // Buffers
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Uniform Buffer"),
            contents: bytemuck::cast_slice(&[Uniforms::from_scene(
                &Scene::new(Color::BLACK),
                &crate::camera::PerspectiveCamera::default(),
            )]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        // Bind Groups
        let uniform_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Uniforms Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });
        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Uniforms Bind Group"),
            layout: &uniform_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        // Render Pipeline
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Solid Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shader.wgsl").into()),
        });

        let solid_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Solid Pipeline Layout"),
                bind_group_layouts: &[&uniform_bind_group_layout],
                push_constant_ranges: &[],
            });

        let solid_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Solid Pipeline"),
            layout: Some(&solid_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[Vertex::desc(), Instance::desc()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            multisample: wgpu::MultisampleState {
                count: sample_count,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
            cache: None,
        });

        Ok(Self {
            adapter,
            device,
            queue,
            surface,
            surface_config,
            is_surface_configured: false,
            depth_texture_view,
            msaa_texture_view,
            sample_count,
            solid_pipeline,
            uniform_buffer,
            uniform_bind_group,
            meshes: Vec::new(),
            commands: Vec::new(),
            pixel_ratio: 1.0,
            size: glam::UVec2::ZERO,
        })
    }

    pub fn configure(&mut self) {
        let max_dim = self.device.limits().max_texture_dimension_2d;
        let buffer_size = drawing_buffer_size(self.size, self.pixel_ratio, max_dim);
        if buffer_size.x == 0 || buffer_size.y == 0 {
            log::debug!("Skipping surface configuration for empty size {}", buffer_size);
            return;
        }

        self.surface_config.width = buffer_size.x;
        self.surface_config.height = buffer_size.y;
        self.surface.configure(&self.device, &self.surface_config);
        self.is_surface_configured = true;

        self.depth_texture_view = create_depth_view(&self.device, buffer_size, self.sample_count);
        if self.sample_count > 1 {
            self.msaa_texture_view = Some(create_msaa_view(
                &self.device,
                buffer_size,
                self.surface_config.format,
                self.sample_count,
            ));
        }
        log::debug!(
            "Drawing buffer: {}x{} (logical {}, ratio {})",
            buffer_size.x,
            buffer_size.y,
            self.size,
            self.pixel_ratio
        );
    }

    pub fn update_uniforms(&mut self, scene: &Scene, camera: &impl Camera) {
        let uniforms = Uniforms::from_scene(scene, camera);
        log::trace!("Uniforms: {}", uniforms.view_proj);
        self.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[uniforms]));
    }

    fn gpu_mesh_index(&mut self, geometry: Geometry) -> usize {
        match self.meshes.iter().position(|mesh| mesh.geometry == geometry) {
            Some(index) => index,
            None => {
                log::debug!("Uploading {:?}", geometry);
                self.meshes.push(GpuMesh::new(&self.device, geometry));
                self.meshes.len() - 1
            }
        }
    }

    fn prepare_batches(&mut self) -> Vec<(usize, u32)> {
        let geometries: Vec<Geometry> = self.commands.iter().map(|cmd| cmd.geometry).collect();
        for geometry in geometries {
            self.gpu_mesh_index(geometry);
        }

        let mut batches = Vec::new();
        for (index, mesh) in self.meshes.iter_mut().enumerate() {
            let instances: Vec<Instance> = self
                .commands
                .iter()
                .filter_map(|cmd| {
                    if cmd.geometry == mesh.geometry {
                        Some(cmd.instance)
                    } else {
                        None
                    }
                })
                .collect();
            if instances.is_empty() {
                continue;
            }

            if instances.len() > mesh.instance_capacity {
                mesh.realloc_instance_buffer(&self.device, instances.len());
            }
            self.queue
                .write_buffer(&mesh.instance_buffer, 0, bytemuck::cast_slice(&instances));
            batches.push((index, instances.len() as u32));
        }
        batches
    }
}

impl RenderBackend for Renderer {
    type Error = wgpu::SurfaceError;

    fn set_pixel_ratio(&mut self, pixel_ratio: f64) {
        if pixel_ratio.is_finite() && pixel_ratio > 0.0 {
            self.pixel_ratio = pixel_ratio;
        } else {
            log::warn!("Ignoring invalid pixel ratio {}", pixel_ratio);
        }
        self.configure();
    }

    fn pixel_ratio(&self) -> f64 {
        self.pixel_ratio
    }

    fn set_size(&mut self, width: u32, height: u32) {
        self.size = glam::UVec2::new(width, height);
        self.configure();
    }

    fn size(&self) -> glam::UVec2 {
        self.size
    }

    fn render(&mut self, scene: &Scene, camera: &impl Camera) -> Result<(), Self::Error> {
        if !self.is_surface_configured {
            return Ok(());
        }

        self.update_uniforms(scene, camera);
        self.commands.clear();
        self.commands
            .extend(scene.meshes().map(DrawCommand::from_mesh));
        let batches = self.prepare_batches();

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let (color_view, resolve_target) = match &self.msaa_texture_view {
            Some(msaa_view) => (msaa_view, Some(&view)),
            None => (&view, None),
        };
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: color_view,
                    resolve_target,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(scene.background.to_wgpu()),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_pipeline(&self.solid_pipeline);
            render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);

            for (index, instance_count) in batches {
                let mesh = &self.meshes[index];
                render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                render_pass.set_vertex_buffer(1, mesh.instance_buffer.slice(..));
                render_pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
                render_pass.draw_indexed(0..mesh.index_count, 0, 0..instance_count);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

fn create_depth_view(device: &wgpu::Device, size: glam::UVec2, sample_count: u32) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Texture"),
        size: wgpu::Extent3d {
            width: size.x.max(1),
            height: size.y.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[DEPTH_FORMAT],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

fn create_msaa_view(
    device: &wgpu::Device,
    size: glam::UVec2,
    format: wgpu::TextureFormat,
    sample_count: u32,
) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("MSAA Texture"),
        size: wgpu::Extent3d {
            width: size.x.max(1),
            height: size.y.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}
