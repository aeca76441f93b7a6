//! GPU renderer.
//!
//! Draws the three point groups (stars, tree, snow) as instanced quads into
//! an HDR target, then runs the bloom chain onto the window surface. All
//! scene data comes from a [`Scene`]; the renderer only mirrors it into
//! buffers.

mod bloom;
mod camera;
#[cfg(feature = "egui")]
mod egui_integration;

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use log::{debug, info, warn};
use wgpu::util::DeviceExt;
use winit::window::Window;

pub use bloom::{mip_sizes, BloomPass, BloomSettings};
pub use camera::OrbitCamera;
#[cfg(feature = "egui")]
pub use egui_integration::{EguiFrameOutput, EguiIntegration};

use crate::animation;
use crate::color::Rgb;
use crate::error::GpuError;
use crate::scene::Scene;
use crate::stars::StarVertex;
use crate::tree::TreeVertex;

/// Offscreen scene format; keeps additive highlights above 1.0 for bloom.
pub const HDR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

/// Snow flake size in world units.
pub const SNOW_SIZE: f32 = 0.1;

/// Scene background, `#050505`.
pub const BACKGROUND: Rgb = Rgb::new(5.0 / 255.0, 5.0 / 255.0, 5.0 / 255.0);

pub const TREE_SHADER: &str = concat!(
    include_str!("../shaders/common.wgsl"),
    include_str!("../shaders/tree.wgsl")
);
pub const SNOW_SHADER: &str = concat!(
    include_str!("../shaders/common.wgsl"),
    include_str!("../shaders/snow.wgsl")
);
pub const STAR_SHADER: &str = concat!(
    include_str!("../shaders/common.wgsl"),
    include_str!("../shaders/stars.wgsl")
);
pub const BLOOM_SHADER: &str = include_str!("../shaders/bloom.wgsl");

/// Two triangles per sprite.
const SPRITE_VERTICES: u32 = 6;

const ADDITIVE_BLENDING: wgpu::BlendState = wgpu::BlendState {
    color: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::SrcAlpha,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Add,
    },
    alpha: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::One,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Add,
    },
};

const TREE_ATTRIBUTES: [wgpu::VertexAttribute; 3] =
    wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32];
const STAR_ATTRIBUTES: [wgpu::VertexAttribute; 3] =
    wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32];
const SNOW_ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x3];

/// Per-frame uniforms shared by the three point shaders.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct SceneUniforms {
    pub view: [[f32; 4]; 4],
    pub proj: [[f32; 4]; 4],
    pub tree_model: [[f32; 4]; 4],
    pub snow_model: [[f32; 4]; 4],
    pub resolution: [f32; 2],
    pub sparkle_time: f32,
    pub point_size: f32,
    pub star_time: f32,
    pub snow_size: f32,
    pub star_fade: f32,
    pub _pad: f32,
}

impl SceneUniforms {
    pub fn new(scene: &Scene, camera: &OrbitCamera, width: u32, height: u32) -> Self {
        let aspect = width as f32 / height.max(1) as f32;
        let frame = scene.frame();
        let stars = &scene.stars().settings;

        Self {
            view: camera.view_matrix().to_cols_array_2d(),
            proj: camera.projection(aspect).to_cols_array_2d(),
            tree_model: Mat4::from_rotation_y(frame.rotation).to_cols_array_2d(),
            snow_model: Mat4::from_rotation_y(scene.snow().rotation).to_cols_array_2d(),
            resolution: [width as f32, height as f32],
            sparkle_time: animation::sparkle_driver(frame.sparkle_phase),
            point_size: scene.point_size(),
            star_time: (scene.elapsed() * stars.speed as f64)
                .rem_euclid(std::f64::consts::TAU) as f32,
            snow_size: SNOW_SIZE,
            star_fade: if stars.fade { 1.0 } else { 0.0 },
            _pad: 0.0,
        }
    }
}

pub struct Renderer {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    tree_pipeline: wgpu::RenderPipeline,
    snow_pipeline: wgpu::RenderPipeline,
    star_pipeline: wgpu::RenderPipeline,
    tree_buffer: wgpu::Buffer,
    tree_count: u32,
    tree_generation: u64,
    snow_buffer: wgpu::Buffer,
    snow_count: u32,
    star_buffer: wgpu::Buffer,
    star_count: u32,
    scene_view: wgpu::TextureView,
    bloom: BloomPass,
    clear_color: wgpu::Color,
    pub camera: OrbitCamera,
}

impl Renderer {
    pub async fn new(window: Arc<Window>, scene: &Scene) -> Result<Self, GpuError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GpuError::NoAdapter)?;
        info!("Using adapter: {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or(GpuError::UnsupportedSurface)?;
        if !surface_format.is_srgb() {
            warn!("No sRGB surface format available, colors will look dark");
        }

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let camera = OrbitCamera::new();
        let uniforms = SceneUniforms::new(scene, &camera, config.width, config.height);
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Uniform Buffer"),
            contents: bytemuck::bytes_of(&uniforms),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let uniform_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Uniform Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Uniform Bind Group"),
            layout: &uniform_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Point Pipeline Layout"),
            bind_group_layouts: &[&uniform_bind_group_layout],
            push_constant_ranges: &[],
        });

        let tree_pipeline = point_pipeline(
            &device,
            &pipeline_layout,
            "Tree",
            TREE_SHADER,
            wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<TreeVertex>() as wgpu::BufferAddress,
                step_mode: wgpu::VertexStepMode::Instance,
                attributes: &TREE_ATTRIBUTES,
            },
            ADDITIVE_BLENDING,
        );
        let snow_pipeline = point_pipeline(
            &device,
            &pipeline_layout,
            "Snow",
            SNOW_SHADER,
            wgpu::VertexBufferLayout {
                array_stride: (3 * std::mem::size_of::<f32>()) as wgpu::BufferAddress,
                step_mode: wgpu::VertexStepMode::Instance,
                attributes: &SNOW_ATTRIBUTES,
            },
            wgpu::BlendState::ALPHA_BLENDING,
        );
        let star_pipeline = point_pipeline(
            &device,
            &pipeline_layout,
            "Stars",
            STAR_SHADER,
            wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<StarVertex>() as wgpu::BufferAddress,
                step_mode: wgpu::VertexStepMode::Instance,
                attributes: &STAR_ATTRIBUTES,
            },
            ADDITIVE_BLENDING,
        );

        let tree_vertices = scene.field().vertices();
        let tree_buffer = create_vertex_buffer(&device, "Tree Buffer", bytemuck::cast_slice(&tree_vertices));
        let snow_buffer = create_vertex_buffer(
            &device,
            "Snow Buffer",
            bytemuck::cast_slice(scene.snow().position_buffer()),
        );
        let star_buffer = create_vertex_buffer(
            &device,
            "Star Buffer",
            bytemuck::cast_slice(&scene.stars().stars),
        );

        let scene_view = create_scene_target(&device, config.width, config.height);
        let bloom = BloomPass::new(
            &device,
            &scene_view,
            config.width,
            config.height,
            surface_format,
            BloomSettings::default(),
        );

        let bg = BACKGROUND.to_linear();
        info!(
            "Renderer ready: {}x{} {:?}, {} tree particles",
            config.width,
            config.height,
            surface_format,
            tree_vertices.len()
        );

        Ok(Self {
            surface,
            device,
            queue,
            config,
            uniform_buffer,
            uniform_bind_group,
            tree_pipeline,
            snow_pipeline,
            star_pipeline,
            tree_buffer,
            tree_count: tree_vertices.len() as u32,
            tree_generation: scene.generation(),
            snow_buffer,
            snow_count: scene.snow().len() as u32,
            star_buffer,
            star_count: scene.stars().len() as u32,
            scene_view,
            bloom,
            clear_color: wgpu::Color {
                r: bg.r as f64,
                g: bg.g as f64,
                b: bg.b as f64,
                a: 1.0,
            },
            camera,
        })
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn size(&self) -> [u32; 2] {
        [self.config.width, self.config.height]
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            self.scene_view = create_scene_target(&self.device, new_size.width, new_size.height);
            self.bloom
                .resize(&self.device, &self.scene_view, new_size.width, new_size.height);
            debug!(
                "Resized to {}x{}, bloom levels {:?}",
                new_size.width,
                new_size.height,
                self.bloom.level_sizes()
            );
        }
    }

    /// Reconfigure the surface at its current size after it was lost.
    pub fn reconfigure(&mut self) {
        self.surface.configure(&self.device, &self.config);
    }

    /// Mirror the scene into GPU buffers.
    ///
    /// The tree buffer is replaced only when the scene's generation changed;
    /// snow positions are rewritten every frame.
    pub fn sync(&mut self, scene: &Scene) {
        if scene.generation() != self.tree_generation {
            let vertices = scene.field().vertices();
            self.tree_buffer =
                create_vertex_buffer(&self.device, "Tree Buffer", bytemuck::cast_slice(&vertices));
            self.tree_count = vertices.len() as u32;
            self.tree_generation = scene.generation();
            debug!(
                "Uploaded tree generation {} ({} particles)",
                self.tree_generation, self.tree_count
            );
        }

        self.queue.write_buffer(
            &self.snow_buffer,
            0,
            bytemuck::cast_slice(scene.snow().position_buffer()),
        );

        let uniforms = SceneUniforms::new(scene, &self.camera, self.config.width, self.config.height);
        self.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));
    }

    /// Draw one frame.
    ///
    /// `overlay` runs after bloom with the surface view as its target, so UI
    /// is drawn without glow.
    pub fn render<F>(&mut self, bloom_intensity: f32, overlay: F) -> Result<(), wgpu::SurfaceError>
    where
        F: FnOnce(&wgpu::Device, &wgpu::Queue, &mut wgpu::CommandEncoder, &wgpu::TextureView),
    {
        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.scene_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);

            render_pass.set_pipeline(&self.star_pipeline);
            render_pass.set_vertex_buffer(0, self.star_buffer.slice(..));
            render_pass.draw(0..SPRITE_VERTICES, 0..self.star_count);

            render_pass.set_pipeline(&self.tree_pipeline);
            render_pass.set_vertex_buffer(0, self.tree_buffer.slice(..));
            render_pass.draw(0..SPRITE_VERTICES, 0..self.tree_count);

            render_pass.set_pipeline(&self.snow_pipeline);
            render_pass.set_vertex_buffer(0, self.snow_buffer.slice(..));
            render_pass.draw(0..SPRITE_VERTICES, 0..self.snow_count);
        }

        self.bloom
            .render(&mut encoder, &self.queue, &view, bloom_intensity);

        overlay(&self.device, &self.queue, &mut encoder, &view);

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

fn point_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    label: &str,
    source: &str,
    buffer: wgpu::VertexBufferLayout<'_>,
    blend: wgpu::BlendState,
) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: &[buffer],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: HDR_FORMAT,
                blend: Some(blend),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        // Every point material skips depth writes.
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

fn create_vertex_buffer(device: &wgpu::Device, label: &str, contents: &[u8]) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
    })
}

fn create_scene_target(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Scene Texture"),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: HDR_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TreeConfig;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// Validates WGSL code using naga.
    fn validate_wgsl(code: &str) -> Result<(), String> {
        let module = naga::front::wgsl::parse_str(code)
            .map_err(|e| format!("WGSL parse error: {:?}", e))?;

        let mut validator = naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::all(),
        );
        validator
            .validate(&module)
            .map_err(|e| format!("WGSL validation error: {:?}", e))?;

        Ok(())
    }

    #[test]
    fn test_tree_shader_is_valid() {
        validate_wgsl(TREE_SHADER).unwrap();
    }

    #[test]
    fn test_snow_shader_is_valid() {
        validate_wgsl(SNOW_SHADER).unwrap();
    }

    #[test]
    fn test_star_shader_is_valid() {
        validate_wgsl(STAR_SHADER).unwrap();
    }

    #[test]
    fn test_bloom_shader_is_valid() {
        validate_wgsl(BLOOM_SHADER).unwrap();
    }

    #[test]
    fn test_shaders_carry_sparkle_formula() {
        assert!(TREE_SHADER.contains("smoothstep(0.4, 1.0"));
        assert!(TREE_SHADER.contains("20.0 / -mv.z"));
        assert!(STAR_SHADER.contains("exp(16.0 * (d - 0.25))"));
    }

    #[test]
    fn test_uniform_layout() {
        assert_eq!(std::mem::size_of::<SceneUniforms>(), 288);
        assert_eq!(std::mem::offset_of!(SceneUniforms, resolution), 256);
        assert_eq!(std::mem::size_of::<TreeVertex>(), 28);
        assert_eq!(std::mem::size_of::<StarVertex>(), 28);
    }

    #[test]
    fn test_uniforms_follow_scene() {
        let mut rng = StdRng::seed_from_u64(21);
        let config = TreeConfig::default().with_sparkle_speed(2.0).with_particle_size(0.1);
        let mut scene = Scene::new(config, &mut rng).unwrap();
        scene.advance(1.5);

        let camera = OrbitCamera::new();
        let u = SceneUniforms::new(&scene, &camera, 1280, 720);
        assert_eq!(u.resolution, [1280.0, 720.0]);
        // 3.0 reduced by one sparkle period.
        assert!((u.sparkle_time - (3.0 - animation::SPARKLE_PERIOD) as f32).abs() < 1e-6);
        assert!((u.point_size - 5.0).abs() < 1e-5);
        assert_eq!(u.star_time, 1.5);
        assert_eq!(u.snow_size, SNOW_SIZE);
        assert_eq!(u.star_fade, 1.0);
        assert_eq!(u.view, camera.view_matrix().to_cols_array_2d());
    }
}
