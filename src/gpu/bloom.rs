//! Mip-chain bloom.
//!
//! The scene is rendered to an offscreen HDR texture. Bright pixels are
//! extracted into a half-resolution target, blurred down a chain of
//! progressively smaller targets, blended back up, and finally added onto the
//! scene while writing to the surface.

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use super::HDR_FORMAT;

/// Tunables for the bloom pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BloomSettings {
    /// Luminance where the glow starts.
    pub threshold: f32,
    /// Width of the soft knee above `threshold`.
    pub smoothing: f32,
    /// How much of the blurred lower level is mixed in on the way up.
    pub radius: f32,
    /// Number of downsampled targets.
    pub levels: usize,
}

impl Default for BloomSettings {
    fn default() -> Self {
        Self {
            threshold: 0.2,
            smoothing: 0.03,
            radius: 0.6,
            levels: 5,
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct BloomParams {
    texel_size: [f32; 2],
    threshold: f32,
    smoothing: f32,
    radius: f32,
    intensity: f32,
    _pad: [f32; 2],
}

/// Sizes of the downsample chain for a `width` x `height` scene.
///
/// Level 0 is half resolution; each further level halves again. No side is
/// ever smaller than one pixel.
pub fn mip_sizes(width: u32, height: u32, levels: usize) -> Vec<(u32, u32)> {
    let mut sizes = Vec::with_capacity(levels);
    let (mut w, mut h) = (width, height);
    for _ in 0..levels {
        w = (w / 2).max(1);
        h = (h / 2).max(1);
        sizes.push((w, h));
    }
    sizes
}

struct Target {
    view: wgpu::TextureView,
    size: (u32, u32),
}

/// Bind group and uniform buffer for one fullscreen draw.
struct Step {
    bind_group: wgpu::BindGroup,
    params: wgpu::Buffer,
}

pub struct BloomPass {
    settings: BloomSettings,
    sampler: wgpu::Sampler,
    single_layout: wgpu::BindGroupLayout,
    dual_layout: wgpu::BindGroupLayout,
    prefilter_pipeline: wgpu::RenderPipeline,
    downsample_pipeline: wgpu::RenderPipeline,
    upsample_pipeline: wgpu::RenderPipeline,
    composite_pipeline: wgpu::RenderPipeline,
    down: Vec<Target>,
    up: Vec<Target>,
    /// Prefilter followed by each downsample, writing `down[i]`.
    down_steps: Vec<Step>,
    /// Upsample steps writing `up[i]`, smallest first.
    up_steps: Vec<(usize, Step)>,
    composite: Step,
}

impl BloomPass {
    pub fn new(
        device: &wgpu::Device,
        scene_view: &wgpu::TextureView,
        width: u32,
        height: u32,
        surface_format: wgpu::TextureFormat,
        settings: BloomSettings,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Bloom Shader"),
            source: wgpu::ShaderSource::Wgsl(super::BLOOM_SHADER.into()),
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Bloom Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let texture_entry = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        };
        let sampler_entry = wgpu::BindGroupLayoutEntry {
            binding: 1,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            count: None,
        };
        let params_entry = wgpu::BindGroupLayoutEntry {
            binding: 2,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };

        let single_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Bloom Single Layout"),
            entries: &[texture_entry(0), sampler_entry, params_entry],
        });
        let dual_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Bloom Dual Layout"),
            entries: &[texture_entry(0), sampler_entry, params_entry, texture_entry(3)],
        });

        let pipeline = |label: &str,
                        layout: &wgpu::BindGroupLayout,
                        entry_point: &str,
                        format: wgpu::TextureFormat| {
            let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(label),
                bind_group_layouts: &[layout],
                push_constant_ranges: &[],
            });
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    buffers: &[],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some(entry_point),
                    targets: &[Some(wgpu::ColorTargetState {
                        format,
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    ..Default::default()
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            })
        };

        let prefilter_pipeline = pipeline("Bloom Prefilter", &single_layout, "fs_prefilter", HDR_FORMAT);
        let downsample_pipeline =
            pipeline("Bloom Downsample", &single_layout, "fs_downsample", HDR_FORMAT);
        let upsample_pipeline = pipeline("Bloom Upsample", &dual_layout, "fs_upsample", HDR_FORMAT);
        let composite_pipeline =
            pipeline("Bloom Composite", &dual_layout, "fs_composite", surface_format);

        let settings = BloomSettings {
            levels: settings.levels.max(1),
            ..settings
        };
        let chain = Chain::build(
            device,
            &sampler,
            &single_layout,
            &dual_layout,
            scene_view,
            width,
            height,
            &settings,
        );

        Self {
            settings,
            sampler,
            single_layout,
            dual_layout,
            prefilter_pipeline,
            downsample_pipeline,
            upsample_pipeline,
            composite_pipeline,
            down: chain.down,
            up: chain.up,
            down_steps: chain.down_steps,
            up_steps: chain.up_steps,
            composite: chain.composite,
        }
    }

    /// Recreate the targets for a new scene texture.
    pub fn resize(
        &mut self,
        device: &wgpu::Device,
        scene_view: &wgpu::TextureView,
        width: u32,
        height: u32,
    ) {
        let chain = Chain::build(
            device,
            &self.sampler,
            &self.single_layout,
            &self.dual_layout,
            scene_view,
            width,
            height,
            &self.settings,
        );
        self.down = chain.down;
        self.up = chain.up;
        self.down_steps = chain.down_steps;
        self.up_steps = chain.up_steps;
        self.composite = chain.composite;
    }

    /// Record the bloom passes, writing the final image to `output`.
    pub fn render(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        queue: &wgpu::Queue,
        output: &wgpu::TextureView,
        intensity: f32,
    ) {
        // Only the intensity changes per frame; it lives at byte offset 20.
        queue.write_buffer(&self.composite.params, 20, bytemuck::bytes_of(&intensity));

        for (i, step) in self.down_steps.iter().enumerate() {
            let pipeline = if i == 0 {
                &self.prefilter_pipeline
            } else {
                &self.downsample_pipeline
            };
            fullscreen_pass(encoder, "Bloom Down Pass", &self.down[i].view, pipeline, &step.bind_group);
        }

        for (target, step) in &self.up_steps {
            fullscreen_pass(
                encoder,
                "Bloom Up Pass",
                &self.up[*target].view,
                &self.upsample_pipeline,
                &step.bind_group,
            );
        }

        fullscreen_pass(
            encoder,
            "Bloom Composite Pass",
            output,
            &self.composite_pipeline,
            &self.composite.bind_group,
        );
    }

    /// Sizes of the downsampled targets currently allocated.
    pub fn level_sizes(&self) -> Vec<(u32, u32)> {
        self.down.iter().map(|t| t.size).collect()
    }
}

struct Chain {
    down: Vec<Target>,
    up: Vec<Target>,
    down_steps: Vec<Step>,
    up_steps: Vec<(usize, Step)>,
    composite: Step,
}

impl Chain {
    #[allow(clippy::too_many_arguments)]
    fn build(
        device: &wgpu::Device,
        sampler: &wgpu::Sampler,
        single_layout: &wgpu::BindGroupLayout,
        dual_layout: &wgpu::BindGroupLayout,
        scene_view: &wgpu::TextureView,
        width: u32,
        height: u32,
        settings: &BloomSettings,
    ) -> Self {
        let sizes = mip_sizes(width, height, settings.levels);
        let down: Vec<Target> = sizes
            .iter()
            .map(|&size| create_target(device, "Bloom Down Target", size))
            .collect();
        let up: Vec<Target> = sizes[..sizes.len() - 1]
            .iter()
            .map(|&size| create_target(device, "Bloom Up Target", size))
            .collect();

        let params = |source: (u32, u32)| BloomParams {
            texel_size: [1.0 / source.0 as f32, 1.0 / source.1 as f32],
            threshold: settings.threshold,
            smoothing: settings.smoothing,
            radius: settings.radius,
            intensity: 0.0,
            _pad: [0.0; 2],
        };
        let step = |layout: &wgpu::BindGroupLayout,
                    source: &wgpu::TextureView,
                    base: Option<&wgpu::TextureView>,
                    values: BloomParams| {
            let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Bloom Params"),
                contents: bytemuck::bytes_of(&values),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });
            let mut entries = vec![
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(source),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: buffer.as_entire_binding(),
                },
            ];
            if let Some(base) = base {
                entries.push(wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(base),
                });
            }
            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Bloom Bind Group"),
                layout,
                entries: &entries,
            });
            Step {
                bind_group,
                params: buffer,
            }
        };

        let mut down_steps = Vec::with_capacity(down.len());
        down_steps.push(step(single_layout, scene_view, None, params((width, height))));
        for i in 1..down.len() {
            down_steps.push(step(single_layout, &down[i - 1].view, None, params(down[i - 1].size)));
        }

        // up[i] = mix(down[i], blur(smaller), radius); the smallest level seeds the chain.
        let mut up_steps = Vec::with_capacity(up.len());
        for i in (0..up.len()).rev() {
            let smaller = if i + 1 == up.len() {
                &down[i + 1]
            } else {
                &up[i + 1]
            };
            up_steps.push((
                i,
                step(dual_layout, &smaller.view, Some(&down[i].view), params(smaller.size)),
            ));
        }

        let glow = up.first().unwrap_or(&down[0]);
        let composite = step(dual_layout, &glow.view, Some(scene_view), params(glow.size));

        Self {
            down,
            up,
            down_steps,
            up_steps,
            composite,
        }
    }
}

fn create_target(device: &wgpu::Device, label: &str, size: (u32, u32)) -> Target {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width: size.0,
            height: size.1,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: HDR_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        view_formats: &[],
    });
    Target {
        view: texture.create_view(&wgpu::TextureViewDescriptor::default()),
        size,
    }
}

fn fullscreen_pass(
    encoder: &mut wgpu::CommandEncoder,
    label: &str,
    target: &wgpu::TextureView,
    pipeline: &wgpu::RenderPipeline,
    bind_group: &wgpu::BindGroup,
) {
    let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(label),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: target,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                store: wgpu::StoreOp::Store,
            },
        })],
        depth_stencil_attachment: None,
        timestamp_writes: None,
        occlusion_query_set: None,
    });
    pass.set_pipeline(pipeline);
    pass.set_bind_group(0, bind_group, &[]);
    pass.draw(0..3, 0..1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mip_chain_halves() {
        let sizes = mip_sizes(1280, 720, 5);
        assert_eq!(sizes, vec![(640, 360), (320, 180), (160, 90), (80, 45), (40, 22)]);
    }

    #[test]
    fn test_mip_chain_never_reaches_zero() {
        let sizes = mip_sizes(3, 1, 4);
        assert_eq!(sizes, vec![(1, 1), (1, 1), (1, 1), (1, 1)]);
    }

    #[test]
    fn test_params_layout_matches_shader() {
        assert_eq!(std::mem::size_of::<BloomParams>(), 32);
        assert_eq!(std::mem::offset_of!(BloomParams, intensity), 20);
    }

    #[test]
    fn test_default_settings() {
        let s = BloomSettings::default();
        assert_eq!(s.threshold, 0.2);
        assert_eq!(s.radius, 0.6);
        assert_eq!(s.levels, 5);
    }
}
