//! wgpu presentation: one textured quad whose texture coordinates come from the
//! engine's visible rectangle.
//!
//! The photo texture and its bind group are the only device-dependent resources;
//! they are dropped when the surface is lost and rebuilt by the recovery loop.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result, bail};
use tracing::{debug, error, info, warn};
use wgpu::SurfaceError;
use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;
use winit::window::Window;

use crate::config::Configuration;
use crate::engine::recovery::{PresentationSurface, SurfaceHealth};
use crate::error::Error;
use crate::events::FrameOutput;
use crate::processing::rect::Size;
use crate::render::loader::{self, PreparedImage};

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct Vertex {
    pos: [f32; 2],
    corner: [f32; 2],
}

const QUAD: [Vertex; 4] = [
    //   NDC pos          corner (0,0 = top-left)
    Vertex {
        pos: [-1.0, -1.0],
        corner: [0.0, 1.0],
    }, // bottom-left
    Vertex {
        pos: [1.0, -1.0],
        corner: [1.0, 1.0],
    }, // bottom-right
    Vertex {
        pos: [-1.0, 1.0],
        corner: [0.0, 0.0],
    }, // top-left
    Vertex {
        pos: [1.0, 1.0],
        corner: [1.0, 0.0],
    }, // top-right
];

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct ViewParams {
    uv_rect: [f32; 4],
}

struct PhotoTexture {
    _texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
}

/// Outcome of a single draw attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentOutcome {
    Presented,
    /// Frame acquisition timed out; try again next tick.
    Skipped,
    /// Presentation failed; hand over to the recovery loop.
    Lost,
}

/// What to do when the next surface texture cannot be acquired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AcquireFailure {
    /// The surface no longer matches the window; reconfigure and skip this frame.
    Reconfigure,
    Retry,
    /// Hand over to the recovery loop.
    Lost,
    Fatal,
}

fn acquire_failure(err: &SurfaceError) -> AcquireFailure {
    match err {
        SurfaceError::Outdated => AcquireFailure::Reconfigure,
        SurfaceError::Timeout => AcquireFailure::Retry,
        SurfaceError::Lost | SurfaceError::Other => AcquireFailure::Lost,
        SurfaceError::OutOfMemory => AcquireFailure::Fatal,
    }
}

pub struct Gpu {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    pipeline: wgpu::RenderPipeline,
    bind_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    vbuf: wgpu::Buffer,
    params: wgpu::Buffer,
    photo: Option<PhotoTexture>,
    max_texture_dim: u32,
    surface_lost: bool,
    device_lost: Arc<AtomicBool>,
}

impl Gpu {
    pub fn new(window: Arc<Window>, cfg: &Configuration) -> Result<Self> {
        let instance = wgpu::Instance::default();
        let surface = instance
            .create_surface(window.clone())
            .context("failed to create surface")?;
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("no compatible GPU adapter found")?;

        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .copied()
            .find(wgpu::TextureFormat::is_srgb)
            .or_else(|| caps.formats.first().copied())
            .context("surface reports no supported formats")?;
        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let limits = adapter.limits();
        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("pan-zoom-device"),
            required_features: wgpu::Features::empty(),
            required_limits: limits,
            ..Default::default()
        }))
        .context("failed to acquire GPU device")?;

        let device_lost = Arc::new(AtomicBool::new(false));
        {
            let flag = device_lost.clone();
            device.set_device_lost_callback(move |reason, message| {
                error!(?reason, detail = %message, "GPU device lost");
                flag.store(true, Ordering::SeqCst);
            });
        }

        let size = window.inner_size();
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: if cfg.vsync {
                wgpu::PresentMode::AutoVsync
            } else {
                wgpu::PresentMode::AutoNoVsync
            },
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 1,
        };
        surface.configure(&device, &config);
        info!(
            width = config.width,
            height = config.height,
            format = ?config.format,
            present_mode = ?config.present_mode,
            "surface configured",
        );

        let device_max = device.limits().max_texture_dimension_2d;
        let max_texture_dim = cfg
            .max_texture_dimension
            .map_or(device_max, |max| max.min(device_max));

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("photo-sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let params = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("view-params"),
            contents: bytemuck::bytes_of(&ViewParams {
                uv_rect: [0.0, 0.0, 1.0, 1.0],
            }),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let vbuf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("quad"),
            contents: bytemuck::cast_slice(&QUAD),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("pan-zoom-shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/pan_zoom.wgsl").into()),
        });

        let bind_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("photo-bind-layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let vlayout = wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x2],
        };

        let pip_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("pan-zoom-pipeline-layout"),
            bind_group_layouts: &[&bind_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("pan-zoom-pipeline"),
            layout: Some(&pip_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[vlayout],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleStrip,
                strip_index_format: None,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            pipeline,
            bind_layout,
            sampler,
            vbuf,
            params,
            photo: None,
            max_texture_dim,
            surface_lost: false,
            device_lost,
        })
    }

    /// Current surface size in pixels.
    pub fn surface_size(&self) -> Size {
        Size::from_pixels(self.config.width, self.config.height)
    }

    /// Uploads `prepared` as the photo texture, replacing any previous one.
    pub fn upload(&mut self, prepared: &PreparedImage) {
        let (w, h) = prepared.size;
        let extent = wgpu::Extent3d {
            width: w,
            height: h,
            depth_or_array_layers: 1,
        };
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("photo"),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        self.queue.write_texture(
            texture.as_image_copy(),
            &prepared.pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * w),
                rows_per_image: Some(h),
            },
            extent,
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("photo-bind-group"),
            layout: &self.bind_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: self.params.as_entire_binding(),
                },
            ],
        });
        debug!(
            path = %prepared.path.display(),
            width = w,
            height = h,
            natural_width = prepared.natural.0,
            natural_height = prepared.natural.1,
            "photo texture uploaded"
        );
        self.photo = Some(PhotoTexture {
            _texture: texture,
            bind_group,
        });
    }

    /// Decodes and uploads the image at `path`.
    pub fn load_photo(&mut self, path: &Path) -> Result<(), Error> {
        let prepared = loader::load_rgba(path, self.max_texture_dim)?;
        self.upload(&prepared);
        Ok(())
    }

    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            debug!("ignoring resize to an empty surface");
            return;
        }
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);
        debug!(
            width = self.config.width,
            height = self.config.height,
            "surface resized"
        );
    }

    /// Draws one frame. A committed pick clears to `feedback` instead of drawing the photo.
    pub fn draw(&mut self, frame: &FrameOutput, feedback: wgpu::Color) -> Result<PresentOutcome> {
        if self.surface_lost {
            return Ok(PresentOutcome::Lost);
        }

        let target = match self.surface.get_current_texture() {
            Ok(target) => target,
            Err(err) => {
                return match acquire_failure(&err) {
                    AcquireFailure::Reconfigure => {
                        debug!("surface outdated; reconfiguring");
                        self.surface.configure(&self.device, &self.config);
                        Ok(PresentOutcome::Skipped)
                    }
                    AcquireFailure::Retry => {
                        warn!("surface acquisition timed out");
                        Ok(PresentOutcome::Skipped)
                    }
                    AcquireFailure::Lost => {
                        info!(error = ?err, "surface lost during acquire");
                        self.surface_lost = true;
                        Ok(PresentOutcome::Lost)
                    }
                    AcquireFailure::Fatal => bail!("surface out of memory"),
                };
            }
        };

        self.queue.write_buffer(
            &self.params,
            0,
            bytemuck::bytes_of(&ViewParams {
                uv_rect: frame.uv.as_array(),
            }),
        );

        let view = target
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("pan-zoom-encoder"),
            });
        {
            let clear = if frame.picked {
                feedback
            } else {
                wgpu::Color::BLACK
            };
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("pan-zoom-pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            if let (false, Some(photo)) = (frame.picked, self.photo.as_ref()) {
                rpass.set_pipeline(&self.pipeline);
                rpass.set_bind_group(0, &photo.bind_group, &[]);
                rpass.set_vertex_buffer(0, self.vbuf.slice(..));
                rpass.draw(0..4, 0..1);
            }
        }
        self.queue.submit([encoder.finish()]);
        self.window.pre_present_notify();
        target.present();
        Ok(PresentOutcome::Presented)
    }
}

impl PresentationSurface for Gpu {
    fn health(&mut self) -> SurfaceHealth {
        if self.device_lost.load(Ordering::SeqCst) {
            // Reset reports the failure.
            return SurfaceHealth::Resettable;
        }
        if !self.surface_lost {
            return SurfaceHealth::Ready;
        }
        let size = self.window.inner_size();
        if size.width == 0 || size.height == 0 {
            SurfaceHealth::Lost
        } else {
            SurfaceHealth::Resettable
        }
    }

    fn release_resources(&mut self) {
        if self.photo.take().is_some() {
            debug!("photo texture released");
        }
    }

    fn reset(&mut self) -> Result<(), Error> {
        if self.device_lost.load(Ordering::SeqCst) {
            return Err(Error::SurfaceResetFailed("GPU device was lost".into()));
        }
        let size = self.window.inner_size();
        if size.width == 0 || size.height == 0 {
            return Err(Error::SurfaceResetFailed("window has no drawable area".into()));
        }
        self.config.width = size.width;
        self.config.height = size.height;
        self.surface.configure(&self.device, &self.config);
        self.surface_lost = false;
        Ok(())
    }

    fn reload_resources(&mut self, path: &Path) -> Result<(), Error> {
        self.load_photo(path)
    }
}
