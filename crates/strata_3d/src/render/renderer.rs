//! wgpu scene renderer

use std::sync::Arc;

use wgpu::util::DeviceExt;

use super::overlay::{pack_overlay, OverlayInstance, OverlayQuad};
use super::pipelines::{Pipelines, DEPTH_FORMAT, SCENE_FORMAT};
use super::uniforms::{align_to, pack_scene, FrameUniform, ObjectUniform, ScreenUniform};
use super::{FrameRenderer, RenderQuality, SurfaceSize};
use crate::error::RenderError;
use crate::scene::Scene;

/// Uploaded geometry
struct GpuGeometry {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

/// Offscreen scene color + depth at the capped pixel ratio
struct SceneTarget {
    color: wgpu::Texture,
    depth: wgpu::Texture,
    color_view: wgpu::TextureView,
    depth_view: wgpu::TextureView,
    composite_bind_group: wgpu::BindGroup,
    size: (u32, u32),
}

struct Gpu {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    pipelines: Pipelines,
    sampler: wgpu::Sampler,
    geometries: Vec<GpuGeometry>,
    frame_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    object_buffer: wgpu::Buffer,
    object_bind_group: wgpu::BindGroup,
    object_stride: u64,
    object_capacity: usize,
    screen_buffer: wgpu::Buffer,
    overlay_bind_group: wgpu::BindGroup,
    overlay_buffer: wgpu::Buffer,
    overlay_capacity: usize,
    target: SceneTarget,
    encode_srgb: bool,
}

/// Draws a [`Scene`] and its overlay into a window surface
pub struct SceneRenderer {
    gpu: Option<Gpu>,
    size: SurfaceSize,
    quality: RenderQuality,
}

impl SceneRenderer {
    /// Get the preferred backend for the current platform
    fn preferred_backends() -> wgpu::Backends {
        #[cfg(target_os = "macos")]
        {
            wgpu::Backends::METAL
        }
        #[cfg(target_os = "windows")]
        {
            wgpu::Backends::DX12
        }
        #[cfg(not(any(target_os = "macos", target_os = "windows")))]
        {
            wgpu::Backends::PRIMARY
        }
    }

    /// Create a renderer drawing into `window`
    pub async fn with_surface<W>(
        window: Arc<W>,
        size: SurfaceSize,
        quality: RenderQuality,
        scene: &Scene,
    ) -> Result<Self, RenderError>
    where
        W: raw_window_handle::HasWindowHandle
            + raw_window_handle::HasDisplayHandle
            + Send
            + Sync
            + 'static,
    {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: Self::preferred_backends(),
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
            .ok_or(RenderError::AdapterNotFound)?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Strata GPU Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::MemoryUsage,
                },
                None,
            )
            .await?;

        let caps = surface.get_capabilities(&adapter);
        let first = caps.formats.first().copied().ok_or(RenderError::NoSurfaceFormat)?;
        // Non-sRGB on macOS; the screen shaders encode themselves there
        #[cfg(target_os = "macos")]
        let format = caps.formats.iter().copied().find(|f| !f.is_srgb()).unwrap_or(first);
        #[cfg(not(target_os = "macos"))]
        let format = caps.formats.iter().copied().find(|f| f.is_srgb()).unwrap_or(first);

        let (width, height) = size.physical();
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width,
            height,
            present_mode: wgpu::PresentMode::AutoVsync,
            desired_maximum_frame_latency: 2,
            alpha_mode: caps.alpha_modes.first().copied().unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
        };
        surface.configure(&device, &config);

        let pipelines = Pipelines::new(&device, format);
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("strata_scene_sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let frame_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("strata_frame_uniforms"),
            size: std::mem::size_of::<FrameUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("strata_frame_bind_group"),
            layout: &pipelines.layouts.frame,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_buffer.as_entire_binding(),
            }],
        });

        let screen_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("strata_screen_uniforms"),
            size: std::mem::size_of::<ScreenUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let overlay_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("strata_overlay_bind_group"),
            layout: &pipelines.layouts.overlay,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: screen_buffer.as_entire_binding(),
            }],
        });

        let alignment = device.limits().min_uniform_buffer_offset_alignment as u64;
        let object_stride = align_to(std::mem::size_of::<ObjectUniform>() as u64, alignment);
        let object_capacity = scene.meshes().len().max(1);
        let (object_buffer, object_bind_group) =
            create_object_buffer(&device, &pipelines, object_stride, object_capacity);

        let overlay_capacity = 16;
        let overlay_buffer = create_overlay_buffer(&device, overlay_capacity);

        let target = create_target(
            &device,
            &pipelines,
            &screen_buffer,
            &sampler,
            quality.target_size(&size),
        );

        let mut gpu = Gpu {
            surface,
            device,
            queue,
            config,
            pipelines,
            sampler,
            geometries: Vec::new(),
            frame_buffer,
            frame_bind_group,
            object_buffer,
            object_bind_group,
            object_stride,
            object_capacity,
            screen_buffer,
            overlay_bind_group,
            overlay_buffer,
            overlay_capacity,
            target,
            encode_srgb: !format.is_srgb(),
        };
        gpu.upload_geometries(scene);

        let info = adapter.get_info();
        tracing::info!(
            "renderer ready: {} ({:?}), surface {:?} {}x{}, scene target {:?}",
            info.name,
            info.backend,
            format,
            width,
            height,
            gpu.target.size
        );

        Ok(Self {
            gpu: Some(gpu),
            size,
            quality,
        })
    }

    /// Offscreen target size in pixels, `None` once disposed
    pub fn target_size(&self) -> Option<(u32, u32)> {
        self.gpu.as_ref().map(|gpu| gpu.target.size)
    }

    fn rebuild_target(&mut self) {
        let size = self.quality.target_size(&self.size);
        if let Some(gpu) = self.gpu.as_mut() {
            if gpu.target.size == size {
                return;
            }
            let target = create_target(
                &gpu.device,
                &gpu.pipelines,
                &gpu.screen_buffer,
                &gpu.sampler,
                size,
            );
            let old = std::mem::replace(&mut gpu.target, target);
            old.color.destroy();
            old.depth.destroy();
            tracing::debug!("scene target resized to {}x{}", size.0, size.1);
        }
    }
}

impl Gpu {
    fn upload_geometries(&mut self, scene: &Scene) {
        for geometry in scene.geometries().iter().skip(self.geometries.len()) {
            let vertex_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("strata_vertices"),
                contents: bytemuck::cast_slice(&geometry.vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
            let index_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("strata_indices"),
                contents: bytemuck::cast_slice(&geometry.indices),
                usage: wgpu::BufferUsages::INDEX,
            });
            self.geometries.push(GpuGeometry {
                vertex_buffer,
                index_buffer,
                index_count: geometry.index_count(),
            });
        }
    }

    fn ensure_object_capacity(&mut self, count: usize) {
        if count <= self.object_capacity {
            return;
        }
        let capacity = count.next_power_of_two();
        let (buffer, bind_group) =
            create_object_buffer(&self.device, &self.pipelines, self.object_stride, capacity);
        let old = std::mem::replace(&mut self.object_buffer, buffer);
        old.destroy();
        self.object_bind_group = bind_group;
        self.object_capacity = capacity;
    }

    fn ensure_overlay_capacity(&mut self, count: usize) {
        if count <= self.overlay_capacity {
            return;
        }
        let capacity = count.next_power_of_two();
        let buffer = create_overlay_buffer(&self.device, capacity);
        let old = std::mem::replace(&mut self.overlay_buffer, buffer);
        old.destroy();
        self.overlay_capacity = capacity;
    }

    fn destroy(self) {
        for geometry in &self.geometries {
            geometry.vertex_buffer.destroy();
            geometry.index_buffer.destroy();
        }
        self.frame_buffer.destroy();
        self.object_buffer.destroy();
        self.screen_buffer.destroy();
        self.overlay_buffer.destroy();
        self.target.color.destroy();
        self.target.depth.destroy();
        // Surface, pipelines and device drop here
    }
}

fn create_object_buffer(
    device: &wgpu::Device,
    pipelines: &Pipelines,
    stride: u64,
    capacity: usize,
) -> (wgpu::Buffer, wgpu::BindGroup) {
    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("strata_object_uniforms"),
        size: stride * capacity as u64,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("strata_object_bind_group"),
        layout: &pipelines.layouts.object,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                buffer: &buffer,
                offset: 0,
                size: wgpu::BufferSize::new(std::mem::size_of::<ObjectUniform>() as u64),
            }),
        }],
    });
    (buffer, bind_group)
}

fn create_overlay_buffer(device: &wgpu::Device, capacity: usize) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("strata_overlay_instances"),
        size: (std::mem::size_of::<OverlayInstance>() * capacity) as u64,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn create_target(
    device: &wgpu::Device,
    pipelines: &Pipelines,
    screen_buffer: &wgpu::Buffer,
    sampler: &wgpu::Sampler,
    size: (u32, u32),
) -> SceneTarget {
    let extent = wgpu::Extent3d {
        width: size.0,
        height: size.1,
        depth_or_array_layers: 1,
    };
    let texture = |label: &str, format: wgpu::TextureFormat, usage: wgpu::TextureUsages| {
        device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage,
            view_formats: &[],
        })
    };
    let color = texture(
        "strata_scene_color",
        SCENE_FORMAT,
        wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
    );
    let depth = texture(
        "strata_scene_depth",
        DEPTH_FORMAT,
        wgpu::TextureUsages::RENDER_ATTACHMENT,
    );
    let color_view = color.create_view(&wgpu::TextureViewDescriptor::default());
    let depth_view = depth.create_view(&wgpu::TextureViewDescriptor::default());

    let composite_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("strata_composite_bind_group"),
        layout: &pipelines.layouts.composite,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: screen_buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(&color_view),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    });

    SceneTarget {
        color,
        depth,
        color_view,
        depth_view,
        composite_bind_group,
        size,
    }
}

impl FrameRenderer for SceneRenderer {
    fn resize(&mut self, size: SurfaceSize) {
        self.size = size;
        if let Some(gpu) = self.gpu.as_mut() {
            let (width, height) = size.physical();
            if gpu.config.width != width || gpu.config.height != height {
                gpu.config.width = width;
                gpu.config.height = height;
                gpu.surface.configure(&gpu.device, &gpu.config);
            }
        }
        self.rebuild_target();
    }

    fn set_quality(&mut self, quality: RenderQuality) {
        if self.quality != quality {
            tracing::info!("render quality: pixel ratio cap {}", quality.pixel_ratio_cap);
            self.quality = quality;
            self.rebuild_target();
        }
    }

    fn render(&mut self, scene: &Scene, overlay: &[OverlayQuad]) -> Result<(), RenderError> {
        let size = self.size;
        let gpu = self.gpu.as_mut().ok_or(RenderError::Disposed)?;

        gpu.upload_geometries(scene);
        let (frame, objects, draws) = pack_scene(scene);
        gpu.ensure_object_capacity(objects.len());
        let instances = pack_overlay(overlay);
        gpu.ensure_overlay_capacity(instances.len());

        gpu.queue
            .write_buffer(&gpu.frame_buffer, 0, bytemuck::bytes_of(&frame));
        if !objects.is_empty() {
            let stride = gpu.object_stride as usize;
            let mut bytes = vec![0u8; stride * objects.len()];
            for (i, object) in objects.iter().enumerate() {
                let start = i * stride;
                bytes[start..start + std::mem::size_of::<ObjectUniform>()]
                    .copy_from_slice(bytemuck::bytes_of(object));
            }
            gpu.queue.write_buffer(&gpu.object_buffer, 0, &bytes);
        }
        if !instances.is_empty() {
            gpu.queue
                .write_buffer(&gpu.overlay_buffer, 0, bytemuck::cast_slice(&instances));
        }
        let screen = ScreenUniform {
            size: [size.width.max(1.0), size.height.max(1.0)],
            encode_srgb: if gpu.encode_srgb { 1.0 } else { 0.0 },
            _pad: 0.0,
        };
        gpu.queue
            .write_buffer(&gpu.screen_buffer, 0, bytemuck::bytes_of(&screen));

        let output = match gpu.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu.surface.configure(&gpu.device, &gpu.config);
                return Ok(());
            }
            Err(wgpu::SurfaceError::OutOfMemory) => return Err(RenderError::OutOfMemory),
            Err(err) => {
                tracing::warn!("surface error: {}", err);
                return Ok(());
            }
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("strata_frame"),
            });

        {
            let [r, g, b, a] = scene.background().to_wgpu_f64();
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("strata_scene_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &gpu.target.color_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &gpu.target.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            pass.set_bind_group(0, &gpu.frame_bind_group, &[]);
            let mut blended = None;
            for draw in &draws {
                let Some(geometry) = gpu.geometries.get(draw.geometry.0 as usize) else {
                    continue;
                };
                if blended != Some(draw.blended) {
                    let pipeline = if draw.blended {
                        &gpu.pipelines.mesh_blended
                    } else {
                        &gpu.pipelines.mesh_opaque
                    };
                    pass.set_pipeline(pipeline);
                    blended = Some(draw.blended);
                }
                let offset = (draw.slot as u64 * gpu.object_stride) as u32;
                pass.set_bind_group(1, &gpu.object_bind_group, &[offset]);
                pass.set_vertex_buffer(0, geometry.vertex_buffer.slice(..));
                pass.set_index_buffer(geometry.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..geometry.index_count, 0, 0..1);
            }
        }

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("strata_screen_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
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

            pass.set_pipeline(&gpu.pipelines.composite);
            pass.set_bind_group(0, &gpu.target.composite_bind_group, &[]);
            pass.draw(0..3, 0..1);

            if !instances.is_empty() {
                pass.set_pipeline(&gpu.pipelines.overlay);
                pass.set_bind_group(0, &gpu.overlay_bind_group, &[]);
                pass.set_vertex_buffer(0, gpu.overlay_buffer.slice(..));
                pass.draw(0..6, 0..instances.len() as u32);
            }
        }

        gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }

    fn dispose(&mut self) {
        if let Some(gpu) = self.gpu.take() {
            gpu.destroy();
            tracing::info!("renderer disposed");
        }
    }

    fn is_disposed(&self) -> bool {
        self.gpu.is_none()
    }
}

impl Drop for SceneRenderer {
    fn drop(&mut self) {
        self.dispose();
    }
}
