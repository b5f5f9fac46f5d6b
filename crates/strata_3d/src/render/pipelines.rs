//! Render pipelines and bind group layouts

use std::num::NonZeroU64;

use super::overlay::OverlayInstance;
use super::shaders::{COMPOSITE_SHADER, MESH_SHADER, OVERLAY_SHADER};
use super::uniforms::{FrameUniform, ObjectUniform, ScreenUniform};
use crate::geometry::Vertex;

/// Offscreen scene color format (linear, HDR headroom for emissive)
pub const SCENE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Blend configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum BlendConfig {
    Opaque,
    Alpha,
}

pub(crate) struct BindGroupLayouts {
    pub frame: wgpu::BindGroupLayout,
    pub object: wgpu::BindGroupLayout,
    pub composite: wgpu::BindGroupLayout,
    pub overlay: wgpu::BindGroupLayout,
}

pub(crate) struct Pipelines {
    pub layouts: BindGroupLayouts,
    pub mesh_opaque: wgpu::RenderPipeline,
    pub mesh_blended: wgpu::RenderPipeline,
    pub composite: wgpu::RenderPipeline,
    pub overlay: wgpu::RenderPipeline,
}

fn uniform_entry(
    binding: u32,
    visibility: wgpu::ShaderStages,
    size: usize,
    dynamic: bool,
) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: dynamic,
            min_binding_size: NonZeroU64::new(size as u64),
        },
        count: None,
    }
}

impl Pipelines {
    pub fn new(device: &wgpu::Device, surface_format: wgpu::TextureFormat) -> Self {
        let both = wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT;
        let layouts = BindGroupLayouts {
            frame: device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("strata_frame_layout"),
                entries: &[uniform_entry(0, both, std::mem::size_of::<FrameUniform>(), false)],
            }),
            object: device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("strata_object_layout"),
                entries: &[uniform_entry(0, both, std::mem::size_of::<ObjectUniform>(), true)],
            }),
            composite: device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("strata_composite_layout"),
                entries: &[
                    uniform_entry(
                        0,
                        wgpu::ShaderStages::FRAGMENT,
                        std::mem::size_of::<ScreenUniform>(),
                        false,
                    ),
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 2,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
            }),
            overlay: device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("strata_overlay_layout"),
                entries: &[uniform_entry(0, both, std::mem::size_of::<ScreenUniform>(), false)],
            }),
        };

        let mesh_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Strata Mesh Shader"),
            source: wgpu::ShaderSource::Wgsl(MESH_SHADER.into()),
        });
        let composite_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Strata Composite Shader"),
            source: wgpu::ShaderSource::Wgsl(COMPOSITE_SHADER.into()),
        });
        let overlay_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Strata Overlay Shader"),
            source: wgpu::ShaderSource::Wgsl(OVERLAY_SHADER.into()),
        });

        let mesh_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("strata_mesh_layout"),
            bind_group_layouts: &[&layouts.frame, &layouts.object],
            push_constant_ranges: &[],
        });
        let mesh_opaque = Self::create_mesh_pipeline(
            device,
            &mesh_shader,
            &mesh_layout,
            "mesh_opaque",
            BlendConfig::Opaque,
        );
        let mesh_blended = Self::create_mesh_pipeline(
            device,
            &mesh_shader,
            &mesh_layout,
            "mesh_blended",
            BlendConfig::Alpha,
        );

        let composite_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("strata_composite_pipeline_layout"),
            bind_group_layouts: &[&layouts.composite],
            push_constant_ranges: &[],
        });
        let composite = Self::create_screen_pipeline(
            device,
            &composite_shader,
            &composite_layout,
            surface_format,
            "composite",
            &[],
            BlendConfig::Opaque,
        );

        let overlay_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("strata_overlay_pipeline_layout"),
            bind_group_layouts: &[&layouts.overlay],
            push_constant_ranges: &[],
        });
        let overlay = Self::create_screen_pipeline(
            device,
            &overlay_shader,
            &overlay_layout,
            surface_format,
            "overlay",
            &[OverlayInstance::layout()],
            BlendConfig::Alpha,
        );

        Self {
            layouts,
            mesh_opaque,
            mesh_blended,
            composite,
            overlay,
        }
    }

    fn blend_state(blend: BlendConfig) -> Option<wgpu::BlendState> {
        match blend {
            BlendConfig::Opaque => None,
            BlendConfig::Alpha => Some(wgpu::BlendState::ALPHA_BLENDING),
        }
    }

    /// Lit mesh pipeline into the offscreen target
    ///
    /// Blended meshes test depth but do not write it, so stacked translucent
    /// layers all show.
    fn create_mesh_pipeline(
        device: &wgpu::Device,
        shader: &wgpu::ShaderModule,
        layout: &wgpu::PipelineLayout,
        label: &str,
        blend: BlendConfig,
    ) -> wgpu::RenderPipeline {
        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(layout),
            vertex: wgpu::VertexState {
                module: shader,
                entry_point: Some("vs_main"),
                buffers: &[Vertex::layout()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: SCENE_FORMAT,
                    blend: Self::blend_state(blend),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
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
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: blend == BlendConfig::Opaque,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        })
    }

    /// Pipeline drawing straight into the window surface
    fn create_screen_pipeline(
        device: &wgpu::Device,
        shader: &wgpu::ShaderModule,
        layout: &wgpu::PipelineLayout,
        surface_format: wgpu::TextureFormat,
        label: &str,
        buffers: &[wgpu::VertexBufferLayout<'_>],
        blend: BlendConfig,
    ) -> wgpu::RenderPipeline {
        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(layout),
            vertex: wgpu::VertexState {
                module: shader,
                entry_point: Some("vs_main"),
                buffers,
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Self::blend_state(blend),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        })
    }
}
