use std::sync::Arc;
use wgpu::util::DeviceExt;

use crate::model::Annotation;
use crate::render::camera::Camera;
use crate::render::vertex::{LineVertex, Vertex};
use crate::scene::{Aabb, SceneSet};

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

pub struct Renderer {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub surface: wgpu::Surface<'static>,
    pub surface_format: wgpu::TextureFormat,
    pub config: wgpu::SurfaceConfiguration,
    pub depth_view: wgpu::TextureView,

    pub camera: Camera,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,

    equipment_pipeline: wgpu::RenderPipeline,
    overlay_line_pipeline: wgpu::RenderPipeline,

    pub selection_color: [f32; 4],
    pub hover_color: [f32; 4],
    pub pin_color: [f32; 4],
}

impl Renderer {
    pub async fn new(window: Arc<winit::window::Window>) -> Self {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone()).expect("failed to create surface");

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .expect("no suitable GPU adapter found");

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                ..Default::default()
            })
            .await
            .expect("failed to create device");

        let size = window.inner_size();
        let caps = surface.get_capabilities(&adapter);
        let surface_format = caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_view = Self::create_depth_texture(&device, config.width, config.height);

        // Camera uniform
        let camera = Camera::new();
        let camera_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("camera_uniform"),
            size: 64, // mat4x4<f32>
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let camera_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("camera_bgl"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("camera_bg"),
            layout: &camera_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        // Equipment pipeline
        let equipment_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("equipment_shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/equipment.wgsl").into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("equipment_pipeline_layout"),
            bind_group_layouts: &[&camera_bind_group_layout],
            push_constant_ranges: &[],
        });

        let equipment_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("equipment_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &equipment_shader,
                entry_point: Some("vs_main"),
                buffers: &[Vertex::LAYOUT],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &equipment_shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: Some(wgpu::Face::Back),
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: Default::default(),
                bias: Default::default(),
            }),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        // Overlay line pipeline (outlines and pins render on top via depth bias)
        let line_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("line_shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/line.wgsl").into()),
        });

        let overlay_line_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("overlay_line_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &line_shader,
                entry_point: Some("vs_main"),
                buffers: &[LineVertex::LAYOUT],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &line_shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::LineList,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: false,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: Default::default(),
                bias: wgpu::DepthBiasState {
                    constant: -2,
                    slope_scale: -1.0,
                    clamp: 0.0,
                },
            }),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        Self {
            device,
            queue,
            surface,
            surface_format,
            config,
            depth_view,
            camera,
            camera_buffer,
            camera_bind_group,
            equipment_pipeline,
            overlay_line_pipeline,
            selection_color: [1.0, 0.85, 0.2, 1.0],
            hover_color: [0.5, 0.7, 1.0, 1.0],
            pin_color: [1.0, 0.55, 0.15, 1.0],
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.depth_view = Self::create_depth_texture(&self.device, width, height);
        self.camera.set_aspect(width as f32, height as f32);
    }

    /// Upload per-frame data (camera) before the render pass begins.
    pub fn prepare_frame(&mut self) {
        let vp = self.camera.view_projection();
        let vp_raw: [f32; 16] = vp.to_cols_array();
        self.queue.write_buffer(&self.camera_buffer, 0, bytemuck::cast_slice(&vp_raw));
    }

    /// Draw the ground plane and all visible equipment objects.
    pub fn render_scene<'a>(&'a self, pass: &mut wgpu::RenderPass<'a>, scene: &SceneSet) {
        pass.set_pipeline(&self.equipment_pipeline);
        pass.set_bind_group(0, &self.camera_bind_group, &[]);

        if scene.ground_in_scene
            && scene.ground.visible
            && let Some(mesh) = &scene.ground.gpu_mesh
        {
            pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
            pass.draw(0..mesh.vertex_count, 0..1);
        }

        for object in &scene.objects {
            if !object.visible {
                continue;
            }
            if let Some(mesh) = &object.gpu_mesh {
                pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                pass.draw(0..mesh.vertex_count, 0..1);
            }
        }
    }

    /// Outline the selected objects (and the hovered one, in its own color).
    pub fn render_highlights<'a>(
        &'a self,
        pass: &mut wgpu::RenderPass<'a>,
        scene: &SceneSet,
        selected_tags: &[String],
        hovered_tag: Option<&str>,
    ) {
        let mut line_verts: Vec<LineVertex> = Vec::new();

        for tag in selected_tags {
            if let Some(obj) = scene.object_by_tag(tag) {
                push_aabb_outline(&mut line_verts, &obj.aabb, self.selection_color);
            }
        }
        // Hover on top of a selected object keeps the selection color.
        if let Some(tag) = hovered_tag
            && !selected_tags.iter().any(|t| t == tag)
            && let Some(obj) = scene.object_by_tag(tag)
        {
            push_aabb_outline(&mut line_verts, &obj.aabb, self.hover_color);
        }

        self.draw_lines(pass, &line_verts);
    }

    /// Draw a small cross marker above every annotated, visible object.
    pub fn render_annotation_pins<'a>(
        &'a self,
        pass: &mut wgpu::RenderPass<'a>,
        scene: &SceneSet,
        annotations: &[Annotation],
    ) {
        let mut line_verts: Vec<LineVertex> = Vec::new();

        for annotation in annotations {
            let Some(obj) = scene.object_by_tag(&annotation.equipment_tag) else {
                continue;
            };
            if !obj.visible {
                continue;
            }
            let top = obj.aabb.center().with_y(obj.aabb.max.y);
            let tip = top + glam::Vec3::Y * 1.5;
            let s = 0.4;
            let c = self.pin_color;
            line_verts.push(LineVertex { position: top.into(), color: c });
            line_verts.push(LineVertex { position: tip.into(), color: c });
            line_verts.push(LineVertex { position: [tip.x - s, tip.y, tip.z], color: c });
            line_verts.push(LineVertex { position: [tip.x + s, tip.y, tip.z], color: c });
            line_verts.push(LineVertex { position: [tip.x, tip.y, tip.z - s], color: c });
            line_verts.push(LineVertex { position: [tip.x, tip.y, tip.z + s], color: c });
        }

        self.draw_lines(pass, &line_verts);
    }

    fn draw_lines<'a>(&'a self, pass: &mut wgpu::RenderPass<'a>, line_verts: &[LineVertex]) {
        if line_verts.is_empty() {
            return;
        }

        let buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("overlay_lines"),
            contents: bytemuck::cast_slice(line_verts),
            usage: wgpu::BufferUsages::VERTEX,
        });

        pass.set_pipeline(&self.overlay_line_pipeline);
        pass.set_bind_group(0, &self.camera_bind_group, &[]);
        pass.set_vertex_buffer(0, buffer.slice(..));
        pass.draw(0..line_verts.len() as u32, 0..1);
    }

    fn create_depth_texture(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth_texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        texture.create_view(&Default::default())
    }
}

/// The 12 edges of a box, slightly inflated so the outline clears the faces.
fn push_aabb_outline(out: &mut Vec<LineVertex>, aabb: &Aabb, color: [f32; 4]) {
    let pad = 0.05;
    let min = aabb.min - glam::Vec3::splat(pad);
    let max = aabb.max + glam::Vec3::splat(pad);

    let corners = [
        [min.x, min.y, min.z],
        [max.x, min.y, min.z],
        [max.x, min.y, max.z],
        [min.x, min.y, max.z],
        [min.x, max.y, min.z],
        [max.x, max.y, min.z],
        [max.x, max.y, max.z],
        [min.x, max.y, max.z],
    ];
    const EDGES: [(usize, usize); 12] = [
        (0, 1), (1, 2), (2, 3), (3, 0), // bottom
        (4, 5), (5, 6), (6, 7), (7, 4), // top
        (0, 4), (1, 5), (2, 6), (3, 7), // verticals
    ];

    for (a, b) in EDGES {
        out.push(LineVertex { position: corners[a], color });
        out.push(LineVertex { position: corners[b], color });
    }
}
