//! WebGPU render pipeline setup

use glam::Vec3;
use wgpu::util::DeviceExt;

use super::helpers::{LineVertex, helper_lines};
use super::mesh::{unit_cube, unit_plane};
use super::vertex::{InstanceRaw, SceneUniform, Vertex};
use crate::camera::Camera;
use crate::error::RenderError;
use crate::hex_to_rgba;
use crate::settings::{LightSettings, Settings};
use crate::sim::{EntityRegistry, FrameRenderer, Geometry};

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
const INITIAL_INSTANCE_CAPACITY: usize = 256;

/// Static vertex buffer: a unit mesh drawn per instance, or the helper lines
struct Mesh {
    buffer: wgpu::Buffer,
    vertex_count: u32,
}

impl Mesh {
    fn new<V: bytemuck::Pod>(device: &wgpu::Device, label: &str, vertices: &[V]) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        Self {
            buffer,
            vertex_count: vertices.len() as u32,
        }
    }
}

/// Main render state
pub struct RenderState {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub pipeline: wgpu::RenderPipeline,
    pub line_pipeline: wgpu::RenderPipeline,
    /// Viewport size in pixels
    pub size: (u32, u32),
    depth_view: wgpu::TextureView,
    scene_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    cube: Mesh,
    plane: Mesh,
    /// Grid, axes and light marker; `None` when all are switched off
    helpers: Option<Mesh>,
    instance_buffer: wgpu::Buffer,
    instance_capacity: usize,
    instances: Vec<InstanceRaw>,
    clear_color: wgpu::Color,
    lights: LightSettings,
}

impl RenderState {
    pub async fn new(
        surface: wgpu::Surface<'static>,
        adapter: &wgpu::Adapter,
        width: u32,
        height: u32,
        settings: &Settings,
    ) -> Result<Self, RenderError> {
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("box-drop-device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_webgl2_defaults(),
                memory_hints: Default::default(),
                trace: Default::default(),
                experimental_features: Default::default(),
            })
            .await?;

        let surface_caps = surface.get_capabilities(adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or(RenderError::NoSurfaceFormat)?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let width = width.max(1);
        let height = height.max(1);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        log::info!("Surface configured: {:?} {}x{}", surface_format, width, height);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("scene_shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("scene_shader.wgsl").into()),
        });

        let scene_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("scene"),
            size: std::mem::size_of::<SceneUniform>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("scene_bind_group_layout"),
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

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("scene_bind_group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: scene_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("scene_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("scene_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[Vertex::desc(), InstanceRaw::desc()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                // The ground is a single quad seen from both sides once tilted
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        let line_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("line_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_line"),
                buffers: &[LineVertex::desc()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_line"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: Some(wgpu::BlendState::REPLACE),
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
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        let depth_view = create_depth_view(&device, width, height);
        let cube = Mesh::new(&device, "cube_vertices", &unit_cube());
        let plane = Mesh::new(&device, "plane_vertices", &unit_plane());
        let lines: Vec<LineVertex> = helper_lines(settings)
            .into_iter()
            .map(|v| LineVertex {
                color: to_surface_color(v.color, surface_format),
                ..v
            })
            .collect();
        let helpers = (!lines.is_empty()).then(|| Mesh::new(&device, "helper_lines", &lines));
        let instance_buffer = create_instance_buffer(&device, INITIAL_INSTANCE_CAPACITY);

        let clear = to_surface_color(hex_to_rgba(settings.clear_color), surface_format);
        let clear_color = wgpu::Color {
            r: clear[0] as f64,
            g: clear[1] as f64,
            b: clear[2] as f64,
            a: 1.0,
        };

        Ok(Self {
            surface,
            device,
            queue,
            config,
            pipeline,
            line_pipeline,
            size: (width, height),
            depth_view,
            scene_buffer,
            bind_group,
            cube,
            plane,
            helpers,
            instance_buffer,
            instance_capacity: INITIAL_INSTANCE_CAPACITY,
            instances: Vec::with_capacity(INITIAL_INSTANCE_CAPACITY),
            clear_color,
            lights: settings.lights.clone(),
        })
    }

    pub fn resize(&mut self, new_width: u32, new_height: u32) {
        if new_width > 0 && new_height > 0 {
            self.size = (new_width, new_height);
            self.config.width = new_width;
            self.config.height = new_height;
            self.surface.configure(&self.device, &self.config);
            self.depth_view = create_depth_view(&self.device, new_width, new_height);
        }
    }

    /// Viewport aspect ratio
    pub fn aspect(&self) -> f32 {
        self.size.0 as f32 / self.size.1.max(1) as f32
    }

    /// Upload instances and uniforms, then draw planes, cuboids and helper lines
    pub fn render(
        &mut self,
        entities: &EntityRegistry,
        camera: &Camera,
    ) -> Result<(), wgpu::SurfaceError> {
        let plane_count = self.collect_instances(entities);
        let cube_count = self.instances.len() - plane_count;

        if self.instances.len() > self.instance_capacity {
            self.instance_capacity = self.instances.len().next_power_of_two();
            self.instance_buffer = create_instance_buffer(&self.device, self.instance_capacity);
        }
        if !self.instances.is_empty() {
            self.queue
                .write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&self.instances));
        }

        let uniform = scene_uniform(camera, &self.lights, self.config.format);
        self.queue
            .write_buffer(&self.scene_buffer, 0, bytemuck::bytes_of(&uniform));

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("scene_encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scene_render_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            render_pass.set_pipeline(&self.pipeline);
            render_pass.set_bind_group(0, &self.bind_group, &[]);
            render_pass.set_vertex_buffer(1, self.instance_buffer.slice(..));

            if plane_count > 0 {
                render_pass.set_vertex_buffer(0, self.plane.buffer.slice(..));
                render_pass.draw(0..self.plane.vertex_count, 0..plane_count as u32);
            }
            if cube_count > 0 {
                let first = plane_count as u32;
                render_pass.set_vertex_buffer(0, self.cube.buffer.slice(..));
                render_pass.draw(0..self.cube.vertex_count, first..first + cube_count as u32);
            }
            if let Some(helpers) = &self.helpers {
                render_pass.set_pipeline(&self.line_pipeline);
                render_pass.set_vertex_buffer(0, helpers.buffer.slice(..));
                render_pass.draw(0..helpers.vertex_count, 0..1);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }

    /// Fill `instances` with planes first; returns the plane count
    fn collect_instances(&mut self, entities: &EntityRegistry) -> usize {
        self.instances.clear();
        self.instances.extend(
            entities
                .iter()
                .filter(|e| matches!(e.visual.geometry, Geometry::Plane { .. }))
                .map(InstanceRaw::from_entity),
        );
        let planes = self.instances.len();
        self.instances.extend(
            entities
                .iter()
                .filter(|e| matches!(e.visual.geometry, Geometry::Cuboid { .. }))
                .map(InstanceRaw::from_entity),
        );
        planes
    }
}

impl FrameRenderer for RenderState {
    fn render_frame(&mut self, entities: &EntityRegistry, camera: &Camera) {
        match self.render(entities, camera) {
            Ok(_) => {}
            Err(wgpu::SurfaceError::Lost) | Err(wgpu::SurfaceError::Outdated) => {
                self.resize(self.size.0, self.size.1);
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("Out of memory!");
            }
            Err(e) => log::warn!("Render error: {:?}", e),
        }
    }
}

fn create_depth_view(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("depth"),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

fn create_instance_buffer(device: &wgpu::Device, capacity: usize) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("instances"),
        size: (capacity * std::mem::size_of::<InstanceRaw>()) as wgpu::BufferAddress,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

/// Camera matrix plus light terms, colours converted for the surface format
fn scene_uniform(camera: &Camera, lights: &LightSettings, format: wgpu::TextureFormat) -> SceneUniform {
    let toward_light = lights.directional_position.try_normalize().unwrap_or(Vec3::Y);
    let scaled = |hex: u32, intensity: f32| {
        let c = to_surface_color(hex_to_rgba(hex), format);
        [c[0] * intensity, c[1] * intensity, c[2] * intensity, 1.0]
    };
    SceneUniform {
        view_proj: camera.view_projection().to_cols_array_2d(),
        light_dir: toward_light.extend(0.0).to_array(),
        light_color: scaled(lights.directional_color, lights.directional_intensity),
        ambient: scaled(lights.ambient_color, lights.ambient_intensity),
    }
}

/// sRGB surfaces encode on write, so hex colours go in linear
fn to_surface_color(rgba: [f32; 4], format: wgpu::TextureFormat) -> [f32; 4] {
    if !format.is_srgb() {
        return rgba;
    }
    let linear = |c: f32| {
        if c <= 0.04045 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    };
    [linear(rgba[0]), linear(rgba[1]), linear(rgba[2]), rgba[3]]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surface_color_passthrough_for_linear_formats() {
        let c = [0.2, 0.4, 0.6, 1.0];
        assert_eq!(to_surface_color(c, wgpu::TextureFormat::Bgra8Unorm), c);
    }

    #[test]
    fn test_surface_color_linearised_for_srgb() {
        let c = to_surface_color([1.0, 0.5, 0.0, 1.0], wgpu::TextureFormat::Bgra8UnormSrgb);
        assert!((c[0] - 1.0).abs() < 1e-5);
        assert!((c[1] - 0.214).abs() < 1e-3);
        assert_eq!(c[2], 0.0);
    }

    #[test]
    fn test_scene_uniform_light_points_towards_source() {
        let lights = LightSettings::default();
        let uniform = scene_uniform(&Camera::default(), &lights, wgpu::TextureFormat::Rgba8Unorm);
        let dir = Vec3::new(uniform.light_dir[0], uniform.light_dir[1], uniform.light_dir[2]);
        assert!((dir.length() - 1.0).abs() < 1e-5);
        assert!(dir.dot(lights.directional_position) > 0.0);
    }
}
