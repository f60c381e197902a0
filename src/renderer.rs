//! GPU rendering of the cube viewport.
//!
//! This module owns every wgpu resource of the viewport: the depth buffer,
//! the clear quad that paints the widget background, and the instanced
//! pipeline drawing one box per visible piece plus the floor and its button.

use iced::widget::shader::wgpu::{self, CommandEncoder, Device, Queue, TextureFormat, TextureView};
use iced::{Rectangle, Size};
use nalgebra::{Isometry3, Matrix4, Translation3, UnitQuaternion, Vector3};
use wgpu::util::DeviceExt;

use cubetutor::camera::{Camera, CameraUniform, Projection};
use cubetutor::cube::{CUBE_SIZE, CUBE_VERTICES, PIECE_PITCH};
use cubetutor::pick::{
    FLOOR_BUTTON_HALF_EXTENTS, FLOOR_HALF_EXTENTS, floor_button_transform, floor_transform,
};
use cubetutor::scene::{FaceNormalMarker, MarkerRole, Scene};

/// 27 pieces, six face-normal markers, the floor and the button.
const MAX_INSTANCES: usize = 35;

/// Distance of a face-normal marker from the cube center.
const MARKER_DISTANCE: f32 = 1.5 * PIECE_PITCH + 0.4;

const MARKER_HALF_EXTENTS: Vector3<f32> = Vector3::new(0.12, 0.12, 0.12);

const FLOOR_COLOR: [f32; 4] = [0.55, 0.55, 0.58, 1.0];
const BUTTON_COLOR: [f32; 4] = [0.72, 0.72, 0.75, 1.0];

/// GPU renderer for the cube viewport.
#[derive(Debug)]
pub(crate) struct Renderer {
    /// Bounds within the viewport to render to, in physical pixels.
    bounds: Rectangle<f32>,
    render_pipeline: wgpu::RenderPipeline,
    vertex_buffer: wgpu::Buffer,
    instance_buffer: wgpu::Buffer,
    num_instances: u32,
    camera_uniform: CameraUniform,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    depth_texture: wgpu::Texture,
    depth_view: wgpu::TextureView,
    clear_pipeline: wgpu::RenderPipeline,
    clear_vertex_buffer: wgpu::Buffer,
    clear_index_buffer: wgpu::Buffer,
}

/// Per-instance data: a model matrix and one color per face slot.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub(crate) struct InstanceRaw {
    model: [[f32; 4]; 4],
    colors: [[f32; 4]; 6],
}

impl InstanceRaw {
    /// A box spanning `half_extents` around `transform`, one color on every
    /// face.
    fn slab(transform: &Isometry3<f32>, half_extents: Vector3<f32>, color: [f32; 4]) -> Self {
        let model = transform.to_homogeneous() * Matrix4::new_nonuniform_scaling(&half_extents);
        Self {
            model: model.into(),
            colors: [color; 6],
        }
    }
}

fn marker_color(role: MarkerRole) -> [f32; 4] {
    match role {
        MarkerRole::Front => [0.95, 0.3, 0.3, 1.0],
        MarkerRole::Top => [0.3, 0.9, 0.35, 1.0],
        MarkerRole::Left => [0.3, 0.45, 0.95, 1.0],
        MarkerRole::Other => [0.35, 0.35, 0.38, 1.0],
    }
}

/// A small box just off the face a marker points out of, colored by the
/// role that face currently plays.
fn marker_instance(scene: &Scene, marker: &FaceNormalMarker) -> InstanceRaw {
    let local = Isometry3::from_parts(
        Translation3::from(marker.key.vector() * MARKER_DISTANCE),
        UnitQuaternion::identity(),
    );
    let world = Isometry3::from_parts(Translation3::identity(), scene.cube_rotation()) * local;
    InstanceRaw::slab(&world, MARKER_HALF_EXTENTS, marker_color(marker.role))
}

/// Builds the instances for every visible piece of `scene` and its
/// face-normal markers, followed by the floor and its button.
pub(crate) fn generate_instances(scene: Option<&Scene>) -> Vec<InstanceRaw> {
    let scale = Matrix4::new_scaling(CUBE_SIZE / 2.0);
    let mut instances: Vec<InstanceRaw> = scene
        .into_iter()
        .flat_map(|scene| {
            scene
                .pieces()
                .iter()
                .filter(|piece| piece.visible)
                .filter_map(move |piece| {
                    let world = scene.piece_world(piece.id)?;
                    Some(InstanceRaw {
                        model: (world.to_homogeneous() * scale).into(),
                        colors: piece.stickers.map(|sticker| sticker.display_color().into()),
                    })
                })
        })
        .collect();

    if let Some(scene) = scene {
        instances.extend(scene.markers().iter().map(|marker| marker_instance(scene, marker)));
    }
    instances.push(InstanceRaw::slab(&floor_transform(), FLOOR_HALF_EXTENTS, FLOOR_COLOR));
    instances.push(InstanceRaw::slab(
        &floor_button_transform(),
        FLOOR_BUTTON_HALF_EXTENTS,
        BUTTON_COLOR,
    ));
    instances
}

fn create_depth_texture(device: &Device, size: Size<u32>) -> (wgpu::Texture, wgpu::TextureView) {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Texture"),
        size: wgpu::Extent3d {
            width: size.width.max(1),
            height: size.height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Depth32Float,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}

impl Renderer {
    /// Creates the pipelines and buffers for the viewport.
    pub(crate) fn new(
        device: &Device,
        format: TextureFormat,
        bounds: Rectangle<f32>,
        viewport_size: Size<u32>,
    ) -> Self {
        let camera_uniform = CameraUniform::new();
        let (depth_texture, depth_view) = create_depth_texture(device, viewport_size);

        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[camera_uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let camera_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
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
                label: Some("Camera Bind Group Layout"),
            });

        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &camera_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
            label: Some("Camera Bind Group"),
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shader.wgsl").into()),
        });

        let render_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Render Pipeline Layout"),
                bind_group_layouts: &[&camera_bind_group_layout],
                push_constant_ranges: &[],
            });

        let render_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Render Pipeline"),
            layout: Some(&render_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_main",
                buffers: &[
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &wgpu::vertex_attr_array![0 => Float32x3],
                    },
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<InstanceRaw>() as wgpu::BufferAddress,
                        step_mode: wgpu::VertexStepMode::Instance,
                        attributes: &wgpu::vertex_attr_array![
                            1 => Float32x4,
                            2 => Float32x4,
                            3 => Float32x4,
                            4 => Float32x4,
                            5 => Float32x4,
                            6 => Float32x4,
                            7 => Float32x4,
                            8 => Float32x4,
                            9 => Float32x4,
                            10 => Float32x4,
                        ],
                    },
                ],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
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
            depth_stencil: Some(wgpu::DepthStencilState {
                format: wgpu::TextureFormat::Depth32Float,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
        });

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Vertex Buffer"),
            contents: bytemuck::cast_slice(CUBE_VERTICES.as_slice()),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let instance_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Instance Buffer"),
            size: (MAX_INSTANCES * std::mem::size_of::<InstanceRaw>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        // Full-screen quad in NDC, restricted to the widget by the viewport.
        let clear_vertices: &[[f32; 2]] = &[[-1.0, -1.0], [1.0, -1.0], [1.0, 1.0], [-1.0, 1.0]];
        let clear_indices: &[u16] = &[0, 1, 2, 0, 2, 3];

        let clear_vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Clear Vertex Buffer"),
            contents: bytemuck::cast_slice(clear_vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let clear_index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Clear Index Buffer"),
            contents: bytemuck::cast_slice(clear_indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        let clear_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Clear Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("clear.wgsl").into()),
        });

        let clear_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Clear Pipeline Layout"),
                bind_group_layouts: &[],
                push_constant_ranges: &[],
            });

        let clear_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Clear Pipeline"),
            layout: Some(&clear_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &clear_shader,
                entry_point: "vs_main",
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![0 => Float32x2],
                }],
            },
            fragment: Some(wgpu::FragmentState {
                module: &clear_shader,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
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
            depth_stencil: None,
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
        });

        Self {
            bounds,
            render_pipeline,
            vertex_buffer,
            instance_buffer,
            num_instances: 0,
            camera_uniform,
            camera_buffer,
            camera_bind_group,
            depth_texture,
            depth_view,
            clear_pipeline,
            clear_vertex_buffer,
            clear_index_buffer,
        }
    }

    /// Tracks the widget bounds and recreates the depth buffer when the
    /// target size changes.
    pub(crate) fn resize(&mut self, device: &Device, new_bounds: Rectangle<f32>, new_size: Size<u32>) {
        if new_bounds.width > 0.0 && new_bounds.height > 0.0 {
            self.bounds = new_bounds;
        }

        if new_size.width > 0
            && new_size.height > 0
            && (self.depth_texture.size().width != new_size.width
                || self.depth_texture.size().height != new_size.height)
        {
            let (texture, view) = create_depth_texture(device, new_size);
            self.depth_texture = texture;
            self.depth_view = view;
        }
    }

    pub(crate) fn update_camera(&mut self, queue: &Queue, camera: &Camera, projection: &Projection) {
        self.camera_uniform.update_view_proj(camera, projection);
        queue.write_buffer(
            &self.camera_buffer,
            0,
            bytemuck::cast_slice(&[self.camera_uniform]),
        );
    }

    pub(crate) fn update_instances(&mut self, queue: &Queue, instances: &[InstanceRaw]) {
        let instances = &instances[..instances.len().min(MAX_INSTANCES)];
        queue.write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(instances));
        self.num_instances = instances.len() as u32;
    }

    /// Clears the widget area, then draws every instance with depth testing.
    pub(crate) fn render(&self, encoder: &mut CommandEncoder, target: &TextureView) {
        {
            let mut clear_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Clear Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            clear_pass.set_viewport(
                self.bounds.x,
                self.bounds.y,
                self.bounds.width,
                self.bounds.height,
                0.0,
                1.0,
            );
            clear_pass.set_pipeline(&self.clear_pipeline);
            clear_pass.set_vertex_buffer(0, self.clear_vertex_buffer.slice(..));
            clear_pass
                .set_index_buffer(self.clear_index_buffer.slice(..), wgpu::IndexFormat::Uint16);
            clear_pass.draw_indexed(0..6, 0, 0..1);
        }

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
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
            });

            render_pass.set_viewport(
                self.bounds.x,
                self.bounds.y,
                self.bounds.width,
                self.bounds.height,
                0.0,
                1.0,
            );
            render_pass.set_pipeline(&self.render_pipeline);
            render_pass.set_bind_group(0, &self.camera_bind_group, &[]);
            render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
            render_pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
            render_pass.draw(0..CUBE_VERTICES.len() as u32, 0..self.num_instances);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cubetutor::coords::{ALL_COORDINATES, corner_coordinates};
    use nalgebra::UnitQuaternion;

    #[test]
    fn hidden_pieces_are_not_drawn() {
        let scene = Scene::new(&corner_coordinates(), UnitQuaternion::identity());
        assert_eq!(generate_instances(Some(&scene)).len(), 8 + 6 + 2);

        let full = Scene::new(&ALL_COORDINATES, UnitQuaternion::identity());
        assert_eq!(generate_instances(Some(&full)).len(), MAX_INSTANCES);
        assert_eq!(generate_instances(None).len(), 2);
    }

    #[test]
    fn markers_take_the_color_of_their_role() {
        let mut session = cubetutor::CubeSession::new(cubetutor::EngineConfig::default());
        session.initialize_cube(&ALL_COORDINATES);
        let scene = session.scene().unwrap();
        let instances = generate_instances(Some(scene));
        let markers = &instances[27..33];

        for (marker, instance) in scene.markers().iter().zip(markers) {
            assert_eq!(instance.colors[0], marker_color(marker.role));
        }
        for role in [MarkerRole::Front, MarkerRole::Top, MarkerRole::Left] {
            let color = marker_color(role);
            assert_eq!(markers.iter().filter(|i| i.colors[0] == color).count(), 1);
        }
    }
}
