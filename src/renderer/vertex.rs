//! Vertex and per-instance types for the 3D scene

use bytemuck::{Pod, Zeroable};
use glam::Mat4;

use crate::sim::{Entity, VisualProxy};

/// Mesh vertex with position and normal
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl Vertex {
    pub const fn new(position: [f32; 3], normal: [f32; 3]) -> Self {
        Self { position, normal }
    }

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

/// Per-entity data: model matrix columns, colour, lit flag
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct InstanceRaw {
    pub model: [[f32; 4]; 4],
    pub color: [f32; 4],
    /// 1.0 = lit, 0.0 = flat colour
    pub lit: f32,
    pub _pad: [f32; 3],
}

impl InstanceRaw {
    pub fn from_visual(visual: &VisualProxy) -> Self {
        let model = Mat4::from_scale_rotation_translation(
            visual.geometry.scale(),
            visual.orientation,
            visual.position,
        );
        Self {
            model: model.to_cols_array_2d(),
            color: visual.material.color,
            lit: if visual.material.lit { 1.0 } else { 0.0 },
            _pad: [0.0; 3],
        }
    }

    pub fn from_entity(entity: &Entity) -> Self {
        Self::from_visual(&entity.visual)
    }

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        const VEC4: wgpu::BufferAddress = std::mem::size_of::<[f32; 4]>() as wgpu::BufferAddress;
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<InstanceRaw>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: VEC4,
                    shader_location: 3,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: VEC4 * 2,
                    shader_location: 4,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: VEC4 * 3,
                    shader_location: 5,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: VEC4 * 4,
                    shader_location: 6,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: VEC4 * 5,
                    shader_location: 7,
                    format: wgpu::VertexFormat::Float32,
                },
            ],
        }
    }
}

/// Camera and light uniforms (must match shader)
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct SceneUniform {
    pub view_proj: [[f32; 4]; 4],
    /// xyz = direction towards the light
    pub light_dir: [f32; 4],
    /// rgb * intensity
    pub light_color: [f32; 4],
    pub ambient: [f32; 4],
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{Geometry, Material};
    use glam::{Quat, Vec3, Vec4};

    #[test]
    fn test_instance_layout_sizes() {
        assert_eq!(std::mem::size_of::<InstanceRaw>(), 96);
        assert_eq!(std::mem::size_of::<SceneUniform>(), 112);
        assert_eq!(std::mem::size_of::<Vertex>(), 24);
    }

    #[test]
    fn test_instance_from_visual() {
        let visual = VisualProxy::new(
            Geometry::Cuboid { size: Vec3::splat(0.5) },
            Material {
                color: [1.0, 0.0, 0.0, 1.0],
                lit: true,
            },
        )
        .with_pose(Vec3::new(1.0, 2.0, 3.0), Quat::IDENTITY);

        let raw = InstanceRaw::from_visual(&visual);
        let model = Mat4::from_cols_array_2d(&raw.model);
        let corner = model * Vec4::new(1.0, 1.0, 1.0, 1.0);
        assert!((corner.truncate() - Vec3::new(1.5, 2.5, 3.5)).length() < 1e-6);
        assert_eq!(raw.lit, 1.0);
    }
}
