//! Debug line overlays: ground grid, world axes, light marker

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

use crate::hex_to_rgba;
use crate::settings::Settings;

const GRID_CENTER_COLOR: u32 = 0x444444;
const GRID_COLOR: u32 = 0x888888;
/// Keeps the grid off the ground plane's depth
const GRID_LIFT: f32 = 1e-3;

/// Line-list vertex
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct LineVertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
}

impl LineVertex {
    fn new(position: Vec3, color: [f32; 4]) -> Self {
        Self {
            position: position.to_array(),
            color,
        }
    }

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<LineVertex>() as wgpu::BufferAddress,
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
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

fn segment(out: &mut Vec<LineVertex>, a: Vec3, b: Vec3, color: [f32; 4]) {
    out.push(LineVertex::new(a, color));
    out.push(LineVertex::new(b, color));
}

/// Square grid in the XZ plane centred on the origin
pub fn grid_lines(size: f32, divisions: u32) -> Vec<LineVertex> {
    let divisions = divisions.max(1);
    let half = size / 2.0;
    let step = size / divisions as f32;
    let center = hex_to_rgba(GRID_CENTER_COLOR);
    let line = hex_to_rgba(GRID_COLOR);

    let mut out = Vec::with_capacity((divisions as usize + 1) * 4);
    for i in 0..=divisions {
        let k = -half + i as f32 * step;
        let color = if i == divisions / 2 { center } else { line };
        segment(&mut out, Vec3::new(-half, GRID_LIFT, k), Vec3::new(half, GRID_LIFT, k), color);
        segment(&mut out, Vec3::new(k, GRID_LIFT, -half), Vec3::new(k, GRID_LIFT, half), color);
    }
    out
}

/// X red, Y green, Z blue from the origin
pub fn axes_lines(length: f32) -> Vec<LineVertex> {
    let mut out = Vec::with_capacity(6);
    for (axis, hex) in [(Vec3::X, 0xff0000), (Vec3::Y, 0x00ff00), (Vec3::Z, 0x0000ff)] {
        segment(&mut out, Vec3::ZERO, axis * length, hex_to_rgba(hex));
    }
    out
}

/// Square of half-size `size` at `position` facing `target`, plus a line to it
pub fn light_lines(position: Vec3, target: Vec3, size: f32, color: [f32; 4]) -> Vec<LineVertex> {
    let dir = (target - position).try_normalize().unwrap_or(Vec3::NEG_Y);
    let up = if dir.cross(Vec3::Y).length_squared() < 1e-6 {
        Vec3::X
    } else {
        Vec3::Y
    };
    let u = dir.cross(up).normalize() * size;
    let v = u.cross(dir).normalize() * size;
    let corners = [
        position - u + v,
        position + u + v,
        position + u - v,
        position - u - v,
    ];

    let mut out = Vec::with_capacity(10);
    for i in 0..4 {
        segment(&mut out, corners[i], corners[(i + 1) % 4], color);
    }
    segment(&mut out, position, target, color);
    out
}

/// Every enabled overlay for `settings`, colours as sRGB
pub fn helper_lines(settings: &Settings) -> Vec<LineVertex> {
    let helpers = &settings.helpers;
    let mut out = Vec::new();
    if helpers.grid {
        let size = settings.ground.size;
        out.extend(grid_lines(size, size.round().max(1.0) as u32));
    }
    if helpers.axes {
        out.extend(axes_lines(helpers.axes_length));
    }
    if helpers.light {
        let lights = &settings.lights;
        out.extend(light_lines(
            lights.directional_position,
            Vec3::ZERO,
            helpers.light_size,
            hex_to_rgba(lights.directional_color),
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(v: &LineVertex) -> Vec3 {
        Vec3::from(v.position)
    }

    #[test]
    fn test_grid_covers_ground() {
        let grid = grid_lines(30.0, 30);
        assert_eq!(grid.len(), 31 * 4);
        for v in &grid {
            let p = pos(v);
            assert!(p.x.abs() <= 15.0 + 1e-4 && p.z.abs() <= 15.0 + 1e-4);
            assert!((p.y - GRID_LIFT).abs() < 1e-9);
        }
        // Centre lines pass through the origin
        let center = hex_to_rgba(GRID_CENTER_COLOR);
        let centre_lines: Vec<_> = grid.chunks(2).filter(|l| l[0].color == center).collect();
        assert_eq!(centre_lines.len(), 2);
        for line in centre_lines {
            let mid = (pos(&line[0]) + pos(&line[1])) / 2.0;
            assert!(mid.x.abs() < 1e-4 && mid.z.abs() < 1e-4);
        }
    }

    #[test]
    fn test_axes_colours_and_length() {
        let axes = axes_lines(5.0);
        assert_eq!(axes.len(), 6);
        assert_eq!(pos(&axes[1]), Vec3::new(5.0, 0.0, 0.0));
        assert_eq!(axes[1].color, [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(pos(&axes[3]), Vec3::new(0.0, 5.0, 0.0));
        assert_eq!(axes[5].color, [0.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn test_light_marker_faces_target() {
        let position = Vec3::new(2.0, 2.0, 2.0);
        let lines = light_lines(position, Vec3::ZERO, 1.0, [1.0; 4]);
        assert_eq!(lines.len(), 10);
        let dir = -position.normalize();
        // Square lies in the plane through the light, normal to the view direction
        for v in &lines[..8] {
            assert!((pos(v) - position).dot(dir).abs() < 1e-4);
        }
        assert_eq!(pos(&lines[9]), Vec3::ZERO);
    }

    #[test]
    fn test_light_marker_straight_down() {
        let lines = light_lines(Vec3::new(0.0, 10.0, 0.0), Vec3::ZERO, 1.0, [1.0; 4]);
        assert!(lines.iter().all(|v| pos(v).is_finite()));
    }

    #[test]
    fn test_helper_toggles() {
        let mut settings = Settings::default();
        assert_eq!(helper_lines(&settings).len(), 31 * 4 + 6 + 10);

        settings.helpers.grid = false;
        settings.helpers.light = false;
        assert_eq!(helper_lines(&settings).len(), 6);

        settings.helpers.axes = false;
        assert!(helper_lines(&settings).is_empty());
    }
}
