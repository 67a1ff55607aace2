//! Perspective camera and orbit controls
//!
//! Pointer drags and wheel notches are queued as pending motion; `update()`
//! (once per frame) folds them into the spherical orbit and moves the eye.

use glam::{Mat4, Vec3};

use crate::settings::{CameraSettings, ControlSettings};
use crate::sim::CameraControls;

/// Keeps the polar angle off the poles so `look_at` stays well defined
const POLAR_EPSILON: f32 = 1e-3;

#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fovy_degrees: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self::from_settings(&CameraSettings::default(), 16.0 / 9.0)
    }
}

impl Camera {
    pub fn from_settings(settings: &CameraSettings, aspect: f32) -> Self {
        Self {
            eye: settings.position,
            target: settings.look_at,
            up: Vec3::Y,
            fovy_degrees: settings.fovy_degrees,
            aspect,
            near: settings.near,
            far: settings.far,
        }
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }

    /// Depth range 0..1 as wgpu expects
    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh(self.fovy_degrees.to_radians(), self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection() * self.view()
    }

    /// Resize handler: only the projection changes
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }
}

/// Orbit position around the target
#[derive(Debug, Clone, Copy, PartialEq)]
struct Spherical {
    radius: f32,
    /// Angle from +Y
    polar: f32,
    /// Angle around Y, measured from +Z
    azimuth: f32,
}

impl Spherical {
    fn from_offset(offset: Vec3) -> Self {
        let radius = offset.length();
        if radius == 0.0 {
            return Self {
                radius: 0.0,
                polar: 0.0,
                azimuth: 0.0,
            };
        }
        Self {
            radius,
            polar: (offset.y / radius).clamp(-1.0, 1.0).acos(),
            azimuth: offset.x.atan2(offset.z),
        }
    }

    fn to_offset(self) -> Vec3 {
        let sin_polar = self.polar.sin();
        Vec3::new(
            self.radius * sin_polar * self.azimuth.sin(),
            self.radius * self.polar.cos(),
            self.radius * sin_polar * self.azimuth.cos(),
        )
    }
}

pub struct OrbitControls {
    camera: Camera,
    settings: ControlSettings,
    orbit: Spherical,
    pending_azimuth: f32,
    pending_polar: f32,
    /// Multiplicative distance change still to apply (1 = none)
    pending_scale: f32,
}

impl OrbitControls {
    pub fn new(camera: Camera, settings: ControlSettings) -> Self {
        let orbit = Spherical::from_offset(camera.eye - camera.target);
        let mut controls = Self {
            camera,
            settings,
            orbit,
            pending_azimuth: 0.0,
            pending_polar: 0.0,
            pending_scale: 1.0,
        };
        controls.clamp_orbit();
        controls
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    /// Queue a pointer drag of (`dx`, `dy`) pixels
    pub fn rotate(&mut self, dx: f32, dy: f32) {
        self.pending_azimuth -= dx * self.settings.rotate_speed;
        self.pending_polar -= dy * self.settings.rotate_speed;
    }

    /// Queue a wheel step; positive `delta_y` moves away from the target
    pub fn zoom(&mut self, delta_y: f32) {
        if delta_y > 0.0 {
            self.pending_scale /= self.settings.zoom_speed;
        } else if delta_y < 0.0 {
            self.pending_scale *= self.settings.zoom_speed;
        }
    }

    pub fn distance(&self) -> f32 {
        self.orbit.radius
    }

    fn clamp_orbit(&mut self) {
        self.orbit.polar = self
            .orbit
            .polar
            .clamp(POLAR_EPSILON, std::f32::consts::PI - POLAR_EPSILON);
        self.orbit.radius = self
            .orbit
            .radius
            .clamp(self.settings.min_distance, self.settings.max_distance);
    }
}

impl CameraControls for OrbitControls {
    fn update(&mut self) {
        if self.settings.enable_damping {
            let f = self.settings.damping_factor;
            self.orbit.azimuth += self.pending_azimuth * f;
            self.orbit.polar += self.pending_polar * f;
            self.pending_azimuth *= 1.0 - f;
            self.pending_polar *= 1.0 - f;
        } else {
            self.orbit.azimuth += self.pending_azimuth;
            self.orbit.polar += self.pending_polar;
            self.pending_azimuth = 0.0;
            self.pending_polar = 0.0;
        }
        self.orbit.radius *= self.pending_scale;
        self.pending_scale = 1.0;

        self.clamp_orbit();
        self.camera.eye = self.camera.target + self.orbit.to_offset();
    }

    fn camera(&self) -> &Camera {
        &self.camera
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controls(damping: bool) -> OrbitControls {
        let settings = ControlSettings {
            enable_damping: damping,
            ..Default::default()
        };
        OrbitControls::new(Camera::default(), settings)
    }

    #[test]
    fn test_update_without_input_keeps_eye() {
        let mut c = controls(false);
        let eye = c.camera().eye;
        c.update();
        assert!(c.camera().eye.distance(eye) < 1e-4);
    }

    #[test]
    fn test_rotate_keeps_distance() {
        let mut c = controls(false);
        let distance = c.distance();
        c.rotate(120.0, -40.0);
        c.update();
        assert!((c.camera().eye.distance(c.camera().target) - distance).abs() < 1e-3);
        assert!(c.camera().eye.distance(Vec3::new(0.0, 5.0, 20.0)) > 0.1);
    }

    #[test]
    fn test_pending_rotation_cleared_without_damping() {
        let mut c = controls(false);
        c.rotate(50.0, 0.0);
        c.update();
        let eye = c.camera().eye;
        c.update();
        assert!(c.camera().eye.distance(eye) < 1e-5);
    }

    #[test]
    fn test_damping_keeps_drifting() {
        let mut c = controls(true);
        c.rotate(50.0, 0.0);
        c.update();
        let first = c.camera().eye;
        c.update();
        // Inertia: a second update still moves the camera
        assert!(c.camera().eye.distance(first) > 1e-5);
    }

    #[test]
    fn test_zoom_clamped() {
        let mut c = controls(false);
        for _ in 0..500 {
            c.zoom(-1.0);
        }
        c.update();
        assert!((c.distance() - 1.0).abs() < 1e-4);

        for _ in 0..500 {
            c.zoom(1.0);
        }
        c.update();
        assert!((c.distance() - 500.0).abs() < 1e-2);
    }

    #[test]
    fn test_polar_clamped_at_pole() {
        let mut c = controls(false);
        c.rotate(0.0, 10_000.0);
        c.update();
        assert!(c.camera().eye.y > 0.0);
        assert!(c.camera().view().is_finite());
    }

    #[test]
    fn test_viewport_updates_aspect() {
        let mut camera = Camera::default();
        camera.set_viewport(800, 400);
        assert_eq!(camera.aspect, 2.0);
        camera.set_viewport(0, 400);
        assert_eq!(camera.aspect, 2.0);
    }
}
