//! Scene settings
//!
//! Tuning for physics, scene population, camera, lights and input. Persisted as
//! JSON in LocalStorage on the web; natively the defaults are used.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::{Result, SimError};

/// When withheld box bodies join the physics world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ActivationMode {
    /// Boxes hang in place until the drop latch fires
    #[default]
    OnDrop,
    /// Boxes are inserted at construction and fall immediately
    Immediate,
}

impl ActivationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivationMode::OnDrop => "on-drop",
            ActivationMode::Immediate => "immediate",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsSettings {
    /// Fixed integration step (seconds)
    pub fixed_step: f32,
    /// Catch-up cap per rendered frame
    pub max_substeps: u32,
    pub gravity: Vec3,
}

impl Default for PhysicsSettings {
    fn default() -> Self {
        Self {
            fixed_step: FIXED_STEP,
            max_substeps: MAX_SUBSTEPS,
            gravity: Vec3::new(0.0, GRAVITY_Y, 0.0),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GroundSettings {
    /// Edge length of the square ground plane
    pub size: f32,
    pub color: u32,
}

impl Default for GroundSettings {
    fn default() -> Self {
        Self {
            size: 30.0,
            color: 0xffffff,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BoxSettings {
    pub count: usize,
    /// Edge length of each cube
    pub size: f32,
    pub mass: f32,
    /// Half-width of the XZ scatter square
    pub range: f32,
    pub color: u32,
    pub activation: ActivationMode,
}

impl Default for BoxSettings {
    fn default() -> Self {
        Self {
            count: 200,
            size: 0.5,
            mass: 5.0,
            range: 3.0,
            color: 0xaa0000,
            activation: ActivationMode::OnDrop,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    pub fovy_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
    pub look_at: Vec3,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            fovy_degrees: 60.0,
            near: 0.1,
            far: 100_000.0,
            position: Vec3::new(0.0, 5.0, 20.0),
            look_at: Vec3::ZERO,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlSettings {
    /// Inertia on orbit/dolly
    pub enable_damping: bool,
    /// Share of pending motion applied per update when damping
    pub damping_factor: f32,
    /// Radians per pixel of pointer drag
    pub rotate_speed: f32,
    /// Dolly scale per wheel notch
    pub zoom_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
}

impl Default for ControlSettings {
    fn default() -> Self {
        Self {
            enable_damping: false,
            damping_factor: 0.05,
            rotate_speed: 0.005,
            zoom_speed: 0.95,
            min_distance: 1.0,
            max_distance: 500.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LightSettings {
    pub directional_color: u32,
    pub directional_intensity: f32,
    pub directional_position: Vec3,
    pub ambient_color: u32,
    pub ambient_intensity: f32,
}

impl Default for LightSettings {
    fn default() -> Self {
        Self {
            directional_color: 0xffffff,
            directional_intensity: 1.0,
            directional_position: Vec3::new(2.0, 2.0, 2.0),
            ambient_color: 0xffffff,
            ambient_intensity: 1.0,
        }
    }
}

/// Debug overlays drawn as lines
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HelperSettings {
    /// Grid over the ground, one cell per world unit
    pub grid: bool,
    pub axes: bool,
    pub axes_length: f32,
    /// Light marker (square facing the origin plus a line to it)
    pub light: bool,
    pub light_size: f32,
}

impl Default for HelperSettings {
    fn default() -> Self {
        Self {
            grid: true,
            axes: true,
            axes_length: 5.0,
            light: true,
            light_size: 1.0,
        }
    }
}

/// All scene tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Scatter seed (time-based when absent)
    pub seed: Option<u64>,
    pub clear_color: u32,
    /// Radians added to the ground attitude per frame while a directional latch holds
    pub rotation_step: f32,
    pub physics: PhysicsSettings,
    pub ground: GroundSettings,
    pub boxes: BoxSettings,
    pub camera: CameraSettings,
    pub controls: ControlSettings,
    pub lights: LightSettings,
    pub helpers: HelperSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            seed: None,
            clear_color: 0x333333,
            rotation_step: ROTATION_STEP,
            physics: PhysicsSettings::default(),
            ground: GroundSettings::default(),
            boxes: BoxSettings::default(),
            camera: CameraSettings::default(),
            controls: ControlSettings::default(),
            lights: LightSettings::default(),
            helpers: HelperSettings::default(),
        }
    }
}

impl Settings {
    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<()> {
        let step = self.physics.fixed_step;
        if !(step.is_finite() && step > 0.0) {
            return Err(SimError::invalid_settings(format!(
                "fixed_step must be positive, got {step}"
            )));
        }
        if self.physics.max_substeps == 0 {
            return Err(SimError::invalid_settings("max_substeps must be at least 1"));
        }
        if self.boxes.mass < 0.0 {
            return Err(SimError::invalid_settings(format!(
                "box mass must not be negative, got {}",
                self.boxes.mass
            )));
        }
        if self.boxes.size <= 0.0 || self.ground.size <= 0.0 {
            return Err(SimError::invalid_settings("box and ground sizes must be positive"));
        }
        if self.boxes.range < 0.0 {
            return Err(SimError::invalid_settings("box scatter range must not be negative"));
        }
        let damping = self.controls.damping_factor;
        if self.controls.enable_damping && !(damping > 0.0 && damping <= 1.0) {
            return Err(SimError::invalid_settings(format!(
                "damping_factor must be in (0, 1], got {damping}"
            )));
        }
        let helpers = &self.helpers;
        if helpers.axes_length <= 0.0 || helpers.light_size <= 0.0 {
            return Err(SimError::invalid_settings("helper sizes must be positive"));
        }
        Ok(())
    }

    /// LocalStorage key
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "box_drop_settings";

    /// Parse and validate a stored JSON document
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: Settings =
            serde_json::from_str(json).map_err(|e| SimError::invalid_settings(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from LocalStorage (WASM only). Never written back.
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match Self::from_json(&json) {
                    Ok(settings) => {
                        log::info!("Loaded settings from LocalStorage");
                        return settings;
                    }
                    Err(e) => log::warn!("Ignoring stored settings: {e}"),
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Native stub
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_scene() {
        let settings = Settings::default();
        assert!((settings.physics.fixed_step - 1.0 / 60.0).abs() < 1e-9);
        assert_eq!(settings.physics.max_substeps, 3);
        assert_eq!(settings.physics.gravity, Vec3::new(0.0, -9.82, 0.0));
        assert_eq!(settings.boxes.count, 200);
        assert_eq!(settings.boxes.activation, ActivationMode::OnDrop);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let json = r#"{ "seed": 7, "boxes": { "count": 3, "activation": "immediate" } }"#;
        let settings: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.seed, Some(7));
        assert_eq!(settings.boxes.count, 3);
        assert_eq!(settings.boxes.activation, ActivationMode::Immediate);
        assert_eq!(settings.boxes.mass, 5.0);
        assert_eq!(settings.ground.size, 30.0);
    }

    #[test]
    fn test_validate_rejects_bad_step() {
        let mut settings = Settings::default();
        settings.physics.fixed_step = 0.0;
        assert!(matches!(settings.validate(), Err(SimError::InvalidSettings(_))));

        let mut settings = Settings::default();
        settings.physics.max_substeps = 0;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.boxes.mass = -1.0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_helpers_toggle_from_json() {
        let settings = Settings::from_json(r#"{ "helpers": { "grid": false } }"#).unwrap();
        assert!(!settings.helpers.grid);
        assert!(settings.helpers.axes);
        assert_eq!(settings.helpers.axes_length, 5.0);

        let bad = Settings::from_json(r#"{ "helpers": { "axes_length": 0 } }"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_from_json_validates() {
        let settings = Settings::from_json(r#"{ "boxes": { "count": 4 } }"#).unwrap();
        assert_eq!(settings.boxes.count, 4);

        let bad = Settings::from_json(r#"{ "physics": { "max_substeps": 0 } }"#);
        assert!(matches!(bad, Err(SimError::InvalidSettings(_))));
        assert!(Settings::from_json("not json").is_err());
    }

    #[test]
    fn test_activation_mode_names_match_serde() {
        for mode in [ActivationMode::OnDrop, ActivationMode::Immediate] {
            let json = serde_json::to_string(&mode).unwrap();
            assert_eq!(json, format!("\"{}\"", mode.as_str()));
        }
    }
}
