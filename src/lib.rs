//! Box Drop - fixed-timestep rigid-body scene
//!
//! Core modules:
//! - `sim`: Frame routine (latches, lazy activation, physics step, transform sync)
//! - `camera`: Perspective camera and orbit controls
//! - `renderer`: WebGPU rendering pipeline
//! - `platform`: Frame scheduling (requestAnimationFrame or manual)
//! - `settings`: Data-driven scene tuning

pub mod camera;
pub mod error;
pub mod platform;
pub mod renderer;
pub mod settings;
pub mod sim;

pub use camera::{Camera, OrbitControls};
pub use error::{RenderError, SimError};
pub use settings::{ActivationMode, Settings};

/// Scene configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const FIXED_STEP: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 3;
    /// Gravity along Y (m/s²)
    pub const GRAVITY_Y: f32 = -9.82;
    /// Ground attitude change per frame while a directional latch holds (radians)
    pub const ROTATION_STEP: f32 = 0.01;
}

/// Convert a 0xRRGGBB colour to RGBA floats
#[inline]
pub fn hex_to_rgba(hex: u32) -> [f32; 4] {
    let channel = |shift: u32| ((hex >> shift) & 0xff) as f32 / 255.0;
    [channel(16), channel(8), channel(0), 1.0]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_to_rgba() {
        assert_eq!(hex_to_rgba(0xffffff), [1.0, 1.0, 1.0, 1.0]);
        assert_eq!(hex_to_rgba(0x000000), [0.0, 0.0, 0.0, 1.0]);
        let red = hex_to_rgba(0xaa0000);
        assert!((red[0] - 170.0 / 255.0).abs() < 1e-6);
        assert_eq!(red[1], 0.0);
    }
}
