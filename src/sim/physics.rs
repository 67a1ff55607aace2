//! Physics world seam
//!
//! The core only needs to create bodies, insert them into the world, step the
//! world with a fixed timestep and read poses back. Everything else (shapes,
//! contacts, integration) is the engine's business.

use glam::{Quat, Vec3};

use crate::error::Result;

/// Opaque handle for a body created by a [`PhysicsWorld`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyId(pub u32);

/// Collision shape
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    /// Infinite plane through the body origin, normal +Y in body space
    Plane,
    /// Box with the given half extents
    Cuboid { half_extents: Vec3 },
}

/// Everything needed to construct a body
#[derive(Debug, Clone, PartialEq)]
pub struct BodyDesc {
    /// Mass 0 means static
    pub mass: f32,
    pub position: Vec3,
    pub orientation: Quat,
    pub angular_velocity: Vec3,
    pub shape: Shape,
}

impl BodyDesc {
    /// Static body (mass 0)
    pub fn fixed(shape: Shape, position: Vec3) -> Self {
        Self {
            mass: 0.0,
            position,
            orientation: Quat::IDENTITY,
            angular_velocity: Vec3::ZERO,
            shape,
        }
    }

    pub fn dynamic(shape: Shape, mass: f32, position: Vec3) -> Self {
        Self {
            mass,
            position,
            orientation: Quat::IDENTITY,
            angular_velocity: Vec3::ZERO,
            shape,
        }
    }

    pub fn with_angular_velocity(mut self, angular_velocity: Vec3) -> Self {
        self.angular_velocity = angular_velocity;
        self
    }

    pub fn is_static(&self) -> bool {
        self.mass == 0.0
    }
}

/// Position and orientation of a body
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    pub orientation: Quat,
}

/// The physics engine as seen by the frame routine
pub trait PhysicsWorld {
    /// Construct a body without adding it to the simulation
    fn create_body(&mut self, desc: &BodyDesc) -> BodyId;

    /// Add a constructed body to the simulation. Fails if it is already in.
    fn insert(&mut self, body: BodyId) -> Result<()>;

    fn contains(&self, body: BodyId) -> bool;

    /// Advance by `elapsed` seconds of wall time in `fixed_step` increments,
    /// running at most `max_substeps` steps. Returns the steps actually run.
    fn step(&mut self, fixed_step: f32, elapsed: f32, max_substeps: u32) -> u32;

    /// Current pose; `None` for unknown bodies
    fn pose(&self, body: BodyId) -> Option<Pose>;

    /// Teleport the orientation of a body already in the world
    fn set_orientation(&mut self, body: BodyId, orientation: Quat) -> Result<()>;

    fn gravity(&self) -> Vec3;
}

/// Wall-time accumulator behind [`PhysicsWorld::step`]
///
/// Time left over after the sub-step cap is reached is discarded modulo the
/// fixed step, so a long stall costs at most `max_substeps` steps.
#[derive(Debug, Clone, Default)]
pub struct FixedStepAccumulator {
    accumulator: f32,
}

impl FixedStepAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of fixed steps to run for this frame
    pub fn advance(&mut self, fixed_step: f32, elapsed: f32, max_substeps: u32) -> u32 {
        self.accumulator += elapsed.max(0.0);

        let mut substeps = 0;
        while self.accumulator >= fixed_step && substeps < max_substeps {
            self.accumulator -= fixed_step;
            substeps += 1;
        }

        if substeps == max_substeps && self.accumulator >= fixed_step {
            log::debug!(
                "Sub-step cap hit, dropping {:.3}s of simulation time",
                self.accumulator - self.accumulator % fixed_step
            );
        }
        self.accumulator %= fixed_step;
        substeps
    }

    /// Leftover time not yet simulated (always < one fixed step)
    pub fn remainder(&self) -> f32 {
        self.accumulator
    }
}
