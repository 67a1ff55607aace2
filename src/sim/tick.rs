//! Per-frame simulation routine
//!
//! One call to [`Simulation::frame`] is one display frame. The order inside a
//! frame is fixed: latch effects, lazy activation, physics step, transform
//! sync, camera controls update, render. Re-arming the next frame happens in
//! the caller before this runs (see `platform::start_loop`).

use glam::Quat;

use super::activation::LazyActivation;
use super::clock::{SimulationClock, StepOutcome};
use super::entity::{EntityId, EntityKind, EntityRegistry};
use super::input::{Action, InputState};
use super::physics::PhysicsWorld;
use super::scene::{SceneLayout, populate};
use super::sync::sync_transforms;
use crate::camera::Camera;
use crate::error::Result;
use crate::settings::Settings;

/// Camera controller updated once per frame before rendering
pub trait CameraControls {
    fn update(&mut self);
    fn camera(&self) -> &Camera;
}

/// Draws the registry's visuals
pub trait FrameRenderer {
    fn render_frame(&mut self, entities: &EntityRegistry, camera: &Camera);
}

/// Yaw/pitch of the ground plane driven by the directional latches
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GroundAttitude {
    /// Rotation about Y (radians)
    pub yaw: f32,
    /// Rotation about X (radians)
    pub pitch: f32,
}

impl GroundAttitude {
    pub fn orientation(&self) -> Quat {
        Quat::from_rotation_y(self.yaw) * Quat::from_rotation_x(self.pitch)
    }
}

/// What happened during one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    pub step: StepOutcome,
    /// Bodies inserted by lazy activation this frame
    pub activated: usize,
    /// Visuals updated by transform sync
    pub synced: usize,
}

/// Registry, physics world and the frame clock
pub struct Simulation<W: PhysicsWorld> {
    pub registry: EntityRegistry,
    pub world: W,
    pub clock: SimulationClock,
    pub activation: LazyActivation,
    pub attitude: GroundAttitude,
    ground: Option<EntityId>,
    rotation_step: f32,
    frames: u64,
}

impl<W: PhysicsWorld> Simulation<W> {
    /// Build the full scene described by `settings`
    pub fn new(mut world: W, settings: &Settings, seed: u64) -> Result<(Self, SceneLayout)> {
        let mut registry = EntityRegistry::new();
        let layout = populate(&mut registry, &mut world, settings, seed)?;
        let clock = SimulationClock::new(settings.physics.fixed_step, settings.physics.max_substeps);
        let sim = Self::from_parts(world, registry, clock, settings.rotation_step);
        Ok((sim, layout))
    }

    /// Wrap an already populated registry. The first ground entity, if any,
    /// follows the directional latches.
    pub fn from_parts(world: W, registry: EntityRegistry, clock: SimulationClock, rotation_step: f32) -> Self {
        let ground = registry.first_of_kind(EntityKind::Ground);
        Self {
            registry,
            world,
            clock,
            activation: LazyActivation::new(),
            attitude: GroundAttitude::default(),
            ground,
            rotation_step,
            frames: 0,
        }
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Apply the level-triggered effects of the directional latches
    pub fn apply_input(&mut self, input: &InputState) -> Result<()> {
        let (yaw_dir, pitch_dir) = input.attitude_direction();
        if yaw_dir == 0.0 && pitch_dir == 0.0 {
            return Ok(());
        }
        self.attitude.yaw += yaw_dir * self.rotation_step;
        self.attitude.pitch += pitch_dir * self.rotation_step;

        let Some(ground) = self.ground.and_then(|id| self.registry.get_mut(id)) else {
            return Ok(());
        };
        let orientation = self.attitude.orientation();
        if ground.is_active() {
            // Transform sync carries the new attitude to the visual
            self.world.set_orientation(ground.body, orientation)?;
        } else {
            ground.visual.orientation = orientation;
        }
        Ok(())
    }

    /// Run everything after the re-arm for the frame at `timestamp_ms`
    pub fn frame<C, R>(
        &mut self,
        input: &InputState,
        timestamp_ms: f64,
        controls: &mut C,
        renderer: &mut R,
    ) -> Result<FrameReport>
    where
        C: CameraControls + ?Sized,
        R: FrameRenderer + ?Sized,
    {
        let latched = self.apply_input(input);
        let activated = self.activation.apply(
            input.is_active(Action::Drop),
            &mut self.registry,
            &mut self.world,
        );

        // The timestamp is recorded whatever the earlier stages returned
        let step = self.clock.advance(timestamp_ms, &mut self.world);
        latched?;
        let activated = activated?;
        if self.frames == 0 {
            log::debug!("First frame at {timestamp_ms:.1}ms, clock primed");
        }
        if let StepOutcome::Stepped { substeps, .. } = step {
            if substeps == self.clock.max_substeps() {
                log::debug!("Frame {} ran the full {substeps} sub-steps", self.frames);
            }
        }

        let synced = sync_transforms(&mut self.registry, &self.world);

        controls.update();
        renderer.render_frame(&self.registry, controls.camera());

        self.frames += 1;
        Ok(FrameReport {
            step,
            activated,
            synced,
        })
    }
}
