//! Simulation core
//!
//! Everything that runs inside one display frame:
//! - Input latches (level-triggered, read once per frame)
//! - Lazy activation of withheld bodies
//! - Fixed-step physics advance driven by frame timestamps
//! - Body → visual transform sync
//!
//! No rendering or platform dependencies; the physics engine sits behind
//! [`PhysicsWorld`].

pub mod activation;
pub mod clock;
pub mod entity;
pub mod input;
pub mod physics;
pub mod rapier_world;
pub mod scene;
pub mod sync;
pub mod tick;

pub use activation::LazyActivation;
pub use clock::{SimulationClock, StepOutcome};
pub use entity::{
    Activation, Entity, EntityId, EntityKind, EntityRegistry, EntityState, Geometry, Material,
    VisualProxy,
};
pub use input::{Action, InputState};
pub use physics::{BodyDesc, BodyId, FixedStepAccumulator, PhysicsWorld, Pose, Shape};
pub use rapier_world::RapierWorld;
pub use scene::{SceneLayout, populate};
pub use sync::sync_transforms;
pub use tick::{CameraControls, FrameRenderer, FrameReport, GroundAttitude, Simulation};
