//! WebGPU rendering module
//!
//! Instanced unit meshes (cube and ground quad) scaled and posed per entity,
//! lit by one directional light plus ambient. Optional line overlays mark the
//! ground grid, world axes and light.

pub mod helpers;
pub mod mesh;
pub mod pipeline;
pub mod vertex;

pub use pipeline::RenderState;
pub use vertex::{InstanceRaw, SceneUniform, Vertex};
