//! Entity registry
//!
//! Each entity owns its visual proxy and the id of its physics body, so the two
//! halves are created together and can never drift apart in ordering.

use glam::{Quat, Vec3};

use super::physics::{BodyDesc, BodyId, PhysicsWorld, Pose};
use crate::error::Result;

/// Renderable geometry, sized in world units
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Geometry {
    /// Square in the local XZ plane
    Plane { size: f32 },
    /// Axis-aligned box in local space
    Cuboid { size: Vec3 },
}

impl Geometry {
    /// Scale applied to the unit mesh for this geometry
    pub fn scale(&self) -> Vec3 {
        match *self {
            Geometry::Plane { size } => Vec3::new(size, 1.0, size),
            Geometry::Cuboid { size } => size,
        }
    }
}

/// Surface appearance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub color: [f32; 4],
    /// Lit materials take directional + ambient light, unlit ones draw flat
    pub lit: bool,
}

/// Render-side stand-in for an entity; has no physics of its own
#[derive(Debug, Clone, PartialEq)]
pub struct VisualProxy {
    pub position: Vec3,
    pub orientation: Quat,
    pub geometry: Geometry,
    pub material: Material,
}

impl VisualProxy {
    pub fn new(geometry: Geometry, material: Material) -> Self {
        Self {
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            geometry,
            material,
        }
    }

    pub fn with_pose(mut self, position: Vec3, orientation: Quat) -> Self {
        self.position = position;
        self.orientation = orientation;
        self
    }

    pub fn pose(&self) -> Pose {
        Pose {
            position: self.position,
            orientation: self.orientation,
        }
    }
}

/// Lifecycle of an entity's body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityState {
    /// Body constructed but withheld from the world
    Inactive,
    /// Body in the world (terminal)
    Active,
}

/// How an entity's body joins the world
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// Inserted at spawn
    Immediate,
    /// Withheld until the drop trigger fires
    OnTrigger,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Ground,
    Box,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u32);

/// A visual proxy paired with its physics body
#[derive(Debug, Clone)]
pub struct Entity {
    pub id: EntityId,
    pub kind: EntityKind,
    pub visual: VisualProxy,
    pub body: BodyId,
    pub state: EntityState,
    pub activation: Activation,
}

impl Entity {
    pub fn is_active(&self) -> bool {
        self.state == EntityState::Active
    }

    /// Withheld and waiting for the trigger
    pub fn is_withheld(&self) -> bool {
        self.state == EntityState::Inactive && self.activation == Activation::OnTrigger
    }
}

/// Ordered collection of entities (stable by spawn order)
#[derive(Debug, Clone, Default)]
pub struct EntityRegistry {
    entities: Vec<Entity>,
    next_id: u32,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the body and the entity together.
    ///
    /// The visual starts at the body's construction pose. With
    /// [`Activation::Immediate`] the body is inserted right away.
    pub fn spawn<W: PhysicsWorld + ?Sized>(
        &mut self,
        world: &mut W,
        kind: EntityKind,
        geometry: Geometry,
        material: Material,
        desc: &BodyDesc,
        activation: Activation,
    ) -> Result<EntityId> {
        let body = world.create_body(desc);
        let state = match activation {
            Activation::Immediate => {
                world.insert(body)?;
                EntityState::Active
            }
            Activation::OnTrigger => EntityState::Inactive,
        };

        let id = EntityId(self.next_id);
        self.next_id += 1;
        self.entities.push(Entity {
            id,
            kind,
            visual: VisualProxy::new(geometry, material).with_pose(desc.position, desc.orientation),
            body,
            state,
            activation,
        });
        Ok(id)
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        // Ids are handed out in push order and never removed
        self.entities.get(id.0 as usize).filter(|e| e.id == id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(id.0 as usize).filter(|e| e.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.entities.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn active_count(&self) -> usize {
        self.entities.iter().filter(|e| e.is_active()).count()
    }

    pub fn withheld_count(&self) -> usize {
        self.entities.iter().filter(|e| e.is_withheld()).count()
    }

    pub fn first_of_kind(&self, kind: EntityKind) -> Option<EntityId> {
        self.entities.iter().find(|e| e.kind == kind).map(|e| e.id)
    }
}
