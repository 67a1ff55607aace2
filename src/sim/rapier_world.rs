//! rapier3d-backed physics world
//!
//! Bodies are built eagerly but only enter the rapier sets on [`PhysicsWorld::insert`],
//! so a withheld body neither integrates nor collides.

use glam::{Quat, Vec3};
use rapier3d::na::{Isometry3, Quaternion, Translation3, UnitQuaternion};
use rapier3d::prelude::*;

use super::physics::{BodyDesc, BodyId, FixedStepAccumulator, PhysicsWorld, Pose, Shape};
use crate::error::{Result, SimError};

/// A body that is either waiting outside the world or already in it
enum BodySlot {
    Withheld { body: RigidBody, collider: Collider },
    InWorld(RigidBodyHandle),
    /// Transient state while moving from `Withheld` to `InWorld`
    Moving,
}

pub struct RapierWorld {
    gravity: Vector<Real>,
    integration_parameters: IntegrationParameters,
    pipeline: PhysicsPipeline,
    islands: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,
    slots: Vec<BodySlot>,
    accumulator: FixedStepAccumulator,
}

impl RapierWorld {
    pub fn new(gravity: Vec3) -> Self {
        Self {
            gravity: vector![gravity.x, gravity.y, gravity.z],
            integration_parameters: IntegrationParameters::default(),
            pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            slots: Vec::new(),
            accumulator: FixedStepAccumulator::new(),
        }
    }

    /// Bodies currently simulated
    pub fn active_body_count(&self) -> usize {
        self.bodies.len()
    }

    fn step_once(&mut self, dt: f32) {
        self.integration_parameters.dt = dt;
        self.pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &(),
        );
    }

    fn slot(&self, body: BodyId) -> Result<&BodySlot> {
        self.slots.get(body.0 as usize).ok_or(SimError::UnknownBody(body))
    }
}

impl PhysicsWorld for RapierWorld {
    fn create_body(&mut self, desc: &BodyDesc) -> BodyId {
        let builder = if desc.is_static() {
            RigidBodyBuilder::fixed()
        } else {
            RigidBodyBuilder::dynamic()
        };
        let body = builder
            .position(to_isometry(desc.position, desc.orientation))
            .angvel(vector![
                desc.angular_velocity.x,
                desc.angular_velocity.y,
                desc.angular_velocity.z
            ])
            .build();

        let collider = match desc.shape {
            Shape::Plane => ColliderBuilder::halfspace(Vector::y_axis()),
            Shape::Cuboid { half_extents } => {
                ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
                    .mass(desc.mass)
            }
        }
        .build();

        let id = BodyId(self.slots.len() as u32);
        self.slots.push(BodySlot::Withheld { body, collider });
        id
    }

    fn insert(&mut self, body: BodyId) -> Result<()> {
        let slot = self
            .slots
            .get_mut(body.0 as usize)
            .ok_or(SimError::UnknownBody(body))?;
        if matches!(slot, BodySlot::InWorld(_)) {
            return Err(SimError::AlreadyInWorld(body));
        }

        let BodySlot::Withheld {
            body: rigid_body,
            collider,
        } = std::mem::replace(slot, BodySlot::Moving)
        else {
            return Err(SimError::UnknownBody(body));
        };

        let handle = self.bodies.insert(rigid_body);
        self.colliders
            .insert_with_parent(collider, handle, &mut self.bodies);
        *slot = BodySlot::InWorld(handle);
        Ok(())
    }

    fn contains(&self, body: BodyId) -> bool {
        matches!(self.slot(body), Ok(BodySlot::InWorld(_)))
    }

    fn step(&mut self, fixed_step: f32, elapsed: f32, max_substeps: u32) -> u32 {
        let substeps = self.accumulator.advance(fixed_step, elapsed, max_substeps);
        for _ in 0..substeps {
            self.step_once(fixed_step);
        }
        substeps
    }

    fn pose(&self, body: BodyId) -> Option<Pose> {
        let rigid_body = match self.slot(body).ok()? {
            BodySlot::Withheld { body, .. } => body,
            BodySlot::InWorld(handle) => self.bodies.get(*handle)?,
            BodySlot::Moving => return None,
        };
        Some(Pose {
            position: from_vector(rigid_body.translation()),
            orientation: from_rotation(rigid_body.rotation()),
        })
    }

    fn set_orientation(&mut self, body: BodyId, orientation: Quat) -> Result<()> {
        let BodySlot::InWorld(handle) = *self.slot(body)? else {
            return Err(SimError::NotInWorld(body));
        };
        let rigid_body = self
            .bodies
            .get_mut(handle)
            .ok_or(SimError::UnknownBody(body))?;
        rigid_body.set_rotation(to_rotation(orientation), true);

        // Sleeping bodies resting on a moved static body would otherwise float
        for (_, other) in self.bodies.iter_mut() {
            if other.is_dynamic() {
                other.wake_up(true);
            }
        }
        Ok(())
    }

    fn gravity(&self) -> Vec3 {
        from_vector(&self.gravity)
    }
}

fn to_rotation(q: Quat) -> UnitQuaternion<Real> {
    UnitQuaternion::from_quaternion(Quaternion::new(q.w, q.x, q.y, q.z))
}

fn to_isometry(position: Vec3, orientation: Quat) -> Isometry3<Real> {
    Isometry3::from_parts(
        Translation3::new(position.x, position.y, position.z),
        to_rotation(orientation),
    )
}

fn from_vector(v: &Vector<Real>) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

fn from_rotation(r: &UnitQuaternion<Real>) -> Quat {
    Quat::from_xyzw(r.i, r.j, r.k, r.w)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::FIXED_STEP;

    fn cube(y: f32) -> BodyDesc {
        BodyDesc::dynamic(
            Shape::Cuboid {
                half_extents: Vec3::splat(0.25),
            },
            5.0,
            Vec3::new(0.0, y, 0.0),
        )
    }

    fn world() -> RapierWorld {
        RapierWorld::new(Vec3::new(0.0, -9.82, 0.0))
    }

    #[test]
    fn test_withheld_body_does_not_fall() {
        let mut world = world();
        let body = world.create_body(&cube(5.0));
        for _ in 0..30 {
            world.step(FIXED_STEP, FIXED_STEP, 3);
        }
        assert!(!world.contains(body));
        assert_eq!(world.pose(body).unwrap().position, Vec3::new(0.0, 5.0, 0.0));
        assert_eq!(world.active_body_count(), 0);
    }

    #[test]
    fn test_inserted_body_falls() {
        let mut world = world();
        let body = world.create_body(&cube(5.0));
        world.insert(body).unwrap();
        assert_eq!(world.step(FIXED_STEP, FIXED_STEP, 3), 1);
        assert!(world.pose(body).unwrap().position.y < 5.0);
    }

    #[test]
    fn test_double_insert_rejected() {
        let mut world = world();
        let body = world.create_body(&cube(1.0));
        world.insert(body).unwrap();
        assert_eq!(world.insert(body), Err(SimError::AlreadyInWorld(body)));
        assert_eq!(world.insert(BodyId(99)), Err(SimError::UnknownBody(BodyId(99))));
        assert_eq!(world.active_body_count(), 1);
    }

    #[test]
    fn test_box_comes_to_rest_on_ground() {
        let mut world = world();
        let ground = world.create_body(&BodyDesc::fixed(Shape::Plane, Vec3::ZERO));
        world.insert(ground).unwrap();
        let body = world.create_body(&cube(2.0));
        world.insert(body).unwrap();

        for _ in 0..300 {
            world.step(FIXED_STEP, FIXED_STEP, 3);
        }
        let y = world.pose(body).unwrap().position.y;
        assert!(y > 0.1 && y < 0.5, "box should rest on the plane, y = {y}");
    }

    #[test]
    fn test_substep_cap_applies() {
        let mut world = world();
        let body = world.create_body(&cube(100.0));
        world.insert(body).unwrap();
        assert_eq!(world.step(FIXED_STEP, 10.0, 3), 3);
    }

    #[test]
    fn test_set_orientation_requires_world() {
        let mut world = world();
        let ground = world.create_body(&BodyDesc::fixed(Shape::Plane, Vec3::ZERO));
        let q = Quat::from_rotation_y(0.3);
        assert_eq!(world.set_orientation(ground, q), Err(SimError::NotInWorld(ground)));

        world.insert(ground).unwrap();
        world.set_orientation(ground, q).unwrap();
        let got = world.pose(ground).unwrap().orientation;
        assert!(got.angle_between(q) < 1e-4);
    }

    #[test]
    fn test_gravity_reported_back() {
        assert_eq!(world().gravity(), Vec3::new(0.0, -9.82, 0.0));
    }

    #[test]
    fn test_orientation_round_trip() {
        let q = Quat::from_euler(glam::EulerRot::YXZ, 0.4, -0.2, 0.1);
        let back = from_rotation(&to_rotation(q));
        assert!(back.angle_between(q) < 1e-5);
    }
}
