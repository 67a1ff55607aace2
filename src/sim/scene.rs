//! Scene population
//!
//! Builds the static ground and the column of boxes from [`Settings`]. Box
//! scatter comes from a seeded PCG stream so a seed reproduces the scene.

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::entity::{Activation, EntityId, EntityKind, EntityRegistry, Geometry, Material};
use super::physics::{BodyDesc, PhysicsWorld, Shape};
use crate::error::Result;
use crate::hex_to_rgba;
use crate::settings::{ActivationMode, Settings};

/// Ids of what [`populate`] spawned
#[derive(Debug, Clone)]
pub struct SceneLayout {
    pub ground: EntityId,
    pub boxes: Vec<EntityId>,
}

/// Construction pose and spin for box `index`
pub fn box_spawn<R: Rng>(rng: &mut R, index: usize, range: f32) -> (Vec3, Vec3) {
    let x = (rng.random::<f32>() * 2.0 - 1.0) * range;
    // Staggered column so boxes land one after another
    let y = (rng.random::<f32>() * 2.0 + 1.0) * 3.0 + index as f32 + 10.0;
    let z = (rng.random::<f32>() * 2.0 - 1.0) * range;
    let spin = Vec3::new(rng.random::<f32>(), rng.random::<f32>(), 0.0);
    (Vec3::new(x, y, z), spin)
}

/// Spawn the ground and every box into `registry`/`world`
pub fn populate<W: PhysicsWorld + ?Sized>(
    registry: &mut EntityRegistry,
    world: &mut W,
    settings: &Settings,
    seed: u64,
) -> Result<SceneLayout> {
    settings.validate()?;

    let ground = registry.spawn(
        world,
        EntityKind::Ground,
        Geometry::Plane {
            size: settings.ground.size,
        },
        Material {
            color: hex_to_rgba(settings.ground.color),
            lit: false,
        },
        &BodyDesc::fixed(Shape::Plane, Vec3::ZERO),
        Activation::Immediate,
    )?;

    let box_cfg = &settings.boxes;
    let activation = match box_cfg.activation {
        ActivationMode::OnDrop => Activation::OnTrigger,
        ActivationMode::Immediate => Activation::Immediate,
    };
    let geometry = Geometry::Cuboid {
        size: Vec3::splat(box_cfg.size),
    };
    let material = Material {
        color: hex_to_rgba(box_cfg.color),
        lit: true,
    };
    let shape = Shape::Cuboid {
        half_extents: Vec3::splat(box_cfg.size / 2.0),
    };

    let mut rng = Pcg32::seed_from_u64(seed);
    let mut boxes = Vec::with_capacity(box_cfg.count);
    for i in 0..box_cfg.count {
        let (position, spin) = box_spawn(&mut rng, i, box_cfg.range);
        let desc = BodyDesc::dynamic(shape, box_cfg.mass, position).with_angular_velocity(spin);
        boxes.push(registry.spawn(world, EntityKind::Box, geometry, material, &desc, activation)?);
    }

    log::info!(
        "Scene populated: {} boxes ({}), seed {}, gravity {}",
        boxes.len(),
        box_cfg.activation.as_str(),
        seed,
        world.gravity()
    );

    Ok(SceneLayout { ground, boxes })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::entity::EntityState;
    use crate::sim::entity::tests::RecordingWorld;

    fn settings(count: usize, activation: ActivationMode) -> Settings {
        let mut settings = Settings::default();
        settings.boxes.count = count;
        settings.boxes.activation = activation;
        settings
    }

    #[test]
    fn test_populate_lazy_scene() {
        let mut world = RecordingWorld::default();
        let mut registry = EntityRegistry::new();
        let layout = populate(&mut registry, &mut world, &settings(3, ActivationMode::OnDrop), 42).unwrap();

        assert_eq!(registry.len(), 4);
        assert_eq!(layout.boxes.len(), 3);

        let ground = registry.get(layout.ground).unwrap();
        assert_eq!(ground.kind, EntityKind::Ground);
        assert_eq!(ground.state, EntityState::Active);
        assert!(world.descs[ground.body.0 as usize].is_static());

        for id in &layout.boxes {
            let entity = registry.get(*id).unwrap();
            assert_eq!(entity.state, EntityState::Inactive);
            let desc = &world.descs[entity.body.0 as usize];
            assert_eq!(desc.mass, 5.0);
            assert!(desc.position.x.abs() <= 3.0 && desc.position.z.abs() <= 3.0);
            assert!(desc.position.y >= 13.0);
            assert_eq!(desc.angular_velocity.z, 0.0);
        }
        // Only the ground is in the world
        assert_eq!(world.inserted.len(), 1);
    }

    #[test]
    fn test_populate_immediate_scene() {
        let mut world = RecordingWorld::default();
        let mut registry = EntityRegistry::new();
        populate(&mut registry, &mut world, &settings(5, ActivationMode::Immediate), 1).unwrap();
        assert_eq!(world.inserted.len(), 6);
        assert_eq!(registry.withheld_count(), 0);
    }

    #[test]
    fn test_same_seed_same_scatter() {
        let mut rng_a = Pcg32::seed_from_u64(9);
        let mut rng_b = Pcg32::seed_from_u64(9);
        for i in 0..10 {
            assert_eq!(box_spawn(&mut rng_a, i, 3.0), box_spawn(&mut rng_b, i, 3.0));
        }
    }

    #[test]
    fn test_column_rises_with_index() {
        let mut rng = Pcg32::seed_from_u64(3);
        let (first, _) = box_spawn(&mut rng, 0, 3.0);
        let (far, _) = box_spawn(&mut rng, 100, 3.0);
        // y spans 13..19 plus the index
        assert!(first.y < 19.0);
        assert!(far.y >= 113.0);
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let mut world = RecordingWorld::default();
        let mut registry = EntityRegistry::new();
        let mut bad = Settings::default();
        bad.physics.max_substeps = 0;
        assert!(populate(&mut registry, &mut world, &bad, 0).is_err());
        assert!(registry.is_empty());
    }
}
