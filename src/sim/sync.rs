//! Body → visual transform copy

use super::entity::EntityRegistry;
use super::physics::PhysicsWorld;

/// Copy each active body's pose onto its visual, verbatim.
///
/// Inactive entities keep their construction pose. Returns the number of
/// visuals updated.
pub fn sync_transforms<W: PhysicsWorld + ?Sized>(registry: &mut EntityRegistry, world: &W) -> usize {
    let mut synced = 0;
    for entity in registry.iter_mut().filter(|e| e.is_active()) {
        if let Some(pose) = world.pose(entity.body) {
            entity.visual.position = pose.position;
            entity.visual.orientation = pose.orientation;
            synced += 1;
        }
    }
    synced
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::entity::tests::{RecordingWorld, box_desc, red};
    use crate::sim::entity::{Activation, EntityKind, Geometry};
    use glam::Vec3;

    #[test]
    fn test_sync_copies_active_only() {
        let mut world = RecordingWorld::default();
        let mut registry = EntityRegistry::new();
        let geometry = Geometry::Cuboid { size: Vec3::splat(0.5) };
        let active = registry
            .spawn(&mut world, EntityKind::Box, geometry, red(), &box_desc(10.0), Activation::Immediate)
            .unwrap();
        let idle = registry
            .spawn(&mut world, EntityKind::Box, geometry, red(), &box_desc(20.0), Activation::OnTrigger)
            .unwrap();

        world.step(1.0 / 60.0, 1.0 / 60.0, 3);
        // Move the withheld body's recorded pose too; sync must still ignore it
        let idle_body = registry.get(idle).unwrap().body;
        world.poses.get_mut(&idle_body).unwrap().position.y = -100.0;

        assert_eq!(sync_transforms(&mut registry, &world), 1);

        let a = registry.get(active).unwrap();
        assert_eq!(a.visual.pose(), world.pose(a.body).unwrap());
        assert!((a.visual.position.y - 9.9).abs() < 1e-6);

        let i = registry.get(idle).unwrap();
        assert_eq!(i.visual.position, Vec3::new(0.0, 20.0, 0.0));
    }
}
