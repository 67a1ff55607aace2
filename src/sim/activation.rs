//! Lazy activation of withheld bodies
//!
//! Bodies spawned with [`Activation::OnTrigger`](super::entity::Activation::OnTrigger) are fully built but kept out
//! of the world. The first frame that sees the trigger inserts all of them;
//! later frames with the trigger still latched do nothing. A pass that fails
//! part way is retried on the next triggered frame for the bodies still out.

use super::entity::{EntityRegistry, EntityState};
use super::physics::PhysicsWorld;
use crate::error::Result;

#[derive(Debug, Clone, Default)]
pub struct LazyActivation {
    fired: bool,
}

impl LazyActivation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_fired(&self) -> bool {
        self.fired
    }

    /// Insert every withheld body if `triggered`. Returns how many were inserted.
    pub fn apply<W: PhysicsWorld + ?Sized>(
        &mut self,
        triggered: bool,
        registry: &mut EntityRegistry,
        world: &mut W,
    ) -> Result<usize> {
        if !triggered || self.fired {
            return Ok(0);
        }

        let mut inserted = 0;
        for entity in registry.iter_mut().filter(|e| e.is_withheld()) {
            // Already in the world: only the entity state lags behind
            if !world.contains(entity.body) {
                world.insert(entity.body)?;
                inserted += 1;
            }
            entity.state = EntityState::Active;
        }
        self.fired = true;

        log::info!("Drop triggered: activated {inserted} withheld bodies");
        Ok(inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::entity::tests::{RecordingWorld, box_desc, red};
    use crate::sim::entity::{Activation, EntityKind, Geometry};
    use glam::Vec3;

    fn populated(withheld: usize, immediate: usize) -> (EntityRegistry, RecordingWorld) {
        let mut world = RecordingWorld::default();
        let mut registry = EntityRegistry::new();
        let geometry = Geometry::Cuboid { size: Vec3::splat(0.5) };
        for i in 0..withheld + immediate {
            let activation = if i < withheld {
                Activation::OnTrigger
            } else {
                Activation::Immediate
            };
            registry
                .spawn(&mut world, EntityKind::Box, geometry, red(), &box_desc(i as f32), activation)
                .unwrap();
        }
        (registry, world)
    }

    #[test]
    fn test_no_trigger_no_insert() {
        let (mut registry, mut world) = populated(3, 0);
        let mut activation = LazyActivation::new();
        for _ in 0..5 {
            assert_eq!(activation.apply(false, &mut registry, &mut world).unwrap(), 0);
        }
        assert!(world.inserted.is_empty());
        assert!(!activation.has_fired());
        assert_eq!(registry.withheld_count(), 3);
    }

    #[test]
    fn test_held_trigger_inserts_once() {
        let (mut registry, mut world) = populated(3, 1);
        let mut activation = LazyActivation::new();

        assert_eq!(activation.apply(true, &mut registry, &mut world).unwrap(), 3);
        for _ in 0..10 {
            assert_eq!(activation.apply(true, &mut registry, &mut world).unwrap(), 0);
        }

        // 1 immediate + 3 lazily activated, each exactly once
        assert_eq!(world.inserted.len(), 4);
        let mut sorted = world.inserted.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), 4);
        assert_eq!(registry.active_count(), 4);
        assert_eq!(registry.withheld_count(), 0);
    }

    #[test]
    fn test_failed_pass_retried_on_next_trigger() {
        let (mut registry, mut world) = populated(3, 0);
        let mut activation = LazyActivation::new();
        let bodies: Vec<_> = registry.iter().map(|e| e.body).collect();

        // Body 1 unknown to the world for one frame
        let pose = world.poses.remove(&bodies[1]).unwrap();
        assert!(activation.apply(true, &mut registry, &mut world).is_err());
        assert!(!activation.has_fired());
        assert_eq!(registry.withheld_count(), 2);

        world.poses.insert(bodies[1], pose);
        assert_eq!(activation.apply(true, &mut registry, &mut world).unwrap(), 2);
        assert!(activation.has_fired());
        assert_eq!(registry.withheld_count(), 0);
        assert_eq!(world.inserted, bodies);
    }

    #[test]
    fn test_body_already_in_world_marked_active() {
        let (mut registry, mut world) = populated(3, 0);
        let mut activation = LazyActivation::new();
        let bodies: Vec<_> = registry.iter().map(|e| e.body).collect();
        world.insert(bodies[1]).unwrap();

        assert_eq!(activation.apply(true, &mut registry, &mut world).unwrap(), 2);
        assert_eq!(registry.active_count(), 3);
        assert_eq!(world.inserted.len(), 3);
    }

    #[test]
    fn test_immediate_entities_not_reinserted() {
        let (mut registry, mut world) = populated(0, 2);
        let mut activation = LazyActivation::new();
        assert_eq!(activation.apply(true, &mut registry, &mut world).unwrap(), 0);
        assert_eq!(world.inserted.len(), 2);
    }
}
