//! Simulation stepper
//!
//! Turns render-frame timestamps into fixed-step physics advances. The first
//! frame only primes the clock since there is no delta to integrate yet.

use super::physics::PhysicsWorld;
use crate::consts::{FIXED_STEP, MAX_SUBSTEPS};

/// What the stepper did this frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepOutcome {
    /// No previous timestamp; nothing integrated
    Primed,
    /// The world was stepped with `elapsed` seconds of wall time
    Stepped { elapsed: f32, substeps: u32 },
}

impl StepOutcome {
    pub fn stepped(&self) -> bool {
        matches!(self, StepOutcome::Stepped { .. })
    }
}

#[derive(Debug, Clone)]
pub struct SimulationClock {
    /// Timestamp of the previous frame (ms)
    last_frame: Option<f64>,
    fixed_step: f32,
    max_substeps: u32,
}

impl Default for SimulationClock {
    fn default() -> Self {
        Self::new(FIXED_STEP, MAX_SUBSTEPS)
    }
}

impl SimulationClock {
    pub fn new(fixed_step: f32, max_substeps: u32) -> Self {
        Self {
            last_frame: None,
            fixed_step,
            max_substeps,
        }
    }

    pub fn fixed_step(&self) -> f32 {
        self.fixed_step
    }

    pub fn max_substeps(&self) -> u32 {
        self.max_substeps
    }

    pub fn last_frame(&self) -> Option<f64> {
        self.last_frame
    }

    /// Step `world` for the frame at `timestamp_ms`, then record the timestamp
    pub fn advance<W: PhysicsWorld + ?Sized>(&mut self, timestamp_ms: f64, world: &mut W) -> StepOutcome {
        let outcome = match self.last_frame {
            None => StepOutcome::Primed,
            Some(last) => {
                let mut elapsed = ((timestamp_ms - last) / 1000.0) as f32;
                if !(elapsed >= 0.0) {
                    log::warn!("Non-monotonic frame timestamp ({last} -> {timestamp_ms}), treating as zero elapsed");
                    elapsed = 0.0;
                }
                let substeps = world.step(self.fixed_step, elapsed, self.max_substeps);
                StepOutcome::Stepped { elapsed, substeps }
            }
        };

        self.last_frame = Some(timestamp_ms);
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::entity::tests::RecordingWorld;
    use proptest::prelude::*;

    #[test]
    fn test_first_frame_primes_without_step() {
        let mut world = RecordingWorld::default();
        let mut clock = SimulationClock::default();

        let outcome = clock.advance(1234.5, &mut world);
        assert_eq!(outcome, StepOutcome::Primed);
        assert!(world.steps.is_empty());
        assert_eq!(clock.last_frame(), Some(1234.5));
    }

    #[test]
    fn test_second_frame_uses_delta_seconds() {
        let mut world = RecordingWorld::default();
        let mut clock = SimulationClock::default();

        clock.advance(1000.0, &mut world);
        let outcome = clock.advance(1016.0, &mut world);

        assert!(outcome.stepped());
        assert_eq!(world.steps.len(), 1);
        let (fixed, elapsed, cap) = world.steps[0];
        assert!((fixed - 1.0 / 60.0).abs() < 1e-9);
        assert!((elapsed - 0.016).abs() < 1e-6);
        assert_eq!(cap, 3);
        assert_eq!(clock.last_frame(), Some(1016.0));
    }

    #[test]
    fn test_backwards_timestamp_steps_zero() {
        let mut world = RecordingWorld::default();
        let mut clock = SimulationClock::default();

        clock.advance(500.0, &mut world);
        clock.advance(400.0, &mut world);
        assert_eq!(world.steps[0].1, 0.0);
        assert_eq!(clock.last_frame(), Some(400.0));
    }

    proptest! {
        #[test]
        fn test_every_frame_after_first_steps_with_delta(deltas in prop::collection::vec(0.0f64..250.0, 1..30)) {
            let mut world = RecordingWorld::default();
            let mut clock = SimulationClock::default();
            let mut t = 10_000.0;
            clock.advance(t, &mut world);
            for d in &deltas {
                t += d;
                clock.advance(t, &mut world);
            }
            prop_assert_eq!(world.steps.len(), deltas.len());
            for (step, d) in world.steps.iter().zip(&deltas) {
                prop_assert!((step.1 as f64 - d / 1000.0).abs() < 1e-4);
            }
            prop_assert_eq!(clock.last_frame(), Some(t));
        }
    }
}
