//! Score-driven difficulty
//!
//! Passes tighten the gap, speed up the fall and widen the drift. Picking up
//! a reward is the only thing that eases them back.

use serde::{Deserialize, Serialize};

use crate::tuning::Tuning;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Difficulty {
    /// Fall speed (multiplied by the fall multiplier for px per frame)
    pub speed: f32,
    pub gap_width: f32,
    pub drift_amplitude: f32,
    /// Radians added to the drift sine; re-rolled every pass
    pub drift_phase: f32,
}

impl Difficulty {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            speed: tuning.initial_speed,
            gap_width: tuning.initial_gap,
            drift_amplitude: tuning.initial_drift,
            drift_phase: 0.0,
        }
    }

    /// Tighten after a successful pass
    pub fn on_pass(&mut self, tuning: &Tuning, next_phase: f32) {
        self.gap_width = (self.gap_width - tuning.gap_shrink).max(tuning.min_gap);
        self.speed = (self.speed + tuning.speed_step).min(tuning.max_speed);
        self.drift_amplitude = (self.drift_amplitude + tuning.drift_step).min(tuning.max_drift);
        self.drift_phase = next_phase;
    }

    /// Ease off after a reward pickup
    pub fn on_reward(&mut self, tuning: &Tuning) {
        let slowed = self.speed * tuning.reward_speed_scale;
        let floor = self.speed * tuning.reward_speed_floor_scale;
        self.speed = slowed.max(floor);
        self.gap_width = crate::clamp(
            self.gap_width + tuning.reward_gap_bonus,
            tuning.min_gap,
            tuning.initial_gap,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_pass_tightens() {
        let tuning = Tuning::default();
        let mut d = Difficulty::new(&tuning);
        d.on_pass(&tuning, 1.0);
        assert!((d.gap_width - (210.0 - 6.4)).abs() < 1e-4);
        assert!((d.speed - 1.3).abs() < 1e-4);
        assert!((d.drift_amplitude - 8.9).abs() < 1e-4);
        assert_eq!(d.drift_phase, 1.0);
    }

    #[test]
    fn test_reward_eases_and_caps_gap() {
        let tuning = Tuning::default();
        let mut d = Difficulty::new(&tuning);
        d.speed = 5.0;
        d.gap_width = 200.0;
        d.on_reward(&tuning);
        assert!((d.speed - 3.6).abs() < 1e-4);
        assert_eq!(d.gap_width, tuning.initial_gap);
    }

    proptest! {
        #[test]
        fn prop_passes_are_monotonic(passes in 1usize..200) {
            let tuning = Tuning::default();
            let mut d = Difficulty::new(&tuning);
            for i in 0..passes {
                let before = d.clone();
                d.on_pass(&tuning, i as f32);
                prop_assert!(d.gap_width <= before.gap_width);
                prop_assert!(d.speed >= before.speed);
                prop_assert!(d.drift_amplitude >= before.drift_amplitude);
                prop_assert!(d.gap_width >= tuning.min_gap);
                prop_assert!(d.speed <= tuning.max_speed);
            }
        }

        #[test]
        fn prop_reward_stays_in_bounds(passes in 0usize..100, rewards in 1usize..5) {
            let tuning = Tuning::default();
            let mut d = Difficulty::new(&tuning);
            for i in 0..passes {
                d.on_pass(&tuning, i as f32);
            }
            for _ in 0..rewards {
                d.on_reward(&tuning);
                prop_assert!(d.gap_width >= tuning.min_gap);
                prop_assert!(d.gap_width <= tuning.initial_gap);
                prop_assert!(d.speed > 0.0);
            }
        }
    }
}
