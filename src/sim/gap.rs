//! Wall with a drifting gap
//!
//! The on-screen gap position is `base + drift(t)`, clamped to the playfield.
//! After each pass the base slides to a new random target with an ease-out
//! tween instead of jumping under the still-falling shape.

use serde::{Deserialize, Serialize};

use crate::consts::GAME_WIDTH;
use crate::tuning::Tuning;
use crate::{clamp, ease_out, lerp};

/// Slide-then-settle tween for the gap base position
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GapTransition {
    pub active: bool,
    pub from: f32,
    pub to: f32,
    pub start_ms: f32,
    pub duration_ms: f32,
    pub delay_ms: f32,
}

impl GapTransition {
    /// Interpolated position and whether the tween has finished
    pub fn sample(&self, now_ms: f32) -> (f32, bool) {
        let elapsed = now_ms - self.start_ms - self.delay_ms;
        if elapsed <= 0.0 {
            return (self.from, false);
        }
        let t = (elapsed / self.duration_ms.max(1.0)).clamp(0.0, 1.0);
        if t >= 1.0 {
            (self.to, true)
        } else {
            (lerp(self.from, self.to, ease_out(t)), false)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gap {
    /// Target base position (left edge, before drift)
    pub base_x: f32,
    /// Top of the wall band
    pub wall_y: f32,
    pub transition: GapTransition,
    /// Effective left edge as of the last update
    pub x: f32,
}

impl Gap {
    pub fn new(base_x: f32, tuning: &Tuning) -> Self {
        Self {
            base_x,
            wall_y: tuning.wall_y,
            transition: GapTransition::default(),
            x: base_x,
        }
    }

    /// Allowed range for the gap's left edge at a given width
    pub fn x_range(width: f32, tuning: &Tuning) -> (f32, f32) {
        let min = tuning.gap_edge_margin;
        let max = (GAME_WIDTH - width - tuning.gap_edge_margin).max(min);
        (min, max)
    }

    /// Map a unit random draw to a base position inside the allowed range
    pub fn random_base(width: f32, unit: f32, tuning: &Tuning) -> f32 {
        let (min, max) = Self::x_range(width, tuning);
        clamp(min + unit * (max - min), min, max)
    }

    /// Horizontal drift offset at sim time `now_ms`
    pub fn drift_offset(now_ms: f32, amplitude: f32, phase: f32, tuning: &Tuning) -> f32 {
        (now_ms / tuning.drift_period_ms + phase).sin() * amplitude
    }

    /// Base position including any in-flight tween
    pub fn current_base(&self, now_ms: f32) -> f32 {
        if self.transition.active {
            self.transition.sample(now_ms).0
        } else {
            self.base_x
        }
    }

    /// Advance the tween and recompute the effective position
    pub fn update(&mut self, now_ms: f32, width: f32, amplitude: f32, phase: f32, tuning: &Tuning) -> f32 {
        let mut base = self.base_x;
        if self.transition.active {
            let (pos, done) = self.transition.sample(now_ms);
            base = pos;
            if done {
                self.transition.active = false;
                base = self.transition.to;
            }
        }

        let (min, max) = Self::x_range(width, tuning);
        self.x = clamp(base + Self::drift_offset(now_ms, amplitude, phase, tuning), min, max);
        self.x
    }

    /// Start sliding toward `target`, superseding any in-flight tween
    pub fn retarget(&mut self, now_ms: f32, target: f32, tuning: &Tuning) {
        let from = self.current_base(now_ms);
        self.base_x = target;
        self.transition = GapTransition {
            active: true,
            from,
            to: target,
            start_ms: now_ms,
            duration_ms: tuning.gap_move_duration_ms,
            delay_ms: tuning.gap_move_delay_ms,
        };
    }

    /// Pull the base back into range after the width changed
    pub fn reclamp(&mut self, width: f32, tuning: &Tuning) {
        let (min, max) = Self::x_range(width, tuning);
        self.base_x = clamp(self.base_x, min, max);
        self.transition.to = clamp(self.transition.to, min, max);
    }
}
