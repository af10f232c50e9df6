//! Data-driven game balance
//!
//! Every number that shapes difficulty lives here so a run can be replayed
//! or rebalanced from a JSON file without touching the simulation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::{GAME_HEIGHT, GAME_WIDTH};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read tuning file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid tuning JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Balance parameters for one session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Wall & gap ===
    pub wall_y: f32,
    pub wall_height: f32,
    pub initial_gap: f32,
    pub min_gap: f32,
    pub gap_shrink: f32,
    /// Gap never gets closer than this to either playfield edge
    pub gap_edge_margin: f32,
    /// Delay before the gap slides to its next position (ms)
    pub gap_move_delay_ms: f32,
    pub gap_move_duration_ms: f32,

    // === Fall speed ===
    pub initial_speed: f32,
    pub speed_step: f32,
    pub max_speed: f32,
    /// px per frame = speed * fall_multiplier
    pub fall_multiplier: f32,
    pub fast_drop_multiplier: f32,

    // === Drift ===
    pub initial_drift: f32,
    pub drift_step: f32,
    pub max_drift: f32,
    pub drift_period_ms: f32,

    // === Perfect pass ===
    pub perfect_tolerance: f32,
    pub perfect_flash_ms: f32,

    // === Rewards ===
    pub reward_first_score: f32,
    pub reward_interval: f32,
    pub reward_size: f32,
    pub reward_gap_bonus: f32,
    pub reward_speed_scale: f32,
    /// Rewards never slow the shape below this fraction of its speed
    pub reward_speed_floor_scale: f32,

    // === Aliens ===
    pub alien_start_score: f32,
    pub alien_count: usize,
    pub alien_width: f32,
    pub alien_height: f32,
    pub alien_walk_speed: f32,
    pub alien_walk_jitter: f32,
    pub alien_safe_margin: f32,
    pub alien_first_fire_delay_ms: f32,
    pub alien_fire_stagger_ms: f32,
    pub alien_min_cooldown_ms: f32,
    pub alien_max_cooldown_ms: f32,
    pub alien_aim_dwell_ms: f32,
    /// Frames of target motion to lead by
    pub alien_lead_factor: f32,
    /// Smallest vertical share of a unit shot direction
    pub alien_min_vertical_bias: f32,
    pub bullet_speed: f32,
    pub bullet_speed_jitter: f32,
    pub bullet_radius: f32,
    pub max_bullets: usize,
    /// Hits on one shape that end the session
    pub lethal_hits: u32,
    /// EMA weight of the newest horizontal velocity sample
    pub target_velocity_smoothing: f32,
    pub target_velocity_limit: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            wall_y: (GAME_HEIGHT * 0.82).round(),
            wall_height: 18.0,
            initial_gap: 210.0,
            min_gap: 74.0,
            gap_shrink: 6.4,
            gap_edge_margin: 12.0,
            gap_move_delay_ms: 200.0,
            gap_move_duration_ms: 260.0,

            initial_speed: 1.1,
            speed_step: 0.2,
            max_speed: 11.0,
            fall_multiplier: 1.7,
            fast_drop_multiplier: 3.0,

            initial_drift: 8.0,
            drift_step: 0.9,
            max_drift: 40.0,
            drift_period_ms: 700.0,

            perfect_tolerance: 12.0,
            perfect_flash_ms: 500.0,

            reward_first_score: 10.0,
            reward_interval: 4.0,
            reward_size: 28.0,
            reward_gap_bonus: 28.0,
            reward_speed_scale: 0.72,
            reward_speed_floor_scale: 0.7,

            alien_start_score: 20.0,
            alien_count: 2,
            alien_width: 28.0,
            alien_height: 22.0,
            alien_walk_speed: 0.2,
            alien_walk_jitter: 0.12,
            alien_safe_margin: 12.0,
            alien_first_fire_delay_ms: 3000.0,
            alien_fire_stagger_ms: 220.0,
            alien_min_cooldown_ms: 900.0,
            alien_max_cooldown_ms: 1900.0,
            alien_aim_dwell_ms: 350.0,
            alien_lead_factor: 14.0,
            alien_min_vertical_bias: 0.35,
            bullet_speed: 3.6,
            bullet_speed_jitter: 1.2,
            bullet_radius: 3.5,
            max_bullets: 14,
            lethal_hits: 2,
            target_velocity_smoothing: 0.25,
            target_velocity_limit: 10.0,
        }
    }
}

impl Tuning {
    /// Parse from JSON; unspecified fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        Ok(tuning.sanitized())
    }

    /// Load from a JSON file on disk
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load(path: &std::path::Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Clamp out-of-range values into a playable configuration
    pub fn sanitized(mut self) -> Self {
        let original = self.clone();

        self.wall_height = self.wall_height.max(1.0);
        self.wall_y = self
            .wall_y
            .clamp(GAME_HEIGHT * 0.25, GAME_HEIGHT - self.wall_height);
        self.gap_edge_margin = self.gap_edge_margin.clamp(0.0, GAME_WIDTH / 4.0);
        let widest = GAME_WIDTH - 2.0 * self.gap_edge_margin;
        self.initial_gap = self.initial_gap.clamp(16.0, widest);
        self.min_gap = self.min_gap.clamp(16.0, self.initial_gap);
        self.gap_shrink = self.gap_shrink.max(0.0);
        self.gap_move_delay_ms = self.gap_move_delay_ms.max(0.0);
        self.gap_move_duration_ms = self.gap_move_duration_ms.max(1.0);

        self.initial_speed = self.initial_speed.max(0.05);
        self.speed_step = self.speed_step.max(0.0);
        self.max_speed = self.max_speed.max(self.initial_speed);
        self.fall_multiplier = self.fall_multiplier.max(0.01);
        self.fast_drop_multiplier = self.fast_drop_multiplier.max(1.0);

        self.initial_drift = self.initial_drift.max(0.0);
        self.drift_step = self.drift_step.max(0.0);
        self.max_drift = self.max_drift.max(self.initial_drift);
        self.drift_period_ms = self.drift_period_ms.max(1.0);

        self.perfect_tolerance = self.perfect_tolerance.max(0.0);
        self.perfect_flash_ms = self.perfect_flash_ms.max(0.0);

        self.reward_interval = self.reward_interval.max(0.5);
        self.reward_size = self.reward_size.max(1.0);
        self.reward_gap_bonus = self.reward_gap_bonus.max(0.0);
        self.reward_speed_scale = self.reward_speed_scale.clamp(0.0, 1.0);
        self.reward_speed_floor_scale = self.reward_speed_floor_scale.clamp(0.0, 1.0);

        self.alien_width = self.alien_width.max(1.0);
        self.alien_height = self.alien_height.max(1.0);
        self.alien_walk_speed = self.alien_walk_speed.max(0.0);
        self.alien_walk_jitter = self.alien_walk_jitter.max(0.0);
        self.alien_safe_margin = self.alien_safe_margin.max(0.0);
        self.alien_first_fire_delay_ms = self.alien_first_fire_delay_ms.max(0.0);
        self.alien_fire_stagger_ms = self.alien_fire_stagger_ms.max(0.0);
        self.alien_min_cooldown_ms = self.alien_min_cooldown_ms.max(0.0);
        self.alien_max_cooldown_ms = self.alien_max_cooldown_ms.max(self.alien_min_cooldown_ms);
        self.alien_aim_dwell_ms = self.alien_aim_dwell_ms.max(0.0);
        self.alien_lead_factor = self.alien_lead_factor.max(0.0);
        self.alien_min_vertical_bias = self.alien_min_vertical_bias.clamp(0.0, 0.95);
        self.bullet_speed = self.bullet_speed.max(0.1);
        self.bullet_speed_jitter = self.bullet_speed_jitter.max(0.0);
        self.bullet_radius = self.bullet_radius.max(0.0);
        self.lethal_hits = self.lethal_hits.max(1);
        self.target_velocity_smoothing = self.target_velocity_smoothing.clamp(0.0, 1.0);
        self.target_velocity_limit = self.target_velocity_limit.max(0.0);

        if self != original {
            log::warn!("Tuning contained out-of-range values; clamped to playable limits");
        }
        self
    }

    /// Fall distance per nominal frame at the given speed
    #[inline]
    pub fn fall_per_frame(&self, speed: f32, fast_drop: bool) -> f32 {
        let boost = if fast_drop { self.fast_drop_multiplier } else { 1.0 };
        speed * self.fall_multiplier * boost
    }
}
