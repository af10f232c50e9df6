//! Power-up that eases difficulty
//!
//! One reward at a time, offered on a score schedule: first at
//! `reward_first_score`, then every `reward_interval` points.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::geometry::Aabb;
use crate::consts::GAME_WIDTH;
use crate::tuning::Tuning;

/// Minimum height of a reward above the top of the screen
const REWARD_MIN_Y: f32 = 140.0;
/// How far above the wall rewards float
const REWARD_WALL_OFFSET: f32 = 220.0;
const REWARD_EDGE_MARGIN: f32 = 12.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reward {
    /// Centre of the pickup
    pub pos: Vec2,
    pub active: bool,
}

impl Reward {
    pub fn inactive() -> Self {
        Self {
            pos: Vec2::new(GAME_WIDTH / 2.0, REWARD_MIN_Y),
            active: false,
        }
    }

    pub fn bounds(&self, tuning: &Tuning) -> Aabb {
        Aabb::centered(self.pos, tuning.reward_size / 2.0)
    }
}

/// Tracks the next score that offers a reward
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardSchedule {
    pub next_score: f32,
}

impl RewardSchedule {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            next_score: tuning.reward_first_score,
        }
    }

    /// True when `score` reached the threshold; advances to the next one
    pub fn due(&mut self, score: f32, tuning: &Tuning) -> bool {
        if score >= self.next_score {
            self.next_score += tuning.reward_interval;
            true
        } else {
            false
        }
    }
}

/// Place a reward above the wall; `unit` in [0, 1) picks the column
pub fn spawn(unit: f32, wall_y: f32, tuning: &Tuning) -> Reward {
    let margin = REWARD_EDGE_MARGIN + tuning.reward_size / 2.0;
    let usable = (GAME_WIDTH - margin * 2.0).max(0.0);
    Reward {
        pos: Vec2::new(margin + unit * usable, REWARD_MIN_Y.max(wall_y - REWARD_WALL_OFFSET)),
        active: true,
    }
}

/// Whether the shape's candidate footprint touches an active reward
pub fn overlaps(reward: &Reward, shape: &Aabb, tuning: &Tuning) -> bool {
    reward.active && reward.bounds(tuning).overlaps(shape)
}
