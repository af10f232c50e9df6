//! Game state and session commands
//!
//! Everything a session needs lives in one owned `SimulationState`; the
//! frame tick and player commands take it by `&mut`.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::alien::Squad;
use super::difficulty::Difficulty;
use super::gap::Gap;
use super::geometry::{RotateDir, Rotation, ShapeKind};
use super::reward::{Reward, RewardSchedule};
use super::shape::Shape;
use crate::consts::GAME_WIDTH;
use crate::tuning::Tuning;

/// Current phase of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Idle, waiting for start
    Ready,
    Running,
    /// Integration frozen, all state retained
    Paused,
    /// Session ended; only restart leaves this phase
    GameOver,
}

/// Things that happened during a tick or command.
///
/// Audio, particles and haptics consume these; nothing in the simulation
/// reads them back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    SessionStarted,
    ShapeSpawned { kind: ShapeKind },
    Rotated { rotation: Rotation },
    Passed { score: f32, gain: f32, leftover: f32 },
    Perfect { pos: Vec2 },
    Crashed { pos: Vec2 },
    AlienHit { pos: Vec2, lethal: bool },
    AliensActivated,
    AlienAiming { index: usize, target: Vec2 },
    AlienFired { index: usize, origin: Vec2 },
    RewardSpawned { pos: Vec2 },
    RewardCollected { pos: Vec2 },
    Paused,
    Resumed,
    GameOver { score: f32, high_score: f32, new_high: bool },
}

/// Complete simulation state (deterministic for a given seed and command sequence)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationState {
    pub tuning: Tuning,
    pub seed: u64,
    pub(crate) rng: Pcg32,
    pub phase: GamePhase,
    pub score: f32,
    /// Best score seen, carried across sessions
    pub high_score: f32,
    /// Sim clock; advances only while running
    pub time_ms: f32,
    pub shape: Shape,
    /// Shapes handed out this session (drives the kind rotation)
    pub shapes_dealt: usize,
    pub gap: Gap,
    pub difficulty: Difficulty,
    pub reward: Reward,
    pub reward_schedule: RewardSchedule,
    pub squad: Squad,
    /// Fall boost held by the player
    pub fast_drop: bool,
    /// Perfect banner stays up until this sim time
    pub perfect_until_ms: Option<f32>,
    #[serde(skip)]
    pub events: Vec<GameEvent>,
}

impl SimulationState {
    pub fn new(seed: u64, tuning: Tuning) -> Self {
        let tuning = tuning.sanitized();
        let (min_x, max_x) = Gap::x_range(tuning.initial_gap, &tuning);
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            phase: GamePhase::Ready,
            score: 0.0,
            high_score: 0.0,
            time_ms: 0.0,
            shape: Shape::spawn(ShapeKind::Rectangle, 1, 0.0, 0),
            shapes_dealt: 0,
            gap: Gap::new((min_x + max_x) / 2.0, &tuning),
            difficulty: Difficulty::new(&tuning),
            reward: Reward::inactive(),
            reward_schedule: RewardSchedule::new(&tuning),
            squad: Squad::default(),
            fast_drop: false,
            perfect_until_ms: None,
            events: Vec::new(),
            tuning,
        }
    }

    /// Start from Ready or GameOver; ignored mid-session
    pub fn start(&mut self) -> bool {
        match self.phase {
            GamePhase::Ready | GamePhase::GameOver => {
                self.reset_session();
                true
            }
            GamePhase::Running | GamePhase::Paused => false,
        }
    }

    /// Fresh session from any phase
    pub fn restart(&mut self) {
        self.reset_session();
    }

    fn reset_session(&mut self) {
        let initial_gap = self.tuning.initial_gap;
        let base = Gap::random_base(initial_gap, self.rng.random::<f32>(), &self.tuning);

        self.score = 0.0;
        self.time_ms = 0.0;
        self.difficulty = Difficulty::new(&self.tuning);
        self.difficulty.drift_phase = self.rng.random::<f32>() * std::f32::consts::TAU;
        self.gap = Gap::new(base, &self.tuning);
        self.reward = Reward::inactive();
        self.reward_schedule = RewardSchedule::new(&self.tuning);
        self.squad.reset();
        self.fast_drop = false;
        self.perfect_until_ms = None;
        self.shapes_dealt = 0;
        self.spawn_shape();

        self.phase = GamePhase::Running;
        self.events.push(GameEvent::SessionStarted);
        log::info!("Session started (seed {}, gap at {:.1})", self.seed, base);
    }

    /// Running -> Paused; no-op otherwise
    pub fn pause(&mut self) {
        if self.phase == GamePhase::Running {
            self.phase = GamePhase::Paused;
            self.fast_drop = false;
            self.events.push(GameEvent::Paused);
        }
    }

    /// Paused -> Running; no-op otherwise
    pub fn resume(&mut self) {
        if self.phase == GamePhase::Paused {
            self.phase = GamePhase::Running;
            self.events.push(GameEvent::Resumed);
        }
    }

    pub fn toggle_pause(&mut self) {
        match self.phase {
            GamePhase::Running => self.pause(),
            GamePhase::Paused => self.resume(),
            GamePhase::Ready | GamePhase::GameOver => {}
        }
    }

    pub fn rotate(&mut self, dir: RotateDir) {
        if self.phase != GamePhase::Running {
            return;
        }
        self.shape.rotate(dir);
        self.events.push(GameEvent::Rotated {
            rotation: self.shape.rotation,
        });
    }

    /// Tap on the playfield: left half turns left, right half turns right
    pub fn tap(&mut self, x: f32) {
        let dir = if x < GAME_WIDTH / 2.0 {
            RotateDir::Left
        } else {
            RotateDir::Right
        };
        self.rotate(dir);
    }

    pub fn set_fast_drop(&mut self, held: bool) {
        self.fast_drop = held && self.phase == GamePhase::Running;
    }

    /// Replace the current shape with the next one in the rotation
    pub fn spawn_shape(&mut self) {
        let kind = ShapeKind::nth(self.shapes_dealt);
        self.shapes_dealt += 1;
        let slot = self.rng.random_range(0..3);
        let jitter = self.rng.random::<f32>() - 0.5;
        let palette = self.rng.random_range(0..kind.palette_count());
        self.shape = Shape::spawn(kind, slot, jitter, palette);
        log::debug!("Spawned {} in slot {}", kind.as_str(), slot);
        self.squad.tracker.reset();
        self.events.push(GameEvent::ShapeSpawned { kind });
    }

    /// End the session, keeping the score for display
    pub(crate) fn game_over(&mut self) {
        let new_high = self.score > self.high_score;
        self.high_score = self.high_score.max(self.score);
        self.phase = GamePhase::GameOver;
        self.reward.active = false;
        self.perfect_until_ms = None;
        self.fast_drop = false;
        self.events.push(GameEvent::GameOver {
            score: self.score,
            high_score: self.high_score,
            new_high,
        });
        log::info!("Game over: score {} (best {})", self.score, self.high_score);
    }

    pub fn perfect_active(&self) -> bool {
        self.perfect_until_ms.is_some_and(|until| self.time_ms < until)
    }

    /// Seconds until the shape reaches the wall top, one decimal
    pub fn time_to_impact(&self) -> Option<f32> {
        if !matches!(self.phase, GamePhase::Running | GamePhase::Paused) || self.shape.passed {
            return None;
        }
        let remaining = self.gap.wall_y - self.shape.pos.y - self.shape.size().height;
        let per_second = self.tuning.fall_per_frame(self.difficulty.speed, self.fast_drop) * 60.0;
        let seconds = if remaining > 0.0 { remaining / per_second } else { 0.0 };
        Some((seconds * 10.0).round() / 10.0)
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}
