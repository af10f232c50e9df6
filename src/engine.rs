//! Frame loop facade
//!
//! `Engine` is what a host (browser page, headless runner, test) talks to.
//! It owns the simulation plus its collaborators: a clock, the high-score
//! store and the score sync. The host calls `frame()` whenever its
//! scheduler fires and keeps scheduling only while `frame()` returns true.

use serde::Serialize;

use crate::highscores::HighScore;
use crate::platform::{Clock, KeyValueStore};
use crate::scoring::ScoreSync;
use crate::sim::{GameEvent, GamePhase, RotateDir, ShapeKind, SimulationState, frame_delta, tick};
use crate::tuning::Tuning;

/// Timing of the host's frame requests
#[derive(Debug, Clone, Default)]
struct FrameLoop {
    last_ms: Option<f64>,
    scheduled: bool,
}

impl FrameLoop {
    fn begin(&mut self, now_ms: f64) {
        self.last_ms = Some(now_ms);
        self.scheduled = true;
    }

    fn cancel(&mut self) {
        self.last_ms = None;
        self.scheduled = false;
    }

    /// Normalized delta since the previous frame
    fn advance(&mut self, now_ms: f64) -> f32 {
        let delta = match self.last_ms {
            Some(last) => frame_delta(now_ms - last),
            None => 1.0,
        };
        self.last_ms = Some(now_ms);
        delta
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlienView {
    pub x: f32,
    pub y: f32,
    pub aiming: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BulletView {
    pub x: f32,
    pub y: f32,
}

/// Read-only view for the rendering layer, refreshed every frame
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub state: GamePhase,
    pub score: f32,
    pub high_score: f32,
    pub shape_x: f32,
    pub shape_y: f32,
    pub shape_width: f32,
    pub shape_height: f32,
    /// Degrees, one of 0/90/180/270
    pub rotation: i32,
    pub shape_kind: ShapeKind,
    pub palette: usize,
    pub damage_hits: u32,
    pub gap_x: f32,
    pub gap_width: f32,
    pub wall_y: f32,
    pub wall_height: f32,
    pub perfect_active: bool,
    pub time_to_impact: Option<f32>,
    pub reward_active: bool,
    pub reward_x: f32,
    pub reward_y: f32,
    pub aliens: Vec<AlienView>,
    pub bullets: Vec<BulletView>,
    pub sync_status: Option<String>,
}

pub struct Engine {
    state: SimulationState,
    clock: Box<dyn Clock>,
    store: Box<dyn KeyValueStore>,
    high_score: HighScore,
    sync: ScoreSync,
    frames: FrameLoop,
}

impl Engine {
    pub fn new(seed: u64, tuning: Tuning, clock: Box<dyn Clock>, store: Box<dyn KeyValueStore>) -> Self {
        let high_score = HighScore::load(store.as_ref());
        let mut state = SimulationState::new(seed, tuning);
        state.high_score = high_score.best;
        Self {
            state,
            clock,
            store,
            high_score,
            sync: ScoreSync::offline(),
            frames: FrameLoop::default(),
        }
    }

    pub fn with_score_sync(mut self, sync: ScoreSync) -> Self {
        self.sync = sync;
        self
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn store(&self) -> &dyn KeyValueStore {
        self.store.as_ref()
    }

    pub fn score_sync(&mut self) -> &mut ScoreSync {
        &mut self.sync
    }

    /// Whether the host should keep requesting frames
    pub fn is_frame_scheduled(&self) -> bool {
        self.frames.scheduled
    }

    /// Start from Ready or GameOver; true if a session began
    pub fn start(&mut self) -> bool {
        if !self.state.start() {
            return false;
        }
        self.begin_session();
        true
    }

    pub fn restart(&mut self) {
        self.state.restart();
        self.begin_session();
    }

    fn begin_session(&mut self) {
        self.sync.on_session_start();
        self.frames.begin(self.clock.now_ms());
    }

    pub fn pause(&mut self) {
        self.state.pause();
        if self.state.phase != GamePhase::Running {
            self.frames.cancel();
        }
    }

    pub fn resume(&mut self) {
        self.state.resume();
        if self.state.phase == GamePhase::Running && !self.frames.scheduled {
            self.frames.begin(self.clock.now_ms());
        }
    }

    pub fn toggle_pause(&mut self) {
        match self.state.phase {
            GamePhase::Running => self.pause(),
            GamePhase::Paused => self.resume(),
            GamePhase::Ready | GamePhase::GameOver => {}
        }
    }

    pub fn rotate(&mut self, dir: RotateDir) {
        self.state.rotate(dir);
    }

    pub fn tap(&mut self, x: f32) {
        self.state.tap(x);
    }

    pub fn set_fast_drop(&mut self, held: bool) {
        self.state.set_fast_drop(held);
    }

    /// One display frame. Returns whether another frame should be requested.
    pub fn frame(&mut self) -> bool {
        self.poll_sync();
        if self.state.phase != GamePhase::Running {
            self.frames.cancel();
            return false;
        }

        let delta = self.frames.advance(self.clock.now_ms());
        tick(&mut self.state, delta);

        if self.state.phase == GamePhase::GameOver {
            self.finish_session();
            self.poll_sync();
            self.frames.cancel();
            return false;
        }
        true
    }

    /// Fold in run-verification results without ticking.
    ///
    /// Hosts keep calling this (on a timer or UI event) after `frame()`
    /// stops asking to be scheduled. Returns true if the displayed best rose.
    pub fn poll_sync(&mut self) -> bool {
        match self.sync.poll() {
            Some(best) if best > self.state.high_score => {
                self.state.high_score = best;
                true
            }
            _ => false,
        }
    }

    fn finish_session(&mut self) {
        let score = self.state.score;
        if self.high_score.submit(score)
            && let Err(e) = self.high_score.save(self.store.as_mut())
        {
            log::warn!("Failed to save high score: {}", e);
        }
        self.sync.on_game_over(score);
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.state.drain_events()
    }

    pub fn snapshot(&self) -> Snapshot {
        let state = &self.state;
        let size = state.shape.size();
        Snapshot {
            state: state.phase,
            score: state.score,
            high_score: state.high_score,
            shape_x: state.shape.pos.x,
            shape_y: state.shape.pos.y,
            shape_width: size.width,
            shape_height: size.height,
            rotation: state.shape.rotation.degrees(),
            shape_kind: state.shape.kind,
            palette: state.shape.palette,
            damage_hits: state.shape.damage_hits,
            gap_x: state.gap.x,
            gap_width: state.difficulty.gap_width,
            wall_y: state.gap.wall_y,
            wall_height: state.tuning.wall_height,
            perfect_active: state.perfect_active(),
            time_to_impact: state.time_to_impact(),
            reward_active: state.reward.active,
            reward_x: state.reward.pos.x,
            reward_y: state.reward.pos.y,
            aliens: state
                .squad
                .aliens
                .iter()
                .map(|a| AlienView {
                    x: a.pos.x,
                    y: a.pos.y,
                    aiming: a.is_aiming(),
                })
                .collect(),
            bullets: state
                .squad
                .bullets
                .iter()
                .map(|b| BulletView { x: b.pos.x, y: b.pos.y })
                .collect(),
            sync_status: self.sync.status().map(str::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{FRAME_MS, HIGH_SCORE_KEY};
    use crate::platform::{ManualClock, MemoryStore};
    use crate::scoring::{Dispatch, FinishReceipt, RunTicket, RunVerifier, ScoringError};
    use std::sync::Arc;

    fn engine_with(store: MemoryStore) -> (Engine, ManualClock) {
        let clock = ManualClock::new(1000.0);
        let engine = Engine::new(42, Tuning::default(), Box::new(clock.clone()), Box::new(store));
        (engine, clock)
    }

    /// Put the shape just above the wall, well away from the gap
    fn set_up_crash(engine: &mut Engine) {
        let state = &mut engine.state;
        state.difficulty.drift_amplitude = 0.0;
        state.gap.transition.active = false;
        state.gap.base_x = 1000.0;
        state.shape.pos.x = 0.0;
        state.shape.pos.y = state.gap.wall_y - state.shape.size().height - 0.5;
    }

    #[test]
    fn test_frame_idle_until_started() {
        let (mut engine, clock) = engine_with(MemoryStore::new());
        assert!(!engine.frame());
        assert!(engine.start());
        assert!(engine.is_frame_scheduled());
        clock.advance(FRAME_MS as f64);
        assert!(engine.frame());
        assert!((engine.state().time_ms - FRAME_MS).abs() < 1e-3);
    }

    #[test]
    fn test_long_stall_is_clamped() {
        let (mut engine, clock) = engine_with(MemoryStore::new());
        engine.start();
        clock.advance(5000.0);
        engine.frame();
        assert!((engine.state().time_ms - 2.0 * FRAME_MS).abs() < 1e-3);
    }

    #[test]
    fn test_resume_restarts_timing() {
        let (mut engine, clock) = engine_with(MemoryStore::new());
        engine.start();
        clock.advance(FRAME_MS as f64);
        engine.frame();
        let before = engine.state().time_ms;

        engine.pause();
        assert!(!engine.is_frame_scheduled());
        assert!(!engine.frame());
        clock.advance(60_000.0);
        engine.resume();
        assert!(engine.is_frame_scheduled());
        clock.advance(FRAME_MS as f64);
        assert!(engine.frame());
        assert!((engine.state().time_ms - before - FRAME_MS).abs() < 1e-3);
    }

    #[test]
    fn test_loads_stored_high_score() {
        let mut store = MemoryStore::new();
        store.set(HIGH_SCORE_KEY, "14.5").unwrap();
        let (engine, _) = engine_with(store);
        assert_eq!(engine.snapshot().high_score, 14.5);
    }

    #[test]
    fn test_game_over_persists_new_best() {
        let (mut engine, clock) = engine_with(MemoryStore::new());
        engine.start();
        engine.state.score = 3.5;
        set_up_crash(&mut engine);
        clock.advance(FRAME_MS as f64);

        assert!(!engine.frame());
        assert!(!engine.is_frame_scheduled());
        let snap = engine.snapshot();
        assert_eq!(snap.state, GamePhase::GameOver);
        assert_eq!(snap.score, 3.5);
        assert_eq!(snap.high_score, 3.5);
        assert_eq!(snap.time_to_impact, None);
        assert_eq!(engine.store().get(HIGH_SCORE_KEY).unwrap().as_deref(), Some("3.5"));
    }

    #[test]
    fn test_snapshot_reflects_rotation() {
        let (mut engine, _) = engine_with(MemoryStore::new());
        engine.start();
        engine.rotate(RotateDir::Right);
        let snap = engine.snapshot();
        assert_eq!(snap.rotation, 90);
        assert_eq!(snap.shape_kind, ShapeKind::Circle);
        assert!(snap.time_to_impact.is_some());
        assert!(!snap.reward_active);

        let json = serde_json::to_value(&snap).unwrap();
        assert_eq!(json["state"], "Running");
        assert!(json.get("gapWidth").is_some());
    }

    struct Accepting;

    impl RunVerifier for Accepting {
        fn start_run(&self, _token: &str) -> Result<RunTicket, ScoringError> {
            Ok(RunTicket {
                run_id: "run".into(),
                expires_at: 0,
                signature: "sig".into(),
            })
        }

        fn finish_run(&self, _token: &str, _ticket: &RunTicket, score: f32) -> Result<FinishReceipt, ScoringError> {
            Ok(FinishReceipt {
                best_score: score.max(99.0),
                leaderboard_top5: Vec::new(),
            })
        }
    }

    #[test]
    fn test_accepted_best_reconciled_after_game_over() {
        let (engine, clock) = engine_with(MemoryStore::new());
        let sync = ScoreSync::new(Arc::new(Accepting), "tok", Dispatch::Inline);
        let mut engine = engine.with_score_sync(sync);

        engine.start();
        clock.advance(FRAME_MS as f64);
        engine.frame();
        set_up_crash(&mut engine);
        clock.advance(FRAME_MS as f64);

        // Inline answers land within the game-over frame itself
        assert!(!engine.frame());
        assert_eq!(engine.state().phase, GamePhase::GameOver);
        assert_eq!(engine.snapshot().high_score, 99.0);
        assert_eq!(engine.store().get(HIGH_SCORE_KEY).unwrap(), None);
    }

    #[test]
    fn test_background_result_lands_after_frames_stop() {
        let (engine, clock) = engine_with(MemoryStore::new());
        let sync = ScoreSync::new(Arc::new(Accepting), "tok", Dispatch::Background);
        let mut engine = engine.with_score_sync(sync);

        engine.start();
        set_up_crash(&mut engine);
        clock.advance(FRAME_MS as f64);
        assert!(!engine.frame());
        assert!(!engine.is_frame_scheduled());

        // The host no longer calls frame(); only poll_sync
        let mut raised = false;
        for _ in 0..400 {
            raised |= engine.poll_sync();
            if raised {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(5));
        }
        assert!(raised);
        assert_eq!(engine.snapshot().high_score, 99.0);
        assert_eq!(engine.state().phase, GamePhase::GameOver);
    }
}
