//! Per-frame simulation step
//!
//! Order within a tick: drift the gap, integrate the fall to a candidate
//! position, resolve the reward, let the aliens move and shoot, resolve
//! bullet hits, then classify the wall crossing. Overlap tests use the
//! candidate position; the wall test sweeps from the current position to it
//! so nothing tunnels through within one frame.

use glam::Vec2;
use rand::Rng;

use super::alien::Target;
use super::collision::{Crossing, WallBand, classify};
use super::gap::Gap;
use super::reward;
use super::state::{GameEvent, GamePhase, SimulationState};
use crate::consts::{FRAME_MS, GAME_HEIGHT, MAX_FRAME_DELTA, MIN_FRAME_DELTA, RESPAWN_MARGIN};

/// Normalize elapsed milliseconds to nominal frames, clamped
pub fn frame_delta(elapsed_ms: f64) -> f32 {
    ((elapsed_ms / FRAME_MS as f64) as f32).clamp(MIN_FRAME_DELTA, MAX_FRAME_DELTA)
}

/// Advance a running session by `delta` nominal frames
pub fn tick(state: &mut SimulationState, delta: f32) {
    if state.phase != GamePhase::Running {
        return;
    }
    let delta = delta.clamp(MIN_FRAME_DELTA, MAX_FRAME_DELTA);
    let tuning = state.tuning.clone();

    state.time_ms += delta * FRAME_MS;
    let now = state.time_ms;

    if state.perfect_until_ms.is_some_and(|until| now >= until) {
        state.perfect_until_ms = None;
    }

    let shape_size = state.shape.size();
    let gap_x = state.gap.update(
        now,
        state.difficulty.gap_width,
        state.difficulty.drift_amplitude,
        state.difficulty.drift_phase,
        &tuning,
    );

    let fall = tuning.fall_per_frame(state.difficulty.speed, state.fast_drop);
    let next_y = state.shape.pos.y + fall * delta;
    let candidate = state.shape.bounds_at(next_y);

    // Reward pickup applies before any pass-based tightening
    if reward::overlaps(&state.reward, &candidate, &tuning) {
        state.reward.active = false;
        state.difficulty.on_reward(&tuning);
        state.gap.reclamp(state.difficulty.gap_width, &tuning);
        state.events.push(GameEvent::RewardCollected { pos: state.reward.pos });
        log::info!(
            "Reward collected: speed {:.2}, gap {:.1}",
            state.difficulty.speed,
            state.difficulty.gap_width
        );
    }

    let centroid = candidate.center();
    let vx = state.squad.tracker.observe(centroid.x, now, &tuning);
    let target = (candidate.min.y < GAME_HEIGHT).then_some(Target {
        pos: centroid,
        vel: Vec2::new(vx, fall),
    });

    let SimulationState {
        squad, rng, events, difficulty, ..
    } = state;
    squad.update(rng, delta, now, gap_x, difficulty.gap_width, target, &tuning, events);

    let hits = state.squad.update_bullets(delta, &candidate, &tuning);
    if hits > 0 {
        state.shape.damage_hits += hits;
        let lethal = state.shape.damage_hits >= tuning.lethal_hits;
        state.events.push(GameEvent::AlienHit { pos: centroid, lethal });
        log::debug!(
            "Shape hit ({} of {} hits)",
            state.shape.damage_hits,
            tuning.lethal_hits
        );
        if lethal {
            // Frozen where the bullet landed
            state.shape.pos.y = next_y;
            state.game_over();
            return;
        }
    }

    let band = WallBand::new(state.gap.wall_y, tuning.wall_height);
    match classify(
        &state.shape.bounds(),
        &candidate,
        band,
        gap_x,
        state.difficulty.gap_width,
        state.shape.passed,
        tuning.perfect_tolerance,
    ) {
        Crossing::Crash => {
            let impact_y = band.top - shape_size.height;
            state.shape.pos.y = impact_y;
            state.events.push(GameEvent::Crashed {
                pos: Vec2::new(state.shape.pos.x + shape_size.width / 2.0, impact_y),
            });
            state.game_over();
            return;
        }
        Crossing::Pass { leftover, perfect } => {
            state.shape.passed = true;
            on_pass(state, leftover, perfect);
        }
        Crossing::Threading | Crossing::Clear => {}
    }

    state.shape.pos.y = next_y;

    if state.shape.passed && next_y > GAME_HEIGHT + RESPAWN_MARGIN {
        state.spawn_shape();
    }
}

/// Score, spawn threats/rewards, tighten difficulty and slide the gap
fn on_pass(state: &mut SimulationState, leftover: f32, perfect: bool) {
    let tuning = state.tuning.clone();
    let now = state.time_ms;

    let gain = if state.shape.is_damaged() { 0.5 } else { 1.0 };
    state.score += gain;
    state.high_score = state.high_score.max(state.score);
    state.events.push(GameEvent::Passed {
        score: state.score,
        gain,
        leftover,
    });
    log::debug!("Pass: score {} (leftover {:.1})", state.score, leftover);

    let SimulationState {
        squad, rng, gap, difficulty, score, ..
    } = state;
    if squad.maybe_activate(rng, *score, now, gap.wall_y, gap.x, difficulty.gap_width, &tuning) {
        state.events.push(GameEvent::AliensActivated);
    }

    if state.reward_schedule.due(state.score, &tuning) {
        let unit = state.rng.random::<f32>();
        state.reward = reward::spawn(unit, state.gap.wall_y, &tuning);
        state.events.push(GameEvent::RewardSpawned { pos: state.reward.pos });
        log::info!("Reward spawned at ({:.1}, {:.1})", state.reward.pos.x, state.reward.pos.y);
    }

    if perfect {
        state.perfect_until_ms = Some(now + tuning.perfect_flash_ms);
        let size = state.shape.size();
        state.events.push(GameEvent::Perfect {
            pos: Vec2::new(
                state.shape.pos.x + size.width / 2.0,
                state.gap.wall_y - tuning.wall_height * 1.6,
            ),
        });
    }

    let phase = state.rng.random::<f32>() * std::f32::consts::TAU;
    state.difficulty.on_pass(&tuning, phase);
    let unit = state.rng.random::<f32>();
    let target = Gap::random_base(state.difficulty.gap_width, unit, &tuning);
    state.gap.retarget(now, target, &tuning);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::alien::Bullet;
    use crate::sim::geometry::{RotateDir, ShapeKind};
    use crate::tuning::Tuning;

    fn running(seed: u64) -> SimulationState {
        let mut state = SimulationState::new(seed, Tuning::default());
        state.start();
        state
    }

    /// Park the gap so the shape fits, with no drift or tween
    fn align_gap(state: &mut SimulationState) {
        state.difficulty.drift_amplitude = 0.0;
        state.gap.transition.active = false;
        let size = state.shape.size();
        let width = state.difficulty.gap_width;
        let center = state.shape.pos.x + size.width / 2.0;
        let (min, max) = Gap::x_range(width, &state.tuning);
        state.gap.base_x = crate::clamp(center - width / 2.0, min, max);
        // Edge spawns sit outside the gap range; slide them in
        if !state.shape.passed && size.width <= width {
            let lo = state.gap.base_x;
            state.shape.pos.x = crate::clamp(state.shape.pos.x, lo, lo + width - size.width);
        }
    }

    /// Tick until the current shape scores or the session ends
    fn run_to_pass(state: &mut SimulationState) {
        let score = state.score;
        for _ in 0..5000 {
            align_gap(state);
            tick(state, 1.0);
            if state.score > score || state.phase != GamePhase::Running {
                return;
            }
        }
        panic!("shape never passed");
    }

    #[test]
    fn test_frame_delta_clamps() {
        assert_eq!(frame_delta(0.0), MIN_FRAME_DELTA);
        assert!((frame_delta(16.67) - 1.0).abs() < 1e-4);
        assert_eq!(frame_delta(5000.0), MAX_FRAME_DELTA);
    }

    #[test]
    fn test_tick_ignored_unless_running() {
        let mut state = SimulationState::new(1, Tuning::default());
        let y = state.shape.pos.y;
        tick(&mut state, 1.0);
        assert_eq!(state.shape.pos.y, y);

        state.start();
        state.pause();
        let y = state.shape.pos.y;
        let t = state.time_ms;
        tick(&mut state, 1.0);
        assert_eq!(state.shape.pos.y, y);
        assert_eq!(state.time_ms, t);
    }

    #[test]
    fn test_shape_falls_monotonically() {
        let mut state = running(3);
        align_gap(&mut state);
        let mut last = state.shape.pos.y;
        for _ in 0..50 {
            tick(&mut state, 1.0);
            assert!(state.shape.pos.y > last);
            last = state.shape.pos.y;
        }
    }

    #[test]
    fn test_clean_pass_scores_once_and_tightens() {
        let mut state = running(11);
        let gap_before = state.difficulty.gap_width;
        let speed_before = state.difficulty.speed;

        run_to_pass(&mut state);
        assert_eq!(state.phase, GamePhase::Running);
        assert_eq!(state.score, 1.0);
        assert!(state.shape.passed);
        assert!(state.difficulty.gap_width < gap_before);
        assert!(state.difficulty.speed > speed_before);
        assert!(state.gap.transition.active);

        // Keeps falling after the pass without scoring again
        let y = state.shape.pos.y;
        for _ in 0..5 {
            tick(&mut state, 1.0);
        }
        assert!(state.shape.pos.y > y);
        assert_eq!(state.score, 1.0);
        let passes = state
            .drain_events()
            .iter()
            .filter(|e| matches!(e, GameEvent::Passed { .. }))
            .count();
        assert_eq!(passes, 1);
    }

    #[test]
    fn test_next_shape_spawns_after_leaving_screen() {
        let mut state = running(12);
        run_to_pass(&mut state);
        assert_eq!(state.shape.kind, ShapeKind::Circle);
        for _ in 0..2000 {
            tick(&mut state, 1.0);
            if state.shape.kind != ShapeKind::Circle {
                break;
            }
        }
        assert_eq!(state.shape.kind, ShapeKind::Square);
        assert!(!state.shape.passed);
        assert!(state.shape.pos.y < 0.0);
    }

    #[test]
    fn test_crash_on_first_misaligned_tick() {
        let mut state = running(4);
        state.difficulty.drift_amplitude = 0.0;
        state.gap.transition.active = false;
        // Gap on the far right, shape on the far left
        state.gap.base_x = 1000.0;
        state.shape.pos.x = 0.0;
        let height = state.shape.size().height;
        state.shape.pos.y = state.gap.wall_y - height - 0.5;

        tick(&mut state, 1.0);
        assert_eq!(state.phase, GamePhase::GameOver);
        assert_eq!(state.shape.pos.y, state.gap.wall_y - height);
        assert_eq!(state.score, 0.0);
        assert!(state.events.iter().any(|e| matches!(e, GameEvent::Crashed { .. })));

        // Frozen afterwards
        let y = state.shape.pos.y;
        tick(&mut state, 1.0);
        assert_eq!(state.shape.pos.y, y);
    }

    #[test]
    fn test_perfect_pass_flashes_then_expires() {
        let mut state = running(5);
        // Circle footprint is 60 wide; leave 10 px of room
        state.difficulty.gap_width = 70.0;
        run_to_pass(&mut state);
        assert!(state.perfect_active());
        let perfects = state
            .events
            .iter()
            .filter(|e| matches!(e, GameEvent::Perfect { .. }))
            .count();
        assert_eq!(perfects, 1);

        for _ in 0..40 {
            tick(&mut state, 1.0);
        }
        assert!(!state.perfect_active());
        assert_eq!(state.perfect_until_ms, None);
    }

    #[test]
    fn test_loose_pass_is_not_perfect() {
        let mut state = running(6);
        run_to_pass(&mut state);
        assert!(!state.perfect_active());
    }

    #[test]
    fn test_non_lethal_hit_halves_next_pass() {
        let mut state = running(7);
        state.squad.active = true;
        state.shape.pos.y = 200.0;
        let center = state.shape.bounds().center();
        state.squad.bullets.push(Bullet {
            pos: center,
            vel: Vec2::ZERO,
        });
        tick(&mut state, 1.0);
        assert_eq!(state.shape.damage_hits, 1);
        assert_eq!(state.phase, GamePhase::Running);
        assert!(state.squad.bullets.is_empty());

        run_to_pass(&mut state);
        assert_eq!(state.score, 0.5);
    }

    #[test]
    fn test_lethal_hit_ends_session_on_that_tick() {
        let mut state = running(8);
        state.squad.active = true;
        state.shape.damage_hits = 1;
        state.shape.pos.y = 200.0;
        let center = state.shape.bounds().center();
        state.squad.bullets.push(Bullet {
            pos: center,
            vel: Vec2::ZERO,
        });
        let y_before = state.shape.pos.y;
        tick(&mut state, 1.0);
        assert_eq!(state.phase, GamePhase::GameOver);
        assert_eq!(state.shape.damage_hits, 2);
        assert!(state.shape.pos.y > y_before);
        assert!(state.events.iter().any(|e| matches!(e, GameEvent::AlienHit { lethal: true, .. })));
    }

    #[test]
    fn test_reward_pickup_eases_difficulty() {
        let mut state = running(9);
        state.difficulty.speed = 5.0;
        state.difficulty.gap_width = 100.0;
        state.shape.pos.y = 200.0;
        let pos = state.shape.bounds().center() + Vec2::new(0.0, 10.0);
        state.reward = crate::sim::reward::Reward { pos, active: true };

        tick(&mut state, 1.0);
        assert!(!state.reward.active);
        assert!((state.difficulty.speed - 3.6).abs() < 1e-4);
        assert_eq!(state.difficulty.gap_width, 128.0);
        assert!(state.events.iter().any(|e| matches!(e, GameEvent::RewardCollected { .. })));
    }

    #[test]
    fn test_reward_and_aliens_follow_score() {
        let mut state = running(10);
        state.score = 9.0;
        run_to_pass(&mut state);
        assert_eq!(state.score, 10.0);
        assert!(state.reward.active);
        assert!(!state.squad.active);

        state.reward.active = false;
        state.score = 19.0;
        state.shape.passed = false;
        state.spawn_shape();
        run_to_pass(&mut state);
        assert_eq!(state.score, 20.0);
        assert!(state.squad.active);
        assert_eq!(state.squad.aliens.len(), 2);
        assert!(state.events.iter().any(|e| matches!(e, GameEvent::AliensActivated)));
    }

    #[test]
    fn test_gap_bounds_hold_over_a_long_run() {
        let mut state = running(13);
        for _ in 0..30 {
            run_to_pass(&mut state);
            if state.phase != GamePhase::Running {
                break;
            }
            let width = state.difficulty.gap_width;
            assert!(width >= state.tuning.min_gap);
            assert!(state.difficulty.speed <= state.tuning.max_speed);
            let (min, max) = Gap::x_range(width, &state.tuning);
            assert!(state.gap.x >= min && state.gap.x <= max);
            // hurry the shape off screen
            state.shape.pos.y = GAME_HEIGHT + RESPAWN_MARGIN + 1.0;
            tick(&mut state, 1.0);
        }
    }

    #[test]
    fn test_rotation_changes_crossing_footprint() {
        let mut state = running(14);
        // Rectangle is the third shape
        state.spawn_shape();
        state.spawn_shape();
        assert_eq!(state.shape.kind, ShapeKind::Rectangle);
        state.difficulty.gap_width = 74.0;
        state.rotate(RotateDir::Right);
        assert_eq!(state.shape.size().width, 26.0);
        run_to_pass(&mut state);
        assert_eq!(state.phase, GamePhase::Running);
        assert_eq!(state.score, 1.0);
    }

    #[test]
    fn test_determinism() {
        let mut a = running(99999);
        let mut b = running(99999);
        let script = |s: &mut SimulationState, i: usize| {
            if i % 37 == 0 {
                s.rotate(RotateDir::Right);
            }
            if i % 53 == 0 {
                s.tap(30.0);
            }
            tick(s, 1.0 + (i % 3) as f32 * 0.25);
        };
        for i in 0..3000 {
            script(&mut a, i);
            script(&mut b, i);
        }
        assert_eq!(a.phase, b.phase);
        assert_eq!(a.score, b.score);
        assert_eq!(a.shape, b.shape);
        assert_eq!(a.gap, b.gap);
        assert_eq!(a.difficulty, b.difficulty);
        assert_eq!(a.squad, b.squad);
    }

    #[test]
    fn test_fast_drop_cannot_jump_the_wall() {
        let mut state = running(21);
        state.spawn_shape();
        state.spawn_shape();
        assert_eq!(state.shape.kind, ShapeKind::Rectangle);

        state.difficulty.speed = 6.0;
        state.difficulty.gap_width = 74.0;
        state.difficulty.drift_amplitude = 0.0;
        state.gap.transition.active = false;
        let (_, max) = Gap::x_range(74.0, &state.tuning);
        state.gap.base_x = max;
        state.shape.pos.x = 0.0;
        let height = state.shape.size().height;
        state.shape.pos.y = state.gap.wall_y - height - 1.0;
        state.fast_drop = true;

        // One tick moves further than the wall band plus the shape height
        let fall = state.tuning.fall_per_frame(6.0, true) * 2.0;
        assert!(fall > height + state.tuning.wall_height);

        tick(&mut state, 2.0);
        assert_eq!(state.phase, GamePhase::GameOver);
        assert_eq!(state.score, 0.0);
        assert!(!state.shape.passed);
        assert_eq!(state.shape.pos.y, state.gap.wall_y - height);
    }

    #[test]
    fn test_fast_drop_through_aligned_gap_scores() {
        let mut state = running(22);
        state.spawn_shape();
        state.spawn_shape();
        state.difficulty.speed = 6.0;
        align_gap(&mut state);
        let height = state.shape.size().height;
        state.shape.pos.y = state.gap.wall_y - height - 1.0;
        state.fast_drop = true;

        tick(&mut state, 2.0);
        assert_eq!(state.phase, GamePhase::Running);
        assert_eq!(state.score, 1.0);
        assert!(state.shape.passed);
    }

    #[test]
    fn test_pass_rerolls_drift_phase() {
        let mut state = running(23);
        let mut phases = vec![state.difficulty.drift_phase];
        for _ in 0..3 {
            run_to_pass(&mut state);
            assert_eq!(state.phase, GamePhase::Running);
            let phase = state.difficulty.drift_phase;
            assert!((0.0..std::f32::consts::TAU).contains(&phase));
            assert!(phases.iter().all(|p| *p != phase));
            phases.push(phase);
            state.shape.pos.y = GAME_HEIGHT + RESPAWN_MARGIN + 1.0;
            tick(&mut state, 1.0);
        }
    }
}
