//! Patrol aliens and their projectiles
//!
//! Once the score reaches the activation threshold a squad spawns into two
//! lanes flanking the gap. Each alien paces its lane and, when its cooldown
//! elapses, stops to aim for a short dwell before firing at where the shape
//! is going to be.
//!
//! Per-alien state machine:
//! `Patrolling -> Aiming -> (fire, new cooldown) -> Patrolling`

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::geometry::Aabb;
use super::state::GameEvent;
use crate::clamp;
use crate::consts::{FRAME_MS, GAME_HEIGHT, GAME_WIDTH};
use crate::tuning::Tuning;

/// Distance kept between an alien lane and the playfield edge
const LANE_EDGE_INSET: f32 = 6.0;
/// Bullets above this line are gone
const BULLET_TOP_CULL: f32 = -20.0;
/// Bullets below the playfield by this much are gone
const BULLET_BOTTOM_CULL: f32 = 30.0;
/// Muzzle sits this far above the alien's top edge
const MUZZLE_OFFSET: f32 = 6.0;

/// Uniform draw in [min, max] that tolerates an empty range
fn rand_range<R: Rng>(rng: &mut R, min: f32, max: f32) -> f32 {
    min + rng.random::<f32>() * (max - min).max(0.0)
}

/// Horizontal patrol bounds (alien left edge)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Lane {
    pub min: f32,
    pub max: f32,
}

/// Left and right lanes for the current gap, kept clear of it by the safety margin
pub fn lanes(gap_x: f32, gap_width: f32, tuning: &Tuning) -> [Lane; 2] {
    let gap_start = clamp(gap_x, 0.0, GAME_WIDTH - gap_width);
    let gap_end = clamp(gap_start + gap_width, gap_start, GAME_WIDTH);
    let margin = tuning.alien_safe_margin;
    let right_max = GAME_WIDTH - tuning.alien_width - LANE_EDGE_INSET;
    [
        Lane {
            min: LANE_EDGE_INSET,
            max: (gap_start - margin - tuning.alien_width).max(LANE_EDGE_INSET + 2.0),
        },
        Lane {
            min: right_max.min(gap_end + margin),
            max: right_max,
        },
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AlienPhase {
    Patrolling,
    /// Holding still, telegraphing a shot at `target`
    Aiming { deadline_ms: f32, target: Vec2 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alien {
    /// Top-left corner
    pub pos: Vec2,
    pub lane: usize,
    /// +1 right, -1 left
    pub dir: f32,
    /// px per frame
    pub speed: f32,
    pub cooldown_ms: f32,
    pub last_shot_ms: f32,
    pub phase: AlienPhase,
}

impl Alien {
    pub fn is_aiming(&self) -> bool {
        matches!(self.phase, AlienPhase::Aiming { .. })
    }

    fn muzzle(&self, tuning: &Tuning) -> Vec2 {
        Vec2::new(self.pos.x + tuning.alien_width / 2.0, self.pos.y - MUZZLE_OFFSET)
    }

    /// Pace within the lane, reversing at its edges
    fn patrol(&mut self, lane: Lane, delta: f32) {
        self.pos.x += self.dir * self.speed * delta;
        let max = lane.max.max(lane.min);
        if self.pos.x <= lane.min {
            self.pos.x = lane.min;
            self.dir = 1.0;
        } else if self.pos.x >= max {
            self.pos.x = max;
            self.dir = -1.0;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bullet {
    pub pos: Vec2,
    /// px per frame
    pub vel: Vec2,
}

/// Where the shape is and how it is moving (px per frame)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Target {
    pub pos: Vec2,
    pub vel: Vec2,
}

impl Target {
    /// Aim point `lead_factor` frames ahead
    pub fn lead(&self, lead_factor: f32) -> Vec2 {
        self.pos + self.vel * lead_factor
    }
}

/// Smoothed horizontal velocity of the shape, sampled once per tick
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetTracker {
    last: Option<(f32, f32)>,
    pub vx: f32,
}

impl TargetTracker {
    pub fn reset(&mut self) {
        self.last = None;
        self.vx = 0.0;
    }

    /// Fold a new centroid x observed at `now_ms` into the moving average
    pub fn observe(&mut self, x: f32, now_ms: f32, tuning: &Tuning) -> f32 {
        match self.last {
            None => self.vx = 0.0,
            Some((last_x, last_ms)) => {
                let frames = (now_ms - last_ms).max(1.0) / FRAME_MS;
                let sample = (x - last_x) / frames;
                let w = tuning.target_velocity_smoothing;
                let limit = tuning.target_velocity_limit;
                self.vx = (self.vx * (1.0 - w) + sample * w).clamp(-limit, limit);
            }
        }
        self.last = Some((x, now_ms));
        self.vx
    }
}

/// Unit shot direction toward `aim` with a guaranteed vertical component.
///
/// A level shot is pushed down; otherwise the vertical sign toward the aim
/// point is kept.
pub fn shot_direction(from: Vec2, aim: Vec2, min_vertical: f32) -> Vec2 {
    let dir = (aim - from).normalize_or_zero();
    if dir == Vec2::ZERO {
        return Vec2::Y;
    }
    if dir.y.abs() >= min_vertical {
        return dir;
    }
    let vy = if dir.y < 0.0 { -min_vertical } else { min_vertical };
    let vx = (1.0 - vy * vy).sqrt().copysign(dir.x);
    Vec2::new(vx, vy)
}

/// All aliens and their live bullets
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Squad {
    pub aliens: Vec<Alien>,
    pub bullets: Vec<Bullet>,
    pub active: bool,
    pub tracker: TargetTracker,
}

impl Squad {
    pub fn reset(&mut self) {
        self.aliens.clear();
        self.bullets.clear();
        self.active = false;
        self.tracker.reset();
    }

    /// Spawn the squad once `score` crosses the activation threshold
    #[allow(clippy::too_many_arguments)]
    pub fn maybe_activate<R: Rng>(
        &mut self,
        rng: &mut R,
        score: f32,
        now_ms: f32,
        wall_y: f32,
        gap_x: f32,
        gap_width: f32,
        tuning: &Tuning,
    ) -> bool {
        if self.active || score < tuning.alien_start_score {
            return false;
        }
        self.spawn(rng, now_ms, wall_y, gap_x, gap_width, tuning);
        true
    }

    /// Place `alien_count` aliens just above the wall, alternating lanes
    pub fn spawn<R: Rng>(
        &mut self,
        rng: &mut R,
        now_ms: f32,
        wall_y: f32,
        gap_x: f32,
        gap_width: f32,
        tuning: &Tuning,
    ) {
        let y = (wall_y - tuning.alien_height - 4.0).max(0.0);
        let lanes = lanes(gap_x, gap_width, tuning);

        self.aliens = (0..tuning.alien_count)
            .map(|idx| {
                let lane_idx = idx % lanes.len();
                let lane = lanes[lane_idx];
                let usable = (lane.max - lane.min).max(0.0);
                let x = if usable > 2.0 {
                    lane.min + rng.random::<f32>() * usable
                } else {
                    lane.min
                };
                Alien {
                    pos: Vec2::new(clamp(x, lane.min, lane.max), y),
                    lane: lane_idx,
                    dir: if rng.random_bool(0.5) { 1.0 } else { -1.0 },
                    speed: tuning.alien_walk_speed + rng.random::<f32>() * tuning.alien_walk_jitter,
                    cooldown_ms: rand_range(rng, tuning.alien_min_cooldown_ms, tuning.alien_max_cooldown_ms),
                    last_shot_ms: now_ms
                        + tuning.alien_first_fire_delay_ms
                        + idx as f32 * tuning.alien_fire_stagger_ms,
                    phase: AlienPhase::Patrolling,
                }
            })
            .collect();
        self.active = true;
        log::info!("Aliens activated: {} in lanes {:?}", self.aliens.len(), lanes);
    }

    /// Patrol, aim and fire for one tick
    #[allow(clippy::too_many_arguments)]
    pub fn update<R: Rng>(
        &mut self,
        rng: &mut R,
        delta: f32,
        now_ms: f32,
        gap_x: f32,
        gap_width: f32,
        target: Option<Target>,
        tuning: &Tuning,
        events: &mut Vec<GameEvent>,
    ) {
        if !self.active {
            return;
        }
        let lanes = lanes(gap_x, gap_width, tuning);
        let Squad { aliens, bullets, .. } = self;

        for (index, alien) in aliens.iter_mut().enumerate() {
            let lane = lanes[alien.lane.min(lanes.len() - 1)];

            match alien.phase {
                AlienPhase::Patrolling => {
                    alien.patrol(lane, delta);

                    let ready = now_ms - alien.last_shot_ms >= alien.cooldown_ms;
                    if let Some(target) = target
                        && ready
                        && bullets.len() < tuning.max_bullets
                    {
                        let aim = target.lead(tuning.alien_lead_factor);
                        alien.phase = AlienPhase::Aiming {
                            deadline_ms: now_ms + tuning.alien_aim_dwell_ms,
                            target: aim,
                        };
                        events.push(GameEvent::AlienAiming { index, target: aim });
                    }
                }
                AlienPhase::Aiming { deadline_ms, target: mut aim } => {
                    // Lanes follow the gap; stay inside while standing still
                    alien.pos.x = clamp(alien.pos.x, lane.min, lane.max);
                    if let Some(target) = target {
                        aim = target.lead(tuning.alien_lead_factor);
                    }

                    if now_ms >= deadline_ms {
                        let muzzle = alien.muzzle(tuning);
                        let dir = shot_direction(muzzle, aim, tuning.alien_min_vertical_bias);
                        let speed = tuning.bullet_speed + rng.random::<f32>() * tuning.bullet_speed_jitter;
                        bullets.push(Bullet {
                            pos: muzzle,
                            vel: dir * speed,
                        });
                        alien.last_shot_ms = now_ms;
                        alien.cooldown_ms =
                            rand_range(rng, tuning.alien_min_cooldown_ms, tuning.alien_max_cooldown_ms);
                        alien.phase = AlienPhase::Patrolling;
                        log::debug!("Alien {index} fired at ({:.1}, {:.1})", aim.x, aim.y);
                        events.push(GameEvent::AlienFired { index, origin: muzzle });
                    } else {
                        alien.phase = AlienPhase::Aiming { deadline_ms, target: aim };
                    }
                }
            }
        }
    }

    /// Move bullets and resolve hits against the shape's candidate footprint.
    ///
    /// Every bullet that touches the footprint counts as one hit and is
    /// removed on that tick. Returns the number of hits.
    pub fn update_bullets(&mut self, delta: f32, shape: &Aabb, tuning: &Tuning) -> u32 {
        if !self.active || self.bullets.is_empty() {
            return 0;
        }
        let hit_box = shape.inflate(tuning.bullet_radius);
        let mut hits = 0;

        self.bullets.retain_mut(|bullet| {
            bullet.pos += bullet.vel * delta;
            if bullet.pos.y < BULLET_TOP_CULL {
                return false;
            }
            if hit_box.contains(bullet.pos) {
                hits += 1;
                return false;
            }
            bullet.pos.y <= GAME_HEIGHT + BULLET_BOTTOM_CULL
        });
        hits
    }
}
