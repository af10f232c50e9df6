//! Perfect Fit - rotate the falling shape, slip it through the drifting gap
//!
//! Core modules:
//! - `sim`: Deterministic simulation (shape, gap, difficulty, aliens, rewards, game state)
//! - `engine`: Frame loop facade that drives the sim from a clock
//! - `platform`: Clock and key-value storage abstraction
//! - `highscores`: Local best score persistence
//! - `scoring`: Client side of the run-verification service
//! - `tuning`: Data-driven game balance

pub mod engine;
pub mod highscores;
pub mod platform;
pub mod scoring;
pub mod sim;
pub mod tuning;

#[cfg(target_arch = "wasm32")]
pub mod wasm;

pub use engine::{Engine, Snapshot};
pub use highscores::HighScore;
pub use tuning::Tuning;

/// Game configuration constants
pub mod consts {
    /// Playfield dimensions (logical pixels)
    pub const GAME_WIDTH: f32 = 360.0;
    pub const GAME_HEIGHT: f32 = 640.0;

    /// Nominal frame length; per-frame deltas are expressed in these units
    pub const FRAME_MS: f32 = 16.67;
    /// Clamp for normalized frame deltas (prevents tunnelling after a stall)
    pub const MIN_FRAME_DELTA: f32 = 0.4;
    pub const MAX_FRAME_DELTA: f32 = 2.0;

    /// Rotation is quantized to this step (degrees)
    pub const ROTATION_STEP: i32 = 90;

    /// Shapes are replaced once this far below the playfield
    pub const RESPAWN_MARGIN: f32 = 60.0;

    /// Local storage key for the best score
    pub const HIGH_SCORE_KEY: &str = "perfect-fit-highscore";
}

/// Clamp that tolerates an inverted range by collapsing to `min`
#[inline]
pub fn clamp(value: f32, min: f32, max: f32) -> f32 {
    value.max(min).min(max.max(min))
}

#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Quadratic ease-out on [0, 1]
#[inline]
pub fn ease_out(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t) * (1.0 - t)
}
