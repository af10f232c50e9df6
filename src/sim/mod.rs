//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Time advances only through `tick` deltas
//! - Seeded RNG only
//! - No rendering, clock or storage dependencies

pub mod alien;
pub mod collision;
pub mod difficulty;
pub mod gap;
pub mod geometry;
pub mod reward;
pub mod shape;
pub mod state;
pub mod tick;

pub use alien::{Alien, AlienPhase, Bullet, Squad};
pub use collision::{Crossing, WallBand, classify};
pub use difficulty::Difficulty;
pub use gap::Gap;
pub use geometry::{Aabb, RotateDir, Rotation, ShapeKind, ShapeSize};
pub use reward::Reward;
pub use shape::Shape;
pub use state::{GameEvent, GamePhase, SimulationState};
pub use tick::{frame_delta, tick};
