//! The falling shape

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::geometry::{Aabb, RotateDir, Rotation, ShapeKind, ShapeSize, size};
use crate::clamp;
use crate::consts::GAME_WIDTH;

/// Horizontal inset of the edge spawn slots
const SPAWN_EDGE_INSET: f32 = 6.0;
/// Random spread around the centre spawn slot
const SPAWN_CENTER_JITTER: f32 = 20.0;
/// Gap between the top of the screen and a fresh shape
const SPAWN_HEADROOM: f32 = 20.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    pub kind: ShapeKind,
    pub rotation: Rotation,
    /// Top-left of the collidable footprint
    pub pos: Vec2,
    /// Alien hits taken by this shape
    pub damage_hits: u32,
    /// Palette chosen at spawn (cosmetic)
    pub palette: usize,
    /// Set once the shape has cleared the wall; scoring happens exactly once
    pub passed: bool,
}

impl Shape {
    /// Fresh shape above the playfield.
    ///
    /// `slot` picks the left edge, centre or right edge spawn column and
    /// `jitter` (in [-0.5, 0.5]) nudges the centre column.
    pub fn spawn(kind: ShapeKind, slot: usize, jitter: f32, palette: usize) -> Self {
        let ShapeSize { width, height } = size(kind, Rotation::Deg0);
        let x = match slot % 3 {
            0 => SPAWN_EDGE_INSET,
            1 => (GAME_WIDTH - width) / 2.0 + jitter * SPAWN_CENTER_JITTER,
            _ => GAME_WIDTH - width - SPAWN_EDGE_INSET,
        };
        Self {
            kind,
            rotation: Rotation::Deg0,
            pos: Vec2::new(clamp(x, 0.0, GAME_WIDTH - width), -height - SPAWN_HEADROOM),
            damage_hits: 0,
            palette,
            passed: false,
        }
    }

    #[inline]
    pub fn size(&self) -> ShapeSize {
        size(self.kind, self.rotation)
    }

    pub fn bounds(&self) -> Aabb {
        self.bounds_at(self.pos.y)
    }

    /// Footprint with the top edge moved to `y`
    pub fn bounds_at(&self, y: f32) -> Aabb {
        let s = self.size();
        Aabb::new(self.pos.x, y, s.width, s.height)
    }

    pub fn is_damaged(&self) -> bool {
        self.damage_hits > 0
    }

    /// Quarter-turn and roll sideways.
    ///
    /// The footprint centre is kept, then shifted in the turn direction by
    /// a roll distance proportional to the current width.
    pub fn rotate(&mut self, dir: RotateDir) {
        let current = self.size();
        let next_rotation = self.rotation.rotated(dir);
        let next = size(self.kind, next_rotation);

        let center = self.pos.x + current.width / 2.0;
        let roll = dir.sign() * (current.width * 0.45).clamp(18.0, 44.0);
        let x = center - next.width / 2.0 + roll;

        self.rotation = next_rotation;
        self.pos.x = clamp(x, 0.0, GAME_WIDTH - next.width);
    }
}
