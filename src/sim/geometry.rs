//! Shape footprints and axis-aligned boxes
//!
//! The collidable footprint of a shape is a pure function of its kind and
//! rotation. Each kind subtracts a fixed inset from its sprite size, so the
//! hitbox is slightly smaller than what is drawn.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Shape variants, in the order they are dealt each session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShapeKind {
    Circle,
    Square,
    Rectangle,
    Triangle,
}

impl ShapeKind {
    pub const ORDER: [ShapeKind; 4] = [
        ShapeKind::Circle,
        ShapeKind::Square,
        ShapeKind::Rectangle,
        ShapeKind::Triangle,
    ];

    /// Shape dealt at position `index` of a session (cycles)
    pub fn nth(index: usize) -> Self {
        Self::ORDER[index % Self::ORDER.len()]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ShapeKind::Circle => "circle",
            ShapeKind::Square => "square",
            ShapeKind::Rectangle => "rectangle",
            ShapeKind::Triangle => "triangle",
        }
    }

    /// Number of palettes the renderer offers for this kind
    pub fn palette_count(&self) -> usize {
        2
    }

    /// Footprint at 0° rotation (sprite size minus hitbox inset)
    fn base_footprint(&self) -> (f32, f32) {
        const MIN_SIDE: f32 = 16.0;
        match self {
            ShapeKind::Rectangle => {
                let (long, short) = (138.0_f32, 46.0_f32);
                let (inset_long, inset_short) = (18.0, 10.0);
                (
                    (long - inset_long * 2.0).max(MIN_SIDE),
                    (short - inset_short * 2.0).max(MIN_SIDE),
                )
            }
            ShapeKind::Square => {
                let side = (92.0_f32 - 12.0 * 2.0).max(MIN_SIDE);
                (side, side)
            }
            ShapeKind::Circle => {
                let side = (88.0_f32 - 14.0 * 2.0).max(MIN_SIDE);
                (side, side)
            }
            ShapeKind::Triangle => {
                let base = 110.0_f32 * 0.82;
                let height = base * 0.9;
                (
                    (base - 16.0 * 2.0).max(MIN_SIDE),
                    (height - 12.0 * 2.0).max(MIN_SIDE),
                )
            }
        }
    }
}

/// Direction of a rotate command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RotateDir {
    Left,
    Right,
}

impl RotateDir {
    #[inline]
    pub fn sign(&self) -> f32 {
        match self {
            RotateDir::Left => -1.0,
            RotateDir::Right => 1.0,
        }
    }
}

/// Rotation quantized to quarter turns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    pub fn degrees(&self) -> i32 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }

    /// Nearest quarter turn for any angle in degrees
    pub fn from_degrees(degrees: i32) -> Self {
        let quarter = ((degrees as f32 / 90.0).round() as i32).rem_euclid(4);
        match quarter {
            0 => Rotation::Deg0,
            1 => Rotation::Deg90,
            2 => Rotation::Deg180,
            _ => Rotation::Deg270,
        }
    }

    pub fn rotated(&self, dir: RotateDir) -> Self {
        let step = match dir {
            RotateDir::Left => -crate::consts::ROTATION_STEP,
            RotateDir::Right => crate::consts::ROTATION_STEP,
        };
        Self::from_degrees(self.degrees() + step)
    }

    /// Odd multiples of 90° swap a shape's width and height
    #[inline]
    pub fn is_quarter(&self) -> bool {
        matches!(self, Rotation::Deg90 | Rotation::Deg270)
    }
}

/// Collidable width/height of a shape
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShapeSize {
    pub width: f32,
    pub height: f32,
}

/// Collidable footprint for a kind at a rotation
pub fn size(kind: ShapeKind, rotation: Rotation) -> ShapeSize {
    let (width, height) = kind.base_footprint();
    match kind {
        ShapeKind::Rectangle | ShapeKind::Triangle if rotation.is_quarter() => ShapeSize {
            width: height,
            height: width,
        },
        ShapeKind::Rectangle | ShapeKind::Triangle | ShapeKind::Circle | ShapeKind::Square => {
            ShapeSize { width, height }
        }
    }
}

/// Axis-aligned box in playfield coordinates (y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec2,
    pub size: Vec2,
}

impl Aabb {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            min: Vec2::new(x, y),
            size: Vec2::new(width, height),
        }
    }

    /// Square box of half-extent `half` centred on `center`
    pub fn centered(center: Vec2, half: f32) -> Self {
        Self {
            min: center - Vec2::splat(half),
            size: Vec2::splat(half * 2.0),
        }
    }

    #[inline]
    pub fn max(&self) -> Vec2 {
        self.min + self.size
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.min + self.size * 0.5
    }

    /// Grow by `margin` on every side
    pub fn inflate(&self, margin: f32) -> Self {
        Self {
            min: self.min - Vec2::splat(margin),
            size: self.size + Vec2::splat(margin * 2.0),
        }
    }

    /// Strict interior overlap (touching edges do not count)
    pub fn overlaps(&self, other: &Aabb) -> bool {
        let (a_max, b_max) = (self.max(), other.max());
        self.min.x < b_max.x && a_max.x > other.min.x && self.min.y < b_max.y && a_max.y > other.min.y
    }

    /// Point test including the boundary
    pub fn contains(&self, point: Vec2) -> bool {
        let max = self.max();
        point.x >= self.min.x && point.x <= max.x && point.y >= self.min.y && point.y <= max.y
    }
}
