//! Wall-crossing classification
//!
//! While the shape's vertical extent overlaps the wall band it must fit
//! horizontally inside the gap on every tick. The first misaligned tick is a
//! crash. The first tick the shape's top edge reaches the wall's bottom edge
//! without a crash is a pass.

use serde::{Deserialize, Serialize};

use super::geometry::Aabb;

/// Horizontal misalignment with the gap
#[inline]
pub fn is_crash(shape_x: f32, shape_width: f32, gap_x: f32, gap_width: f32) -> bool {
    shape_x < gap_x || shape_x + shape_width > gap_x + gap_width
}

/// Room left over when a shape fits through the gap
#[inline]
pub fn leftover(gap_width: f32, shape_width: f32) -> f32 {
    gap_width - shape_width
}

/// Tight fits within tolerance count as perfect
#[inline]
pub fn is_perfect(gap_width: f32, shape_width: f32, tolerance: f32) -> bool {
    leftover(gap_width, shape_width) <= tolerance
}

/// Vertical band occupied by the wall
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WallBand {
    pub top: f32,
    pub bottom: f32,
}

impl WallBand {
    pub fn new(wall_y: f32, wall_height: f32) -> Self {
        Self {
            top: wall_y,
            bottom: wall_y + wall_height,
        }
    }

    /// Shape vertically overlaps `[top, bottom)`
    #[inline]
    pub fn overlaps(&self, shape: &Aabb) -> bool {
        shape.min.y < self.bottom && shape.max().y >= self.top
    }

    /// Shape's top edge is at or below the wall's bottom edge
    #[inline]
    pub fn cleared_by(&self, shape: &Aabb) -> bool {
        shape.min.y >= self.bottom
    }
}

/// Outcome of one tick's wall check
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Crossing {
    /// Above the wall, or already scored and falling away
    Clear,
    /// Inside the band and aligned with the gap
    Threading,
    Crash,
    Pass { leftover: f32, perfect: bool },
}

/// Vertical extent covered while moving from `from` to `to`
fn sweep(from: &Aabb, to: &Aabb) -> Aabb {
    let top = from.min.y.min(to.min.y);
    let bottom = from.max().y.max(to.max().y);
    Aabb::new(to.min.x, top, to.size.x, bottom - top)
}

/// Classify a move from the current footprint to the candidate one.
///
/// Alignment is checked whenever the swept extent touches the band, so a
/// fast fall that jumps the wall in one tick still crashes when misaligned.
/// `already_passed` suppresses both crash and pass once the shape has scored.
pub fn classify(
    from: &Aabb,
    to: &Aabb,
    band: WallBand,
    gap_x: f32,
    gap_width: f32,
    already_passed: bool,
    perfect_tolerance: f32,
) -> Crossing {
    if already_passed {
        return Crossing::Clear;
    }
    if band.overlaps(&sweep(from, to)) && is_crash(to.min.x, to.size.x, gap_x, gap_width) {
        return Crossing::Crash;
    }
    if band.cleared_by(to) {
        return Crossing::Pass {
            leftover: leftover(gap_width, to.size.x),
            perfect: is_perfect(gap_width, to.size.x, perfect_tolerance),
        };
    }
    if band.overlaps(to) {
        Crossing::Threading
    } else {
        Crossing::Clear
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crash_left_overhang() {
        // shape [40, 140) vs gap [60, 120)
        assert!(is_crash(40.0, 100.0, 60.0, 60.0));
    }

    #[test]
    fn test_fit_with_room() {
        assert!(!is_crash(60.0, 60.0, 50.0, 100.0));
        assert_eq!(leftover(100.0, 60.0), 40.0);
        assert!(!is_perfect(100.0, 60.0, 12.0));
        assert!(is_perfect(70.0, 60.0, 12.0));
    }

    #[test]
    fn test_crash_right_overhang() {
        assert!(is_crash(100.0, 30.0, 50.0, 70.0));
        assert!(!is_crash(90.0, 30.0, 50.0, 70.0));
    }

    #[test]
    fn test_classify_sequence() {
        let band = WallBand::new(500.0, 18.0);
        let gap = (100.0, 80.0);

        let above = Aabb::new(110.0, 400.0, 60.0, 60.0);
        assert_eq!(classify(&above, &above, band, gap.0, gap.1, false, 12.0), Crossing::Clear);

        // bottom edge exactly on the wall top counts as overlapping
        let touching = Aabb::new(110.0, 440.0, 60.0, 60.0);
        assert_eq!(classify(&touching, &touching, band, gap.0, gap.1, false, 12.0), Crossing::Threading);

        let misaligned = Aabb::new(60.0, 460.0, 60.0, 60.0);
        assert_eq!(classify(&misaligned, &misaligned, band, gap.0, gap.1, false, 12.0), Crossing::Crash);

        let through = Aabb::new(110.0, 518.0, 60.0, 60.0);
        assert_eq!(
            classify(&through, &through, band, gap.0, gap.1, false, 12.0),
            Crossing::Pass { leftover: 20.0, perfect: false }
        );
        assert_eq!(classify(&through, &through, band, gap.0, gap.1, true, 12.0), Crossing::Clear);
    }

    #[test]
    fn test_classify_after_pass_ignores_wall() {
        let band = WallBand::new(500.0, 18.0);
        let overlapping_but_misaligned = Aabb::new(0.0, 505.0, 60.0, 60.0);
        assert_eq!(
            classify(&overlapping_but_misaligned, &overlapping_but_misaligned, band, 100.0, 80.0, true, 12.0),
            Crossing::Clear
        );
    }

    #[test]
    fn test_fast_fall_across_band_still_checks_alignment() {
        let band = WallBand::new(500.0, 18.0);
        // 26 px tall, jumps from above the wall to below it in one move
        let before = Aabb::new(0.0, 473.0, 102.0, 26.0);
        let after = Aabb::new(0.0, 585.0, 102.0, 26.0);
        assert_eq!(classify(&before, &after, band, 200.0, 74.0, false, 12.0), Crossing::Crash);

        let aligned_before = Aabb::new(210.0, 473.0, 50.0, 26.0);
        let aligned_after = Aabb::new(210.0, 585.0, 50.0, 26.0);
        assert_eq!(
            classify(&aligned_before, &aligned_after, band, 200.0, 74.0, false, 12.0),
            Crossing::Pass { leftover: 24.0, perfect: false }
        );
    }
}
