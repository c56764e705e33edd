//! Line-clear score table and speed progression.

/// Score awarded for clearing `lines` rows with one piece.
pub fn score_for_clear(lines: u32) -> u32 {
    match lines {
        0 => 0,
        1 => 10,
        2 => 30,
        3 => 60,
        4 => 100,
        // A single piece touches at most 4 rows.
        n => n * 10,
    }
}

/// Highest starting multiplier; beyond it pieces fall faster than one tick.
pub const MAX_BASE_SPEED: f64 = 20.0;

/// Score needed per speed step.
const POINTS_PER_STEP: u32 = 30;
/// Multiplier added per step.
const SPEED_STEP: f64 = 0.25;

/// Speed multiplier that only ratchets upward, floored at the configured base speed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedController {
    base: f64,
    multiplier: f64,
}

impl SpeedController {
    /// `base` is the starting multiplier; anything above 1.0 is the high-speed variant.
    pub fn new(base: f64) -> Self {
        let base = if base.is_finite() && base > 0.0 {
            base.min(MAX_BASE_SPEED)
        } else {
            1.0
        };
        Self {
            base,
            multiplier: base,
        }
    }

    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    /// Recompute from the current score. Returns true when the multiplier changed.
    pub fn adjust(&mut self, score: u32) -> bool {
        let target = 1.0 + f64::from(score / POINTS_PER_STEP) * SPEED_STEP;
        let next = target.max(self.base).max(self.multiplier);
        if next != self.multiplier {
            self.multiplier = next;
            true
        } else {
            false
        }
    }
}

impl Default for SpeedController {
    fn default() -> Self {
        Self::new(1.0)
    }
}
