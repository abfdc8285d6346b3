//! Numerical procedures advanced by the frame loop.

use std::time::Duration;

pub mod compose;
pub mod eigen;
pub mod field;
pub mod gradient;
pub mod riemann;

pub use compose::{animate_composition, compose, CompositionAnimator};
pub use eigen::{aligned_line, test_alignment, DEFAULT_ALIGNMENT_EPSILON};
pub use field::{Field, ScalarField};
pub use gradient::{step_gradient_descent, GradientDescent, StepOutcome};
pub use riemann::{estimate_volume, RiemannCell, RiemannEstimate, RiemannEstimator};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimStatus {
    Reset,
    Running,
    Paused,
}

impl SimStatus {
    pub fn label(self) -> &'static str {
        match self {
            SimStatus::Reset => "ready",
            SimStatus::Running => "running",
            SimStatus::Paused => "paused",
        }
    }
}

/// Converts frame time into fixed-length ticks so a stepper runs at the same
/// pace whatever the display refresh rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedInterval {
    interval: f32,
    accumulated: f32,
    max_ticks_per_frame: u32,
}

impl FixedInterval {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.as_secs_f32().max(1e-3),
            accumulated: 0.0,
            max_ticks_per_frame: 8,
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs_f32(self.interval)
    }

    /// Number of ticks that fell due during `dt` seconds. Long stalls are
    /// capped rather than replayed in one burst.
    pub fn advance(&mut self, dt: f32) -> u32 {
        if !dt.is_finite() || dt <= 0.0 {
            return 0;
        }
        self.accumulated += dt;
        let due = (self.accumulated / self.interval).floor();
        self.accumulated -= due * self.interval;
        if due > self.max_ticks_per_frame as f32 {
            self.accumulated = 0.0;
            return self.max_ticks_per_frame;
        }
        due as u32
    }

    pub fn reset(&mut self) {
        self.accumulated = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticks_accumulate_across_frames() {
        let mut timer = FixedInterval::new(Duration::from_millis(100));
        assert_eq!(timer.advance(0.06), 0);
        assert_eq!(timer.advance(0.06), 1);
        assert_eq!(timer.advance(0.25), 2);
    }

    #[test]
    fn stalls_are_capped() {
        let mut timer = FixedInterval::new(Duration::from_millis(10));
        assert_eq!(timer.advance(5.0), 8);
        assert_eq!(timer.advance(0.0), 0);
        assert_eq!(timer.advance(f32::NAN), 0);
    }
}
