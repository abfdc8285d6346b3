//! Gradient descent on a scalar field.
//!
//! History points are stored as `(x, f(x, y), y)` so they can be drawn
//! directly over a surface whose height runs along the world Y axis.

use nalgebra::{Vector2, Vector3};

use super::field::ScalarField;
use super::SimStatus;
use crate::math::{is_finite, magnitude, sub};

/// A step shorter than this counts as converged.
pub const CONVERGED_BELOW: f32 = 0.001;
/// A step longer than this counts as diverged.
pub const DIVERGED_ABOVE: f32 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Accepted,
    Converged,
    Diverged,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GradientDescent {
    start: Vector2<f32>,
    position: Vector2<f32>,
    history: Vec<Vector3<f32>>,
    iterations: u32,
    learning_rate: f32,
    status: SimStatus,
    last_outcome: Option<StepOutcome>,
}

impl GradientDescent {
    pub fn new(start: Vector2<f32>, learning_rate: f32) -> Self {
        Self {
            start,
            position: start,
            history: Vec::new(),
            iterations: 0,
            learning_rate,
            status: SimStatus::Reset,
            last_outcome: None,
        }
    }

    pub fn start(&self) -> Vector2<f32> {
        self.start
    }

    pub fn position(&self) -> Vector2<f32> {
        self.position
    }

    pub fn history(&self) -> &[Vector3<f32>] {
        &self.history
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    pub fn learning_rate(&self) -> f32 {
        self.learning_rate
    }

    pub fn status(&self) -> SimStatus {
        self.status
    }

    pub fn last_outcome(&self) -> Option<StepOutcome> {
        self.last_outcome
    }

    pub fn is_running(&self) -> bool {
        self.status == SimStatus::Running
    }

    pub fn set_learning_rate(&mut self, learning_rate: f32) {
        if learning_rate.is_finite() {
            self.learning_rate = learning_rate;
        }
    }

    /// Back to the start point with no history.
    pub fn reset(&mut self) {
        self.position = self.start;
        self.history.clear();
        self.iterations = 0;
        self.status = SimStatus::Reset;
        self.last_outcome = None;
    }

    /// Moves the probe by hand: the new spot becomes the start and the trail
    /// is discarded.
    pub fn place(&mut self, position: Vector2<f32>) {
        if !is_finite(&position) {
            log::warn!(target: "vectorlab", "ignoring non-finite probe position {position:?}");
            return;
        }
        self.start = position;
        self.reset();
    }

    pub fn run(&mut self) {
        if matches!(self.last_outcome, Some(StepOutcome::Converged | StepOutcome::Diverged)) {
            self.reset();
        }
        self.status = SimStatus::Running;
    }

    pub fn pause(&mut self) {
        if self.status == SimStatus::Running {
            self.status = SimStatus::Paused;
        }
    }

    /// One descent step, regardless of status.
    pub fn step(&mut self, field: &impl ScalarField) -> StepOutcome {
        let (next, outcome) = step_gradient_descent(self, field, self.learning_rate);
        *self = next;
        outcome
    }

    /// Runs `ticks` steps while running, stopping early on a terminal outcome.
    pub fn tick(&mut self, field: &impl ScalarField, ticks: u32) {
        for _ in 0..ticks {
            if !self.is_running() {
                break;
            }
            self.step(field);
        }
    }
}

/// Pure step: returns the advanced state and what happened.
///
/// Converged and diverged steps are not applied; they stop the run.
pub fn step_gradient_descent(
    state: &GradientDescent,
    field: &impl ScalarField,
    learning_rate: f32,
) -> (GradientDescent, StepOutcome) {
    let mut next = state.clone();
    let p = state.position;
    let candidate = p - field.gradient(p.x, p.y) * learning_rate;
    let displacement = magnitude(&sub(&candidate, &p));

    let outcome = if !is_finite(&candidate) || !displacement.is_finite() || displacement > DIVERGED_ABOVE {
        StepOutcome::Diverged
    } else if displacement < CONVERGED_BELOW {
        StepOutcome::Converged
    } else {
        StepOutcome::Accepted
    };

    match outcome {
        StepOutcome::Accepted => {
            next.position = candidate;
            next.iterations += 1;
            next.history
                .push(Vector3::new(candidate.x, field.value(candidate.x, candidate.y), candidate.y));
        }
        StepOutcome::Converged | StepOutcome::Diverged => {
            log::debug!(
                target: "vectorlab",
                "gradient descent on {} stopped after {} steps: {outcome:?}",
                field.name(),
                state.iterations
            );
            next.status = SimStatus::Paused;
        }
    }
    next.last_outcome = Some(outcome);
    (next, outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::Field;
    use approx::assert_abs_diff_eq;

    #[test]
    fn reset_restores_start_regardless_of_progress() {
        let mut gd = GradientDescent::new(Vector2::new(3.0, 3.0), 0.1);
        gd.run();
        gd.tick(&Field::Bowl, 5);
        assert_eq!(gd.iterations(), 5);
        gd.reset();
        assert_eq!(gd.position(), Vector2::new(3.0, 3.0));
        assert!(gd.history().is_empty());
        assert_eq!(gd.iterations(), 0);
        assert_eq!(gd.status(), SimStatus::Reset);
    }

    #[test]
    fn step_moves_against_gradient() {
        let mut gd = GradientDescent::new(Vector2::new(2.0, -4.0), 0.1);
        assert_eq!(gd.step(&Field::Bowl), StepOutcome::Accepted);
        assert_abs_diff_eq!(gd.position(), Vector2::new(1.9, -3.8), epsilon = 1e-6);
        let last = gd.history()[0];
        assert_abs_diff_eq!(last.y, Field::Bowl.value(1.9, -3.8), epsilon = 1e-6);
    }

    #[test]
    fn large_learning_rate_diverges() {
        let mut gd = GradientDescent::new(Vector2::new(3.0, 3.0), 50.0);
        gd.run();
        gd.tick(&Field::Bowl, 10);
        assert_eq!(gd.last_outcome(), Some(StepOutcome::Diverged));
        assert_eq!(gd.status(), SimStatus::Paused);
        assert_eq!(gd.position(), Vector2::new(3.0, 3.0));
        assert!(gd.history().is_empty());
    }

    #[test]
    fn placing_probe_clears_trail() {
        let mut gd = GradientDescent::new(Vector2::new(3.0, 3.0), 0.1);
        gd.run();
        gd.tick(&Field::Saddle, 3);
        gd.place(Vector2::new(-1.0, 0.5));
        assert_eq!(gd.start(), Vector2::new(-1.0, 0.5));
        assert_eq!(gd.position(), Vector2::new(-1.0, 0.5));
        assert!(gd.history().is_empty());
        assert!(!gd.is_running());

        gd.place(Vector2::new(f32::NAN, 0.0));
        assert_eq!(gd.start(), Vector2::new(-1.0, 0.5));
    }

    #[test]
    fn pure_step_leaves_input_untouched() {
        let gd = GradientDescent::new(Vector2::new(1.0, 1.0), 0.1);
        let (next, outcome) = step_gradient_descent(&gd, &Field::Bowl, 0.1);
        assert_eq!(outcome, StepOutcome::Accepted);
        assert_eq!(gd.iterations(), 0);
        assert_eq!(next.iterations(), 1);
    }
}
