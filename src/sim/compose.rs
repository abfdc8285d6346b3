//! Animated composition of a queue of linear maps.
//!
//! The first queued matrix is applied first, so the finished product is
//! `M_k * ... * M_2 * M_1`. Each step eases from the running product `A` to
//! `M_i * A` over a fixed number of ticks.

use super::SimStatus;
use crate::math::{smoothstep, LinearMap};

/// Product of the queue with the first entry applied first.
pub fn compose<M: LinearMap>(queue: &[M]) -> M {
    queue.iter().fold(M::identity(), |acc, m| *m * acc)
}

/// Visible matrix after `tick` ticks of animation.
pub fn animate_composition<M: LinearMap>(queue: &[M], tick: u32, ticks_per_step: u32) -> M {
    let ticks_per_step = ticks_per_step.max(1);
    let step = (tick / ticks_per_step) as usize;
    if step >= queue.len() {
        return compose(queue);
    }

    let accumulated = compose(&queue[..step]);
    let target = queue[step] * accumulated;
    let t = (tick % ticks_per_step) as f32 / ticks_per_step as f32;
    accumulated.lerp(&target, smoothstep(t.clamp(0.0, 1.0)))
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompositionAnimator<M: LinearMap> {
    queue: Vec<M>,
    elapsed: u32,
    ticks_per_step: u32,
    current: M,
    status: SimStatus,
}

impl<M: LinearMap> CompositionAnimator<M> {
    pub fn new(ticks_per_step: u32) -> Self {
        Self {
            queue: Vec::new(),
            elapsed: 0,
            ticks_per_step: ticks_per_step.max(1),
            current: M::identity(),
            status: SimStatus::Reset,
        }
    }

    pub fn queue(&self) -> &[M] {
        &self.queue
    }

    pub fn current(&self) -> M {
        self.current
    }

    pub fn status(&self) -> SimStatus {
        self.status
    }

    pub fn result(&self) -> M {
        compose(&self.queue)
    }

    /// Index of the step being animated, or `None` once every step is folded in.
    pub fn active_step(&self) -> Option<usize> {
        let step = (self.elapsed / self.ticks_per_step) as usize;
        (step < self.queue.len()).then_some(step)
    }

    pub fn is_finished(&self) -> bool {
        self.active_step().is_none()
    }

    pub fn push(&mut self, m: M) {
        self.queue.push(m);
        self.reset();
    }

    pub fn pop(&mut self) -> Option<M> {
        let popped = self.queue.pop();
        self.reset();
        popped
    }

    pub fn clear(&mut self) {
        self.queue.clear();
        self.reset();
    }

    pub fn set_queue(&mut self, queue: Vec<M>) {
        self.queue = queue;
        self.reset();
    }

    pub fn reverse_queue(&mut self) {
        self.queue.reverse();
        self.reset();
    }

    pub fn reset(&mut self) {
        self.elapsed = 0;
        self.current = M::identity();
        self.status = SimStatus::Reset;
    }

    pub fn play(&mut self) {
        if self.is_finished() {
            self.reset();
        }
        self.status = SimStatus::Running;
    }

    pub fn pause(&mut self) {
        if self.status == SimStatus::Running {
            self.status = SimStatus::Paused;
        }
    }

    /// Jumps straight to the composed result.
    pub fn finish(&mut self) {
        self.elapsed = self.queue.len() as u32 * self.ticks_per_step;
        self.current = self.result();
        self.status = SimStatus::Paused;
    }

    /// Advances one tick while running and returns the visible matrix.
    pub fn tick(&mut self) -> M {
        if self.status != SimStatus::Running {
            return self.current;
        }
        if self.is_finished() {
            self.current = self.result();
            self.status = SimStatus::Paused;
            return self.current;
        }

        self.elapsed += 1;
        self.current = animate_composition(&self.queue, self.elapsed, self.ticks_per_step);
        if self.is_finished() {
            log::debug!(target: "vectorlab", "composition of {} steps finished", self.queue.len());
            self.status = SimStatus::Paused;
        }
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{rotation2, scale2, shear2};
    use approx::assert_abs_diff_eq;
    use nalgebra::{Matrix2, Matrix3, Vector2};

    #[test]
    fn first_queued_is_applied_first() {
        let rotate = rotation2(std::f32::consts::FRAC_PI_2);
        let stretch = scale2(2.0, 1.0);
        let product = compose(&[stretch, rotate]);
        assert_abs_diff_eq!(product, rotate * stretch, epsilon = 1e-6);
        assert_abs_diff_eq!(product * Vector2::x(), Vector2::new(0.0, 2.0), epsilon = 1e-6);
    }

    #[test]
    fn reversing_queue_changes_result() {
        let mut animator = CompositionAnimator::new(10);
        animator.set_queue(vec![rotation2(std::f32::consts::FRAC_PI_2), scale2(2.0, 1.0)]);
        let forward = animator.result();
        animator.reverse_queue();
        let backward = animator.result();
        assert!((forward - backward).norm() > 0.5);
    }

    #[test]
    fn animation_reaches_product_after_all_ticks() {
        let queue = vec![shear2(1.0), rotation2(0.5), scale2(1.5, 0.5)];
        let mut animator = CompositionAnimator::new(4);
        animator.set_queue(queue.clone());
        animator.play();

        let mut frames = 0;
        while animator.status() == SimStatus::Running {
            animator.tick();
            frames += 1;
            assert!(frames <= 12, "animation should finish in 12 ticks");
        }
        assert_eq!(frames, 12);
        assert_abs_diff_eq!(animator.current(), compose(&queue), epsilon = 1e-6);
    }

    #[test]
    fn step_boundaries_hit_partial_products() {
        let queue = [shear2(1.0), scale2(2.0, 3.0)];
        assert_eq!(animate_composition(&queue, 0, 5), Matrix2::identity());
        assert_abs_diff_eq!(animate_composition(&queue, 5, 5), shear2(1.0), epsilon = 1e-6);
        let midway = animate_composition(&queue, 7, 5);
        let eased = shear2(1.0).lerp(&(scale2(2.0, 3.0) * shear2(1.0)), smoothstep(0.4));
        assert_abs_diff_eq!(midway, eased, epsilon = 1e-6);
    }

    #[test]
    fn empty_queue_is_identity() {
        let mut animator: CompositionAnimator<Matrix3<f32>> = CompositionAnimator::new(3);
        animator.play();
        assert_eq!(animator.tick(), Matrix3::identity());
        assert_eq!(animator.status(), SimStatus::Paused);
    }

    #[test]
    fn editing_queue_resets_animation() {
        let mut animator = CompositionAnimator::new(2);
        animator.push(scale2(2.0, 2.0));
        animator.play();
        animator.tick();
        animator.push(shear2(0.5));
        assert_eq!(animator.status(), SimStatus::Reset);
        assert_eq!(animator.current(), Matrix2::identity());
    }
}
