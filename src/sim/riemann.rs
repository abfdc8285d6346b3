//! Midpoint Riemann sum of a scalar field over a square.
//!
//! Only cells whose midpoint value is positive contribute; negative cells are
//! dropped rather than subtracted.

use nalgebra::Vector2;

use super::field::{Field, ScalarField};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiemannCell {
    pub center: Vector2<f32>,
    /// f at the cell midpoint, always positive.
    pub height: f32,
    /// Side length of the square cell.
    pub size: f32,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RiemannEstimate {
    pub volume: f32,
    pub cells: Vec<RiemannCell>,
}

/// Splits `[-range, range]^2` into `resolution x resolution` cells.
pub fn estimate_volume(field: &impl ScalarField, resolution: usize, range: f32) -> RiemannEstimate {
    if resolution == 0 || !range.is_finite() || range <= 0.0 {
        return RiemannEstimate::default();
    }

    let size = 2.0 * range / resolution as f32;
    let area = size * size;
    let mut estimate = RiemannEstimate {
        volume: 0.0,
        cells: Vec::with_capacity(resolution * resolution),
    };

    for i in 0..resolution {
        let x = -range + (i as f32 + 0.5) * size;
        for j in 0..resolution {
            let y = -range + (j as f32 + 0.5) * size;
            let height = field.value(x, y);
            if !(height.is_finite() && height > 0.0) {
                continue;
            }
            estimate.volume += height * area;
            estimate.cells.push(RiemannCell {
                center: Vector2::new(x, y),
                height,
                size,
            });
        }
    }
    estimate
}

/// Keeps the last estimate and recomputes only when its inputs change.
#[derive(Debug, Clone, Default)]
pub struct RiemannEstimator {
    key: Option<(Field, usize, f32)>,
    estimate: RiemannEstimate,
}

impl RiemannEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, field: Field, resolution: usize, range: f32) -> &RiemannEstimate {
        let key = (field, resolution, range);
        if self.key != Some(key) {
            self.estimate = estimate_volume(&field, resolution, range);
            log::debug!(
                target: "vectorlab",
                "riemann estimate for {} at n={resolution}, r={range}: {:.4} over {} cells",
                field.name(),
                self.estimate.volume,
                self.estimate.cells.len()
            );
            self.key = Some(key);
        }
        &self.estimate
    }

    pub fn estimate(&self) -> &RiemannEstimate {
        &self.estimate
    }

    pub fn invalidate(&mut self) {
        self.key = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    struct Constant(f32);

    impl ScalarField for Constant {
        fn name(&self) -> &'static str {
            "constant"
        }
        fn value(&self, _x: f32, _y: f32) -> f32 {
            self.0
        }
        fn gradient(&self, _x: f32, _y: f32) -> Vector2<f32> {
            Vector2::zeros()
        }
    }

    #[test]
    fn constant_field_is_exact() {
        let estimate = estimate_volume(&Constant(2.0), 7, 1.5);
        assert_abs_diff_eq!(estimate.volume, 2.0 * 9.0, epsilon = 1e-4);
        assert_eq!(estimate.cells.len(), 49);
    }

    #[test]
    fn negative_cells_are_dropped() {
        let estimate = estimate_volume(&Field::Saddle, 10, 2.0);
        assert!(estimate.cells.iter().all(|c| c.height > 0.0));
        assert!(estimate.cells.len() < 100);
        // Integral of the positive lobes is positive although the signed
        // integral of the saddle over the square is zero.
        assert!(estimate.volume > 0.1);
    }

    #[test]
    fn degenerate_inputs_give_empty_estimate() {
        assert_eq!(estimate_volume(&Field::Bowl, 0, 2.0), RiemannEstimate::default());
        assert_eq!(estimate_volume(&Field::Bowl, 4, 0.0), RiemannEstimate::default());
        assert_eq!(estimate_volume(&Field::Bowl, 4, f32::NAN), RiemannEstimate::default());
    }

    #[test]
    fn doubling_resolution_settles() {
        let volumes: Vec<f32> = [8, 16, 32, 64]
            .iter()
            .map(|&n| estimate_volume(&Field::GaussianHill, n, 3.0).volume)
            .collect();
        let diffs: Vec<f32> = volumes.windows(2).map(|w| (w[1] - w[0]).abs()).collect();
        for pair in diffs.windows(2) {
            assert!(pair[1] < pair[0], "differences should shrink: {diffs:?}");
        }
    }

    #[test]
    fn estimator_recomputes_only_on_change() {
        let mut estimator = RiemannEstimator::new();
        let first = estimator.update(Field::Bowl, 8, 2.0).volume;
        assert_eq!(estimator.update(Field::Bowl, 8, 2.0).volume, first);
        let finer = estimator.update(Field::Bowl, 16, 2.0).volume;
        assert!(finer != first);
        let other = estimator.update(Field::GaussianHill, 16, 2.0).volume;
        assert!(other != finer);
    }
}
