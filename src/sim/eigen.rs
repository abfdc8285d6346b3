//! Tolerance-based test for whether a probe lies along an eigen-direction.

use nalgebra::Vector2;

use crate::math::{cross2, magnitude, EPSILON};

pub const DEFAULT_ALIGNMENT_EPSILON: f32 = 0.1;

/// `|p.x * l.y - p.y * l.x| < eps`. A zero probe has no direction and is
/// never aligned.
pub fn is_colinear(probe: &Vector2<f32>, line: &Vector2<f32>, eps: f32) -> bool {
    if magnitude(probe) <= EPSILON || magnitude(line) <= EPSILON {
        return false;
    }
    cross2(probe, line).abs() < eps
}

/// Index of the first candidate line the probe lies along.
pub fn aligned_line(probe: &Vector2<f32>, lines: &[Vector2<f32>], eps: f32) -> Option<usize> {
    lines.iter().position(|line| is_colinear(probe, line, eps))
}

pub fn test_alignment(probe: &Vector2<f32>, lines: &[Vector2<f32>], eps: f32) -> bool {
    aligned_line(probe, lines, eps).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{matrix2, real_eigenpairs_2x2};

    #[test]
    fn probe_near_eigen_line_is_aligned() {
        let m = matrix2(2.0, 0.0, 0.0, 0.5);
        let lines: Vec<Vector2<f32>> = real_eigenpairs_2x2(&m, 1e-5).into_iter().map(|(v, _)| v).collect();
        assert!(test_alignment(&Vector2::new(1.0, 0.05), &lines, DEFAULT_ALIGNMENT_EPSILON));
        assert!(test_alignment(&Vector2::new(-0.02, -1.0), &lines, DEFAULT_ALIGNMENT_EPSILON));
        assert!(!test_alignment(&Vector2::new(1.0, 1.0), &lines, DEFAULT_ALIGNMENT_EPSILON));
    }

    #[test]
    fn zero_probe_is_never_aligned() {
        assert!(!test_alignment(&Vector2::zeros(), &[Vector2::x()], DEFAULT_ALIGNMENT_EPSILON));
    }

    #[test]
    fn first_matching_line_is_reported() {
        let lines = [Vector2::new(0.0, 1.0), Vector2::new(1.0, 0.0), Vector2::new(-1.0, 0.0)];
        assert_eq!(aligned_line(&Vector2::new(2.0, 0.01), &lines, 0.1), Some(1));
        assert_eq!(aligned_line(&Vector2::new(1.0, 1.0), &lines, 0.1), None);
    }
}
