//! Vector and matrix kernel shared by every lesson.
//!
//! Everything in here is pure and total over finite inputs: degenerate cases
//! (zero length, zero determinant) fall back to a safe value instead of
//! producing `NaN`.

use std::fmt::Debug;
use std::ops::Mul;

use nalgebra::{Matrix2, Matrix3, SVector, Vector2, Vector3};

/// Below this magnitude a vector is treated as zero.
pub const EPSILON: f32 = 1e-6;

pub fn add<const D: usize>(a: &SVector<f32, D>, b: &SVector<f32, D>) -> SVector<f32, D> {
    a + b
}

pub fn sub<const D: usize>(a: &SVector<f32, D>, b: &SVector<f32, D>) -> SVector<f32, D> {
    a - b
}

pub fn scale<const D: usize>(v: &SVector<f32, D>, s: f32) -> SVector<f32, D> {
    v * s
}

pub fn dot<const D: usize>(a: &SVector<f32, D>, b: &SVector<f32, D>) -> f32 {
    a.dot(b)
}

pub fn magnitude<const D: usize>(v: &SVector<f32, D>) -> f32 {
    dot(v, v).sqrt()
}

/// Unit vector along `v`, or the zero vector when `v` has no direction.
pub fn normalize<const D: usize>(v: &SVector<f32, D>) -> SVector<f32, D> {
    let len = magnitude(v);
    if len <= EPSILON || !len.is_finite() {
        SVector::zeros()
    } else {
        v / len
    }
}

/// Right-handed cross product.
pub fn cross(a: &Vector3<f32>, b: &Vector3<f32>) -> Vector3<f32> {
    Vector3::new(
        a.y * b.z - a.z * b.y,
        a.z * b.x - a.x * b.z,
        a.x * b.y - a.y * b.x,
    )
}

/// Z component of the cross product of two planar vectors (signed area).
pub fn cross2(a: &Vector2<f32>, b: &Vector2<f32>) -> f32 {
    a.x * b.y - a.y * b.x
}

pub fn is_finite<const D: usize>(v: &SVector<f32, D>) -> bool {
    v.iter().all(|c| c.is_finite())
}

pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

pub fn lerp_vec<const D: usize>(a: &SVector<f32, D>, b: &SVector<f32, D>, t: f32) -> SVector<f32, D> {
    a + (b - a) * t
}

pub fn lerp_mat<M: LinearMap>(a: &M, b: &M, t: f32) -> M {
    a.lerp(b, t)
}

/// Cubic ease `t^2 (3 - 2t)`.
pub fn smoothstep(t: f32) -> f32 {
    t * t * (3.0 - 2.0 * t)
}

/// Square matrices the lessons animate and compose.
pub trait LinearMap: Copy + Debug + PartialEq + Mul<Output = Self> {
    type Vector: Copy + Debug;

    fn identity() -> Self;
    fn apply_to(&self, v: &Self::Vector) -> Self::Vector;
    fn det(&self) -> f32;
    /// Component-wise interpolation; `t` is not clamped.
    fn lerp(&self, other: &Self, t: f32) -> Self;
}

impl LinearMap for Matrix2<f32> {
    type Vector = Vector2<f32>;

    fn identity() -> Self {
        Matrix2::identity()
    }

    fn apply_to(&self, v: &Vector2<f32>) -> Vector2<f32> {
        self * v
    }

    fn det(&self) -> f32 {
        determinant2x2(self)
    }

    fn lerp(&self, other: &Self, t: f32) -> Self {
        self * (1.0 - t) + other * t
    }
}

impl LinearMap for Matrix3<f32> {
    type Vector = Vector3<f32>;

    fn identity() -> Self {
        Matrix3::identity()
    }

    fn apply_to(&self, v: &Vector3<f32>) -> Vector3<f32> {
        self * v
    }

    fn det(&self) -> f32 {
        determinant3x3(self)
    }

    fn lerp(&self, other: &Self, t: f32) -> Self {
        self * (1.0 - t) + other * t
    }
}

pub fn mat_mul_vec<M: LinearMap>(m: &M, v: &M::Vector) -> M::Vector {
    m.apply_to(v)
}

/// `m1 * m2`: apply `m2` first, then `m1`.
pub fn mat_mul_mat<M: LinearMap>(m1: &M, m2: &M) -> M {
    *m1 * *m2
}

pub fn determinant2x2(m: &Matrix2<f32>) -> f32 {
    m[(0, 0)] * m[(1, 1)] - m[(0, 1)] * m[(1, 0)]
}

/// Cofactor expansion along the first row.
pub fn determinant3x3(m: &Matrix3<f32>) -> f32 {
    let minor = |r0: usize, r1: usize, c0: usize, c1: usize| {
        m[(r0, c0)] * m[(r1, c1)] - m[(r0, c1)] * m[(r1, c0)]
    };
    m[(0, 0)] * minor(1, 2, 1, 2) - m[(0, 1)] * minor(1, 2, 0, 2) + m[(0, 2)] * minor(1, 2, 0, 1)
}

/// Signed area of the unit square's image, from the transformed basis vectors.
pub fn transformed_unit_area(m: &Matrix2<f32>) -> f32 {
    let i_hat = m * Vector2::x();
    let j_hat = m * Vector2::y();
    cross2(&i_hat, &j_hat)
}

/// Builds a row-major 2x2 from `a, b / c, d`.
pub fn matrix2(a: f32, b: f32, c: f32, d: f32) -> Matrix2<f32> {
    Matrix2::new(a, b, c, d)
}

pub fn rotation2(angle: f32) -> Matrix2<f32> {
    let (s, c) = angle.sin_cos();
    Matrix2::new(c, -s, s, c)
}

pub fn scale2(sx: f32, sy: f32) -> Matrix2<f32> {
    Matrix2::new(sx, 0.0, 0.0, sy)
}

pub fn shear2(k: f32) -> Matrix2<f32> {
    Matrix2::new(1.0, k, 0.0, 1.0)
}

/// Places a 2x2 in the upper-left of a 3x3 that leaves Z alone.
pub fn embed2(m: &Matrix2<f32>) -> Matrix3<f32> {
    Matrix3::new(
        m[(0, 0)], m[(0, 1)], 0.0,
        m[(1, 0)], m[(1, 1)], 0.0,
        0.0, 0.0, 1.0,
    )
}

pub fn lift2(v: &Vector2<f32>) -> Vector3<f32> {
    Vector3::new(v.x, v.y, 0.0)
}

pub fn sample_unit_sphere(n_theta: usize, n_phi: usize) -> Vec<Vector3<f32>> {
    let n_theta = n_theta.max(1);
    let n_phi = n_phi.max(1);
    let mut pts = Vec::with_capacity((n_theta + 1) * (n_phi + 1));

    for i in 0..=n_theta {
        let theta = std::f32::consts::PI * i as f32 / n_theta as f32;
        for j in 0..=n_phi {
            let phi = 2.0 * std::f32::consts::PI * j as f32 / n_phi as f32;

            pts.push(Vector3::new(
                theta.sin() * phi.cos(),
                theta.sin() * phi.sin(),
                theta.cos(),
            ));
        }
    }
    pts
}

pub fn is_near_identity(m: &Matrix3<f32>, eps: f32) -> bool {
    (m - Matrix3::identity()).norm() < eps
}

/// The pair of columns spanning the largest parallelogram.
pub fn best_parallelogram_basis(m: &Matrix3<f32>) -> (Vector3<f32>, Vector3<f32>) {
    let v = m.column(0).into_owned();
    let u = m.column(1).into_owned();
    let w = m.column(2).into_owned();

    let vu = cross(&v, &u).norm_squared();
    let vw = cross(&v, &w).norm_squared();
    let uw = cross(&u, &w).norm_squared();

    if vu >= vw && vu >= uw {
        (v, u)
    } else if vw >= uw {
        (v, w)
    } else {
        (u, w)
    }
}

pub fn rank_approx(m: &Matrix3<f32>, eps: f32) -> usize {
    if determinant3x3(m).abs() > eps {
        return 3;
    }

    let v = m.column(0).into_owned();
    let u = m.column(1).into_owned();
    let w = m.column(2).into_owned();

    let vu = cross(&v, &u).norm_squared();
    let vw = cross(&v, &w).norm_squared();
    let uw = cross(&u, &w).norm_squared();

    if vu > eps || vw > eps || uw > eps {
        2
    } else if v.norm_squared() > eps || u.norm_squared() > eps || w.norm_squared() > eps {
        1
    } else {
        0
    }
}

/// Real eigenvalues and unit eigen-directions of a 2x2 matrix.
///
/// Complex eigenvalues produce no directions. A scalar matrix returns both
/// axes since every direction is an eigen-direction.
pub fn real_eigenpairs_2x2(m: &Matrix2<f32>, eps: f32) -> Vec<(Vector2<f32>, f32)> {
    let (a, b, c, d) = (m[(0, 0)], m[(0, 1)], m[(1, 0)], m[(1, 1)]);
    let tr = a + d;
    let det = determinant2x2(m);
    let discriminant = tr * tr - 4.0 * det;

    if discriminant < -eps {
        return Vec::new();
    }

    let root = discriminant.max(0.0).sqrt();
    let lambdas = [(tr + root) * 0.5, (tr - root) * 0.5];
    let mut result: Vec<(Vector2<f32>, f32)> = Vec::new();

    for lambda in lambdas {
        let from_first_row = Vector2::new(b, lambda - a);
        let from_second_row = Vector2::new(lambda - d, c);
        let candidate = if from_first_row.norm() >= from_second_row.norm() {
            from_first_row
        } else {
            from_second_row
        };

        if candidate.norm() <= eps {
            // (M - lambda I) vanishes: M is a scalar matrix.
            for axis in [Vector2::x(), Vector2::y()] {
                push_unique_2d(&mut result, axis, lambda, eps);
            }
            continue;
        }

        push_unique_2d(&mut result, normalize(&candidate), lambda, eps);
    }

    result
}

fn push_unique_2d(out: &mut Vec<(Vector2<f32>, f32)>, dir: Vector2<f32>, lambda: f32, eps: f32) {
    let duplicate = out
        .iter()
        .any(|(existing, _)| cross2(existing, &dir).abs() <= eps.max(1e-4));
    if !duplicate {
        out.push((dir, lambda));
    }
}

/// Real eigenvalues of a 3x3 matrix with unit eigen-directions.
///
/// Each direction is taken from the null space of `M - lambda I`, found as
/// the largest cross product between two of its rows.
pub fn real_eigenpairs_3x3(m: &Matrix3<f32>, eps: f32) -> Vec<(Vector3<f32>, f32)> {
    let mut lambdas: Vec<f32> = Vec::new();
    for ev in m.complex_eigenvalues().iter() {
        if ev.im.abs() > eps.max(1e-4) || !ev.re.is_finite() {
            continue;
        }
        if lambdas.iter().all(|l| (l - ev.re).abs() > eps.max(1e-4)) {
            lambdas.push(ev.re);
        }
    }

    let mut result: Vec<(Vector3<f32>, f32)> = Vec::new();
    for lambda in lambdas {
        let shifted = m - Matrix3::identity() * lambda;
        let rows: [Vector3<f32>; 3] = [
            shifted.row(0).transpose(),
            shifted.row(1).transpose(),
            shifted.row(2).transpose(),
        ];

        let candidates = [
            cross(&rows[0], &rows[1]),
            cross(&rows[0], &rows[2]),
            cross(&rows[1], &rows[2]),
        ];
        let best = candidates
            .iter()
            .copied()
            .fold(Vector3::zeros(), |acc: Vector3<f32>, c| if c.norm() > acc.norm() { c } else { acc });

        let scale = shifted.norm().max(1.0);
        if best.norm() > eps * scale * scale {
            push_unique_3d(&mut result, normalize(&best), lambda, eps);
            continue;
        }

        // Rank <= 1: the eigenspace is a plane (or everything).
        let pivot = rows
            .iter()
            .copied()
            .fold(Vector3::zeros(), |acc: Vector3<f32>, r| if r.norm() > acc.norm() { r } else { acc });
        if pivot.norm() <= eps * scale {
            for axis in [Vector3::x(), Vector3::y(), Vector3::z()] {
                push_unique_3d(&mut result, axis, lambda, eps);
            }
        } else {
            let helper = if pivot.x.abs() < 0.9 * pivot.norm() { Vector3::x() } else { Vector3::y() };
            let first = normalize(&cross(&pivot, &helper));
            let second = normalize(&cross(&pivot, &first));
            push_unique_3d(&mut result, first, lambda, eps);
            push_unique_3d(&mut result, second, lambda, eps);
        }
    }

    result
}

fn push_unique_3d(out: &mut Vec<(Vector3<f32>, f32)>, dir: Vector3<f32>, lambda: f32, eps: f32) {
    let duplicate = out
        .iter()
        .any(|(existing, _)| cross(existing, &dir).norm() <= eps.max(1e-4));
    if !duplicate {
        out.push((dir, lambda));
    }
}
