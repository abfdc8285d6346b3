//! Scalar fields f(x, y) with analytic gradients.

use nalgebra::Vector2;

pub trait ScalarField {
    fn name(&self) -> &'static str;
    fn value(&self, x: f32, y: f32) -> f32;
    fn gradient(&self, x: f32, y: f32) -> Vector2<f32>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    /// (x^2 + y^2) / 4
    Bowl,
    /// (x^2 + 4y^2) / 4
    ElongatedBowl,
    /// (x^2 - y^2) / 4
    Saddle,
    /// cos(x) cos(y) + 1, never negative
    Ripple,
    /// 3 exp(-(x^2 + y^2) / 4)
    GaussianHill,
}

impl Field {
    pub const ALL: [Field; 5] = [
        Field::Bowl,
        Field::ElongatedBowl,
        Field::Saddle,
        Field::Ripple,
        Field::GaussianHill,
    ];

    pub fn formula(self) -> &'static str {
        match self {
            Field::Bowl => "(x² + y²) / 4",
            Field::ElongatedBowl => "(x² + 4y²) / 4",
            Field::Saddle => "(x² − y²) / 4",
            Field::Ripple => "cos x · cos y + 1",
            Field::GaussianHill => "3·exp(−(x² + y²) / 4)",
        }
    }
}

impl ScalarField for Field {
    fn name(&self) -> &'static str {
        match self {
            Field::Bowl => "Bowl",
            Field::ElongatedBowl => "Elongated bowl",
            Field::Saddle => "Saddle",
            Field::Ripple => "Ripple",
            Field::GaussianHill => "Gaussian hill",
        }
    }

    fn value(&self, x: f32, y: f32) -> f32 {
        match self {
            Field::Bowl => (x * x + y * y) / 4.0,
            Field::ElongatedBowl => (x * x + 4.0 * y * y) / 4.0,
            Field::Saddle => (x * x - y * y) / 4.0,
            Field::Ripple => x.cos() * y.cos() + 1.0,
            Field::GaussianHill => 3.0 * (-(x * x + y * y) / 4.0).exp(),
        }
    }

    fn gradient(&self, x: f32, y: f32) -> Vector2<f32> {
        match self {
            Field::Bowl => Vector2::new(x / 2.0, y / 2.0),
            Field::ElongatedBowl => Vector2::new(x / 2.0, 2.0 * y),
            Field::Saddle => Vector2::new(x / 2.0, -y / 2.0),
            Field::Ripple => Vector2::new(-x.sin() * y.cos(), -x.cos() * y.sin()),
            Field::GaussianHill => {
                let f = self.value(x, y);
                Vector2::new(-x / 2.0 * f, -y / 2.0 * f)
            }
        }
    }
}
