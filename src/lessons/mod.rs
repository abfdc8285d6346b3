//! Interactive lessons. Each one owns its quantities, exposes draggable
//! handles and queues its drawing; the shell in `app` does the rest.

use eframe::egui;
use nalgebra::{SVector, Vector3};

use crate::camera::{CameraState, ViewMode};
use crate::config::LabConfig;
use crate::interaction::HandleId;
use crate::math::is_finite;
use crate::render::{queue_axes, queue_grid, PainterQueue};
use crate::scene::Scene;

mod composition;
mod cross;
mod eigen;
mod gradient;
mod linear_map;
mod riemann;
mod transform3d;
mod vectors;

pub use composition::CompositionLesson;
pub use cross::CrossProductLesson;
pub use eigen::EigenLesson;
pub use gradient::GradientLesson;
pub use linear_map::LinearMapLesson;
pub use riemann::RiemannLesson;
pub use transform3d::TransformLesson;
pub use vectors::VectorAdditionLesson;

pub const YELLOW: egui::Color32 = egui::Color32::YELLOW;
pub const PURPLE: egui::Color32 = egui::Color32::from_rgb(160, 32, 240);
pub const ORANGE: egui::Color32 = egui::Color32::from_rgb(255, 160, 60);

pub trait Lesson {
    fn title(&self) -> &'static str;

    /// Stable identifier used by `--lesson`.
    fn slug(&self) -> &'static str;

    fn view_mode(&self) -> ViewMode;

    fn is_3d(&self) -> bool {
        self.view_mode().is_3d()
    }

    fn controls(&mut self, ui: &mut egui::Ui);

    /// Draggable points in world space, highest priority first.
    fn handles(&self) -> Vec<(HandleId, Vector3<f32>)> {
        Vec::new()
    }

    fn drag_started(&mut self, _id: HandleId) {}

    fn drag_handle(&mut self, _id: HandleId, _delta: Vector3<f32>, _camera: &CameraState) {}

    fn handle_keys(&mut self, _input: &egui::InputState) {}

    /// Advances any running simulation by `dt` seconds.
    fn tick(&mut self, _dt: f32) {}

    fn draw<'a>(&self, scene: &Scene, queue: &mut PainterQueue<'a>);
}

/// Fresh instance of the lesson named by `slug`.
pub fn build(slug: &str, config: &LabConfig) -> Option<Box<dyn Lesson>> {
    let lesson: Box<dyn Lesson> = match slug {
        "vectors" => Box::new(VectorAdditionLesson::new()),
        "cross" => Box::new(CrossProductLesson::new()),
        "linear-map" => Box::new(LinearMapLesson::new()),
        "composition" => Box::new(CompositionLesson::new(config)),
        "eigen" => Box::new(EigenLesson::new(config)),
        "gradient" => Box::new(GradientLesson::new(config)),
        "riemann" => Box::new(RiemannLesson::new(config)),
        "transform" => Box::new(TransformLesson::new()),
        _ => return None,
    };
    Some(lesson)
}

pub fn all(config: &LabConfig) -> Vec<Box<dyn Lesson>> {
    SLUGS.iter().filter_map(|slug| build(slug, config)).collect()
}

pub const SLUGS: [&str; 8] = [
    "vectors",
    "cross",
    "linear-map",
    "composition",
    "eigen",
    "gradient",
    "riemann",
    "transform",
];

pub fn find(lessons: &[Box<dyn Lesson>], slug: &str) -> Option<usize> {
    lessons.iter().position(|l| l.slug() == slug)
}

/// Moves `value` by the first `D` components of `delta`, keeping the last
/// good value when the result would not be finite.
pub(crate) fn nudge<const D: usize>(value: &mut SVector<f32, D>, delta: &Vector3<f32>) -> bool {
    let mut next = *value;
    for i in 0..D.min(3) {
        next[i] += delta[i];
    }
    if !is_finite(&next) {
        log::warn!(target: "vectorlab", "ignoring drag to non-finite position {next:?}");
        return false;
    }
    *value = next;
    true
}

/// Faint reference grid plus axes.
pub(crate) fn queue_backdrop<'a>(scene: &Scene, queue: &mut PainterQueue<'a>, size: i32) {
    let project = scene.projector();
    let spatial = scene.camera().mode.is_3d();
    let grid = egui::Color32::from_rgba_unmultiplied(80, 140, 220, 30);
    queue_grid(queue, &project, &nalgebra::Matrix3::identity(), grid, size, spatial);
    queue_axes(queue, &project, size as f32, spatial);
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector2;

    #[test]
    fn slugs_match_registry_order() {
        let lessons = all(&LabConfig::default());
        let slugs: Vec<&str> = lessons.iter().map(|l| l.slug()).collect();
        assert_eq!(slugs, SLUGS);
        assert_eq!(find(&lessons, "eigen"), Some(4));
        assert_eq!(find(&lessons, "nope"), None);
        assert!(build("nope", &LabConfig::default()).is_none());
    }

    #[test]
    fn nudge_rejects_non_finite() {
        let mut v = Vector2::new(1.0, 2.0);
        assert!(nudge(&mut v, &Vector3::new(0.5, -1.0, 9.0)));
        assert_eq!(v, Vector2::new(1.5, 1.0));
        assert!(!nudge(&mut v, &Vector3::new(f32::INFINITY, 0.0, 0.0)));
        assert_eq!(v, Vector2::new(1.5, 1.0));
    }
}
