use eframe::egui;

use super::Lesson;
use crate::camera::ViewMode;
use crate::config::LabConfig;
use crate::render::{queue_axes, queue_column, queue_ground_grid, queue_surface, PainterQueue};
use crate::scene::Scene;
use crate::sim::{Field, RiemannEstimator, ScalarField};

const MAX_RESOLUTION: usize = 30;

pub struct RiemannLesson {
    field: Field,
    resolution: usize,
    range: f32,
    show_surface: bool,
    estimator: RiemannEstimator,
}

impl RiemannLesson {
    pub fn new(config: &LabConfig) -> Self {
        let mut lesson = Self {
            field: Field::GaussianHill,
            resolution: config.simulation.riemann_resolution.clamp(1, MAX_RESOLUTION),
            range: config.simulation.riemann_range,
            show_surface: true,
            estimator: RiemannEstimator::new(),
        };
        lesson.refresh();
        lesson
    }

    fn refresh(&mut self) {
        self.estimator.update(self.field, self.resolution, self.range);
    }

    pub fn volume(&self) -> f32 {
        self.estimator.estimate().volume
    }
}

impl Lesson for RiemannLesson {
    fn title(&self) -> &'static str {
        "Riemann volume"
    }

    fn slug(&self) -> &'static str {
        "riemann"
    }

    fn view_mode(&self) -> ViewMode {
        ViewMode::Spatial
    }

    fn controls(&mut self, ui: &mut egui::Ui) {
        egui::ComboBox::from_label("Field")
            .selected_text(self.field.name())
            .show_ui(ui, |ui| {
                for field in Field::ALL {
                    ui.selectable_value(&mut self.field, field, field.name());
                }
            });
        ui.label(format!("f(x, y) = {}", self.field.formula()));
        ui.add(egui::Slider::new(&mut self.resolution, 1..=MAX_RESOLUTION).text("Cells per side"));
        ui.add(egui::Slider::new(&mut self.range, 0.5..=5.0).text("Half-width"));
        ui.checkbox(&mut self.show_surface, "Show surface");
        self.refresh();

        ui.separator();
        let estimate = self.estimator.estimate();
        ui.label(format!("Volume ≈ {:.4}", estimate.volume));
        ui.label(format!(
            "{} of {} cells above zero",
            estimate.cells.len(),
            self.resolution * self.resolution
        ));
        ui.label("Only the part of the surface above the ground counts.");
    }

    fn tick(&mut self, _dt: f32) {
        self.refresh();
    }

    fn draw<'a>(&self, scene: &Scene, queue: &mut PainterQueue<'a>) {
        let project = scene.projector();
        queue_ground_grid(queue, &project, self.range, 6, egui::Color32::from_rgba_unmultiplied(80, 140, 220, 40));
        queue_axes(queue, &project, self.range + 0.5, true);

        let fill = egui::Color32::from_rgba_unmultiplied(120, 80, 200, 70);
        let edge = egui::Stroke::new(1.0, egui::Color32::from_rgba_unmultiplied(200, 150, 255, 160));
        for cell in &self.estimator.estimate().cells {
            queue_column(queue, &project, cell, fill, edge);
        }

        if self.show_surface {
            queue_surface(
                queue,
                &project,
                &self.field,
                self.range,
                24,
                egui::Color32::from_rgba_unmultiplied(120, 255, 160, 110),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn finer_grid_approaches_gaussian_integral() {
        let mut lesson = RiemannLesson::new(&LabConfig::default());
        lesson.range = 5.0;
        lesson.resolution = MAX_RESOLUTION;
        lesson.tick(0.0);
        // 3 * pi * 4 over the whole plane; the tails past |x| = 5 are tiny.
        assert_abs_diff_eq!(lesson.volume(), 12.0 * std::f32::consts::PI, epsilon = 0.1);
    }

    #[test]
    fn switching_field_recomputes() {
        let mut lesson = RiemannLesson::new(&LabConfig::default());
        let hill = lesson.volume();
        lesson.field = Field::Bowl;
        lesson.tick(0.0);
        assert!(lesson.volume() != hill);
    }
}
