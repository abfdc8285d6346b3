use eframe::egui;
use nalgebra::{Matrix2, Vector2, Vector3};

use super::{nudge, queue_backdrop, Lesson, ORANGE, YELLOW};
use crate::camera::{CameraState, ViewMode};
use crate::config::LabConfig;
use crate::interaction::HandleId;
use crate::math::{embed2, lift2, matrix2, real_eigenpairs_2x2, rotation2, LinearMap};
use crate::render::{eigen_color, queue_arrow, queue_grid, queue_handle_arrow, queue_label, queue_segment, PainterQueue};
use crate::scene::Scene;
use crate::sim::aligned_line;
use crate::ui::{matrix2_input, readout};

const PROBE: HandleId = HandleId("probe");

/// Tolerance on the discriminant when deciding whether eigenvalues are real.
const REAL_EIGEN_EPS: f32 = 1e-5;

pub struct EigenLesson {
    m: Matrix2<f32>,
    probe: Vector2<f32>,
    epsilon: f32,
    buffer: String,
}

impl EigenLesson {
    pub fn new(config: &LabConfig) -> Self {
        Self {
            m: matrix2(2.0, 1.0, 1.0, 2.0),
            probe: Vector2::new(1.0, 0.3),
            epsilon: config.simulation.eigen_epsilon,
            buffer: String::new(),
        }
    }

    fn eigenpairs(&self) -> Vec<(Vector2<f32>, f32)> {
        real_eigenpairs_2x2(&self.m, REAL_EIGEN_EPS)
    }

    /// Eigenvalue of the line the probe currently lies along.
    pub fn aligned_eigenvalue(&self) -> Option<f32> {
        let pairs = self.eigenpairs();
        let lines: Vec<Vector2<f32>> = pairs.iter().map(|(v, _)| *v).collect();
        aligned_line(&self.probe, &lines, self.epsilon).map(|i| pairs[i].1)
    }
}

impl Lesson for EigenLesson {
    fn title(&self) -> &'static str {
        "Eigenvectors (2x2)"
    }

    fn slug(&self) -> &'static str {
        "eigen"
    }

    fn view_mode(&self) -> ViewMode {
        ViewMode::Planar
    }

    fn controls(&mut self, ui: &mut egui::Ui) {
        ui.label("Matrix");
        matrix2_input(ui, "eigen_matrix", &mut self.buffer, &mut self.m);
        ui.horizontal_wrapped(|ui| {
            if ui.button("Symmetric").clicked() {
                self.m = matrix2(2.0, 1.0, 1.0, 2.0);
            }
            if ui.button("Shear").clicked() {
                self.m = matrix2(1.0, 1.0, 0.0, 1.0);
            }
            if ui.button("Diagonal").clicked() {
                self.m = matrix2(3.0, 0.0, 0.0, 0.5);
            }
            if ui.button("Rotation").clicked() {
                self.m = rotation2(0.6);
            }
        });
        ui.add(egui::Slider::new(&mut self.epsilon, 0.01..=0.5).text("Alignment tolerance"));

        ui.separator();
        let pairs = self.eigenpairs();
        if pairs.is_empty() {
            ui.colored_label(egui::Color32::GRAY, "No real eigenvectors (complex eigenvalues)");
        }
        for (v, lambda) in &pairs {
            ui.colored_label(eigen_color(*lambda), format!("λ = {lambda:.3} along ({:.2}, {:.2})", v.x, v.y));
        }
        readout(ui, "det", self.m.det());

        ui.separator();
        match self.aligned_eigenvalue() {
            Some(lambda) => {
                ui.colored_label(egui::Color32::LIGHT_GREEN, format!("Aligned: Mv = {lambda:.2} v"));
            }
            None => {
                ui.label("Drag v until Mv points the same way.");
            }
        }
    }

    fn handles(&self) -> Vec<(HandleId, Vector3<f32>)> {
        vec![(PROBE, lift2(&self.probe))]
    }

    fn drag_handle(&mut self, id: HandleId, delta: Vector3<f32>, _camera: &CameraState) {
        if id == PROBE {
            nudge(&mut self.probe, &delta);
        }
    }

    fn draw<'a>(&self, scene: &Scene, queue: &mut PainterQueue<'a>) {
        queue_backdrop(scene, queue, 6);
        let project = scene.projector();

        let grid = egui::Color32::from_rgba_unmultiplied(80, 140, 220, 60);
        queue_grid(queue, &project, &embed2(&self.m), grid, 6, false);

        for (v, lambda) in self.eigenpairs() {
            let end = lift2(&v) * 8.0;
            queue_segment(queue, &project, -end, end, egui::Stroke::new(2.0, eigen_color(lambda)));
        }

        let image = lift2(&self.m.apply_to(&self.probe));
        queue_arrow(queue, &project, Vector3::zeros(), image, ORANGE);

        let aligned = self.aligned_eigenvalue();
        let probe_color = if aligned.is_some() { egui::Color32::LIGHT_GREEN } else { YELLOW };
        queue_handle_arrow(queue, &project, Vector3::zeros(), lift2(&self.probe), probe_color);
        if let Some(lambda) = aligned {
            queue_label(queue, &project, image * 1.1, format!("λ = {lambda:.2}"), egui::Color32::LIGHT_GREEN);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_on_diagonal_is_aligned_with_largest_eigenvalue() {
        let mut lesson = EigenLesson::new(&LabConfig::default());
        lesson.probe = Vector2::new(1.0, 1.02);
        let lambda = lesson.aligned_eigenvalue().expect("aligned");
        assert!((lambda - 3.0).abs() < 1e-4);

        lesson.probe = Vector2::new(1.0, 0.0);
        assert!(lesson.aligned_eigenvalue().is_none());
    }

    #[test]
    fn rotation_never_aligns() {
        let mut lesson = EigenLesson::new(&LabConfig::default());
        lesson.m = rotation2(0.6);
        for probe in [Vector2::x(), Vector2::y(), Vector2::new(1.0, 1.0)] {
            lesson.probe = probe;
            assert!(lesson.aligned_eigenvalue().is_none());
        }
    }
}
