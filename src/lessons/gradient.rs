use eframe::egui;
use nalgebra::{Vector2, Vector3};

use super::{Lesson, ORANGE, YELLOW};
use crate::camera::{CameraState, ViewMode};
use crate::config::LabConfig;
use crate::interaction::HandleId;
use crate::render::{
    queue_axes, queue_ground_grid, queue_point, queue_polyline, queue_surface, PainterQueue, HANDLE_DEPTH,
};
use crate::scene::{ground_plane_delta, Scene};
use crate::sim::{Field, FixedInterval, GradientDescent, ScalarField, SimStatus, StepOutcome};

const PROBE: HandleId = HandleId("probe");
const RANGE: f32 = 3.0;

pub struct GradientLesson {
    field: Field,
    descent: GradientDescent,
    timer: FixedInterval,
}

impl GradientLesson {
    pub fn new(config: &LabConfig) -> Self {
        Self {
            field: Field::Bowl,
            descent: GradientDescent::new(Vector2::new(2.5, 2.0), config.simulation.learning_rate),
            timer: FixedInterval::new(config.gradient_interval()),
        }
    }

    fn on_surface(&self, p: Vector2<f32>) -> Vector3<f32> {
        Vector3::new(p.x, self.field.value(p.x, p.y), p.y)
    }

    fn trail(&self) -> Vec<Vector3<f32>> {
        std::iter::once(self.on_surface(self.descent.start()))
            .chain(self.descent.history().iter().copied())
            .collect()
    }
}

impl Lesson for GradientLesson {
    fn title(&self) -> &'static str {
        "Gradient descent"
    }

    fn slug(&self) -> &'static str {
        "gradient"
    }

    fn view_mode(&self) -> ViewMode {
        ViewMode::Spatial
    }

    fn controls(&mut self, ui: &mut egui::Ui) {
        let before = self.field;
        egui::ComboBox::from_label("Field")
            .selected_text(self.field.name())
            .show_ui(ui, |ui| {
                for field in Field::ALL {
                    ui.selectable_value(&mut self.field, field, field.name());
                }
            });
        if self.field != before {
            log::info!(target: "vectorlab", "gradient field changed to {}", self.field.name());
            self.descent.reset();
        }
        ui.label(format!("f(x, y) = {}", self.field.formula()));

        let mut rate = self.descent.learning_rate();
        if ui
            .add(egui::Slider::new(&mut rate, 0.01..=3.0).logarithmic(true).text("Learning rate"))
            .changed()
        {
            self.descent.set_learning_rate(rate);
        }

        ui.horizontal(|ui| {
            if self.descent.is_running() {
                if ui.button("⏸ Pause").clicked() {
                    self.descent.pause();
                }
            } else if ui.button("▶ Start").clicked() {
                self.descent.run();
            }
            if ui.button("Step").clicked() {
                self.descent.step(&self.field);
            }
            if ui.button("⟲ Reset").clicked() {
                self.descent.reset();
                self.timer.reset();
            }
        });

        ui.separator();
        let p = self.descent.position();
        ui.label(format!("position = ({:.3}, {:.3})", p.x, p.y));
        ui.label(format!("f = {:.4}", self.field.value(p.x, p.y)));
        ui.label(format!("iterations = {}", self.descent.iterations()));
        ui.label(format!("status: {}", self.descent.status().label()));
        match self.descent.last_outcome() {
            Some(StepOutcome::Converged) => {
                ui.colored_label(egui::Color32::LIGHT_GREEN, "Converged");
            }
            Some(StepOutcome::Diverged) => {
                ui.colored_label(egui::Color32::LIGHT_RED, "Diverged: try a smaller learning rate");
            }
            _ => {}
        }
        ui.label("Drag the yellow point to choose a new start.");
    }

    fn handles(&self) -> Vec<(HandleId, Vector3<f32>)> {
        vec![(PROBE, self.on_surface(self.descent.position()))]
    }

    fn drag_started(&mut self, id: HandleId) {
        if id == PROBE {
            self.descent.pause();
        }
    }

    fn drag_handle(&mut self, id: HandleId, delta: Vector3<f32>, camera: &CameraState) {
        if id != PROBE {
            return;
        }
        let moved = self.descent.position() + ground_plane_delta(&delta, camera);
        self.descent
            .place(Vector2::new(moved.x.clamp(-RANGE, RANGE), moved.y.clamp(-RANGE, RANGE)));
    }

    fn tick(&mut self, dt: f32) {
        if self.descent.status() != SimStatus::Running {
            self.timer.reset();
            return;
        }
        let ticks = self.timer.advance(dt);
        self.descent.tick(&self.field, ticks);
    }

    fn draw<'a>(&self, scene: &Scene, queue: &mut PainterQueue<'a>) {
        let project = scene.projector();
        queue_ground_grid(queue, &project, RANGE, 6, egui::Color32::from_rgba_unmultiplied(80, 140, 220, 40));
        queue_axes(queue, &project, RANGE + 0.5, true);
        queue_surface(
            queue,
            &project,
            &self.field,
            RANGE,
            24,
            egui::Color32::from_rgba_unmultiplied(120, 180, 255, 90),
        );

        let trail = self.trail();
        queue_polyline(queue, &project, &trail, egui::Stroke::new(2.0, ORANGE));
        for p in &trail {
            queue_point(queue, &project, *p, 2.5, ORANGE, None);
        }
        queue_point(queue, &project, self.on_surface(self.descent.start()), 4.0, egui::Color32::WHITE, None);
        queue_point(
            queue,
            &project,
            self.on_surface(self.descent.position()),
            6.0,
            YELLOW,
            Some(HANDLE_DEPTH),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_only_while_started() {
        let mut lesson = GradientLesson::new(&LabConfig::default());
        lesson.tick(1.0);
        assert_eq!(lesson.descent.iterations(), 0);

        lesson.descent.run();
        lesson.tick(0.35);
        assert_eq!(lesson.descent.iterations(), 3);
    }

    #[test]
    fn dragging_probe_moves_start_and_clears_trail() {
        let mut lesson = GradientLesson::new(&LabConfig::default());
        lesson.descent.run();
        lesson.tick(0.5);
        lesson.drag_started(PROBE);
        assert!(!lesson.descent.is_running());

        let camera = CameraState::new(ViewMode::Spatial, 0.0, 0.3, 60.0);
        lesson.drag_handle(PROBE, Vector3::new(-0.5, 0.0, 0.0), &camera);
        assert!(lesson.descent.history().is_empty());
        let start = lesson.descent.start();
        assert!(start.x < 2.5 && start.x.is_finite());
    }
}
