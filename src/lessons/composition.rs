use eframe::egui;
use nalgebra::{Matrix2, Vector2, Vector3};

use super::{queue_backdrop, Lesson};
use crate::camera::ViewMode;
use crate::config::LabConfig;
use crate::math::{embed2, lift2, rotation2, scale2, shear2, LinearMap};
use crate::render::{queue_arrow, queue_grid, queue_polygon, queue_unit_square, PainterQueue, X_COLOR, Y_COLOR};
use crate::scene::Scene;
use crate::sim::{CompositionAnimator, SimStatus};
use crate::ui::{matrix2_display, readout};

fn presets() -> [(&'static str, Matrix2<f32>); 6] {
    [
        ("Rotate 45°", rotation2(std::f32::consts::FRAC_PI_4)),
        ("Rotate 90°", rotation2(std::f32::consts::FRAC_PI_2)),
        ("Shear", shear2(1.0)),
        ("Stretch x", scale2(2.0, 1.0)),
        ("Squish y", scale2(1.0, 0.5)),
        ("Reflect", scale2(-1.0, 1.0)),
    ]
}

pub struct CompositionLesson {
    animator: CompositionAnimator<Matrix2<f32>>,
    names: Vec<&'static str>,
}

impl CompositionLesson {
    pub fn new(config: &LabConfig) -> Self {
        let mut lesson = Self {
            animator: CompositionAnimator::new(config.simulation.composition_ticks),
            names: Vec::new(),
        };
        let [rotate, _, shear, ..] = presets();
        lesson.push(rotate);
        lesson.push(shear);
        lesson
    }

    fn push(&mut self, (name, m): (&'static str, Matrix2<f32>)) {
        self.names.push(name);
        self.animator.push(m);
    }

    fn reverse(&mut self) {
        self.names.reverse();
        self.animator.reverse_queue();
    }

    /// Product with the queue applied in the opposite order.
    fn reversed_result(&self) -> Matrix2<f32> {
        let mut queue = self.animator.queue().to_vec();
        queue.reverse();
        crate::sim::compose(&queue)
    }
}

impl Lesson for CompositionLesson {
    fn title(&self) -> &'static str {
        "Matrix composition"
    }

    fn slug(&self) -> &'static str {
        "composition"
    }

    fn view_mode(&self) -> ViewMode {
        ViewMode::Planar
    }

    fn controls(&mut self, ui: &mut egui::Ui) {
        ui.label("Add a step:");
        ui.horizontal_wrapped(|ui| {
            for preset in presets() {
                if ui.button(preset.0).clicked() {
                    self.push(preset);
                }
            }
        });

        ui.separator();
        ui.label("Queue (applied top to bottom):");
        let active = self.animator.active_step().filter(|_| self.animator.status() != SimStatus::Reset);
        for (i, name) in self.names.iter().enumerate() {
            let text = format!("{}. {name}", i + 1);
            if Some(i) == active {
                ui.colored_label(egui::Color32::YELLOW, text);
            } else {
                ui.label(text);
            }
        }

        ui.horizontal(|ui| {
            let running = self.animator.status() == SimStatus::Running;
            if ui.button(if running { "⏸ Pause" } else { "▶ Play" }).clicked() {
                if running {
                    self.animator.pause();
                } else {
                    self.animator.play();
                }
            }
            if ui.button("⏭ Finish").clicked() {
                self.animator.finish();
            }
            if ui.button("⟲ Reset").clicked() {
                self.animator.reset();
            }
        });
        ui.horizontal(|ui| {
            if ui.button("⇅ Reverse").clicked() {
                self.reverse();
            }
            if ui.button("Remove last").clicked() {
                self.names.pop();
                self.animator.pop();
            }
            if ui.button("Clear").clicked() {
                self.names.clear();
                self.animator.clear();
            }
        });
        ui.label(format!("Status: {}", self.animator.status().label()));

        ui.separator();
        ui.label("Result");
        let result = self.animator.result();
        matrix2_display(ui, &result);
        readout(ui, "det", result.det());
        if (result - self.reversed_result()).norm() > 1e-4 {
            ui.colored_label(egui::Color32::LIGHT_RED, "Order matters: reversing gives a different map.");
        }
    }

    /// One animation tick per rendered frame.
    fn tick(&mut self, _dt: f32) {
        self.animator.tick();
    }

    fn draw<'a>(&self, scene: &Scene, queue: &mut PainterQueue<'a>) {
        queue_backdrop(scene, queue, 6);
        let project = scene.projector();
        let current = self.animator.current();

        let grid = egui::Color32::from_rgba_unmultiplied(80, 140, 220, 90);
        queue_grid(queue, &project, &embed2(&current), grid, 6, false);

        let result = self.animator.result();
        let outline: Vec<Vector3<f32>> = [Vector2::<f32>::zeros(), Vector2::x(), Vector2::new(1.0, 1.0), Vector2::y()]
            .iter()
            .map(|p| lift2(&result.apply_to(p)))
            .collect();
        queue_polygon(
            queue,
            &project,
            &outline,
            egui::Color32::TRANSPARENT,
            egui::Stroke::new(1.0, egui::Color32::from_gray(160)),
        );

        queue_unit_square(queue, &project, &current);
        queue_arrow(queue, &project, Vector3::zeros(), lift2(&current.apply_to(&Vector2::x())), X_COLOR);
        queue_arrow(queue, &project, Vector3::zeros(), lift2(&current.apply_to(&Vector2::y())), Y_COLOR);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn names_track_queue_edits() {
        let mut lesson = CompositionLesson::new(&LabConfig::default());
        assert_eq!(lesson.names, vec!["Rotate 45°", "Shear"]);
        lesson.reverse();
        assert_eq!(lesson.names, vec!["Shear", "Rotate 45°"]);
        assert_abs_diff_eq!(lesson.animator.queue()[0], shear2(1.0));
    }

    #[test]
    fn ticking_plays_to_the_product() {
        let mut lesson = CompositionLesson::new(&LabConfig::default());
        lesson.animator.play();
        for _ in 0..400 {
            lesson.tick(1.0 / 60.0);
        }
        assert_eq!(lesson.animator.status(), SimStatus::Paused);
        assert_abs_diff_eq!(lesson.animator.current(), lesson.animator.result(), epsilon = 1e-6);
    }

    #[test]
    fn one_step_per_frame_regardless_of_frame_time() {
        let ticks = LabConfig::default().simulation.composition_ticks;
        let mut slow = CompositionLesson::new(&LabConfig::default());
        let mut fast = CompositionLesson::new(&LabConfig::default());
        slow.animator.play();
        fast.animator.play();
        for _ in 0..ticks / 2 {
            slow.tick(0.25);
            fast.tick(0.001);
        }
        assert_abs_diff_eq!(slow.animator.current(), fast.animator.current(), epsilon = 1e-6);
        assert_eq!(slow.animator.active_step(), Some(0));
        assert_eq!(slow.animator.status(), SimStatus::Running);
    }
}
