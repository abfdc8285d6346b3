use eframe::egui;
use nalgebra::Vector3;

use super::{nudge, queue_backdrop, Lesson, PURPLE, YELLOW};
use crate::camera::{CameraState, ViewMode};
use crate::interaction::HandleId;
use crate::math::{cross, dot, magnitude};
use crate::render::{queue_arrow, queue_handle_arrow, queue_label, queue_polygon, PainterQueue};
use crate::scene::Scene;
use crate::ui::{readout, sign_color, vector_input};

const A: HandleId = HandleId("a");
const B: HandleId = HandleId("b");

pub struct CrossProductLesson {
    a: Vector3<f32>,
    b: Vector3<f32>,
    /// Show `b × a` instead of `a × b`.
    reversed: bool,
    buffer: String,
}

impl CrossProductLesson {
    pub fn new() -> Self {
        Self {
            a: Vector3::new(2.0, 0.0, 0.0),
            b: Vector3::new(0.5, 0.0, 1.5),
            reversed: false,
            buffer: String::new(),
        }
    }

    pub fn product(&self) -> Vector3<f32> {
        if self.reversed {
            cross(&self.b, &self.a)
        } else {
            cross(&self.a, &self.b)
        }
    }

    pub fn area(&self) -> f32 {
        magnitude(&cross(&self.a, &self.b))
    }
}

impl Default for CrossProductLesson {
    fn default() -> Self {
        Self::new()
    }
}

impl Lesson for CrossProductLesson {
    fn title(&self) -> &'static str {
        "Cross product"
    }

    fn slug(&self) -> &'static str {
        "cross"
    }

    fn view_mode(&self) -> ViewMode {
        ViewMode::Spatial
    }

    fn controls(&mut self, ui: &mut egui::Ui) {
        ui.colored_label(YELLOW, "a");
        vector_input(ui, "cross_a", &mut self.buffer, &mut self.a);
        ui.colored_label(PURPLE, "b");
        vector_input(ui, "cross_b", &mut self.buffer, &mut self.b);

        ui.add_space(6.0);
        let order = if self.reversed { "b × a" } else { "a × b" };
        if ui.button(format!("Swap order: {order}")).clicked() {
            self.reversed = !self.reversed;
        }

        ui.separator();
        let c = self.product();
        ui.horizontal(|ui| {
            ui.label(format!("{order} ="));
            for i in 0..3 {
                ui.colored_label(sign_color(c[i]), format!("{:>6.2}", c[i]));
            }
        });
        readout(ui, "area", self.area());
        readout(ui, "a · (a × b)", dot(&self.a, &cross(&self.a, &self.b)));
    }

    fn handles(&self) -> Vec<(HandleId, Vector3<f32>)> {
        vec![(A, self.a), (B, self.b)]
    }

    fn drag_handle(&mut self, id: HandleId, delta: Vector3<f32>, _camera: &CameraState) {
        let target = match id {
            A => &mut self.a,
            B => &mut self.b,
            _ => return,
        };
        nudge(target, &delta);
    }

    fn draw<'a>(&self, scene: &Scene, queue: &mut PainterQueue<'a>) {
        queue_backdrop(scene, queue, 4);
        let project = scene.projector();

        queue_polygon(
            queue,
            &project,
            &[Vector3::zeros(), self.a, self.a + self.b, self.b],
            egui::Color32::from_rgba_unmultiplied(180, 180, 180, 40),
            egui::Stroke::new(1.0, egui::Color32::WHITE),
        );

        let c = self.product();
        if magnitude(&c) > 1e-3 {
            queue_arrow(queue, &project, Vector3::zeros(), c, egui::Color32::WHITE);
            let name = if self.reversed { "b × a" } else { "a × b" };
            queue_label(queue, &project, c * 1.1, name.into(), egui::Color32::WHITE);
        }

        queue_handle_arrow(queue, &project, Vector3::zeros(), self.a, YELLOW);
        queue_handle_arrow(queue, &project, Vector3::zeros(), self.b, PURPLE);
        queue_label(queue, &project, (self.a + self.b) * 0.5, format!("area {:.2}", self.area()), egui::Color32::LIGHT_GRAY);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn swapping_order_flips_direction_not_area() {
        let mut lesson = CrossProductLesson::new();
        lesson.a = Vector3::x();
        lesson.b = Vector3::y();
        assert_eq!(lesson.product(), Vector3::z());
        lesson.reversed = true;
        assert_eq!(lesson.product(), -Vector3::z());
        assert_abs_diff_eq!(lesson.area(), 1.0);
    }

    #[test]
    fn parallel_vectors_have_zero_area() {
        let mut lesson = CrossProductLesson::new();
        lesson.a = Vector3::new(1.0, 2.0, 3.0);
        lesson.b = Vector3::new(2.0, 4.0, 6.0);
        assert_abs_diff_eq!(lesson.area(), 0.0, epsilon = 1e-6);
    }
}
