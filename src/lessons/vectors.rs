use eframe::egui;
use nalgebra::{Vector2, Vector3};

use super::{nudge, queue_backdrop, Lesson, PURPLE, YELLOW};
use crate::camera::{CameraState, ViewMode};
use crate::interaction::HandleId;
use crate::math::{add, dot, magnitude};
use crate::render::{queue_arrow, queue_handle_arrow, queue_label, queue_segment, PainterQueue};
use crate::scene::Scene;
use crate::ui::{readout, vector_input};

const A: HandleId = HandleId("A");
const B: HandleId = HandleId("B");

pub struct VectorAdditionLesson {
    a: Vector3<f32>,
    b: Vector3<f32>,
    spatial: bool,
    buffer: String,
}

impl VectorAdditionLesson {
    pub fn new() -> Self {
        Self {
            a: Vector3::new(2.0, 1.0, 0.0),
            b: Vector3::new(1.0, 3.0, 0.0),
            spatial: false,
            buffer: String::new(),
        }
    }

    pub fn sum(&self) -> Vector3<f32> {
        add(&self.a, &self.b)
    }

    fn flatten(&mut self) {
        self.a.z = 0.0;
        self.b.z = 0.0;
    }

    fn edit(ui: &mut egui::Ui, id: &str, buffer: &mut String, v: &mut Vector3<f32>, spatial: bool) {
        if spatial {
            vector_input(ui, id, buffer, v);
        } else {
            let mut planar = Vector2::new(v.x, v.y);
            if vector_input(ui, id, buffer, &mut planar) {
                v.x = planar.x;
                v.y = planar.y;
            }
        }
    }
}

impl Default for VectorAdditionLesson {
    fn default() -> Self {
        Self::new()
    }
}

impl Lesson for VectorAdditionLesson {
    fn title(&self) -> &'static str {
        "Vector addition"
    }

    fn slug(&self) -> &'static str {
        "vectors"
    }

    fn view_mode(&self) -> ViewMode {
        if self.spatial {
            ViewMode::Spatial
        } else {
            ViewMode::Planar
        }
    }

    fn controls(&mut self, ui: &mut egui::Ui) {
        if ui.checkbox(&mut self.spatial, "3D").changed() && !self.spatial {
            self.flatten();
        }
        ui.add_space(6.0);

        ui.colored_label(YELLOW, "A");
        Self::edit(ui, "vec_a", &mut self.buffer, &mut self.a, self.spatial);
        ui.colored_label(PURPLE, "B");
        Self::edit(ui, "vec_b", &mut self.buffer, &mut self.b, self.spatial);

        ui.separator();
        let sum = self.sum();
        ui.label(format!("A + B = ({:.2}, {:.2}, {:.2})", sum.x, sum.y, sum.z));
        readout(ui, "|A + B|", magnitude(&sum));
        readout(ui, "A · B", dot(&self.a, &self.b));
        ui.label("Drag the arrow tips to move A and B.");
    }

    fn handles(&self) -> Vec<(HandleId, Vector3<f32>)> {
        vec![(A, self.a), (B, self.b)]
    }

    fn drag_handle(&mut self, id: HandleId, delta: Vector3<f32>, _camera: &CameraState) {
        match id {
            A => {
                nudge(&mut self.a, &delta);
            }
            B => {
                nudge(&mut self.b, &delta);
            }
            _ => {}
        }
        if !self.spatial {
            self.flatten();
        }
    }

    fn draw<'a>(&self, scene: &Scene, queue: &mut PainterQueue<'a>) {
        queue_backdrop(scene, queue, 5);
        let project = scene.projector();
        let sum = self.sum();

        // Tip-to-tail completion of the parallelogram.
        let guide = egui::Stroke::new(1.0, egui::Color32::from_gray(140));
        queue_segment(queue, &project, self.a, sum, guide);
        queue_segment(queue, &project, self.b, sum, guide);

        queue_arrow(queue, &project, Vector3::zeros(), sum, egui::Color32::WHITE);
        queue_handle_arrow(queue, &project, Vector3::zeros(), self.a, YELLOW);
        queue_handle_arrow(queue, &project, Vector3::zeros(), self.b, PURPLE);

        queue_label(queue, &project, self.a * 1.1, "A".into(), YELLOW);
        queue_label(queue, &project, self.b * 1.1, "B".into(), PURPLE);
        queue_label(queue, &project, sum * 1.08, format!("|A+B| = {:.2}", magnitude(&sum)), egui::Color32::WHITE);
    }
}
