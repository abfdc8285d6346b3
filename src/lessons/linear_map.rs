use eframe::egui;
use nalgebra::{Matrix2, Vector2, Vector3};

use super::{nudge, queue_backdrop, Lesson, ORANGE, YELLOW};
use crate::camera::{CameraState, ViewMode};
use crate::interaction::HandleId;
use crate::math::{
    embed2, lift2, magnitude, matrix2, normalize, rotation2, scale2, shear2, transformed_unit_area, LinearMap,
};
use crate::render::{
    queue_arrow, queue_grid, queue_handle_arrow, queue_label, queue_segment, queue_unit_square, PainterQueue,
    X_COLOR, Y_COLOR,
};
use crate::scene::Scene;
use crate::ui::{matrix2_input, readout};

const INPUT: HandleId = HandleId("v");
const I_HAT: HandleId = HandleId("i-hat");
const J_HAT: HandleId = HandleId("j-hat");

/// Below this |det| the image is drawn as collapsed.
const SINGULAR_BELOW: f32 = 1e-3;

const PRESETS: [(&str, [f32; 4]); 5] = [
    ("Identity", [1.0, 0.0, 0.0, 1.0]),
    ("Rotate 90°", [0.0, -1.0, 1.0, 0.0]),
    ("Shear", [1.0, 1.0, 0.0, 1.0]),
    ("Stretch", [2.0, 0.0, 0.0, 0.5]),
    ("Singular", [1.0, 2.0, 0.5, 1.0]),
];

pub struct LinearMapLesson {
    m: Matrix2<f32>,
    input: Vector2<f32>,
    buffer: String,
}

impl LinearMapLesson {
    pub fn new() -> Self {
        Self {
            m: shear2(1.0),
            input: Vector2::new(1.0, 1.0),
            buffer: String::new(),
        }
    }

    pub fn output(&self) -> Vector2<f32> {
        self.m.apply_to(&self.input)
    }

    pub fn is_collapsed(&self) -> bool {
        self.m.det().abs() < SINGULAR_BELOW
    }

    /// Direction the plane collapses onto, if the map has rank one.
    fn collapse_line(&self) -> Option<Vector2<f32>> {
        let cols = [self.m.column(0).into_owned(), self.m.column(1).into_owned()];
        cols.iter()
            .max_by(|a, b| magnitude(*a).total_cmp(&magnitude(*b)))
            .filter(|c| magnitude(*c) > SINGULAR_BELOW)
            .map(normalize)
    }
}

impl Default for LinearMapLesson {
    fn default() -> Self {
        Self::new()
    }
}

impl Lesson for LinearMapLesson {
    fn title(&self) -> &'static str {
        "Linear maps (2x2)"
    }

    fn slug(&self) -> &'static str {
        "linear-map"
    }

    fn view_mode(&self) -> ViewMode {
        ViewMode::Planar
    }

    fn controls(&mut self, ui: &mut egui::Ui) {
        ui.label("Matrix");
        matrix2_input(ui, "linear_map_matrix", &mut self.buffer, &mut self.m);

        ui.horizontal_wrapped(|ui| {
            for (name, [a, b, c, d]) in PRESETS {
                if ui.button(name).clicked() {
                    self.m = matrix2(a, b, c, d);
                }
            }
        });
        if ui.button("Rotate 30°").clicked() {
            self.m = rotation2(std::f32::consts::FRAC_PI_6) * self.m;
        }
        if ui.button("Scale ×1.5").clicked() {
            self.m = scale2(1.5, 1.5) * self.m;
        }

        ui.separator();
        readout(ui, "det", self.m.det());
        readout(ui, "unit square area", transformed_unit_area(&self.m));
        if self.is_collapsed() {
            ui.colored_label(egui::Color32::LIGHT_RED, "Singular: the plane collapses");
        }
        let out = self.output();
        ui.colored_label(YELLOW, format!("v = ({:.2}, {:.2})", self.input.x, self.input.y));
        ui.colored_label(ORANGE, format!("Mv = ({:.2}, {:.2})", out.x, out.y));
        ui.label("Drag v, or the tips of î and ĵ to edit the columns.");
    }

    fn handles(&self) -> Vec<(HandleId, Vector3<f32>)> {
        vec![
            (INPUT, lift2(&self.input)),
            (I_HAT, lift2(&self.m.column(0).into_owned())),
            (J_HAT, lift2(&self.m.column(1).into_owned())),
        ]
    }

    fn drag_handle(&mut self, id: HandleId, delta: Vector3<f32>, _camera: &CameraState) {
        let column = match id {
            INPUT => {
                nudge(&mut self.input, &delta);
                return;
            }
            I_HAT => 0,
            J_HAT => 1,
            _ => return,
        };
        let mut col: Vector2<f32> = self.m.column(column).into_owned();
        if nudge(&mut col, &delta) {
            self.m.set_column(column, &col);
        }
    }

    fn draw<'a>(&self, scene: &Scene, queue: &mut PainterQueue<'a>) {
        queue_backdrop(scene, queue, 6);
        let project = scene.projector();
        let m3 = embed2(&self.m);

        if let (true, Some(dir)) = (self.is_collapsed(), self.collapse_line()) {
            let end = lift2(&dir) * 8.0;
            queue_segment(queue, &project, -end, end, egui::Stroke::new(2.5, egui::Color32::LIGHT_RED));
            queue_label(queue, &project, end * 0.5, "collapsed".into(), egui::Color32::LIGHT_RED);
        } else {
            let grid = egui::Color32::from_rgba_unmultiplied(80, 140, 220, 90);
            queue_grid(queue, &project, &m3, grid, 6, false);
            queue_unit_square(queue, &project, &self.m);
        }

        let i_hat = lift2(&self.m.column(0).into_owned());
        let j_hat = lift2(&self.m.column(1).into_owned());
        queue_handle_arrow(queue, &project, Vector3::zeros(), i_hat, X_COLOR);
        queue_handle_arrow(queue, &project, Vector3::zeros(), j_hat, Y_COLOR);
        queue_label(queue, &project, i_hat * 1.15, "î".into(), X_COLOR);
        queue_label(queue, &project, j_hat * 1.15, "ĵ".into(), Y_COLOR);

        queue_arrow(queue, &project, Vector3::zeros(), lift2(&self.output()), ORANGE);
        queue_handle_arrow(queue, &project, Vector3::zeros(), lift2(&self.input), YELLOW);
        queue_label(queue, &project, lift2(&self.output()) * 1.1, "Mv".into(), ORANGE);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn rotation_maps_x_to_y() {
        let mut lesson = LinearMapLesson::new();
        lesson.m = matrix2(0.0, -1.0, 1.0, 0.0);
        lesson.input = Vector2::x();
        assert_abs_diff_eq!(lesson.output(), Vector2::y(), epsilon = 1e-6);
        assert_abs_diff_eq!(lesson.m.det(), 1.0);
    }

    #[test]
    fn dragging_basis_tip_edits_column() {
        let mut lesson = LinearMapLesson::new();
        lesson.m = Matrix2::identity();
        lesson.drag_handle(J_HAT, Vector3::new(0.5, 0.0, 0.0), &CameraState::planar(50.0));
        assert_eq!(lesson.m, matrix2(1.0, 0.5, 0.0, 1.0));
    }

    #[test]
    fn singular_matrix_collapses_onto_column() {
        let mut lesson = LinearMapLesson::new();
        lesson.m = matrix2(1.0, 2.0, 0.5, 1.0);
        assert!(lesson.is_collapsed());
        let dir = lesson.collapse_line().expect("rank one");
        assert_abs_diff_eq!(crate::math::cross2(&dir, &Vector2::new(2.0, 1.0)), 0.0, epsilon = 1e-5);

        lesson.m = Matrix2::zeros();
        assert!(lesson.collapse_line().is_none());
    }
}
