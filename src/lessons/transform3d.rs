use eframe::egui;
use nalgebra::{Matrix3, Vector3};
use rand::Rng;

use super::{nudge, queue_backdrop, Lesson, ORANGE, YELLOW};
use crate::camera::{CameraState, ViewMode};
use crate::interaction::HandleId;
use crate::math::{is_near_identity, lerp_mat, rank_approx, real_eigenpairs_3x3, smoothstep, LinearMap};
use crate::render::{
    queue_determinant_geometry, queue_eigen_rays, queue_flow_field, queue_grid, queue_handle_arrow, queue_arrow,
    queue_unit_sphere, PainterQueue, X_COLOR, Y_COLOR, Z_COLOR,
};
use crate::scene::Scene;
use crate::sim::compose;
use crate::ui::{buffered_input, matrix3_display, sign_color, vector_input};

const PROBE: HandleId = HandleId("v");

/// Seconds for one history change at speed 1.
const BASE_DURATION: f32 = 0.8;

/// Matrix whose entries are multiples of `step` in `[-range, range]`.
pub fn random_matrix(rng: &mut impl Rng, range: f32, step: f32) -> Matrix3<f32> {
    let max = (range / step) as i32;
    Matrix3::from_fn(|_, _| rng.gen_range(-max..=max) as f32 * step)
}

pub struct TransformLesson {
    current: Matrix3<f32>,
    start: Matrix3<f32>,
    target: Matrix3<f32>,
    anim_t: f32,
    animating: bool,
    anim_speed: f32,
    input: Matrix3<f32>,
    buffer: String,
    history: Vec<Matrix3<f32>>,
    probe: Vector3<f32>,

    show_original: bool,
    draw_determinant: bool,
    draw_eigen_rays: bool,
    draw_flow_field: bool,
    draw_unit_sphere: bool,
    draw_probe: bool,
    grid_opacity: u8,
}

impl TransformLesson {
    pub fn new() -> Self {
        Self {
            current: Matrix3::identity(),
            start: Matrix3::identity(),
            target: Matrix3::identity(),
            anim_t: 0.0,
            animating: false,
            anim_speed: 1.0,
            input: Matrix3::identity(),
            buffer: String::new(),
            history: Vec::new(),
            probe: Vector3::new(1.0, 1.0, 0.0),
            show_original: true,
            draw_determinant: true,
            draw_eigen_rays: false,
            draw_flow_field: false,
            draw_unit_sphere: false,
            draw_probe: false,
            grid_opacity: 60,
        }
    }

    /// Starts easing from what is on screen to the product of the history.
    fn retarget(&mut self) {
        self.start = self.current;
        self.target = compose(&self.history);
        self.anim_t = 0.0;
        self.animating = true;
    }

    pub fn apply_input(&mut self) {
        self.history.push(self.input);
        log::debug!(target: "vectorlab", "applied matrix, history length {}", self.history.len());
        self.retarget();
    }

    pub fn undo(&mut self) {
        if self.history.pop().is_some() {
            self.retarget();
        }
    }

    pub fn clear(&mut self) {
        self.history.clear();
        self.retarget();
    }

    pub fn target(&self) -> Matrix3<f32> {
        self.target
    }

    fn randomize(&mut self, range: f32, step: f32) {
        self.input = random_matrix(&mut rand::thread_rng(), range, step);
    }

    fn swap_columns(&mut self, a: usize, b: usize) {
        self.input.swap_columns(a, b);
    }

    fn swap_rows(&mut self, a: usize, b: usize) {
        self.input.swap_rows(a, b);
    }

    fn transpose_input(&mut self) {
        self.input.transpose_mut();
    }

    fn matrix_input(&mut self, ui: &mut egui::Ui) {
        ui.heading("Transform matrix");
        if ui.button("🎲 Random [R]").clicked() {
            self.randomize(3.0, 0.5);
        }
        ui.add_space(6.0);

        egui::Grid::new("transform_input_grid").spacing([8.0, 8.0]).show(ui, |ui| {
            ui.label("");
            if ui.button("⟷").on_hover_text("Swap columns 1 and 2").clicked() {
                self.swap_columns(0, 1);
            }
            if ui.button("⟷").on_hover_text("Swap columns 2 and 3").clicked() {
                self.swap_columns(1, 2);
            }
            ui.end_row();

            for r in 0..3 {
                for c in 0..3 {
                    let id = ui.make_persistent_id(("transform_input", r, c));
                    buffered_input(ui, id, &mut self.buffer, &mut self.input[(r, c)]);
                }
                if r < 2
                    && ui
                        .button("↕")
                        .on_hover_text(format!("Swap rows {} and {}", r + 1, r + 2))
                        .clicked()
                {
                    self.swap_rows(r, r + 1);
                }
                ui.end_row();
            }
        });

        ui.horizontal(|ui| {
            if ui.button("⟲ Identity").clicked() {
                self.input = Matrix3::identity();
            }
            if ui.button("⬈ Transpose").clicked() {
                self.transpose_input();
            }
        });
        ui.horizontal(|ui| {
            if ui.button("Apply [A]").clicked() && !self.animating {
                self.apply_input();
            }
            if ui.button("Undo").clicked() {
                self.undo();
            }
            if ui.button("Clear [C]").clicked() {
                self.clear();
            }
        });
        ui.label(format!("{} matrices applied", self.history.len()));
    }
}

impl Default for TransformLesson {
    fn default() -> Self {
        Self::new()
    }
}

impl Lesson for TransformLesson {
    fn title(&self) -> &'static str {
        "3x3 transform explorer"
    }

    fn slug(&self) -> &'static str {
        "transform"
    }

    fn view_mode(&self) -> ViewMode {
        ViewMode::Spatial
    }

    fn controls(&mut self, ui: &mut egui::Ui) {
        ui.collapsing("⌨ Hotkeys", |ui| {
            ui.label("A: apply | R: random (Shift: small) | C: clear\nCtrl+Z: undo | D: determinant | P: original grid");
        });

        ui.checkbox(&mut self.show_original, "Original grid [P]");
        ui.checkbox(&mut self.draw_determinant, "Determinant [D]");
        ui.checkbox(&mut self.draw_eigen_rays, "Eigen rays");
        ui.checkbox(&mut self.draw_flow_field, "Flow field");
        ui.checkbox(&mut self.draw_unit_sphere, "Unit sphere deformation");
        ui.checkbox(&mut self.draw_probe, egui::RichText::new("Vector v").color(YELLOW));
        ui.add(egui::Slider::new(&mut self.grid_opacity, 0..=255).text("Grid alpha"));
        ui.add(egui::Slider::new(&mut self.anim_speed, 0.1..=3.0).text("Animation speed"));

        ui.separator();
        self.matrix_input(ui);

        ui.separator();
        ui.heading("Result");
        egui::Frame::group(ui.style()).show(ui, |ui| {
            ui.horizontal(|ui| {
                ui.vertical(|ui| {
                    ui.label("M");
                    matrix3_display(ui, &self.target);
                });
                ui.separator();
                ui.vertical(|ui| {
                    ui.label("M⁻¹");
                    match self.target.try_inverse() {
                        Some(inv) => matrix3_display(ui, &inv),
                        None => {
                            ui.colored_label(egui::Color32::LIGHT_RED, "Not invertible");
                        }
                    }
                });
            });
        });

        ui.label(format!("det(M) = {:.4}", self.target.det()));
        ui.label(format!("rank(M) = {}", rank_approx(&self.target, 1e-6)));
        if real_eigenpairs_3x3(&self.current, 1e-3).is_empty() {
            ui.colored_label(egui::Color32::GRAY, "No real eigenvectors");
        }

        if self.draw_probe {
            ui.separator();
            ui.colored_label(YELLOW, "v");
            vector_input(ui, "transform_probe", &mut self.buffer, &mut self.probe);
            let image = self.current * self.probe;
            ui.horizontal(|ui| {
                ui.colored_label(ORANGE, "M·v =");
                for i in 0..3 {
                    ui.colored_label(sign_color(image[i]), format!("{:>6.3}", image[i]));
                }
            });
        }
    }

    fn handles(&self) -> Vec<(HandleId, Vector3<f32>)> {
        if self.draw_probe {
            vec![(PROBE, self.probe)]
        } else {
            Vec::new()
        }
    }

    fn drag_handle(&mut self, id: HandleId, delta: Vector3<f32>, _camera: &CameraState) {
        if id == PROBE {
            nudge(&mut self.probe, &delta);
        }
    }

    fn handle_keys(&mut self, input: &egui::InputState) {
        if input.key_pressed(egui::Key::P) {
            self.show_original = !self.show_original;
        }
        if input.key_pressed(egui::Key::D) {
            self.draw_determinant = !self.draw_determinant;
        }
        if input.key_pressed(egui::Key::C) {
            self.clear();
        }
        if input.key_pressed(egui::Key::A) && !self.animating {
            self.apply_input();
        }
        if input.key_pressed(egui::Key::R) && !self.animating {
            if input.modifiers.shift {
                self.randomize(1.0, 1.0);
            } else {
                self.randomize(3.0, 0.5);
            }
        }
        if input.modifiers.command && input.key_pressed(egui::Key::Z) {
            self.undo();
        }
    }

    fn tick(&mut self, dt: f32) {
        if !self.animating {
            return;
        }
        self.anim_t += dt.max(0.0) * self.anim_speed / BASE_DURATION;
        let t = smoothstep(self.anim_t.min(1.0));
        self.current = lerp_mat(&self.start, &self.target, t);
        if self.anim_t >= 1.0 {
            self.current = self.target;
            self.animating = false;
        }
    }

    fn draw<'a>(&self, scene: &Scene, queue: &mut PainterQueue<'a>) {
        let project = scene.projector();
        let m = self.current;

        if self.draw_flow_field {
            queue_flow_field(queue, &project, &m, 0.8, 6);
        }
        if self.show_original {
            queue_backdrop(scene, queue, 5);
        }

        let grid = egui::Color32::from_rgba_unmultiplied(80, 140, 220, self.grid_opacity);
        queue_grid(queue, &project, &m, grid, 5, true);

        if self.draw_determinant {
            queue_determinant_geometry(queue, &project, &m);
        }
        if self.draw_unit_sphere && rank_approx(&m, 1e-6) >= 2 {
            queue_unit_sphere(queue, &project, &m);
        }
        if self.draw_eigen_rays && !is_near_identity(&m, 1e-5) {
            queue_eigen_rays(queue, &project, &real_eigenpairs_3x3(&m, 1e-3), 6.0);
        }

        for (axis, color) in [(Vector3::x(), X_COLOR), (Vector3::y(), Y_COLOR), (Vector3::z(), Z_COLOR)] {
            queue_arrow(queue, &project, Vector3::zeros(), m * axis, color);
        }

        if self.draw_probe {
            queue_arrow(queue, &project, Vector3::zeros(), m * self.probe, ORANGE);
            queue_handle_arrow(queue, &project, Vector3::zeros(), self.probe, YELLOW);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::{rngs::StdRng, SeedableRng};

    fn settle(lesson: &mut TransformLesson) {
        for _ in 0..100 {
            lesson.tick(0.05);
        }
    }

    #[test]
    fn random_entries_sit_on_the_step_lattice() {
        let mut rng = StdRng::seed_from_u64(7);
        let m = random_matrix(&mut rng, 3.0, 0.5);
        for v in m.iter() {
            assert!(v.abs() <= 3.0);
            assert_abs_diff_eq!((v / 0.5).round() * 0.5, *v);
        }
    }

    #[test]
    fn history_composes_later_matrices_on_the_left() {
        let mut lesson = TransformLesson::new();
        let first = Matrix3::new(2.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0);
        let second = Matrix3::new(0.0, -1.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0);
        lesson.input = first;
        lesson.apply_input();
        settle(&mut lesson);
        lesson.input = second;
        lesson.apply_input();
        settle(&mut lesson);
        assert_abs_diff_eq!(lesson.target(), second * first, epsilon = 1e-6);
        assert_eq!(lesson.current, lesson.target());

        lesson.undo();
        settle(&mut lesson);
        assert_abs_diff_eq!(lesson.current, first, epsilon = 1e-6);
        lesson.clear();
        settle(&mut lesson);
        assert_eq!(lesson.current, Matrix3::identity());
    }

    #[test]
    fn swaps_and_transpose_edit_the_input() {
        let mut lesson = TransformLesson::new();
        lesson.input = Matrix3::new(1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0);
        lesson.swap_rows(0, 1);
        assert_eq!(lesson.input.row(0)[0], 4.0);
        lesson.swap_columns(0, 2);
        assert_eq!(lesson.input[(0, 0)], 6.0);
        lesson.transpose_input();
        assert_eq!(lesson.input[(2, 0)], 4.0);
    }
}
