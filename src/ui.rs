//! Small egui widgets shared by the lesson panels.

use eframe::egui;
use nalgebra::{Matrix2, Matrix3, SVector};

/// Parses a user-typed number. Anything that is not a finite float is
/// rejected.
pub fn parse_finite(text: &str) -> Option<f32> {
    text.trim().parse::<f32>().ok().filter(|v| v.is_finite())
}

/// Updates `value` only when `text` parses to a finite number; otherwise the
/// last good value stays. Returns whether `value` changed.
pub fn apply_text_input(text: &str, value: &mut f32) -> bool {
    match parse_finite(text) {
        Some(parsed) => {
            let changed = parsed != *value;
            *value = parsed;
            changed
        }
        None => {
            if !text.trim().is_empty() {
                log::debug!(target: "vectorlab", "rejected numeric input {text:?}, keeping {value}");
            }
            false
        }
    }
}

/// Colour for a signed value: grey near zero, green positive, red negative.
pub fn sign_color(value: f32) -> egui::Color32 {
    if value.abs() < 0.001 {
        egui::Color32::DARK_GRAY
    } else if value > 0.0 {
        egui::Color32::LIGHT_GREEN
    } else {
        egui::Color32::LIGHT_RED
    }
}

/// Single-line numeric field. While focused it edits a shared text buffer;
/// otherwise it shows the value. Gaining focus selects the whole value.
pub fn buffered_input(ui: &mut egui::Ui, id: egui::Id, buffer: &mut String, value: &mut f32) -> bool {
    let mut display = if ui.memory(|mem| mem.has_focus(id)) {
        buffer.clone()
    } else {
        format!("{value:.3}")
    };

    let response = ui.add(egui::TextEdit::singleline(&mut display).id(id).desired_width(60.0));

    if response.gained_focus() {
        *buffer = format!("{value:.3}");
        if let Some(mut state) = egui::TextEdit::load_state(ui.ctx(), id) {
            let all = egui::text::CCursorRange::two(
                egui::text::CCursor::new(0),
                egui::text::CCursor::new(buffer.chars().count()),
            );
            state.cursor.set_char_range(Some(all));
            egui::TextEdit::store_state(ui.ctx(), id, state);
        }
    }

    if response.changed() {
        *buffer = display;
        return apply_text_input(buffer, value);
    }
    false
}

/// One row of numeric fields for a vector's components.
pub fn vector_input<const D: usize>(
    ui: &mut egui::Ui,
    id_salt: &str,
    buffer: &mut String,
    v: &mut SVector<f32, D>,
) -> bool {
    const AXES: [&str; 3] = ["x", "y", "z"];
    let mut changed = false;
    ui.horizontal(|ui| {
        for i in 0..D {
            ui.label(format!("{}:", AXES.get(i).copied().unwrap_or("?")));
            let id = ui.make_persistent_id((id_salt, i));
            changed |= buffered_input(ui, id, buffer, &mut v[i]);
        }
    });
    changed
}

pub fn matrix2_input(ui: &mut egui::Ui, id_salt: &str, buffer: &mut String, m: &mut Matrix2<f32>) -> bool {
    let mut changed = false;
    egui::Grid::new(id_salt).spacing([8.0, 8.0]).show(ui, |ui| {
        for r in 0..2 {
            for c in 0..2 {
                let id = ui.make_persistent_id((id_salt, r, c));
                changed |= buffered_input(ui, id, buffer, &mut m[(r, c)]);
            }
            ui.end_row();
        }
    });
    changed
}

pub fn matrix3_display(ui: &mut egui::Ui, m: &Matrix3<f32>) {
    for r in 0..3 {
        ui.horizontal(|ui| {
            for c in 0..3 {
                let val = m[(r, c)];
                ui.colored_label(sign_color(val), format!("{val:>6.2}"));
            }
        });
    }
}

pub fn matrix2_display(ui: &mut egui::Ui, m: &Matrix2<f32>) {
    for r in 0..2 {
        ui.horizontal(|ui| {
            for c in 0..2 {
                let val = m[(r, c)];
                ui.colored_label(sign_color(val), format!("{val:>6.2}"));
            }
        });
    }
}

/// Colored `name = value` readout.
pub fn readout(ui: &mut egui::Ui, name: &str, value: f32) {
    ui.horizontal(|ui| {
        ui.label(format!("{name} ="));
        ui.colored_label(sign_color(value), format!("{value:.3}"));
    });
}
