use eframe::egui;

use crate::camera::Viewport;
use crate::config::LabConfig;
use crate::interaction::{DragTarget, PointerButton, PointerEvent};
use crate::lessons::{self, Lesson};
use crate::render::{FlushReport, PainterQueue};
use crate::scene::Scene;

/// Longest frame time fed to the lessons, in seconds.
const MAX_FRAME_DT: f32 = 0.25;

/// Pointer state for one frame, read from egui.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerFrame {
    pub pos: Option<egui::Pos2>,
    pub primary_pressed: bool,
    pub secondary_pressed: bool,
    pub released: bool,
    pub moved: bool,
    /// Raw wheel delta; only its sign is used.
    pub wheel: f32,
}

impl PointerFrame {
    pub fn from_input(input: &egui::InputState) -> Self {
        Self {
            pos: input.pointer.latest_pos(),
            primary_pressed: input.pointer.primary_pressed(),
            secondary_pressed: input.pointer.secondary_pressed(),
            released: input.pointer.any_released(),
            moved: input.pointer.delta() != egui::Vec2::ZERO,
            wheel: input.raw_scroll_delta.y,
        }
    }

    /// Translates this frame into events for a viewport occupying `rect`.
    /// Presses outside the viewport are ignored; leaving it mid-drag ends the
    /// gesture.
    pub fn events(&self, rect: egui::Rect, dragging: bool) -> Vec<PointerEvent> {
        let mut events = Vec::new();
        let inside = self.pos.filter(|p| rect.contains(*p));

        if let Some(pos) = inside {
            if self.primary_pressed {
                events.push(PointerEvent::Down { pos, button: PointerButton::Primary });
            } else if self.secondary_pressed {
                events.push(PointerEvent::Down { pos, button: PointerButton::Secondary });
            }
        }

        let pressed = !events.is_empty();
        if dragging || pressed {
            match inside {
                Some(pos) if self.moved => events.push(PointerEvent::Move { pos }),
                Some(_) => {}
                None => events.push(PointerEvent::Leave),
            }
        }

        if self.released {
            events.push(PointerEvent::Up);
        }

        if inside.is_some() && self.wheel != 0.0 && self.wheel.is_finite() {
            events.push(PointerEvent::Wheel { delta: self.wheel });
        }
        events
    }
}

pub struct LabApp {
    config: LabConfig,
    lessons: Vec<Box<dyn Lesson>>,
    active: usize,
    scene: Scene,
    last_flush: FlushReport,
}

impl LabApp {
    pub fn new(config: LabConfig, initial_lesson: Option<&str>) -> Self {
        let lessons = lessons::all(&config);
        let active = match initial_lesson {
            Some(slug) => lessons::find(&lessons, slug).unwrap_or_else(|| {
                log::warn!(target: "vectorlab", "unknown lesson {slug:?}, opening the first one");
                0
            }),
            None => 0,
        };
        let mode = lessons[active].view_mode();
        log::info!(target: "vectorlab", "opening lesson {}", lessons[active].title());

        Self {
            scene: Scene::new(&config, mode),
            config,
            lessons,
            active,
            last_flush: FlushReport::default(),
        }
    }

    fn select(&mut self, index: usize) {
        if index == self.active || index >= self.lessons.len() {
            return;
        }
        // The lesson being left is torn down; it starts over next time.
        let leaving = self.lessons[self.active].slug();
        if let Some(fresh) = lessons::build(leaving, &self.config) {
            self.lessons[self.active] = fresh;
        }

        self.active = index;
        let lesson = &self.lessons[index];
        log::info!(target: "vectorlab", "switching to lesson {}", lesson.title());
        self.scene = Scene::new(&self.config, lesson.view_mode());
        self.last_flush = FlushReport::default();
    }

    fn side_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::left("controls")
            .width_range(300.0..=360.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().auto_shrink([false; 2]).show(ui, |ui| {
                    ui.heading("vectorlab");
                    ui.add_space(4.0);

                    let mut selected = self.active;
                    egui::ComboBox::from_label("Lesson")
                        .selected_text(self.lessons[self.active].title())
                        .show_ui(ui, |ui| {
                            for (i, lesson) in self.lessons.iter().enumerate() {
                                ui.selectable_value(&mut selected, i, lesson.title());
                            }
                        });
                    self.select(selected);

                    ui.horizontal(|ui| {
                        if ui.button("⟲ Reset camera [Home]").clicked() {
                            self.scene.reset_camera();
                        }
                    });
                    if self.scene.camera().mode.is_3d() {
                        ui.horizontal(|ui| {
                            for (name, yaw, pitch) in [
                                ("Front", 0.0, 0.0),
                                ("Side", -std::f32::consts::FRAC_PI_2, 0.0),
                                ("Top", 0.0, std::f32::consts::FRAC_PI_2),
                                ("Iso", self.config.camera.initial_yaw, self.config.camera.initial_pitch),
                            ] {
                                if ui.small_button(name).clicked() {
                                    self.scene.set_view(yaw, pitch);
                                }
                            }
                        });
                    }
                    ui.label(
                        egui::RichText::new("Drag: orbit or pan | Right-drag: pan | Wheel: zoom").small(),
                    );

                    ui.separator();
                    let lesson = &mut self.lessons[self.active];
                    ui.heading(lesson.title());
                    ui.add_space(4.0);
                    lesson.controls(ui);

                    ui.separator();
                    let report = self.last_flush;
                    let text = if report.failed > 0 {
                        format!("{} shapes, {} skipped", report.drawn, report.failed)
                    } else {
                        format!("{} shapes", report.drawn)
                    };
                    ui.label(egui::RichText::new(text).small().weak());
                });
            });
    }

    fn viewport(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let (rect, _response) = ui.allocate_exact_size(ui.available_size(), egui::Sense::click_and_drag());
            let lesson = &mut self.lessons[self.active];
            let scene = &mut self.scene;

            scene.set_mode(lesson.view_mode(), &self.config);
            scene.set_viewport(Viewport::from_rect(rect));
            scene.register_handles(&lesson.handles());

            let frame = ctx.input(PointerFrame::from_input);
            for event in frame.events(rect, scene.interaction().is_dragging()) {
                let update = scene.handle_event(event);
                if let Some(DragTarget::Handle(id)) = update.began {
                    lesson.drag_started(id);
                }
                if let Some((id, delta)) = update.handle_delta {
                    lesson.drag_handle(id, delta, scene.camera());
                }
            }

            let dt = ctx.input(|i| i.unstable_dt).clamp(0.0, MAX_FRAME_DT);
            lesson.tick(dt);

            let mut queue = PainterQueue::new();
            lesson.draw(scene, &mut queue);
            self.last_flush = queue.flush(&ui.painter_at(rect));
        });
    }
}

impl eframe::App for LabApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if !ctx.wants_keyboard_input() {
            let home = ctx.input(|i| i.key_pressed(egui::Key::Home));
            if home {
                self.scene.reset_camera();
            }
            let lesson = &mut self.lessons[self.active];
            ctx.input(|i| lesson.handle_keys(i));
        }

        self.side_panel(ctx);
        self.viewport(ctx);

        ctx.request_repaint();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect() -> egui::Rect {
        egui::Rect::from_min_size(egui::pos2(100.0, 0.0), egui::vec2(400.0, 300.0))
    }

    #[test]
    fn press_inside_starts_gesture() {
        let frame = PointerFrame {
            pos: Some(egui::pos2(200.0, 100.0)),
            primary_pressed: true,
            ..Default::default()
        };
        assert_eq!(
            frame.events(rect(), false),
            vec![PointerEvent::Down { pos: egui::pos2(200.0, 100.0), button: PointerButton::Primary }]
        );
    }

    #[test]
    fn press_over_side_panel_is_ignored() {
        let frame = PointerFrame {
            pos: Some(egui::pos2(50.0, 100.0)),
            primary_pressed: true,
            moved: true,
            wheel: 1.0,
            ..Default::default()
        };
        assert!(frame.events(rect(), false).is_empty());
    }

    #[test]
    fn leaving_mid_drag_emits_leave() {
        let frame = PointerFrame {
            pos: Some(egui::pos2(50.0, 100.0)),
            moved: true,
            ..Default::default()
        };
        assert_eq!(frame.events(rect(), true), vec![PointerEvent::Leave]);
        let gone = PointerFrame::default();
        assert_eq!(gone.events(rect(), true), vec![PointerEvent::Leave]);
    }

    #[test]
    fn move_release_and_wheel() {
        let frame = PointerFrame {
            pos: Some(egui::pos2(300.0, 150.0)),
            released: true,
            moved: true,
            wheel: -2.0,
            ..Default::default()
        };
        assert_eq!(
            frame.events(rect(), true),
            vec![
                PointerEvent::Move { pos: egui::pos2(300.0, 150.0) },
                PointerEvent::Up,
                PointerEvent::Wheel { delta: -2.0 },
            ]
        );
    }

    #[test]
    fn app_opens_requested_lesson() {
        let app = LabApp::new(LabConfig::default(), Some("riemann"));
        assert_eq!(app.lessons[app.active].slug(), "riemann");
        assert!(app.scene.camera().mode.is_3d());

        let fallback = LabApp::new(LabConfig::default(), Some("missing"));
        assert_eq!(fallback.active, 0);
    }

    #[test]
    fn switching_lessons_discards_their_state() {
        let config = LabConfig::default();
        let mut app = LabApp::new(config.clone(), Some("gradient"));
        let gradient = app.active;
        let fresh = lessons::build("gradient", &config).map(|l| l.handles());
        let (probe, _) = app.lessons[gradient].handles()[0];

        app.scene.handle_event(PointerEvent::Down { pos: egui::pos2(10.0, 10.0), button: PointerButton::Primary });
        let lesson = &mut app.lessons[gradient];
        lesson.drag_started(probe);
        lesson.drag_handle(probe, nalgebra::Vector3::new(-2.0, 0.0, 0.0), app.scene.camera());
        assert_ne!(Some(lesson.handles()), fresh);

        app.select(0);
        assert!(!app.scene.interaction().is_dragging());
        assert!(!app.scene.camera().mode.is_3d());
        app.select(gradient);
        assert_eq!(Some(app.lessons[gradient].handles()), fresh);
        assert!(app.scene.camera().mode.is_3d());
    }
}
