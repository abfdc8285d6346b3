//! Pointer gestures: orbit, pan, zoom and handle dragging.
//!
//! A gesture starts on pointer-down by hit-testing the handles registered for
//! the current frame, and keeps its [`DragTarget`] until pointer-up or the
//! pointer leaves the viewport. The wheel zooms independently of any drag.

use eframe::egui;
use nalgebra::Vector3;

use crate::camera::{screen_delta_to_world, CameraLimits, CameraState};

/// Names a draggable quantity (vector tip, point, probe) within a lesson.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandleId(pub &'static str);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Handle {
    pub id: HandleId,
    pub screen: egui::Pos2,
}

/// Handles projected for the current frame, in priority order.
#[derive(Debug, Default, Clone)]
pub struct HandleRegistry {
    handles: Vec<Handle>,
}

impl HandleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.handles.clear();
    }

    pub fn register(&mut self, id: HandleId, screen: egui::Pos2) {
        if screen.x.is_finite() && screen.y.is_finite() {
            self.handles.push(Handle { id, screen });
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Handle> {
        self.handles.iter()
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// First registered handle within `radius` pixels of `pos`.
    pub fn hit_test(&self, pos: egui::Pos2, radius: f32) -> Option<HandleId> {
        self.handles
            .iter()
            .find(|h| h.screen.distance(pos) <= radius)
            .map(|h| h.id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragTarget {
    None,
    Orbit,
    Pan,
    Handle(HandleId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down { pos: egui::Pos2, button: PointerButton },
    Move { pos: egui::Pos2 },
    Up,
    Leave,
    /// Positive zooms in.
    Wheel { delta: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InteractionSettings {
    pub handle_radius: f32,
    pub orbit_sensitivity: f32,
    pub zoom_step: f32,
    pub limits: CameraLimits,
}

impl Default for InteractionSettings {
    fn default() -> Self {
        Self {
            handle_radius: 20.0,
            orbit_sensitivity: 0.01,
            zoom_step: 0.1,
            limits: CameraLimits::default(),
        }
    }
}

/// Result of feeding one event through the state machine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InteractionUpdate {
    pub camera: CameraState,
    /// Set when this event started a gesture.
    pub began: Option<DragTarget>,
    /// World-space delta to apply to a dragged handle.
    pub handle_delta: Option<(HandleId, Vector3<f32>)>,
}

impl InteractionUpdate {
    fn unchanged(camera: &CameraState) -> Self {
        Self {
            camera: *camera,
            began: None,
            handle_delta: None,
        }
    }
}

/// Picks the drag target for a pointer-down. Handles win over the camera;
/// the secondary button always pans.
pub fn begin_interaction(
    pos: egui::Pos2,
    button: PointerButton,
    handles: &HandleRegistry,
    camera: &CameraState,
    settings: &InteractionSettings,
) -> DragTarget {
    if button == PointerButton::Secondary {
        return DragTarget::Pan;
    }
    if let Some(id) = handles.hit_test(pos, settings.handle_radius) {
        return DragTarget::Handle(id);
    }
    if camera.mode.is_3d() {
        DragTarget::Orbit
    } else {
        DragTarget::Pan
    }
}

/// Applies one pointer delta for an active gesture.
pub fn drag_update(
    delta: egui::Vec2,
    target: DragTarget,
    camera: &CameraState,
    settings: &InteractionSettings,
) -> InteractionUpdate {
    let mut update = InteractionUpdate::unchanged(camera);
    match target {
        DragTarget::None => {}
        DragTarget::Orbit => {
            update.camera = camera.orbited(delta, settings.orbit_sensitivity, &settings.limits);
        }
        DragTarget::Pan => {
            update.camera = camera.panned(delta);
        }
        DragTarget::Handle(id) => {
            update.handle_delta = Some((id, screen_delta_to_world(delta, camera)));
        }
    }
    update
}

/// Holds the active gesture between events.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interaction {
    target: DragTarget,
    last: Option<egui::Pos2>,
}

impl Default for Interaction {
    fn default() -> Self {
        Self {
            target: DragTarget::None,
            last: None,
        }
    }
}

impl Interaction {
    pub fn target(&self) -> DragTarget {
        self.target
    }

    pub fn is_dragging(&self) -> bool {
        self.target != DragTarget::None
    }

    pub fn handle_event(
        &mut self,
        event: PointerEvent,
        handles: &HandleRegistry,
        camera: &CameraState,
        settings: &InteractionSettings,
    ) -> InteractionUpdate {
        match event {
            PointerEvent::Down { pos, button } => {
                if self.is_dragging() {
                    return InteractionUpdate::unchanged(camera);
                }
                let target = begin_interaction(pos, button, handles, camera, settings);
                log::debug!(target: "vectorlab", "drag started: {target:?}");
                self.target = target;
                self.last = Some(pos);
                InteractionUpdate {
                    began: Some(target),
                    ..InteractionUpdate::unchanged(camera)
                }
            }
            PointerEvent::Move { pos } => {
                let Some(last) = self.last.filter(|_| self.is_dragging()) else {
                    return InteractionUpdate::unchanged(camera);
                };
                self.last = Some(pos);
                drag_update(pos - last, self.target, camera, settings)
            }
            PointerEvent::Up | PointerEvent::Leave => {
                self.target = DragTarget::None;
                self.last = None;
                InteractionUpdate::unchanged(camera)
            }
            PointerEvent::Wheel { delta } => InteractionUpdate {
                camera: camera.zoomed(delta, settings.zoom_step, &settings.limits),
                ..InteractionUpdate::unchanged(camera)
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::ViewMode;
    use approx::assert_abs_diff_eq;

    const A: HandleId = HandleId("a");
    const B: HandleId = HandleId("b");

    fn registry() -> HandleRegistry {
        let mut handles = HandleRegistry::new();
        handles.register(A, egui::pos2(100.0, 100.0));
        handles.register(B, egui::pos2(110.0, 100.0));
        handles
    }

    fn spatial() -> CameraState {
        CameraState::new(ViewMode::Spatial, 0.0, 0.0, 50.0)
    }

    #[test]
    fn first_registered_handle_wins_overlap() {
        let settings = InteractionSettings::default();
        let target = begin_interaction(
            egui::pos2(106.0, 100.0),
            PointerButton::Primary,
            &registry(),
            &spatial(),
            &settings,
        );
        assert_eq!(target, DragTarget::Handle(A));
    }

    #[test]
    fn miss_falls_back_to_orbit_or_pan() {
        let settings = InteractionSettings::default();
        let far = egui::pos2(400.0, 400.0);
        assert_eq!(
            begin_interaction(far, PointerButton::Primary, &registry(), &spatial(), &settings),
            DragTarget::Orbit
        );
        assert_eq!(
            begin_interaction(far, PointerButton::Primary, &registry(), &CameraState::planar(50.0), &settings),
            DragTarget::Pan
        );
        assert_eq!(
            begin_interaction(egui::pos2(100.0, 100.0), PointerButton::Secondary, &registry(), &spatial(), &settings),
            DragTarget::Pan
        );
    }

    #[test]
    fn orbit_drag_moves_camera_until_release() {
        let settings = InteractionSettings::default();
        let mut interaction = Interaction::default();
        let handles = registry();
        let camera = spatial();

        let began = interaction.handle_event(
            PointerEvent::Down { pos: egui::pos2(300.0, 300.0), button: PointerButton::Primary },
            &handles,
            &camera,
            &settings,
        );
        assert_eq!(began.began, Some(DragTarget::Orbit));

        let moved = interaction.handle_event(PointerEvent::Move { pos: egui::pos2(310.0, 305.0) }, &handles, &camera, &settings);
        assert_abs_diff_eq!(moved.camera.yaw, 0.1, epsilon = 1e-6);
        assert_abs_diff_eq!(moved.camera.pitch, 0.05, epsilon = 1e-6);
        assert!(moved.handle_delta.is_none());

        interaction.handle_event(PointerEvent::Leave, &handles, &moved.camera, &settings);
        assert!(!interaction.is_dragging());
        let after = interaction.handle_event(PointerEvent::Move { pos: egui::pos2(400.0, 400.0) }, &handles, &moved.camera, &settings);
        assert_eq!(after.camera, moved.camera);
    }

    #[test]
    fn handle_drag_reports_world_delta() {
        let settings = InteractionSettings::default();
        let mut interaction = Interaction::default();
        let handles = registry();
        let camera = CameraState::planar(50.0);

        interaction.handle_event(
            PointerEvent::Down { pos: egui::pos2(100.0, 100.0), button: PointerButton::Primary },
            &handles,
            &camera,
            &settings,
        );
        let update = interaction.handle_event(PointerEvent::Move { pos: egui::pos2(125.0, 50.0) }, &handles, &camera, &settings);
        let (id, delta) = update.handle_delta.expect("handle delta");
        assert_eq!(id, A);
        assert_abs_diff_eq!(delta, Vector3::new(0.5, 1.0, 0.0), epsilon = 1e-6);
        assert_eq!(update.camera, camera);
    }

    #[test]
    fn wheel_zooms_even_mid_drag() {
        let settings = InteractionSettings::default();
        let mut interaction = Interaction::default();
        let handles = registry();
        let camera = spatial();
        interaction.handle_event(
            PointerEvent::Down { pos: egui::pos2(300.0, 300.0), button: PointerButton::Primary },
            &handles,
            &camera,
            &settings,
        );
        let zoomed = interaction.handle_event(PointerEvent::Wheel { delta: 3.0 }, &handles, &camera, &settings);
        assert_abs_diff_eq!(zoomed.camera.scale, 55.0, epsilon = 1e-4);
        assert_eq!(interaction.target(), DragTarget::Orbit);
    }

    #[test]
    fn second_press_does_not_retarget() {
        let settings = InteractionSettings::default();
        let mut interaction = Interaction::default();
        let handles = registry();
        let camera = spatial();
        interaction.handle_event(
            PointerEvent::Down { pos: egui::pos2(100.0, 100.0), button: PointerButton::Primary },
            &handles,
            &camera,
            &settings,
        );
        let update = interaction.handle_event(
            PointerEvent::Down { pos: egui::pos2(500.0, 500.0), button: PointerButton::Secondary },
            &handles,
            &camera,
            &settings,
        );
        assert!(update.began.is_none());
        assert_eq!(interaction.target(), DragTarget::Handle(A));
    }
}
