//! Per-viewport state: camera, handle registry and the active gesture.

use nalgebra::{Vector2, Vector3};

use crate::camera::{project, CameraState, ScreenPoint, ViewMode, Viewport};
use crate::config::LabConfig;
use crate::interaction::{HandleId, HandleRegistry, Interaction, InteractionSettings, InteractionUpdate, PointerEvent};

pub struct Scene {
    camera: CameraState,
    home: CameraState,
    viewport: Viewport,
    interaction: Interaction,
    handles: HandleRegistry,
    settings: InteractionSettings,
}

impl Scene {
    pub fn new(config: &LabConfig, mode: ViewMode) -> Self {
        let home = home_camera(config, mode);
        Self {
            camera: home,
            home,
            viewport: Viewport::new(800.0, 600.0),
            interaction: Interaction::default(),
            handles: HandleRegistry::new(),
            settings: config.interaction_settings(),
        }
    }

    pub fn camera(&self) -> &CameraState {
        &self.camera
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn interaction(&self) -> &Interaction {
        &self.interaction
    }

    /// Switches between planar and spatial views. The camera returns to its
    /// starting pose for the new mode and any gesture is dropped.
    pub fn set_mode(&mut self, mode: ViewMode, config: &LabConfig) {
        if self.camera.mode == mode {
            return;
        }
        self.home = home_camera(config, mode);
        self.camera = self.home;
        self.interaction = Interaction::default();
    }

    pub fn reset_camera(&mut self) {
        self.camera = self.home;
    }

    /// Snaps orientation, keeping zoom and pan.
    pub fn set_view(&mut self, yaw: f32, pitch: f32) {
        if !self.camera.mode.is_3d() {
            return;
        }
        let limit = self.settings.limits.pitch_limit;
        self.camera.yaw = yaw;
        self.camera.pitch = pitch.clamp(-limit, limit);
    }

    pub fn project(&self, p: &Vector3<f32>) -> ScreenPoint {
        project(p, &self.camera, &self.viewport)
    }

    /// Owned projection closure for the draw helpers.
    pub fn projector(&self) -> impl Fn(&Vector3<f32>) -> ScreenPoint {
        let camera = self.camera;
        let viewport = self.viewport;
        move |p| project(p, &camera, &viewport)
    }

    /// Replaces this frame's handles with `handles` at their world positions.
    pub fn register_handles(&mut self, handles: &[(HandleId, Vector3<f32>)]) {
        self.handles.clear();
        for (id, world) in handles {
            let screen = self.project(world);
            self.handles.register(*id, screen.pos);
        }
    }

    pub fn handles(&self) -> &HandleRegistry {
        &self.handles
    }

    /// Feeds a pointer event through the gesture state machine and applies
    /// any camera change.
    pub fn handle_event(&mut self, event: PointerEvent) -> InteractionUpdate {
        let update = self
            .interaction
            .handle_event(event, &self.handles, &self.camera, &self.settings);
        self.camera = update.camera;
        update
    }
}

fn home_camera(config: &LabConfig, mode: ViewMode) -> CameraState {
    match mode {
        ViewMode::Planar => CameraState::planar(config.camera.initial_scale),
        ViewMode::Spatial => CameraState::new(
            ViewMode::Spatial,
            config.camera.initial_yaw,
            config.camera.initial_pitch,
            config.camera.initial_scale,
        ),
    }
}

/// Converts a handle's world delta into motion on the ground (XZ) plane.
///
/// Horizontal pointer motion already lands on the plane; vertical motion
/// arrives as world Y and is turned into motion away from or toward the
/// viewer. Returns `(dx, dz)`.
pub fn ground_plane_delta(delta: &Vector3<f32>, camera: &CameraState) -> Vector2<f32> {
    let (s, c) = camera.yaw.sin_cos();
    Vector2::new(delta.x + s * delta.y, delta.z - c * delta.y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interaction::{DragTarget, PointerButton};
    use approx::assert_abs_diff_eq;
    use eframe::egui;

    fn planar_scene() -> Scene {
        let mut scene = Scene::new(&LabConfig::default(), ViewMode::Planar);
        scene.set_viewport(Viewport::new(400.0, 400.0));
        scene
    }

    #[test]
    fn registered_handles_are_hit_at_their_projection() {
        let mut scene = planar_scene();
        let tip = Vector3::new(1.0, 1.0, 0.0);
        scene.register_handles(&[(HandleId("tip"), tip)]);
        let screen = scene.project(&tip).pos;

        let update = scene.handle_event(PointerEvent::Down { pos: screen + egui::vec2(3.0, -2.0), button: PointerButton::Primary });
        assert_eq!(update.began, Some(DragTarget::Handle(HandleId("tip"))));

        let update = scene.handle_event(PointerEvent::Move { pos: screen + egui::vec2(63.0, -2.0) });
        let (id, delta) = update.handle_delta.expect("handle moved");
        assert_eq!(id, HandleId("tip"));
        assert_abs_diff_eq!(delta, Vector3::new(1.0, 0.0, 0.0), epsilon = 1e-5);
    }

    #[test]
    fn pan_changes_camera_and_reset_restores_it() {
        let mut scene = planar_scene();
        scene.handle_event(PointerEvent::Down { pos: egui::pos2(10.0, 10.0), button: PointerButton::Primary });
        scene.handle_event(PointerEvent::Move { pos: egui::pos2(30.0, 15.0) });
        assert_eq!(scene.camera().pan, egui::vec2(20.0, 5.0));
        scene.handle_event(PointerEvent::Up);
        scene.reset_camera();
        assert_eq!(scene.camera().pan, egui::Vec2::ZERO);
    }

    #[test]
    fn mode_switch_drops_gesture() {
        let config = LabConfig::default();
        let mut scene = planar_scene();
        scene.handle_event(PointerEvent::Down { pos: egui::pos2(10.0, 10.0), button: PointerButton::Primary });
        assert!(scene.interaction().is_dragging());
        scene.set_mode(ViewMode::Spatial, &config);
        assert!(!scene.interaction().is_dragging());
        assert_eq!(scene.camera().yaw, config.camera.initial_yaw);
    }

    #[test]
    fn ground_delta_follows_yaw() {
        let camera = CameraState::new(ViewMode::Spatial, 0.0, 0.3, 50.0);
        let d = ground_plane_delta(&Vector3::new(0.5, 0.0, 0.0), &camera);
        assert_abs_diff_eq!(d, Vector2::new(0.5, 0.0), epsilon = 1e-6);
        let d = ground_plane_delta(&Vector3::new(0.0, 1.0, 0.0), &camera);
        assert_abs_diff_eq!(d, Vector2::new(0.0, -1.0), epsilon = 1e-6);
    }
}
