//! Orbit camera and orthographic projection.
//!
//! World points are rotated by yaw about the vertical (Y) axis and then by
//! pitch about the horizontal (X) axis, scaled to pixels and offset by the
//! viewport centre plus the pan. The rotation order lives only here.

use eframe::egui;
use nalgebra::{Matrix3, Vector3};

use crate::math::EPSILON;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    /// Flat view: no rotation, Z is dropped.
    Planar,
    /// Orbitable 3D view.
    Spatial,
}

impl ViewMode {
    pub fn is_3d(self) -> bool {
        matches!(self, ViewMode::Spatial)
    }
}

/// Clamp ranges applied whenever the camera is mutated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraLimits {
    pub min_scale: f32,
    pub max_scale: f32,
    pub pitch_limit: f32,
}

impl Default for CameraLimits {
    fn default() -> Self {
        Self {
            min_scale: 8.0,
            max_scale: 400.0,
            pitch_limit: std::f32::consts::FRAC_PI_2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraState {
    pub mode: ViewMode,
    /// Rotation about the vertical axis, radians.
    pub yaw: f32,
    /// Rotation about the horizontal axis, radians.
    pub pitch: f32,
    /// Pixels per world unit.
    pub scale: f32,
    /// Screen-space offset in pixels.
    pub pan: egui::Vec2,
}

impl CameraState {
    pub fn new(mode: ViewMode, yaw: f32, pitch: f32, scale: f32) -> Self {
        Self {
            mode,
            yaw,
            pitch,
            scale,
            pan: egui::Vec2::ZERO,
        }
    }

    pub fn planar(scale: f32) -> Self {
        Self::new(ViewMode::Planar, 0.0, 0.0, scale)
    }

    /// Yaw/pitch rotation, yaw applied first. Identity in planar mode.
    pub fn view_matrix(&self) -> Matrix3<f32> {
        if !self.mode.is_3d() {
            return Matrix3::identity();
        }
        let (sr, cr) = self.yaw.sin_cos();
        let (sp, cp) = self.pitch.sin_cos();
        Matrix3::new(
            cr, 0.0, sr,
            sr * sp, cp, -cr * sp,
            -sr * cp, sp, cr * cp,
        )
    }

    pub fn orbited(self, delta: egui::Vec2, sensitivity: f32, limits: &CameraLimits) -> Self {
        if !self.mode.is_3d() {
            return self;
        }
        let yaw = self.yaw + delta.x * sensitivity;
        let pitch = (self.pitch + delta.y * sensitivity).clamp(-limits.pitch_limit, limits.pitch_limit);
        if !yaw.is_finite() || !pitch.is_finite() {
            return self;
        }
        Self { yaw, pitch, ..self }
    }

    pub fn panned(self, delta: egui::Vec2) -> Self {
        let pan = self.pan + delta;
        if !pan.x.is_finite() || !pan.y.is_finite() {
            return self;
        }
        Self { pan, ..self }
    }

    /// Multiplicative zoom: positive `wheel` zooms in by `1 + step`, negative
    /// zooms out by the same factor.
    pub fn zoomed(self, wheel: f32, step: f32, limits: &CameraLimits) -> Self {
        if wheel == 0.0 || !wheel.is_finite() {
            return self;
        }
        let factor = if wheel > 0.0 { 1.0 + step } else { 1.0 / (1.0 + step) };
        let scale = (self.scale * factor).clamp(limits.min_scale, limits.max_scale);
        Self { scale, ..self }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub origin: egui::Pos2,
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            origin: egui::Pos2::ZERO,
            width,
            height,
        }
    }

    pub fn from_rect(rect: egui::Rect) -> Self {
        Self {
            origin: rect.min,
            width: rect.width(),
            height: rect.height(),
        }
    }

    pub fn center(&self) -> egui::Pos2 {
        self.origin + egui::vec2(self.width * 0.5, self.height * 0.5)
    }

    pub fn rect(&self) -> egui::Rect {
        egui::Rect::from_min_size(self.origin, egui::vec2(self.width, self.height))
    }
}

/// A projected point. `depth` grows away from the viewer and is only used
/// for ordering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenPoint {
    pub pos: egui::Pos2,
    pub depth: f32,
}

impl ScreenPoint {
    pub fn is_finite(&self) -> bool {
        self.pos.x.is_finite() && self.pos.y.is_finite() && self.depth.is_finite()
    }
}

pub fn project(world: &Vector3<f32>, camera: &CameraState, viewport: &Viewport) -> ScreenPoint {
    let point = match camera.mode {
        ViewMode::Planar => Vector3::new(world.x, world.y, 0.0),
        ViewMode::Spatial => *world,
    };
    let rotated = camera.view_matrix() * point;
    let center = viewport.center();

    ScreenPoint {
        pos: egui::pos2(
            center.x + camera.pan.x + rotated.x * camera.scale,
            center.y + camera.pan.y - rotated.y * camera.scale,
        ),
        depth: -rotated.z,
    }
}

/// Maps a pointer delta (pixels) to a world-space delta through the inverse
/// yaw rotation, so handles follow the pointer in the current view.
pub fn screen_delta_to_world(delta: egui::Vec2, camera: &CameraState) -> Vector3<f32> {
    if camera.scale <= EPSILON || !camera.scale.is_finite() {
        return Vector3::zeros();
    }
    let dx = delta.x / camera.scale;
    let dy = -delta.y / camera.scale;

    match camera.mode {
        ViewMode::Planar => Vector3::new(dx, dy, 0.0),
        ViewMode::Spatial => {
            let (s, c) = camera.yaw.sin_cos();
            Vector3::new(c * dx, dy, s * dx)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn spatial(yaw: f32, pitch: f32) -> CameraState {
        CameraState::new(ViewMode::Spatial, yaw, pitch, 50.0)
    }

    #[test]
    fn origin_lands_on_viewport_centre_plus_pan() {
        let viewport = Viewport::new(800.0, 600.0);
        let camera = spatial(0.3, 0.2).panned(egui::vec2(10.0, -5.0));
        let p = project(&Vector3::zeros(), &camera, &viewport);
        assert_abs_diff_eq!(p.pos.x, 410.0);
        assert_abs_diff_eq!(p.pos.y, 295.0);
    }

    #[test]
    fn screen_y_points_down() {
        let viewport = Viewport::new(200.0, 200.0);
        let p = project(&Vector3::new(1.0, 2.0, 0.0), &CameraState::planar(10.0), &viewport);
        assert_abs_diff_eq!(p.pos.x, 110.0);
        assert_abs_diff_eq!(p.pos.y, 80.0);
    }

    #[test]
    fn planar_mode_ignores_z() {
        let viewport = Viewport::new(200.0, 200.0);
        let camera = CameraState::planar(10.0);
        let flat = project(&Vector3::new(1.0, 1.0, 0.0), &camera, &viewport);
        let lifted = project(&Vector3::new(1.0, 1.0, 7.0), &camera, &viewport);
        assert_eq!(flat, lifted);
        assert_abs_diff_eq!(flat.depth, 0.0);
    }

    #[test]
    fn yaw_is_applied_before_pitch() {
        let viewport = Viewport::new(0.0, 0.0);
        let half_pi = std::f32::consts::FRAC_PI_2;
        // Yaw of 90 degrees swings +X onto the depth axis; pitch then tips it
        // straight up. Pitch first would leave it pointing into the screen.
        let p = project(&Vector3::x(), &spatial(half_pi, half_pi), &viewport);
        assert_abs_diff_eq!(p.pos.x, 0.0, epsilon = 1e-4);
        assert_abs_diff_eq!(p.pos.y, -50.0, epsilon = 1e-4);
        assert_abs_diff_eq!(p.depth, 0.0, epsilon = 1e-4);
    }

    #[test]
    fn nearer_points_have_smaller_depth() {
        let viewport = Viewport::new(100.0, 100.0);
        let camera = spatial(0.0, 0.0);
        let toward_viewer = project(&Vector3::new(0.0, 0.0, 1.0), &camera, &viewport);
        let away = project(&Vector3::new(0.0, 0.0, -1.0), &camera, &viewport);
        assert!(toward_viewer.depth < away.depth);
    }

    #[test]
    fn orbit_clamps_pitch() {
        let limits = CameraLimits::default();
        let camera = spatial(0.0, 0.0).orbited(egui::vec2(0.0, 10_000.0), 0.01, &limits);
        assert_abs_diff_eq!(camera.pitch, limits.pitch_limit);
    }

    #[test]
    fn zoom_is_multiplicative_and_clamped() {
        let limits = CameraLimits::default();
        let camera = spatial(0.0, 0.0);
        let zoomed_in = camera.zoomed(1.0, 0.1, &limits);
        assert_abs_diff_eq!(zoomed_in.scale, 55.0, epsilon = 1e-4);
        let round_trip = zoomed_in.zoomed(-1.0, 0.1, &limits);
        assert_abs_diff_eq!(round_trip.scale, 50.0, epsilon = 1e-4);

        let mut far = camera;
        for _ in 0..200 {
            far = far.zoomed(-1.0, 0.1, &limits);
        }
        assert_abs_diff_eq!(far.scale, limits.min_scale);
    }

    #[test]
    fn zero_pointer_motion_maps_to_no_world_motion() {
        let camera = spatial(1.2, -0.4);
        let viewport = Viewport::new(640.0, 480.0);
        let point = Vector3::new(1.0, -2.0, 0.5);
        let before = project(&point, &camera, &viewport);
        let moved = point + screen_delta_to_world(egui::Vec2::ZERO, &camera);
        assert_eq!(moved, point);
        assert_eq!(project(&moved, &camera, &viewport), before);
    }

    #[test]
    fn horizontal_drag_follows_screen_x_under_yaw() {
        let camera = spatial(0.8, 0.0);
        let viewport = Viewport::new(400.0, 400.0);
        let point = Vector3::new(0.5, 0.5, 0.5);
        let before = project(&point, &camera, &viewport);
        let after = project(&(point + screen_delta_to_world(egui::vec2(20.0, 0.0), &camera)), &camera, &viewport);
        assert_abs_diff_eq!(after.pos.x - before.pos.x, 20.0, epsilon = 1e-3);
        assert_abs_diff_eq!(after.pos.y - before.pos.y, 0.0, epsilon = 1e-3);
    }

    #[test]
    fn degenerate_scale_yields_zero_delta() {
        let mut camera = spatial(0.0, 0.0);
        camera.scale = 0.0;
        assert_eq!(screen_delta_to_world(egui::vec2(5.0, 5.0), &camera), Vector3::zeros());
    }
}
