//! Depth-sorted render queue and the drawing helpers that feed it.
//!
//! Draw calls are deferred: each helper projects its geometry, then submits
//! one or more paint closures tagged with a depth key. [`RenderQueue::flush`]
//! runs them furthest-first, which is enough ordering for thin wireframes and
//! arrows without a depth buffer.

use std::panic::{self, AssertUnwindSafe};

use eframe::egui;
use nalgebra::{Matrix2, Matrix3, Vector2, Vector3};

use crate::camera::ScreenPoint;
use crate::error::DrawError;
use crate::math::{
    best_parallelogram_basis, cross, determinant3x3, lift2, rank_approx, sample_unit_sphere, transformed_unit_area,
};
use crate::sim::{RiemannCell, ScalarField};

/// Depth used for vectors and handles the user manipulates. Smaller than any
/// real depth, so they are painted last and never hidden by grid lines.
pub const HANDLE_DEPTH: f32 = -1.0e6;

/// Depth for overlay text that should sit above everything else.
pub const LABEL_DEPTH: f32 = -2.0e6;

pub const X_COLOR: egui::Color32 = egui::Color32::from_rgb(0x83, 0xB3, 0x66);
pub const Y_COLOR: egui::Color32 = egui::Color32::from_rgb(0xFF, 0x71, 0x54);
pub const Z_COLOR: egui::Color32 = egui::Color32::from_rgb(0x8B, 0xC9, 0xD7);

type PaintFn<'a, T> = Box<dyn FnOnce(&T) -> Result<(), DrawError> + 'a>;

pub struct RenderCommand<'a, T> {
    pub depth: f32,
    paint: PaintFn<'a, T>,
}

/// Outcome of one [`RenderQueue::flush`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FlushReport {
    pub drawn: usize,
    pub failed: usize,
}

pub struct RenderQueue<'a, T> {
    commands: Vec<RenderCommand<'a, T>>,
}

impl<'a, T> Default for RenderQueue<'a, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, T> RenderQueue<'a, T> {
    pub fn new() -> Self {
        Self { commands: Vec::new() }
    }

    pub fn submit(&mut self, depth: f32, paint: impl FnOnce(&T) -> Result<(), DrawError> + 'a) {
        let depth = if depth.is_nan() { f32::MAX } else { depth };
        self.commands.push(RenderCommand {
            depth,
            paint: Box::new(paint),
        });
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Sorts furthest-first and paints everything queued so far. A command
    /// that errors or panics is logged and skipped; the rest still run.
    pub fn flush(&mut self, target: &T) -> FlushReport {
        let mut commands = std::mem::take(&mut self.commands);
        // Stable: equal depths keep submission order.
        commands.sort_by(|a, b| b.depth.total_cmp(&a.depth));

        log::trace!(target: "vectorlab", "flushing {} draw commands", commands.len());

        let mut report = FlushReport::default();
        for command in commands {
            let RenderCommand { depth, paint } = command;
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| paint(target)))
                .unwrap_or_else(|payload| Err(DrawError::Panicked(panic_message(payload.as_ref()))));

            match outcome {
                Ok(()) => report.drawn += 1,
                Err(err) => {
                    log::warn!(target: "vectorlab", "skipping draw command at depth {depth}: {err}");
                    report.failed += 1;
                }
            }
        }
        report
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_owned()
    }
}

pub type PainterQueue<'a> = RenderQueue<'a, egui::Painter>;

fn checked(p: ScreenPoint, what: &'static str) -> Result<egui::Pos2, DrawError> {
    if p.is_finite() {
        Ok(p.pos)
    } else {
        Err(DrawError::NonFinite(what))
    }
}

fn mean_depth(points: &[ScreenPoint]) -> f32 {
    if points.is_empty() {
        return 0.0;
    }
    points.iter().map(|p| p.depth).sum::<f32>() / points.len() as f32
}

/// Shaft plus a triangular head sized relative to the shaft length.
pub fn paint_arrow(
    painter: &egui::Painter,
    start: egui::Pos2,
    end: egui::Pos2,
    color: egui::Color32,
) -> Result<(), DrawError> {
    if !(start.x.is_finite() && start.y.is_finite() && end.x.is_finite() && end.y.is_finite()) {
        return Err(DrawError::NonFinite("arrow"));
    }
    let vec = end - start;
    let len = vec.length();
    if len < 1.0 {
        return Ok(());
    }

    painter.line_segment([start, end], egui::Stroke::new(2.5, color));

    let head_len = (len * 0.15).clamp(5.0, 15.0);
    let dir = vec / len;
    let perp = egui::vec2(-dir.y, dir.x) * (head_len * 0.4);
    let base = end - dir * head_len;

    painter.add(egui::Shape::convex_polygon(
        vec![end, base + perp, base - perp],
        color,
        egui::Stroke::NONE,
    ));
    Ok(())
}

pub fn queue_segment<'a>(
    queue: &mut PainterQueue<'a>,
    project: &impl Fn(&Vector3<f32>) -> ScreenPoint,
    a: Vector3<f32>,
    b: Vector3<f32>,
    stroke: egui::Stroke,
) {
    let (pa, pb) = (project(&a), project(&b));
    queue.submit(mean_depth(&[pa, pb]), move |painter| {
        painter.line_segment([checked(pa, "segment")?, checked(pb, "segment")?], stroke);
        Ok(())
    });
}

/// Arrow from `from` to `to`, ordered by its midpoint depth.
pub fn queue_arrow<'a>(
    queue: &mut PainterQueue<'a>,
    project: &impl Fn(&Vector3<f32>) -> ScreenPoint,
    from: Vector3<f32>,
    to: Vector3<f32>,
    color: egui::Color32,
) {
    let (pa, pb) = (project(&from), project(&to));
    queue.submit(mean_depth(&[pa, pb]), move |painter| {
        paint_arrow(painter, checked(pa, "arrow")?, checked(pb, "arrow")?, color)
    });
}

/// Arrow for a user-controlled vector, always painted above the scene.
pub fn queue_handle_arrow<'a>(
    queue: &mut PainterQueue<'a>,
    project: &impl Fn(&Vector3<f32>) -> ScreenPoint,
    from: Vector3<f32>,
    to: Vector3<f32>,
    color: egui::Color32,
) {
    let (pa, pb) = (project(&from), project(&to));
    queue.submit(HANDLE_DEPTH, move |painter| {
        let tip = checked(pb, "handle arrow")?;
        paint_arrow(painter, checked(pa, "handle arrow")?, tip, color)?;
        painter.circle_stroke(tip, 6.0, egui::Stroke::new(1.0, color));
        Ok(())
    });
}

pub fn queue_point<'a>(
    queue: &mut PainterQueue<'a>,
    project: &impl Fn(&Vector3<f32>) -> ScreenPoint,
    at: Vector3<f32>,
    radius: f32,
    color: egui::Color32,
    depth: Option<f32>,
) {
    let p = project(&at);
    queue.submit(depth.unwrap_or(p.depth), move |painter| {
        painter.circle_filled(checked(p, "point")?, radius, color);
        Ok(())
    });
}

pub fn queue_polygon<'a>(
    queue: &mut PainterQueue<'a>,
    project: &impl Fn(&Vector3<f32>) -> ScreenPoint,
    corners: &[Vector3<f32>],
    fill: egui::Color32,
    stroke: egui::Stroke,
) {
    let projected: Vec<ScreenPoint> = corners.iter().map(|c| project(c)).collect();
    let depth = mean_depth(&projected);
    queue.submit(depth, move |painter| {
        if projected.len() < 3 {
            return Err(DrawError::Degenerate(format!("polygon with {} corners", projected.len())));
        }
        let points = projected
            .iter()
            .map(|p| checked(*p, "polygon"))
            .collect::<Result<Vec<_>, _>>()?;
        painter.add(egui::Shape::convex_polygon(points, fill, stroke));
        Ok(())
    });
}

pub fn queue_polyline<'a>(
    queue: &mut PainterQueue<'a>,
    project: &impl Fn(&Vector3<f32>) -> ScreenPoint,
    points: &[Vector3<f32>],
    stroke: egui::Stroke,
) {
    for pair in points.windows(2) {
        queue_segment(queue, project, pair[0], pair[1], stroke);
    }
}

pub fn queue_label<'a>(
    queue: &mut PainterQueue<'a>,
    project: &impl Fn(&Vector3<f32>) -> ScreenPoint,
    at: Vector3<f32>,
    text: String,
    color: egui::Color32,
) {
    let p = project(&at);
    queue.submit(LABEL_DEPTH, move |painter| {
        painter.text(
            checked(p, "label")?,
            egui::Align2::CENTER_CENTER,
            text,
            egui::FontId::proportional(14.0),
            color,
        );
        Ok(())
    });
}

/// Grid lines of the basis `m`. In 3D all three coordinate planes are drawn.
pub fn queue_grid<'a>(
    queue: &mut PainterQueue<'a>,
    project: &impl Fn(&Vector3<f32>) -> ScreenPoint,
    m: &Matrix3<f32>,
    color: egui::Color32,
    size: i32,
    spatial: bool,
) {
    let stroke = egui::Stroke::new(1.0, color);
    let s = size as f32;

    for i in -size..=size {
        let t = i as f32;
        // XY plane
        queue_segment(queue, project, m * Vector3::new(t, -s, 0.0), m * Vector3::new(t, s, 0.0), stroke);
        queue_segment(queue, project, m * Vector3::new(-s, t, 0.0), m * Vector3::new(s, t, 0.0), stroke);

        if spatial {
            // XZ plane
            queue_segment(queue, project, m * Vector3::new(t, 0.0, -s), m * Vector3::new(t, 0.0, s), stroke);
            queue_segment(queue, project, m * Vector3::new(-s, 0.0, t), m * Vector3::new(s, 0.0, t), stroke);
            // YZ plane
            queue_segment(queue, project, m * Vector3::new(0.0, t, -s), m * Vector3::new(0.0, t, s), stroke);
            queue_segment(queue, project, m * Vector3::new(0.0, -s, t), m * Vector3::new(0.0, s, t), stroke);
        }
    }
}

pub fn queue_axes<'a>(
    queue: &mut PainterQueue<'a>,
    project: &impl Fn(&Vector3<f32>) -> ScreenPoint,
    extent: f32,
    spatial: bool,
) {
    let colors = [X_COLOR, Y_COLOR, Z_COLOR];
    let axes = if spatial { 3 } else { 2 };
    for (i, color) in colors.iter().enumerate().take(axes) {
        let mut start = Vector3::zeros();
        let mut end = Vector3::zeros();
        start[i] = -extent;
        end[i] = extent;
        queue_segment(queue, project, start, end, egui::Stroke::new(1.0, color.linear_multiply(0.5)));
    }
}

/// Image of the unit cube under `m`, faces tinted by orientation.
pub fn queue_unit_cube<'a>(
    queue: &mut PainterQueue<'a>,
    project: &impl Fn(&Vector3<f32>) -> ScreenPoint,
    m: &Matrix3<f32>,
    draw_volume: bool,
) {
    let det = determinant3x3(m);
    let fill = if det >= 0.0 {
        egui::Color32::from_rgba_unmultiplied(120, 80, 200, 40)
    } else {
        egui::Color32::from_rgba_unmultiplied(200, 80, 80, 40)
    };
    let stroke = egui::Stroke::new(1.5, egui::Color32::from_rgba_unmultiplied(200, 150, 255, 180));

    let corners = [
        Vector3::new(0., 0., 0.), Vector3::new(1., 0., 0.), Vector3::new(1., 1., 0.), Vector3::new(0., 1., 0.),
        Vector3::new(0., 0., 1.), Vector3::new(1., 0., 1.), Vector3::new(1., 1., 1.), Vector3::new(0., 1., 1.),
    ]
    .map(|v| m * v);

    let faces = [[0, 1, 2, 3], [4, 5, 6, 7], [0, 4, 7, 3], [1, 5, 6, 2], [0, 1, 5, 4], [3, 2, 6, 7]];
    for face in faces {
        let quad: Vec<Vector3<f32>> = face.iter().map(|&i| corners[i]).collect();
        queue_polygon(queue, project, &quad, fill, egui::Stroke::NONE);
    }

    let edges = [[0, 1], [1, 2], [2, 3], [3, 0], [4, 5], [5, 6], [6, 7], [7, 4], [0, 4], [1, 5], [2, 6], [3, 7]];
    for [a, b] in edges {
        queue_segment(queue, project, corners[a], corners[b], stroke);
    }

    if draw_volume && det.abs() > 0.001 {
        queue_label(
            queue,
            project,
            m * Vector3::new(0.5, 0.5, 0.5),
            format!("Vol: {:.2}", det.abs()),
            egui::Color32::WHITE,
        );
    }
}

/// Cube, parallelogram or segment depending on how far `m` collapses space.
pub fn queue_determinant_geometry<'a>(
    queue: &mut PainterQueue<'a>,
    project: &impl Fn(&Vector3<f32>) -> ScreenPoint,
    m: &Matrix3<f32>,
) {
    match rank_approx(m, 1e-6) {
        3 => queue_unit_cube(queue, project, m, true),
        2 => {
            let (a, b) = best_parallelogram_basis(m);
            let signed_area = cross(&a, &b).z;
            let fill = if signed_area >= 0.0 {
                egui::Color32::from_rgba_unmultiplied(120, 200, 120, 60)
            } else {
                egui::Color32::from_rgba_unmultiplied(200, 80, 80, 60)
            };
            queue_polygon(
                queue,
                project,
                &[Vector3::zeros(), a, a + b, b],
                fill,
                egui::Stroke::new(1.5, egui::Color32::WHITE),
            );
        }
        1 => {
            let (a, _) = best_parallelogram_basis(m);
            let v = if a.norm() > 0.0 { a } else { m.column(0).into_owned() };
            queue_segment(queue, project, Vector3::zeros(), v, egui::Stroke::new(2.5, egui::Color32::LIGHT_RED));
        }
        _ => queue_point(queue, project, Vector3::zeros(), 4.0, egui::Color32::LIGHT_RED, None),
    }
}

pub fn eigen_color(lambda: f32) -> egui::Color32 {
    if lambda.abs() <= 0.001 {
        egui::Color32::from_rgb(100, 150, 255)
    } else if lambda > 0.0 {
        egui::Color32::from_rgb(120, 255, 160)
    } else {
        egui::Color32::from_rgb(220, 80, 80)
    }
}

/// Full lines through the origin along each eigen-direction.
pub fn queue_eigen_rays<'a>(
    queue: &mut PainterQueue<'a>,
    project: &impl Fn(&Vector3<f32>) -> ScreenPoint,
    rays: &[(Vector3<f32>, f32)],
    length: f32,
) {
    for (v, lambda) in rays {
        let dir = crate::math::normalize(v) * length;
        let stroke = egui::Stroke::new((lambda.abs() * 2.0).clamp(1.5, 4.0), eigen_color(*lambda));
        queue_segment(queue, project, -dir, dir, stroke);
    }
}

/// Unit sphere pushed through `m`, coloured by how radial the displacement is.
pub fn queue_unit_sphere<'a>(
    queue: &mut PainterQueue<'a>,
    project: &impl Fn(&Vector3<f32>) -> ScreenPoint,
    m: &Matrix3<f32>,
) {
    for p in sample_unit_sphere(18, 36) {
        let mp = m * p;
        let delta = mp - p;

        let radial = delta.dot(&p).abs();
        let tangent = (delta - p * delta.dot(&p)).norm();
        let t = (radial / (radial + tangent + 1e-6)).clamp(0.0, 1.0);

        // red -> yellow -> green
        let color = egui::Color32::from_rgb(
            (255.0 * (1.0 - t.powi(2))) as u8,
            (255.0 * t.powi(2)) as u8,
            80,
        );
        queue_point(queue, project, mp, 2.0, color, None);
    }
}

/// Short strokes showing where `m` pushes each lattice point of the XY plane.
pub fn queue_flow_field<'a>(
    queue: &mut PainterQueue<'a>,
    project: &impl Fn(&Vector3<f32>) -> ScreenPoint,
    m: &Matrix3<f32>,
    spacing: f32,
    extent: i32,
) {
    let stroke = egui::Stroke::new(1.2, egui::Color32::from_rgba_unmultiplied(200, 200, 200, 120));
    for ix in -extent..=extent {
        for iy in -extent..=extent {
            let v = Vector3::new(ix as f32 * spacing, iy as f32 * spacing, 0.0);
            let dir = m * v - v;
            if dir.norm() < 0.01 {
                continue;
            }
            let end = v + dir.normalize() * spacing * 0.8;
            queue_segment(queue, project, v, end, stroke);
        }
    }
}

/// Grid on the horizontal (XZ) ground plane, used under surface plots.
pub fn queue_ground_grid<'a>(
    queue: &mut PainterQueue<'a>,
    project: &impl Fn(&Vector3<f32>) -> ScreenPoint,
    extent: f32,
    divisions: u32,
    color: egui::Color32,
) {
    let stroke = egui::Stroke::new(1.0, color);
    let divisions = divisions.max(1);
    for i in 0..=divisions {
        let t = -extent + 2.0 * extent * i as f32 / divisions as f32;
        queue_segment(queue, project, Vector3::new(t, 0.0, -extent), Vector3::new(t, 0.0, extent), stroke);
        queue_segment(queue, project, Vector3::new(-extent, 0.0, t), Vector3::new(extent, 0.0, t), stroke);
    }
}

/// Wireframe of `y = f(x, z)` over `[-range, range]^2`. Samples that are not
/// finite break the line instead of drawing through them.
pub fn queue_surface<'a>(
    queue: &mut PainterQueue<'a>,
    project: &impl Fn(&Vector3<f32>) -> ScreenPoint,
    field: &impl ScalarField,
    range: f32,
    steps: usize,
    color: egui::Color32,
) {
    let steps = steps.max(1);
    let stroke = egui::Stroke::new(1.0, color);
    let at = |i: usize, j: usize| {
        let x = -range + 2.0 * range * i as f32 / steps as f32;
        let z = -range + 2.0 * range * j as f32 / steps as f32;
        Vector3::new(x, field.value(x, z), z)
    };

    for i in 0..=steps {
        for j in 0..=steps {
            let p = at(i, j);
            if !crate::math::is_finite(&p) {
                continue;
            }
            for q in [(i + 1, j), (i, j + 1)] {
                if q.0 > steps || q.1 > steps {
                    continue;
                }
                let next = at(q.0, q.1);
                if crate::math::is_finite(&next) {
                    queue_segment(queue, project, p, next, stroke);
                }
            }
        }
    }
}

/// Square column standing on the ground plane, one per Riemann cell.
pub fn queue_column<'a>(
    queue: &mut PainterQueue<'a>,
    project: &impl Fn(&Vector3<f32>) -> ScreenPoint,
    cell: &RiemannCell,
    fill: egui::Color32,
    edge: egui::Stroke,
) {
    let h = cell.size * 0.5;
    let (cx, cz) = (cell.center.x, cell.center.y);
    let base = [
        Vector3::new(cx - h, 0.0, cz - h),
        Vector3::new(cx + h, 0.0, cz - h),
        Vector3::new(cx + h, 0.0, cz + h),
        Vector3::new(cx - h, 0.0, cz + h),
    ];
    let top = base.map(|p| p + Vector3::new(0.0, cell.height, 0.0));

    queue_polygon(queue, project, &top, fill, edge);
    for k in 0..4 {
        let n = (k + 1) % 4;
        queue_polygon(queue, project, &[base[k], base[n], top[n], top[k]], fill, egui::Stroke::NONE);
    }
}

/// Image of the unit square under a planar map, tinted by orientation.
pub fn queue_unit_square<'a>(
    queue: &mut PainterQueue<'a>,
    project: &impl Fn(&Vector3<f32>) -> ScreenPoint,
    m: &Matrix2<f32>,
) {
    let i_hat = lift2(&(m * Vector2::x()));
    let j_hat = lift2(&(m * Vector2::y()));
    let fill = if transformed_unit_area(m) >= 0.0 {
        egui::Color32::from_rgba_unmultiplied(120, 200, 120, 60)
    } else {
        egui::Color32::from_rgba_unmultiplied(200, 80, 80, 60)
    };
    queue_polygon(
        queue,
        project,
        &[Vector3::zeros(), i_hat, i_hat + j_hat, j_hat],
        fill,
        egui::Stroke::new(1.0, egui::Color32::WHITE),
    );
}
