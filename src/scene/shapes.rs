//! Geometric primitives and their local-space hit tests.
//!
//! Every test here receives a vector already transformed into the primitive's local frame.

use std::f64::consts::TAU;

use crate::assets::{Bitmap, ImageStatus, PendingLoad};
use crate::foundation::core::{BezPath, Point, Rect, Vec2};
use crate::foundation::error::{SceneError, SceneResult};
use crate::math::Vec3;
use crate::render::Canvas;
use crate::scene::node::NodeId;

const FULL_CIRCLE_EPS: f64 = 0.001;

/// Unit square centred at the origin, shared by rectangles and images.
pub const UNIT_SQUARE: Rect = Rect::new(-0.5, -0.5, 0.5, 0.5);

pub fn unit_square_contains(local: Vec3) -> bool {
    local.x.abs() <= 0.5 && local.y.abs() <= 0.5
}

/// Circle sector of radius 1 around the origin. Angles are stored in radians.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Circle {
    begin: f64,
    end: f64,
}

impl Default for Circle {
    fn default() -> Self {
        Self {
            begin: 0.0,
            end: TAU,
        }
    }
}

impl Circle {
    pub fn new(begin_deg: f64, end_deg: f64) -> SceneResult<Self> {
        let mut c = Self::default();
        c.set_begin_degrees(begin_deg)?;
        c.set_end_degrees(end_deg)?;
        Ok(c)
    }

    pub fn begin_degrees(&self) -> f64 {
        self.begin.to_degrees()
    }

    pub fn end_degrees(&self) -> f64 {
        self.end.to_degrees()
    }

    pub fn set_begin_degrees(&mut self, deg: f64) -> SceneResult<()> {
        self.begin = finite_radians("begin", deg)?;
        Ok(())
    }

    pub fn set_end_degrees(&mut self, deg: f64) -> SceneResult<()> {
        self.end = finite_radians("end", deg)?;
        Ok(())
    }

    /// `(begin, end)` wrapped into `[0, 2π)`.
    pub fn normalized(&self) -> (f64, f64) {
        (self.begin.rem_euclid(TAU), self.end.rem_euclid(TAU))
    }

    pub fn contains(&self, local: Vec3) -> bool {
        if local.x.abs() > 1.0 || local.y.abs() > 1.0 {
            return false;
        }
        let p = local.with_z(0.0);
        let l = p.length();
        if l == 0.0 {
            return true;
        }
        if l > 1.0 {
            return false;
        }
        if self.is_full() {
            return true;
        }

        let cos = Vec3::UNIT_X.dot(p.scaled(1.0 / l)).clamp(-1.0, 1.0);
        let mut alpha = cos.acos();
        if p.y < 0.0 {
            alpha = -alpha;
        }
        if alpha < 0.0 {
            alpha += TAU;
        }

        let (begin, end) = self.normalized();
        (begin < end && alpha >= begin && alpha <= end)
            || (begin > end && (alpha >= begin || alpha <= end))
    }

    /// Whether the stored span covers one full turn, whatever the start angle.
    pub fn is_full(&self) -> bool {
        ((self.end - self.begin).abs() - TAU).abs() <= FULL_CIRCLE_EPS
    }

    pub fn trace(&self, canvas: &mut dyn Canvas) {
        let (begin, end) = self.normalized();
        if self.is_full() {
            canvas.arc(Point::ORIGIN, 1.0, begin, begin + TAU, false);
            return;
        }
        canvas.move_to(Point::new(end.cos(), end.sin()));
        canvas.line_to(Point::ORIGIN);
        canvas.line_to(Point::new(begin.cos(), begin.sin()));
        canvas.arc(Point::ORIGIN, 1.0, begin, end, false);
    }
}

fn finite_radians(name: &str, deg: f64) -> SceneResult<f64> {
    if !deg.is_finite() {
        return Err(SceneError::validation(format!(
            "circle {name} must be finite, got {deg}"
        )));
    }
    Ok(deg.to_radians())
}

/// Closed polygon in local coordinates.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Polygon {
    vertices: Vec<Vec2>,
}

impl Polygon {
    pub fn new(vertices: Vec<Vec2>) -> SceneResult<Self> {
        if let Some(v) = vertices.iter().find(|v| !v.is_finite()) {
            return Err(SceneError::validation(format!(
                "polygon vertex must be finite, got ({}, {})",
                v.x, v.y
            )));
        }
        Ok(Self { vertices })
    }

    pub fn vertices(&self) -> &[Vec2] {
        &self.vertices
    }

    /// Crossing test with multiplicative sign accumulation. Boundary points are inside.
    pub fn contains(&self, local: Vec3) -> bool {
        let n = self.vertices.len();
        if n < 3 {
            return false;
        }
        let a = local.xy();
        let mut t = -1.0;
        for i in 0..n {
            let b = self.vertices[i];
            let c = self.vertices[(i + 1) % n];
            t *= test_edge(a, b, c);
            if t == 0.0 {
                break;
            }
        }
        t >= 0.0
    }

    pub fn trace(&self, canvas: &mut dyn Canvas) {
        let Some((first, rest)) = self.vertices.split_first() else {
            return;
        };
        canvas.move_to(first.to_point());
        for v in rest {
            canvas.line_to(v.to_point());
        }
        canvas.close_path();
    }
}

/// Classifies edge `b`-`c` against a horizontal ray from `a` towards +x.
///
/// Returns 0 when `a` lies on the edge, −1 when the ray crosses it, 1 otherwise.
pub fn test_edge(a: Vec2, b: Vec2, c: Vec2) -> f64 {
    if a.y == b.y && a.y == c.y {
        let (lo, hi) = if b.x <= c.x { (b.x, c.x) } else { (c.x, b.x) };
        return if lo <= a.x && a.x <= hi { 0.0 } else { 1.0 };
    }
    if a == b {
        return 0.0;
    }
    let (b, c) = if b.y > c.y { (c, b) } else { (b, c) };
    if a.y <= b.y || a.y > c.y {
        return 1.0;
    }
    let delta = (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x);
    if delta > 0.0 {
        -1.0
    } else if delta < 0.0 {
        1.0
    } else {
        0.0
    }
}

/// SVG path data, parsed once when set.
#[derive(Clone, Debug, Default)]
pub struct PathShape {
    data: String,
    path: BezPath,
}

impl PathShape {
    pub fn parse(data: &str) -> SceneResult<Self> {
        let path = BezPath::from_svg(data)
            .map_err(|e| SceneError::validation(format!("invalid path data \"{data}\": {e}")))?;
        Ok(Self {
            data: data.to_owned(),
            path,
        })
    }

    pub fn data(&self) -> &str {
        &self.data
    }

    pub fn path(&self) -> &BezPath {
        &self.path
    }
}

/// Bitmap-backed unit square.
#[derive(Debug, Default)]
pub struct ImageShape {
    pub(crate) source: String,
    pub(crate) status: ImageStatus,
    pub(crate) bitmap: Option<Bitmap>,
    pub(crate) pending: Option<PendingLoad>,
}

impl ImageShape {
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn status(&self) -> ImageStatus {
        self.status
    }

    pub fn bitmap(&self) -> Option<&Bitmap> {
        self.bitmap.as_ref()
    }

    /// Natural pixel size once the bitmap has loaded.
    pub fn original_size(&self) -> Option<(u32, u32)> {
        self.bitmap.as_ref().map(|b| (b.width, b.height))
    }
}

/// Probe registered at the node's world origin during the prepare pass.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Collider {
    pub(crate) collisions: Vec<NodeId>,
}

impl Collider {
    pub fn collisions(&self) -> &[NodeId] {
        &self.collisions
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/shapes.rs"]
mod tests;
