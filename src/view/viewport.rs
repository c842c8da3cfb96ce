use crate::foundation::core::{Affine, Point, Vec2};

/// Maps the scene square `[-1, 1]²` onto a pixel surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    width: u32,
    height: u32,
    bbox: Option<(f64, f64)>,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            bbox: None,
        }
    }

    /// Size pointer coordinates are measured against, when it differs from the pixel size
    /// (CSS pixels on a HiDPI surface, for example).
    pub fn with_bbox(mut self, width: f64, height: f64) -> Self {
        self.bbox = Some((width, height));
        self
    }

    pub fn set_bbox(&mut self, bbox: Option<(f64, f64)>) {
        self.bbox = bbox;
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    pub fn bbox(&self) -> (f64, f64) {
        self.bbox
            .unwrap_or((f64::from(self.width), f64::from(self.height)))
    }

    pub fn scene_matrix(&self) -> Affine {
        let hw = f64::from(self.width) / 2.0;
        let hh = f64::from(self.height) / 2.0;
        Affine::new([hw, 0.0, 0.0, hh, hw, hh])
    }

    /// Pointer position to scene coordinates; `None` for an empty bounding box.
    pub fn surface_point_to_scene(&self, x: f64, y: f64) -> Option<Vec2> {
        let (w, h) = self.bbox();
        if w <= 0.0 || h <= 0.0 {
            return None;
        }
        Some(Vec2::new(-1.0 + 2.0 * x / w, -1.0 + 2.0 * y / h))
    }

    pub fn scene_point_to_surface(&self, p: Vec2) -> Point {
        self.scene_matrix() * p.to_point()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/view/viewport.rs"]
mod tests;
