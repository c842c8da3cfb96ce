use crate::assets::Bitmap;
use crate::foundation::core::{Affine, BezPath, Color, Point, Rect};
use crate::foundation::error::SceneResult;

/// Font request. `size` is in user units of the current transform.
#[derive(Clone, Debug, PartialEq)]
pub struct FontSpec {
    pub family: String,
    pub bold: bool,
    pub italic: bool,
    pub size: f64,
}

impl Default for FontSpec {
    fn default() -> Self {
        Self {
            family: "Sans-Serif".to_owned(),
            bold: false,
            italic: false,
            size: 1.0,
        }
    }
}

/// Immediate-mode 2D drawing surface with a save/restore state stack.
///
/// State covered by `save`/`restore`: transform, fill, stroke, line width, global alpha, font
/// and clip. The current path is not part of the state.
pub trait Canvas {
    /// Surface size in pixels.
    fn surface_size(&self) -> (u32, u32);
    /// Reallocates the surface. Drawing state is reset.
    fn resize(&mut self, width: u32, height: u32) -> SceneResult<()>;

    fn save(&mut self);
    fn restore(&mut self);

    /// Post-multiplies the current transform.
    fn transform(&mut self, m: Affine);
    /// Replaces the current transform.
    fn set_transform(&mut self, m: Affine);

    /// Clears every pixel to transparent, ignoring transform and clip.
    fn clear(&mut self);
    /// Makes everything drawn so far visible on the surface.
    fn flush(&mut self) -> SceneResult<()>;

    fn set_fill(&mut self, color: Color);
    fn set_stroke(&mut self, color: Color);
    fn set_line_width(&mut self, width: f64);
    fn set_global_alpha(&mut self, alpha: f64);

    fn begin_path(&mut self);
    fn move_to(&mut self, p: Point);
    fn line_to(&mut self, p: Point);
    fn close_path(&mut self);
    /// Circular arc from `start` to `end` radians; connects from the current point.
    fn arc(&mut self, center: Point, radius: f64, start: f64, end: f64, anticlockwise: bool);
    fn rect(&mut self, r: Rect);
    fn append_path(&mut self, path: &BezPath);

    fn fill(&mut self);
    fn stroke(&mut self);
    /// Intersects the clip with the current path.
    fn clip(&mut self);

    /// Draws `bitmap` stretched over `dst` in user space.
    fn draw_image(&mut self, bitmap: &Bitmap, dst: Rect);

    fn set_font(&mut self, font: &FontSpec);
    /// Advance width of `text` in user units.
    fn measure_text(&mut self, text: &str) -> SceneResult<f64>;
    /// `at` is the top-left of the line box.
    fn fill_text(&mut self, text: &str, at: Point) -> SceneResult<()>;
    fn stroke_text(&mut self, text: &str, at: Point) -> SceneResult<()>;
}
