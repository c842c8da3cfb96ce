//! Deterministic [`Canvas`] that records every call.
//!
//! Drawing calls capture the transform and paint state in effect, so tests can assert on
//! paint order and world placement without rasterizing.

use crate::assets::Bitmap;
use crate::foundation::core::{Affine, BezPath, Color, Point, Rect};
use crate::foundation::error::SceneResult;
use crate::render::canvas::{Canvas, FontSpec};

#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    Save,
    Restore,
    Transform(Affine),
    SetTransform(Affine),
    Clear,
    Flush,
    SetFill(Color),
    SetStroke(Color),
    SetLineWidth(f64),
    SetGlobalAlpha(f64),
    BeginPath,
    MoveTo(Point),
    LineTo(Point),
    ClosePath,
    Arc {
        center: Point,
        radius: f64,
        start: f64,
        end: f64,
        anticlockwise: bool,
    },
    Rect(Rect),
    AppendPath(BezPath),
    Fill {
        color: Color,
        alpha: f64,
        ctm: Affine,
    },
    Stroke {
        color: Color,
        line_width: f64,
        alpha: f64,
        ctm: Affine,
    },
    Clip,
    DrawImage {
        bitmap: u64,
        dst: Rect,
        alpha: f64,
        ctm: Affine,
    },
    SetFont(FontSpec),
    FillText {
        text: String,
        at: Point,
        ctm: Affine,
    },
    StrokeText {
        text: String,
        at: Point,
        ctm: Affine,
    },
}

#[derive(Clone, Debug)]
struct State {
    ctm: Affine,
    fill: Color,
    stroke: Color,
    line_width: f64,
    alpha: f64,
    font: FontSpec,
}

impl Default for State {
    fn default() -> Self {
        Self {
            ctm: Affine::IDENTITY,
            fill: Color::BLACK,
            stroke: Color::BLACK,
            line_width: 1.0,
            alpha: 1.0,
            font: FontSpec::default(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct RecordingCanvas {
    width: u32,
    height: u32,
    char_advance: f64,
    state: State,
    stack: Vec<State>,
    commands: Vec<DrawCommand>,
}

impl RecordingCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            char_advance: 0.5,
            state: State::default(),
            stack: Vec::new(),
            commands: Vec::new(),
        }
    }

    /// Advance of every character, in ems. Defaults to 0.5.
    pub fn with_char_advance(mut self, advance: f64) -> Self {
        self.char_advance = advance;
        self
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn take_commands(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Current transformation matrix.
    pub fn ctm(&self) -> Affine {
        self.state.ctm
    }

    /// Depth of the save stack.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Fill colours in paint order.
    pub fn fill_colors(&self) -> Vec<Color> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Fill { color, .. } => Some(*color),
                _ => None,
            })
            .collect()
    }
}

impl Canvas for RecordingCanvas {
    fn surface_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn resize(&mut self, width: u32, height: u32) -> SceneResult<()> {
        self.width = width;
        self.height = height;
        self.state = State::default();
        self.stack.clear();
        Ok(())
    }

    fn save(&mut self) {
        self.stack.push(self.state.clone());
        self.commands.push(DrawCommand::Save);
    }

    fn restore(&mut self) {
        if let Some(state) = self.stack.pop() {
            self.state = state;
        }
        self.commands.push(DrawCommand::Restore);
    }

    fn transform(&mut self, m: Affine) {
        self.state.ctm *= m;
        self.commands.push(DrawCommand::Transform(m));
    }

    fn set_transform(&mut self, m: Affine) {
        self.state.ctm = m;
        self.commands.push(DrawCommand::SetTransform(m));
    }

    fn clear(&mut self) {
        self.commands.push(DrawCommand::Clear);
    }

    fn flush(&mut self) -> SceneResult<()> {
        self.commands.push(DrawCommand::Flush);
        Ok(())
    }

    fn set_fill(&mut self, color: Color) {
        self.state.fill = color;
        self.commands.push(DrawCommand::SetFill(color));
    }

    fn set_stroke(&mut self, color: Color) {
        self.state.stroke = color;
        self.commands.push(DrawCommand::SetStroke(color));
    }

    fn set_line_width(&mut self, width: f64) {
        self.state.line_width = width;
        self.commands.push(DrawCommand::SetLineWidth(width));
    }

    fn set_global_alpha(&mut self, alpha: f64) {
        self.state.alpha = alpha;
        self.commands.push(DrawCommand::SetGlobalAlpha(alpha));
    }

    fn begin_path(&mut self) {
        self.commands.push(DrawCommand::BeginPath);
    }

    fn move_to(&mut self, p: Point) {
        self.commands.push(DrawCommand::MoveTo(p));
    }

    fn line_to(&mut self, p: Point) {
        self.commands.push(DrawCommand::LineTo(p));
    }

    fn close_path(&mut self) {
        self.commands.push(DrawCommand::ClosePath);
    }

    fn arc(&mut self, center: Point, radius: f64, start: f64, end: f64, anticlockwise: bool) {
        self.commands.push(DrawCommand::Arc {
            center,
            radius,
            start,
            end,
            anticlockwise,
        });
    }

    fn rect(&mut self, r: Rect) {
        self.commands.push(DrawCommand::Rect(r));
    }

    fn append_path(&mut self, path: &BezPath) {
        self.commands.push(DrawCommand::AppendPath(path.clone()));
    }

    fn fill(&mut self) {
        self.commands.push(DrawCommand::Fill {
            color: self.state.fill,
            alpha: self.state.alpha,
            ctm: self.state.ctm,
        });
    }

    fn stroke(&mut self) {
        self.commands.push(DrawCommand::Stroke {
            color: self.state.stroke,
            line_width: self.state.line_width,
            alpha: self.state.alpha,
            ctm: self.state.ctm,
        });
    }

    fn clip(&mut self) {
        self.commands.push(DrawCommand::Clip);
    }

    fn draw_image(&mut self, bitmap: &Bitmap, dst: Rect) {
        self.commands.push(DrawCommand::DrawImage {
            bitmap: bitmap.id,
            dst,
            alpha: self.state.alpha,
            ctm: self.state.ctm,
        });
    }

    fn set_font(&mut self, font: &FontSpec) {
        self.state.font = font.clone();
        self.commands.push(DrawCommand::SetFont(font.clone()));
    }

    fn measure_text(&mut self, text: &str) -> SceneResult<f64> {
        Ok(text.chars().count() as f64 * self.char_advance * self.state.font.size)
    }

    fn fill_text(&mut self, text: &str, at: Point) -> SceneResult<()> {
        self.commands.push(DrawCommand::FillText {
            text: text.to_owned(),
            at,
            ctm: self.state.ctm,
        });
        Ok(())
    }

    fn stroke_text(&mut self, text: &str, at: Point) -> SceneResult<()> {
        self.commands.push(DrawCommand::StrokeText {
            text: text.to_owned(),
            at,
            ctm: self.state.ctm,
        });
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/recording.rs"]
mod tests;
