//! Text primitive: greedy line breaking and aligned painting.
//!
//! Text is laid out in local units with a 1-unit em; the node's scale sizes it.

use serde::Deserialize;

use crate::foundation::core::{Point, Rect};
use crate::foundation::error::SceneResult;
use crate::render::{Canvas, FontSpec};

/// Line advance, in ems.
pub const LINE_HEIGHT: f64 = 1.2;

const ELLIPSIS: &str = "...";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HorizontalAlignment {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Overflow {
    #[default]
    Clip,
    Ellipsis,
    Wrap,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TextLine {
    pub text: String,
    pub width: f64,
    pub height: f64,
}

#[derive(Clone, Debug)]
pub struct TextShape {
    text: String,
    font_family: String,
    bold: bool,
    italic: bool,
    alignment: HorizontalAlignment,
    overflow: Overflow,
    width: f64,
    layout: Option<Vec<TextLine>>,
}

impl Default for TextShape {
    fn default() -> Self {
        Self {
            text: String::new(),
            font_family: "Sans-Serif".to_owned(),
            bold: false,
            italic: false,
            alignment: HorizontalAlignment::Left,
            overflow: Overflow::Clip,
            width: -1.0,
            layout: None,
        }
    }
}

impl TextShape {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn font_family(&self) -> &str {
        &self.font_family
    }

    pub fn bold(&self) -> bool {
        self.bold
    }

    pub fn italic(&self) -> bool {
        self.italic
    }

    pub fn alignment(&self) -> HorizontalAlignment {
        self.alignment
    }

    pub fn overflow(&self) -> Overflow {
        self.overflow
    }

    /// Layout width in ems; non-positive means unbounded.
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Cached lines from the last render, if still valid.
    pub fn layout(&self) -> Option<&[TextLine]> {
        self.layout.as_deref()
    }

    pub fn font(&self) -> FontSpec {
        FontSpec {
            family: self.font_family.clone(),
            bold: self.bold,
            italic: self.italic,
            size: 1.0,
        }
    }

    pub(crate) fn set_text(&mut self, text: String) {
        self.text = text;
        self.layout = None;
    }

    pub(crate) fn set_font_family(&mut self, family: String) {
        self.font_family = family;
        self.layout = None;
    }

    pub(crate) fn set_bold(&mut self, bold: bool) {
        self.bold = bold;
        self.layout = None;
    }

    pub(crate) fn set_italic(&mut self, italic: bool) {
        self.italic = italic;
        self.layout = None;
    }

    pub(crate) fn set_alignment(&mut self, alignment: HorizontalAlignment) {
        self.alignment = alignment;
    }

    pub(crate) fn set_overflow(&mut self, overflow: Overflow) {
        self.overflow = overflow;
        self.layout = None;
    }

    pub(crate) fn set_width(&mut self, width: f64) {
        self.width = width;
        self.layout = None;
    }

    /// Left edge of a line of `line_width` ems.
    pub fn aligned_x(&self, line_width: f64) -> f64 {
        match self.alignment {
            HorizontalAlignment::Left => 0.0,
            HorizontalAlignment::Center => (self.width - line_width) / 2.0,
            HorizontalAlignment::Right => self.width - line_width,
        }
    }

    fn compute_layout(&self, canvas: &mut dyn Canvas) -> SceneResult<Vec<TextLine>> {
        let mut measure = |s: &str| canvas.measure_text(s);
        match self.overflow {
            Overflow::Wrap => layout_lines(&self.text, self.width, &mut measure),
            Overflow::Clip => layout_lines(&self.text, -1.0, &mut measure),
            Overflow::Ellipsis => {
                let ellipsis_width = measure(ELLIPSIS)?;
                let mut lines =
                    layout_lines(&self.text, self.width - ellipsis_width, &mut measure)?;
                lines.truncate(1);
                if let Some(first) = lines.first_mut() {
                    first.text.push_str(ELLIPSIS);
                    first.width = measure(&first.text)?;
                }
                Ok(lines)
            }
        }
    }

    /// Paints the text in local space. The caller has already applied the node transform
    /// and paint state.
    pub(crate) fn render(&mut self, canvas: &mut dyn Canvas, stroke: bool) -> SceneResult<()> {
        canvas.set_font(&self.font());
        if self.layout.is_none() {
            self.layout = Some(self.compute_layout(canvas)?);
        }
        let Some(lines) = self.layout.as_deref() else {
            return Ok(());
        };

        if self.overflow == Overflow::Clip && self.width > 0.0 {
            let height: f64 = lines.iter().map(|l| l.height).sum();
            canvas.begin_path();
            canvas.rect(Rect::new(0.0, 0.0, self.width, height));
            canvas.clip();
        }

        let mut y = 0.0;
        for line in lines {
            let at = Point::new(self.aligned_x(line.width), y);
            canvas.fill_text(&line.text, at)?;
            if stroke {
                canvas.stroke_text(&line.text, at)?;
            }
            y += line.height;
        }
        Ok(())
    }
}

/// Greedy line breaking. Breaks on `\n` and, when `width > 0`, before the character that
/// would make the line wider than `width`, preferring the last space or hyphen.
pub fn layout_lines(
    text: &str,
    width: f64,
    measure: &mut dyn FnMut(&str) -> SceneResult<f64>,
) -> SceneResult<Vec<TextLine>> {
    let mut lines = Vec::new();
    let mut line: Vec<char> = Vec::new();
    let mut may_break_after = 0usize;

    for c in text.chars().chain(std::iter::once('\n')) {
        if matches!(c, ' ' | '-' | '\n') {
            may_break_after = line.len();
        }

        let overflows = c != '\n' && width > 0.0 && {
            let candidate: String = line.iter().chain(std::iter::once(&c)).collect();
            measure(&candidate)? > width
        };

        if c == '\n' || overflows {
            let split = if may_break_after > 0 {
                (may_break_after + 1).min(line.len())
            } else {
                line.len()
            };
            let tail = line.split_off(split);
            let head: String = line.iter().collect();
            let head = head.trim_end_matches(' ').to_owned();
            let head_width = measure(&head)?;
            lines.push(TextLine {
                text: head,
                width: head_width,
                height: LINE_HEIGHT,
            });

            line = tail;
            if c != ' ' && c != '\n' {
                line.push(c);
            }
            may_break_after = 0;
        } else {
            line.push(c);
        }
    }

    Ok(lines)
}

#[cfg(test)]
#[path = "../../tests/unit/scene/text.rs"]
mod tests;
