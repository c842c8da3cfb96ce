use std::borrow::Cow;

use crate::foundation::error::{SceneError, SceneResult};
use crate::render::canvas::FontSpec;

/// Pixel size text is shaped at; callers scale the result by `font.size / REFERENCE_SIZE`.
pub const REFERENCE_SIZE: f32 = 64.0;

struct RegisteredFace {
    family: String,
    font: vello_cpu::peniko::FontData,
}

/// Single shaped line in reference-size pixels, origin at the top-left of the line box.
pub struct ShapedText {
    pub font: vello_cpu::peniko::FontData,
    pub glyphs: Vec<vello_cpu::Glyph>,
    pub width: f64,
}

/// Parley layout over explicitly registered font bytes. No system fonts are consulted.
pub struct TextEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<()>,
    faces: Vec<RegisteredFace>,
}

impl Default for TextEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TextEngine {
    pub fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
            faces: Vec::new(),
        }
    }

    /// Registers a font file and returns its family name.
    pub fn register_font(&mut self, font_bytes: Vec<u8>) -> SceneResult<String> {
        let families = self
            .font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(font_bytes.clone()), None);
        let family_id = families
            .first()
            .map(|(id, _)| *id)
            .ok_or_else(|| SceneError::render("no font families registered from font bytes"))?;

        let family = self
            .font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| SceneError::render("registered font family has no name"))?
            .to_string();

        let font = vello_cpu::peniko::FontData::new(vello_cpu::peniko::Blob::from(font_bytes), 0);
        tracing::debug!(family = %family, "registered font");
        self.faces.push(RegisteredFace {
            family: family.clone(),
            font,
        });
        Ok(family)
    }

    pub fn has_fonts(&self) -> bool {
        !self.faces.is_empty()
    }

    /// Exact family match (case-insensitive), otherwise the first registered face.
    fn resolve(&self, family: &str) -> SceneResult<&RegisteredFace> {
        self.faces
            .iter()
            .find(|f| f.family.eq_ignore_ascii_case(family))
            .or_else(|| self.faces.first())
            .ok_or_else(|| SceneError::render("no font registered for text rendering"))
    }

    pub fn shape(&mut self, text: &str, spec: &FontSpec) -> SceneResult<ShapedText> {
        let (family, font) = {
            let face = self.resolve(&spec.family)?;
            (face.family.clone(), face.font.clone())
        };

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(Cow::Owned(family)),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(REFERENCE_SIZE));
        if spec.bold {
            builder.push_default(parley::style::StyleProperty::FontWeight(
                parley::FontWeight::BOLD,
            ));
        }
        if spec.italic {
            builder.push_default(parley::style::StyleProperty::FontStyle(
                parley::FontStyle::Italic,
            ));
        }

        let mut layout: parley::Layout<()> = builder.build(text);
        layout.break_all_lines(None);

        let mut glyphs = Vec::new();
        let mut width = 0.0f64;
        for line in layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                let mut x = run.offset();
                let y = run.baseline();
                for g in run.glyphs() {
                    glyphs.push(vello_cpu::Glyph {
                        id: g.id,
                        x: x + g.x,
                        y: y - g.y,
                    });
                    x += g.advance;
                }
                width = width.max(f64::from(x));
            }
        }

        Ok(ShapedText {
            font,
            glyphs,
            width,
        })
    }
}
