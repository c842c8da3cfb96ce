use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use kurbo::{PathEl, Shape};

use crate::assets::Bitmap;
use crate::foundation::core::{Affine, BezPath, Color, Point, Rect, Vec2};
use crate::foundation::error::{SceneError, SceneResult};
use crate::render::canvas::{Canvas, FontSpec};
use crate::render::text_engine::{REFERENCE_SIZE, TextEngine};

#[derive(Clone, Debug)]
pub struct CpuCanvasOpts {
    /// Maximum arc flattening error, in device pixels.
    pub arc_tolerance: f64,
    /// Number of uploaded bitmaps kept alive between frames.
    pub image_cache_capacity: usize,
}

impl Default for CpuCanvasOpts {
    fn default() -> Self {
        let image_cache_capacity = std::env::var("SCENE2D_IMAGE_CACHE_CAPACITY")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|&n| n > 0)
            .unwrap_or(32);
        Self {
            arc_tolerance: 0.1,
            image_cache_capacity,
        }
    }
}

impl CpuCanvasOpts {
    pub fn with_arc_tolerance(mut self, tolerance: f64) -> Self {
        self.arc_tolerance = tolerance;
        self
    }

    pub fn with_image_cache_capacity(mut self, capacity: usize) -> Self {
        self.image_cache_capacity = capacity.max(1);
        self
    }
}

/// Readback of the surface.
#[derive(Clone, Debug)]
pub struct FrameRGBA {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    pub premultiplied: bool,
}

impl FrameRGBA {
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        let px = self.data.get(i..i + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }

    /// Straight-alpha copy, as image encoders expect.
    pub fn to_straight_rgba8(&self) -> Vec<u8> {
        let mut out = self.data.clone();
        if !self.premultiplied {
            return out;
        }
        for px in out.chunks_exact_mut(4) {
            let a = u16::from(px[3]);
            if a == 0 || a == 255 {
                continue;
            }
            for c in &mut px[..3] {
                *c = ((u16::from(*c) * 255 + a / 2) / a).min(255) as u8;
            }
        }
        out
    }
}

#[derive(Clone, Debug)]
struct State {
    ctm: Affine,
    fill: Color,
    stroke: Color,
    line_width: f64,
    alpha: f64,
    font: FontSpec,
    /// Clip layers pushed since the matching `save`.
    clips: usize,
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
            clips: 0,
        }
    }
}

/// Path under construction, with canvas current-point rules.
#[derive(Default)]
struct PathBuilder {
    path: BezPath,
    current: Option<Point>,
    start: Point,
    closed: bool,
}

impl PathBuilder {
    fn clear(&mut self) {
        *self = Self::default();
    }

    fn move_to(&mut self, p: Point) {
        self.path.move_to(p);
        self.current = Some(p);
        self.start = p;
        self.closed = false;
    }

    /// Starts a subpath if there is no open one. Returns false when `p` began a new subpath.
    fn ensure_subpath(&mut self, p: Point) -> bool {
        match self.current {
            None => {
                self.move_to(p);
                false
            }
            Some(_) if self.closed => {
                let start = self.start;
                self.move_to(start);
                true
            }
            Some(_) => true,
        }
    }

    fn line_to(&mut self, p: Point) {
        if self.ensure_subpath(p) {
            self.path.line_to(p);
            self.current = Some(p);
        }
    }

    fn quad_to(&mut self, p1: Point, p2: Point) {
        self.ensure_subpath(p1);
        self.path.quad_to(p1, p2);
        self.current = Some(p2);
    }

    fn curve_to(&mut self, p1: Point, p2: Point, p3: Point) {
        self.ensure_subpath(p1);
        self.path.curve_to(p1, p2, p3);
        self.current = Some(p3);
    }

    fn close(&mut self) {
        if self.current.is_some() && !self.closed {
            self.path.close_path();
            self.current = Some(self.start);
            self.closed = true;
        }
    }

    fn append(&mut self, path: &BezPath) {
        for el in path.elements() {
            match *el {
                PathEl::MoveTo(p) => self.move_to(p),
                PathEl::LineTo(p) => self.line_to(p),
                PathEl::QuadTo(p1, p2) => self.quad_to(p1, p2),
                PathEl::CurveTo(p1, p2, p3) => self.curve_to(p1, p2, p3),
                PathEl::ClosePath => self.close(),
            }
        }
    }

    fn is_empty(&self) -> bool {
        self.path.elements().is_empty()
    }
}

/// Sweep of a canvas-style arc, in radians. Positive sweeps run towards +y.
pub fn arc_sweep(start: f64, end: f64, anticlockwise: bool) -> f64 {
    use std::f64::consts::TAU;
    if anticlockwise {
        if start - end >= TAU {
            -TAU
        } else {
            -(start - end).rem_euclid(TAU)
        }
    } else if end - start >= TAU {
        TAU
    } else {
        (end - start).rem_euclid(TAU)
    }
}

/// [`Canvas`] rasterized on the CPU with `vello_cpu`.
pub struct CpuCanvas {
    width: u16,
    height: u16,
    opts: CpuCanvasOpts,
    ctx: vello_cpu::RenderContext,
    pixmap: vello_cpu::Pixmap,
    state: State,
    stack: Vec<State>,
    path: PathBuilder,
    image_cache: HashMap<u64, vello_cpu::Image>,
    image_lru: VecDeque<u64>,
    text: TextEngine,
}

impl CpuCanvas {
    pub fn new(width: u32, height: u32, opts: CpuCanvasOpts) -> SceneResult<Self> {
        let (width_u16, height_u16) = surface_dims(width, height)?;
        Ok(Self {
            width: width_u16,
            height: height_u16,
            opts,
            ctx: vello_cpu::RenderContext::new(width_u16, height_u16),
            pixmap: vello_cpu::Pixmap::new(width_u16, height_u16),
            state: State::default(),
            stack: Vec::new(),
            path: PathBuilder::default(),
            image_cache: HashMap::new(),
            image_lru: VecDeque::new(),
            text: TextEngine::new(),
        })
    }

    pub fn opts(&self) -> &CpuCanvasOpts {
        &self.opts
    }

    /// Registers font bytes for text drawing and returns the family name.
    pub fn register_font(&mut self, font_bytes: Vec<u8>) -> SceneResult<String> {
        self.text.register_font(font_bytes)
    }

    /// Copy of the surface as of the last `flush`.
    pub fn frame(&self) -> FrameRGBA {
        FrameRGBA {
            width: u32::from(self.width),
            height: u32::from(self.height),
            data: self.pixmap.data_as_u8_slice().to_vec(),
            premultiplied: true,
        }
    }

    fn set_user_transform(&mut self, m: Affine) {
        self.ctx.set_transform(affine_to_cpu(m));
        self.ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
    }

    /// Current colour with global alpha applied, or `None` when nothing would be drawn.
    fn effective(&self, color: Color) -> Option<vello_cpu::peniko::Color> {
        let c = color.with_alpha_mul(self.state.alpha);
        if c.is_transparent() {
            return None;
        }
        let [r, g, b, a] = c.to_rgba8();
        Some(vello_cpu::peniko::Color::from_rgba8(r, g, b, a))
    }

    fn image_paint_for(&mut self, bitmap: &Bitmap) -> SceneResult<vello_cpu::Image> {
        if let Some(paint) = self.image_cache.get(&bitmap.id).cloned() {
            self.touch(bitmap.id);
            return Ok(paint);
        }

        let pixmap = image_premul_bytes_to_pixmap(
            bitmap.rgba8_premul.as_slice(),
            bitmap.width,
            bitmap.height,
        )?;
        let paint = vello_cpu::Image {
            image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
            sampler: vello_cpu::peniko::ImageSampler::default(),
        };

        self.image_cache.insert(bitmap.id, paint.clone());
        self.touch(bitmap.id);
        while self.image_lru.len() > self.opts.image_cache_capacity.max(1) {
            if let Some(old) = self.image_lru.pop_front() {
                self.image_cache.remove(&old);
            }
        }
        Ok(paint)
    }

    fn touch(&mut self, key: u64) {
        if let Some(pos) = self.image_lru.iter().position(|x| *x == key) {
            self.image_lru.remove(pos);
        }
        self.image_lru.push_back(key);
    }

    /// Transform mapping reference-size glyph space to user space at `at`.
    fn text_transform(&self, at: Point) -> Affine {
        let s = self.state.font.size / f64::from(REFERENCE_SIZE);
        self.state.ctm * Affine::translate(at.to_vec2()) * Affine::scale(s)
    }
}

impl Canvas for CpuCanvas {
    fn surface_size(&self) -> (u32, u32) {
        (u32::from(self.width), u32::from(self.height))
    }

    fn resize(&mut self, width: u32, height: u32) -> SceneResult<()> {
        let (width, height) = surface_dims(width, height)?;
        self.width = width;
        self.height = height;
        self.ctx = vello_cpu::RenderContext::new(width, height);
        self.pixmap = vello_cpu::Pixmap::new(width, height);
        self.state = State::default();
        self.stack.clear();
        self.path = PathBuilder::default();
        Ok(())
    }

    fn save(&mut self) {
        let mut next = self.state.clone();
        next.clips = 0;
        self.stack.push(std::mem::replace(&mut self.state, next));
    }

    fn restore(&mut self) {
        let Some(prev) = self.stack.pop() else {
            tracing::warn!("restore without matching save");
            return;
        };
        for _ in 0..self.state.clips {
            self.ctx.pop_layer();
        }
        self.state = prev;
    }

    fn transform(&mut self, m: Affine) {
        self.state.ctm *= m;
    }

    fn set_transform(&mut self, m: Affine) {
        self.state.ctm = m;
    }

    fn clear(&mut self) {
        self.ctx.reset();
        self.state.clips = 0;
        for s in &mut self.stack {
            s.clips = 0;
        }
        self.pixmap.data_as_u8_slice_mut().fill(0);
    }

    fn flush(&mut self) -> SceneResult<()> {
        self.ctx.flush();
        self.ctx.render_to_pixmap(&mut self.pixmap);
        Ok(())
    }

    fn set_fill(&mut self, color: Color) {
        self.state.fill = color;
    }

    fn set_stroke(&mut self, color: Color) {
        self.state.stroke = color;
    }

    fn set_line_width(&mut self, width: f64) {
        self.state.line_width = width;
    }

    fn set_global_alpha(&mut self, alpha: f64) {
        self.state.alpha = alpha.clamp(0.0, 1.0);
    }

    fn begin_path(&mut self) {
        self.path.clear();
    }

    fn move_to(&mut self, p: Point) {
        self.path.move_to(p);
    }

    fn line_to(&mut self, p: Point) {
        self.path.line_to(p);
    }

    fn close_path(&mut self) {
        self.path.close();
    }

    fn arc(&mut self, center: Point, radius: f64, start: f64, end: f64, anticlockwise: bool) {
        let radius = radius.abs();
        let first = center + Vec2::from_angle(start) * radius;
        self.path.line_to(first);

        let arc = kurbo::Arc {
            center,
            radii: Vec2::new(radius, radius),
            start_angle: start,
            sweep_angle: arc_sweep(start, end, anticlockwise),
            x_rotation: 0.0,
        };
        let scale = self.state.ctm.determinant().abs().sqrt().max(1e-9);
        let tolerance = (self.opts.arc_tolerance / scale).max(1e-9);
        for el in arc.append_iter(tolerance) {
            match el {
                PathEl::LineTo(p) => self.path.line_to(p),
                PathEl::QuadTo(p1, p2) => self.path.quad_to(p1, p2),
                PathEl::CurveTo(p1, p2, p3) => self.path.curve_to(p1, p2, p3),
                PathEl::MoveTo(_) | PathEl::ClosePath => {}
            }
        }
    }

    fn rect(&mut self, r: Rect) {
        self.path.append(&r.to_path(0.1));
    }

    fn append_path(&mut self, path: &BezPath) {
        self.path.append(path);
    }

    fn fill(&mut self) {
        if self.path.is_empty() {
            return;
        }
        let Some(color) = self.effective(self.state.fill) else {
            return;
        };
        self.set_user_transform(self.state.ctm);
        self.ctx.set_paint(color);
        self.ctx.fill_path(&bezpath_to_cpu(&self.path.path));
    }

    fn stroke(&mut self) {
        if self.path.is_empty() || self.state.line_width <= 0.0 {
            return;
        }
        let Some(color) = self.effective(self.state.stroke) else {
            return;
        };
        self.set_user_transform(self.state.ctm);
        self.ctx
            .set_stroke(vello_cpu::kurbo::Stroke::new(self.state.line_width));
        self.ctx.set_paint(color);
        self.ctx.stroke_path(&bezpath_to_cpu(&self.path.path));
    }

    fn clip(&mut self) {
        self.set_user_transform(self.state.ctm);
        self.ctx.push_clip_layer(&bezpath_to_cpu(&self.path.path));
        self.state.clips += 1;
    }

    fn draw_image(&mut self, bitmap: &Bitmap, dst: Rect) {
        if bitmap.width == 0 || bitmap.height == 0 || self.state.alpha <= 0.0 {
            return;
        }
        let paint = match self.image_paint_for(bitmap) {
            Ok(paint) => paint,
            Err(err) => {
                tracing::warn!(bitmap = bitmap.id, error = %err, "skipping bitmap");
                return;
            }
        };
        let (w, h) = (f64::from(bitmap.width), f64::from(bitmap.height));
        let m = self.state.ctm
            * Affine::translate(dst.origin().to_vec2())
            * Affine::scale_non_uniform(dst.width() / w, dst.height() / h);

        self.set_user_transform(m);
        self.ctx.set_paint(paint);
        let alpha = self.state.alpha;
        if alpha < 1.0 {
            self.ctx.push_opacity_layer(alpha as f32);
        }
        self.ctx
            .fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, w, h));
        if alpha < 1.0 {
            self.ctx.pop_layer();
        }
    }

    fn set_font(&mut self, font: &FontSpec) {
        self.state.font = font.clone();
    }

    fn measure_text(&mut self, text: &str) -> SceneResult<f64> {
        if text.is_empty() {
            return Ok(0.0);
        }
        let shaped = self.text.shape(text, &self.state.font)?;
        Ok(shaped.width / f64::from(REFERENCE_SIZE) * self.state.font.size)
    }

    fn fill_text(&mut self, text: &str, at: Point) -> SceneResult<()> {
        if text.is_empty() {
            return Ok(());
        }
        let Some(color) = self.effective(self.state.fill) else {
            return Ok(());
        };
        let shaped = self.text.shape(text, &self.state.font)?;
        self.set_user_transform(self.text_transform(at));
        self.ctx.set_paint(color);
        self.ctx
            .glyph_run(&shaped.font)
            .font_size(REFERENCE_SIZE)
            .fill_glyphs(shaped.glyphs.into_iter());
        Ok(())
    }

    fn stroke_text(&mut self, text: &str, at: Point) -> SceneResult<()> {
        if text.is_empty() || self.state.line_width <= 0.0 || self.state.font.size <= 0.0 {
            return Ok(());
        }
        let Some(color) = self.effective(self.state.stroke) else {
            return Ok(());
        };
        let shaped = self.text.shape(text, &self.state.font)?;
        let width = self.state.line_width * f64::from(REFERENCE_SIZE) / self.state.font.size;
        self.set_user_transform(self.text_transform(at));
        self.ctx.set_stroke(vello_cpu::kurbo::Stroke::new(width));
        self.ctx.set_paint(color);
        self.ctx
            .glyph_run(&shaped.font)
            .font_size(REFERENCE_SIZE)
            .stroke_glyphs(shaped.glyphs.into_iter());
        Ok(())
    }
}

fn surface_dims(width: u32, height: u32) -> SceneResult<(u16, u16)> {
    let w: u16 = width
        .try_into()
        .map_err(|_| SceneError::render("surface width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| SceneError::render("surface height exceeds u16"))?;
    if w == 0 || h == 0 {
        return Err(SceneError::render("surface must be at least 1x1"));
    }
    Ok((w, h))
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn point_to_cpu(p: Point) -> vello_cpu::kurbo::Point {
    vello_cpu::kurbo::Point::new(p.x, p.y)
}

fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(point_to_cpu(p)),
            PathEl::LineTo(p) => out.line_to(point_to_cpu(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(point_to_cpu(p1), point_to_cpu(p2)),
            PathEl::CurveTo(p1, p2, p3) => {
                out.curve_to(point_to_cpu(p1), point_to_cpu(p2), point_to_cpu(p3));
            }
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

fn image_premul_bytes_to_pixmap(
    rgba8_premul: &[u8],
    width: u32,
    height: u32,
) -> SceneResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| SceneError::render("bitmap width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| SceneError::render("bitmap height exceeds u16"))?;
    if rgba8_premul.len() != width as usize * height as usize * 4 {
        return Err(SceneError::render("bitmap byte length mismatch"));
    }

    let mut may_have_opacities = false;
    let mut pixels = Vec::with_capacity(width as usize * height as usize);
    for px in rgba8_premul.chunks_exact(4) {
        let a = px[3];
        may_have_opacities |= a != 255;
        pixels.push(vello_cpu::peniko::color::PremulRgba8 {
            r: px[0],
            g: px[1],
            b: px[2],
            a,
        });
    }

    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels,
        w,
        h,
        may_have_opacities,
    ))
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
