use std::time::{Duration, Instant};

use crate::foundation::core::{Color, Rect, Vec2};
use crate::foundation::error::{SceneError, SceneResult};
use crate::math::Matrix3;
use crate::render::Canvas;
use crate::scene::{NodeId, Scene};
use crate::view::scheduler::{FrameRequester, FrameScheduler, FrameState, FrameToken};
use crate::view::viewport::Viewport;

/// View settings, loadable from JSON.
#[derive(Clone, Debug, PartialEq, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ViewOpts {
    /// Painted over the whole scene square after clearing. `None` leaves the surface
    /// transparent.
    pub background: Option<Color>,
    /// Resolve collider probes before painting.
    pub resolve_probes: bool,
}

impl Default for ViewOpts {
    fn default() -> Self {
        Self {
            background: None,
            resolve_probes: true,
        }
    }
}

impl ViewOpts {
    pub fn from_json_str(s: &str) -> SceneResult<Self> {
        serde_json::from_str(s)
            .map_err(|e| SceneError::validation(format!("invalid view options: {e}")))
    }

    pub fn with_background(mut self, background: Color) -> Self {
        self.background = Some(background);
        self
    }

    pub fn with_resolve_probes(mut self, resolve_probes: bool) -> Self {
        self.resolve_probes = resolve_probes;
        self
    }
}

/// Drawing run after the scene on every frame, in scene coordinates.
pub type Overlay = Box<dyn FnMut(&mut dyn Canvas) -> SceneResult<()>>;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub frames_requested: u64,
    pub frames_rendered: u64,
    pub stale_frames: u64,
    pub probes_resolved: u64,
    pub last_frame_duration: Duration,
}

/// Binds a scene to a canvas and repaints it once per requested frame.
///
/// Hosts call [`View::pump`] once per event-loop turn and [`View::on_frame`] when the frame
/// callback they were asked for fires.
pub struct View<C: Canvas> {
    canvas: C,
    scene: Option<Scene>,
    viewport: Viewport,
    opts: ViewOpts,
    scheduler: FrameScheduler,
    stats: FrameStats,
    overlays: Vec<Overlay>,
}

impl<C: Canvas> std::fmt::Debug for View<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("View")
            .field("scene", &self.scene)
            .field("viewport", &self.viewport)
            .field("opts", &self.opts)
            .field("scheduler", &self.scheduler)
            .field("stats", &self.stats)
            .field("overlays", &self.overlays.len())
            .finish_non_exhaustive()
    }
}

impl<C: Canvas> View<C> {
    pub fn new(canvas: C, requester: impl FrameRequester + 'static) -> Self {
        let (width, height) = canvas.surface_size();
        Self {
            canvas,
            scene: None,
            viewport: Viewport::new(width, height),
            opts: ViewOpts::default(),
            scheduler: FrameScheduler::new(requester),
            stats: FrameStats::default(),
            overlays: Vec::new(),
        }
    }

    pub fn with_opts(mut self, opts: ViewOpts) -> Self {
        self.opts = opts;
        self
    }

    pub fn opts(&self) -> &ViewOpts {
        &self.opts
    }

    pub fn canvas(&self) -> &C {
        &self.canvas
    }

    pub fn canvas_mut(&mut self) -> &mut C {
        &mut self.canvas
    }

    pub fn scene(&self) -> Option<&Scene> {
        self.scene.as_ref()
    }

    /// Mutations made through this borrow are picked up by the next [`View::pump`].
    pub fn scene_mut(&mut self) -> Option<&mut Scene> {
        self.scene.as_mut()
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    pub fn frame_state(&self) -> FrameState {
        self.scheduler.state()
    }

    /// Installs `scene` (or none) and requests a fresh frame. Returns the previous scene.
    pub fn set_scene(&mut self, scene: Option<Scene>) -> Option<Scene> {
        let previous = std::mem::replace(&mut self.scene, scene);
        match self.scene.as_mut() {
            Some(scene) => {
                scene.take_dirty();
                self.request_fresh_frame();
            }
            None => self.scheduler.cancel(),
        }
        previous
    }

    pub fn resize(&mut self, width: u32, height: u32) -> SceneResult<()> {
        self.canvas.resize(width, height)?;
        self.viewport.resize(width, height);
        if self.scene.is_some() {
            self.request_fresh_frame();
        }
        Ok(())
    }

    pub fn set_bbox(&mut self, bbox: Option<(f64, f64)>) {
        self.viewport.set_bbox(bbox);
    }

    /// Adds a drawing painted over the scene, in insertion order, and requests a frame.
    pub fn add_overlay(
        &mut self,
        overlay: impl FnMut(&mut dyn Canvas) -> SceneResult<()> + 'static,
    ) {
        self.overlays.push(Box::new(overlay));
        self.invalidate();
    }

    pub fn clear_overlays(&mut self) {
        if !self.overlays.is_empty() {
            self.overlays.clear();
            self.invalidate();
        }
    }

    fn request_fresh_frame(&mut self) {
        let token = self.scheduler.supersede();
        self.stats.frames_requested += 1;
        tracing::debug!(token = token.0, "frame superseded");
    }

    /// Requests a repaint without any node having changed.
    pub fn invalidate(&mut self) {
        if self.scheduler.invalidate() {
            self.stats.frames_requested += 1;
        }
    }

    /// Applies finished image loads, then turns pending scene changes into at most one frame
    /// request. Returns the number of images that finished loading.
    pub fn pump(&mut self) -> usize {
        let completed = self
            .scene
            .as_mut()
            .map(Scene::poll_images)
            .unwrap_or(0);
        self.sync_invalidation();
        completed
    }

    fn sync_invalidation(&mut self) {
        let dirty = self.scene.as_mut().is_some_and(Scene::take_dirty);
        if dirty {
            self.invalidate();
        }
    }

    /// Host callback for a requested frame. Returns whether a frame was drawn.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn on_frame(&mut self, token: FrameToken) -> SceneResult<bool> {
        if !self.scheduler.begin_frame(token) {
            self.stats.stale_frames += 1;
            tracing::warn!(token = token.0, "ignoring stale frame callback");
            return Ok(false);
        }
        let result = self.render_frame();
        self.sync_invalidation();
        result.map(|()| true)
    }

    /// Runs the prepare pass, resolves collider probes and paints the scene.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn render_frame(&mut self) -> SceneResult<()> {
        let started = Instant::now();
        let Some(scene) = self.scene.as_mut() else {
            return Ok(());
        };
        scene.take_dirty();
        let root = scene.root();
        if !scene.entity(root)?.visible() {
            return Ok(());
        }

        if self.opts.resolve_probes {
            let mut probes = Vec::new();
            scene.prepare(root, &Matrix3::IDENTITY, &mut probes);
            for probe in &probes {
                let hits = scene.collisions_with(root, probe.vector);
                let changed = scene.deliver_collisions(probe.target, hits)?;
                tracing::debug!(collider = %probe.target, changed, "probe resolved");
            }
            self.stats.probes_resolved += probes.len() as u64;
        }

        let canvas = &mut self.canvas;
        canvas.set_transform(self.viewport.scene_matrix());
        canvas.clear();
        if let Some(background) = self.opts.background {
            canvas.save();
            canvas.set_fill(background);
            canvas.set_global_alpha(1.0);
            canvas.begin_path();
            canvas.rect(Rect::new(-1.0, -1.0, 1.0, 1.0));
            canvas.fill();
            canvas.restore();
        }
        scene.render(canvas, root)?;
        for overlay in &mut self.overlays {
            canvas.save();
            let drawn = overlay(canvas);
            canvas.restore();
            drawn?;
        }
        canvas.flush()?;

        self.stats.frames_rendered += 1;
        self.stats.last_frame_duration = started.elapsed();
        Ok(())
    }

    /// Pointer position on the surface to scene coordinates. `None` without a scene.
    pub fn surface_point_to_scene(&self, x: f64, y: f64) -> Option<Vec2> {
        self.scene.as_ref()?;
        self.viewport.surface_point_to_scene(x, y)
    }

    /// Nodes under a surface pixel, in paint order.
    pub fn hit_test_surface(&self, x: f64, y: f64) -> Vec<NodeId> {
        match (self.scene.as_ref(), self.surface_point_to_scene(x, y)) {
            (Some(scene), Some(p)) => scene.hit_test(p),
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/view/driver.rs"]
mod tests;
