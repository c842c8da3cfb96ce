//! scene2d is a retained-mode 2D scene graph.
//!
//! A [`Scene`] owns a tree of nodes (groups, shapes, text, images and collision probes) laid
//! out in the scene square `[-1, 1]²`. A [`View`] binds the scene to a [`Canvas`] and turns
//! node changes into at most one repaint per host frame:
//!
//! - Mutate nodes through [`Scene`] setters; listeners observe every change
//! - Call [`View::pump`] once per event-loop turn
//! - Call [`View::on_frame`] when the requested frame callback fires
//!
//! [`CpuCanvas`] rasterizes on the CPU; [`RecordingCanvas`] records calls for tests.
#![forbid(unsafe_code)]

pub mod assets;
pub mod foundation;
pub mod math;
pub mod render;
pub mod scene;
pub mod view;

pub use crate::assets::{Bitmap, BitmapLoader, FsBitmapLoader, ImageStatus};
pub use crate::foundation::core::{Affine, BezPath, Color, Point, Rect, Vec2};
pub use crate::foundation::error::{SceneError, SceneResult};
pub use crate::math::{Matrix3, Vec3};
pub use crate::render::{
    Canvas, CpuCanvas, CpuCanvasOpts, DrawCommand, FontSpec, FrameRGBA, RecordingCanvas,
};
pub use crate::scene::{
    CollisionProbe, HorizontalAlignment, NodeId, NodeKind, Overflow, Property, Scene,
    SubscriptionId,
};
pub use crate::view::{
    FrameRequester, FrameStats, FrameToken, ManualFrames, Overlay, View, ViewOpts, Viewport,
};
