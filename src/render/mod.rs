pub mod canvas;
pub mod cpu;
pub mod recording;
pub mod text_engine;

pub use canvas::{Canvas, FontSpec};
pub use cpu::{CpuCanvas, CpuCanvasOpts, FrameRGBA};
pub use recording::{DrawCommand, RecordingCanvas};
pub use text_engine::TextEngine;
