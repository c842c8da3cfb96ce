pub mod driver;
pub mod scheduler;
pub mod viewport;

pub use driver::{FrameStats, Overlay, View, ViewOpts};
pub use scheduler::{FrameRequester, FrameScheduler, FrameState, FrameToken, ManualFrames};
pub use viewport::Viewport;
