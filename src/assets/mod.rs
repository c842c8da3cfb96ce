pub mod decode;
pub mod loader;

pub use decode::{Bitmap, decode_image};
pub use loader::{BitmapLoader, FsBitmapLoader, ImageStatus, PendingLoad};
