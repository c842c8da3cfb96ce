use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::foundation::error::{SceneError, SceneResult};

static NEXT_BITMAP_ID: AtomicU64 = AtomicU64::new(1);

/// Decoded raster, premultiplied RGBA8, row-major.
///
/// `id` is unique per decoded bitmap so canvases can cache their own upload of it.
#[derive(Clone, Debug)]
pub struct Bitmap {
    pub id: u64,
    pub width: u32,
    pub height: u32,
    pub rgba8_premul: Arc<Vec<u8>>,
}

impl Bitmap {
    pub fn from_premul_rgba8(width: u32, height: u32, rgba8_premul: Vec<u8>) -> SceneResult<Self> {
        if rgba8_premul.len() != width as usize * height as usize * 4 {
            return Err(SceneError::asset(format!(
                "bitmap byte length {} does not match {width}x{height}",
                rgba8_premul.len()
            )));
        }
        Ok(Self {
            id: NEXT_BITMAP_ID.fetch_add(1, Ordering::Relaxed),
            width,
            height,
            rgba8_premul: Arc::new(rgba8_premul),
        })
    }

    /// Single-colour bitmap, mostly for tests and demos.
    pub fn solid(width: u32, height: u32, rgba8: [u8; 4]) -> SceneResult<Self> {
        let mut px = rgba8;
        premultiply_rgba8_in_place(&mut px);
        let data = px
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 4)
            .collect();
        Self::from_premul_rgba8(width, height, data)
    }
}

pub fn decode_image(bytes: &[u8]) -> SceneResult<Bitmap> {
    let dyn_img = image::load_from_memory(bytes)
        .map_err(|e| SceneError::asset(format!("decode image from memory: {e}")))?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);

    Bitmap::from_premul_rgba8(width, height, rgba8_premul)
}

fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
