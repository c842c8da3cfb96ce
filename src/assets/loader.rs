use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};

use crate::assets::decode::{Bitmap, decode_image};
use crate::foundation::error::{SceneError, SceneResult};

/// Load state of an image node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ImageStatus {
    #[default]
    Empty,
    Loading,
    Success,
    Error,
}

/// Resolves an image source string to a decoded bitmap. Runs on the rayon pool.
pub trait BitmapLoader: Send + Sync {
    fn load(&self, source: &str) -> SceneResult<Bitmap>;
}

impl<F> BitmapLoader for F
where
    F: Fn(&str) -> SceneResult<Bitmap> + Send + Sync,
{
    fn load(&self, source: &str) -> SceneResult<Bitmap> {
        self(source)
    }
}

/// Reads sources as paths relative to `root`.
#[derive(Clone, Debug)]
pub struct FsBitmapLoader {
    root: PathBuf,
}

impl FsBitmapLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl BitmapLoader for FsBitmapLoader {
    fn load(&self, source: &str) -> SceneResult<Bitmap> {
        let rel = normalize_rel_path(source)?;
        let path = self.root.join(Path::new(&rel));
        let bytes = std::fs::read(&path).map_err(|e| {
            SceneError::asset(format!("read bitmap bytes from '{}': {e}", path.display()))
        })?;
        decode_image(&bytes)
    }
}

/// Normalize a loader-relative source path.
///
/// The result uses `/` separators and has no `.` segments. Absolute paths and `..` are rejected.
pub fn normalize_rel_path(source: &str) -> SceneResult<String> {
    let s = source.replace('\\', "/");
    if s.starts_with('/') {
        return Err(SceneError::asset("image sources must be relative"));
    }
    if s.is_empty() {
        return Err(SceneError::asset("image source must be non-empty"));
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(SceneError::asset("image sources must not contain '..'"));
        }
        out.push(part);
    }

    if out.is_empty() {
        return Err(SceneError::asset("image source must contain a file name"));
    }

    Ok(out.join("/"))
}

/// In-flight load. Dropping it discards the result.
#[derive(Debug)]
pub struct PendingLoad {
    rx: Receiver<SceneResult<Bitmap>>,
}

impl PendingLoad {
    pub fn spawn(loader: Arc<dyn BitmapLoader>, source: String) -> Self {
        let (tx, rx) = mpsc::channel();
        rayon::spawn(move || {
            // The receiver may already be gone if the source was replaced.
            let _ = tx.send(loader.load(&source));
        });
        Self { rx }
    }

    /// Non-blocking poll.
    pub fn try_take(&self) -> Option<SceneResult<Bitmap>> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(disconnected())),
        }
    }

    pub fn wait(&self) -> SceneResult<Bitmap> {
        self.rx.recv().map_err(|_| disconnected())?
    }
}

fn disconnected() -> SceneError {
    SceneError::asset("bitmap loader exited without a result")
}

#[cfg(test)]
#[path = "../../tests/unit/assets/loader.rs"]
mod tests;
