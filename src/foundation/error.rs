/// Convenience result type used across scene2d.
pub type SceneResult<T> = Result<T, SceneError>;

/// Top-level error taxonomy used by scene, view and canvas APIs.
#[derive(thiserror::Error, Debug)]
pub enum SceneError {
    /// Invalid attribute values, unknown node handles or illegal tree edits.
    #[error("validation error: {0}")]
    Validation(String),

    /// Numerical failures such as inverting a singular matrix.
    #[error("geometry error: {0}")]
    Geometry(String),

    /// Bitmap resources that could not be read or decoded.
    #[error("asset error: {0}")]
    Asset(String),

    /// Drawing-surface failures.
    #[error("render error: {0}")]
    Render(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SceneError {
    /// Build a [`SceneError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`SceneError::Geometry`] value.
    pub fn geometry(msg: impl Into<String>) -> Self {
        Self::Geometry(msg.into())
    }

    /// Build a [`SceneError::Asset`] value.
    pub fn asset(msg: impl Into<String>) -> Self {
        Self::Asset(msg.into())
    }

    /// Build a [`SceneError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
