use thiserror::Error;

/// Structural failures of the geometry engine. These apply to a whole call,
/// never to a single face.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GeometryError {
    #[error("invalid dimensions {width}x{height}: both components must be non-zero")]
    InvalidDimensions { width: f64, height: f64 },

    #[error("could not render {width}x{height} image upright")]
    RenderFailure { width: u32, height: u32 },
}

#[derive(Debug, Error)]
pub enum DetectorError {
    #[error("detector input image is empty")]
    EmptyInput,

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}
