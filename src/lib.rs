pub mod boxes;
pub mod config;
pub mod overlay;
pub mod stream;

// Re-export vision types for convenience
pub use facelens_vision::{
    aspect_fit, coordinator, crop, normalized, orientation, video, FaceBox, FaceDetector, Image,
    Insets, OverlayCoordinator, OverlayMode, Rect, Size,
};
