pub mod aspect_fit;
pub mod coordinator;
pub mod crop;
pub mod detector;
pub mod error;
pub mod geometry;
pub mod model;
pub mod normalized;
pub mod orientation;
pub mod video;
pub mod yunet;

// Re-export commonly used types
pub use aspect_fit::Transform;
pub use coordinator::{OverlayCoordinator, OverlayMode};
pub use detector::FaceDetector;
pub use error::{DetectorError, GeometryError};
pub use geometry::{FaceBox, Insets, Rect, Size};
pub use orientation::{Image, Orientation};
pub use video::{Camera, Frame, FrameSource};
pub use yunet::YunetDetector;
