use crate::aspect_fit;
use crate::crop;
use crate::error::GeometryError;
use crate::geometry::{FaceBox, Insets, Rect, Size};
use crate::normalized;
use crate::orientation::Image;

/// Where the overlay boxes are going to be drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OverlayMode {
    /// A still photo shown aspect-fit inside a view of `viewport` size.
    Still { image: Size, viewport: Size },
    /// A live frame of `frame` pixels shown in a preview layer at `preview`.
    Live { frame: Size, preview: Rect },
}

/// Turns one detection pass into display rectangles and padded crops.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayCoordinator {
    pub padding: Insets,
    /// Size of the screen the padding was authored against.
    pub display: Size,
}

impl OverlayCoordinator {
    pub fn new(padding: Insets, display: Size) -> Self {
        Self { padding, display }
    }

    /// One display rect per face, in detection order.
    pub fn overlay_rects(
        &self,
        faces: &[FaceBox],
        mode: OverlayMode,
    ) -> Result<Vec<Rect>, GeometryError> {
        if faces.is_empty() {
            return Ok(Vec::new());
        }

        match mode {
            OverlayMode::Still { image, viewport } => {
                let transform = aspect_fit::compute_transform(image, viewport)?;
                Ok(faces
                    .iter()
                    .map(|f| aspect_fit::map_rect(f.frame, &transform))
                    .collect())
            }
            OverlayMode::Live { frame, preview } => faces
                .iter()
                .map(|f| {
                    normalized::to_normalized(f.frame, frame)
                        .map(|n| normalized::to_layer_rect(n, preview))
                })
                .collect(),
        }
    }

    pub fn crop_faces(&self, faces: &[FaceBox], image: &Image) -> Result<Vec<Image>, GeometryError> {
        crop::crop_all(faces, image, self.padding, self.display)
    }
}
