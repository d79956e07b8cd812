//! "Fit inside, keep aspect ratio, center" layout math.

use crate::error::GeometryError;
use crate::geometry::{Rect, Size};

/// Uniform scale plus centering offsets from content space to viewport space.
/// Recomputed for every call since the viewport can change between frames.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub scale: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl Transform {
    /// Maps a viewport-space rect back into content space.
    pub fn invert_rect(&self, rect: Rect) -> Rect {
        Rect::new(
            (rect.x - self.offset_x) / self.scale,
            (rect.y - self.offset_y) / self.scale,
            rect.width / self.scale,
            rect.height / self.scale,
        )
    }
}

pub fn compute_transform(content: Size, viewport: Size) -> Result<Transform, GeometryError> {
    let content = content.ensure_divisible()?;

    let scale = (viewport.width / content.width).min(viewport.height / content.height);
    Ok(Transform {
        scale,
        offset_x: (viewport.width - content.width * scale) / 2.0,
        offset_y: (viewport.height - content.height * scale) / 2.0,
    })
}

/// Scales every component, then offsets the origin. Extents are never offset.
pub fn map_rect(rect: Rect, transform: &Transform) -> Rect {
    Rect::new(
        rect.x * transform.scale + transform.offset_x,
        rect.y * transform.scale + transform.offset_y,
        rect.width * transform.scale,
        rect.height * transform.scale,
    )
}
