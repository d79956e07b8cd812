//! Frame pixels -> [0,1] fractions -> live preview layer coordinates.

use crate::error::GeometryError;
use crate::geometry::{Rect, Size};

/// Expresses `face` as fractions of the frame's width and height.
pub fn to_normalized(face: Rect, frame: Size) -> Result<Rect, GeometryError> {
    let frame = frame.ensure_divisible()?;
    Ok(Rect::new(
        face.x / frame.width,
        face.y / frame.height,
        face.width / frame.width,
        face.height / frame.height,
    ))
}

/// Places a normalized rect inside `viewport` (which may itself be offset),
/// then standardizes so rotated sources never draw inverted boxes.
pub fn to_layer_rect(normalized: Rect, viewport: Rect) -> Rect {
    Rect::new(
        viewport.x + normalized.x * viewport.width,
        viewport.y + normalized.y * viewport.height,
        normalized.width * viewport.width,
        normalized.height * viewport.height,
    )
    .standardized()
}
