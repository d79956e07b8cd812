//! Orientation normalization.
//!
//! Cameras store pixels in sensor order and record how the picture should be
//! displayed as metadata. Every other module assumes an upright, top-left
//! origin buffer, so images pass through [`normalize`] before any geometry
//! math touches them.

use image::{DynamicImage, GenericImageView};

use crate::error::GeometryError;
use crate::geometry::Size;

/// How the stored pixel buffer must be transformed to appear upright.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    Up,
    Down,
    Left,
    Right,
    UpMirrored,
    DownMirrored,
    LeftMirrored,
    RightMirrored,
}

impl Orientation {
    /// Maps an EXIF orientation tag (1..=8).
    pub fn from_exif(value: u8) -> Option<Self> {
        Some(match value {
            1 => Self::Up,
            2 => Self::UpMirrored,
            3 => Self::Down,
            4 => Self::DownMirrored,
            5 => Self::LeftMirrored,
            6 => Self::Right,
            7 => Self::RightMirrored,
            8 => Self::Left,
            _ => return None,
        })
    }

    /// True when displaying the buffer swaps its width and height.
    pub fn is_transposed(self) -> bool {
        matches!(
            self,
            Self::Left | Self::Right | Self::LeftMirrored | Self::RightMirrored
        )
    }
}

impl From<image::metadata::Orientation> for Orientation {
    fn from(value: image::metadata::Orientation) -> Self {
        use image::metadata::Orientation as Exif;
        match value {
            Exif::NoTransforms => Self::Up,
            Exif::Rotate90 => Self::Right,
            Exif::Rotate180 => Self::Down,
            Exif::Rotate270 => Self::Left,
            Exif::FlipHorizontal => Self::UpMirrored,
            Exif::FlipVertical => Self::DownMirrored,
            Exif::Rotate90FlipH => Self::LeftMirrored,
            Exif::Rotate270FlipH => Self::RightMirrored,
        }
    }
}

/// Owned pixel buffer plus its display orientation.
#[derive(Debug, Clone)]
pub struct Image {
    pub pixels: DynamicImage,
    pub orientation: Orientation,
}

impl Image {
    pub fn new(pixels: DynamicImage, orientation: Orientation) -> Self {
        Self {
            pixels,
            orientation,
        }
    }

    pub fn upright(pixels: DynamicImage) -> Self {
        Self::new(pixels, Orientation::Up)
    }

    /// Displayed size: quarter-turn orientations swap the buffer dimensions.
    pub fn size(&self) -> Size {
        let (w, h) = self.pixels.dimensions();
        if self.orientation.is_transposed() {
            Size::from((h, w))
        } else {
            Size::from((w, h))
        }
    }
}

/// Renders `image` into a fresh upright buffer of exactly `image.size()`.
pub fn render_upright(image: &Image) -> Result<DynamicImage, GeometryError> {
    let (w, h) = image.pixels.dimensions();
    if w == 0 || h == 0 {
        return Err(GeometryError::RenderFailure {
            width: w,
            height: h,
        });
    }

    let src = &image.pixels;
    let rendered = match image.orientation {
        Orientation::Up => src.clone(),
        Orientation::Down => src.rotate180(),
        Orientation::Left => src.rotate270(),
        Orientation::Right => src.rotate90(),
        Orientation::UpMirrored => src.fliph(),
        Orientation::DownMirrored => src.flipv(),
        Orientation::LeftMirrored => src.rotate90().fliph(),
        Orientation::RightMirrored => src.rotate270().fliph(),
    };
    Ok(rendered)
}

/// Returns an upright copy of `image`. The original is left untouched.
///
/// A failed render degrades to returning the original unchanged; geometry
/// downstream stays consistent as long as it keeps using this same image.
pub fn normalize(image: &Image) -> Image {
    match render_upright(image) {
        Ok(pixels) => Image::upright(pixels),
        Err(e) => {
            log::warn!("orientation normalization skipped: {}", e);
            image.clone()
        }
    }
}
