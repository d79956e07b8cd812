//! Padded face crops in source-pixel space.
//!
//! Padding is authored in display units (points around a box drawn on screen)
//! and converted to source pixels with [`display_to_source_scale`], the
//! inverse of the aspect-fit scale used to draw that box.

use image::GenericImageView;

use crate::error::GeometryError;
use crate::geometry::{FaceBox, Insets, Rect, Size};
use crate::orientation::{self, Image};

/// `min(source.w / display.w, source.h / display.h)`.
pub fn display_to_source_scale(source: Size, display: Size) -> Result<f64, GeometryError> {
    let display = display.ensure_divisible()?;
    Ok((source.width / display.width).min(source.height / display.height))
}

/// Grows `face` by the scaled padding and re-centers it.
///
/// Each axis grows by the sum of its opposing insets and the origin moves back
/// by half that sum. Uneven insets (top != bottom) therefore grow the box
/// evenly around the face center instead of padding only one edge.
pub fn compute_crop_rect(face: Rect, padding: Insets, scale: f64) -> Rect {
    let p = padding.scaled(scale);
    let grow_x = p.left + p.right;
    let grow_y = p.top + p.bottom;
    Rect::new(
        face.x - grow_x / 2.0,
        face.y - grow_y / 2.0,
        face.width + grow_x,
        face.height + grow_y,
    )
}

/// Integral pixel bounds of `rect` clipped to a `width` x `height` buffer.
/// `None` when nothing of it lands inside.
fn pixel_bounds(rect: Rect, width: u32, height: u32) -> Option<(u32, u32, u32, u32)> {
    let rect = rect.standardized();
    if !rect.is_finite() {
        return None;
    }
    let x0 = rect.x.floor().max(0.0);
    let y0 = rect.y.floor().max(0.0);
    let x1 = rect.max_x().ceil().min(width as f64);
    let y1 = rect.max_y().ceil().min(height as f64);
    if x1 <= x0 || y1 <= y0 {
        return None;
    }
    Some((x0 as u32, y0 as u32, (x1 - x0) as u32, (y1 - y0) as u32))
}

/// Cuts `rect` out of `image`, clipped to its bounds.
///
/// Expects an upright image; the crop keeps the input orientation.
pub fn extract_crop(image: &Image, rect: Rect) -> Option<Image> {
    let (w, h) = image.pixels.dimensions();
    let (x, y, cw, ch) = pixel_bounds(rect, w, h)?;
    Some(Image::new(
        image.pixels.crop_imm(x, y, cw, ch),
        image.orientation,
    ))
}

/// Crops every face out of `image`, skipping faces whose padded rect cannot
/// be realized. Output order follows `faces`.
pub fn crop_all(
    faces: &[FaceBox],
    image: &Image,
    padding: Insets,
    display: Size,
) -> Result<Vec<Image>, GeometryError> {
    if faces.is_empty() {
        return Ok(Vec::new());
    }

    let upright = orientation::normalize(image);
    let scale = display_to_source_scale(upright.size(), display)?;

    let crops = faces
        .iter()
        .enumerate()
        .filter_map(|(idx, face)| {
            let rect = compute_crop_rect(face.frame, padding, scale);
            let crop = extract_crop(&upright, rect);
            if crop.is_none() {
                log::debug!("face {}: crop {:?} falls outside the image, dropped", idx, rect);
            }
            crop
        })
        .collect();
    Ok(crops)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orientation::Orientation;
    use image::DynamicImage;

    #[test]
    fn symmetric_padding() {
        let r = compute_crop_rect(Rect::new(0.0, 0.0, 10.0, 10.0), Insets::uniform(2.0), 1.0);
        assert_eq!(r, Rect::new(-2.0, -2.0, 14.0, 14.0));
    }

    #[test]
    fn uneven_padding_grows_around_center() {
        let r = compute_crop_rect(
            Rect::new(0.0, 0.0, 10.0, 10.0),
            Insets::new(0.0, 0.0, 10.0, 0.0),
            1.0,
        );
        assert_eq!(r.x, 0.0);
        assert_eq!(r.width, 10.0);
        assert_eq!(r.y, -5.0);
        assert_eq!(r.height, 20.0);
    }

    #[test]
    fn padding_is_scaled_to_source_pixels() {
        let scale = display_to_source_scale(Size::new(1200.0, 1600.0), Size::new(400.0, 800.0)).unwrap();
        assert_eq!(scale, 2.0);
        let r = compute_crop_rect(Rect::new(100.0, 100.0, 50.0, 50.0), Insets::uniform(5.0), scale);
        assert_eq!(r, Rect::new(90.0, 90.0, 70.0, 70.0));
    }

    #[test]
    fn zero_display_is_rejected() {
        assert!(display_to_source_scale(Size::new(10.0, 10.0), Size::new(0.0, 5.0)).is_err());
    }

    #[test]
    fn extraction_clips_to_bounds() {
        let img = Image::upright(DynamicImage::new_rgb8(100, 80));
        let crop = extract_crop(&img, Rect::new(-10.0, 70.5, 30.0, 20.0)).unwrap();
        assert_eq!(crop.pixels.dimensions(), (20, 10));
    }

    #[test]
    fn extraction_rounds_outward() {
        let img = Image::upright(DynamicImage::new_rgb8(100, 100));
        let crop = extract_crop(&img, Rect::new(10.4, 10.6, 5.2, 5.0)).unwrap();
        // floor(10.4)=10 .. ceil(15.6)=16, floor(10.6)=10 .. ceil(15.6)=16
        assert_eq!(crop.pixels.dimensions(), (6, 6));
    }

    #[test]
    fn extraction_outside_is_none() {
        let img = Image::upright(DynamicImage::new_rgb8(100, 100));
        assert!(extract_crop(&img, Rect::new(200.0, 0.0, 10.0, 10.0)).is_none());
        assert!(extract_crop(&img, Rect::new(-50.0, -50.0, 10.0, 10.0)).is_none());
        assert!(extract_crop(&img, Rect::new(f64::NAN, 0.0, 10.0, 10.0)).is_none());
    }

    #[test]
    fn crops_come_back_upright() {
        let img = Image::new(DynamicImage::new_rgb8(40, 20), Orientation::Right);
        let faces = [FaceBox::new(Rect::new(2.0, 2.0, 10.0, 10.0))];
        let crops = crop_all(&faces, &img, Insets::default(), Size::new(20.0, 40.0)).unwrap();
        assert_eq!(crops.len(), 1);
        assert_eq!(crops[0].orientation, Orientation::Up);
    }

    #[test]
    fn empty_faces_no_op() {
        let img = Image::upright(DynamicImage::new_rgb8(10, 10));
        let crops = crop_all(&[], &img, Insets::uniform(50.0), Size::new(0.0, 0.0)).unwrap();
        assert!(crops.is_empty());
    }
}
