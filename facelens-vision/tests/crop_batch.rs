use anyhow::Result;
use facelens_vision::{crop, FaceBox, Image, Insets, Orientation, Rect, Size};
use image::{DynamicImage, GenericImageView, Rgb, RgbImage};

/// 200x100 image, left half red and right half blue.
fn two_tone() -> Image {
    let buf = RgbImage::from_fn(200, 100, |x, _| {
        if x < 100 {
            Rgb([255, 0, 0])
        } else {
            Rgb([0, 0, 255])
        }
    });
    Image::upright(DynamicImage::ImageRgb8(buf))
}

#[test]
fn unextractable_face_is_dropped_and_order_kept() -> Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();

    let faces = [
        FaceBox::new(Rect::new(10.0, 10.0, 30.0, 30.0)),
        FaceBox::new(Rect::new(5000.0, 5000.0, 30.0, 30.0)),
        FaceBox::new(Rect::new(150.0, 40.0, 20.0, 20.0)),
    ];
    let crops = crop::crop_all(&faces, &two_tone(), Insets::default(), Size::new(200.0, 100.0))?;

    assert_eq!(crops.len(), 2);
    assert_eq!(crops[0].pixels.dimensions(), (30, 30));
    assert_eq!(crops[1].pixels.dimensions(), (20, 20));
    assert_eq!(crops[0].pixels.to_rgb8().get_pixel(0, 0), &Rgb([255, 0, 0]));
    assert_eq!(crops[1].pixels.to_rgb8().get_pixel(0, 0), &Rgb([0, 0, 255]));
    Ok(())
}

#[test]
fn padding_is_authored_in_display_units() -> Result<()> {
    // Source is twice the display size, so 5 display points pad 10 pixels.
    let faces = [FaceBox::new(Rect::new(50.0, 30.0, 20.0, 20.0))];
    let crops = crop::crop_all(&faces, &two_tone(), Insets::uniform(5.0), Size::new(100.0, 50.0))?;
    assert_eq!(crops.len(), 1);
    assert_eq!(crops[0].pixels.dimensions(), (40, 40));
    Ok(())
}

#[test]
fn padded_crop_is_clipped_at_the_edge() -> Result<()> {
    let faces = [FaceBox::new(Rect::new(0.0, 0.0, 20.0, 20.0))];
    let crops = crop::crop_all(&faces, &two_tone(), Insets::uniform(10.0), Size::new(200.0, 100.0))?;
    // Requested (-10, -10, 40, 40), clipped to (0, 0, 30, 30).
    assert_eq!(crops[0].pixels.dimensions(), (30, 30));
    Ok(())
}

#[test]
fn rotated_source_is_normalized_before_cropping() -> Result<()> {
    // Stored 100x200 with the sensor turned; displays as 200x100.
    let stored = two_tone().pixels.rotate270();
    let image = Image::new(stored, Orientation::Right);
    assert_eq!(image.size(), Size::new(200.0, 100.0));

    let faces = [FaceBox::new(Rect::new(150.0, 40.0, 20.0, 20.0))];
    let crops = crop::crop_all(&faces, &image, Insets::default(), Size::new(200.0, 100.0))?;
    assert_eq!(crops[0].orientation, Orientation::Up);
    assert_eq!(crops[0].pixels.to_rgb8().get_pixel(5, 5), &Rgb([0, 0, 255]));
    Ok(())
}

#[test]
fn zero_display_fails_the_batch() {
    let faces = [FaceBox::new(Rect::new(0.0, 0.0, 20.0, 20.0))];
    assert!(crop::crop_all(&faces, &two_tone(), Insets::default(), Size::new(0.0, 100.0)).is_err());
}
