use image::DynamicImage;

use crate::error::DetectorError;
use crate::geometry::FaceBox;

/// A face detector. The geometry engine only ever sees its output: boxes in
/// the source image's pixel space.
pub trait FaceDetector {
    fn detect(&mut self, image: &DynamicImage) -> Result<Vec<FaceBox>, DetectorError>;
}

impl<D: FaceDetector + ?Sized> FaceDetector for Box<D> {
    fn detect(&mut self, image: &DynamicImage) -> Result<Vec<FaceBox>, DetectorError> {
        (**self).detect(image)
    }
}
