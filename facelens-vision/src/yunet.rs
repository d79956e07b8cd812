//! YuNet detector backend.
//!
//! The network takes a 640x640 BGR tensor and predicts, for every grid cell
//! at strides 8, 16 and 32, a class score, an objectness score, a box and
//! five landmarks. Outputs arrive as 12 tensors ordered
//! `cls_8, cls_16, cls_32, obj_8, .., bbox_8, .., kps_8, ..`. Boxes are
//! anchor-free:
//!
//! cx = (col + dx) * stride, cy = (row + dy) * stride
//! w  = dw * stride,         h  = dh * stride
//!
//! The input is letterboxed with the aspect-fit transform, so mapping a box
//! back to source pixels is just the inverse of that transform.

use std::path::Path;

use anyhow::{Context, Result};
use image::{imageops::FilterType, DynamicImage, GenericImageView, RgbImage};
use ndarray::{Array4, ArrayView2};
use ort::{session::Session, value::Value};

use crate::aspect_fit::{self, Transform};
use crate::detector::FaceDetector;
use crate::error::DetectorError;
use crate::geometry::{FaceBox, Rect, Size};

const INPUT_SIZE: u32 = 640;
const STRIDES: [usize; 3] = [8, 16, 32];

#[derive(Debug, Clone)]
struct Candidate {
    frame: Rect,
    score: f32,
}

type RawTensor = (Vec<i64>, Vec<f32>);

pub struct YunetDetector {
    session: Session,
    score_threshold: f32,
    nms_threshold: f32,
}

impl YunetDetector {
    pub fn from_file(model: &Path, score_threshold: f32, nms_threshold: f32) -> Result<Self> {
        Ok(Self {
            session: crate::model::detector_session(model)?,
            score_threshold,
            nms_threshold,
        })
    }

    fn run(&mut self, image: &DynamicImage) -> Result<Vec<FaceBox>> {
        let side = INPUT_SIZE as f64;
        let fit = aspect_fit::compute_transform(Size::from(image.dimensions()), Size::new(side, side))?;
        let (score_threshold, nms_threshold) = (self.score_threshold, self.nms_threshold);

        let input = Value::from_array(letterbox(image, &fit))?;
        let outputs = self.session.run(ort::inputs![input])?;

        let mut tensors: Vec<RawTensor> = Vec::new();
        for (_name, output) in outputs.iter() {
            let (shape, data) = output.try_extract_tensor::<f32>()?;
            tensors.push((shape.iter().copied().collect(), data.to_vec()));
        }

        let candidates = decode(&tensors, score_threshold)?;
        Ok(suppress(candidates, nms_threshold)
            .into_iter()
            .map(|c| FaceBox::new(fit.invert_rect(c.frame)))
            .collect())
    }
}

impl FaceDetector for YunetDetector {
    fn detect(&mut self, image: &DynamicImage) -> Result<Vec<FaceBox>, DetectorError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(DetectorError::EmptyInput);
        }
        let faces = self.run(image).context("running YuNet")?;
        log::debug!("yunet: {} face(s)", faces.len());
        Ok(faces)
    }
}

/// Resizes into the center of a black 640x640 canvas and lays it out as a
/// `[1, 3, H, W]` BGR tensor with values in [0, 255].
fn letterbox(image: &DynamicImage, fit: &Transform) -> Array4<f32> {
    let (w, h) = image.dimensions();
    let new_w = ((w as f64 * fit.scale).round() as u32).clamp(1, INPUT_SIZE);
    let new_h = ((h as f64 * fit.scale).round() as u32).clamp(1, INPUT_SIZE);
    let resized = image.resize_exact(new_w, new_h, FilterType::Triangle).to_rgb8();

    let mut canvas = RgbImage::new(INPUT_SIZE, INPUT_SIZE);
    image::imageops::overlay(
        &mut canvas,
        &resized,
        fit.offset_x.round() as i64,
        fit.offset_y.round() as i64,
    );

    let side = INPUT_SIZE as usize;
    let mut input = Array4::<f32>::zeros((1, 3, side, side));
    for (x, y, px) in canvas.enumerate_pixels() {
        let [r, g, b] = px.0;
        let (x, y) = (x as usize, y as usize);
        input[[0, 0, y, x]] = b as f32;
        input[[0, 1, y, x]] = g as f32;
        input[[0, 2, y, x]] = r as f32;
    }
    input
}

fn head(tensor: &RawTensor, rows: usize, cols: usize) -> Result<ArrayView2<'_, f32>> {
    let (shape, data) = tensor;
    if shape[..] != [1, rows as i64, cols as i64] {
        anyhow::bail!(
            "unexpected YuNet output shape {:?}, expected [1, {}, {}]",
            shape,
            rows,
            cols
        );
    }
    Ok(ArrayView2::from_shape((rows, cols), data.as_slice())?)
}

/// Candidates above `score_threshold`, in 640x640 input pixels.
fn decode(tensors: &[RawTensor], score_threshold: f32) -> Result<Vec<Candidate>> {
    if tensors.len() < 3 * STRIDES.len() {
        anyhow::bail!("expected at least {} YuNet outputs, got {}", 3 * STRIDES.len(), tensors.len());
    }

    let side = INPUT_SIZE as usize;
    let mut candidates = Vec::new();
    for (level, &stride) in STRIDES.iter().enumerate() {
        let cells = side / stride;
        let count = cells * cells;
        let cls = head(&tensors[level], count, 1)?;
        let obj = head(&tensors[level + 3], count, 1)?;
        let bbox = head(&tensors[level + 6], count, 4)?;

        let s = stride as f32;
        for idx in 0..count {
            let score = (cls[[idx, 0]] * obj[[idx, 0]]).clamp(0.0, 1.0).sqrt();
            if score < score_threshold {
                continue;
            }
            let (row, col) = ((idx / cells) as f32, (idx % cells) as f32);
            let cx = (col + bbox[[idx, 0]]) * s;
            let cy = (row + bbox[[idx, 1]]) * s;
            let w = bbox[[idx, 2]] * s;
            let h = bbox[[idx, 3]] * s;
            candidates.push(Candidate {
                frame: Rect::new(
                    (cx - w / 2.0) as f64,
                    (cy - h / 2.0) as f64,
                    w as f64,
                    h as f64,
                ),
                score,
            });
        }
    }
    Ok(candidates)
}

/// Greedy non-maximum suppression. A threshold of 1.0 or more disables it.
fn suppress(mut candidates: Vec<Candidate>, iou_threshold: f32) -> Vec<Candidate> {
    if iou_threshold >= 1.0 {
        return candidates;
    }
    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));

    let mut keep: Vec<Candidate> = Vec::new();
    for c in candidates {
        if keep
            .iter()
            .all(|k| k.frame.iou(&c.frame) <= iou_threshold as f64)
        {
            keep.push(c);
        }
    }
    keep
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_outputs() -> Vec<RawTensor> {
        let mut tensors = Vec::new();
        for cols in [1usize, 1, 4, 10] {
            for stride in STRIDES {
                let cells = INPUT_SIZE as usize / stride;
                let rows = cells * cells;
                tensors.push((vec![1, rows as i64, cols as i64], vec![0.0; rows * cols]));
            }
        }
        tensors
    }

    #[test]
    fn decode_single_cell() {
        let mut tensors = empty_outputs();
        // Stride 32 level is index 2; cell (row 10, col 10) on a 20x20 grid.
        let idx = 10 * 20 + 10;
        tensors[2].1[idx] = 0.81;
        tensors[5].1[idx] = 1.0;
        let bbox = &mut tensors[8].1;
        bbox[idx * 4] = 0.5;
        bbox[idx * 4 + 1] = 0.25;
        bbox[idx * 4 + 2] = 4.0;
        bbox[idx * 4 + 3] = 4.0;

        let found = decode(&tensors, 0.6).unwrap();
        assert_eq!(found.len(), 1);
        let c = &found[0];
        assert!((c.score - 0.9).abs() < 1e-6);
        // center (336, 328), size 128
        assert!((c.frame.x - 272.0).abs() < 1e-4);
        assert!((c.frame.y - 264.0).abs() < 1e-4);
        assert!((c.frame.width - 128.0).abs() < 1e-4);
    }

    #[test]
    fn decode_rejects_bad_shape() {
        let mut tensors = empty_outputs();
        tensors[0].0 = vec![1, 7, 1];
        assert!(decode(&tensors, 0.5).is_err());
        assert!(decode(&tensors[..4], 0.5).is_err());
    }

    #[test]
    fn nms_keeps_best_of_overlap() {
        let candidates = vec![
            Candidate {
                frame: Rect::new(10.0, 10.0, 20.0, 20.0),
                score: 0.9,
            },
            Candidate {
                frame: Rect::new(12.0, 12.0, 20.0, 20.0),
                score: 0.8,
            },
            Candidate {
                frame: Rect::new(100.0, 100.0, 20.0, 20.0),
                score: 0.85,
            },
        ];
        let kept = suppress(candidates, 0.3);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].score, 0.9);
        assert_eq!(kept[1].score, 0.85);
    }

    #[test]
    fn letterbox_centers_content() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(64, 32, image::Rgb([10, 20, 30])));
        let fit = aspect_fit::compute_transform(Size::new(64.0, 32.0), Size::new(640.0, 640.0)).unwrap();
        let t = letterbox(&img, &fit);
        // Content spans rows 160..480; row 0 is padding.
        assert_eq!(t[[0, 0, 0, 0]], 0.0);
        assert_eq!(t[[0, 0, 320, 320]], 30.0);
        assert_eq!(t[[0, 2, 320, 320]], 10.0);
    }
}
