//! Plain value types shared by every coordinate space the engine touches:
//! source pixels, on-screen view points and normalized frame fractions.

use serde::{Deserialize, Serialize};

use crate::error::GeometryError;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Fails with [`GeometryError::InvalidDimensions`] unless both components
    /// are strictly positive. NaN is rejected as well.
    pub fn ensure_divisible(self) -> Result<Self, GeometryError> {
        if self.width > 0.0 && self.height > 0.0 {
            Ok(self)
        } else {
            Err(GeometryError::InvalidDimensions {
                width: self.width,
                height: self.height,
            })
        }
    }
}

impl From<(u32, u32)> for Size {
    fn from((width, height): (u32, u32)) -> Self {
        Self::new(width as f64, height as f64)
    }
}

/// Axis-aligned rectangle, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_size(size: Size) -> Self {
        Self::new(0.0, 0.0, size.width, size.height)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn max_x(&self) -> f64 {
        self.x + self.width
    }

    pub fn max_y(&self) -> f64 {
        self.y + self.height
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.width.is_finite() && self.height.is_finite()
    }

    /// Same region with non-negative extents and the origin at the minimum
    /// corner. Already standardized rects come back unchanged.
    pub fn standardized(&self) -> Self {
        let mut out = *self;
        if out.width < 0.0 {
            out.x += out.width;
            out.width = -out.width;
        }
        if out.height < 0.0 {
            out.y += out.height;
            out.height = -out.height;
        }
        out
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn area(&self) -> f64 {
        self.width.abs() * self.height.abs()
    }

    /// Intersection-over-union of two standardized rects.
    pub fn iou(&self, other: &Rect) -> f64 {
        let x1 = self.x.max(other.x);
        let y1 = self.y.max(other.y);
        let x2 = self.max_x().min(other.max_x());
        let y2 = self.max_y().min(other.max_y());
        if x2 <= x1 || y2 <= y1 {
            return 0.0;
        }
        let inter = (x2 - x1) * (y2 - y1);
        inter / (self.area() + other.area() - inter)
    }
}

/// Per-edge padding, authored in display units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Insets {
    pub top: f64,
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
}

impl Insets {
    pub const fn new(top: f64, left: f64, bottom: f64, right: f64) -> Self {
        Self {
            top,
            left,
            bottom,
            right,
        }
    }

    pub const fn uniform(value: f64) -> Self {
        Self::new(value, value, value, value)
    }

    pub fn scaled(&self, factor: f64) -> Self {
        Self::new(
            self.top * factor,
            self.left * factor,
            self.bottom * factor,
            self.right * factor,
        )
    }
}

/// One detected face in source-image pixel space. Only valid for the
/// detection pass that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaceBox {
    pub frame: Rect,
}

impl FaceBox {
    pub const fn new(frame: Rect) -> Self {
        Self { frame }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standardize_flips_negative_extents() {
        let r = Rect::new(10.0, 10.0, -5.0, -5.0).standardized();
        assert_eq!(r, Rect::new(5.0, 5.0, 5.0, 5.0));
    }

    #[test]
    fn standardize_is_idempotent() {
        let r = Rect::new(3.0, -2.0, 4.0, 0.0);
        assert_eq!(r.standardized(), r);
        assert_eq!(r.standardized().standardized(), r);
    }

    #[test]
    fn zero_component_is_not_divisible() {
        assert!(Size::new(0.0, 100.0).ensure_divisible().is_err());
        assert!(Size::new(100.0, 0.0).ensure_divisible().is_err());
        assert!(Size::new(f64::NAN, 1.0).ensure_divisible().is_err());
        assert!(Size::new(1.0, 1.0).ensure_divisible().is_ok());
    }

    #[test]
    fn test_iou() {
        let a = Rect::new(10.0, 10.0, 20.0, 20.0);
        let b = Rect::new(15.0, 15.0, 20.0, 20.0);
        let iou = a.iou(&b);
        assert!(iou > 0.0 && iou < 1.0);

        let c = Rect::new(100.0, 100.0, 10.0, 10.0);
        assert_eq!(a.iou(&c), 0.0);
    }
}
