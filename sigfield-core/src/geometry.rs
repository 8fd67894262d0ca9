//! Basic geometric types for PDF

use crate::error::{PdfError, Result};
use crate::objects::Object;

/// A point in 2D space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
}

impl Point {
    /// Create a new point
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A rectangle in page space, origin at the bottom-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rectangle {
    /// Lower-left corner
    pub lower_left: Point,
    /// Upper-right corner
    pub upper_right: Point,
}

impl Rectangle {
    /// Create a new rectangle from two points
    pub fn new(lower_left: Point, upper_right: Point) -> Self {
        Self {
            lower_left,
            upper_right,
        }
    }

    /// Create a rectangle from `(left, bottom, right, top)`, the order used by `/Rect`.
    pub fn from_coords(left: f64, bottom: f64, right: f64, top: f64) -> Self {
        Self::new(Point::new(left, bottom), Point::new(right, top))
    }

    /// Create a rectangle from position and size
    pub fn from_position_and_size(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::from_coords(x, y, x + width, y + height)
    }

    pub fn left(&self) -> f64 {
        self.lower_left.x
    }

    pub fn bottom(&self) -> f64 {
        self.lower_left.y
    }

    pub fn right(&self) -> f64 {
        self.upper_right.x
    }

    pub fn top(&self) -> f64 {
        self.upper_right.y
    }

    /// Get the width
    pub fn width(&self) -> f64 {
        self.upper_right.x - self.lower_left.x
    }

    /// Get the height
    pub fn height(&self) -> f64 {
        self.upper_right.y - self.lower_left.y
    }

    /// Reject rectangles with zero, negative or non-finite extent.
    pub fn validate(&self) -> Result<()> {
        let coords = self.to_array();
        let finite = coords.iter().all(|c| c.is_finite());
        if finite && self.width() > 0.0 && self.height() > 0.0 {
            Ok(())
        } else {
            Err(PdfError::InvalidRectangle {
                left: self.left(),
                bottom: self.bottom(),
                right: self.right(),
                top: self.top(),
            })
        }
    }

    /// True when the two rectangles share no interior area.
    pub fn is_disjoint(&self, other: &Rectangle) -> bool {
        self.right() <= other.left()
            || other.right() <= self.left()
            || self.top() <= other.bottom()
            || other.top() <= self.bottom()
    }

    pub fn to_array(&self) -> [f64; 4] {
        [self.left(), self.bottom(), self.right(), self.top()]
    }

    /// `/Rect`-style array of four reals.
    pub fn to_pdf_array(&self) -> Object {
        Object::Array(self.to_array().iter().map(|v| Object::Real(*v)).collect())
    }

    /// Read a four-number array; integers and reals are both accepted.
    pub fn from_pdf_array(object: &Object) -> Option<Self> {
        let values = object.as_array()?;
        if values.len() != 4 {
            return None;
        }
        let mut coords = [0.0; 4];
        for (slot, value) in coords.iter_mut().zip(values) {
            *slot = value.as_real()?;
        }
        Some(Self::from_coords(coords[0], coords[1], coords[2], coords[3]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rectangle_dimensions() {
        let rect = Rectangle::from_coords(61.2, 79.2, 306.0, 158.4);
        assert!((rect.width() - 244.8).abs() < 1e-9);
        assert!((rect.height() - 79.2).abs() < 1e-9);
        assert!(rect.validate().is_ok());
    }

    #[test]
    fn test_rectangle_from_position_and_size() {
        let rect = Rectangle::from_position_and_size(10.0, 20.0, 50.0, 30.0);
        assert_eq!(rect.to_array(), [10.0, 20.0, 60.0, 50.0]);
    }

    #[test]
    fn test_zero_area_is_rejected() {
        let rect = Rectangle::from_coords(100.0, 100.0, 100.0, 100.0);
        assert!(matches!(
            rect.validate(),
            Err(PdfError::InvalidRectangle { .. })
        ));
    }

    #[test]
    fn test_inverted_and_flat_rectangles_are_rejected() {
        assert!(Rectangle::from_coords(200.0, 10.0, 100.0, 50.0).validate().is_err());
        assert!(Rectangle::from_coords(10.0, 50.0, 100.0, 10.0).validate().is_err());
        assert!(Rectangle::from_coords(10.0, 10.0, 100.0, 10.0).validate().is_err());
    }

    #[test]
    fn test_non_finite_rectangle_is_rejected() {
        assert!(Rectangle::from_coords(0.0, 0.0, f64::INFINITY, 10.0).validate().is_err());
        assert!(Rectangle::from_coords(f64::NAN, 0.0, 10.0, 10.0).validate().is_err());
    }

    #[test]
    fn test_disjoint() {
        let a = Rectangle::from_coords(0.0, 0.0, 10.0, 10.0);
        let b = Rectangle::from_coords(10.0, 0.0, 20.0, 10.0);
        let c = Rectangle::from_coords(5.0, 5.0, 15.0, 15.0);
        assert!(a.is_disjoint(&b));
        assert!(!a.is_disjoint(&c));
    }

    #[test]
    fn test_pdf_array_roundtrip() {
        let rect = Rectangle::from_coords(1.0, 2.0, 3.5, 4.25);
        let array = rect.to_pdf_array();
        assert_eq!(Rectangle::from_pdf_array(&array), Some(rect));

        let ints = Object::Array(vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(612),
            Object::Integer(792),
        ]);
        assert_eq!(
            Rectangle::from_pdf_array(&ints),
            Some(Rectangle::from_coords(0.0, 0.0, 612.0, 792.0))
        );
        assert_eq!(Rectangle::from_pdf_array(&Object::Null), None);
    }
}
