//! Numeric primitives for the FIG -> Ipe coordinate mapping.
//!
//! FIG stores coordinates in "FIG units" (resolution per inch, usually 1200)
//! with the origin at the top left. Ipe works in PostScript points with the
//! origin at the bottom left of the page.

use std::fmt;

use glam::DVec2;

/// Error type for invalid numeric values
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumericError {
    /// Value is NaN
    NaN,
    /// Value is infinite
    Infinite,
    /// Value is zero when non-zero required
    Zero,
    /// Value is negative when positive required
    Negative,
}

impl fmt::Display for NumericError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumericError::NaN => write!(f, "value is NaN"),
            NumericError::Infinite => write!(f, "value is infinite"),
            NumericError::Zero => write!(f, "value is zero"),
            NumericError::Negative => write!(f, "value is negative"),
        }
    }
}

impl std::error::Error for NumericError {}

fn check_positive(val: f64) -> Result<f64, NumericError> {
    if val.is_nan() {
        Err(NumericError::NaN)
    } else if val.is_infinite() {
        Err(NumericError::Infinite)
    } else if val == 0.0 {
        Err(NumericError::Zero)
    } else if val < 0.0 {
        Err(NumericError::Negative)
    } else {
        Ok(val)
    }
}

/// Convert FIG units to Ipe points for one document.
///
/// Built once from the header and read-only afterwards.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Scaler {
    units_per_point: f64,
    magnification: f64,
    page_height: f64,
}

impl Scaler {
    /// Create a Scaler with validation (rejects NaN, infinite, zero, negative)
    pub fn try_new(
        units_per_point: f64,
        magnification: f64,
        page_height: f64,
    ) -> Result<Self, NumericError> {
        Ok(Scaler {
            units_per_point: check_positive(units_per_point)?,
            magnification: check_positive(magnification)?,
            page_height,
        })
    }

    pub fn units_per_point(&self) -> f64 {
        self.units_per_point
    }

    pub fn magnification(&self) -> f64 {
        self.magnification
    }

    /// Map a horizontal coordinate (or any length) to points
    #[inline]
    pub fn x(&self, v: f64) -> f64 {
        (v / self.units_per_point) * self.magnification
    }

    /// Map a vertical coordinate, flipping the axis
    #[inline]
    pub fn y(&self, v: f64) -> f64 {
        self.page_height - self.x(v)
    }

    /// Map a FIG position to an Ipe position
    pub fn point(&self, p: DVec2) -> DVec2 {
        DVec2::new(self.x(p.x), self.y(p.y))
    }

    /// Pen width in points for a FIG line thickness (1/80 inch)
    pub fn pen(&self, thickness: f64) -> f64 {
        self.magnification * 72.0 * (thickness / 80.0)
    }
}
