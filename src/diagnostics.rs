//! Recoverable conversion diagnostics.
//!
//! Every problem that only affects a single object (or a single field of
//! one) is recorded here and logged; conversion then carries on.

use thiserror::Error;

use crate::errors::ImageError;

/// Broad class of a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    /// A malformed numeric token was replaced by a sentinel
    Token,
    /// A value outside its supported range was clamped
    Range,
    /// An object was dropped or degraded because it cannot be drawn as given
    Geometry,
    /// An embedded image was skipped or stored in a degraded form
    Image,
}

/// A single recoverable problem
#[derive(Error, Debug)]
pub enum Warning {
    #[error("could not read {expected} value `{token}`")]
    MalformedNumber { expected: &'static str, token: String },

    #[error("could not read rgb string `{token}`")]
    MalformedRgb { token: String },

    #[error("color value {index} out of range, replacing with 0")]
    ColorOutOfRange { index: i32 },

    #[error("user color number {index} out of range, replacing with {replacement}")]
    UserColorOutOfRange { index: i32, replacement: usize },

    #[error("fill pattern {fill} replaced by solid filling")]
    FillPatternClamped { fill: i32 },

    #[error("line style {style} replaced by solid line")]
    UnknownLineStyle { style: i32 },

    #[error("text string not terminated before end of file")]
    UnterminatedText,

    #[error("ellipse with neither fill nor line ignored")]
    InvisibleEllipse,

    #[error("polyline with less than two vertices ignored")]
    TooFewPoints,

    #[error("polyline with neither fill nor line ignored")]
    InvisiblePolyline,

    #[error("turning arc-box into rectangle")]
    ArcBoxAsRectangle,

    #[error("spline replaced by polyline")]
    SplineAsPolyline,

    #[error("arc with neither fill nor line ignored")]
    InvisibleArc,

    #[error("postscript font ignored")]
    PostscriptFont,

    #[error("unsupported font {font} replaced by default font")]
    UnsupportedFont { font: i32 },

    #[error("skipping image: {0}")]
    ImageSkipped(#[from] ImageError),

    #[error("failed to compress image ({message}), storing it uncompressed")]
    ImageUncompressed { message: String },

    #[error("flipped image has an empty rectangle, placing it unflipped")]
    ImageFlipIgnored,
}

impl Warning {
    pub fn category(&self) -> Category {
        match self {
            Warning::MalformedNumber { .. }
            | Warning::MalformedRgb { .. }
            | Warning::UnterminatedText => Category::Token,
            Warning::ColorOutOfRange { .. }
            | Warning::UserColorOutOfRange { .. }
            | Warning::FillPatternClamped { .. }
            | Warning::UnknownLineStyle { .. }
            | Warning::PostscriptFont
            | Warning::UnsupportedFont { .. } => Category::Range,
            Warning::InvisibleEllipse
            | Warning::TooFewPoints
            | Warning::InvisiblePolyline
            | Warning::ArcBoxAsRectangle
            | Warning::SplineAsPolyline
            | Warning::InvisibleArc => Category::Geometry,
            Warning::ImageSkipped(_)
            | Warning::ImageUncompressed { .. }
            | Warning::ImageFlipIgnored => Category::Image,
        }
    }
}

/// Collects the warnings of one conversion run
#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning and log it as a single line
    pub fn push(&mut self, warning: Warning) {
        tracing::warn!("{}", warning);
        self.warnings.push(warning);
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn len(&self) -> usize {
        self.warnings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    /// Number of warnings in the given category
    pub fn count(&self, category: Category) -> usize {
        self.warnings
            .iter()
            .filter(|w| w.category() == category)
            .count()
    }

    pub fn into_warnings(self) -> Vec<Warning> {
        self.warnings
    }
}
