//! FIG stroke and fill properties mapped to Ipe attributes
//!
//! All functions here are pure apart from recording diagnostics.

use crate::ast::{Arrows, Common};
use crate::color::ColorTable;
use crate::diagnostics::{Diagnostics, Warning};
use crate::render::xml::XmlWriter;
use crate::types::Scaler;

/// Fill code of a fully saturated color
pub const SOLID_FILL: i32 = 20;
/// Fill code of pure white; larger codes are patterns
pub const MAX_TINT_FILL: i32 = 40;

/// A resolved fill color
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Fill {
    Gray(f64),
    Rgb([f64; 3]),
}

/// Stroke color, or `None` for objects without a stroke
pub fn stroke(common: &Common, colors: &ColorTable) -> Option<[f64; 3]> {
    common
        .has_stroke()
        .then(|| colors.rgb(common.pen_color).channels())
}

/// Fill color, or `None` for unfilled objects.
///
/// Black and the default color produce gray levels; any other color is
/// shaded toward black below [`SOLID_FILL`] and tinted toward white above it.
pub fn fill(common: &Common, colors: &ColorTable, diagnostics: &mut Diagnostics) -> Option<Fill> {
    if !common.is_filled() {
        return None;
    }
    let mut code = common.area_fill;
    if !(0..=MAX_TINT_FILL).contains(&code) {
        diagnostics.push(Warning::FillPatternClamped { fill: code });
        code = SOLID_FILL;
    }

    if common.fill_color.is_black() {
        let gray = if code <= SOLID_FILL {
            1.0 - code as f64 / 20.0
        } else {
            (code - SOLID_FILL) as f64 / 20.0
        };
        return Some(Fill::Gray(gray));
    }

    let rgb = colors.rgb(common.fill_color).channels();
    let mixed = if code < SOLID_FILL {
        let scale = code as f64 / 20.0;
        rgb.map(|c| c * scale)
    } else if code > SOLID_FILL {
        let scale = (MAX_TINT_FILL - code) as f64 / 20.0;
        rgb.map(|c| 1.0 - (1.0 - c) * scale)
    } else {
        rgb
    };
    Some(Fill::Rgb(mixed))
}

/// Dash pattern for a FIG line style
pub fn dash(line_style: i32, diagnostics: &mut Diagnostics) -> Option<&'static str> {
    match line_style {
        -1 | 0 => None,
        1 => Some("dashed"),
        2 => Some("dotted"),
        3 => Some("dash dotted"),
        4 => Some("dash dot dotted"),
        5 => Some("[4 2 1 2 1 2 1 2] 0"),
        style => {
            diagnostics.push(Warning::UnknownLineStyle { style });
            None
        }
    }
}

/// Write `stroke`, `fill`, `pen` and `dash` in that order
pub fn write_paint(
    w: &mut XmlWriter,
    common: &Common,
    colors: &ColorTable,
    scaler: &Scaler,
    diagnostics: &mut Diagnostics,
) {
    if let Some(rgb) = stroke(common, colors) {
        w.attr_nums("stroke", &rgb);
    }
    match fill(common, colors, diagnostics) {
        Some(Fill::Gray(g)) => {
            w.attr_num("fill", g);
        }
        Some(Fill::Rgb(rgb)) => {
            w.attr_nums("fill", &rgb);
        }
        None => {}
    }
    if common.has_stroke() {
        w.attr_num("pen", scaler.pen(common.thickness));
        if let Some(pattern) = dash(common.line_style, diagnostics) {
            w.attr("dash", pattern);
        }
    }
}

/// Write `arrow` and `backarrow` sized by the arrow heights
pub fn write_arrows(w: &mut XmlWriter, arrows: &Arrows, scaler: &Scaler) {
    if let Some(a) = arrows.forward {
        w.attr_num("arrow", scaler.x(a.height));
    }
    if let Some(a) = arrows.backward {
        w.attr_num("backarrow", scaler.x(a.height));
    }
}
