//! Byte-oriented XML output
//!
//! Text payloads are not guaranteed to be UTF-8, so the document is built in
//! a `Vec<u8>` rather than a `String`.

use std::fmt::Display;

/// Accumulates an Ipe document
#[derive(Debug, Default)]
pub struct XmlWriter {
    buf: Vec<u8>,
}

impl XmlWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append literal markup
    pub fn raw(&mut self, s: &str) -> &mut Self {
        self.buf.extend_from_slice(s.as_bytes());
        self
    }

    /// Append literal bytes
    pub fn bytes(&mut self, b: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(b);
        self
    }

    /// Append anything displayable
    pub fn display(&mut self, value: impl Display) -> &mut Self {
        self.buf.extend_from_slice(value.to_string().as_bytes());
        self
    }

    /// Append ` name="value"`
    pub fn attr(&mut self, name: &str, value: impl Display) -> &mut Self {
        self.raw(" ").raw(name).raw("=\"").display(value).raw("\"")
    }

    /// Append ` name="value"` with `value` formatted like `%g`
    pub fn attr_num(&mut self, name: &str, value: f64) -> &mut Self {
        self.attr(name, fmt_num(value))
    }

    /// Append ` name="a b c..."` with every value formatted like `%g`
    pub fn attr_nums(&mut self, name: &str, values: &[f64]) -> &mut Self {
        self.attr(name, fmt_nums(values))
    }

    /// Append text content, escaping markup characters
    pub fn text(&mut self, content: &[u8]) -> &mut Self {
        for &b in content {
            match b {
                b'&' => self.buf.extend_from_slice(b"&amp;"),
                b'<' => self.buf.extend_from_slice(b"&lt;"),
                b'>' => self.buf.extend_from_slice(b"&gt;"),
                _ => self.buf.push(b),
            }
        }
        self
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// Format a number like C's `%g`: 6 significant figures, trailing zeros
/// trimmed, exponent notation outside [1e-4, 1e6).
pub fn fmt_num(value: f64) -> String {
    fmt_num_precision(value, 6)
}

/// Space-separated [`fmt_num`] values
pub fn fmt_nums(values: &[f64]) -> String {
    values
        .iter()
        .map(|&v| fmt_num(v))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Format a number like C's `%f`
pub fn fmt_fixed(value: f64) -> String {
    format!("{:.6}", value)
}

fn fmt_num_precision(value: f64, sig_figs: i32) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    if !value.is_finite() {
        return if value.is_nan() {
            "nan".to_string()
        } else if value > 0.0 {
            "inf".to_string()
        } else {
            "-inf".to_string()
        };
    }

    // Round to specified significant figures; rounding may bump the exponent
    let mut magnitude = value.abs().log10().floor() as i32;
    let mut rounded = round_sig(value, sig_figs, magnitude);
    let bumped = rounded.abs().log10().floor() as i32;
    if bumped > magnitude {
        magnitude = bumped;
        rounded = round_sig(value, sig_figs, magnitude);
    }

    if magnitude < -4 || magnitude >= sig_figs {
        let mantissa = rounded / 10_f64.powi(magnitude);
        let digits = format!("{:.prec$}", mantissa, prec = (sig_figs - 1) as usize);
        let sign = if magnitude < 0 { '-' } else { '+' };
        return format!("{}e{}{:02}", trim_fraction(&digits), sign, magnitude.abs());
    }

    let decimals = (sig_figs - 1 - magnitude).max(0) as usize;
    let s = format!("{:.prec$}", rounded, prec = decimals);
    trim_fraction(&s).to_string()
}

fn round_sig(value: f64, sig_figs: i32, magnitude: i32) -> f64 {
    let scale = 10_f64.powi(sig_figs - 1 - magnitude);
    (value * scale).round() / scale
}

/// Trim trailing zeros of a fractional part, and the point if nothing is left
fn trim_fraction(s: &str) -> &str {
    if !s.contains('.') {
        return s;
    }
    s.trim_end_matches('0').trim_end_matches('.')
}
