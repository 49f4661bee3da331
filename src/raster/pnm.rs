//! Binary PGM/PPM decoding
//!
//! Reads the stream produced by the raster converter and reduces every
//! sample to 8 bits.

use super::ColorSpace;
use crate::errors::ImageError;

/// Largest width or height accepted from the converter
pub const MAX_SIDE: usize = 5000;
/// Largest sample value a PNM header may declare
pub const MAX_MAXVAL: u32 = 65535;

/// A decoded bitmap with 8-bit samples
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    pub width: usize,
    pub height: usize,
    pub color_space: ColorSpace,
    /// Row-major samples, one byte per component
    pub samples: Vec<u8>,
}

fn malformed(message: &'static str) -> ImageError {
    ImageError::MalformedBitmap { message }
}

struct Header<'a> {
    data: &'a [u8],
    pos: usize,
}

impl Header<'_> {
    fn skip_blanks(&mut self) {
        while let Some(&b) = self.data.get(self.pos) {
            if b == b'#' {
                while self.data.get(self.pos).is_some_and(|&b| b != b'\n') {
                    self.pos += 1;
                }
            } else if b.is_ascii_whitespace() {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn number(&mut self, what: &'static str) -> Result<u32, ImageError> {
        self.skip_blanks();
        let start = self.pos;
        while self.data.get(self.pos).is_some_and(u8::is_ascii_digit) {
            self.pos += 1;
        }
        std::str::from_utf8(&self.data[start..self.pos])
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| malformed(what))
    }
}

/// Decode a `P5` (gray) or `P6` (RGB) stream. `P4` bitmaps are rejected.
pub fn decode(data: &[u8]) -> Result<Bitmap, ImageError> {
    let color_space = match data.get(..2) {
        Some(b"P4") | Some(b"P5") => ColorSpace::Gray,
        Some(b"P6") => ColorSpace::Rgb,
        _ => return Err(malformed("unknown magic number")),
    };
    let mut header = Header { data, pos: 2 };

    let width = header.number("width")? as usize;
    let height = header.number("height")? as usize;
    if !(1..=MAX_SIDE).contains(&width) {
        return Err(malformed("width out of range"));
    }
    if !(1..=MAX_SIDE).contains(&height) {
        return Err(malformed("height out of range"));
    }
    if data[1] == b'4' {
        return Err(ImageError::UnsupportedBitmap);
    }

    let maxval = header.number("maximum sample value")?;
    if !(1..=MAX_MAXVAL).contains(&maxval) {
        return Err(malformed("maximum sample value out of range"));
    }
    // exactly one whitespace byte separates header and raster
    let raster = data.get(header.pos + 1..).unwrap_or_default();

    let count = width * height * color_space.components();
    let wide = maxval >= 256;
    let needed = if wide { 2 * count } else { count };
    if raster.len() < needed {
        return Err(malformed("unexpected end of raster data"));
    }

    let samples = if wide {
        raster[..needed]
            .chunks_exact(2)
            .map(|pair| {
                if maxval == MAX_MAXVAL {
                    pair[0]
                } else {
                    rescale(u16::from_be_bytes([pair[0], pair[1]]) as u32, maxval)
                }
            })
            .collect()
    } else if maxval == 255 {
        raster[..needed].to_vec()
    } else {
        raster[..needed]
            .iter()
            .map(|&v| rescale(v as u32, maxval))
            .collect()
    };

    Ok(Bitmap {
        width,
        height,
        color_space,
        samples,
    })
}

/// Linear rescale to 0..=255, truncating
fn rescale(value: u32, maxval: u32) -> u8 {
    (255.0 * value as f64 / maxval as f64) as u8
}
