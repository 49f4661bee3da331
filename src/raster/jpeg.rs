//! JFIF header scan
//!
//! Only the APP0 fingerprint and the frame header are decoded; every other
//! segment is skipped by its length. The file itself is embedded verbatim.

use tracing::debug;

use super::ColorSpace;

const SOI: u8 = 0xd8;
const EOI: u8 = 0xd9;
const APP0: u8 = 0xe0;
const TEM: u8 = 0x01;

const JFIF_SIGNATURE: &[u8] = b"JFIF\0";

/// What the frame header says about a JPEG image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JpegInfo {
    pub width: usize,
    pub height: usize,
    pub bits_per_component: u8,
    pub color_space: ColorSpace,
}

struct Segments<'a> {
    data: &'a [u8],
    pos: usize,
}

impl Segments<'_> {
    fn byte(&mut self) -> Option<u8> {
        let b = *self.data.get(self.pos)?;
        self.pos += 1;
        Some(b)
    }

    fn word(&mut self) -> Option<u16> {
        Some(u16::from_be_bytes([self.byte()?, self.byte()?]))
    }

    fn take(&mut self, n: usize) -> Option<&[u8]> {
        let bytes = self.data.get(self.pos..self.pos.checked_add(n)?)?;
        self.pos += n;
        Some(bytes)
    }

    fn skip(&mut self, n: usize) {
        self.pos = self.pos.saturating_add(n);
    }

    /// Next marker code, skipping any garbage and fill bytes before it
    fn marker(&mut self) -> Option<u8> {
        while self.byte()? != 0xff {}
        loop {
            match self.byte()? {
                0xff => continue,
                code => return Some(code),
            }
        }
    }

    /// Skip a segment whose length field has not been read yet
    fn skip_segment(&mut self) -> Option<()> {
        let len = self.word()? as usize;
        self.skip(len.checked_sub(2)?);
        Some(())
    }
}

/// Scan `data` for a JFIF fingerprint and a baseline/progressive frame
/// header. Returns `None` if either is missing or malformed.
pub fn scan(data: &[u8]) -> Option<JpegInfo> {
    let mut s = Segments { data, pos: 0 };
    let soi = s.word()?;
    if soi & 0xff != SOI as u16 {
        return None;
    }

    let mut jfif = false;
    let mut frame = None;
    while !(jfif && frame.is_some()) {
        match s.marker()? {
            APP0 => {
                let len = s.word()? as usize;
                if s.take(JFIF_SIGNATURE.len())? != JFIF_SIGNATURE {
                    debug!("APP0 segment is not JFIF");
                    return None;
                }
                s.skip(len.checked_sub(2 + JFIF_SIGNATURE.len())?);
                jfif = true;
            }
            0xc0..=0xc3 => {
                let len = s.word()? as usize;
                let bits_per_component = s.byte()?;
                let height = s.word()? as usize;
                let width = s.word()? as usize;
                let components = s.byte()?;
                let color_space = match components {
                    1 => ColorSpace::Gray,
                    3 => ColorSpace::Rgb,
                    4 => ColorSpace::Cmyk,
                    n => {
                        debug!(components = n, "unsupported JPEG component count");
                        return None;
                    }
                };
                if len != 8 + 3 * components as usize {
                    debug!(len, "unexpected frame header length");
                    return None;
                }
                s.skip(3 * components as usize);
                frame = Some(JpegInfo {
                    width,
                    height,
                    bits_per_component,
                    color_space,
                });
            }
            EOI => return None,
            // standalone markers carry no length
            TEM | 0x00 | 0xd0..=0xd7 => {}
            _ => s.skip_segment()?,
        }
    }
    frame
}
