//! FIG color table: 32 fixed colors followed by 512 user-defined slots.

use crate::diagnostics::{Diagnostics, Warning};

pub const FIXED_COLORS: usize = 32;
pub const USER_COLORS: usize = 512;
pub const COLOR_COUNT: usize = FIXED_COLORS + USER_COLORS;

/// Color index used to replace out-of-range references
pub const DEFAULT_COLOR: usize = 0;

/// The 32 built-in FIG colors as packed RGB
#[rustfmt::skip]
pub const FIXED_TABLE: [u32; FIXED_COLORS] = [
    0x000000, 0x0000ff, 0x00ff00, 0x00ffff,
    0xff0000, 0xff00ff, 0xffff00, 0xffffff,
    0x000090, 0x0000b0, 0x0000d0, 0x87ceff,
    0x009000, 0x00b000, 0x00d000, 0x009090,
    0x00b0b0, 0x00d0d0, 0x900000, 0xb00000,
    0xd00000, 0x900090, 0xb000b0, 0xd000d0,
    0x803000, 0xa04000, 0xc06000, 0xff8080,
    0xffa0a0, 0xffc0c0, 0xffe0e0, 0xffd700,
];

/// RGB color packed as 0xRRGGBB
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgb(pub u32);

impl Rgb {
    /// Channels scaled to 0.0 - 1.0
    pub fn channels(self) -> [f64; 3] {
        [
            ((self.0 >> 16) & 0xff) as f64 / 255.0,
            ((self.0 >> 8) & 0xff) as f64 / 255.0,
            (self.0 & 0xff) as f64 / 255.0,
        ]
    }
}

/// A validated index into the color table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ColorIndex(usize);

impl ColorIndex {
    pub const DEFAULT: ColorIndex = ColorIndex(DEFAULT_COLOR);

    /// Range-check a raw index read from the file.
    ///
    /// Out-of-range values (including the `-1` "default color") are clamped
    /// to [`DEFAULT_COLOR`] with a diagnostic.
    pub fn checked(raw: i32, diagnostics: &mut Diagnostics) -> ColorIndex {
        match usize::try_from(raw) {
            Ok(index) if index < COLOR_COUNT => ColorIndex(index),
            _ => {
                diagnostics.push(Warning::ColorOutOfRange { index: raw });
                ColorIndex::DEFAULT
            }
        }
    }

    pub fn get(self) -> usize {
        self.0
    }

    /// Black and the default color fill with plain gray levels
    pub fn is_black(self) -> bool {
        self.0 == 0
    }
}

/// Fixed palette plus user-defined colors
#[derive(Debug, Clone)]
pub struct ColorTable {
    user: Vec<Rgb>,
}

impl Default for ColorTable {
    fn default() -> Self {
        Self {
            user: vec![Rgb(0); USER_COLORS],
        }
    }
}

impl ColorTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define a user color. Slots outside [32, 544) are replaced by slot 32.
    pub fn define(&mut self, raw_index: i32, rgb: Rgb, diagnostics: &mut Diagnostics) {
        let slot = match usize::try_from(raw_index) {
            Ok(index) if (FIXED_COLORS..COLOR_COUNT).contains(&index) => index,
            _ => {
                diagnostics.push(Warning::UserColorOutOfRange {
                    index: raw_index,
                    replacement: FIXED_COLORS,
                });
                FIXED_COLORS
            }
        };
        self.user[slot - FIXED_COLORS] = rgb;
    }

    pub fn rgb(&self, index: ColorIndex) -> Rgb {
        let i = index.get();
        if i < FIXED_COLORS {
            Rgb(FIXED_TABLE[i])
        } else {
            self.user
                .get(i - FIXED_COLORS)
                .copied()
                .unwrap_or(Rgb(FIXED_TABLE[DEFAULT_COLOR]))
        }
    }
}
