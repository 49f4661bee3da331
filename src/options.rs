//! Conversion options, fixed for the whole run.

/// Which Ipe file format generation to write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IpeFormat {
    /// Ipe 6 (`version="60028"`)
    Ipe6,
    /// Ipe 7 (`version="70000"`)
    #[default]
    Ipe7,
}

/// How text bytes with the high bit set are re-encoded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextEncoding {
    /// Two bytes `0xC0 | (b >> 6)` and `b & 0x3F`. The second byte lacks the
    /// UTF-8 continuation bit; this is the byte pattern existing Ipe files
    /// produced from FIG sources contain.
    #[default]
    Legacy,
    /// Proper UTF-8 for Latin-1 input: the second byte is `0x80 | (b & 0x3F)`.
    Utf8,
}

impl TextEncoding {
    /// Re-encode one byte >= 0x80 as two bytes
    pub fn encode_high(self, byte: u8) -> [u8; 2] {
        let lead = 0xc0 | ((byte >> 6) & 0x3);
        match self {
            TextEncoding::Legacy => [lead, byte & 0x3f],
            TextEncoding::Utf8 => [lead, 0x80 | (byte & 0x3f)],
        }
    }
}

/// Options for a conversion
#[derive(Debug, Clone, Default)]
pub struct Options {
    pub format: IpeFormat,
    /// Put the whole page into one extra group
    pub group: bool,
    /// Size the figure by its crop box instead of the fixed page frame
    pub cropbox: bool,
    /// LaTeX preamble, e.g. `\usepackage{amsmath}`
    pub preamble: Option<String>,
    pub text_encoding: TextEncoding,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_format(mut self, format: IpeFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_group(mut self, group: bool) -> Self {
        self.group = group;
        self
    }

    pub fn with_cropbox(mut self, cropbox: bool) -> Self {
        self.cropbox = cropbox;
        self
    }

    pub fn with_preamble(mut self, preamble: impl Into<String>) -> Self {
        self.preamble = Some(preamble.into());
        self
    }

    pub fn with_text_encoding(mut self, encoding: TextEncoding) -> Self {
        self.text_encoding = encoding;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_encoding_omits_continuation_bit() {
        // 0xE9 is Latin-1 'é'
        assert_eq!(TextEncoding::Legacy.encode_high(0xe9), [0xc3, 0x29]);
    }

    #[test]
    fn utf8_encoding_matches_std() {
        let encoded = TextEncoding::Utf8.encode_high(0xe9);
        assert_eq!(&encoded, "é".as_bytes());
    }

    #[test]
    fn defaults() {
        let opts = Options::new();
        assert_eq!(opts.format, IpeFormat::Ipe7);
        assert!(!opts.group);
        assert!(!opts.cropbox);
        assert!(opts.preamble.is_none());
        assert_eq!(opts.text_encoding, TextEncoding::Legacy);
    }
}
