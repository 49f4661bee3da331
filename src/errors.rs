//! Error types with rich diagnostics using miette
//!
//! Only failures that threaten the structure of the document live here.
//! Anything confined to a single object is a [`crate::diagnostics::Warning`].

use std::path::PathBuf;

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Source context for error reporting
#[derive(Debug, Clone)]
pub struct SourceContext {
    /// Name of the source (filename or "<input>")
    pub name: String,
    /// The full source text, lossily decoded for display
    pub source: String,
}

impl SourceContext {
    /// Create a new source context
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
        }
    }

    /// Build a context from raw FIG bytes, which are not guaranteed to be UTF-8
    pub fn from_bytes(name: impl Into<String>, bytes: &[u8]) -> Self {
        Self::new(name, String::from_utf8_lossy(bytes).into_owned())
    }

    /// Create a NamedSource for miette
    pub fn named_source(&self) -> NamedSource<String> {
        NamedSource::new(&self.name, self.source.clone())
    }

    /// Span of `len` bytes at `offset`, clamped to the displayable source
    pub fn span(&self, offset: usize, len: usize) -> SourceSpan {
        let offset = offset.min(self.source.len());
        let len = len.min(self.source.len() - offset);
        (offset, len).into()
    }
}

// ============================================================================
// Format Errors
// ============================================================================

/// Fatal errors in the structure of a FIG document
#[derive(Error, Diagnostic, Debug)]
pub enum FormatError {
    #[error("not a FIG file: missing `#FIG` signature")]
    #[diagnostic(code(figru::parse::missing_signature))]
    MissingSignature {
        #[source_code]
        src: NamedSource<String>,
        #[label("expected `#FIG <version>` here")]
        span: SourceSpan,
    },

    #[error("unsupported FIG version {major}.{minor}")]
    #[diagnostic(
        code(figru::parse::unsupported_version),
        help("only FIG versions 3.0 - 3.2 can be converted")
    )]
    UnsupportedVersion {
        major: u32,
        minor: u32,
        #[source_code]
        src: NamedSource<String>,
        #[label("version declared here")]
        span: SourceSpan,
    },

    #[error("malformed header field: {field}")]
    #[diagnostic(code(figru::parse::malformed_header))]
    MalformedHeader {
        field: &'static str,
        #[source_code]
        src: NamedSource<String>,
        #[label("could not read {field}")]
        span: SourceSpan,
    },

    #[error("unexpected end of file while reading {context}")]
    #[diagnostic(code(figru::parse::unexpected_eof))]
    UnexpectedEof {
        context: &'static str,
        #[source_code]
        src: NamedSource<String>,
        #[label("input ends here")]
        span: SourceSpan,
    },

    #[error("unknown object type `{code}`")]
    #[diagnostic(code(figru::parse::unknown_object_type))]
    UnknownObjectType {
        code: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("not a FIG record type")]
        span: SourceSpan,
    },

    #[error("end of compound without matching begin")]
    #[diagnostic(code(figru::parse::unmatched_group_end))]
    UnmatchedGroupEnd {
        #[source_code]
        src: NamedSource<String>,
        #[label("no compound is open here")]
        span: SourceSpan,
    },

    #[error("end of file inside {depth} open compound(s)")]
    #[diagnostic(code(figru::parse::unclosed_group))]
    UnclosedGroup {
        depth: usize,
        #[source_code]
        src: NamedSource<String>,
        #[label("expected `-6` before this point")]
        span: SourceSpan,
    },

    #[error("could not read image orientation and filename")]
    #[diagnostic(code(figru::parse::missing_image_reference))]
    MissingImageReference {
        #[source_code]
        src: NamedSource<String>,
        #[label("picture record needs `orientation filename`")]
        span: SourceSpan,
    },

    #[error("invalid conversion scale: {message}")]
    #[diagnostic(code(figru::parse::invalid_scale))]
    InvalidScale { message: String },

    #[error("end of compound at object {index} has no matching begin")]
    #[diagnostic(code(figru::resolve::stray_group_end))]
    StrayGroupEnd { index: usize },

    #[error("compound starting at object {index} is never closed")]
    #[diagnostic(code(figru::resolve::unterminated_group))]
    UnterminatedGroup { index: usize },
}

// ============================================================================
// Conversion Errors
// ============================================================================

/// Errors that abort a whole conversion
#[derive(Error, Diagnostic, Debug)]
pub enum ConvertError {
    #[error("cannot open '{}'", path.display())]
    #[diagnostic(code(figru::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Format(#[from] FormatError),
}

// ============================================================================
// Image Errors
// ============================================================================

/// Reasons an embedded image is skipped; never fatal to the conversion
#[derive(Error, Debug)]
pub enum ImageError {
    #[error("image with {count} control points instead of 5")]
    ControlPoints { count: usize },

    #[error("cannot read image '{}': {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported number of bits per component: {bits}")]
    BitsPerComponent { bits: u8 },

    #[error("raster converter failed: {message}")]
    Converter { message: String },

    #[error("converter output not understood: {message}")]
    MalformedBitmap { message: &'static str },

    #[error("one-bit bitmaps are not supported")]
    UnsupportedBitmap,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_is_clamped_to_source() {
        let ctx = SourceContext::new("<input>", "#FIG 3.2\n");
        let span = ctx.span(100, 5);
        assert_eq!(span.offset(), 9);
        assert_eq!(span.len(), 0);

        let span = ctx.span(5, 10);
        assert_eq!(span.offset(), 5);
        assert_eq!(span.len(), 4);
    }

    #[test]
    fn lossy_context_keeps_ascii() {
        let ctx = SourceContext::from_bytes("a.fig", b"#FIG 3.2\n\xe9");
        assert!(ctx.source.starts_with("#FIG 3.2"));
        assert_eq!(ctx.name, "a.fig");
    }
}
