//! Convert FIG drawings (xfig 3.0 - 3.2) into Ipe XML documents.
//!
//! The pipeline has three phases, each completing before the next starts:
//!
//! 1. [`parse::read_document`] reads the source into a flat [`ast::Document`]
//! 2. [`resolve::resolve`] links compounds and computes their paint depth
//! 3. [`render::render`] writes the Ipe document, depth-sorted per group
//!
//! Problems confined to one object are collected as [`Warning`]s; anything
//! that breaks the document structure is a [`FormatError`].

use std::path::Path;

use pest_derive::Parser;

pub mod ast;
pub mod color;
pub mod cursor;
pub mod diagnostics;
pub mod errors;
pub mod options;
pub mod parse;
pub mod raster;
pub mod render;
pub mod resolve;
pub mod types;

pub use diagnostics::{Category, Diagnostics, Warning};
pub use errors::{ConvertError, FormatError, ImageError, SourceContext};
pub use options::{IpeFormat, Options, TextEncoding};
pub use raster::{Anytopnm, ImageLoader, RasterConverter};

#[derive(Parser)]
#[grammar = "fig.pest"]
pub struct FigParser;

/// Result of a successful conversion
#[derive(Debug)]
pub struct Conversion {
    /// The Ipe document. Not necessarily UTF-8 with [`TextEncoding::Legacy`].
    pub output: Vec<u8>,
    pub warnings: Vec<Warning>,
}

impl Conversion {
    /// Output as text, replacing invalid sequences
    pub fn output_lossy(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.output)
    }
}

/// Convert FIG source to Ipe.
///
/// Images are looked up relative to the working directory and converted
/// with `anytopnm` when they are not JFIF files.
pub fn convert(source: &[u8], name: &str, options: &Options) -> Result<Conversion, ConvertError> {
    convert_with(source, name, options, &ImageLoader::default())
}

/// Convert FIG source to Ipe, loading images through `images`
pub fn convert_with(
    source: &[u8],
    name: &str,
    options: &Options,
    images: &ImageLoader,
) -> Result<Conversion, ConvertError> {
    let ctx = SourceContext::from_bytes(name, source);
    let mut diagnostics = Diagnostics::new();

    let document = parse::read_document(source, &ctx, options, &mut diagnostics)?;
    let resolved = resolve::resolve(document)?;
    let output = render::render(&resolved, options, images, &mut diagnostics);

    Ok(Conversion {
        output,
        warnings: diagnostics.into_warnings(),
    })
}

/// Read and convert a FIG file; images resolve relative to its directory
pub fn convert_file(path: &Path, options: &Options) -> Result<Conversion, ConvertError> {
    let source = std::fs::read(path).map_err(|source| ConvertError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let images = ImageLoader::default().with_base_dir(path.parent());
    convert_with(&source, &path.display().to_string(), options, &images)
}
