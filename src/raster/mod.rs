//! Embedded raster images
//!
//! JFIF files are embedded verbatim with the `DCTDecode` filter. Anything
//! else goes through a [`RasterConverter`] to PNM, is reduced to 8-bit
//! samples and stored zlib-compressed with `FlateDecode`.
//!
//! Every failure here is an [`ImageError`]; the caller skips the image and
//! carries on with the rest of the document.

pub mod converter;
pub mod jpeg;
pub mod pnm;

use std::io::Write;
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::write::ZlibEncoder;
use glam::DVec2;
use tracing::debug;

pub use converter::{Anytopnm, RasterConverter};

use crate::diagnostics::{Diagnostics, Warning};
use crate::errors::ImageError;
use crate::render::defaults::HEX_LINE_WIDTH;
use crate::render::xml::{XmlWriter, fmt_fixed};

/// Color space tag of an embedded image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpace {
    Gray,
    Rgb,
    Cmyk,
}

impl ColorSpace {
    pub fn components(self) -> usize {
        match self {
            ColorSpace::Gray => 1,
            ColorSpace::Rgb => 3,
            ColorSpace::Cmyk => 4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ColorSpace::Gray => "DeviceGray",
            ColorSpace::Rgb => "DeviceRGB",
            ColorSpace::Cmyk => "DeviceCMYK",
        }
    }
}

/// Stream filter applied to the payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    /// JPEG bytes stored as they are
    Dct,
    /// zlib-compressed samples
    Flate,
}

impl Filter {
    pub fn as_str(self) -> &'static str {
        match self {
            Filter::Dct => "DCTDecode",
            Filter::Flate => "FlateDecode",
        }
    }
}

/// An image ready to be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    pub width: usize,
    pub height: usize,
    pub color_space: ColorSpace,
    pub data: Vec<u8>,
    /// `None` for uncompressed samples
    pub filter: Option<Filter>,
}

/// Locates and loads images referenced by a document
pub struct ImageLoader {
    base_dir: Option<PathBuf>,
    converter: Box<dyn RasterConverter>,
}

impl Default for ImageLoader {
    fn default() -> Self {
        Self {
            base_dir: None,
            converter: Box::new(Anytopnm::default()),
        }
    }
}

impl ImageLoader {
    /// Resolve relative image names against `dir`
    pub fn with_base_dir(mut self, dir: Option<&Path>) -> Self {
        self.base_dir = dir
            .filter(|d| !d.as_os_str().is_empty())
            .map(Path::to_path_buf);
        self
    }

    pub fn with_converter(mut self, converter: impl RasterConverter + 'static) -> Self {
        self.converter = Box::new(converter);
        self
    }

    /// Path of an image as named in the document
    pub fn resolve(&self, filename: &str) -> PathBuf {
        let path = Path::new(filename);
        match &self.base_dir {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path.to_path_buf(),
        }
    }

    /// Load and encode an image. Compression failures degrade to an
    /// uncompressed payload with a diagnostic.
    pub fn load(&self, filename: &str, diagnostics: &mut Diagnostics) -> Result<RasterImage, ImageError> {
        let path = self.resolve(filename);
        let bytes = std::fs::read(&path).map_err(|source| ImageError::Unreadable {
            path: path.clone(),
            source,
        })?;

        if let Some(info) = jpeg::scan(&bytes) {
            debug!(path = %path.display(), width = info.width, height = info.height, "embedding JPEG");
            if info.bits_per_component != 8 {
                return Err(ImageError::BitsPerComponent {
                    bits: info.bits_per_component,
                });
            }
            return Ok(RasterImage {
                width: info.width,
                height: info.height,
                color_space: info.color_space,
                data: bytes,
                filter: Some(Filter::Dct),
            });
        }

        let stream = self.converter.to_pnm(&path)?;
        let bitmap = pnm::decode(&stream)?;
        debug!(path = %path.display(), width = bitmap.width, height = bitmap.height, "embedding bitmap");

        let (data, filter) = match deflate(&bitmap.samples) {
            Ok(compressed) => (compressed, Some(Filter::Flate)),
            Err(e) => {
                diagnostics.push(Warning::ImageUncompressed {
                    message: e.to_string(),
                });
                (bitmap.samples, None)
            }
        };
        Ok(RasterImage {
            width: bitmap.width,
            height: bitmap.height,
            color_space: bitmap.color_space,
            data,
            filter,
        })
    }
}

/// zlib at maximum compression
fn deflate(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::best());
    encoder.write_all(data)?;
    encoder.finish()
}

/// Whether the rectangle `from`-`to` has a non-zero width and height
pub fn has_area(from: DVec2, to: DVec2) -> bool {
    from.x != to.x && from.y != to.y
}

/// Write an `<image>` element placed on the rectangle `from`-`to` (Ipe
/// coordinates). Flipped images get a matrix mirroring them about the
/// rectangle's diagonal; a rectangle without area cannot be mirrored and
/// is written unflipped.
pub fn write_image(w: &mut XmlWriter, image: &RasterImage, from: DVec2, to: DVec2, flipped: bool) {
    w.raw("<image");
    if image.width > 0 && image.height > 0 {
        w.attr("width", image.width).attr("height", image.height);
    }
    w.attr("ColorSpace", image.color_space.as_str())
        .attr("BitsPerComponent", 8)
        .attr("length", image.data.len());
    if let Some(filter) = image.filter {
        w.attr("Filter", filter.as_str());
    }
    if flipped && has_area(from, to) {
        let r = (to.x - from.x) / (to.y - from.y);
        let mid = (from + to) / 2.0;
        let m = [0.0, 1.0 / r, r, 0.0, mid.x - r * mid.y, mid.y - mid.x / r];
        let m: Vec<String> = m.iter().map(|&v| fmt_fixed(v)).collect();
        w.attr("matrix", m.join(" "));
    }
    w.attr_nums("rect", &[from.x, from.y, to.x, to.y]);
    w.raw(">\n");
    write_hex(w, &image.data);
    w.raw("</image>\n");
}

/// Lowercase hex, [`HEX_LINE_WIDTH`] digits per line
fn write_hex(w: &mut XmlWriter, data: &[u8]) {
    for line in data.chunks(HEX_LINE_WIDTH / 2) {
        w.raw(&hex::encode(line)).raw("\n");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedPnm {
        stream: Vec<u8>,
    }

    impl RasterConverter for FixedPnm {
        fn to_pnm(&self, _path: &Path) -> Result<Vec<u8>, ImageError> {
            Ok(self.stream.clone())
        }
    }

    fn written(image: &RasterImage, flipped: bool) -> String {
        let mut w = XmlWriter::new();
        write_image(&mut w, image, DVec2::new(0.0, 100.0), DVec2::new(50.0, 0.0), flipped);
        String::from_utf8(w.into_bytes()).unwrap()
    }

    #[test]
    fn hex_lines_hold_36_digits() {
        let image = RasterImage {
            width: 0,
            height: 0,
            color_space: ColorSpace::Gray,
            data: (0u8..20).collect(),
            filter: None,
        };
        let out = written(&image, false);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(
            lines[0],
            r#"<image ColorSpace="DeviceGray" BitsPerComponent="8" length="20" rect="0 100 50 0">"#
        );
        assert_eq!(lines[1], "000102030405060708090a0b0c0d0e0f1011");
        assert_eq!(lines[2], "1213");
        assert_eq!(lines[3], "</image>");
    }

    #[test]
    fn flipped_image_gets_matrix() {
        let image = RasterImage {
            width: 2,
            height: 1,
            color_space: ColorSpace::Rgb,
            data: vec![0xab],
            filter: Some(Filter::Dct),
        };
        let out = written(&image, true);
        // r = 50 / -100 = -0.5, center (25, 50)
        assert!(out.starts_with(
            "<image width=\"2\" height=\"1\" ColorSpace=\"DeviceRGB\" BitsPerComponent=\"8\" \
             length=\"1\" Filter=\"DCTDecode\" \
             matrix=\"0.000000 -2.000000 -0.500000 0.000000 50.000000 100.000000\" rect=\"0 100 50 0\">\nab\n"
        ));
    }

    #[test]
    fn flat_flipped_image_has_no_matrix() {
        let image = RasterImage {
            width: 1,
            height: 1,
            color_space: ColorSpace::Gray,
            data: vec![0],
            filter: None,
        };
        let mut w = XmlWriter::new();
        write_image(&mut w, &image, DVec2::new(0.0, 10.0), DVec2::new(50.0, 10.0), true);
        let out = String::from_utf8(w.into_bytes()).unwrap();
        assert!(!out.contains("matrix"), "{}", out);
        assert!(!out.contains("inf"), "{}", out);
        assert!(out.contains(" rect=\"0 10 50 10\">"));
    }

    #[test]
    fn twelve_bit_jpeg_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut jpeg = jpeg::tests::sample_jpeg(3);
        let sof = jpeg.windows(2).position(|m| m == [0xff, 0xc0]).unwrap();
        jpeg[sof + 4] = 12;
        std::fs::write(dir.path().join("deep.jpg"), &jpeg).unwrap();

        let loader = ImageLoader::default().with_base_dir(Some(dir.path()));
        let mut diags = Diagnostics::new();
        let err = loader.load("deep.jpg", &mut diags).unwrap_err();
        assert!(matches!(err, ImageError::BitsPerComponent { bits: 12 }));
    }

    #[test]
    fn relative_names_use_base_dir() {
        let loader = ImageLoader::default().with_base_dir(Some(Path::new("/figs")));
        assert_eq!(loader.resolve("a.png"), PathBuf::from("/figs/a.png"));
        assert_eq!(loader.resolve("/abs/b.png"), PathBuf::from("/abs/b.png"));

        let loader = ImageLoader::default().with_base_dir(Some(Path::new("")));
        assert_eq!(loader.resolve("a.png"), PathBuf::from("a.png"));
    }

    #[test]
    fn jpeg_is_embedded_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let jpeg = jpeg::tests::sample_jpeg(3);
        std::fs::write(dir.path().join("photo.jpg"), &jpeg).unwrap();

        let loader = ImageLoader::default()
            .with_base_dir(Some(dir.path()))
            .with_converter(FixedPnm { stream: Vec::new() });
        let mut diags = Diagnostics::new();
        let image = loader.load("photo.jpg", &mut diags).unwrap();
        assert_eq!(image.data, jpeg);
        assert_eq!(image.filter, Some(Filter::Dct));
        assert_eq!((image.width, image.height), (64, 32));
        assert!(diags.is_empty());
    }

    #[test]
    fn other_formats_are_converted_and_deflated() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("pic.png"), b"\x89PNG").unwrap();

        let mut stream = b"P5 2 2 255\n".to_vec();
        stream.extend_from_slice(&[10, 20, 30, 40]);
        let loader = ImageLoader::default()
            .with_base_dir(Some(dir.path()))
            .with_converter(FixedPnm { stream });
        let mut diags = Diagnostics::new();
        let image = loader.load("pic.png", &mut diags).unwrap();
        assert_eq!(image.filter, Some(Filter::Flate));
        assert_eq!(image.color_space, ColorSpace::Gray);

        let mut inflated = Vec::new();
        let mut decoder = flate2::read::ZlibDecoder::new(&image.data[..]);
        std::io::Read::read_to_end(&mut decoder, &mut inflated).unwrap();
        assert_eq!(inflated, vec![10, 20, 30, 40]);
    }

    #[test]
    fn unreadable_file_is_an_image_error() {
        let loader = ImageLoader::default();
        let mut diags = Diagnostics::new();
        let err = loader.load("/nonexistent/figru/pic.png", &mut diags).unwrap_err();
        assert!(matches!(err, ImageError::Unreadable { .. }));
    }
}
