//! Read FIG source into a [`Document`]
//!
//! The header is matched line by line with the pest grammar in `fig.pest`;
//! the body is a stream of whitespace-delimited tokens whose meaning depends
//! on the record type, so it is read with a [`Cursor`].
//!
//! Numeric fields inside records are forgiving: a malformed token becomes
//! `-1` and a diagnostic. Structural problems (header, record type codes,
//! compound nesting, end of input inside a record) are fatal.

use glam::DVec2;
use pest::Parser;
use pest::iterators::Pair;
use tracing::{debug, info};

use crate::ast::*;
use crate::color::{ColorIndex, ColorTable, Rgb};
use crate::cursor::{Cursor, Line, Token};
use crate::diagnostics::{Diagnostics, Warning};
use crate::errors::{FormatError, SourceContext};
use crate::options::Options;
use crate::{FigParser, Rule};

/// Sentinel substituted for unreadable numbers
const MALFORMED: i32 = -1;

/// Terminator of a text payload, after the leading backslash
const TEXT_TERMINATOR: &[u8] = b"001";

/// Parse FIG source into a document
pub fn read_document(
    source: &[u8],
    ctx: &SourceContext,
    options: &Options,
    diagnostics: &mut Diagnostics,
) -> Result<Document, FormatError> {
    let mut reader = Reader {
        cursor: Cursor::new(source),
        ctx,
        options,
        diagnostics,
        minor_version: 0,
    };
    let header = reader.read_header()?;
    let mut doc = Document::new(header);
    reader.read_body(&mut doc)?;
    debug!(objects = doc.objects.len(), "read FIG body");
    Ok(doc)
}

struct Reader<'a, 'd> {
    cursor: Cursor<'a>,
    ctx: &'a SourceContext,
    options: &'a Options,
    diagnostics: &'d mut Diagnostics,
    minor_version: u32,
}

impl<'a> Reader<'a, '_> {
    // ------------------------------------------------------------------
    // Errors
    // ------------------------------------------------------------------

    fn eof(&self, context: &'static str) -> FormatError {
        FormatError::UnexpectedEof {
            context,
            src: self.ctx.named_source(),
            span: self.ctx.span(self.cursor.pos(), 0),
        }
    }

    fn malformed_header(&self, field: &'static str, line: &Line<'_>) -> FormatError {
        FormatError::MalformedHeader {
            field,
            src: self.ctx.named_source(),
            span: self.ctx.span(line.offset, line.text.len()),
        }
    }

    // ------------------------------------------------------------------
    // Primitive readers
    // ------------------------------------------------------------------

    fn token(&mut self, context: &'static str) -> Result<Token<'a>, FormatError> {
        self.cursor.next_token().ok_or_else(|| self.eof(context))
    }

    fn int(&mut self, context: &'static str) -> Result<i32, FormatError> {
        let token = self.token(context)?;
        Ok(token.parse_int().unwrap_or_else(|| {
            self.diagnostics.push(Warning::MalformedNumber {
                expected: "integer",
                token: token.display(),
            });
            MALFORMED
        }))
    }

    fn float(&mut self, context: &'static str) -> Result<f64, FormatError> {
        let token = self.token(context)?;
        Ok(token.parse_float().unwrap_or_else(|| {
            self.diagnostics.push(Warning::MalformedNumber {
                expected: "double",
                token: token.display(),
            });
            MALFORMED as f64
        }))
    }

    fn point(&mut self, context: &'static str) -> Result<DVec2, FormatError> {
        let x = self.float(context)?;
        let y = self.float(context)?;
        Ok(DVec2::new(x, y))
    }

    fn points(&mut self, count: i32, context: &'static str) -> Result<Vec<DVec2>, FormatError> {
        let count = usize::try_from(count).unwrap_or(0);
        // the count comes from the file; let a bogus one run into end of input
        let mut points = Vec::new();
        for _ in 0..count {
            points.push(self.point(context)?);
        }
        Ok(points)
    }

    fn skip_floats(&mut self, count: usize, context: &'static str) -> Result<(), FormatError> {
        for _ in 0..count {
            self.float(context)?;
        }
        Ok(())
    }

    fn color(&mut self, context: &'static str) -> Result<ColorIndex, FormatError> {
        let raw = self.int(context)?;
        Ok(ColorIndex::checked(raw, self.diagnostics))
    }

    fn arrow(&mut self) -> Result<Arrow, FormatError> {
        Ok(Arrow {
            kind: self.int("arrow")?,
            style: self.int("arrow")?,
            thickness: self.float("arrow")?,
            width: self.float("arrow")?,
            height: self.float("arrow")?,
        })
    }

    fn arrows(&mut self, forward: i32, backward: i32) -> Result<Arrows, FormatError> {
        let forward = if forward != 0 { Some(self.arrow()?) } else { None };
        let backward = if backward != 0 { Some(self.arrow()?) } else { None };
        Ok(Arrows { forward, backward })
    }

    // ------------------------------------------------------------------
    // Header
    // ------------------------------------------------------------------

    fn read_header(&mut self) -> Result<Header, FormatError> {
        let missing_signature = |ctx: &SourceContext, len: usize| FormatError::MissingSignature {
            src: ctx.named_source(),
            span: ctx.span(0, len),
        };

        let line = self
            .cursor
            .next_line()
            .ok_or_else(|| missing_signature(self.ctx, 0))?;
        let text = std::str::from_utf8(line.text)
            .map_err(|_| missing_signature(self.ctx, line.text.len()))?;
        let signature = FigParser::parse(Rule::signature, text)
            .ok()
            .and_then(|mut pairs| pairs.next())
            .ok_or_else(|| missing_signature(self.ctx, line.text.len()))?;

        let (major, minor) = parse_version(signature);
        if major != 3 || minor > 2 {
            return Err(FormatError::UnsupportedVersion {
                major,
                minor,
                src: self.ctx.named_source(),
                span: self.ctx.span(line.offset, line.text.len()),
            });
        }
        info!("FIG format version {}.{}", major, minor);
        self.minor_version = minor;

        let orientation = self.header_line("orientation")?;
        let orientation = lossy(orientation.text);
        let justification = self.header_line("justification")?;
        let justification = lossy(justification.text);
        let units = self.header_line("units")?;
        let units = if units.text.starts_with(b"Metric") {
            Units::Metric
        } else {
            Units::Inches
        };

        let mut paper_size = None;
        let mut magnification = 100.0;
        if minor == 2 {
            paper_size = Some(lossy(self.header_line("paper size")?.text));

            let line = self.header_line("magnification")?;
            magnification = self
                .header_fields(Rule::magnification, &line)
                .and_then(|fields| fields.into_iter().next())
                .and_then(|s| s.parse::<f64>().ok())
                .ok_or_else(|| self.malformed_header("magnification", &line))?;

            self.header_line("multiple page mode")?;
            self.header_line("transparent color")?;
        }

        let line = self.header_line("resolution")?;
        let fields = self
            .header_fields(Rule::resolution, &line)
            .ok_or_else(|| self.malformed_header("resolution", &line))?;
        let mut fields = fields.into_iter().map(|s| s.parse::<i32>());
        let resolution = match fields.next() {
            Some(Ok(r)) => r,
            _ => return Err(self.malformed_header("resolution", &line)),
        };
        let coord_system = match fields.next() {
            Some(Ok(c)) => c,
            _ => 2,
        };

        let header = Header {
            minor_version: minor,
            orientation,
            justification,
            units,
            paper_size,
            magnification,
            resolution,
            coord_system,
        };
        let scaler = header
            .scaler()
            .map_err(|e| FormatError::InvalidScale {
                message: format!("resolution {} / magnification {}: {}", resolution, magnification, e),
            })?;
        info!(
            "converting at {} FIG units per point, magnification {}",
            scaler.units_per_point(),
            scaler.magnification()
        );
        Ok(header)
    }

    fn header_line(&mut self, context: &'static str) -> Result<Line<'a>, FormatError> {
        self.cursor
            .next_content_line()
            .ok_or_else(|| self.eof(context))
    }

    /// Match a header line against `rule`, returning its numeric fields
    fn header_fields(&self, rule: Rule, line: &Line<'_>) -> Option<Vec<String>> {
        let text = std::str::from_utf8(line.text).ok()?;
        let pair = FigParser::parse(rule, text).ok()?.next()?;
        Some(
            pair.into_inner()
                .filter(|p| matches!(p.as_rule(), Rule::integer | Rule::number))
                .map(|p| p.as_str().to_string())
                .collect(),
        )
    }

    // ------------------------------------------------------------------
    // Body
    // ------------------------------------------------------------------

    fn read_body(&mut self, doc: &mut Document) -> Result<(), FormatError> {
        let mut level = 0usize;
        loop {
            self.cursor.skip_whitespace();
            match self.cursor.peek() {
                None => break,
                Some(b'#') => {
                    // freestanding comment between records
                    self.cursor.skip_line();
                    continue;
                }
                Some(_) => {}
            }

            let token = self.token("object type")?;
            let unknown = |ctx: &SourceContext| FormatError::UnknownObjectType {
                code: token.display(),
                src: ctx.named_source(),
                span: ctx.span(token.offset, token.text.len()),
            };
            let code = token.parse_int().ok_or_else(|| unknown(self.ctx))?;

            let object: SceneObject = match code {
                0 => {
                    self.read_color(&mut doc.colors)?;
                    continue;
                }
                1 => self.read_ellipse()?.into(),
                2 => self.read_polyline()?.into(),
                3 => self.read_spline()?.into(),
                4 => self.read_text()?.into(),
                5 => self.read_arc()?.into(),
                6 => {
                    let mut bbox = [0; 4];
                    for corner in bbox.iter_mut() {
                        *corner = self.int("compound bounding box")?;
                    }
                    level += 1;
                    Compound {
                        bbox,
                        depth: 0,
                        extent: None,
                    }
                    .into()
                }
                -6 => {
                    if level == 0 {
                        return Err(FormatError::UnmatchedGroupEnd {
                            src: self.ctx.named_source(),
                            span: self.ctx.span(token.offset, token.text.len()),
                        });
                    }
                    level -= 1;
                    CompoundEnd.into()
                }
                _ => return Err(unknown(self.ctx)),
            };
            doc.objects.push(object);
        }

        if level > 0 {
            return Err(FormatError::UnclosedGroup {
                depth: level,
                src: self.ctx.named_source(),
                span: self.ctx.span(self.cursor.pos(), 0),
            });
        }
        Ok(())
    }

    fn read_color(&mut self, colors: &mut ColorTable) -> Result<(), FormatError> {
        let index = self.int("color definition")?;
        let token = self.token("color definition")?;
        let rgb = token
            .as_str()
            .strip_prefix('#')
            .and_then(|hex| u32::from_str_radix(hex, 16).ok())
            .unwrap_or_else(|| {
                self.diagnostics.push(Warning::MalformedRgb {
                    token: token.display(),
                });
                0
            });
        colors.define(index, Rgb(rgb), self.diagnostics);
        Ok(())
    }

    fn read_ellipse(&mut self) -> Result<Ellipse, FormatError> {
        const CTX: &str = "ellipse";
        let sub_kind = self.int(CTX)?;
        let line_style = self.int(CTX)?;
        let thickness = self.float(CTX)?;
        let pen_color = self.color(CTX)?;
        let fill_color = self.color(CTX)?;
        let depth = self.int(CTX)?;
        let pen_style = self.int(CTX)?;
        let area_fill = self.int(CTX)?;
        let style_val = self.float(CTX)?;
        let direction = self.int(CTX)?;
        let angle = self.float(CTX)?;
        let center = self.point(CTX)?;
        let radius = self.point(CTX)?;
        let start = self.point(CTX)?;
        let end = self.point(CTX)?;
        Ok(Ellipse {
            common: Common {
                line_style,
                thickness,
                pen_color,
                fill_color,
                depth,
                pen_style,
                area_fill,
                style_val,
                cap_style: 0,
                join_style: 0,
            },
            sub_kind,
            direction,
            angle,
            center,
            radius,
            start,
            end,
        })
    }

    fn read_polyline(&mut self) -> Result<Polyline, FormatError> {
        const CTX: &str = "polyline";
        let kind = PolylineKind::from_code(self.int(CTX)?);
        let line_style = self.int(CTX)?;
        let thickness = self.float(CTX)?;
        let pen_color = self.color(CTX)?;
        let fill_color = self.color(CTX)?;
        let depth = self.int(CTX)?;
        let pen_style = self.int(CTX)?;
        let area_fill = self.int(CTX)?;
        let style_val = self.float(CTX)?;
        let join_style = self.int(CTX)?;
        let cap_style = self.int(CTX)?;
        let corner_radius = self.int(CTX)?;
        let forward = self.int(CTX)?;
        let backward = self.int(CTX)?;
        let npoints = self.int(CTX)?;
        let arrows = self.arrows(forward, backward)?;

        let picture = if kind == PolylineKind::Picture {
            Some(self.read_picture_ref()?)
        } else {
            None
        };
        let points = self.points(npoints, CTX)?;

        Ok(Polyline {
            common: Common {
                line_style,
                thickness,
                pen_color,
                fill_color,
                depth,
                pen_style,
                area_fill,
                style_val,
                cap_style,
                join_style,
            },
            kind,
            corner_radius,
            arrows,
            points,
            picture,
        })
    }

    fn read_picture_ref(&mut self) -> Result<PictureRef, FormatError> {
        let start = self.cursor.pos();
        let missing = |ctx: &SourceContext, end: usize| FormatError::MissingImageReference {
            src: ctx.named_source(),
            span: ctx.span(start, end.saturating_sub(start)),
        };
        let orientation = self
            .cursor
            .next_token()
            .and_then(|t| t.parse_int())
            .ok_or_else(|| missing(self.ctx, self.cursor.pos()))?;
        let filename = self
            .cursor
            .next_token()
            .ok_or_else(|| missing(self.ctx, self.cursor.pos()))?;
        Ok(PictureRef {
            flipped: orientation == 1,
            filename: filename.display(),
        })
    }

    fn read_spline(&mut self) -> Result<Spline, FormatError> {
        const CTX: &str = "spline";
        let sub_kind = self.int(CTX)?;
        let line_style = self.int(CTX)?;
        let thickness = self.float(CTX)?;
        let pen_color = self.color(CTX)?;
        let fill_color = self.color(CTX)?;
        let depth = self.int(CTX)?;
        let pen_style = self.int(CTX)?;
        let area_fill = self.int(CTX)?;
        let style_val = self.float(CTX)?;
        let cap_style = self.int(CTX)?;
        let forward = self.int(CTX)?;
        let backward = self.int(CTX)?;
        let npoints = self.int(CTX)?;
        let arrows = self.arrows(forward, backward)?;
        let points = self.points(npoints, CTX)?;

        let n = points.len();
        if self.minor_version == 2 {
            // one shape factor per control point
            self.skip_floats(n, CTX)?;
        } else if sub_kind > 1 {
            // left and right control points of interpolated splines
            self.skip_floats(4 * n, CTX)?;
        }

        Ok(Spline {
            common: Common {
                line_style,
                thickness,
                pen_color,
                fill_color,
                depth,
                pen_style,
                area_fill,
                style_val,
                cap_style,
                join_style: 0,
            },
            sub_kind,
            arrows,
            points,
        })
    }

    fn read_text(&mut self) -> Result<Text, FormatError> {
        const CTX: &str = "text";
        let justification = Justification::from_code(self.int(CTX)?);
        let pen_color = self.color(CTX)?;
        let depth = self.int(CTX)?;
        let pen_style = self.int(CTX)?;
        let font = self.int(CTX)?;
        let font_size = self.float(CTX)?;
        let angle = self.float(CTX)?;
        let font_flags = self.int(CTX)?;
        let height = self.float(CTX)?;
        let length = self.float(CTX)?;
        let position = self.point(CTX)?;
        // single blank between the position and the payload
        self.cursor.next_byte();
        let string = self.read_text_payload();

        Ok(Text {
            common: Common {
                thickness: 1.0,
                pen_color,
                depth,
                pen_style,
                ..Common::default()
            },
            justification,
            font,
            font_size,
            angle,
            font_flags,
            height,
            length,
            position,
            string,
        })
    }

    /// Read a text payload up to and excluding the `\001` terminator.
    ///
    /// `\\` stands for one backslash; bytes >= 0x80 are re-encoded as two
    /// bytes according to the configured [`crate::options::TextEncoding`].
    fn read_text_payload(&mut self) -> Vec<u8> {
        let encoding = self.options.text_encoding;
        let mut out = Vec::new();
        loop {
            let Some(b) = self.cursor.next_byte() else {
                self.diagnostics.push(Warning::UnterminatedText);
                break;
            };
            match b {
                b'\\' if self.cursor.starts_with(TEXT_TERMINATOR) => {
                    self.cursor.advance(TEXT_TERMINATOR.len());
                    break;
                }
                b'\\' => {
                    if self.cursor.peek() == Some(b'\\') {
                        self.cursor.advance(1);
                    }
                    out.push(b'\\');
                }
                b if b < 0x80 => out.push(b),
                b => out.extend_from_slice(&encoding.encode_high(b)),
            }
        }
        out
    }

    fn read_arc(&mut self) -> Result<Arc, FormatError> {
        const CTX: &str = "arc";
        let sub_kind = self.int(CTX)?;
        let line_style = self.int(CTX)?;
        let thickness = self.float(CTX)?;
        let pen_color = self.color(CTX)?;
        let fill_color = self.color(CTX)?;
        let depth = self.int(CTX)?;
        let pen_style = self.int(CTX)?;
        let area_fill = self.int(CTX)?;
        let style_val = self.float(CTX)?;
        let cap_style = self.int(CTX)?;
        let direction = self.int(CTX)?;
        let forward = self.int(CTX)?;
        let backward = self.int(CTX)?;
        let center = self.point(CTX)?;
        let points = [self.point(CTX)?, self.point(CTX)?, self.point(CTX)?];
        let arrows = self.arrows(forward, backward)?;

        Ok(Arc {
            common: Common {
                line_style,
                thickness,
                pen_color,
                fill_color,
                depth,
                pen_style,
                area_fill,
                style_val,
                cap_style,
                join_style: 0,
            },
            sub_kind,
            direction,
            arrows,
            center,
            points,
        })
    }
}

fn parse_version(signature: Pair<'_, Rule>) -> (u32, u32) {
    let mut major = u32::MAX;
    let mut minor = u32::MAX;
    for pair in signature.into_inner() {
        match pair.as_rule() {
            Rule::major => major = pair.as_str().parse().unwrap_or(u32::MAX),
            Rule::minor => minor = pair.as_str().parse().unwrap_or(u32::MAX),
            _ => {}
        }
    }
    (major, minor)
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).trim().to_string()
}
