//! Emission of the individual FIG object kinds
//!
//! Objects that cannot be drawn (nothing to stroke or fill, too few points)
//! are dropped with a diagnostic; the rest of the page is unaffected.

use crate::ast::*;
use crate::diagnostics::Warning;
use crate::errors::ImageError;
use crate::options::IpeFormat;
use crate::raster;
use crate::render::Emitter;
use crate::render::style::{write_arrows, write_paint};
use crate::render::xml::{fmt_fixed, fmt_nums};

/// Angle at which rotated text is snapped to an exact quarter turn
const QUARTER_TURN: f64 = 1.5708;

/// Number of control points of a picture's bounding box
const PICTURE_POINTS: usize = 5;

impl Emitter<'_, '_> {
    fn open_path(&mut self, common: &Common) {
        let doc = self.doc;
        self.out.raw("<path");
        write_paint(
            &mut self.out,
            common,
            doc.colors(),
            doc.scaler(),
            self.diagnostics,
        );
    }

    pub(crate) fn write_ellipse(&mut self, e: &Ellipse) {
        if e.common.is_invisible() {
            self.diagnostics.push(Warning::InvisibleEllipse);
            return;
        }
        self.open_path(&e.common);
        let s = *self.doc.scaler();
        let (sa, ca) = e.angle.sin_cos();
        let m = [
            s.x(e.radius.x * ca),
            s.x(e.radius.x * sa),
            s.x(-e.radius.y * sa),
            s.x(e.radius.y * ca),
            s.x(e.center.x),
            s.y(e.center.y),
        ];
        self.out.raw(">\n").raw(&fmt_nums(&m)).raw(" e\n</path>\n");
    }

    pub(crate) fn write_polyline(&mut self, p: &Polyline) {
        if p.kind == PolylineKind::Picture {
            self.write_picture(p);
            return;
        }
        if p.points.len() < 2 {
            self.diagnostics.push(Warning::TooFewPoints);
            return;
        }
        if p.common.is_invisible() {
            self.diagnostics.push(Warning::InvisiblePolyline);
            return;
        }
        if p.kind == PolylineKind::ArcBox {
            self.diagnostics.push(Warning::ArcBoxAsRectangle);
        }

        self.open_path(&p.common);
        let s = *self.doc.scaler();
        write_arrows(&mut self.out, &p.arrows, &s);
        if p.common.join_style != 0 {
            self.out.attr("join", p.common.join_style);
        }
        if p.common.cap_style != 0 {
            self.out.attr("cap", p.common.cap_style);
        }
        self.out.raw(">\n");

        let last = p.points.len() - 1;
        for (i, &pt) in p.points.iter().enumerate() {
            let q = s.point(pt);
            if i == 0 {
                self.out.raw(&fmt_nums(&[q.x, q.y])).raw(" m\n");
            } else if i == last && p.kind.is_closed() {
                self.out.raw("h\n");
            } else {
                self.out.raw(&fmt_nums(&[q.x, q.y])).raw(" l\n");
            }
        }
        self.out.raw("</path>\n");
    }

    fn write_picture(&mut self, p: &Polyline) {
        if p.points.len() != PICTURE_POINTS {
            self.diagnostics.push(
                ImageError::ControlPoints {
                    count: p.points.len(),
                }
                .into(),
            );
            return;
        }
        let Some(picture) = &p.picture else {
            return;
        };
        let image = match self.images.load(&picture.filename, self.diagnostics) {
            Ok(image) => image,
            Err(e) => {
                self.diagnostics.push(e.into());
                return;
            }
        };
        let s = self.doc.scaler();
        let from = s.point(p.points[0]);
        let to = s.point(p.points[2]);
        if picture.flipped && !raster::has_area(from, to) {
            self.diagnostics.push(Warning::ImageFlipIgnored);
        }
        raster::write_image(&mut self.out, &image, from, to, picture.flipped);
    }

    /// Splines are drawn through their control points
    pub(crate) fn write_spline(&mut self, s: &Spline) {
        self.diagnostics.push(Warning::SplineAsPolyline);
        let kind = if s.is_closed() {
            PolylineKind::Polygon
        } else {
            PolylineKind::Polyline
        };
        let polyline = Polyline {
            common: Common {
                join_style: 0,
                ..s.common.clone()
            },
            kind,
            corner_radius: 0,
            arrows: s.arrows,
            points: s.points.clone(),
            picture: None,
        };
        self.write_polyline(&polyline);
    }

    pub(crate) fn write_text(&mut self, t: &Text) {
        let s = *self.doc.scaler();
        let pos = s.point(t.position);

        self.out
            .raw("<text")
            .attr_num("size", s.magnification() * t.font_size)
            .attr_nums("pos", &[pos.x, pos.y]);
        if let Some(rgb) = crate::render::style::stroke(&t.common, self.doc.colors()) {
            self.out.attr_nums("stroke", &rgb);
        }
        match t.justification {
            Justification::Left => {}
            Justification::Center => {
                self.out.attr("halign", "center");
            }
            Justification::Right => {
                self.out.attr("halign", "right");
            }
        }
        if !t.has_flag(font_flags::RIGID) || t.angle != 0.0 {
            match self.options.format {
                IpeFormat::Ipe7 => self.out.attr("transformations", "affine"),
                IpeFormat::Ipe6 => self.out.attr("transformable", "yes"),
            };
        }
        if t.angle != 0.0 {
            let (sa, ca) = if t.angle == QUARTER_TURN {
                (1.0, 0.0)
            } else if t.angle == -QUARTER_TURN {
                (-1.0, 0.0)
            } else {
                t.angle.sin_cos()
            };
            // rotate about the text position
            let mtx = -sa * pos.y + ca * pos.x - pos.x;
            let mty = ca * pos.y - pos.y + sa * pos.x;
            let m: Vec<String> = [ca, sa, -sa, ca, -mtx, -mty]
                .iter()
                .map(|&v| fmt_fixed(v))
                .collect();
            self.out.attr("matrix", m.join(" "));
        }
        self.out.raw(" type=\"label\">");

        let macro_name = match self.font_macro(t) {
            Some(name) => name,
            None => {
                self.out.text(&t.string).raw("</text>\n");
                return;
            }
        };
        self.out
            .raw("\\")
            .raw(macro_name)
            .raw("{")
            .text(&t.string)
            .raw("}</text>\n");
    }

    /// LaTeX macro wrapping the text, `None` for the plain font
    fn font_macro(&mut self, t: &Text) -> Option<&'static str> {
        if t.has_flag(font_flags::SPECIAL) {
            return None;
        }
        if t.has_flag(font_flags::POSTSCRIPT) {
            self.diagnostics.push(Warning::PostscriptFont);
            return None;
        }
        match t.font {
            0 => None,
            1 => Some("textrm"),
            2 => Some("textbf"),
            3 => Some("emph"),
            4 => Some("textsf"),
            5 => Some("texttt"),
            font => {
                self.diagnostics.push(Warning::UnsupportedFont { font });
                None
            }
        }
    }

    pub(crate) fn write_arc(&mut self, a: &Arc) {
        if a.common.is_invisible() {
            self.diagnostics.push(Warning::InvisibleArc);
            return;
        }
        self.open_path(&a.common);
        let s = *self.doc.scaler();
        write_arrows(&mut self.out, &a.arrows, &s);
        self.out.raw(">\n");

        let [first, _, last] = a.points;
        let (begin, end) = if a.direction == 0 {
            (last, first)
        } else {
            (first, last)
        };
        let radius = first.distance(a.center);
        let b = s.point(begin);
        let e = s.point(end);
        let c = s.point(a.center);
        let r = s.x(radius);
        self.out.raw(&fmt_nums(&[b.x, b.y])).raw(" m\n");
        self.out
            .raw(&fmt_nums(&[r, 0.0, 0.0, r, c.x, c.y, e.x, e.y]))
            .raw(" a\n</path>\n");
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::*;
    use crate::diagnostics::{Category, Diagnostics};
    use crate::options::{IpeFormat, Options};
    use crate::raster::ImageLoader;
    use crate::render::render;
    use crate::resolve::resolve;
    use glam::DVec2;

    fn header() -> Header {
        Header {
            minor_version: 2,
            orientation: "Landscape".into(),
            justification: "Center".into(),
            units: Units::Inches,
            paper_size: None,
            magnification: 100.0,
            resolution: 1200,
            coord_system: 2,
        }
    }

    /// Render objects and return only the page body
    fn body_with(object: SceneObject, options: &Options) -> (String, Diagnostics) {
        let mut doc = Document::new(header());
        doc.objects = vec![object];
        let resolved = resolve(doc).unwrap();
        let mut diags = Diagnostics::new();
        let out = render(&resolved, options, &ImageLoader::default(), &mut diags);
        let out = String::from_utf8(out).unwrap();
        let start = out.find("<page>\n").unwrap() + "<page>\n".len();
        let end = out.find("</page>").unwrap();
        (out[start..end].to_string(), diags)
    }

    fn body(object: SceneObject) -> (String, Diagnostics) {
        body_with(object, &Options::default())
    }

    fn ellipse(thickness: f64, area_fill: i32) -> Ellipse {
        Ellipse {
            common: Common {
                thickness,
                area_fill,
                ..Common::default()
            },
            sub_kind: 3,
            direction: 1,
            angle: 0.0,
            center: DVec2::new(1200.0, 1200.0),
            radius: DVec2::new(600.0, 300.0),
            start: DVec2::ZERO,
            end: DVec2::ZERO,
        }
    }

    fn polyline(kind: PolylineKind, points: &[(f64, f64)]) -> Polyline {
        Polyline {
            common: Common::default(),
            kind,
            corner_radius: -1,
            arrows: Arrows::default(),
            points: points.iter().map(|&(x, y)| DVec2::new(x, y)).collect(),
            picture: None,
        }
    }

    fn text(string: &str) -> Text {
        Text {
            common: Common::default(),
            justification: Justification::Left,
            font: 0,
            font_size: 12.0,
            angle: 0.0,
            font_flags: font_flags::RIGID,
            height: 0.0,
            length: 0.0,
            position: DVec2::new(1200.0, 2400.0),
            string: string.as_bytes().to_vec(),
        }
    }

    #[test]
    fn ellipse_is_a_transformed_circle() {
        let (out, diags) = body(ellipse(1.0, -1).into());
        assert_eq!(
            out,
            "<path stroke=\"0 0 0\" pen=\"0.9\">\n36 0 0 18 72 770 e\n</path>\n"
        );
        assert!(diags.is_empty());
    }

    #[test]
    fn invisible_ellipse_is_dropped() {
        let (out, diags) = body(ellipse(0.0, -1).into());
        assert_eq!(out, "");
        assert_eq!(diags.count(Category::Geometry), 1);
    }

    #[test]
    fn filled_ellipse_without_stroke_is_kept() {
        let (out, _) = body(ellipse(0.0, 20).into());
        assert!(out.starts_with("<path fill=\"0\">\n"));
    }

    #[test]
    fn open_and_closed_polylines() {
        let (out, _) = body(polyline(PolylineKind::Polyline, &[(0.0, 0.0), (1200.0, 0.0), (1200.0, 1200.0)]).into());
        assert_eq!(
            out,
            "<path stroke=\"0 0 0\" pen=\"0.9\">\n0 842 m\n72 842 l\n72 770 l\n</path>\n"
        );

        let (out, _) = body(
            polyline(
                PolylineKind::Box,
                &[(0.0, 0.0), (1200.0, 0.0), (1200.0, 1200.0), (0.0, 1200.0), (0.0, 0.0)],
            )
            .into(),
        );
        assert!(out.ends_with("0 770 l\nh\n</path>\n"), "{}", out);
    }

    #[test]
    fn polyline_writes_arrows_join_and_cap() {
        let mut p = polyline(PolylineKind::Polyline, &[(0.0, 0.0), (1200.0, 0.0)]);
        p.common.join_style = 1;
        p.common.cap_style = 2;
        p.common.line_style = 1;
        p.arrows.backward = Some(Arrow {
            height: 120.0,
            ..Arrow::default()
        });
        let (out, _) = body(p.into());
        assert!(
            out.starts_with(
                "<path stroke=\"0 0 0\" pen=\"0.9\" dash=\"dashed\" backarrow=\"7.2\" join=\"1\" cap=\"2\">\n"
            ),
            "{}",
            out
        );
    }

    #[test]
    fn degenerate_polylines_are_dropped() {
        let (out, diags) = body(polyline(PolylineKind::Polyline, &[(0.0, 0.0)]).into());
        assert_eq!(out, "");
        assert_eq!(diags.count(Category::Geometry), 1);

        let mut p = polyline(PolylineKind::Polygon, &[(0.0, 0.0), (1.0, 1.0)]);
        p.common.thickness = 0.0;
        let (out, diags) = body(p.into());
        assert_eq!(out, "");
        assert_eq!(diags.count(Category::Geometry), 1);
    }

    #[test]
    fn arc_box_becomes_rectangle() {
        let (out, diags) = body(
            polyline(PolylineKind::ArcBox, &[(0.0, 0.0), (1200.0, 0.0), (0.0, 0.0)]).into(),
        );
        assert!(out.ends_with("72 842 l\nh\n</path>\n"));
        assert_eq!(diags.count(Category::Geometry), 1);
    }

    #[test]
    fn picture_with_wrong_point_count_is_skipped() {
        let mut p = polyline(PolylineKind::Picture, &[(0.0, 0.0), (1.0, 1.0)]);
        p.picture = Some(PictureRef {
            flipped: false,
            filename: "photo.jpg".into(),
        });
        let (out, diags) = body(p.into());
        assert_eq!(out, "");
        assert_eq!(diags.count(Category::Image), 1);
    }

    #[test]
    fn closed_spline_becomes_polygon() {
        let s = Spline {
            common: Common::default(),
            sub_kind: 1,
            arrows: Arrows::default(),
            points: vec![DVec2::ZERO, DVec2::new(1200.0, 0.0), DVec2::ZERO],
        };
        let (out, diags) = body(s.into());
        assert_eq!(
            out,
            "<path stroke=\"0 0 0\" pen=\"0.9\">\n0 842 m\n72 842 l\nh\n</path>\n"
        );
        assert_eq!(diags.count(Category::Geometry), 1);
    }

    #[test]
    fn plain_rigid_text() {
        let (out, diags) = body(text("x < y & z").into());
        assert_eq!(
            out,
            "<text size=\"12\" pos=\"72 698\" stroke=\"0 0 0\" type=\"label\">x &lt; y &amp; z</text>\n"
        );
        assert!(diags.is_empty());
    }

    #[test]
    fn text_font_macros_and_alignment() {
        let mut t = text("bold");
        t.font = 2;
        t.justification = Justification::Center;
        t.font_flags = 0;
        let (out, _) = body(t.into());
        assert_eq!(
            out,
            "<text size=\"12\" pos=\"72 698\" stroke=\"0 0 0\" halign=\"center\" \
             transformations=\"affine\" type=\"label\">\\textbf{bold}</text>\n"
        );
    }

    #[test]
    fn ipe6_text_is_transformable() {
        let mut t = text("t");
        t.font_flags = 0;
        let (out, _) = body_with(t.into(), &Options::default().with_format(IpeFormat::Ipe6));
        assert!(out.contains(" transformable=\"yes\" "));
    }

    #[test]
    fn special_and_postscript_text_is_plain() {
        let mut t = text("$x^2$");
        t.font = 3;
        t.font_flags = font_flags::RIGID | font_flags::SPECIAL;
        let (out, diags) = body(t.into());
        assert!(out.contains("type=\"label\">$x^2$</text>"));
        assert!(diags.is_empty());

        let mut t = text("ps");
        t.font = 3;
        t.font_flags = font_flags::RIGID | font_flags::POSTSCRIPT;
        let (out, diags) = body(t.into());
        assert!(out.contains("type=\"label\">ps</text>"));
        assert_eq!(diags.count(Category::Range), 1);

        let mut t = text("odd");
        t.font = 17;
        let (out, diags) = body(t.into());
        assert!(out.contains("type=\"label\">odd</text>"));
        assert_eq!(diags.len(), 1);
    }

    #[test]
    fn quarter_turn_text_gets_exact_matrix() {
        let mut t = text("up");
        t.angle = 1.5708;
        let (out, _) = body(t.into());
        // rotation about (72, 698)
        assert!(
            out.contains(
                " transformations=\"affine\" matrix=\"0.000000 1.000000 -1.000000 0.000000 770.000000 626.000000\" type=\"label\">"
            ),
            "{}",
            out
        );
    }

    #[test]
    fn arc_direction_selects_endpoints() {
        let a = Arc {
            common: Common::default(),
            sub_kind: 1,
            direction: 1,
            arrows: Arrows::default(),
            center: DVec2::new(1200.0, 1200.0),
            points: [
                DVec2::new(2400.0, 1200.0),
                DVec2::new(1200.0, 0.0),
                DVec2::new(0.0, 1200.0),
            ],
        };
        let (out, _) = body(a.clone().into());
        assert_eq!(
            out,
            "<path stroke=\"0 0 0\" pen=\"0.9\">\n144 770 m\n72 0 0 72 72 770 0 770 a\n</path>\n"
        );

        let (out, _) = body(Arc { direction: 0, ..a }.into());
        assert!(out.contains("\n0 770 m\n72 0 0 72 72 770 144 770 a\n"));
    }

    #[test]
    fn invisible_arc_is_dropped() {
        let a = Arc {
            common: Common {
                thickness: 0.0,
                ..Common::default()
            },
            sub_kind: 1,
            direction: 1,
            arrows: Arrows::default(),
            center: DVec2::ZERO,
            points: [DVec2::ONE; 3],
        };
        let (out, diags) = body(a.into());
        assert_eq!(out, "");
        assert_eq!(diags.count(Category::Geometry), 1);
    }
}
