//! Ipe XML output for resolved FIG documents
//!
//! This module is organized into submodules:
//! - `defaults`: page geometry and document scaffolding
//! - `style`: stroke, fill, pen, dash and arrow attributes
//! - `shapes`: per-object emission
//! - `xml`: byte-oriented writer and number formatting

pub mod defaults;
pub mod shapes;
pub mod style;
pub mod xml;

use std::cmp::Reverse;

use tracing::debug;

use crate::ast::{SceneItem, SceneObject};
use crate::diagnostics::Diagnostics;
use crate::options::{IpeFormat, Options};
use crate::raster::ImageLoader;
use crate::resolve::ResolvedDocument;
use defaults::*;
use xml::XmlWriter;

/// Render a resolved document to an Ipe file
pub fn render(
    doc: &ResolvedDocument,
    options: &Options,
    images: &ImageLoader,
    diagnostics: &mut Diagnostics,
) -> Vec<u8> {
    let mut emitter = Emitter {
        doc,
        options,
        images,
        diagnostics,
        out: XmlWriter::new(),
    };
    emitter.write_prologue();
    if options.group {
        emitter.out.raw("<group>\n");
    }
    emitter.write_objects(doc.top_level());
    if options.group {
        emitter.out.raw("</group>\n");
    }
    emitter.out.raw("</page>\n</ipe>\n");
    debug!(bytes = emitter.out.len(), "rendered Ipe document");
    emitter.out.into_bytes()
}

/// Sort sibling indices so deeper objects come first; ties keep file order
pub fn paint_order(doc: &ResolvedDocument, mut siblings: Vec<usize>) -> Vec<usize> {
    let objects = doc.objects();
    siblings.sort_by_key(|&i| Reverse(objects[i].depth()));
    siblings
}

enum Step {
    Object(usize),
    CloseGroup,
}

/// State of one rendering pass
pub(crate) struct Emitter<'a, 'd> {
    pub(crate) doc: &'a ResolvedDocument,
    pub(crate) options: &'a Options,
    pub(crate) images: &'a ImageLoader,
    pub(crate) diagnostics: &'d mut Diagnostics,
    pub(crate) out: XmlWriter,
}

impl Emitter<'_, '_> {
    fn write_prologue(&mut self) {
        let options = self.options;
        let ipe7 = options.format == IpeFormat::Ipe7;
        let out = &mut self.out;

        if ipe7 {
            out.raw("<?xml version=\"1.0\"?>\n<!DOCTYPE ipe SYSTEM \"ipe.dtd\">\n");
        }
        out.raw("<ipe")
            .attr("version", if ipe7 { IPE7_VERSION } else { IPE6_VERSION })
            .attr("creator", CREATOR)
            .raw(">\n");
        if ipe7 {
            out.raw("<info/>\n");
        } else {
            out.raw("<info")
                .attr("media", format!("0 0 {} {}", PAGE_WIDTH, PAGE_HEIGHT));
            if options.cropbox {
                out.attr("bbox", "cropbox");
            }
            out.raw("/>\n");
        }

        if let Some(preamble) = &options.preamble {
            out.raw("<preamble>").raw(preamble).raw("\n</preamble>\n");
        }

        if ipe7 {
            out.raw("<ipestyle name=\"ipe6colors\">\n");
            for (name, value) in IPE6_COLORS {
                out.raw("<color").attr("name", name).attr("value", value).raw("/>\n");
            }
            out.raw("</ipestyle>\n");

            let size = format!("{} {}", PAGE_WIDTH, PAGE_HEIGHT);
            out.raw("<ipestyle>\n<layout")
                .attr("paper", &size)
                .attr("origin", "0 0")
                .attr("frame", &size);
            if !options.cropbox {
                out.attr("crop", "no");
            }
            out.raw("/>\n</ipestyle>\n");
        }
        out.raw("<page>\n");
    }

    /// Write page-level objects and, through an explicit work stack, the
    /// members of every compound in paint order
    fn write_objects(&mut self, top_level: Vec<usize>) {
        let doc = self.doc;
        let mut work: Vec<Step> = paint_order(doc, top_level)
            .into_iter()
            .rev()
            .map(Step::Object)
            .collect();

        while let Some(step) = work.pop() {
            let index = match step {
                Step::CloseGroup => {
                    self.out.raw("</group>\n");
                    continue;
                }
                Step::Object(index) => index,
            };
            match &doc.objects()[index] {
                SceneObject::Ellipse(e) => self.write_ellipse(e),
                SceneObject::Polyline(p) => self.write_polyline(p),
                SceneObject::Spline(s) => self.write_spline(s),
                SceneObject::Text(t) => self.write_text(t),
                SceneObject::Arc(a) => self.write_arc(a),
                SceneObject::Compound(c) => {
                    // an unresolved compound has no known members
                    let Some(end) = c.extent else { continue };
                    self.out.raw("<group>\n");
                    work.push(Step::CloseGroup);
                    let members = paint_order(doc, doc.children(index + 1, end));
                    work.extend(members.into_iter().rev().map(Step::Object));
                }
                SceneObject::CompoundEnd(_) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::*;
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

    /// A text object whose content names it
    fn label(name: &str, depth: i32) -> SceneObject {
        Text {
            common: Common {
                depth,
                ..Common::default()
            },
            justification: Justification::Left,
            font: 0,
            font_size: 12.0,
            angle: 0.0,
            font_flags: font_flags::RIGID,
            height: 0.0,
            length: 0.0,
            position: DVec2::ZERO,
            string: name.as_bytes().to_vec(),
        }
        .into()
    }

    fn rendered(objects: Vec<SceneObject>, options: &Options) -> String {
        let mut doc = Document::new(header());
        doc.objects = objects;
        let resolved = resolve(doc).unwrap();
        let mut diags = Diagnostics::new();
        let out = render(&resolved, options, &ImageLoader::default(), &mut diags);
        String::from_utf8(out).unwrap()
    }

    fn labels(output: &str) -> Vec<String> {
        output
            .lines()
            .filter_map(|l| {
                if l == "<group>" || l == "</group>" {
                    return Some(l.to_string());
                }
                let start = l.find("type=\"label\">")? + "type=\"label\">".len();
                let end = l.find("</text>")?;
                Some(l[start..end].to_string())
            })
            .collect()
    }

    #[test]
    fn deeper_objects_are_written_first() {
        let out = rendered(
            vec![label("a", 10), label("b", 50), label("c", 30)],
            &Options::default(),
        );
        assert_eq!(labels(&out), ["b", "c", "a"]);
    }

    #[test]
    fn equal_depths_keep_file_order() {
        let out = rendered(
            vec![label("a", 50), label("b", 40), label("c", 50), label("d", 50)],
            &Options::default(),
        );
        assert_eq!(labels(&out), ["a", "c", "d", "b"]);
    }

    #[test]
    fn groups_sort_by_shallowest_member() {
        let out = rendered(
            vec![
                label("front", 5),
                Compound::default().into(),
                label("g1", 60),
                label("g2", 20),
                CompoundEnd.into(),
                label("back", 90),
            ],
            &Options::default(),
        );
        assert_eq!(
            labels(&out),
            ["back", "<group>", "g1", "g2", "</group>", "front"]
        );
    }

    #[test]
    fn nested_groups_close_in_order() {
        let out = rendered(
            vec![
                Compound::default().into(),
                Compound::default().into(),
                label("inner", 10),
                CompoundEnd.into(),
                label("outer", 50),
                CompoundEnd.into(),
            ],
            &Options::default(),
        );
        assert_eq!(
            labels(&out),
            ["<group>", "outer", "<group>", "inner", "</group>", "</group>"]
        );
    }

    #[test]
    fn ipe7_prologue() {
        let out = rendered(vec![], &Options::default().with_preamble("\\usepackage{amsmath}"));
        let expected = format!(
            "<?xml version=\"1.0\"?>\n\
             <!DOCTYPE ipe SYSTEM \"ipe.dtd\">\n\
             <ipe version=\"70000\" creator=\"{}\">\n\
             <info/>\n\
             <preamble>\\usepackage{{amsmath}}\n</preamble>\n\
             <ipestyle name=\"ipe6colors\">\n",
            CREATOR
        );
        assert!(out.starts_with(&expected), "{}", out);
        assert!(out.contains(
            "<ipestyle>\n<layout paper=\"595 842\" origin=\"0 0\" frame=\"595 842\" crop=\"no\"/>\n</ipestyle>\n<page>\n"
        ));
        assert!(out.contains("<color name=\"gray7\" value=\"0.875\"/>\n</ipestyle>\n"));
        assert!(out.ends_with("<page>\n</page>\n</ipe>\n"));
    }

    #[test]
    fn ipe6_prologue_with_cropbox_and_group() {
        let options = Options::default()
            .with_format(IpeFormat::Ipe6)
            .with_cropbox(true)
            .with_group(true);
        let out = rendered(vec![], &options);
        assert_eq!(
            out,
            format!(
                "<ipe version=\"60028\" creator=\"{}\">\n\
                 <info media=\"0 0 595 842\" bbox=\"cropbox\"/>\n\
                 <page>\n<group>\n</group>\n</page>\n</ipe>\n",
                CREATOR
            )
        );
    }
}
