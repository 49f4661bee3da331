//! Data-driven conversion tests over `tests/data`.
//!
//! - `name.bad.fig` must be rejected with a format error
//! - `name.fig` must convert; when `name.page` exists, the contents of the
//!   Ipe `<page>` element must match it exactly

use datatest_stable::Utf8Path;
use figru::{ConvertError, Options};

/// Format a colored inline diff using dissimilar
fn format_inline_diff(expected: &str, actual: &str) -> String {
    use dissimilar::Chunk;

    let chunks = dissimilar::diff(expected, actual);
    let mut output = String::new();

    output.push_str("\n=== Inline Diff (expected vs figru) ===\n");
    output.push_str("Legend: [-expected only-] [+figru only+] [unchanged]\n\n");

    for chunk in chunks {
        match chunk {
            Chunk::Equal(s) => output.push_str(s),
            Chunk::Delete(s) => {
                output.push_str("\x1b[31m[-");
                output.push_str(s);
                output.push_str("-]\x1b[0m");
            }
            Chunk::Insert(s) => {
                output.push_str("\x1b[32m[+");
                output.push_str(s);
                output.push_str("+]\x1b[0m");
            }
        }
    }

    output
}

/// Contents of the `<page>` element
fn page_body(document: &str) -> &str {
    let start = document
        .find("<page>\n")
        .map(|i| i + "<page>\n".len())
        .unwrap_or(0);
    let end = document.rfind("</page>").unwrap_or(document.len());
    &document[start..end]
}

fn test_fig_file(path: &Utf8Path) -> datatest_stable::Result<()> {
    let result = figru::convert_file(path.as_std_path(), &Options::default());

    if path.as_str().ends_with(".bad.fig") {
        match result {
            Err(ConvertError::Format(_)) => return Ok(()),
            Err(e) => panic!("{}: expected a format error, got {}", path, e),
            Ok(_) => panic!("{}: malformed file was accepted", path),
        }
    }

    let conversion = match result {
        Ok(conversion) => conversion,
        Err(e) => panic!("conversion failed for {}: {:?}", path, miette::Report::new(e)),
    };
    let output = conversion.output_lossy();
    assert!(output.ends_with("</page>\n</ipe>\n"), "{}: truncated output", path);

    let expected_path = path.with_extension("page");
    if let Ok(expected) = std::fs::read_to_string(&expected_path) {
        let actual = page_body(&output);
        if actual != expected {
            panic!(
                "page mismatch for {}:\n{}",
                path,
                format_inline_diff(&expected, actual)
            );
        }
    }

    Ok(())
}

datatest_stable::harness! {
    { test = test_fig_file, root = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data"), pattern = r"\.fig$" },
}
