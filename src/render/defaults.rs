//! Fixed page geometry and document scaffolding

/// Media box width in points (A4)
pub const PAGE_WIDTH: i32 = 595;
/// Media box height in points (A4)
pub const PAGE_HEIGHT: i32 = 842;

pub const IPE7_VERSION: &str = "70000";
pub const IPE6_VERSION: &str = "60028";

/// Value of the `creator` attribute
pub const CREATOR: &str = concat!("figru ", env!("CARGO_PKG_VERSION"));

/// Named colors Ipe 6 documents could rely on without a style sheet
pub const IPE6_COLORS: &[(&str, &str)] = &[
    ("red", "1 0 0"),
    ("green", "0 1 0"),
    ("blue", "0 0 1"),
    ("yellow", "1 1 0"),
    ("gray1", "0.125"),
    ("gray2", "0.25"),
    ("gray3", "0.375"),
    ("gray4", "0.5"),
    ("gray5", "0.625"),
    ("gray6", "0.75"),
    ("gray7", "0.875"),
];

/// Hex digits per line of an image payload
pub const HEX_LINE_WIDTH: usize = 36;
