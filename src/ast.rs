//! Scene model for FIG documents
//!
//! These types represent the flat, insertion-ordered object list of a FIG
//! file. Compounds are not nested in the model: a [`Compound`] is followed
//! by its members and closed by a [`CompoundEnd`], and the link between the
//! two is only established by [`crate::resolve`].

use enum_dispatch::enum_dispatch;
use glam::DVec2;

use crate::color::{ColorIndex, ColorTable};
use crate::render::defaults::PAGE_HEIGHT;
use crate::types::{NumericError, Scaler};

/// Measurement system declared in the header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Units {
    Metric,
    Inches,
}

/// Parsed FIG header
#[derive(Debug, Clone)]
pub struct Header {
    /// Minor version of FIG 3.x (0, 1 or 2)
    pub minor_version: u32,
    pub orientation: String,
    pub justification: String,
    pub units: Units,
    /// FIG 3.2 only
    pub paper_size: Option<String>,
    /// Export magnification in percent
    pub magnification: f64,
    /// FIG units per inch
    pub resolution: i32,
    pub coord_system: i32,
}

impl Header {
    pub fn units_per_point(&self) -> f64 {
        self.resolution as f64 / 72.0
    }

    /// Coordinate mapping for this document
    pub fn scaler(&self) -> Result<Scaler, NumericError> {
        Scaler::try_new(
            self.units_per_point(),
            self.magnification / 100.0,
            f64::from(PAGE_HEIGHT),
        )
    }
}

/// Arrow head attached to one end of an open path
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Arrow {
    pub kind: i32,
    pub style: i32,
    /// 1/80 inch
    pub thickness: f64,
    /// FIG units
    pub width: f64,
    /// FIG units
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Arrows {
    pub forward: Option<Arrow>,
    pub backward: Option<Arrow>,
}

/// Fields shared by every drawable record
#[derive(Debug, Clone, PartialEq)]
pub struct Common {
    /// FIG line style id (-1 default, 0 solid, 1 dashed, ...)
    pub line_style: i32,
    /// 1/80 inch, 0 means no stroke
    pub thickness: f64,
    pub pen_color: ColorIndex,
    pub fill_color: ColorIndex,
    /// Lower depth is drawn later, i.e. in front
    pub depth: i32,
    pub pen_style: i32,
    /// -1 unfilled, 0..40 shades and tints, larger values are patterns
    pub area_fill: i32,
    /// Dash or dot spacing
    pub style_val: f64,
    pub cap_style: i32,
    pub join_style: i32,
}

impl Default for Common {
    fn default() -> Self {
        Self {
            line_style: 0,
            thickness: 1.0,
            pen_color: ColorIndex::DEFAULT,
            fill_color: ColorIndex::DEFAULT,
            depth: 50,
            pen_style: 0,
            area_fill: -1,
            style_val: 0.0,
            cap_style: 0,
            join_style: 0,
        }
    }
}

impl Common {
    pub fn has_stroke(&self) -> bool {
        self.thickness != 0.0
    }

    pub fn is_filled(&self) -> bool {
        self.area_fill != -1
    }

    /// Neither stroked nor filled
    pub fn is_invisible(&self) -> bool {
        !self.has_stroke() && !self.is_filled()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ellipse {
    pub common: Common,
    pub sub_kind: i32,
    pub direction: i32,
    /// Radians, orientation of the main axis
    pub angle: f64,
    pub center: DVec2,
    /// Half axes
    pub radius: DVec2,
    pub start: DVec2,
    pub end: DVec2,
}

/// Polyline sub-kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolylineKind {
    Polyline,
    Box,
    Polygon,
    ArcBox,
    Picture,
    Other(i32),
}

impl PolylineKind {
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => PolylineKind::Polyline,
            2 => PolylineKind::Box,
            3 => PolylineKind::Polygon,
            4 => PolylineKind::ArcBox,
            5 => PolylineKind::Picture,
            other => PolylineKind::Other(other),
        }
    }

    pub fn code(self) -> i32 {
        match self {
            PolylineKind::Polyline => 1,
            PolylineKind::Box => 2,
            PolylineKind::Polygon => 3,
            PolylineKind::ArcBox => 4,
            PolylineKind::Picture => 5,
            PolylineKind::Other(code) => code,
        }
    }

    /// Whether the last point closes the shape
    pub fn is_closed(self) -> bool {
        self.code() > 1
    }
}

/// Reference to an imported picture
#[derive(Debug, Clone, PartialEq)]
pub struct PictureRef {
    pub flipped: bool,
    pub filename: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Polyline {
    pub common: Common,
    pub kind: PolylineKind,
    pub corner_radius: i32,
    pub arrows: Arrows,
    pub points: Vec<DVec2>,
    /// Present only for [`PolylineKind::Picture`]
    pub picture: Option<PictureRef>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Spline {
    pub common: Common,
    /// 0/1 approximated, 2/3 interpolated, 4/5 x-spline; odd values are closed
    pub sub_kind: i32,
    pub arrows: Arrows,
    pub points: Vec<DVec2>,
}

impl Spline {
    pub fn is_closed(&self) -> bool {
        self.sub_kind & 1 == 1
    }
}

/// Horizontal text alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Justification {
    Left,
    Center,
    Right,
}

impl Justification {
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => Justification::Center,
            2 => Justification::Right,
            _ => Justification::Left,
        }
    }
}

/// Text font flag bits
pub mod font_flags {
    pub const RIGID: i32 = 1;
    pub const SPECIAL: i32 = 2;
    pub const POSTSCRIPT: i32 = 4;
}

#[derive(Debug, Clone, PartialEq)]
pub struct Text {
    pub common: Common,
    pub justification: Justification,
    pub font: i32,
    /// Points
    pub font_size: f64,
    /// Radians
    pub angle: f64,
    pub font_flags: i32,
    pub height: f64,
    pub length: f64,
    pub position: DVec2,
    /// Decoded payload, already re-encoded for output
    pub string: Vec<u8>,
}

impl Text {
    pub fn has_flag(&self, flag: i32) -> bool {
        self.font_flags & flag != 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Arc {
    pub common: Common,
    /// 1 open, 2 pie wedge
    pub sub_kind: i32,
    /// 0 clockwise, 1 counter-clockwise
    pub direction: i32,
    pub arrows: Arrows,
    pub center: DVec2,
    pub points: [DVec2; 3],
}

/// Start of a compound (group)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Compound {
    /// Bounding box from the file, ignored for conversion
    pub bbox: [i32; 4],
    /// Minimum depth of all members, set by the resolver
    pub depth: i32,
    /// Index of the matching [`CompoundEnd`], set by the resolver
    pub extent: Option<usize>,
}

/// End of a compound
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CompoundEnd;

/// Behavior shared by all scene objects
#[enum_dispatch]
pub trait SceneItem {
    /// Paint depth; lower values are drawn later
    fn depth(&self) -> i32;
}

impl SceneItem for Ellipse {
    fn depth(&self) -> i32 {
        self.common.depth
    }
}

impl SceneItem for Polyline {
    fn depth(&self) -> i32 {
        self.common.depth
    }
}

impl SceneItem for Spline {
    fn depth(&self) -> i32 {
        self.common.depth
    }
}

impl SceneItem for Text {
    fn depth(&self) -> i32 {
        self.common.depth
    }
}

impl SceneItem for Arc {
    fn depth(&self) -> i32 {
        self.common.depth
    }
}

impl SceneItem for Compound {
    fn depth(&self) -> i32 {
        self.depth
    }
}

impl SceneItem for CompoundEnd {
    fn depth(&self) -> i32 {
        0
    }
}

/// One record of the flat object list
#[enum_dispatch(SceneItem)]
#[derive(Debug, Clone, PartialEq)]
pub enum SceneObject {
    Ellipse(Ellipse),
    Polyline(Polyline),
    Spline(Spline),
    Text(Text),
    Arc(Arc),
    Compound(Compound),
    CompoundEnd(CompoundEnd),
}

/// A parsed FIG document: header, colors and the flat object list
#[derive(Debug, Clone)]
pub struct Document {
    pub header: Header,
    pub colors: ColorTable,
    pub objects: Vec<SceneObject>,
}

impl Document {
    pub fn new(header: Header) -> Self {
        Self {
            header,
            colors: ColorTable::new(),
            objects: Vec::new(),
        }
    }
}
