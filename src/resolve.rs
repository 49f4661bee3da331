//! Link compounds and compute their paint depth
//!
//! The parsed object list is flat: a [`Compound`] is followed by its members
//! and closed by a [`CompoundEnd`]. Resolution walks the list once with an
//! explicit stack of open compounds, so arbitrarily deep nesting cannot
//! exhaust the call stack.

use tracing::debug;

use crate::ast::{Document, Header, SceneItem, SceneObject};
use crate::color::ColorTable;
use crate::errors::FormatError;
use crate::types::Scaler;

/// Depth of a compound without members
pub const EMPTY_GROUP_DEPTH: i32 = 1000;

/// A document whose compounds are linked to their ends.
///
/// Every [`SceneObject::Compound`] has `extent == Some(end)` where `end` is
/// the index of its balancing [`SceneObject::CompoundEnd`], and `depth`
/// equal to the minimum depth of its members.
#[derive(Debug, Clone)]
pub struct ResolvedDocument {
    header: Header,
    colors: ColorTable,
    scaler: Scaler,
    objects: Vec<SceneObject>,
}

impl ResolvedDocument {
    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn colors(&self) -> &ColorTable {
        &self.colors
    }

    pub fn scaler(&self) -> &Scaler {
        &self.scaler
    }

    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    /// Indices of the direct children in `start..end`, skipping the
    /// interior of nested compounds
    pub fn children(&self, start: usize, end: usize) -> Vec<usize> {
        let end = end.min(self.objects.len());
        let mut children = Vec::new();
        let mut i = start;
        while i < end {
            children.push(i);
            i = match &self.objects[i] {
                SceneObject::Compound(c) => c.extent.map_or(i + 1, |e| e + 1),
                _ => i + 1,
            };
        }
        children
    }

    /// Indices of the page-level objects
    pub fn top_level(&self) -> Vec<usize> {
        self.children(0, self.objects.len())
    }
}

struct OpenGroup {
    begin: usize,
    depth: i32,
}

/// Link every compound to its end and assign compound depths
pub fn resolve(document: Document) -> Result<ResolvedDocument, FormatError> {
    let scaler = document
        .header
        .scaler()
        .map_err(|e| FormatError::InvalidScale {
            message: e.to_string(),
        })?;

    let Document {
        header,
        colors,
        mut objects,
    } = document;

    let mut stack: Vec<OpenGroup> = Vec::new();
    for i in 0..objects.len() {
        let depth = match &objects[i] {
            SceneObject::Compound(_) => {
                stack.push(OpenGroup {
                    begin: i,
                    depth: EMPTY_GROUP_DEPTH,
                });
                continue;
            }
            SceneObject::CompoundEnd(_) => {
                let group = stack.pop().ok_or(FormatError::StrayGroupEnd { index: i })?;
                if let SceneObject::Compound(c) = &mut objects[group.begin] {
                    c.depth = group.depth;
                    c.extent = Some(i);
                }
                group.depth
            }
            other => other.depth(),
        };
        if let Some(parent) = stack.last_mut() {
            parent.depth = parent.depth.min(depth);
        }
    }

    if let Some(group) = stack.first() {
        return Err(FormatError::UnterminatedGroup { index: group.begin });
    }

    debug!(
        objects = objects.len(),
        scale = scaler.magnification() / scaler.units_per_point(),
        "resolved compounds"
    );
    Ok(ResolvedDocument {
        header,
        colors,
        scaler,
        objects,
    })
}
