//! Shared-formula groups

use super::{CellAddress, CellRange};

/// A formula written once at `anchor` and reused by every cell of `range`
///
/// Each member's effective formula is `text` with its relative references
/// moved by the member's offset from the anchor.
#[derive(Debug, Clone, PartialEq)]
pub struct SharedFormula {
    /// Cell the formula text is written for (top-left of `range`)
    pub anchor: CellAddress,
    /// Cells that use the formula
    pub range: CellRange,
    /// Formula text as written at the anchor
    pub text: String,
}

impl SharedFormula {
    /// Create a group anchored at the top-left corner of `range`
    pub fn new<S: Into<String>>(range: CellRange, text: S) -> Self {
        Self {
            anchor: range.start.relative(),
            range,
            text: text.into(),
        }
    }
}
