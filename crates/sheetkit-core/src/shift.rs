//! Row and column insertion/deletion arithmetic
//!
//! A [`LineShift`] describes one structural edit along one axis. Everything
//! that stores a position (cells, merged regions, the autofilter, calc-chain
//! entries, shared-formula groups, formula references) is moved through the
//! same three primitives: [`LineShift::shift_index`] for a single line,
//! [`LineShift::shift_span`] for the extent of a range, and the
//! address/range wrappers built on them.
//!
//! Insertion moves every position at or beyond the insertion point. Deletion
//! removes the deleted lines: positions after them move back, a range end
//! inside them retreats to the last surviving line before the gap, a range
//! start inside them stays put so the next surviving line slides into it.
//! A span left with no lines is reported as `None` and its owner drops it.

use crate::cell::{CellAddress, CellRange};
use crate::{MAX_COLS, MAX_ROWS};

/// Which coordinate a structural edit moves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Rows,
    Columns,
}

impl Axis {
    /// Number of lines along this axis
    pub fn limit(self) -> u32 {
        match self {
            Axis::Rows => MAX_ROWS,
            Axis::Columns => MAX_COLS as u32,
        }
    }

    fn of(self, addr: &CellAddress) -> u32 {
        match self {
            Axis::Rows => addr.row,
            Axis::Columns => addr.col as u32,
        }
    }

    fn set(self, addr: &mut CellAddress, index: u32) {
        match self {
            Axis::Rows => addr.row = index,
            Axis::Columns => addr.col = index as u16,
        }
    }
}

/// A single structural edit, with 0-based line indices
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineShift {
    /// Insert `count` blank lines in front of line `before`
    Insert { axis: Axis, before: u32, count: u32 },
    /// Delete `count` lines starting at line `start`
    Delete { axis: Axis, start: u32, count: u32 },
}

impl LineShift {
    pub fn insert_rows(before: u32, count: u32) -> Self {
        LineShift::Insert {
            axis: Axis::Rows,
            before,
            count,
        }
    }

    pub fn delete_rows(start: u32, count: u32) -> Self {
        LineShift::Delete {
            axis: Axis::Rows,
            start,
            count,
        }
    }

    pub fn insert_columns(before: u32, count: u32) -> Self {
        LineShift::Insert {
            axis: Axis::Columns,
            before,
            count,
        }
    }

    pub fn delete_columns(start: u32, count: u32) -> Self {
        LineShift::Delete {
            axis: Axis::Columns,
            start,
            count,
        }
    }

    pub fn axis(&self) -> Axis {
        match self {
            LineShift::Insert { axis, .. } | LineShift::Delete { axis, .. } => *axis,
        }
    }

    /// An edit of zero lines changes nothing
    pub fn is_noop(&self) -> bool {
        match self {
            LineShift::Insert { count, .. } | LineShift::Delete { count, .. } => *count == 0,
        }
    }

    /// New index of a single line, or `None` when it is deleted or pushed
    /// past the last line of the grid
    pub fn shift_index(&self, index: u32) -> Option<u32> {
        let limit = self.axis().limit() as u64;
        match *self {
            LineShift::Insert { before, count, .. } => {
                if index < before {
                    return Some(index);
                }
                let moved = index as u64 + count as u64;
                (moved < limit).then_some(moved as u32)
            }
            LineShift::Delete { start, count, .. } => {
                let end = start as u64 + count as u64;
                if index < start {
                    Some(index)
                } else if (index as u64) < end {
                    None
                } else {
                    Some(index - count)
                }
            }
        }
    }

    /// New extent of the inclusive span `first..=last`, or `None` when no
    /// line of it survives
    pub fn shift_span(&self, first: u32, last: u32) -> Option<(u32, u32)> {
        let limit = self.axis().limit() as i64;
        let (first, last) = (first as i64, last as i64);

        let (new_first, new_last) = match *self {
            LineShift::Insert { before, count, .. } => {
                let (before, count) = (before as i64, count as i64);
                let new_first = if first >= before { first + count } else { first };
                let new_last = if last >= before {
                    (last + count).min(limit - 1)
                } else {
                    last
                };
                (new_first, new_last)
            }
            LineShift::Delete { start, count, .. } => {
                let (start, count) = (start as i64, count as i64);
                let end = start + count;
                let new_first = if first < start {
                    first
                } else if first < end {
                    start
                } else {
                    first - count
                };
                let new_last = if last < start {
                    last
                } else if last < end {
                    start - 1
                } else {
                    last - count
                };
                (new_first, new_last)
            }
        };

        if new_first >= limit || new_last < new_first {
            return None;
        }
        Some((new_first as u32, new_last as u32))
    }

    /// Move a single address; absolute markers are kept but do not pin it
    pub fn shift_address(&self, addr: CellAddress) -> Option<CellAddress> {
        let axis = self.axis();
        let index = self.shift_index(axis.of(&addr))?;
        let mut moved = addr;
        axis.set(&mut moved, index);
        Some(moved)
    }

    /// Move a range, or `None` when it collapses
    pub fn shift_range(&self, range: &CellRange) -> Option<CellRange> {
        let axis = self.axis();
        let (first, last) = self.shift_span(axis.of(&range.start), axis.of(&range.end))?;
        let mut moved = *range;
        axis.set(&mut moved.start, first);
        axis.set(&mut moved.end, last);
        Some(moved)
    }

    /// Whether `index` lies on a line removed by this edit
    pub fn deletes(&self, index: u32) -> bool {
        match *self {
            LineShift::Insert { .. } => false,
            LineShift::Delete { start, count, .. } => {
                index >= start && (index as u64) < start as u64 + count as u64
            }
        }
    }

    /// Index along this edit's axis of an address
    pub fn index_of(&self, addr: &CellAddress) -> u32 {
        self.axis().of(addr)
    }
}
