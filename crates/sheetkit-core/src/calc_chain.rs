//! Calculation chain
//!
//! The calc chain is the workbook's ordered index of formula cells. Entries
//! keep the cell text exactly as it was recorded (a loaded workbook may carry
//! entries this crate never wrote), so they are only parsed when a structural
//! edit has to move them.

use log::warn;

use crate::cell::CellAddress;
use crate::error::{Error, Result};
use crate::shift::LineShift;

/// One formula cell in calculation order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalcChainEntry {
    /// Index of the worksheet in the workbook
    pub sheet: usize,
    /// Cell name, e.g. `"B7"`
    pub cell: String,
}

/// Ordered list of formula cells across a workbook
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CalcChain {
    entries: Vec<CalcChainEntry>,
}

impl CalcChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[CalcChainEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append an entry verbatim, without validating the cell text
    pub fn push_raw<S: Into<String>>(&mut self, sheet: usize, cell: S) {
        self.entries.push(CalcChainEntry {
            sheet,
            cell: cell.into(),
        });
    }

    /// Whether `addr` on `sheet` is recorded
    pub fn contains(&self, sheet: usize, addr: CellAddress) -> bool {
        self.position(sheet, addr).is_some()
    }

    /// Record a formula cell, keeping the chain free of duplicates
    pub fn add(&mut self, sheet: usize, addr: CellAddress) {
        if !self.contains(sheet, addr) {
            self.push_raw(sheet, addr.relative().to_a1_string());
        }
    }

    /// Forget a cell that no longer holds a formula
    pub fn remove(&mut self, sheet: usize, addr: CellAddress) -> bool {
        match self.position(sheet, addr) {
            Some(index) => {
                self.entries.remove(index);
                true
            }
            None => false,
        }
    }

    fn position(&self, sheet: usize, addr: CellAddress) -> Option<usize> {
        let addr = addr.relative();
        self.entries.iter().position(|entry| {
            entry.sheet == sheet
                && CellAddress::parse(&entry.cell)
                    .map(|a| a.relative() == addr)
                    .unwrap_or(false)
        })
    }

    /// Move the entries of `sheet` through a structural edit
    ///
    /// Entries on deleted lines are removed. Every entry of the sheet is
    /// parsed before anything changes: an unparsable entry fails the whole
    /// call with [`Error::CannotConvertToCoordinates`] and leaves the chain
    /// untouched.
    pub fn shift_lines(&mut self, sheet: usize, shift: &LineShift) -> Result<()> {
        if shift.is_noop() {
            return Ok(());
        }

        let mut moved = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            if entry.sheet != sheet {
                moved.push(Some(entry.clone()));
                continue;
            }
            let addr = CellAddress::parse(&entry.cell)
                .map_err(|e| Error::cannot_convert(entry.cell.clone(), e))?;
            moved.push(shift.shift_address(addr).map(|a| CalcChainEntry {
                sheet,
                cell: a.to_a1_string(),
            }));
        }

        let before = self.entries.len();
        self.entries = moved.into_iter().flatten().collect();
        let dropped = before - self.entries.len();
        if dropped > 0 {
            warn!(
                "removed {} calc chain entries on deleted lines of sheet {}",
                dropped, sheet
            );
        }
        Ok(())
    }
}
