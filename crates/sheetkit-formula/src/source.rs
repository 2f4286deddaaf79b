//! Read access to worksheet cells for the evaluator

use sheetkit_core::{CellAddress, CellValue, Workbook, Worksheet};

use crate::error::FormulaResult;
use crate::translate::resolve_formula;

/// Read-only view of a workbook's cells
///
/// The evaluator only reads through this trait, so it can run against a
/// plain [`Workbook`] or against worksheets held behind locks.
pub trait CellSource {
    /// Whether a sheet with this name exists
    fn sheet_exists(&self, sheet: &str) -> bool;

    /// The literal value of a cell; formula cells and empty cells read as `None`
    fn read_cell_literal(&self, sheet: &str, addr: CellAddress) -> Option<CellValue>;

    /// The formula of a cell, with shared formulas expanded for that cell
    fn read_cell_formula(&self, sheet: &str, addr: CellAddress) -> FormulaResult<Option<String>>;
}

/// Literal value of a worksheet cell
pub fn worksheet_literal(worksheet: &Worksheet, addr: CellAddress) -> Option<CellValue> {
    worksheet
        .cell_at(addr.row, addr.col)
        .filter(|value| !value.is_formula() && !value.is_empty())
        .cloned()
}

impl CellSource for Workbook {
    fn sheet_exists(&self, sheet: &str) -> bool {
        self.sheet_index(sheet).is_some()
    }

    fn read_cell_literal(&self, sheet: &str, addr: CellAddress) -> Option<CellValue> {
        self.worksheet_by_name(sheet)
            .and_then(|ws| worksheet_literal(ws, addr))
    }

    fn read_cell_formula(&self, sheet: &str, addr: CellAddress) -> FormulaResult<Option<String>> {
        match self.worksheet_by_name(sheet) {
            Some(ws) => resolve_formula(ws, addr),
            None => Ok(None),
        }
    }
}
