//! A workbook shared between threads
//!
//! [`SharedWorkbook`] puts each worksheet behind its own [`RwLock`] so that
//! calculations run in parallel and a cell write only blocks its own sheet.
//!
//! Lock discipline:
//! - worksheet locks are always taken in sheet index order
//! - the calc-chain mutex is only taken while already holding the
//!   worksheet locks the call needs
//! - calculations read-lock every worksheet, since formulas may reference
//!   any sheet
//! - structural edits write-lock every worksheet, since formulas on any
//!   sheet may be rewritten

use log::debug;
use parking_lot::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};
use sheetkit_core::{CalcChain, CellRange, CellValue, LineShift, WorkbookSettings, Worksheet};
use sheetkit_formula::{
    resolve_formula, worksheet_literal, CalculationOptions, CellSource, FormulaResult,
};

use crate::calculation::{calc_in_source, formula_in_source};
use crate::structure::{adjust_sheets, column_index, row_index};
use crate::{CellAddress, Result, Workbook};

/// Thread-safe workbook with per-worksheet locking
///
/// The set of sheets is fixed for the lifetime of the value; convert back
/// with [`SharedWorkbook::into_inner`] to add or rename sheets.
#[derive(Debug)]
pub struct SharedWorkbook {
    names: Vec<String>,
    sheets: Vec<RwLock<Worksheet>>,
    calc_chain: Mutex<CalcChain>,
    settings: WorkbookSettings,
}

impl SharedWorkbook {
    /// Share a workbook
    pub fn new(workbook: Workbook) -> Self {
        let (worksheets, calc_chain, settings) = workbook.into_parts();
        Self {
            names: worksheets.iter().map(|ws| ws.name().to_string()).collect(),
            sheets: worksheets.into_iter().map(RwLock::new).collect(),
            calc_chain: Mutex::new(calc_chain),
            settings,
        }
    }

    /// Take the workbook back out
    pub fn into_inner(self) -> Workbook {
        let worksheets = self.sheets.into_iter().map(|lock| lock.into_inner()).collect();
        Workbook::from_parts(worksheets, self.calc_chain.into_inner(), self.settings)
    }

    /// Names of all worksheets in order
    pub fn sheet_names(&self) -> &[String] {
        &self.names
    }

    /// Workbook settings
    pub fn settings(&self) -> &WorkbookSettings {
        &self.settings
    }

    fn require_sheet(&self, name: &str) -> Result<usize> {
        self.names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| sheetkit_core::Error::SheetNotExist(name.to_string()).into())
    }

    fn read_all(&self) -> LockedSheets<'_> {
        LockedSheets {
            names: &self.names,
            guards: self.sheets.iter().map(|lock| lock.read()).collect(),
        }
    }

    /// Run `f` with read access to one worksheet
    pub fn with_worksheet<R>(&self, sheet: &str, f: impl FnOnce(&Worksheet) -> R) -> Result<R> {
        let index = self.require_sheet(sheet)?;
        let guard = self.sheets[index].read();
        Ok(f(&guard))
    }

    // ==================== Calculation ====================

    /// Calculate the formula of one cell with default options
    pub fn calc_cell_value(&self, sheet: &str, cell: &str) -> Result<String> {
        self.calc_cell_value_with_options(sheet, cell, &CalculationOptions::default())
    }

    /// Calculate the formula of one cell with custom options
    pub fn calc_cell_value_with_options(
        &self,
        sheet: &str,
        cell: &str,
        options: &CalculationOptions,
    ) -> Result<String> {
        let locked = self.read_all();
        calc_in_source(&locked, sheet, cell, options)
    }

    /// Formula text of a cell, with shared formulas expanded
    pub fn get_cell_formula(&self, sheet: &str, cell: &str) -> Result<String> {
        let locked = self.read_all();
        formula_in_source(&locked, sheet, cell)
    }

    // ==================== Cells ====================

    /// Set a cell value; formulas are recorded in the calc chain
    pub fn set_cell_value<V: Into<CellValue>>(
        &self,
        sheet: &str,
        cell: &str,
        value: V,
    ) -> Result<()> {
        let (index, addr) = self.locate(sheet, cell)?;
        let value = value.into();
        let is_formula = value.is_formula();

        let mut ws = self.sheets[index].write();
        ws.set_cell_value_at(addr.row, addr.col, value);
        let mut chain = self.calc_chain.lock();
        if is_formula {
            chain.add(index, addr);
        } else {
            chain.remove(index, addr);
        }
        Ok(())
    }

    /// Set a cell formula; the text is stored verbatim
    pub fn set_cell_formula(&self, sheet: &str, cell: &str, formula: &str) -> Result<()> {
        let (index, addr) = self.locate(sheet, cell)?;
        let mut ws = self.sheets[index].write();
        ws.set_cell_formula_at(addr.row, addr.col, formula);
        self.calc_chain.lock().add(index, addr);
        Ok(())
    }

    /// Create a shared-formula group
    pub fn set_shared_formula(&self, sheet: &str, range: &str, formula: &str) -> Result<u32> {
        let index = self.require_sheet(sheet)?;
        let cells = CellRange::parse(range)?;
        let mut ws = self.sheets[index].write();
        let id = ws.set_shared_formula(range, formula)?;
        let mut chain = self.calc_chain.lock();
        for addr in cells.cells() {
            chain.add(index, addr);
        }
        Ok(id)
    }

    fn locate(&self, sheet: &str, cell: &str) -> Result<(usize, CellAddress)> {
        let index = self.require_sheet(sheet)?;
        let addr = CellAddress::parse_cell_name(cell)?;
        Ok((index, addr))
    }

    // ==================== Structure ====================

    /// Insert `count` blank rows in front of the 1-based `row`
    pub fn insert_rows(&self, sheet: &str, row: u32, count: u32) -> Result<()> {
        self.apply_line_shift(sheet, LineShift::insert_rows(row_index(row)?, count))
    }

    /// Insert `count` blank columns in front of `col`
    pub fn insert_cols(&self, sheet: &str, col: &str, count: u32) -> Result<()> {
        self.apply_line_shift(sheet, LineShift::insert_columns(column_index(col)?, count))
    }

    /// Delete one row
    pub fn remove_row(&self, sheet: &str, row: u32) -> Result<()> {
        self.apply_line_shift(sheet, LineShift::delete_rows(row_index(row)?, 1))
    }

    /// Delete one column
    pub fn remove_col(&self, sheet: &str, col: &str) -> Result<()> {
        self.apply_line_shift(sheet, LineShift::delete_columns(column_index(col)?, 1))
    }

    /// Apply a structural edit with every worksheet write-locked
    pub fn apply_line_shift(&self, sheet: &str, shift: LineShift) -> Result<()> {
        let index = self.require_sheet(sheet)?;
        let mut guards: Vec<RwLockWriteGuard<'_, Worksheet>> =
            self.sheets.iter().map(|lock| lock.write()).collect();
        let mut chain = self.calc_chain.lock();
        debug!("locked {} worksheets for a structural edit", guards.len());

        let mut sheets: Vec<&mut Worksheet> = guards.iter_mut().map(|g| &mut **g).collect();
        adjust_sheets(&mut sheets, &mut chain, index, &shift)
    }
}

impl From<Workbook> for SharedWorkbook {
    fn from(workbook: Workbook) -> Self {
        Self::new(workbook)
    }
}

/// Every worksheet read-locked for the duration of one call
struct LockedSheets<'a> {
    names: &'a [String],
    guards: Vec<RwLockReadGuard<'a, Worksheet>>,
}

impl LockedSheets<'_> {
    fn worksheet(&self, sheet: &str) -> Option<&Worksheet> {
        let index = self.names.iter().position(|n| n == sheet)?;
        self.guards.get(index).map(|guard| &**guard)
    }
}

impl CellSource for LockedSheets<'_> {
    fn sheet_exists(&self, sheet: &str) -> bool {
        self.worksheet(sheet).is_some()
    }

    fn read_cell_literal(&self, sheet: &str, addr: CellAddress) -> Option<CellValue> {
        self.worksheet(sheet).and_then(|ws| worksheet_literal(ws, addr))
    }

    fn read_cell_formula(&self, sheet: &str, addr: CellAddress) -> FormulaResult<Option<String>> {
        match self.worksheet(sheet) {
            Some(ws) => resolve_formula(ws, addr),
            None => Ok(None),
        }
    }
}
