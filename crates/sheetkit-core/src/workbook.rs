//! Workbook type - the main document structure

use crate::calc_chain::CalcChain;
use crate::cell::{CellAddress, CellRange, CellValue};
use crate::error::{Error, Result};
use crate::worksheet::Worksheet;
use crate::MAX_SHEET_NAME_LEN;

/// A workbook (spreadsheet document)
///
/// A workbook contains one or more worksheets, the calculation chain that
/// indexes their formula cells, and global settings. The cell-level setters
/// here keep the calculation chain in step with the cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Workbook {
    /// Worksheets in the workbook
    worksheets: Vec<Worksheet>,
    /// Formula cells in calculation order
    calc_chain: CalcChain,
    /// Workbook settings
    settings: WorkbookSettings,
}

impl Workbook {
    /// Create a new workbook with one worksheet named `Sheet1`
    pub fn new() -> Self {
        let mut wb = Self::empty();
        wb.worksheets.push(Worksheet::new("Sheet1"));
        wb
    }

    /// Create an empty workbook with no worksheets
    pub fn empty() -> Self {
        Self {
            worksheets: Vec::new(),
            calc_chain: CalcChain::new(),
            settings: WorkbookSettings::default(),
        }
    }

    /// Reassemble a workbook from its parts
    pub fn from_parts(
        worksheets: Vec<Worksheet>,
        calc_chain: CalcChain,
        settings: WorkbookSettings,
    ) -> Self {
        Self {
            worksheets,
            calc_chain,
            settings,
        }
    }

    /// Split the workbook into its parts
    pub fn into_parts(self) -> (Vec<Worksheet>, CalcChain, WorkbookSettings) {
        (self.worksheets, self.calc_chain, self.settings)
    }

    /// Borrow the worksheets and the calculation chain mutably at once
    pub fn parts_mut(&mut self) -> (&mut [Worksheet], &mut CalcChain) {
        (&mut self.worksheets, &mut self.calc_chain)
    }

    /// Get the number of worksheets
    pub fn sheet_count(&self) -> usize {
        self.worksheets.len()
    }

    /// Check if the workbook has no worksheets
    pub fn is_empty(&self) -> bool {
        self.worksheets.is_empty()
    }

    /// Get a worksheet by index
    pub fn worksheet(&self, index: usize) -> Option<&Worksheet> {
        self.worksheets.get(index)
    }

    /// Get a worksheet by name
    pub fn worksheet_by_name(&self, name: &str) -> Option<&Worksheet> {
        self.worksheets.iter().find(|ws| ws.name() == name)
    }

    /// Get the index of a worksheet by name
    pub fn sheet_index(&self, name: &str) -> Option<usize> {
        self.worksheets.iter().position(|ws| ws.name() == name)
    }

    /// Get the index of a worksheet by name, failing with [`Error::SheetNotExist`]
    pub fn require_sheet(&self, name: &str) -> Result<usize> {
        self.sheet_index(name)
            .ok_or_else(|| Error::SheetNotExist(name.to_string()))
    }

    /// Iterate over all worksheets
    pub fn worksheets(&self) -> impl Iterator<Item = &Worksheet> {
        self.worksheets.iter()
    }

    /// Get the names of all worksheets in order
    pub fn sheet_names(&self) -> Vec<String> {
        self.worksheets.iter().map(|ws| ws.name().to_string()).collect()
    }

    /// Add a new worksheet with default name
    pub fn add_worksheet(&mut self) -> Result<usize> {
        let name = self.generate_sheet_name();
        self.add_worksheet_with_name(&name)
    }

    /// Add a new worksheet with specified name
    pub fn add_worksheet_with_name(&mut self, name: &str) -> Result<usize> {
        self.validate_sheet_name(name)?;

        let index = self.worksheets.len();
        self.worksheets.push(Worksheet::new(name));
        Ok(index)
    }

    /// Get workbook settings
    pub fn settings(&self) -> &WorkbookSettings {
        &self.settings
    }

    /// Get the calculation chain
    pub fn calc_chain(&self) -> &CalcChain {
        &self.calc_chain
    }

    /// Get the calculation chain mutably
    pub fn calc_chain_mut(&mut self) -> &mut CalcChain {
        &mut self.calc_chain
    }

    // ==================== Cells ====================

    /// Set a cell value on a named sheet
    ///
    /// Formula values are recorded in the calculation chain; anything else
    /// removes the cell from it.
    pub fn set_cell_value<V: Into<CellValue>>(
        &mut self,
        sheet: &str,
        cell: &str,
        value: V,
    ) -> Result<()> {
        let (index, addr) = self.locate(sheet, cell)?;
        let value = value.into();
        if value.is_formula() {
            self.calc_chain.add(index, addr);
        } else {
            self.calc_chain.remove(index, addr);
        }
        self.worksheets[index].set_cell_value_at(addr.row, addr.col, value);
        Ok(())
    }

    /// Set a cell formula on a named sheet; the text is stored verbatim
    pub fn set_cell_formula(&mut self, sheet: &str, cell: &str, formula: &str) -> Result<()> {
        let (index, addr) = self.locate(sheet, cell)?;
        self.worksheets[index].set_cell_formula_at(addr.row, addr.col, formula);
        self.calc_chain.add(index, addr);
        Ok(())
    }

    /// Create a shared-formula group on a named sheet
    pub fn set_shared_formula(&mut self, sheet: &str, range: &str, formula: &str) -> Result<u32> {
        let index = self.require_sheet(sheet)?;
        let id = self.worksheets[index].set_shared_formula(range, formula)?;
        let range = CellRange::parse(range)?;
        for addr in range.cells() {
            self.calc_chain.add(index, addr);
        }
        Ok(id)
    }

    /// Clear a cell on a named sheet
    pub fn clear_cell(&mut self, sheet: &str, cell: &str) -> Result<()> {
        let (index, addr) = self.locate(sheet, cell)?;
        self.worksheets[index].set_cell_value_at(addr.row, addr.col, CellValue::Empty);
        self.calc_chain.remove(index, addr);
        Ok(())
    }

    /// Merge a range of cells on a named sheet
    pub fn merge_cells(&mut self, sheet: &str, range: &str) -> Result<()> {
        let index = self.require_sheet(sheet)?;
        self.worksheets[index].merge_cells(range)
    }

    /// Unmerge a range of cells on a named sheet
    pub fn unmerge_cells(&mut self, sheet: &str, range: &str) -> Result<bool> {
        let index = self.require_sheet(sheet)?;
        self.worksheets[index].unmerge_cells(range)
    }

    /// Set the autofilter range of a named sheet
    pub fn set_auto_filter(&mut self, sheet: &str, range: &str) -> Result<()> {
        let index = self.require_sheet(sheet)?;
        self.worksheets[index].set_auto_filter(range)
    }

    /// Remove the autofilter of a named sheet
    pub fn remove_auto_filter(&mut self, sheet: &str) -> Result<Option<CellRange>> {
        let index = self.require_sheet(sheet)?;
        Ok(self.worksheets[index].remove_auto_filter())
    }

    fn locate(&self, sheet: &str, cell: &str) -> Result<(usize, CellAddress)> {
        let index = self.require_sheet(sheet)?;
        let addr = CellAddress::parse_cell_name(cell)?;
        Ok((index, addr))
    }

    /// Validate a sheet name
    fn validate_sheet_name(&self, name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(Error::InvalidSheetName("Sheet name cannot be empty".into()));
        }
        if name.chars().count() > MAX_SHEET_NAME_LEN {
            return Err(Error::InvalidSheetName(format!(
                "Sheet name too long (max {} characters)",
                MAX_SHEET_NAME_LEN
            )));
        }

        const INVALID_CHARS: &[char] = &[':', '\\', '/', '?', '*', '[', ']'];
        if let Some(c) = name.chars().find(|c| INVALID_CHARS.contains(c)) {
            return Err(Error::InvalidSheetName(format!(
                "Sheet name cannot contain '{}'",
                c
            )));
        }
        if name.starts_with('\'') || name.ends_with('\'') {
            return Err(Error::InvalidSheetName(
                "Sheet name cannot start or end with an apostrophe".into(),
            ));
        }

        // Case-insensitive
        let name_lower = name.to_lowercase();
        if self
            .worksheets
            .iter()
            .any(|ws| ws.name().to_lowercase() == name_lower)
        {
            return Err(Error::DuplicateSheetName(name.into()));
        }

        Ok(())
    }

    /// Generate a unique sheet name
    fn generate_sheet_name(&self) -> String {
        let mut n = self.worksheets.len() + 1;
        loop {
            let name = format!("Sheet{}", n);
            if self.validate_sheet_name(&name).is_ok() {
                return name;
            }
            n += 1;
        }
    }
}

impl Default for Workbook {
    fn default() -> Self {
        Self::new()
    }
}

/// Workbook-level settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkbookSettings {
    /// Date system: false = 1900 (Windows), true = 1904 (Mac)
    pub date_1904: bool,
    /// Calculate formulas on open
    pub calc_on_open: bool,
}

impl Default for WorkbookSettings {
    fn default() -> Self {
        Self {
            date_1904: false,
            calc_on_open: true,
        }
    }
}
