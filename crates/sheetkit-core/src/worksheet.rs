//! Worksheet type

use std::collections::BTreeMap;

use log::{debug, warn};

use crate::cell::{CellAddress, CellRange, CellStorage, CellValue, SharedFormula};
use crate::error::{Error, Result};
use crate::shift::{Axis, LineShift};

/// A worksheet (single sheet in a workbook)
#[derive(Debug, Clone, PartialEq)]
pub struct Worksheet {
    /// Sheet name
    name: String,
    /// Cell storage
    cells: CellStorage,
    /// Autofilter range, header row first
    auto_filter: Option<CellRange>,
    /// Shared-formula groups by id
    shared_formulas: BTreeMap<u32, SharedFormula>,
    /// Next free shared-formula id
    next_shared_id: u32,
}

impl Worksheet {
    /// Create a new worksheet with the given name
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            cells: CellStorage::new(),
            auto_filter: None,
            shared_formulas: BTreeMap::new(),
            next_shared_id: 0,
        }
    }

    /// Get the sheet name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set the sheet name
    pub fn set_name<S: Into<String>>(&mut self, name: S) {
        self.name = name.into();
    }

    // === Cell Access ===

    /// Get a cell by address string (e.g., "A1")
    pub fn cell(&self, address: &str) -> Result<Option<&CellValue>> {
        let addr = CellAddress::parse(address)?;
        Ok(self.cells.get(addr.row, addr.col))
    }

    /// Get a cell by row and column indices
    pub fn cell_at(&self, row: u32, col: u16) -> Option<&CellValue> {
        self.cells.get(row, col)
    }

    /// Get cell value (convenience method)
    pub fn get_value(&self, address: &str) -> Result<CellValue> {
        let addr = CellAddress::parse(address)?;
        Ok(self.get_value_at(addr.row, addr.col))
    }

    /// Get cell value by indices
    pub fn get_value_at(&self, row: u32, col: u16) -> CellValue {
        self.cells.get(row, col).cloned().unwrap_or_default()
    }

    // === Cell Modification ===

    /// Set a cell value by address string
    pub fn set_cell_value<V: Into<CellValue>>(&mut self, address: &str, value: V) -> Result<()> {
        let addr = CellAddress::parse(address)?;
        self.set_cell_value_at(addr.row, addr.col, value);
        Ok(())
    }

    /// Set a cell value by row and column indices
    pub fn set_cell_value_at<V: Into<CellValue>>(&mut self, row: u32, col: u16, value: V) {
        self.cells.set(row, col, value.into());
    }

    /// Set a cell formula by address string; the text is stored verbatim
    pub fn set_cell_formula(&mut self, address: &str, formula: &str) -> Result<()> {
        let addr = CellAddress::parse(address)?;
        self.set_cell_formula_at(addr.row, addr.col, formula);
        Ok(())
    }

    /// Set a cell formula by row and column indices
    pub fn set_cell_formula_at(&mut self, row: u32, col: u16, formula: &str) {
        self.cells.set(row, col, CellValue::formula(formula));
    }

    /// Replace the text of an existing plain formula cell
    ///
    /// Returns false when the cell does not hold a plain formula.
    pub fn replace_formula_text_at(&mut self, row: u32, col: u16, formula: String) -> bool {
        match self.cells.get_mut(row, col) {
            Some(CellValue::Formula { text }) => {
                *text = formula;
                true
            }
            _ => false,
        }
    }

    /// Clear a cell
    pub fn clear_cell(&mut self, address: &str) -> Result<()> {
        let addr = CellAddress::parse(address)?;
        self.cells.remove(addr.row, addr.col);
        Ok(())
    }

    /// Get the number of non-empty cells
    pub fn cell_count(&self) -> usize {
        self.cells.cell_count()
    }

    /// Check if the worksheet is empty
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Iterate over all non-empty cells
    pub fn iter_cells(&self) -> impl Iterator<Item = (u32, u16, &CellValue)> {
        self.cells.iter()
    }

    /// Iterate over all plain formula cells: (row, col, formula_text)
    pub fn formula_cells(&self) -> impl Iterator<Item = (u32, u16, &str)> {
        self.cells
            .iter()
            .filter_map(|(row, col, value)| value.formula_text().map(|text| (row, col, text)))
    }

    // === Shared Formulas ===

    /// Store `formula` once for every cell of `range`, anchored at its top-left cell
    ///
    /// Returns the id of the new group.
    pub fn set_shared_formula(&mut self, range: &str, formula: &str) -> Result<u32> {
        let range = CellRange::parse(range)?;
        let id = self.next_shared_id;
        self.next_shared_id += 1;

        for addr in range.cells() {
            self.cells
                .set(addr.row, addr.col, CellValue::SharedFormula { id });
        }
        self.shared_formulas
            .insert(id, SharedFormula::new(range, formula));
        Ok(id)
    }

    /// Look up a shared-formula group
    pub fn shared_formula(&self, id: u32) -> Option<&SharedFormula> {
        self.shared_formulas.get(&id)
    }

    /// Iterate over shared-formula groups
    pub fn shared_formulas(&self) -> impl Iterator<Item = (u32, &SharedFormula)> {
        self.shared_formulas.iter().map(|(&id, group)| (id, group))
    }

    /// Replace the anchor text of a shared-formula group
    pub fn set_shared_formula_text(&mut self, id: u32, formula: String) -> bool {
        match self.shared_formulas.get_mut(&id) {
            Some(group) => {
                group.text = formula;
                true
            }
            None => false,
        }
    }

    // === Merged Cells ===

    /// Get merged regions
    pub fn merged_regions(&self) -> &[CellRange] {
        self.cells.merged_regions()
    }

    /// Merge cells; the range is normalized before it is stored
    pub fn merge_cells(&mut self, range: &str) -> Result<()> {
        let range = CellRange::parse(range)?;
        let range = CellRange::new(range.start.relative(), range.end.relative());
        if self
            .cells
            .merged_regions()
            .iter()
            .any(|existing| range.overlaps(existing))
        {
            return Err(Error::MergedCellConflict(range.to_string()));
        }
        self.cells.add_merged_region(range);
        Ok(())
    }

    /// Unmerge cells; returns whether a region was removed
    pub fn unmerge_cells(&mut self, range: &str) -> Result<bool> {
        let range = CellRange::parse(range)?;
        let range = CellRange::new(range.start.relative(), range.end.relative());
        Ok(self.cells.remove_merged_region(&range).is_some())
    }

    // === Autofilter ===

    /// Get the autofilter range
    pub fn auto_filter(&self) -> Option<&CellRange> {
        self.auto_filter.as_ref()
    }

    /// Set the autofilter range; the first row is the header row
    pub fn set_auto_filter(&mut self, range: &str) -> Result<()> {
        let range = CellRange::parse(range)?;
        self.auto_filter = Some(CellRange::new(range.start.relative(), range.end.relative()));
        Ok(())
    }

    /// Remove the autofilter
    pub fn remove_auto_filter(&mut self) -> Option<CellRange> {
        self.auto_filter.take()
    }

    // === Structural Edits ===

    /// Move cells, merged regions, the autofilter and shared-formula groups
    /// through a structural edit of this sheet
    ///
    /// Formula text is not rewritten here; callers rewrite references first.
    pub fn shift_lines(&mut self, shift: &LineShift) {
        if shift.is_noop() {
            return;
        }
        debug!("shifting worksheet '{}': {:?}", self.name, shift);

        let dropped_cells = self.cells.shift_lines(shift);
        if dropped_cells > 0 {
            debug!("dropped {} cells from '{}'", dropped_cells, self.name);
        }

        for range in self.cells.shift_merged_regions(shift) {
            warn!("merged range {} removed from '{}'", range, self.name);
        }

        if let Some(filter) = self.auto_filter {
            let header_deleted = shift.axis() == Axis::Rows && shift.deletes(filter.start.row);
            let moved = if header_deleted {
                None
            } else {
                shift.shift_range(&filter)
            };
            if moved.is_none() {
                warn!("autofilter {} removed from '{}'", filter, self.name);
            }
            self.auto_filter = moved;
        }

        let name = &self.name;
        self.shared_formulas.retain(|id, group| {
            let Some(range) = shift.shift_range(&group.range) else {
                warn!("shared formula {} removed from '{}'", id, name);
                return false;
            };
            group.anchor = shift
                .shift_address(group.anchor)
                .unwrap_or_else(|| range.start.relative());
            group.range = range;
            true
        });
    }
}
