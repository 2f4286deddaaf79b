//! Cell storage implementation
//!
//! Sparse storage for worksheet cells. Only non-empty cells are stored, using
//! a row-based BTreeMap structure, next to the merged regions that cover them.

use std::collections::BTreeMap;

use super::{CellRange, CellValue};
use crate::shift::{Axis, LineShift};

/// Sparse row-based storage for worksheet cells
///
/// Structure: `BTreeMap<row_index, BTreeMap<col_index, CellValue>>`, so that
/// iteration is row-major and structural edits can rebuild the maps in order.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CellStorage {
    /// Row index → column map
    rows: BTreeMap<u32, BTreeMap<u16, CellValue>>,

    /// Merged cell regions
    merged_regions: Vec<CellRange>,
}

impl CellStorage {
    /// Create a new empty cell storage
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a cell value
    pub fn get(&self, row: u32, col: u16) -> Option<&CellValue> {
        self.rows.get(&row).and_then(|r| r.get(&col))
    }

    /// Get a mutable cell value
    pub fn get_mut(&mut self, row: u32, col: u16) -> Option<&mut CellValue> {
        self.rows.get_mut(&row).and_then(|r| r.get_mut(&col))
    }

    /// Set a cell value
    ///
    /// Setting [`CellValue::Empty`] removes the cell.
    pub fn set(&mut self, row: u32, col: u16, value: CellValue) {
        if value.is_empty() {
            self.remove(row, col);
        } else {
            self.rows.entry(row).or_default().insert(col, value);
        }
    }

    /// Remove a cell
    pub fn remove(&mut self, row: u32, col: u16) -> Option<CellValue> {
        let row_map = self.rows.get_mut(&row)?;
        let removed = row_map.remove(&col);
        if row_map.is_empty() {
            self.rows.remove(&row);
        }
        removed
    }

    /// Get the number of non-empty cells
    pub fn cell_count(&self) -> usize {
        self.rows.values().map(|r| r.len()).sum()
    }

    /// Check if storage is empty
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterate over all cells in row order
    pub fn iter(&self) -> impl Iterator<Item = (u32, u16, &CellValue)> {
        self.rows
            .iter()
            .flat_map(|(&row, cols)| cols.iter().map(move |(&col, value)| (row, col, value)))
    }

    /// Move every cell through a structural edit
    ///
    /// Cells on deleted lines, or pushed past the edge of the grid, are
    /// dropped. Returns the number of dropped cells.
    pub fn shift_lines(&mut self, shift: &LineShift) -> usize {
        if shift.is_noop() {
            return 0;
        }

        let before = self.cell_count();
        let rows = std::mem::take(&mut self.rows);

        match shift.axis() {
            Axis::Rows => {
                for (row, cols) in rows {
                    if let Some(new_row) = shift.shift_index(row) {
                        self.rows.insert(new_row, cols);
                    }
                }
            }
            Axis::Columns => {
                for (row, cols) in rows {
                    let moved: BTreeMap<u16, CellValue> = cols
                        .into_iter()
                        .filter_map(|(col, value)| {
                            shift
                                .shift_index(col as u32)
                                .map(|new_col| (new_col as u16, value))
                        })
                        .collect();
                    if !moved.is_empty() {
                        self.rows.insert(row, moved);
                    }
                }
            }
        }

        before - self.cell_count()
    }

    /// Get merged regions
    pub fn merged_regions(&self) -> &[CellRange] {
        &self.merged_regions
    }

    /// Add a merged region
    pub fn add_merged_region(&mut self, range: CellRange) {
        self.merged_regions.push(range);
    }

    /// Remove the merged region equal to `range`
    pub fn remove_merged_region(&mut self, range: &CellRange) -> Option<CellRange> {
        let index = self.merged_regions.iter().position(|r| r == range)?;
        Some(self.merged_regions.remove(index))
    }

    /// Move merged regions through a structural edit, dropping collapsed ones
    ///
    /// Returns the regions that were dropped.
    pub fn shift_merged_regions(&mut self, shift: &LineShift) -> Vec<CellRange> {
        let mut dropped = Vec::new();
        self.merged_regions = std::mem::take(&mut self.merged_regions)
            .into_iter()
            .filter_map(|range| {
                let moved = shift.shift_range(&range);
                if moved.is_none() {
                    dropped.push(range);
                }
                moved
            })
            .collect();
        dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(cells: &[(u32, u16, f64)]) -> CellStorage {
        let mut storage = CellStorage::new();
        for &(row, col, n) in cells {
            storage.set(row, col, CellValue::Number(n));
        }
        storage
    }

    #[test]
    fn test_basic_operations() {
        let mut storage = CellStorage::new();

        storage.set(0, 0, CellValue::Number(42.0));
        assert_eq!(storage.get(0, 0), Some(&CellValue::Number(42.0)));
        assert!(storage.get(1, 1).is_none());

        storage.set(0, 0, CellValue::Empty);
        assert_eq!(storage.cell_count(), 0);
        assert!(storage.is_empty());
    }

    #[test]
    fn test_iteration_is_row_major() {
        let storage = filled(&[(1, 0, 3.0), (0, 1, 2.0), (0, 0, 1.0)]);
        let order: Vec<_> = storage.iter().map(|(r, c, _)| (r, c)).collect();
        assert_eq!(order, vec![(0, 0), (0, 1), (1, 0)]);
    }

    #[test]
    fn test_shift_rows_moves_and_drops() {
        let mut storage = filled(&[(0, 0, 1.0), (1, 0, 2.0), (2, 0, 3.0)]);

        let dropped = storage.shift_lines(&LineShift::delete_rows(1, 1));
        assert_eq!(dropped, 1);
        assert_eq!(storage.get(0, 0), Some(&CellValue::Number(1.0)));
        assert_eq!(storage.get(1, 0), Some(&CellValue::Number(3.0)));
        assert!(storage.get(2, 0).is_none());

        storage.shift_lines(&LineShift::insert_rows(0, 2));
        assert_eq!(storage.get(2, 0), Some(&CellValue::Number(1.0)));
        assert_eq!(storage.get(3, 0), Some(&CellValue::Number(3.0)));
    }

    #[test]
    fn test_shift_columns() {
        let mut storage = filled(&[(0, 0, 1.0), (0, 1, 2.0), (4, 1, 3.0)]);

        assert_eq!(storage.shift_lines(&LineShift::delete_columns(1, 1)), 2);
        assert_eq!(storage.cell_count(), 1);
        assert_eq!(storage.get(0, 0), Some(&CellValue::Number(1.0)));
    }

    #[test]
    fn test_merged_regions() {
        let mut storage = CellStorage::new();
        storage.add_merged_region(CellRange::parse("A1:B1").unwrap());
        storage.add_merged_region(CellRange::parse("C3:D5").unwrap());

        let dropped = storage.shift_merged_regions(&LineShift::delete_rows(0, 1));
        assert_eq!(dropped, vec![CellRange::parse("A1:B1").unwrap()]);
        assert_eq!(storage.merged_regions(), &[CellRange::parse("C2:D4").unwrap()]);

        assert!(storage
            .remove_merged_region(&CellRange::parse("C2:D4").unwrap())
            .is_some());
        assert!(storage.merged_regions().is_empty());
    }
}
