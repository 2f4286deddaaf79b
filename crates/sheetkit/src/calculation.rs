//! Workbook calculation
//!
//! Cell-level formula calculation for a [`Workbook`], addressed by sheet name
//! and A1 cell text.
//!
//! # Example
//!
//! ```rust
//! use sheetkit::prelude::*;
//!
//! let mut workbook = Workbook::new();
//! workbook.set_cell_value("Sheet1", "A1", 10.0)?;
//! workbook.set_cell_value("Sheet1", "A2", 20.0)?;
//! workbook.set_cell_formula("Sheet1", "A3", "=A1+A2")?;
//!
//! assert_eq!(workbook.calc_cell_value("Sheet1", "A3")?, "30");
//! assert_eq!(workbook.calc_cell_value("Sheet1", "A1")?, "");
//! # Ok::<(), sheetkit::Error>(())
//! ```

use log::debug;
use sheetkit_formula::{calculate_cell, CalculationOptions, CellSource};

use crate::{CellAddress, Result, Workbook};

/// Extension trait for Workbook to add calculation methods
pub trait WorkbookCalculationExt {
    /// Calculate the formula of one cell with default options
    ///
    /// Cells without a formula calculate to an empty string.
    fn calc_cell_value(&self, sheet: &str, cell: &str) -> Result<String>;

    /// Calculate the formula of one cell with custom options
    fn calc_cell_value_with_options(
        &self,
        sheet: &str,
        cell: &str,
        options: &CalculationOptions,
    ) -> Result<String>;

    /// Formula text of a cell, with shared formulas expanded for that cell
    ///
    /// Cells without a formula give an empty string.
    fn get_cell_formula(&self, sheet: &str, cell: &str) -> Result<String>;
}

impl WorkbookCalculationExt for Workbook {
    fn calc_cell_value(&self, sheet: &str, cell: &str) -> Result<String> {
        self.calc_cell_value_with_options(sheet, cell, &CalculationOptions::default())
    }

    fn calc_cell_value_with_options(
        &self,
        sheet: &str,
        cell: &str,
        options: &CalculationOptions,
    ) -> Result<String> {
        calc_in_source(self, sheet, cell, options)
    }

    fn get_cell_formula(&self, sheet: &str, cell: &str) -> Result<String> {
        formula_in_source(self, sheet, cell)
    }
}

/// Calculate a cell of any [`CellSource`], addressed by A1 text
pub(crate) fn calc_in_source(
    source: &dyn CellSource,
    sheet: &str,
    cell: &str,
    options: &CalculationOptions,
) -> Result<String> {
    let addr = CellAddress::parse_cell_name(cell)?;
    debug!("calculating {}!{}", sheet, addr);
    Ok(calculate_cell(source, sheet, addr, options)?)
}

/// Formula of a cell of any [`CellSource`], addressed by A1 text
pub(crate) fn formula_in_source(
    source: &dyn CellSource,
    sheet: &str,
    cell: &str,
) -> Result<String> {
    if !source.sheet_exists(sheet) {
        return Err(sheetkit_core::Error::SheetNotExist(sheet.to_string()).into());
    }
    let addr = CellAddress::parse_cell_name(cell)?;
    Ok(source.read_cell_formula(sheet, addr)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_calc_cell_value() {
        let mut wb = Workbook::new();
        wb.set_cell_value("Sheet1", "A1", 1.0).unwrap();
        wb.set_cell_value("Sheet1", "A2", 2.0).unwrap();
        wb.set_cell_value("Sheet1", "A3", 3.0).unwrap();
        wb.set_cell_formula("Sheet1", "B1", "SUM(A1:A2)").unwrap();
        wb.set_cell_formula("Sheet1", "B2", "A1/A3").unwrap();

        assert_eq!(wb.calc_cell_value("Sheet1", "B1").unwrap(), "3");
        assert_eq!(wb.calc_cell_value("Sheet1", "B2").unwrap(), "0.3333333333333333");
        assert_eq!(wb.calc_cell_value("Sheet1", "A1").unwrap(), "");
    }

    #[test]
    fn test_calc_errors_keep_their_text() {
        let mut wb = Workbook::new();
        wb.set_cell_formula("Sheet1", "A1", "UNSUPPORT(A1)").unwrap();

        assert_eq!(
            wb.calc_cell_value("Sheet1", "A1").unwrap_err().to_string(),
            "not support UNSUPPORT function"
        );
        assert_eq!(
            wb.calc_cell_value("SheetN", "A1").unwrap_err().to_string(),
            "sheet SheetN is not exist"
        );
        assert_eq!(
            wb.calc_cell_value("Sheet1", "A").unwrap_err().to_string(),
            "cannot convert cell \"A\" to coordinates: invalid cell name \"A\""
        );
    }

    #[test]
    fn test_get_cell_formula() {
        let mut wb = Workbook::new();
        wb.set_shared_formula("Sheet1", "B2:B4", "2*A2").unwrap();
        wb.set_cell_formula("Sheet1", "C1", "=1+1").unwrap();

        assert_eq!(wb.get_cell_formula("Sheet1", "B3").unwrap(), "2*A3");
        assert_eq!(wb.get_cell_formula("Sheet1", "C1").unwrap(), "=1+1");
        assert_eq!(wb.get_cell_formula("Sheet1", "D1").unwrap(), "");
        assert!(wb.get_cell_formula("Nope", "A1").is_err());
    }
}
