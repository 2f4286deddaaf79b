//! # sheetkit
//!
//! Spreadsheet formula evaluation and structural editing with consistent
//! cell references.
//!
//! sheetkit keeps an in-memory [`Workbook`] and offers the operations that
//! need formulas and coordinates to agree with each other:
//!
//! - Evaluate a cell's formula, following references across sheets
//! - Store shared formulas once and expand them per cell on read
//! - Insert and delete rows or columns, moving cells, merged regions, the
//!   autofilter, calc-chain entries and every formula reference that points
//!   into the edited sheet
//! - Share a workbook between threads with per-worksheet locks
//!
//! ## Example
//!
//! ```rust
//! use sheetkit::prelude::*;
//!
//! let mut workbook = Workbook::new();
//! workbook.set_cell_value("Sheet1", "A1", 1.0)?;
//! workbook.set_cell_value("Sheet1", "A2", 2.0)?;
//! workbook.set_cell_formula("Sheet1", "A3", "=SUM(A1:A2)")?;
//!
//! assert_eq!(workbook.calc_cell_value("Sheet1", "A3")?, "3");
//!
//! // Insert a row above A2; the formula follows its inputs.
//! workbook.insert_rows("Sheet1", 2, 1)?;
//! assert_eq!(workbook.get_cell_formula("Sheet1", "A4")?, "=SUM(A1:A3)");
//! # Ok::<(), sheetkit::Error>(())
//! ```

pub mod calculation;
pub mod concurrent;
pub mod prelude;
pub mod structure;

pub use calculation::WorkbookCalculationExt;
pub use concurrent::SharedWorkbook;
pub use structure::WorkbookStructureExt;

// Re-export core types
pub use sheetkit_core::{
    column_name_to_number, Axis, CalcChain, CalcChainEntry, CellAddress, CellError, CellRange,
    CellValue, LineShift, SharedFormula, Workbook, WorkbookSettings, Worksheet, MAX_COLS, MAX_ROWS,
};

// Re-export formula types
pub use sheetkit_formula::{
    calculate_cell, evaluate, parse_formula, shift_references, translate_formula,
    CalculationOptions, CellSource, EvaluationContext, FormulaError, FormulaExpr, FormulaValue,
    Function,
};

/// Errors from sheetkit operations
///
/// Messages are those of the underlying error, unchanged.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// Workbook, worksheet or coordinate error
    #[error(transparent)]
    Core(#[from] sheetkit_core::Error),

    /// Formula parsing, evaluation or translation error
    #[error(transparent)]
    Formula(#[from] FormulaError),
}

/// Result type for sheetkit operations
pub type Result<T> = std::result::Result<T, Error>;
