//! # sheetkit-core
//!
//! Core data structures for the sheetkit spreadsheet engine.
//!
//! This crate provides the types every other sheetkit crate builds on:
//! - [`CellAddress`] and [`CellRange`] - A1-style addressing and rectangular ranges
//! - [`CellValue`] - Literal values, formulas and shared-formula members
//! - [`Worksheet`] and [`Workbook`] - Sparse cell storage plus merged ranges,
//!   the autofilter, shared-formula groups and the calculation chain
//! - [`LineShift`] - Row/column insertion and deletion arithmetic
//!
//! ## Example
//!
//! ```rust
//! use sheetkit_core::{CellValue, Workbook};
//!
//! let mut workbook = Workbook::new();
//! workbook.set_cell_value("Sheet1", "A1", 1.0).unwrap();
//! workbook.set_cell_formula("Sheet1", "B1", "A1*2").unwrap();
//!
//! let sheet = workbook.worksheet_by_name("Sheet1").unwrap();
//! assert_eq!(sheet.get_value("A1").unwrap(), CellValue::Number(1.0));
//! assert_eq!(workbook.calc_chain().len(), 1);
//! ```

pub mod calc_chain;
pub mod cell;
pub mod error;
pub mod shift;
pub mod workbook;
pub mod worksheet;

pub use calc_chain::{CalcChain, CalcChainEntry};
pub use cell::{
    cell_name_to_coordinates, column_name_to_number, column_number_to_name,
    coordinates_to_cell_name, CellAddress, CellError, CellRange, CellStorage, CellValue,
    SharedFormula, SharedString,
};
pub use error::{Error, Result};
pub use shift::{Axis, LineShift};
pub use workbook::{Workbook, WorkbookSettings};
pub use worksheet::Worksheet;

/// Maximum number of rows in a worksheet (Excel limit)
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum number of columns in a worksheet (Excel limit)
pub const MAX_COLS: u16 = 16_384;

/// Maximum length of a sheet name
pub const MAX_SHEET_NAME_LEN: usize = 31;
