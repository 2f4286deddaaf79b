//! Cell-related types and utilities
//!
//! This module contains:
//! - [`CellValue`] - The value stored in a cell
//! - [`CellAddress`] - A cell's location (e.g., "A1")
//! - [`CellRange`] - A range of cells (e.g., "A1:B10")
//! - [`CellStorage`] - Sparse storage of a worksheet's cells
//! - [`SharedFormula`] - A formula shared by a block of cells

mod address;
mod shared;
mod storage;
mod value;

pub use address::{
    cell_name_to_coordinates, column_name_to_number, column_number_to_name,
    coordinates_to_cell_name, CellAddress, CellRange, CellRangeIterator,
};
pub use shared::SharedFormula;
pub use storage::CellStorage;
pub use value::{CellError, CellValue, SharedString};
