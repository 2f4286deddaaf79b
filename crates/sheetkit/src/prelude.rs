//! Prelude module - common imports for sheetkit users
//!
//! ```rust
//! use sheetkit::prelude::*;
//! ```

pub use crate::{
    // Calculation
    CalculationOptions,
    // Cell types
    CellAddress,
    CellError,
    CellRange,
    CellValue,
    // Error types
    Error,
    Result,
    // Main types
    SharedWorkbook,
    Workbook,
    // Extension traits
    WorkbookCalculationExt,
    WorkbookStructureExt,
    Worksheet,
};
