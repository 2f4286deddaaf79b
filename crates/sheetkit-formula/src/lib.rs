//! # sheetkit-formula
//!
//! Formula engine for sheetkit.
//!
//! This crate provides:
//! - Formula tokenizing and parsing (text → AST)
//! - Formula evaluation (AST → value) against any [`CellSource`]
//! - A closed library of built-in functions
//! - Reference rewriting for shared formulas and row/column edits
//!
//! ## Example
//!
//! ```rust
//! use sheetkit_core::{CellAddress, Workbook};
//! use sheetkit_formula::{calculate_cell, CalculationOptions};
//!
//! let mut workbook = Workbook::new();
//! workbook.set_cell_value("Sheet1", "A1", 2.0)?;
//! workbook.set_cell_formula("Sheet1", "B1", "=A1*SUM(1,2)")?;
//!
//! let options = CalculationOptions::default();
//! let value = calculate_cell(&workbook, "Sheet1", CellAddress::new(0, 1), &options)?;
//! assert_eq!(value, "6");
//! # Ok::<(), sheetkit_formula::FormulaError>(())
//! ```

pub mod ast;
pub mod error;
pub mod evaluator;
pub mod functions;
pub mod lexer;
pub mod parser;
pub mod source;
pub mod translate;

pub use ast::{BinaryOperator, CellReference, FormulaExpr, RangeReference, UnaryOperator};
pub use error::{FormulaError, FormulaResult};
pub use evaluator::{
    calculate_cell, evaluate, CalculationOptions, EvaluationContext, FormulaValue,
};
pub use functions::Function;
pub use parser::parse_formula;
pub use source::{worksheet_literal, CellSource};
pub use translate::{resolve_formula, shift_references, translate_formula};
