//! Formula error types

use sheetkit_core::CellError;
use thiserror::Error;

/// Result type for formula operations
pub type FormulaResult<T> = std::result::Result<T, FormulaError>;

/// Errors that can occur during formula parsing, evaluation or rewriting
///
/// Evaluation has no error-valued results: an Excel error code such as
/// `#DIV/0!` aborts the call as [`FormulaError::Cell`], whose message is the
/// code itself.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormulaError {
    /// Formula parse error, carrying the offending text
    #[error("Parse error: {0}")]
    Parse(String),

    /// Malformed or out-of-range reference text
    #[error(transparent)]
    Reference(#[from] sheetkit_core::Error),

    /// Wrong number or type of function arguments
    #[error("{0}")]
    Argument(String),

    /// Excel error code raised during evaluation
    #[error("{0}")]
    Cell(CellError),

    /// Function name outside the supported set
    #[error("not support {0} function")]
    UnsupportedFunction(String),

    /// A cell that (indirectly) refers to itself
    #[error("circular reference detected at {0}")]
    CircularReference(String),

    /// Formula cells nested deeper than the configured limit
    #[error("formula nesting exceeds the maximum depth of {0}")]
    DepthExceeded(usize),

    /// A translated reference would leave the worksheet grid
    #[error("reference {0} is out of range after translation")]
    ReferenceOutOfRange(String),
}

impl FormulaError {
    pub(crate) fn div0() -> Self {
        FormulaError::Cell(CellError::Div0)
    }

    pub(crate) fn num() -> Self {
        FormulaError::Cell(CellError::Num)
    }

    pub(crate) fn value() -> Self {
        FormulaError::Cell(CellError::Value)
    }

    /// `<NAME> requires <n> numeric arguments`
    pub(crate) fn numeric_arity(function: &str, count: usize) -> Self {
        FormulaError::Argument(format!("{} requires {} numeric arguments", function, count))
    }

    /// `<NAME> requires at least 1 argument`
    pub(crate) fn at_least_one(function: &str) -> Self {
        FormulaError::Argument(format!("{} requires at least 1 argument", function))
    }
}
