//! Error types for sheetkit-core

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in sheetkit-core
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Text that is not an A1-style cell name
    #[error("invalid cell name \"{0}\"")]
    InvalidCellName(String),

    /// One side of a range (or a stored address) could not be converted
    #[error("cannot convert cell \"{cell}\" to coordinates: {source}")]
    CannotConvertToCoordinates {
        cell: String,
        #[source]
        source: Box<Error>,
    },

    /// Text that is not a run of column letters
    #[error("invalid column name \"{0}\"")]
    InvalidColumnName(String),

    /// Column number outside 1..=16384
    #[error("column number {0} exceeds the maximum of 16384 columns")]
    ColumnNumberOutOfRange(u64),

    /// Row number outside 1..=1048576
    #[error("row number {0} exceeds the maximum of 1048576 rows")]
    RowNumberOutOfRange(u64),

    /// Sheet not found by name
    #[error("sheet {0} is not exist")]
    SheetNotExist(String),

    /// Invalid sheet name
    #[error("invalid sheet name: {0}")]
    InvalidSheetName(String),

    /// Duplicate sheet name
    #[error("sheet name already exists: {0}")]
    DuplicateSheetName(String),

    /// Merge request overlapping an existing merged region
    #[error("cell range {0} overlaps an existing merged region")]
    MergedCellConflict(String),
}

impl Error {
    /// Wrap an address error with the text that failed to convert
    pub fn cannot_convert<S: Into<String>>(cell: S, source: Error) -> Self {
        Error::CannotConvertToCoordinates {
            cell: cell.into(),
            source: Box::new(source),
        }
    }
}
