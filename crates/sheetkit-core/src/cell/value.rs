//! Cell value types

use std::fmt;
use std::sync::Arc;

/// Represents the value stored in a cell
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    /// Empty cell (no value)
    #[default]
    Empty,

    /// Boolean value (TRUE/FALSE)
    Boolean(bool),

    /// Numeric value
    Number(f64),

    /// String value
    String(SharedString),

    /// Error value (#VALUE!, #REF!, etc.)
    Error(CellError),

    /// Formula, stored verbatim as the user wrote it
    Formula {
        /// Formula text, with or without a leading `=`
        text: String,
    },

    /// Member of a shared-formula group; the worksheet holds the group
    SharedFormula {
        /// Group id within the owning worksheet
        id: u32,
    },
}

impl CellValue {
    /// Create a new string value
    pub fn string<S: Into<String>>(s: S) -> Self {
        CellValue::String(SharedString::new(s.into()))
    }

    /// Create a new formula value
    pub fn formula<S: Into<String>>(text: S) -> Self {
        CellValue::Formula { text: text.into() }
    }

    /// Check if the cell is empty
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Check if the cell holds a formula, shared or not
    pub fn is_formula(&self) -> bool {
        matches!(
            self,
            CellValue::Formula { .. } | CellValue::SharedFormula { .. }
        )
    }

    /// Try to get the value as a number
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::Boolean(true) => Some(1.0),
            CellValue::Boolean(false) => Some(0.0),
            _ => None,
        }
    }

    /// Try to get the value as a string
    pub fn as_string(&self) -> Option<&str> {
        match self {
            CellValue::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Get the formula text if this is a plain formula cell
    pub fn formula_text(&self) -> Option<&str> {
        match self {
            CellValue::Formula { text } => Some(text),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Boolean(b) => f.write_str(if *b { "TRUE" } else { "FALSE" }),
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::String(s) => f.write_str(s.as_str()),
            CellValue::Error(e) => write!(f, "{}", e),
            CellValue::Formula { text } => f.write_str(text),
            CellValue::SharedFormula { id } => write!(f, "<shared formula {}>", id),
        }
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Boolean(b)
    }
}

impl From<i32> for CellValue {
    fn from(n: i32) -> Self {
        CellValue::Number(n as f64)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::string(s)
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::string(s)
    }
}

impl From<CellError> for CellValue {
    fn from(e: CellError) -> Self {
        CellValue::Error(e)
    }
}

/// Excel error values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellError {
    /// #NULL! - Incorrect range operator
    Null,
    /// #DIV/0! - Division by zero
    Div0,
    /// #VALUE! - Wrong type of argument or operand
    Value,
    /// #REF! - Invalid cell reference
    Ref,
    /// #NAME? - Unrecognized formula name
    Name,
    /// #NUM! - Invalid numeric value
    Num,
    /// #N/A - Value not available
    Na,
}

impl CellError {
    /// Every error code, longest first so prefix scanning picks the full code
    pub const ALL: [CellError; 7] = [
        CellError::Value,
        CellError::Div0,
        CellError::Null,
        CellError::Name,
        CellError::Num,
        CellError::Ref,
        CellError::Na,
    ];

    /// Get the display string for this error
    pub fn as_str(&self) -> &'static str {
        match self {
            CellError::Null => "#NULL!",
            CellError::Div0 => "#DIV/0!",
            CellError::Value => "#VALUE!",
            CellError::Ref => "#REF!",
            CellError::Name => "#NAME?",
            CellError::Num => "#NUM!",
            CellError::Na => "#N/A",
        }
    }

    /// Parse an error code, case-insensitively
    pub fn from_code(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|e| e.as_str().eq_ignore_ascii_case(s))
    }
}

impl fmt::Display for CellError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference-counted string for cell text
///
/// Cloning a [`CellValue`] while moving cells around (row/column insertion)
/// shares the text instead of copying it.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SharedString(Arc<str>);

impl SharedString {
    /// Create a new shared string
    pub fn new<S: AsRef<str>>(s: S) -> Self {
        SharedString(Arc::from(s.as_ref()))
    }

    /// Get the string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SharedString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

impl fmt::Display for SharedString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SharedString {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SharedString {
    fn from(s: &str) -> Self {
        SharedString::new(s)
    }
}

impl From<String> for SharedString {
    fn from(s: String) -> Self {
        SharedString::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_value_conversions() {
        assert_eq!(CellValue::from(42), CellValue::Number(42.0));
        assert_eq!(CellValue::from(true), CellValue::Boolean(true));
        assert_eq!(CellValue::from("hello").as_string(), Some("hello"));
        assert_eq!(CellValue::from(CellError::Ref).to_string(), "#REF!");
    }

    #[test]
    fn test_formula_kinds() {
        let plain = CellValue::formula("SUM(A1:A2)");
        assert!(plain.is_formula());
        assert_eq!(plain.formula_text(), Some("SUM(A1:A2)"));

        let shared = CellValue::SharedFormula { id: 0 };
        assert!(shared.is_formula());
        assert_eq!(shared.formula_text(), None);

        assert!(!CellValue::Number(1.0).is_formula());
    }

    #[test]
    fn test_cell_error_codes() {
        assert_eq!(CellError::Div0.to_string(), "#DIV/0!");
        assert_eq!(CellError::from_code("#ref!"), Some(CellError::Ref));
        assert_eq!(CellError::from_code("#N/A"), Some(CellError::Na));
        assert_eq!(CellError::from_code("#BOGUS!"), None);
    }
}
