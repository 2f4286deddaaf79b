//! Cell address and range types
//!
//! Addresses are stored 0-based (`row`, `col`) with a per-axis absolute flag.
//! The free functions at the bottom of this module speak the 1-based
//! (column, row) coordinates used by the public workbook API.

use crate::error::{Error, Result};
use crate::{MAX_COLS, MAX_ROWS};
use std::fmt;
use std::str::FromStr;

/// A cell address (e.g., "A1", "$B$2")
///
/// Column letters run A-XFD and row numbers 1-1048576. A `$` before either
/// part pins that axis: the reference is not moved when a formula is copied
/// to another cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellAddress {
    /// Row index (0-based internally, 1-based in display)
    pub row: u32,
    /// Column index (0-based, A=0, B=1, ..., XFD=16383)
    pub col: u16,
    /// Whether the row reference is absolute ($)
    pub row_absolute: bool,
    /// Whether the column reference is absolute ($)
    pub col_absolute: bool,
}

impl CellAddress {
    /// Create a new cell address with relative references
    pub fn new(row: u32, col: u16) -> Self {
        Self::with_absolute(row, col, false, false)
    }

    /// Create a new cell address with specified absolute/relative flags
    pub fn with_absolute(row: u32, col: u16, row_absolute: bool, col_absolute: bool) -> Self {
        Self {
            row,
            col,
            row_absolute,
            col_absolute,
        }
    }

    /// Create an address from 1-based (column, row) coordinates
    pub fn from_coordinates(col: u32, row: u32) -> Result<Self> {
        if col == 0 || col > MAX_COLS as u32 {
            return Err(Error::ColumnNumberOutOfRange(col as u64));
        }
        if row == 0 || row > MAX_ROWS {
            return Err(Error::RowNumberOutOfRange(row as u64));
        }
        Ok(Self::new(row - 1, (col - 1) as u16))
    }

    /// Parse a cell address from A1-style notation
    ///
    /// Lowercase letters are accepted; the canonical form is uppercase.
    ///
    /// # Examples
    /// ```
    /// use sheetkit_core::CellAddress;
    ///
    /// let addr = CellAddress::parse("b12").unwrap();
    /// assert_eq!((addr.col, addr.row), (1, 11));
    /// assert_eq!(addr.to_string(), "B12");
    ///
    /// let addr = CellAddress::parse("$C$3").unwrap();
    /// assert!(addr.row_absolute && addr.col_absolute);
    /// ```
    pub fn parse(s: &str) -> Result<Self> {
        let text = s.trim();
        let invalid = || Error::InvalidCellName(s.to_string());
        let bytes = text.as_bytes();
        let mut pos = 0;

        let col_absolute = bytes.first() == Some(&b'$');
        if col_absolute {
            pos += 1;
        }

        let col_start = pos;
        while pos < bytes.len() && bytes[pos].is_ascii_alphabetic() {
            pos += 1;
        }
        if pos == col_start {
            return Err(invalid());
        }
        let letters = &text[col_start..pos];

        let row_absolute = bytes.get(pos) == Some(&b'$');
        if row_absolute {
            pos += 1;
        }

        let digits = &text[pos..];
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let col = column_name_to_number(letters)?;
        let row: u64 = digits.parse().map_err(|_| invalid())?;
        if row == 0 {
            return Err(invalid());
        }
        if row > MAX_ROWS as u64 {
            return Err(Error::RowNumberOutOfRange(row));
        }

        Ok(Self::with_absolute(
            (row - 1) as u32,
            (col - 1) as u16,
            row_absolute,
            col_absolute,
        ))
    }

    /// Parse a cell name given by a caller
    ///
    /// Like [`CellAddress::parse`], but failures are reported as
    /// [`Error::CannotConvertToCoordinates`] naming the text.
    pub fn parse_cell_name(name: &str) -> Result<Self> {
        Self::parse(name).map_err(|e| Error::cannot_convert(name, e))
    }

    /// Convert a 0-based column index to letters (0 = A, 25 = Z, 26 = AA, etc.)
    pub fn column_to_letters(col: u16) -> String {
        let mut letters = Vec::with_capacity(3);
        let mut n = col as u32 + 1;

        while n > 0 {
            n -= 1;
            letters.push(b'A' + (n % 26) as u8);
            n /= 26;
        }

        letters.iter().rev().map(|&b| b as char).collect()
    }

    /// 1-based column number
    pub fn column_number(&self) -> u32 {
        self.col as u32 + 1
    }

    /// 1-based row number
    pub fn row_number(&self) -> u32 {
        self.row + 1
    }

    /// Move the relative axes of this address by the given deltas.
    ///
    /// Absolute axes are left alone. Returns `None` when the result would
    /// leave the worksheet grid.
    pub fn translated(&self, row_delta: i64, col_delta: i64) -> Option<CellAddress> {
        let row = if self.row_absolute {
            self.row as i64
        } else {
            self.row as i64 + row_delta
        };
        let col = if self.col_absolute {
            self.col as i64
        } else {
            self.col as i64 + col_delta
        };

        if !(0..MAX_ROWS as i64).contains(&row) || !(0..MAX_COLS as i64).contains(&col) {
            return None;
        }

        Some(Self::with_absolute(
            row as u32,
            col as u16,
            self.row_absolute,
            self.col_absolute,
        ))
    }

    /// Same position with both absolute markers cleared
    pub fn relative(&self) -> CellAddress {
        Self::new(self.row, self.col)
    }

    /// Format as A1-style string
    pub fn to_a1_string(&self) -> String {
        let mut result = String::with_capacity(10);

        if self.col_absolute {
            result.push('$');
        }
        result.push_str(&Self::column_to_letters(self.col));

        if self.row_absolute {
            result.push('$');
        }
        result.push_str(&self.row_number().to_string());

        result
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_a1_string())
    }
}

impl FromStr for CellAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// A range of cells (e.g., "A1:B10")
///
/// Ranges are always normalized: `start` is the top-left corner and `end`
/// the bottom-right one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellRange {
    /// Start address (top-left)
    pub start: CellAddress,
    /// End address (bottom-right)
    pub end: CellAddress,
}

impl CellRange {
    /// Create a new cell range, reordering the corners when needed
    pub fn new(a: CellAddress, b: CellAddress) -> Self {
        let (top, bottom) = if a.row <= b.row { (a, b) } else { (b, a) };
        let (left, right) = if a.col <= b.col { (a, b) } else { (b, a) };

        Self {
            start: CellAddress::with_absolute(
                top.row,
                left.col,
                top.row_absolute,
                left.col_absolute,
            ),
            end: CellAddress::with_absolute(
                bottom.row,
                right.col,
                bottom.row_absolute,
                right.col_absolute,
            ),
        }
    }

    /// Create a single-cell range
    pub fn single(addr: CellAddress) -> Self {
        Self {
            start: addr,
            end: addr,
        }
    }

    /// Parse a range from `A1:B10` notation
    ///
    /// A bare address yields a single-cell range. A side that is not a valid
    /// address fails with [`Error::CannotConvertToCoordinates`] naming that side.
    ///
    /// ```
    /// use sheetkit_core::CellRange;
    ///
    /// assert_eq!(CellRange::parse("D7:A3").unwrap().to_string(), "A3:D7");
    /// assert_eq!(
    ///     CellRange::parse("A1:A").unwrap_err().to_string(),
    ///     r#"cannot convert cell "A" to coordinates: invalid cell name "A""#
    /// );
    /// ```
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        let convert = |side: &str| {
            let side = side.trim();
            CellAddress::parse(side).map_err(|e| Error::cannot_convert(side, e))
        };

        match s.split_once(':') {
            Some((left, right)) => Ok(Self::new(convert(left)?, convert(right)?)),
            None => Ok(Self::single(convert(s)?)),
        }
    }

    /// Check if a cell is within this range
    pub fn contains(&self, addr: &CellAddress) -> bool {
        addr.row >= self.start.row
            && addr.row <= self.end.row
            && addr.col >= self.start.col
            && addr.col <= self.end.col
    }

    /// Check if this range overlaps with another
    pub fn overlaps(&self, other: &CellRange) -> bool {
        self.start.row <= other.end.row
            && self.end.row >= other.start.row
            && self.start.col <= other.end.col
            && self.end.col >= other.start.col
    }

    /// Get the number of rows in the range
    pub fn row_count(&self) -> u32 {
        self.end.row - self.start.row + 1
    }

    /// Get the number of columns in the range
    pub fn col_count(&self) -> u16 {
        self.end.col - self.start.col + 1
    }

    /// Get the total number of cells in the range
    pub fn cell_count(&self) -> u64 {
        self.row_count() as u64 * self.col_count() as u64
    }

    /// Whether the range covers exactly one cell
    pub fn is_single(&self) -> bool {
        self.start.row == self.end.row && self.start.col == self.end.col
    }

    /// Iterate over all cell addresses in the range (row by row)
    pub fn cells(&self) -> CellRangeIterator {
        CellRangeIterator {
            range: *self,
            current_row: self.start.row,
            current_col: self.start.col,
        }
    }

    /// Format as `A1:B10`, or a bare address for a single cell
    pub fn to_a1_string(&self) -> String {
        if self.start == self.end {
            self.start.to_a1_string()
        } else {
            format!("{}:{}", self.start.to_a1_string(), self.end.to_a1_string())
        }
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_a1_string())
    }
}

impl FromStr for CellRange {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Row-major iterator over the cells of a range
pub struct CellRangeIterator {
    range: CellRange,
    current_row: u32,
    current_col: u16,
}

impl Iterator for CellRangeIterator {
    type Item = CellAddress;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current_row > self.range.end.row {
            return None;
        }

        let addr = CellAddress::new(self.current_row, self.current_col);

        if self.current_col >= self.range.end.col {
            self.current_col = self.range.start.col;
            self.current_row += 1;
        } else {
            self.current_col += 1;
        }

        Some(addr)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.current_row > self.range.end.row {
            return (0, Some(0));
        }
        let width = self.range.col_count() as u64;
        let rows_after = (self.range.end.row - self.current_row) as u64;
        let in_row = (self.range.end.col - self.current_col) as u64 + 1;
        let remaining = (rows_after * width + in_row) as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for CellRangeIterator {}

/// Convert column letters to a 1-based column number (`"A"` = 1, `"AA"` = 27)
pub fn column_name_to_number(name: &str) -> Result<u32> {
    let name = name.trim();
    if name.is_empty() || !name.bytes().all(|b| b.is_ascii_alphabetic()) {
        return Err(Error::InvalidColumnName(name.to_string()));
    }

    let mut col: u64 = 0;
    for b in name.bytes() {
        col = col * 26 + (b.to_ascii_uppercase() - b'A' + 1) as u64;
        if col > MAX_COLS as u64 {
            return Err(Error::ColumnNumberOutOfRange(col));
        }
    }

    Ok(col as u32)
}

/// Convert a 1-based column number to letters (1 = `"A"`, 16384 = `"XFD"`)
pub fn column_number_to_name(col: u32) -> Result<String> {
    if col == 0 || col > MAX_COLS as u32 {
        return Err(Error::ColumnNumberOutOfRange(col as u64));
    }
    Ok(CellAddress::column_to_letters((col - 1) as u16))
}

/// Split a cell name into 1-based (column, row) coordinates
pub fn cell_name_to_coordinates(name: &str) -> Result<(u32, u32)> {
    let addr = CellAddress::parse_cell_name(name)?;
    Ok((addr.column_number(), addr.row_number()))
}

/// Build a cell name from 1-based (column, row) coordinates
pub fn coordinates_to_cell_name(col: u32, row: u32, absolute: bool) -> Result<String> {
    let addr = CellAddress::from_coordinates(col, row)?;
    Ok(CellAddress::with_absolute(addr.row, addr.col, absolute, absolute).to_a1_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn test_column_to_letters() {
        assert_eq!(CellAddress::column_to_letters(0), "A");
        assert_eq!(CellAddress::column_to_letters(25), "Z");
        assert_eq!(CellAddress::column_to_letters(26), "AA");
        assert_eq!(CellAddress::column_to_letters(701), "ZZ");
        assert_eq!(CellAddress::column_to_letters(702), "AAA");
        assert_eq!(CellAddress::column_to_letters(16383), "XFD");
    }

    #[test]
    fn test_column_name_to_number() {
        assert_eq!(column_name_to_number("A").unwrap(), 1);
        assert_eq!(column_name_to_number("z").unwrap(), 26);
        assert_eq!(column_name_to_number("AA").unwrap(), 27);
        assert_eq!(column_name_to_number("XFD").unwrap(), 16384);

        assert_eq!(
            column_name_to_number("XFE").unwrap_err(),
            Error::ColumnNumberOutOfRange(16385)
        );
        assert_eq!(
            column_name_to_number("A1").unwrap_err(),
            Error::InvalidColumnName("A1".into())
        );
        assert!(column_name_to_number("").is_err());
    }

    #[test]
    fn test_column_number_to_name() {
        assert_eq!(column_number_to_name(1).unwrap(), "A");
        assert_eq!(column_number_to_name(28).unwrap(), "AB");
        assert!(column_number_to_name(0).is_err());
        assert!(column_number_to_name(16385).is_err());
    }

    #[test]
    fn test_cell_address_parse() {
        let addr = CellAddress::parse("A1").unwrap();
        assert_eq!((addr.row, addr.col), (0, 0));
        assert!(!addr.row_absolute && !addr.col_absolute);

        let addr = CellAddress::parse("$A1").unwrap();
        assert!(addr.col_absolute);
        assert!(!addr.row_absolute);

        let addr = CellAddress::parse("A$1").unwrap();
        assert!(!addr.col_absolute);
        assert!(addr.row_absolute);

        let addr = CellAddress::parse("xfd1048576").unwrap();
        assert_eq!((addr.row, addr.col), (1_048_575, 16_383));
    }

    #[test]
    fn test_cell_address_parse_errors() {
        assert_eq!(
            CellAddress::parse("A").unwrap_err().to_string(),
            r#"invalid cell name "A""#
        );
        assert_eq!(
            CellAddress::parse("A0").unwrap_err(),
            Error::InvalidCellName("A0".into())
        );
        assert_eq!(
            CellAddress::parse("A1B").unwrap_err(),
            Error::InvalidCellName("A1B".into())
        );
        assert!(CellAddress::parse("").is_err());
        assert!(CellAddress::parse("1").is_err());
        assert!(CellAddress::parse("$$A1").is_err());
        assert_eq!(
            CellAddress::parse("A1048577").unwrap_err(),
            Error::RowNumberOutOfRange(1_048_577)
        );
        assert_eq!(
            CellAddress::parse("XFE1").unwrap_err(),
            Error::ColumnNumberOutOfRange(16_385)
        );
    }

    #[test]
    fn test_coordinate_helpers() {
        assert_eq!(cell_name_to_coordinates("B12").unwrap(), (2, 12));
        assert_eq!(coordinates_to_cell_name(2, 12, false).unwrap(), "B12");
        assert_eq!(coordinates_to_cell_name(1, 1, true).unwrap(), "$A$1");
        assert!(coordinates_to_cell_name(0, 1, false).is_err());
        assert_eq!(
            cell_name_to_coordinates("A").unwrap_err().to_string(),
            r#"cannot convert cell "A" to coordinates: invalid cell name "A""#
        );
    }

    #[test]
    fn test_translated() {
        let addr = CellAddress::parse("B2").unwrap();
        assert_eq!(addr.translated(1, 0).unwrap().to_string(), "B3");
        assert_eq!(addr.translated(-1, -1).unwrap().to_string(), "A1");
        assert!(addr.translated(-2, 0).is_none());

        let pinned = CellAddress::parse("$B$2").unwrap();
        assert_eq!(pinned.translated(5, 5).unwrap(), pinned);

        let mixed = CellAddress::parse("$B2").unwrap();
        assert_eq!(mixed.translated(3, 3).unwrap().to_string(), "$B5");
    }

    #[test]
    fn test_cell_range_parse() {
        let range = CellRange::parse("A1:B2").unwrap();
        assert_eq!(range.start, CellAddress::new(0, 0));
        assert_eq!(range.end, CellAddress::new(1, 1));

        let range = CellRange::parse(" C3 ").unwrap();
        assert!(range.is_single());
        assert_eq!(range.to_string(), "C3");

        assert_eq!(CellRange::parse("D7:A3").unwrap().to_string(), "A3:D7");
        assert_eq!(CellRange::parse("B1:A2").unwrap().to_string(), "A1:B2");
    }

    #[test]
    fn test_cell_range_parse_errors() {
        assert_eq!(
            CellRange::parse("A1:A").unwrap_err().to_string(),
            r#"cannot convert cell "A" to coordinates: invalid cell name "A""#
        );
        assert_eq!(
            CellRange::parse("1:B2").unwrap_err(),
            Error::cannot_convert("1", Error::InvalidCellName("1".into()))
        );
    }

    #[test]
    fn test_cell_range_contains_and_overlaps() {
        let range = CellRange::parse("B2:D4").unwrap();

        assert!(range.contains(&CellAddress::new(1, 1)));
        assert!(range.contains(&CellAddress::new(3, 3)));
        assert!(!range.contains(&CellAddress::new(0, 0)));
        assert!(!range.contains(&CellAddress::new(4, 1)));

        assert!(range.overlaps(&CellRange::parse("D4:E5").unwrap()));
        assert!(!range.overlaps(&CellRange::parse("E1:F9").unwrap()));
    }

    #[test]
    fn test_cell_range_iterator() {
        let range = CellRange::parse("A1:B2").unwrap();
        let mut cells = range.cells();
        assert_eq!(cells.len(), 4);

        let order: Vec<_> = cells.by_ref().map(|a| a.to_string()).collect();
        assert_eq!(order, vec!["A1", "B1", "A2", "B2"]);
        assert_eq!(cells.len(), 0);
    }

    proptest! {
        #[test]
        fn address_text_round_trips(
            row in 0u32..MAX_ROWS,
            col in 0u16..MAX_COLS,
            row_absolute: bool,
            col_absolute: bool,
        ) {
            let addr = CellAddress::with_absolute(row, col, row_absolute, col_absolute);
            prop_assert_eq!(CellAddress::parse(&addr.to_a1_string()).unwrap(), addr);
        }

        #[test]
        fn column_names_round_trip(col in 1u32..=MAX_COLS as u32) {
            let name = column_number_to_name(col).unwrap();
            prop_assert_eq!(column_name_to_number(&name).unwrap(), col);
        }
    }
}
