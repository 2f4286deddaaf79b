//! Row and column insertion and deletion
//!
//! A structural edit touches more than the edited sheet: formulas anywhere in
//! the workbook may point into it. Each edit runs in three phases:
//!
//! 1. Compute the new text of every formula and shared-formula group that
//!    references the edited sheet. Nothing is modified yet.
//! 2. Move the calc chain (fails without changes on a bad entry).
//! 3. Write the new formula text, then move cells, merged regions, the
//!    autofilter and shared-formula groups of the edited sheet.
//!
//! Any error comes out of phases 1 and 2, so a failed edit leaves the
//! workbook as it was.

use log::debug;
use sheetkit_core::{
    column_name_to_number, Axis, CalcChain, CellRange, CellValue, LineShift, Worksheet, MAX_ROWS,
};
use sheetkit_formula::{shift_references, translate_formula};

use crate::{CellAddress, Result, Workbook};

/// Extension trait for Workbook to add row/column editing
///
/// Rows are 1-based numbers and columns are letters, as they appear in A1
/// cell names.
pub trait WorkbookStructureExt {
    /// Insert `count` blank rows in front of `row`
    fn insert_rows(&mut self, sheet: &str, row: u32, count: u32) -> Result<()>;

    /// Insert `count` blank columns in front of `col`
    fn insert_cols(&mut self, sheet: &str, col: &str, count: u32) -> Result<()>;

    /// Delete one row
    fn remove_row(&mut self, sheet: &str, row: u32) -> Result<()>;

    /// Delete one column
    fn remove_col(&mut self, sheet: &str, col: &str) -> Result<()>;

    /// Apply an arbitrary structural edit to one sheet
    fn apply_line_shift(&mut self, sheet: &str, shift: LineShift) -> Result<()>;
}

impl WorkbookStructureExt for Workbook {
    fn insert_rows(&mut self, sheet: &str, row: u32, count: u32) -> Result<()> {
        let before = row_index(row)?;
        self.apply_line_shift(sheet, LineShift::insert_rows(before, count))
    }

    fn insert_cols(&mut self, sheet: &str, col: &str, count: u32) -> Result<()> {
        let before = column_index(col)?;
        self.apply_line_shift(sheet, LineShift::insert_columns(before, count))
    }

    fn remove_row(&mut self, sheet: &str, row: u32) -> Result<()> {
        let start = row_index(row)?;
        self.apply_line_shift(sheet, LineShift::delete_rows(start, 1))
    }

    fn remove_col(&mut self, sheet: &str, col: &str) -> Result<()> {
        let start = column_index(col)?;
        self.apply_line_shift(sheet, LineShift::delete_columns(start, 1))
    }

    fn apply_line_shift(&mut self, sheet: &str, shift: LineShift) -> Result<()> {
        let index = self.require_sheet(sheet)?;
        let (worksheets, chain) = self.parts_mut();
        let mut sheets: Vec<&mut Worksheet> = worksheets.iter_mut().collect();
        adjust_sheets(&mut sheets, chain, index, &shift)
    }
}

/// 0-based index of a 1-based row number
pub(crate) fn row_index(row: u32) -> Result<u32> {
    if row == 0 || row > MAX_ROWS {
        return Err(sheetkit_core::Error::RowNumberOutOfRange(row as u64).into());
    }
    Ok(row - 1)
}

/// 0-based index of a column given by its letters
pub(crate) fn column_index(col: &str) -> Result<u32> {
    Ok(column_name_to_number(col)? - 1)
}

/// New text for the formulas of one sheet
///
/// Positions are in pre-edit coordinates.
#[derive(Debug, Default)]
struct SheetRewrite {
    cells: Vec<(u32, u16, String)>,
    shared: Vec<(u32, String)>,
    /// Shared members that no longer follow their group, with their own text
    detached: Vec<(u32, u16, String)>,
}

/// Run a structural edit of `sheets[index]` across the whole workbook
pub(crate) fn adjust_sheets(
    sheets: &mut [&mut Worksheet],
    chain: &mut CalcChain,
    index: usize,
    shift: &LineShift,
) -> Result<()> {
    if shift.is_noop() {
        return Ok(());
    }
    let edited = sheets[index].name().to_string();
    debug!("structural edit of '{}': {:?}", edited, shift);

    let rewrites = sheets
        .iter()
        .enumerate()
        .map(|(i, ws)| plan_rewrite(ws, i == index, &edited, shift))
        .collect::<Result<Vec<_>>>()?;

    chain.shift_lines(index, shift)?;

    for (ws, rewrite) in sheets.iter_mut().zip(rewrites) {
        if !rewrite.cells.is_empty() || !rewrite.shared.is_empty() {
            debug!(
                "rewriting {} formulas and {} shared formulas on '{}'",
                rewrite.cells.len(),
                rewrite.shared.len(),
                ws.name()
            );
        }
        for (row, col, text) in rewrite.cells {
            ws.replace_formula_text_at(row, col, text);
        }
        for (id, text) in rewrite.shared {
            ws.set_shared_formula_text(id, text);
        }
        if !rewrite.detached.is_empty() {
            debug!(
                "detaching {} shared formula cells on '{}'",
                rewrite.detached.len(),
                ws.name()
            );
        }
        for (row, col, text) in rewrite.detached {
            ws.set_cell_formula_at(row, col, &text);
        }
    }

    sheets[index].shift_lines(shift);
    Ok(())
}

/// Compute rewritten formula text for one sheet without modifying it
fn plan_rewrite(
    ws: &Worksheet,
    is_edited: bool,
    edited: &str,
    shift: &LineShift,
) -> Result<SheetRewrite> {
    let mut rewrite = SheetRewrite::default();

    for (row, col, text) in ws.formula_cells() {
        let shifted = shift_references(text, ws.name(), edited, shift)?;
        if shifted != text {
            rewrite.cells.push((row, col, shifted));
        }
    }

    for (id, group) in ws.shared_formulas() {
        let mut anchor = group.anchor;
        let mut text = group.text.clone();
        let mut moved_anchor = anchor;
        if is_edited {
            if shift.shift_range(&group.range).is_none() {
                continue;
            }
            if let Some(heir) = surviving_anchor(group.anchor, &group.range, shift) {
                text = translate_formula(&text, group.anchor, heir)?;
                anchor = heir;
            }
            match shift.shift_address(anchor) {
                Some(moved) => moved_anchor = moved,
                None => continue,
            }
        }
        let shifted = shift_references(&text, ws.name(), edited, shift)?;

        for member in group.range.cells() {
            let member = member.relative();
            let value = ws.cell_at(member.row, member.col);
            if member == anchor || value != Some(&CellValue::SharedFormula { id }) {
                continue;
            }
            let moved = if is_edited {
                match shift.shift_address(member) {
                    Some(moved) => moved,
                    None => continue,
                }
            } else {
                member
            };
            let Some(expected) =
                member_text(&group.text, group.anchor, member, ws.name(), edited, shift)
            else {
                continue;
            };
            let follows = translate_formula(&shifted, moved_anchor, moved)
                .map_or(false, |text| text == expected);
            if !follows {
                rewrite.detached.push((member.row, member.col, expected));
            }
        }

        if shifted != group.text {
            rewrite.shared.push((id, shifted));
        }
    }

    Ok(rewrite)
}

/// Post-edit formula of one shared member, expanded on its own
fn member_text(
    text: &str,
    anchor: CellAddress,
    member: CellAddress,
    sheet: &str,
    edited: &str,
    shift: &LineShift,
) -> Option<String> {
    let expanded = translate_formula(text, anchor, member).ok()?;
    shift_references(&expanded, sheet, edited, shift).ok()
}

/// When a deletion removes a group's anchor line but not the whole group,
/// the cell (in pre-edit coordinates) that becomes the new anchor
fn surviving_anchor(
    anchor: CellAddress,
    range: &CellRange,
    shift: &LineShift,
) -> Option<CellAddress> {
    let LineShift::Delete { start, count, .. } = *shift else {
        return None;
    };
    if !shift.deletes(shift.index_of(&anchor)) {
        return None;
    }
    shift.shift_range(range)?;

    let next = start + count;
    let mut heir = anchor;
    match shift.axis() {
        Axis::Rows => heir.row = next,
        Axis::Columns => heir.col = next as u16,
    }
    Some(heir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::WorkbookCalculationExt;
    use pretty_assertions::assert_eq;

    fn formula(wb: &Workbook, sheet: &str, cell: &str) -> String {
        wb.get_cell_formula(sheet, cell).unwrap()
    }

    #[test]
    fn test_insert_rows_moves_cells_and_formulas() {
        let mut wb = Workbook::new();
        wb.set_cell_value("Sheet1", "A1", 1.0).unwrap();
        wb.set_cell_value("Sheet1", "A2", 2.0).unwrap();
        wb.set_cell_formula("Sheet1", "B1", "=A1+A2").unwrap();

        wb.insert_rows("Sheet1", 2, 3).unwrap();

        assert_eq!(formula(&wb, "Sheet1", "B1"), "=A1+A5");
        assert_eq!(wb.calc_cell_value("Sheet1", "B1").unwrap(), "3");
        let ws = wb.worksheet_by_name("Sheet1").unwrap();
        assert!(ws.cell("A2").unwrap().is_none());
    }

    #[test]
    fn test_remove_col_turns_references_into_ref_errors() {
        let mut wb = Workbook::new();
        wb.set_cell_value("Sheet1", "B1", 5.0).unwrap();
        wb.set_cell_value("Sheet1", "C1", 7.0).unwrap();
        wb.set_cell_formula("Sheet1", "D1", "B1+C1").unwrap();

        wb.remove_col("Sheet1", "B").unwrap();

        assert_eq!(formula(&wb, "Sheet1", "C1"), "#REF!+B1");
        assert_eq!(wb.calc_cell_value("Sheet1", "C1").unwrap_err().to_string(), "#REF!");
    }

    #[test]
    fn test_other_sheets_follow_the_edit() {
        let mut wb = Workbook::new();
        wb.add_worksheet_with_name("Data").unwrap();
        wb.set_cell_value("Data", "A3", 4.0).unwrap();
        wb.set_cell_formula("Sheet1", "A1", "Data!A3*2+A3").unwrap();

        wb.insert_rows("Data", 1, 1).unwrap();

        assert_eq!(formula(&wb, "Sheet1", "A1"), "Data!A4*2+A3");
        assert_eq!(wb.calc_cell_value("Sheet1", "A1").unwrap(), "8");
    }

    #[test]
    fn test_zero_count_is_a_noop() {
        let mut wb = Workbook::new();
        wb.set_cell_formula("Sheet1", "A2", "= sum(a1 , B1)").unwrap();
        wb.merge_cells("Sheet1", "A3:B3").unwrap();
        let before = wb.clone();

        wb.insert_rows("Sheet1", 1, 0).unwrap();
        wb.insert_cols("Sheet1", "A", 0).unwrap();

        assert_eq!(wb, before);
    }

    #[test]
    fn test_single_row_merge_removed_with_its_row() {
        let mut wb = Workbook::new();
        wb.merge_cells("Sheet1", "A1:B1").unwrap();
        wb.merge_cells("Sheet1", "A2:B4").unwrap();

        wb.remove_row("Sheet1", 1).unwrap();

        let ws = wb.worksheet_by_name("Sheet1").unwrap();
        assert_eq!(ws.merged_regions().len(), 1);
        assert_eq!(ws.merged_regions()[0].to_string(), "A1:B3");
    }

    #[test]
    fn test_shared_group_reanchored_when_anchor_row_deleted() {
        let mut wb = Workbook::new();
        wb.set_cell_value("Sheet1", "A3", 3.0).unwrap();
        wb.set_cell_value("Sheet1", "A4", 4.0).unwrap();
        wb.set_shared_formula("Sheet1", "B2:B4", "2*A2").unwrap();

        wb.remove_row("Sheet1", 2).unwrap();

        assert_eq!(formula(&wb, "Sheet1", "B2"), "2*A2");
        assert_eq!(formula(&wb, "Sheet1", "B3"), "2*A3");
        assert_eq!(wb.calc_cell_value("Sheet1", "B2").unwrap(), "6");
        assert_eq!(wb.calc_cell_value("Sheet1", "B3").unwrap(), "8");
    }

    #[test]
    fn test_group_members_keep_their_cells_when_the_group_spreads() {
        let mut wb = Workbook::new();
        wb.add_worksheet_with_name("Other").unwrap();
        wb.set_cell_value("Other", "B1", 7.0).unwrap();
        let id = wb.set_shared_formula("Sheet1", "A1:C1", "Other!A1").unwrap();

        wb.insert_cols("Sheet1", "B", 1).unwrap();

        assert_eq!(formula(&wb, "Sheet1", "A1"), "Other!A1");
        assert_eq!(formula(&wb, "Sheet1", "C1"), "Other!B1");
        assert_eq!(formula(&wb, "Sheet1", "D1"), "Other!C1");
        assert_eq!(wb.calc_cell_value("Sheet1", "C1").unwrap(), "7");
        let ws = wb.worksheet_by_name("Sheet1").unwrap();
        assert_eq!(ws.get_value("A1").unwrap(), CellValue::SharedFormula { id });
        assert_eq!(ws.get_value("C1").unwrap(), CellValue::formula("Other!B1"));
    }

    #[test]
    fn test_calc_chain_follows_edit() {
        let mut wb = Workbook::new();
        wb.set_cell_formula("Sheet1", "C3", "1").unwrap();
        wb.set_cell_formula("Sheet1", "C5", "2").unwrap();

        wb.remove_row("Sheet1", 3).unwrap();

        let cells: Vec<&str> = wb.calc_chain().entries().iter().map(|e| e.cell.as_str()).collect();
        assert_eq!(cells, vec!["C4"]);
    }

    #[test]
    fn test_bad_calc_chain_entry_leaves_workbook_unchanged() {
        let mut wb = Workbook::new();
        wb.set_cell_value("Sheet1", "A2", 1.0).unwrap();
        wb.set_cell_formula("Sheet1", "B1", "A2").unwrap();
        wb.calc_chain_mut().push_raw(0, "XYZ");
        let before = wb.clone();

        let err = wb.insert_rows("Sheet1", 1, 1).unwrap_err();

        assert_eq!(
            err.to_string(),
            "cannot convert cell \"XYZ\" to coordinates: invalid cell name \"XYZ\""
        );
        assert_eq!(wb, before);
    }

    #[test]
    fn test_invalid_line_numbers() {
        let mut wb = Workbook::new();
        assert!(wb.insert_rows("Sheet1", 0, 1).is_err());
        assert!(wb.remove_col("Sheet1", "1").is_err());
        assert_eq!(
            wb.remove_row("Nope", 1).unwrap_err().to_string(),
            "sheet Nope is not exist"
        );
    }
}
