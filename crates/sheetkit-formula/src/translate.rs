//! Reference rewriting
//!
//! Both operations here work on the token stream of a formula and copy every
//! token through unchanged except cell references, so spacing, function-name
//! case and literals survive exactly as written.
//!
//! - [`translate_formula`] expands a shared formula for one member cell by
//!   moving relative references by the member's offset from the anchor.
//! - [`shift_references`] follows a row/column insertion or deletion, turning
//!   references into deleted lines into `#REF!`.

use log::trace;
use sheetkit_core::{Axis, CellAddress, CellValue, LineShift, Worksheet};

use crate::error::{FormulaError, FormulaResult};
use crate::lexer::{split_formula_prefix, tokenize, CellToken, Token, TokenKind};

const REF_ERROR: &str = "#REF!";

/// Rewrite a formula written for `anchor` so that it applies at `target`
///
/// Relative axes move by `target - anchor`; absolute axes stay. A reference
/// pushed off the grid fails with [`FormulaError::ReferenceOutOfRange`].
pub fn translate_formula(
    formula: &str,
    anchor: CellAddress,
    target: CellAddress,
) -> FormulaResult<String> {
    let row_delta = target.row as i64 - anchor.row as i64;
    let col_delta = target.col as i64 - anchor.col as i64;

    let (prefix, body) = split_formula_prefix(formula);
    if row_delta == 0 && col_delta == 0 {
        return Ok(formula.to_string());
    }

    let mut out = String::with_capacity(formula.len());
    out.push_str(prefix);
    for token in tokenize(body)? {
        match &token.kind {
            TokenKind::Cell(cell) => {
                let moved = cell
                    .address
                    .translated(row_delta, col_delta)
                    .ok_or_else(|| FormulaError::ReferenceOutOfRange(token.text.to_string()))?;
                if moved == cell.address {
                    out.push_str(token.text);
                } else {
                    out.push_str(&cell.render(moved));
                }
            }
            _ => out.push_str(token.text),
        }
    }

    trace!("translated {:?} from {} to {}: {:?}", formula, anchor, target, out);
    Ok(out)
}

/// Rewrite the references of a formula after lines of `edited_sheet` moved
///
/// `formula_sheet` is the sheet the formula lives on; unqualified references
/// point there. Only references into `edited_sheet` change. A reference to a
/// deleted cell, or a range whose extent along the edited axis disappears,
/// becomes `#REF!`.
pub fn shift_references(
    formula: &str,
    formula_sheet: &str,
    edited_sheet: &str,
    shift: &LineShift,
) -> FormulaResult<String> {
    if shift.is_noop() {
        return Ok(formula.to_string());
    }

    let (prefix, body) = split_formula_prefix(formula);
    let tokens = tokenize(body)?;
    let targets_edited = |cell: &CellToken<'_>| {
        let sheet = cell.sheet.as_deref().unwrap_or(formula_sheet);
        sheet.to_lowercase() == edited_sheet.to_lowercase()
    };

    let mut out = String::with_capacity(formula.len());
    out.push_str(prefix);

    let mut i = 0;
    while i < tokens.len() {
        let token = &tokens[i];
        let TokenKind::Cell(first) = &token.kind else {
            out.push_str(token.text);
            i += 1;
            continue;
        };

        if let Some((end, last)) = range_end(&tokens, i) {
            if targets_edited(first) {
                out.push_str(&shift_range_text(&tokens[i..=end], first, last, shift));
            } else {
                tokens[i..=end].iter().for_each(|t| out.push_str(t.text));
            }
            i = end + 1;
            continue;
        }

        if targets_edited(first) {
            match shift.shift_address(first.address) {
                Some(moved) if moved == first.address => out.push_str(token.text),
                Some(moved) => out.push_str(&first.render(moved)),
                None => out.push_str(REF_ERROR),
            }
        } else {
            out.push_str(token.text);
        }
        i += 1;
    }

    if out != formula {
        trace!("shifted {:?} on {}: {:?}", formula, formula_sheet, out);
    }
    Ok(out)
}

/// Formula of a cell with shared formulas expanded for that cell
///
/// `None` for cells without a formula, and for shared members whose group
/// is gone.
pub fn resolve_formula(worksheet: &Worksheet, addr: CellAddress) -> FormulaResult<Option<String>> {
    match worksheet.cell_at(addr.row, addr.col) {
        Some(CellValue::Formula { text }) => Ok(Some(text.clone())),
        Some(CellValue::SharedFormula { id }) => match worksheet.shared_formula(*id) {
            Some(group) if group.anchor == addr.relative() => Ok(Some(group.text.clone())),
            Some(group) => translate_formula(&group.text, group.anchor, addr).map(Some),
            None => Ok(None),
        },
        _ => Ok(None),
    }
}

/// If the cell token at `start` opens a `A1:B2` range, the index of its last
/// token and the closing cell
fn range_end<'t, 'a>(tokens: &'t [Token<'a>], start: usize) -> Option<(usize, &'t CellToken<'a>)> {
    let mut rest = tokens
        .iter()
        .enumerate()
        .skip(start + 1)
        .filter(|(_, t)| t.kind != TokenKind::Whitespace);

    match rest.next() {
        Some((_, t)) if t.kind == TokenKind::Colon => {}
        _ => return None,
    }
    match rest.next() {
        Some((end, Token { kind: TokenKind::Cell(last), .. })) => Some((end, last)),
        _ => None,
    }
}

/// Re-render the tokens of one range after a line shift
fn shift_range_text(
    tokens: &[Token<'_>],
    first: &CellToken<'_>,
    last: &CellToken<'_>,
    shift: &LineShift,
) -> String {
    let axis = shift.axis();
    let (a, b) = (shift.index_of(&first.address), shift.index_of(&last.address));
    let Some((lo, hi)) = shift.shift_span(a.min(b), a.max(b)) else {
        return REF_ERROR.to_string();
    };
    let (new_a, new_b) = if a <= b { (lo, hi) } else { (hi, lo) };

    let count = tokens.len();
    tokens
        .iter()
        .enumerate()
        .map(|(i, token)| match (i, &token.kind) {
            (0, TokenKind::Cell(cell)) => {
                render_moved(token, cell, with_index(cell.address, axis, new_a))
            }
            (i, TokenKind::Cell(cell)) if i + 1 == count => {
                render_moved(token, cell, with_index(cell.address, axis, new_b))
            }
            _ => token.text.to_string(),
        })
        .collect()
}

fn render_moved(token: &Token<'_>, cell: &CellToken<'_>, moved: CellAddress) -> String {
    if moved == cell.address {
        token.text.to_string()
    } else {
        cell.render(moved)
    }
}

fn with_index(addr: CellAddress, axis: Axis, index: u32) -> CellAddress {
    let mut moved = addr;
    match axis {
        Axis::Rows => moved.row = index,
        Axis::Columns => moved.col = index as u16,
    }
    moved
}
