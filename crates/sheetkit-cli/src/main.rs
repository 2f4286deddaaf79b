//! sheetkit CLI - evaluate and rewrite spreadsheet formulas

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use sheetkit::prelude::*;
use sheetkit::{column_name_to_number, shift_references, translate_formula, LineShift};

#[derive(Parser)]
#[command(name = "sheetkit")]
#[command(author, version, about = "Spreadsheet formula evaluation and rewriting tool")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a formula against a scratch workbook
    Eval {
        /// Formula to evaluate, with or without a leading '='
        formula: String,

        /// Cell values as CELL=VALUE; a value starting with '=' is a formula
        #[arg(long = "set", value_name = "CELL=VALUE")]
        values: Vec<String>,

        /// Sheet the formula and the values live on
        #[arg(short, long, default_value = "Sheet1")]
        sheet: String,

        /// Cell that holds the evaluated formula
        #[arg(long, default_value = "XFD1048576")]
        cell: String,

        /// Maximum depth of nested cell evaluation
        #[arg(long, default_value_t = CalculationOptions::default().max_depth)]
        max_depth: usize,
    },

    /// Rewrite a shared formula written for one cell so it applies to another
    Translate {
        /// Formula as written at the anchor cell
        formula: String,

        /// Anchor cell of the formula
        #[arg(long)]
        from: String,

        /// Cell to translate the formula to
        #[arg(long)]
        to: String,
    },

    /// Rewrite a formula's references for a row or column insertion/deletion
    Shift {
        /// Formula to rewrite
        formula: String,

        /// Kind of structural edit
        #[arg(value_enum)]
        edit: Edit,

        /// Row number or column letters where the edit happens
        at: String,

        /// Number of lines inserted or deleted
        #[arg(short = 'n', long, default_value_t = 1)]
        count: u32,

        /// Sheet the formula lives on
        #[arg(long, default_value = "Sheet1")]
        sheet: String,

        /// Sheet being edited (default: the formula's sheet)
        #[arg(long)]
        edited: Option<String>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Edit {
    InsertRows,
    DeleteRows,
    InsertCols,
    DeleteCols,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Eval {
            formula,
            values,
            sheet,
            cell,
            max_depth,
        } => eval(&formula, &values, &sheet, &cell, max_depth),
        Commands::Translate { formula, from, to } => translate(&formula, &from, &to),
        Commands::Shift {
            formula,
            edit,
            at,
            count,
            sheet,
            edited,
        } => shift(&formula, edit, &at, count, &sheet, edited.as_deref()),
    }
}

fn eval(formula: &str, values: &[String], sheet: &str, cell: &str, max_depth: usize) -> Result<()> {
    let mut workbook = Workbook::empty();
    workbook
        .add_worksheet_with_name(sheet)
        .with_context(|| format!("Failed to create sheet '{}'", sheet))?;

    for assignment in values {
        let (target, value) = assignment
            .split_once('=')
            .with_context(|| format!("Expected CELL=VALUE, got '{}'", assignment))?;
        workbook
            .set_cell_value(sheet, target.trim(), parse_value(value))
            .with_context(|| format!("Failed to set '{}'", target))?;
    }

    workbook
        .set_cell_formula(sheet, cell, formula)
        .with_context(|| format!("Failed to place formula in '{}'", cell))?;

    let options = CalculationOptions {
        max_depth,
        ..CalculationOptions::default()
    };
    let value = workbook
        .calc_cell_value_with_options(sheet, cell, &options)
        .with_context(|| format!("Failed to evaluate '{}'", formula))?;
    println!("{}", value);
    Ok(())
}

/// Interpret a command-line cell value
fn parse_value(text: &str) -> CellValue {
    if text.starts_with('=') {
        return CellValue::formula(text);
    }
    match text.trim().parse::<f64>() {
        Ok(n) if n.is_finite() => return CellValue::Number(n),
        _ => {}
    }
    if text.eq_ignore_ascii_case("TRUE") {
        return CellValue::Boolean(true);
    }
    if text.eq_ignore_ascii_case("FALSE") {
        return CellValue::Boolean(false);
    }
    CellValue::string(text)
}

fn translate(formula: &str, from: &str, to: &str) -> Result<()> {
    let anchor = CellAddress::parse_cell_name(from).context("Invalid anchor cell")?;
    let target = CellAddress::parse_cell_name(to).context("Invalid target cell")?;
    let translated = translate_formula(formula, anchor, target)
        .with_context(|| format!("Failed to translate '{}' to {}", formula, to))?;
    println!("{}", translated);
    Ok(())
}

fn shift(
    formula: &str,
    edit: Edit,
    at: &str,
    count: u32,
    sheet: &str,
    edited: Option<&str>,
) -> Result<()> {
    let line_shift = line_shift(edit, at, count)?;
    let shifted = shift_references(formula, sheet, edited.unwrap_or(sheet), &line_shift)
        .with_context(|| format!("Failed to rewrite '{}'", formula))?;
    println!("{}", shifted);
    Ok(())
}

/// Build the structural edit from a row number or column letters
fn line_shift(edit: Edit, at: &str, count: u32) -> Result<LineShift> {
    let shift = match edit {
        Edit::InsertRows | Edit::DeleteRows => {
            let row: u32 = at
                .trim()
                .parse()
                .with_context(|| format!("Expected a row number, got '{}'", at))?;
            if row == 0 {
                bail!("Row numbers start at 1");
            }
            if edit == Edit::InsertRows {
                LineShift::insert_rows(row - 1, count)
            } else {
                LineShift::delete_rows(row - 1, count)
            }
        }
        Edit::InsertCols | Edit::DeleteCols => {
            let col = column_name_to_number(at)
                .with_context(|| format!("Expected column letters, got '{}'", at))?;
            if edit == Edit::InsertCols {
                LineShift::insert_columns(col - 1, count)
            } else {
                LineShift::delete_columns(col - 1, count)
            }
        }
    };
    Ok(shift)
}
