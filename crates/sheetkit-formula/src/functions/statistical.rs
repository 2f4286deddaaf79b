//! Statistical functions

use super::numbers;
use crate::ast::FormulaExpr;
use crate::error::{FormulaError, FormulaResult};
use crate::evaluator::{finite, EvaluationContext, FormulaValue};

/// AVERAGE(number1, [number2], ...)
pub fn fn_average(args: &[FormulaExpr], ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    if args.is_empty() {
        return Err(FormulaError::at_least_one("AVERAGE"));
    }
    let values = ctx.evaluate_arguments(args)?;

    let (sum, count) = numbers(&values).fold((0.0, 0usize), |(sum, count), n| (sum + n, count + 1));
    if count == 0 {
        return Err(FormulaError::div0());
    }
    finite(sum / count as f64)
}

/// MIN(number1, [number2], ...) - 0 when there are no numbers
pub fn fn_min(args: &[FormulaExpr], ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    if args.is_empty() {
        return Err(FormulaError::at_least_one("MIN"));
    }
    let values = ctx.evaluate_arguments(args)?;
    let min = numbers(&values).reduce(f64::min).unwrap_or(0.0);
    Ok(FormulaValue::Number(min))
}

/// MAX(number1, [number2], ...) - 0 when there are no numbers
pub fn fn_max(args: &[FormulaExpr], ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    if args.is_empty() {
        return Err(FormulaError::at_least_one("MAX"));
    }
    let values = ctx.evaluate_arguments(args)?;
    let max = numbers(&values).reduce(f64::max).unwrap_or(0.0);
    Ok(FormulaValue::Number(max))
}

/// COUNT(value1, [value2], ...) - counts numbers only
pub fn fn_count(args: &[FormulaExpr], ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    if args.is_empty() {
        return Err(FormulaError::at_least_one("COUNT"));
    }
    let values = ctx.evaluate_arguments(args)?;
    Ok(FormulaValue::Number(numbers(&values).count() as f64))
}

#[cfg(test)]
mod tests {
    use crate::evaluator::{calculate_cell, CalculationOptions};
    use pretty_assertions::assert_eq;
    use sheetkit_core::{CellAddress, Workbook};

    fn calc(formula: &str) -> Result<String, String> {
        let mut wb = Workbook::new();
        wb.set_cell_value("Sheet1", "A1", 4.0).unwrap();
        wb.set_cell_value("Sheet1", "A2", "n/a").unwrap();
        wb.set_cell_value("Sheet1", "A3", -2.0).unwrap();
        wb.set_cell_formula("Sheet1", "C1", formula).unwrap();
        calculate_cell(
            &wb,
            "Sheet1",
            CellAddress::new(0, 2),
            &CalculationOptions::default(),
        )
        .map_err(|e| e.to_string())
    }

    #[test]
    fn test_average() {
        assert_eq!(calc("AVERAGE(A1:A4)"), Ok("1".to_string()));
        assert_eq!(calc("AVERAGE(A2)"), Err("#DIV/0!".to_string()));
        assert_eq!(
            calc("AVERAGE()"),
            Err("AVERAGE requires at least 1 argument".to_string())
        );
    }

    #[test]
    fn test_min_max() {
        assert_eq!(calc("MIN(A1:A3,10)"), Ok("-2".to_string()));
        assert_eq!(calc("MAX(A1:A3,10)"), Ok("10".to_string()));
        assert_eq!(calc("MAX(B1:B5)"), Ok("0".to_string()));
    }

    #[test]
    fn test_count() {
        assert_eq!(calc("COUNT(A1:A5)"), Ok("2".to_string()));
        assert_eq!(calc("COUNT(1,\"x\",2)"), Ok("2".to_string()));
    }
}
