//! Text functions

use crate::ast::FormulaExpr;
use crate::error::{FormulaError, FormulaResult};
use crate::evaluator::{EvaluationContext, FormulaValue};

/// LEN(text) - number of characters in the text form of a value
pub fn fn_len(args: &[FormulaExpr], ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let [arg] = args else {
        return Err(FormulaError::Argument(
            "LEN requires 1 string argument".to_string(),
        ));
    };

    let len = match ctx.evaluate_argument(arg)? {
        FormulaValue::Array(_) => return Err(FormulaError::value()),
        FormulaValue::Empty => 0,
        value => value.to_display_string().chars().count(),
    };
    Ok(FormulaValue::Number(len as f64))
}

#[cfg(test)]
mod tests {
    use crate::evaluator::{evaluate, CalculationOptions, EvaluationContext, FormulaValue};
    use crate::parser::parse_formula;
    use pretty_assertions::assert_eq;
    use sheetkit_core::{CellAddress, Workbook};

    fn eval(formula: &str) -> Result<FormulaValue, String> {
        let wb = Workbook::new();
        let options = CalculationOptions::default();
        let ctx = EvaluationContext::new(&wb, "Sheet1", CellAddress::new(0, 0), &options);
        parse_formula(formula)
            .and_then(|expr| evaluate(&expr, &ctx))
            .map_err(|e| e.to_string())
    }

    #[test]
    fn test_len() {
        assert_eq!(eval("LEN(\"\")"), Ok(FormulaValue::Number(0.0)));
        assert_eq!(eval("LEN(\"héllo\")"), Ok(FormulaValue::Number(5.0)));
        assert_eq!(eval("LEN(12.5)"), Ok(FormulaValue::Number(4.0)));
        assert_eq!(eval("LEN(TRUE)"), Ok(FormulaValue::Number(4.0)));
        assert_eq!(eval("LEN(B2)"), Ok(FormulaValue::Number(0.0)));
        assert_eq!(eval("LEN(A2:A3)"), Err("#VALUE!".to_string()));
        assert_eq!(eval("LEN()"), Err("LEN requires 1 string argument".to_string()));
    }
}
