//! Logical functions

use crate::ast::FormulaExpr;
use crate::error::{FormulaError, FormulaResult};
use crate::evaluator::{evaluate, EvaluationContext, FormulaValue};

/// IF(logical_test, value_if_true, [value_if_false])
///
/// Only the branch that is taken gets evaluated. Without a false branch a
/// false test yields FALSE.
pub fn fn_if(args: &[FormulaExpr], ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let (condition, if_true, if_false) = match args {
        [condition, if_true] => (condition, if_true, None),
        [condition, if_true, if_false] => (condition, if_true, Some(if_false)),
        _ if args.len() < 2 => {
            return Err(FormulaError::Argument(
                "IF requires at least 2 arguments".into(),
            ))
        }
        _ => {
            return Err(FormulaError::Argument(
                "IF accepts at most 3 arguments".into(),
            ))
        }
    };

    let condition_bool = match evaluate(condition, ctx)? {
        FormulaValue::Boolean(b) => b,
        FormulaValue::Number(n) => n != 0.0,
        FormulaValue::Empty => false,
        FormulaValue::Text(s) if s.eq_ignore_ascii_case("TRUE") => true,
        FormulaValue::Text(s) if s.eq_ignore_ascii_case("FALSE") => false,
        FormulaValue::Text(_) | FormulaValue::Array(_) => return Err(FormulaError::value()),
    };

    match (condition_bool, if_false) {
        (true, _) => evaluate(if_true, ctx),
        (false, Some(if_false)) => evaluate(if_false, ctx),
        (false, None) => Ok(FormulaValue::Boolean(false)),
    }
}

#[cfg(test)]
mod tests {
    use crate::evaluator::{evaluate, CalculationOptions, EvaluationContext, FormulaValue};
    use crate::parser::parse_formula;
    use pretty_assertions::assert_eq;
    use sheetkit_core::{CellAddress, Workbook};

    fn eval(formula: &str) -> Result<FormulaValue, String> {
        let mut wb = Workbook::new();
        wb.set_cell_value("Sheet1", "A1", 5.0).unwrap();
        let options = CalculationOptions::default();
        let ctx = EvaluationContext::new(&wb, "Sheet1", CellAddress::new(9, 9), &options);
        parse_formula(formula)
            .and_then(|expr| evaluate(&expr, &ctx))
            .map_err(|e| e.to_string())
    }

    #[test]
    fn test_if_branches() {
        assert_eq!(
            eval("IF(A1>0,\"Yes\",\"No\")"),
            Ok(FormulaValue::Text("Yes".into()))
        );
        assert_eq!(eval("IF(A1>9,1)"), Ok(FormulaValue::Boolean(false)));
        assert_eq!(eval("IF(\"true\",1,2)"), Ok(FormulaValue::Number(1.0)));
        assert_eq!(eval("IF(\"maybe\",1,2)"), Err("#VALUE!".to_string()));
    }

    #[test]
    fn test_if_is_lazy() {
        assert_eq!(eval("IF(TRUE,1,1/0)"), Ok(FormulaValue::Number(1.0)));
        assert_eq!(eval("IF(0,1/0,2)"), Ok(FormulaValue::Number(2.0)));
    }

    #[test]
    fn test_if_arity() {
        assert_eq!(
            eval("IF(TRUE)"),
            Err("IF requires at least 2 arguments".to_string())
        );
        assert_eq!(
            eval("IF(TRUE,1,2,3)"),
            Err("IF accepts at most 3 arguments".to_string())
        );
    }
}
