//! Built-in Excel functions
//!
//! The supported set is closed: [`Function`] names every function and
//! [`Function::call`] dispatches with an exhaustive match. Each function
//! receives its unevaluated arguments, checks their count first, and then
//! evaluates them through the [`EvaluationContext`], so `IF` only evaluates
//! the branch it takes.

pub mod logical;
pub mod math;
pub mod statistical;
pub mod text;

use crate::ast::FormulaExpr;
use crate::error::{FormulaError, FormulaResult};
use crate::evaluator::{EvaluationContext, FormulaValue};

/// Function implementation signature
pub type FunctionImpl = fn(&[FormulaExpr], &EvaluationContext) -> FormulaResult<FormulaValue>;

/// Supported worksheet functions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Function {
    Abs,
    Average,
    Count,
    Gcd,
    If,
    Int,
    Lcm,
    Len,
    Max,
    Min,
    Mod,
    Power,
    Product,
    Quotient,
    Sign,
    Sqrt,
    Sum,
}

impl Function {
    /// Every supported function, alphabetically
    pub const ALL: [Function; 17] = [
        Function::Abs,
        Function::Average,
        Function::Count,
        Function::Gcd,
        Function::If,
        Function::Int,
        Function::Lcm,
        Function::Len,
        Function::Max,
        Function::Min,
        Function::Mod,
        Function::Power,
        Function::Product,
        Function::Quotient,
        Function::Sign,
        Function::Sqrt,
        Function::Sum,
    ];

    /// Look up a function by name, ignoring case
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|function| function.name().eq_ignore_ascii_case(name))
    }

    /// Uppercase function name
    pub fn name(self) -> &'static str {
        match self {
            Function::Abs => "ABS",
            Function::Average => "AVERAGE",
            Function::Count => "COUNT",
            Function::Gcd => "GCD",
            Function::If => "IF",
            Function::Int => "INT",
            Function::Lcm => "LCM",
            Function::Len => "LEN",
            Function::Max => "MAX",
            Function::Min => "MIN",
            Function::Mod => "MOD",
            Function::Power => "POWER",
            Function::Product => "PRODUCT",
            Function::Quotient => "QUOTIENT",
            Function::Sign => "SIGN",
            Function::Sqrt => "SQRT",
            Function::Sum => "SUM",
        }
    }

    fn implementation(self) -> FunctionImpl {
        match self {
            Function::Abs => math::fn_abs,
            Function::Average => statistical::fn_average,
            Function::Count => statistical::fn_count,
            Function::Gcd => math::fn_gcd,
            Function::If => logical::fn_if,
            Function::Int => math::fn_int,
            Function::Lcm => math::fn_lcm,
            Function::Len => text::fn_len,
            Function::Max => statistical::fn_max,
            Function::Min => statistical::fn_min,
            Function::Mod => math::fn_mod,
            Function::Power => math::fn_power,
            Function::Product => math::fn_product,
            Function::Quotient => math::fn_quotient,
            Function::Sign => math::fn_sign,
            Function::Sqrt => math::fn_sqrt,
            Function::Sum => math::fn_sum,
        }
    }

    /// Call the function with unevaluated arguments
    pub fn call(
        self,
        args: &[FormulaExpr],
        ctx: &EvaluationContext,
    ) -> FormulaResult<FormulaValue> {
        (self.implementation())(args, ctx)
    }
}

/// Evaluate exactly `count` numeric arguments
///
/// A wrong count, a range, or text that is not a number fails with
/// `<NAME> requires <count> numeric arguments`.
pub(crate) fn numeric_args(
    name: &str,
    count: usize,
    args: &[FormulaExpr],
    ctx: &EvaluationContext,
) -> FormulaResult<Vec<f64>> {
    if args.len() != count {
        return Err(FormulaError::numeric_arity(name, count));
    }
    args.iter()
        .map(|arg| {
            let value = ctx.evaluate_argument(arg)?;
            coerce_number(&value).ok_or_else(|| FormulaError::numeric_arity(name, count))
        })
        .collect()
}

/// Number from a scalar, reading numeric text
pub(crate) fn coerce_number(value: &FormulaValue) -> Option<f64> {
    match value {
        FormulaValue::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        other => other.as_number(),
    }
}

/// The numbers among evaluated arguments, with ranges flattened
///
/// Text, booleans and empty members are skipped.
pub(crate) fn numbers(values: &[FormulaValue]) -> impl Iterator<Item = f64> + '_ {
    values
        .iter()
        .flat_map(|value| match value {
            FormulaValue::Array(items) => items.as_slice(),
            other => std::slice::from_ref(other),
        })
        .filter_map(|value| match value {
            FormulaValue::Number(n) => Some(*n),
            _ => None,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_lookup_by_name() {
        assert_eq!(Function::from_name("sum"), Some(Function::Sum));
        assert_eq!(Function::from_name("Quotient"), Some(Function::Quotient));
        assert_eq!(Function::from_name("UNSUPPORT"), None);

        for function in Function::ALL {
            assert_eq!(Function::from_name(function.name()), Some(function));
        }
    }

    #[test]
    fn test_numbers_flattens_and_skips() {
        let values = vec![
            FormulaValue::Number(1.0),
            FormulaValue::Text("2".into()),
            FormulaValue::Array(vec![
                FormulaValue::Number(3.0),
                FormulaValue::Empty,
                FormulaValue::Boolean(true),
            ]),
        ];
        assert_eq!(numbers(&values).collect::<Vec<_>>(), vec![1.0, 3.0]);
    }
}
