//! Math functions

use super::{coerce_number, numbers, numeric_args};
use crate::ast::FormulaExpr;
use crate::error::{FormulaError, FormulaResult};
use crate::evaluator::{finite, power, EvaluationContext, FormulaValue};

/// SUM(number1, [number2], ...)
pub fn fn_sum(args: &[FormulaExpr], ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let values = ctx.evaluate_arguments(args)?;
    let sum: f64 = numbers(&values).sum();
    finite(sum)
}

/// PRODUCT(number1, [number2], ...)
pub fn fn_product(args: &[FormulaExpr], ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    if args.is_empty() {
        return Err(FormulaError::at_least_one("PRODUCT"));
    }
    let values = ctx.evaluate_arguments(args)?;
    let mut factors = numbers(&values).peekable();
    if factors.peek().is_none() {
        return Ok(FormulaValue::Number(0.0));
    }
    finite(factors.product())
}

/// ABS(number)
pub fn fn_abs(args: &[FormulaExpr], ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let n = numeric_args("ABS", 1, args, ctx)?;
    Ok(FormulaValue::Number(n[0].abs()))
}

/// SIGN(number) - -1, 0 or 1
pub fn fn_sign(args: &[FormulaExpr], ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let n = numeric_args("SIGN", 1, args, ctx)?[0];
    let sign = if n > 0.0 {
        1.0
    } else if n < 0.0 {
        -1.0
    } else {
        0.0
    };
    Ok(FormulaValue::Number(sign))
}

/// SQRT(number)
pub fn fn_sqrt(args: &[FormulaExpr], ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let n = numeric_args("SQRT", 1, args, ctx)?[0];
    if n < 0.0 {
        return Err(FormulaError::num());
    }
    Ok(FormulaValue::Number(n.sqrt()))
}

/// POWER(number, power)
pub fn fn_power(args: &[FormulaExpr], ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let n = numeric_args("POWER", 2, args, ctx)?;
    power(n[0], n[1])
}

/// QUOTIENT(numerator, denominator) - integer part of a division
pub fn fn_quotient(args: &[FormulaExpr], ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let n = numeric_args("QUOTIENT", 2, args, ctx)?;
    if n[1] == 0.0 {
        return Err(FormulaError::div0());
    }
    finite((n[0] / n[1]).trunc())
}

/// MOD(number, divisor) - remainder with the sign of the divisor
pub fn fn_mod(args: &[FormulaExpr], ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let n = numeric_args("MOD", 2, args, ctx)?;
    let (number, divisor) = (n[0], n[1]);
    if divisor == 0.0 {
        return Err(FormulaError::div0());
    }
    finite(number - divisor * (number / divisor).floor())
}

/// INT(number) - rounds down to the nearest integer
pub fn fn_int(args: &[FormulaExpr], ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let n = numeric_args("INT", 1, args, ctx)?;
    Ok(FormulaValue::Number(n[0].floor()))
}

/// GCD(number1, [number2], ...)
pub fn fn_gcd(args: &[FormulaExpr], ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let values = integer_args("GCD", args, ctx)?;
    let result = values.into_iter().fold(0.0, gcd);
    Ok(FormulaValue::Number(result))
}

/// LCM(number1, [number2], ...)
pub fn fn_lcm(args: &[FormulaExpr], ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let values = integer_args("LCM", args, ctx)?;
    if values.iter().any(|&n| n == 0.0) {
        return Ok(FormulaValue::Number(0.0));
    }
    let result = values
        .into_iter()
        .fold(1.0, |acc, n| acc / gcd(acc, n) * n);
    finite(result)
}

/// Arguments of GCD/LCM, truncated to integers
///
/// Ranges contribute their numbers; a direct argument that is not a number
/// is `#VALUE!`. Any negative value fails the call.
fn integer_args(
    name: &str,
    args: &[FormulaExpr],
    ctx: &EvaluationContext,
) -> FormulaResult<Vec<f64>> {
    if args.is_empty() {
        return Err(FormulaError::at_least_one(name));
    }

    let mut result = Vec::with_capacity(args.len());
    for value in ctx.evaluate_arguments(args)? {
        match &value {
            FormulaValue::Array(_) => result.extend(numbers(std::slice::from_ref(&value))),
            scalar => result.push(coerce_number(scalar).ok_or_else(FormulaError::value)?),
        }
    }

    if result.iter().any(|&n| n < 0.0) {
        return Err(FormulaError::Argument(format!(
            "{} only accepts positive arguments",
            name
        )));
    }
    Ok(result.into_iter().map(f64::trunc).collect())
}

fn gcd(a: f64, b: f64) -> f64 {
    let (mut a, mut b) = (a, b);
    while b != 0.0 {
        (a, b) = (b, a % b);
    }
    a
}
