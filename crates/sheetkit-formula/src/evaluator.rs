//! Formula evaluator
//!
//! Evaluates formula ASTs to produce values. Evaluation has no error-valued
//! results: the first error anywhere, including inside a referenced formula
//! cell, aborts the whole call.

use std::cmp::Ordering;

use log::{debug, trace};
use sheetkit_core::{CellAddress, CellValue, Error};

use crate::ast::{BinaryOperator, FormulaExpr, UnaryOperator};
use crate::error::{FormulaError, FormulaResult};
use crate::functions::Function;
use crate::parser::parse_formula;
use crate::source::CellSource;

/// Value types during formula evaluation
#[derive(Debug, Clone, PartialEq)]
pub enum FormulaValue {
    Number(f64),
    Text(String),
    Boolean(bool),
    /// An empty member of a range
    Empty,
    /// The members of a range argument, row-major
    Array(Vec<FormulaValue>),
}

impl FormulaValue {
    /// Numeric value of a scalar; text never converts
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FormulaValue::Number(n) => Some(*n),
            FormulaValue::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
            FormulaValue::Empty => Some(0.0),
            FormulaValue::Text(_) | FormulaValue::Array(_) => None,
        }
    }

    /// Text form, as used by `&` and `LEN`
    pub fn to_display_string(&self) -> String {
        match self {
            FormulaValue::Number(n) => format_number(*n),
            FormulaValue::Text(s) => s.clone(),
            FormulaValue::Boolean(true) => "TRUE".to_string(),
            FormulaValue::Boolean(false) => "FALSE".to_string(),
            FormulaValue::Empty => String::new(),
            FormulaValue::Array(_) => "#VALUE!".to_string(),
        }
    }
}

/// Shortest round-trip decimal, never in exponent form
fn format_number(n: f64) -> String {
    if n == 0.0 {
        // Also covers -0
        "0".to_string()
    } else {
        n.to_string()
    }
}

/// Limits applied while evaluating a formula
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalculationOptions {
    /// Maximum chain of formula cells referring to formula cells
    pub max_depth: usize,
    /// Fail on a cell that refers back to itself
    pub detect_cycles: bool,
}

impl Default for CalculationOptions {
    fn default() -> Self {
        Self {
            max_depth: 256,
            detect_cycles: true,
        }
    }
}

/// Context for formula evaluation
///
/// One context exists per formula cell being evaluated; a referenced
/// formula cell gets a child context linked to its parent, and the chain of
/// parents is the path used for cycle detection.
pub struct EvaluationContext<'a> {
    source: &'a dyn CellSource,
    sheet: &'a str,
    cell: CellAddress,
    parent: Option<&'a EvaluationContext<'a>>,
    depth: usize,
    options: &'a CalculationOptions,
}

impl<'a> EvaluationContext<'a> {
    /// Create a context for the formula in `cell` on `sheet`
    pub fn new(
        source: &'a dyn CellSource,
        sheet: &'a str,
        cell: CellAddress,
        options: &'a CalculationOptions,
    ) -> Self {
        Self {
            source,
            sheet,
            cell: cell.relative(),
            parent: None,
            depth: 0,
            options,
        }
    }

    /// Sheet of the formula being evaluated
    pub fn sheet(&self) -> &str {
        self.sheet
    }

    /// Cell of the formula being evaluated
    pub fn cell(&self) -> CellAddress {
        self.cell
    }

    /// Context for evaluating the formula stored in another cell
    fn child<'b>(
        &'b self,
        sheet: &'b str,
        cell: CellAddress,
    ) -> FormulaResult<EvaluationContext<'b>> {
        if self.options.detect_cycles && self.is_on_path(sheet, cell) {
            return Err(FormulaError::CircularReference(format!("{}!{}", sheet, cell)));
        }
        if self.depth >= self.options.max_depth {
            return Err(FormulaError::DepthExceeded(self.options.max_depth));
        }
        Ok(EvaluationContext {
            source: self.source,
            sheet,
            cell,
            parent: Some(self),
            depth: self.depth + 1,
            options: self.options,
        })
    }

    fn is_on_path(&self, sheet: &str, cell: CellAddress) -> bool {
        let mut ctx = Some(self);
        while let Some(current) = ctx {
            if current.cell == cell && current.sheet == sheet {
                return true;
            }
            ctx = current.parent;
        }
        false
    }

    /// Value of one cell; empty cells read as [`FormulaValue::Empty`]
    pub fn cell_value(
        &self,
        sheet: Option<&str>,
        addr: CellAddress,
    ) -> FormulaResult<FormulaValue> {
        let sheet = sheet.unwrap_or(self.sheet);
        let addr = addr.relative();
        if !self.source.sheet_exists(sheet) {
            return Err(Error::SheetNotExist(sheet.to_string()).into());
        }

        if let Some(formula) = self.source.read_cell_formula(sheet, addr)? {
            trace!("resolving {}!{} through formula {}", sheet, addr, formula);
            let child = self.child(sheet, addr)?;
            let expr = parse_formula(&formula)?;
            return evaluate(&expr, &child);
        }

        trace!("resolving {}!{} as a literal", sheet, addr);
        match self.source.read_cell_literal(sheet, addr) {
            None | Some(CellValue::Empty) => Ok(FormulaValue::Empty),
            Some(CellValue::Number(n)) => Ok(FormulaValue::Number(n)),
            Some(CellValue::Boolean(b)) => Ok(FormulaValue::Boolean(b)),
            Some(CellValue::String(s)) => Ok(match s.as_str().trim().parse::<f64>() {
                Ok(n) if n.is_finite() => FormulaValue::Number(n),
                _ => FormulaValue::Text(s.as_str().to_string()),
            }),
            Some(CellValue::Error(e)) => Err(FormulaError::Cell(e)),
            // Formula cells were resolved above
            Some(CellValue::Formula { .. } | CellValue::SharedFormula { .. }) => {
                Ok(FormulaValue::Empty)
            }
        }
    }

    /// Evaluate a function argument; ranges become [`FormulaValue::Array`]
    pub fn evaluate_argument(&self, expr: &FormulaExpr) -> FormulaResult<FormulaValue> {
        match expr {
            FormulaExpr::RangeRef(range_ref) => {
                let sheet = range_ref.sheet.as_deref();
                let values = range_ref
                    .range
                    .cells()
                    .map(|addr| self.cell_value(sheet, addr))
                    .collect::<FormulaResult<Vec<_>>>()?;
                Ok(FormulaValue::Array(values))
            }
            _ => evaluate(expr, self),
        }
    }

    /// Evaluate every argument of a call in order
    pub fn evaluate_arguments(&self, args: &[FormulaExpr]) -> FormulaResult<Vec<FormulaValue>> {
        args.iter().map(|arg| self.evaluate_argument(arg)).collect()
    }
}

/// Evaluate a formula expression to a scalar value
pub fn evaluate(expr: &FormulaExpr, ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    match expr {
        // === Literals ===
        FormulaExpr::Number(n) => Ok(FormulaValue::Number(*n)),
        FormulaExpr::Text(s) => Ok(FormulaValue::Text(s.clone())),
        FormulaExpr::Boolean(b) => Ok(FormulaValue::Boolean(*b)),
        FormulaExpr::Error(e) => Err(FormulaError::Cell(*e)),

        // === References ===
        FormulaExpr::CellRef(cell_ref) => {
            match ctx.cell_value(cell_ref.sheet.as_deref(), cell_ref.address)? {
                FormulaValue::Empty => Ok(FormulaValue::Number(0.0)),
                value => Ok(value),
            }
        }

        // Only functions take ranges
        FormulaExpr::RangeRef(_) => Err(FormulaError::value()),

        // === Operators ===
        FormulaExpr::BinaryOp { op, left, right } => evaluate_binary_op(*op, left, right, ctx),

        FormulaExpr::UnaryOp { op, operand } => evaluate_unary_op(*op, operand, ctx),

        // === Functions ===
        FormulaExpr::Function { name, args } => {
            let function = Function::from_name(name)
                .ok_or_else(|| FormulaError::UnsupportedFunction(name.clone()))?;
            function.call(args, ctx)
        }
    }
}

/// Evaluate the formula of one cell and format the result
///
/// A cell without a formula yields an empty string; a missing sheet fails
/// with [`Error::SheetNotExist`].
pub fn calculate_cell(
    source: &dyn CellSource,
    sheet: &str,
    addr: CellAddress,
    options: &CalculationOptions,
) -> FormulaResult<String> {
    if !source.sheet_exists(sheet) {
        return Err(Error::SheetNotExist(sheet.to_string()).into());
    }
    let Some(formula) = source.read_cell_formula(sheet, addr)? else {
        return Ok(String::new());
    };

    debug!("calculating {}!{}: {}", sheet, addr, formula);
    let expr = parse_formula(&formula)?;
    let ctx = EvaluationContext::new(source, sheet, addr, options);
    let value = evaluate(&expr, &ctx)?;
    Ok(value.to_display_string())
}

/// Numeric operand of an operator; text is a `#VALUE!` error
fn operand_number(value: &FormulaValue) -> FormulaResult<f64> {
    value.as_number().ok_or_else(FormulaError::value)
}

pub(crate) fn finite(n: f64) -> FormulaResult<FormulaValue> {
    if n.is_finite() {
        Ok(FormulaValue::Number(n))
    } else {
        Err(FormulaError::num())
    }
}

/// `base ^ exponent` with the POWER error rules
pub(crate) fn power(base: f64, exponent: f64) -> FormulaResult<FormulaValue> {
    if base == 0.0 && exponent == 0.0 {
        return Err(FormulaError::num());
    }
    if base == 0.0 && exponent < 0.0 {
        return Err(FormulaError::div0());
    }
    finite(base.powf(exponent))
}

/// Evaluate a binary operation
fn evaluate_binary_op(
    op: BinaryOperator,
    left: &FormulaExpr,
    right: &FormulaExpr,
    ctx: &EvaluationContext,
) -> FormulaResult<FormulaValue> {
    let left_val = evaluate(left, ctx)?;
    let right_val = evaluate(right, ctx)?;

    match op {
        // Arithmetic operators
        BinaryOperator::Add
        | BinaryOperator::Subtract
        | BinaryOperator::Multiply
        | BinaryOperator::Divide
        | BinaryOperator::Power => {
            let l = operand_number(&left_val)?;
            let r = operand_number(&right_val)?;
            match op {
                BinaryOperator::Add => finite(l + r),
                BinaryOperator::Subtract => finite(l - r),
                BinaryOperator::Multiply => finite(l * r),
                BinaryOperator::Divide if r == 0.0 => Err(FormulaError::div0()),
                BinaryOperator::Divide => finite(l / r),
                _ => power(l, r),
            }
        }

        // Comparison operators
        BinaryOperator::Equal => Ok(FormulaValue::Boolean(
            compare_values(&left_val, &right_val) == Ordering::Equal,
        )),
        BinaryOperator::NotEqual => Ok(FormulaValue::Boolean(
            compare_values(&left_val, &right_val) != Ordering::Equal,
        )),
        BinaryOperator::LessThan => Ok(FormulaValue::Boolean(
            compare_values(&left_val, &right_val) == Ordering::Less,
        )),
        BinaryOperator::LessEqual => Ok(FormulaValue::Boolean(
            compare_values(&left_val, &right_val) != Ordering::Greater,
        )),
        BinaryOperator::GreaterThan => Ok(FormulaValue::Boolean(
            compare_values(&left_val, &right_val) == Ordering::Greater,
        )),
        BinaryOperator::GreaterEqual => Ok(FormulaValue::Boolean(
            compare_values(&left_val, &right_val) != Ordering::Less,
        )),

        // Concatenation
        BinaryOperator::Concat => Ok(FormulaValue::Text(
            left_val.to_display_string() + &right_val.to_display_string(),
        )),
    }
}

/// Compare two values for ordering (Excel-style comparison)
///
/// Numbers sort before text, text before booleans; text compares
/// case-insensitively.
fn compare_values(left: &FormulaValue, right: &FormulaValue) -> Ordering {
    fn rank(value: &FormulaValue) -> u8 {
        match value {
            FormulaValue::Number(_) | FormulaValue::Empty => 0,
            FormulaValue::Text(_) => 1,
            FormulaValue::Boolean(_) => 2,
            FormulaValue::Array(_) => 3,
        }
    }

    match (left, right) {
        (FormulaValue::Text(l), FormulaValue::Text(r)) => l.to_lowercase().cmp(&r.to_lowercase()),
        (FormulaValue::Boolean(l), FormulaValue::Boolean(r)) => l.cmp(r),
        _ if rank(left) == 0 && rank(right) == 0 => {
            let l = left.as_number().unwrap_or(0.0);
            let r = right.as_number().unwrap_or(0.0);
            l.partial_cmp(&r).unwrap_or(Ordering::Equal)
        }
        _ => rank(left).cmp(&rank(right)),
    }
}

/// Evaluate a unary operation
fn evaluate_unary_op(
    op: UnaryOperator,
    operand: &FormulaExpr,
    ctx: &EvaluationContext,
) -> FormulaResult<FormulaValue> {
    let n = operand_number(&evaluate(operand, ctx)?)?;

    match op {
        UnaryOperator::Negate => Ok(FormulaValue::Number(-n)),
        UnaryOperator::Percent => Ok(FormulaValue::Number(n / 100.0)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sheetkit_core::{CellError, Workbook};

    fn eval_in(workbook: &Workbook, formula: &str) -> FormulaResult<FormulaValue> {
        let options = CalculationOptions::default();
        let ctx = EvaluationContext::new(workbook, "Sheet1", CellAddress::new(99, 99), &options);
        evaluate(&parse_formula(formula)?, &ctx)
    }

    fn eval(formula: &str) -> FormulaResult<FormulaValue> {
        eval_in(&Workbook::new(), formula)
    }

    #[test]
    fn test_evaluate_literals() {
        assert_eq!(eval("=42").unwrap(), FormulaValue::Number(42.0));
        assert_eq!(eval("=\"Hello\"").unwrap(), FormulaValue::Text("Hello".into()));
        assert_eq!(eval("=TRUE").unwrap(), FormulaValue::Boolean(true));
        assert_eq!(eval("=#REF!").unwrap_err(), FormulaError::Cell(CellError::Ref));
    }

    #[test]
    fn test_evaluate_arithmetic() {
        assert_eq!(eval("=1+2").unwrap(), FormulaValue::Number(3.0));
        assert_eq!(eval("=10-3").unwrap(), FormulaValue::Number(7.0));
        assert_eq!(eval("=4*5").unwrap(), FormulaValue::Number(20.0));
        assert_eq!(eval("=20/4").unwrap(), FormulaValue::Number(5.0));
        assert_eq!(eval("=2^10").unwrap(), FormulaValue::Number(1024.0));
        assert_eq!(eval("=1+2*3").unwrap(), FormulaValue::Number(7.0));
        assert_eq!(eval("=(1+2)*3").unwrap(), FormulaValue::Number(9.0));
        assert_eq!(eval("=-2^2").unwrap(), FormulaValue::Number(4.0));
    }

    #[test]
    fn test_evaluate_unary() {
        assert_eq!(eval("=-5").unwrap(), FormulaValue::Number(-5.0));
        assert_eq!(eval("=50%").unwrap(), FormulaValue::Number(0.5));
        assert_eq!(eval("=--5").unwrap(), FormulaValue::Number(5.0));
        assert_eq!(eval("=-\"a\"").unwrap_err().to_string(), "#VALUE!");
    }

    #[test]
    fn test_arithmetic_errors() {
        assert_eq!(eval("=1/0").unwrap_err().to_string(), "#DIV/0!");
        assert_eq!(eval("=1+\"a\"").unwrap_err().to_string(), "#VALUE!");
        assert_eq!(eval("=0^0").unwrap_err().to_string(), "#NUM!");
        assert_eq!(eval("=0^-1").unwrap_err().to_string(), "#DIV/0!");
        assert_eq!(eval("=10^400").unwrap_err().to_string(), "#NUM!");
    }

    #[test]
    fn test_evaluate_comparison() {
        assert_eq!(eval("=1<2").unwrap(), FormulaValue::Boolean(true));
        assert_eq!(eval("=5<>5").unwrap(), FormulaValue::Boolean(false));
        assert_eq!(eval("=\"abc\"=\"ABC\"").unwrap(), FormulaValue::Boolean(true));
        assert_eq!(eval("=1<\"a\"").unwrap(), FormulaValue::Boolean(true));
        assert_eq!(eval("=\"z\"<TRUE").unwrap(), FormulaValue::Boolean(true));
        assert_eq!(eval("=Z99=0").unwrap(), FormulaValue::Boolean(true));
    }

    #[test]
    fn test_concatenation() {
        assert_eq!(
            eval("=\"a\"&1.5&TRUE").unwrap(),
            FormulaValue::Text("a1.5TRUE".into())
        );
    }

    #[test]
    fn test_cell_references() {
        let mut wb = Workbook::new();
        wb.set_cell_value("Sheet1", "A1", 1.0).unwrap();
        wb.set_cell_value("Sheet1", "A2", "2").unwrap();
        wb.set_cell_value("Sheet1", "A3", "text").unwrap();
        wb.set_cell_formula("Sheet1", "A4", "A1+A2").unwrap();

        assert_eq!(eval_in(&wb, "=A1+A2").unwrap(), FormulaValue::Number(3.0));
        assert_eq!(eval_in(&wb, "=A3").unwrap(), FormulaValue::Text("text".into()));
        assert_eq!(eval_in(&wb, "=A4*2").unwrap(), FormulaValue::Number(6.0));
        assert_eq!(eval_in(&wb, "=B1").unwrap(), FormulaValue::Number(0.0));
        assert_eq!(eval_in(&wb, "=A1:A2").unwrap_err().to_string(), "#VALUE!");
        assert_eq!(
            eval_in(&wb, "=Nope!A1").unwrap_err().to_string(),
            "sheet Nope is not exist"
        );
    }

    #[test]
    fn test_range_argument_keeps_empty_members() {
        let mut wb = Workbook::new();
        wb.set_cell_value("Sheet1", "A1", 1.0).unwrap();
        wb.set_cell_value("Sheet1", "B2", "x").unwrap();

        let options = CalculationOptions::default();
        let ctx = EvaluationContext::new(&wb, "Sheet1", CellAddress::new(9, 9), &options);
        let value = ctx
            .evaluate_argument(&parse_formula("A1:B2").unwrap())
            .unwrap();
        assert_eq!(
            value,
            FormulaValue::Array(vec![
                FormulaValue::Number(1.0),
                FormulaValue::Empty,
                FormulaValue::Empty,
                FormulaValue::Text("x".into()),
            ])
        );
    }

    #[test]
    fn test_error_cell_aborts() {
        let mut wb = Workbook::new();
        wb.set_cell_value("Sheet1", "A1", CellError::Na).unwrap();
        assert_eq!(eval_in(&wb, "=A1+1").unwrap_err().to_string(), "#N/A");
    }

    #[test]
    fn test_cycle_detection() {
        let mut wb = Workbook::new();
        wb.set_cell_formula("Sheet1", "A1", "B1+1").unwrap();
        wb.set_cell_formula("Sheet1", "B1", "A1+1").unwrap();

        let err = calculate_cell(
            &wb,
            "Sheet1",
            CellAddress::parse("A1").unwrap(),
            &CalculationOptions::default(),
        )
        .unwrap_err();
        assert_eq!(err, FormulaError::CircularReference("Sheet1!A1".into()));
    }

    #[test]
    fn test_depth_limit() {
        let mut wb = Workbook::new();
        wb.set_cell_formula("Sheet1", "A1", "A2").unwrap();
        wb.set_cell_formula("Sheet1", "A2", "A3").unwrap();
        wb.set_cell_formula("Sheet1", "A3", "7").unwrap();

        let a1 = CellAddress::parse("A1").unwrap();
        let shallow = CalculationOptions {
            max_depth: 1,
            detect_cycles: true,
        };
        assert_eq!(
            calculate_cell(&wb, "Sheet1", a1, &shallow).unwrap_err(),
            FormulaError::DepthExceeded(1)
        );
        assert_eq!(
            calculate_cell(&wb, "Sheet1", a1, &CalculationOptions::default()).unwrap(),
            "7"
        );
    }

    #[test]
    fn test_calculate_cell_without_formula() {
        let mut wb = Workbook::new();
        wb.set_cell_value("Sheet1", "A1", 5.0).unwrap();
        let a1 = CellAddress::parse("A1").unwrap();
        let options = CalculationOptions::default();

        assert_eq!(calculate_cell(&wb, "Sheet1", a1, &options).unwrap(), "");
        assert_eq!(
            calculate_cell(&wb, "Other", a1, &options)
                .unwrap_err()
                .to_string(),
            "sheet Other is not exist"
        );
    }

    #[test]
    fn test_number_formatting() {
        assert_eq!(FormulaValue::Number(3.0).to_display_string(), "3");
        assert_eq!(FormulaValue::Number(-0.0).to_display_string(), "0");
        assert_eq!(
            FormulaValue::Number(1.0 / 3.0).to_display_string(),
            "0.3333333333333333"
        );
        assert_eq!(FormulaValue::Number(1e21).to_display_string(), "1000000000000000000000");
        assert_eq!(FormulaValue::Boolean(false).to_display_string(), "FALSE");
    }
}
