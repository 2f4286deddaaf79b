//! Formula parser
//!
//! A recursive descent parser for Excel formulas with proper operator precedence.

use sheetkit_core::{CellRange, Error};

use crate::ast::{BinaryOperator, CellReference, FormulaExpr, RangeReference, UnaryOperator};
use crate::error::{FormulaError, FormulaResult};
use crate::lexer::{split_formula_prefix, tokenize, Operator, Token, TokenKind};

/// Parse a formula string into an AST
///
/// The leading `=` is optional.
///
/// # Example
/// ```rust
/// use sheetkit_formula::parse_formula;
///
/// let ast = parse_formula("=1+2").unwrap();
/// let ast = parse_formula("SUM(A1:A10)").unwrap();
/// let ast = parse_formula("=IF(A1>0,\"Yes\",\"No\")").unwrap();
/// ```
pub fn parse_formula(formula: &str) -> FormulaResult<FormulaExpr> {
    let (_, body) = split_formula_prefix(formula);
    let tokens = tokenize(body)?
        .into_iter()
        .filter(|t| t.kind != TokenKind::Whitespace)
        .collect();

    let mut parser = FormulaParser {
        input: body,
        tokens,
        pos: 0,
    };
    let expr = parser.parse_expression()?;

    // Make sure we consumed all input
    if parser.current().is_some() {
        return Err(parser.unexpected());
    }

    Ok(expr)
}

/// Formula parser
struct FormulaParser<'a> {
    input: &'a str,
    tokens: Vec<Token<'a>>,
    pos: usize,
}

impl<'a> FormulaParser<'a> {
    // === Token access ===

    fn current(&self) -> Option<&Token<'a>> {
        self.tokens.get(self.pos)
    }

    fn current_kind(&self) -> Option<&TokenKind<'a>> {
        self.current().map(|t| &t.kind)
    }

    fn current_operator(&self) -> Option<Operator> {
        match self.current_kind() {
            Some(TokenKind::Operator(op)) => Some(*op),
            _ => None,
        }
    }

    fn consume(&mut self) -> FormulaResult<Token<'a>> {
        let token = self.current().cloned().ok_or_else(|| self.unexpected())?;
        self.pos += 1;
        Ok(token)
    }

    fn expect(&mut self, expected: &TokenKind<'a>) -> FormulaResult<()> {
        if self.current_kind() == Some(expected) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    /// Parse error naming the rest of the input from the current token
    fn unexpected(&self) -> FormulaError {
        match self.current() {
            Some(token) => FormulaError::Parse(self.input[token.offset..].to_string()),
            None => FormulaError::Parse(self.input.trim().to_string()),
        }
    }

    // === Expression parsing with precedence ===
    // Precedence (lowest to highest):
    // 1. Comparison: =, <>, <, <=, >, >=
    // 2. Concatenation: &
    // 3. Addition/Subtraction: +, -
    // 4. Multiplication/Division: *, /
    // 5. Exponentiation: ^
    // 6. Unary: -, +, postfix %
    // 7. Range: :
    // 8. Primary: literals, references, function calls, parentheses

    fn parse_expression(&mut self) -> FormulaResult<FormulaExpr> {
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> FormulaResult<FormulaExpr> {
        let mut left = self.parse_concatenation()?;

        loop {
            let op = match self.current_operator() {
                Some(Operator::Equal) => BinaryOperator::Equal,
                Some(Operator::NotEqual) => BinaryOperator::NotEqual,
                Some(Operator::LessThan) => BinaryOperator::LessThan,
                Some(Operator::LessEqual) => BinaryOperator::LessEqual,
                Some(Operator::GreaterThan) => BinaryOperator::GreaterThan,
                Some(Operator::GreaterEqual) => BinaryOperator::GreaterEqual,
                _ => break,
            };

            self.pos += 1;
            let right = self.parse_concatenation()?;
            left = binary(op, left, right);
        }

        Ok(left)
    }

    fn parse_concatenation(&mut self) -> FormulaResult<FormulaExpr> {
        let mut left = self.parse_additive()?;

        while self.current_operator() == Some(Operator::Ampersand) {
            self.pos += 1;
            let right = self.parse_additive()?;
            left = binary(BinaryOperator::Concat, left, right);
        }

        Ok(left)
    }

    fn parse_additive(&mut self) -> FormulaResult<FormulaExpr> {
        let mut left = self.parse_multiplicative()?;

        loop {
            let op = match self.current_operator() {
                Some(Operator::Plus) => BinaryOperator::Add,
                Some(Operator::Minus) => BinaryOperator::Subtract,
                _ => break,
            };

            self.pos += 1;
            let right = self.parse_multiplicative()?;
            left = binary(op, left, right);
        }

        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> FormulaResult<FormulaExpr> {
        let mut left = self.parse_exponent()?;

        loop {
            let op = match self.current_operator() {
                Some(Operator::Star) => BinaryOperator::Multiply,
                Some(Operator::Slash) => BinaryOperator::Divide,
                _ => break,
            };

            self.pos += 1;
            let right = self.parse_exponent()?;
            left = binary(op, left, right);
        }

        Ok(left)
    }

    fn parse_exponent(&mut self) -> FormulaResult<FormulaExpr> {
        let mut left = self.parse_unary()?;

        // Left associative: 2^3^2 is (2^3)^2
        while self.current_operator() == Some(Operator::Caret) {
            self.pos += 1;
            let right = self.parse_unary()?;
            left = binary(BinaryOperator::Power, left, right);
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> FormulaResult<FormulaExpr> {
        match self.current_operator() {
            Some(Operator::Minus) => {
                self.pos += 1;
                let operand = self.parse_unary()?;
                return Ok(FormulaExpr::UnaryOp {
                    op: UnaryOperator::Negate,
                    operand: Box::new(operand),
                });
            }
            // Prefix plus is a no-op
            Some(Operator::Plus) => {
                self.pos += 1;
                return self.parse_unary();
            }
            _ => {}
        }

        let mut expr = self.parse_range()?;

        while self.current_operator() == Some(Operator::Percent) {
            self.pos += 1;
            expr = FormulaExpr::UnaryOp {
                op: UnaryOperator::Percent,
                operand: Box::new(expr),
            };
        }

        Ok(expr)
    }

    fn parse_range(&mut self) -> FormulaResult<FormulaExpr> {
        let left = self.parse_primary()?;

        if self.current_kind() != Some(&TokenKind::Colon) {
            return Ok(left);
        }
        let FormulaExpr::CellRef(start) = left else {
            return Err(self.unexpected());
        };
        self.pos += 1;

        let token = self.consume()?;
        match token.kind {
            TokenKind::Cell(end) => Ok(FormulaExpr::RangeRef(RangeReference {
                sheet: start.sheet,
                range: CellRange::new(start.address, end.address),
            })),
            _ => Err(Error::cannot_convert(
                token.text,
                Error::InvalidCellName(token.text.to_string()),
            )
            .into()),
        }
    }

    fn parse_primary(&mut self) -> FormulaResult<FormulaExpr> {
        let token = self.consume()?;

        match token.kind {
            TokenKind::Number(n) => Ok(FormulaExpr::Number(n)),
            TokenKind::Text(s) => Ok(FormulaExpr::Text(s)),
            TokenKind::Boolean(b) => Ok(FormulaExpr::Boolean(b)),
            TokenKind::Error(e) => Ok(FormulaExpr::Error(e)),

            TokenKind::Cell(cell) => Ok(FormulaExpr::CellRef(CellReference {
                sheet: cell.sheet,
                address: cell.address,
            })),

            TokenKind::LeftParen => {
                let expr = self.parse_expression()?;
                self.expect(&TokenKind::RightParen)?;
                Ok(expr)
            }

            TokenKind::Identifier(name) if self.current_kind() == Some(&TokenKind::LeftParen) => {
                self.parse_function_call(name)
            }

            _ => {
                self.pos -= 1;
                Err(self.unexpected())
            }
        }
    }

    fn parse_function_call(&mut self, name: &str) -> FormulaResult<FormulaExpr> {
        self.expect(&TokenKind::LeftParen)?;

        let mut args = Vec::new();

        if self.current_kind() != Some(&TokenKind::RightParen) {
            args.push(self.parse_expression()?);

            while self.current_kind() == Some(&TokenKind::Comma) {
                self.pos += 1;
                args.push(self.parse_expression()?);
            }
        }

        self.expect(&TokenKind::RightParen)?;

        Ok(FormulaExpr::Function {
            name: name.to_uppercase(),
            args,
        })
    }
}

fn binary(op: BinaryOperator, left: FormulaExpr, right: FormulaExpr) -> FormulaExpr {
    FormulaExpr::BinaryOp {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}
