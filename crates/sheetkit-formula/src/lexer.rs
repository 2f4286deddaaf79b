//! Formula tokenizer
//!
//! Tokens borrow their exact source text, so a token stream can be rendered
//! back into the original formula byte for byte. The parser drops whitespace
//! tokens; the reference translator keeps them and only rewrites cell tokens.

use sheetkit_core::{CellAddress, CellError, Error};

use crate::error::{FormulaError, FormulaResult};

/// A token and the slice of formula text it was read from
#[derive(Debug, Clone, PartialEq)]
pub struct Token<'a> {
    pub kind: TokenKind<'a>,
    /// Source text of the token, including quotes and sheet prefixes
    pub text: &'a str,
    /// Byte offset of `text` in the tokenized input
    pub offset: usize,
}

/// Token types
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind<'a> {
    Number(f64),
    /// String literal with `""` already unescaped
    Text(String),
    Boolean(bool),
    Error(CellError),
    /// Function name (always followed by `(`) or a bare name
    Identifier(&'a str),
    Cell(CellToken<'a>),
    Operator(Operator),
    Colon,
    Comma,
    LeftParen,
    RightParen,
    Whitespace,
}

/// A possibly sheet-qualified cell address
#[derive(Debug, Clone, PartialEq)]
pub struct CellToken<'a> {
    /// Unquoted sheet name
    pub sheet: Option<String>,
    /// Sheet prefix as written, including quotes and the `!` (empty if none)
    pub prefix: &'a str,
    pub address: CellAddress,
}

impl CellToken<'_> {
    /// Render this token with a different address, keeping the sheet prefix
    pub fn render(&self, address: CellAddress) -> String {
        format!("{}{}", self.prefix, address)
    }
}

/// Operator tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    Ampersand,
    Percent,
    Equal,
    NotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,
}

/// Split an optional leading `=` (and any whitespace before it) off a formula
///
/// Returns `(prefix, body)`; `prefix` is empty when the formula has no `=`.
pub fn split_formula_prefix(formula: &str) -> (&str, &str) {
    let trimmed = formula.trim_start();
    if trimmed.starts_with('=') {
        let split = formula.len() - trimmed.len() + 1;
        formula.split_at(split)
    } else {
        ("", formula)
    }
}

/// Tokenize a formula body
///
/// Unknown characters and unterminated literals fail with
/// [`FormulaError::Parse`] carrying the rest of the input from the failure.
/// Text shaped like a cell address that is not a valid one (`A0`, `XFE1`)
/// fails with [`FormulaError::Reference`].
pub fn tokenize(input: &str) -> FormulaResult<Vec<Token<'_>>> {
    let mut lexer = Lexer { input, pos: 0 };
    let mut tokens = Vec::new();
    while !lexer.is_at_end() {
        tokens.push(lexer.scan_token()?);
    }
    Ok(tokens)
}

struct Lexer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn scan_token(&mut self) -> FormulaResult<Token<'a>> {
        let start = self.pos;
        let kind = self.scan_kind()?;
        Ok(Token {
            kind,
            text: &self.input[start..self.pos],
            offset: start,
        })
    }

    fn scan_kind(&mut self) -> FormulaResult<TokenKind<'a>> {
        let Some(c) = self.peek_char() else {
            return Err(self.error_here());
        };

        if c.is_whitespace() {
            while self.peek_char().map_or(false, char::is_whitespace) {
                self.advance();
            }
            return Ok(TokenKind::Whitespace);
        }

        let single = match c {
            '+' => Some(TokenKind::Operator(Operator::Plus)),
            '-' => Some(TokenKind::Operator(Operator::Minus)),
            '*' => Some(TokenKind::Operator(Operator::Star)),
            '/' => Some(TokenKind::Operator(Operator::Slash)),
            '^' => Some(TokenKind::Operator(Operator::Caret)),
            '&' => Some(TokenKind::Operator(Operator::Ampersand)),
            '%' => Some(TokenKind::Operator(Operator::Percent)),
            '=' => Some(TokenKind::Operator(Operator::Equal)),
            ':' => Some(TokenKind::Colon),
            ',' => Some(TokenKind::Comma),
            '(' => Some(TokenKind::LeftParen),
            ')' => Some(TokenKind::RightParen),
            _ => None,
        };
        if let Some(kind) = single {
            self.advance();
            return Ok(kind);
        }

        match c {
            '<' => {
                self.advance();
                let op = match self.peek_char() {
                    Some('=') => Operator::LessEqual,
                    Some('>') => Operator::NotEqual,
                    _ => return Ok(TokenKind::Operator(Operator::LessThan)),
                };
                self.advance();
                Ok(TokenKind::Operator(op))
            }
            '>' => {
                self.advance();
                if self.peek_char() == Some('=') {
                    self.advance();
                    return Ok(TokenKind::Operator(Operator::GreaterEqual));
                }
                Ok(TokenKind::Operator(Operator::GreaterThan))
            }
            '"' => self.scan_string(),
            '#' => self.scan_error(),
            '\'' => self.scan_quoted_sheet(),
            c if c.is_ascii_digit()
                || (c == '.' && self.peek_char_at(1).map_or(false, |c| c.is_ascii_digit())) =>
            {
                self.scan_number()
            }
            c if c.is_alphabetic() || c == '_' || c == '$' => self.scan_word(),
            _ => Err(self.error_here()),
        }
    }

    fn scan_string(&mut self) -> FormulaResult<TokenKind<'a>> {
        let start = self.pos;
        self.advance(); // Opening quote

        let mut s = String::new();
        loop {
            match self.peek_char() {
                Some('"') if self.peek_char_at(1) == Some('"') => {
                    s.push('"');
                    self.advance();
                    self.advance();
                }
                Some('"') => {
                    self.advance();
                    return Ok(TokenKind::Text(s));
                }
                Some(c) => {
                    s.push(c);
                    self.advance();
                }
                None => return Err(FormulaError::Parse(self.input[start..].to_string())),
            }
        }
    }

    fn scan_number(&mut self) -> FormulaResult<TokenKind<'a>> {
        let start = self.pos;
        self.skip_digits();

        if self.peek_char() == Some('.') {
            self.advance();
            self.skip_digits();
        }

        // Exponent only when digits follow
        if matches!(self.peek_char(), Some('e' | 'E')) {
            let sign = matches!(self.peek_char_at(1), Some('+' | '-')) as usize;
            if self
                .peek_char_at(1 + sign)
                .map_or(false, |c| c.is_ascii_digit())
            {
                for _ in 0..=sign {
                    self.advance();
                }
                self.skip_digits();
            }
        }

        let text = &self.input[start..self.pos];
        text.parse::<f64>()
            .map(TokenKind::Number)
            .map_err(|_| FormulaError::Parse(text.to_string()))
    }

    fn scan_error(&mut self) -> FormulaResult<TokenKind<'a>> {
        let rest = &self.input[self.pos..];
        for error in CellError::ALL {
            let code = error.as_str();
            if rest.len() >= code.len()
                && rest.is_char_boundary(code.len())
                && rest[..code.len()].eq_ignore_ascii_case(code)
            {
                self.pos += code.len();
                return Ok(TokenKind::Error(error));
            }
        }
        Err(self.error_here())
    }

    fn scan_quoted_sheet(&mut self) -> FormulaResult<TokenKind<'a>> {
        let start = self.pos;
        self.advance(); // Opening quote

        let mut name = String::new();
        loop {
            match self.peek_char() {
                Some('\'') if self.peek_char_at(1) == Some('\'') => {
                    name.push('\'');
                    self.advance();
                    self.advance();
                }
                Some('\'') => {
                    self.advance();
                    break;
                }
                Some(c) => {
                    name.push(c);
                    self.advance();
                }
                None => return Err(FormulaError::Parse(self.input[start..].to_string())),
            }
        }

        if self.peek_char() != Some('!') {
            return Err(FormulaError::Parse(self.input[start..].to_string()));
        }
        self.advance();
        self.scan_qualified_cell(start, name)
    }

    fn scan_word(&mut self) -> FormulaResult<TokenKind<'a>> {
        let start = self.pos;
        self.skip_word();
        let word = &self.input[start..self.pos];

        match self.peek_char() {
            Some('!') => {
                self.advance();
                self.scan_qualified_cell(start, word.to_string())
            }
            Some('(') => Ok(TokenKind::Identifier(word)),
            _ if is_cell_like(word) => {
                let address = parse_cell(word)?;
                Ok(TokenKind::Cell(CellToken {
                    sheet: None,
                    prefix: "",
                    address,
                }))
            }
            _ if word.eq_ignore_ascii_case("TRUE") => Ok(TokenKind::Boolean(true)),
            _ if word.eq_ignore_ascii_case("FALSE") => Ok(TokenKind::Boolean(false)),
            _ => Ok(TokenKind::Identifier(word)),
        }
    }

    /// Read the address after `Sheet!`; `start` is where the prefix began
    fn scan_qualified_cell(&mut self, start: usize, sheet: String) -> FormulaResult<TokenKind<'a>> {
        let prefix_end = self.pos;
        self.skip_word();
        let word = &self.input[prefix_end..self.pos];
        if !is_cell_like(word) {
            return Err(FormulaError::Parse(self.input[start..].to_string()));
        }

        let address = parse_cell(word)?;
        Ok(TokenKind::Cell(CellToken {
            sheet: Some(sheet),
            prefix: &self.input[start..prefix_end],
            address,
        }))
    }

    fn error_here(&self) -> FormulaError {
        FormulaError::Parse(self.input[self.pos..].to_string())
    }

    fn skip_digits(&mut self) {
        while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
            self.advance();
        }
    }

    fn skip_word(&mut self) {
        while self
            .peek_char()
            .map_or(false, |c| c.is_alphanumeric() || matches!(c, '_' | '.' | '$'))
        {
            self.advance();
        }
    }

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_char_at(&self, offset: usize) -> Option<char> {
        self.input[self.pos..].chars().nth(offset)
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek_char() {
            self.pos += c.len_utf8();
        }
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.input.len()
    }
}

/// `$?LETTERS$?DIGITS`, the shape of an A1 address
fn parse_cell(word: &str) -> FormulaResult<CellAddress> {
    CellAddress::parse(word).map_err(|e| Error::cannot_convert(word, e).into())
}

fn is_cell_like(word: &str) -> bool {
    let rest = word.strip_prefix('$').unwrap_or(word);
    let letters = rest.bytes().take_while(u8::is_ascii_alphabetic).count();
    if letters == 0 {
        return false;
    }
    let rest = &rest[letters..];
    let rest = rest.strip_prefix('$').unwrap_or(rest);
    !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(input: &str) -> Vec<TokenKind<'_>> {
        tokenize(input).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_tokens_cover_input() {
        let input = r#"SUM(A1:$B$2, 'My Sheet'!C3) & "x""y" <> 1.5e3"#;
        let tokens = tokenize(input).unwrap();
        let rebuilt: String = tokens.iter().map(|t| t.text).collect();
        assert_eq!(rebuilt, input);
    }

    #[test]
    fn test_literals() {
        assert_eq!(
            kinds(r#"1.5 "a""b" TRUE #DIV/0!"#),
            vec![
                TokenKind::Number(1.5),
                TokenKind::Whitespace,
                TokenKind::Text("a\"b".into()),
                TokenKind::Whitespace,
                TokenKind::Boolean(true),
                TokenKind::Whitespace,
                TokenKind::Error(CellError::Div0),
            ]
        );
        assert_eq!(kinds("1e"), vec![TokenKind::Number(1.0), TokenKind::Identifier("e")]);
    }

    #[test]
    fn test_cells_and_functions() {
        let tokens = tokenize("Sheet2!$A1+abs(b2)").unwrap();
        match &tokens[0].kind {
            TokenKind::Cell(cell) => {
                assert_eq!(cell.sheet.as_deref(), Some("Sheet2"));
                assert_eq!(cell.prefix, "Sheet2!");
                assert_eq!(cell.address.to_string(), "$A1");
            }
            other => panic!("expected cell, got {:?}", other),
        }
        assert_eq!(tokens[2].kind, TokenKind::Identifier("abs"));
        assert!(matches!(&tokens[4].kind, TokenKind::Cell(c) if c.address.to_string() == "B2"));
    }

    #[test]
    fn test_quoted_sheet() {
        let tokens = tokenize("'It''s here'!B7").unwrap();
        match &tokens[0].kind {
            TokenKind::Cell(cell) => {
                assert_eq!(cell.sheet.as_deref(), Some("It's here"));
                assert_eq!(cell.prefix, "'It''s here'!");
                assert_eq!(cell.render(CellAddress::new(7, 1)), "'It''s here'!B8");
            }
            other => panic!("expected cell, got {:?}", other),
        }
    }

    #[test]
    fn test_errors() {
        assert_eq!(
            tokenize("1+ ~2").unwrap_err(),
            FormulaError::Parse("~2".into())
        );
        assert_eq!(
            tokenize(r#""open"#).unwrap_err(),
            FormulaError::Parse(r#""open"#.into())
        );
        assert_eq!(
            tokenize("A0").unwrap_err().to_string(),
            r#"cannot convert cell "A0" to coordinates: invalid cell name "A0""#
        );
        assert_eq!(
            tokenize("Sheet1!ZZZZ1").unwrap_err().to_string(),
            "cannot convert cell \"ZZZZ1\" to coordinates: \
             column number 18278 exceeds the maximum of 16384 columns"
        );
    }

    #[test]
    fn test_split_prefix() {
        assert_eq!(split_formula_prefix("=A1"), ("=", "A1"));
        assert_eq!(split_formula_prefix("  =A1"), ("  =", "A1"));
        assert_eq!(split_formula_prefix("A1=B1"), ("", "A1=B1"));
    }
}
