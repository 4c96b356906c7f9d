use super::expr::CmpOp;
use crate::error::{Result, SelectorError};

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Token {
    /// Bare identifier, keywords included.
    Ident(String),
    /// Backtick-quoted column name; never a keyword.
    Quoted(String),
    Int(i64),
    Float(f64),
    Str(String),
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Cmp(CmpOp),
    Amp,
    Pipe,
    Tilde,
    Eof,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Spanned {
    pub(crate) token: Token,
    pub(crate) offset: usize,
}

pub(crate) fn tokenize(input: &str) -> Result<Vec<Spanned>> {
    Lexer {
        input,
        bytes: input.as_bytes(),
        pos: 0,
    }
    .run()
}

struct Lexer<'a> {
    input: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl Lexer<'_> {
    fn error(&self, position: usize, message: impl Into<String>) -> SelectorError {
        SelectorError::Parse {
            expr: self.input.to_string(),
            position,
            message: message.into(),
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn peek_at(&self, ahead: usize) -> Option<u8> {
        self.bytes.get(self.pos + ahead).copied()
    }

    fn run(mut self) -> Result<Vec<Spanned>> {
        let mut tokens = Vec::new();
        loop {
            while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
                self.pos += 1;
            }
            let offset = self.pos;
            let Some(byte) = self.peek() else {
                tokens.push(Spanned {
                    token: Token::Eof,
                    offset,
                });
                return Ok(tokens);
            };
            let token = match byte {
                b'(' => self.single(Token::LParen),
                b')' => self.single(Token::RParen),
                b'[' => self.single(Token::LBracket),
                b']' => self.single(Token::RBracket),
                b',' => self.single(Token::Comma),
                b'&' => self.single(Token::Amp),
                b'|' => self.single(Token::Pipe),
                b'~' => self.single(Token::Tilde),
                b'=' | b'!' | b'<' | b'>' => self.comparison()?,
                b'`' => self.quoted()?,
                b'\'' | b'"' => self.string(byte)?,
                b'0'..=b'9' => self.number()?,
                b'-' if self.peek_at(1).is_some_and(|b| b.is_ascii_digit()) => self.number()?,
                b if b.is_ascii_alphabetic() || b == b'_' => self.ident(),
                _ => {
                    let c = self.input[offset..].chars().next().unwrap_or_default();
                    return Err(self.error(offset, format!("unexpected character '{c}'")));
                }
            };
            tokens.push(Spanned { token, offset });
        }
    }

    fn single(&mut self, token: Token) -> Token {
        self.pos += 1;
        token
    }

    fn comparison(&mut self) -> Result<Token> {
        let start = self.pos;
        let first = self.bytes[start];
        let followed_by_eq = self.peek_at(1) == Some(b'=');
        let (op, width) = match (first, followed_by_eq) {
            (b'=', true) => (CmpOp::Eq, 2),
            (b'!', true) => (CmpOp::NotEq, 2),
            (b'<', true) => (CmpOp::LtEq, 2),
            (b'>', true) => (CmpOp::GtEq, 2),
            (b'<', false) => (CmpOp::Lt, 1),
            (b'>', false) => (CmpOp::Gt, 1),
            (b'=', false) => return Err(self.error(start, "assignment is not allowed, use '=='")),
            _ => return Err(self.error(start, "expected '!='")),
        };
        self.pos += width;
        Ok(Token::Cmp(op))
    }

    fn quoted(&mut self) -> Result<Token> {
        let start = self.pos;
        self.pos += 1;
        let end = self.input[self.pos..]
            .find('`')
            .map(|i| self.pos + i)
            .ok_or_else(|| self.error(start, "unterminated backtick-quoted column"))?;
        let name = &self.input[self.pos..end];
        if name.is_empty() {
            return Err(self.error(start, "empty column name"));
        }
        self.pos = end + 1;
        Ok(Token::Quoted(name.to_string()))
    }

    fn string(&mut self, quote: u8) -> Result<Token> {
        let start = self.pos;
        self.pos += 1;
        let mut value = String::new();
        let mut chars = self.input[self.pos..].char_indices();
        while let Some((i, c)) = chars.next() {
            match c {
                '\\' => {
                    let Some((_, escaped)) = chars.next() else {
                        break;
                    };
                    value.push(match escaped {
                        'n' => '\n',
                        't' => '\t',
                        other => other,
                    });
                }
                c if c as u32 == quote as u32 => {
                    self.pos += i + 1;
                    return Ok(Token::Str(value));
                }
                c => value.push(c),
            }
        }
        Err(self.error(start, "unterminated string literal"))
    }

    fn number(&mut self) -> Result<Token> {
        let start = self.pos;
        if self.peek() == Some(b'-') {
            self.pos += 1;
        }
        let mut is_float = false;
        while let Some(b) = self.peek() {
            match b {
                b'0'..=b'9' | b'_' => self.pos += 1,
                b'.' if !is_float => {
                    is_float = true;
                    self.pos += 1;
                }
                b'e' | b'E' => {
                    is_float = true;
                    self.pos += 1;
                    if matches!(self.peek(), Some(b'+' | b'-')) {
                        self.pos += 1;
                    }
                }
                _ => break,
            }
        }
        let text: String = self.input[start..self.pos]
            .chars()
            .filter(|c| *c != '_')
            .collect();
        if is_float {
            text.parse::<f64>()
                .map(Token::Float)
                .map_err(|e| self.error(start, format!("invalid float literal: {e}")))
        } else {
            text.parse::<i64>()
                .map(Token::Int)
                .map_err(|e| self.error(start, format!("invalid integer literal: {e}")))
        }
    }

    fn ident(&mut self) -> Token {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|b| b.is_ascii_alphanumeric() || b == b'_')
        {
            self.pos += 1;
        }
        Token::Ident(self.input[start..self.pos].to_string())
    }
}
