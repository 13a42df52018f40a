//! Recursive-descent parser for path expressions.

use super::{Clause, Literal, Path, Step};

/// A malformed path expression.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("syntax error at position {position}: {message}")]
pub struct SyntaxError {
    position: usize,
    message: String,
}

impl SyntaxError {
    /// Byte offset into the expression where parsing failed.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Description of what was expected.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

pub(super) fn parse(expression: &str) -> Result<Path, SyntaxError> {
    let mut parser = Parser {
        input: expression.trim_end(),
        pos: 0,
    };
    parser.path()
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn path(&mut self) -> Result<Path, SyntaxError> {
        self.skip_whitespace();
        self.expect('$')?;

        let mut steps = Vec::new();
        while let Some(c) = self.peek() {
            match c {
                '.' => {
                    self.bump();
                    steps.push(Step::Field(self.name()?));
                }
                '[' => {
                    self.bump();
                    steps.push(self.selector()?);
                }
                other => return Err(self.error(format!("unexpected character '{other}'"))),
            }
        }

        Ok(Path { steps })
    }

    fn selector(&mut self) -> Result<Step, SyntaxError> {
        self.skip_whitespace();
        let step = match self.peek() {
            Some('*') => {
                self.bump();
                Step::Wildcard
            }
            Some('?') => {
                self.bump();
                self.skip_whitespace();
                self.expect('(')?;
                let clauses = self.predicate()?;
                self.skip_whitespace();
                self.expect(')')?;
                Step::Filter(clauses)
            }
            Some(c) if c.is_ascii_digit() => Step::Index(self.index()?),
            Some(other) => {
                return Err(self.error(format!(
                    "expected index, '*' or filter, found '{other}'"
                )));
            }
            None => return Err(self.error("expected index, '*' or filter")),
        };
        self.skip_whitespace();
        self.expect(']')?;
        Ok(step)
    }

    fn index(&mut self) -> Result<usize, SyntaxError> {
        let start = self.pos;
        let digits = self.take_while(|c| c.is_ascii_digit());
        digits.parse().map_err(|_| SyntaxError {
            position: start,
            message: format!("index '{digits}' is out of range"),
        })
    }

    fn predicate(&mut self) -> Result<Vec<Clause>, SyntaxError> {
        let mut clauses = vec![self.clause()?];
        loop {
            self.skip_whitespace();
            if !self.keyword("and") {
                break;
            }
            clauses.push(self.clause()?);
        }
        Ok(clauses)
    }

    fn clause(&mut self) -> Result<Clause, SyntaxError> {
        self.skip_whitespace();
        self.expect('@')?;

        let mut field = Vec::new();
        while self.peek() == Some('.') {
            self.bump();
            field.push(self.name()?);
        }
        if field.is_empty() {
            return Err(self.error("expected '.' after '@'"));
        }

        self.skip_whitespace();
        self.expect('=')?;
        // tolerate `==`
        if self.peek() == Some('=') {
            self.bump();
        }
        self.skip_whitespace();

        Ok(Clause {
            field,
            literal: self.literal()?,
        })
    }

    fn literal(&mut self) -> Result<Literal, SyntaxError> {
        match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                let start = self.pos;
                self.bump();
                let mut text = String::new();
                loop {
                    match self.bump() {
                        Some('\\') => match self.bump() {
                            Some(escaped) => text.push(escaped),
                            None => break,
                        },
                        Some(c) if c == quote => return Ok(Literal::Quoted(text)),
                        Some(c) => text.push(c),
                        None => break,
                    }
                }
                Err(SyntaxError {
                    position: start,
                    message: "unterminated string literal".to_string(),
                })
            }
            _ => {
                let token =
                    self.take_while(|c| !c.is_whitespace() && !matches!(c, ')' | ']' | '"' | '\''));
                if token.is_empty() {
                    Err(self.error("expected literal"))
                } else {
                    Ok(Literal::Bare(token.to_string()))
                }
            }
        }
    }

    fn name(&mut self) -> Result<String, SyntaxError> {
        let name = self.take_while(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if name.is_empty() {
            Err(self.error("expected field name"))
        } else {
            Ok(name.to_string())
        }
    }

    /// Consumes `word` if it is next and is followed by a clause boundary.
    fn keyword(&mut self, word: &str) -> bool {
        let rest = &self.input[self.pos..];
        let Some(after) = rest.strip_prefix(word) else {
            return false;
        };
        if after.starts_with(|c: char| c.is_whitespace() || c == '@') {
            self.pos += word.len();
            true
        } else {
            false
        }
    }

    fn take_while(&mut self, predicate: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if !predicate(c) {
                break;
            }
            self.bump();
        }
        &self.input[start..self.pos]
    }

    fn skip_whitespace(&mut self) {
        self.take_while(char::is_whitespace);
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn expect(&mut self, expected: char) -> Result<(), SyntaxError> {
        match self.peek() {
            Some(c) if c == expected => {
                self.bump();
                Ok(())
            }
            Some(c) => Err(self.error(format!("expected '{expected}', found '{c}'"))),
            None => Err(self.error(format!("expected '{expected}', found end of input"))),
        }
    }

    fn error(&self, message: impl Into<String>) -> SyntaxError {
        SyntaxError {
            position: self.pos,
            message: message.into(),
        }
    }
}
