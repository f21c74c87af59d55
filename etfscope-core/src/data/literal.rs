//! Parser for the price endpoint's response body.
//!
//! The body is not JSON. It is a nested list written in Python literal
//! syntax: single-quoted header strings, double-quoted date strings, bare
//! numbers, occasional `None`, and newlines and tabs scattered between
//! elements. Only the subset of the literal grammar that can appear in a
//! list of lists is accepted.

use super::provider::DataError;
use std::iter::Peekable;
use std::str::CharIndices;

/// A parsed literal value.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    None,
    List(Vec<Literal>),
}

impl Literal {
    /// Numeric view of the value. Strings are not coerced.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Literal::Int(i) => Some(*i as f64),
            Literal::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Literal::Str(s) => Some(s),
            _ => None,
        }
    }
}

/// Strip embedded newlines and evaluate the text as a single literal.
pub fn parse_literal(text: &str) -> Result<Literal, DataError> {
    let cleaned = text.replace('\n', "");
    let mut parser = Parser {
        src: &cleaned,
        chars: cleaned.char_indices().peekable(),
    };
    let value = parser.value()?;
    parser.skip_ws();
    if let Some((pos, c)) = parser.chars.next() {
        return Err(parser.error(pos, &format!("trailing input starting with '{c}'")));
    }
    Ok(value)
}

/// Parse a header row followed by data rows.
///
/// Returns `(headers, rows)`. Every row must be a list; row length is not
/// checked here.
pub fn parse_table(text: &str) -> Result<(Vec<String>, Vec<Vec<Literal>>), DataError> {
    let Literal::List(outer) = parse_literal(text)? else {
        return Err(DataError::Parse("price response is not a list".into()));
    };

    let mut rows = outer.into_iter();
    let headers = match rows.next() {
        Some(Literal::List(cells)) => cells
            .into_iter()
            .map(|c| match c {
                Literal::Str(s) => Ok(s.trim().to_string()),
                other => Err(DataError::Parse(format!("non-string header cell: {other:?}"))),
            })
            .collect::<Result<Vec<_>, _>>()?,
        Some(other) => {
            return Err(DataError::Parse(format!(
                "header row is not a list: {other:?}"
            )))
        }
        None => return Err(DataError::Parse("price response is empty".into())),
    };

    let data = rows
        .enumerate()
        .map(|(i, row)| match row {
            Literal::List(cells) => Ok(cells),
            other => Err(DataError::Parse(format!(
                "data row {i} is not a list: {other:?}"
            ))),
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok((headers, data))
}

struct Parser<'a> {
    src: &'a str,
    chars: Peekable<CharIndices<'a>>,
}

impl<'a> Parser<'a> {
    fn error(&self, pos: usize, msg: &str) -> DataError {
        DataError::Parse(format!("malformed literal at byte {pos}: {msg}"))
    }

    fn skip_ws(&mut self) {
        while let Some(&(_, c)) = self.chars.peek() {
            if c.is_whitespace() {
                self.chars.next();
            } else {
                break;
            }
        }
    }

    fn value(&mut self) -> Result<Literal, DataError> {
        self.skip_ws();
        let Some(&(pos, c)) = self.chars.peek() else {
            return Err(self.error(self.src.len(), "unexpected end of input"));
        };
        match c {
            '[' => self.list(),
            '\'' | '"' => self.string(),
            '-' | '+' | '.' | '0'..='9' => self.number(),
            c if c.is_alphabetic() => self.word(),
            other => Err(self.error(pos, &format!("unexpected character '{other}'"))),
        }
    }

    fn list(&mut self) -> Result<Literal, DataError> {
        // opening bracket
        self.chars.next();
        let mut items = Vec::new();
        loop {
            self.skip_ws();
            match self.chars.peek() {
                Some(&(_, ']')) => {
                    self.chars.next();
                    return Ok(Literal::List(items));
                }
                Some(_) => {}
                None => return Err(self.error(self.src.len(), "unterminated list")),
            }

            items.push(self.value()?);

            self.skip_ws();
            match self.chars.next() {
                Some((_, ',')) => continue,
                Some((_, ']')) => return Ok(Literal::List(items)),
                Some((pos, c)) => {
                    return Err(self.error(pos, &format!("expected ',' or ']', found '{c}'")))
                }
                None => return Err(self.error(self.src.len(), "unterminated list")),
            }
        }
    }

    fn string(&mut self) -> Result<Literal, DataError> {
        let Some((start, quote)) = self.chars.next() else {
            return Err(self.error(self.src.len(), "unexpected end of input"));
        };
        let mut out = String::new();
        loop {
            match self.chars.next() {
                Some((_, c)) if c == quote => return Ok(Literal::Str(out)),
                Some((_, '\\')) => match self.chars.next() {
                    Some((_, 'n')) => out.push('\n'),
                    Some((_, 't')) => out.push('\t'),
                    Some((_, 'r')) => out.push('\r'),
                    Some((_, c)) => out.push(c),
                    None => return Err(self.error(start, "unterminated string")),
                },
                Some((_, c)) => out.push(c),
                None => return Err(self.error(start, "unterminated string")),
            }
        }
    }

    fn number(&mut self) -> Result<Literal, DataError> {
        let start = self.chars.peek().map(|&(p, _)| p).unwrap_or(self.src.len());
        let mut end = start;
        let mut is_float = false;
        while let Some(&(pos, c)) = self.chars.peek() {
            match c {
                '0'..='9' | '-' | '+' | '_' => {}
                '.' | 'e' | 'E' => is_float = true,
                _ => break,
            }
            end = pos + c.len_utf8();
            self.chars.next();
        }

        let token: String = self.src[start..end].chars().filter(|&c| c != '_').collect();
        if is_float {
            token
                .parse::<f64>()
                .map(Literal::Float)
                .map_err(|_| self.error(start, &format!("invalid number '{token}'")))
        } else {
            token
                .parse::<i64>()
                .map(Literal::Int)
                .map_err(|_| self.error(start, &format!("invalid number '{token}'")))
        }
    }

    fn word(&mut self) -> Result<Literal, DataError> {
        let start = self.chars.peek().map(|&(p, _)| p).unwrap_or(self.src.len());
        let mut end = start;
        while let Some(&(pos, c)) = self.chars.peek() {
            if !c.is_alphanumeric() && c != '_' {
                break;
            }
            end = pos + c.len_utf8();
            self.chars.next();
        }
        match &self.src[start..end] {
            "None" => Ok(Literal::None),
            "True" => Ok(Literal::Bool(true)),
            "False" => Ok(Literal::Bool(false)),
            other => Err(self.error(start, &format!("unknown name '{other}'"))),
        }
    }
}
