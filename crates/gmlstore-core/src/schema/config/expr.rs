//! The mapping expression language.
//!
//! ```text
//! column := ident | ident '.' ident
//! join   := step (',' step)*
//! step   := ident '=' ident '.' ident
//! ident  := [A-Za-z_][A-Za-z0-9_]*
//! ```

use std::fmt;

/// A column reference, optionally qualified by its table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnExpr {
    pub table: Option<String>,
    pub column: String,
}

/// `from_column=table.column`: join rows of `table` whose `column` equals
/// `from_column` of the current row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinStepExpr {
    pub from_column: String,
    pub table: String,
    pub column: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// Byte offset of the offending input.
    pub position: usize,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token<'a> {
    Ident(&'a str),
    Eq,
    Dot,
    Comma,
}

struct Parser<'a> {
    tokens: Vec<(usize, Token<'a>)>,
    pos: usize,
    end: usize,
}

pub fn parse_column(src: &str) -> Result<ColumnExpr, ParseError> {
    let mut parser = Parser::new(src)?;
    let expr = parser.column()?;
    parser.finish()?;
    Ok(expr)
}

pub fn parse_join(src: &str) -> Result<Vec<JoinStepExpr>, ParseError> {
    let mut parser = Parser::new(src)?;
    let mut steps = vec![parser.step()?];
    while parser.eat(&Token::Comma) {
        steps.push(parser.step()?);
    }
    parser.finish()?;
    Ok(steps)
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Result<Parser<'a>, ParseError> {
        Ok(Parser {
            tokens: tokenize(src)?,
            pos: 0,
            end: src.len(),
        })
    }

    fn column(&mut self) -> Result<ColumnExpr, ParseError> {
        let first = self.ident()?;
        if self.eat(&Token::Dot) {
            let column = self.ident()?;
            Ok(ColumnExpr {
                table: Some(first.to_string()),
                column: column.to_string(),
            })
        } else {
            Ok(ColumnExpr {
                table: None,
                column: first.to_string(),
            })
        }
    }

    fn step(&mut self) -> Result<JoinStepExpr, ParseError> {
        let from_column = self.ident()?;
        self.expect(&Token::Eq, "`=`")?;
        let table = self.ident()?;
        self.expect(&Token::Dot, "`.`")?;
        let column = self.ident()?;
        Ok(JoinStepExpr {
            from_column: from_column.to_string(),
            table: table.to_string(),
            column: column.to_string(),
        })
    }

    fn ident(&mut self) -> Result<&'a str, ParseError> {
        match self.tokens.get(self.pos) {
            Some((_, Token::Ident(ident))) => {
                let ident = *ident;
                self.pos += 1;
                Ok(ident)
            }
            Some((position, token)) => Err(ParseError::new(
                *position,
                format!("expected identifier, found {token}"),
            )),
            None => Err(ParseError::new(self.end, "expected identifier, found end of input")),
        }
    }

    fn expect(&mut self, token: &Token<'_>, what: &str) -> Result<(), ParseError> {
        if self.eat(token) {
            return Ok(());
        }
        match self.tokens.get(self.pos) {
            Some((position, found)) => Err(ParseError::new(
                *position,
                format!("expected {what}, found {found}"),
            )),
            None => Err(ParseError::new(
                self.end,
                format!("expected {what}, found end of input"),
            )),
        }
    }

    fn eat(&mut self, token: &Token<'_>) -> bool {
        match self.tokens.get(self.pos) {
            Some((_, t)) if t == token => {
                self.pos += 1;
                true
            }
            _ => false,
        }
    }

    fn finish(&self) -> Result<(), ParseError> {
        match self.tokens.get(self.pos) {
            Some((position, token)) => Err(ParseError::new(
                *position,
                format!("unexpected {token}"),
            )),
            None => Ok(()),
        }
    }
}

fn tokenize(src: &str) -> Result<Vec<(usize, Token<'_>)>, ParseError> {
    let bytes = src.as_bytes();
    let mut tokens = vec![];
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i];
        match c {
            b' ' | b'\t' | b'\n' | b'\r' => i += 1,
            b'=' => {
                tokens.push((i, Token::Eq));
                i += 1;
            }
            b'.' => {
                tokens.push((i, Token::Dot));
                i += 1;
            }
            b',' => {
                tokens.push((i, Token::Comma));
                i += 1;
            }
            c if c == b'_' || c.is_ascii_alphabetic() => {
                let start = i;
                while i < bytes.len() && (bytes[i] == b'_' || bytes[i].is_ascii_alphanumeric()) {
                    i += 1;
                }
                tokens.push((start, Token::Ident(&src[start..i])));
            }
            _ => {
                let ch = src[i..].chars().next().unwrap_or('?');
                return Err(ParseError::new(i, format!("unexpected character `{ch}`")));
            }
        }
    }

    if tokens.is_empty() {
        return Err(ParseError::new(0, "empty expression"));
    }
    Ok(tokens)
}

impl ParseError {
    fn new(position: usize, message: impl Into<String>) -> ParseError {
        ParseError {
            position,
            message: message.into(),
        }
    }
}

impl std::error::Error for ParseError {}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at position {}", self.message, self.position)
    }
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Ident(ident) => write!(f, "`{ident}`"),
            Token::Eq => f.write_str("`=`"),
            Token::Dot => f.write_str("`.`"),
            Token::Comma => f.write_str("`,`"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns() {
        assert_eq!(
            parse_column("name").unwrap(),
            ColumnExpr {
                table: None,
                column: "name".to_string()
            }
        );
        assert_eq!(
            parse_column(" building_name.value ").unwrap(),
            ColumnExpr {
                table: Some("building_name".to_string()),
                column: "value".to_string()
            }
        );
    }

    #[test]
    fn join_chains() {
        let steps = parse_join("id=building_part.parentfk, id=building_part_name.parentfk").unwrap();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].from_column, "id");
        assert_eq!(steps[1].table, "building_part_name");
    }

    #[test]
    fn errors_carry_position() {
        let err = parse_column("a.b.c").unwrap_err();
        assert_eq!(err.position, 3);

        let err = parse_join("id=building").unwrap_err();
        assert_eq!(err.position, 11);
        assert_eq!(err.to_string(), "expected `.`, found end of input at position 11");

        let err = parse_column("na-me").unwrap_err();
        assert_eq!(err.position, 2);

        assert!(parse_column("").is_err());
        assert!(parse_column("1abc").is_err());
    }
}
