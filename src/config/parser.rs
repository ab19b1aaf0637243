//! Parser for the assignment-only configuration source format.
//!
//! A source file is a sequence of `NAME = literal` statements. Literals
//! are strings, numbers, `True`/`False`/`None`, lists, tuples and sets;
//! a bare name refers to an earlier binding in the same file. Nothing is
//! ever evaluated, so expressions, calls and imports are rejected.

use std::collections::HashMap;

use super::value::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub line: usize,
    pub message: String,
}

type ParseResult<T> = std::result::Result<T, ParseError>;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Str(String),
    Int(i64),
    Float(f64),
    Open(char),
    Close(char),
    Comma,
    Assign,
    Newline,
}

#[derive(Debug, Clone)]
struct Spanned {
    token: Token,
    line: usize,
}

fn error<T>(line: usize, message: impl Into<String>) -> ParseResult<T> {
    Err(ParseError {
        line,
        message: message.into(),
    })
}

/// True when `name` is meant as a setting (no lowercase characters).
pub fn is_setting_name(name: &str) -> bool {
    !name.chars().any(char::is_lowercase)
}

/// Parse `source` and return the setting bindings in file order.
pub fn parse_settings(source: &str) -> ParseResult<Vec<(String, Value)>> {
    Ok(parse_bindings(source)?
        .into_iter()
        .filter(|(name, _)| is_setting_name(name))
        .collect())
}

/// Every top-level binding, lowercase helpers included. Rebinding a
/// name keeps its first position and takes the newest value.
pub fn parse_bindings(source: &str) -> ParseResult<Vec<(String, Value)>> {
    let tokens = tokenize(source)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        scope: HashMap::new(),
    };
    let mut order: Vec<String> = Vec::new();

    while let Some(spanned) = parser.next() {
        let line = spanned.line;
        let name = match spanned.token {
            Token::Newline => continue,
            Token::Ident(name) => name,
            other => return error(line, format!("expected a setting name, found {other:?}")),
        };

        match parser.next() {
            Some(Spanned {
                token: Token::Assign,
                ..
            }) => {}
            _ => return error(line, format!("expected '=' after '{name}'")),
        }

        let value = parser.statement_value(line)?;
        if parser.scope.insert(name.clone(), value).is_none() {
            order.push(name);
        }
    }

    Ok(order
        .into_iter()
        .filter_map(|name| parser.scope.remove(&name).map(|value| (name, value)))
        .collect())
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    scope: HashMap<String, Value>,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|s| &s.token)
    }

    fn next(&mut self) -> Option<Spanned> {
        let item = self.tokens.get(self.pos).cloned();
        if item.is_some() {
            self.pos += 1;
        }
        item
    }

    fn line(&self, fallback: usize) -> usize {
        self.tokens.get(self.pos).map_or(fallback, |s| s.line)
    }

    /// Right-hand side of an assignment; a top-level `a, b` is a tuple.
    fn statement_value(&mut self, line: usize) -> ParseResult<Value> {
        let first = self.literal(line)?;
        if self.peek() != Some(&Token::Comma) {
            return self.end_of_statement(line).map(|_| first);
        }

        let mut items = vec![first];
        while self.peek() == Some(&Token::Comma) {
            self.pos += 1;
            match self.peek() {
                None | Some(Token::Newline) => break,
                _ => items.push(self.literal(line)?),
            }
        }
        self.end_of_statement(line)?;
        Ok(Value::Tuple(items))
    }

    fn end_of_statement(&mut self, line: usize) -> ParseResult<()> {
        match self.next() {
            None
            | Some(Spanned {
                token: Token::Newline,
                ..
            }) => Ok(()),
            Some(other) => error(
                other.line.max(line),
                format!("unexpected {:?} after value", other.token),
            ),
        }
    }

    fn literal(&mut self, line: usize) -> ParseResult<Value> {
        let line = self.line(line);
        let Some(spanned) = self.next() else {
            return error(line, "expected a value");
        };

        match spanned.token {
            Token::Str(s) => {
                let mut s = s;
                // adjacent string literals concatenate
                while let Some(Token::Str(next)) = self.peek() {
                    s.push_str(next);
                    self.pos += 1;
                }
                Ok(Value::Str(s))
            }
            Token::Int(i) => Ok(Value::Int(i)),
            Token::Float(f) => Ok(Value::Float(f)),
            Token::Ident(name) => self.name_value(&name, spanned.line),
            Token::Open('[') => Ok(Value::List(self.items(']', spanned.line)?.0)),
            Token::Open('{') => {
                let (items, _) = self.items('}', spanned.line)?;
                if items.is_empty() {
                    return error(spanned.line, "dict literals are not supported");
                }
                let mut unique: Vec<Value> = Vec::with_capacity(items.len());
                for item in items {
                    if !unique.contains(&item) {
                        unique.push(item);
                    }
                }
                Ok(Value::Set(unique))
            }
            Token::Open('(') => {
                let (mut items, trailing_comma) = self.items(')', spanned.line)?;
                if items.len() == 1 && !trailing_comma {
                    Ok(items.remove(0))
                } else {
                    Ok(Value::Tuple(items))
                }
            }
            other => error(spanned.line, format!("unexpected {other:?}")),
        }
    }

    fn name_value(&self, name: &str, line: usize) -> ParseResult<Value> {
        match name {
            "True" => Ok(Value::Bool(true)),
            "False" => Ok(Value::Bool(false)),
            "None" => Ok(Value::None),
            _ => match self.scope.get(name) {
                Some(value) => Ok(value.clone()),
                None => error(line, format!("name '{name}' is not defined")),
            },
        }
    }

    /// Comma separated literals up to `close`. Newlines inside brackets
    /// are ignored. Returns whether the last item had a trailing comma.
    fn items(&mut self, close: char, line: usize) -> ParseResult<(Vec<Value>, bool)> {
        let mut items = Vec::new();
        let mut trailing_comma = false;

        loop {
            self.skip_newlines();
            match self.peek() {
                None => return error(line, format!("unclosed bracket, expected '{close}'")),
                Some(Token::Close(c)) if *c == close => {
                    self.pos += 1;
                    return Ok((items, trailing_comma));
                }
                Some(Token::Close(c)) => {
                    let c = *c;
                    return error(self.line(line), format!("mismatched '{c}', expected '{close}'"));
                }
                _ => {}
            }

            items.push(self.literal(line)?);
            trailing_comma = false;
            self.skip_newlines();

            match self.peek() {
                Some(Token::Comma) => {
                    self.pos += 1;
                    trailing_comma = true;
                }
                Some(Token::Close(c)) if *c == close => {}
                _ => return error(self.line(line), format!("expected ',' or '{close}'")),
            }
        }
    }

    fn skip_newlines(&mut self) {
        while self.peek() == Some(&Token::Newline) {
            self.pos += 1;
        }
    }
}

fn tokenize(source: &str) -> ParseResult<Vec<Spanned>> {
    let mut tokens = Vec::new();
    let mut chars = source.chars().peekable();
    let mut line = 1;

    while let Some(&c) = chars.peek() {
        match c {
            '\n' => {
                chars.next();
                tokens.push(Spanned {
                    token: Token::Newline,
                    line,
                });
                line += 1;
            }
            c if c.is_whitespace() => {
                chars.next();
            }
            '#' => {
                while chars.peek().is_some_and(|&c| c != '\n') {
                    chars.next();
                }
            }
            '\\' => {
                // explicit line continuation
                chars.next();
                if chars.next_if_eq(&'\r').is_some() || chars.peek() == Some(&'\n') {
                    chars.next();
                    line += 1;
                } else {
                    return error(line, "unexpected character after line continuation");
                }
            }
            '=' => {
                chars.next();
                tokens.push(Spanned {
                    token: Token::Assign,
                    line,
                });
            }
            ',' => {
                chars.next();
                tokens.push(Spanned {
                    token: Token::Comma,
                    line,
                });
            }
            '[' | '(' | '{' => {
                chars.next();
                tokens.push(Spanned {
                    token: Token::Open(c),
                    line,
                });
            }
            ']' | ')' | '}' => {
                chars.next();
                tokens.push(Spanned {
                    token: Token::Close(c),
                    line,
                });
            }
            '\'' | '"' => {
                chars.next();
                let start = line;
                let text = read_string(&mut chars, c, &mut line)?;
                tokens.push(Spanned {
                    token: Token::Str(text),
                    line: start,
                });
            }
            c if c.is_ascii_digit() || c == '-' || c == '+' || c == '.' => {
                let mut raw = String::new();
                while let Some(&c) = chars.peek() {
                    let exponent_sign = (c == '-' || c == '+')
                        && raw.ends_with(['e', 'E'])
                        && !raw.starts_with("0x");
                    let numeric = c.is_ascii_alphanumeric() || c == '.' || c == '_';
                    if numeric || exponent_sign || raw.is_empty() {
                        raw.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Spanned {
                    token: parse_number(&raw, line)?,
                    line,
                });
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut name = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_alphanumeric() || c == '_' {
                        name.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Spanned {
                    token: Token::Ident(name),
                    line,
                });
            }
            other => return error(line, format!("unexpected character '{other}'")),
        }
    }

    Ok(tokens)
}

fn read_string(
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
    quote: char,
    line: &mut usize,
) -> ParseResult<String> {
    let start = *line;
    let mut text = String::new();

    loop {
        let Some(c) = chars.next() else {
            return error(start, "unterminated string");
        };
        match c {
            c if c == quote => return Ok(text),
            '\n' => return error(start, "unterminated string"),
            '\\' => {
                let Some(escaped) = chars.next() else {
                    return error(start, "unterminated string");
                };
                match escaped {
                    'n' => text.push('\n'),
                    't' => text.push('\t'),
                    'r' => text.push('\r'),
                    '0' => text.push('\0'),
                    '\\' | '\'' | '"' => text.push(escaped),
                    '\n' => *line += 1,
                    other => {
                        text.push('\\');
                        text.push(other);
                    }
                }
            }
            other => text.push(other),
        }
    }
}

fn parse_number(raw: &str, line: usize) -> ParseResult<Token> {
    let cleaned = raw.replace('_', "");
    let (negative, digits) = match cleaned.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, cleaned.strip_prefix('+').unwrap_or(&cleaned)),
    };

    let radix = [("0x", 16), ("0o", 8), ("0b", 2)]
        .into_iter()
        .find_map(|(prefix, radix)| digits.strip_prefix(prefix).map(|rest| (rest, radix)));

    if let Some((rest, radix)) = radix {
        return match i64::from_str_radix(rest, radix) {
            Ok(value) => Ok(Token::Int(if negative { -value } else { value })),
            Err(_) => error(line, format!("invalid number '{raw}'")),
        };
    }

    if let Ok(value) = cleaned.parse::<i64>() {
        return Ok(Token::Int(value));
    }
    match cleaned.parse::<f64>() {
        Ok(value) if !digits.is_empty() && digits.chars().any(|c| c.is_ascii_digit()) => {
            Ok(Token::Float(value))
        }
        _ => error(line, format!("invalid number '{raw}'")),
    }
}
