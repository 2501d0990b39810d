//! Attribute values and the restricted literal parser.
//!
//! Each `:key="..."` attribute inside a marker coerces to a typed [`Value`].
//! Structured literals (`{...}` / `[...]`) accept the surface syntax of a
//! script-style object literal — bare keys, single or double quotes,
//! trailing commas — but are parsed as plain data. Nothing is ever
//! evaluated, so a template cannot smuggle code through an attribute.

use serde::Serialize;
use std::collections::BTreeMap;

/// A coerced attribute value.
///
/// Maps use a `BTreeMap` so serialized tag dumps stay deterministic.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    String(String),
    Bool(bool),
    Number(f64),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Read this value as a 0-based row/column index.
    ///
    /// Coordinates must be non-negative integer numbers; everything else
    /// yields `None` and is reported by the executor as a config error.
    pub fn as_coordinate(&self) -> Option<usize> {
        match self {
            Value::Number(n) if *n >= 0.0 && n.fract() == 0.0 => Some(*n as usize),
            _ => None,
        }
    }
}

/// Parse a `{...}` or `[...]` attribute literal into a [`Value`].
///
/// Errors are plain strings; the tokenizer wraps them into its syntax
/// error for the enclosing marker.
pub fn parse_literal(input: &str) -> Result<Value, String> {
    let mut parser = LiteralParser::new(input);
    parser.skip_whitespace();
    let value = parser.parse_value()?;
    parser.skip_whitespace();
    if !parser.at_end() {
        return Err(format!("trailing characters after literal: {:?}", parser.rest()));
    }
    Ok(value)
}

struct LiteralParser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> LiteralParser<'a> {
    fn new(src: &'a str) -> Self {
        LiteralParser { src, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn rest(&self) -> &str {
        &self.src[self.pos..]
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.bump();
        }
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), String> {
        match self.bump() {
            Some(ch) if ch == expected => Ok(()),
            Some(ch) => Err(format!("expected {:?}, found {:?}", expected, ch)),
            None => Err(format!("expected {:?}, found end of literal", expected)),
        }
    }

    fn parse_value(&mut self) -> Result<Value, String> {
        match self.peek() {
            Some('{') => self.parse_map(),
            Some('[') => self.parse_list(),
            Some('"') | Some('\'') => Ok(Value::String(self.parse_string()?)),
            Some(c) if c == '-' || c.is_ascii_digit() => self.parse_number(),
            Some(c) if c.is_ascii_alphabetic() || c == '_' => self.parse_word(),
            Some(c) => Err(format!("unexpected character {:?} in literal", c)),
            None => Err("unexpected end of literal".to_string()),
        }
    }

    fn parse_map(&mut self) -> Result<Value, String> {
        self.expect('{')?;
        let mut map = BTreeMap::new();
        loop {
            self.skip_whitespace();
            if self.eat('}') {
                break;
            }
            let key = self.parse_key()?;
            self.skip_whitespace();
            self.expect(':')?;
            self.skip_whitespace();
            let value = self.parse_value()?;
            map.insert(key, value);
            self.skip_whitespace();
            if self.eat(',') {
                continue;
            }
            self.expect('}')?;
            break;
        }
        Ok(Value::Map(map))
    }

    fn parse_list(&mut self) -> Result<Value, String> {
        self.expect('[')?;
        let mut items = Vec::new();
        loop {
            self.skip_whitespace();
            if self.eat(']') {
                break;
            }
            items.push(self.parse_value()?);
            self.skip_whitespace();
            if self.eat(',') {
                continue;
            }
            self.expect(']')?;
            break;
        }
        Ok(Value::List(items))
    }

    /// Map keys: a quoted string or a bare identifier.
    fn parse_key(&mut self) -> Result<String, String> {
        match self.peek() {
            Some('"') | Some('\'') => self.parse_string(),
            Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {
                let mut key = String::new();
                while let Some(c) = self.peek() {
                    if c.is_ascii_alphanumeric() || c == '_' || c == '$' {
                        key.push(c);
                        self.bump();
                    } else {
                        break;
                    }
                }
                Ok(key)
            }
            Some(c) => Err(format!("invalid map key starting with {:?}", c)),
            None => Err("unexpected end of literal in map key".to_string()),
        }
    }

    fn parse_string(&mut self) -> Result<String, String> {
        let quote = match self.bump() {
            Some(q @ ('"' | '\'')) => q,
            _ => return Err("expected a quoted string".to_string()),
        };
        let mut text = String::new();
        loop {
            match self.bump() {
                None => return Err("unterminated string in literal".to_string()),
                Some(c) if c == quote => return Ok(text),
                Some('\\') => match self.bump() {
                    Some('n') => text.push('\n'),
                    Some('t') => text.push('\t'),
                    Some('r') => text.push('\r'),
                    Some(c @ ('\\' | '\'' | '"')) => text.push(c),
                    Some(c) => return Err(format!("unsupported escape \\{}", c)),
                    None => return Err("unterminated string in literal".to_string()),
                },
                Some(c) => text.push(c),
            }
        }
    }

    fn parse_number(&mut self) -> Result<Value, String> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E') {
                self.bump();
            } else {
                break;
            }
        }
        let text = &self.src[start..self.pos];
        match text.parse::<f64>() {
            Ok(n) if n.is_finite() => Ok(Value::Number(n)),
            _ => Err(format!("invalid number: {:?}", text)),
        }
    }

    /// Bare words: only the boolean literals are data. `null` and
    /// identifiers are rejected so a literal can never reference code.
    fn parse_word(&mut self) -> Result<Value, String> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                self.bump();
            } else {
                break;
            }
        }
        match &self.src[start..self.pos] {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            "null" => Err("null is not a supported attribute value".to_string()),
            word => Err(format!("unsupported bare word {:?} in literal", word)),
        }
    }
}
