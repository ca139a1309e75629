//! C initializer literal parsing
//!
//! Custom init values are written as C initializers (`42`, `0x1Fu`, `1.5f`,
//! `'A'`, `{1, 0}`). This module turns them into typed signal values. As in C,
//! an aggregate initializer may list fewer elements than the type has; the
//! rest are zero.

use crate::signals::database::SignalType;
use crate::types::{DataType, FieldValue, Result, SignalError, SignalValue};

/// Untyped initializer tree
#[derive(Debug, Clone, PartialEq)]
enum Literal {
    Number(String),
    Bool(bool),
    Char(char),
    List(Vec<Literal>),
}

/// Parse an initializer for a signal of the given type
pub fn parse_value(signal: &str, signal_type: &SignalType, text: &str) -> Result<SignalValue> {
    let invalid = |reason: String| SignalError::InvalidValue {
        signal: signal.to_string(),
        reason,
    };

    let mut parser = Parser::new(text);
    let literal = parser.parse_literal().map_err(&invalid)?;
    parser.skip_whitespace();
    if !parser.at_end() {
        return Err(invalid(format!("unexpected trailing input in '{}'", text.trim())));
    }

    match (signal_type, literal) {
        (SignalType::Primitive(data_type), Literal::List(mut items)) => {
            // `{5}` is a valid scalar initializer in C
            if items.len() == 1 {
                scalar_value(signal, *data_type, &items.remove(0))
            } else {
                Err(invalid("scalar signal needs a single value".to_string()))
            }
        }
        (SignalType::Primitive(data_type), literal) => scalar_value(signal, *data_type, &literal),
        (SignalType::Struct(fields), Literal::List(items)) => {
            if items.len() > fields.len() {
                return Err(invalid(format!(
                    "{} initializers for a struct with {} fields",
                    items.len(),
                    fields.len()
                )));
            }
            let mut values = Vec::with_capacity(fields.len());
            for (i, field) in fields.iter().enumerate() {
                let value = match items.get(i) {
                    Some(item) => scalar_value(&format!("{}.{}", signal, field.name), field.data_type, item)?,
                    None => field.data_type.zero_value(),
                };
                values.push(FieldValue::new(field.name.clone(), value));
            }
            Ok(SignalValue::Struct(values))
        }
        (SignalType::Array { element, size }, Literal::List(items)) => {
            if items.len() > *size {
                return Err(invalid(format!(
                    "{} initializers for an array of {} elements",
                    items.len(),
                    size
                )));
            }
            let mut values = Vec::with_capacity(*size);
            for i in 0..*size {
                let value = match items.get(i) {
                    Some(item) => scalar_value(&format!("{}[{}]", signal, i), *element, item)?,
                    None => element.zero_value(),
                };
                values.push(value);
            }
            Ok(SignalValue::Array(values))
        }
        (_, _) => Err(invalid("aggregate signal needs a braced initializer".to_string())),
    }
}

fn scalar_value(signal: &str, data_type: DataType, literal: &Literal) -> Result<SignalValue> {
    let invalid = |reason: String| SignalError::InvalidValue {
        signal: signal.to_string(),
        reason,
    };

    let value = match literal {
        Literal::List(_) => return Err(invalid("nested braces are not supported".to_string())),
        Literal::Bool(b) => match data_type {
            DataType::Bool => SignalValue::Boolean(*b),
            _ => SignalValue::Unsigned(u64::from(*b)),
        },
        Literal::Char(c) => match data_type {
            DataType::Char => SignalValue::Char(*c),
            _ => SignalValue::Unsigned(*c as u64),
        },
        Literal::Number(text) => match data_type {
            DataType::Bool => match parse_integer(text) {
                Some(0) => SignalValue::Boolean(false),
                Some(1) => SignalValue::Boolean(true),
                _ => return Err(invalid(format!("'{}' is not a boolean", text))),
            },
            DataType::Char => match parse_integer(text).and_then(|n| u8::try_from(n).ok()) {
                Some(code) => SignalValue::Char(code as char),
                None => return Err(invalid(format!("'{}' is not a character code", text))),
            },
            DataType::Float32 | DataType::Float64 => match parse_float(text) {
                Some(v) => SignalValue::Float(v),
                None => return Err(invalid(format!("'{}' is not a number", text))),
            },
            _ => match parse_integer(text) {
                Some(v) if v < 0 => SignalValue::Signed(v as i64),
                Some(v) => SignalValue::Unsigned(v as u64),
                None => return Err(invalid(format!("'{}' is not an integer", text))),
            },
        },
    };

    data_type.coerce(signal, &value)
}

/// Parse a C integer literal (decimal, octal or hex, optional sign and u/l suffixes)
fn parse_integer(text: &str) -> Option<i128> {
    let (negative, body) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let body = body.trim_end_matches(['u', 'U', 'l', 'L']);
    let (digits, radix) = if let Some(hex) = body.strip_prefix("0x").or_else(|| body.strip_prefix("0X")) {
        (hex, 16)
    } else if body.len() > 1 && body.starts_with('0') {
        (&body[1..], 8)
    } else {
        (body, 10)
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }
    let magnitude = i128::from_str_radix(digits, radix).ok()?;
    if magnitude > u64::MAX as i128 {
        return None;
    }
    Some(if negative { -magnitude } else { magnitude })
}

/// Parse a C floating literal (optional `f` suffix) or an integer literal
fn parse_float(text: &str) -> Option<f64> {
    if let Some(v) = parse_integer(text) {
        return Some(v as f64);
    }
    let body = text.trim_end_matches(['f', 'F']);
    if !body.contains(['.', 'e', 'E']) {
        return None;
    }
    body.parse::<f64>().ok()
}

struct Parser<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            chars: text.chars().peekable(),
        }
    }

    fn at_end(&mut self) -> bool {
        self.chars.peek().is_none()
    }

    fn skip_whitespace(&mut self) {
        while self.chars.peek().is_some_and(|c| c.is_whitespace()) {
            self.chars.next();
        }
    }

    fn parse_literal(&mut self) -> std::result::Result<Literal, String> {
        self.skip_whitespace();
        match self.chars.peek().copied() {
            None => Err("empty initializer".to_string()),
            Some('{') => {
                self.chars.next();
                self.parse_list()
            }
            Some('\'') => {
                self.chars.next();
                self.parse_char()
            }
            Some(_) => self.parse_word(),
        }
    }

    fn parse_list(&mut self) -> std::result::Result<Literal, String> {
        let mut items = Vec::new();
        loop {
            self.skip_whitespace();
            if self.chars.peek() == Some(&'}') {
                self.chars.next();
                return Ok(Literal::List(items));
            }
            items.push(self.parse_literal()?);
            self.skip_whitespace();
            match self.chars.next() {
                Some(',') => continue,
                Some('}') => return Ok(Literal::List(items)),
                Some(c) => return Err(format!("expected ',' or '}}', found '{}'", c)),
                None => return Err("unterminated '{'".to_string()),
            }
        }
    }

    fn parse_char(&mut self) -> std::result::Result<Literal, String> {
        let c = match self.chars.next() {
            Some('\\') => match self.chars.next() {
                Some('0') => '\0',
                Some('n') => '\n',
                Some('t') => '\t',
                Some('r') => '\r',
                Some('\\') => '\\',
                Some('\'') => '\'',
                Some('x') => self.parse_hex_escape()?,
                Some(other) => return Err(format!("unsupported escape '\\{}'", other)),
                None => return Err("unterminated character literal".to_string()),
            },
            Some(c) => c,
            None => return Err("unterminated character literal".to_string()),
        };
        match self.chars.next() {
            Some('\'') => Ok(Literal::Char(c)),
            _ => Err("unterminated character literal".to_string()),
        }
    }

    /// Hex escape after `\x`: one or two hex digits
    fn parse_hex_escape(&mut self) -> std::result::Result<char, String> {
        let mut code = 0u32;
        let mut digits = 0;
        while digits < 2 {
            match self.chars.peek().and_then(|c| c.to_digit(16)) {
                Some(d) => {
                    code = code * 16 + d;
                    digits += 1;
                    self.chars.next();
                }
                None => break,
            }
        }
        if digits == 0 {
            return Err("'\\x' needs hex digits".to_string());
        }
        char::from_u32(code).ok_or_else(|| format!("invalid character code {}", code))
    }

    fn parse_word(&mut self) -> std::result::Result<Literal, String> {
        let mut word = String::new();
        while let Some(&c) = self.chars.peek() {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '+' | '_') {
                word.push(c);
                self.chars.next();
            } else {
                break;
            }
        }
        match word.as_str() {
            "" => Err(format!("unexpected character '{}'", self.chars.peek().copied().unwrap_or(' '))),
            "true" | "TRUE" => Ok(Literal::Bool(true)),
            "false" | "FALSE" => Ok(Literal::Bool(false)),
            _ => Ok(Literal::Number(word)),
        }
    }
}
