//! The extended-JSON literal grammar used for the right-hand side of
//! assignments and `defn` values: ordinary JSON plus single-quoted and
//! multiline (triple-quoted) strings, unquoted identifier object keys, and
//! Python/JS spellings of booleans and null.

use indexmap::IndexMap;
use pfsc_core::{PECode, PfscError};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum JsonValue {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<JsonValue>),
    Object(IndexMap<String, JsonValue>),
}

impl fmt::Display for JsonValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JsonValue::Null => write!(f, "null"),
            JsonValue::Bool(b) => write!(f, "{b}"),
            JsonValue::Number(n) => write!(f, "{n}"),
            JsonValue::String(s) => write!(f, "{s:?}"),
            JsonValue::Array(items) => {
                write!(f, "[")?;
                for (i, v) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, "]")
            }
            JsonValue::Object(map) => {
                write!(f, "{{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k:?}: {v}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl JsonValue {
    /// Converts to a plain `serde_json::Value`, for handing widget/defn/
    /// assignment data to a JSON-backed write layer.
    pub fn to_serde_json(&self) -> serde_json::Value {
        match self {
            JsonValue::Null => serde_json::Value::Null,
            JsonValue::Bool(b) => serde_json::Value::Bool(*b),
            JsonValue::Number(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            JsonValue::String(s) => serde_json::Value::String(s.clone()),
            JsonValue::Array(items) => {
                serde_json::Value::Array(items.iter().map(JsonValue::to_serde_json).collect())
            }
            JsonValue::Object(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_serde_json())).collect(),
            ),
        }
    }
}

pub fn parse_value(text: &str) -> Result<JsonValue, PfscError> {
    let mut p = ValueParser { chars: text.chars().collect(), pos: 0 };
    p.skip_ws();
    let v = p.parse_value()?;
    p.skip_ws();
    if p.pos != p.chars.len() {
        return Err(parse_err(format!("trailing content after value at offset {}", p.pos)));
    }
    Ok(v)
}

fn parse_err(msg: impl Into<String>) -> PfscError {
    PfscError::new(PECode::ParsingError, msg)
}

struct ValueParser {
    chars: Vec<char>,
    pos: usize,
}

impl ValueParser {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, c: char) -> Result<(), PfscError> {
        if self.peek() == Some(c) {
            self.pos += 1;
            Ok(())
        } else {
            Err(parse_err(format!("expected {c:?} at offset {}", self.pos)))
        }
    }

    fn starts_with(&self, lit: &str) -> bool {
        let rest: String = self.chars[self.pos..].iter().take(lit.chars().count()).collect();
        rest == lit
    }

    fn parse_value(&mut self) -> Result<JsonValue, PfscError> {
        self.skip_ws();
        match self.peek() {
            Some('{') => self.parse_object(),
            Some('[') => self.parse_array(),
            Some('\'') | Some('"') => self.parse_string().map(JsonValue::String),
            Some(c) if c == '-' || c.is_ascii_digit() => self.parse_number(),
            Some(_) => self.parse_keyword_or_ident(),
            None => Err(parse_err("unexpected end of input while parsing value")),
        }
    }

    fn parse_object(&mut self) -> Result<JsonValue, PfscError> {
        self.expect('{')?;
        let mut map = IndexMap::new();
        self.skip_ws();
        if self.peek() == Some('}') {
            self.pos += 1;
            return Ok(JsonValue::Object(map));
        }
        loop {
            self.skip_ws();
            let key = self.parse_key()?;
            self.skip_ws();
            self.expect(':')?;
            let value = self.parse_value()?;
            map.insert(key, value);
            self.skip_ws();
            match self.peek() {
                Some(',') => {
                    self.pos += 1;
                    self.skip_ws();
                    if self.peek() == Some('}') {
                        self.pos += 1;
                        break;
                    }
                }
                Some('}') => {
                    self.pos += 1;
                    break;
                }
                _ => return Err(parse_err(format!("expected ',' or '}}' at offset {}", self.pos))),
            }
        }
        Ok(JsonValue::Object(map))
    }

    fn parse_array(&mut self) -> Result<JsonValue, PfscError> {
        self.expect('[')?;
        let mut items = Vec::new();
        self.skip_ws();
        if self.peek() == Some(']') {
            self.pos += 1;
            return Ok(JsonValue::Array(items));
        }
        loop {
            let value = self.parse_value()?;
            items.push(value);
            self.skip_ws();
            match self.peek() {
                Some(',') => {
                    self.pos += 1;
                    self.skip_ws();
                    if self.peek() == Some(']') {
                        self.pos += 1;
                        break;
                    }
                }
                Some(']') => {
                    self.pos += 1;
                    break;
                }
                _ => return Err(parse_err(format!("expected ',' or ']' at offset {}", self.pos))),
            }
        }
        Ok(JsonValue::Array(items))
    }

    /// An unquoted identifier key, or a quoted string key.
    fn parse_key(&mut self) -> Result<String, PfscError> {
        match self.peek() {
            Some('\'') | Some('"') => self.parse_string(),
            Some(c) if c.is_alphabetic() || c == '_' => {
                let start = self.pos;
                while matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '_') {
                    self.pos += 1;
                }
                Ok(self.chars[start..self.pos].iter().collect())
            }
            _ => Err(parse_err(format!("expected object key at offset {}", self.pos))),
        }
    }

    fn parse_string(&mut self) -> Result<String, PfscError> {
        let quote = self.bump().expect("caller checked");
        let triple = self.peek() == Some(quote)
            && self.chars.get(self.pos + 1) == Some(&quote);
        if triple {
            self.pos += 2;
            let start = self.pos;
            loop {
                if self.peek() == Some(quote)
                    && self.chars.get(self.pos + 1) == Some(&quote)
                    && self.chars.get(self.pos + 2) == Some(&quote)
                {
                    let s: String = self.chars[start..self.pos].iter().collect();
                    self.pos += 3;
                    return Ok(s);
                }
                if self.bump().is_none() {
                    return Err(parse_err("unterminated triple-quoted string"));
                }
            }
        }
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(parse_err("unterminated string literal")),
                Some(c) if c == quote => return Ok(out),
                Some('\\') => {
                    let esc = self.bump().ok_or_else(|| parse_err("unterminated escape"))?;
                    out.push(match esc {
                        'n' => '\n',
                        't' => '\t',
                        'r' => '\r',
                        other => other,
                    });
                }
                Some(c) => out.push(c),
            }
        }
    }

    fn parse_number(&mut self) -> Result<JsonValue, PfscError> {
        let start = self.pos;
        if self.peek() == Some('-') {
            self.pos += 1;
        }
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.pos += 1;
        }
        if self.peek() == Some('.') {
            self.pos += 1;
            while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                self.pos += 1;
            }
        }
        if matches!(self.peek(), Some('e') | Some('E')) {
            self.pos += 1;
            if matches!(self.peek(), Some('+') | Some('-')) {
                self.pos += 1;
            }
            while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                self.pos += 1;
            }
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        text.parse::<f64>()
            .map(JsonValue::Number)
            .map_err(|e| parse_err(format!("invalid number {text:?}: {e}")))
    }

    fn parse_keyword_or_ident(&mut self) -> Result<JsonValue, PfscError> {
        for (lit, value) in [
            ("true", JsonValue::Bool(true)),
            ("True", JsonValue::Bool(true)),
            ("false", JsonValue::Bool(false)),
            ("False", JsonValue::Bool(false)),
            ("null", JsonValue::Null),
            ("None", JsonValue::Null),
            ("undefined", JsonValue::Null),
        ] {
            if self.starts_with(lit) {
                self.pos += lit.chars().count();
                return Ok(value);
            }
        }
        Err(parse_err(format!("unexpected token at offset {}", self.pos)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_object_with_unquoted_keys_and_python_booleans() {
        let v = parse_value("{ name: 'Thm', proved: True, extras: None }").unwrap();
        match v {
            JsonValue::Object(map) => {
                assert_eq!(map.get("name"), Some(&JsonValue::String("Thm".into())));
                assert_eq!(map.get("proved"), Some(&JsonValue::Bool(true)));
                assert_eq!(map.get("extras"), Some(&JsonValue::Null));
            }
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn parses_nested_array_and_numbers() {
        let v = parse_value("[1, 2.5, -3, [true, false]]").unwrap();
        match v {
            JsonValue::Array(items) => {
                assert_eq!(items.len(), 4);
                assert_eq!(items[0], JsonValue::Number(1.0));
            }
            _ => panic!("expected array"),
        }
    }

    #[test]
    fn parses_triple_quoted_multiline_string() {
        let v = parse_value("\"\"\"line one\nline two\"\"\"").unwrap();
        assert_eq!(v, JsonValue::String("line one\nline two".to_string()));
    }
}
