//! Extraction of inline `widget` declarations from an annotation body.
//!
//! An embedded widget uses the same "name = value" shape as a module-level
//! assignment, with an extended-JSON object literal as the value:
//! `widget NAME = { ... }`. Widget data often embeds free text containing
//! unmatched braces (an `"answer"` field quoting `{`, for instance), so the
//! closing brace is located by a quote-aware scan rather than a naive
//! first-`}` match.

use crate::json_literal::{self, JsonValue};
use pfsc_core::{PECode, PfscError};

#[derive(Debug, Clone, PartialEq)]
pub struct WidgetDecl {
    pub name: String,
    pub data: JsonValue,
}

/// Scans `body` for every `widget NAME = { ... }` declaration, in the order
/// they appear.
pub fn scan_widgets(body: &str) -> Result<Vec<WidgetDecl>, PfscError> {
    let chars: Vec<char> = body.chars().collect();
    let mut out = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        if !starts_with_word(&chars, i, "widget") {
            i += 1;
            continue;
        }
        let mut j = skip_ws(&chars, i + "widget".len());
        let name_start = j;
        while j < chars.len() && (chars[j].is_alphanumeric() || chars[j] == '_') {
            j += 1;
        }
        if j == name_start {
            i += 1;
            continue;
        }
        let name: String = chars[name_start..j].iter().collect();
        j = skip_ws(&chars, j);
        if chars.get(j) != Some(&'=') {
            i = j;
            continue;
        }
        j = skip_ws(&chars, j + 1);
        if chars.get(j) != Some(&'{') {
            return Err(parse_err(format!("widget {name:?} must be assigned an object literal")));
        }
        let end = find_matching_brace(&chars, j)?;
        let literal: String = chars[j..=end].iter().collect();
        let data = json_literal::parse_value(&literal)?;
        out.push(WidgetDecl { name, data });
        i = end + 1;
    }
    Ok(out)
}

fn parse_err(msg: impl Into<String>) -> PfscError {
    PfscError::new(PECode::ParsingError, msg)
}

fn starts_with_word(chars: &[char], pos: usize, word: &str) -> bool {
    let wchars: Vec<char> = word.chars().collect();
    if pos + wchars.len() > chars.len() || chars[pos..pos + wchars.len()] != wchars[..] {
        return false;
    }
    let before_ok = pos == 0 || !is_ident_char(chars[pos - 1]);
    let after = pos + wchars.len();
    let after_ok = after == chars.len() || !is_ident_char(chars[after]);
    before_ok && after_ok
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn skip_ws(chars: &[char], mut pos: usize) -> usize {
    while pos < chars.len() && chars[pos].is_whitespace() {
        pos += 1;
    }
    pos
}

/// Finds the index of the `}` matching the `{` at `open`, skipping over
/// brace characters inside single-, double-, or triple-quoted strings.
fn find_matching_brace(chars: &[char], open: usize) -> Result<usize, PfscError> {
    let mut depth = 0i32;
    let mut i = open;
    while i < chars.len() {
        match chars[i] {
            '{' => {
                depth += 1;
                i += 1;
            }
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(i);
                }
                i += 1;
            }
            '\'' | '"' => {
                let quote = chars[i];
                let triple = chars.get(i + 1) == Some(&quote) && chars.get(i + 2) == Some(&quote);
                if triple {
                    i += 3;
                    while i < chars.len()
                        && !(chars[i] == quote
                            && chars.get(i + 1) == Some(&quote)
                            && chars.get(i + 2) == Some(&quote))
                    {
                        i += 1;
                    }
                    i += 3;
                } else {
                    i += 1;
                    while i < chars.len() && chars[i] != quote {
                        if chars[i] == '\\' {
                            i += 1;
                        }
                        i += 1;
                    }
                    i += 1;
                }
            }
            _ => i += 1,
        }
    }
    Err(parse_err("unterminated widget data (missing closing '}')"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scans_a_single_widget_declaration() {
        let body = "Some notes.\n\nwidget w1 = { type: 'CHART', data: 'x' }\n\nMore text.";
        let widgets = scan_widgets(body).unwrap();
        assert_eq!(widgets.len(), 1);
        assert_eq!(widgets[0].name, "w1");
        match &widgets[0].data {
            JsonValue::Object(map) => assert_eq!(map.get("type"), Some(&JsonValue::String("CHART".into()))),
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn tolerates_unmatched_braces_inside_string_data() {
        let body = r#"widget q1 = { answer: "look at ({) and (})" }"#;
        let widgets = scan_widgets(body).unwrap();
        assert_eq!(widgets.len(), 1);
        match &widgets[0].data {
            JsonValue::Object(map) => {
                assert_eq!(map.get("answer"), Some(&JsonValue::String("look at ({) and (})".into())));
            }
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn scans_multiple_widgets_in_one_body() {
        let body = "widget a = { n: 1 }\ntext between\nwidget b = { n: 2 }";
        let widgets = scan_widgets(body).unwrap();
        assert_eq!(widgets.len(), 2);
        assert_eq!(widgets[0].name, "a");
        assert_eq!(widgets[1].name, "b");
    }

    #[test]
    fn no_widgets_is_not_an_error() {
        assert_eq!(scan_widgets("just plain markdown text").unwrap(), Vec::new());
    }
}
