//! Strips `#`-to-end-of-line comments while leaving string literals
//! (single- and triple-quoted, `'` or `"`) untouched, and without changing
//! the line count of the text — every newline that is consumed is also
//! re-emitted, so line numbers reported against the stripped text still
//! line up with the chunked source.

#[derive(Clone, Copy, PartialEq, Eq)]
enum State {
    Normal,
    Comment,
    Single(char),
    Triple(char),
}

pub fn strip_comments(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut state = State::Normal;
    let mut i = 0usize;

    while i < chars.len() {
        let c = chars[i];
        match state {
            State::Normal => match c {
                '#' => state = State::Comment,
                '\'' | '"' => {
                    if chars.get(i + 1) == Some(&c) && chars.get(i + 2) == Some(&c) {
                        out.push(c);
                        out.push(c);
                        out.push(c);
                        i += 3;
                        state = State::Triple(c);
                        continue;
                    }
                    out.push(c);
                    state = State::Single(c);
                }
                _ => out.push(c),
            },
            State::Comment => {
                if c == '\n' {
                    out.push('\n');
                    state = State::Normal;
                }
                // else: consume silently
            }
            State::Single(q) => {
                out.push(c);
                if c == q {
                    state = State::Normal;
                } else if c == '\\' {
                    if let Some(&next) = chars.get(i + 1) {
                        out.push(next);
                        i += 1;
                    }
                }
            }
            State::Triple(q) => {
                if c == q && chars.get(i + 1) == Some(&q) && chars.get(i + 2) == Some(&q) {
                    out.push(q);
                    out.push(q);
                    out.push(q);
                    i += 3;
                    state = State::Normal;
                    continue;
                }
                out.push(c);
            }
        }
        i += 1;
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_trailing_comment_preserving_newline() {
        let src = "x = 1 # a comment\ny = 2\n";
        let stripped = strip_comments(src);
        assert_eq!(stripped, "x = 1 \ny = 2\n");
        assert_eq!(stripped.lines().count(), src.lines().count());
    }

    #[test]
    fn hash_inside_string_is_preserved() {
        let src = "x = \"a # b\"\n";
        assert_eq!(strip_comments(src), src);
    }

    #[test]
    fn hash_inside_triple_quoted_string_is_preserved_across_lines() {
        let src = "x = \"\"\"line1 # not a comment\nline2\"\"\"\n# real comment\ny = 2\n";
        let stripped = strip_comments(src);
        assert!(stripped.contains("line1 # not a comment"));
        assert!(!stripped.contains("real comment"));
        assert_eq!(stripped.lines().count(), src.lines().count());
    }

    #[test]
    fn raw_latex_string_preserved_verbatim() {
        let src = "lhs = r\"$\\alpha$\"\n";
        assert_eq!(strip_comments(src), src);
    }
}
