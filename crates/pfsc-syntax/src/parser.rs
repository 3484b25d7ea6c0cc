//! Hand-written recursive-descent parser for the post-chunked,
//! comment-stripped module text.
//!
//! The grammar is small enough, and has few enough genuinely ambiguous
//! constructs, that a lossless lexer/parser split (as a `rowan`-style CST
//! would give) isn't needed here: the parser walks the character stream
//! directly, tracking line/column as it goes, and calls into
//! [`crate::json_literal`] to parse embedded value literals.

use crate::ast::*;
use crate::json_literal::{self, JsonValue};
use pfsc_core::{PECode, PfscError, Position, Range};

pub fn parse_module(text: &str) -> Result<Module, PfscError> {
    let mut p = Parser::new(text);
    p.skip_trivia();
    let mut items = Vec::new();
    while !p.at_eof() {
        items.push(p.parse_item()?);
        p.skip_trivia();
    }
    Ok(Module { items })
}

struct Parser<'a> {
    text: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        Parser { text, chars: text.chars().collect(), pos: 0 }
    }

    fn at_eof(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn position(&self) -> Position {
        let mut line = 1u32;
        let mut col = 1u32;
        for &c in &self.chars[..self.pos] {
            if c == '\n' {
                line += 1;
                col = 1;
            } else {
                col += 1;
            }
        }
        Position::new(line, col)
    }

    fn err(&self, msg: impl Into<String>) -> PfscError {
        let pos = self.position();
        PfscError::new(
            PECode::ParsingError,
            format!("at line {}: {}", pos.line, msg.into()),
        )
    }

    fn skip_trivia(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn starts_with_word(&self, word: &str) -> bool {
        let wlen = word.chars().count();
        if self.chars[self.pos..].len() < wlen {
            return false;
        }
        let slice: String = self.chars[self.pos..self.pos + wlen].iter().collect();
        if slice != word {
            return false;
        }
        // Must not be a prefix of a longer identifier.
        match self.peek_at(wlen) {
            Some(c) if c.is_alphanumeric() || c == '_' => false,
            _ => true,
        }
    }

    fn eat_keyword(&mut self, word: &str) -> bool {
        if self.starts_with_word(word) {
            self.pos += word.chars().count();
            self.skip_trivia();
            true
        } else {
            false
        }
    }

    fn expect_keyword(&mut self, word: &str) -> Result<(), PfscError> {
        if self.eat_keyword(word) {
            Ok(())
        } else {
            Err(self.err(format!("expected keyword {word:?}")))
        }
    }

    fn eat_char(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            self.skip_trivia();
            true
        } else {
            false
        }
    }

    fn expect_char(&mut self, c: char) -> Result<(), PfscError> {
        if self.eat_char(c) {
            Ok(())
        } else {
            Err(self.err(format!("expected {c:?}")))
        }
    }

    fn parse_ident(&mut self) -> Result<String, PfscError> {
        let start = self.pos;
        if !matches!(self.peek(), Some(c) if c.is_alphabetic() || c == '_') {
            return Err(self.err("expected identifier"));
        }
        while matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '_') {
            self.pos += 1;
        }
        let s: String = self.chars[start..self.pos].iter().collect();
        self.skip_trivia();
        Ok(s)
    }

    fn peek_ident(&self) -> Option<String> {
        let mut i = self.pos;
        if !matches!(self.chars.get(i), Some(c) if c.is_alphabetic() || *c == '_') {
            return None;
        }
        while matches!(self.chars.get(i), Some(c) if c.is_alphanumeric() || *c == '_') {
            i += 1;
        }
        Some(self.chars[self.pos..i].iter().collect())
    }

    /// identifier (`.` identifier)*
    fn parse_dotted_path(&mut self) -> Result<String, PfscError> {
        let mut parts = vec![self.parse_ident()?];
        while self.peek() == Some('.') && matches!(self.peek_at(1), Some(c) if c.is_alphabetic() || c == '_') {
            self.pos += 1;
            self.skip_trivia();
            parts.push(self.parse_ident()?);
        }
        Ok(parts.join("."))
    }

    /// Leading dots (`RELPREFIX`) followed by an optional dotted tail.
    fn parse_relpath(&mut self) -> Result<RelPath, PfscError> {
        let mut num_dots = 0u32;
        while self.peek() == Some('.') {
            num_dots += 1;
            self.pos += 1;
        }
        if num_dots == 0 {
            return Err(self.err("expected relative path"));
        }
        self.skip_trivia();
        let tail = if !self.starts_with_word("import")
            && matches!(self.peek(), Some(c) if c.is_alphabetic() || c == '_')
        {
            Some(self.parse_dotted_path()?)
        } else {
            None
        };
        Ok(RelPath { num_dots, tail })
    }

    fn parse_item(&mut self) -> Result<Item, PfscError> {
        if self.starts_with_word("import") {
            return self.parse_plain_import().map(Item::Import);
        }
        if self.starts_with_word("from") {
            return self.parse_from_import().map(Item::Import);
        }
        if self.starts_with_word("deduc") {
            self.expect_keyword("deduc")?;
            return self.parse_deduc().map(Item::Deduc);
        }
        if self.starts_with_word("anno") {
            self.expect_keyword("anno")?;
            return self.parse_anno().map(Item::Anno);
        }
        if self.starts_with_word("defn") {
            self.expect_keyword("defn")?;
            return self.parse_defn().map(Item::Defn);
        }
        // Otherwise: a top-level assignment `name = value`.
        self.parse_assignment().map(Item::Assignment)
    }

    fn parse_plain_import(&mut self) -> Result<ImportItem, PfscError> {
        let start = self.position();
        self.expect_keyword("import")?;
        let libpath = self.parse_dotted_path()?;
        let alias = if self.eat_keyword("as") {
            Some(self.parse_ident()?)
        } else {
            None
        };
        let end = self.position();
        Ok(ImportItem::Plain { libpath, alias, range: Range::new(start, end) })
    }

    fn parse_from_import(&mut self) -> Result<ImportItem, PfscError> {
        let start = self.position();
        self.expect_keyword("from")?;
        let rel = if self.peek() == Some('.') {
            self.parse_relpath()?
        } else {
            RelPath { num_dots: 0, tail: Some(self.parse_dotted_path()?) }
        };
        self.expect_keyword("import")?;
        let mut import_all = false;
        let mut names = Vec::new();
        if self.eat_char('*') {
            import_all = true;
        } else {
            loop {
                let name = self.parse_ident()?;
                let alias = if self.eat_keyword("as") {
                    Some(self.parse_ident()?)
                } else {
                    None
                };
                names.push((name, alias));
                if !self.eat_char(',') {
                    break;
                }
            }
        }
        let end = self.position();
        Ok(ImportItem::From { rel, import_all, names, range: Range::new(start, end) })
    }

    /// Scans a raw value-literal source slice starting at the current
    /// position: a balanced run of brackets/braces/quotes terminated by a
    /// top-level comma, closing brace/paren, or newline.
    fn scan_value_source(&mut self) -> Result<String, PfscError> {
        let start = self.pos;
        let mut depth = 0i32;
        loop {
            match self.peek() {
                None => break,
                Some('{') | Some('[') => {
                    depth += 1;
                    self.pos += 1;
                }
                Some('}') | Some(']') if depth > 0 => {
                    depth -= 1;
                    self.pos += 1;
                }
                Some('}') | Some(']') => break,
                Some(',') if depth == 0 => break,
                Some('\n') if depth == 0 => break,
                Some(q @ ('\'' | '"')) => {
                    self.pos += 1;
                    let triple =
                        self.peek() == Some(q) && self.peek_at(1) == Some(q);
                    if triple {
                        self.pos += 2;
                        loop {
                            match self.peek() {
                                None => return Err(self.err("unterminated string literal")),
                                Some(c) if c == q
                                    && self.peek_at(1) == Some(q)
                                    && self.peek_at(2) == Some(q) =>
                                {
                                    self.pos += 3;
                                    break;
                                }
                                _ => self.pos += 1,
                            }
                        }
                    } else {
                        loop {
                            match self.peek() {
                                None => return Err(self.err("unterminated string literal")),
                                Some('\\') => self.pos += 2,
                                Some(c) if c == q => {
                                    self.pos += 1;
                                    break;
                                }
                                _ => self.pos += 1,
                            }
                        }
                    }
                }
                Some(_) => self.pos += 1,
            }
        }
        Ok(self.chars[start..self.pos].iter().collect())
    }

    fn parse_value(&mut self) -> Result<JsonValue, PfscError> {
        let raw = self.scan_value_source()?;
        let value = json_literal::parse_value(raw.trim())?;
        self.skip_trivia();
        Ok(value)
    }

    fn parse_assignment(&mut self) -> Result<Assignment, PfscError> {
        let start = self.position();
        let lhs = self.parse_dotted_path()?;
        self.expect_char('=')?;
        let rhs = self.parse_value()?;
        let end = self.position();
        Ok(Assignment { lhs, rhs, range: Range::new(start, end) })
    }

    fn parse_defn(&mut self) -> Result<Defn, PfscError> {
        let start = self.position();
        let name = self.parse_ident()?;
        self.expect_char('=')?;
        let lhs_literal = self.parse_value()?;
        self.expect_char(',')?;
        let rhs_literal = self.parse_value()?;
        let end = self.position();
        Ok(Defn { name, lhs_literal, rhs_literal, range: Range::new(start, end) })
    }

    fn parse_libpath_list(&mut self) -> Result<Vec<String>, PfscError> {
        let mut out = vec![self.parse_dotted_path()?];
        while self.eat_char(',') {
            out.push(self.parse_dotted_path()?);
        }
        Ok(out)
    }

    fn parse_deduc(&mut self) -> Result<Deduc, PfscError> {
        let start = self.position();
        let name = self.parse_ident()?;
        let mut targets = Vec::new();
        let mut rdefs = Vec::new();
        if self.eat_keyword("of") {
            targets = self.parse_libpath_list()?;
        }
        if self.eat_keyword("with") {
            loop {
                let rname = self.parse_ident()?;
                self.expect_char('=')?;
                let rpath = self.parse_dotted_path()?;
                rdefs.push((rname, rpath));
                if !self.eat_char(',') {
                    break;
                }
            }
        }
        self.expect_char('{')?;
        let contents = self.parse_deduc_contents()?;
        self.expect_char('}')?;
        let end = self.position();
        Ok(Deduc { name, targets, rdefs, contents, range: Range::new(start, end) })
    }

    fn parse_deduc_contents(&mut self) -> Result<Vec<DeducItem>, PfscError> {
        let mut items = Vec::new();
        loop {
            self.skip_trivia();
            if self.peek() == Some('}') || self.at_eof() {
                break;
            }
            items.push(self.parse_deduc_item()?);
            self.skip_trivia();
        }
        Ok(items)
    }

    fn parse_deduc_item(&mut self) -> Result<DeducItem, PfscError> {
        if self.starts_with_word("subdeduc") {
            self.expect_keyword("subdeduc")?;
            return self.parse_subdeduc().map(DeducItem::SubDeduc);
        }
        if self.starts_with_word("defn") {
            self.expect_keyword("defn")?;
            return self.parse_defn().map(DeducItem::Defn);
        }
        if self.starts_with_word("supp") {
            return self.parse_node(NodeKind::Supp).map(DeducItem::Node);
        }
        if self.starts_with_word("wolog") {
            return self.parse_node(NodeKind::Wolog).map(DeducItem::Node);
        }
        if self.starts_with_word("flse") {
            return self.parse_node(NodeKind::False).map(DeducItem::Node);
        }
        if let Some(ident) = self.peek_ident() {
            if let Some(basic) = BasicNodeType::from_keyword(&ident) {
                return self
                    .parse_node(NodeKind::Basic(basic))
                    .map(DeducItem::Node);
            }
        }
        self.parse_assignment().map(DeducItem::Assignment)
    }

    fn parse_subdeduc(&mut self) -> Result<SubDeduc, PfscError> {
        let start = self.position();
        let name = self.parse_ident()?;
        self.expect_char('{')?;
        let contents = self.parse_deduc_contents()?;
        self.expect_char('}')?;
        let end = self.position();
        Ok(SubDeduc { name, contents, range: Range::new(start, end) })
    }

    fn parse_node(&mut self, kind: NodeKind) -> Result<NodeDecl, PfscError> {
        let start = self.position();
        // Consume the leading type keyword (it was only peeked, not eaten).
        let keyword = match kind {
            NodeKind::Basic(b) => match b {
                BasicNodeType::Asrt => "asrt",
                BasicNodeType::Cite => "cite",
                BasicNodeType::Exis => "exis",
                BasicNodeType::Intr => "intr",
                BasicNodeType::Mthd => "mthd",
                BasicNodeType::Rels => "rels",
                BasicNodeType::Univ => "univ",
                BasicNodeType::With => "with",
            },
            NodeKind::Supp => "supp",
            NodeKind::Wolog => "wolog",
            NodeKind::False => "flse",
        };
        self.expect_keyword(keyword)?;
        let name = self.parse_ident()?;
        let mut versus = Vec::new();
        let mut contra = Vec::new();
        if kind == NodeKind::Supp && self.eat_keyword("versus") {
            versus = self.parse_libpath_list()?;
        }
        if kind == NodeKind::False && self.eat_keyword("contra") {
            contra = self.parse_libpath_list()?;
        }
        self.expect_char('{')?;
        let contents = self.parse_deduc_contents()?;
        self.expect_char('}')?;
        let end = self.position();
        Ok(NodeDecl { kind, name, versus, contra, contents, range: Range::new(start, end) })
    }

    /// The body of an `anno` block has already been cut out by the block
    /// chunker and replaced with a stub `@@@TAG ... @@@TAG`; the parser only
    /// needs to record the tag so the real body text can be looked back up
    /// by name.
    fn parse_anno(&mut self) -> Result<Anno, PfscError> {
        let start = self.position();
        let name = self.parse_ident()?;
        let mut targets = Vec::new();
        if self.eat_keyword("on") {
            targets = self.parse_libpath_list()?;
        }
        if !self.starts_with("@@@") {
            return Err(self.err("expected annotation body delimiter '@@@TAG'"));
        }
        self.pos += 3;
        let tag_start = self.pos;
        let mut count = 0;
        while count < 8 && matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '_') {
            self.pos += 1;
            count += 1;
        }
        let tag: String = self.chars[tag_start..self.pos].iter().collect();
        self.skip_trivia();
        // Skip the stub body until the matching closing delimiter.
        let closing = format!("@@@{tag}");
        loop {
            if self.starts_with(&closing) {
                self.pos += closing.chars().count();
                break;
            }
            if self.at_eof() {
                return Err(self.err(format!("unterminated annotation body for tag {tag:?}")));
            }
            self.pos += 1;
        }
        self.skip_trivia();
        let end = self.position();
        Ok(Anno { name, targets, tag, range: Range::new(start, end) })
    }

    fn starts_with(&self, lit: &str) -> bool {
        let n = lit.chars().count();
        if self.chars[self.pos..].len() < n {
            return false;
        }
        self.chars[self.pos..self.pos + n].iter().collect::<String>() == lit
    }
}

/// Remap a `at line N` substring produced by a [`PfscError`] against
/// chunked/stripped text back to the corresponding line in the original
/// source.
pub fn remap_error_line(err: PfscError, map_line: impl Fn(u32) -> u32) -> PfscError {
    match err {
        PfscError::Coded { code, message } => {
            let remapped = remap_line_in_message(&message, map_line);
            PfscError::Coded { code, message: remapped }
        }
        other => other,
    }
}

fn remap_line_in_message(message: &str, map_line: impl Fn(u32) -> u32) -> String {
    if let Some(idx) = message.find("at line ") {
        let rest = &message[idx + "at line ".len()..];
        let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
        if let Ok(n) = digits.parse::<u32>() {
            let mapped = map_line(n);
            let mut out = String::new();
            out.push_str(&message[..idx]);
            out.push_str(&format!("at line {mapped}"));
            out.push_str(&rest[digits.len()..]);
            return out;
        }
    }
    message.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_and_from_imports() {
        let m = parse_module("import test.foo.bar as bar\nfrom . import Thing\n").unwrap();
        assert_eq!(m.items.len(), 2);
    }

    #[test]
    fn parses_deduc_with_target_and_node() {
        let src = "deduc Pf of Thm.C {\n  asrt A {\n  }\n}\n";
        let m = parse_module(src).unwrap();
        match &m.items[0] {
            Item::Deduc(d) => {
                assert_eq!(d.name, "Pf");
                assert_eq!(d.targets, vec!["Thm.C".to_string()]);
                assert_eq!(d.contents.len(), 1);
            }
            _ => panic!("expected deduc"),
        }
    }

    #[test]
    fn parses_top_level_assignment_with_object_literal() {
        let src = "dependencies = { 'test.other.repo': 'v1.0.0' }\n";
        let m = parse_module(src).unwrap();
        match &m.items[0] {
            Item::Assignment(a) => assert_eq!(a.lhs, "dependencies"),
            _ => panic!("expected assignment"),
        }
    }

    #[test]
    fn target_of_nonexistent_member_still_parses_two_targets() {
        let src = "deduc Pf of Thm1.C, Thm2.C {\n}\n";
        let m = parse_module(src).unwrap();
        match &m.items[0] {
            Item::Deduc(d) => assert_eq!(d.targets.len(), 2),
            _ => panic!("expected deduc"),
        }
    }
}
