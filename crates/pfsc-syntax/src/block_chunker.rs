//! Isolates annotation bodies (`anno Name ... @@@TAG ... @@@TAG`) from the
//! structural grammar, so the parser never has to understand embedded
//! markdown/HTML. Bodies are cut out and replaced with a short stub; the
//! cut is recorded so a line number reported against the stubbed text can be
//! mapped back to the corresponding line in the original source.
//!
//! Rust's `regex` crate has no backreferences, so unlike the original
//! single-regex split (`@@@(\w{,8})(\s.*?)@@@\3`), the matching close
//! delimiter is located by a literal scan for `@@@` + the same tag text.

use regex::Regex;

#[derive(Debug, Clone)]
pub struct AnnoBlock {
    pub name: String,
    pub tag: String,
    pub body: String,
}

#[derive(Debug, Clone, Default)]
pub struct BlockChunker {
    /// The source text with annotation bodies replaced by stubs.
    pub modified_text: String,
    pub blocks: Vec<AnnoBlock>,
    /// (line number in `modified_text`, lines cut at that point)
    line_mapping: Vec<(u32, u32)>,
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

impl BlockChunker {
    pub fn chunk(text: &str) -> BlockChunker {
        let anno_re = Regex::new(r"anno\s+([A-Za-z]\w*)").expect("static regex");
        let mut out = String::new();
        let mut blocks = Vec::new();
        let mut line_mapping = Vec::new();
        let mut pos = 0usize;

        loop {
            let Some(m) = anno_re.find_at(text, pos) else {
                out.push_str(&text[pos..]);
                break;
            };
            let Some(at_rel) = text[m.end()..].find("@@@") else {
                out.push_str(&text[pos..]);
                break;
            };
            let at_idx = m.end() + at_rel;
            // Copy everything up to (and not including) the opening `@@@`
            // verbatim: this is the "anno Name ..." preamble.
            out.push_str(&text[pos..at_idx]);

            let caps = anno_re.captures(&text[m.start()..m.end()]).expect("matched above");
            let name = caps.get(1).expect("anno name group").as_str().to_string();

            let tag_start = at_idx + 3;
            let bytes = text.as_bytes();
            let mut tag_end = tag_start;
            while tag_end < text.len() && tag_end - tag_start < 8 && is_word_byte(bytes[tag_end]) {
                tag_end += 1;
            }
            let tag = text[tag_start..tag_end].to_string();
            let closing = format!("@@@{tag}");

            let Some(close_rel) = text[tag_end..].find(closing.as_str()) else {
                // Unterminated annotation block: leave the rest untouched so
                // the parser can report a sensible error against it.
                out.push_str(&text[at_idx..]);
                break;
            };
            let body_start = tag_end;
            let body_end = tag_end + close_rel;
            let body = text[body_start..body_end].to_string();

            let cut_lines = body.matches('\n').count() as u32;
            let current_out_line = 1 + out.matches('\n').count() as u32;
            if cut_lines > 0 {
                line_mapping.push((current_out_line, cut_lines));
            }

            out.push_str("@@@");
            out.push_str(&tag);
            out.push_str(" \u{2026} ");
            out.push_str("@@@");
            out.push_str(&tag);

            blocks.push(AnnoBlock { name, tag, body });
            pos = body_end + closing.len();
            if pos >= text.len() {
                break;
            }
        }

        BlockChunker { modified_text: out, blocks, line_mapping }
    }

    /// Map a 1-based line number in `modified_text` back to the corresponding
    /// line number in the original, pre-chunked source.
    pub fn map_line_to_orig(&self, modified_line: u32) -> u32 {
        let mut shift = 0u32;
        for (at_line, cut) in &self.line_mapping {
            if *at_line <= modified_line {
                shift += cut;
            }
        }
        modified_line + shift
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn isolates_single_block_and_preserves_surrounding_lines() {
        let src = "import a.b\n\nanno Foo @@@md\nsome *markdown*\nmore text\n@@@md\n\ndeduc X of Y.C {}\n";
        let bc = BlockChunker::chunk(src);
        assert_eq!(bc.blocks.len(), 1);
        assert_eq!(bc.blocks[0].name, "Foo");
        assert_eq!(bc.blocks[0].tag, "md");
        assert!(bc.blocks[0].body.contains("markdown"));
        assert!(!bc.modified_text.contains("markdown"));
        // Two lines of body were cut.
        let last_line = bc.modified_text.lines().last().unwrap();
        assert_eq!(last_line, "deduc X of Y.C {}");
    }

    #[test]
    fn line_mapping_accounts_for_cut_body_lines() {
        let src = "a\nanno X @@@t\nL1\nL2\nL3\n@@@t\nafter\n";
        let bc = BlockChunker::chunk(src);
        // "after" sits on line 4 of the modified text (a / anno-stub / after)
        // but on line 7 of the original.
        let modified_line_of_after = bc
            .modified_text
            .lines()
            .position(|l| l == "after")
            .unwrap() as u32
            + 1;
        assert_eq!(bc.map_line_to_orig(modified_line_of_after), 7);
    }
}
