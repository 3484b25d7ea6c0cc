//! Lexing and parsing of proof-module source text.
//!
//! Parsing is a three-stage pipeline, matching the original module loader:
//! 1. [`block_chunker`] isolates annotation bodies so the structural grammar
//!    never has to parse embedded markdown/HTML.
//! 2. [`comment_stripper`] removes `#`-to-end-of-line comments while leaving
//!    string literals untouched, preserving the line count.
//! 3. [`parser`] walks the resulting text with a recursive-descent parser.
//!
//! Parse error line numbers are reported against the post-chunk text and
//! then mapped back to the true source line before being returned.

pub mod ast;
pub mod block_chunker;
pub mod comment_stripper;
pub mod json_literal;
pub mod parser;
pub mod widgets;

use block_chunker::BlockChunker;
use pfsc_core::PfscError;

/// The result of parsing a module: the AST plus the annotation bodies that
/// were cut out of the structural grammar, keyed by annotation name.
#[derive(Debug, Clone)]
pub struct ParsedModule {
    pub ast: ast::Module,
    pub anno_bodies: Vec<block_chunker::AnnoBlock>,
}

pub fn parse_module_text(text: &str) -> Result<ParsedModule, PfscError> {
    let bc = BlockChunker::chunk(text);
    let stripped = comment_stripper::strip_comments(&bc.modified_text);

    let ast = parser::parse_module(&stripped).map_err(|e| {
        parser::remap_error_line(e, |line| bc.map_line_to_orig(line))
    })?;

    Ok(ParsedModule { ast, anno_bodies: bc.blocks })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_module_with_annotation_and_deduc() {
        let src = "\
import test.foo.bar as bar

anno Intro @@@md
# not a comment, this is markdown
Some *intro* text.
@@@md

deduc Pf of Thm.C {
    asrt A {
    }
}
";
        let parsed = parse_module_text(src).unwrap();
        assert_eq!(parsed.anno_bodies.len(), 1);
        assert!(parsed.anno_bodies[0].body.contains("intro"));
        assert_eq!(parsed.ast.items.len(), 3);
    }

    #[test]
    fn parse_error_line_is_remapped_through_chunker() {
        let src = "import a.b\n\nanno X @@@t\nbody line one\nbody line two\n@@@t\n\ndeduc !!! {}\n";
        let err = parse_module_text(src).unwrap_err();
        let msg = err.to_string();
        // The malformed `deduc` line is line 8 in the original source, even
        // though the cut annotation body shifts it to line 5 in the
        // chunked/stripped text the parser actually sees.
        assert!(msg.contains("line 8"), "message was: {msg}");
    }
}
