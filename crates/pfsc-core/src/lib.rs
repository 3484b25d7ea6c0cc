//! Core shared types for the proof-module build pipeline.
//!
//! This crate is intentionally small and dependency-light: it holds the
//! primitives every other crate in the workspace needs (source positions,
//! the `Libpath`/`Version` data model, and the error taxonomy) without
//! pulling in parsing, caching, or I/O concerns.

mod error;
mod libpath;
mod version;

pub use error::{PECode, PfscError, Result};
pub use libpath::Libpath;
pub use version::{Version, INF_TAG, WIP_TAG};

/// A position in a text document expressed as (1-based line, 1-based column).
///
/// Proof-module source errors are reported in these terms, matching the
/// original parser's line/column convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    #[inline]
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

/// A half-open source range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    #[inline]
    pub const fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }
}
