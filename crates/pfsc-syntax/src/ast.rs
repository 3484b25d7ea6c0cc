//! The raw abstract syntax tree produced by the parser. This is a thin,
//! mostly-string-keyed tree: names are resolved into libpaths and literal
//! values are resolved into `JsonValue`s one layer up, by the object model.

use crate::json_literal::JsonValue;
use pfsc_core::{Position, Range};

#[derive(Debug, Clone)]
pub struct Module {
    pub items: Vec<Item>,
}

#[derive(Debug, Clone)]
pub enum Item {
    Import(ImportItem),
    Assignment(Assignment),
    Defn(Defn),
    Deduc(Deduc),
    Anno(Anno),
}

#[derive(Debug, Clone)]
pub struct RelPath {
    /// Number of leading dots. One dot means "this module"; each additional
    /// dot chops one more trailing segment off the home path.
    pub num_dots: u32,
    /// The dotted path following the dots, if any (may be empty for a bare
    /// `from . import X`).
    pub tail: Option<String>,
}

#[derive(Debug, Clone)]
pub enum ImportItem {
    Plain {
        libpath: String,
        alias: Option<String>,
        range: Range,
    },
    From {
        rel: RelPath,
        /// `true` for `from X import *`.
        import_all: bool,
        names: Vec<(String, Option<String>)>,
        range: Range,
    },
}

#[derive(Debug, Clone)]
pub struct Assignment {
    pub lhs: String,
    pub rhs: JsonValue,
    pub range: Range,
}

#[derive(Debug, Clone)]
pub struct Defn {
    pub name: String,
    pub lhs_literal: JsonValue,
    pub rhs_literal: JsonValue,
    pub range: Range,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Basic(BasicNodeType),
    Supp,
    Wolog,
    False,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BasicNodeType {
    Asrt,
    Cite,
    Exis,
    Intr,
    Mthd,
    Rels,
    Univ,
    With,
}

impl BasicNodeType {
    pub fn from_keyword(s: &str) -> Option<Self> {
        Some(match s {
            "asrt" => Self::Asrt,
            "cite" => Self::Cite,
            "exis" => Self::Exis,
            "intr" => Self::Intr,
            "mthd" => Self::Mthd,
            "rels" => Self::Rels,
            "univ" => Self::Univ,
            "with" => Self::With,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NodeDecl {
    pub kind: NodeKind,
    pub name: String,
    /// `versus` targets for a `Supp` node (alternate suppositions).
    pub versus: Vec<String>,
    /// `contra` targets for a `False` node (contradicted supposition(s)).
    pub contra: Vec<String>,
    pub contents: Vec<DeducItem>,
    pub range: Range,
}

#[derive(Debug, Clone)]
pub struct SubDeduc {
    pub name: String,
    pub contents: Vec<DeducItem>,
    pub range: Range,
}

#[derive(Debug, Clone)]
pub enum DeducItem {
    Node(NodeDecl),
    SubDeduc(SubDeduc),
    Assignment(Assignment),
    Defn(Defn),
}

#[derive(Debug, Clone)]
pub struct Deduc {
    pub name: String,
    /// The `of` clause: libpaths this deduction targets.
    pub targets: Vec<String>,
    /// The `with` clause: `name = relpath` rigorous-definition aliases.
    pub rdefs: Vec<(String, String)>,
    pub contents: Vec<DeducItem>,
    pub range: Range,
}

#[derive(Debug, Clone)]
pub struct Anno {
    pub name: String,
    /// The `on` clause: libpaths this annotation targets (e.g. the nodes it
    /// adds notes to).
    pub targets: Vec<String>,
    pub tag: String,
    pub range: Range,
}

pub fn pos_at(line: u32, column: u32) -> Position {
    Position::new(line, column)
}
