use pfsc_core::{Libpath, Range};
use pfsc_ids::Id;

/// A widget embedded in an annotation's body, e.g. a goalbox or chart
/// widget, declared inline as `widget NAME = { ... }`.
#[derive(Debug, Clone)]
pub struct Widget {
    pub libpath: Libpath,
    pub name: String,
    pub data: pfsc_syntax::json_literal::JsonValue,
    /// The widget's own `"approvals"` field, if its data declares one.
    pub approvals: Option<String>,
    pub origin: Option<Libpath>,
}

#[derive(Debug, Clone)]
pub struct Annotation {
    pub libpath: Libpath,
    /// The `on` clause: nodes (or other entities) this annotation adds
    /// notes to.
    pub targets: Vec<Libpath>,
    /// The delimiter tag used in the source (`@@@TAG ... @@@TAG`).
    pub tag: String,
    /// The raw markdown/HTML body, as cut out by the block chunker.
    pub body: String,
    pub widgets: Vec<Widget>,
    pub range: Range,
}

pub type AnnoId = Id<Annotation>;

#[derive(Debug, Clone)]
pub struct Definition {
    pub libpath: Libpath,
    pub lhs: pfsc_syntax::json_literal::JsonValue,
    pub rhs: pfsc_syntax::json_literal::JsonValue,
}

pub type DefnId = Id<Definition>;

#[derive(Debug, Clone)]
pub struct Assignment {
    pub libpath: Libpath,
    pub value: pfsc_syntax::json_literal::JsonValue,
}

pub type AsgnId = Id<Assignment>;
