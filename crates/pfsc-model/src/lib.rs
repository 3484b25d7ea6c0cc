//! The object model: the typed, name-resolved tree a module's source parses
//! into, plus the validation and rendering passes that run over it before
//! the result is handed to the indexer.

pub mod annotation;
pub mod dashgraph;
pub mod deduction;
pub mod module;
pub mod node;
pub mod resolve;
pub mod util;
pub mod visitor;

pub use annotation::{Annotation, AnnoId, Assignment, AsgnId, Definition, DefnId, Widget};
pub use deduction::{Deduction, DeducId, SubDeduc, SubDeducId};
pub use module::{build_module_from_parsed, ItemRef, Module};
pub use node::{DeducChild, Node, NodeId, NodeKind, RealNode};
pub use resolve::resolve_objects;
pub use visitor::{recursive_item_visit, ItemVisitor};
