use pfsc_core::{Libpath, Range};
use pfsc_ids::Id;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Basic(pfsc_syntax::ast::BasicNodeType),
    /// An alternate supposition, targetable by `versus`.
    Supp,
    /// A node flagged `wolog` ("without loss of generality").
    Wolog,
    /// A node asserting the falsity of one or more `Supp` nodes.
    False,
}

/// A node, or a `Ghost` standing in for a node defined natively in another
/// deduction (created when an expansion targets a node that belongs to a
/// deduction outside the expansion's own native tree).
#[derive(Debug, Clone)]
pub enum Node {
    Real(RealNode),
    Ghost {
        libpath: Libpath,
        /// The libpath of the real node this ghost represents.
        points_to: Libpath,
        origin: Option<Libpath>,
    },
}

#[derive(Debug, Clone)]
pub struct RealNode {
    pub libpath: Libpath,
    pub kind: NodeKind,
    pub versus: Vec<Libpath>,
    pub contra: Vec<Libpath>,
    pub children: Vec<DeducChild>,
    pub origin: Option<Libpath>,
    pub range: Range,
}

impl Node {
    pub fn libpath(&self) -> &Libpath {
        match self {
            Node::Real(n) => &n.libpath,
            Node::Ghost { libpath, .. } => libpath,
        }
    }

    pub fn is_ghost(&self) -> bool {
        matches!(self, Node::Ghost { .. })
    }

    pub fn origin(&self) -> Option<&Libpath> {
        match self {
            Node::Real(n) => n.origin.as_ref(),
            Node::Ghost { origin, .. } => origin.as_ref(),
        }
    }

    pub fn set_origin(&mut self, origin: Libpath) {
        match self {
            Node::Real(n) => n.origin = Some(origin),
            Node::Ghost { origin: o, .. } => *o = Some(origin),
        }
    }
}

pub type NodeId = Id<Node>;

/// A child of a deduction or node: either a further node, or a nested
/// sub-deduction.
#[derive(Debug, Clone, Copy)]
pub enum DeducChild {
    Node(NodeId),
    SubDeduc(super::deduction::SubDeducId),
}
