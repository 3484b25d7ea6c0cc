use crate::node::DeducChild;
use pfsc_core::{Libpath, Range};
use pfsc_ids::Id;

/// A top-level deduction: a proof or construction that targets one or more
/// nodes (usually of a single other deduction) and whose own nodes either
/// assert, suppose, or cite material relevant to that target.
#[derive(Debug, Clone)]
pub struct Deduction {
    pub libpath: Libpath,
    pub targets: Vec<Libpath>,
    /// `with NAME = relpath` rigorous-definition aliases.
    pub rdefs: Vec<(String, Libpath)>,
    pub children: Vec<DeducChild>,
    pub range: Range,
    /// The libpath+major version at which this deduction first appeared,
    /// if it differs from its own libpath's module (i.e. it moved here
    /// from somewhere else across a release).
    pub origin: Option<Libpath>,
}

pub type DeducId = Id<Deduction>;

#[derive(Debug, Clone)]
pub struct SubDeduc {
    pub libpath: Libpath,
    pub children: Vec<DeducChild>,
    pub range: Range,
}

pub type SubDeducId = Id<SubDeduc>;

impl Deduction {
    /// The deduction this one natively targets, i.e. the owning deduction of
    /// its first target (targets are validated to all share one owner).
    pub fn target_deduc_libpath(&self) -> Option<Libpath> {
        self.targets.first().and_then(|t| t.parent())
    }
}
