//! `ModuleIndexInfo`: the accumulator a module build fills in as it walks
//! the object model, then runs through a fixed sequence of closure/validation
//! passes before handing the result to a [`crate::port::GraphWriter`].

use crate::error::IndexError;
use crate::graph::{Maj, INF_MAJ, WIP_MAJ};
use crate::port::GraphReader;
use indexmap::IndexMap;
use pfsc_core::Libpath;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locality {
    Here,
    Elsewhere,
    Nowhere,
}

#[derive(Debug, Clone)]
pub struct PendingNode {
    pub libpath: Libpath,
    pub node_type: String,
}

#[derive(Debug, Clone)]
pub struct PendingRelation {
    pub kind: crate::graph::EdgeKind,
    pub src: Libpath,
    pub dst: Libpath,
}

#[derive(Debug)]
pub struct ModuleIndexInfo {
    pub modpath: Libpath,
    /// Target major of this build; `WIP_MAJ` for a WIP build.
    pub major: Maj,
    /// The highest major version already indexed for this repo before this
    /// build, as computed by [`ModuleIndexInfo::compute_mm_closure`].
    pub current_maj_vers: Maj,

    pub pending_nodes: Vec<PendingNode>,
    pub pending_relations: Vec<PendingRelation>,

    /// Declared move intents: `src -> Some(dst)`, or `src -> None` for a
    /// voided (deleted) libpath.
    pub move_mapping: IndexMap<Libpath, Option<Libpath>>,

    pub v_cut: Vec<Libpath>,
    pub v_add: Vec<Libpath>,

    pub locality: HashMap<Libpath, Locality>,
    pub origins: HashMap<Libpath, (Libpath, Maj)>,

    phase_progress: HashMap<u32, (usize, usize)>,
}

impl ModuleIndexInfo {
    pub fn new(modpath: Libpath, major: Maj) -> Self {
        ModuleIndexInfo {
            modpath,
            major,
            current_maj_vers: WIP_MAJ,
            pending_nodes: Vec::new(),
            pending_relations: Vec::new(),
            move_mapping: IndexMap::new(),
            v_cut: Vec::new(),
            v_add: Vec::new(),
            locality: HashMap::new(),
            origins: HashMap::new(),
            phase_progress: HashMap::new(),
        }
    }

    pub fn add_deduc(&mut self, libpath: Libpath) {
        self.add_generic(libpath, "DEDUC");
    }

    pub fn add_anno(&mut self, libpath: Libpath) {
        self.add_generic(libpath, "ANNO");
    }

    pub fn add_submodule(&mut self, libpath: Libpath) {
        self.add_generic(libpath, "MODULE");
    }

    pub fn add_generic(&mut self, libpath: Libpath, node_type: &str) {
        self.pending_nodes.push(PendingNode { libpath, node_type: node_type.to_string() });
    }

    pub fn add_relation(&mut self, kind: crate::graph::EdgeKind, src: Libpath, dst: Libpath) {
        self.pending_relations.push(PendingRelation { kind, src, dst });
    }

    pub fn declare_move(&mut self, src: Libpath, dst: Option<Libpath>) {
        self.move_mapping.insert(src, dst);
    }

    /// Chase each declared move through any further moves of its
    /// destination, so `move_mapping` ends up mapping every source straight
    /// to its final destination (or `None` if voided anywhere along the
    /// chain). Also records the highest major version this repo has
    /// previously been built at, queried from the backing store.
    pub fn compute_mm_closure(&mut self, reader: &dyn GraphReader) -> Result<(), IndexError> {
        let repopath = self.modpath.repopath().unwrap_or_else(|| self.modpath.clone());
        self.current_maj_vers = reader.current_major_version(&repopath).unwrap_or(WIP_MAJ);

        let mut closed = IndexMap::new();
        for src in self.move_mapping.keys().cloned().collect::<Vec<_>>() {
            let mut current = src.clone();
            let mut visited = HashSet::new();
            visited.insert(current.clone());
            loop {
                match self.move_mapping.get(&current).cloned() {
                    Some(Some(next)) => {
                        if !visited.insert(next.clone()) {
                            return Err(IndexError::CyclicMove(src));
                        }
                        current = next;
                    }
                    Some(None) => {
                        closed.insert(src.clone(), None);
                        break;
                    }
                    None => {
                        closed.insert(src.clone(), Some(current));
                        break;
                    }
                }
            }
        }
        self.move_mapping = closed;
        Ok(())
    }

    /// Partition accumulated nodes into `V_cut` (existing live nodes being
    /// superseded: rebuilt in place, or the source of a move) and `V_add`
    /// (newly inserted libpaths), rejecting any attempt to define a libpath
    /// at a major lower than one it's already indexed at.
    pub fn cut_add_validate(&mut self, reader: &dyn GraphReader) -> Result<(), IndexError> {
        let mut cut = Vec::new();
        let mut add = Vec::new();
        for pending in &self.pending_nodes {
            if let Some(existing) = reader.find_live_node(&pending.libpath, self.effective_query_version()) {
                if self.major != WIP_MAJ && existing.major > self.major {
                    return Err(IndexError::RedefinitionAtLowerMajor {
                        libpath: pending.libpath.clone(),
                        existing: existing.major,
                        attempted: self.major,
                    });
                }
                cut.push(pending.libpath.clone());
            }
            add.push(pending.libpath.clone());
        }
        for src in self.move_mapping.keys() {
            if !cut.contains(src) {
                cut.push(src.clone());
            }
        }
        self.v_cut = cut;
        self.v_add = add;
        Ok(())
    }

    /// The version to query the store at when asking "what's there right
    /// now": the highest major already indexed for this repo, or `WIP_MAJ`
    /// itself for a WIP build (which only ever sees other WIP content).
    fn effective_query_version(&self) -> Maj {
        if self.major == WIP_MAJ {
            WIP_MAJ
        } else {
            self.current_maj_vers
        }
    }

    /// Classify every relation's target as `Here` (under this module's own
    /// subtree), `Elsewhere` (exists, but outside it), or `Nowhere` (doesn't
    /// resolve against either the pending set or the store).
    pub fn here_elsewhere_nowhere(&mut self, reader: &dyn GraphReader) {
        let pending_libpaths: HashSet<Libpath> =
            self.pending_nodes.iter().map(|n| n.libpath.clone()).collect();
        let targets: Vec<Libpath> =
            self.pending_relations.iter().map(|r| r.dst.clone()).collect();
        for target in targets {
            let locality = if self.modpath.is_prefix_of(&target) {
                Locality::Here
            } else if pending_libpaths.contains(&target)
                || reader.find_live_node(&target, self.effective_query_version()).is_some()
            {
                Locality::Elsewhere
            } else {
                Locality::Nowhere
            };
            self.locality.insert(target, locality);
        }
    }

    /// For each newly added node: if some move maps a predecessor onto it,
    /// inherit that predecessor's origin; otherwise the node originates here,
    /// at this build's major.
    pub fn compute_origins(&mut self, reader: &dyn GraphReader) {
        let mut moved_onto: HashMap<Libpath, Libpath> = HashMap::new();
        for (src, dst) in &self.move_mapping {
            if let Some(dst) = dst {
                moved_onto.insert(dst.clone(), src.clone());
            }
        }
        for libpath in self.v_add.clone() {
            let origin = moved_onto
                .get(&libpath)
                .and_then(|predecessor| reader.origin_of(predecessor))
                .unwrap_or_else(|| (libpath.clone(), self.major));
            self.origins.insert(libpath, origin);
        }
    }

    pub fn note_begin_indexing_phase(&mut self, phase: u32) {
        self.phase_progress.insert(phase, (0, 0));
        tracing::debug!(phase, "beginning indexing phase");
    }

    pub fn note_task_element_completed(&mut self, phase: u32) {
        let entry = self.phase_progress.entry(phase).or_insert((0, 0));
        entry.0 += 1;
    }
}

#[allow(dead_code)]
const _: Maj = INF_MAJ;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mem_backend::InMemoryGraph;

    #[test]
    fn move_closure_chases_through_intermediate_moves() {
        let mut mii = ModuleIndexInfo::new(Libpath::new("a.b"), 2);
        mii.declare_move(Libpath::new("a.b.Old"), Some(Libpath::new("a.b.Mid")));
        mii.declare_move(Libpath::new("a.b.Mid"), Some(Libpath::new("a.b.New")));
        let reader = InMemoryGraph::new();
        mii.compute_mm_closure(&reader).unwrap();
        assert_eq!(
            mii.move_mapping.get(&Libpath::new("a.b.Old")).unwrap(),
            &Some(Libpath::new("a.b.New"))
        );
    }

    #[test]
    fn move_closure_detects_cycles() {
        let mut mii = ModuleIndexInfo::new(Libpath::new("a.b"), 2);
        mii.declare_move(Libpath::new("a.b.X"), Some(Libpath::new("a.b.Y")));
        mii.declare_move(Libpath::new("a.b.Y"), Some(Libpath::new("a.b.X")));
        let reader = InMemoryGraph::new();
        assert!(mii.compute_mm_closure(&reader).is_err());
    }

    #[test]
    fn origin_of_unmoved_node_is_itself_at_this_major() {
        let mut mii = ModuleIndexInfo::new(Libpath::new("a.b"), 1);
        mii.v_add.push(Libpath::new("a.b.Thm"));
        let reader = InMemoryGraph::new();
        mii.compute_origins(&reader);
        assert_eq!(
            mii.origins.get(&Libpath::new("a.b.Thm")).unwrap(),
            &(Libpath::new("a.b.Thm"), 1)
        );
    }
}
