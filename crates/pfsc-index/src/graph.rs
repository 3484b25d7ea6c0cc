//! The versioned graph data model: k-nodes and k-relations (the "k" for
//! "knowledge", matching the original's naming) carrying half-open validity
//! intervals `[major, cut)`.

use pfsc_core::Libpath;

/// A node/relation major version, or one of the two sentinels.
pub type Maj = i64;

/// The sentinel major for WIP content: always the newest thing at a
/// libpath, and always subject to being cut by the next WIP build.
pub const WIP_MAJ: Maj = -1;
/// The sentinel "open end" of a validity interval: "still live".
pub const INF_MAJ: Maj = i64::MAX;

pub type DbId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    Targets,
    Expands,
    Move,
    Retargets,
    Build,
    Notes,
}

#[derive(Debug, Clone)]
pub struct KNode {
    pub db_id: DbId,
    pub libpath: Libpath,
    pub node_type: String,
    pub major: Maj,
    pub cut: Maj,
}

impl KNode {
    pub fn is_live_at(&self, version: Maj) -> bool {
        self.major <= version && version < self.cut
    }
}

#[derive(Debug, Clone)]
pub struct KRelation {
    pub db_id: DbId,
    pub kind: EdgeKind,
    pub src: DbId,
    pub dst: DbId,
    pub major: Maj,
    pub cut: Maj,
}

/// A `TARGETS`/`EXPANDS` relation freshly added by `ix0200`, carried forward
/// to `ix0360` so retargeting can be computed for only what's new.
#[derive(Debug, Clone)]
pub struct NewTargetingReln {
    pub reln_db_id: DbId,
    pub head_libpath: Libpath,
    pub head_major: Maj,
    pub tail_libpath: Libpath,
    pub tail_major: Maj,
}
