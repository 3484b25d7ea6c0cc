//! The storage ports the indexer depends on. A concrete graph database (or,
//! for tests, the in-memory reference backend in [`crate::mem_backend`])
//! implements both traits.

use crate::graph::{DbId, KNode, Maj, NewTargetingReln};
use crate::mii::ModuleIndexInfo;
use pfsc_core::{Libpath, PfscError};

pub trait GraphReader: Send + Sync {
    /// The single node at `libpath` whose validity interval covers
    /// `version`, if any (validity-interval disjointness guarantees at most
    /// one).
    fn find_live_node(&self, libpath: &Libpath, version: Maj) -> Option<KNode>;

    /// The node at `libpath` with this exact major (used to resolve a
    /// move's destination, which is always pinned to a specific major).
    fn find_node_at_major(&self, libpath: &Libpath, major: Maj) -> Option<KNode>;

    /// The chain of images of `head` under repeated `MOVE` edges, i.e. every
    /// node reachable by following `MOVE` from the node at
    /// `(head_libpath, head_major)`.
    fn find_move_conjugate_chain(&self, head_libpath: &Libpath, head_major: Maj) -> Vec<KNode>;

    /// All enrichments (`TARGETS`/`EXPANDS` sources) whose current target is
    /// `moved_from`, so `ix0360` phase (2) can retarget them.
    fn find_existing_enrichments_of(&self, moved_from: &Libpath, version: Maj) -> Vec<NewTargetingReln>;

    /// The recorded origin of a node, if it has ever been computed.
    fn origin_of(&self, libpath: &Libpath) -> Option<(Libpath, Maj)>;

    /// The highest major version currently indexed anywhere under
    /// `repopath`, or `None` if the repo has never been built at a numbered
    /// release.
    fn current_major_version(&self, repopath: &Libpath) -> Option<Maj>;
}

/// A single open unit of work against the backing store. The reference
/// in-memory backend treats this as a no-op marker (writes land immediately,
/// `rollback` rewinds from a pre-transaction snapshot); a real graph
/// database would bind it to an actual DB transaction handle.
pub struct TxId(pub u64);

pub trait GraphWriter: Send + Sync {
    fn reader(&self) -> &dyn GraphReader;

    fn begin_transaction(&self) -> TxId;
    fn commit_transaction(&self, tx: TxId) -> Result<(), PfscError>;
    fn rollback_transaction(&self, tx: TxId);

    /// Cut superseded nodes/relations, then upsert everything the MII
    /// accumulated, returning the newly added `TARGETS`/`EXPANDS` relations
    /// for `ix0360` to process.
    fn ix0200(&self, mii: &ModuleIndexInfo, tx: &TxId) -> Result<Vec<NewTargetingReln>, PfscError>;

    /// Materialize `MOVE` edges for the MII's move mapping.
    fn ix0330(&self, mii: &ModuleIndexInfo, tx: &TxId) -> Result<(), PfscError>;

    /// Propagate `RETARGETS` edges, both for newly added enrichments and for
    /// pre-existing ones whose target just moved.
    fn ix0360(
        &self,
        mii: &ModuleIndexInfo,
        new_targeting_relns: &[NewTargetingReln],
        tx: &TxId,
    ) -> Result<(), PfscError>;

    /// Upsert the per-repo `VERSION` node with this build's metadata.
    fn ix0400(&self, mii: &ModuleIndexInfo, tx: &TxId) -> Result<(), PfscError>;

    fn drop_wip_nodes_under_module(&self, modpath: &Libpath, tx: &TxId) -> Result<(), PfscError>;
    fn undo_wip_cut(
        &self,
        node_db_ids: &[DbId],
        reln_db_ids: &[DbId],
        tx: &TxId,
    ) -> Result<(), PfscError>;
    fn delete_full_wip_build(&self, repopath: &Libpath) -> Result<(), PfscError>;
}
