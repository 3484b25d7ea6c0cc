use pfsc_core::{Libpath, Version};

/// Whether a numbered release has already been indexed in the graph store.
/// A thin port so the loader doesn't need to depend on the indexer crate
/// just to ask this one question.
pub trait ReleaseIndex: Send + Sync {
    fn is_indexed(&self, repopath: &Libpath, version: Version) -> bool;
}

/// A `ReleaseIndex` that treats every numbered release as indexed; useful
/// for tests and for callers (like a fresh build) that perform this check
/// themselves before invoking the loader.
pub struct AlwaysIndexed;

impl ReleaseIndex for AlwaysIndexed {
    fn is_indexed(&self, _repopath: &Libpath, _version: Version) -> bool {
        true
    }
}
