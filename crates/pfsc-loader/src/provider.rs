use crate::error::LoaderError;
use pfsc_core::{Libpath, Version};
use std::time::SystemTime;

/// Where a module's source text actually comes from: a checked-out repo on
/// disk in production, an in-memory fixture in tests.
pub trait SourceProvider: Send + Sync {
    /// The modification time of `libpath`'s backing file, checked under the
    /// `TIME` cache policy before deciding whether a re-read is needed.
    fn mtime(&self, libpath: &Libpath, version: Version) -> Result<SystemTime, LoaderError>;

    /// The source text for `libpath` at `version`. The read-time recorded
    /// against the cache entry is captured by the loader *before* calling
    /// this, not by the provider.
    fn read_text(&self, libpath: &Libpath, version: Version) -> Result<String, LoaderError>;

    /// Whether `libpath` names a submodule (as opposed to a native item),
    /// used to resolve `from . import X` and `from P import X` when `X`
    /// isn't found as a named item.
    fn submodule_exists(&self, libpath: &Libpath, version: Version) -> bool;
}
