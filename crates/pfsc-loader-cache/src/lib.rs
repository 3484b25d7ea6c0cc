//! The module loader's process-wide parsed-module cache, keyed by
//! `(libpath, version)` with a modification-time policy: the loader owns one
//! of these explicitly (per the loader-cache redesign, this is never global
//! mutable state) and consults it before re-reading and re-parsing a module.

mod policy;

pub use policy::CachePolicy;

use pfsc_core::{Libpath, Version};
use pfsc_model::Module;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

/// Coarse mtime resolution grace period: a cache hit is valid as long as the
/// file's modification time is no more than this far ahead of the cached
/// read time.
const MTIME_GRACE: Duration = Duration::from_secs(1);

#[derive(Clone)]
struct CacheEntry {
    module: Arc<Module>,
    /// The time captured *before* the source was read (pessimistic: if the
    /// file changes mid-read, the next check still sees it as stale).
    read_time: SystemTime,
}

/// A process-wide cache of parsed modules. Not `Send`/`Sync`-guarded
/// internally: per the concurrency model, the loader is single-threaded and
/// concurrent use requires external synchronisation.
#[derive(Default)]
pub struct ModuleCache {
    entries: HashMap<(Libpath, Version), CacheEntry>,
}

impl ModuleCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a cached module, honoring `policy`. `source_mtime` is the
    /// modification time of the backing file as of this call; it is ignored
    /// under `Never`/`Always`. Numbered-release versions are immutable and
    /// are always reused once cached, regardless of `policy`.
    pub fn get(
        &self,
        libpath: &Libpath,
        version: Version,
        source_mtime: Option<SystemTime>,
        policy: CachePolicy,
    ) -> Option<Arc<Module>> {
        let entry = self.entries.get(&(libpath.clone(), version))?;

        if !version.is_wip() {
            tracing::debug!(%libpath, ?version, "cache hit: numbered release is immutable");
            return Some(entry.module.clone());
        }

        let hit = match policy {
            CachePolicy::Never => false,
            CachePolicy::Always => true,
            CachePolicy::Time => match source_mtime {
                Some(mtime) => mtime <= entry.read_time + MTIME_GRACE,
                None => true,
            },
        };

        if hit {
            tracing::debug!(%libpath, ?version, ?policy, "module cache hit");
            Some(entry.module.clone())
        } else {
            tracing::debug!(%libpath, ?version, ?policy, "module cache miss (stale)");
            None
        }
    }

    pub fn insert(&mut self, libpath: Libpath, version: Version, module: Arc<Module>, read_time: SystemTime) {
        self.entries.insert((libpath, version), CacheEntry { module, read_time });
    }

    /// Invalidates every cached entry at or under `prefix`. Called when a
    /// module (and transitively its submodules) is known to have changed out
    /// from under the cache, e.g. after a WIP build.
    pub fn remove_modules_from_cache(&mut self, prefix: &Libpath) {
        self.entries.retain(|(libpath, _version), _| !prefix.is_prefix_of(libpath));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pfsc_syntax::parse_module_text;

    fn dummy_module(libpath: &Libpath) -> Arc<Module> {
        let parsed = parse_module_text("deduc Thm {\n}\n").unwrap();
        Arc::new(pfsc_model::build_module_from_parsed(libpath, parsed, Version::Wip).unwrap())
    }

    #[test]
    fn never_policy_always_misses() {
        let mut cache = ModuleCache::new();
        let lp = Libpath::new("a.b");
        let now = SystemTime::now();
        cache.insert(lp.clone(), Version::Wip, dummy_module(&lp), now);
        assert!(cache.get(&lp, Version::Wip, Some(now), CachePolicy::Never).is_none());
    }

    #[test]
    fn time_policy_hits_when_source_not_modified_since_read() {
        let mut cache = ModuleCache::new();
        let lp = Libpath::new("a.b");
        let read_time = SystemTime::now();
        cache.insert(lp.clone(), Version::Wip, dummy_module(&lp), read_time);
        let older_mtime = read_time - Duration::from_secs(10);
        assert!(cache
            .get(&lp, Version::Wip, Some(older_mtime), CachePolicy::Time)
            .is_some());
    }

    #[test]
    fn time_policy_misses_when_source_modified_after_read() {
        let mut cache = ModuleCache::new();
        let lp = Libpath::new("a.b");
        let read_time = SystemTime::now();
        cache.insert(lp.clone(), Version::Wip, dummy_module(&lp), read_time);
        let newer_mtime = read_time + Duration::from_secs(10);
        assert!(cache
            .get(&lp, Version::Wip, Some(newer_mtime), CachePolicy::Time)
            .is_none());
    }

    #[test]
    fn numbered_release_is_reused_even_under_never_policy() {
        let mut cache = ModuleCache::new();
        let lp = Libpath::new("a.b");
        let version = Version::Numbered { major: 1, minor: 0, patch: 0 };
        cache.insert(lp.clone(), version, dummy_module(&lp), SystemTime::now());
        assert!(cache.get(&lp, version, None, CachePolicy::Never).is_some());
    }

    #[test]
    fn remove_modules_from_cache_drops_matching_prefix_only() {
        let mut cache = ModuleCache::new();
        let a = Libpath::new("a.b.X");
        let c = Libpath::new("c.d.Y");
        cache.insert(a.clone(), Version::Wip, dummy_module(&a), SystemTime::now());
        cache.insert(c.clone(), Version::Wip, dummy_module(&c), SystemTime::now());

        cache.remove_modules_from_cache(&Libpath::new("a.b"));

        assert!(cache.get(&a, Version::Wip, None, CachePolicy::Always).is_none());
        assert!(cache.get(&c, Version::Wip, None, CachePolicy::Always).is_some());
    }
}
