//! Resolves absolute and relative import paths, loads modules at a
//! requested version, detects cyclic imports, and caches parsed modules
//! keyed by `(path, version)` under a modification-time policy.

mod error;
mod loader;
mod provider;
mod release_index;

pub use error::LoaderError;
pub use loader::Loader;
pub use provider::SourceProvider;
pub use release_index::{AlwaysIndexed, ReleaseIndex};

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use pfsc_core::{Libpath, Version};
    use pfsc_loader_cache::{CachePolicy, ModuleCache};
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::SystemTime;

    #[derive(Default)]
    struct FixtureProvider {
        sources: Mutex<HashMap<String, String>>,
    }

    impl FixtureProvider {
        fn new(entries: &[(&str, &str)]) -> Self {
            let sources = entries.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
            FixtureProvider { sources: Mutex::new(sources) }
        }
    }

    impl SourceProvider for FixtureProvider {
        fn mtime(&self, _libpath: &Libpath, _version: Version) -> Result<SystemTime, LoaderError> {
            Ok(SystemTime::now())
        }

        fn read_text(&self, libpath: &Libpath, _version: Version) -> Result<String, LoaderError> {
            self.sources
                .lock()
                .unwrap()
                .get(libpath.as_str())
                .cloned()
                .ok_or_else(|| LoaderError::ModuleDoesNotExist {
                    libpath: libpath.clone(),
                    version: Version::Wip,
                })
        }

        fn submodule_exists(&self, libpath: &Libpath, _version: Version) -> bool {
            self.sources.lock().unwrap().contains_key(libpath.as_str())
        }
    }

    #[test]
    fn loads_a_module_with_no_imports() {
        let provider = FixtureProvider::new(&[("test.lib", "deduc Thm {\n}\n")]);
        let release_index = AlwaysIndexed;
        let mut cache = ModuleCache::new();
        let mut loader = Loader::new(&provider, &release_index, &mut cache, CachePolicy::Always);

        let module = loader
            .load_module(&Libpath::new("test.lib"), Version::Wip, &mut Vec::new(), &IndexMap::new())
            .unwrap();
        assert_eq!(module.libpath, Libpath::new("test.lib"));
    }

    #[test]
    fn detects_direct_cyclic_import() {
        let provider = FixtureProvider::new(&[
            ("a.b.c.x", "import a.b.c.y\n"),
            ("a.b.c.y", "import a.b.c.x\n"),
        ]);
        let release_index = AlwaysIndexed;
        let mut cache = ModuleCache::new();
        let mut loader = Loader::new(&provider, &release_index, &mut cache, CachePolicy::Never);

        let mut history = vec![Libpath::new("a.b.c.x")];
        let err = loader
            .load_module(&Libpath::new("a.b.c.y"), Version::Wip, &mut history, &IndexMap::new())
            .unwrap_err();
        assert!(matches!(err, LoaderError::CyclicImport(_)));
    }

    #[test]
    fn resolves_self_relative_submodule_import() {
        let provider = FixtureProvider::new(&[
            ("a.b", "from . import sub\n"),
            ("a.b.sub", "deduc Thm {\n}\n"),
        ]);
        let release_index = AlwaysIndexed;
        let mut cache = ModuleCache::new();
        let mut loader = Loader::new(&provider, &release_index, &mut cache, CachePolicy::Always);

        let module = loader
            .load_module(&Libpath::new("a.b"), Version::Wip, &mut Vec::new(), &IndexMap::new())
            .unwrap();
        assert!(!module.dependencies.is_empty());
    }
}
