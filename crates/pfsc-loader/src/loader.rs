use crate::error::LoaderError;
use crate::provider::SourceProvider;
use crate::release_index::ReleaseIndex;
use indexmap::IndexMap;
use pfsc_core::{Libpath, Version};
use pfsc_loader_cache::{CachePolicy, ModuleCache};
use pfsc_model::Module;
use pfsc_syntax::ast;
use std::sync::Arc;
use std::time::SystemTime;

/// Resolves absolute and relative import paths, loads modules at a
/// requested version, detects cyclic imports, and caches parsed modules
/// keyed by `(path, version)` under a modification-time policy.
pub struct Loader<'a> {
    provider: &'a dyn SourceProvider,
    release_index: &'a dyn ReleaseIndex,
    cache: &'a mut ModuleCache,
    policy: CachePolicy,
}

impl<'a> Loader<'a> {
    pub fn new(
        provider: &'a dyn SourceProvider,
        release_index: &'a dyn ReleaseIndex,
        cache: &'a mut ModuleCache,
        policy: CachePolicy,
    ) -> Self {
        Loader { provider, release_index, cache, policy }
    }

    /// Loads `libpath` at `version`, recursively resolving its imports.
    /// `history` tracks modules currently being loaded higher up the call
    /// stack, for cyclic-import detection; pass an empty vec at the top
    /// level. `root_dependencies` is the repo-level dependencies map used to
    /// resolve the required version of any non-self repopath import; for
    /// the root module being loaded, pass its own (already-known)
    /// dependencies.
    pub fn load_module(
        &mut self,
        libpath: &Libpath,
        version: Version,
        history: &mut Vec<Libpath>,
        root_dependencies: &IndexMap<Libpath, Version>,
    ) -> Result<Arc<Module>, LoaderError> {
        if !version.is_wip() {
            let repopath = libpath.repopath().unwrap_or_else(|| libpath.clone());
            if !self.release_index.is_indexed(&repopath, version) {
                return Err(LoaderError::ReleaseNotIndexed { repopath, version });
            }
        }

        let mtime_hint = if self.policy == CachePolicy::Time {
            self.provider.mtime(libpath, version).ok()
        } else {
            None
        };
        if let Some(module) = self.cache.get(libpath, version, mtime_hint, self.policy) {
            return Ok(module);
        }

        if history.contains(libpath) {
            return Err(LoaderError::CyclicImport(libpath.clone()));
        }

        let read_time_before = SystemTime::now();
        let text = self.provider.read_text(libpath, version)?;
        let parsed = pfsc_syntax::parse_module_text(&text)?;

        history.push(libpath.clone());
        let mut module = pfsc_model::build_module_from_parsed(libpath, parsed.clone(), version)?;
        module.dependencies = self.resolve_imports(libpath, version, &parsed, history, root_dependencies)?;
        history.pop();

        pfsc_model::resolve_objects(&module)?;

        let module = Arc::new(module);
        self.cache.insert(libpath.clone(), version, module.clone(), read_time_before);
        Ok(module)
    }

    fn resolve_imports(
        &mut self,
        owner: &Libpath,
        version: Version,
        parsed: &pfsc_syntax::ParsedModule,
        history: &mut Vec<Libpath>,
        root_dependencies: &IndexMap<Libpath, Version>,
    ) -> Result<IndexMap<Libpath, Version>, LoaderError> {
        let mut dependencies = IndexMap::new();
        for item in &parsed.ast.items {
            let ast::Item::Import(import) = item else { continue };
            match import {
                ast::ImportItem::Plain { libpath: raw, .. } => {
                    let target = Libpath::new(raw);
                    let target_version = self.required_version(owner, version, &target, root_dependencies)?;
                    dependencies.insert(target.repopath().unwrap_or_else(|| target.clone()), target_version);
                    self.load_module(&target, target_version, history, root_dependencies)?;
                }
                ast::ImportItem::From { rel, import_all, names, .. } => {
                    let base = self.resolve_rel_path(owner, rel);

                    if *import_all && base == *owner {
                        return Err(LoaderError::SelfWildcardImport(owner.clone()));
                    }
                    if *import_all {
                        let target_version = self.required_version(owner, version, &base, root_dependencies)?;
                        dependencies.insert(base.repopath().unwrap_or_else(|| base.clone()), target_version);
                        self.load_module(&base, target_version, history, root_dependencies)?;
                        continue;
                    }

                    let self_relative = rel.num_dots >= 1;
                    for (name, _alias) in names {
                        let candidate = base.join(name);
                        let target_version = self.required_version(owner, version, &base, root_dependencies)?;

                        if self.provider.submodule_exists(&candidate, target_version) {
                            dependencies
                                .insert(candidate.repopath().unwrap_or_else(|| candidate.clone()), target_version);
                            self.load_module(&candidate, target_version, history, root_dependencies)?;
                        } else if self_relative {
                            return Err(LoaderError::PlainRelativeImportMissingLocalName(name.clone()));
                        } else {
                            // `P.X` named as an item inside module `P`: load
                            // `P` itself and let name resolution inside it
                            // find `X`; no separate submodule load needed.
                            dependencies
                                .insert(base.repopath().unwrap_or_else(|| base.clone()), target_version);
                            self.load_module(&base, target_version, history, root_dependencies)?;
                        }
                    }
                }
            }
        }
        Ok(dependencies)
    }

    fn resolve_rel_path(&self, owner: &Libpath, rel: &ast::RelPath) -> Libpath {
        if rel.num_dots == 0 {
            return Libpath::new(rel.tail.as_deref().unwrap_or_default());
        }
        let mut base = owner.clone();
        for _ in 1..rel.num_dots {
            base = base.parent().unwrap_or(base);
        }
        match &rel.tail {
            Some(tail) => base.join(tail),
            None => base,
        }
    }

    fn required_version(
        &self,
        owner: &Libpath,
        owner_version: Version,
        target: &Libpath,
        root_dependencies: &IndexMap<Libpath, Version>,
    ) -> Result<Version, LoaderError> {
        let owner_repo = owner.repopath().unwrap_or_else(|| owner.clone());
        let target_repo = target.repopath().unwrap_or_else(|| target.clone());
        if target_repo == owner_repo {
            return Ok(owner_version);
        }
        root_dependencies
            .get(&target_repo)
            .copied()
            .ok_or(LoaderError::MissingDependencyVersion { repopath: target_repo })
    }
}
