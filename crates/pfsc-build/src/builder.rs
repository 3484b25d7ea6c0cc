//! The `Builder`: ties the loader, object model, indexer, manifest, and
//! write-backend crates together into the three-phase pipeline (Build,
//! Write, Index) a single `build_write_index` call runs end to end.

use crate::checkout::RepoCheckout;
use crate::error::{BuildError, Result};
use crate::fs_provider::FsSourceProvider;
use crate::html_escape::escape_html;
use crate::origin_injection::inject_origins;
use crate::progress::{BuildOp, NoopProgressMonitor, ProgressMonitor};
use crate::root_decls::{check_root_declarations_for_release, read_dependencies};
use crate::walk::walk_modules;
use indexmap::IndexMap;
use pfsc_core::{Libpath, Version};
use pfsc_index::{accumulate_module, write_module_index, GraphReader, GraphWriter, InMemoryGraph, Maj};
use pfsc_loader::{Loader, ReleaseIndex, SourceProvider};
use pfsc_loader_cache::{CachePolicy, ModuleCache};
use pfsc_manifest::{BuildInfo, Manifest, ManifestNode, ManifestNodeId, ManifestTree};
use pfsc_model::{ItemRef, Module};
use pfsc_write::{JsonWriter, WriteBackend};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

const WIP_MAJ: Maj = pfsc_index::WIP_MAJ;

/// A [`pfsc_loader::ReleaseIndex`] backed by the same graph store the indexer
/// writes to: a release is "indexed" once its `VERSION` node is visible at
/// or below the requested major.
struct GraphBackedReleaseIndex<'a> {
    reader: &'a dyn GraphReader,
}

impl ReleaseIndex for GraphBackedReleaseIndex<'_> {
    fn is_indexed(&self, repopath: &Libpath, version: Version) -> bool {
        match version {
            Version::Wip => true,
            Version::Numbered { major, .. } => {
                self.reader.current_major_version(repopath).map(|m| m >= major as Maj).unwrap_or(false)
            }
        }
    }
}

#[derive(Debug)]
pub struct BuildReport {
    pub repopath: Libpath,
    pub version: Version,
    pub modules_built: usize,
    pub useless_dirs: Vec<PathBuf>,
}

pub struct Builder {
    checkout: Arc<dyn RepoCheckout>,
    graph: Arc<dyn GraphWriter>,
    write_backend: Arc<dyn WriteBackend>,
    progress: Arc<dyn ProgressMonitor>,
    completed: Mutex<HashSet<(Libpath, VersionKey)>>,
}

/// `Version` itself is `Hash + Eq`, but wrapping it keeps the `completed` set's
/// key type self-explanatory at the call site.
type VersionKey = Version;

impl Builder {
    pub fn new(checkout: Arc<dyn RepoCheckout>, write_backend: Arc<dyn WriteBackend>) -> Self {
        Builder {
            checkout,
            graph: Arc::new(InMemoryGraph::new()),
            write_backend,
            progress: Arc::new(NoopProgressMonitor),
            completed: Mutex::new(HashSet::new()),
        }
    }

    pub fn with_graph(mut self, graph: Arc<dyn GraphWriter>) -> Self {
        self.graph = graph;
        self
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressMonitor>) -> Self {
        self.progress = progress;
        self
    }

    /// Runs the Build, Write, and Index phases for `repopath` at `version`.
    /// `root_dependencies` is consulted only when the repo root module itself
    /// declares none (e.g. a fixture or sub-repo build driven externally);
    /// ordinarily the root module's own `dependencies` assignment wins.
    pub fn build_write_index(
        &self,
        repopath: &Libpath,
        version: Version,
        recursive: bool,
        force: bool,
    ) -> Result<BuildReport> {
        if !force && self.completed.lock().unwrap().contains(&(repopath.clone(), version)) {
            return Err(BuildError::AlreadyBuilt { libpath: repopath.clone(), version });
        }

        self.progress.report(BuildOp::Checkout, 0, 1, &format!("checking out {repopath}"));
        let handle = self.checkout.checkout(repopath, version)?;
        self.progress.report(BuildOp::Checkout, 1, 1, "checked out");

        let provider = FsSourceProvider::new(handle.root());
        let release_index = GraphBackedReleaseIndex { reader: self.graph.reader() };
        let mut cache = ModuleCache::new();
        let policy = if version.is_wip() { CachePolicy::Time } else { CachePolicy::Always };
        let mut loader = Loader::new(&provider, &release_index, &mut cache, policy);

        // The root module is always read at WIP, even for a release build:
        // the checked-out tree *is* the thing being promoted to that release.
        let mut history = Vec::new();
        let root_module = loader
            .load_module(repopath, Version::Wip, &mut history, &IndexMap::new())
            .map_err(BuildError::Loader)?;

        let is_major_bump = match version {
            Version::Wip => false,
            Version::Numbered { major, .. } => {
                let current = self.graph.reader().current_major_version(repopath).unwrap_or(WIP_MAJ);
                current == WIP_MAJ || major as Maj > current
            }
        };
        if !version.is_wip() {
            check_root_declarations_for_release(&root_module, repopath, version, is_major_bump)?;
        }
        let root_dependencies = read_dependencies(&root_module)?;

        self.progress.report(BuildOp::Walk, 0, 1, "walking module tree");
        let report = walk_modules(handle.root(), repopath, &HashSet::new())?;
        self.progress.report(BuildOp::Walk, 1, 1, &format!("{} jobs found", report.jobs.len()));

        for useless in &report.useless_dirs {
            tracing::debug!(target = "pfsc.build", dir = %useless.display(), "directory has no pfsc modules");
        }

        // Build the repo-root manifest node chain (the segments of `repopath`
        // itself are always represented, even though they have no file of
        // their own to walk).
        let mut tree = ManifestTree {
            arena: pfsc_ids::Arena::new(),
            root: pfsc_ids::Id::new(0),
            lookup: IndexMap::new(),
        };
        let repo_root_id = tree.arena.alloc(module_node(repopath.clone(), repopath.last_segment()));
        tree.root = repo_root_id;
        tree.lookup.insert(repopath.clone(), repo_root_id);

        let mut modules: HashMap<Libpath, Module> = HashMap::new();
        let mut all_origins: HashMap<Libpath, (Libpath, Maj)> = HashMap::new();
        let major: Maj = match version {
            Version::Wip => WIP_MAJ,
            Version::Numbered { major, .. } => major as Maj,
        };

        self.progress.report(BuildOp::Parse, 0, report.jobs.len(), "loading modules");
        for (i, job) in report.jobs.iter().enumerate() {
            let mut history = Vec::new();
            let module = loader
                .load_module(&job.libpath, Version::Wip, &mut history, &root_dependencies)
                .map_err(|e| BuildError::Loader(e))?;
            let mut module = (*module).clone();
            module.set_represented_version(version);

            let parent_id = ensure_manifest_ancestors(&mut tree, &job.libpath, repopath, repo_root_id);
            populate_manifest_node(&mut tree, parent_id, &module);

            let mut mii = accumulate_module(&module, major);
            let reader = self.graph.reader();
            mii.compute_mm_closure(reader).map_err(|e| BuildError::Pfsc(e.into()))?;
            mii.cut_add_validate(reader).map_err(|e| BuildError::Pfsc(e.into()))?;
            mii.here_elsewhere_nowhere(reader);
            mii.compute_origins(reader);
            all_origins.extend(mii.origins.clone());

            write_module_index(self.graph.as_ref(), &mii).map_err(BuildError::Pfsc)?;

            modules.insert(job.libpath.clone(), module);
            self.progress.report(BuildOp::Parse, i + 1, report.jobs.len(), job.libpath.as_str());
        }

        for module in modules.values_mut() {
            inject_origins(module, &all_origins);
        }

        self.progress.report(BuildOp::Write, 0, modules.len(), "writing build output");
        let json_writer = JsonWriter::new(self.write_backend.as_ref());
        for (i, (libpath, module)) in modules.iter().enumerate() {
            self.write_backend.clear_module(libpath, &version)?;

            for (_, item) in module.native_items_in_def_order() {
                if let ItemRef::Deduc(id) = item {
                    let dashgraph = pfsc_model::dashgraph::render_deduc(module, id);
                    json_writer.write_value(&module.deducs.get(id).libpath, &version, "dg.json", &dashgraph)?;
                }
                if let ItemRef::Anno(id) = item {
                    let anno = module.annos.get(id);
                    let html = escape_html(&anno.body);
                    self.write_backend.write(&anno.libpath, &version, "anno.html", html.as_bytes())?;

                    let widget_array: Value = Value::Array(
                        anno.widgets
                            .iter()
                            .map(|w| {
                                let mut data = w.data.to_serde_json();
                                if let Value::Object(map) = &mut data {
                                    map.insert("name".into(), Value::String(w.name.clone()));
                                    if let Some(approvals) = &w.approvals {
                                        map.insert("approvals".into(), Value::String(approvals.clone()));
                                    }
                                }
                                data
                            })
                            .collect(),
                    );
                    json_writer.write_value(&anno.libpath, &version, "anno.json", &widget_array)?;
                }
            }

            let src = provider.read_text(libpath, Version::Wip).map_err(BuildError::Loader)?;
            self.write_backend.write(libpath, &version, "src", src.as_bytes())?;

            self.progress.report(BuildOp::Write, i + 1, modules.len(), libpath.as_str());
        }

        let mut manifest = Manifest::from_tree(tree);
        manifest.set_build_info(repopath.clone(), BuildInfo::now(version.to_string(), "", recursive));
        json_writer.write_value(repopath, &version, "manifest.json", &manifest.build_dict())?;

        self.progress.report(BuildOp::Index, 1, 1, "index transactions committed");

        self.completed.lock().unwrap().insert((repopath.clone(), version));

        Ok(BuildReport { repopath: repopath.clone(), version, modules_built: modules.len(), useless_dirs: report.useless_dirs })
    }
}

fn module_node(libpath: Libpath, name: &str) -> ManifestNode {
    let mut data = Map::new();
    data.insert("type".into(), Value::String("MODULE".into()));
    data.insert("name".into(), Value::String(name.to_string()));
    ManifestNode { id: libpath, data, parent: None, children: Vec::new() }
}

/// Ensures every ancestor segment of `libpath` (below `repopath`) has a
/// `MODULE` node in `tree`, creating them on demand, and returns the
/// deepest existing ancestor's id — the node new content under `libpath`
/// should be attached to.
fn ensure_manifest_ancestors(
    tree: &mut ManifestTree,
    libpath: &Libpath,
    repopath: &Libpath,
    repo_root_id: ManifestNodeId,
) -> ManifestNodeId {
    let extra_segments: Vec<&str> = libpath.segments().skip(repopath.num_segments()).collect();
    let mut current_id = repo_root_id;
    let mut current_path = repopath.clone();
    for segment in extra_segments {
        current_path = current_path.join(segment);
        current_id = match tree.lookup.get(&current_path) {
            Some(&id) => id,
            None => {
                let node_id = tree.arena.alloc(module_node(current_path.clone(), segment));
                tree.add_child(current_id, node_id);
                node_id
            }
        };
    }
    current_id
}

/// Adds one manifest tree node per annotation and deduction defined natively
/// in `module`, attached to `parent_id` (the node for the module's own
/// directory slot, already present in the tree via [`ensure_manifest_ancestors`]).
fn populate_manifest_node(tree: &mut ManifestTree, parent_id: ManifestNodeId, module: &Module) {
    let mut depths: HashMap<Libpath, u32> = HashMap::new();
    for id in module.all_native_deductions(true) {
        let deduc = module.deducs.get(id);
        depths.insert(deduc.libpath.clone(), module.deduc_depth_within_module(id));

        let mut data = Map::new();
        data.insert("type".into(), Value::String("CHART".into()));
        data.insert("name".into(), Value::String(deduc.libpath.last_segment().to_string()));
        data.insert("modpath".into(), Value::String(module.libpath.as_str().to_string()));
        data.insert("sourceRow".into(), Value::from(deduc.range.start.line));
        if let Some(tdlp) = deduc.target_deduc_libpath() {
            data.insert("tdlp".into(), Value::String(tdlp.as_str().to_string()));
        }
        data.insert("depth".into(), Value::from(depths[&deduc.libpath]));
        let node_id = tree.arena.alloc(ManifestNode { id: deduc.libpath.clone(), data, parent: None, children: Vec::new() });
        tree.add_child(parent_id, node_id);
    }

    for (_, item) in module.native_items_in_def_order() {
        if let ItemRef::Anno(id) = item {
            let anno = module.annos.get(id);
            let mut data = Map::new();
            data.insert("type".into(), Value::String("NOTES".into()));
            data.insert("name".into(), Value::String(anno.libpath.last_segment().to_string()));
            data.insert("modpath".into(), Value::String(module.libpath.as_str().to_string()));
            data.insert("sourceRow".into(), Value::from(anno.range.start.line));
            let node_id = tree.arena.alloc(ManifestNode { id: anno.libpath.clone(), data, parent: None, children: Vec::new() });
            tree.add_child(parent_id, node_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkout::FixedRootCheckout;
    use pfsc_write::GraphBlobWriteBackend;
    use std::fs;

    fn write_fixture(root: &std::path::Path) {
        fs::write(
            root.join("__.pfsc"),
            "deduc Thm {\n    asrt C {\n    }\n}\n",
        )
        .unwrap();
    }

    #[test]
    fn builds_a_simple_repo_and_records_a_manifest_and_index_entry() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path());

        let builder = Builder::new(
            Arc::new(FixedRootCheckout::new(dir.path())),
            Arc::new(GraphBlobWriteBackend::new()),
        );

        let report = builder
            .build_write_index(&Libpath::new("a.b.c"), Version::Wip, true, false)
            .unwrap();
        assert_eq!(report.modules_built, 1);

        let again = builder.build_write_index(&Libpath::new("a.b.c"), Version::Wip, true, false);
        assert!(matches!(again, Err(BuildError::AlreadyBuilt { .. })));

        let forced = builder.build_write_index(&Libpath::new("a.b.c"), Version::Wip, true, true);
        assert!(forced.is_ok());
    }
}
