//! Repo manifests: a record of everything under a repo (modules and their
//! content items, as a tree) plus the timestamps and commit hashes of the
//! most recent build(s), and the logic for merging in a freshly built
//! sub-tree after an incremental (non-full-repo) build.

pub mod build_info;
pub mod tree;

pub use build_info::BuildInfo;
pub use tree::{ManifestNode, ManifestNodeId, ManifestTree};

use indexmap::IndexMap;
use pfsc_core::{Libpath, PECode, PfscError};
use serde_json::{Map, Value};

#[derive(Debug)]
pub struct Manifest {
    pub tree: ManifestTree,
    pub build_info: IndexMap<Libpath, BuildInfo>,
}

impl Manifest {
    pub fn from_tree(tree: ManifestTree) -> Self {
        Manifest { tree, build_info: IndexMap::new() }
    }

    pub fn from_dict(mut d: Value) -> Result<Manifest, PfscError> {
        let obj = d.as_object_mut().ok_or_else(|| {
            PfscError::new(PECode::ManifestBadForm, "manifest dict is not an object")
        })?;
        let tree_model = obj
            .remove("tree_model")
            .ok_or_else(|| PfscError::new(PECode::ManifestBadForm, "manifest missing tree_model"))?;
        let tree = ManifestTree::from_dict(tree_model)?;
        let mut manifest = Manifest::from_tree(tree);
        if let Some(build) = obj.remove("build") {
            manifest.build_info = parse_build_info(build)?;
        }
        Ok(manifest)
    }

    pub fn build_dict(&self) -> Value {
        let mut d = Map::new();
        if !self.build_info.is_empty() {
            let mut build = Map::new();
            for (libpath, info) in &self.build_info {
                build.insert(
                    libpath.as_str().to_string(),
                    serde_json::to_value(info).expect("BuildInfo always serializes"),
                );
            }
            d.insert("build".into(), Value::Object(build));
        }
        d.insert("tree_model".into(), self.tree.build_dict(self.tree.root));
        Value::Object(d)
    }

    pub fn get(&self, libpath: &Libpath) -> Option<ManifestNodeId> {
        self.tree.get(libpath)
    }

    pub fn is_single_build(&self) -> bool {
        self.build_info.len() == 1
    }

    pub fn single_build_node(&self) -> Option<ManifestNodeId> {
        let (libpath, _) = self.build_info.iter().next()?;
        self.get(libpath)
    }

    pub fn set_build_info(&mut self, libpath: Libpath, info: BuildInfo) {
        self.build_info = IndexMap::new();
        self.build_info.insert(libpath, info);
    }

    /// Merge another, single-build manifest into this one: the other
    /// manifest's tree holds the freshly (re)built module's subtree, grafted
    /// into this manifest's tree at the right spot, with this manifest's
    /// build-info ledger updated to reflect the new build.
    pub fn merge(&mut self, other: Manifest) -> Result<(), PfscError> {
        if !other.is_single_build() {
            return Err(PfscError::new(
                PECode::ManifestBadForm,
                "cannot merge: other manifest is not a single build",
            ));
        }
        let (built_libpath, build_info) = other.build_info.into_iter().next().unwrap();
        let recursive = build_info.recursive;

        if recursive {
            let stale: Vec<Libpath> = self
                .build_info
                .keys()
                .filter(|k| built_libpath.is_prefix_of(k))
                .cloned()
                .collect();
            for k in stale {
                self.build_info.shift_remove(&k);
            }
        }
        self.build_info.insert(built_libpath.clone(), build_info);

        // Walk up from the built node (in `other`'s tree) until we find an
        // ancestor whose id also exists in our own tree; every repo manifest
        // shares at least the repo root, so this always terminates.
        let mut b = other
            .tree
            .get(&built_libpath)
            .ok_or_else(|| PfscError::new(PECode::ManifestBadForm, "built node missing from its own manifest"))?;
        let mut last_child = None;
        let a = loop {
            if let Some(a) = self.tree.get(&other.tree.arena.get(b).id) {
                break a;
            }
            let Some(parent) = other.tree.arena.get(b).parent else {
                return Err(PfscError::new(
                    PECode::ManifestBadForm,
                    "cannot merge repo manifests; try rebuilding the repo recursively from its root",
                ));
            };
            last_child = Some(b);
            b = parent;
        };

        let a_id = self.tree.arena.get(a).id.clone();
        let b_id = other.tree.arena.get(b).id.clone();

        // Graft `other`'s subtree rooted at `b` into our arena.
        let grafted = graft(&mut self.tree, &other.tree, b);

        if a_id == b_id {
            if !recursive {
                let submodules = self.tree.submodules(a);
                for sub in submodules {
                    self.tree.add_child(grafted, sub);
                }
            }
            self.tree.replace(a, grafted)?;
        } else {
            let _ = last_child; // `C` in the original; only `b`'s subtree is needed once grafted
            self.tree.add_child(a, grafted);
        }

        Ok(())
    }
}

/// Deep-copy a subtree from `src` (rooted at `src_id`) into `dst`'s arena,
/// returning the id of the new root. `dst` node parents are left unset; the
/// caller attaches the returned root wherever it belongs.
fn graft(dst: &mut ManifestTree, src: &ManifestTree, src_id: ManifestNodeId) -> ManifestNodeId {
    let node = src.arena.get(src_id);
    let new_id = dst.arena.alloc(ManifestNode {
        id: node.id.clone(),
        data: node.data.clone(),
        parent: None,
        children: Vec::new(),
    });
    dst.lookup.insert(node.id.clone(), new_id);
    let children: Vec<ManifestNodeId> =
        node.children.iter().map(|&c| graft(dst, src, c)).collect();
    for &c in &children {
        dst.arena.get_mut(c).parent = Some(new_id);
    }
    dst.arena.get_mut(new_id).children = children;
    new_id
}

fn parse_build_info(value: Value) -> Result<IndexMap<Libpath, BuildInfo>, PfscError> {
    let obj = value.as_object().ok_or_else(|| {
        PfscError::new(PECode::ManifestBadForm, "build info is not an object")
    })?;
    let mut out = IndexMap::new();
    for (k, v) in obj {
        let info: BuildInfo = serde_json::from_value(v.clone()).map_err(|e| {
            PfscError::new(PECode::ManifestBadForm, format!("bad build info for {k}: {e}"))
        })?;
        out.insert(Libpath::new(k), info);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn simple_tree() -> Value {
        json!({
            "id": "a",
            "name": "a",
            "type": "MODULE",
            "children": [
                {"id": "a.b0", "name": "b0", "type": "THM"}
            ]
        })
    }

    #[test]
    fn round_trips_tree_model() {
        let tree = ManifestTree::from_dict(simple_tree()).unwrap();
        let manifest = Manifest::from_tree(tree);
        let d = manifest.build_dict();
        assert_eq!(d["tree_model"]["id"], "a");
        assert_eq!(d["tree_model"]["children"][0]["id"], "a.b0");
    }

    #[test]
    fn merge_replaces_rebuilt_module_and_keeps_other_build_entries() {
        let mut base = Manifest::from_tree(ManifestTree::from_dict(json!({
            "id": "a",
            "type": "MODULE",
            "children": [
                {"id": "a.b1", "type": "MODULE", "children": [
                    {"id": "a.b1.c1", "type": "THM"}
                ]}
            ]
        })).unwrap());
        base.set_build_info(Libpath::new("a.b1"), BuildInfo {
            version: "WIP".into(), commit: "aaaa".into(), time: "t0".into(), recursive: false,
        });

        let incoming = Manifest::from_tree(ManifestTree::from_dict(json!({
            "id": "a",
            "type": "MODULE",
            "children": [
                {"id": "a.b1", "type": "MODULE", "children": [
                    {"id": "a.b1.c2", "type": "THM"}
                ]}
            ]
        })).unwrap());
        let mut incoming = incoming;
        incoming.set_build_info(Libpath::new("a.b1"), BuildInfo {
            version: "WIP".into(), commit: "bbbb".into(), time: "t1".into(), recursive: false,
        });

        base.merge(incoming).unwrap();

        assert_eq!(base.build_info.get(&Libpath::new("a.b1")).unwrap().commit, "bbbb");
        let b1 = base.get(&Libpath::new("a.b1")).unwrap();
        let child_ids: Vec<String> = base
            .tree
            .arena
            .get(b1)
            .children
            .iter()
            .map(|&c| base.tree.arena.get(c).id.as_str().to_string())
            .collect();
        // Non-recursive rebuild: the pre-existing submodule... there are
        // none here, but the freshly built content (c2) must be present,
        // and the previously built content (c1) is not preserved because it
        // was content, not a submodule (only submodules survive a
        // non-recursive merge).
        assert!(child_ids.contains(&"a.b1.c2".to_string()));
    }
}
