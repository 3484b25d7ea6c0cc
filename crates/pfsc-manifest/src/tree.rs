//! The manifest tree: a record of every module and content item under a
//! repo, as a plain arena-backed tree (no `Rc<RefCell<_>>`: parent/child
//! links are `Id<ManifestNode>` handles into the owning `ManifestTree`'s
//! arena, same pattern as the object model's node graph).

use indexmap::IndexMap;
use pfsc_core::{Libpath, PECode, PfscError};
use pfsc_ids::{Arena, Id};
use serde_json::{Map, Value};

pub type ManifestNodeId = Id<ManifestNode>;

#[derive(Debug, Clone)]
pub struct ManifestNode {
    pub id: Libpath,
    /// Free-form fields beyond `id`/`children` (`name`, `type`, `version`,
    /// ...), carried verbatim the way the original's `**kwargs` dict did.
    pub data: Map<String, Value>,
    pub parent: Option<ManifestNodeId>,
    pub children: Vec<ManifestNodeId>,
}

impl ManifestNode {
    pub fn is_module(&self) -> bool {
        matches!(self.data.get("type"), Some(Value::String(s)) if s == "MODULE")
    }
}

#[derive(Debug)]
pub struct ManifestTree {
    pub arena: Arena<ManifestNode>,
    pub root: ManifestNodeId,
    pub lookup: IndexMap<Libpath, ManifestNodeId>,
}

impl ManifestTree {
    pub fn get(&self, libpath: &Libpath) -> Option<ManifestNodeId> {
        self.lookup.get(libpath).copied()
    }

    pub fn submodules(&self, id: ManifestNodeId) -> Vec<ManifestNodeId> {
        self.arena
            .get(id)
            .children
            .iter()
            .copied()
            .filter(|&c| self.arena.get(c).is_module())
            .collect()
    }

    pub fn contents(&self, id: ManifestNodeId) -> Vec<ManifestNodeId> {
        self.arena
            .get(id)
            .children
            .iter()
            .copied()
            .filter(|&c| !self.arena.get(c).is_module())
            .collect()
    }

    pub fn add_child(&mut self, parent: ManifestNodeId, child: ManifestNodeId) {
        self.arena.get_mut(parent).children.push(child);
        self.arena.get_mut(child).parent = Some(parent);
        let child_libpath = self.arena.get(child).id.clone();
        self.lookup.insert(child_libpath, child);
    }

    /// Replace `old`'s slot among its parent's children (or the tree root)
    /// with `new`, reparenting `new` and rewriting the lookup entry.
    pub fn replace(&mut self, old: ManifestNodeId, new: ManifestNodeId) -> Result<(), PfscError> {
        let old_id = self.arena.get(old).id.clone();
        if old == self.root {
            self.root = new;
            self.arena.get_mut(new).parent = None;
        } else {
            let parent = self.arena.get(old).parent.ok_or_else(|| {
                PfscError::new(
                    PECode::ManifestBadForm,
                    format!("node {old_id} has no parent and is not the tree root"),
                )
            })?;
            let siblings = &mut self.arena.get_mut(parent).children;
            let slot = siblings
                .iter()
                .position(|&c| self.arena.get(c).id == old_id)
                .ok_or_else(|| {
                    PfscError::new(
                        PECode::ManifestBadForm,
                        format!("child {old_id} not found among its parent's children"),
                    )
                })?;
            self.arena.get_mut(parent).children[slot] = new;
            self.arena.get_mut(new).parent = Some(parent);
        }
        self.lookup.insert(self.arena.get(new).id.clone(), new);
        Ok(())
    }

    pub fn build_dict(&self, id: ManifestNodeId) -> Value {
        let node = self.arena.get(id);
        let mut d = Map::new();
        d.insert("id".into(), Value::String(node.id.as_str().to_string()));
        for (k, v) in &node.data {
            d.insert(k.clone(), v.clone());
        }
        let children: Vec<Value> = node.children.iter().map(|&c| self.build_dict(c)).collect();
        if !children.is_empty() {
            d.insert("children".into(), Value::Array(children));
        }
        Value::Object(d)
    }

    /// Build a flat (non-nested) list of items rooted at `id`, each tagged
    /// with its parent's id (or `null` for the root) and its order among
    /// siblings. Passing `recursive = false` stops descent at submodules,
    /// appropriate after a non-recursive rebuild of a single module.
    pub fn build_relational_model(
        &self,
        id: ManifestNodeId,
        recursive: bool,
        sibling_order: usize,
        items: &mut Vec<Value>,
    ) {
        let node = self.arena.get(id);
        let mut d = Map::new();
        d.insert("id".into(), Value::String(node.id.as_str().to_string()));
        d.insert("sibling".into(), Value::from(sibling_order));
        d.insert(
            "parent".into(),
            match node.parent {
                Some(p) => Value::String(self.arena.get(p).id.as_str().to_string()),
                None => Value::Null,
            },
        );
        for (k, v) in &node.data {
            d.insert(k.clone(), v.clone());
        }

        let am_module = node.is_module();
        let mut terminal = am_module;
        let children = node.children.clone();
        for &child in &children {
            if self.arena.get(child).is_module() {
                if am_module {
                    terminal = false;
                }
                if !recursive {
                    continue;
                }
            }
        }
        if am_module {
            d.insert("terminal".into(), Value::Bool(terminal));
        }
        items.push(Value::Object(d));

        for (i, &child) in children.iter().enumerate() {
            if self.arena.get(child).is_module() && !recursive {
                continue;
            }
            self.build_relational_model(child, recursive, i, items);
        }
    }

    /// Rebuild a tree from its `build_dict` JSON representation.
    pub fn from_dict(mut value: Value) -> Result<ManifestTree, PfscError> {
        let mut arena = Arena::new();
        let mut lookup = IndexMap::new();
        let root = Self::build_node_from_dict(&mut value, None, &mut arena, &mut lookup)?;
        Ok(ManifestTree { arena, root, lookup })
    }

    fn build_node_from_dict(
        value: &mut Value,
        parent: Option<ManifestNodeId>,
        arena: &mut Arena<ManifestNode>,
        lookup: &mut IndexMap<Libpath, ManifestNodeId>,
    ) -> Result<ManifestNodeId, PfscError> {
        let obj = value.as_object_mut().ok_or_else(|| {
            PfscError::new(PECode::ManifestBadForm, "manifest tree node is not an object")
        })?;
        let id_str = obj
            .remove("id")
            .and_then(|v| v.as_str().map(str::to_string))
            .ok_or_else(|| PfscError::new(PECode::ManifestBadForm, "manifest tree node has no id"))?;
        let id = Libpath::new(id_str);
        let children_value = obj.remove("children");

        let node_id = arena.alloc(ManifestNode {
            id: id.clone(),
            data: obj.clone(),
            parent,
            children: Vec::new(),
        });
        lookup.insert(id, node_id);

        if let Some(Value::Array(mut children)) = children_value {
            let mut child_ids = Vec::with_capacity(children.len());
            for child in children.iter_mut() {
                let cid = Self::build_node_from_dict(child, Some(node_id), arena, lookup)?;
                child_ids.push(cid);
            }
            arena.get_mut(node_id).children = child_ids;
        }

        Ok(node_id)
    }
}
