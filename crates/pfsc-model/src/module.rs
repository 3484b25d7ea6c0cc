use crate::annotation::{Annotation, AnnoId, Assignment, AsgnId, Definition, DefnId};
use crate::deduction::{Deduction, DeducId, SubDeduc, SubDeducId};
use crate::node::{DeducChild, Node, NodeId, NodeKind as ModelNodeKind, RealNode};
use indexmap::IndexMap;
use pfsc_core::{Libpath, PECode, PfscError, Version};
use pfsc_ids::Arena;
use pfsc_syntax::ast;
use pfsc_syntax::ParsedModule;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy)]
pub enum ItemRef {
    Deduc(DeducId),
    Anno(AnnoId),
    Defn(DefnId),
    Asgn(AsgnId),
}

/// A fully loaded proof module: the parsed, name-resolved object tree for
/// one `.pfsc` file.
#[derive(Debug, Clone)]
pub struct Module {
    pub libpath: Libpath,
    /// The version the module's source was actually read at.
    pub loading_version: Version,
    /// The version this content is to be *attributed* to in the index; for
    /// a release build this is the numbered release even though the text
    /// was read from the WIP checkout.
    pub represented_version: Version,
    pub dependencies: IndexMap<Libpath, Version>,
    /// Native items in definition order, keyed by local name.
    pub items: IndexMap<String, ItemRef>,

    pub deducs: Arena<Deduction>,
    pub subdeducs: Arena<SubDeduc>,
    pub nodes: Arena<Node>,
    pub annos: Arena<Annotation>,
    pub defns: Arena<Definition>,
    pub asgns: Arena<Assignment>,
}

impl Module {
    pub fn set_represented_version(&mut self, version: Version) {
        self.represented_version = version;
    }

    pub fn native_items_in_def_order(&self) -> impl Iterator<Item = (&str, ItemRef)> {
        self.items.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// All native deductions, optionally topologically sorted so that a
    /// deduction's target always precedes the deduction that expands it,
    /// with ties broken by `NumberedName` order (`Thm9` before `Thm10`).
    pub fn all_native_deductions(&self, toposort: bool) -> Vec<DeducId> {
        let mut ids: Vec<DeducId> = self
            .items
            .values()
            .filter_map(|r| match r {
                ItemRef::Deduc(id) => Some(*id),
                _ => None,
            })
            .collect();

        if !toposort {
            return ids;
        }

        // name -> id, and a map from target-deduc-libpath -> expanding ids,
        // built only over deductions native to this module.
        let mut by_libpath: std::collections::HashMap<&str, DeducId> = Default::default();
        for &id in &ids {
            by_libpath.insert(self.deducs.get(id).libpath.as_str(), id);
        }

        ids.sort_by(|a, b| {
            crate::util::numbered_name_cmp(
                self.deducs.get(*a).libpath.last_segment(),
                self.deducs.get(*b).libpath.last_segment(),
            )
        });

        let mut visited: HashSet<u32> = HashSet::new();
        let mut order = Vec::with_capacity(ids.len());

        fn visit(
            id: DeducId,
            module: &Module,
            by_libpath: &std::collections::HashMap<&str, DeducId>,
            visited: &mut HashSet<u32>,
            order: &mut Vec<DeducId>,
        ) {
            if !visited.insert(unsafe_id_key(id)) {
                return;
            }
            if let Some(target_lp) = module.deducs.get(id).target_deduc_libpath() {
                if let Some(&target_id) = by_libpath.get(target_lp.as_str()) {
                    visit(target_id, module, by_libpath, visited, order);
                }
            }
            order.push(id);
        }

        for &id in &ids {
            visit(id, self, &by_libpath, &mut visited, &mut order);
        }
        order
    }

    /// Depth of a deduction within its module: 0 if it targets something
    /// outside the module (or nothing), else 1 + the depth of its native
    /// target deduction.
    pub fn deduc_depth_within_module(&self, id: DeducId) -> u32 {
        let mut depth = 0u32;
        let mut current = id;
        let mut seen = HashSet::new();
        loop {
            if !seen.insert(unsafe_id_key(current)) {
                break;
            }
            let Some(target_lp) = self.deducs.get(current).target_deduc_libpath() else {
                break;
            };
            let found = self.items.values().find_map(|r| match r {
                ItemRef::Deduc(id2) if self.deducs.get(*id2).libpath == target_lp => Some(*id2),
                _ => None,
            });
            match found {
                Some(parent_id) => {
                    depth += 1;
                    current = parent_id;
                }
                None => break,
            }
        }
        depth
    }
}

fn unsafe_id_key<T>(id: pfsc_ids::Id<T>) -> u32 {
    // `Id` exposes no public numeric accessor beyond `index()`; this helper
    // just narrows that back to something hashable here.
    id.index() as u32
}

struct Builder<'m> {
    module: &'m mut Module,
    module_root: Libpath,
    names_encountered_by_scope: Vec<HashSet<String>>,
}

pub fn build_module_from_parsed(
    libpath: &Libpath,
    parsed: ParsedModule,
    loading_version: Version,
) -> Result<Module, PfscError> {
    let mut module = Module {
        libpath: libpath.clone(),
        loading_version,
        represented_version: loading_version,
        dependencies: IndexMap::new(),
        items: IndexMap::new(),
        deducs: Arena::new(),
        subdeducs: Arena::new(),
        nodes: Arena::new(),
        annos: Arena::new(),
        defns: Arena::new(),
        asgns: Arena::new(),
    };

    let anno_bodies: std::collections::HashMap<String, String> = parsed
        .anno_bodies
        .into_iter()
        .map(|b| (b.name, b.body))
        .collect();

    let mut b = Builder {
        module: &mut module,
        module_root: libpath.clone(),
        names_encountered_by_scope: vec![HashSet::new()],
    };

    for item in parsed.ast.items {
        b.add_module_item(libpath, item, &anno_bodies)?;
    }

    Ok(module)
}

impl<'m> Builder<'m> {
    fn ban_duplicate(&mut self, name: &str) -> Result<(), PfscError> {
        let scope = self.names_encountered_by_scope.last_mut().unwrap();
        if !scope.insert(name.to_string()) {
            return Err(PfscError::new(
                PECode::DuplicateDefinitionInPfscModule,
                format!("duplicate definition of {name:?} in the same scope"),
            ));
        }
        Ok(())
    }

    fn add_module_item(
        &mut self,
        owner: &Libpath,
        item: ast::Item,
        anno_bodies: &std::collections::HashMap<String, String>,
    ) -> Result<(), PfscError> {
        match item {
            ast::Item::Import(_) => Ok(()), // import resolution is a loader concern
            ast::Item::Assignment(a) => {
                self.ban_duplicate(&a.lhs)?;
                let lp = owner.join(&a.lhs);
                let id = self.module.asgns.alloc(Assignment { libpath: lp.clone(), value: a.rhs });
                self.module.items.insert(a.lhs, ItemRef::Asgn(id));
                Ok(())
            }
            ast::Item::Defn(d) => {
                self.ban_duplicate(&d.name)?;
                let lp = owner.join(&d.name);
                let id = self.module.defns.alloc(Definition {
                    libpath: lp,
                    lhs: d.lhs_literal,
                    rhs: d.rhs_literal,
                });
                self.module.items.insert(d.name, ItemRef::Defn(id));
                Ok(())
            }
            ast::Item::Anno(a) => {
                self.ban_duplicate(&a.name)?;
                let lp = owner.join(&a.name);
                let targets = a.targets.iter().map(|t| resolve_relative(&self.module_root, t)).collect();
                let body = anno_bodies.get(&a.name).cloned().unwrap_or_default();
                let widget_decls = pfsc_syntax::widgets::scan_widgets(&body)?;
                let widgets = widget_decls
                    .into_iter()
                    .map(|w| {
                        let approvals = extract_approvals(&w.data);
                        crate::annotation::Widget {
                            libpath: lp.join(&w.name),
                            name: w.name,
                            data: w.data,
                            approvals,
                            origin: None,
                        }
                    })
                    .collect();
                let id = self.module.annos.alloc(Annotation {
                    libpath: lp,
                    targets,
                    tag: a.tag,
                    body,
                    widgets,
                    range: a.range,
                });
                self.module.items.insert(a.name, ItemRef::Anno(id));
                Ok(())
            }
            ast::Item::Deduc(d) => {
                self.ban_duplicate(&d.name)?;
                let lp = owner.join(&d.name);
                let targets: Vec<Libpath> =
                    d.targets.iter().map(|t| resolve_relative(&self.module_root, t)).collect();
                let rdefs = d
                    .rdefs
                    .iter()
                    .map(|(n, p)| (n.clone(), resolve_relative(&self.module_root, p)))
                    .collect();

                self.names_encountered_by_scope.push(HashSet::new());
                let mut children = self.add_deduc_contents(&lp, d.contents, anno_bodies)?;
                self.names_encountered_by_scope.pop();

                // A ghost stand-in for each target, so the dashgraph has
                // something of its own to point an expansion edge at even
                // when the real node lives in another deduction. Keyed by
                // the target's own libpath (not renamed into this
                // deduction's namespace), so it can never collide with one
                // of this deduction's own locally named children.
                let mut ghosts = Vec::with_capacity(targets.len());
                for target in &targets {
                    let ghost_id = self.module.nodes.alloc(Node::Ghost {
                        libpath: target.clone(),
                        points_to: target.clone(),
                        origin: None,
                    });
                    ghosts.push(DeducChild::Node(ghost_id));
                }
                ghosts.append(&mut children);
                let children = ghosts;

                let id = self.module.deducs.alloc(Deduction {
                    libpath: lp,
                    targets,
                    rdefs,
                    children,
                    range: d.range,
                    origin: None,
                });
                self.module.items.insert(d.name, ItemRef::Deduc(id));
                Ok(())
            }
        }
    }

    fn add_deduc_contents(
        &mut self,
        owner: &Libpath,
        contents: Vec<ast::DeducItem>,
        anno_bodies: &std::collections::HashMap<String, String>,
    ) -> Result<Vec<DeducChild>, PfscError> {
        let mut children = Vec::new();
        for item in contents {
            match item {
                ast::DeducItem::Assignment(a) => {
                    self.ban_duplicate(&a.lhs)?;
                    let lp = owner.join(&a.lhs);
                    self.module.asgns.alloc(Assignment { libpath: lp, value: a.rhs });
                }
                ast::DeducItem::Defn(d) => {
                    self.ban_duplicate(&d.name)?;
                    let lp = owner.join(&d.name);
                    self.module.defns.alloc(Definition {
                        libpath: lp,
                        lhs: d.lhs_literal,
                        rhs: d.rhs_literal,
                    });
                }
                ast::DeducItem::Node(n) => {
                    self.ban_duplicate(&n.name)?;
                    let lp = owner.join(&n.name);
                    let kind = match n.kind {
                        ast::NodeKind::Basic(b) => ModelNodeKind::Basic(b),
                        ast::NodeKind::Supp => ModelNodeKind::Supp,
                        ast::NodeKind::Wolog => ModelNodeKind::Wolog,
                        ast::NodeKind::False => ModelNodeKind::False,
                    };
                    let versus = n.versus.iter().map(|t| resolve_relative(&self.module_root, t)).collect();
                    let contra = n.contra.iter().map(|t| resolve_relative(&self.module_root, t)).collect();

                    self.names_encountered_by_scope.push(HashSet::new());
                    let grandchildren = self.add_deduc_contents(&lp, n.contents, anno_bodies)?;
                    self.names_encountered_by_scope.pop();

                    let node_id = self.module.nodes.alloc(Node::Real(RealNode {
                        libpath: lp,
                        kind,
                        versus,
                        contra,
                        children: grandchildren,
                        origin: None,
                        range: n.range,
                    }));
                    children.push(DeducChild::Node(node_id));
                }
                ast::DeducItem::SubDeduc(s) => {
                    self.ban_duplicate(&s.name)?;
                    let lp = owner.join(&s.name);
                    self.names_encountered_by_scope.push(HashSet::new());
                    let grandchildren = self.add_deduc_contents(&lp, s.contents, anno_bodies)?;
                    self.names_encountered_by_scope.pop();
                    let sub_id = self.module.subdeducs.alloc(SubDeduc {
                        libpath: lp,
                        children: grandchildren,
                        range: s.range,
                    });
                    children.push(DeducChild::SubDeduc(sub_id));
                }
            }
        }
        Ok(children)
    }
}

/// Targets/rdefs/versus/contra are written as dotted paths rooted at the
/// enclosing module (e.g. `Thm.A` names node `A` under sibling deduction
/// `Thm`), not as absolute libpaths; full cross-module relative-import
/// resolution happens one layer up, at the loader. A path that is already
/// prefixed with the module's own libpath is left alone, covering source
/// that spells a target out in full.
fn resolve_relative(module_root: &Libpath, raw: &str) -> Libpath {
    if module_root.is_prefix_of(&Libpath::new(raw)) {
        Libpath::new(raw)
    } else {
        module_root.join(raw)
    }
}

/// Pulls a widget's own `"approvals"` string out of its data literal, if it
/// declared one.
fn extract_approvals(data: &pfsc_syntax::json_literal::JsonValue) -> Option<String> {
    match data {
        pfsc_syntax::json_literal::JsonValue::Object(map) => match map.get("approvals") {
            Some(pfsc_syntax::json_literal::JsonValue::String(s)) => Some(s.clone()),
            _ => None,
        },
        _ => None,
    }
}
