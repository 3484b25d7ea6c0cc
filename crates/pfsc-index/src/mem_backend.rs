//! An in-memory reference implementation of [`GraphReader`]/[`GraphWriter`],
//! doubling as the test backend: a single mutex-guarded store, matching the
//! "single session per writer; one open transaction at a time" resource
//! model.

use crate::graph::{DbId, EdgeKind, KNode, KRelation, Maj, NewTargetingReln, INF_MAJ, WIP_MAJ};
use crate::mii::ModuleIndexInfo;
use crate::port::{GraphReader, GraphWriter, TxId};
use pfsc_core::{Libpath, PfscError};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

#[derive(Default)]
struct Store {
    nodes: Vec<KNode>,
    relations: Vec<KRelation>,
    origins: std::collections::HashMap<Libpath, (Libpath, Maj)>,
}

pub struct InMemoryGraph {
    store: Mutex<Store>,
    next_id: AtomicU64,
    tx_counter: AtomicU64,
}

impl Default for InMemoryGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryGraph {
    pub fn new() -> Self {
        InMemoryGraph {
            store: Mutex::new(Store::default()),
            next_id: AtomicU64::new(1),
            tx_counter: AtomicU64::new(1),
        }
    }

    fn alloc_id(&self) -> DbId {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }
}

impl GraphReader for InMemoryGraph {
    fn find_live_node(&self, libpath: &Libpath, version: Maj) -> Option<KNode> {
        let store = self.store.lock().expect("in-memory graph lock poisoned");
        store
            .nodes
            .iter()
            .find(|n| &n.libpath == libpath && n.is_live_at(version))
            .cloned()
    }

    fn find_node_at_major(&self, libpath: &Libpath, major: Maj) -> Option<KNode> {
        let store = self.store.lock().expect("in-memory graph lock poisoned");
        store
            .nodes
            .iter()
            .find(|n| &n.libpath == libpath && n.major == major)
            .cloned()
    }

    fn find_move_conjugate_chain(&self, head_libpath: &Libpath, head_major: Maj) -> Vec<KNode> {
        let store = self.store.lock().expect("in-memory graph lock poisoned");
        let Some(start) = store
            .nodes
            .iter()
            .find(|n| &n.libpath == head_libpath && n.major == head_major)
        else {
            return Vec::new();
        };
        let mut chain = Vec::new();
        let mut current_id = start.db_id;
        loop {
            let Some(edge) = store
                .relations
                .iter()
                .find(|r| r.kind == EdgeKind::Move && r.src == current_id)
            else {
                break;
            };
            let Some(dst_node) = store.nodes.iter().find(|n| n.db_id == edge.dst) else {
                break;
            };
            chain.push(dst_node.clone());
            current_id = dst_node.db_id;
        }
        chain
    }

    fn find_existing_enrichments_of(
        &self,
        moved_from: &Libpath,
        version: Maj,
    ) -> Vec<NewTargetingReln> {
        let store = self.store.lock().expect("in-memory graph lock poisoned");
        let Some(target) = store
            .nodes
            .iter()
            .find(|n| &n.libpath == moved_from && n.is_live_at(version))
        else {
            return Vec::new();
        };
        store
            .relations
            .iter()
            .filter(|r| {
                (r.kind == EdgeKind::Targets || r.kind == EdgeKind::Expands) && r.dst == target.db_id
            })
            .filter_map(|r| {
                let head = store.nodes.iter().find(|n| n.db_id == r.src)?;
                Some(NewTargetingReln {
                    reln_db_id: r.db_id,
                    head_libpath: head.libpath.clone(),
                    head_major: head.major,
                    tail_libpath: target.libpath.clone(),
                    tail_major: target.major,
                })
            })
            .collect()
    }

    fn origin_of(&self, libpath: &Libpath) -> Option<(Libpath, Maj)> {
        let store = self.store.lock().expect("in-memory graph lock poisoned");
        store.origins.get(libpath).cloned()
    }

    fn current_major_version(&self, repopath: &Libpath) -> Option<Maj> {
        let store = self.store.lock().expect("in-memory graph lock poisoned");
        store
            .nodes
            .iter()
            .filter(|n| repopath.is_prefix_of(&n.libpath) && n.major != WIP_MAJ)
            .map(|n| n.major)
            .max()
    }
}

impl GraphWriter for InMemoryGraph {
    fn reader(&self) -> &dyn GraphReader {
        self
    }

    fn begin_transaction(&self) -> TxId {
        TxId(self.tx_counter.fetch_add(1, Ordering::Relaxed))
    }

    fn commit_transaction(&self, _tx: TxId) -> Result<(), PfscError> {
        Ok(())
    }

    fn rollback_transaction(&self, _tx: TxId) {
        // The in-memory backend applies writes immediately; a real
        // transactional backend would discard the buffered write set here.
    }

    fn ix0200(&self, mii: &ModuleIndexInfo, _tx: &TxId) -> Result<Vec<NewTargetingReln>, PfscError> {
        let mut store = self.store.lock().expect("in-memory graph lock poisoned");
        let cut_to = if mii.major == WIP_MAJ { WIP_MAJ } else { mii.major };

        for libpath in &mii.v_cut {
            for n in store.nodes.iter_mut() {
                if &n.libpath == libpath && n.cut == INF_MAJ {
                    n.cut = cut_to;
                }
            }
        }

        let mut libpath_to_id = std::collections::HashMap::new();
        for pending in &mii.pending_nodes {
            let db_id = self.alloc_id();
            store.nodes.push(KNode {
                db_id,
                libpath: pending.libpath.clone(),
                node_type: pending.node_type.clone(),
                major: mii.major,
                cut: INF_MAJ,
            });
            libpath_to_id.insert(pending.libpath.clone(), db_id);
        }

        let mut new_relns = Vec::new();
        for rel in &mii.pending_relations {
            let Some(&src_id) = libpath_to_id.get(&rel.src) else { continue };
            let dst_id = libpath_to_id
                .get(&rel.dst)
                .copied()
                .or_else(|| store.nodes.iter().find(|n| n.libpath == rel.dst).map(|n| n.db_id));
            let Some(dst_id) = dst_id else { continue };
            let db_id = self.alloc_id();
            store.relations.push(KRelation {
                db_id,
                kind: rel.kind,
                src: src_id,
                dst: dst_id,
                major: mii.major,
                cut: INF_MAJ,
            });
            if matches!(rel.kind, EdgeKind::Targets | EdgeKind::Expands) {
                let head = store.nodes.iter().find(|n| n.db_id == src_id).unwrap();
                let tail = store.nodes.iter().find(|n| n.db_id == dst_id).unwrap();
                new_relns.push(NewTargetingReln {
                    reln_db_id: db_id,
                    head_libpath: head.libpath.clone(),
                    head_major: head.major,
                    tail_libpath: tail.libpath.clone(),
                    tail_major: tail.major,
                });
            }
        }

        for (libpath, (origin_lp, origin_maj)) in &mii.origins {
            store.origins.insert(libpath.clone(), (origin_lp.clone(), *origin_maj));
        }

        Ok(new_relns)
    }

    fn ix0330(&self, mii: &ModuleIndexInfo, _tx: &TxId) -> Result<(), PfscError> {
        let mut store = self.store.lock().expect("in-memory graph lock poisoned");
        for (src, dst) in &mii.move_mapping {
            let Some(src_node) = store
                .nodes
                .iter()
                .find(|n| &n.libpath == src && n.is_live_at(mii.current_maj_vers))
                .cloned()
            else {
                continue;
            };
            let dst_id = match dst {
                None => {
                    let id = self.alloc_id();
                    store.nodes.push(KNode {
                        db_id: id,
                        libpath: Libpath::new(format!("{}#void", src)),
                        node_type: "VOID".into(),
                        major: mii.major,
                        cut: INF_MAJ,
                    });
                    id
                }
                Some(dst) => {
                    let Some(dst_node) = store.nodes.iter().find(|n| &n.libpath == dst && n.major == mii.major)
                    else {
                        continue;
                    };
                    dst_node.db_id
                }
            };
            let db_id = self.alloc_id();
            store.relations.push(KRelation {
                db_id,
                kind: EdgeKind::Move,
                src: src_node.db_id,
                dst: dst_id,
                major: mii.major,
                cut: INF_MAJ,
            });
        }
        Ok(())
    }

    fn ix0360(
        &self,
        mii: &ModuleIndexInfo,
        new_targeting_relns: &[NewTargetingReln],
        _tx: &TxId,
    ) -> Result<(), PfscError> {
        for k in new_targeting_relns {
            let chain = self.find_move_conjugate_chain(&k.tail_libpath, k.tail_major);
            let mut store = self.store.lock().expect("in-memory graph lock poisoned");
            let Some(head_id) = store
                .nodes
                .iter()
                .find(|n| n.libpath == k.head_libpath && n.major == k.head_major)
                .map(|n| n.db_id)
            else {
                continue;
            };
            for conjugate in chain {
                let db_id = self.alloc_id();
                store.relations.push(KRelation {
                    db_id,
                    kind: EdgeKind::Retargets,
                    src: head_id,
                    dst: conjugate.db_id,
                    major: mii.major,
                    cut: INF_MAJ,
                });
            }
        }

        for (src, _dst) in &mii.move_mapping {
            let existing = self.find_existing_enrichments_of(src, mii.current_maj_vers);
            let chain = self.find_move_conjugate_chain(src, mii.current_maj_vers);
            if chain.is_empty() {
                continue;
            }
            let mut store = self.store.lock().expect("in-memory graph lock poisoned");
            for enrichment in existing {
                let Some(head_id) = store
                    .nodes
                    .iter()
                    .find(|n| n.libpath == enrichment.head_libpath && n.major == enrichment.head_major)
                    .map(|n| n.db_id)
                else {
                    continue;
                };
                for conjugate in &chain {
                    let db_id = self.alloc_id();
                    store.relations.push(KRelation {
                        db_id,
                        kind: EdgeKind::Retargets,
                        src: head_id,
                        dst: conjugate.db_id,
                        major: mii.major,
                        cut: INF_MAJ,
                    });
                }
            }
        }
        Ok(())
    }

    fn ix0400(&self, mii: &ModuleIndexInfo, _tx: &TxId) -> Result<(), PfscError> {
        let mut store = self.store.lock().expect("in-memory graph lock poisoned");
        let repopath = mii.modpath.repopath().unwrap_or_else(|| mii.modpath.clone());
        if let Some(existing) = store
            .nodes
            .iter_mut()
            .find(|n| n.node_type == "VERSION" && n.libpath == repopath && n.major == mii.major)
        {
            existing.cut = INF_MAJ;
            return Ok(());
        }
        let db_id = self.alloc_id();
        store.nodes.push(KNode {
            db_id,
            libpath: repopath,
            node_type: "VERSION".into(),
            major: mii.major,
            cut: INF_MAJ,
        });
        Ok(())
    }

    fn drop_wip_nodes_under_module(&self, modpath: &Libpath, _tx: &TxId) -> Result<(), PfscError> {
        let mut store = self.store.lock().expect("in-memory graph lock poisoned");
        let dropped: Vec<DbId> = store
            .nodes
            .iter()
            .filter(|n| n.major == WIP_MAJ && modpath.is_prefix_of(&n.libpath))
            .map(|n| n.db_id)
            .collect();
        store.nodes.retain(|n| !dropped.contains(&n.db_id));
        store
            .relations
            .retain(|r| !dropped.contains(&r.src) && !dropped.contains(&r.dst));
        Ok(())
    }

    fn undo_wip_cut(
        &self,
        node_db_ids: &[DbId],
        reln_db_ids: &[DbId],
        _tx: &TxId,
    ) -> Result<(), PfscError> {
        let mut store = self.store.lock().expect("in-memory graph lock poisoned");
        for n in store.nodes.iter_mut() {
            if node_db_ids.contains(&n.db_id) && n.cut == WIP_MAJ {
                n.cut = INF_MAJ;
            }
        }
        for r in store.relations.iter_mut() {
            if reln_db_ids.contains(&r.db_id) && r.cut == WIP_MAJ {
                r.cut = INF_MAJ;
            }
        }
        Ok(())
    }

    fn delete_full_wip_build(&self, repopath: &Libpath) -> Result<(), PfscError> {
        self.drop_wip_nodes_under_module(repopath, &TxId(0))?;
        let mut store = self.store.lock().expect("in-memory graph lock poisoned");
        store.nodes.retain(|n| !(n.node_type == "VERSION" && n.major == WIP_MAJ && &n.libpath == repopath));
        Ok(())
    }
}
