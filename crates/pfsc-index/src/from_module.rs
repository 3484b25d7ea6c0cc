//! The accumulate phase: walk a loaded [`pfsc_model::Module`] and fill in a
//! [`ModuleIndexInfo`] with every native entity and the `TARGETS`/`EXPANDS`
//! relations between them.

use crate::graph::EdgeKind;
use crate::mii::ModuleIndexInfo;
use pfsc_model::{recursive_item_visit, DeducId, ItemRef, Module, NodeId};

struct Accumulator<'a> {
    mii: &'a mut ModuleIndexInfo,
}

impl pfsc_model::ItemVisitor for Accumulator<'_> {
    fn visit_deduc(&mut self, module: &Module, id: DeducId) {
        let deduc = module.deducs.get(id);
        self.mii.add_deduc(deduc.libpath.clone());

        if let Some(target_deduc) = deduc.target_deduc_libpath() {
            self.mii.add_relation(EdgeKind::Expands, deduc.libpath.clone(), target_deduc);
        }
        for target in &deduc.targets {
            self.mii.add_relation(EdgeKind::Targets, deduc.libpath.clone(), target.clone());
        }
    }

    fn visit_node(&mut self, module: &Module, id: NodeId) {
        if let pfsc_model::Node::Real(real) = module.nodes.get(id) {
            self.mii.add_generic(real.libpath.clone(), "NODE");
        }
    }
}

/// Builds the `ModuleIndexInfo` accumulation phase for `module`, attributed
/// to `major`. Callers still need to run `compute_mm_closure`,
/// `cut_add_validate`, `here_elsewhere_nowhere` and `compute_origins` before
/// handing the result to a [`crate::port::GraphWriter`].
pub fn accumulate_module(module: &Module, major: crate::graph::Maj) -> ModuleIndexInfo {
    let mut mii = ModuleIndexInfo::new(module.libpath.clone(), major);
    for (_, item) in module.native_items_in_def_order() {
        if let ItemRef::Anno(id) = item {
            let anno = module.annos.get(id);
            mii.add_anno(anno.libpath.clone());
            for widget in &anno.widgets {
                mii.add_generic(widget.libpath.clone(), "WIDGET");
            }
            for target in &anno.targets {
                mii.add_relation(EdgeKind::Notes, anno.libpath.clone(), target.clone());
            }
        }
    }
    let mut acc = Accumulator { mii: &mut mii };
    recursive_item_visit(module, &mut acc);
    mii
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mem_backend::InMemoryGraph;
    use pfsc_core::{Libpath, Version};

    #[test]
    fn accumulates_deducs_targets_and_nodes() {
        let parsed = pfsc_syntax::parse_module_text(
            "deduc Thm {\n    asrt C {\n    }\n}\ndeduc Pf of Thm.C {\n    asrt D {\n    }\n}\n",
        )
        .unwrap();
        let module =
            pfsc_model::build_module_from_parsed(&Libpath::new("test.lib"), parsed, Version::Wip)
                .unwrap();

        let mut mii = accumulate_module(&module, 1);
        let reader = InMemoryGraph::new();
        mii.compute_mm_closure(&reader).unwrap();
        mii.cut_add_validate(&reader).unwrap();
        mii.here_elsewhere_nowhere(&reader);
        mii.compute_origins(&reader);

        assert!(mii
            .pending_nodes
            .iter()
            .any(|n| n.libpath == Libpath::new("test.lib.Pf")));
        assert!(mii.pending_relations.iter().any(|r| r.kind == EdgeKind::Expands
            && r.src == Libpath::new("test.lib.Pf")
            && r.dst == Libpath::new("test.lib.Thm")));
        assert!(mii.pending_relations.iter().any(|r| r.kind == EdgeKind::Targets
            && r.src == Libpath::new("test.lib.Pf")
            && r.dst == Libpath::new("test.lib.Thm.C")));
    }

    #[test]
    fn accumulates_anno_targets_as_notes_relations_and_indexes_widgets() {
        let parsed = pfsc_syntax::parse_module_text(
            "deduc Thm {\n    asrt C {\n    }\n}\nanno Rmk on Thm.C @@@md\nwidget w1 = { type: 'CHART' }\n@@@md\n",
        )
        .unwrap();
        let module =
            pfsc_model::build_module_from_parsed(&Libpath::new("test.lib"), parsed, Version::Wip)
                .unwrap();

        let mii = accumulate_module(&module, 1);
        assert!(mii.pending_relations.iter().any(|r| r.kind == EdgeKind::Notes
            && r.src == Libpath::new("test.lib.Rmk")
            && r.dst == Libpath::new("test.lib.Thm.C")));
        assert!(mii
            .pending_nodes
            .iter()
            .any(|n| n.libpath == Libpath::new("test.lib.Rmk.w1") && n.node_type == "WIDGET"));
    }
}
