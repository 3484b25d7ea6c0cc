//! A generic recursive walk over a module's native item tree, used by both
//! the indexer (origin computation, node/edge emission) and the dashgraph
//! renderer so neither has to re-implement deduction/node/sub-deduction
//! recursion.

use crate::deduction::{DeducId, SubDeducId};
use crate::module::{ItemRef, Module};
use crate::node::{DeducChild, NodeId};

/// Callbacks fired while walking a module's object tree. Every method has a
/// default no-op body so a visitor only needs to implement the hooks it
/// cares about.
pub trait ItemVisitor {
    fn visit_deduc(&mut self, _module: &Module, _id: DeducId) {}
    fn visit_subdeduc(&mut self, _module: &Module, _id: SubDeducId) {}
    fn visit_node(&mut self, _module: &Module, _id: NodeId) {}
}

pub fn recursive_item_visit<V: ItemVisitor>(module: &Module, visitor: &mut V) {
    for (_, item) in module.native_items_in_def_order() {
        if let ItemRef::Deduc(id) = item {
            visit_deduc(module, id, visitor);
        }
    }
}

fn visit_deduc<V: ItemVisitor>(module: &Module, id: DeducId, visitor: &mut V) {
    visitor.visit_deduc(module, id);
    let children = module.deducs.get(id).children.clone();
    visit_children(module, &children, visitor);
}

fn visit_subdeduc<V: ItemVisitor>(module: &Module, id: SubDeducId, visitor: &mut V) {
    visitor.visit_subdeduc(module, id);
    let children = module.subdeducs.get(id).children.clone();
    visit_children(module, &children, visitor);
}

fn visit_node<V: ItemVisitor>(module: &Module, id: NodeId, visitor: &mut V) {
    visitor.visit_node(module, id);
    if let crate::node::Node::Real(real) = module.nodes.get(id) {
        let children = real.children.clone();
        visit_children(module, &children, visitor);
    }
}

fn visit_children<V: ItemVisitor>(module: &Module, children: &[DeducChild], visitor: &mut V) {
    for child in children {
        match *child {
            DeducChild::Node(nid) => visit_node(module, nid, visitor),
            DeducChild::SubDeduc(sid) => visit_subdeduc(module, sid, visitor),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::build_module_from_parsed;
    use pfsc_core::{Libpath, Version};
    use pfsc_syntax::parse_module_text;

    #[derive(Default)]
    struct Counter {
        deducs: u32,
        nodes: u32,
    }
    impl ItemVisitor for Counter {
        fn visit_deduc(&mut self, _module: &Module, _id: DeducId) {
            self.deducs += 1;
        }
        fn visit_node(&mut self, _module: &Module, _id: NodeId) {
            self.nodes += 1;
        }
    }

    #[test]
    fn counts_nested_nodes_and_deducs() {
        let parsed = parse_module_text(
            "deduc Thm of Other.C {\n    asrt A {\n        asrt Inner {\n        }\n    }\n    asrt B {\n    }\n}\n",
        )
        .unwrap();
        let module =
            build_module_from_parsed(&Libpath::new("test.lib"), parsed, Version::Wip).unwrap();
        let mut counter = Counter::default();
        recursive_item_visit(&module, &mut counter);
        assert_eq!(counter.deducs, 1);
        // The ghost stand-in for the `of Other.C` target counts as a node
        // too, alongside A, Inner and B.
        assert_eq!(counter.nodes, 4);
    }
}
