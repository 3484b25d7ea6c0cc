//! Renders a deduction's native object tree into a "dashgraph": the nested
//! JSON structure the front-end viewer consumes to lay out a proof diagram.

use crate::deduction::DeducId;
use crate::module::Module;
use crate::node::{DeducChild, Node, NodeKind};
use serde_json::{json, Value};

pub fn render_deduc(module: &Module, id: DeducId) -> Value {
    let deduc = module.deducs.get(id);
    json!({
        "libpath": deduc.libpath.as_str(),
        "targets": deduc.targets.iter().map(|t| t.as_str().to_string()).collect::<Vec<_>>(),
        "children": render_children(module, &deduc.children),
    })
}

fn render_children(module: &Module, children: &[DeducChild]) -> Vec<Value> {
    children
        .iter()
        .map(|child| match *child {
            DeducChild::Node(id) => render_node(module, id),
            DeducChild::SubDeduc(id) => {
                let sub = module.subdeducs.get(id);
                json!({
                    "libpath": sub.libpath.as_str(),
                    "children": render_children(module, &sub.children),
                })
            }
        })
        .collect()
}

fn render_node(module: &Module, id: crate::node::NodeId) -> Value {
    match module.nodes.get(id) {
        Node::Ghost { libpath, points_to, .. } => json!({
            "libpath": libpath.as_str(),
            "ghost": true,
            "pointsTo": points_to.as_str(),
        }),
        Node::Real(real) => json!({
            "libpath": real.libpath.as_str(),
            "nodetype": node_kind_str(real.kind),
            "versus": real.versus.iter().map(|t| t.as_str().to_string()).collect::<Vec<_>>(),
            "contra": real.contra.iter().map(|t| t.as_str().to_string()).collect::<Vec<_>>(),
            "children": render_children(module, &real.children),
        }),
    }
}

fn node_kind_str(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::Basic(b) => match b {
            pfsc_syntax::ast::BasicNodeType::Asrt => "asrt",
            pfsc_syntax::ast::BasicNodeType::Cite => "cite",
            pfsc_syntax::ast::BasicNodeType::Exis => "exis",
            pfsc_syntax::ast::BasicNodeType::Intr => "intr",
            pfsc_syntax::ast::BasicNodeType::Mthd => "mthd",
            pfsc_syntax::ast::BasicNodeType::Rels => "rels",
            pfsc_syntax::ast::BasicNodeType::Univ => "univ",
            pfsc_syntax::ast::BasicNodeType::With => "with",
        },
        NodeKind::Supp => "supp",
        NodeKind::Wolog => "wolog",
        NodeKind::False => "false",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::{build_module_from_parsed, ItemRef};
    use pfsc_core::{Libpath, Version};
    use pfsc_syntax::parse_module_text;

    #[test]
    fn renders_nested_structure() {
        let parsed = parse_module_text(
            "deduc Thm of Other.C {\n    asrt A {\n    }\n}\n",
        )
        .unwrap();
        let module =
            build_module_from_parsed(&Libpath::new("test.lib"), parsed, Version::Wip).unwrap();
        let id = module
            .native_items_in_def_order()
            .find_map(|(_, r)| match r {
                ItemRef::Deduc(id) => Some(id),
                _ => None,
            })
            .unwrap();
        let dg = render_deduc(&module, id);
        assert_eq!(dg["libpath"], "test.lib.Thm");
        // Index 0 is the ghost stand-in for the expansion's target;
        // the deduction's own native content follows it.
        assert_eq!(dg["children"][0]["ghost"], true);
        assert_eq!(dg["children"][0]["pointsTo"], "test.lib.Other.C");
        assert_eq!(dg["children"][1]["nodetype"], "asrt");
    }
}
