//! The `OriginInjectionVisitor`: after `ModuleIndexInfo::compute_origins`
//! has decided each new entity's origin, this walks every loaded module's
//! nodes, deductions, and annotation widgets, stamping the computed origin
//! libpath onto each matching entity, so dashgraph rendering can tell a
//! moved entity's ghost from its true origin (spec.md §6's `realOrigin`).
//! This mirrors the original's `OriginInjectionVisitor.takes_origin`, which
//! covers deductions and widgets alongside nodes, not nodes alone.

use pfsc_core::Libpath;
use pfsc_index::Maj;
use pfsc_model::Module;
use std::collections::HashMap;

/// Stamps `origins` (libpath -> (origin libpath, origin major)) onto every
/// node, deduction, and widget in `module` whose libpath has a computed
/// origin. Only the origin libpath is carried onto the object model; the
/// major is index-side state the dashgraph renderer doesn't need.
pub fn inject_origins(module: &mut Module, origins: &HashMap<Libpath, (Libpath, Maj)>) {
    let node_ids: Vec<_> = module.nodes.iter().map(|(id, _)| id).collect();
    for id in node_ids {
        let libpath = module.nodes.get(id).libpath().clone();
        if let Some((origin, _major)) = origins.get(&libpath) {
            if origin != &libpath {
                module.nodes.get_mut(id).set_origin(origin.clone());
            }
        }
    }

    let deduc_ids: Vec<_> = module.deducs.iter().map(|(id, _)| id).collect();
    for id in deduc_ids {
        let libpath = module.deducs.get(id).libpath.clone();
        if let Some((origin, _major)) = origins.get(&libpath) {
            if origin != &libpath {
                module.deducs.get_mut(id).origin = Some(origin.clone());
            }
        }
    }

    let anno_ids: Vec<_> = module.annos.iter().map(|(id, _)| id).collect();
    for id in anno_ids {
        let widget_count = module.annos.get(id).widgets.len();
        for wi in 0..widget_count {
            let libpath = module.annos.get(id).widgets[wi].libpath.clone();
            if let Some((origin, _major)) = origins.get(&libpath) {
                if origin != &libpath {
                    module.annos.get_mut(id).widgets[wi].origin = Some(origin.clone());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pfsc_core::Version;
    use pfsc_syntax::parse_module_text;

    #[test]
    fn stamps_origin_only_when_it_differs_from_the_nodes_own_libpath() {
        let parsed = parse_module_text("deduc Thm {\n    asrt C {\n    }\n}\n").unwrap();
        let mut module =
            pfsc_model::build_module_from_parsed(&Libpath::new("a.b"), parsed, Version::Wip).unwrap();

        let mut origins = HashMap::new();
        origins.insert(Libpath::new("a.b.Thm.C"), (Libpath::new("a.b.Thm.C"), 1));
        inject_origins(&mut module, &origins);
        let (_, node) = module.nodes.iter().next().unwrap();
        assert_eq!(node.origin(), None);

        let mut origins = HashMap::new();
        origins.insert(Libpath::new("a.b.Thm.C"), (Libpath::new("a.b.Old.C"), 1));
        inject_origins(&mut module, &origins);
        let (_, node) = module.nodes.iter().next().unwrap();
        assert_eq!(node.origin(), Some(&Libpath::new("a.b.Old.C")));
    }

    #[test]
    fn stamps_origin_onto_a_deduction_that_moved() {
        let parsed = parse_module_text("deduc Thm {\n    asrt C {\n    }\n}\n").unwrap();
        let mut module =
            pfsc_model::build_module_from_parsed(&Libpath::new("a.b"), parsed, Version::Wip).unwrap();

        let mut origins = HashMap::new();
        origins.insert(Libpath::new("a.b.Thm"), (Libpath::new("a.old.Thm"), 1));
        inject_origins(&mut module, &origins);
        let (_, deduc) = module.deducs.iter().next().unwrap();
        assert_eq!(deduc.origin, Some(Libpath::new("a.old.Thm")));
    }

    #[test]
    fn stamps_origin_onto_a_widget_that_moved() {
        let parsed =
            parse_module_text("anno N @@@md\nwidget w1 = { type: 'CHART' }\n@@@md\n").unwrap();
        let mut module =
            pfsc_model::build_module_from_parsed(&Libpath::new("a.b"), parsed, Version::Wip).unwrap();

        let mut origins = HashMap::new();
        origins.insert(Libpath::new("a.b.N.w1"), (Libpath::new("a.old.N.w1"), 1));
        inject_origins(&mut module, &origins);
        let (_, anno) = module.annos.iter().next().unwrap();
        assert_eq!(anno.widgets[0].origin, Some(Libpath::new("a.old.N.w1")));
    }
}
