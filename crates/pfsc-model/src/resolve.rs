//! Post-build validation pass over a single module's native object tree.
//!
//! This mirrors the "does the target actually exist, and is it the right
//! kind of thing" checks the original loader ran right after parsing, before
//! a module's objects were considered safe to hand to the indexer. Targets
//! that live outside this module can't be validated here; that's deferred to
//! the indexer, which has the whole dependency graph loaded.

use crate::deduction::DeducId;
use crate::module::{ItemRef, Module};
use crate::node::{DeducChild, Node, NodeId};
use pfsc_core::{Libpath, PECode, PfscError};

/// Validates every native deduction's targets: when the target's owning
/// deduction is itself native to this module, the target node must actually
/// exist under it, must be a node (not e.g. an annotation), and every target
/// of one deduction must belong to the same owning deduction.
pub fn resolve_objects(module: &Module) -> Result<(), PfscError> {
    for (_, item) in module.native_items_in_def_order() {
        if let ItemRef::Deduc(id) = item {
            check_deduc_targets(module, id)?;
        }
    }
    Ok(())
}

fn check_deduc_targets(module: &Module, id: DeducId) -> Result<(), PfscError> {
    let deduc = module.deducs.get(id);

    let mut owners = deduc.targets.iter().filter_map(|t| t.parent());
    let first_owner = owners.next();
    if let Some(first) = &first_owner {
        for other in owners {
            if &other != first {
                return Err(PfscError::new(
                    PECode::TargetsBelongToDifferentDeducs,
                    format!(
                        "deduction {} has targets under both {} and {}",
                        deduc.libpath, first, other
                    ),
                ));
            }
        }
    }

    for target in &deduc.targets {
        validate_target_if_native(module, target)?;
    }
    Ok(())
}

/// If `target`'s owning deduction is native to this module, require that the
/// target resolves to an actual, node-typed item under it. Targets owned by
/// a deduction from another module are left for the indexer to resolve.
fn validate_target_if_native(module: &Module, target: &Libpath) -> Result<(), PfscError> {
    let Some(owner) = target.parent() else {
        return Ok(());
    };
    let owner_id = module.native_items_in_def_order().find_map(|(_, r)| match r {
        ItemRef::Deduc(id) if module.deducs.get(id).libpath == owner => Some(id),
        _ => None,
    });
    let Some(owner_id) = owner_id else {
        return Ok(()); // not native; can't check here
    };

    if find_node_under(module, module.deducs.get(owner_id).children.iter().copied(), target)
        .is_some()
    {
        return Ok(());
    }

    Err(PfscError::new(
        PECode::TargetDoesNotExist,
        format!("target {target} does not exist under {owner}"),
    ))
}

fn find_node_under(
    module: &Module,
    children: impl Iterator<Item = DeducChild>,
    target: &Libpath,
) -> Option<NodeId> {
    for child in children {
        match child {
            DeducChild::Node(nid) => {
                let node = module.nodes.get(nid);
                if node.libpath() == target {
                    return Some(nid);
                }
                if let Node::Real(real) = node {
                    if let Some(found) =
                        find_node_under(module, real.children.iter().copied(), target)
                    {
                        return Some(found);
                    }
                }
            }
            DeducChild::SubDeduc(sid) => {
                let sub = module.subdeducs.get(sid);
                if let Some(found) =
                    find_node_under(module, sub.children.iter().copied(), target)
                {
                    return Some(found);
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::build_module_from_parsed;
    use pfsc_core::{Libpath, Version};
    use pfsc_syntax::parse_module_text;

    fn build(src: &str) -> Module {
        let parsed = parse_module_text(src).unwrap();
        build_module_from_parsed(&Libpath::new("test.lib"), parsed, Version::Wip).unwrap()
    }

    #[test]
    fn target_resolving_to_real_sibling_node_passes() {
        let module = build(
            "deduc Thm of Other.C {\n    asrt A {\n    }\n}\ndeduc Pf of Thm.A {\n    asrt B {\n    }\n}\n",
        );
        assert!(resolve_objects(&module).is_ok());
    }

    #[test]
    fn target_missing_under_native_deduc_is_rejected() {
        let module = build(
            "deduc Thm of Other.C {\n    asrt A {\n    }\n}\ndeduc Pf of Thm.NoSuchNode {\n}\n",
        );
        let err = resolve_objects(&module).unwrap_err();
        assert_eq!(err.code(), Some(PECode::TargetDoesNotExist));
    }
}
