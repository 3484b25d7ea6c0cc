//! Turns an in-memory [`pfsc_model::Module`] into writes against a versioned
//! graph store: accumulate (`ModuleIndexInfo`), close/validate, then hand the
//! result to a [`port::GraphWriter`] in a fixed phase order.

pub mod error;
pub mod from_module;
pub mod graph;
pub mod mem_backend;
pub mod mii;
pub mod port;

pub use error::IndexError;
pub use from_module::accumulate_module;
pub use graph::{DbId, EdgeKind, KNode, KRelation, Maj, NewTargetingReln, INF_MAJ, WIP_MAJ};
pub use mem_backend::InMemoryGraph;
pub use mii::{Locality, ModuleIndexInfo, PendingNode, PendingRelation};
pub use port::{GraphReader, GraphWriter, TxId};

use pfsc_core::PfscError;

/// Runs the full indexing sequence for one module build: `ix0200` (cut+add
/// nodes/relations) followed by `ix0330` (materialize moves), `ix0360`
/// (propagate retargeting) and `ix0400` (upsert the repo's `VERSION` node),
/// all inside one transaction.
pub fn write_module_index(
    writer: &dyn GraphWriter,
    mii: &ModuleIndexInfo,
) -> Result<(), PfscError> {
    let tx = writer.begin_transaction();
    let result = (|| {
        let new_targeting = writer.ix0200(mii, &tx)?;
        writer.ix0330(mii, &tx)?;
        writer.ix0360(mii, &new_targeting, &tx)?;
        writer.ix0400(mii, &tx)?;
        Ok(())
    })();
    match result {
        Ok(()) => {
            writer.commit_transaction(tx)?;
            Ok(())
        }
        Err(err) => {
            writer.rollback_transaction(tx);
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pfsc_core::Libpath;

    #[test]
    fn full_index_write_round_trips_a_simple_deduction() {
        let graph = InMemoryGraph::new();
        let mut mii = ModuleIndexInfo::new(Libpath::new("test.lib"), 1);
        mii.add_deduc(Libpath::new("test.lib.Thm"));
        mii.compute_mm_closure(&graph).unwrap();
        mii.cut_add_validate(&graph).unwrap();
        mii.here_elsewhere_nowhere(&graph);
        mii.compute_origins(&graph);

        write_module_index(&graph, &mii).unwrap();

        let node = graph.find_live_node(&Libpath::new("test.lib.Thm"), 1);
        assert!(node.is_some());
        assert_eq!(graph.current_major_version(&Libpath::new("test.lib")), Some(1));
    }

    #[test]
    fn rebuilding_at_a_lower_major_is_rejected() {
        let graph = InMemoryGraph::new();
        let mut first = ModuleIndexInfo::new(Libpath::new("test.lib"), 2);
        first.add_deduc(Libpath::new("test.lib.Thm"));
        first.compute_mm_closure(&graph).unwrap();
        first.cut_add_validate(&graph).unwrap();
        first.here_elsewhere_nowhere(&graph);
        first.compute_origins(&graph);
        write_module_index(&graph, &first).unwrap();

        let mut second = ModuleIndexInfo::new(Libpath::new("test.lib"), 1);
        second.add_deduc(Libpath::new("test.lib.Thm"));
        second.compute_mm_closure(&graph).unwrap();
        assert!(second.cut_add_validate(&graph).is_err());
    }
}
