use pfsc_core::Libpath;

#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("cannot redefine {libpath} at major {attempted}: it already exists at major {existing}")]
    RedefinitionAtLowerMajor {
        libpath: Libpath,
        existing: i64,
        attempted: i64,
    },

    #[error("move mapping for {0} forms a cycle")]
    CyclicMove(Libpath),
}

impl From<IndexError> for pfsc_core::PfscError {
    fn from(err: IndexError) -> Self {
        let code = match &err {
            IndexError::RedefinitionAtLowerMajor { .. } => {
                pfsc_core::PECode::DuplicateDefinitionInPfscModule
            }
            IndexError::CyclicMove(_) => pfsc_core::PECode::DagHasCycle,
        };
        pfsc_core::PfscError::new(code, err.to_string())
    }
}
