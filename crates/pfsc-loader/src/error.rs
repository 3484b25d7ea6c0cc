use pfsc_core::{Libpath, Version};

#[derive(Debug, thiserror::Error)]
pub enum LoaderError {
    #[error("cyclic import: {0} is already being loaded")]
    CyclicImport(Libpath),

    #[error("module {libpath} does not exist at version {version:?}")]
    ModuleDoesNotExist { libpath: Libpath, version: Version },

    #[error("no dependency entry for {repopath} in the root module's dependencies")]
    MissingDependencyVersion { repopath: Libpath },

    #[error("`from {0} import *` is forbidden when {0} is the importing module itself")]
    SelfWildcardImport(Libpath),

    #[error("`from . import {0}` may only name a submodule")]
    PlainRelativeImportMissingLocalName(String),

    #[error("cannot load numbered release {repopath}@{version:?}: it has not been indexed yet")]
    ReleaseNotIndexed { repopath: Libpath, version: Version },

    #[error(transparent)]
    Parse(#[from] pfsc_core::PfscError),
}

impl From<LoaderError> for pfsc_core::PfscError {
    fn from(err: LoaderError) -> Self {
        use pfsc_core::PECode;
        if let LoaderError::Parse(inner) = err {
            return inner;
        }
        let code = match &err {
            LoaderError::CyclicImport(_) => PECode::CyclicImportError,
            LoaderError::ModuleDoesNotExist { .. } => PECode::ModuleDoesNotExist,
            LoaderError::MissingDependencyVersion { .. } => PECode::MissingRepoDependencyInfo,
            LoaderError::SelfWildcardImport(_) => PECode::ModuleDoesNotContainObject,
            LoaderError::PlainRelativeImportMissingLocalName(_) => {
                PECode::PlainRelativeImportMissingLocalName
            }
            LoaderError::ReleaseNotIndexed { .. } => PECode::VersionNotBuiltYet,
            LoaderError::Parse(_) => unreachable!("handled above"),
        };
        pfsc_core::PfscError::new(code, err.to_string())
    }
}
