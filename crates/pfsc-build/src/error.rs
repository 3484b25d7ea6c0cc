use pfsc_core::Libpath;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Pfsc(#[from] pfsc_core::PfscError),

    #[error(transparent)]
    Loader(#[from] pfsc_loader::LoaderError),

    #[error("failed to walk {path}: {source}")]
    Walk { path: PathBuf, source: walkdir::Error },

    #[error("filesystem error at {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },

    #[error("repo root module for {repopath} has no change log, but {version} is a major version increment")]
    MissingChangeLog { repopath: Libpath, version: pfsc_core::Version },

    #[error("repo `{repopath}` declares a WIP dependency version for `{dependency}`, which is forbidden in a release build")]
    WipDependencyInRelease { repopath: Libpath, dependency: Libpath },

    #[error("`{libpath}` was already built at {version} by this builder; pass force=true to rebuild")]
    AlreadyBuilt { libpath: Libpath, version: pfsc_core::Version },

    #[error("no repo root module found under {0}; cannot determine change log or dependencies")]
    NoRepoRootModule(Libpath),
}

impl From<BuildError> for pfsc_core::PfscError {
    fn from(err: BuildError) -> Self {
        use pfsc_core::PECode;
        if let BuildError::Pfsc(inner) = err {
            return inner;
        }
        if let BuildError::Loader(inner) = err {
            return inner.into();
        }
        let code = match &err {
            BuildError::Walk { .. } => PECode::ModuleHasNoContents,
            BuildError::Io { .. } => PECode::ModuleHasNoContents,
            BuildError::MissingChangeLog { .. } => PECode::MissingRepoChangeLog,
            BuildError::WipDependencyInRelease { .. } => PECode::NoWipImportsInNumberedReleases,
            BuildError::AlreadyBuilt { .. } => PECode::ModuleHasNoContents,
            BuildError::NoRepoRootModule(_) => PECode::MissingRepoChangeLog,
            BuildError::Pfsc(_) | BuildError::Loader(_) => unreachable!("handled above"),
        };
        pfsc_core::PfscError::new(code, err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, BuildError>;
