//! The error taxonomy shared by every crate in the workspace.

use std::fmt;

/// Stable error codes surfaced to callers, independent of the human-readable
/// message. Each variant corresponds to a named failure mode of the build
/// pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PECode {
    ParsingError,
    MalformedVersionTag,
    MalformedLibpath,
    CyclicImportError,
    ModuleDoesNotExist,
    ModuleDoesNotContainObject,
    ModuleHasNoContents,
    TargetDoesNotExist,
    TargetOfWrongType,
    TargetsBelongToDifferentDeducs,
    DuplicateDefinitionInPfscModule,
    DagHasCycle,
    MissingRepoChangeLog,
    MissingRepoDependencyInfo,
    NoWipImportsInNumberedReleases,
    AttemptedReleaseBuildOnSubRepo,
    VersionNotBuiltYet,
    MissingManifest,
    ManifestBadForm,
    PlainRelativeImportMissingLocalName,
}

impl PECode {
    pub const fn as_str(self) -> &'static str {
        match self {
            PECode::ParsingError => "PARSING_ERROR",
            PECode::MalformedVersionTag => "MALFORMED_VERSION_TAG",
            PECode::MalformedLibpath => "MALFORMED_LIBPATH",
            PECode::CyclicImportError => "CYCLIC_IMPORT_ERROR",
            PECode::ModuleDoesNotExist => "MODULE_DOES_NOT_EXIST",
            PECode::ModuleDoesNotContainObject => "MODULE_DOES_NOT_CONTAIN_OBJECT",
            PECode::ModuleHasNoContents => "MODULE_HAS_NO_CONTENTS",
            PECode::TargetDoesNotExist => "TARGET_DOES_NOT_EXIST",
            PECode::TargetOfWrongType => "TARGET_OF_WRONG_TYPE",
            PECode::TargetsBelongToDifferentDeducs => "TARGETS_BELONG_TO_DIFFERENT_DEDUCS",
            PECode::DuplicateDefinitionInPfscModule => "DUPLICATE_DEFINITION_IN_PFSC_MODULE",
            PECode::DagHasCycle => "DAG_HAS_CYCLE",
            PECode::MissingRepoChangeLog => "MISSING_REPO_CHANGE_LOG",
            PECode::MissingRepoDependencyInfo => "MISSING_REPO_DEPENDENCY_INFO",
            PECode::NoWipImportsInNumberedReleases => "NO_WIP_IMPORTS_IN_NUMBERED_RELEASES",
            PECode::AttemptedReleaseBuildOnSubRepo => "ATTEMPTED_RELEASE_BUILD_ON_SUB_REPO",
            PECode::VersionNotBuiltYet => "VERSION_NOT_BUILT_YET",
            PECode::MissingManifest => "MISSING_MANIFEST",
            PECode::ManifestBadForm => "MANIFEST_BAD_FORM",
            PECode::PlainRelativeImportMissingLocalName => {
                "PLAIN_RELATIVE_IMPORT_MISSING_LOCAL_NAME"
            }
        }
    }
}

impl fmt::Display for PECode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The error type threaded through the whole pipeline: a stable code plus a
/// human-readable message, and an optional source-level IO error.
#[derive(Debug, thiserror::Error)]
pub enum PfscError {
    #[error("[{code}] {message}")]
    Coded { code: PECode, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl PfscError {
    pub fn new(code: PECode, message: impl Into<String>) -> Self {
        PfscError::Coded {
            code,
            message: message.into(),
        }
    }

    /// The stable code, when this error carries one (IO errors do not).
    pub fn code(&self) -> Option<PECode> {
        match self {
            PfscError::Coded { code, .. } => Some(*code),
            PfscError::Io(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, PfscError>;
