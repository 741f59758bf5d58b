//! Project-level error kinds.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProjectError {
    /// The file lies under no loaded library root and carries a non-empty
    /// `within` clause, so it cannot form a standalone library either.
    #[error("no library contains {0}")]
    NoMatchingLibrary(PathBuf),

    /// Library names are unique within a project.
    #[error("a library named '{0}' is already loaded")]
    DuplicateLibrary(String),

    /// The library root is not a usable directory.
    #[error("invalid library root: {0}")]
    InvalidLibraryRoot(PathBuf),

    #[error("document not found: {0}")]
    DocumentNotFound(PathBuf),

    #[error("i/o error on {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ProjectError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ProjectError::Io {
            path: path.into(),
            source,
        }
    }
}
