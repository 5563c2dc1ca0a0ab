//! Error type shared by every stage of the compiler.

use std::path::PathBuf;

/// Anything that aborts a compilation run.
///
/// There is no partial-table recovery: the first error surfaces and the
/// run stops before the output directory is touched.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid option value, or a directory that is missing or outside the working tree
    #[error("{0}")]
    Config(String),

    /// Walking the route directory failed (unreadable entry, symlink loop, ...)
    #[error("failed to read {path}: {message}")]
    Discovery { path: PathBuf, message: String },

    /// Source inspection could not extract the exports of a file
    #[error("failed to inspect {path}: {message}")]
    Inspect { path: PathBuf, message: String },

    /// A route path produced an invalid matcher
    #[error("invalid pattern for route `{route}`: {message}")]
    Pattern { route: String, message: String },

    /// A table entry references a handler that was never registered
    #[error("no handler registered for `{0}`")]
    UnresolvedHandler(String),

    /// The bundler rejected the generated entry
    #[error("bundling failed: {0}")]
    Bundle(String),

    #[error("invalid config file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Error::Config(message.into())
    }

    pub(crate) fn inspect(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Error::Inspect {
            path: path.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
