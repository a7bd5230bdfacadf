use std::path::PathBuf;

use thiserror::Error;

/// Failure taxonomy for the collection and reporting pipeline.
///
/// Only `Configuration` and artifact write failures (`Io`, `Render`) abort a
/// run. `PathAccess` and `CorruptHistory` are degraded in place by their
/// callers; `AgentQuery` is fatal only when the run was started with
/// `--require-agents`.
#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("agent query failed: {0}")]
    AgentQuery(String),

    #[error("cannot access {path}: {source}")]
    PathAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt history row at line {line}: {reason}")]
    CorruptHistory { line: usize, reason: String },

    #[error("failed to render chart: {0}")]
    Render(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Process exit code for this error when it aborts a run:
    /// 1 = configuration, 2 = agent API, 3 = I/O or rendering.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Configuration(_) => 1,
            Error::AgentQuery(_) => 2,
            Error::PathAccess { .. } | Error::CorruptHistory { .. } | Error::Render(_) | Error::Io(_) => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
