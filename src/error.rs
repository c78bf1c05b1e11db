//! Error taxonomy for both sync directions.
//!
//! Bus-level failures are handled where the reply arrives and only surface
//! as a single printed line plus a process exit code.

use std::time::Duration;

/// Which outstanding request produced an error reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    FindDocument,
    GetWindowList,
    SyncView,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::FindDocument => "FindDocument",
            Stage::GetWindowList => "GetWindowList",
            Stage::SyncView => "SyncView",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Wrong number or shape of command line arguments.
    #[error("invalid command line arguments: {0}")]
    Arguments(String),

    /// The viewer answered a request with an error reply.
    #[error("{message}")]
    Lookup { stage: Stage, message: String },

    /// Configured deadline expired before the viewer was ready.
    #[error("viewer did not become ready within {0:?}")]
    Timeout(Duration),

    /// Connection or transport failure on the session bus.
    #[error("session bus: {0}")]
    Bus(String),

    /// The editor side of the command channel went away or rejected a call.
    #[error("editor channel: {0}")]
    Editor(String),
}

impl SyncError {
    pub fn lookup(stage: Stage, message: impl Into<String>) -> Self {
        SyncError::Lookup {
            stage,
            message: message.into(),
        }
    }

    /// Line shown to the operator when a forward sync gives up.
    pub fn operator_message(&self) -> String {
        format!("Could not find document: {}", self)
    }
}

impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        SyncError::Editor(err.to_string())
    }
}

pub type SyncResult<T> = Result<T, SyncError>;
