use std::path::PathBuf;

use thiserror::Error;

/// A level could not be loaded. Recoverable: only the current load is aborted.
#[derive(Debug, Error)]
pub enum SceneLoadError {
    #[error("level {level} has no level document at {path}")]
    NotFound { level: usize, path: PathBuf },
    #[error("level {level} is not part of this game")]
    UnknownLevel { level: usize },
    #[error("failed to read level {level} from {path}: {source}")]
    Read {
        level: usize,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("level {level} document is malformed: {source}")]
    Parse {
        level: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("level {level} has no hidden objects")]
    EmptyScene { level: usize },
    #[error("level {level} declares object id {id:?} more than once")]
    DuplicateObjectId { level: usize, id: String },
    #[error("level {level} object {id:?} has a region with negative size")]
    MalformedRegion { level: usize, id: String },
}

impl SceneLoadError {
    pub fn level(&self) -> usize {
        match self {
            SceneLoadError::NotFound { level, .. }
            | SceneLoadError::UnknownLevel { level }
            | SceneLoadError::Read { level, .. }
            | SceneLoadError::Parse { level, .. }
            | SceneLoadError::EmptyScene { level }
            | SceneLoadError::DuplicateObjectId { level, .. }
            | SceneLoadError::MalformedRegion { level, .. } => *level,
        }
    }
}

/// The remote leaderboard failed a write, read or probe.
#[derive(Debug, Error)]
pub enum RemoteBackendError {
    #[error("remote leaderboard is unavailable: {0}")]
    Unavailable(String),
    #[error("remote leaderboard rejected the request: {0}")]
    Rejected(String),
    #[error("remote leaderboard I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("remote leaderboard data is malformed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Submission rejected before any I/O.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("player name cannot be empty")]
    EmptyName,
    #[error("completion time cannot be negative (got {0} ms)")]
    NegativeTime(i64),
}

/// Local key/value storage failure.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("local storage I/O failed for {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
    #[error("local storage data for {key} is malformed: {source}")]
    Serialization {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
pub enum LeaderboardError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// The entry is in the in-memory ranking but could not be written to storage.
    #[error("entry kept for this session only: {0}")]
    NotPersisted(#[source] StorageError),
    #[error("the local ranking is empty; nothing to export")]
    NothingToExport,
    #[error("there is no finished game waiting for a name")]
    NothingToSubmit,
    #[error("failed to write export to {path}: {source}")]
    Export {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Why a hit was not applied to the session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HitRejection {
    #[error("no scene is being played")]
    NotPlaying,
    #[error("the session is paused")]
    Paused,
    #[error("object {0:?} is not in the active scene")]
    UnknownObject(String),
    #[error("object {0:?} was already found")]
    AlreadyFound(String),
}
