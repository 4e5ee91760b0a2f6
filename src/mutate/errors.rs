use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Where a single mutation attempt is, or where it ended.
///
/// `NotStarted -> BackedUp -> Committed -> CleanedUp` on success;
/// `BackedUp -> Failed -> Restored | RestoreFailed` otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationState {
    NotStarted,
    BackedUp,
    Committed,
    CleanedUp,
    Failed,
    Restored,
    RestoreFailed,
}

impl fmt::Display for MutationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MutationState::NotStarted => "not started",
            MutationState::BackedUp => "backed up",
            MutationState::Committed => "committed",
            MutationState::CleanedUp => "cleaned up",
            MutationState::Failed => "failed",
            MutationState::Restored => "restored",
            MutationState::RestoreFailed => "restore failed",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum MutationError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to back up {} to {}: {source}", path.display(), backup.display())]
    Backup {
        path: PathBuf,
        backup: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("insertion line {line} is outside {} ({line_count} lines)", path.display())]
    InvalidInsertion {
        path: PathBuf,
        line: usize,
        line_count: usize,
    },

    #[error("failed to write {}: {source}", path.display())]
    Commit {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "could not restore {} from {} after error ({cause}): {restore_error}; the backup has been kept",
        path.display(),
        backup.display()
    )]
    RestoreFailed {
        path: PathBuf,
        backup: PathBuf,
        cause: Box<MutationError>,
        #[source]
        restore_error: std::io::Error,
    },
}

impl MutationError {
    /// Terminal state of the attempt that produced this error.
    pub fn state(&self) -> MutationState {
        match self {
            MutationError::Read { .. } | MutationError::Backup { .. } => MutationState::NotStarted,
            MutationError::InvalidInsertion { .. } | MutationError::Commit { .. } => {
                MutationState::Restored
            }
            MutationError::RestoreFailed { .. } => MutationState::RestoreFailed,
        }
    }

    pub fn path(&self) -> &std::path::Path {
        match self {
            MutationError::Read { path, .. }
            | MutationError::Backup { path, .. }
            | MutationError::InvalidInsertion { path, .. }
            | MutationError::Commit { path, .. }
            | MutationError::RestoreFailed { path, .. } => path,
        }
    }

    /// The file may be inconsistent and needs manual recovery.
    pub fn is_critical(&self) -> bool {
        matches!(self, MutationError::RestoreFailed { .. })
    }
}
