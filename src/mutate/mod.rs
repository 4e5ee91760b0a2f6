//! Atomic comment insertion with backup and restore.
//!
//! One call to [`MutationEngine::apply`] is one attempt on one file:
//!
//! 1. read the file and copy it to a sibling backup
//! 2. drop insertions whose element is already named by a comment above
//!    the insertion point
//! 3. splice the rest into the in-memory buffer, bottom-up
//! 4. replace the file atomically (tempfile + rename)
//! 5. delete the backup, or restore from it if 3 or 4 failed
//!
//! Concurrent attempts on the same file are not serialized.

pub mod errors;
pub mod fs;
mod plan;
pub mod preview;

pub use errors::{MutationError, MutationState};
pub use fs::{FileSystem, OsFileSystem};
pub use plan::{AppliedInsertion, SkipReason, SkippedInsertion, BLOCK_SCAN_LIMIT};
pub use preview::Preview;

use crate::comment::CommentStyle;
use crate::gaps::DEFAULT_WINDOW;
use crate::lang::Language;
use crate::synth::CommentInsertion;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};
use xxhash_rust::xxh3::xxh3_64;

pub const DEFAULT_BACKUP_SUFFIX: &str = ".neandoc.backup";

/// Outcome of a successful attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationReport {
    pub file: PathBuf,
    pub applied: Vec<AppliedInsertion>,
    pub skipped: Vec<SkippedInsertion>,
    pub state: MutationState,
}

impl MutationReport {
    pub fn changed(&self) -> bool {
        !self.applied.is_empty()
    }
}

struct Attempt<'a> {
    path: &'a Path,
    backup: PathBuf,
    state: MutationState,
}

impl<'a> Attempt<'a> {
    fn advance(&mut self, next: MutationState) {
        debug!(path = %self.path.display(), from = %self.state, to = %next, "mutation state");
        self.state = next;
    }
}

#[derive(Debug, Clone)]
pub struct MutationEngine<F: FileSystem = OsFileSystem> {
    fs: F,
    window: usize,
    backup_suffix: String,
}

impl Default for MutationEngine<OsFileSystem> {
    fn default() -> Self {
        Self::with_fs(OsFileSystem)
    }
}

impl MutationEngine<OsFileSystem> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<F: FileSystem> MutationEngine<F> {
    pub fn with_fs(fs: F) -> Self {
        Self {
            fs,
            window: DEFAULT_WINDOW,
            backup_suffix: DEFAULT_BACKUP_SUFFIX.to_string(),
        }
    }

    /// Lines above an insertion point searched by the duplicate guard.
    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window;
        self
    }

    pub fn with_backup_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.backup_suffix = suffix.into();
        self
    }

    pub fn file_system(&self) -> &F {
        &self.fs
    }

    /// `<path><suffix>`, next to the original.
    pub fn backup_path(&self, path: &Path) -> PathBuf {
        let mut name = path.as_os_str().to_owned();
        name.push(&self.backup_suffix);
        PathBuf::from(name)
    }

    /// Apply a batch of insertions to one file, all or nothing.
    ///
    /// Insertion lines refer to the file as it is when the call starts.
    pub fn apply(
        &self,
        path: impl AsRef<Path>,
        insertions: Vec<CommentInsertion>,
    ) -> Result<MutationReport, MutationError> {
        let path = path.as_ref();
        let mut attempt = Attempt {
            path,
            backup: self.backup_path(path),
            state: MutationState::NotStarted,
        };

        let original = self.read(path)?;
        let text = decode(path, &original)?;
        let original_hash = xxh3_64(&original);

        self.fs
            .copy(path, &attempt.backup)
            .map_err(|source| MutationError::Backup {
                path: path.to_path_buf(),
                backup: attempt.backup.clone(),
                source,
            })?;
        attempt.advance(MutationState::BackedUp);

        let refs: Vec<&CommentInsertion> = insertions.iter().collect();
        let plan = plan::plan(text, &refs, self.window, style_for(path));

        if let Some(bad) = plan.out_of_range() {
            let cause = MutationError::InvalidInsertion {
                path: path.to_path_buf(),
                line: bad.insertion_line,
                line_count: plan.line_count,
            };
            return Err(self.recover(&mut attempt, original_hash, cause));
        }

        for skip in &plan.skipped {
            warn!(
                path = %path.display(),
                element = %skip.element.name,
                line = skip.insertion_line,
                reason = %skip.reason,
                "skipping insertion"
            );
        }

        if !plan.applied.is_empty() {
            if let Err(source) = self.fs.write_atomic(path, plan.content.as_bytes()) {
                let cause = MutationError::Commit {
                    path: path.to_path_buf(),
                    source,
                };
                return Err(self.recover(&mut attempt, original_hash, cause));
            }
            attempt.advance(MutationState::Committed);
        }

        self.discard_backup(&attempt);
        attempt.advance(MutationState::CleanedUp);

        if !plan.applied.is_empty() {
            info!(
                path = %path.display(),
                inserted = plan.applied.len(),
                skipped = plan.skipped.len(),
                "documentation inserted"
            );
        }

        Ok(MutationReport {
            file: path.to_path_buf(),
            applied: plan.applied,
            skipped: plan.skipped,
            state: attempt.state,
        })
    }

    /// Compute what `apply` would write, reading the file only. Invalid
    /// insertion lines show up as skipped rather than as an error.
    pub fn preview(
        &self,
        path: impl AsRef<Path>,
        insertions: &[CommentInsertion],
    ) -> Result<Preview, MutationError> {
        let path = path.as_ref();
        let original = self.read(path)?;
        let text = decode(path, &original)?;

        let refs: Vec<&CommentInsertion> = insertions.iter().collect();
        let plan = plan::plan(text, &refs, self.window, style_for(path));

        Ok(Preview {
            file: path.to_path_buf(),
            original: text.to_string(),
            result: plan.content,
            applied: plan.applied,
            skipped: plan.skipped,
        })
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>, MutationError> {
        self.fs.read(path).map_err(|source| MutationError::Read {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Put the original back after a failure. The backup is kept when that
    /// does not work.
    fn recover(
        &self,
        attempt: &mut Attempt<'_>,
        original_hash: u64,
        cause: MutationError,
    ) -> MutationError {
        attempt.advance(MutationState::Failed);

        match self.restore(attempt.path, &attempt.backup, original_hash) {
            Ok(()) => {
                self.discard_backup(attempt);
                attempt.advance(MutationState::Restored);
                warn!(path = %attempt.path.display(), error = %cause, "mutation rolled back");
                cause
            }
            Err(restore_error) => {
                attempt.advance(MutationState::RestoreFailed);
                error!(
                    path = %attempt.path.display(),
                    backup = %attempt.backup.display(),
                    error = %cause,
                    restore_error = %restore_error,
                    "restore failed, manual recovery needed"
                );
                MutationError::RestoreFailed {
                    path: attempt.path.to_path_buf(),
                    backup: attempt.backup.clone(),
                    cause: Box::new(cause),
                    restore_error,
                }
            }
        }
    }

    fn restore(&self, path: &Path, backup: &Path, original_hash: u64) -> io::Result<()> {
        let saved = self.fs.read(backup)?;
        if xxh3_64(&saved) != original_hash {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "backup does not match the original content",
            ));
        }

        self.fs.write_atomic(path, &saved)?;

        if xxh3_64(&self.fs.read(path)?) != original_hash {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "restored file does not match the original content",
            ));
        }
        Ok(())
    }

    fn discard_backup(&self, attempt: &Attempt<'_>) {
        if let Err(err) = self.fs.remove(&attempt.backup) {
            warn!(backup = %attempt.backup.display(), error = %err, "failed to remove backup");
        }
    }
}

fn style_for(path: &Path) -> CommentStyle {
    CommentStyle::for_language(Language::from_path(path))
}

fn decode<'a>(path: &Path, bytes: &'a [u8]) -> Result<&'a str, MutationError> {
    std::str::from_utf8(bytes).map_err(|err| MutationError::Read {
        path: path.to_path_buf(),
        source: io::Error::new(io::ErrorKind::InvalidData, err),
    })
}
