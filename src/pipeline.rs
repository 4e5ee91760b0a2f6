//! Batch orchestration: extract, analyze, synthesize, mutate.
//!
//! Files are processed independently. A file that cannot be read or
//! mutated is reported in its [`FileOutcome`] and the batch goes on.

use crate::config::Config;
use crate::extract::{extract_file, ExtractError};
use crate::gaps::{FileGaps, GapAnalyzer};
use crate::model::CodeStructure;
use crate::mutate::{FileSystem, MutationEngine, MutationError, MutationReport, OsFileSystem, Preview};
use crate::source::{render_request, DocPayload, DocumentationSource, SourceError};
use crate::synth::CommentSynthesizer;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Write insertions to disk
    Apply,
    /// Compute insertions without writing
    Preview,
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Mutation(#[from] MutationError),
}

#[derive(Debug)]
pub enum FileStatus {
    /// Nothing to insert
    Unchanged,
    Applied(MutationReport),
    Previewed(Preview),
    Failed(PipelineError),
}

#[derive(Debug)]
pub struct FileOutcome {
    pub path: PathBuf,
    /// Missing sections found by the analyzer
    pub missing: usize,
    pub status: FileStatus,
}

impl FileOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self.status, FileStatus::Failed(_))
    }
}

/// Structures extracted from a batch of paths, in input order.
#[derive(Debug)]
pub struct Analysis {
    analyzer: GapAnalyzer,
    pub structures: Vec<CodeStructure>,
    pub failures: Vec<ExtractError>,
}

impl Analysis {
    pub fn gaps(&self) -> Vec<FileGaps<'_>> {
        self.structures
            .iter()
            .map(|s| self.analyzer.analyze(s))
            .collect()
    }

    /// Request text for the external assistant covering every gap.
    pub fn request(&self) -> String {
        render_request(&self.gaps())
    }
}

pub struct Pipeline<S, F: FileSystem = OsFileSystem> {
    analyzer: GapAnalyzer,
    synthesizer: CommentSynthesizer,
    source: S,
    engine: MutationEngine<F>,
}

impl<S: DocumentationSource> Pipeline<S> {
    pub fn from_config(config: &Config, source: S) -> Self {
        Pipeline::new(
            GapAnalyzer::new(config.analysis.window),
            CommentSynthesizer::new(config.synthesis.functions_only, config.synthesis.locale),
            source,
            MutationEngine::new()
                .with_window(config.mutation.window)
                .with_backup_suffix(config.mutation.backup_suffix.clone()),
        )
    }
}

impl<S: DocumentationSource, F: FileSystem> Pipeline<S, F> {
    pub fn new(
        analyzer: GapAnalyzer,
        synthesizer: CommentSynthesizer,
        source: S,
        engine: MutationEngine<F>,
    ) -> Self {
        Self {
            analyzer,
            synthesizer,
            source,
            engine,
        }
    }

    pub fn engine(&self) -> &MutationEngine<F> {
        &self.engine
    }

    /// Extract every path. Unreadable files are collected, not fatal.
    pub fn analyze<P: AsRef<Path>>(&self, paths: &[P]) -> Analysis {
        let mut structures = Vec::new();
        let mut failures = Vec::new();
        for path in paths {
            match extract_file(path) {
                Ok(structure) => structures.push(structure),
                Err(err) => {
                    warn!(path = %err.path().display(), error = %err, "extraction failed");
                    failures.push(err);
                }
            }
        }
        Analysis {
            analyzer: self.analyzer,
            structures,
            failures,
        }
    }

    /// Run the whole chain over `paths`, one outcome per path, in input
    /// order.
    ///
    /// A file named more than once (under any spelling) is processed for its
    /// first occurrence only; later occurrences report `Unchanged`. Running
    /// it again would reuse line numbers the first write made stale.
    pub fn run<P: AsRef<Path>>(&self, paths: &[P], mode: RunMode) -> Vec<FileOutcome> {
        let mut slots: Vec<Option<FileOutcome>> = Vec::with_capacity(paths.len());
        let mut structures = Vec::new();
        let mut seen = HashSet::new();

        for (index, path) in paths.iter().enumerate() {
            let path = path.as_ref();
            if !seen.insert(file_key(path)) {
                debug!(path = %path.display(), "path repeated in batch, already handled");
                slots.push(Some(FileOutcome {
                    path: path.to_path_buf(),
                    missing: 0,
                    status: FileStatus::Unchanged,
                }));
                continue;
            }

            match extract_file(path) {
                Ok(structure) => {
                    structures.push((index, structure));
                    slots.push(None);
                }
                Err(err) => {
                    warn!(path = %err.path().display(), error = %err, "extraction failed");
                    slots.push(Some(FileOutcome {
                        path: path.to_path_buf(),
                        missing: 0,
                        status: FileStatus::Failed(err.into()),
                    }));
                }
            }
        }

        let gaps: Vec<FileGaps<'_>> = structures
            .iter()
            .map(|(_, s)| self.analyzer.analyze(s))
            .collect();
        let payload = self.fetch(&gaps);

        for ((index, _), file) in structures.iter().zip(&gaps) {
            slots[*index] = Some(self.run_file(file, &payload, mode));
        }

        slots.into_iter().flatten().collect()
    }

    fn fetch(&self, gaps: &[FileGaps<'_>]) -> DocPayload {
        let pending: Vec<FileGaps<'_>> = gaps
            .iter()
            .filter(|g| g.has_missing_docs())
            .cloned()
            .collect();
        if pending.is_empty() {
            return DocPayload::default();
        }

        match self.source.fetch(&pending) {
            Ok(payload) => payload,
            Err(SourceError::Unavailable(reason)) => {
                debug!(%reason, "using fallback templates");
                DocPayload::default()
            }
            Err(err) => {
                warn!(error = %err, "documentation source failed, using fallback templates");
                DocPayload::default()
            }
        }
    }

    fn run_file(&self, file: &FileGaps<'_>, payload: &DocPayload, mode: RunMode) -> FileOutcome {
        let path = file.structure.path().to_path_buf();
        let missing = file.missing_count();
        let insertions = self.synthesizer.synthesize_gaps(file, payload);

        let status = if insertions.is_empty() {
            FileStatus::Unchanged
        } else {
            match mode {
                RunMode::Apply => match self.engine.apply(&path, insertions) {
                    Ok(report) => FileStatus::Applied(report),
                    Err(err) => {
                        warn!(path = %path.display(), error = %err, "mutation failed");
                        FileStatus::Failed(err.into())
                    }
                },
                RunMode::Preview => match self.engine.preview(&path, &insertions) {
                    Ok(preview) => FileStatus::Previewed(preview),
                    Err(err) => FileStatus::Failed(err.into()),
                },
            }
        };

        FileOutcome {
            path,
            missing,
            status,
        }
    }
}

/// Identity of a file for duplicate detection: its canonical path when it
/// resolves, the path as given otherwise.
pub(crate) fn file_key(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
