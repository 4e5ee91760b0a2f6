//! Neandoc: finds undocumented functions and classes and inserts
//! documentation blocks above them.
//!
//! # Architecture
//!
//! Data flows through four stages, each usable on its own:
//!
//! - [`extract`] turns source text into a flat [`CodeStructure`] using
//!   bounded, per-language pattern rules. No parser, no AST.
//! - [`gaps`] checks the lines above each function and class for a
//!   technical and a simple explanation.
//! - [`synth`] renders the block to insert, from an external
//!   [`DocPayload`] when one is available and from templates otherwise.
//! - [`mutate`] splices blocks into the file, bottom-up, with a backup and
//!   an atomic replace. A failed attempt restores the original bytes.
//!
//! [`pipeline`] runs the stages over many files; a failure in one file never
//! stops the rest.
//!
//! # Safety
//!
//! - Every pattern rule is bounded, so extraction is linear in input size
//! - Names that fail their identifier grammar never enter a structure
//! - Atomic file writes (tempfile + fsync + rename)
//! - Insertions already present above an element are skipped
//!
//! # Example
//!
//! ```no_run
//! use neandoc::{extract_file, CommentSynthesizer, DocPayload, GapAnalyzer, MutationEngine};
//!
//! let structure = extract_file("src/math.js")?;
//! let gaps = GapAnalyzer::default().analyze(&structure);
//! let insertions = CommentSynthesizer::default().synthesize_gaps(&gaps, &DocPayload::default());
//!
//! let report = MutationEngine::new().apply(structure.path(), insertions)?;
//! println!("inserted {} block(s)", report.applied.len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod comment;
pub mod config;
pub mod extract;
pub mod gaps;
pub mod lang;
pub mod model;
pub mod mutate;
pub mod pipeline;
pub mod schedule;
pub mod source;
pub mod synth;

// Re-exports
pub use config::{load_from_path, load_from_str, Config, ConfigError};
pub use extract::{extract_file, extract_source, ExtractError};
pub use gaps::{DocPresence, DocumentationGap, FileGaps, GapAnalyzer};
pub use lang::Language;
pub use model::{CodeStructure, ElementKind, LineIndex, StructuralElement};
pub use mutate::{
    FileSystem, MutationEngine, MutationError, MutationReport, MutationState, OsFileSystem,
    Preview,
};
pub use pipeline::{Analysis, FileOutcome, FileStatus, Pipeline, PipelineError, RunMode};
pub use schedule::Periodic;
pub use source::{
    render_request, DocPayload, DocumentationSource, PayloadEntry, PayloadFile, SourceError,
    Unavailable,
};
pub use synth::{CommentInsertion, CommentSynthesizer, DocText, ElementRef, Locale};
