//! End-to-end behavior across extraction, analysis, synthesis and mutation.

mod properties;
mod scenarios;
