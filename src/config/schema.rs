use crate::gaps::DEFAULT_WINDOW;
use crate::mutate::DEFAULT_BACKUP_SUFFIX;
use crate::synth::Locale;
use serde::Deserialize;
use std::fmt;

/// Largest accepted look-back window.
pub const MAX_WINDOW: usize = 1000;

#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub mutation: MutationConfig,
    #[serde(default)]
    pub synthesis: SynthesisConfig,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Lines above an element searched for documentation markers
    #[serde(default = "default_window")]
    pub window: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct MutationConfig {
    /// Lines above an insertion point searched by the duplicate guard
    #[serde(default = "default_window")]
    pub window: usize,
    #[serde(default = "default_backup_suffix")]
    pub backup_suffix: String,
}

impl Default for MutationConfig {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
            backup_suffix: default_backup_suffix(),
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct SynthesisConfig {
    #[serde(default)]
    pub functions_only: bool,
    #[serde(default)]
    pub locale: Locale,
}

fn default_window() -> usize {
    DEFAULT_WINDOW
}

fn default_backup_suffix() -> String {
    DEFAULT_BACKUP_SUFFIX.to_string()
}

impl Config {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        for (field, window) in [
            ("analysis.window", self.analysis.window),
            ("mutation.window", self.mutation.window),
        ] {
            if !(1..=MAX_WINDOW).contains(&window) {
                issues.push(ValidationIssue::OutOfRange {
                    field,
                    value: window,
                });
            }
        }

        let suffix = &self.mutation.backup_suffix;
        if suffix.is_empty() {
            issues.push(ValidationIssue::InvalidSuffix {
                suffix: suffix.clone(),
                message: "must not be empty",
            });
        } else if !suffix.starts_with('.') {
            issues.push(ValidationIssue::InvalidSuffix {
                suffix: suffix.clone(),
                message: "must start with '.'",
            });
        }
        if suffix.contains(['/', '\\']) {
            issues.push(ValidationIssue::InvalidSuffix {
                suffix: suffix.clone(),
                message: "must not contain a path separator",
            });
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    OutOfRange {
        field: &'static str,
        value: usize,
    },
    InvalidSuffix {
        suffix: String,
        message: &'static str,
    },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::OutOfRange { field, value } => {
                write!(f, "'{field}' must be between 1 and {MAX_WINDOW}, got {value}")
            }
            ValidationIssue::InvalidSuffix { suffix, message } => {
                write!(f, "backup suffix '{suffix}' {message}")
            }
        }
    }
}
