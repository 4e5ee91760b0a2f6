pub mod loader;
pub mod schema;

pub use loader::{discover, load_from_path, load_from_str, ConfigError, Origin, DEFAULT_CONFIG_FILE};
pub use schema::{
    AnalysisConfig, Config, MutationConfig, SynthesisConfig, ValidationError, ValidationIssue,
    MAX_WINDOW,
};
