use crate::config::schema::{Config, ValidationError};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "neandoc.toml";

/// Where a config document came from, for error messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    Inline,
    File(PathBuf),
}

impl Origin {
    pub fn path(&self) -> Option<&Path> {
        match self {
            Origin::Inline => None,
            Origin::File(path) => Some(path),
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::Inline => f.write_str("inline neandoc config"),
            Origin::File(path) => write!(f, "{}", path.display()),
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{origin} is not valid neandoc TOML: {source}")]
    Parse {
        origin: Origin,
        #[source]
        source: toml_edit::de::Error,
    },

    #[error("{origin} was rejected: {source}")]
    Invalid {
        origin: Origin,
        #[source]
        source: ValidationError,
    },
}

impl ConfigError {
    /// The file the error is about, if it came from one.
    pub fn path(&self) -> Option<&Path> {
        match self {
            ConfigError::Read { path, .. } => Some(path),
            ConfigError::Parse { origin, .. } | ConfigError::Invalid { origin, .. } => {
                origin.path()
            }
        }
    }
}

fn parse(input: &str, origin: Origin) -> Result<Config, ConfigError> {
    let config: Config = match toml_edit::de::from_str(input) {
        Ok(config) => config,
        Err(source) => return Err(ConfigError::Parse { origin, source }),
    };
    match config.validate() {
        Ok(()) => Ok(config),
        Err(source) => Err(ConfigError::Invalid { origin, source }),
    }
}

pub fn load_from_str(input: &str) -> Result<Config, ConfigError> {
    parse(input, Origin::Inline)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&contents, Origin::File(path.to_path_buf()))
}

/// Load `explicit` if given, else `neandoc.toml` in `dir` if it exists,
/// else defaults.
pub fn discover(explicit: Option<&Path>, dir: &Path) -> Result<Config, ConfigError> {
    if let Some(path) = explicit {
        return load_from_path(path);
    }
    let candidate = dir.join(DEFAULT_CONFIG_FILE);
    if candidate.is_file() {
        load_from_path(candidate)
    } else {
        Ok(Config::default())
    }
}
