use std::path::PathBuf;
use thiserror::Error;

/// Failures reading a file for extraction.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is not valid UTF-8: {source}", path.display())]
    Undecodable {
        path: PathBuf,
        #[source]
        source: std::string::FromUtf8Error,
    },
}

impl ExtractError {
    pub fn path(&self) -> &std::path::Path {
        match self {
            ExtractError::Io { path, .. } | ExtractError::Undecodable { path, .. } => path,
        }
    }
}
