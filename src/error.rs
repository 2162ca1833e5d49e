use std::path::PathBuf;

use thiserror::Error;

/// Result of an editing operation
pub type EditResult = Result<(), EditError>;

/// Errors that can occur during editing.
///
/// None of these are fatal. The toolbar glue is expected to drop
/// `NoSelection` and `NoFileChosen` without telling the user.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EditError {
    #[error("operation needs a non-empty selection")]
    NoSelection,
    #[error("no file was chosen")]
    NoFileChosen,
    #[error("unsupported file type `{0}`, expected an image")]
    UnsupportedMime(String),
}

impl EditError {
    /// Whether the error should be swallowed rather than reported
    pub fn is_silent(&self) -> bool {
        matches!(self, EditError::NoSelection | EditError::NoFileChosen)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
