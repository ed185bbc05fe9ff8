use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum MetasheetError {
    #[error("invalid study accession: {0}")]
    InvalidAccession(String),

    #[error("no display value configured for sheet name '{0}'")]
    SheetNaming(String),

    #[error("configured display name for '{name}' exceeds 31 characters: {display}")]
    SheetNameTooLong { name: String, display: String },

    #[error("malformed content for property '{property}': {reason}")]
    MalformedContent { property: String, reason: String },

    #[error("workbook error: {0}")]
    Workbook(String),

    #[error("no workbook or metadata found for study accession '{0}'")]
    MetadataNotFound(String),

    #[error("no entry found for key: {0}")]
    KeyNotFound(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("event error: {0}")]
    Event(String),

    #[error("server error: {0}")]
    Server(String),
}

impl From<rust_xlsxwriter::XlsxError> for MetasheetError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        MetasheetError::Workbook(err.to_string())
    }
}
