use std::path::PathBuf;
use thiserror::Error;

/// Everything that can go wrong while loading inputs, auditing a URL or
/// writing the results. None of these abort the process; they are printed
/// and the run carries on (or ends) without a non-zero exit code.
#[derive(Debug, Error)]
pub enum AuditError {
    /// An input file could not be read.
    #[error("File {} could not be opened: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The request never produced a response, or its body could not be read.
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// The API answered with something other than `200 OK`.
    #[error("The API responded with status {0}")]
    Status(u16),

    /// The body was not the JSON document we expect.
    #[error("Could not decode the API response: {0}")]
    Decode(#[from] serde_json::Error),

    /// There is nothing to derive a CSV header from.
    #[error("No audit succeeded, there is nothing to write")]
    EmptyResult,

    #[error("Could not write the CSV file: {0}")]
    Csv(#[from] csv::Error),
}

impl AuditError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AuditError::Io {
            path: path.into(),
            source,
        }
    }
}
