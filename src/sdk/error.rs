use std::path::PathBuf;

use thiserror::Error;

/// Everything that can go wrong between the input files and the Amap API.
#[derive(Error, Debug)]
pub enum GaodeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("malformed table {path:?}: {detail}")]
    MalformedTable { path: PathBuf, detail: String },

    #[error("no column named {0:?} in table")]
    UnknownColumn(String),

    #[error("row index {0} out of range")]
    RowOutOfRange(usize),

    #[error("city {0:?} is not in the coordinate lookup")]
    UnknownCity(String),

    #[error("malformed location field {0:?} in geocode response")]
    MalformedLocation(String),

    // The vendor rejected the call; params are kept for diagnostics.
    #[error("API error ({info}) for request [{params}]")]
    Api { info: String, params: String },

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("failed to parse response body: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("AMAP_API_KEY is not set")]
    MissingApiKey,
}
