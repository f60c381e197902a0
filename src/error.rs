//! Errors raised by the surroundings of the cube engine.
//!
//! Interactive requests never fail; they are dropped instead. Only loading
//! configuration and move lists can go wrong.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid coordinate key `{0}`")]
    InvalidKey(String),
    #[error("invalid layer level {0}, expected 0, 1 or 2")]
    InvalidLevel(u8),
    #[error("invalid turn direction {0}, expected 1 or -1")]
    InvalidDirection(i8),
    #[error("failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed JSON")]
    Json(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
