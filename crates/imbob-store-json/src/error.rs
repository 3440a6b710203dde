//! Error type for `imbob-store-json`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("i/o error on {path}: {source}")]
  Io {
    path:   PathBuf,
    source: std::io::Error,
  },

  /// The collection file is not a JSON array of records.
  #[error("malformed collection file {path}: {source}")]
  Malformed {
    path:   PathBuf,
    source: serde_json::Error,
  },

  /// A record could not be converted to or from its entity type.
  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
