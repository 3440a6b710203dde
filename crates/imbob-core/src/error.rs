//! Error types for `imbob-core`.

use thiserror::Error;

use crate::entity::Collection;

#[derive(Debug, Error)]
pub enum Error {
  /// Both `before` and `after` were supplied in one cursor specification.
  #[error(
    "before and after cursors are mutually exclusive (before: {before}, after: {after})"
  )]
  InvalidPaginationSpec { before: String, after: String },

  /// The supplied cursor does not identify any item in the sorted collection.
  #[error("cursor not found: {0}")]
  CursorNotFound(String),

  #[error("{collection} entity not found: {id}")]
  EntityNotFound { collection: Collection, id: String },

  /// A type-level scope guard rejected the caller.
  #[error("not authorized to resolve {type_name}")]
  AuthorizationDenied { type_name: &'static str },

  #[error("unknown channel: {0:?}")]
  UnknownChannel(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

impl Error {
  /// Stable machine-readable code, surfaced to API callers next to the
  /// message.
  pub fn code(&self) -> &'static str {
    match self {
      Self::InvalidPaginationSpec { .. } => "INVALID_PAGINATION_SPEC",
      Self::CursorNotFound(_) => "CURSOR_NOT_FOUND",
      Self::EntityNotFound { .. } => "ENTITY_NOT_FOUND",
      Self::AuthorizationDenied { .. } => "AUTHORIZATION_DENIED",
      Self::UnknownChannel(_) => "UNKNOWN_CHANNEL",
      Self::Serialization(_) => "SERIALIZATION",
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
