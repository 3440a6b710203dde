//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  /// No token, or a token the access policy does not authorize.
  #[error("an authorized bearer token is required")]
  Unauthorized,

  #[error(transparent)]
  Core(#[from] imbob_core::Error),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  pub fn store(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Store(Box::new(e))
  }

  pub fn status(&self) -> StatusCode {
    use imbob_core::Error as Core;
    match self {
      Self::Unauthorized => StatusCode::UNAUTHORIZED,
      Self::Core(e) => match e {
        Core::InvalidPaginationSpec { .. }
        | Core::CursorNotFound(_)
        | Core::UnknownChannel(_) => StatusCode::BAD_REQUEST,
        Core::EntityNotFound { .. } => StatusCode::NOT_FOUND,
        Core::AuthorizationDenied { .. } => StatusCode::FORBIDDEN,
        Core::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
      },
      Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  /// Machine-readable code returned next to the message.
  pub fn code(&self) -> &'static str {
    match self {
      Self::Unauthorized => "UNAUTHORIZED",
      Self::Core(e) => e.code(),
      Self::Store(_) => "STORE_ERROR",
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    if status.is_server_error() {
      tracing::error!(error = %self, "request failed");
    }
    let body = json!({ "error": self.to_string(), "code": self.code() });
    let mut res = (status, Json(body)).into_response();
    if matches!(self, Self::Unauthorized) {
      res.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        HeaderValue::from_static("Bearer realm=\"imbob\""),
      );
    }
    res
  }
}
