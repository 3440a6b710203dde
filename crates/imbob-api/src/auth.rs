//! Bearer-token access policy, request gate and [`Caller`] extractor.

use std::{collections::HashMap, convert::Infallible};

use axum::{
  extract::{FromRequestParts, Request, State},
  http::{HeaderMap, header, request::Parts},
  middleware::Next,
  response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use imbob_core::{
  scope::{AccessPolicy, Grants, Scope, bearer_token},
  store::CollectionStore,
};
use tracing::warn;

use crate::{AppState, TokenGrant, error::ApiError};

// ─── Policy ──────────────────────────────────────────────────────────────────

/// An [`AccessPolicy`] over a fixed set of configured tokens.
#[derive(Debug, Clone, Default)]
pub struct StaticAccessPolicy {
  grants: HashMap<String, TokenGrant>,
}

impl StaticAccessPolicy {
  pub fn new(grants: impl IntoIterator<Item = TokenGrant>) -> Self {
    Self {
      grants: grants.into_iter().map(|g| (g.token.clone(), g)).collect(),
    }
  }

  /// The grant for `token` as of `now`, if it exists and has not expired.
  fn live_at(&self, token: &str, now: DateTime<Utc>) -> Option<&TokenGrant> {
    self
      .grants
      .get(token)
      .filter(|g| g.expires_at.is_none_or(|exp| now < exp))
  }
}

impl AccessPolicy for StaticAccessPolicy {
  fn is_authorized(&self, token: &str) -> bool {
    self
      .live_at(token, Utc::now())
      .is_some_and(|g| !g.scopes.is_empty())
  }

  fn has_scope(&self, token: &str, scope: Scope) -> bool {
    self
      .live_at(token, Utc::now())
      .is_some_and(|g| g.scopes.contains(&scope))
  }
}

// ─── Request helpers ─────────────────────────────────────────────────────────

/// The bearer token from the `Authorization` header, if any.
pub fn request_token(headers: &HeaderMap) -> Option<&str> {
  headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(bearer_token)
}

/// What the caller behind `headers` may see.
pub fn grants_for(headers: &HeaderMap, policy: &dyn AccessPolicy) -> Grants {
  Grants::resolve(policy, request_token(headers))
}

/// Middleware: reject requests without an authorized token when the server
/// requires one.
pub async fn require_access<S: CollectionStore>(
  State(state): State<AppState<S>>,
  req: Request,
  next: Next,
) -> Response {
  if !state.config.require_token {
    return next.run(req).await;
  }
  let verdict = request_token(req.headers()).map(|t| state.policy.is_authorized(t));
  if verdict == Some(true) {
    return next.run(req).await;
  }
  warn!(
    path = %req.uri().path(),
    token_presented = verdict.is_some(),
    "rejected request without an authorized token"
  );
  ApiError::Unauthorized.into_response()
}

// ─── Extractor ───────────────────────────────────────────────────────────────

/// The caller's resolved [`Grants`], extracted once per request.
///
/// Never rejects: a missing or unknown token simply yields no scopes.
#[derive(Debug, Clone)]
pub struct Caller(pub Grants);

impl<S: CollectionStore> FromRequestParts<AppState<S>> for Caller {
  type Rejection = Infallible;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    Ok(Self(grants_for(&parts.headers, state.policy.as_ref())))
  }
}

#[cfg(test)]
mod tests {
  use chrono::Duration;

  use super::*;

  fn grant(token: &str, scopes: &[Scope], expires_at: Option<DateTime<Utc>>) -> TokenGrant {
    TokenGrant { token: token.into(), scopes: scopes.to_vec(), expires_at }
  }

  fn policy() -> StaticAccessPolicy {
    let now = Utc::now();
    StaticAccessPolicy::new([
      grant("reader", &[Scope::Read], None),
      grant("personal", &[Scope::Read, Scope::Personal], Some(now + Duration::hours(1))),
      grant("stale", &[Scope::Read, Scope::Admin], Some(now - Duration::hours(1))),
      grant("empty", &[], None),
    ])
  }

  #[test]
  fn known_scoped_tokens_are_authorized() {
    let p = policy();
    assert!(p.is_authorized("reader"));
    assert!(p.is_authorized("personal"));
    assert!(p.has_scope("personal", Scope::Personal));
    assert!(!p.has_scope("reader", Scope::Personal));
  }

  #[test]
  fn expired_unknown_and_scopeless_tokens_are_not() {
    let p = policy();
    assert!(!p.is_authorized("stale"));
    assert!(!p.has_scope("stale", Scope::Admin));
    assert!(!p.is_authorized("forged"));
    assert!(!p.is_authorized("empty"));
  }

  #[test]
  fn grants_from_headers() {
    let p = policy();
    let mut headers = HeaderMap::new();
    assert!(!grants_for(&headers, &p).is_authorized());

    headers.insert(header::AUTHORIZATION, "Bearer personal".parse().unwrap());
    let grants = grants_for(&headers, &p);
    assert!(grants.is_authorized());
    assert!(grants.has(Scope::Personal));
    assert!(!grants.has(Scope::Admin));

    headers.insert(header::AUTHORIZATION, "reader".parse().unwrap());
    assert!(grants_for(&headers, &p).has(Scope::Read));
  }
}
