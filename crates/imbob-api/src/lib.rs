//! JSON + SSE HTTP API for IMBOB.
//!
//! Exposes an axum [`Router`] backed by any
//! [`imbob_core::store::CollectionStore`]. Every person leaving the API passes
//! through the [`ScopeOverlay`] built by [`overlay`]; every mutation publishes
//! on the shared [`EventBus`].
//!
//! # Serving
//!
//! ```rust,ignore
//! let state = AppState::new(store, config);
//! axum::serve(listener, imbob_api::router(state)).await?;
//! ```

pub mod actors;
pub mod auth;
pub mod error;
pub mod events;
pub mod movies;
pub mod persons;
pub mod search;
pub mod triples;

use std::{path::PathBuf, sync::Arc, time::Instant};

use axum::{
  Json, Router, middleware,
  routing::{get, post},
};
use chrono::{DateTime, Utc};
use imbob_core::{
  bus::EventBus,
  entity::Entity,
  person::Person,
  scope::{AccessPolicy, Scope, ScopeOverlay},
  store::CollectionStore,
};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;

pub use auth::{Caller, StaticAccessPolicy};
pub use error::ApiError;
pub use events::RuntimeInfo;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
  pub host:          String,
  pub port:          u16,
  /// Directory holding the collection files.
  pub data_dir:      PathBuf,
  /// Reject requests that do not carry an authorized token.
  pub require_token: bool,
  pub tokens:        Vec<TokenGrant>,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:          "127.0.0.1".to_string(),
      port:          4000,
      data_dir:      PathBuf::from("data"),
      require_token: true,
      tokens:        Vec::new(),
    }
  }
}

/// One accepted bearer token and what it may see.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct TokenGrant {
  pub token:      String,
  #[serde(default)]
  pub scopes:     Vec<Scope>,
  /// The token is rejected from this instant on.
  pub expires_at: Option<DateTime<Utc>>,
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S> {
  pub store:      Arc<S>,
  pub bus:        EventBus,
  pub overlay:    Arc<ScopeOverlay>,
  pub policy:     Arc<dyn AccessPolicy>,
  pub config:     Arc<ServerConfig>,
  pub started_at: Instant,
}

impl<S: CollectionStore> AppState<S> {
  /// Assemble state with a [`StaticAccessPolicy`] over `config.tokens` and the
  /// standard [`overlay`].
  pub fn new(store: S, config: ServerConfig) -> Self {
    Self {
      store:      Arc::new(store),
      bus:        EventBus::new(),
      overlay:    Arc::new(overlay()),
      policy:     Arc::new(StaticAccessPolicy::new(config.tokens.clone())),
      config:     Arc::new(config),
      started_at: Instant::now(),
    }
  }
}

/// The scope policies of the API: person emails need `personal`, runtime
/// information needs `admin`.
pub fn overlay() -> ScopeOverlay {
  ScopeOverlay::builder()
    .redact_field::<Person>("email", Scope::Personal)
    .guard_type::<RuntimeInfo>(Scope::Admin)
    .build()
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the API router for `state`.
///
/// Everything except `GET /health` sits behind [`auth::require_access`].
pub fn router<S: CollectionStore>(state: AppState<S>) -> Router {
  Router::new()
    // Persons
    .route("/persons", get(persons::list::<S>).post(persons::create::<S>))
    .route("/persons/search", get(persons::search::<S>))
    .route("/persons/{id}", get(persons::get_one::<S>))
    .route("/persons/{id}/knows", get(persons::knows::<S>))
    .route("/persons/{id}/likes", get(persons::likes::<S>))
    .route("/persons/{id}/married_to", get(persons::married_to::<S>))
    .route("/persons/{id}/divorced_from", get(persons::divorced_from::<S>))
    // Actors and movies
    .route("/actors", get(actors::list::<S>))
    .route("/actors/{id}", get(actors::get_one::<S>))
    .route("/movies", get(movies::list::<S>).post(movies::create::<S>))
    .route("/movies/{id}", get(movies::get_one::<S>).put(movies::update::<S>))
    // Triples
    .route("/triples", get(triples::list::<S>).post(triples::create::<S>))
    // Search
    .route("/search", get(search::handler::<S>))
    // Events
    .route("/ping", post(events::ping::<S>))
    .route("/subscriptions/{channel}", get(events::subscribe::<S>))
    .route_layer(middleware::from_fn_with_state(
      state.clone(),
      auth::require_access::<S>,
    ))
    .route("/health", get(health))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

async fn health() -> Json<Value> { Json(json!({ "status": "ok" })) }

/// Load a record by id, mapping absence to
/// [`imbob_core::Error::EntityNotFound`].
pub(crate) async fn fetch<S: CollectionStore, T: Entity>(
  store: &S,
  id: &str,
) -> Result<T, ApiError> {
  store
    .get_by_id::<T>(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| {
      imbob_core::Error::EntityNotFound {
        collection: T::COLLECTION,
        id:         id.to_owned(),
      }
      .into()
    })
}

// ─── Tests ────────────────────────────────────────────────────────────────────
