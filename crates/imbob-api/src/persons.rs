//! Handlers for `/persons` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/persons` | Cursor params; default sort `last_name`; `null` when empty |
//! | `GET`  | `/persons/search` | `?first_name&last_name` plus cursor params |
//! | `POST` | `/persons` | Body: [`NewPerson`]; returns 201 + stored person |
//! | `GET`  | `/persons/{id}` | 404 if not found |
//! | `GET`  | `/persons/{id}/knows` | Connection; default sort `created_at` |
//! | `GET`  | `/persons/{id}/likes` | Connection; default sort `created_at` |
//! | `GET`  | `/persons/{id}/married_to` | Plain list |
//! | `GET`  | `/persons/{id}/divorced_from` | Plain list |
//!
//! Every person returned passes through the scope overlay.

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use imbob_core::{
  connection::{Connection, Page, build_connection, build_page},
  event::EventAction,
  graph,
  pagination::{CursorSpec, DEFAULT_SORT_FIELD},
  person::{NewPerson, Person},
  store::CollectionStore,
  triple::{Predicate, RelatedPerson, Triple},
};
use serde::Deserialize;
use serde_json::Value;

use crate::{AppState, Caller, error::ApiError, fetch};

/// Default order of relationship connections.
const RELATIONSHIP_SORT_FIELD: &str = "created_at";

fn resolve_page<S>(
  state: &AppState<S>,
  caller: &Caller,
  page: Option<Page<Person>>,
) -> Result<Option<Page<Value>>, ApiError> {
  let Caller(grants) = caller;
  Ok(
    page
      .map(|p| p.try_map(|person| state.overlay.resolve(&person, grants)))
      .transpose()?,
  )
}

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /persons[?after|before][&first|last][&sort_field_name]`
pub async fn list<S: CollectionStore>(
  State(state): State<AppState<S>>,
  caller: Caller,
  Query(spec): Query<CursorSpec>,
) -> Result<Json<Option<Page<Value>>>, ApiError> {
  let persons: Vec<Person> = state.store.list().await.map_err(ApiError::store)?;
  let page = build_page(&persons, &spec.with_default_sort(DEFAULT_SORT_FIELD))?;
  Ok(Json(resolve_page(&state, &caller, page)?))
}

// ─── Search ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Default)]
pub struct SearchParams {
  /// Exact first-name match.
  pub first_name:      Option<String>,
  /// Exact last-name match.
  pub last_name:       Option<String>,
  pub before:          Option<String>,
  pub after:           Option<String>,
  pub first:           Option<usize>,
  pub last:            Option<usize>,
  pub sort_field_name: Option<String>,
}

impl SearchParams {
  fn cursor_spec(&self) -> CursorSpec {
    CursorSpec {
      before:          self.before.clone(),
      after:           self.after.clone(),
      first:           self.first,
      last:            self.last,
      sort_field_name: self.sort_field_name.clone(),
    }
    .with_default_sort(DEFAULT_SORT_FIELD)
  }
}

/// `GET /persons/search[?first_name=...][&last_name=...][&<cursor params>]`
pub async fn search<S: CollectionStore>(
  State(state): State<AppState<S>>,
  caller: Caller,
  Query(params): Query<SearchParams>,
) -> Result<Json<Option<Page<Value>>>, ApiError> {
  let persons: Vec<Person> = state.store.list().await.map_err(ApiError::store)?;
  let matches = graph::filter_persons(
    persons,
    params.first_name.as_deref(),
    params.last_name.as_deref(),
  );
  let page = build_page(&matches, &params.cursor_spec())?;
  Ok(Json(resolve_page(&state, &caller, page)?))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /persons`, body: [`NewPerson`]
pub async fn create<S: CollectionStore>(
  State(state): State<AppState<S>>,
  Caller(grants): Caller,
  Json(body): Json<NewPerson>,
) -> Result<impl IntoResponse, ApiError> {
  let person = state
    .store
    .upsert(body.into_person())
    .await
    .map_err(ApiError::store)?;
  state.bus.publish_person(EventAction::Added, &person)?;
  Ok((StatusCode::CREATED, Json(state.overlay.resolve(&person, &grants)?)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /persons/{id}`
pub async fn get_one<S: CollectionStore>(
  State(state): State<AppState<S>>,
  Caller(grants): Caller,
  Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
  let person: Person = fetch(state.store.as_ref(), &id).await?;
  Ok(Json(state.overlay.resolve(&person, &grants)?))
}

// ─── Relationships ────────────────────────────────────────────────────────────

/// The objects of `id`'s `predicate` triples. 404 if `id` is not a person.
async fn related<S: CollectionStore>(
  state: &AppState<S>,
  id: &str,
  predicate: Predicate,
) -> Result<Vec<RelatedPerson>, ApiError> {
  let _: Person = fetch(state.store.as_ref(), id).await?;
  let triples: Vec<Triple> = state.store.list().await.map_err(ApiError::store)?;
  Ok(graph::related(&triples, id, predicate))
}

async fn related_connection<S: CollectionStore>(
  state: &AppState<S>,
  id: &str,
  predicate: Predicate,
  spec: CursorSpec,
) -> Result<Json<Option<Connection<RelatedPerson>>>, ApiError> {
  let nodes = related(state, id, predicate).await?;
  let spec = spec.with_default_sort(RELATIONSHIP_SORT_FIELD);
  Ok(Json(build_connection(&nodes, &spec)?))
}

/// `GET /persons/{id}/knows`
pub async fn knows<S: CollectionStore>(
  State(state): State<AppState<S>>,
  Path(id): Path<String>,
  Query(spec): Query<CursorSpec>,
) -> Result<Json<Option<Connection<RelatedPerson>>>, ApiError> {
  related_connection(&state, &id, Predicate::Knows, spec).await
}

/// `GET /persons/{id}/likes`
pub async fn likes<S: CollectionStore>(
  State(state): State<AppState<S>>,
  Path(id): Path<String>,
  Query(spec): Query<CursorSpec>,
) -> Result<Json<Option<Connection<RelatedPerson>>>, ApiError> {
  related_connection(&state, &id, Predicate::Likes, spec).await
}

/// `GET /persons/{id}/married_to`
pub async fn married_to<S: CollectionStore>(
  State(state): State<AppState<S>>,
  Path(id): Path<String>,
) -> Result<Json<Vec<RelatedPerson>>, ApiError> {
  Ok(Json(related(&state, &id, Predicate::MarriedTo).await?))
}

/// `GET /persons/{id}/divorced_from`
pub async fn divorced_from<S: CollectionStore>(
  State(state): State<AppState<S>>,
  Path(id): Path<String>,
) -> Result<Json<Vec<RelatedPerson>>, ApiError> {
  Ok(Json(related(&state, &id, Predicate::DivorcedFrom).await?))
}
