//! Handlers for `/triples` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/triples` | Optional `?predicate=KNOWS\|LIKES\|...` |
//! | `POST` | `/triples` | Body: [`NewTriple`]; subject and object must exist |

use axum::{
  Json,
  extract::{Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use imbob_core::{
  event::EventAction,
  person::Person,
  store::CollectionStore,
  triple::{NewTriple, Predicate, Triple},
};
use serde::Deserialize;

use crate::{AppState, error::ApiError, fetch};

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub predicate: Option<Predicate>,
}

/// `GET /triples[?predicate=<predicate>]`
pub async fn list<S: CollectionStore>(
  State(state): State<AppState<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Triple>>, ApiError> {
  let mut triples: Vec<Triple> = state.store.list().await.map_err(ApiError::store)?;
  if let Some(predicate) = params.predicate {
    triples.retain(|t| t.predicate == predicate);
  }
  Ok(Json(triples))
}

/// `POST /triples`, body: [`NewTriple`]
pub async fn create<S: CollectionStore>(
  State(state): State<AppState<S>>,
  Json(body): Json<NewTriple>,
) -> Result<impl IntoResponse, ApiError> {
  let _: Person = fetch(state.store.as_ref(), &body.subject.id).await?;
  let _: Person = fetch(state.store.as_ref(), &body.object.id).await?;
  let triple = state
    .store
    .upsert(body.into_triple())
    .await
    .map_err(ApiError::store)?;
  state.bus.publish_triple(EventAction::Added, &triple)?;
  Ok((StatusCode::CREATED, Json(triple)))
}
