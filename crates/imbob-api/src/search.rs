//! Handler for `GET /search`.
//!
//! Returns actors, then persons, sharing a last name. Each hit is tagged with
//! its kind (`{"type": "actor" | "person", "data": ...}`).

use axum::{
  Json,
  extract::{Query, State},
};
use imbob_core::{
  graph::{self, SearchHit},
  movie::Movie,
  person::Person,
  store::CollectionStore,
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{AppState, Caller, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct SearchParams {
  pub last_name: String,
}

/// `GET /search?last_name=...`
pub async fn handler<S: CollectionStore>(
  State(state): State<AppState<S>>,
  Caller(grants): Caller,
  Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Value>>, ApiError> {
  let persons: Vec<Person> = state.store.list().await.map_err(ApiError::store)?;
  let movies: Vec<Movie> = state.store.list().await.map_err(ApiError::store)?;

  let hits = graph::search_person_actor(persons, &movies, &params.last_name)
    .into_iter()
    .map(|hit| match hit {
      SearchHit::Person(person) => Ok(json!({
        "type": "person",
        "data": state.overlay.resolve(&person, &grants)?,
      })),
      actor => Ok(serde_json::to_value(actor)?),
    })
    .collect::<Result<_, imbob_core::Error>>()?;
  Ok(Json(hits))
}
