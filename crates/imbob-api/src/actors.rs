//! Handlers for `/actors` endpoints.
//!
//! Actors are not stored; they are derived from movie casts on every request.

use axum::{
  Json,
  extract::{Path, State},
};
use imbob_core::{
  entity::Collection,
  graph,
  movie::{Actor, Movie},
  store::CollectionStore,
};

use crate::{AppState, error::ApiError};

/// `GET /actors`
pub async fn list<S: CollectionStore>(
  State(state): State<AppState<S>>,
) -> Result<Json<Vec<Actor>>, ApiError> {
  let movies: Vec<Movie> = state.store.list().await.map_err(ApiError::store)?;
  Ok(Json(graph::actors(&movies)))
}

/// `GET /actors/{id}`, where `id` is the actor's person id.
pub async fn get_one<S: CollectionStore>(
  State(state): State<AppState<S>>,
  Path(id): Path<String>,
) -> Result<Json<Actor>, ApiError> {
  let movies: Vec<Movie> = state.store.list().await.map_err(ApiError::store)?;
  let actor = graph::actor(&movies, &id).ok_or_else(|| {
    imbob_core::Error::EntityNotFound { collection: Collection::Persons, id }
  })?;
  Ok(Json(actor))
}
