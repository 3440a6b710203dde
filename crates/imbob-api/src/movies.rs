//! Handlers for `/movies` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/movies` | All movies |
//! | `POST` | `/movies` | Body: [`NewMovie`]; every referenced person must exist |
//! | `GET`  | `/movies/{id}` | 404 if not found |
//! | `PUT`  | `/movies/{id}` | Body: [`MovieUpdate`]; merged per [`Movie::apply`] |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use imbob_core::{
  event::EventAction,
  movie::{Movie, MovieUpdate, NewMovie},
  person::{KnownPerson, Person},
  store::CollectionStore,
};

use crate::{AppState, error::ApiError, fetch};

/// Fail with `EntityNotFound` unless every person is stored.
async fn ensure_known<'a, S: CollectionStore>(
  store: &S,
  people: impl IntoIterator<Item = &'a KnownPerson>,
) -> Result<(), ApiError> {
  for person in people {
    let _: Person = fetch(store, &person.id).await?;
  }
  Ok(())
}

/// `GET /movies`
pub async fn list<S: CollectionStore>(
  State(state): State<AppState<S>>,
) -> Result<Json<Vec<Movie>>, ApiError> {
  Ok(Json(state.store.list().await.map_err(ApiError::store)?))
}

/// `GET /movies/{id}`
pub async fn get_one<S: CollectionStore>(
  State(state): State<AppState<S>>,
  Path(id): Path<String>,
) -> Result<Json<Movie>, ApiError> {
  Ok(Json(fetch(state.store.as_ref(), &id).await?))
}

/// `POST /movies`, body: [`NewMovie`]
pub async fn create<S: CollectionStore>(
  State(state): State<AppState<S>>,
  Json(body): Json<NewMovie>,
) -> Result<impl IntoResponse, ApiError> {
  let movie = body.into_movie();
  ensure_known(state.store.as_ref(), movie.people()).await?;
  let movie = state.store.upsert(movie).await.map_err(ApiError::store)?;
  state.bus.publish_movie(EventAction::Added, &movie)?;
  Ok((StatusCode::CREATED, Json(movie)))
}

/// `PUT /movies/{id}`, body: [`MovieUpdate`]
pub async fn update<S: CollectionStore>(
  State(state): State<AppState<S>>,
  Path(id): Path<String>,
  Json(body): Json<MovieUpdate>,
) -> Result<Json<Movie>, ApiError> {
  let mut movie: Movie = fetch(state.store.as_ref(), &id).await?;
  let people: Vec<&KnownPerson> =
    body.directors.iter().chain(body.actors.iter().map(|a| &a.person)).collect();
  ensure_known(state.store.as_ref(), people).await?;
  movie.apply(body);
  let movie = state.store.upsert(movie).await.map_err(ApiError::store)?;
  state.bus.publish_movie(EventAction::Updated, &movie)?;
  Ok(Json(movie))
}
