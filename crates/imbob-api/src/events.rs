//! `POST /ping` and the `GET /subscriptions/{channel}` event stream.

use std::convert::Infallible;

use axum::{
  Json,
  extract::{Path, Query, State},
  response::sse::{Event as SseEvent, KeepAlive, Sse},
};
use chrono::{DateTime, Utc};
use futures::{Stream, StreamExt as _};
use imbob_core::{
  entity::Collection,
  event::{Channel, Event, EventAction},
  person::Person,
  scope::{Grants, Resolvable, ScopeOverlay},
  store::CollectionStore,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::{AppState, Caller, error::ApiError};

// ─── Runtime info ────────────────────────────────────────────────────────────

/// Process details returned to administrators on request.
#[derive(Debug, Clone, Serialize)]
pub struct RuntimeInfo {
  pub process_id:     u32,
  pub current_time:   DateTime<Utc>,
  pub uptime_seconds: u64,
}

impl Resolvable for RuntimeInfo {
  const TYPE_NAME: &'static str = "RuntimeInfo";
}

impl RuntimeInfo {
  pub fn capture<S>(state: &AppState<S>) -> Self {
    Self {
      process_id:     std::process::id(),
      current_time:   Utc::now(),
      uptime_seconds: state.started_at.elapsed().as_secs(),
    }
  }
}

// ─── Ping ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct PingBody {
  pub message: String,
  /// Ask for [`RuntimeInfo`] alongside the message.
  #[serde(default)]
  pub admin:   bool,
}

/// A subtree that failed to resolve and was replaced by `null`.
#[derive(Debug, Clone, Serialize)]
pub struct FieldError {
  pub path:    &'static str,
  pub message: String,
  pub code:    &'static str,
}

#[derive(Debug, Serialize)]
pub struct PingResponse {
  #[serde(flatten)]
  pub event:  Event,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub errors: Vec<FieldError>,
}

/// `POST /ping`, body: `{"message": "...", "admin": false}`
///
/// Subscribers always receive the plain message. With `admin` set, the
/// returned body becomes `{data, admin_data}`; `admin_data` is `null` (and an
/// entry is added to `errors`) when the caller lacks the admin scope.
pub async fn ping<S: CollectionStore>(
  State(state): State<AppState<S>>,
  Caller(grants): Caller,
  Json(body): Json<PingBody>,
) -> Result<Json<PingResponse>, ApiError> {
  let mut event = state.bus.ping(&body.message);
  let mut errors = Vec::new();

  if body.admin {
    let admin_data = match state.overlay.resolve(&RuntimeInfo::capture(&state), &grants) {
      Ok(info) => info,
      Err(e @ imbob_core::Error::AuthorizationDenied { .. }) => {
        errors.push(FieldError {
          path:    "body.admin_data",
          message: e.to_string(),
          code:    e.code(),
        });
        Value::Null
      }
      Err(e) => return Err(e.into()),
    };
    event.body = json!({ "data": event.body, "admin_data": admin_data });
  }

  Ok(Json(PingResponse { event, errors }))
}

// ─── Subscriptions ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SubscribeParams {
  /// Only deliver entity events of this kind.
  pub action: Option<EventAction>,
}

/// `GET /subscriptions/{channel}[?action=added|updated]`
///
/// Streams every event published on `channel` from now on as Server-Sent
/// Events. The stream ends, and the subscription is dropped, when the client
/// disconnects.
pub async fn subscribe<S: CollectionStore>(
  State(state): State<AppState<S>>,
  Caller(grants): Caller,
  Path(channel): Path<String>,
  Query(params): Query<SubscribeParams>,
) -> Result<Sse<impl Stream<Item = Result<SseEvent, Infallible>>>, ApiError> {
  let channel = Channel::parse(&channel)?;
  debug!(%channel, action = ?params.action, "sse subscription opened");

  let overlay = state.overlay.clone();
  let stream = state
    .bus
    .subscribe_filtered(channel, params.action)
    .map(move |event| Ok(frame(&overlay, &grants, event)));

  Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

/// Encode one event for the wire, redacting person bodies for `grants`.
fn frame(overlay: &ScopeOverlay, grants: &Grants, mut event: Event) -> SseEvent {
  if event.name.collection() == Some(Collection::Persons) {
    let body = std::mem::take(&mut event.body);
    event.body = overlay
      .resolve_value(Person::TYPE_NAME, body, grants)
      .unwrap_or_else(|e| {
        warn!(error = %e, id = %event.id, "person event body withheld");
        Value::Null
      });
  }

  let sse = SseEvent::default()
    .event(event.name.to_string())
    .id(event.id.to_string());
  match serde_json::to_string(&event) {
    Ok(data) => sse.data(data),
    Err(e) => {
      warn!(error = %e, id = %event.id, "failed to encode event");
      SseEvent::default().comment("event could not be encoded")
    }
  }
}
