//! Async HTTP client wrapping the IMBOB API.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use futures::StreamExt as _;
use imbob_core::{
  connection::Page,
  event::{Channel, Event, EventAction},
  pagination::CursorSpec,
};
use reqwest::{Client, Response};
use serde_json::{Value, json};
use tracing::debug;

/// Timeout for ordinary request/response calls. Event streams have none.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings for the IMBOB API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
  pub token:    Option<String>,
}

/// Async HTTP client for the IMBOB API.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  config: ApiConfig,
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self> {
    let client = Client::builder()
      .connect_timeout(Duration::from_secs(10))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
  }

  fn auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
    match &self.config.token {
      Some(token) => req.bearer_auth(token),
      None => req,
    }
  }

  /// `GET /persons` with the given cursor parameters.
  pub async fn list_persons(&self, spec: &CursorSpec) -> Result<Option<Page<Value>>> {
    let resp = self
      .auth(self.client.get(self.url("/persons")))
      .query(spec)
      .timeout(REQUEST_TIMEOUT)
      .send()
      .await
      .context("GET /persons failed")?;
    checked(resp, "GET /persons")
      .await?
      .json()
      .await
      .context("deserialising persons page")
  }

  /// `POST /ping`
  pub async fn ping(&self, message: &str, admin: bool) -> Result<Value> {
    let resp = self
      .auth(self.client.post(self.url("/ping")))
      .json(&json!({ "message": message, "admin": admin }))
      .timeout(REQUEST_TIMEOUT)
      .send()
      .await
      .context("POST /ping failed")?;
    checked(resp, "POST /ping")
      .await?
      .json()
      .await
      .context("deserialising ping event")
  }

  /// `GET /subscriptions/{channel}`: call `on_event` for every event until
  /// the server closes the stream.
  pub async fn listen(
    &self,
    channel: Channel,
    action: Option<EventAction>,
    mut on_event: impl FnMut(Event),
  ) -> Result<()> {
    let path = format!("/subscriptions/{channel}");
    let mut req = self.auth(self.client.get(self.url(&path)));
    if let Some(action) = action {
      req = req.query(&[("action", action.to_string())]);
    }
    let resp = req.send().await.with_context(|| format!("GET {path} failed"))?;
    let mut body = checked(resp, &path).await?.bytes_stream();

    let mut decoder = SseDecoder::default();
    while let Some(chunk) = body.next().await {
      let chunk = chunk.context("reading event stream")?;
      for data in decoder.push(&chunk) {
        match serde_json::from_str::<Event>(&data) {
          Ok(event) => on_event(event),
          Err(e) => debug!(error = %e, "skipping undecodable frame"),
        }
      }
    }
    Ok(())
  }
}

/// Turn a non-success response into an error carrying the server's message.
async fn checked(resp: Response, what: &str) -> Result<Response> {
  let status = resp.status();
  if status.is_success() {
    return Ok(resp);
  }
  let detail = resp
    .json::<Value>()
    .await
    .ok()
    .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_owned))
    .unwrap_or_default();
  Err(anyhow!("{what} → {status} {detail}"))
}

// ─── Server-sent events ──────────────────────────────────────────────────────

/// Incremental decoder yielding the `data` payload of each complete frame.
///
/// Bytes are buffered raw and only decoded once a whole frame has arrived, so
/// a chunk boundary inside a multi-byte character is harmless.
#[derive(Debug, Default)]
pub struct SseDecoder {
  buffer: Vec<u8>,
}

impl SseDecoder {
  pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
    self.buffer.extend_from_slice(chunk);
    let mut out = Vec::new();
    while let Some((end, sep)) = frame_end(&self.buffer) {
      let raw: Vec<u8> = self.buffer.drain(..end + sep).collect();
      let frame = String::from_utf8_lossy(&raw[..end]);
      let data: Vec<&str> = frame
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|d| d.strip_prefix(' ').unwrap_or(d))
        .collect();
      // Keep-alive frames carry only a comment.
      if !data.is_empty() {
        out.push(data.join("\n"));
      }
    }
    out
  }
}

/// Position and length of the first blank-line separator in `buf`.
fn frame_end(buf: &[u8]) -> Option<(usize, usize)> {
  (0..buf.len()).find_map(|i| {
    let rest = &buf[i..];
    if rest.starts_with(b"\r\n\r\n") {
      Some((i, 4))
    } else if rest.starts_with(b"\n\n") {
      Some((i, 2))
    } else {
      None
    }
  })
}
