//! imbob-server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), overlays
//! `IMBOB_*` environment variables, opens the JSON collection store and
//! serves the API over HTTP.
//!
//! ```text
//! IMBOB_PORT=8080 cargo run -p imbob-api --bin imbob-server -- --config config.toml
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::Parser;
use imbob_api::{AppState, ServerConfig};
use imbob_store_json::JsonStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "IMBOB data API server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Override `data_dir` from the configuration.
  #[arg(long)]
  data_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("IMBOB").try_parsing(true))
    .build()
    .context("failed to read config file")?;

  let mut server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;
  if let Some(dir) = cli.data_dir {
    server_cfg.data_dir = dir;
  }
  server_cfg.data_dir = expand_tilde(&server_cfg.data_dir);

  if server_cfg.require_token && server_cfg.tokens.is_empty() {
    tracing::warn!("require_token is set but no tokens are configured");
  }

  let store = JsonStore::open(&server_cfg.data_dir)
    .await
    .with_context(|| format!("failed to open store at {:?}", server_cfg.data_dir))?;

  let address = format!("{}:{}", server_cfg.host, server_cfg.port);
  let app = imbob_api::router(AppState::new(store, server_cfg));

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
