//! `imbob`: command-line client for the IMBOB API.
//!
//! # Usage
//!
//! ```text
//! imbob --url http://localhost:4000 --token s3cret persons --first 5
//! imbob ping "hello"
//! imbob listen HORROR_MOVIE_CHANNEL --action added
//! imbob --config ~/.config/imbob/config.toml listen
//! ```

mod client;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use client::{ApiClient, ApiConfig};
use imbob_core::{
  event::{Channel, EventAction},
  pagination::CursorSpec,
};
use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "imbob", about = "Command-line client for the IMBOB API")]
struct Args {
  /// Path to a TOML config file (url, token).
  #[arg(short, long, value_name = "FILE")]
  config: Option<std::path::PathBuf>,

  /// Base URL of the server (default: http://localhost:4000).
  #[arg(long, env = "IMBOB_URL")]
  url: Option<String>,

  /// Bearer token sent with every request.
  #[arg(long, env = "IMBOB_TOKEN")]
  token: Option<String>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Print one page of persons.
  Persons {
    #[arg(long)]
    after:  Option<String>,
    #[arg(long)]
    before: Option<String>,
    #[arg(long)]
    first:  Option<usize>,
    #[arg(long)]
    last:   Option<usize>,
    /// Field to sort by (default: last_name).
    #[arg(long)]
    sort:   Option<String>,
  },
  /// Publish a ping and print the resulting event.
  Ping {
    message: String,
    /// Request runtime information (needs the admin scope).
    #[arg(long)]
    admin:   bool,
  },
  /// Print events from a channel until interrupted.
  Listen {
    #[arg(default_value = "GENERAL_EVENT_CHANNEL", value_parser = parse_channel)]
    channel: Channel,
    #[arg(long)]
    action:  Option<EventAction>,
  },
}

fn parse_channel(name: &str) -> Result<Channel, String> {
  Channel::parse(name).map_err(|e| e.to_string())
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  #[serde(default)]
  url:   String,
  #[serde(default)]
  token: String,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .init();

  let args = Args::parse();

  // Load config file if provided.
  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  // CLI flags override config file, which overrides defaults.
  let api_config = ApiConfig {
    base_url: args
      .url
      .or_else(|| (!file_cfg.url.is_empty()).then(|| file_cfg.url.clone()))
      .unwrap_or_else(|| "http://localhost:4000".to_string()),
    token:    args
      .token
      .or_else(|| (!file_cfg.token.is_empty()).then(|| file_cfg.token.clone())),
  };

  let client = ApiClient::new(api_config)?;

  match args.command {
    Command::Persons { after, before, first, last, sort } => {
      let spec = CursorSpec { before, after, first, last, sort_field_name: sort };
      let page = client.list_persons(&spec).await?;
      println!("{}", serde_json::to_string_pretty(&page)?);
    }
    Command::Ping { message, admin } => {
      let event = client.ping(&message, admin).await?;
      println!("{}", serde_json::to_string_pretty(&event)?);
    }
    Command::Listen { channel, action } => {
      eprintln!("listening on {channel}; press Ctrl-C to stop");
      let listen = client.listen(channel, action, |event| {
        match serde_json::to_string_pretty(&event) {
          Ok(text) => println!("{text}"),
          Err(e) => tracing::warn!(error = %e, "failed to print event"),
        }
      });
      tokio::select! {
        result = listen => result?,
        _ = tokio::signal::ctrl_c() => {}
      }
    }
  }

  Ok(())
}
