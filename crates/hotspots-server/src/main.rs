//! hotspots-server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`) layered with
//! `HOTSPOTS_*` environment variables, opens the SQLite store, and serves the
//! JSON API over HTTP.
//!
//! # Development tokens
//!
//! With an HS algorithm configured, a signed bearer token can be printed with:
//!
//! ```text
//! cargo run -p hotspots-server -- --issue-token alice
//! cargo run -p hotspots-server -- --issue-token root --admin
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::Parser;
use hotspots_core::clock::SystemClock;
use hotspots_server::{ServerConfig, jwt};
use hotspots_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "HotSpots study-spot API server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Print a signed bearer token for this subject and exit.
  #[arg(long, value_name = "SUB")]
  issue_token: Option<String>,

  /// Include the admin permission in the issued token.
  #[arg(long, requires = "issue_token")]
  admin: bool,

  /// Lifetime of the issued token in hours.
  #[arg(long, default_value_t = 24, requires = "issue_token")]
  ttl_hours: i64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config.as_path()).required(false))
    .add_source(config::Environment::with_prefix("HOTSPOTS"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  // Helper mode: sign a token and exit.
  if let Some(sub) = cli.issue_token {
    let token = jwt::issue_token(&server_cfg, &sub, cli.admin, chrono::Duration::hours(cli.ttl_hours))
      .context("failed to issue token")?;
    println!("{token}");
    return Ok(());
  }

  let authenticator =
    jwt::JwtAuthenticator::from_config(&server_cfg).context("failed to configure JWT verification")?;

  let store_path = expand_tilde(&server_cfg.store_path);
  if let Some(parent) = store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create store directory {parent:?}"))?;
  }

  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let catalog = hotspots_server::catalog(&server_cfg, Arc::new(store), Arc::new(SystemClock))
    .context("failed to build catalog")?;
  let app = hotspots_server::router(&server_cfg, Arc::new(catalog), Arc::new(authenticator))
    .context("failed to build router")?;

  let address = format!("{}:{}", server_cfg.host, server_cfg.port);
  tracing::info!(store = ?store_path, "Listening on http://{address}");
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
