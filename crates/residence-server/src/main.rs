//! residence server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) plus `RESIDENCE_*`
//! environment variables, opens the SQLite store and serves the JSON API.
//!
//! # First run
//!
//! ```text
//! residence gen-field-key            # put the output in `field_key`
//! residence create-user --username admin --admin < password.txt
//! residence serve
//! ```

mod settings;

use std::{
  io::{self, BufRead},
  path::PathBuf,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use residence_api::{AppState, ListCache, auth::hash_password};
use residence_core::{
  account::NewUser,
  cipher::{FieldCipher, FieldKey},
  store::ResidenceStore,
};
use residence_store_sqlite::SqliteStore;
use tokio::{net::TcpListener, signal};
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::settings::ServerConfig;

#[derive(Parser)]
#[command(author, version, about = "University residence management API server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml", global = true)]
  config: PathBuf,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the API (the default).
  Serve,
  /// Create an API user; the password is read from stdin.
  CreateUser {
    #[arg(long)]
    username: String,
    /// Allow the user to create, update and delete records.
    #[arg(long)]
    admin:    bool,
  },
  /// Print a fresh base64 master key for `field_key` and exit.
  GenFieldKey,
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

  match cli.command.unwrap_or(Command::Serve) {
    Command::GenFieldKey => {
      println!("{}", FieldKey::generate().to_base64());
      Ok(())
    }
    Command::CreateUser { username, admin } => {
      let cfg = ServerConfig::load(&cli.config)?;
      create_user(&cfg, username, admin).await
    }
    Command::Serve => {
      let cfg = ServerConfig::load(&cli.config)?;
      serve(&cfg).await
    }
  }
}

async fn open_store(cfg: &ServerConfig) -> anyhow::Result<SqliteStore> {
  let key = FieldKey::from_base64(&cfg.field_key).context("invalid `field_key`")?;
  let path = cfg.database_path();
  SqliteStore::open(&path, FieldCipher::new(key))
    .await
    .with_context(|| format!("failed to open store at {path:?}"))
}

async fn serve(cfg: &ServerConfig) -> anyhow::Result<()> {
  let store = open_store(cfg).await?;
  let state = AppState::new(store, ListCache::new(cfg.cache_ttl()));
  let app = residence_api::router(state).layer(TraceLayer::new_for_http());

  let address = cfg.address();
  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

  tracing::info!("server stopped");
  Ok(())
}

async fn create_user(cfg: &ServerConfig, username: String, is_admin: bool) -> anyhow::Result<()> {
  let password = read_password()?;
  anyhow::ensure!(!password.is_empty(), "password must not be empty");

  let password_hash =
    hash_password(&password).map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?;

  let store = open_store(cfg).await?;
  let user = store
    .create_user(NewUser { username, password_hash, is_admin })
    .await
    .context("failed to create user")?;

  tracing::info!(id = user.id, username = %user.username, is_admin, "user created");
  Ok(())
}

/// Read one line from stdin as the password.
fn read_password() -> anyhow::Result<String> {
  eprint!("Password: ");
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line).context("failed to read password")?;
  Ok(line.trim_end_matches(['\n', '\r']).to_string())
}

async fn shutdown_signal() {
  if let Err(e) = signal::ctrl_c().await {
    tracing::error!(error = %e, "failed to listen for ctrl-c");
    return;
  }
  tracing::info!("received ctrl-c, shutting down");
}
