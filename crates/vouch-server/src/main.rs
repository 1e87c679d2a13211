//! Vouch server binary.
//!
//! Reads `config.toml` (or the path given with `--config`), loads the
//! supplier collection, and serves the JSON API over HTTP while the sync
//! loop and the daily backup job run in the background.
//!
//! # Password hash generation
//!
//! ```
//! cargo run -p vouch-server --bin server -- --hash-password
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use clap::Parser;
use rand_core::OsRng;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use vouch_api::Tracker;
use vouch_core::controller::Controller;
use vouch_server::{
  AppState, ServerConfig, auth::AuthConfig, backup::BackupJob, mailer::ReportMailer,
};
use vouch_store_sqlite::{SqliteDocumentStore, SqliteLocalStore};
use vouch_sync::Reconciler;

#[derive(Parser)]
#[command(author, version, about = "Vouch supplier compliance server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml", env = "VOUCH_CONFIG")]
  config: PathBuf,

  /// Print the argon2 hash for a password entered on stdin and exit.
  #[arg(long)]
  hash_password: bool,
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

  if cli.hash_password {
    let password = read_password()?;
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?
      .to_string();
    println!("{hash}");
    return Ok(());
  }

  // `VOUCH_BACKUP__HOUR=18` overrides `[backup] hour`.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(
      config::Environment::with_prefix("VOUCH")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true),
    )
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  if server_cfg.auth_password_hash.is_empty() {
    anyhow::bail!("auth_password_hash is not set; generate one with --hash-password");
  }

  // Stores.
  let store_path = expand_tilde(&server_cfg.store_path);
  let remote = SqliteDocumentStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open document store at {store_path:?}"))?;
  let local_path = expand_tilde(&server_cfg.local_path);
  let local = SqliteLocalStore::open(&local_path)
    .with_context(|| format!("failed to open local store at {local_path:?}"))?;

  // Load and wire the controller.
  let sync = Arc::new(Reconciler::new(remote, local, (&server_cfg.sync).into()));
  let loaded = sync.load().await;
  tracing::info!(
    source = ?loaded.source,
    suppliers = loaded.envelope.suppliers.len(),
    status = ?sync.status(),
    "supplier collection loaded"
  );
  let tracker = Arc::new(Tracker::new(
    Controller::new(loaded.envelope),
    Arc::clone(&sync),
    server_cfg.page_size,
  ));
  let _sync_task = sync.spawn();

  let mailer = server_cfg
    .mail
    .clone()
    .map(ReportMailer::new)
    .transpose()
    .context("failed to build mail client")?;
  if mailer.is_none() {
    tracing::warn!("no [mail] section configured; daily reports will not be emailed");
  }

  let job = BackupJob {
    tracker:  Arc::clone(&tracker),
    schedule: server_cfg.backup.schedule(),
    dir:      expand_tilde(&server_cfg.backup.dir),
    mailer:   mailer.clone(),
  };
  tokio::spawn(job.run());

  let state = AppState {
    tracker,
    auth: Arc::new(AuthConfig { password_hash: server_cfg.auth_password_hash.clone() }),
    mailer,
  };

  let app = vouch_server::router(state);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Read a password line from stdin.
fn read_password() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  Ok(line.trim_end_matches(['\n', '\r']).to_string())
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
