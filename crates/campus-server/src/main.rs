//! `campusd`: the Campus server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) and `CAMPUS__*`
//! environment variables, opens the SQLite store, brings the schema up to
//! date and serves the JSON API. The operator sub-commands run the bootstrap
//! alone, print the ledger, or drop everything.

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use campus_core::{BootstrapReport, initialize_database, store::SchemaStore};
use campus_server::{AppState, DatabaseConfig, ServerConfig};
use campus_store_sqlite::{ENTITIES, SqliteStore, default_plan};
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Campus school-management server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
  /// Bring the database up to date, then serve the API (default).
  Serve,
  /// Bring the database up to date and print the bootstrap report.
  Migrate,
  /// Print the migration ledger and which catalog tables exist.
  Status,
  /// Drop every catalog table and the migration ledger.
  Reset {
    /// Confirm that all data should be destroyed.
    #[arg(long)]
    yes: bool,
  },
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
    .add_source(config::File::from(cli.config).required(false))
    .add_source(
      config::Environment::with_prefix("CAMPUS")
        .separator("__")
        .try_parsing(true),
    )
    .build()
    .context("failed to read configuration")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;
  let db_cfg = server_cfg.database.expanded();

  match cli.command.unwrap_or(Command::Serve) {
    Command::Serve => serve(&server_cfg, &db_cfg).await,
    Command::Migrate => {
      let (store, report) = bootstrap(&db_cfg).await?;
      println!("{}", serde_json::to_string_pretty(&report)?);
      store.close().await?;
      Ok(())
    }
    Command::Status => status(&db_cfg).await,
    Command::Reset { yes } => {
      if !yes {
        anyhow::bail!("refusing to drop every table without --yes");
      }
      let store = open(&db_cfg).await?;
      let dropped = store.reset(ENTITIES).await.context("reset failed")?;
      println!("dropped {} tables and the migration ledger", dropped.len());
      store.close().await?;
      Ok(())
    }
  }
}

async fn open(cfg: &DatabaseConfig) -> anyhow::Result<SqliteStore> {
  SqliteStore::open_with(&cfg.path, &cfg.open_options())
    .await
    .with_context(|| format!("failed to open store at {:?}", cfg.path))
}

async fn bootstrap(cfg: &DatabaseConfig) -> anyhow::Result<(SqliteStore, BootstrapReport)> {
  let store = open(cfg).await?;
  let plan = default_plan(cfg.schema_file.clone())?.with_step_timeout(cfg.step_timeout());
  let report = initialize_database(&store, &plan)
    .await
    .context("database bootstrap failed")?;
  tracing::info!(via = ?report.via, "database ready");
  Ok((store, report))
}

async fn serve(server_cfg: &ServerConfig, db_cfg: &DatabaseConfig) -> anyhow::Result<()> {
  let (store, _) = bootstrap(db_cfg).await?;

  let app = campus_server::router(AppState { store: Arc::new(store.clone()) });
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;
  tracing::info!("Listening on http://{address}");

  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

  store.close().await?;
  tracing::info!("store closed");
  Ok(())
}

async fn status(cfg: &DatabaseConfig) -> anyhow::Result<()> {
  let store = open(cfg).await?;

  if store.table_exists("migrations").await? {
    println!("migrations:");
    for record in store.ledger().await? {
      let outcome = if record.success { "ok" } else { "FAILED" };
      println!(
        "  {:<28} {:<6} {}  {}",
        record.name,
        outcome,
        record.executed_at.to_rfc3339(),
        record.error_message.as_deref().unwrap_or(""),
      );
    }
  } else {
    println!("migrations: no ledger");
  }

  println!("tables:");
  for spec in ENTITIES {
    let present = if store.table_exists(spec.name).await? { "present" } else { "missing" };
    println!("  {:<28} {present}", spec.name);
  }

  store.close().await?;
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::warn!(error = %e, "failed to listen for ctrl-c");
    std::future::pending::<()>().await;
  }
  tracing::info!("shutting down");
}
