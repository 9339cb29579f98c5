//! The bootstrap orchestrator.
//!
//! Bootstrap is a small state machine:
//!
//! ```text
//! NotStarted → MigrationsRunning → MigrationsChecked ─┬─────────────────────→ Ready
//!                                                     ├→ SchemaApplied ─────→ Ready
//!                                                     └→ DirectInitRunning ─→ Ready
//! ```
//!
//! Any unrecoverable error moves it to `Failed`. Degrading from the schema
//! file to direct initialisation is logged and recorded as a transition; it
//! is not an error. Nothing is retried automatically.

use std::{fmt, time::Duration};

use serde::Serialize;

use crate::{
  Error, Result,
  error::boxed,
  initializer::{InitReport, TableInitializers},
  migration::{Migration, MigrationReport, MigrationRunner},
  schema_file::{SchemaFile, SchemaSource},
  step::bounded,
  store::SchemaStore,
  table::TableSpec,
};

pub const DEFAULT_STEP_TIMEOUT: Duration = Duration::from_secs(30);

// ─── States and events ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BootstrapState {
  NotStarted,
  MigrationsRunning,
  MigrationsChecked,
  SchemaApplied,
  DirectInitRunning,
  Ready,
  Failed,
}

impl fmt::Display for BootstrapState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::NotStarted => "not_started",
      Self::MigrationsRunning => "migrations_running",
      Self::MigrationsChecked => "migrations_checked",
      Self::SchemaApplied => "schema_applied",
      Self::DirectInitRunning => "direct_init_running",
      Self::Ready => "ready",
      Self::Failed => "failed",
    })
  }
}

/// Which tier brought the schema up to date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadyVia {
  Migrations,
  SchemaFile,
  DirectInit,
}

/// What caused a [`Transition`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BootstrapEvent {
  Started,
  MigrationsFinished {
    applied: usize,
    skipped: usize,
    failed:  Vec<String>,
  },
  LedgerComplete,
  SchemaApplied {
    origin:   String,
    checksum: String,
    /// Singleton tables the script left empty and that got their default row.
    seeded:   Vec<String>,
  },
  SchemaUnavailable {
    reason: String,
  },
  TablesInitialized {
    tables: usize,
    seeded: Vec<String>,
  },
  Finished,
  Aborted {
    reason: String,
  },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transition {
  pub from:  BootstrapState,
  pub to:    BootstrapState,
  pub event: BootstrapEvent,
}

// ─── Plan and report ─────────────────────────────────────────────────────────

/// Everything the orchestrator needs besides the store handle.
#[derive(Debug, Clone)]
pub struct BootstrapPlan {
  pub migrations:   &'static [Migration],
  pub tables:       &'static [TableSpec],
  pub schema:       SchemaSource,
  /// Upper bound on each individual database call.
  pub step_timeout: Duration,
}

impl BootstrapPlan {
  pub fn new(migrations: &'static [Migration], tables: &'static [TableSpec]) -> Self {
    Self {
      migrations,
      tables,
      schema: SchemaSource::Disabled,
      step_timeout: DEFAULT_STEP_TIMEOUT,
    }
  }

  pub fn with_schema(mut self, schema: SchemaSource) -> Self {
    self.schema = schema;
    self
  }

  pub fn with_step_timeout(mut self, step_timeout: Duration) -> Self {
    self.step_timeout = step_timeout;
    self
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BootstrapReport {
  pub via:         ReadyVia,
  pub migrations:  MigrationReport,
  /// Present only when the direct-initialisation tier ran.
  pub init:        Option<InitReport>,
  pub transitions: Vec<Transition>,
}

// ─── Orchestrator ────────────────────────────────────────────────────────────

pub struct Bootstrap<'a, S> {
  store:       &'a S,
  plan:        &'a BootstrapPlan,
  state:       BootstrapState,
  transitions: Vec<Transition>,
}

impl<'a, S> Bootstrap<'a, S>
where
  S: SchemaStore,
{
  pub fn new(store: &'a S, plan: &'a BootstrapPlan) -> Self {
    Self {
      store,
      plan,
      state: BootstrapState::NotStarted,
      transitions: Vec::new(),
    }
  }

  pub fn state(&self) -> BootstrapState { self.state }

  pub fn transitions(&self) -> &[Transition] { &self.transitions }

  /// Drive the state machine to `Ready` or `Failed`. May be called once.
  pub async fn run(&mut self) -> Result<BootstrapReport> {
    if self.state != BootstrapState::NotStarted {
      return Err(Error::InvalidState(self.state));
    }

    match self.drive().await {
      Ok(report) => Ok(report),
      Err(e) => {
        tracing::error!(state = %self.state, error = %e, "bootstrap failed");
        self.transition(BootstrapState::Failed, BootstrapEvent::Aborted {
          reason: e.to_string(),
        });
        Err(e)
      }
    }
  }

  async fn drive(&mut self) -> Result<BootstrapReport> {
    let timeout = self.plan.step_timeout;

    self.transition(BootstrapState::MigrationsRunning, BootstrapEvent::Started);
    self.connect().await?;

    let runner =
      MigrationRunner::new(self.store, self.plan.migrations, self.plan.tables, timeout);
    let migrations = runner.run().await?;
    self.transition(BootstrapState::MigrationsChecked, BootstrapEvent::MigrationsFinished {
      applied: migrations.applied.len(),
      skipped: migrations.skipped.len(),
      failed:  migrations.failed.iter().map(|(name, _)| name.clone()).collect(),
    });

    let missing = runner.missing().await?;
    if missing.is_empty() {
      self.transition(BootstrapState::Ready, BootstrapEvent::LedgerComplete);
      return Ok(self.report(ReadyVia::Migrations, migrations, None));
    }
    tracing::warn!(?missing, "migration ledger incomplete, trying schema file");

    match self.apply_schema_file().await {
      Ok((file, seeded)) => {
        self.transition(BootstrapState::SchemaApplied, BootstrapEvent::SchemaApplied {
          origin: file.origin,
          checksum: file.checksum,
          seeded,
        });
        self.transition(BootstrapState::Ready, BootstrapEvent::Finished);
        Ok(self.report(ReadyVia::SchemaFile, migrations, None))
      }
      Err(e @ Error::Timeout { .. }) => Err(e),
      Err(e) => {
        tracing::warn!(error = %e, "schema file tier unavailable, initialising tables directly");
        self.transition(BootstrapState::DirectInitRunning, BootstrapEvent::SchemaUnavailable {
          reason: e.to_string(),
        });

        let init = TableInitializers::new(self.store, self.plan.tables, timeout)
          .run()
          .await?;
        self.transition(BootstrapState::Ready, BootstrapEvent::TablesInitialized {
          tables: init.initialized.len(),
          seeded: init.seeded.clone(),
        });
        Ok(self.report(ReadyVia::DirectInit, migrations, Some(init)))
      }
    }
  }

  async fn connect(&self) -> Result<()> {
    let timeout = self.plan.step_timeout;
    bounded("connect", timeout, self.store.ping())
      .await?
      .map_err(|e| Error::Connection(boxed(e)))?;
    bounded("ledger creation", timeout, self.store.ensure_ledger())
      .await?
      .map_err(|e| Error::Ledger(boxed(e)))?;
    Ok(())
  }

  /// Load and apply the schema text, confirm it produced every table, then
  /// seed any singleton table it left empty. Returns the file and the names
  /// of the tables seeded here.
  async fn apply_schema_file(&self) -> Result<(SchemaFile, Vec<String>)> {
    let timeout = self.plan.step_timeout;
    let file = self.plan.schema.load().await?;

    bounded("schema file", timeout, self.store.apply_schema(&file.text))
      .await?
      .map_err(|e| Error::SchemaFile(format!("{}: {e}", file.origin)))?;

    let mut absent = Vec::new();
    for spec in self.plan.tables {
      let exists = bounded("schema verification", timeout, self.store.table_exists(spec.name))
        .await?
        .map_err(|e| Error::Store(boxed(e)))?;
      if !exists {
        absent.push(spec.name);
      }
    }
    if !absent.is_empty() {
      return Err(Error::SchemaFile(format!(
        "{} left tables missing: {}",
        file.origin,
        absent.join(", ")
      )));
    }

    let mut seeded = Vec::new();
    for spec in self.plan.tables.iter().filter(|t| t.is_singleton()) {
      let inserted = bounded(
        &format!("seed {}", spec.name),
        timeout,
        self.store.insert_defaults_if_empty(spec),
      )
      .await?
      .map_err(|e| Error::Store(boxed(e)))?;
      if inserted {
        seeded.push(spec.name.to_owned());
      }
    }

    tracing::info!(
      origin = %file.origin,
      checksum = %file.checksum,
      ?seeded,
      "schema file applied"
    );
    Ok((file, seeded))
  }

  fn transition(&mut self, to: BootstrapState, event: BootstrapEvent) {
    let from = self.state;
    tracing::info!(%from, %to, ?event, "bootstrap transition");
    self.state = to;
    self.transitions.push(Transition { from, to, event });
  }

  fn report(
    &self,
    via: ReadyVia,
    migrations: MigrationReport,
    init: Option<InitReport>,
  ) -> BootstrapReport {
    BootstrapReport {
      via,
      migrations,
      init,
      transitions: self.transitions.clone(),
    }
  }
}

/// Bring the schema behind `store` up to date. Resolves once the database is
/// ready to serve requests, or returns the error that stopped it.
pub async fn initialize_database<S>(store: &S, plan: &BootstrapPlan) -> Result<BootstrapReport>
where
  S: SchemaStore,
{
  Bootstrap::new(store, plan).run().await
}
