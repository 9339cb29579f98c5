//! [`SqliteStore`]: the SQLite implementation of [`SchemaStore`].

use std::{path::Path, time::Duration};

use campus_core::{
  migration::{Migration, MigrationOutcome, MigrationRecord},
  store::SchemaStore,
  table::{TableSpec, teardown_order},
};
use chrono::Utc;
use rusqlite::{OptionalExtension as _, TransactionBehavior};

use crate::{
  Result,
  encode::{RawMigrationRecord, encode_dt},
  schema::{CONNECTION_PRAGMAS, MIGRATIONS_LEDGER},
};

// ─── Options ─────────────────────────────────────────────────────────────────

/// Per-connection settings applied when a store is opened.
#[derive(Debug, Clone)]
pub struct OpenOptions {
  /// How long a statement waits on a lock held by another connection
  /// before failing with `SQLITE_BUSY`.
  pub busy_timeout: Duration,
}

impl Default for OpenOptions {
  fn default() -> Self { Self { busy_timeout: Duration::from_secs(5) } }
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Campus database backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted. The handle
/// is created by the application entry point and passed to everything that
/// needs it; there is no global connection.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) the database at `path`.
  ///
  /// Only the connection is set up here; tables are created by the
  /// bootstrap (`campus_core::initialize_database`).
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    Self::open_with(path, &OpenOptions::default()).await
  }

  pub async fn open_with(path: impl AsRef<Path>, options: &OpenOptions) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Self::configure(conn, options).await
  }

  /// Open an in-memory database, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::configure(conn, &OpenOptions::default()).await
  }

  async fn configure(conn: tokio_rusqlite::Connection, options: &OpenOptions) -> Result<Self> {
    let busy_timeout = options.busy_timeout;
    conn
      .call(move |conn| {
        conn.busy_timeout(busy_timeout)?;
        conn.execute_batch(CONNECTION_PRAGMAS)?;
        Ok(())
      })
      .await?;
    Ok(Self { conn })
  }

  /// Close the connection, waiting for queued calls to finish.
  pub async fn close(self) -> Result<()> {
    self.conn.close().await?;
    Ok(())
  }

  /// Drop every table in `tables` (children first) and the migration ledger,
  /// in one transaction. Returns the dropped table names in drop order.
  ///
  /// Operator-only: nothing in the bootstrap path calls this.
  pub async fn reset(&self, tables: &'static [TableSpec]) -> Result<Vec<&'static str>> {
    let order: Vec<&'static str> = teardown_order(tables)?
      .into_iter()
      .map(|spec| spec.name)
      .collect();
    let dropped = order.clone();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        for name in order.iter().chain(std::iter::once(&"migrations")) {
          tx.execute_batch(&format!("DROP TABLE IF EXISTS {name}"))?;
        }
        tx.commit()?;
        Ok(())
      })
      .await?;

    tracing::warn!(tables = dropped.len(), "dropped all tables and the migration ledger");
    Ok(dropped)
  }

  /// Run `statements` in one immediate transaction.
  async fn execute_all(&self, statements: &'static [&'static str]) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        for stmt in statements {
          tx.execute_batch(stmt)?;
        }
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── SchemaStore impl ────────────────────────────────────────────────────────

impl SchemaStore for SqliteStore {
  type Error = crate::Error;

  async fn ping(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Ledger ────────────────────────────────────────────────────────────────

  async fn ensure_ledger(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(MIGRATIONS_LEDGER)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn ledger(&self) -> Result<Vec<MigrationRecord>> {
    let raws: Vec<RawMigrationRecord> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM migrations ORDER BY name",
          RawMigrationRecord::COLUMNS
        ))?;
        let rows = stmt
          .query_map([], RawMigrationRecord::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawMigrationRecord::into_record).collect()
  }

  async fn ledger_record(&self, name: &str) -> Result<Option<MigrationRecord>> {
    let name = name.to_owned();

    let raw: Option<RawMigrationRecord> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {} FROM migrations WHERE name = ?1",
                RawMigrationRecord::COLUMNS
              ),
              rusqlite::params![name],
              RawMigrationRecord::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawMigrationRecord::into_record).transpose()
  }

  async fn record_outcome(&self, name: &str, outcome: &MigrationOutcome) -> Result<()> {
    let name    = name.to_owned();
    let success = outcome.is_success();
    let message = outcome.error_message().map(str::to_owned);
    let at_str  = encode_dt(Utc::now());

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO migrations (name, success, executed_at, error_message)
           VALUES (?1, ?2, ?3, ?4)
           ON CONFLICT (name) DO UPDATE SET
             success       = excluded.success,
             executed_at   = excluded.executed_at,
             error_message = excluded.error_message",
          rusqlite::params![name, success, at_str, message],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn execute_migration(&self, migration: &'static Migration) -> Result<()> {
    self.execute_all(migration.statements).await
  }

  // ── Tables ────────────────────────────────────────────────────────────────

  async fn table_exists(&self, table: &str) -> Result<bool> {
    let table = table.to_owned();

    let exists = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT EXISTS (SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1)",
          rusqlite::params![table],
          |row| row.get::<_, bool>(0),
        )?)
      })
      .await?;
    Ok(exists)
  }

  async fn create_table(&self, spec: &'static TableSpec) -> Result<()> {
    self.execute_all(spec.ddl).await
  }

  async fn insert_defaults_if_empty(&self, spec: &'static TableSpec) -> Result<bool> {
    let Some(seed) = spec.seed else {
      return Ok(false);
    };

    let inserted = self
      .conn
      .call(move |conn| Ok(conn.execute(seed, [])?))
      .await?;
    Ok(inserted > 0)
  }

  // ── Schema file ───────────────────────────────────────────────────────────

  async fn apply_schema(&self, sql: &str) -> Result<()> {
    let sql = sql.to_owned();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute_batch(&sql)?;
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}
