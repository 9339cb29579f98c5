//! Orchestrator and runner tests against an in-process fake store.
//!
//! The fake treats each migration statement and each word of a schema text
//! as the name of a table to create, and records every call so the tests can
//! check which tier did the work.

use std::{
  collections::{BTreeMap, HashSet},
  sync::Mutex,
  time::Duration,
};

use chrono::Utc;

use crate::{
  BootstrapPlan, BootstrapState, Error, ReadyVia,
  bootstrap::{Bootstrap, BootstrapEvent, initialize_database},
  initializer::TableInitializers,
  migration::{
    Migration, MigrationOutcome, MigrationRecord, MigrationRunner, check_migration_order,
  },
  schema_file::SchemaSource,
  store::SchemaStore,
  table::TableSpec,
};

// ─── Fixtures ────────────────────────────────────────────────────────────────

const TABLES: &[TableSpec] = &[
  TableSpec { name: "course_enrollments", parents: &["courses", "users"], ddl: &[], seed: None },
  TableSpec { name: "courses", parents: &["users"], ddl: &[], seed: None },
  TableSpec { name: "system_settings", parents: &[], ddl: &[], seed: Some("seed") },
  TableSpec { name: "users", parents: &[], ddl: &[], seed: None },
];

const MIGRATIONS: &[Migration] = &[
  Migration { name: "create_users_table", creates: &["users"], statements: &["users"] },
  Migration { name: "create_courses_table", creates: &["courses"], statements: &["courses"] },
  Migration {
    name:       "create_enrollments_table",
    creates:    &["course_enrollments"],
    statements: &["course_enrollments"],
  },
  Migration {
    name:       "create_settings_tables",
    creates:    &["system_settings"],
    statements: &["system_settings"],
  },
];

const FULL_SCHEMA: &str = "users courses course_enrollments system_settings";

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct FakeError(String);

#[derive(Default)]
struct Inner {
  tables:          HashSet<String>,
  seeded:          HashSet<String>,
  ledger:          BTreeMap<String, MigrationRecord>,
  calls:           Vec<String>,
  fail_migrations: HashSet<&'static str>,
  fail_tables:     HashSet<&'static str>,
}

#[derive(Default)]
struct FakeStore {
  inner:       Mutex<Inner>,
  unreachable: bool,
  hang:        bool,
}

impl FakeStore {
  fn failing_migration(name: &'static str) -> Self {
    let store = Self::default();
    store.inner.lock().unwrap().fail_migrations.insert(name);
    store
  }

  fn has_table(&self, name: &str) -> bool {
    self.inner.lock().unwrap().tables.contains(name)
  }

  fn calls(&self) -> Vec<String> { self.inner.lock().unwrap().calls.clone() }

  fn created(&self) -> Vec<String> {
    self
      .calls()
      .into_iter()
      .filter_map(|c| c.strip_prefix("create:").map(str::to_owned))
      .collect()
  }
}

impl SchemaStore for FakeStore {
  type Error = FakeError;

  async fn ping(&self) -> Result<(), FakeError> {
    if self.hang {
      tokio::time::sleep(Duration::from_secs(60)).await;
    }
    if self.unreachable {
      return Err(FakeError("connection refused".into()));
    }
    Ok(())
  }

  async fn ensure_ledger(&self) -> Result<(), FakeError> {
    self.inner.lock().unwrap().tables.insert("migrations".into());
    Ok(())
  }

  async fn ledger(&self) -> Result<Vec<MigrationRecord>, FakeError> {
    Ok(self.inner.lock().unwrap().ledger.values().cloned().collect())
  }

  async fn ledger_record(&self, name: &str) -> Result<Option<MigrationRecord>, FakeError> {
    Ok(self.inner.lock().unwrap().ledger.get(name).cloned())
  }

  async fn record_outcome(
    &self,
    name: &str,
    outcome: &MigrationOutcome,
  ) -> Result<(), FakeError> {
    let record = MigrationRecord {
      name:          name.to_owned(),
      success:       outcome.is_success(),
      executed_at:   Utc::now(),
      error_message: outcome.error_message().map(str::to_owned),
    };
    self.inner.lock().unwrap().ledger.insert(name.to_owned(), record);
    Ok(())
  }

  async fn execute_migration(&self, migration: &'static Migration) -> Result<(), FakeError> {
    let mut inner = self.inner.lock().unwrap();
    inner.calls.push(format!("migrate:{}", migration.name));
    if inner.fail_migrations.contains(migration.name) {
      return Err(FakeError(format!("{} exploded", migration.name)));
    }
    for table in migration.statements {
      inner.tables.insert((*table).to_owned());
    }
    Ok(())
  }

  async fn table_exists(&self, table: &str) -> Result<bool, FakeError> {
    Ok(self.has_table(table))
  }

  async fn create_table(&self, spec: &'static TableSpec) -> Result<(), FakeError> {
    let mut inner = self.inner.lock().unwrap();
    inner.calls.push(format!("create:{}", spec.name));
    if inner.fail_tables.contains(spec.name) {
      return Err(FakeError(format!("cannot create {}", spec.name)));
    }
    inner.tables.insert(spec.name.to_owned());
    Ok(())
  }

  async fn insert_defaults_if_empty(&self, spec: &'static TableSpec) -> Result<bool, FakeError> {
    Ok(self.inner.lock().unwrap().seeded.insert(spec.name.to_owned()))
  }

  async fn apply_schema(&self, sql: &str) -> Result<(), FakeError> {
    let mut inner = self.inner.lock().unwrap();
    inner.calls.push("schema".into());
    if sql.contains("BROKEN") {
      return Err(FakeError("syntax error near BROKEN".into()));
    }
    for table in sql.split_whitespace() {
      inner.tables.insert(table.to_owned());
    }
    Ok(())
  }
}

fn plan() -> BootstrapPlan {
  BootstrapPlan::new(MIGRATIONS, TABLES).with_step_timeout(Duration::from_secs(5))
}

fn states(transitions: &[crate::bootstrap::Transition]) -> Vec<BootstrapState> {
  transitions.iter().map(|t| t.to).collect()
}

// ─── Happy path ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn fresh_store_is_ready_via_migrations() {
  let store = FakeStore::default();
  let report = initialize_database(&store, &plan()).await.unwrap();

  assert_eq!(report.via, ReadyVia::Migrations);
  assert_eq!(report.migrations.applied.len(), MIGRATIONS.len());
  assert_eq!(states(&report.transitions), [
    BootstrapState::MigrationsRunning,
    BootstrapState::MigrationsChecked,
    BootstrapState::Ready,
  ]);
  for spec in TABLES {
    assert!(store.has_table(spec.name), "{} missing", spec.name);
  }
  assert!(store.created().is_empty());
}

#[tokio::test]
async fn second_run_skips_every_migration() {
  let store = FakeStore::default();
  initialize_database(&store, &plan()).await.unwrap();
  let again = initialize_database(&store, &plan()).await.unwrap();

  assert_eq!(again.via, ReadyVia::Migrations);
  assert!(again.migrations.applied.is_empty());
  assert_eq!(again.migrations.skipped.len(), MIGRATIONS.len());
  let migrate_calls = store.calls().iter().filter(|c| c.starts_with("migrate:")).count();
  assert_eq!(migrate_calls, MIGRATIONS.len());
}

// ─── Ledger ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn failed_migration_is_recorded_then_retried() {
  let store = FakeStore::failing_migration("create_courses_table");
  let runner = MigrationRunner::new(&store, MIGRATIONS, TABLES, Duration::from_secs(5));

  let first = runner.run().await.unwrap();
  let failed: Vec<&str> = first.failed.iter().map(|(n, _)| n.as_str()).collect();
  // enrollments is refused because its parent was never created
  assert_eq!(failed, ["create_courses_table", "create_enrollments_table"]);
  assert!(!runner.check_complete().await.unwrap());
  assert_eq!(runner.missing().await.unwrap(), [
    "create_courses_table",
    "create_enrollments_table"
  ]);

  let record = store.ledger_record("create_courses_table").await.unwrap().unwrap();
  assert!(!record.success);
  assert!(record.error_message.unwrap().contains("exploded"));
  let record = store.ledger_record("create_enrollments_table").await.unwrap().unwrap();
  assert!(!record.success);
  assert!(record.error_message.unwrap().contains("parent table courses"));
  assert!(!store.has_table("course_enrollments"));

  store.inner.lock().unwrap().fail_migrations.clear();
  let second = runner.run().await.unwrap();
  assert_eq!(second.applied, ["create_courses_table", "create_enrollments_table"]);
  assert_eq!(second.skipped.len(), MIGRATIONS.len() - 2);
  assert!(runner.check_complete().await.unwrap());

  let ledger = store.ledger().await.unwrap();
  assert_eq!(ledger.len(), MIGRATIONS.len());
  let record = ledger.iter().find(|r| r.name == "create_courses_table").unwrap();
  assert!(record.success);
  assert!(record.error_message.is_none());
}

#[tokio::test]
async fn migration_with_missing_parent_is_not_executed() {
  let store = FakeStore::default();
  let runner = MigrationRunner::new(&store, &MIGRATIONS[1..2], TABLES, Duration::from_secs(5));

  let report = runner.run().await.unwrap();
  assert!(report.applied.is_empty());
  assert_eq!(report.failed[0].0, "create_courses_table");
  assert!(!store.calls().contains(&"migrate:create_courses_table".to_owned()));
  assert!(!store.has_table("courses"));
}

#[test]
fn declared_migration_order_is_checked() {
  check_migration_order(MIGRATIONS, TABLES).unwrap();

  const REVERSED: &[Migration] = &[
    Migration { name: "create_courses_table", creates: &["courses"], statements: &[] },
    Migration { name: "create_users_table", creates: &["users"], statements: &[] },
  ];
  let err = check_migration_order(REVERSED, TABLES).unwrap_err();
  assert!(matches!(
    err,
    Error::MissingDependency { ref table, ref parent } if table == "courses" && parent == "users"
  ));

  const UNKNOWN: &[Migration] =
    &[Migration { name: "create_widgets", creates: &["widgets"], statements: &[] }];
  assert!(matches!(
    check_migration_order(UNKNOWN, TABLES),
    Err(Error::UnknownDependency { .. })
  ));

  const SAME_MIGRATION: &[Migration] = &[Migration {
    name:       "create_all",
    creates:    &["course_enrollments", "courses", "users"],
    statements: &[],
  }];
  check_migration_order(SAME_MIGRATION, TABLES).unwrap();
}

// ─── Fallback tiers ──────────────────────────────────────────────────────────

#[tokio::test]
async fn incomplete_ledger_uses_schema_file_without_initializers() {
  let store = FakeStore::failing_migration("create_courses_table");
  let plan = plan().with_schema(SchemaSource::Inline(FULL_SCHEMA.into()));

  let report = initialize_database(&store, &plan).await.unwrap();

  assert_eq!(report.via, ReadyVia::SchemaFile);
  assert!(report.init.is_none());
  assert!(store.created().is_empty());
  assert!(store.calls().contains(&"schema".to_owned()));
  assert!(report.transitions.iter().any(|t| matches!(
    t.event,
    BootstrapEvent::SchemaApplied { ref seeded, .. } if seeded == &["system_settings"]
  )));
  assert_eq!(states(&report.transitions), [
    BootstrapState::MigrationsRunning,
    BootstrapState::MigrationsChecked,
    BootstrapState::SchemaApplied,
    BootstrapState::Ready,
  ]);
}

#[tokio::test]
async fn invalid_schema_degrades_to_direct_init() {
  let store = FakeStore::failing_migration("create_courses_table");
  let plan = plan().with_schema(SchemaSource::Inline("CREATE BROKEN".into()));

  let report = initialize_database(&store, &plan).await.unwrap();

  assert_eq!(report.via, ReadyVia::DirectInit);
  let init = report.init.unwrap();
  assert_eq!(init.initialized.len(), TABLES.len());
  assert_eq!(init.seeded, ["system_settings"]);
  assert!(report.transitions.iter().any(|t| matches!(
    t.event,
    BootstrapEvent::SchemaUnavailable { ref reason } if reason.contains("BROKEN")
  )));
}

#[tokio::test]
async fn missing_schema_file_degrades_to_direct_init() {
  let store = FakeStore::failing_migration("create_users_table");
  let path = std::env::temp_dir().join("campus-core-tests-absent.sql");
  let plan = plan().with_schema(SchemaSource::File(path));

  let report = initialize_database(&store, &plan).await.unwrap();
  assert_eq!(report.via, ReadyVia::DirectInit);
}

#[tokio::test]
async fn schema_missing_tables_degrades_to_direct_init() {
  let store = FakeStore::failing_migration("create_enrollments_table");
  let plan = plan().with_schema(SchemaSource::Inline("users courses".into()));

  let report = initialize_database(&store, &plan).await.unwrap();
  assert_eq!(report.via, ReadyVia::DirectInit);
  assert!(store.has_table("course_enrollments"));
}

#[tokio::test]
async fn direct_init_respects_foreign_key_order() {
  let store = FakeStore::failing_migration("create_users_table");
  let report = initialize_database(&store, &plan()).await.unwrap();
  assert_eq!(report.via, ReadyVia::DirectInit);

  let created = store.created();
  let position = |name: &str| created.iter().position(|c| c == name).unwrap();
  for spec in TABLES {
    for parent in spec.parents {
      assert!(
        position(parent) < position(spec.name),
        "{parent} must be created before {}",
        spec.name
      );
    }
  }
}

// ─── Failures ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn unreachable_database_fails_bootstrap() {
  let store = FakeStore { unreachable: true, ..Default::default() };
  let plan = plan();
  let mut bootstrap = Bootstrap::new(&store, &plan);

  let err = bootstrap.run().await.unwrap_err();
  assert!(matches!(err, Error::Connection(_)));
  assert_eq!(bootstrap.state(), BootstrapState::Failed);
  assert!(matches!(
    bootstrap.transitions().last().unwrap().event,
    BootstrapEvent::Aborted { .. }
  ));
  assert!(store.calls().is_empty());
}

#[tokio::test]
async fn hung_call_times_out_into_failed() {
  let store = FakeStore { hang: true, ..Default::default() };
  let plan = plan().with_step_timeout(Duration::from_millis(50));
  let mut bootstrap = Bootstrap::new(&store, &plan);

  let err = bootstrap.run().await.unwrap_err();
  assert!(matches!(err, Error::Timeout { ref step, .. } if step == "connect"));
  assert_eq!(bootstrap.state(), BootstrapState::Failed);
}

#[tokio::test]
async fn direct_init_error_is_fatal() {
  let store = FakeStore::failing_migration("create_courses_table");
  store.inner.lock().unwrap().fail_tables.insert("courses");

  let err = initialize_database(&store, &plan()).await.unwrap_err();
  assert!(matches!(err, Error::Initializer { ref table, .. } if table == "courses"));
  assert!(!store.created().contains(&"course_enrollments".to_owned()));
}

#[tokio::test]
async fn bootstrap_runs_only_once() {
  let store = FakeStore::default();
  let plan = plan();
  let mut bootstrap = Bootstrap::new(&store, &plan);
  bootstrap.run().await.unwrap();

  let err = bootstrap.run().await.unwrap_err();
  assert!(matches!(err, Error::InvalidState(BootstrapState::Ready)));
}

// ─── Initializers ────────────────────────────────────────────────────────────

#[tokio::test]
async fn initializer_refuses_missing_parent() {
  let store = FakeStore::default();
  let init = TableInitializers::new(&store, TABLES, Duration::from_secs(5));

  let err = init.initialize(&TABLES[1]).await.unwrap_err();
  assert!(matches!(
    err,
    Error::MissingDependency { ref table, ref parent } if table == "courses" && parent == "users"
  ));
  assert!(store.created().is_empty());
}

#[tokio::test]
async fn initializers_seed_once() {
  let store = FakeStore::default();
  let init = TableInitializers::new(&store, TABLES, Duration::from_secs(5));

  let first = init.run().await.unwrap();
  let second = init.run().await.unwrap();
  assert_eq!(first.seeded, ["system_settings"]);
  assert!(second.seeded.is_empty());
  assert_eq!(second.initialized, first.initialized);
}
