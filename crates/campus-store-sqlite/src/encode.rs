//! Conversions between Rust domain types and the plain column values stored
//! in SQLite.
//!
//! Timestamps are RFC 3339 strings; booleans are `0`/`1` integers.

use campus_core::{
  migration::MigrationRecord,
  settings::{SecuritySettings, SystemSettings},
};
use chrono::{DateTime, SecondsFormat, Utc};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

fn decode_u32(column: &'static str, value: i64) -> Result<u32> {
  u32::try_from(value).map_err(|_| Error::OutOfRange { column, value })
}

// ─── Raw row types ───────────────────────────────────────────────────────────

pub struct RawMigrationRecord {
  pub name:          String,
  pub success:       bool,
  pub executed_at:   String,
  pub error_message: Option<String>,
}

impl RawMigrationRecord {
  pub const COLUMNS: &'static str = "name, success, executed_at, error_message";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      name:          row.get(0)?,
      success:       row.get(1)?,
      executed_at:   row.get(2)?,
      error_message: row.get(3)?,
    })
  }

  pub fn into_record(self) -> Result<MigrationRecord> {
    Ok(MigrationRecord {
      name:          self.name,
      success:       self.success,
      executed_at:   decode_dt(&self.executed_at)?,
      error_message: self.error_message,
    })
  }
}

pub struct RawSystemSettings {
  pub school_name:        String,
  pub school_email:       String,
  pub school_phone:       String,
  pub school_address:     String,
  pub academic_year:      String,
  pub default_language:   String,
  pub timezone:           String,
  pub maintenance_mode:   bool,
  pub allow_registration: bool,
  pub updated_at:         String,
}

impl RawSystemSettings {
  pub const SELECT: &'static str = "
    SELECT school_name, school_email, school_phone, school_address,
           academic_year, default_language, timezone,
           maintenance_mode, allow_registration, updated_at
    FROM system_settings
    WHERE id = 1";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      school_name:        row.get(0)?,
      school_email:       row.get(1)?,
      school_phone:       row.get(2)?,
      school_address:     row.get(3)?,
      academic_year:      row.get(4)?,
      default_language:   row.get(5)?,
      timezone:           row.get(6)?,
      maintenance_mode:   row.get(7)?,
      allow_registration: row.get(8)?,
      updated_at:         row.get(9)?,
    })
  }

  pub fn into_settings(self) -> Result<SystemSettings> {
    Ok(SystemSettings {
      school_name:        self.school_name,
      school_email:       self.school_email,
      school_phone:       self.school_phone,
      school_address:     self.school_address,
      academic_year:      self.academic_year,
      default_language:   self.default_language,
      timezone:           self.timezone,
      maintenance_mode:   self.maintenance_mode,
      allow_registration: self.allow_registration,
      updated_at:         decode_dt(&self.updated_at)?,
    })
  }
}

pub struct RawSecuritySettings {
  pub password_min_length:      i64,
  pub require_special_chars:    bool,
  pub require_numbers:          bool,
  pub session_timeout_minutes:  i64,
  pub max_login_attempts:       i64,
  pub lockout_duration_minutes: i64,
  pub two_factor_required:      bool,
  pub updated_at:               String,
}

impl RawSecuritySettings {
  pub const SELECT: &'static str = "
    SELECT password_min_length, require_special_chars, require_numbers,
           session_timeout_minutes, max_login_attempts, lockout_duration_minutes,
           two_factor_required, updated_at
    FROM security_settings
    WHERE id = 1";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      password_min_length:      row.get(0)?,
      require_special_chars:    row.get(1)?,
      require_numbers:          row.get(2)?,
      session_timeout_minutes:  row.get(3)?,
      max_login_attempts:       row.get(4)?,
      lockout_duration_minutes: row.get(5)?,
      two_factor_required:      row.get(6)?,
      updated_at:               row.get(7)?,
    })
  }

  pub fn into_settings(self) -> Result<SecuritySettings> {
    Ok(SecuritySettings {
      password_min_length: decode_u32("password_min_length", self.password_min_length)?,
      require_special_chars: self.require_special_chars,
      require_numbers: self.require_numbers,
      session_timeout_minutes: decode_u32(
        "session_timeout_minutes",
        self.session_timeout_minutes,
      )?,
      max_login_attempts: decode_u32("max_login_attempts", self.max_login_attempts)?,
      lockout_duration_minutes: decode_u32(
        "lockout_duration_minutes",
        self.lockout_duration_minutes,
      )?,
      two_factor_required: self.two_factor_required,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}
