//! System-wide and security settings held in singleton rows.
//!
//! Each category lives in a table constrained to a single row (`id = 1`).
//! Updates are partial: fields left as `None` keep their current value.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// ─── System settings ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemSettings {
  pub school_name:        String,
  pub school_email:       String,
  pub school_phone:       String,
  pub school_address:     String,
  pub academic_year:      String,
  pub default_language:   String,
  pub timezone:           String,
  pub maintenance_mode:   bool,
  pub allow_registration: bool,
  pub updated_at:         DateTime<Utc>,
}

impl SystemSettings {
  pub fn defaults(now: DateTime<Utc>) -> Self {
    Self {
      school_name:        "School Management System".to_owned(),
      school_email:       "admin@school.local".to_owned(),
      school_phone:       String::new(),
      school_address:     String::new(),
      academic_year:      "2024-2025".to_owned(),
      default_language:   "en".to_owned(),
      timezone:           "UTC".to_owned(),
      maintenance_mode:   false,
      allow_registration: true,
      updated_at:         now,
    }
  }

  /// Validate `update` and merge it into `self`, stamping `updated_at`.
  pub fn apply(&mut self, update: SystemSettingsUpdate, now: DateTime<Utc>) -> Result<()> {
    update.validate()?;

    let SystemSettingsUpdate {
      school_name,
      school_email,
      school_phone,
      school_address,
      academic_year,
      default_language,
      timezone,
      maintenance_mode,
      allow_registration,
    } = update;

    if let Some(v) = school_name { self.school_name = v; }
    if let Some(v) = school_email { self.school_email = v; }
    if let Some(v) = school_phone { self.school_phone = v; }
    if let Some(v) = school_address { self.school_address = v; }
    if let Some(v) = academic_year { self.academic_year = v; }
    if let Some(v) = default_language { self.default_language = v; }
    if let Some(v) = timezone { self.timezone = v; }
    if let Some(v) = maintenance_mode { self.maintenance_mode = v; }
    if let Some(v) = allow_registration { self.allow_registration = v; }
    self.updated_at = now;
    Ok(())
  }
}

/// Partial update for [`SystemSettings`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemSettingsUpdate {
  pub school_name:        Option<String>,
  pub school_email:       Option<String>,
  pub school_phone:       Option<String>,
  pub school_address:     Option<String>,
  pub academic_year:      Option<String>,
  pub default_language:   Option<String>,
  pub timezone:           Option<String>,
  pub maintenance_mode:   Option<bool>,
  pub allow_registration: Option<bool>,
}

impl SystemSettingsUpdate {
  pub fn validate(&self) -> Result<()> {
    if let Some(name) = &self.school_name
      && name.trim().is_empty()
    {
      return Err(Error::InvalidSetting("school_name must not be blank".into()));
    }
    if let Some(email) = &self.school_email
      && !email.is_empty()
      && !email.contains('@')
    {
      return Err(Error::InvalidSetting(format!(
        "school_email {email:?} is not an email address"
      )));
    }
    if let Some(lang) = &self.default_language
      && lang.trim().is_empty()
    {
      return Err(Error::InvalidSetting("default_language must not be blank".into()));
    }
    Ok(())
  }
}

// ─── Security settings ───────────────────────────────────────────────────────

pub const PASSWORD_MIN_LENGTH_RANGE: std::ops::RangeInclusive<u32> = 6..=128;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecuritySettings {
  pub password_min_length:      u32,
  pub require_special_chars:    bool,
  pub require_numbers:          bool,
  pub session_timeout_minutes:  u32,
  pub max_login_attempts:       u32,
  pub lockout_duration_minutes: u32,
  pub two_factor_required:      bool,
  pub updated_at:               DateTime<Utc>,
}

impl SecuritySettings {
  pub fn defaults(now: DateTime<Utc>) -> Self {
    Self {
      password_min_length:      8,
      require_special_chars:    true,
      require_numbers:          true,
      session_timeout_minutes:  30,
      max_login_attempts:       5,
      lockout_duration_minutes: 15,
      two_factor_required:      false,
      updated_at:               now,
    }
  }

  pub fn apply(&mut self, update: SecuritySettingsUpdate, now: DateTime<Utc>) -> Result<()> {
    update.validate()?;

    let SecuritySettingsUpdate {
      password_min_length,
      require_special_chars,
      require_numbers,
      session_timeout_minutes,
      max_login_attempts,
      lockout_duration_minutes,
      two_factor_required,
    } = update;

    if let Some(v) = password_min_length { self.password_min_length = v; }
    if let Some(v) = require_special_chars { self.require_special_chars = v; }
    if let Some(v) = require_numbers { self.require_numbers = v; }
    if let Some(v) = session_timeout_minutes { self.session_timeout_minutes = v; }
    if let Some(v) = max_login_attempts { self.max_login_attempts = v; }
    if let Some(v) = lockout_duration_minutes { self.lockout_duration_minutes = v; }
    if let Some(v) = two_factor_required { self.two_factor_required = v; }
    self.updated_at = now;
    Ok(())
  }
}

/// Partial update for [`SecuritySettings`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecuritySettingsUpdate {
  pub password_min_length:      Option<u32>,
  pub require_special_chars:    Option<bool>,
  pub require_numbers:          Option<bool>,
  pub session_timeout_minutes:  Option<u32>,
  pub max_login_attempts:       Option<u32>,
  pub lockout_duration_minutes: Option<u32>,
  pub two_factor_required:      Option<bool>,
}

impl SecuritySettingsUpdate {
  pub fn validate(&self) -> Result<()> {
    if let Some(len) = self.password_min_length
      && !PASSWORD_MIN_LENGTH_RANGE.contains(&len)
    {
      return Err(Error::InvalidSetting(format!(
        "password_min_length must be within {}..={}, got {len}",
        PASSWORD_MIN_LENGTH_RANGE.start(),
        PASSWORD_MIN_LENGTH_RANGE.end(),
      )));
    }
    if self.session_timeout_minutes == Some(0) {
      return Err(Error::InvalidSetting("session_timeout_minutes must be at least 1".into()));
    }
    if self.max_login_attempts == Some(0) {
      return Err(Error::InvalidSetting("max_login_attempts must be at least 1".into()));
    }
    Ok(())
  }
}
