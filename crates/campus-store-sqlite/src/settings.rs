//! [`SettingsStore`] impl: read and update the singleton settings rows.
//!
//! Updates read the current row, merge, and upsert on `id = 1` inside one
//! immediate transaction, so two concurrent updates serialise rather than
//! interleave. Validation happens in the merge (`apply`); a rejected update
//! surfaces as `Error::Core(InvalidSetting)`.

use campus_core::{
  settings::{
    SecuritySettings, SecuritySettingsUpdate, SystemSettings, SystemSettingsUpdate,
  },
  store::SettingsStore,
};
use chrono::{SubsecRound as _, Utc};
use rusqlite::{OptionalExtension as _, TransactionBehavior};

use crate::{
  Error, Result, SqliteStore,
  encode::{RawSecuritySettings, RawSystemSettings, encode_dt},
};

/// Carry a store error out of a `tokio_rusqlite` closure.
fn escape(e: Error) -> tokio_rusqlite::Error { tokio_rusqlite::Error::Other(Box::new(e)) }

impl SettingsStore for SqliteStore {
  async fn system_settings(&self) -> Result<Option<SystemSettings>> {
    let raw: Option<RawSystemSettings> = self
      .conn
      .call(|conn| {
        Ok(
          conn
            .query_row(RawSystemSettings::SELECT, [], RawSystemSettings::from_row)
            .optional()?,
        )
      })
      .await?;

    raw.map(RawSystemSettings::into_settings).transpose()
  }

  async fn update_system_settings(&self, update: SystemSettingsUpdate) -> Result<SystemSettings> {
    let now = Utc::now().trunc_subsecs(3);

    let settings = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let current = tx
          .query_row(RawSystemSettings::SELECT, [], RawSystemSettings::from_row)
          .optional()?;
        let mut settings = match current {
          Some(raw) => raw.into_settings().map_err(escape)?,
          None => SystemSettings::defaults(now),
        };
        // rejected updates roll back with the dropped transaction
        if let Err(e) = settings.apply(update, now) {
          return Ok(Err(e));
        }

        tx.execute(
          "INSERT INTO system_settings (
             id, school_name, school_email, school_phone, school_address,
             academic_year, default_language, timezone,
             maintenance_mode, allow_registration, updated_at
           ) VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
           ON CONFLICT (id) DO UPDATE SET
             school_name        = excluded.school_name,
             school_email       = excluded.school_email,
             school_phone       = excluded.school_phone,
             school_address     = excluded.school_address,
             academic_year      = excluded.academic_year,
             default_language   = excluded.default_language,
             timezone           = excluded.timezone,
             maintenance_mode   = excluded.maintenance_mode,
             allow_registration = excluded.allow_registration,
             updated_at         = excluded.updated_at",
          rusqlite::params![
            settings.school_name,
            settings.school_email,
            settings.school_phone,
            settings.school_address,
            settings.academic_year,
            settings.default_language,
            settings.timezone,
            settings.maintenance_mode,
            settings.allow_registration,
            encode_dt(settings.updated_at),
          ],
        )?;
        tx.commit()?;
        Ok(Ok(settings))
      })
      .await??;

    tracing::info!("system settings updated");
    Ok(settings)
  }

  async fn security_settings(&self) -> Result<Option<SecuritySettings>> {
    let raw: Option<RawSecuritySettings> = self
      .conn
      .call(|conn| {
        Ok(
          conn
            .query_row(RawSecuritySettings::SELECT, [], RawSecuritySettings::from_row)
            .optional()?,
        )
      })
      .await?;

    raw.map(RawSecuritySettings::into_settings).transpose()
  }

  async fn update_security_settings(
    &self,
    update: SecuritySettingsUpdate,
  ) -> Result<SecuritySettings> {
    let now = Utc::now().trunc_subsecs(3);

    let settings = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let current = tx
          .query_row(RawSecuritySettings::SELECT, [], RawSecuritySettings::from_row)
          .optional()?;
        let mut settings = match current {
          Some(raw) => raw.into_settings().map_err(escape)?,
          None => SecuritySettings::defaults(now),
        };
        // rejected updates roll back with the dropped transaction
        if let Err(e) = settings.apply(update, now) {
          return Ok(Err(e));
        }

        tx.execute(
          "INSERT INTO security_settings (
             id, password_min_length, require_special_chars, require_numbers,
             session_timeout_minutes, max_login_attempts, lockout_duration_minutes,
             two_factor_required, updated_at
           ) VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
           ON CONFLICT (id) DO UPDATE SET
             password_min_length      = excluded.password_min_length,
             require_special_chars    = excluded.require_special_chars,
             require_numbers          = excluded.require_numbers,
             session_timeout_minutes  = excluded.session_timeout_minutes,
             max_login_attempts       = excluded.max_login_attempts,
             lockout_duration_minutes = excluded.lockout_duration_minutes,
             two_factor_required      = excluded.two_factor_required,
             updated_at               = excluded.updated_at",
          rusqlite::params![
            settings.password_min_length,
            settings.require_special_chars,
            settings.require_numbers,
            settings.session_timeout_minutes,
            settings.max_login_attempts,
            settings.lockout_duration_minutes,
            settings.two_factor_required,
            encode_dt(settings.updated_at),
          ],
        )?;
        tx.commit()?;
        Ok(Ok(settings))
      })
      .await??;

    tracing::info!("security settings updated");
    Ok(settings)
  }
}
