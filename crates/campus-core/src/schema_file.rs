//! The monolithic schema text used as the second bootstrap tier.

use std::{fmt, path::PathBuf};

use sha2::{Digest, Sha256};

use crate::{Error, Result};

/// Where the fallback schema text comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaSource {
  /// Read from disk at bootstrap time.
  File(PathBuf),
  /// Text supplied by the caller, e.g. rendered from the table catalog.
  Inline(String),
  /// No fallback schema; degrade straight to direct initialisation.
  Disabled,
}

impl fmt::Display for SchemaSource {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::File(path) => write!(f, "{}", path.display()),
      Self::Inline(_) => f.write_str("<inline>"),
      Self::Disabled => f.write_str("<disabled>"),
    }
  }
}

/// Loaded, non-empty schema text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaFile {
  pub origin:   String,
  pub text:     String,
  /// Lowercase hex SHA-256 of `text`.
  pub checksum: String,
}

impl SchemaFile {
  pub fn from_text(origin: impl Into<String>, text: impl Into<String>) -> Result<Self> {
    let origin = origin.into();
    let text = text.into();
    if text.trim().is_empty() {
      return Err(Error::SchemaFile(format!("{origin} contains no statements")));
    }
    let checksum = hex::encode(Sha256::digest(text.as_bytes()));
    Ok(Self { origin, text, checksum })
  }
}

impl SchemaSource {
  pub async fn load(&self) -> Result<SchemaFile> {
    match self {
      Self::File(path) => {
        let text = tokio::fs::read_to_string(path).await.map_err(|e| {
          Error::SchemaFile(format!("cannot read {}: {e}", path.display()))
        })?;
        SchemaFile::from_text(self.to_string(), text)
      }
      Self::Inline(text) => SchemaFile::from_text(self.to_string(), text.clone()),
      Self::Disabled => Err(Error::SchemaFile("no schema file configured".into())),
    }
  }
}
