//! Asset identification.
//!
//! Assets are identified by their canonical lowercase name as used by the
//! price feed (e.g. "bitcoin", "dogecoin"). The same id is used for the
//! price topic name, the sentiment ticker list and the persisted `ticker`
//! column.

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Canonical asset identifier.
///
/// Always trimmed and lowercase. Construct with [`AssetId::parse`] for
/// untrusted input or [`AssetId::new`] when the value is known to be valid.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AssetId(String);

impl AssetId {
    /// Create an asset id, normalizing case and surrounding whitespace.
    ///
    /// # Panics
    /// Panics if the normalized id is empty. Use [`AssetId::parse`] for input
    /// that has not been validated.
    pub fn new(id: impl AsRef<str>) -> Self {
        Self::parse(id.as_ref()).expect("asset id must not be empty")
    }

    /// Parse and normalize an asset id.
    pub fn parse(raw: &str) -> Result<Self> {
        let normalized = raw.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(CoreError::InvalidAssetId(format!("{raw:?} is empty")));
        }
        if normalized.chars().any(char::is_whitespace) {
            return Err(CoreError::InvalidAssetId(format!(
                "{raw:?} contains whitespace"
            )));
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for AssetId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for AssetId {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<AssetId> for String {
    fn from(id: AssetId) -> Self {
        id.0
    }
}

impl AsRef<str> for AssetId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
