//! Addressing keys for units.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Primary key of a unit identity.
///
/// The real runtime addresses a unit by one of three key kinds. Two keys of
/// different kinds are never equal, even when their textual forms coincide
/// (`Integer(42)` is distinct from `String("42")`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitKey {
    /// Integer-keyed unit.
    Integer(i64),

    /// GUID-keyed unit.
    Guid(Uuid),

    /// String-keyed unit.
    String(String),
}

impl fmt::Display for UnitKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitKey::Integer(n) => write!(f, "{}", n),
            UnitKey::Guid(g) => write!(f, "{}", g),
            UnitKey::String(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for UnitKey {
    fn from(n: i64) -> Self {
        UnitKey::Integer(n)
    }
}

impl From<Uuid> for UnitKey {
    fn from(g: Uuid) -> Self {
        UnitKey::Guid(g)
    }
}

impl From<&str> for UnitKey {
    fn from(s: &str) -> Self {
        UnitKey::String(s.to_string())
    }
}

impl From<String> for UnitKey {
    fn from(s: String) -> Self {
        UnitKey::String(s)
    }
}

/// Immutable addressing key for a unit.
///
/// An identity is a [`UnitKey`] optionally paired with a string extension
/// (compound key). Two identities are equal iff their key kind, primary key,
/// and extension all match. Identities never change after creation and are
/// used directly as map keys.
///
/// # String Format
///
/// `key` for plain identities, `key+extension` for compound ones.
///
/// # Validation
///
/// Construction never fails. Extension format (e.g. non-empty) is the
/// caller's responsibility; no normalization is applied.
///
/// # Example
///
/// ```rust,ignore
/// let plain = UnitIdentity::integer(42);
/// let compound = UnitIdentity::guid(Uuid::new_v4()).with_extension("ext");
/// assert!(compound.is_compound());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitIdentity {
    key: UnitKey,
    extension: Option<String>,
}

impl UnitIdentity {
    /// Create an integer-keyed identity.
    pub fn integer(key: i64) -> Self {
        Self {
            key: UnitKey::Integer(key),
            extension: None,
        }
    }

    /// Create a GUID-keyed identity.
    pub fn guid(key: Uuid) -> Self {
        Self {
            key: UnitKey::Guid(key),
            extension: None,
        }
    }

    /// Create a string-keyed identity.
    pub fn string(key: impl Into<String>) -> Self {
        Self {
            key: UnitKey::String(key.into()),
            extension: None,
        }
    }

    /// Attach a key extension, turning this into a compound identity.
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = Some(extension.into());
        self
    }

    /// Get the primary key.
    pub fn key(&self) -> &UnitKey {
        &self.key
    }

    /// Get the key extension, if this is a compound identity.
    pub fn extension(&self) -> Option<&str> {
        self.extension.as_deref()
    }

    /// Check whether this identity carries a key extension.
    pub fn is_compound(&self) -> bool {
        self.extension.is_some()
    }

    /// Get the integer primary key, if this identity is integer-keyed.
    pub fn integer_key(&self) -> Option<i64> {
        match self.key {
            UnitKey::Integer(n) => Some(n),
            _ => None,
        }
    }

    /// Get the GUID primary key, if this identity is GUID-keyed.
    pub fn guid_key(&self) -> Option<Uuid> {
        match self.key {
            UnitKey::Guid(g) => Some(g),
            _ => None,
        }
    }

    /// Get the string primary key, if this identity is string-keyed.
    pub fn string_key(&self) -> Option<&str> {
        match &self.key {
            UnitKey::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for UnitIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.extension {
            Some(ext) => write!(f, "{}+{}", self.key, ext),
            None => write!(f, "{}", self.key),
        }
    }
}

impl From<UnitKey> for UnitIdentity {
    fn from(key: UnitKey) -> Self {
        Self {
            key,
            extension: None,
        }
    }
}

impl From<i64> for UnitIdentity {
    fn from(key: i64) -> Self {
        UnitIdentity::integer(key)
    }
}

impl From<Uuid> for UnitIdentity {
    fn from(key: Uuid) -> Self {
        UnitIdentity::guid(key)
    }
}

impl From<&str> for UnitIdentity {
    fn from(key: &str) -> Self {
        UnitIdentity::string(key)
    }
}

impl From<String> for UnitIdentity {
    fn from(key: String) -> Self {
        UnitIdentity::string(key)
    }
}
