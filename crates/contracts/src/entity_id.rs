//! EntityId - Cheap-to-clone catalog entity identifier
//!
//! Uses Arc<str> internally for O(1) clone operations.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::borrow::Borrow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::Arc;

use crate::ContractError;

/// Catalog entity identifier with cheap cloning.
///
/// Always holds a non-blank string. Numeric ids from the catalog are kept in
/// their decimal form so `5` and `"5"` produce the same key.
///
/// # Examples
/// ```
/// use contracts::EntityId;
///
/// let id = EntityId::parse("42").unwrap();
/// let id2 = id.clone();  // O(1) - just increments ref count
/// assert_eq!(id, id2);
/// assert_eq!(id.as_str(), "42");
/// ```
#[derive(Clone)]
pub struct EntityId(Arc<str>);

impl EntityId {
    /// Validate and wrap a textual id
    pub fn parse(s: &str) -> Result<Self, ContractError> {
        if s.trim().is_empty() {
            return Err(ContractError::validation("id", "entity id cannot be blank"));
        }
        Ok(Self(Arc::from(s)))
    }

    /// Extract an id from a JSON value: a string or an integer
    pub fn from_json(value: &Value) -> Result<Self, ContractError> {
        match value {
            Value::String(s) => Self::parse(s),
            Value::Number(n) if n.is_i64() || n.is_u64() => Ok(Self(Arc::from(n.to_string()))),
            other => Err(ContractError::validation(
                "id",
                format!("entity id must be a string or an integer, got {other}"),
            )),
        }
    }

    /// Get the underlying string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Deref to &str for easy string operations
impl Deref for EntityId {
    type Target = str;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for EntityId {
    #[inline]
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for EntityId {
    #[inline]
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<u64> for EntityId {
    #[inline]
    fn from(id: u64) -> Self {
        Self(Arc::from(id.to_string()))
    }
}

impl From<i64> for EntityId {
    #[inline]
    fn from(id: i64) -> Self {
        Self(Arc::from(id.to_string()))
    }
}

impl TryFrom<&str> for EntityId {
    type Error = ContractError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

impl TryFrom<String> for EntityId {
    type Error = ContractError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({:?})", self.0)
    }
}

impl PartialEq for EntityId {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        // Fast path: same Arc pointer
        Arc::ptr_eq(&self.0, &other.0) || self.0 == other.0
    }
}

impl Eq for EntityId {}

impl PartialEq<str> for EntityId {
    #[inline]
    fn eq(&self, other: &str) -> bool {
        self.0.as_ref() == other
    }
}

impl PartialEq<&str> for EntityId {
    #[inline]
    fn eq(&self, other: &&str) -> bool {
        self.0.as_ref() == *other
    }
}

// Hash - same as str hash for HashMap compatibility
impl Hash for EntityId {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state)
    }
}

impl Serialize for EntityId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Self::from_json(&value).map_err(serde::de::Error::custom)
    }
}
