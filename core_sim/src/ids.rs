use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier for a faction taking part in diplomacy.
///
/// An empty identifier is never a valid party; it marks an unclaimed province or a
/// report entry the pipeline could not attribute.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FactionId(pub String);

impl FactionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for FactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Borrow<str> for FactionId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for FactionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for FactionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Identifier for a province on the map.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProvinceId(pub String);

impl ProvinceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProvinceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Borrow<str> for ProvinceId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ProvinceId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ProvinceId {
    fn from(value: String) -> Self {
        Self(value)
    }
}
