//! Dotted version numbers for TigerGraph servers.
//!
//! This module provides the [`Version`] type used to key the server-to-client
//! compatibility table.

use crate::error::ConfigError;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// A dotted, purely numeric version such as `3.6.0`.
///
/// Comparison is component-wise numeric, so `3.9.0 < 3.10.0`. Missing
/// trailing components compare as zero, which makes `3.6` and `3.6.0` equal.
/// The original spelling is kept for display.
///
/// # Example
///
/// ```rust
/// use tigergraph::Version;
///
/// let a: Version = "3.9.2".parse().unwrap();
/// let b: Version = "3.10.0".parse().unwrap();
/// assert!(a < b);
/// assert_eq!("3.6".parse::<Version>().unwrap(), "3.6.0".parse().unwrap());
/// assert_eq!(a.to_string(), "3.9.2");
/// ```
#[derive(Clone, Debug)]
pub struct Version {
    raw: String,
    components: Vec<u64>,
}

impl Version {
    /// Creates a version from its numeric components.
    #[must_use]
    pub fn from_components(components: &[u64]) -> Self {
        let raw = components
            .iter()
            .map(u64::to_string)
            .collect::<Vec<_>>()
            .join(".");
        Self {
            raw,
            components: components.to_vec(),
        }
    }

    /// Returns the numeric components as written.
    #[must_use]
    pub fn components(&self) -> &[u64] {
        &self.components
    }

    /// Components with trailing zeros removed; the canonical form used for
    /// equality, ordering and hashing.
    fn significant(&self) -> &[u64] {
        let len = self
            .components
            .iter()
            .rposition(|c| *c != 0)
            .map_or(0, |i| i + 1);
        &self.components[..len]
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.significant() == other.significant()
    }
}

impl Eq for Version {}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.significant().hash(state);
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        // Slice ordering is lexicographic over numbers, and trailing zeros
        // are already stripped, so [3, 6] < [3, 6, 1] as required.
        self.significant().cmp(other.significant())
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for Version {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        let invalid = || ConfigError::InvalidVersion {
            version: s.to_string(),
        };

        if raw.is_empty() {
            return Err(invalid());
        }

        let components = raw
            .split('.')
            .map(|part| {
                if part.is_empty() || !part.chars().all(|c| c.is_ascii_digit()) {
                    return Err(invalid());
                }
                part.parse::<u64>().map_err(|_| invalid())
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            raw: raw.to_string(),
            components,
        })
    }
}

impl Serialize for Version {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}
