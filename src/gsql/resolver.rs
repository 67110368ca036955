//! Server-to-client version resolution.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Bound;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::{CacheConfig, Version};
use crate::error::ConfigError;
use crate::gsql::errors::ResolutionError;

/// Server releases with a matching `gsql_client` artifact.
const KNOWN_CLIENT_RELEASES: &[&str] = &[
    "2.4.0", "2.4.1", "2.5.0", "2.5.1", "2.5.2", "2.5.3", "2.6.0", "2.6.1", "2.6.2", "2.6.3",
    "3.0.0", "3.0.5", "3.1.0", "3.1.1", "3.1.2", "3.1.3", "3.1.4", "3.1.5", "3.1.6", "3.2.0",
    "3.2.1", "3.2.2", "3.2.3", "3.2.4", "3.3.0", "3.4.0", "3.5.0", "3.5.1", "3.5.2", "3.5.3",
    "3.6.0", "3.6.1", "3.6.2", "3.6.3", "3.7.0", "3.8.0", "3.9.0", "3.9.1", "3.9.2", "3.9.3",
    "3.10.0",
];

/// Identifier of one `gsql_client` build.
///
/// Kept as the exact text it was created from, since an explicit override is
/// passed through verbatim.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClientVersion(String);

impl ClientVersion {
    /// Creates a client version from non-blank text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidVersion`] if `version` is blank.
    pub fn new(version: impl Into<String>) -> Result<Self, ConfigError> {
        let version = version.into();
        if version.trim().is_empty() {
            return Err(ConfigError::InvalidVersion { version });
        }
        Ok(Self(version))
    }

    /// Returns the version text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Value of the `GSQL_CLIENT_VERSION` system property, e.g. `v3_6_0`.
    #[must_use]
    pub fn gsql_client_property(&self) -> String {
        let version = self.0.trim();
        let version = version.strip_prefix('v').unwrap_or(version);
        format!("v{}", version.replace('.', "_"))
    }
}

impl From<&Version> for ClientVersion {
    fn from(version: &Version) -> Self {
        Self(version.to_string())
    }
}

impl FromStr for ClientVersion {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for ClientVersion {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ClientVersion> for String {
    fn from(version: ClientVersion) -> Self {
        version.0
    }
}

impl AsRef<str> for ClientVersion {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Maps a server version to the `gsql_client` build that talks to it.
///
/// Lookup order:
///
/// 1. A non-blank explicit override, returned as given
/// 2. An exact entry of the version table
/// 3. The greatest table entry below the server version
///
/// Versions are compared numerically per component, so `3.9.2` resolves to
/// the `3.9.0` entry rather than `3.10.0`.
///
/// # Example
///
/// ```rust
/// use std::collections::BTreeMap;
/// use tigergraph::{ClientVersion, ClientVersionResolver, Version};
///
/// let mut table = BTreeMap::new();
/// table.insert("3.8.0".parse::<Version>().unwrap(), ClientVersion::new("A").unwrap());
/// table.insert("3.9.0".parse::<Version>().unwrap(), ClientVersion::new("B").unwrap());
/// table.insert("3.10.0".parse::<Version>().unwrap(), ClientVersion::new("C").unwrap());
///
/// let resolver = ClientVersionResolver::new(table);
/// let server: Version = "3.9.2".parse().unwrap();
/// assert_eq!(resolver.resolve(&server, None).unwrap().as_str(), "B");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientVersionResolver {
    table: BTreeMap<Version, ClientVersion>,
}

impl ClientVersionResolver {
    /// Creates a resolver over the given table.
    #[must_use]
    pub const fn new(table: BTreeMap<Version, ClientVersion>) -> Self {
        Self { table }
    }

    /// Uses the cache configuration's table override, or the built-in table.
    #[must_use]
    pub fn from_cache_config(cache: &CacheConfig) -> Self {
        cache
            .version_map_override()
            .map_or_else(Self::default, |table| Self::new(table.clone()))
    }

    /// Returns the version table.
    #[must_use]
    pub const fn table(&self) -> &BTreeMap<Version, ClientVersion> {
        &self.table
    }

    /// Returns the explicit override when it is non-blank.
    #[must_use]
    pub fn pinned(explicit_override: Option<&str>) -> Option<ClientVersion> {
        explicit_override
            .filter(|v| !v.trim().is_empty())
            .map(|v| ClientVersion(v.to_string()))
    }

    /// Resolves the client version for `server_version`.
    ///
    /// # Errors
    ///
    /// Returns [`ResolutionError`] when no override is given and the server
    /// is older than every table entry.
    pub fn resolve(
        &self,
        server_version: &Version,
        explicit_override: Option<&str>,
    ) -> Result<ClientVersion, ResolutionError> {
        if let Some(pinned) = Self::pinned(explicit_override) {
            tracing::debug!("Using pinned GSQL client version {}", pinned);
            return Ok(pinned);
        }

        if let Some(client) = self.table.get(server_version) {
            tracing::debug!(
                "GSQL client {} matches server version {}",
                client,
                server_version
            );
            return Ok(client.clone());
        }

        let below = self
            .table
            .range((Bound::Unbounded, Bound::Excluded(server_version)))
            .next_back();
        if let Some((known, client)) = below {
            tracing::warn!(
                "No GSQL client is listed for server version {}; falling back to {} (listed for {})",
                server_version,
                client,
                known
            );
            return Ok(client.clone());
        }

        match self.table.keys().next() {
            Some(oldest) => Err(ResolutionError::ServerTooOld {
                server_version: server_version.clone(),
                oldest: oldest.clone(),
            }),
            None => Err(ResolutionError::EmptyTable {
                server_version: server_version.clone(),
            }),
        }
    }
}

impl Default for ClientVersionResolver {
    /// Built-in table: every published client serves its own server release.
    fn default() -> Self {
        let table = KNOWN_CLIENT_RELEASES
            .iter()
            .filter_map(|release| release.parse::<Version>().ok())
            .map(|version| {
                let client = ClientVersion::from(&version);
                (version, client)
            })
            .collect();
        Self::new(table)
    }
}
