//! Validated newtype wrappers for configuration values.
//!
//! This module provides type-safe wrappers around string values that validate
//! their contents on construction. Invalid values are rejected with clear error messages.

use crate::error::ConfigError;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A validated TigerGraph host URL.
///
/// Only `http` and `https` schemes are accepted. Any path, query or port in
/// the input is discarded: ports are configured separately because TigerGraph
/// exposes REST++ and the GSQL server on different ones.
///
/// # Example
///
/// ```rust
/// use tigergraph::HostUrl;
///
/// let url = HostUrl::new("https://my-box.i.tgcloud.io:9000/").unwrap();
/// assert_eq!(url.scheme(), "https");
/// assert_eq!(url.host_name(), "my-box.i.tgcloud.io");
/// assert_eq!(url.with_port(14240), "https://my-box.i.tgcloud.io:14240");
/// assert!(url.is_secure());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HostUrl {
    url: String,
    scheme_end: usize,
}

impl HostUrl {
    /// Creates a new validated host URL.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidHostUrl`] if the scheme is missing or not
    /// `http`/`https`, or the host is empty.
    pub fn new(url: impl Into<String>) -> Result<Self, ConfigError> {
        let input = url.into();
        let trimmed = input.trim();
        let invalid = || ConfigError::InvalidHostUrl { url: input.clone() };

        let scheme_end = trimmed.find("://").ok_or_else(invalid)?;
        let scheme = trimmed[..scheme_end].to_lowercase();
        if scheme != "http" && scheme != "https" {
            return Err(invalid());
        }

        // Host ends at port, path, query, or end of string
        let remainder = &trimmed[scheme_end + 3..];
        let host_end = remainder.find([':', '/', '?', '#']).unwrap_or(remainder.len());
        let host = &remainder[..host_end];
        if host.is_empty() || host.contains(char::is_whitespace) {
            return Err(invalid());
        }

        Ok(Self {
            url: format!("{scheme}://{host}"),
            scheme_end: scheme.len(),
        })
    }

    /// Returns the URL scheme (`http` or `https`).
    #[must_use]
    pub fn scheme(&self) -> &str {
        &self.url[..self.scheme_end]
    }

    /// Returns the bare host name.
    #[must_use]
    pub fn host_name(&self) -> &str {
        &self.url[self.scheme_end + 3..]
    }

    /// Returns `true` for `https` hosts.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.scheme() == "https"
    }

    /// Returns `scheme://host:port`.
    #[must_use]
    pub fn with_port(&self, port: u16) -> String {
        format!("{}:{port}", self.url)
    }
}

impl AsRef<str> for HostUrl {
    fn as_ref(&self) -> &str {
        &self.url
    }
}

impl Serialize for HostUrl {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.url)
    }
}

impl<'de> Deserialize<'de> for HostUrl {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(de::Error::custom)
    }
}

/// A validated graph name.
///
/// `GLOBAL` (in any case) names the global scope rather than a graph.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GraphName(String);

impl GraphName {
    /// Creates a new validated graph name.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyGraphName`] if the name is blank.
    pub fn new(name: impl Into<String>) -> Result<Self, ConfigError> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(ConfigError::EmptyGraphName);
        }
        Ok(Self(name))
    }

    /// Returns `true` if this names the global scope.
    #[must_use]
    pub fn is_global(&self) -> bool {
        self.0.eq_ignore_ascii_case("global")
    }
}

impl AsRef<str> for GraphName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GraphName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A database password.
///
/// # Security
///
/// The `Debug` implementation masks the value, displaying only
/// `Password(*****)`.
///
/// ```rust
/// use tigergraph::Password;
///
/// let password = Password::new("tigergraph");
/// assert_eq!(format!("{:?}", password), "Password(*****)");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Password(String);

impl Password {
    /// Wraps a password. Empty passwords are allowed.
    #[must_use]
    pub fn new(password: impl Into<String>) -> Self {
        Self(password.into())
    }
}

impl AsRef<str> for Password {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(*****)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_url_accepts_http_and_https() {
        let url = HostUrl::new("http://127.0.0.1").unwrap();
        assert_eq!(url.scheme(), "http");
        assert_eq!(url.host_name(), "127.0.0.1");
        assert!(!url.is_secure());

        let url = HostUrl::new("HTTPS://Box.example.com").unwrap();
        assert_eq!(url.scheme(), "https");
        assert!(url.is_secure());
    }

    #[test]
    fn test_host_url_strips_port_and_path() {
        let url = HostUrl::new("https://box.example.com:9000/restpp?x=1").unwrap();
        assert_eq!(url.as_ref(), "https://box.example.com");
        assert_eq!(url.with_port(14240), "https://box.example.com:14240");
    }

    #[test]
    fn test_host_url_rejects_invalid() {
        assert!(HostUrl::new("box.example.com").is_err());
        assert!(HostUrl::new("https://").is_err());
        assert!(HostUrl::new("ftp://box.example.com").is_err());
        assert!(HostUrl::new("https://:9000").is_err());
    }

    #[test]
    fn test_graph_name_detects_global() {
        assert!(GraphName::new("GLOBAL").unwrap().is_global());
        assert!(GraphName::new("global").unwrap().is_global());
        assert!(!GraphName::new("Social").unwrap().is_global());
        assert!(matches!(GraphName::new("  "), Err(ConfigError::EmptyGraphName)));
    }

    #[test]
    fn test_password_masks_value_in_debug() {
        let password = Password::new("super-secret");
        let debug_output = format!("{password:?}");
        assert_eq!(debug_output, "Password(*****)");
        assert!(!debug_output.contains("super-secret"));
    }

    #[test]
    fn test_host_url_serde_round_trip() {
        let url = HostUrl::new("https://box.example.com").unwrap();
        let json = serde_json::to_string(&url).unwrap();
        assert_eq!(json, r#""https://box.example.com""#);
        let restored: HostUrl = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, url);
    }
}
