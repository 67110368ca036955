//! Configuration types for the TigerGraph client.
//!
//! # Overview
//!
//! The main types in this module are:
//!
//! - [`TigerGraphConfig`]: Connection settings shared by the REST and GSQL sides
//! - [`TigerGraphConfigBuilder`]: A builder for constructing [`TigerGraphConfig`] instances
//! - [`CacheConfig`]: Where client binaries and certificates live
//! - [`HostUrl`], [`GraphName`], [`Password`]: Validated newtypes
//! - [`Version`]: Numeric dotted version used for client resolution
//!
//! # Example
//!
//! ```rust
//! use tigergraph::{TigerGraphConfig, HostUrl, GraphName};
//!
//! let config = TigerGraphConfig::builder()
//!     .host(HostUrl::new("https://my-box.i.tgcloud.io").unwrap())
//!     .graph_name(GraphName::new("Social").unwrap())
//!     .username("tigergraph")
//!     .password("secret")
//!     .build()
//!     .unwrap();
//!
//! assert!(config.use_cert());
//! assert_eq!(config.gs_url(), "https://my-box.i.tgcloud.io:14240");
//! ```

mod cache;
mod newtypes;
mod version;

pub use cache::{CacheConfig, DEFAULT_CERT_FILE_NAME, DEFAULT_DOWNLOAD_BASE_URL};
pub use newtypes::{GraphName, HostUrl, Password};
pub use version::Version;

use std::path::{Path, PathBuf};

use crate::auth::Credentials;
use crate::error::ConfigError;

/// Default REST++ port.
pub const DEFAULT_RESTPP_PORT: u16 = 9000;
/// Default GSQL server port.
pub const DEFAULT_GS_PORT: u16 = 14240;
/// Default port used to fetch the server certificate.
pub const DEFAULT_SSL_PORT: u16 = 443;

/// Connection settings for one TigerGraph server.
///
/// # Thread Safety
///
/// `TigerGraphConfig` is `Clone`, `Send`, and `Sync`.
#[derive(Clone, Debug)]
pub struct TigerGraphConfig {
    host: HostUrl,
    graph_name: GraphName,
    username: String,
    password: Password,
    api_token: Option<String>,
    restpp_port: u16,
    gs_port: u16,
    ssl_port: u16,
    gsql_version: Option<String>,
    use_cert: bool,
    cert_path: Option<PathBuf>,
    cache: CacheConfig,
    user_agent_prefix: Option<String>,
    tries: u32,
}

impl TigerGraphConfig {
    /// Creates a new builder for constructing a `TigerGraphConfig`.
    #[must_use]
    pub fn builder() -> TigerGraphConfigBuilder {
        TigerGraphConfigBuilder::new()
    }

    /// Returns the host URL.
    #[must_use]
    pub const fn host(&self) -> &HostUrl {
        &self.host
    }

    /// Returns the default graph.
    #[must_use]
    pub const fn graph_name(&self) -> &GraphName {
        &self.graph_name
    }

    /// Returns the user name.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Returns the password.
    #[must_use]
    pub const fn password(&self) -> &Password {
        &self.password
    }

    /// Returns the REST++ API token, if configured.
    #[must_use]
    pub fn api_token(&self) -> Option<&str> {
        self.api_token.as_deref()
    }

    /// Returns the REST++ port.
    #[must_use]
    pub const fn restpp_port(&self) -> u16 {
        self.restpp_port
    }

    /// Returns the GSQL server port.
    #[must_use]
    pub const fn gs_port(&self) -> u16 {
        self.gs_port
    }

    /// Returns the port used for certificate export.
    #[must_use]
    pub const fn ssl_port(&self) -> u16 {
        self.ssl_port
    }

    /// Returns the explicit GSQL client version, if configured.
    #[must_use]
    pub fn gsql_version(&self) -> Option<&str> {
        self.gsql_version.as_deref()
    }

    /// Returns whether the GSQL client connects over TLS with a certificate.
    #[must_use]
    pub const fn use_cert(&self) -> bool {
        self.use_cert
    }

    /// Returns the caller-supplied certificate path, if any.
    #[must_use]
    pub fn cert_path(&self) -> Option<&Path> {
        self.cert_path.as_deref()
    }

    /// Returns the cache configuration.
    #[must_use]
    pub const fn cache(&self) -> &CacheConfig {
        &self.cache
    }

    /// Returns the user agent prefix, if configured.
    #[must_use]
    pub fn user_agent_prefix(&self) -> Option<&str> {
        self.user_agent_prefix.as_deref()
    }

    /// Returns the number of attempts for REST requests.
    #[must_use]
    pub const fn tries(&self) -> u32 {
        self.tries
    }

    /// `scheme://host:restpp_port`.
    #[must_use]
    pub fn restpp_url(&self) -> String {
        self.host.with_port(self.restpp_port)
    }

    /// `scheme://host:gs_port`.
    #[must_use]
    pub fn gs_url(&self) -> String {
        self.host.with_port(self.gs_port)
    }

    /// Credentials for REST++ calls: the API token when set, otherwise basic auth.
    #[must_use]
    pub fn restpp_credentials(&self) -> Credentials {
        self.api_token.as_ref().map_or_else(
            || self.password_credentials(),
            |token| Credentials::Token(token.clone()),
        )
    }

    /// Username/password credentials, always required by the GSQL server.
    #[must_use]
    pub fn password_credentials(&self) -> Credentials {
        Credentials::Basic {
            username: self.username.clone(),
            password: self.password.clone(),
        }
    }

    /// A copy whose HTTP clients trust `cert_path` instead of the
    /// configured certificate.
    pub(crate) fn trusting(&self, cert_path: Option<&Path>) -> Self {
        Self {
            cert_path: cert_path.map(Path::to_path_buf).or_else(|| self.cert_path.clone()),
            ..self.clone()
        }
    }
}

// Verify TigerGraphConfig is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<TigerGraphConfig>();
};

/// Builder for constructing [`TigerGraphConfig`] instances.
///
/// `host` is required. All other fields have defaults.
///
/// # Defaults
///
/// - `graph_name`: `MyGraph`
/// - `username` / `password`: `tigergraph`
/// - ports: REST++ 9000, GSQL 14240, certificate export 443
/// - `use_cert`: `true` for `https` hosts; always `false` for `http` hosts
/// - `cache`: [`CacheConfig::default`]
/// - `tries`: 1
#[derive(Debug, Default)]
pub struct TigerGraphConfigBuilder {
    host: Option<HostUrl>,
    graph_name: Option<GraphName>,
    username: Option<String>,
    password: Option<Password>,
    api_token: Option<String>,
    restpp_port: Option<u16>,
    gs_port: Option<u16>,
    ssl_port: Option<u16>,
    gsql_version: Option<String>,
    use_cert: Option<bool>,
    cert_path: Option<PathBuf>,
    cache: Option<CacheConfig>,
    user_agent_prefix: Option<String>,
    tries: Option<u32>,
}

impl TigerGraphConfigBuilder {
    /// Creates a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the host URL (required).
    #[must_use]
    pub fn host(mut self, host: HostUrl) -> Self {
        self.host = Some(host);
        self
    }

    /// Sets the default graph.
    #[must_use]
    pub fn graph_name(mut self, graph_name: GraphName) -> Self {
        self.graph_name = Some(graph_name);
        self
    }

    /// Sets the user name.
    #[must_use]
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Sets the password.
    #[must_use]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(Password::new(password));
        self
    }

    /// Sets a REST++ API token.
    #[must_use]
    pub fn api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    /// Sets the REST++ port.
    #[must_use]
    pub const fn restpp_port(mut self, port: u16) -> Self {
        self.restpp_port = Some(port);
        self
    }

    /// Sets the GSQL server port.
    #[must_use]
    pub const fn gs_port(mut self, port: u16) -> Self {
        self.gs_port = Some(port);
        self
    }

    /// Sets the port used to export the server certificate.
    #[must_use]
    pub const fn ssl_port(mut self, port: u16) -> Self {
        self.ssl_port = Some(port);
        self
    }

    /// Pins the GSQL client version, bypassing server version lookup.
    #[must_use]
    pub fn gsql_version(mut self, version: impl Into<String>) -> Self {
        self.gsql_version = Some(version.into());
        self
    }

    /// Sets whether a certificate is used. Ignored for `http` hosts.
    #[must_use]
    pub const fn use_cert(mut self, use_cert: bool) -> Self {
        self.use_cert = Some(use_cert);
        self
    }

    /// Supplies an existing CA certificate.
    #[must_use]
    pub fn cert_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.cert_path = Some(path.into());
        self
    }

    /// Sets the cache configuration.
    #[must_use]
    pub fn cache(mut self, cache: CacheConfig) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Sets the user agent prefix for HTTP requests.
    #[must_use]
    pub fn user_agent_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.user_agent_prefix = Some(prefix.into());
        self
    }

    /// Sets the number of attempts for REST requests (minimum 1).
    #[must_use]
    pub const fn tries(mut self, tries: u32) -> Self {
        self.tries = Some(tries);
        self
    }

    /// Builds the [`TigerGraphConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingRequiredField`] if `host` is not set, and
    /// [`ConfigError::EmptyUsername`] for a blank user name.
    pub fn build(self) -> Result<TigerGraphConfig, ConfigError> {
        let host = self
            .host
            .ok_or(ConfigError::MissingRequiredField { field: "host" })?;

        let username = self.username.unwrap_or_else(|| "tigergraph".to_string());
        if username.trim().is_empty() {
            return Err(ConfigError::EmptyUsername);
        }

        let graph_name = match self.graph_name {
            Some(name) => name,
            None => GraphName::new("MyGraph")?,
        };

        // Plain http never carries a certificate
        let use_cert = host.is_secure() && self.use_cert.unwrap_or(true);

        Ok(TigerGraphConfig {
            host,
            graph_name,
            username,
            password: self.password.unwrap_or_else(|| Password::new("tigergraph")),
            api_token: self.api_token.filter(|t| !t.is_empty()),
            restpp_port: self.restpp_port.unwrap_or(DEFAULT_RESTPP_PORT),
            gs_port: self.gs_port.unwrap_or(DEFAULT_GS_PORT),
            ssl_port: self.ssl_port.unwrap_or(DEFAULT_SSL_PORT),
            gsql_version: self.gsql_version.filter(|v| !v.trim().is_empty()),
            use_cert,
            cert_path: self.cert_path,
            cache: self.cache.unwrap_or_default(),
            user_agent_prefix: self.user_agent_prefix,
            tries: self.tries.unwrap_or(1).max(1),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host(url: &str) -> HostUrl {
        HostUrl::new(url).unwrap()
    }

    #[test]
    fn test_builder_requires_host() {
        let result = TigerGraphConfigBuilder::new().build();
        assert!(matches!(
            result,
            Err(ConfigError::MissingRequiredField { field: "host" })
        ));
    }

    #[test]
    fn test_builder_provides_sensible_defaults() {
        let config = TigerGraphConfig::builder()
            .host(host("http://127.0.0.1"))
            .build()
            .unwrap();

        assert_eq!(config.graph_name().as_ref(), "MyGraph");
        assert_eq!(config.username(), "tigergraph");
        assert_eq!(config.password().as_ref(), "tigergraph");
        assert_eq!(config.restpp_port(), 9000);
        assert_eq!(config.gs_port(), 14240);
        assert_eq!(config.ssl_port(), 443);
        assert_eq!(config.tries(), 1);
        assert!(config.gsql_version().is_none());
        assert!(config.api_token().is_none());
        assert!(config.cert_path().is_none());
    }

    #[test]
    fn test_http_host_never_uses_cert() {
        let config = TigerGraphConfig::builder()
            .host(host("http://127.0.0.1"))
            .use_cert(true)
            .build()
            .unwrap();
        assert!(!config.use_cert());
    }

    #[test]
    fn test_https_host_uses_cert_unless_disabled() {
        let config = TigerGraphConfig::builder()
            .host(host("https://box.example.com"))
            .build()
            .unwrap();
        assert!(config.use_cert());

        let config = TigerGraphConfig::builder()
            .host(host("https://box.example.com"))
            .use_cert(false)
            .build()
            .unwrap();
        assert!(!config.use_cert());
    }

    #[test]
    fn test_urls_combine_host_and_ports() {
        let config = TigerGraphConfig::builder()
            .host(host("https://box.example.com"))
            .restpp_port(9443)
            .gs_port(443)
            .build()
            .unwrap();
        assert_eq!(config.restpp_url(), "https://box.example.com:9443");
        assert_eq!(config.gs_url(), "https://box.example.com:443");
    }

    #[test]
    fn test_blank_values_are_treated_as_unset() {
        let config = TigerGraphConfig::builder()
            .host(host("http://127.0.0.1"))
            .gsql_version("  ")
            .api_token("")
            .tries(0)
            .build()
            .unwrap();
        assert!(config.gsql_version().is_none());
        assert!(config.api_token().is_none());
        assert_eq!(config.tries(), 1);
    }

    #[test]
    fn test_blank_username_is_rejected() {
        let result = TigerGraphConfig::builder()
            .host(host("http://127.0.0.1"))
            .username(" ")
            .build();
        assert!(matches!(result, Err(ConfigError::EmptyUsername)));
    }

    #[test]
    fn test_restpp_credentials_prefer_token() {
        let config = TigerGraphConfig::builder()
            .host(host("http://127.0.0.1"))
            .api_token("tok")
            .build()
            .unwrap();
        assert_eq!(config.restpp_credentials(), Credentials::Token("tok".to_string()));
        assert!(matches!(
            config.password_credentials(),
            Credentials::Basic { .. }
        ));
    }

    #[test]
    fn test_trusting_replaces_only_the_certificate() {
        let config = TigerGraphConfig::builder()
            .host(host("https://box.example.com"))
            .cert_path("/etc/ca.pem")
            .restpp_port(9443)
            .build()
            .unwrap();

        let exported = config.trusting(Some(Path::new("/home/u/.gsql/my-cert.txt")));
        assert_eq!(exported.cert_path(), Some(Path::new("/home/u/.gsql/my-cert.txt")));
        assert_eq!(exported.restpp_url(), "https://box.example.com:9443");

        let unchanged = config.trusting(None);
        assert_eq!(unchanged.cert_path(), Some(Path::new("/etc/ca.pem")));
    }

    #[test]
    fn test_config_debug_hides_password() {
        let config = TigerGraphConfig::builder()
            .host(host("http://127.0.0.1"))
            .password("hunter2")
            .build()
            .unwrap();
        let debug_str = format!("{config:?}");
        assert!(debug_str.contains("TigerGraphConfig"));
        assert!(!debug_str.contains("hunter2"));
    }
}
