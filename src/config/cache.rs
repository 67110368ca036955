//! Filesystem locations and overrides for the GSQL client bridge.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use directories::BaseDirs;

use crate::config::Version;
use crate::gsql::{ClientLauncher, ClientVersion};

/// Base URL the `gsql_client` artifacts are published under.
///
/// Artifacts live at `<base>/<version>/gsql_client-<version>.jar`.
pub const DEFAULT_DOWNLOAD_BASE_URL: &str =
    "https://repo1.maven.org/maven2/com/tigergraph/client/gsql_client";

/// File name of the certificate exported when none is supplied.
pub const DEFAULT_CERT_FILE_NAME: &str = "my-cert.txt";

/// Where client binaries and certificates are kept, and how they are obtained.
///
/// Passed explicitly into the resolver, cache and provisioner so tests can
/// point everything at a temporary directory.
///
/// # Example
///
/// ```rust
/// use tigergraph::{CacheConfig, ClientLauncher};
///
/// let cache = CacheConfig::new("/tmp/gsql")
///     .download_base_url("http://127.0.0.1:8081/artifacts")
///     .launcher(ClientLauncher::Direct);
///
/// assert_eq!(cache.client_dir().to_str(), Some("/tmp/gsql"));
/// assert_eq!(cache.cert_dir_path().to_str(), Some("/tmp/gsql"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheConfig {
    client_dir: PathBuf,
    cert_dir: PathBuf,
    download_base_url: String,
    version_map: Option<BTreeMap<Version, ClientVersion>>,
    launcher: ClientLauncher,
}

impl CacheConfig {
    /// Uses `dir` for both client binaries and certificates.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            client_dir: dir.clone(),
            cert_dir: dir,
            download_base_url: DEFAULT_DOWNLOAD_BASE_URL.to_string(),
            version_map: None,
            launcher: ClientLauncher::default(),
        }
    }

    /// Sets a separate certificate directory.
    #[must_use]
    pub fn cert_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cert_dir = dir.into();
        self
    }

    /// Sets the artifact download base URL.
    #[must_use]
    pub fn download_base_url(mut self, url: impl Into<String>) -> Self {
        self.download_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Replaces the built-in server-to-client version table.
    #[must_use]
    pub fn version_map(mut self, map: BTreeMap<Version, ClientVersion>) -> Self {
        self.version_map = Some(map);
        self
    }

    /// Sets how the client binary is launched.
    #[must_use]
    pub fn launcher(mut self, launcher: ClientLauncher) -> Self {
        self.launcher = launcher;
        self
    }

    /// Directory holding `gsql_client-<version>.jar` files.
    #[must_use]
    pub fn client_dir(&self) -> &Path {
        &self.client_dir
    }

    /// Directory holding exported certificates.
    #[must_use]
    pub fn cert_dir_path(&self) -> &Path {
        &self.cert_dir
    }

    /// Returns the artifact download base URL.
    #[must_use]
    pub fn download_base(&self) -> &str {
        &self.download_base_url
    }

    /// Returns the version table override, if any.
    #[must_use]
    pub const fn version_map_override(&self) -> Option<&BTreeMap<Version, ClientVersion>> {
        self.version_map.as_ref()
    }

    /// Returns the configured launcher.
    #[must_use]
    pub const fn client_launcher(&self) -> &ClientLauncher {
        &self.launcher
    }

    /// Default certificate location inside the certificate directory.
    #[must_use]
    pub fn default_cert_path(&self) -> PathBuf {
        self.cert_dir.join(DEFAULT_CERT_FILE_NAME)
    }
}

impl Default for CacheConfig {
    /// `.gsql` in the user's home directory, or in the system temporary
    /// directory when the platform reports no home directory.
    fn default() -> Self {
        let base = BaseDirs::new().map_or_else(
            || {
                let fallback = std::env::temp_dir();
                tracing::warn!(
                    "No home directory found; caching GSQL clients under {}",
                    fallback.display()
                );
                fallback
            },
            |dirs| dirs.home_dir().to_path_buf(),
        );
        Self::new(base.join(".gsql"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_uses_one_directory_for_everything() {
        let cache = CacheConfig::new("/var/cache/gsql");
        assert_eq!(cache.client_dir(), Path::new("/var/cache/gsql"));
        assert_eq!(cache.cert_dir_path(), Path::new("/var/cache/gsql"));
        assert_eq!(
            cache.default_cert_path(),
            Path::new("/var/cache/gsql/my-cert.txt")
        );
        assert_eq!(cache.download_base(), DEFAULT_DOWNLOAD_BASE_URL);
        assert!(cache.version_map_override().is_none());
    }

    #[test]
    fn test_download_base_url_drops_trailing_slash() {
        let cache = CacheConfig::new("/tmp").download_base_url("http://mirror/jars/");
        assert_eq!(cache.download_base(), "http://mirror/jars");
    }

    #[test]
    fn test_default_lives_under_dot_gsql() {
        let cache = CacheConfig::default();
        assert!(cache.client_dir().ends_with(".gsql"));
    }

    #[test]
    fn test_default_uses_platform_home_directory() {
        let Some(dirs) = BaseDirs::new() else {
            return;
        };
        let cache = CacheConfig::default();
        assert_eq!(cache.client_dir(), dirs.home_dir().join(".gsql"));
        assert_eq!(
            cache.default_cert_path(),
            dirs.home_dir().join(".gsql").join("my-cert.txt")
        );
    }
}
