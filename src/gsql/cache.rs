//! Download-once cache of `gsql_client` artifacts.

use std::path::{Path, PathBuf};

use crate::config::CacheConfig;
use crate::gsql::errors::DownloadError;
use crate::gsql::resolver::ClientVersion;

/// A client artifact present on the local filesystem.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CachedBinary {
    version: ClientVersion,
    path: PathBuf,
}

impl CachedBinary {
    /// Returns the client version.
    #[must_use]
    pub const fn version(&self) -> &ClientVersion {
        &self.version
    }

    /// Returns the artifact location.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Keeps one `gsql_client-<version>.jar` per client version.
///
/// A present, non-empty artifact is always reused without network access.
/// Missing artifacts are fetched from
/// `<base>/<version>/gsql_client-<version>.jar` into a `.part` file that is
/// renamed into place only once complete. Cached artifacts are never
/// re-validated.
///
/// # Example
///
/// ```rust,ignore
/// use tigergraph::{CacheConfig, ClientBinaryCache, ClientVersion};
///
/// let cache = ClientBinaryCache::new(&CacheConfig::new("/tmp/gsql"))?;
/// let binary = cache.obtain(&ClientVersion::new("3.6.0")?).await?;
/// println!("{}", binary.path().display());
/// ```
#[derive(Clone, Debug)]
pub struct ClientBinaryCache {
    client: reqwest::Client,
    dir: PathBuf,
    base_url: String,
}

impl ClientBinaryCache {
    /// Creates a cache for the configured directory and download base URL.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::Client`] if the HTTP client cannot be built.
    pub fn new(cache: &CacheConfig) -> Result<Self, DownloadError> {
        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .build()
            .map_err(DownloadError::Client)?;
        Ok(Self::with_client(cache, client))
    }

    /// Creates a cache that downloads through `client`.
    #[must_use]
    pub fn with_client(cache: &CacheConfig, client: reqwest::Client) -> Self {
        Self {
            client,
            dir: cache.client_dir().to_path_buf(),
            base_url: cache.download_base().to_string(),
        }
    }

    /// Returns the cache directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Local path of the artifact for `version`.
    #[must_use]
    pub fn local_path(&self, version: &ClientVersion) -> PathBuf {
        self.dir.join(format!("gsql_client-{version}.jar"))
    }

    /// Download URL of the artifact for `version`.
    #[must_use]
    pub fn artifact_url(&self, version: &ClientVersion) -> String {
        format!("{}/{version}/gsql_client-{version}.jar", self.base_url)
    }

    /// Returns the cached artifact for `version`, downloading it if absent.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError`] on transport failure, a non-2xx response, an
    /// empty body, or a filesystem error. No file is left at the cache
    /// location on failure.
    pub async fn obtain(&self, version: &ClientVersion) -> Result<CachedBinary, DownloadError> {
        let path = self.local_path(version);

        if let Ok(meta) = tokio::fs::metadata(&path).await {
            if meta.is_file() && meta.len() > 0 {
                tracing::debug!("GSQL client {} found at {}", version, path.display());
                return Ok(CachedBinary {
                    version: version.clone(),
                    path,
                });
            }
        }

        let io_error = |path: &Path, source| DownloadError::Io {
            version: version.to_string(),
            path: path.to_path_buf(),
            source,
        };

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| io_error(&self.dir, e))?;

        let url = self.artifact_url(version);
        tracing::info!("Downloading GSQL client {} from {}", version, url);

        let transport_error = |source| DownloadError::Transport {
            version: version.to_string(),
            url: url.clone(),
            source,
        };

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::Status {
                version: version.to_string(),
                url,
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await.map_err(transport_error)?;
        if bytes.is_empty() {
            return Err(DownloadError::EmptyBody {
                version: version.to_string(),
                url,
            });
        }

        let part = path.with_extension("jar.part");
        let stored = async {
            tokio::fs::write(&part, &bytes).await?;
            tokio::fs::rename(&part, &path).await
        }
        .await;
        if let Err(e) = stored {
            // Best effort; the original error is what matters
            let _ = tokio::fs::remove_file(&part).await;
            return Err(io_error(&path, e));
        }

        tracing::info!(
            "Stored GSQL client {} ({} bytes) at {}",
            version,
            bytes.len(),
            path.display()
        );
        Ok(CachedBinary {
            version: version.clone(),
            path,
        })
    }
}
