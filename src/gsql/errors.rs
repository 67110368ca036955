//! Error types for the GSQL client bridge.
//!
//! Each step of preparing and running the `gsql_client` binary has its own
//! error type, so a caller can tell which step failed and what to fix:
//!
//! - [`ResolutionError`]: No client version is known for the server
//! - [`CertificateError`]: The server certificate could not be exported
//! - [`DownloadError`]: The client artifact could not be fetched
//! - [`LaunchError`]: The client process could not be started
//! - [`ClassificationError`]: Output was not text at all
//! - [`GsqlError`]: Unified error type encompassing all of the above
//!
//! # Example
//!
//! ```rust,ignore
//! use tigergraph::gsql::GsqlError;
//!
//! match session.execute("ls", None, None).await {
//!     Ok(output) => println!("{output}"),
//!     Err(e) => match e.root_cause() {
//!         GsqlError::Resolution(e) => println!("Pin a client with gsql_version: {e}"),
//!         GsqlError::Certificate(e) => println!("Supply cert_path or install openssl: {e}"),
//!         other => println!("GSQL failed: {other}"),
//!     },
//! }
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::clients::RestError;
use crate::config::Version;

/// No compatible client version could be determined.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    /// The server is older than every entry of the version table.
    #[error("No GSQL client version is known for server version {server_version}; the oldest known server version is {oldest}. Pin a client version explicitly.")]
    ServerTooOld {
        /// The server version that was looked up.
        server_version: Version,
        /// The oldest server version in the table.
        oldest: Version,
    },

    /// The version table is empty.
    #[error("No GSQL client version is known for server version {server_version}: the version table is empty.")]
    EmptyTable {
        /// The server version that was looked up.
        server_version: Version,
    },
}

/// The server certificate could not be provisioned.
#[derive(Debug, Error)]
pub enum CertificateError {
    /// The export tool could not be started.
    #[error("Certificate export tool '{tool}' is not available: {source}")]
    ToolUnavailable {
        /// The tool that was invoked.
        tool: String,
        /// The underlying spawn error.
        #[source]
        source: std::io::Error,
    },

    /// The export tool produced no certificate for any port tried.
    #[error("Certificate download from {host} failed (ports tried: {ports:?}). Please check that the server is online.")]
    Unreachable {
        /// The server host.
        host: String,
        /// Ports that were tried, in order.
        ports: Vec<u16>,
    },

    /// The certificate file was written but is empty.
    #[error("Certificate file {} is empty after export from {host}.", path.display())]
    Empty {
        /// The server host.
        host: String,
        /// The file that was written.
        path: PathBuf,
    },

    /// Writing the certificate file failed.
    #[error("Could not write certificate to {}: {source}", path.display())]
    Io {
        /// The file or directory involved.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// The client artifact could not be downloaded.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The HTTP client used for downloads could not be built.
    #[error("Could not initialize the download client: {0}")]
    Client(#[source] reqwest::Error),

    /// The transfer failed before a response was read.
    #[error("Downloading GSQL client {version} from {url} failed: {source}")]
    Transport {
        /// The client version being fetched.
        version: String,
        /// The artifact URL.
        url: String,
        /// The underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-2xx status.
    #[error("Downloading GSQL client {version} from {url} failed with HTTP {status}")]
    Status {
        /// The client version being fetched.
        version: String,
        /// The artifact URL.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The server answered 2xx with an empty body.
    #[error("Downloading GSQL client {version} from {url} returned an empty artifact")]
    EmptyBody {
        /// The client version being fetched.
        version: String,
        /// The artifact URL.
        url: String,
    },

    /// Writing the artifact into the cache failed.
    #[error("Could not store GSQL client {version} at {}: {source}", path.display())]
    Io {
        /// The client version being stored.
        version: String,
        /// The file or directory involved.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// The client process could not be started.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// The cached client binary does not exist.
    #[error("GSQL client binary {} does not exist", path.display())]
    BinaryMissing {
        /// The expected binary location.
        path: PathBuf,
    },

    /// The runtime interpreter (e.g. `java`) is not installed.
    #[error("Interpreter '{}' required to run the GSQL client was not found: {source}", interpreter.display())]
    MissingInterpreter {
        /// The interpreter that was looked up.
        interpreter: PathBuf,
        /// The underlying spawn error.
        #[source]
        source: std::io::Error,
    },

    /// The program exists but could not be executed.
    #[error("Could not start {}: {source}", program.display())]
    Spawn {
        /// The program that failed to start.
        program: PathBuf,
        /// The underlying spawn error.
        #[source]
        source: std::io::Error,
    },
}

/// Output could not be treated as text.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClassificationError {
    /// The output is not valid UTF-8.
    #[error("Output is not valid UTF-8 text (first invalid byte at offset {offset})")]
    NotUtf8 {
        /// Byte offset of the first invalid sequence.
        offset: usize,
    },

    /// The output contains NUL bytes, i.e. binary data.
    #[error("Output contains binary data (NUL byte at offset {offset})")]
    Binary {
        /// Byte offset of the first NUL byte.
        offset: usize,
    },
}

/// Unified error type for GSQL bridge operations.
#[derive(Debug, Error)]
pub enum GsqlError {
    /// Client version resolution failed.
    #[error("Resolving the GSQL client version failed: {0}")]
    Resolution(#[from] ResolutionError),

    /// Certificate provisioning failed.
    #[error("Provisioning the server certificate failed: {0}")]
    Certificate(#[from] CertificateError),

    /// Client download failed.
    #[error("Obtaining the GSQL client failed: {0}")]
    Download(#[from] DownloadError),

    /// Client launch failed.
    #[error("Launching the GSQL client failed: {0}")]
    Launch(#[from] LaunchError),

    /// Output could not be classified.
    #[error(transparent)]
    Classification(#[from] ClassificationError),

    /// Server version discovery failed.
    #[error("Querying the server version failed: {0}")]
    Rest(#[from] RestError),

    /// Reading or writing the client's standard streams failed.
    #[error("GSQL client I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The client ran but its output reports a failure.
    #[error("GSQL command '{command}' failed: {output}")]
    CommandFailed {
        /// The command that was run.
        command: String,
        /// The relevant part of the client output.
        output: String,
    },

    /// The session failed while resolving its client and cannot run commands.
    #[error("GSQL session failed: {0}")]
    SessionFailed(#[source] Arc<GsqlError>),

    /// The session was closed.
    #[error("GSQL session is closed")]
    SessionClosed,
}

impl GsqlError {
    /// Returns the error that put a session into its failed state, or `self`.
    #[must_use]
    pub fn root_cause(&self) -> &Self {
        match self {
            Self::SessionFailed(inner) => inner.root_cause(),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_error_names_versions() {
        let error = ResolutionError::ServerTooOld {
            server_version: "2.1.0".parse().unwrap(),
            oldest: "2.4.0".parse().unwrap(),
        };
        let message = error.to_string();
        assert!(message.contains("2.1.0"));
        assert!(message.contains("2.4.0"));
    }

    #[test]
    fn test_download_error_names_url_and_status() {
        let error = DownloadError::Status {
            version: "3.6.0".to_string(),
            url: "http://mirror/3.6.0/gsql_client-3.6.0.jar".to_string(),
            status: 404,
        };
        let message = error.to_string();
        assert!(message.contains("3.6.0"));
        assert!(message.contains("404"));
        assert!(message.contains("http://mirror/"));
    }

    #[test]
    fn test_gsql_error_identifies_failed_step() {
        let error: GsqlError = CertificateError::Unreachable {
            host: "box.example.com".to_string(),
            ports: vec![443, 14240],
        }
        .into();
        let message = error.to_string();
        assert!(message.starts_with("Provisioning the server certificate failed"));
        assert!(message.contains("box.example.com"));
    }

    #[test]
    fn test_session_failed_exposes_source() {
        use std::error::Error as _;

        let original = GsqlError::Resolution(ResolutionError::EmptyTable {
            server_version: "3.6.0".parse().unwrap(),
        });
        let error = GsqlError::SessionFailed(Arc::new(original));
        let source = error.source().unwrap();
        assert!(source.to_string().contains("3.6.0"));
        assert!(matches!(error.root_cause(), GsqlError::Resolution(_)));
    }
}
