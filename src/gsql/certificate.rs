//! TLS certificate provisioning for the GSQL client.
//!
//! The client connects to the GSQL server over TLS and needs the server's
//! certificate as a trusted CA file. When the caller does not supply one,
//! [`CertificateProvisioner`] exports it from the server through an external
//! tool ([`OpensslExporter`] by default) and stores it for later runs.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::process::Command;

use crate::gsql::errors::CertificateError;

const PEM_BEGIN: &str = "-----BEGIN CERTIFICATE-----";
const PEM_END: &str = "-----END CERTIFICATE-----";

/// Retrieves the certificate a server presents on a port.
#[async_trait]
pub trait CertificateExporter: Send + Sync {
    /// Returns the PEM text presented by `host:port`.
    ///
    /// An empty string means the server answered without a certificate.
    ///
    /// # Errors
    ///
    /// Returns [`CertificateError::ToolUnavailable`] if the export tool cannot
    /// be run at all; any other error is treated as a failure of this port.
    async fn export(&self, host: &str, port: u16) -> Result<String, CertificateError>;
}

/// Exports certificates with `openssl s_client`.
#[derive(Clone, Debug)]
pub struct OpensslExporter {
    program: PathBuf,
}

impl OpensslExporter {
    /// Uses the given `openssl` executable.
    #[must_use]
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn build_args(host: &str, port: u16) -> Vec<String> {
        vec![
            "s_client".to_string(),
            "-connect".to_string(),
            format!("{host}:{port}"),
            "-servername".to_string(),
            host.to_string(),
            "-showcerts".to_string(),
        ]
    }
}

impl Default for OpensslExporter {
    fn default() -> Self {
        Self::new("openssl")
    }
}

#[async_trait]
impl CertificateExporter for OpensslExporter {
    async fn export(&self, host: &str, port: u16) -> Result<String, CertificateError> {
        tracing::debug!("Exporting certificate from {}:{}", host, port);

        let output = Command::new(&self.program)
            .args(Self::build_args(host, port))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| CertificateError::ToolUnavailable {
                tool: self.program.display().to_string(),
                source,
            })?;

        if !output.status.success() {
            tracing::debug!(
                "{} exited with {} for {}:{}: {}",
                self.program.display(),
                output.status,
                host,
                port,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        Ok(first_pem_block(&String::from_utf8_lossy(&output.stdout)).unwrap_or_default())
    }
}

/// Extracts the first certificate of a PEM chain, delimiters included.
fn first_pem_block(text: &str) -> Option<String> {
    let start = text.find(PEM_BEGIN)?;
    let end = text[start..].find(PEM_END)? + start + PEM_END.len();
    Some(format!("{}\n", &text[start..end]))
}

/// Makes sure a certificate file exists when one is wanted.
///
/// Ports are tried in order; the first one that yields a certificate wins.
/// The session uses the configured SSL port followed by the GSQL port.
#[derive(Clone)]
pub struct CertificateProvisioner {
    exporter: Arc<dyn CertificateExporter>,
    ports: Vec<u16>,
}

impl CertificateProvisioner {
    /// Creates a provisioner trying `ports` in order.
    #[must_use]
    pub fn new(exporter: Arc<dyn CertificateExporter>, ports: &[u16]) -> Self {
        let mut unique = Vec::with_capacity(ports.len());
        for port in ports {
            if !unique.contains(port) {
                unique.push(*port);
            }
        }
        Self {
            exporter,
            ports: unique,
        }
    }

    /// Returns the ports tried, in order.
    #[must_use]
    pub fn ports(&self) -> &[u16] {
        &self.ports
    }

    /// Returns the certificate path to use, exporting it first if needed.
    ///
    /// - `want_cert == false`: `None`, without touching the filesystem
    /// - `cert_path` is an existing readable file: that path, unchanged
    /// - otherwise: the server certificate is written to `cert_path`
    ///
    /// # Errors
    ///
    /// Returns [`CertificateError`] if the export tool is missing, no port
    /// yields a certificate, or the written file is empty.
    pub async fn ensure(
        &self,
        host: &str,
        cert_path: &Path,
        want_cert: bool,
    ) -> Result<Option<PathBuf>, CertificateError> {
        if !want_cert {
            return Ok(None);
        }

        if is_readable_file(cert_path).await {
            tracing::debug!("Using existing certificate {}", cert_path.display());
            return Ok(Some(cert_path.to_path_buf()));
        }

        let pem = self.export_first(host).await?;

        if let Some(dir) = cert_path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|source| CertificateError::Io {
                    path: dir.to_path_buf(),
                    source,
                })?;
        }
        tokio::fs::write(cert_path, pem.as_bytes())
            .await
            .map_err(|source| CertificateError::Io {
                path: cert_path.to_path_buf(),
                source,
            })?;

        let written = tokio::fs::metadata(cert_path)
            .await
            .map_err(|source| CertificateError::Io {
                path: cert_path.to_path_buf(),
                source,
            })?;
        if written.len() == 0 {
            return Err(CertificateError::Empty {
                host: host.to_string(),
                path: cert_path.to_path_buf(),
            });
        }

        tracing::info!(
            "Stored certificate of {} at {}",
            host,
            cert_path.display()
        );
        Ok(Some(cert_path.to_path_buf()))
    }

    async fn export_first(&self, host: &str) -> Result<String, CertificateError> {
        for (attempt, port) in self.ports.iter().enumerate() {
            if attempt > 0 {
                tracing::warn!("Retrying certificate export from {} on port {}", host, port);
            }
            match self.exporter.export(host, *port).await {
                Ok(pem) if !pem.trim().is_empty() => return Ok(pem),
                Ok(_) => {
                    tracing::debug!("No certificate presented by {}:{}", host, port);
                }
                Err(e @ CertificateError::ToolUnavailable { .. }) => return Err(e),
                Err(e) => {
                    tracing::debug!("Certificate export from {}:{} failed: {}", host, port, e);
                }
            }
        }

        Err(CertificateError::Unreachable {
            host: host.to_string(),
            ports: self.ports.clone(),
        })
    }
}

impl std::fmt::Debug for CertificateProvisioner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CertificateProvisioner")
            .field("ports", &self.ports)
            .finish_non_exhaustive()
    }
}

async fn is_readable_file(path: &Path) -> bool {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_file() => tokio::fs::File::open(path).await.is_ok(),
        _ => false,
    }
}
