//! GSQL session: prepares the client once, then runs commands through it.

use std::path::PathBuf;
use std::sync::Arc;

use crate::clients::RestClient;
use crate::config::TigerGraphConfig;
use crate::gsql::bridge::{
    selects_graph, ConnectionArgs, GsqlCommand, GsqlOutput, GsqlProcessBridge,
};
use crate::gsql::cache::{CachedBinary, ClientBinaryCache};
use crate::gsql::certificate::{CertificateExporter, CertificateProvisioner, OpensslExporter};
use crate::gsql::classifier::{classify_bytes, ClassifiedResult};
use crate::gsql::errors::GsqlError;
use crate::gsql::resolver::ClientVersionResolver;

/// Everything needed to launch the client, resolved once per session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedClient {
    binary: CachedBinary,
    connection: ConnectionArgs,
}

impl ResolvedClient {
    /// Returns the cached client artifact.
    #[must_use]
    pub const fn binary(&self) -> &CachedBinary {
        &self.binary
    }

    /// Returns the certificate path, if the connection uses TLS.
    #[must_use]
    pub fn cert_path(&self) -> Option<&std::path::Path> {
        self.connection.cert_path.as_deref()
    }

    /// Returns the connection arguments.
    #[must_use]
    pub const fn connection(&self) -> &ConnectionArgs {
        &self.connection
    }
}

/// Lifecycle of a [`GsqlSession`].
///
/// ```text
/// Uninitialized -> Resolving -> Ready -> (Executing -> Ready)* -> Closed
///                      |                     |
///                      +------> Failed <-----+  (launch failure)
/// ```
#[derive(Clone, Debug)]
pub enum SessionState {
    /// No command has run yet.
    Uninitialized,
    /// Resolving version, certificate and binary.
    Resolving,
    /// Resolved and idle.
    Ready(ResolvedClient),
    /// A command is running.
    Executing(ResolvedClient),
    /// Resolution or launch failed; terminal.
    Failed(Arc<GsqlError>),
    /// Closed by the caller; terminal.
    Closed,
}

/// A GSQL shell session against one server.
///
/// The first command provisions the certificate, resolves the client
/// version (from the configured override, or the version the server reports
/// over a connection trusting that certificate) and obtains the client
/// binary. Later commands reuse the result.
///
/// Commands take `&mut self`, so one session runs one command at a time.
/// Share a session between tasks behind a mutex, or use one per task.
///
/// # Example
///
/// ```rust,ignore
/// use tigergraph::{GsqlSession, HostUrl, TigerGraphConfig};
///
/// let config = TigerGraphConfig::builder()
///     .host(HostUrl::new("https://box.example.com")?)
///     .password("secret")
///     .build()?;
///
/// let mut session = GsqlSession::new(config);
/// println!("{}", session.execute("ls", None, None).await?);
/// session.close();
/// ```
pub struct GsqlSession {
    config: TigerGraphConfig,
    exporter: Arc<dyn CertificateExporter>,
    state: SessionState,
}

// Verify GsqlSession is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<GsqlSession>();
};

impl GsqlSession {
    /// Creates a session; nothing is resolved until the first command.
    #[must_use]
    pub fn new(config: TigerGraphConfig) -> Self {
        Self {
            config,
            exporter: Arc::new(OpensslExporter::default()),
            state: SessionState::Uninitialized,
        }
    }

    /// Replaces the certificate export tool.
    #[must_use]
    pub fn with_certificate_exporter(mut self, exporter: Arc<dyn CertificateExporter>) -> Self {
        self.exporter = exporter;
        self
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &TigerGraphConfig {
        &self.config
    }

    /// Returns the current state.
    #[must_use]
    pub const fn state(&self) -> &SessionState {
        &self.state
    }

    /// Runs `text` and returns standard output followed by standard error.
    ///
    /// `options: None` selects the configured graph; `Some(vec![])` passes no
    /// graph selector. An explicit `graph` is always selected, unless it is
    /// `""` or `GLOBAL`.
    ///
    /// # Errors
    ///
    /// Returns [`GsqlError::SessionFailed`] if resolving the client fails
    /// (now or earlier), [`GsqlError::SessionClosed`] after [`close`], and
    /// [`GsqlError::Io`] if the client's output cannot be collected.
    ///
    /// [`close`]: GsqlSession::close
    pub async fn execute(
        &mut self,
        text: &str,
        options: Option<Vec<String>>,
        graph: Option<&str>,
    ) -> Result<String, GsqlError> {
        Ok(self.execute_output(text, options, graph).await?.combined())
    }

    /// Like [`execute`](GsqlSession::execute), keeping the streams and exit
    /// code apart.
    ///
    /// # Errors
    ///
    /// See [`execute`](GsqlSession::execute).
    pub async fn execute_output(
        &mut self,
        text: &str,
        options: Option<Vec<String>>,
        graph: Option<&str>,
    ) -> Result<GsqlOutput, GsqlError> {
        let resolved = self.ready().await?;
        let command = self.build_command(text, options, graph);
        let bridge = GsqlProcessBridge::new(
            self.config.cache().client_launcher().clone(),
            self.config.cache().client_dir(),
        );

        self.state = SessionState::Executing(resolved.clone());
        let result = bridge
            .execute(&resolved.binary, &resolved.connection, &command)
            .await;

        match result {
            Ok(output) => {
                self.state = SessionState::Ready(resolved);
                Ok(output)
            }
            Err(e @ GsqlError::Launch(_)) => Err(self.fail(e)),
            Err(e) => {
                self.state = SessionState::Ready(resolved);
                Err(e)
            }
        }
    }

    /// Runs `text` and classifies its standard output.
    ///
    /// # Errors
    ///
    /// See [`execute`](GsqlSession::execute); additionally
    /// [`GsqlError::Classification`] if the output is not text.
    pub async fn execute_classified(
        &mut self,
        text: &str,
        options: Option<Vec<String>>,
        graph: Option<&str>,
        restrict_to_graph_elements: bool,
    ) -> Result<ClassifiedResult, GsqlError> {
        let output = self.execute_output(text, options, graph).await?;
        Ok(classify_bytes(&output.stdout, restrict_to_graph_elements)?)
    }

    /// Runs `CREATE SECRET [alias]` on the configured graph and returns the
    /// generated secret.
    ///
    /// # Errors
    ///
    /// Returns [`GsqlError::CommandFailed`] if the alias already exists or
    /// the output carries no secret.
    pub async fn create_secret(&mut self, alias: Option<&str>) -> Result<String, GsqlError> {
        let text = match alias.map(str::trim).filter(|a| !a.is_empty()) {
            Some(alias) => format!("CREATE SECRET {alias}"),
            None => "CREATE SECRET".to_string(),
        };
        let output = self.execute(&text, None, None).await?;
        parse_secret(&output).ok_or(GsqlError::CommandFailed {
            command: text,
            output: output.trim().to_string(),
        })
    }

    /// Runs `SHOW SECRET` on the configured graph.
    ///
    /// # Errors
    ///
    /// See [`execute`](GsqlSession::execute).
    pub async fn show_secrets(&mut self) -> Result<String, GsqlError> {
        self.execute("SHOW SECRET", None, None).await
    }

    /// Closes the session. Cached files stay in place.
    pub fn close(&mut self) {
        tracing::debug!("Closing GSQL session for {}", self.config.host().host_name());
        self.state = SessionState::Closed;
    }

    async fn ready(&mut self) -> Result<ResolvedClient, GsqlError> {
        match std::mem::replace(&mut self.state, SessionState::Resolving) {
            SessionState::Ready(resolved) | SessionState::Executing(resolved) => Ok(resolved),
            // Resolving here means an earlier call was dropped mid-way
            SessionState::Uninitialized | SessionState::Resolving => {
                match self.resolve().await {
                    Ok(resolved) => {
                        self.state = SessionState::Ready(resolved.clone());
                        Ok(resolved)
                    }
                    Err(e) => Err(self.fail(e)),
                }
            }
            SessionState::Failed(e) => {
                self.state = SessionState::Failed(Arc::clone(&e));
                Err(GsqlError::SessionFailed(e))
            }
            SessionState::Closed => {
                self.state = SessionState::Closed;
                Err(GsqlError::SessionClosed)
            }
        }
    }

    fn fail(&mut self, error: GsqlError) -> GsqlError {
        tracing::warn!("GSQL session failed: {}", error);
        let error = Arc::new(error);
        self.state = SessionState::Failed(Arc::clone(&error));
        GsqlError::SessionFailed(error)
    }

    async fn resolve(&self) -> Result<ResolvedClient, GsqlError> {
        let config = &self.config;
        let host = config.host().host_name();

        // The version lookup below must trust a certificate exported here
        let cert_path = config
            .cert_path()
            .map_or_else(|| config.cache().default_cert_path(), PathBuf::from);
        let provisioner = CertificateProvisioner::new(
            Arc::clone(&self.exporter),
            &[config.ssl_port(), config.gs_port()],
        );
        let cert_path = provisioner
            .ensure(host, &cert_path, config.use_cert())
            .await?;

        let client_version = match ClientVersionResolver::pinned(config.gsql_version()) {
            Some(pinned) => pinned,
            None => {
                let server_version = RestClient::new(&config.trusting(cert_path.as_deref()))?
                    .server_version()
                    .await?;
                tracing::debug!("Server {} reports version {}", host, server_version);
                ClientVersionResolver::from_cache_config(config.cache())
                    .resolve(&server_version, None)?
            }
        };

        let binary = ClientBinaryCache::new(config.cache())?
            .obtain(&client_version)
            .await?;

        tracing::debug!(
            "GSQL session ready: client {} at {}",
            client_version,
            binary.path().display()
        );

        Ok(ResolvedClient {
            binary,
            connection: ConnectionArgs {
                address: format!("{host}:{}", config.gs_port()),
                username: config.username().to_string(),
                password: config.password().clone(),
                cert_path,
            },
        })
    }

    fn build_command(
        &self,
        text: &str,
        options: Option<Vec<String>>,
        graph: Option<&str>,
    ) -> GsqlCommand {
        let default_graph = self.config.graph_name().as_ref();
        let graph = match (graph, &options) {
            (Some(graph), _) => Some(graph),
            (None, None) => Some(default_graph),
            (None, Some(_)) => None,
        };

        let mut tokens = Vec::new();
        if let Some(graph) = graph.filter(|g| selects_graph(g)) {
            tokens.push("-g".to_string());
            tokens.push(graph.to_string());
        }
        tokens.extend(options.unwrap_or_default());

        GsqlCommand::new(text).with_options(tokens)
    }
}

impl std::fmt::Debug for GsqlSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GsqlSession")
            .field("config", &self.config)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

/// Extracts `<secret>` from `... The secret: <secret> ...`.
fn parse_secret(output: &str) -> Option<String> {
    if output.contains("already exists") {
        return None;
    }
    let joined = output.replace(['\r', '\n'], "");
    let (_, rest) = joined.split_once("The secret: ")?;
    let secret: String = rest
        .chars()
        .take_while(|c| c.is_alphanumeric() || *c == '_')
        .collect();
    (!secret.is_empty()).then_some(secret)
}
