//! Running the `gsql_client` binary as a subprocess.
//!
//! Connection settings travel as command-line arguments. The command text is
//! written to the child's standard input, which is then closed, so the query
//! text never passes through argument parsing or a shell.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::config::Password;
use crate::gsql::cache::CachedBinary;
use crate::gsql::errors::{GsqlError, LaunchError};

/// How the client artifact is started.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClientLauncher {
    /// `java -DGSQL_CLIENT_VERSION=<v> -jar <artifact> ...`
    Java {
        /// The Java executable.
        java: PathBuf,
    },
    /// The artifact itself is executable.
    Direct,
}

impl Default for ClientLauncher {
    fn default() -> Self {
        Self::Java {
            java: PathBuf::from("java"),
        }
    }
}

/// Where and as whom the client connects.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnectionArgs {
    /// `host:port` of the GSQL server.
    pub address: String,
    /// User name.
    pub username: String,
    /// Password.
    pub password: Password,
    /// CA certificate for TLS connections.
    pub cert_path: Option<PathBuf>,
}

/// One command for the client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GsqlCommand {
    text: String,
    options: Vec<String>,
}

impl GsqlCommand {
    /// A command with no option tokens.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            options: Vec::new(),
        }
    }

    /// Sets the option tokens, e.g. `["-g", "Social"]`.
    #[must_use]
    pub fn with_options(mut self, options: Vec<String>) -> Self {
        self.options = options;
        self
    }

    /// Returns the command text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the option tokens.
    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    fn stdin_payload(&self) -> String {
        if self.text.ends_with('\n') {
            self.text.clone()
        } else {
            format!("{}\n", self.text)
        }
    }
}

/// Everything the client produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GsqlOutput {
    /// Raw standard output.
    pub stdout: Vec<u8>,
    /// Raw standard error.
    pub stderr: Vec<u8>,
    /// Exit code; `None` when the process was killed by a signal.
    pub exit_code: Option<i32>,
}

impl GsqlOutput {
    /// Standard output as text.
    #[must_use]
    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    /// Standard output followed by standard error.
    #[must_use]
    pub fn combined(&self) -> String {
        let mut text = self.stdout_text();
        if !self.stderr.is_empty() {
            if !text.is_empty() && !text.ends_with('\n') {
                text.push('\n');
            }
            text.push_str(&String::from_utf8_lossy(&self.stderr));
        }
        text
    }

    /// Whether the client exited with status 0.
    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Launches the client for one command at a time.
///
/// A non-zero exit status is reported in [`GsqlOutput::exit_code`] rather
/// than as an error: some informational commands exit non-zero with valid
/// output. Only failing to start the process is an error.
#[derive(Clone, Debug)]
pub struct GsqlProcessBridge {
    launcher: ClientLauncher,
    working_dir: PathBuf,
}

impl GsqlProcessBridge {
    /// Creates a bridge running the client from `working_dir`.
    #[must_use]
    pub fn new(launcher: ClientLauncher, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            launcher,
            working_dir: working_dir.into(),
        }
    }

    /// Program and argument list for `command`.
    #[must_use]
    pub fn build_invocation(
        &self,
        binary: &CachedBinary,
        connection: &ConnectionArgs,
        command: &GsqlCommand,
    ) -> (PathBuf, Vec<String>) {
        let mut args = Vec::new();
        let program = match &self.launcher {
            ClientLauncher::Java { java } => {
                args.push(format!(
                    "-DGSQL_CLIENT_VERSION={}",
                    binary.version().gsql_client_property()
                ));
                args.push("-jar".to_string());
                args.push(binary.path().display().to_string());
                java.clone()
            }
            ClientLauncher::Direct => binary.path().to_path_buf(),
        };

        args.push("-ip".to_string());
        args.push(connection.address.clone());
        args.push("-u".to_string());
        args.push(connection.username.clone());
        args.push("-p".to_string());
        args.push(connection.password.as_ref().to_string());
        if let Some(cert) = &connection.cert_path {
            args.push("-cacert".to_string());
            args.push(cert.display().to_string());
        }
        args.extend(command.options().iter().cloned());

        (program, args)
    }

    /// Runs `command` to completion and collects its output.
    ///
    /// # Errors
    ///
    /// Returns [`GsqlError::Launch`] if the process cannot be started and
    /// [`GsqlError::Io`] if collecting its output fails.
    pub async fn execute(
        &self,
        binary: &CachedBinary,
        connection: &ConnectionArgs,
        command: &GsqlCommand,
    ) -> Result<GsqlOutput, GsqlError> {
        if !binary.path().is_file() {
            return Err(LaunchError::BinaryMissing {
                path: binary.path().to_path_buf(),
            }
            .into());
        }

        let (program, args) = self.build_invocation(binary, connection, command);
        tracing::debug!(
            "Launching {} for GSQL client {} against {} (options: {:?})",
            program.display(),
            binary.version(),
            connection.address,
            command.options()
        );

        let mut child = Command::new(&program)
            .args(&args)
            .current_dir(&self.working_dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| self.launch_error(&program, binary.path(), source))?;

        let stdin = child.stdin.take();
        let payload = command.stdin_payload();
        let write = async move {
            if let Some(mut stdin) = stdin {
                match stdin.write_all(payload.as_bytes()).await {
                    // The client may exit without reading everything
                    Err(e) if e.kind() == ErrorKind::BrokenPipe => {}
                    other => other?,
                }
                drop(stdin);
            }
            Ok::<(), std::io::Error>(())
        };

        let (written, output) = tokio::join!(write, child.wait_with_output());
        let output = output?;
        written?;

        tracing::debug!(
            "GSQL client exited with {:?} ({} bytes of output)",
            output.status.code(),
            output.stdout.len()
        );

        Ok(GsqlOutput {
            stdout: output.stdout,
            stderr: output.stderr,
            exit_code: output.status.code(),
        })
    }

    fn launch_error(&self, program: &Path, binary: &Path, source: std::io::Error) -> LaunchError {
        match (&self.launcher, source.kind()) {
            (ClientLauncher::Java { java }, ErrorKind::NotFound) => {
                LaunchError::MissingInterpreter {
                    interpreter: java.clone(),
                    source,
                }
            }
            (ClientLauncher::Direct, ErrorKind::NotFound) => LaunchError::BinaryMissing {
                path: binary.to_path_buf(),
            },
            _ => LaunchError::Spawn {
                program: program.to_path_buf(),
                source,
            },
        }
    }
}

/// Whether `name` selects a graph; `""` and `GLOBAL` (any case) do not.
#[must_use]
pub fn selects_graph(name: &str) -> bool {
    let name = name.trim();
    !name.is_empty() && !name.eq_ignore_ascii_case("global")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CacheConfig;
    use crate::gsql::{ClientBinaryCache, ClientVersion};

    fn connection(cert: Option<&str>) -> ConnectionArgs {
        ConnectionArgs {
            address: "box.example.com:14240".to_string(),
            username: "tigergraph".to_string(),
            password: Password::new("secret"),
            cert_path: cert.map(PathBuf::from),
        }
    }

    async fn binary_in(dir: &Path) -> CachedBinary {
        ClientBinaryCache::new(&CacheConfig::new(dir))
            .unwrap()
            .obtain(&ClientVersion::new("3.6.0").unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_java_invocation() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("gsql_client-3.6.0.jar"), b"PK").unwrap();
        let binary = binary_in(dir.path()).await;
        let bridge = GsqlProcessBridge::new(ClientLauncher::default(), dir.path());
        let command = GsqlCommand::new("ls").with_options(vec!["-g".into(), "Social".into()]);

        let (program, args) =
            bridge.build_invocation(&binary, &connection(Some("/certs/my-cert.txt")), &command);

        assert_eq!(program, PathBuf::from("java"));
        assert_eq!(
            args,
            vec![
                "-DGSQL_CLIENT_VERSION=v3_6_0".to_string(),
                "-jar".to_string(),
                binary.path().display().to_string(),
                "-ip".to_string(),
                "box.example.com:14240".to_string(),
                "-u".to_string(),
                "tigergraph".to_string(),
                "-p".to_string(),
                "secret".to_string(),
                "-cacert".to_string(),
                "/certs/my-cert.txt".to_string(),
                "-g".to_string(),
                "Social".to_string(),
            ]
        );
        assert!(!args.contains(&"ls".to_string()));
    }

    #[tokio::test]
    async fn test_direct_invocation_without_cert() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("gsql_client-3.6.0.jar"), b"PK").unwrap();
        let binary = binary_in(dir.path()).await;
        let bridge = GsqlProcessBridge::new(ClientLauncher::Direct, dir.path());

        let (program, args) =
            bridge.build_invocation(&binary, &connection(None), &GsqlCommand::new("ls"));

        assert_eq!(program, binary.path());
        assert_eq!(args[0], "-ip");
        assert!(!args.contains(&"-cacert".to_string()));
    }

    #[tokio::test]
    async fn test_missing_binary_is_launch_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("gsql_client-3.6.0.jar"), b"PK").unwrap();
        let binary = binary_in(dir.path()).await;
        std::fs::remove_file(binary.path()).unwrap();
        let bridge = GsqlProcessBridge::new(ClientLauncher::Direct, dir.path());

        let error = bridge
            .execute(&binary, &connection(None), &GsqlCommand::new("ls"))
            .await
            .unwrap_err();

        assert!(matches!(
            error,
            GsqlError::Launch(LaunchError::BinaryMissing { .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_interpreter_is_launch_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("gsql_client-3.6.0.jar"), b"PK").unwrap();
        let binary = binary_in(dir.path()).await;
        let launcher = ClientLauncher::Java {
            java: PathBuf::from("/nonexistent/bin/java"),
        };
        let bridge = GsqlProcessBridge::new(launcher, dir.path());

        let error = bridge
            .execute(&binary, &connection(None), &GsqlCommand::new("ls"))
            .await
            .unwrap_err();

        assert!(matches!(
            error,
            GsqlError::Launch(LaunchError::MissingInterpreter { .. })
        ));
    }

    #[test]
    fn test_stdin_payload_is_newline_terminated() {
        assert_eq!(GsqlCommand::new("ls").stdin_payload(), "ls\n");
        assert_eq!(GsqlCommand::new("ls\n").stdin_payload(), "ls\n");
    }

    #[test]
    fn test_combined_output() {
        let output = GsqlOutput {
            stdout: b"out".to_vec(),
            stderr: b"err\n".to_vec(),
            exit_code: Some(1),
        };
        assert_eq!(output.combined(), "out\nerr\n");
        assert!(!output.success());
    }

    #[test]
    fn test_selects_graph() {
        assert!(selects_graph("Social"));
        assert!(!selects_graph("GLOBAL"));
        assert!(!selects_graph("global"));
        assert!(!selects_graph(""));
    }
}
