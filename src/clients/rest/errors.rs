//! REST-specific error types.

use crate::clients::HttpError;
use crate::error::ConfigError;
use thiserror::Error;

/// Error type for REST++ and GSQL server endpoint calls.
///
/// # Example
///
/// ```rust
/// use tigergraph::clients::RestError;
///
/// let error = RestError::Server {
///     message: "The graph Foo does not exist.".to_string(),
///     code: Some("REST-1004".to_string()),
/// };
/// assert!(error.to_string().contains("REST-1004"));
/// ```
#[derive(Debug, Error)]
pub enum RestError {
    /// The server answered 2xx with `"error": true` in the envelope.
    #[error("TigerGraph error{}: {message}", code.as_deref().map(|c| format!(" {c}")).unwrap_or_default())]
    Server {
        /// The envelope's `message` field.
        message: String,
        /// The envelope's `code` field, if present.
        code: Option<String>,
    },

    /// The response did not have the expected structure.
    #[error("Unexpected response from {endpoint}: {reason}")]
    UnexpectedResponse {
        /// The endpoint that was called.
        endpoint: String,
        /// What was wrong with the response.
        reason: String,
    },

    /// The requested component is not listed by the server.
    #[error("\"{component}\" is not a valid component.")]
    UnknownComponent {
        /// The component that was asked for.
        component: String,
    },

    /// A value reported by the server could not be parsed.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// An HTTP-level error occurred.
    #[error(transparent)]
    Http(#[from] HttpError),
}
