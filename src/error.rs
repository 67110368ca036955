//! Error types for client configuration.
//!
//! All configuration constructors return `Result<T, ConfigError>` to enable
//! fail-fast validation. Error messages are designed to be clear and actionable.
//!
//! # Example
//!
//! ```rust
//! use tigergraph::{GraphName, ConfigError};
//!
//! let result = GraphName::new("");
//! assert!(matches!(result, Err(ConfigError::EmptyGraphName)));
//! ```

use thiserror::Error;

/// Errors that can occur while building a client configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Host URL is invalid.
    #[error("Invalid host URL '{url}'. Expected 'http://host' or 'https://host' (e.g., 'https://my-instance.i.tgcloud.io').")]
    InvalidHostUrl {
        /// The invalid URL that was provided.
        url: String,
    },

    /// Graph name cannot be empty.
    #[error("Graph name cannot be empty. Use \"GLOBAL\" to address the global scope.")]
    EmptyGraphName,

    /// Username cannot be empty.
    #[error("Username cannot be empty. Please provide a TigerGraph user name.")]
    EmptyUsername,

    /// A version string could not be parsed.
    #[error("Invalid version '{version}'. Expected dotted numeric format (e.g., '3.6.0').")]
    InvalidVersion {
        /// The invalid version string that was provided.
        version: String,
    },

    /// A required field is missing.
    #[error("Missing required field: '{field}'. This field must be set before building the configuration.")]
    MissingRequiredField {
        /// The name of the missing field.
        field: &'static str,
    },
}
