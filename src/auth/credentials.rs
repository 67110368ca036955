//! Credentials and `Authorization` header rendering.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::fmt;

use crate::config::Password;

/// How a request authenticates against the server.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// User name and password, sent as HTTP basic authentication.
    Basic {
        /// The user name.
        username: String,
        /// The password.
        password: Password,
    },
    /// A REST++ token obtained from a secret.
    Token(String),
}

impl Credentials {
    /// Returns the value of the `Authorization` header.
    #[must_use]
    pub fn authorization_header(&self) -> String {
        match self {
            Self::Basic { username, password } => {
                let raw = format!("{username}:{}", password.as_ref());
                format!("Basic {}", STANDARD.encode(raw))
            }
            Self::Token(token) => format!("Bearer {token}"),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"*****")
                .finish(),
            Self::Token(_) => f.write_str("Token(*****)"),
        }
    }
}
