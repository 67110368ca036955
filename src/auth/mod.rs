//! Authentication types for TigerGraph requests.
//!
//! REST++ accepts either a bearer API token or HTTP basic authentication,
//! while the GSQL server and the `gsql_client` binary always authenticate
//! with a user name and password.
//!
//! # Example
//!
//! ```rust
//! use tigergraph::{Credentials, Password};
//!
//! let basic = Credentials::Basic {
//!     username: "tigergraph".to_string(),
//!     password: Password::new("tigergraph"),
//! };
//! assert_eq!(basic.authorization_header(), "Basic dGlnZXJncmFwaDp0aWdlcmdyYXBo");
//!
//! let token = Credentials::Token("abc".to_string());
//! assert_eq!(token.authorization_header(), "Bearer abc");
//! ```

mod credentials;

pub use credentials::Credentials;
