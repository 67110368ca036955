//! REST++ and GSQL server endpoint client.
//!
//! This module provides a higher-level client built on top of
//! [`HttpClient`](crate::clients::HttpClient). It covers the endpoints the
//! GSQL bridge depends on (server version discovery) plus the common query
//! and upsert calls. Its methods only marshal parameters; they hold no state.
//!
//! - [`RestClient`]: The endpoint client
//! - [`RestError`]: Error type for endpoint calls
//! - [`ComponentVersion`]: One entry of the server's version listing

mod client;
mod errors;

pub use client::{ComponentVersion, RestClient};
pub use errors::RestError;
