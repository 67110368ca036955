//! # TigerGraph GSQL Client
//!
//! A Rust client for TigerGraph's REST++ endpoints and its GSQL shell,
//! providing type-safe configuration, an async HTTP client with retry
//! handling, and a bridge that drives the versioned `gsql_client` binary.
//!
//! ## Overview
//!
//! This crate provides:
//! - Type-safe configuration via [`TigerGraphConfig`] and [`TigerGraphConfigBuilder`]
//! - Validated newtypes for hosts, graph names and passwords
//! - Numeric version ordering via [`Version`]
//! - Async HTTP client with retry logic via [`HttpClient`]
//! - REST++ calls (version listing, queries, upserts) via [`RestClient`]
//! - GSQL client resolution, download and execution via [`GsqlSession`]
//! - Structural classification of query output via [`gsql::classify`]
//!
//! ## Quick Start
//!
//! ```rust
//! use tigergraph::{TigerGraphConfig, HostUrl, GraphName};
//!
//! let config = TigerGraphConfig::builder()
//!     .host(HostUrl::new("https://box.example.com").unwrap())
//!     .graph_name(GraphName::new("Social").unwrap())
//!     .username("tigergraph")
//!     .password("tigergraph")
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.restpp_url(), "https://box.example.com:9000");
//! ```
//!
//! ## Running GSQL
//!
//! The first command of a session resolves the client version from the
//! server, exports the server certificate if needed and downloads the
//! client. Later commands reuse all three.
//!
//! ```rust,ignore
//! use tigergraph::{GsqlSession, TigerGraphConfig};
//!
//! let mut session = GsqlSession::new(config);
//!
//! // Runs against the configured graph
//! let schema = session.execute("ls", None, None).await?;
//!
//! // `Some(vec![])` passes no graph selector
//! let users = session.execute("SHOW USER", Some(vec![]), None).await?;
//! ```
//!
//! ## Querying over REST++
//!
//! ```rust,ignore
//! use tigergraph::RestClient;
//! use tigergraph::gsql::classify_value;
//!
//! let client = RestClient::new(&config)?;
//! let results = client.run_installed_query("friends", &[("p", "p1")]).await?;
//! let classified = classify_value(results, false);
//! ```
//!
//! ## Design Principles
//!
//! - **No global state**: Configuration and cache locations are passed explicitly
//! - **Fail-fast validation**: All newtypes validate on construction
//! - **Thread-safe**: All types are `Send + Sync`
//! - **Async-first**: Designed for use with Tokio async runtime
//! - **One command at a time**: Sessions take `&mut self` for every command

pub mod auth;
pub mod clients;
pub mod config;
pub mod error;
pub mod gsql;

// Re-export public types at crate root for convenience
pub use auth::Credentials;
pub use config::{
    CacheConfig, GraphName, HostUrl, Password, TigerGraphConfig, TigerGraphConfigBuilder, Version,
};
pub use error::ConfigError;

// Re-export HTTP client types
pub use clients::{
    ComponentVersion, DataType, HttpClient, HttpError, HttpMethod, HttpRequest,
    HttpRequestBuilder, HttpResponse, HttpResponseError, InvalidHttpRequestError,
    MaxHttpRetriesExceededError, RestClient, RestError,
};

// Re-export GSQL bridge types
pub use gsql::{
    ClassifiedResult, ClientBinaryCache, ClientLauncher, ClientVersion, ClientVersionResolver,
    GsqlError, GsqlSession,
};
