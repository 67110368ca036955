//! The GSQL client bridge.
//!
//! GSQL statements are run by the separately versioned `gsql_client`
//! binary. This module prepares and drives it:
//!
//! - [`ClientVersionResolver`]: Picks the client build for a server version
//! - [`CertificateProvisioner`]: Exports the server certificate when needed
//! - [`ClientBinaryCache`]: Downloads each client build once
//! - [`GsqlProcessBridge`]: Runs the client as a subprocess
//! - [`classify`]: Splits query output into vertices, edges and other values
//! - [`GsqlSession`]: Ties the above together behind `execute`
//!
//! # Example
//!
//! ```rust,ignore
//! use tigergraph::{GraphName, GsqlSession, HostUrl, TigerGraphConfig};
//!
//! let config = TigerGraphConfig::builder()
//!     .host(HostUrl::new("https://box.example.com")?)
//!     .graph_name(GraphName::new("Social")?)
//!     .build()?;
//!
//! let mut session = GsqlSession::new(config);
//! let result = session
//!     .execute_classified("RUN QUERY friends(\"p1\")", None, None, true)
//!     .await?;
//! for (vertex_type, vertices) in result.vertices() {
//!     println!("{vertex_type}: {}", vertices.len());
//! }
//! ```

mod bridge;
mod cache;
mod certificate;
mod classifier;
mod errors;
mod resolver;
mod session;

pub use bridge::{
    selects_graph, ClientLauncher, ConnectionArgs, GsqlCommand, GsqlOutput, GsqlProcessBridge,
};
pub use cache::{CachedBinary, ClientBinaryCache};
pub use certificate::{CertificateExporter, CertificateProvisioner, OpensslExporter};
pub use classifier::{
    classify, classify_bytes, classify_value, ClassifiedResult, EdgeInstance, OtherEntry, Shape,
    UniqueInstance, VertexInstance,
};
pub use errors::{
    CertificateError, ClassificationError, DownloadError, GsqlError, LaunchError, ResolutionError,
};
pub use resolver::{ClientVersion, ClientVersionResolver};
pub use session::{GsqlSession, ResolvedClient, SessionState};
