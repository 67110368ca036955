//! REST++ and GSQL server endpoint client.

use chrono::{DateTime, FixedOffset};
use serde_json::{json, Map, Value};

use crate::clients::rest::RestError;
use crate::clients::{DataType, HttpClient, HttpMethod, HttpRequest, HttpResponse};
use crate::config::{GraphName, TigerGraphConfig, Version};

/// One line of the server's `/version` component listing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComponentVersion {
    /// Component name (e.g. `product`, `gpe`, `gse`).
    pub name: String,
    /// Full build string (e.g. `release_3.6.0_05-19-2022`).
    pub version: String,
    /// Source revision hash.
    pub hash: String,
    /// Build timestamp, when the line carries one.
    pub built: Option<DateTime<FixedOffset>>,
}

impl ComponentVersion {
    /// Extracts `X.Y.Z` from a `release_X.Y.Z_date` build string.
    #[must_use]
    pub fn short_version(&self) -> Option<&str> {
        let mut parts = self.version.split('_');
        parts.next()?;
        let short = parts.next()?;
        // A trailing section is required, as in `release_3.6.0_05-19-2022`
        parts.next()?;
        (!short.is_empty()).then_some(short)
    }
}

/// Thin client over the REST++ and GSQL server endpoints.
///
/// Every method is a one-to-one mapping of parameters onto a single request;
/// TigerGraph error envelopes (`"error": true`) become [`RestError::Server`].
///
/// # Example
///
/// ```rust,ignore
/// use tigergraph::{RestClient, TigerGraphConfig, HostUrl};
///
/// let config = TigerGraphConfig::builder()
///     .host(HostUrl::new("http://127.0.0.1").unwrap())
///     .build()?;
/// let client = RestClient::new(&config)?;
///
/// let version = client.server_version().await?;
/// println!("Connected to TigerGraph {version}");
/// ```
#[derive(Debug)]
pub struct RestClient {
    restpp: HttpClient,
    gsql: HttpClient,
    graph_name: GraphName,
    tries: u32,
}

// Verify RestClient is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<RestClient>();
};

impl RestClient {
    /// Creates a client for the configured host.
    ///
    /// REST++ calls use the API token when one is configured; GSQL server
    /// calls always use the user name and password.
    ///
    /// # Errors
    ///
    /// Returns [`RestError::Http`] if an HTTP client cannot be created.
    pub fn new(config: &TigerGraphConfig) -> Result<Self, RestError> {
        let restpp = HttpClient::new(
            config.restpp_url(),
            Some(&config.restpp_credentials()),
            Some(config),
        )?;
        let gsql = HttpClient::new(
            config.gs_url(),
            Some(&config.password_credentials()),
            Some(config),
        )?;

        Ok(Self {
            restpp,
            gsql,
            graph_name: config.graph_name().clone(),
            tries: config.tries(),
        })
    }

    /// Returns the REST++ transport.
    #[must_use]
    pub const fn restpp(&self) -> &HttpClient {
        &self.restpp
    }

    /// Returns the GSQL server transport.
    #[must_use]
    pub const fn gsql(&self) -> &HttpClient {
        &self.gsql
    }

    /// Calls `GET /echo`, returning the server's message.
    ///
    /// # Errors
    ///
    /// Returns [`RestError`] on transport failure or an error envelope.
    pub async fn echo(&self) -> Result<String, RestError> {
        let response = self.send(&self.restpp, HttpMethod::Get, "echo", None, &[]).await?;
        Ok(response.message().unwrap_or_default().to_string())
    }

    /// Calls `GET /version/{graph}` and parses the component listing.
    ///
    /// # Errors
    ///
    /// Returns [`RestError`] on transport failure, an error envelope, or a
    /// response without a `message`.
    pub async fn get_version(&self) -> Result<Vec<ComponentVersion>, RestError> {
        let path = format!("version/{}", self.graph_name);
        let response = self.send(&self.restpp, HttpMethod::Get, &path, None, &[]).await?;
        let message = response
            .message()
            .ok_or_else(|| RestError::UnexpectedResponse {
                endpoint: path.clone(),
                reason: "missing message".to_string(),
            })?;
        Ok(parse_version_listing(message))
    }

    /// Returns the short version (`X.Y.Z`) of one component.
    ///
    /// # Errors
    ///
    /// Returns [`RestError::UnknownComponent`] if the server does not list
    /// the component, or its build string has no embedded version.
    pub async fn get_ver(&self, component: &str) -> Result<String, RestError> {
        let unknown = || RestError::UnknownComponent {
            component: component.to_string(),
        };
        self.get_version()
            .await?
            .iter()
            .rev()
            .find(|c| c.name == component)
            .and_then(ComponentVersion::short_version)
            .map(str::to_string)
            .ok_or_else(unknown)
    }

    /// Returns the product version as a comparable [`Version`].
    ///
    /// # Errors
    ///
    /// Returns [`RestError`] if the version cannot be fetched or parsed.
    pub async fn server_version(&self) -> Result<Version, RestError> {
        let short = self.get_ver("product").await?;
        Ok(short.parse()?)
    }

    /// Runs an installed query via `GET /query/{graph}/{name}`.
    ///
    /// Returns the envelope's `results` value.
    ///
    /// # Errors
    ///
    /// Returns [`RestError`] on transport failure or an error envelope.
    pub async fn run_installed_query(
        &self,
        query_name: &str,
        params: &[(&str, &str)],
    ) -> Result<Value, RestError> {
        let path = format!("query/{}/{query_name}", self.graph_name);
        let response = self.send(&self.restpp, HttpMethod::Get, &path, None, params).await?;
        Ok(results_of(response))
    }

    /// Runs query text through `POST /gsqlserver/interpreted_query`.
    ///
    /// Returns the envelope's `results` value.
    ///
    /// # Errors
    ///
    /// Returns [`RestError`] on transport failure or an error envelope.
    pub async fn run_interpreted_query(
        &self,
        query_text: &str,
        params: &[(&str, &str)],
    ) -> Result<Value, RestError> {
        let body = (query_text.to_string(), DataType::Text);
        let response = self
            .send(
                &self.gsql,
                HttpMethod::Post,
                "gsqlserver/interpreted_query",
                Some(body),
                params,
            )
            .await?;
        Ok(results_of(response))
    }

    /// Upserts one vertex via `POST /graph/{graph}`.
    ///
    /// Returns the number of accepted vertices.
    ///
    /// # Errors
    ///
    /// Returns [`RestError`] on transport failure or an error envelope.
    pub async fn upsert_vertex(
        &self,
        vertex_type: &str,
        vertex_id: &str,
        attributes: &Map<String, Value>,
    ) -> Result<u64, RestError> {
        let payload = json!({
            "vertices": { vertex_type: { vertex_id: upsert_attrs(attributes) } }
        });
        let response = self.upsert(&payload).await?;
        Ok(accepted(&response, "accepted_vertices"))
    }

    /// Upserts one edge via `POST /graph/{graph}`.
    ///
    /// Returns the number of accepted edges.
    ///
    /// # Errors
    ///
    /// Returns [`RestError`] on transport failure or an error envelope.
    pub async fn upsert_edge(
        &self,
        source: (&str, &str),
        edge_type: &str,
        target: (&str, &str),
        attributes: &Map<String, Value>,
    ) -> Result<u64, RestError> {
        let (source_type, source_id) = source;
        let (target_type, target_id) = target;
        let payload = json!({
            "edges": { source_type: { source_id: { edge_type: { target_type: {
                target_id: upsert_attrs(attributes)
            } } } } }
        });
        let response = self.upsert(&payload).await?;
        Ok(accepted(&response, "accepted_edges"))
    }

    async fn upsert(&self, payload: &Value) -> Result<HttpResponse, RestError> {
        let path = format!("graph/{}", self.graph_name);
        let body = (payload.to_string(), DataType::Json);
        self.send(&self.restpp, HttpMethod::Post, &path, Some(body), &[])
            .await
    }

    async fn send(
        &self,
        client: &HttpClient,
        method: HttpMethod,
        path: &str,
        body: Option<(String, DataType)>,
        params: &[(&str, &str)],
    ) -> Result<HttpResponse, RestError> {
        let mut builder = HttpRequest::builder(method, path).tries(self.tries);
        if let Some((body, body_type)) = body {
            builder = builder.body(body).body_type(body_type);
        }
        for (key, value) in params {
            builder = builder.query_param(*key, *value);
        }
        let request = builder.build().map_err(crate::clients::HttpError::from)?;

        let response = client.request(request).await?;
        if response.has_error_flag() {
            return Err(RestError::Server {
                message: response.message().unwrap_or_default().to_string(),
                code: response.error_code().map(str::to_string),
            });
        }
        Ok(response)
    }
}

/// Wraps plain attribute values in the `{"attr": {"value": v}}` upsert shape.
fn upsert_attrs(attributes: &Map<String, Value>) -> Value {
    let wrapped: Map<String, Value> = attributes
        .iter()
        .map(|(name, value)| (name.clone(), json!({ "value": value })))
        .collect();
    Value::Object(wrapped)
}

fn accepted(response: &HttpResponse, key: &str) -> u64 {
    response.body["results"][0][key].as_u64().unwrap_or(0)
}

fn results_of(response: HttpResponse) -> Value {
    match response.body {
        Value::Object(mut map) => map.remove("results").unwrap_or(Value::Null),
        other => other,
    }
}

/// Parses the `/version` message.
///
/// The first three lines are a banner and the last one is blank; each line in
/// between reads `name version hash date time offset`.
fn parse_version_listing(message: &str) -> Vec<ComponentVersion> {
    let lines: Vec<&str> = message.split('\n').collect();
    let end = lines.len().saturating_sub(1);
    lines
        .iter()
        .take(end)
        .skip(3)
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 3 {
                return None;
            }
            let built = (fields.len() >= 6)
                .then(|| {
                    let stamp = format!("{} {} {}", fields[3], fields[4], fields[5]);
                    DateTime::parse_from_str(&stamp, "%Y-%m-%d %H:%M:%S %z").ok()
                })
                .flatten();
            Some(ComponentVersion {
                name: fields[0].to_string(),
                version: fields[1].to_string(),
                hash: fields[2].to_string(),
                built,
            })
        })
        .collect()
}
