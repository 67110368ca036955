//! HTTP client for TigerGraph endpoints.
//!
//! This module provides the [`HttpClient`] type for making authenticated
//! requests with automatic retry handling.

use std::collections::HashMap;

use crate::auth::Credentials;
use crate::clients::errors::{HttpError, HttpResponseError, MaxHttpRetriesExceededError};
use crate::clients::http_request::{HttpMethod, HttpRequest};
use crate::clients::http_response::HttpResponse;
use crate::config::TigerGraphConfig;

/// Fixed retry wait time in seconds.
pub const RETRY_WAIT_TIME: u64 = 1;

/// Crate version from Cargo.toml.
pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// HTTP client bound to one base URI (REST++ or the GSQL server).
///
/// The client handles:
/// - Default headers including User-Agent and `Authorization`
/// - Automatic retry logic for 429 and 500 responses
/// - Trusting a caller-supplied CA certificate
///
/// # Example
///
/// ```rust,ignore
/// use tigergraph::{Credentials, HttpClient, HttpRequest, HttpMethod, Password};
///
/// let credentials = Credentials::Basic {
///     username: "tigergraph".to_string(),
///     password: Password::new("tigergraph"),
/// };
/// let client = HttpClient::new("http://127.0.0.1:9000", Some(&credentials), None)?;
///
/// let request = HttpRequest::builder(HttpMethod::Get, "echo").build()?;
/// let response = client.request(request).await?;
/// ```
#[derive(Debug)]
pub struct HttpClient {
    client: reqwest::Client,
    /// Base URI (e.g., `https://box.example.com:9000`).
    base_uri: String,
    default_headers: HashMap<String, String>,
}

// Verify HttpClient is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<HttpClient>();
};

impl HttpClient {
    /// Creates a new HTTP client.
    ///
    /// # Arguments
    ///
    /// * `base_uri` - Scheme, host and port, without trailing slash
    /// * `credentials` - Credentials rendered into the `Authorization` header
    /// * `config` - Optional configuration for `user_agent_prefix` and `cert_path`
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::Network`] if the underlying client cannot be
    /// created (e.g., TLS initialization failure).
    pub fn new(
        base_uri: impl Into<String>,
        credentials: Option<&Credentials>,
        config: Option<&TigerGraphConfig>,
    ) -> Result<Self, HttpError> {
        let base_uri = base_uri.into().trim_end_matches('/').to_string();

        let user_agent_prefix = config
            .and_then(TigerGraphConfig::user_agent_prefix)
            .map_or(String::new(), |prefix| format!("{prefix} | "));
        let rust_version = env!("CARGO_PKG_RUST_VERSION");
        let user_agent =
            format!("{user_agent_prefix}TigerGraph Rust Client v{SDK_VERSION} | Rust {rust_version}");

        let mut default_headers = HashMap::new();
        default_headers.insert("User-Agent".to_string(), user_agent);
        default_headers.insert("Accept".to_string(), "application/json".to_string());
        if let Some(credentials) = credentials {
            default_headers.insert(
                "Authorization".to_string(),
                credentials.authorization_header(),
            );
        }

        let mut builder = reqwest::Client::builder().use_rustls_tls();
        if let Some(path) = config.and_then(TigerGraphConfig::cert_path) {
            match std::fs::read(path).map(|pem| reqwest::Certificate::from_pem(&pem)) {
                Ok(Ok(cert)) => builder = builder.add_root_certificate(cert),
                Ok(Err(e)) => {
                    tracing::warn!("Ignoring unreadable certificate {}: {}", path.display(), e);
                }
                Err(e) => {
                    tracing::debug!("Certificate {} not available yet: {}", path.display(), e);
                }
            }
        }
        let client = builder.build()?;

        Ok(Self {
            client,
            base_uri,
            default_headers,
        })
    }

    /// Returns the base URI for this client.
    #[must_use]
    pub fn base_uri(&self) -> &str {
        &self.base_uri
    }

    /// Returns the default headers for this client.
    #[must_use]
    pub const fn default_headers(&self) -> &HashMap<String, String> {
        &self.default_headers
    }

    /// Sends an HTTP request.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError`] if:
    /// - Request validation fails (`InvalidRequest`)
    /// - Network error occurs (`Network`)
    /// - Non-2xx response received (`Response`)
    /// - Max retries exceeded (`MaxRetries`)
    pub async fn request(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        request.verify()?;

        let url = format!("{}/{}", self.base_uri, request.path.trim_start_matches('/'));

        let mut headers = self.default_headers.clone();
        if let Some(body_type) = &request.body_type {
            headers.insert(
                "Content-Type".to_string(),
                body_type.as_content_type().to_string(),
            );
        }
        if let Some(extra) = &request.extra_headers {
            for (key, value) in extra {
                headers.insert(key.clone(), value.clone());
            }
        }

        let mut tries: u32 = 0;
        loop {
            tries += 1;

            let mut req_builder = match request.http_method {
                HttpMethod::Get => self.client.get(&url),
                HttpMethod::Post => self.client.post(&url),
                HttpMethod::Delete => self.client.delete(&url),
            };

            for (key, value) in &headers {
                req_builder = req_builder.header(key, value);
            }

            if let Some(query) = &request.query {
                req_builder = req_builder.query(query);
            }

            if let Some(body) = &request.body {
                req_builder = req_builder.body(body.clone());
            }

            tracing::debug!("{} {}", request.http_method, url);
            let res = req_builder.send().await?;

            let code = res.status().as_u16();
            let res_headers = Self::parse_response_headers(res.headers());
            let body_text = res.text().await.unwrap_or_default();

            // Some endpoints answer with plain text; keep it rather than dropping it
            let body = if body_text.is_empty() {
                serde_json::json!({})
            } else {
                serde_json::from_str(&body_text)
                    .unwrap_or_else(|_| serde_json::json!({ "raw_body": body_text }))
            };

            let response = HttpResponse::new(code, res_headers, body);

            if response.is_ok() {
                return Ok(response);
            }

            let error_message = Self::error_message(&response);

            let should_retry = code == 429 || code == 500;
            if !should_retry {
                return Err(HttpError::Response(HttpResponseError {
                    code,
                    message: error_message,
                }));
            }

            if tries >= request.tries {
                if request.tries <= 1 {
                    return Err(HttpError::Response(HttpResponseError {
                        code,
                        message: error_message,
                    }));
                }
                return Err(HttpError::MaxRetries(MaxHttpRetriesExceededError {
                    code,
                    tries: request.tries,
                    message: error_message,
                }));
            }

            let delay = Self::calculate_retry_delay(&response, code);
            tracing::debug!("Retrying {} after {:?} (status {})", url, delay, code);
            tokio::time::sleep(delay).await;
        }
    }

    /// Parses response headers into a `HashMap`.
    fn parse_response_headers(
        headers: &reqwest::header::HeaderMap,
    ) -> HashMap<String, Vec<String>> {
        let mut result: HashMap<String, Vec<String>> = HashMap::new();
        for (name, value) in headers {
            let key = name.as_str().to_lowercase();
            let value = value.to_str().unwrap_or_default().to_string();
            result.entry(key).or_default().push(value);
        }
        result
    }

    /// Calculates the retry delay based on response and status code.
    fn calculate_retry_delay(response: &HttpResponse, status: u16) -> std::time::Duration {
        if status == 429 {
            if let Some(retry_after) = response.retry_request_after {
                return std::time::Duration::from_secs_f64(retry_after);
            }
        }
        std::time::Duration::from_secs(RETRY_WAIT_TIME)
    }

    fn error_message(response: &HttpResponse) -> String {
        if let Some(message) = response.message() {
            return message.to_string();
        }
        if let Some(raw) = response.body.get("raw_body").and_then(|v| v.as_str()) {
            return raw.to_string();
        }
        response.body.to_string()
    }
}
