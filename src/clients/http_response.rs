//! HTTP response types.

use std::collections::HashMap;

/// An HTTP response from REST++ or the GSQL server.
#[derive(Clone, Debug)]
pub struct HttpResponse {
    /// The HTTP status code.
    pub code: u16,
    /// Response headers (headers may have multiple values).
    pub headers: HashMap<String, Vec<String>>,
    /// The parsed response body, or `{"raw_body": "..."}` when it is not JSON.
    pub body: serde_json::Value,
    /// Seconds to wait before retrying (from `Retry-After` header).
    pub retry_request_after: Option<f64>,
}

impl HttpResponse {
    /// Creates a new `HttpResponse`, parsing the `Retry-After` header.
    #[must_use]
    pub fn new(code: u16, headers: HashMap<String, Vec<String>>, body: serde_json::Value) -> Self {
        let retry_request_after = headers
            .get("retry-after")
            .and_then(|values| values.first())
            .and_then(|value| value.parse::<f64>().ok());

        Self {
            code,
            headers,
            body,
            retry_request_after,
        }
    }

    /// Returns `true` if the response status code is in the 2xx range.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.code >= 200 && self.code <= 299
    }

    /// Returns `true` if the body is a TigerGraph envelope with `"error": true`.
    ///
    /// Some endpoints report the flag as the string `"true"`.
    #[must_use]
    pub fn has_error_flag(&self) -> bool {
        match self.body.get("error") {
            Some(serde_json::Value::Bool(flag)) => *flag,
            Some(serde_json::Value::String(flag)) => flag.eq_ignore_ascii_case("true"),
            _ => false,
        }
    }

    /// Returns the envelope's `message` field, if any.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.body.get("message").and_then(serde_json::Value::as_str)
    }

    /// Returns the envelope's `code` field, if any.
    #[must_use]
    pub fn error_code(&self) -> Option<&str> {
        self.body.get("code").and_then(serde_json::Value::as_str)
    }
}
