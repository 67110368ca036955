//! HTTP client types for TigerGraph communication.
//!
//! This module provides the HTTP layer used for REST++ calls, GSQL server
//! calls, and client artifact downloads.
//!
//! # Overview
//!
//! - [`HttpClient`]: The async HTTP client bound to one base URI
//! - [`HttpRequest`]: A request to be sent
//! - [`HttpResponse`]: A parsed response
//! - [`HttpMethod`]: Supported HTTP methods (GET, POST, DELETE)
//! - [`DataType`]: Content types for request bodies
//! - [`rest::RestClient`]: Endpoint-level client
//! - [`rest::RestError`]: Endpoint-level error type
//!
//! # Retry Behavior
//!
//! - **429 (Rate Limited)**: Retries using `Retry-After` header value, or 1 second if not present
//! - **500 (Server Error)**: Retries with fixed 1-second delay
//! - **Other errors (4xx)**: Returns immediately without retry
//!
//! The default `tries` is 1, meaning no automatic retries.

mod errors;
mod http_client;
mod http_request;
mod http_response;
pub mod rest;

pub use errors::{
    HttpError, HttpResponseError, InvalidHttpRequestError, MaxHttpRetriesExceededError,
};
pub use http_client::{HttpClient, SDK_VERSION};
pub use http_request::{DataType, HttpMethod, HttpRequest, HttpRequestBuilder};
pub use http_response::HttpResponse;

pub use rest::{ComponentVersion, RestClient, RestError};
