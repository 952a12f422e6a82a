//! JSON HTTP transport

pub mod client;
pub mod request;
pub mod url;

pub use client::{HttpClient, HttpClientBuilder};
pub use request::{
    JsonRequest, JsonResponse, ProbeRequest, ProbeResponse, RedactedRequest, RequestDiagnostics,
};
pub use url::{api_endpoint, clean_string, query_param, sanitize_url, url_path};
