//! Authenticated request façade
//!
//! Role-scoped calls against the platform's admin, manager and consumer APIs.
//! Each call resolves the role's host, attaches the stored bearer token and
//! runs through the retry engine.

pub mod client;
pub mod report;
pub mod types;

pub use client::ApiClients;
pub use report::report_error;
pub use types::{RequestFlags, RequestOptions, RequestResult};
