//! # apiseed Domain
//!
//! Shared vocabulary for the seeding toolkit.
//!
//! This crate contains:
//! - Application roles and host kinds
//! - The error taxonomy and Result alias
//! - Option and client configuration structures
//! - Platform constants (default paths, headers, timeouts)
//!
//! ## Architecture
//! - No dependencies on other apiseed crates
//! - Pure data structures, no I/O

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
