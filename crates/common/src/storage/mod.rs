//! In-process storage for session state

pub mod session;

pub use session::SessionStore;
