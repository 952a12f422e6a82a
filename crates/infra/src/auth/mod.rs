//! Session management: sign-in, sign-out and identity providers

pub mod client;

pub use client::{AuthClient, Credentials, IdentityProvider, SignIn};
