//! Endpoint resolution for a deployment

pub mod compose;
pub mod resolver;

pub use compose::GatewayVersion;
pub use resolver::{HostResolver, HttpProbe, ReachabilityProbe};
