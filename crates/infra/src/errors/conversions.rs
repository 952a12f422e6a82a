//! Conversions from external infrastructure errors into domain errors.

use apiseed_domain::SeedError;
use reqwest::Error as HttpError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub SeedError);

impl From<InfraError> for SeedError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<SeedError> for InfraError {
    fn from(value: SeedError) -> Self {
        InfraError(value)
    }
}

trait IntoSeedError {
    fn into_seed(self) -> SeedError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → SeedError */
/* -------------------------------------------------------------------------- */

impl IntoSeedError for HttpError {
    fn into_seed(self) -> SeedError {
        if self.is_builder() {
            return SeedError::InvalidInput(format!("invalid HTTP request: {self}"));
        }

        if self.is_timeout() {
            return SeedError::Network(format!("HTTP request timed out: {self}"));
        }

        #[cfg(not(target_arch = "wasm32"))]
        if self.is_connect() {
            return SeedError::Network(format!("HTTP connection failure: {self}"));
        }

        SeedError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_seed())
    }
}

/* -------------------------------------------------------------------------- */
/* std::io::Error / toml::de::Error → SeedError */
/* -------------------------------------------------------------------------- */

impl From<std::io::Error> for InfraError {
    fn from(value: std::io::Error) -> Self {
        InfraError(SeedError::Config(format!("I/O failure: {value}")))
    }
}

impl From<toml::de::Error> for InfraError {
    fn from(value: toml::de::Error) -> Self {
        InfraError(SeedError::Config(format!("Invalid TOML format: {value}")))
    }
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;
    use std::time::Duration;

    use reqwest::Client;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[tokio::test]
    async fn connection_refused_maps_to_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = Client::new().get(format!("http://{addr}")).send().await.unwrap_err();
        let seed: SeedError = InfraError::from(err).into();

        assert!(matches!(seed, SeedError::Network(_)), "{seed:?}");
        assert_eq!(seed.category(), apiseed_domain::ErrorCategory::Transport);
    }

    #[tokio::test]
    async fn timeout_maps_to_network_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let client = Client::builder().timeout(Duration::from_millis(50)).build().unwrap();
        let err = client.get(server.uri()).send().await.unwrap_err();
        let seed: SeedError = InfraError::from(err).into();

        assert!(matches!(&seed, SeedError::Network(msg) if msg.contains("timed out")), "{seed:?}");
    }

    #[test]
    fn io_error_maps_to_config_error() {
        let err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let seed: SeedError = InfraError::from(err).into();
        assert!(matches!(seed, SeedError::Config(msg) if msg.contains("missing")));
    }
}
