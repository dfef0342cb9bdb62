// Transport configuration for building the reqwest::Client.

use std::time::Duration;

use secrecy::SecretString;

/// Shared transport settings for the REST client.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub timeout: Duration,
    /// Sent as `Authorization: Bearer <token>` when present.
    pub token: Option<SecretString>,
    /// Accept self-signed certificates.
    pub accept_invalid_certs: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            token: None,
            accept_invalid_certs: false,
        }
    }
}

impl TransportConfig {
    pub fn build_client(&self) -> Result<reqwest::Client, crate::error::Error> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("nettopo/", env!("CARGO_PKG_VERSION")))
            .danger_accept_invalid_certs(self.accept_invalid_certs)
            .build()
            .map_err(crate::error::Error::Transport)
    }
}
