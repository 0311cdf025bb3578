use serde::Deserialize;

/// Connection settings for the content-pinning service.
#[derive(Debug, Deserialize, Clone)]
pub struct PinningConfig {
    /// Base URL of the pinning API (e.g. `https://api.pinata.cloud`).
    pub api_url: String,
    /// Public gateway used to resolve pinned content ids.
    pub gateway_url: String,
    pub api_key: String,
    pub secret_api_key: String,
}
