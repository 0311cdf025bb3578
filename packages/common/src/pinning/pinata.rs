use async_trait::async_trait;
use serde::Deserialize;

use crate::config::PinningConfig;

use super::content_id::ContentId;
use super::error::PinError;
use super::traits::ContentStore;

/// HTTP client for a Pinata-compatible pinning API.
pub struct PinataClient {
    http: reqwest::Client,
    api_url: String,
    gateway_url: String,
    api_key: String,
    secret_api_key: String,
}

#[derive(Deserialize)]
struct PinResponse {
    #[serde(rename = "IpfsHash")]
    ipfs_hash: String,
}

impl PinataClient {
    pub fn new(config: &PinningConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: config.api_url.trim_end_matches('/').to_string(),
            gateway_url: config.gateway_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            secret_api_key: config.secret_api_key.clone(),
        }
    }
}

#[async_trait]
impl ContentStore for PinataClient {
    async fn put(&self, data: Vec<u8>, filename: &str) -> Result<ContentId, PinError> {
        let size = data.len();
        let file_part = reqwest::multipart::Part::bytes(data)
            .file_name(filename.to_string())
            .mime_str("application/octet-stream")?;

        let metadata = serde_json::json!({ "name": filename }).to_string();
        let options = serde_json::json!({ "cidVersion": 1 }).to_string();

        let form = reqwest::multipart::Form::new()
            .part("file", file_part)
            .text("pinataMetadata", metadata)
            .text("pinataOptions", options);

        let response = self
            .http
            .post(format!("{}/pinning/pinFileToIPFS", self.api_url))
            .header("pinata_api_key", &self.api_key)
            .header("pinata_secret_api_key", &self.secret_api_key)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(PinError::Rejected {
                status: status.as_u16(),
                detail,
            });
        }

        let body: PinResponse = response
            .json()
            .await
            .map_err(|e| PinError::InvalidResponse(e.to_string()))?;

        let id = ContentId::new(body.ipfs_hash)?;
        tracing::debug!(filename, size, content_id = %id, "pinned artifact");
        Ok(id)
    }

    fn url_for(&self, id: &ContentId) -> String {
        format!("{}/ipfs/{}", self.gateway_url, id)
    }
}
