use async_trait::async_trait;

use super::content_id::ContentId;
use super::error::PinError;

/// Content-addressed artifact store.
///
/// Bytes go in under a display filename, a stable content id comes back.
/// The id is resolvable through a public gateway URL.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Pin a byte buffer and return its content id.
    async fn put(&self, data: Vec<u8>, filename: &str) -> Result<ContentId, PinError>;

    /// Public URL that resolves the given content id.
    fn url_for(&self, id: &ContentId) -> String;
}
