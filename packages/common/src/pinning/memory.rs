use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;

use super::content_id::ContentId;
use super::error::PinError;
use super::traits::ContentStore;

/// In-process content store used by tests and local development.
///
/// Ids are sequential rather than content-derived; the trait only promises
/// stability, not a particular hashing scheme.
#[derive(Default)]
pub struct MemoryStore {
    objects: Mutex<HashMap<String, (String, Vec<u8>)>>,
    next_id: AtomicU64,
    gateway_url: String,
}

impl MemoryStore {
    pub fn new(gateway_url: impl Into<String>) -> Self {
        Self {
            objects: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(0),
            gateway_url: gateway_url.into(),
        }
    }

    /// Fetch stored bytes by content id. Test helper.
    pub fn get(&self, id: &ContentId) -> Option<Vec<u8>> {
        self.objects
            .lock()
            .expect("memory store poisoned")
            .get(id.as_str())
            .map(|(_, data)| data.clone())
    }

    /// Number of stored objects. Test helper.
    pub fn len(&self) -> usize {
        self.objects.lock().expect("memory store poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn put(&self, data: Vec<u8>, filename: &str) -> Result<ContentId, PinError> {
        let seq = self.next_id.fetch_add(1, Ordering::Relaxed);
        let id = ContentId::new(format!("memstore{seq:010}"))?;
        self.objects
            .lock()
            .expect("memory store poisoned")
            .insert(id.as_str().to_string(), (filename.to_string(), data));
        Ok(id)
    }

    fn url_for(&self, id: &ContentId) -> String {
        format!("{}/ipfs/{}", self.gateway_url.trim_end_matches('/'), id)
    }
}
