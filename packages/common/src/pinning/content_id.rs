use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::PinError;

/// A validated content identifier returned by the pinning service.
///
/// The service is treated as opaque: ids are not re-derived locally, only
/// checked for being safe to embed in URLs and filenames.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ContentId(String);

impl ContentId {
    /// Validate and wrap a raw content id string.
    pub fn new(raw: impl Into<String>) -> Result<Self, PinError> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(PinError::InvalidContentId("empty content id".into()));
        }
        if !raw.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(PinError::InvalidContentId(format!(
                "content id contains non-alphanumeric characters: {raw:?}"
            )));
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentId({})", self.0)
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for ContentId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ContentId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(serde::de::Error::custom)
    }
}
