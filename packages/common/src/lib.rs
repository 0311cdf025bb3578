pub mod config;
pub mod pinning;

pub use pinning::{ContentId, ContentStore, PinError};
