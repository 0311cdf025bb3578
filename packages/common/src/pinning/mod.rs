mod content_id;
mod error;
mod traits;

pub mod memory;
pub mod pinata;

pub use content_id::ContentId;
pub use error::PinError;
pub use traits::ContentStore;
