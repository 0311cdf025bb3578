pub mod auth;
pub mod client;
pub mod delivery_note;
pub mod project;
pub mod shared;
