pub mod client;
pub mod counter;
pub mod delivery_note;
pub mod project;
pub mod user;
