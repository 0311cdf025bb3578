pub mod auth;
pub mod client;
pub mod delivery_note;
pub mod delivery_note_pdf;
pub mod project;
