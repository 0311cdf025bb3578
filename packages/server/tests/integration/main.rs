mod common;

mod auth;
mod client;
mod delivery_note;
mod docs;
