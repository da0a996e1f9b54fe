//! relationer-rust: the HTTP server binary's library half, separated from
//! `main.rs` so integration tests can build the router without going
//! through the process entrypoint.

pub mod config;
pub mod error;
pub mod http;
pub mod state;
