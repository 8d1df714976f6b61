//! Transport layer for the terminal chat and the HTTP server

pub mod cli;
pub mod http;
pub mod page;

pub use http::{router, run_http_server, shutdown_signal, AppState};
