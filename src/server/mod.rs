//! HTTP server for Arbor

pub mod http;

pub use http::{run, AppState};
