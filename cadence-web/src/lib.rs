//! Cadence Web - HTTP surface for the transfer engine
//!
//! Exposes collection listing and a streaming transfer endpoint that
//! bridges the engine's ordered event stream onto a chunked HTTP response.

pub mod handlers;
pub mod server;

pub use server::{AppState, RuntimeMode, run_server};
