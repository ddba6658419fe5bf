// Telemetry Ingest - API Core
//
// Accepts structured telemetry events over HTTP, validates them, assigns
// time-ordered ids and stores them in an embedded SQLite database.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
