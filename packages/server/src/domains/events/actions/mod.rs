pub mod ingest_batch;
pub mod ingest_event;

pub use ingest_batch::*;
pub use ingest_event::*;
