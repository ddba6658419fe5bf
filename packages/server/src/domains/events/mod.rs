//! Telemetry event intake: validation, id minting and durable writes.

pub mod actions;
pub mod error;
pub mod models;
pub mod validation;

pub use actions::*;
pub use error::IngestError;
pub use models::{Event, Level};
pub use validation::{
    validate, validate_at, BatchError, CandidateEvent, ValidatedBatch, ValidatedEvent,
    ValidationError, MAX_BATCH_SIZE,
};
