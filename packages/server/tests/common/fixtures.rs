//! Test fixtures for building candidate events.

use chrono::{Duration, Utc};
use ingest_core::domains::events::CandidateEvent;

/// A candidate that passes every rule.
pub fn valid_candidate() -> CandidateEvent {
    CandidateEvent::new("svc-a", "2025-01-01T00:00:00Z", "info", "hello")
}

/// A valid candidate whose message identifies its position.
pub fn numbered_candidate(n: usize) -> CandidateEvent {
    CandidateEvent::new(
        "svc-batch",
        "2025-01-01T00:00:00Z",
        "debug",
        format!("event {n}"),
    )
}

/// `n` distinct valid candidates.
pub fn valid_batch(n: usize) -> Vec<CandidateEvent> {
    (0..n).map(numbered_candidate).collect()
}

/// RFC 3339 timestamp `offset` away from the current time.
pub fn ts_from_now(offset: Duration) -> String {
    (Utc::now() + offset).to_rfc3339()
}
