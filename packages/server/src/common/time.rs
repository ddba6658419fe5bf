//! Receipt timestamps.

use chrono::{DateTime, SecondsFormat, Utc};

/// Current UTC time as stamped on persisted events.
pub fn receipt_timestamp() -> String {
    format_receipt(Utc::now())
}

/// RFC 3339, whole seconds, `Z` suffix (e.g. `2025-01-01T00:00:00Z`).
pub fn format_receipt(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}
