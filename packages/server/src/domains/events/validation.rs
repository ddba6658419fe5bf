//! Field rules for incoming events.
//!
//! Validation never touches the store. A [`ValidatedEvent`] or
//! [`ValidatedBatch`] can only be produced here, and the writers only accept
//! those types, so nothing reaches the database without passing every rule.

use chrono::{DateTime, Duration, Utc};
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer};
use serde_json::value::RawValue;
use thiserror::Error;

use super::models::Level;

pub const MAX_SOURCE_CHARS: usize = 64;
pub const MAX_MESSAGE_CHARS: usize = 2000;
pub const MAX_BATCH_SIZE: usize = 1000;

/// How far ahead of the server clock an event timestamp may be.
pub const MAX_CLOCK_SKEW_SECS: i64 = 5 * 60;

/// A decoded, not-yet-validated event.
///
/// Missing string fields decode as empty so they fail validation with a
/// field-specific message instead of a generic decode error. `meta` keeps the
/// caller's raw JSON text.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CandidateEvent {
    pub source: String,
    pub ts: String,
    pub level: String,
    pub message: String,
    #[serde(deserialize_with = "raw_json")]
    pub meta: Option<String>,
}

fn raw_json<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Box<RawValue>> = Option::deserialize(deserializer)?;
    Ok(raw.map(|value| value.get().to_owned()))
}

impl CandidateEvent {
    pub fn new(
        source: impl Into<String>,
        ts: impl Into<String>,
        level: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            ts: ts.into(),
            level: level.into(),
            message: message.into(),
            meta: None,
        }
    }

    pub fn with_meta(mut self, raw: impl Into<String>) -> Self {
        self.meta = Some(raw.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("source is required")]
    SourceRequired,

    #[error("source too long (max 64)")]
    SourceTooLong,

    #[error("message is required")]
    MessageRequired,

    #[error("message too long (max 2000)")]
    MessageTooLong,

    #[error("level must be one of DEBUG, INFO, WARN, ERROR")]
    InvalidLevel,

    #[error("ts must be RFC3339 (e.g. 2025-12-30T12:00:00Z)")]
    InvalidTimestamp,

    #[error("ts is too far in the future")]
    TimestampInFuture,

    #[error("meta must be valid JSON")]
    InvalidMeta,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BatchError {
    #[error("batch must not be empty")]
    Empty,

    #[error("batch too large (max 1000)")]
    TooLarge { len: usize },

    #[error("index {index}: {reason}")]
    Invalid {
        index: usize,
        reason: ValidationError,
    },
}

/// An event that passed every rule, holding the normalized field values.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedEvent {
    source: String,
    ts: String,
    level: Level,
    message: String,
    meta: Option<String>,
}

impl ValidatedEvent {
    /// Trimmed source.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Timestamp exactly as the caller sent it.
    pub fn ts(&self) -> &str {
        &self.ts
    }

    pub fn level(&self) -> Level {
        self.level
    }

    /// Trimmed message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Raw meta JSON, `None` when absent or `null`.
    pub fn meta(&self) -> Option<&str> {
        self.meta.as_deref()
    }
}

/// Checks a candidate against the server clock.
pub fn validate(candidate: &CandidateEvent) -> Result<ValidatedEvent, ValidationError> {
    validate_at(candidate, Utc::now())
}

/// Checks a candidate against an explicit `now`. Rules run in a fixed order
/// and the first failure is returned.
pub fn validate_at(
    candidate: &CandidateEvent,
    now: DateTime<Utc>,
) -> Result<ValidatedEvent, ValidationError> {
    let source = candidate.source.trim();
    if source.is_empty() {
        return Err(ValidationError::SourceRequired);
    }
    if source.chars().count() > MAX_SOURCE_CHARS {
        return Err(ValidationError::SourceTooLong);
    }

    let message = candidate.message.trim();
    if message.is_empty() {
        return Err(ValidationError::MessageRequired);
    }
    if message.chars().count() > MAX_MESSAGE_CHARS {
        return Err(ValidationError::MessageTooLong);
    }

    let level: Level = candidate
        .level
        .parse()
        .map_err(|_| ValidationError::InvalidLevel)?;

    let ts = DateTime::parse_from_rfc3339(&candidate.ts)
        .map_err(|_| ValidationError::InvalidTimestamp)?;
    if ts.with_timezone(&Utc) > now + Duration::seconds(MAX_CLOCK_SKEW_SECS) {
        return Err(ValidationError::TimestampInFuture);
    }

    let meta = normalize_meta(candidate.meta.as_deref())?;

    Ok(ValidatedEvent {
        source: source.to_string(),
        ts: candidate.ts.clone(),
        level,
        message: message.to_string(),
        meta,
    })
}

/// Absent, blank and `null` meta all collapse to `None`; anything else must
/// parse as JSON and is kept verbatim.
fn normalize_meta(raw: Option<&str>) -> Result<Option<String>, ValidationError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    serde_json::from_str::<IgnoredAny>(trimmed).map_err(|_| ValidationError::InvalidMeta)?;
    if trimmed == "null" {
        return Ok(None);
    }
    Ok(Some(raw.to_string()))
}

/// A non-empty, size-capped batch in which every member passed validation.
#[derive(Debug, Clone)]
pub struct ValidatedBatch {
    events: Vec<ValidatedEvent>,
}

impl ValidatedBatch {
    /// Validates the whole batch against the server clock.
    pub fn validate(candidates: &[CandidateEvent]) -> Result<Self, BatchError> {
        Self::validate_at(candidates, Utc::now())
    }

    /// Size limits are checked before any member is looked at; members are
    /// then checked in order and the first failure reports its index.
    pub fn validate_at(
        candidates: &[CandidateEvent],
        now: DateTime<Utc>,
    ) -> Result<Self, BatchError> {
        check_batch_size(candidates.len())?;

        let events = candidates
            .iter()
            .enumerate()
            .map(|(index, candidate)| {
                validate_at(candidate, now).map_err(|reason| BatchError::Invalid { index, reason })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { events })
    }

    pub fn events(&self) -> &[ValidatedEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

pub fn check_batch_size(len: usize) -> Result<(), BatchError> {
    if len == 0 {
        return Err(BatchError::Empty);
    }
    if len > MAX_BATCH_SIZE {
        return Err(BatchError::TooLarge { len });
    }
    Ok(())
}
