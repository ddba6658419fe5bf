//! Typed ID definitions for persisted entities.

pub use super::id::Id;

// ============================================================================
// Entity marker types
// ============================================================================

/// Marker type for telemetry events.
pub struct Event;

// ============================================================================
// Type aliases - the primary API
// ============================================================================

/// Typed ID for telemetry events.
pub type EventId = Id<Event>;
