//! Single-event write.

use serde::Serialize;
use sqlx::{Sqlite, Transaction};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::common::{receipt_timestamp, EventId};
use crate::domains::events::error::IngestError;
use crate::domains::events::models::Event;
use crate::domains::events::validation::{validate, CandidateEvent, ValidatedEvent};
use crate::kernel::EventStore;

/// Identifier and receipt time handed back for a stored event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub id: EventId,
    pub received_at: String,
}

/// Validate and persist one event.
///
/// Invalid input returns before the store is touched. The insert runs in its
/// own transaction and is rolled back if `cancel` fires before it is staged.
/// Once the commit has been issued the write is no longer cancellable.
pub async fn ingest_event(
    candidate: &CandidateEvent,
    store: &EventStore,
    cancel: &CancellationToken,
) -> Result<Receipt, IngestError> {
    let event = validate(candidate)?;

    let id = EventId::new();
    let received_at = receipt_timestamp();

    let staged = tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(IngestError::Cancelled),
        result = stage_event(id, &event, &received_at, store) => result.map_err(IngestError::from),
    };

    let inserted = match staged {
        Ok(tx) => tx.commit().await.map_err(IngestError::from),
        Err(e) => Err(e),
    };

    if let Err(e) = inserted {
        error!(error = %e, source = %event.source(), "Failed to store event");
        return Err(e);
    }

    debug!(
        id = %id,
        source = %event.source(),
        level = %event.level(),
        "Stored event"
    );

    Ok(Receipt { id, received_at })
}

/// Open a transaction and insert `event` into it without committing.
///
/// Dropping the returned transaction, or this future, rolls the insert back.
async fn stage_event(
    id: EventId,
    event: &ValidatedEvent,
    received_at: &str,
    store: &EventStore,
) -> sqlx::Result<Transaction<'static, Sqlite>> {
    let mut tx = store.pool().begin().await?;
    Event::insert(id, event, received_at, &mut *tx).await?;
    Ok(tx)
}
