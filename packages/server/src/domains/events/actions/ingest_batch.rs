//! All-or-nothing batch write.
//!
//! Two phases: [`ValidatedBatch::validate`] checks every member without
//! touching the store, then the whole batch is inserted inside one
//! transaction. A transaction that is dropped before commit rolls back, so a
//! partial batch is never visible. Cancellation only applies while rows are
//! being staged; once the commit is issued its outcome is what gets reported.

use serde::Serialize;
use sqlx::{Sqlite, Transaction};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::common::{receipt_timestamp, EventId};
use crate::domains::events::error::IngestError;
use crate::domains::events::models::Event;
use crate::domains::events::validation::{CandidateEvent, ValidatedBatch};
use crate::kernel::EventStore;

/// Ids in input order plus the receipt time shared by the whole batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReceipt {
    pub ids: Vec<EventId>,
    pub received_at: String,
}

impl BatchReceipt {
    pub fn count(&self) -> usize {
        self.ids.len()
    }
}

/// Validate every member, then store them all or none.
pub async fn ingest_batch(
    candidates: &[CandidateEvent],
    store: &EventStore,
    cancel: &CancellationToken,
) -> Result<BatchReceipt, IngestError> {
    let batch = ValidatedBatch::validate(candidates)?;

    let staged = tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(IngestError::Cancelled),
        result = stage_batch(&batch, store) => result.map_err(IngestError::from),
    };

    let written = match staged {
        Ok((tx, receipt)) => tx.commit().await.map(|()| receipt).map_err(IngestError::from),
        Err(e) => Err(e),
    };

    match written {
        Ok(receipt) => {
            debug!(
                count = receipt.count(),
                received_at = %receipt.received_at,
                "Stored event batch"
            );
            Ok(receipt)
        }
        Err(e) => {
            error!(error = %e, size = batch.len(), "Failed to store event batch");
            Err(e)
        }
    }
}

/// Insert an already validated batch in a single transaction.
pub async fn write_batch(batch: &ValidatedBatch, store: &EventStore) -> sqlx::Result<BatchReceipt> {
    let (tx, receipt) = stage_batch(batch, store).await?;
    tx.commit().await?;
    Ok(receipt)
}

/// Insert every member into an open transaction and hand it back uncommitted.
async fn stage_batch(
    batch: &ValidatedBatch,
    store: &EventStore,
) -> sqlx::Result<(Transaction<'static, Sqlite>, BatchReceipt)> {
    let mut tx = store.pool().begin().await?;

    let received_at = receipt_timestamp();
    let mut ids = Vec::with_capacity(batch.len());

    for event in batch.events() {
        let id = EventId::new();
        Event::insert(id, event, &received_at, &mut *tx).await?;
        ids.push(id);
    }

    Ok((tx, BatchReceipt { ids, received_at }))
}
