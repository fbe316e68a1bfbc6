use std::collections::HashMap;
use std::sync::RwLock;

use serde_json::Value as JsonValue;
use thiserror::Error;

use gudang_catalog::ItemId;
use gudang_core::AggregateId;
use gudang_events::EventEnvelope;
use gudang_ledger::LedgerEvent;

use crate::read_model::ReadModelStore;

/// Queryable balance read model: current on-hand quantity per item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockLevel {
    pub item_id: ItemId,
    pub quantity: i64,
}

#[derive(Debug, Error)]
pub enum StockLevelProjectionError {
    #[error("failed to deserialize ledger event: {0}")]
    Deserialize(String),

    #[error("event item_id does not match envelope aggregate_id")]
    StreamMismatch,

    #[error("non-monotonic sequence number (last={last}, found={found})")]
    NonMonotonicSequence { last: u64, found: u64 },
}

/// Stock level projection.
///
/// Consumes published envelopes (JSON payloads) and maintains the
/// current-balance read model. The service facade applies committed
/// envelopes synchronously inside the same per-item critical section that
/// appends them, so the read model is never more than one commit behind.
///
/// Read models are disposable and rebuildable from the event stream.
#[derive(Debug)]
pub struct StockLevelProjection<S>
where
    S: ReadModelStore<ItemId, StockLevel>,
{
    store: S,
    /// Per-stream cursor to support at-least-once delivery (idempotent projection).
    cursors: RwLock<HashMap<AggregateId, u64>>,
}

impl<S> StockLevelProjection<S>
where
    S: ReadModelStore<ItemId, StockLevel>,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            cursors: RwLock::new(HashMap::new()),
        }
    }

    /// Query the read model for one item.
    pub fn get(&self, item_id: &ItemId) -> Option<StockLevel> {
        self.store.get(item_id)
    }

    /// List all known stock levels (disposable read model).
    pub fn list(&self) -> Vec<StockLevel> {
        self.store.list()
    }

    /// Apply a published envelope into the projection.
    ///
    /// - Enforces monotonic sequence per aggregate stream
    /// - Idempotent for at-least-once delivery (replays <= cursor are ignored)
    pub fn apply_envelope(
        &self,
        envelope: &EventEnvelope<JsonValue>,
    ) -> Result<(), StockLevelProjectionError> {
        let aggregate_id = envelope.aggregate_id();
        let seq = envelope.sequence_number();

        // Cursor check (per aggregate stream).
        if let Ok(mut cursors) = self.cursors.write() {
            let last = *cursors.get(&aggregate_id).unwrap_or(&0);

            if seq == 0 {
                return Err(StockLevelProjectionError::NonMonotonicSequence { last, found: seq });
            }

            if seq <= last {
                // Duplicate or replay; safe to ignore.
                return Ok(());
            }

            if seq != last + 1 && last != 0 {
                // We allow the first event to be any positive sequence (some stores
                // start at 1), but after that we enforce strict monotonic increments.
                return Err(StockLevelProjectionError::NonMonotonicSequence { last, found: seq });
            }

            // Deserialize the ledger event from the payload.
            let event: LedgerEvent = serde_json::from_value(envelope.payload().clone())
                .map_err(|e| StockLevelProjectionError::Deserialize(e.to_string()))?;

            let item_id = event.item_id();
            if item_id.0 != aggregate_id {
                return Err(StockLevelProjectionError::StreamMismatch);
            }

            // Apply update.
            let mut level = self.store.get(&item_id).unwrap_or(StockLevel {
                item_id,
                quantity: 0,
            });
            level.quantity += event.signed_quantity();
            self.store.upsert(item_id, level);

            // Advance cursor after successful apply.
            cursors.insert(aggregate_id, seq);
        }

        Ok(())
    }

    /// Rebuild the read model from scratch by replaying envelopes.
    pub fn rebuild_from_scratch(
        &self,
        envelopes: impl IntoIterator<Item = EventEnvelope<JsonValue>>,
    ) -> Result<(), StockLevelProjectionError> {
        if let Ok(mut cursors) = self.cursors.write() {
            cursors.clear();
        }
        self.store.clear();

        // Deterministic replay order: aggregate, then sequence.
        let mut envs: Vec<_> = envelopes.into_iter().collect();
        envs.sort_by_key(|e| (*e.aggregate_id().as_uuid().as_bytes(), e.sequence_number()));

        for env in &envs {
            self.apply_envelope(env)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::read_model::InMemoryReadModelStore;
    use chrono::Utc;
    use gudang_core::ActorId;
    use gudang_ledger::{StockIssued, StockReceived};
    use uuid::Uuid;

    fn envelope(item_id: ItemId, seq: u64, event: LedgerEvent) -> EventEnvelope<JsonValue> {
        EventEnvelope::new(
            Uuid::now_v7(),
            item_id.0,
            "ledger.stock",
            seq,
            Utc::now(),
            serde_json::to_value(&event).unwrap(),
        )
    }

    fn received(item_id: ItemId, quantity: u64) -> LedgerEvent {
        LedgerEvent::StockReceived(StockReceived {
            item_id,
            quantity,
            actor: Some(ActorId::new()),
            occurred_at: Utc::now(),
        })
    }

    fn issued(item_id: ItemId, quantity: u64) -> LedgerEvent {
        LedgerEvent::StockIssued(StockIssued {
            item_id,
            quantity,
            actor: None,
            occurred_at: Utc::now(),
        })
    }

    fn projection() -> StockLevelProjection<InMemoryReadModelStore<ItemId, StockLevel>> {
        StockLevelProjection::new(InMemoryReadModelStore::new())
    }

    #[test]
    fn envelopes_fold_into_the_stock_level() {
        let projection = projection();
        let item_id = ItemId::new(AggregateId::new());

        projection
            .apply_envelope(&envelope(item_id, 1, received(item_id, 50)))
            .unwrap();
        projection
            .apply_envelope(&envelope(item_id, 2, issued(item_id, 20)))
            .unwrap();

        assert_eq!(projection.get(&item_id).unwrap().quantity, 30);
    }

    #[test]
    fn replayed_envelopes_are_ignored() {
        let projection = projection();
        let item_id = ItemId::new(AggregateId::new());
        let env = envelope(item_id, 1, received(item_id, 50));

        projection.apply_envelope(&env).unwrap();
        projection.apply_envelope(&env).unwrap();

        assert_eq!(projection.get(&item_id).unwrap().quantity, 50);
    }

    #[test]
    fn sequence_gaps_are_rejected() {
        let projection = projection();
        let item_id = ItemId::new(AggregateId::new());

        projection
            .apply_envelope(&envelope(item_id, 1, received(item_id, 10)))
            .unwrap();
        let err = projection
            .apply_envelope(&envelope(item_id, 3, received(item_id, 10)))
            .unwrap_err();

        assert!(matches!(
            err,
            StockLevelProjectionError::NonMonotonicSequence { last: 1, found: 3 }
        ));
    }

    #[test]
    fn mismatched_stream_is_rejected() {
        let projection = projection();
        let item_id = ItemId::new(AggregateId::new());
        let other = ItemId::new(AggregateId::new());

        // Envelope keyed to one stream carrying another item's event.
        let env = EventEnvelope::new(
            Uuid::now_v7(),
            item_id.0,
            "ledger.stock",
            1,
            Utc::now(),
            serde_json::to_value(received(other, 10)).unwrap(),
        );

        let err = projection.apply_envelope(&env).unwrap_err();
        assert!(matches!(err, StockLevelProjectionError::StreamMismatch));
    }

    #[test]
    fn rebuild_matches_incremental_application() {
        let incremental = projection();
        let rebuilt = projection();
        let a = ItemId::new(AggregateId::new());
        let b = ItemId::new(AggregateId::new());

        let envelopes = vec![
            envelope(a, 1, received(a, 50)),
            envelope(b, 1, received(b, 5)),
            envelope(a, 2, issued(a, 20)),
            envelope(b, 2, issued(b, 5)),
        ];

        for env in &envelopes {
            incremental.apply_envelope(env).unwrap();
        }
        rebuilt.rebuild_from_scratch(envelopes).unwrap();

        assert_eq!(rebuilt.get(&a), incremental.get(&a));
        assert_eq!(rebuilt.get(&b), incremental.get(&b));
        assert_eq!(rebuilt.get(&a).unwrap().quantity, 30);
        assert_eq!(rebuilt.get(&b).unwrap().quantity, 0);
    }
}
