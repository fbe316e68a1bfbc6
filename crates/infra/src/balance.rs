//! Historical balance queries (the fold side of the balance engine).
//!
//! `current_balance` answers from the stock-level read model; the functions
//! here answer point-in-time questions by folding the stored movement stream
//! directly. Events appended later with `occurred_at` past the cutoff can
//! never change an answer, which keeps historical reports stable as the
//! ledger grows.

use chrono::{DateTime, Utc};

use gudang_catalog::ItemId;
use gudang_ledger::LedgerEvent;

use crate::error::ServiceError;
use crate::event_store::{EventStore, StoredEvent};

/// Decode a stored payload back into a typed ledger event.
pub(crate) fn decode_ledger_event(stored: &StoredEvent) -> Result<LedgerEvent, ServiceError> {
    serde_json::from_value(stored.payload.clone())
        .map_err(|e| ServiceError::Deserialize(e.to_string()))
}

/// Balance of an item as of `as_of` (inclusive), folded from its stream.
///
/// An item with no movements has balance 0.
pub fn balance_as_of<S: EventStore>(
    store: &S,
    item_id: ItemId,
    as_of: DateTime<Utc>,
) -> Result<i64, ServiceError> {
    let mut stream = store.load_stream(item_id.0)?;
    stream.sort_by_key(|e| e.sequence_number);

    let mut balance = 0i64;
    for stored in &stream {
        if stored.occurred_at > as_of {
            continue;
        }
        balance += decode_ledger_event(stored)?.signed_quantity();
    }

    Ok(balance)
}
