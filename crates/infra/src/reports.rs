//! Report projector: read-only aggregates over the movement streams.
//!
//! Pure reads: nothing here mutates the ledger. Each query folds a
//! consistent snapshot of one item's stream (the store returns a snapshot
//! per `load_stream` call).

use chrono::{DateTime, Utc};
use uuid::Uuid;

use gudang_catalog::{Item, ItemId};
use gudang_core::{ActorId, DomainError};
use gudang_ledger::MovementDirection;

use crate::balance::decode_ledger_event;
use crate::error::ServiceError;
use crate::event_store::EventStore;

/// One committed movement, as reported back to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovementRecord {
    pub movement_id: Uuid,
    pub item_id: ItemId,
    pub direction: MovementDirection,
    pub quantity: u64,
    pub actor: Option<ActorId>,
    pub occurred_at: DateTime<Utc>,
    /// Position in the item's movement stream.
    pub sequence_number: u64,
}

/// Date-range aggregate for one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeReportRow {
    pub item_id: ItemId,
    pub item_name: String,
    /// Sum of IN quantities with `from <= occurred_at <= to`.
    pub quantity_in: u64,
    /// Sum of OUT quantities with `from <= occurred_at <= to`.
    pub quantity_out: u64,
    /// `quantity_in - quantity_out`.
    pub net_change: i64,
    /// Balance as of `to` (inclusive), over the full history up to that point.
    pub closing_balance: i64,
}

/// Reject inverted ranges before touching any stream.
pub fn validate_range(from: DateTime<Utc>, to: DateTime<Utc>) -> Result<(), ServiceError> {
    if from > to {
        return Err(DomainError::validation(format!(
            "invalid range: from ({from}) is after to ({to})"
        ))
        .into());
    }
    Ok(())
}

/// The ordered, immutable movement history of one item.
pub fn movement_history<S: EventStore>(
    store: &S,
    item_id: ItemId,
) -> Result<Vec<MovementRecord>, ServiceError> {
    let mut stream = store.load_stream(item_id.0)?;
    stream.sort_by_key(|e| e.sequence_number);

    stream
        .iter()
        .map(|stored| {
            let event = decode_ledger_event(stored)?;
            Ok(MovementRecord {
                movement_id: stored.event_id,
                item_id,
                direction: event.direction(),
                quantity: event.quantity(),
                actor: event.actor(),
                occurred_at: stored.occurred_at,
                sequence_number: stored.sequence_number,
            })
        })
        .collect()
}

/// Range aggregate for one item: IN/OUT sums and net change within
/// `[from, to]`, plus the balance at `to`.
///
/// Single pass over the stream; the caller validates the range once for the
/// whole report.
pub fn range_report_row<S: EventStore>(
    store: &S,
    item: &Item,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<RangeReportRow, ServiceError> {
    let mut stream = store.load_stream(item.id.0)?;
    stream.sort_by_key(|e| e.sequence_number);

    let mut quantity_in = 0u64;
    let mut quantity_out = 0u64;
    let mut closing_balance = 0i64;

    for stored in &stream {
        if stored.occurred_at > to {
            continue;
        }
        let event = decode_ledger_event(stored)?;
        closing_balance += event.signed_quantity();

        if stored.occurred_at >= from {
            match event.direction() {
                MovementDirection::In => quantity_in += event.quantity(),
                MovementDirection::Out => quantity_out += event.quantity(),
            }
        }
    }

    Ok(RangeReportRow {
        item_id: item.id,
        item_name: item.name.clone(),
        quantity_in,
        quantity_out,
        net_change: quantity_in as i64 - quantity_out as i64,
        closing_balance,
    })
}
