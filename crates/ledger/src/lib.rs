//! `gudang-ledger` — the movement ledger write model.
//!
//! One `StockLedger` aggregate per catalog item; its events are the immutable
//! stock movements. The non-negative balance invariant is enforced here, in
//! the command handler, never as a post-hoc check.

pub mod ledger;

pub use ledger::{
    LedgerCommand, LedgerEvent, MovementDirection, RecordMovement, StockIssued, StockLedger,
    StockReceived,
};
