use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use gudang_catalog::ItemId;
use gudang_core::{ActorId, Aggregate, AggregateRoot, DomainError};
use gudang_events::Event;

/// Direction of a stock movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementDirection {
    /// Goods received ("masuk"): increases the balance.
    In,
    /// Goods issued ("keluar"): decreases the balance.
    Out,
}

/// Aggregate root: the movement ledger of one item.
///
/// State is the fold of the item's movement stream; the balance can never go
/// negative because the only decreasing path checks it first and commits are
/// serialized per item by the infrastructure layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockLedger {
    item_id: ItemId,
    balance: i64,
    /// Business time of the latest movement. Commands may not predate it, so
    /// the stream order and business-time order coincide and historical
    /// balances can never dip negative.
    last_occurred_at: Option<DateTime<Utc>>,
    version: u64,
}

impl StockLedger {
    /// Create an empty ledger for rehydration.
    pub fn empty(item_id: ItemId) -> Self {
        Self {
            item_id,
            balance: 0,
            last_occurred_at: None,
            version: 0,
        }
    }

    pub fn item_id(&self) -> ItemId {
        self.item_id
    }

    /// Current on-hand quantity for the item.
    pub fn balance(&self) -> i64 {
        self.balance
    }
}

impl AggregateRoot for StockLedger {
    type Id = ItemId;

    fn id(&self) -> &Self::Id {
        &self.item_id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: RecordMovement.
///
/// The only mutating operation the ledger supports. There is no edit or
/// delete command: corrections are compensating movements of the opposite
/// direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordMovement {
    pub item_id: ItemId,
    pub direction: MovementDirection,
    pub quantity: u64,
    /// Submitting user, kept on the movement for audit.
    pub actor: Option<ActorId>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerCommand {
    RecordMovement(RecordMovement),
}

/// Event: StockReceived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockReceived {
    pub item_id: ItemId,
    pub quantity: u64,
    pub actor: Option<ActorId>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: StockIssued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockIssued {
    pub item_id: ItemId,
    pub quantity: u64,
    pub actor: Option<ActorId>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEvent {
    StockReceived(StockReceived),
    StockIssued(StockIssued),
}

impl LedgerEvent {
    pub fn item_id(&self) -> ItemId {
        match self {
            LedgerEvent::StockReceived(e) => e.item_id,
            LedgerEvent::StockIssued(e) => e.item_id,
        }
    }

    pub fn direction(&self) -> MovementDirection {
        match self {
            LedgerEvent::StockReceived(_) => MovementDirection::In,
            LedgerEvent::StockIssued(_) => MovementDirection::Out,
        }
    }

    pub fn quantity(&self) -> u64 {
        match self {
            LedgerEvent::StockReceived(e) => e.quantity,
            LedgerEvent::StockIssued(e) => e.quantity,
        }
    }

    pub fn actor(&self) -> Option<ActorId> {
        match self {
            LedgerEvent::StockReceived(e) => e.actor,
            LedgerEvent::StockIssued(e) => e.actor,
        }
    }

    /// Quantity with its sign: positive for received, negative for issued.
    pub fn signed_quantity(&self) -> i64 {
        match self {
            LedgerEvent::StockReceived(e) => e.quantity as i64,
            LedgerEvent::StockIssued(e) => -(e.quantity as i64),
        }
    }
}

impl Event for LedgerEvent {
    fn event_type(&self) -> &'static str {
        match self {
            LedgerEvent::StockReceived(_) => "ledger.stock.received",
            LedgerEvent::StockIssued(_) => "ledger.stock.issued",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            LedgerEvent::StockReceived(e) => e.occurred_at,
            LedgerEvent::StockIssued(e) => e.occurred_at,
        }
    }
}

impl Aggregate for StockLedger {
    type Command = LedgerCommand;
    type Event = LedgerEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        self.balance += event.signed_quantity();
        self.last_occurred_at = match self.last_occurred_at {
            Some(last) => Some(last.max(event.occurred_at())),
            None => Some(event.occurred_at()),
        };

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            LedgerCommand::RecordMovement(cmd) => self.handle_record(cmd),
        }
    }
}

impl StockLedger {
    fn ensure_item_id(&self, item_id: ItemId) -> Result<(), DomainError> {
        if self.item_id != item_id {
            return Err(DomainError::invariant("item_id mismatch"));
        }
        Ok(())
    }

    fn handle_record(&self, cmd: &RecordMovement) -> Result<Vec<LedgerEvent>, DomainError> {
        self.ensure_item_id(cmd.item_id)?;

        if cmd.quantity == 0 {
            return Err(DomainError::validation(
                "quantity must be greater than zero",
            ));
        }

        if let Some(last) = self.last_occurred_at {
            if cmd.occurred_at < last {
                return Err(DomainError::validation(
                    "occurred_at predates the latest recorded movement",
                ));
            }
        }

        let event = match cmd.direction {
            MovementDirection::In => LedgerEvent::StockReceived(StockReceived {
                item_id: cmd.item_id,
                quantity: cmd.quantity,
                actor: cmd.actor,
                occurred_at: cmd.occurred_at,
            }),
            MovementDirection::Out => {
                if cmd.quantity as i64 > self.balance {
                    return Err(DomainError::insufficient_stock(cmd.quantity, self.balance));
                }
                LedgerEvent::StockIssued(StockIssued {
                    item_id: cmd.item_id,
                    quantity: cmd.quantity,
                    actor: cmd.actor,
                    occurred_at: cmd.occurred_at,
                })
            }
        };

        Ok(vec![event])
    }
}
