//! Application service: the external interface of the inventory core.
//!
//! `InventoryService` composes the catalog registry, the command dispatcher
//! and the balance read model, and owns the per-item critical sections that
//! make `record_movement` safe under concurrent submission.
//!
//! Everything it accepts and returns is plain structured data (ids, strings,
//! integers, timestamps); callers bring their own transport encoding.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use gudang_catalog::{
    Brand, BrandId, CatalogRegistry, Item, ItemId, ItemPatch, NewItem, Supplier, SupplierContact,
    SupplierId, SupplierPatch, Unit, UnitId,
};
use gudang_core::{ActorId, DomainError};
use gudang_events::{EventBus, EventEnvelope};
use gudang_ledger::{LedgerCommand, MovementDirection, RecordMovement, StockLedger};

use crate::balance;
use crate::command_dispatcher::CommandDispatcher;
use crate::config::LedgerConfig;
use crate::error::ServiceError;
use crate::event_store::EventStore;
use crate::projections::{StockLevel, StockLevelProjection};
use crate::read_model::InMemoryReadModelStore;
use crate::reports::{self, MovementRecord, RangeReportRow};

/// Stream type identifier for item movement streams.
const LEDGER_AGGREGATE_TYPE: &str = "ledger.stock";

/// Input for `record_movement`.
///
/// `occurred_at` defaults to submission time; `actor` is the submitting user,
/// passed explicitly at the call boundary (never ambient process state).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordMovementInput {
    pub item_id: ItemId,
    pub direction: MovementDirection,
    pub quantity: u64,
    pub occurred_at: Option<DateTime<Utc>>,
    pub actor: Option<ActorId>,
}

/// Authoritative result of a committed movement.
///
/// Carries the post-commit balance so callers never need a second round-trip
/// to observe consistency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MovementReceipt {
    pub movement_id: Uuid,
    pub new_balance: i64,
}

/// One row of the current-stock listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockOverviewRow {
    pub item_id: ItemId,
    pub item_name: String,
    pub unit_name: String,
    pub quantity: i64,
}

/// Inventory core facade.
///
/// Writes to one item are serialized by a per-item mutex held from balance
/// computation through event append and read-model update, so two racing OUT
/// requests can never jointly overdraw stock. Operations on different items
/// never contend. Catalog state sits behind a `RwLock` (shared reads,
/// exclusive mutations).
pub struct InventoryService<S, B> {
    catalog: RwLock<CatalogRegistry>,
    dispatcher: CommandDispatcher<Arc<S>, B>,
    store: Arc<S>,
    stock_levels: StockLevelProjection<Arc<InMemoryReadModelStore<ItemId, StockLevel>>>,
    item_locks: Mutex<HashMap<ItemId, Arc<Mutex<()>>>>,
    config: LedgerConfig,
}

impl<S, B> InventoryService<S, B>
where
    S: EventStore,
    B: EventBus<EventEnvelope<JsonValue>>,
{
    pub fn new(store: S, bus: B) -> Self {
        Self::with_config(store, bus, LedgerConfig::default())
    }

    pub fn with_config(store: S, bus: B, config: LedgerConfig) -> Self {
        let store = Arc::new(store);
        Self {
            catalog: RwLock::new(CatalogRegistry::new()),
            dispatcher: CommandDispatcher::new(store.clone(), bus),
            store,
            stock_levels: StockLevelProjection::new(Arc::new(InMemoryReadModelStore::new())),
            item_locks: Mutex::new(HashMap::new()),
            config,
        }
    }

    fn catalog_read(&self) -> Result<RwLockReadGuard<'_, CatalogRegistry>, ServiceError> {
        self.catalog
            .read()
            .map_err(|_| ServiceError::Poisoned("catalog"))
    }

    fn catalog_write(&self) -> Result<RwLockWriteGuard<'_, CatalogRegistry>, ServiceError> {
        self.catalog
            .write()
            .map_err(|_| ServiceError::Poisoned("catalog"))
    }

    /// The mutex guarding one item's check-then-commit critical section.
    fn item_lock(&self, item_id: ItemId) -> Result<Arc<Mutex<()>>, ServiceError> {
        let mut locks = self
            .item_locks
            .lock()
            .map_err(|_| ServiceError::Poisoned("item locks"))?;
        Ok(locks
            .entry(item_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone())
    }

    // ----- movement ledger ------------------------------------------------

    /// Record a stock movement and return its identity plus the item's new
    /// balance.
    ///
    /// Contract:
    /// - `item_id` must reference an existing item, else `NotFound`
    /// - `quantity` must be positive (and, for IN, below the configured
    ///   sanity ceiling), else `Validation`
    /// - an OUT movement exceeding the current balance is rejected with
    ///   `InsufficientStock` and the ledger is left unchanged
    ///
    /// The balance check and the event append happen inside the item's
    /// critical section: concurrent movements on the same item are serialized,
    /// movements on different items proceed in parallel.
    pub fn record_movement(
        &self,
        input: RecordMovementInput,
    ) -> Result<MovementReceipt, ServiceError> {
        // Boundary validation; the aggregate re-checks quantity as well.
        if input.quantity == 0 {
            return Err(DomainError::validation("quantity must be greater than zero").into());
        }
        if input.direction == MovementDirection::In && input.quantity > self.config.max_in_quantity
        {
            return Err(DomainError::validation(format!(
                "quantity {} exceeds the single-receipt ceiling of {}",
                input.quantity, self.config.max_in_quantity
            ))
            .into());
        }

        let occurred_at = input.occurred_at.unwrap_or_else(Utc::now);

        let lock = self.item_lock(input.item_id)?;
        let _guard = lock
            .lock()
            .map_err(|_| ServiceError::Poisoned("item critical section"))?;

        // Existence is checked under the item lock so a concurrent
        // `delete_item` (which takes the same lock) cannot slip between the
        // check and the append.
        if self.catalog_read()?.get_item(input.item_id).is_none() {
            return Err(DomainError::NotFound.into());
        }

        let command = LedgerCommand::RecordMovement(RecordMovement {
            item_id: input.item_id,
            direction: input.direction,
            quantity: input.quantity,
            actor: input.actor,
            occurred_at,
        });

        let committed = match self.dispatcher.dispatch(
            input.item_id.0,
            LEDGER_AGGREGATE_TYPE,
            command,
            |id| StockLedger::empty(ItemId::new(id)),
        ) {
            Ok(committed) => committed,
            Err(err) => {
                tracing::warn!(
                    "Rejected {:?} movement of {} for item {}: {:?}",
                    input.direction,
                    input.quantity,
                    input.item_id,
                    err
                );
                return Err(err.into());
            }
        };

        let stored = match committed.as_slice() {
            [stored] => stored,
            _ => {
                return Err(
                    DomainError::invariant("record_movement must commit exactly one event").into(),
                );
            }
        };

        // Synchronous read-model update, still inside the critical section:
        // the balance cache is never more than one commit behind.
        self.stock_levels
            .apply_envelope(&stored.to_envelope())
            .map_err(|e| ServiceError::Projection(e.to_string()))?;

        let new_balance = self
            .stock_levels
            .get(&input.item_id)
            .map(|level| level.quantity)
            .unwrap_or(0);

        tracing::info!(
            "Committed {:?} movement of {} for item {} (balance now {})",
            input.direction,
            input.quantity,
            input.item_id,
            new_balance
        );

        Ok(MovementReceipt {
            movement_id: stored.event_id,
            new_balance,
        })
    }

    // ----- balance engine -------------------------------------------------

    /// Current on-hand quantity for an item (0 if it has no movements).
    pub fn current_balance(&self, item_id: ItemId) -> Result<i64, ServiceError> {
        self.ensure_item_exists(item_id)?;
        Ok(self
            .stock_levels
            .get(&item_id)
            .map(|level| level.quantity)
            .unwrap_or(0))
    }

    /// Balance of an item as of `as_of` (inclusive).
    ///
    /// Movements recorded later with `occurred_at > as_of` never change the
    /// answer.
    pub fn balance_as_of(
        &self,
        item_id: ItemId,
        as_of: DateTime<Utc>,
    ) -> Result<i64, ServiceError> {
        self.ensure_item_exists(item_id)?;
        balance::balance_as_of(&self.store, item_id, as_of)
    }

    fn ensure_item_exists(&self, item_id: ItemId) -> Result<(), ServiceError> {
        if self.catalog_read()?.get_item(item_id).is_none() {
            return Err(DomainError::NotFound.into());
        }
        Ok(())
    }

    // ----- report projector -----------------------------------------------

    /// Date-range aggregates for one item or, with `item_id = None`, for every
    /// catalog item. Rejects `from > to` with `Validation`.
    pub fn range_report(
        &self,
        item_id: Option<ItemId>,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<RangeReportRow>, ServiceError> {
        reports::validate_range(from, to)?;

        let items = {
            let catalog = self.catalog_read()?;
            match item_id {
                Some(id) => vec![
                    catalog
                        .get_item(id)
                        .ok_or(DomainError::NotFound)?
                        .clone(),
                ],
                None => catalog.list_items(),
            }
        };

        items
            .iter()
            .map(|item| reports::range_report_row(&self.store, item, from, to))
            .collect()
    }

    /// Ordered movement history of one item.
    pub fn movement_history(&self, item_id: ItemId) -> Result<Vec<MovementRecord>, ServiceError> {
        self.ensure_item_exists(item_id)?;
        reports::movement_history(&self.store, item_id)
    }

    /// Current balance of every catalog item, with display names.
    pub fn stock_overview(&self) -> Result<Vec<StockOverviewRow>, ServiceError> {
        let catalog = self.catalog_read()?;
        Ok(catalog
            .list_items()
            .into_iter()
            .map(|item| {
                let unit_name = catalog
                    .get_unit(item.unit_id)
                    .map(|unit| unit.name.clone())
                    .unwrap_or_default();
                let quantity = self
                    .stock_levels
                    .get(&item.id)
                    .map(|level| level.quantity)
                    .unwrap_or(0);
                StockOverviewRow {
                    item_id: item.id,
                    item_name: item.name,
                    unit_name,
                    quantity,
                }
            })
            .collect())
    }

    // ----- catalog registry -----------------------------------------------

    pub fn create_brand(&self, name: &str) -> Result<Brand, ServiceError> {
        Ok(self.catalog_write()?.create_brand(name)?)
    }

    pub fn update_brand(&self, id: BrandId, name: &str) -> Result<Brand, ServiceError> {
        Ok(self.catalog_write()?.update_brand(id, name)?)
    }

    pub fn delete_brand(&self, id: BrandId) -> Result<(), ServiceError> {
        Ok(self.catalog_write()?.delete_brand(id)?)
    }

    pub fn get_brand(&self, id: BrandId) -> Result<Brand, ServiceError> {
        Ok(self
            .catalog_read()?
            .get_brand(id)
            .ok_or(DomainError::NotFound)?
            .clone())
    }

    pub fn list_brands(&self) -> Result<Vec<Brand>, ServiceError> {
        Ok(self.catalog_read()?.list_brands())
    }

    pub fn create_unit(&self, name: &str) -> Result<Unit, ServiceError> {
        Ok(self.catalog_write()?.create_unit(name)?)
    }

    pub fn update_unit(&self, id: UnitId, name: &str) -> Result<Unit, ServiceError> {
        Ok(self.catalog_write()?.update_unit(id, name)?)
    }

    pub fn delete_unit(&self, id: UnitId) -> Result<(), ServiceError> {
        Ok(self.catalog_write()?.delete_unit(id)?)
    }

    pub fn get_unit(&self, id: UnitId) -> Result<Unit, ServiceError> {
        Ok(self
            .catalog_read()?
            .get_unit(id)
            .ok_or(DomainError::NotFound)?
            .clone())
    }

    pub fn list_units(&self) -> Result<Vec<Unit>, ServiceError> {
        Ok(self.catalog_read()?.list_units())
    }

    pub fn create_supplier(
        &self,
        name: &str,
        contact: SupplierContact,
    ) -> Result<Supplier, ServiceError> {
        Ok(self.catalog_write()?.create_supplier(name, contact)?)
    }

    pub fn update_supplier(
        &self,
        id: SupplierId,
        patch: SupplierPatch,
    ) -> Result<Supplier, ServiceError> {
        Ok(self.catalog_write()?.update_supplier(id, patch)?)
    }

    pub fn delete_supplier(&self, id: SupplierId) -> Result<(), ServiceError> {
        Ok(self.catalog_write()?.delete_supplier(id)?)
    }

    pub fn get_supplier(&self, id: SupplierId) -> Result<Supplier, ServiceError> {
        Ok(self
            .catalog_read()?
            .get_supplier(id)
            .ok_or(DomainError::NotFound)?
            .clone())
    }

    pub fn list_suppliers(&self) -> Result<Vec<Supplier>, ServiceError> {
        Ok(self.catalog_read()?.list_suppliers())
    }

    pub fn create_item(&self, new: NewItem) -> Result<Item, ServiceError> {
        Ok(self.catalog_write()?.create_item(new)?)
    }

    pub fn update_item(&self, id: ItemId, patch: ItemPatch) -> Result<Item, ServiceError> {
        Ok(self.catalog_write()?.update_item(id, patch)?)
    }

    /// Delete an item.
    ///
    /// Fails with `Conflict` while the item has recorded movements, so
    /// movement history is never orphaned. Taken under the item's critical
    /// section so it cannot race a concurrent `record_movement`.
    pub fn delete_item(&self, id: ItemId) -> Result<(), ServiceError> {
        let lock = self.item_lock(id)?;
        let _guard = lock
            .lock()
            .map_err(|_| ServiceError::Poisoned("item critical section"))?;

        if !self.store.load_stream(id.0)?.is_empty() {
            return Err(DomainError::conflict("item has recorded movements").into());
        }

        Ok(self.catalog_write()?.delete_item(id)?)
    }

    pub fn get_item(&self, id: ItemId) -> Result<Item, ServiceError> {
        Ok(self
            .catalog_read()?
            .get_item(id)
            .ok_or(DomainError::NotFound)?
            .clone())
    }

    pub fn list_items(&self) -> Result<Vec<Item>, ServiceError> {
        Ok(self.catalog_read()?.list_items())
    }
}
