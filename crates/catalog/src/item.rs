use serde::{Deserialize, Serialize};

use gudang_core::{AggregateId, Entity};

use crate::brand::BrandId;
use crate::supplier::SupplierId;
use crate::unit::UnitId;

/// Item identifier.
///
/// Doubles as the key of the item's movement stream in the ledger.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub AggregateId);

impl ItemId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for ItemId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// A stock-keeping unit in the catalog.
///
/// The brand/unit references are required and must point at existing catalog
/// records; the supplier reference is optional. The ledger never mutates
/// items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub brand_id: BrandId,
    pub unit_id: UnitId,
    pub supplier_id: Option<SupplierId>,
}

impl Entity for Item {
    type Id = ItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Input for creating an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewItem {
    pub name: String,
    pub brand_id: BrandId,
    pub unit_id: UnitId,
    pub supplier_id: Option<SupplierId>,
}

/// Partial update for an item.
///
/// Outer `None` keeps the existing value. For the supplier reference,
/// `Some(None)` clears it and `Some(Some(id))` points it elsewhere.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemPatch {
    pub name: Option<String>,
    pub brand_id: Option<BrandId>,
    pub unit_id: Option<UnitId>,
    pub supplier_id: Option<Option<SupplierId>>,
}
