//! `gudang-catalog` — the catalog registry.
//!
//! Owns Brand, Unit, Supplier and Item records and the referential
//! relationships between them. The registry is a pure state machine: no
//! interior mutability, no locks, no IO. Concurrent access is wrapped at the
//! infrastructure layer.
//!
//! The registry never touches the movement ledger; the "item has movements"
//! delete guard is enforced by the service facade, which consults the ledger
//! before delegating here.

pub mod brand;
pub mod item;
pub mod registry;
pub mod supplier;
pub mod unit;

pub use brand::{Brand, BrandId};
pub use item::{Item, ItemId, ItemPatch, NewItem};
pub use registry::CatalogRegistry;
pub use supplier::{Supplier, SupplierContact, SupplierId, SupplierPatch};
pub use unit::{Unit, UnitId};
