//! `gudang-events` — domain-agnostic event machinery.
//!
//! Events are the write model's source of truth: immutable, versioned,
//! append-only facts. This crate carries no business semantics.

pub mod bus;
pub mod envelope;
pub mod event;
pub mod in_memory_bus;

pub use bus::{EventBus, Subscription};
pub use envelope::EventEnvelope;
pub use event::Event;
pub use in_memory_bus::InMemoryEventBus;
