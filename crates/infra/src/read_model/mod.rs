//! Read model storage abstractions.

pub mod kv_store;

pub use kv_store::{InMemoryReadModelStore, ReadModelStore};
