//! Ledger configuration.

/// Tunables for the movement ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerConfig {
    /// Sanity ceiling for a single inbound movement. Not a correctness
    /// invariant; it only catches fat-fingered quantities at the boundary.
    pub max_in_quantity: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            max_in_quantity: 1_000_000,
        }
    }
}
