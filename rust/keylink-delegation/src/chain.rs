use serde::{Deserialize, Serialize};

/// The chain a delegation targets.
///
/// Supplied by the caller (typically from the wallet's connected chain) and
/// fixed for the lifetime of one delegation attempt.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChainContext {
    /// Numeric chain id (e.g. `42161` for Arbitrum One).
    pub chain_id: u64,

    /// The on-chain registration target for delegate keys.
    pub contract_address: String,
}

impl ChainContext {
    /// Create a chain context.
    pub fn new(chain_id: u64, contract_address: impl Into<String>) -> Self {
        Self {
            chain_id,
            contract_address: contract_address.into(),
        }
    }
}
