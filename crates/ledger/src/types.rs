//! Ledger types

use std::fmt;

use solana_sdk::signature::Signature;

/// Fee settings applied to every batch transaction.
///
/// `price` maps to the compute-unit price (micro-lamports per unit) and
/// `limit` to the compute-unit limit. Zero leaves the network default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GasSettings {
    pub price: u64,
    pub limit: u64,
}

impl GasSettings {
    pub fn new(price: u64, limit: u64) -> Self {
        Self { price, limit }
    }
}

/// Identifier of a submitted transaction (its first signature)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransactionHash(pub Signature);

impl fmt::Display for TransactionHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Signature> for TransactionHash {
    fn from(sig: Signature) -> Self {
        Self(sig)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gas_settings_default() {
        let gas = GasSettings::default();
        assert_eq!(gas.price, 0);
        assert_eq!(gas.limit, 0);
    }

    #[test]
    fn test_transaction_hash_display_is_base58() {
        let hash = TransactionHash(Signature::from([1u8; 64]));
        let shown = hash.to_string();
        assert!(!shown.is_empty());
        assert!(!shown.contains('0'));
    }
}
