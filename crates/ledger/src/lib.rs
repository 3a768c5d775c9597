//! BonusCraft Ledger
//!
//! Boundary between the bonus distributor and the chain.
//!
//! The distributor only ever talks to the [`Ledger`] trait:
//!
//! 1. **Build**: one multi-transfer transaction per batch, paid by the
//!    operator's account.
//! 2. **Sign**: with the operator's key.
//! 3. **Serialize**: raw bytes for the audit dump.
//! 4. **Submit**: send and wait for the transaction hash.
//!
//! [`LedgerClient`] implements it over Solana, either against a live RPC
//! endpoint or fully in-memory (mock mode).

mod client;
mod types;

pub use client::{
    max_transfers_per_transaction, LedgerClient, LedgerConfig, LedgerMode, SubmittedTransaction,
};
pub use types::*;

pub use solana_sdk::transaction::Transaction;

use bonuscraft_core::{Address, TransferInstruction};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("RPC error: {0}")]
    RpcError(String),

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    #[error("Signing failed: {0}")]
    SigningFailed(String),

    #[error("Invalid gas settings: {0}")]
    InvalidGas(String),

    #[error("Invalid keypair: {0}")]
    InvalidKeypair(String),

    #[error("Not authorized")]
    NotAuthorized,

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Transaction is {size} bytes, limit is {limit}")]
    TransactionTooLarge { size: usize, limit: usize },
}

pub type Result<T> = std::result::Result<T, LedgerError>;

/// Operations the distributor needs from a chain client.
///
/// Calls are blocking; the distributor drives them strictly in sequence.
pub trait Ledger {
    /// Account that pays for and signs every transfer
    fn operator(&self) -> Address;

    /// Most transfers one transaction can carry under `gas`.
    fn max_transfers(&self, gas: &GasSettings) -> Result<usize>;

    /// Build one transaction carrying every instruction in `instructions`.
    fn build_multi_transfer(
        &self,
        gas: &GasSettings,
        instructions: &[TransferInstruction],
    ) -> Result<Transaction>;

    /// Sign `tx` with the operator's key.
    fn sign(&self, tx: &mut Transaction) -> Result<()>;

    /// Raw wire bytes of `tx`.
    fn serialize(&self, tx: &Transaction) -> Result<Vec<u8>> {
        bincode::serialize(tx).map_err(|e| LedgerError::SerializationError(e.to_string()))
    }

    /// Send a signed transaction and return its hash.
    fn submit(&self, tx: &Transaction) -> Result<TransactionHash>;
}
