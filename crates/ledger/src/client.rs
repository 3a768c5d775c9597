//! Ledger client for submitting bonus transfers to Solana
//!
//! Supports two modes:
//! - **Mock Mode**: For development/testing without a cluster. Transactions
//!   are built and signed for real, and submissions are recorded in-memory.
//! - **Live Mode**: Blocking Solana RPC calls against `rpc_url`.
//!
//! Every transfer is a system-program transfer of `amount` lamports from
//! the operator's account. Gas settings become compute-budget
//! instructions prepended to the transaction.

use std::sync::RwLock;

use solana_client::rpc_client::RpcClient;
use solana_sdk::{
    commitment_config::CommitmentConfig,
    compute_budget::ComputeBudgetInstruction,
    hash::Hash,
    instruction::Instruction,
    packet::PACKET_DATA_SIZE,
    pubkey::Pubkey,
    signature::{Keypair, Signer},
    system_instruction,
    transaction::Transaction,
};
use tracing::{debug, info};

use bonuscraft_core::{Address, TransferInstruction};

use crate::{GasSettings, Ledger, LedgerError, Result, TransactionHash};

/// Wire size of `tx` as sent to the cluster
fn transaction_size(tx: &Transaction) -> Result<usize> {
    bincode::serialized_size(tx)
        .map(|size| size as usize)
        .map_err(|e| LedgerError::SerializationError(e.to_string()))
}

/// Reject transactions that do not fit in one packet.
fn check_size(tx: &Transaction) -> Result<()> {
    let size = transaction_size(tx)?;
    if size > PACKET_DATA_SIZE {
        return Err(LedgerError::TransactionTooLarge {
            size,
            limit: PACKET_DATA_SIZE,
        });
    }
    Ok(())
}

/// Most system transfers to distinct recipients that fit in one packet
/// next to the compute-budget instructions for `gas`.
pub fn max_transfers_per_transaction(gas: &GasSettings) -> Result<usize> {
    let payer = Pubkey::new_from_array([0xff; 32]);
    let mut ixs = LedgerClient::budget_instructions(gas)?;
    let mut count = 0usize;

    loop {
        // Never all zeros, which is the system program id
        let mut to = [1u8; 32];
        to[..8].copy_from_slice(&(count as u64).to_le_bytes());
        ixs.push(system_instruction::transfer(
            &payer,
            &Pubkey::new_from_array(to),
            u64::MAX,
        ));

        let tx = Transaction::new_with_payer(&ixs, Some(&payer));
        if transaction_size(&tx)? > PACKET_DATA_SIZE {
            return Ok(count);
        }
        count += 1;
    }
}

/// Ledger mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerMode {
    /// Mock mode for development - submissions are recorded in-memory
    Mock,
    /// Live Solana RPC
    Live,
}

/// Ledger client configuration
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// Ledger mode (Mock or Live)
    pub mode: LedgerMode,
    /// Solana RPC endpoint (only used in Live mode)
    pub rpc_url: String,
    /// Commitment level for transactions
    pub commitment: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            mode: LedgerMode::Mock,
            rpc_url: "https://api.devnet.solana.com".to_string(),
            commitment: "confirmed".to_string(),
        }
    }
}

impl LedgerConfig {
    /// Create a mock configuration for development
    pub fn mock() -> Self {
        Self {
            mode: LedgerMode::Mock,
            ..Default::default()
        }
    }

    /// Create a live configuration against `rpc_url`
    pub fn live(rpc_url: impl Into<String>) -> Self {
        Self {
            mode: LedgerMode::Live,
            rpc_url: rpc_url.into(),
            ..Default::default()
        }
    }

    /// Get commitment config for Solana client
    fn commitment_config(&self) -> CommitmentConfig {
        match self.commitment.as_str() {
            "finalized" => CommitmentConfig::finalized(),
            "confirmed" => CommitmentConfig::confirmed(),
            "processed" => CommitmentConfig::processed(),
            _ => CommitmentConfig::confirmed(),
        }
    }
}

/// A transaction accepted by the mock ledger
#[derive(Debug, Clone)]
pub struct SubmittedTransaction {
    pub hash: TransactionHash,
    /// Number of transfer instructions carried
    pub transfers: usize,
    /// Sum of lamports moved
    pub lamports: u128,
}

/// In-memory state for mock mode
#[derive(Debug, Default)]
struct MockState {
    submitted: Vec<SubmittedTransaction>,
}

/// Ledger client for on-chain bonus transfers
pub struct LedgerClient {
    config: LedgerConfig,
    /// Operator keypair, pays and signs every transaction
    keypair: Keypair,
    /// Solana RPC client (only used in Live mode)
    rpc_client: Option<RpcClient>,
    /// Mock state (only used in Mock mode)
    mock_state: RwLock<MockState>,
}

impl LedgerClient {
    /// Create a ledger client signing with `keypair`
    pub fn with_keypair(config: LedgerConfig, keypair: Keypair) -> Self {
        let rpc_client = if config.mode == LedgerMode::Live {
            Some(RpcClient::new_with_commitment(
                config.rpc_url.clone(),
                config.commitment_config(),
            ))
        } else {
            None
        };

        Self {
            config,
            keypair,
            rpc_client,
            mock_state: RwLock::new(MockState::default()),
        }
    }

    /// Create a ledger client from a 32-byte ed25519 secret key.
    pub fn with_secret_key(config: LedgerConfig, secret: &[u8; 32]) -> Result<Self> {
        let signing_key = ed25519_dalek::SigningKey::from_bytes(secret);
        let public_bytes = signing_key.verifying_key().to_bytes();

        let mut full_key = [0u8; 64];
        full_key[..32].copy_from_slice(secret);
        full_key[32..].copy_from_slice(&public_bytes);
        let keypair = Keypair::try_from(full_key.as_ref())
            .map_err(|e| LedgerError::InvalidKeypair(e.to_string()))?;

        Ok(Self::with_keypair(config, keypair))
    }

    /// Check if running in mock mode
    pub fn is_mock(&self) -> bool {
        self.config.mode == LedgerMode::Mock
    }

    /// Transactions accepted so far in mock mode
    pub fn mock_submissions(&self) -> Vec<SubmittedTransaction> {
        self.mock_state
            .read()
            .map(|state| state.submitted.clone())
            .unwrap_or_default()
    }

    fn rpc(&self) -> Result<&RpcClient> {
        self.rpc_client
            .as_ref()
            .ok_or_else(|| LedgerError::RpcError("RPC client not initialized".to_string()))
    }

    /// Compute-budget instructions for the configured gas settings
    fn budget_instructions(gas: &GasSettings) -> Result<Vec<Instruction>> {
        let mut instructions = Vec::new();
        if gas.limit > 0 {
            let limit = u32::try_from(gas.limit).map_err(|_| {
                LedgerError::InvalidGas(format!("gas limit {} exceeds u32", gas.limit))
            })?;
            instructions.push(ComputeBudgetInstruction::set_compute_unit_limit(limit));
        }
        if gas.price > 0 {
            instructions.push(ComputeBudgetInstruction::set_compute_unit_price(gas.price));
        }
        Ok(instructions)
    }

    fn recent_blockhash(&self) -> Result<Hash> {
        if self.is_mock() {
            return Ok(Hash::default());
        }
        self.rpc()?
            .get_latest_blockhash()
            .map_err(|e| LedgerError::RpcError(format!("get_latest_blockhash: {}", e)))
    }
}

impl Ledger for LedgerClient {
    fn operator(&self) -> Address {
        Address::new(self.keypair.pubkey().to_bytes())
    }

    fn max_transfers(&self, gas: &GasSettings) -> Result<usize> {
        max_transfers_per_transaction(gas)
    }

    fn build_multi_transfer(
        &self,
        gas: &GasSettings,
        instructions: &[TransferInstruction],
    ) -> Result<Transaction> {
        let payer = self.keypair.pubkey();
        let operator = self.operator();

        let mut ixs = Self::budget_instructions(gas)?;
        ixs.reserve(instructions.len());
        for transfer in instructions {
            if transfer.from != operator {
                return Err(LedgerError::NotAuthorized);
            }
            ixs.push(system_instruction::transfer(
                &payer,
                &Pubkey::new_from_array(*transfer.to.as_bytes()),
                transfer.amount,
            ));
        }

        let tx = Transaction::new_with_payer(&ixs, Some(&payer));
        check_size(&tx)?;

        debug!(
            "Built transaction with {} transfers ({} instructions)",
            instructions.len(),
            ixs.len(),
        );
        Ok(tx)
    }

    fn sign(&self, tx: &mut Transaction) -> Result<()> {
        let blockhash = self.recent_blockhash()?;
        tx.try_sign(&[&self.keypair], blockhash)
            .map_err(|e| LedgerError::SigningFailed(e.to_string()))
    }

    fn submit(&self, tx: &Transaction) -> Result<TransactionHash> {
        if !tx.is_signed() {
            return Err(LedgerError::SigningFailed(
                "transaction is not signed".to_string(),
            ));
        }
        // Same packet limit in both modes
        check_size(tx)?;

        if self.is_mock() {
            let hash = TransactionHash(tx.signatures.first().copied().unwrap_or_default());
            let system_id = solana_sdk::system_program::id();
            let transfers = tx
                .message
                .instructions
                .iter()
                .filter(|ix| {
                    tx.message.account_keys.get(ix.program_id_index as usize) == Some(&system_id)
                })
                .collect::<Vec<_>>();
            let lamports = transfers
                .iter()
                .filter_map(|ix| ix.data.get(4..12))
                .filter_map(|bytes| <[u8; 8]>::try_from(bytes).ok())
                .map(|bytes| u64::from_le_bytes(bytes) as u128)
                .sum();

            let mut state = self
                .mock_state
                .write()
                .map_err(|_| LedgerError::TransactionFailed("ledger lock poisoned".to_string()))?;
            state.submitted.push(SubmittedTransaction {
                hash,
                transfers: transfers.len(),
                lamports,
            });
            info!("[MOCK] Transaction accepted: {}", hash);
            return Ok(hash);
        }

        let signature = self
            .rpc()?
            .send_and_confirm_transaction(tx)
            .map_err(|e| LedgerError::TransactionFailed(e.to_string()))?;
        info!("Transaction confirmed: {}", signature);
        Ok(TransactionHash(signature))
    }
}
