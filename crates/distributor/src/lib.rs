//! BonusCraft Distributor
//!
//! Runs one bonus distribution end to end:
//!
//! ```text
//! load log -> allocate -> write record -> verify total -> for each batch:
//!     build -> sign -> dump -> submit
//! ```
//!
//! Nothing reaches the ledger unless the allocation total fits in the
//! permitted pool and every batch fits in one ledger transaction. Once
//! submission starts, a failing batch stops the run; batches already
//! submitted stay on chain.

mod audit;

pub use audit::{transaction_dump_path, write_record_file, write_transaction_dump};

use std::path::PathBuf;

use thiserror::Error;
use tracing::{error, info};

use bonuscraft_core::{
    allocate, load_records, plan_batches, verify_total, Allocation, AllocationPolicy, AllowList,
    Batch, BonusError, TransferInstruction,
};
use bonuscraft_ledger::{GasSettings, Ledger, LedgerError, TransactionHash};
use bonuscraft_settings::Settings;

#[derive(Error, Debug)]
pub enum DistributorError {
    #[error(transparent)]
    Bonus(#[from] BonusError),

    #[error("Failed to write audit record: {0}")]
    Audit(#[from] std::io::Error),

    #[error("Batch size {batch_size} is above the ledger limit of {limit} transfers")]
    BatchTooLarge { batch_size: usize, limit: usize },

    #[error("Failed to query ledger limits: {0}")]
    Ledger(#[source] LedgerError),

    #[error("Batch {index} failed after {submitted} batches submitted: {source}")]
    BatchFailed {
        index: usize,
        submitted: usize,
        #[source]
        source: LedgerError,
    },

    #[error("Failed to dump batch {index} after {submitted} batches submitted: {source}")]
    DumpFailed {
        index: usize,
        submitted: usize,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, DistributorError>;

/// Everything the distributor needs besides the ledger
#[derive(Debug, Clone)]
pub struct DistributorConfig {
    pub data_file: PathBuf,
    pub policy: AllocationPolicy,
    pub batch_size: Option<usize>,
    pub gas: GasSettings,
    pub record_file: Option<PathBuf>,
    pub dump_dir: Option<PathBuf>,
}

impl DistributorConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        let mut policy = AllocationPolicy::new(settings.bonus)
            .with_multiplier(settings.bonus_multiplier)
            .skip_zero_shares(settings.skip_zero_shares);
        if let Some(peers) = &settings.allow_list {
            policy = policy.with_allow_list(peers.iter().cloned().collect::<AllowList>());
        }

        Self {
            data_file: settings.data_file.clone(),
            policy,
            batch_size: settings.batch_size,
            gas: GasSettings::new(settings.gas_price, settings.gas_limit),
            record_file: settings.record_file.clone(),
            dump_dir: settings.transaction_dump_dir.clone(),
        }
    }
}

/// Validated allocation, ready for submission
#[derive(Debug, Clone)]
pub struct Plan {
    pub allocations: Vec<Allocation>,
    pub batches: Vec<Batch>,
    /// Sum of all amounts
    pub total: u128,
    /// `bonus * multiplier`
    pub permitted: u128,
    /// Non-zero records read from the log
    pub records: usize,
    /// Zero-value records dropped by the ingester
    pub dropped: usize,
}

impl Plan {
    pub fn instructions(&self) -> Vec<TransferInstruction> {
        self.allocations.iter().map(|a| a.instruction).collect()
    }
}

/// Outcome of one submitted batch
#[derive(Debug, Clone)]
pub struct BatchReceipt {
    pub index: usize,
    pub transfers: usize,
    pub amount: u128,
    pub hash: TransactionHash,
    /// Raw transaction dump, if enabled
    pub dump: Option<PathBuf>,
}

/// Outcome of a full run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub plan: Plan,
    pub receipts: Vec<BatchReceipt>,
}

/// Bonus distributor over any [`Ledger`]
pub struct Distributor<L: Ledger> {
    config: DistributorConfig,
    ledger: L,
}

impl<L: Ledger> Distributor<L> {
    pub fn new(config: DistributorConfig, ledger: L) -> Self {
        Self { config, ledger }
    }

    pub fn config(&self) -> &DistributorConfig {
        &self.config
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Ingest, allocate, write the record file and verify the total.
    ///
    /// Touches no ledger state besides reading the operator address. The
    /// record file is written before verification so an over-allocated run
    /// still leaves its audit trail.
    pub fn plan(&self) -> Result<Plan> {
        let ingested = load_records(&self.config.data_file)?;

        let allocations = allocate(
            &ingested.records,
            &ingested.totals,
            &self.config.policy,
            self.ledger.operator(),
        )?;
        let instructions: Vec<TransferInstruction> =
            allocations.iter().map(|a| a.instruction).collect();

        if let Some(path) = &self.config.record_file {
            write_record_file(path, &instructions)?;
            info!("Wrote allocation record to {}", path.display());
        }

        let total = verify_total(
            &instructions,
            self.config.policy.bonus,
            self.config.policy.multiplier,
        )?;
        self.check_batch_size(instructions.len())?;
        let batches = plan_batches(&instructions, self.config.batch_size)?;

        info!(
            "Planned {} transfers totalling {} of {} in {} batches",
            instructions.len(),
            total,
            self.config.policy.permitted_total(),
            batches.len(),
        );

        Ok(Plan {
            allocations,
            batches,
            total,
            permitted: self.config.policy.permitted_total(),
            records: ingested.records.len(),
            dropped: ingested.dropped,
        })
    }

    /// Fail unless a full batch fits in one ledger transaction.
    ///
    /// Without a batch size everything goes into one transaction, so the
    /// transfer count itself is checked.
    fn check_batch_size(&self, transfers: usize) -> Result<()> {
        let batch_size = self.config.batch_size.unwrap_or(transfers);
        let limit = self
            .ledger
            .max_transfers(&self.config.gas)
            .map_err(DistributorError::Ledger)?;

        if batch_size > limit {
            return Err(DistributorError::BatchTooLarge { batch_size, limit });
        }
        Ok(())
    }

    /// Plan, then submit every batch in order.
    pub fn run(&self) -> Result<RunReport> {
        let plan = self.plan()?;
        let receipts = self.submit(&plan)?;
        Ok(RunReport { plan, receipts })
    }

    /// Submit the batches of an already verified plan.
    ///
    /// Stops at the first failure. There is no retry and no rollback.
    pub fn submit(&self, plan: &Plan) -> Result<Vec<BatchReceipt>> {
        let count = plan.batches.len();
        let mut receipts = Vec::with_capacity(count);

        for batch in &plan.batches {
            let submitted = receipts.len();
            info!("Batch {}/{}: {} transfers", batch.index + 1, count, batch.len());

            let receipt = self.submit_batch(batch, submitted).inspect_err(|e| {
                error!("{}", e);
            })?;
            info!("tx success, txHash is: {}", receipt.hash);
            receipts.push(receipt);
        }

        Ok(receipts)
    }

    fn submit_batch(&self, batch: &Batch, submitted: usize) -> Result<BatchReceipt> {
        let failed = |source: LedgerError| DistributorError::BatchFailed {
            index: batch.index,
            submitted,
            source,
        };

        let mut tx = self
            .ledger
            .build_multi_transfer(&self.config.gas, &batch.instructions)
            .map_err(failed)?;
        self.ledger.sign(&mut tx).map_err(failed)?;

        let dump = match &self.config.dump_dir {
            Some(dir) => {
                let raw = self.ledger.serialize(&tx).map_err(failed)?;
                let path = write_transaction_dump(dir, batch.index, &raw).map_err(|source| {
                    DistributorError::DumpFailed {
                        index: batch.index,
                        submitted,
                        source,
                    }
                })?;
                Some(path)
            }
            None => None,
        };

        let hash = self.ledger.submit(&tx).map_err(failed)?;

        Ok(BatchReceipt {
            index: batch.index,
            transfers: batch.len(),
            amount: batch.total(),
            hash,
            dump,
        })
    }
}
