//! Batch planning
//!
//! Splits the instruction sequence into bounded transactions. Batches keep
//! the original order and only the last one may be short.

use crate::{BonusError, Result, TransferInstruction};

/// Transfers per transaction unless configured otherwise
pub const DEFAULT_BATCH_SIZE: usize = 500;

/// A group of instructions submitted as one transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    /// Position of this batch in the plan (0-based)
    pub index: usize,
    pub instructions: Vec<TransferInstruction>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Sum of amounts in this batch
    pub fn total(&self) -> u128 {
        self.instructions.iter().map(|i| i.amount as u128).sum()
    }
}

/// Partition `instructions` into batches of at most `batch_size`.
///
/// `None` puts everything in a single batch. No instructions means no
/// batches at all.
pub fn plan_batches(
    instructions: &[TransferInstruction],
    batch_size: Option<usize>,
) -> Result<Vec<Batch>> {
    if instructions.is_empty() {
        return Ok(Vec::new());
    }

    let size = match batch_size {
        Some(0) => return Err(BonusError::InvalidBatchSize(0)),
        Some(size) => size,
        None => instructions.len(),
    };

    Ok(instructions
        .chunks(size)
        .enumerate()
        .map(|(index, chunk)| Batch {
            index,
            instructions: chunk.to_vec(),
        })
        .collect())
}
