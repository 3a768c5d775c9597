//! Proportional bonus allocation and the over-allocation safety check
//!
//! Each retained record earns `floor(value * bonus / peer_total)`. The
//! multiply is done in `u128` so `value` and `bonus` may both sit near
//! `u64::MAX`. Floor rounding keeps the sum of shares at or below the exact
//! proportional total.

use tracing::{debug, info};

use crate::{
    Address, AllowList, BonusError, ContributionRecord, PeerKey, PeerTotals, Result,
    TransferInstruction,
};

/// Parameters of one allocation run
#[derive(Debug, Clone)]
pub struct AllocationPolicy {
    /// Tokens available per distribution round
    pub bonus: u64,
    /// Restrict shares to these peers (None = every peer is eligible)
    pub allow_list: Option<AllowList>,
    /// Number of rounds the safety check allows for (`bonus * multiplier`)
    pub multiplier: u64,
    /// Drop instructions whose share rounds down to zero
    pub skip_zero_shares: bool,
}

impl AllocationPolicy {
    pub fn new(bonus: u64) -> Self {
        Self {
            bonus,
            allow_list: None,
            multiplier: 1,
            skip_zero_shares: false,
        }
    }

    pub fn with_allow_list(mut self, allow_list: AllowList) -> Self {
        self.allow_list = Some(allow_list);
        self
    }

    pub fn with_multiplier(mut self, multiplier: u64) -> Self {
        self.multiplier = multiplier;
        self
    }

    pub fn skip_zero_shares(mut self, skip: bool) -> Self {
        self.skip_zero_shares = skip;
        self
    }

    /// Upper bound on the distributed total
    pub fn permitted_total(&self) -> u128 {
        self.bonus as u128 * self.multiplier as u128
    }

    fn is_eligible(&self, peer: &str) -> bool {
        self.allow_list.as_ref().map_or(true, |list| list.contains(peer))
    }
}

/// A computed transfer together with the peer it was earned from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    pub peer: PeerKey,
    pub instruction: TransferInstruction,
}

/// `floor(value * bonus / total)`, or `None` when `total` is zero.
///
/// The result never exceeds `bonus` as long as `value <= total`, which the
/// ingester guarantees for every retained record. A share that does not fit
/// in u64 is a [`BonusError::ShareOverflow`].
pub fn proportional_share(value: u64, bonus: u64, total: u64) -> Result<Option<u64>> {
    if total == 0 {
        return Ok(None);
    }
    let share = value as u128 * bonus as u128 / total as u128;
    u64::try_from(share)
        .map(Some)
        .map_err(|_| BonusError::ShareOverflow { value, bonus, total })
}

/// Compute one transfer instruction per eligible record, in record order.
///
/// Records whose peer is not on the allow-list, or whose peer total is
/// missing or zero, produce nothing. An undecodable beneficiary address
/// aborts the whole allocation.
pub fn allocate(
    records: &[ContributionRecord],
    totals: &PeerTotals,
    policy: &AllocationPolicy,
    operator: Address,
) -> Result<Vec<Allocation>> {
    let mut allocations = Vec::with_capacity(records.len());
    let mut skipped = 0usize;

    for record in records {
        if !policy.is_eligible(&record.peer_pubkey) {
            skipped += 1;
            continue;
        }

        let total = totals.get(&record.peer_pubkey).unwrap_or(0);
        let Some(amount) = proportional_share(record.value, policy.bonus, total)? else {
            debug!("Peer {} has zero total, skipping", record.peer_pubkey);
            skipped += 1;
            continue;
        };

        if amount == 0 && policy.skip_zero_shares {
            skipped += 1;
            continue;
        }

        let to = Address::from_base58(&record.address)?;
        allocations.push(Allocation {
            peer: record.peer_pubkey.clone(),
            instruction: TransferInstruction {
                from: operator,
                to,
                amount,
            },
        });
    }

    info!(
        "Allocated {} transfers ({} records skipped)",
        allocations.len(),
        skipped,
    );
    Ok(allocations)
}

/// Sum every amount and reject the run if it exceeds `bonus * multiplier`.
///
/// Returns the distributed total on success.
pub fn verify_total(
    instructions: &[TransferInstruction],
    bonus: u64,
    multiplier: u64,
) -> Result<u128> {
    let total: u128 = instructions.iter().map(|i| i.amount as u128).sum();
    let permitted = bonus as u128 * multiplier as u128;

    if total > permitted {
        return Err(BonusError::OverAllocation { total, permitted });
    }

    debug!("Allocation total {} within permitted {}", total, permitted);
    Ok(total)
}
