//! Contribution log ingestion
//!
//! The log is newline-delimited JSON, one [`ContributionRecord`] per line.
//! Zero-value records are dropped: they never reach the record list and
//! never contribute to a peer's total.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::{debug, info};

use crate::{BonusError, ContributionRecord, PeerTotals, Result};

/// Records retained from the log plus the per-peer totals built from them
#[derive(Debug, Clone, Default)]
pub struct IngestedRecords {
    /// Non-zero records in file order
    pub records: Vec<ContributionRecord>,
    /// Sum of retained values per peer
    pub totals: PeerTotals,
    /// Number of zero-value records that were dropped
    pub dropped: usize,
}

impl IngestedRecords {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Parse a contribution log from any buffered reader.
///
/// Every line must hold one record. The first malformed or blank line aborts
/// with [`BonusError::Parse`] and nothing read before it is kept. A single
/// trailing newline does not count as a line.
pub fn parse_records<R: BufRead>(reader: R) -> Result<IngestedRecords> {
    let mut ingested = IngestedRecords::default();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let record: ContributionRecord = serde_json::from_str(&line)
            .map_err(|source| BonusError::Parse { line: idx + 1, source })?;

        if record.value == 0 {
            debug!("Dropping zero-value record for peer {}", record.peer_pubkey);
            ingested.dropped += 1;
            continue;
        }

        ingested.totals.accumulate(&record.peer_pubkey, record.value)?;
        ingested.records.push(record);
    }

    info!(
        "Ingested {} records ({} zero-value dropped) across {} peers",
        ingested.records.len(),
        ingested.dropped,
        ingested.totals.len(),
    );
    Ok(ingested)
}

/// Load and parse the contribution log at `path`.
pub fn load_records(path: &Path) -> Result<IngestedRecords> {
    let file = File::open(path)?;
    info!("Reading contribution log from {}", path.display());
    parse_records(BufReader::new(file))
}
