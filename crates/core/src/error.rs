use thiserror::Error;

#[derive(Error, Debug)]
pub enum BonusError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed record at line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Contribution total overflow for peer {0}")]
    TotalOverflow(String),

    #[error("Sum of split is more than total bonus: {total} > {permitted}")]
    OverAllocation { total: u128, permitted: u128 },

    #[error("Share of {value} in {total} of bonus {bonus} does not fit in u64")]
    ShareOverflow { value: u64, bonus: u64, total: u64 },

    #[error("Invalid batch size: {0}")]
    InvalidBatchSize(usize),
}

pub type Result<T> = std::result::Result<T, BonusError>;
