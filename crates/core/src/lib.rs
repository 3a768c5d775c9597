//! BonusCraft Core
//!
//! Data model and allocation logic for splitting a bonus pool across peers
//! in proportion to their recorded contributions.

mod allocation;
mod batch;
mod error;
mod ingest;
mod types;

pub use allocation::*;
pub use batch::*;
pub use error::*;
pub use ingest::*;
pub use types::*;
