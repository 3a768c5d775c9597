//! Audit artifacts written during a run
//!
//! - record file: one `address<TAB>amount` line per transfer, in order
//! - transaction dumps: hex of each signed batch, `transaction{index}.txt`

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use bonuscraft_core::TransferInstruction;

/// Write the `address<TAB>amount` ledger for `instructions`.
pub fn write_record_file(path: &Path, instructions: &[TransferInstruction]) -> std::io::Result<()> {
    ensure_parent(path)?;
    let mut w = BufWriter::new(File::create(path)?);
    for instruction in instructions {
        writeln!(w, "{}\t{}", instruction.to, instruction.amount)?;
    }
    w.flush()?;
    debug!("Wrote {} record lines to {}", instructions.len(), path.display());
    Ok(())
}

/// Path of the dump for batch `index` under `dir`
pub fn transaction_dump_path(dir: &Path, index: usize) -> PathBuf {
    dir.join(format!("transaction{}.txt", index))
}

/// Write the hex of a signed batch transaction. Returns the file path.
pub fn write_transaction_dump(dir: &Path, index: usize, raw: &[u8]) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = transaction_dump_path(dir, index);
    std::fs::write(&path, hex::encode(raw))?;
    debug!("Wrote {} byte transaction dump to {}", raw.len(), path.display());
    Ok(path)
}

fn ensure_parent(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent),
        _ => Ok(()),
    }
}
