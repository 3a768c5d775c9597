//! BonusCraft Keystore
//!
//! Loads the operator account from a wallet file.
//!
//! ## Formats
//!
//! - Encrypted wallet (JSON): the ed25519 secret key sealed with
//!   ChaCha20-Poly1305 under a PBKDF2-HMAC-SHA256 key. The random salt and
//!   round count are stored next to the ciphertext, plus the expected address.
//! - Solana CLI keypair (JSON array of 64 bytes). Not encrypted, the
//!   password is ignored.

mod wallet;

pub use wallet::{
    encrypt_wallet, encrypt_wallet_with_rounds, resolve_account, Account, WalletFile,
    DEFAULT_KDF_ROUNDS, WALLET_VERSION,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum KeystoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unrecognized wallet format: {0}")]
    Format(String),

    #[error("Wrong password")]
    WrongPassword,

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Wallet address mismatch: expected {expected}, derived {derived}")]
    AddressMismatch { expected: String, derived: String },
}

pub type Result<T> = std::result::Result<T, KeystoreError>;
