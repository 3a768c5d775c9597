//! Wallet files and operator accounts

use std::fmt;
use std::path::Path;

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Nonce,
};
use ed25519_dalek::SigningKey;
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::info;

use bonuscraft_core::Address;

use crate::{KeystoreError, Result};

/// Current encrypted wallet format version
pub const WALLET_VERSION: u32 = 2;

/// PBKDF2 rounds for newly sealed wallets
pub const DEFAULT_KDF_ROUNDS: u32 = 600_000;

const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 12;

/// Operator account: ed25519 secret key and its address
#[derive(Clone)]
pub struct Account {
    secret: [u8; 32],
    address: Address,
}

impl Account {
    /// Generate a new random account
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut OsRng);
        Self::from_secret(signing_key.to_bytes())
    }

    pub fn from_secret(secret: [u8; 32]) -> Self {
        let address = Address::new(SigningKey::from_bytes(&secret).verifying_key().to_bytes());
        Self { secret, address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn secret_bytes(&self) -> &[u8; 32] {
        &self.secret
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("address", &self.address.to_base58())
            .finish_non_exhaustive()
    }
}

/// Password-encrypted wallet as stored on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletFile {
    pub version: u32,
    /// Base58 address of the sealed key
    pub address: String,
    /// 16-byte PBKDF2 salt (hex)
    pub salt: String,
    /// PBKDF2-HMAC-SHA256 iterations
    pub rounds: u32,
    /// 12-byte ChaCha20-Poly1305 nonce (hex)
    pub nonce: String,
    /// Sealed 32-byte secret key (hex)
    pub ciphertext: String,
}

impl WalletFile {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| KeystoreError::Format(e.to_string()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| KeystoreError::Format(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Saved wallet {} to {}", self.address, path.display());
        Ok(())
    }

    /// Open the wallet with `password`.
    pub fn decrypt(&self, password: &str) -> Result<Account> {
        if self.version != WALLET_VERSION {
            return Err(KeystoreError::Format(format!(
                "unsupported wallet version {}",
                self.version
            )));
        }

        if self.rounds == 0 {
            return Err(KeystoreError::Format("rounds must be positive".to_string()));
        }
        let salt = hex::decode(&self.salt)
            .map_err(|e| KeystoreError::Format(format!("salt: {}", e)))?;
        if salt.len() != SALT_LEN {
            return Err(KeystoreError::Format(format!("salt must be {} bytes", SALT_LEN)));
        }
        let nonce_bytes = hex::decode(&self.nonce)
            .map_err(|e| KeystoreError::Format(format!("nonce: {}", e)))?;
        if nonce_bytes.len() != NONCE_LEN {
            return Err(KeystoreError::Format(format!("nonce must be {} bytes", NONCE_LEN)));
        }
        let ciphertext = hex::decode(&self.ciphertext)
            .map_err(|e| KeystoreError::Format(format!("ciphertext: {}", e)))?;

        let plaintext = cipher(password, &salt, self.rounds)?
            .decrypt(Nonce::from_slice(&nonce_bytes), ciphertext.as_ref())
            .map_err(|_| KeystoreError::WrongPassword)?;
        let secret: [u8; 32] = plaintext
            .try_into()
            .map_err(|_| KeystoreError::InvalidKey("secret must be 32 bytes".to_string()))?;

        let account = Account::from_secret(secret);
        check_address(&self.address, &account)?;
        Ok(account)
    }
}

fn cipher(password: &str, salt: &[u8], rounds: u32) -> Result<ChaCha20Poly1305> {
    let mut key = [0u8; 32];
    pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, rounds, &mut key);
    ChaCha20Poly1305::new_from_slice(&key).map_err(|e| KeystoreError::InvalidKey(e.to_string()))
}

fn check_address(expected: &str, account: &Account) -> Result<()> {
    let derived = account.address().to_base58();
    if derived != expected {
        return Err(KeystoreError::AddressMismatch {
            expected: expected.to_string(),
            derived,
        });
    }
    Ok(())
}

/// Seal `account` under `password` with [`DEFAULT_KDF_ROUNDS`].
pub fn encrypt_wallet(account: &Account, password: &str) -> Result<WalletFile> {
    encrypt_wallet_with_rounds(account, password, DEFAULT_KDF_ROUNDS)
}

/// Seal `account` under `password` with an explicit PBKDF2 round count.
pub fn encrypt_wallet_with_rounds(
    account: &Account,
    password: &str,
    rounds: u32,
) -> Result<WalletFile> {
    if rounds == 0 {
        return Err(KeystoreError::Format("rounds must be positive".to_string()));
    }

    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    let mut nonce_bytes = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce_bytes);

    let ciphertext = cipher(password, &salt, rounds)?
        .encrypt(Nonce::from_slice(&nonce_bytes), account.secret_bytes().as_ref())
        .map_err(|_| KeystoreError::InvalidKey("encryption failed".to_string()))?;

    Ok(WalletFile {
        version: WALLET_VERSION,
        address: account.address().to_base58(),
        salt: hex::encode(salt),
        rounds,
        nonce: hex::encode(nonce_bytes),
        ciphertext: hex::encode(ciphertext),
    })
}

/// Load the operator account from `path`.
///
/// Accepts an encrypted [`WalletFile`] or a plain Solana CLI keypair array.
pub fn resolve_account(path: &Path, password: &str) -> Result<Account> {
    let content = std::fs::read_to_string(path)?;
    let value: serde_json::Value =
        serde_json::from_str(&content).map_err(|e| KeystoreError::Format(e.to_string()))?;

    let account = if value.is_array() {
        let bytes: Vec<u8> =
            serde_json::from_value(value).map_err(|e| KeystoreError::Format(e.to_string()))?;
        from_keypair_bytes(&bytes)?
    } else {
        let wallet: WalletFile =
            serde_json::from_value(value).map_err(|e| KeystoreError::Format(e.to_string()))?;
        wallet.decrypt(password)?
    };

    info!("Loaded operator account {}", account.address());
    Ok(account)
}

/// Solana CLI layout: 32-byte secret followed by the 32-byte public key
fn from_keypair_bytes(bytes: &[u8]) -> Result<Account> {
    if bytes.len() != 64 {
        return Err(KeystoreError::InvalidKey(format!(
            "keypair must be 64 bytes, got {}",
            bytes.len()
        )));
    }

    let mut secret = [0u8; 32];
    secret.copy_from_slice(&bytes[..32]);
    let account = Account::from_secret(secret);

    let stored = Address::new(
        bytes[32..]
            .try_into()
            .map_err(|_| KeystoreError::InvalidKey("public key must be 32 bytes".to_string()))?,
    );
    check_address(&stored.to_base58(), &account)?;
    Ok(account)
}
