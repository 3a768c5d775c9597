use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::BonusError;

/// Peer public key as it appears in the contribution log (hex string)
pub type PeerKey = String;

/// 32-byte on-chain account address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address(pub [u8; 32]);

impl Address {
    pub const LEN: usize = 32;

    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Decode a base58 address
    pub fn from_base58(s: &str) -> Result<Self, BonusError> {
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|_| BonusError::InvalidAddress(s.to_string()))?;
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| BonusError::InvalidAddress(s.to_string()))?;
        Ok(Self(bytes))
    }

    pub fn to_base58(&self) -> String {
        bs58::encode(self.0).into_string()
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base58())
    }
}

impl FromStr for Address {
    type Err = BonusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_base58(s)
    }
}

impl From<[u8; 32]> for Address {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

/// One line of the contribution log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributionRecord {
    /// Public key of the peer the contribution was made to
    pub peer_pubkey: PeerKey,
    /// Beneficiary address (base58)
    pub address: String,
    /// Contribution value
    pub value: u64,
}

/// Accumulated non-zero contribution per peer.
///
/// Built once by the ingester and only read afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeerTotals {
    totals: HashMap<PeerKey, u64>,
}

impl PeerTotals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `value` to the peer's running total.
    pub(crate) fn accumulate(&mut self, peer: &str, value: u64) -> Result<(), BonusError> {
        let total = self.totals.entry(peer.to_string()).or_insert(0);
        *total = total
            .checked_add(value)
            .ok_or_else(|| BonusError::TotalOverflow(peer.to_string()))?;
        Ok(())
    }

    pub fn get(&self, peer: &str) -> Option<u64> {
        self.totals.get(peer).copied()
    }

    /// Number of distinct peers with a non-zero total
    pub fn len(&self) -> usize {
        self.totals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PeerKey, &u64)> {
        self.totals.iter()
    }
}

impl FromIterator<(PeerKey, u64)> for PeerTotals {
    fn from_iter<I: IntoIterator<Item = (PeerKey, u64)>>(iter: I) -> Self {
        Self {
            totals: iter.into_iter().collect(),
        }
    }
}

/// A transfer from the operator's account to one beneficiary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferInstruction {
    pub from: Address,
    pub to: Address,
    pub amount: u64,
}

/// Set of peer keys eligible for a bonus share
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowList {
    peers: HashSet<PeerKey>,
}

impl AllowList {
    pub fn contains(&self, peer: &str) -> bool {
        self.peers.contains(peer)
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}

impl<S: Into<PeerKey>> FromIterator<S> for AllowList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            peers: iter.into_iter().map(Into::into).collect(),
        }
    }
}
