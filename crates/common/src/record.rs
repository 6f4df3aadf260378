use serde::{Deserialize, Serialize};

use shareledger_errors::RecordError;
use shareledger_serde::{hex::ToHex, raw_or_b64, raw_or_hex};

use crate::digest::Digest;

/// Width of a [`ShareKey`] in bytes. Part of the committed tree context:
/// verifiers reject any key of a different width instead of inferring the
/// width from data.
pub const SHARE_KEY_WIDTH: usize = 32;

/// Width of an encoded [`ShareRecord`] in bytes: 8-byte little-endian score
/// followed by a 1-byte paid flag.
pub const SHARE_RECORD_WIDTH: usize = 9;

/// Identifies a miner in the share directory: the Sha256 hash of the miner's
/// spending-condition bytes. Unique per miner; never reused across miners.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShareKey(#[serde(with = "raw_or_hex")] [u8; SHARE_KEY_WIDTH]);

impl ShareKey {
    pub const fn new(bytes: [u8; SHARE_KEY_WIDTH]) -> Self {
        Self(bytes)
    }

    /// Parses a key from a byte slice, rejecting any width other than
    /// [`SHARE_KEY_WIDTH`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, RecordError> {
        let bytes: [u8; SHARE_KEY_WIDTH] =
            bytes.try_into().map_err(|_| RecordError::MalformedKey {
                expected: SHARE_KEY_WIDTH,
                actual: bytes.len(),
            })?;
        Ok(Self(bytes))
    }

    pub fn to_bytes(&self) -> [u8; SHARE_KEY_WIDTH] {
        self.0
    }
}

impl AsRef<[u8]> for ShareKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; SHARE_KEY_WIDTH]> for ShareKey {
    fn from(bytes: [u8; SHARE_KEY_WIDTH]) -> Self {
        Self(bytes)
    }
}

impl std::fmt::Display for ShareKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_hex())
    }
}

/// The opaque encoding of a miner's spending condition (public key or
/// script). The ledger never interprets these bytes; it only hashes them to
/// derive the miner's [`ShareKey`] and hands them back to the settlement
/// layer for payout construction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct SpendingCondition(#[serde(with = "raw_or_b64")] Vec<u8>);

impl SpendingCondition {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Derives the directory key committed to this condition.
    pub fn share_key(&self) -> ShareKey {
        ShareKey(Digest::hash(&self.0).to_bytes())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for SpendingCondition {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

/// A miner's accumulated share score and payout state within one epoch.
///
/// Once `paid` is set the record is terminal for the epoch: no further
/// transition of this key is valid until a new epoch's directory is created.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ShareRecord {
    pub score: u64,
    pub paid: bool,
}

impl ShareRecord {
    /// A freshly posted, unpaid record.
    pub const fn posted(score: u64) -> Self {
        Self { score, paid: false }
    }

    /// The paid counterpart of this record. Score is carried over unchanged;
    /// a payout transition may flip the flag but never touch the score.
    pub const fn mark_paid(self) -> Self {
        Self {
            score: self.score,
            paid: true,
        }
    }

    /// Canonical fixed-width encoding stored as the tree leaf value.
    pub fn to_bytes(&self) -> [u8; SHARE_RECORD_WIDTH] {
        let mut buf = [0u8; SHARE_RECORD_WIDTH];
        buf[..8].copy_from_slice(&self.score.to_le_bytes());
        buf[8] = u8::from(self.paid);
        buf
    }

    /// Decodes a record, rejecting wrong widths and any paid flag outside
    /// {0, 1} before the value is used anywhere.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, RecordError> {
        if bytes.len() != SHARE_RECORD_WIDTH {
            return Err(RecordError::MalformedRecord {
                expected: SHARE_RECORD_WIDTH,
                actual: bytes.len(),
            });
        }

        let mut score_bytes = [0u8; 8];
        score_bytes.copy_from_slice(&bytes[..8]);
        let paid = match bytes[8] {
            0 => false,
            1 => true,
            flag => return Err(RecordError::InvalidPaidFlag(flag)),
        };

        Ok(Self {
            score: u64::from_le_bytes(score_bytes),
            paid,
        })
    }
}
