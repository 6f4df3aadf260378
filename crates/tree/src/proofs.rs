use jmt::{
    OwnedValue, RootHash,
    proof::{SparseMerkleProof, UpdateMerkleProof},
};
use serde::{Deserialize, Serialize};
use shareledger_common::{
    digest::Digest,
    record::{ShareKey, ShareRecord},
};
use shareledger_errors::{LedgerError, ProofError};

use crate::{hasher::ShareTreeHasher, key_hash};

/// One key's slot in a [`LookupProof`]: the value the directory held (or
/// `None`) and the sparse-merkle path authenticating it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupEntry {
    pub key: ShareKey,
    pub record: Option<ShareRecord>,
    pub proof: SparseMerkleProof<ShareTreeHasher>,
}

/// Joint proof for a batch lookup: every requested key's (non)membership
/// against one digest. Verification needs nothing but the proof itself and
/// the digest the verifier already trusts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupProof {
    pub root: Digest,
    pub entries: Vec<LookupEntry>,
}

impl LookupProof {
    /// Checks every entry against `expected_root` and returns the
    /// authenticated values, `None` marking proven absence.
    pub fn verify(
        &self,
        expected_root: Digest,
    ) -> Result<Vec<Option<ShareRecord>>, LedgerError> {
        if self.root != expected_root {
            return Err(ProofError::ReplayedProof {
                committed_digest: expected_root.to_string(),
                proof_digest: self.root.to_string(),
            }
            .into());
        }

        let root = RootHash(self.root.0);
        let mut records = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            match &entry.record {
                Some(record) => entry
                    .proof
                    .verify_existence(root, key_hash(&entry.key), record.to_bytes())
                    .map_err(|e| ProofError::VerificationFailed(e.to_string()))?,
                None => entry
                    .proof
                    .verify_nonexistence(root, key_hash(&entry.key))
                    .map_err(|e| ProofError::VerificationFailed(e.to_string()))?,
            }
            records.push(entry.record);
        }
        Ok(records)
    }

    pub fn keys(&self) -> impl Iterator<Item = &ShareKey> {
        self.entries.iter().map(|entry| &entry.key)
    }
}

/// One update slot in a [`BatchUpdateProof`]: the key, the record being
/// superseded (or `None` for an insert), and the record written (or `None`
/// for a delete).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateEntry {
    pub key: ShareKey,
    pub old_record: Option<ShareRecord>,
    pub new_record: Option<ShareRecord>,
}

/// Proof of one atomic batch transition, `old_root` to `new_root`. Batching
/// the lookup side and the update side into a single artifact keeps the
/// proof compact and leaves no gap between reading old values and
/// committing new ones: both are authenticated against the same roots.
///
/// A proof binds to the exact digest it was generated from; presenting it
/// against any other prior digest fails verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchUpdateProof {
    pub old_root: Digest,
    pub new_root: Digest,
    /// Per-key transition, in batch order.
    pub entries: Vec<UpdateEntry>,
    /// Old-state (non)membership proof per entry, same order, all against
    /// `old_root`.
    pub lookups: Vec<SparseMerkleProof<ShareTreeHasher>>,
    /// Tree-level proof that writing the new value set to `old_root` yields
    /// exactly `new_root`.
    pub update_proof: UpdateMerkleProof<ShareTreeHasher>,
}

impl BatchUpdateProof {
    /// Verifies the transition this proof describes, with no access to the
    /// directory. Authenticates every superseded value against `old_root`,
    /// then checks that applying the new value set yields `new_root`.
    ///
    /// Returns the authenticated old records, which are the only trusted
    /// source of "current score" for a verifier: claimed new values prove
    /// nothing about what was stored.
    pub fn verify(&self) -> Result<Vec<Option<ShareRecord>>, LedgerError> {
        if self.entries.is_empty() {
            return Err(ProofError::VerificationFailed("proof covers no updates".to_string()).into());
        }
        if self.entries.len() != self.lookups.len() {
            return Err(ProofError::VerificationFailed(format!(
                "{} entries but {} old-state proofs",
                self.entries.len(),
                self.lookups.len()
            ))
            .into());
        }

        let old_root = RootHash(self.old_root.0);
        let mut old_records = Vec::with_capacity(self.entries.len());
        for (entry, lookup) in self.entries.iter().zip(self.lookups.iter()) {
            match &entry.old_record {
                Some(record) => lookup
                    .verify_existence(old_root, key_hash(&entry.key), record.to_bytes())
                    .map_err(|e| ProofError::VerificationFailed(e.to_string()))?,
                None => lookup
                    .verify_nonexistence(old_root, key_hash(&entry.key))
                    .map_err(|e| ProofError::VerificationFailed(e.to_string()))?,
            }
            old_records.push(entry.old_record);
        }

        let value_set: Vec<(jmt::KeyHash, Option<OwnedValue>)> = self
            .entries
            .iter()
            .map(|entry| {
                (
                    key_hash(&entry.key),
                    entry.new_record.map(|record| record.to_bytes().to_vec()),
                )
            })
            .collect();

        self.update_proof
            .clone()
            .verify_update(old_root, RootHash(self.new_root.0), value_set)
            .map_err(|e| ProofError::VerificationFailed(e.to_string()))?;

        Ok(old_records)
    }

    /// Full batch verification as run by a verifier holding only a digest:
    /// rejects proofs generated against any digest other than
    /// `committed_digest`, requires the claimed updates to match the proven
    /// transition position by position, and on success returns the resulting
    /// digest together with the authenticated old records.
    pub fn verify_from(
        &self,
        committed_digest: Digest,
        claimed: &[(ShareKey, Option<ShareRecord>)],
    ) -> Result<(Digest, Vec<Option<ShareRecord>>), LedgerError> {
        if self.old_root != committed_digest {
            return Err(ProofError::ReplayedProof {
                committed_digest: committed_digest.to_string(),
                proof_digest: self.old_root.to_string(),
            }
            .into());
        }

        if claimed.len() != self.entries.len() {
            return Err(ProofError::VerificationFailed(format!(
                "{} claimed updates but proof covers {}",
                claimed.len(),
                self.entries.len()
            ))
            .into());
        }
        for (index, ((key, new_record), entry)) in
            claimed.iter().zip(self.entries.iter()).enumerate()
        {
            if *key != entry.key || *new_record != entry.new_record {
                return Err(ProofError::ClaimMismatch(index).into());
            }
        }

        let old_records = self.verify()?;
        Ok((self.new_root, old_records))
    }

    pub fn keys(&self) -> impl Iterator<Item = &ShareKey> {
        self.entries.iter().map(|entry| &entry.key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
