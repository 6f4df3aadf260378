use anyhow::{Result, bail};
use auto_impl::auto_impl;
use jmt::storage::TreeReader;
use shareledger_common::{
    digest::Digest,
    record::{ShareKey, ShareRecord},
};
use shareledger_errors::{LedgerError, TreeError};
use shareledger_storage::Database;

use crate::{
    key_hash,
    proofs::{BatchUpdateProof, LookupProof},
    share_tree::ShareDirectoryTree,
};

/// The data-free side of the ledger: confirms, from a proof alone, that
/// applying `updates` to the directory committed by `committed_digest`
/// yields the digest the proof claims, and returns that digest. This is the
/// check a verifier without the directory runs; it never touches a store.
pub fn verify_batch(
    committed_digest: Digest,
    updates: &[(ShareKey, Option<ShareRecord>)],
    proof: &BatchUpdateProof,
) -> Result<Digest, LedgerError> {
    let (next_digest, _) = proof.verify_from(committed_digest, updates)?;
    Ok(next_digest)
}

/// The narrow surface the rest of the system needs from the share
/// directory: the digest and proof-carrying batch operations for the
/// settlement path, plus the single-key mutations and snapshot export used
/// by off-chain tooling to prepare the next batch. Pure composition; all
/// logic lives in the tree and its proofs.
#[auto_impl(&mut, Box)]
pub trait ShareLedger: Send + Sync {
    fn commitment(&self) -> Result<Digest>;

    fn get_with_proof(
        &self,
        keys: &[ShareKey],
    ) -> Result<(Vec<Option<ShareRecord>>, LookupProof)>;

    fn apply_batch(
        &mut self,
        updates: Vec<(ShareKey, Option<ShareRecord>)>,
    ) -> Result<BatchUpdateProof>;

    /// Inserts a record under a key that must not exist yet.
    fn insert(&mut self, key: ShareKey, record: ShareRecord) -> Result<BatchUpdateProof>;

    /// Replaces the record under a key that must already exist.
    fn update(&mut self, key: ShareKey, record: ShareRecord) -> Result<BatchUpdateProof>;

    /// Removes the record under a key that must already exist.
    fn delete(&mut self, key: ShareKey) -> Result<BatchUpdateProof>;

    /// Exports the directory's full key-value content, sorted by key. Not
    /// used on the verification path; feeds audits and proof preparation.
    fn snapshot(&self) -> Result<Vec<(ShareKey, ShareRecord)>>;
}

impl<S> ShareLedger for ShareDirectoryTree<S>
where
    S: Database,
{
    fn commitment(&self) -> Result<Digest> {
        ShareDirectoryTree::commitment(self)
    }

    fn get_with_proof(
        &self,
        keys: &[ShareKey],
    ) -> Result<(Vec<Option<ShareRecord>>, LookupProof)> {
        ShareDirectoryTree::get_with_proof(self, keys)
    }

    fn apply_batch(
        &mut self,
        updates: Vec<(ShareKey, Option<ShareRecord>)>,
    ) -> Result<BatchUpdateProof> {
        let proof = ShareDirectoryTree::apply_batch(self, updates)?;
        let version = self.version();
        self.store().set_version(&version)?;
        self.store().set_commitment(&version, &proof.new_root)?;
        Ok(proof)
    }

    fn insert(&mut self, key: ShareKey, record: ShareRecord) -> Result<BatchUpdateProof> {
        if self.store().get_value_option(self.version(), key_hash(&key))?.is_some() {
            bail!(TreeError::DuplicateKey(key.to_string()));
        }
        ShareLedger::apply_batch(self, vec![(key, Some(record))])
    }

    fn update(&mut self, key: ShareKey, record: ShareRecord) -> Result<BatchUpdateProof> {
        if self.store().get_value_option(self.version(), key_hash(&key))?.is_none() {
            bail!(TreeError::UnknownKey(key.to_string()));
        }
        ShareLedger::apply_batch(self, vec![(key, Some(record))])
    }

    fn delete(&mut self, key: ShareKey) -> Result<BatchUpdateProof> {
        ShareLedger::apply_batch(self, vec![(key, None)])
    }

    fn snapshot(&self) -> Result<Vec<(ShareKey, ShareRecord)>> {
        let mut entries = Vec::new();
        for (stored_key, value) in self.store().latest_value_set(self.version())? {
            let key = ShareKey::from_bytes(&stored_key.0)?;
            let record = ShareRecord::from_bytes(&value)?;
            entries.push((key, record));
        }
        entries.sort_by_key(|(key, _)| *key);
        Ok(entries)
    }
}
