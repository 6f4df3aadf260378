use std::{collections::HashSet, sync::Arc};

use anyhow::{Result, bail};
use jmt::{
    JellyfishMerkleTree, KeyHash, OwnedValue, RootHash, Version,
    storage::{NodeBatch, TreeReader, TreeUpdateBatch, TreeWriter},
};
use shareledger_common::{
    digest::Digest,
    record::{ShareKey, ShareRecord},
};
use shareledger_errors::TreeError;
use tracing::debug;

use crate::{
    hasher::ShareTreeHasher,
    key_hash,
    proofs::{BatchUpdateProof, LookupEntry, LookupProof, UpdateEntry},
};

pub const SPARSE_MERKLE_PLACEHOLDER_KEY: KeyHash =
    KeyHash(*b"SPARSE_MERKLE_PLACEHOLDER_HASH__");

/// The authoritative share directory: a Jellyfish Merkle tree mapping
/// [`ShareKey`]s to encoded [`ShareRecord`]s, committed to by a 32-byte
/// digest. Single writer; every mutation goes through [`Self::apply_batch`]
/// so the in-memory state and the digest can never diverge.
pub struct ShareDirectoryTree<S>
where
    S: TreeReader + TreeWriter,
{
    db: Arc<S>,
    version: Version,
    pending_batch: Option<NodeBatch>,
}

impl<S> ShareDirectoryTree<S>
where
    S: TreeReader + TreeWriter,
{
    /// Creates an empty directory, writing the sparse-merkle placeholder so
    /// the empty tree has a well-defined root.
    pub fn new(store: Arc<S>) -> Self {
        let tree = Self {
            db: store,
            version: 0,
            pending_batch: None,
        };
        let (_, batch) = tree
            .view()
            .put_value_set(vec![(SPARSE_MERKLE_PLACEHOLDER_KEY, None)], 0)
            .unwrap();
        tree.db.write_node_batch(&batch.node_batch).unwrap();
        tree
    }

    /// Reopens a directory over an existing node store at `version`.
    pub fn load(store: Arc<S>, version: Version) -> Self {
        if version == 0 {
            return Self::new(store);
        }
        Self {
            db: store,
            version,
            pending_batch: None,
        }
    }

    pub(crate) fn view(&self) -> JellyfishMerkleTree<'_, S, ShareTreeHasher> {
        JellyfishMerkleTree::new(self.db.as_ref())
    }

    pub fn store(&self) -> &S {
        self.db.as_ref()
    }

    pub const fn version(&self) -> Version {
        self.version
    }

    /// The digest committing to the directory's full content.
    pub fn commitment(&self) -> Result<Digest> {
        let root = self.current_root()?;
        Ok(Digest(root.0))
    }

    pub fn current_root(&self) -> Result<RootHash> {
        self.view()
            .get_root_hash(self.version)
            .map_err(|e| TreeError::Uninitialized(e.to_string()).into())
    }

    fn queue_batch(&mut self, batch: TreeUpdateBatch) {
        match self.pending_batch {
            Some(ref mut pending_batch) => pending_batch.merge(batch.node_batch),
            None => self.pending_batch = Some(batch.node_batch),
        }
    }

    fn write_batch(&mut self) -> Result<()> {
        if let Some(batch) = self.pending_batch.take() {
            self.db.write_node_batch(&batch)?;
            self.version += 1;
        }
        Ok(())
    }

    /// Looks up a set of keys, returning the stored record (or `None` for
    /// absent keys) per key plus one [`LookupProof`] jointly covering the
    /// whole set against the current digest.
    pub fn get_with_proof(
        &self,
        keys: &[ShareKey],
    ) -> Result<(Vec<Option<ShareRecord>>, LookupProof)> {
        let root = self.commitment()?;
        let view = self.view();

        let mut records = Vec::with_capacity(keys.len());
        let mut entries = Vec::with_capacity(keys.len());
        for key in keys {
            let (value, proof) = view.get_with_proof(key_hash(key), self.version)?;
            let record = value.as_deref().map(ShareRecord::from_bytes).transpose()?;
            records.push(record);
            entries.push(LookupEntry {
                key: *key,
                record,
                proof,
            });
        }

        Ok((records, LookupProof { root, entries }))
    }

    /// Atomically applies an ordered batch of inserts, updates, and deletes
    /// (`None` deletes). Either the whole batch lands and the digest
    /// advances, or nothing is written: every precondition is checked before
    /// a single node goes to the store.
    ///
    /// The returned [`BatchUpdateProof`] lets a third party verify the exact
    /// transition, old values included, without holding the directory.
    pub fn apply_batch(
        &mut self,
        updates: Vec<(ShareKey, Option<ShareRecord>)>,
    ) -> Result<BatchUpdateProof> {
        if updates.is_empty() {
            bail!(TreeError::EmptyBatch);
        }

        let mut seen = HashSet::with_capacity(updates.len());
        for (key, _) in &updates {
            if !seen.insert(*key) {
                bail!(TreeError::DuplicateKey(key.to_string()));
            }
        }

        let old_root = self.commitment()?;

        let mut entries = Vec::with_capacity(updates.len());
        let mut lookups = Vec::with_capacity(updates.len());
        {
            let view = self.view();
            for (key, new_record) in &updates {
                let (old_value, proof) = view.get_with_proof(key_hash(key), self.version)?;
                let old_record = old_value.as_deref().map(ShareRecord::from_bytes).transpose()?;
                if old_record.is_none() && new_record.is_none() {
                    bail!(TreeError::DeleteNonexistent(key.to_string()));
                }
                entries.push(UpdateEntry {
                    key: *key,
                    old_record,
                    new_record: *new_record,
                });
                lookups.push(proof);
            }
        }

        let value_set: Vec<(KeyHash, Option<OwnedValue>)> = entries
            .iter()
            .map(|entry| {
                (
                    key_hash(&entry.key),
                    entry.new_record.map(|record| record.to_bytes().to_vec()),
                )
            })
            .collect();

        let (new_root, update_proof, tree_update_batch) =
            self.view().put_value_set_with_proof(value_set, self.version + 1)?;
        self.queue_batch(tree_update_batch);
        self.write_batch()?;

        let new_root = Digest(new_root.0);
        debug!(
            "applied batch of {} updates, digest {} -> {}",
            entries.len(),
            old_root,
            new_root
        );

        Ok(BatchUpdateProof {
            old_root,
            new_root,
            entries,
            lookups,
            update_proof,
        })
    }
}
