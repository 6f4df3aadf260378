use anyhow::Result;
use jmt::{
    KeyHash, OwnedValue, Version,
    storage::{LeafNode, Node, NodeBatch, NodeKey, TreeReader, TreeWriter},
};
use shareledger_common::digest::Digest;
use shareledger_errors::DatabaseError;
use std::{
    collections::{HashMap, hash_map::Entry},
    sync::{Arc, Mutex},
};

use crate::database::Database;

/// Non-durable store for tests and single-process tooling. Values are kept
/// per version with deletions recorded as `None`, so historical reads below
/// a deletion still resolve.
pub struct InMemoryDatabase {
    nodes: Arc<Mutex<HashMap<NodeKey, Node>>>,
    values: Arc<Mutex<HashMap<(Version, KeyHash), Option<OwnedValue>>>>,
    commitments: Arc<Mutex<HashMap<Version, Digest>>>,
    version: Arc<Mutex<Option<Version>>>,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        InMemoryDatabase {
            nodes: Arc::new(Mutex::new(HashMap::new())),
            values: Arc::new(Mutex::new(HashMap::new())),
            commitments: Arc::new(Mutex::new(HashMap::new())),
            version: Arc::new(Mutex::new(None)),
        }
    }
}

impl Default for InMemoryDatabase {
    fn default() -> Self {
        InMemoryDatabase::new()
    }
}

impl TreeReader for InMemoryDatabase {
    fn get_node_option(&self, node_key: &NodeKey) -> Result<Option<Node>> {
        Ok(self.nodes.lock().unwrap().get(node_key).cloned())
    }

    fn get_rightmost_leaf(&self) -> Result<Option<(NodeKey, LeafNode)>> {
        unimplemented!("tree restoration from snapshot is unimplemented")
    }

    fn get_value_option(
        &self,
        max_version: Version,
        key_hash: KeyHash,
    ) -> Result<Option<OwnedValue>> {
        let values = self.values.lock().unwrap();
        Ok(values
            .iter()
            .filter(|((version, hash), _)| *version <= max_version && *hash == key_hash)
            .max_by_key(|((version, _), _)| *version)
            .and_then(|(_, value)| value.clone()))
    }
}

impl TreeWriter for InMemoryDatabase {
    fn write_node_batch(&self, node_batch: &NodeBatch) -> Result<()> {
        let mut nodes = self.nodes.lock().unwrap();
        let mut values = self.values.lock().unwrap();

        for (node_key, node) in node_batch.nodes() {
            nodes.insert(node_key.clone(), node.clone());
        }

        for ((version, key_hash), value) in node_batch.values() {
            values.insert((*version, *key_hash), value.clone());
        }

        Ok(())
    }
}

impl Database for InMemoryDatabase {
    fn get_commitment(&self, version: &Version) -> Result<Digest> {
        self.commitments.lock().unwrap().get(version).cloned().ok_or_else(|| {
            DatabaseError::NotFoundError(format!("commitment for version {}", version)).into()
        })
    }

    fn set_commitment(&self, version: &Version, commitment: &Digest) -> Result<()> {
        self.commitments.lock().unwrap().insert(*version, *commitment);
        Ok(())
    }

    fn get_version(&self) -> Result<Version> {
        self.version
            .lock()
            .unwrap()
            .ok_or_else(|| DatabaseError::NotFoundError("current version".to_string()).into())
    }

    fn set_version(&self, version: &Version) -> Result<()> {
        *self.version.lock().unwrap() = Some(*version);
        Ok(())
    }

    fn latest_value_set(&self, max_version: Version) -> Result<Vec<(KeyHash, OwnedValue)>> {
        let values = self.values.lock().unwrap();

        let mut latest: HashMap<KeyHash, (Version, &Option<OwnedValue>)> = HashMap::new();
        for ((version, key_hash), value) in values.iter() {
            if *version > max_version {
                continue;
            }
            match latest.entry(*key_hash) {
                Entry::Occupied(mut slot) if slot.get().0 < *version => {
                    slot.insert((*version, value));
                }
                Entry::Occupied(_) => {}
                Entry::Vacant(slot) => {
                    slot.insert((*version, value));
                }
            }
        }

        Ok(latest
            .into_iter()
            .filter_map(|(key_hash, (_, value))| value.clone().map(|v| (key_hash, v)))
            .collect())
    }

    fn flush_database(&self) -> Result<()> {
        self.nodes.lock().unwrap().clear();
        self.values.lock().unwrap().clear();
        self.commitments.lock().unwrap().clear();
        *self.version.lock().unwrap() = None;
        Ok(())
    }
}
