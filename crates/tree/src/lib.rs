pub mod codec;
pub mod hasher;
pub mod ledger;
pub mod proofs;
pub mod share_tree;

pub use ledger::{ShareLedger, verify_batch};
pub use proofs::{BatchUpdateProof, LookupProof};
pub use share_tree::ShareDirectoryTree;

use jmt::KeyHash;
use shareledger_common::record::ShareKey;

/// A [`ShareKey`] is already the 32-byte hash of the miner's spending
/// condition, so it maps onto the tree's key space directly instead of
/// being hashed a second time.
pub(crate) fn key_hash(key: &ShareKey) -> KeyHash {
    KeyHash(key.to_bytes())
}
