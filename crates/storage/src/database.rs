use anyhow::Result;
use jmt::{
    KeyHash, OwnedValue, Version,
    storage::{TreeReader, TreeWriter},
};
use shareledger_common::digest::Digest;

/// Node and value store backing a share directory. The tree reads and
/// writes through the [`TreeReader`]/[`TreeWriter`] supertraits; the rest is
/// bookkeeping for committed digests and the snapshot export consumed by
/// off-chain tooling. Durable backends are out of scope; anything satisfying
/// this trait plugs in.
pub trait Database: Send + Sync + TreeReader + TreeWriter {
    fn get_commitment(&self, version: &Version) -> Result<Digest>;
    fn set_commitment(&self, version: &Version, commitment: &Digest) -> Result<()>;

    fn get_version(&self) -> Result<Version>;
    fn set_version(&self, version: &Version) -> Result<()>;

    /// The latest surviving value per key at or below `max_version`, i.e.
    /// the full key-value content of the directory as of that version.
    /// Deleted keys are absent.
    fn latest_value_set(&self, max_version: Version) -> Result<Vec<(KeyHash, OwnedValue)>>;

    fn flush_database(&self) -> Result<()>;
}
