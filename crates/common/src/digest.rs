use serde::{Deserialize, Serialize};

use sha2::{Digest as _, Sha256};
use shareledger_serde::{
    hex::{FromHex, ToHex},
    raw_or_hex,
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Copy, Hash)]
pub struct Digest(#[serde(with = "raw_or_hex")] pub [u8; 32]);

impl Digest {
    pub const fn new(bytes: [u8; 32]) -> Self {
        Digest(bytes)
    }

    pub fn hash(data: impl AsRef<[u8]>) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data.as_ref());
        Self(hasher.finalize().into())
    }

    pub fn hash_items(items: &[impl AsRef<[u8]>]) -> Self {
        let mut hasher = Sha256::new();
        for item in items {
            hasher.update(item.as_ref());
        }
        Self(hasher.finalize().into())
    }

    pub const fn zero() -> Self {
        Self([0u8; 32])
    }

    pub fn to_bytes(&self) -> [u8; 32] {
        self.0
    }
}

impl AsRef<[u8]> for Digest {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl FromHex for Digest {
    type Error = anyhow::Error;

    fn from_hex<T: AsRef<[u8]>>(hex: T) -> std::result::Result<Self, Self::Error> {
        Ok(Self(<[u8; 32]>::from_hex(hex)?))
    }
}

impl std::fmt::Display for Digest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}
