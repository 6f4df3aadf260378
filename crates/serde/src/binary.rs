use anyhow::Result;
use serde::{Serialize, de::DeserializeOwned};

/// Canonical binary encoding for everything that crosses a wire or a
/// storage boundary. Bincode output for a given value is deterministic,
/// which the proof transport relies on.
pub trait ToBinary {
    fn encode_to_bytes(&self) -> Result<Vec<u8>>;
}

impl<T: Serialize> ToBinary for T {
    fn encode_to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(Into::<anyhow::Error>::into)
    }
}

pub trait FromBinary: Sized {
    fn decode_from_bytes<B: AsRef<[u8]>>(bytes: B) -> Result<Self>;
}

impl<T: DeserializeOwned> FromBinary for T {
    fn decode_from_bytes<B: AsRef<[u8]>>(bytes: B) -> Result<Self> {
        bincode::deserialize(bytes.as_ref()).map_err(Into::<anyhow::Error>::into)
    }
}
