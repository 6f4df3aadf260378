pub mod binary;
pub mod hex;

/// Serializes byte-like fields as hex strings in human-readable formats and
/// as raw bytes otherwise. Deserialization is generic over any type that can
/// be fallibly built from a byte vector, so fixed-width fields reject wrong
/// lengths at the serde boundary.
pub mod raw_or_hex {
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S, T: AsRef<[u8]>>(bytes: T, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if serializer.is_human_readable() {
            let hex_str = hex::encode(bytes.as_ref());
            serializer.serialize_str(&hex_str)
        } else {
            serializer.serialize_bytes(bytes.as_ref())
        }
    }

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: TryFrom<Vec<u8>>,
    {
        let bytes = if deserializer.is_human_readable() {
            let hex_str = String::deserialize(deserializer)?;
            hex::decode(hex_str.as_bytes()).map_err(serde::de::Error::custom)?
        } else {
            Vec::<u8>::deserialize(deserializer)?
        };

        let len = bytes.len();
        T::try_from(bytes).map_err(|_| {
            serde::de::Error::custom(format!("unexpected byte width: got {}", len))
        })
    }
}

/// Like [`raw_or_hex`], but base64 for the human-readable side. Used for
/// opaque blobs where hex would be needlessly long.
pub mod raw_or_b64 {
    use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S, T: AsRef<[u8]>>(bytes: T, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if serializer.is_human_readable() {
            let base64_string = BASE64.encode(bytes.as_ref());
            serializer.serialize_str(&base64_string)
        } else {
            serializer.serialize_bytes(bytes.as_ref())
        }
    }

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: TryFrom<Vec<u8>>,
    {
        let bytes = if deserializer.is_human_readable() {
            let base64_string = String::deserialize(deserializer)?;
            BASE64.decode(base64_string.as_bytes()).map_err(serde::de::Error::custom)?
        } else {
            Vec::<u8>::deserialize(deserializer)?
        };

        let len = bytes.len();
        T::try_from(bytes).map_err(|_| {
            serde::de::Error::custom(format!("unexpected byte width: got {}", len))
        })
    }
}
