use jmt::SimpleHasher;
use serde::{Deserialize, Serialize, de};

/// Sha256, threaded through the JMT as its node and leaf hasher. Carries no
/// state worth serializing, but proofs are generic over the hasher, so it
/// has to round-trip through the proof wire format as an empty marker.
#[derive(Debug, Clone, Default)]
pub struct ShareTreeHasher(sha2::Sha256);

impl SimpleHasher for ShareTreeHasher {
    fn new() -> Self {
        Self(sha2::Sha256::new())
    }

    fn update(&mut self, data: &[u8]) {
        self.0.update(data);
    }

    fn finalize(self) -> [u8; 32] {
        self.0.finalize()
    }
}

impl Serialize for ShareTreeHasher {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_unit_struct("ShareTreeHasher")
    }
}

impl<'de> Deserialize<'de> for ShareTreeHasher {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct HasherVisitor;

        impl de::Visitor<'_> for HasherVisitor {
            type Value = ShareTreeHasher;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                formatter.write_str("a ShareTreeHasher marker")
            }

            fn visit_unit<E>(self) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(ShareTreeHasher::default())
            }
        }

        deserializer.deserialize_unit_struct("ShareTreeHasher", HasherVisitor)
    }
}
