//! Conversions for fixed-width on-chain encodings.

use alloy_primitives::B256;

/// Decode a right-zero-padded `bytes32` into a string.
///
/// Trailing NULs are dropped; invalid UTF-8 is replaced rather than rejected
/// since names are user supplied.
pub fn bytes32_to_string(value: &B256) -> String {
    let bytes = value.as_slice();
    let end = bytes.iter().rposition(|b| *b != 0).map_or(0, |i| i + 1);
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

/// Extract the lower-case `0x` address held in the last 20 bytes of a
/// curation-registry listing key.
pub fn listing_key_to_address(key: &B256) -> String {
    format!("0x{}", hex::encode(&key.as_slice()[12..]))
}

/// Serde adapter writing a `U256` in decimal: a JSON number when it fits in
/// `u64`, a decimal string beyond that. Reads numbers, decimal strings and
/// `0x` strings.
///
/// Used as `#[serde(with = "decimal")]` on every on-chain quantity that
/// reaches the state store or an export.
pub mod decimal {
    use std::str::FromStr;

    use alloy_primitives::U256;
    use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(u64),
        Text(String),
    }

    impl Repr {
        fn into_u256<E: de::Error>(self) -> Result<U256, E> {
            match self {
                Repr::Number(n) => Ok(U256::from(n)),
                Repr::Text(s) => U256::from_str(&s).map_err(E::custom),
            }
        }
    }

    pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
        match u64::try_from(*value) {
            Ok(n) => serializer.serialize_u64(n),
            Err(_) => serializer.serialize_str(&value.to_string()),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
        Repr::deserialize(deserializer)?.into_u256()
    }

    struct Decimal<'a>(&'a U256);

    impl Serialize for Decimal<'_> {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            serialize(self.0, serializer)
        }
    }

    /// The same encoding for a list of quantities.
    pub mod vec {
        use super::*;

        pub fn serialize<S: Serializer>(values: &[U256], serializer: S) -> Result<S::Ok, S::Error> {
            serializer.collect_seq(values.iter().map(Decimal))
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<U256>, D::Error> {
            Vec::<Repr>::deserialize(deserializer)?
                .into_iter()
                .map(Repr::into_u256)
                .collect()
        }
    }
}
