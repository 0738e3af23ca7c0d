//! Decimal-string serde adapter for `BigUint` fields, for use in
//! `#[serde(with = "crate::serde_bigint")]`. Keeps serialized keys and
//! signatures aligned with the decimal textual encodings used on the chain.

use num_bigint_dig::BigUint;
use serde::{de, Deserialize, Deserializer, Serializer};
use std::str::FromStr;

pub fn serialize<S>(value: &BigUint, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&value.to_string())
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<BigUint, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    BigUint::from_str(&s).map_err(de::Error::custom)
}
