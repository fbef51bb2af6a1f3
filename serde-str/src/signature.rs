use crate::error::InvalidSignature;
use serde::de::Unexpected;
use serde::{Deserialize, Deserializer, Serializer};
use solana_sdk::signature::Signature;
use std::str::FromStr;

pub fn serialize<S>(signature: &Signature, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&signature.to_string())
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<Signature, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    Signature::from_str(&s).map_err(|_| {
        serde::de::Error::invalid_value(Unexpected::Str(&s), &InvalidSignature::new(s.to_owned()))
    })
}
