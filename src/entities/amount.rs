//! Serde helpers for monetary fields coming from the ledger API.
//!
//! The API sends decimals as strings (`"1000.00"`), but older endpoints send plain
//! numbers and some fields are null until a shift closes. These helpers accept all of
//! those shapes.

use crate::core::money::parse_wire_amount;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, de::IgnoredAny};

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAmount {
    Number(serde_json::Number),
    Text(String),
    Other(IgnoredAny),
}

impl RawAmount {
    fn into_decimal(self) -> Option<Decimal> {
        match self {
            Self::Number(n) => parse_wire_amount(&n.to_string()).ok(),
            Self::Text(s) => parse_wire_amount(&s).ok(),
            Self::Other(_) => None,
        }
    }
}

/// Null, missing or unparsable amounts become zero.
pub fn lenient<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawAmount>::deserialize(deserializer)?;
    Ok(raw.and_then(RawAmount::into_decimal).unwrap_or_default())
}

/// Null, missing or unparsable amounts become `None`.
pub fn lenient_opt<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawAmount>::deserialize(deserializer)?;
    Ok(raw.and_then(RawAmount::into_decimal))
}
