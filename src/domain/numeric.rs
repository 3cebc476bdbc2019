// Lenient numeric decoding for values typed by operators or sent by firmware
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum LooseNumber {
    Number(f64),
    Text(String),
    Other(IgnoredAny),
}

impl LooseNumber {
    fn into_f64(self) -> f64 {
        match self {
            LooseNumber::Number(n) => n,
            LooseNumber::Text(s) => parse_loose(&s),
            LooseNumber::Other(_) => f64::NAN,
        }
    }
}

/// Parse a decimal string, yielding NaN when it is not a number.
pub fn parse_loose(text: &str) -> f64 {
    text.trim().parse().unwrap_or(f64::NAN)
}

/// Accepts a JSON number or numeric string; anything else decodes to NaN.
pub fn loose_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(LooseNumber::deserialize(deserializer)?.into_f64())
}

/// Like [`loose_f64`], with `null` mapping to `None`.
pub fn loose_opt_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<LooseNumber>::deserialize(deserializer)?.map(LooseNumber::into_f64))
}
