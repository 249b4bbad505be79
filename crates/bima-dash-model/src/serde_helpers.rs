// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Deserializer};

/// Treats an explicit JSON `null` like a missing field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberRepr {
    Number(f64),
    Text(String),
}

/// Gateway amounts arrive either as JSON numbers or numeric strings.
pub(crate) fn lenient_amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<NumberRepr>::deserialize(deserializer)? {
        None => Ok(0.0),
        Some(NumberRepr::Number(v)) => Ok(v),
        Some(NumberRepr::Text(raw)) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return Ok(0.0);
            }
            trimmed
                .parse::<f64>()
                .map_err(|_| serde::de::Error::custom(format!("amount is not numeric: {raw}")))
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TextRepr {
    Text(String),
    Number(serde_json::Number),
}

/// Report values are shown verbatim; numbers are kept in their JSON spelling.
pub(crate) fn text_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<TextRepr>::deserialize(deserializer)? {
        None => String::new(),
        Some(TextRepr::Text(s)) => s,
        Some(TextRepr::Number(n)) => n.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "lenient_amount")]
        amount: f64,
        #[serde(default, deserialize_with = "null_as_default")]
        items: Vec<String>,
    }

    #[test]
    fn lenient_amount_accepts_numbers_strings_and_null() {
        let p: Probe = serde_json::from_str(r#"{"amount": 12.5}"#).expect("number");
        assert_eq!(p.amount, 12.5);
        let p: Probe = serde_json::from_str(r#"{"amount": " 7 "}"#).expect("string");
        assert_eq!(p.amount, 7.0);
        let p: Probe = serde_json::from_str(r#"{"amount": null}"#).expect("null");
        assert_eq!(p.amount, 0.0);
        assert!(serde_json::from_str::<Probe>(r#"{"amount": "abc"}"#).is_err());
    }

    #[test]
    fn null_sequences_decode_empty() {
        let p: Probe = serde_json::from_str(r#"{"items": null}"#).expect("null list");
        assert!(p.items.is_empty());
    }
}
