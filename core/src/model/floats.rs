//! Serde adapters keeping non-finite floats intact in JSON.
//!
//! JSON has no NaN or infinity, so those values are written as the strings
//! `"NaN"`, `"inf"` and `"-inf"` and parsed back on read.

use serde::{Deserialize, Deserializer, Serializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum FloatRepr {
    Number(f64),
    Text(String),
}

impl FloatRepr {
    fn into_f64<E: serde::de::Error>(self) -> Result<f64, E> {
        match self {
            FloatRepr::Number(value) => Ok(value),
            FloatRepr::Text(text) => text
                .parse()
                .map_err(|_| E::custom(format!("invalid float '{}'", text))),
        }
    }
}

pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.is_finite() {
        serializer.serialize_f64(*value)
    } else {
        serializer.serialize_str(&value.to_string())
    }
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    FloatRepr::deserialize(deserializer)?.into_f64()
}

pub mod optional {
    use super::FloatRepr;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<f64>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            None => serializer.serialize_none(),
            Some(v) if v.is_finite() => serializer.serialize_some(v),
            Some(v) => serializer.serialize_some(&v.to_string()),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<f64>, D::Error> {
        Option::<FloatRepr>::deserialize(deserializer)?
            .map(FloatRepr::into_f64)
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize)]
    struct Sample {
        #[serde(with = "super")]
        plain: f64,
        #[serde(with = "super::optional")]
        maybe: Option<f64>,
    }

    fn round_trip(plain: f64, maybe: Option<f64>) -> Sample {
        let json = serde_json::to_string(&Sample { plain, maybe }).unwrap();
        serde_json::from_str(&json).unwrap()
    }

    #[test]
    fn non_finite_values_survive_json() {
        let back = round_trip(f64::NAN, Some(f64::NAN));
        assert!(back.plain.is_nan());
        assert!(back.maybe.map_or(false, f64::is_nan));

        let back = round_trip(f64::INFINITY, Some(f64::NEG_INFINITY));
        assert_eq!(back.plain, f64::INFINITY);
        assert_eq!(back.maybe, Some(f64::NEG_INFINITY));
    }

    #[test]
    fn finite_and_absent_values_are_exact() {
        let back = round_trip(1.0 / 7.0, None);
        assert_eq!(back.plain.to_bits(), (1.0f64 / 7.0).to_bits());
        assert_eq!(back.maybe, None);
    }
}
