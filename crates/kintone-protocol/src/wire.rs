//! Serde helpers for the service's numeric-looking values.
//!
//! The service sends most numbers as decimal strings (`"size": "12345"`)
//! to avoid precision loss, but a few endpoints have drifted over time and
//! sometimes send bare JSON numbers for the same key. Everything here
//! accepts both spellings on the way in and writes the string form on the
//! way out.

use serde::{Deserialize, Deserializer, Serializer, de};

/// A value that arrived either as a JSON number or as a string.
#[derive(Deserialize)]
#[serde(untagged)]
enum Lenient {
    Number(u64),
    Text(String),
}

impl Lenient {
    fn into_u64<E: de::Error>(self) -> Result<u64, E> {
        match self {
            Lenient::Number(n) => Ok(n),
            Lenient::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| E::custom(format!("expected a decimal integer, got {s:?}"))),
        }
    }

    fn into_string(self) -> String {
        match self {
            Lenient::Number(n) => n.to_string(),
            Lenient::Text(s) => s,
        }
    }
}

/// `u64` written as a decimal string, read from a string or a number.
pub(crate) mod decimal_u64 {
    use super::*;

    pub(crate) fn serialize<S: Serializer>(value: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub(crate) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        Lenient::deserialize(deserializer)?.into_u64()
    }
}

/// `Option<u64>` read with the same rules; `null` and absence map to `None`.
pub(crate) mod optional_decimal_u64 {
    use super::*;

    pub(crate) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<u64>, D::Error> {
        Option::<Lenient>::deserialize(deserializer)?
            .map(Lenient::into_u64)
            .transpose()
    }
}

/// `Vec<u64>` whose elements follow the [`decimal_u64`] rules.
pub(crate) mod decimal_u64_list {
    use super::*;

    pub(crate) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u64>, D::Error> {
        Vec::<Lenient>::deserialize(deserializer)?
            .into_iter()
            .map(Lenient::into_u64)
            .collect()
    }
}

/// `Option<String>` holding a decimal count, read from a string, a number,
/// or `null`. Used for `totalCount`, which is surfaced to callers verbatim.
pub(crate) mod optional_decimal_string {
    use super::*;

    pub(crate) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<String>, D::Error> {
        Ok(Option::<Lenient>::deserialize(deserializer)?.map(Lenient::into_string))
    }
}

/// `bool` read from a JSON boolean or from the strings `"true"`/`"false"`,
/// the way form metadata spells its flags.
pub(crate) mod lenient_bool {
    use super::*;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    pub(crate) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        match Option::<Flag>::deserialize(deserializer)? {
            None => Ok(false),
            Some(Flag::Bool(b)) => Ok(b),
            Some(Flag::Text(s)) => match s.as_str() {
                "true" => Ok(true),
                "false" | "" => Ok(false),
                other => Err(de::Error::custom(format!("expected \"true\" or \"false\", got {other:?}"))),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct FileSize {
        #[serde(with = "super::decimal_u64")]
        size: u64,
    }

    #[derive(Debug, PartialEq, Deserialize)]
    struct Counted {
        #[serde(default, deserialize_with = "super::optional_decimal_string::deserialize")]
        total: Option<String>,
    }

    #[derive(Debug, PartialEq, Deserialize)]
    struct Flagged {
        #[serde(default, deserialize_with = "super::lenient_bool::deserialize")]
        required: bool,
    }

    #[test]
    fn test_decimal_u64_writes_a_string() {
        let json = serde_json::to_string(&FileSize { size: 12345 }).unwrap();
        assert_eq!(json, r#"{"size":"12345"}"#);
    }

    #[test]
    fn test_decimal_u64_reads_string_or_number() {
        let a: FileSize = serde_json::from_str(r#"{"size":"123456"}"#).unwrap();
        let b: FileSize = serde_json::from_str(r#"{"size":123456}"#).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.size, 123456);
    }

    #[test]
    fn test_decimal_u64_rejects_garbage() {
        assert!(serde_json::from_str::<FileSize>(r#"{"size":"12a"}"#).is_err());
        assert!(serde_json::from_str::<FileSize>(r#"{"size":true}"#).is_err());
    }

    #[test]
    fn test_optional_decimal_string_accepts_all_spellings() {
        let s: Counted = serde_json::from_str(r#"{"total":"9999"}"#).unwrap();
        let n: Counted = serde_json::from_str(r#"{"total":9999}"#).unwrap();
        let null: Counted = serde_json::from_str(r#"{"total":null}"#).unwrap();
        let absent: Counted = serde_json::from_str("{}").unwrap();
        assert_eq!(s.total.as_deref(), Some("9999"));
        assert_eq!(n.total.as_deref(), Some("9999"));
        assert_eq!(null.total, None);
        assert_eq!(absent.total, None);
    }

    #[test]
    fn test_decimal_u64_list_mixes_spellings() {
        #[derive(Deserialize)]
        struct Ids {
            #[serde(deserialize_with = "super::decimal_u64_list::deserialize")]
            ids: Vec<u64>,
        }
        let ids: Ids = serde_json::from_str(r#"{"ids":["1", 2, "3"]}"#).unwrap();
        assert_eq!(ids.ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_lenient_bool() {
        let a: Flagged = serde_json::from_str(r#"{"required":"true"}"#).unwrap();
        let b: Flagged = serde_json::from_str(r#"{"required":false}"#).unwrap();
        let c: Flagged = serde_json::from_str("{}").unwrap();
        assert!(a.required);
        assert!(!b.required);
        assert!(!c.required);
        assert!(serde_json::from_str::<Flagged>(r#"{"required":"yes"}"#).is_err());
    }
}
