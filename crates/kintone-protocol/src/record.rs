//! Records and the envelopes that carry them.
//!
//! A [`Record`] is a map from field code to [`Field`]. The record
//! endpoints wrap field maps in one of two envelopes:
//!
//! ```text
//! { "record":  { "<code>": { "type": ..., "value": ... }, ... } }
//! { "records": [ { ... }, { ... } ], "totalCount": "9999" }
//! ```
//!
//! Decoding is all-or-nothing: if any field in any record is bad, the whole
//! call fails and no records are returned.

use std::collections::BTreeMap;
use std::collections::btree_map;

use serde::{Deserialize, Serialize};

use crate::codec::{decode_json, encode_json};
use crate::field::{RawFieldMap, decode_field_map};
use crate::{Field, ProtocolError};

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// One row of application data.
///
/// Field codes are unique keys; order does not matter (a `BTreeMap` keeps
/// encoded output stable). To change a field before an update, insert a new
/// value under the same code.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct Record {
    pub fields: BTreeMap<String, Field>,
}

impl Record {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, code: &str) -> Option<&Field> {
        self.fields.get(code)
    }

    /// Sets a field, returning the value it replaced.
    pub fn insert(&mut self, code: impl Into<String>, field: Field) -> Option<Field> {
        self.fields.insert(code.into(), field)
    }

    pub fn remove(&mut self, code: &str) -> Option<Field> {
        self.fields.remove(code)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, Field> {
        self.fields.iter()
    }

    /// The record's numeric id, if it carries one.
    ///
    /// Prefers the `__ID__` field; otherwise falls back to the numeric part
    /// of the RECORD_NUMBER field (`"INFRA-34"` → 34).
    pub fn try_id(&self) -> Option<u64> {
        let from_id = self.fields.values().find_map(|f| match f {
            Field::Id(id) => Some(*id),
            _ => None,
        });
        from_id.or_else(|| {
            self.fields.values().find_map(|f| match f {
                Field::RecordNumber(number) => numeric_id(number),
                _ => None,
            })
        })
    }

    /// The record's numeric id.
    ///
    /// # Panics
    /// Panics if the record has neither an `__ID__` nor a usable
    /// RECORD_NUMBER field. Every record the service returns has one, so
    /// hitting this means the record was built by hand and then used where
    /// a stored record was required.
    pub fn id(&self) -> u64 {
        match self.try_id() {
            Some(id) => id,
            None => panic!("record has no record number field"),
        }
    }

    /// The revision token, or `None` when the service omitted it.
    pub fn revision(&self) -> Option<u64> {
        self.fields.values().find_map(|f| match f {
            Field::Revision(rev) => Some(*rev),
            _ => None,
        })
    }

    /// Fields a write request may carry: everything except built-in and
    /// `__ID__`/`__REVISION__` fields.
    pub fn writable_fields(&self) -> impl Iterator<Item = (&String, &Field)> {
        self.fields
            .iter()
            .filter(|(_, field)| field.field_type().is_writable())
    }
}

impl FromIterator<(String, Field)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, Field)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Record {
    type Item = (&'a String, &'a Field);
    type IntoIter = btree_map::Iter<'a, String, Field>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

/// Extracts the numeric part of a record number.
///
/// Record numbers are either plain (`"33"`) or prefixed with the app code
/// and a hyphen (`"INFRA-34"`). Anything else yields `None`.
pub fn numeric_id(number: &str) -> Option<u64> {
    let digits = number.rsplit_once('-').map_or(number, |(_, tail)| tail);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

pub(crate) fn decode_raw_record(raw: RawFieldMap) -> Result<Record, ProtocolError> {
    decode_field_map(raw).map(|fields| Record { fields })
}

pub(crate) fn decode_raw_records(raw: Vec<RawFieldMap>) -> Result<Vec<Record>, ProtocolError> {
    raw.into_iter().map(decode_raw_record).collect()
}

// ---------------------------------------------------------------------------
// Envelopes
// ---------------------------------------------------------------------------

/// A page of records from the multi-record endpoint.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecordList {
    pub records: Vec<Record>,
    /// Present only when the request asked for a count. Kept as the
    /// service's decimal string.
    pub total_count: Option<String>,
}

#[derive(Deserialize)]
struct RecordEnvelope {
    record: RawFieldMap,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecordsEnvelope {
    records: Vec<RawFieldMap>,
    #[serde(default, deserialize_with = "crate::wire::optional_decimal_string::deserialize")]
    total_count: Option<String>,
}

#[derive(Serialize)]
struct RecordEnvelopeOut<'a> {
    record: &'a Record,
}

/// Decodes the single-record envelope `{"record": {...}}`.
///
/// # Errors
/// [`ProtocolError::Decode`] if the envelope is malformed; a field-level
/// error if any field fails to decode.
pub fn decode_record(data: &[u8]) -> Result<Record, ProtocolError> {
    let envelope: RecordEnvelope = decode_json(data)?;
    let record = decode_raw_record(envelope.record)?;
    tracing::debug!(fields = record.len(), "decoded record");
    Ok(record)
}

/// Decodes the multi-record envelope `{"records": [...], "totalCount": ...}`.
///
/// A missing or `null` `totalCount` is not an error.
pub fn decode_records(data: &[u8]) -> Result<RecordList, ProtocolError> {
    let envelope: RecordsEnvelope = decode_json(data)?;
    let records = decode_raw_records(envelope.records)?;
    tracing::debug!(
        count = records.len(),
        total_count = envelope.total_count.as_deref(),
        "decoded records"
    );
    Ok(RecordList {
        records,
        total_count: envelope.total_count,
    })
}

/// Encodes a record as `{"record": {...}}`, every field included.
///
/// This is the inverse of [`decode_record`]. Request bodies for writes
/// strip built-in fields; see [`crate::write`].
pub fn encode_record(record: &Record) -> Result<Vec<u8>, ProtocolError> {
    encode_json(&RecordEnvelopeOut { record })
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime};

    use super::*;
    use crate::FieldType;

    fn two_records(total_count: &str) -> String {
        format!(
            r#"{{
                "records": [
                    {{
                        "record_id": {{"type": "RECORD_NUMBER", "value": "1"}},
                        "created_time": {{"type": "CREATED_TIME", "value": "2012-02-03T08:50:00Z"}},
                        "updated_time": {{"type": "UPDATED_TIME", "value": "2018-10-24T08:50:00Z"}},
                        "dropdown": {{"type": "DROP_DOWN", "value": null}}
                    }},
                    {{
                        "record_id": {{"type": "RECORD_NUMBER", "value": "2"}},
                        "created_time": {{"type": "CREATED_TIME", "value": "2012-02-03T09:22:00Z"}},
                        "updated_time": {{"type": "UPDATED_TIME", "value": "2018-10-24T09:22:00Z"}},
                        "dropdown": {{"type": "DROP_DOWN", "value": null}}
                    }}
                ]{total_count}
            }}"#
        )
    }

    #[test]
    fn test_numeric_id() {
        assert_eq!(numeric_id("33"), Some(33));
        assert_eq!(numeric_id("INFRA-34"), Some(34));
        assert_eq!(numeric_id("INFRA_35"), None);
        assert_eq!(numeric_id("INFRA-"), None);
        assert_eq!(numeric_id(""), None);
    }

    #[test]
    fn test_id_prefers_dollar_id() {
        let record: Record = [
            ("$id".to_string(), Field::Id(5)),
            ("num".to_string(), Field::RecordNumber("APP-9".into())),
        ]
        .into_iter()
        .collect();
        assert_eq!(record.id(), 5);
    }

    #[test]
    fn test_id_falls_back_to_record_number() {
        let mut record = Record::new();
        record.insert("num", Field::RecordNumber("APP-9".into()));
        assert_eq!(record.id(), 9);
    }

    #[test]
    #[should_panic(expected = "no record number")]
    fn test_id_without_record_number_panics() {
        let mut record = Record::new();
        record.insert("title", Field::SingleLineText("x".into()));
        let _ = record.id();
    }

    #[test]
    fn test_revision_absent_is_none() {
        assert_eq!(Record::new().revision(), None);
        let mut record = Record::new();
        record.insert("$revision", Field::Revision(7));
        assert_eq!(record.revision(), Some(7));
    }

    #[test]
    fn test_writable_fields_skip_builtins() {
        let record: Record = [
            ("$id".to_string(), Field::Id(1)),
            ("$revision".to_string(), Field::Revision(2)),
            ("status".to_string(), Field::Status("Done".into())),
            ("title".to_string(), Field::SingleLineText("t".into())),
        ]
        .into_iter()
        .collect();
        let codes: Vec<_> = record.writable_fields().map(|(code, _)| code.as_str()).collect();
        assert_eq!(codes, vec!["title"]);
    }

    #[test]
    fn test_decode_record_with_every_common_kind() {
        let json = br#"{
            "record": {
                "record_id": {"type": "RECORD_NUMBER", "value": "1"},
                "dropdown": {"type": "DROP_DOWN", "value": "Option1"},
                "number": {"type": "NUMBER", "value": "123.456"},
                "check_box": {"type": "CHECK_BOX", "value": ["a", "b"]},
                "date": {"type": "DATE", "value": "1974-04-04"},
                "time": {"type": "TIME", "value": "09:53"},
                "$revision": {"type": "__REVISION__", "value": "7"}
            }
        }"#;
        let record = decode_record(json).unwrap();
        assert_eq!(record.len(), 7);
        assert_eq!(record.id(), 1);
        assert_eq!(record.revision(), Some(7));
        assert_eq!(record.get("dropdown"), Some(&Field::DropDown(Some("Option1".into()))));
        assert_eq!(record.get("number"), Some(&Field::Number("123.456".into())));
        assert_eq!(record.get("date"), Some(&Field::Date(NaiveDate::from_ymd_opt(1974, 4, 4))));
        assert_eq!(record.get("time"), Some(&Field::Time(NaiveTime::from_hms_opt(9, 53, 0))));
    }

    #[test]
    fn test_decode_record_ignores_extra_field_keys() {
        let json = br#"{
            "record": {
                "Updated_by": {
                    "type": "MODIFIER",
                    "value": {"code": "Administrator", "name": "Administrator"},
                    "key": "hehehe"
                },
                "$id": {"type": "__ID__", "value": "1"}
            }
        }"#;
        let record = decode_record(json).unwrap();
        assert_eq!(record.id(), 1);
        assert_eq!(record.get("Updated_by").map(Field::field_type), Some(FieldType::Modifier));
    }

    #[test]
    fn test_decode_record_missing_envelope_key() {
        let err = decode_record(br#"{"records": []}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::Decode(_)));
        assert!(err.to_string().starts_with("invalid JSON format"));
    }

    #[test]
    fn test_decode_record_unknown_type_fails_whole_record() {
        let json = br#"{
            "record": {
                "ok": {"type": "SINGLE_LINE_TEXT", "value": "fine"},
                "bad": {"type": "BOGUS", "value": "x"}
            }
        }"#;
        let err = decode_record(json).unwrap_err();
        assert!(err.to_string().contains("BOGUS"));
        assert!(matches!(err, ProtocolError::UnknownFieldType { ref field, .. } if field == "bad"));
    }

    #[test]
    fn test_decode_records_with_total_count() {
        let list = decode_records(two_records(r#", "totalCount": "9999""#).as_bytes()).unwrap();
        assert_eq!(list.records.len(), 2);
        assert_eq!(list.total_count.as_deref(), Some("9999"));
        assert_eq!(list.records[0].get("dropdown"), Some(&Field::DropDown(None)));
    }

    #[test]
    fn test_decode_records_without_total_count() {
        let list = decode_records(two_records("").as_bytes()).unwrap();
        assert_eq!(list.records.len(), 2);
        assert_eq!(list.total_count, None);

        let list = decode_records(two_records(r#", "totalCount": null"#).as_bytes()).unwrap();
        assert_eq!(list.total_count, None);
    }

    #[test]
    fn test_decode_records_one_bad_record_fails_all() {
        let json = br#"{
            "records": [
                {"a": {"type": "NUMBER", "value": "1"}},
                {"a": {"type": "NUMBER", "value": 1}}
            ]
        }"#;
        assert!(matches!(
            decode_records(json).unwrap_err(),
            ProtocolError::InvalidFieldValue { .. }
        ));
    }

    #[test]
    fn test_encode_record_round_trips() {
        let record: Record = [
            ("$id".to_string(), Field::Id(3)),
            ("title".to_string(), Field::SingleLineText("hello".into())),
            ("choice".to_string(), Field::DropDown(None)),
            ("amount".to_string(), Field::Number("123456789012345678901234567890".into())),
        ]
        .into_iter()
        .collect();
        let bytes = encode_record(&record).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["record"]["amount"]["value"], "123456789012345678901234567890");
        assert!(json["record"]["choice"]["value"].is_null());
        assert_eq!(decode_record(&bytes).unwrap(), record);
    }
}
