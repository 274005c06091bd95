//! Form field metadata (`{"properties": [...]}`).
//!
//! The form endpoint describes layout elements as well as record fields, so
//! `field_type` is kept as the raw tag; [`FieldInfo::kind`] maps it onto
//! the record catalog when it belongs there. Flags arrive as `"true"` /
//! `"false"` strings and limits as decimal strings or `null`.

use serde::Deserialize;

use crate::codec::decode_json;
use crate::{FieldType, ProtocolError};

/// The definition of one form field.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldInfo {
    pub code: String,
    #[serde(default)]
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default, deserialize_with = "crate::wire::lenient_bool::deserialize")]
    pub no_label: bool,
    #[serde(default, deserialize_with = "crate::wire::lenient_bool::deserialize")]
    pub required: bool,
    #[serde(default, deserialize_with = "crate::wire::lenient_bool::deserialize")]
    pub unique: bool,
    #[serde(default, deserialize_with = "crate::wire::optional_decimal_string::deserialize")]
    pub max_value: Option<String>,
    #[serde(default, deserialize_with = "crate::wire::optional_decimal_string::deserialize")]
    pub min_value: Option<String>,
    #[serde(default, deserialize_with = "crate::wire::optional_decimal_u64::deserialize")]
    pub max_length: Option<u64>,
    #[serde(default, deserialize_with = "crate::wire::optional_decimal_u64::deserialize")]
    pub min_length: Option<u64>,
    /// Raw default: a string for scalar kinds, an array for list kinds.
    #[serde(default)]
    pub default_value: serde_json::Value,
    #[serde(default)]
    pub options: Vec<String>,
    /// Formula of a calculated field.
    #[serde(default)]
    pub expression: String,
    /// Whether a NUMBER field shows thousands separators.
    #[serde(default, deserialize_with = "crate::wire::lenient_bool::deserialize")]
    pub digit: bool,
    #[serde(default, deserialize_with = "crate::wire::optional_decimal_u64::deserialize")]
    pub display_scale: Option<u64>,
}

impl FieldInfo {
    /// The record field kind, or `None` for layout-only elements.
    pub fn kind(&self) -> Option<FieldType> {
        FieldType::from_tag(&self.field_type)
    }
}

#[derive(Deserialize)]
struct FormEnvelope {
    properties: Vec<FieldInfo>,
}

/// Decodes the form field list.
pub fn decode_field_infos(data: &[u8]) -> Result<Vec<FieldInfo>, ProtocolError> {
    let envelope: FormEnvelope = decode_json(data)?;
    tracing::debug!(count = envelope.properties.len(), "decoded form fields");
    Ok(envelope.properties)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FORM: &str = r#"{
        "properties": [
            {
                "code": "string_1",
                "defaultValue": "",
                "expression": "",
                "hideExpression": "false",
                "maxLength": "64",
                "minLength": null,
                "label": "string_1",
                "noLabel": "false",
                "required": "true",
                "type": "SINGLE_LINE_TEXT",
                "unique": "true"
            },
            {
                "code": "number_1",
                "defaultValue": "12345",
                "digit": "true",
                "displayScale": "4",
                "expression": "",
                "maxValue": null,
                "minValue": null,
                "label": "number_1",
                "noLabel": "true",
                "required": "false",
                "type": "NUMBER",
                "unique": "false"
            },
            {
                "code": "checkbox_1",
                "defaultValue": ["sample1", "sample3"],
                "label": "checkbox_1",
                "noLabel": "false",
                "options": ["sample1", "sample2", "sample3"],
                "required": "false",
                "type": "CHECK_BOX"
            },
            {
                "code": "spacer_1",
                "type": "SPACER"
            }
        ]
    }"#;

    #[test]
    fn test_decode_form_fields() {
        let fields = decode_field_infos(FORM.as_bytes()).unwrap();
        assert_eq!(fields.len(), 4);

        let text = &fields[0];
        assert_eq!(text.kind(), Some(FieldType::SingleLineText));
        assert!(text.required);
        assert!(text.unique);
        assert!(!text.no_label);
        assert_eq!(text.max_length, Some(64));
        assert_eq!(text.min_length, None);

        let number = &fields[1];
        assert!(number.digit);
        assert!(number.no_label);
        assert_eq!(number.display_scale, Some(4));
        assert_eq!(number.default_value, "12345");
        assert_eq!(number.max_value, None);

        let check = &fields[2];
        assert_eq!(check.options, vec!["sample1", "sample2", "sample3"]);
        assert_eq!(check.default_value, serde_json::json!(["sample1", "sample3"]));
    }

    #[test]
    fn test_layout_elements_have_no_kind() {
        let fields = decode_field_infos(FORM.as_bytes()).unwrap();
        assert_eq!(fields[3].kind(), None);
        assert_eq!(fields[3].label, "");
    }

    #[test]
    fn test_missing_properties_key_fails() {
        assert!(matches!(
            decode_field_infos(b"{}").unwrap_err(),
            ProtocolError::Decode(_)
        ));
    }
}
