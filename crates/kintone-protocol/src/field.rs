//! The field model: every kind of value a record can hold, and how each one
//! travels on the wire.
//!
//! On the wire a field is always a two-key object:
//!
//! ```text
//! { "type": "DROP_DOWN", "value": "Option1" }
//! { "type": "NUMBER",    "value": "123.456" }
//! { "type": "FILE",      "value": [ { "fileKey": "...", "size": "12345", ... } ] }
//! ```
//!
//! In memory a field is one variant of the closed [`Field`] enum. The
//! `type` tag picks the variant ([`FieldType`]), and each variant owns the
//! native shape of its payload. Decoding dispatches on the tag with an
//! exhaustive `match`, so a new kind cannot be added without teaching the
//! codec how to read and write it.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, SecondsFormat, Timelike, Utc};
use serde::de::DeserializeOwned;
use serde::ser::{self, SerializeStruct};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::ProtocolError;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S";
const SHORT_TIME_FORMAT: &str = "%H:%M";

/// Years the four-digit wire formats can spell.
const YEARS: std::ops::RangeInclusive<i32> = 0..=9999;

// ---------------------------------------------------------------------------
// FieldType: the catalog of wire tags
// ---------------------------------------------------------------------------

/// The wire type tag of a field.
///
/// One variant per tag the service can send. Anything else is rejected
/// with [`ProtocolError::UnknownFieldType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldType {
    SingleLineText,
    MultiLineText,
    RichText,
    Number,
    Calc,
    CheckBox,
    RadioButton,
    DropDown,
    MultiSelect,
    File,
    Link,
    Date,
    Time,
    DateTime,
    UserSelect,
    OrganizationSelect,
    GroupSelect,
    Category,
    Status,
    StatusAssignee,
    RecordNumber,
    Creator,
    CreatedTime,
    Modifier,
    UpdatedTime,
    SubTable,
    Id,
    Revision,
}

impl FieldType {
    /// Every tag in the catalog.
    pub const ALL: [FieldType; 28] = [
        FieldType::SingleLineText,
        FieldType::MultiLineText,
        FieldType::RichText,
        FieldType::Number,
        FieldType::Calc,
        FieldType::CheckBox,
        FieldType::RadioButton,
        FieldType::DropDown,
        FieldType::MultiSelect,
        FieldType::File,
        FieldType::Link,
        FieldType::Date,
        FieldType::Time,
        FieldType::DateTime,
        FieldType::UserSelect,
        FieldType::OrganizationSelect,
        FieldType::GroupSelect,
        FieldType::Category,
        FieldType::Status,
        FieldType::StatusAssignee,
        FieldType::RecordNumber,
        FieldType::Creator,
        FieldType::CreatedTime,
        FieldType::Modifier,
        FieldType::UpdatedTime,
        FieldType::SubTable,
        FieldType::Id,
        FieldType::Revision,
    ];

    /// The exact string the service uses for this kind.
    pub const fn as_str(self) -> &'static str {
        match self {
            FieldType::SingleLineText => "SINGLE_LINE_TEXT",
            FieldType::MultiLineText => "MULTI_LINE_TEXT",
            FieldType::RichText => "RICH_TEXT",
            FieldType::Number => "NUMBER",
            FieldType::Calc => "CALC",
            FieldType::CheckBox => "CHECK_BOX",
            FieldType::RadioButton => "RADIO_BUTTON",
            FieldType::DropDown => "DROP_DOWN",
            FieldType::MultiSelect => "MULTI_SELECT",
            FieldType::File => "FILE",
            FieldType::Link => "LINK",
            FieldType::Date => "DATE",
            FieldType::Time => "TIME",
            FieldType::DateTime => "DATETIME",
            FieldType::UserSelect => "USER_SELECT",
            FieldType::OrganizationSelect => "ORGANIZATION_SELECT",
            FieldType::GroupSelect => "GROUP_SELECT",
            FieldType::Category => "CATEGORY",
            FieldType::Status => "STATUS",
            FieldType::StatusAssignee => "STATUS_ASSIGNEE",
            FieldType::RecordNumber => "RECORD_NUMBER",
            FieldType::Creator => "CREATOR",
            FieldType::CreatedTime => "CREATED_TIME",
            FieldType::Modifier => "MODIFIER",
            FieldType::UpdatedTime => "UPDATED_TIME",
            FieldType::SubTable => "SUBTABLE",
            FieldType::Id => "__ID__",
            FieldType::Revision => "__REVISION__",
        }
    }

    /// Looks up a wire tag. Matching is exact (case-sensitive).
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == tag)
    }

    /// Returns `true` for kinds the service computes itself: calculated
    /// values, categories, process status and assignees, record number,
    /// and the creator/modifier stamps.
    pub fn is_builtin(self) -> bool {
        matches!(
            self,
            FieldType::Calc
                | FieldType::Category
                | FieldType::Status
                | FieldType::StatusAssignee
                | FieldType::RecordNumber
                | FieldType::Creator
                | FieldType::CreatedTime
                | FieldType::Modifier
                | FieldType::UpdatedTime
        )
    }

    /// Returns `true` for the `__ID__` / `__REVISION__` bookkeeping kinds.
    pub fn is_system(self) -> bool {
        matches!(self, FieldType::Id | FieldType::Revision)
    }

    /// Returns `true` if a write request may carry this kind.
    pub fn is_writable(self) -> bool {
        !self.is_builtin() && !self.is_system()
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Payload types shared by several kinds
// ---------------------------------------------------------------------------

/// A `(code, name)` reference to a user, organization, or group.
///
/// `code` is the stable identifier; `name` is only a display label and may
/// be left empty when writing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct User {
    pub code: String,
    #[serde(default)]
    pub name: String,
}

impl User {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
        }
    }
}

/// An attachment held by a FILE field.
///
/// When attaching a freshly uploaded blob only `file_key` matters; the
/// service fills in the rest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct File {
    /// MIME type of the file.
    #[serde(default)]
    pub content_type: String,
    /// Server-assigned blob id.
    pub file_key: String,
    #[serde(default)]
    pub name: String,
    /// Size in bytes; a decimal string on the wire.
    #[serde(default, with = "crate::wire::decimal_u64")]
    pub size: u64,
}

impl File {
    /// A reference to an uploaded blob, ready to be attached to a record.
    pub fn from_key(file_key: impl Into<String>) -> Self {
        Self {
            content_type: String::new(),
            file_key: file_key.into(),
            name: String::new(),
            size: 0,
        }
    }
}

/// One row of a SUBTABLE field.
///
/// `id` is assigned by the service; leave it empty for rows that do not
/// exist yet. Rows hold plain fields only: a subtable cannot contain
/// another subtable.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SubTableRow {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(rename = "value")]
    pub fields: BTreeMap<String, Field>,
}

impl SubTableRow {
    pub fn new(fields: impl IntoIterator<Item = (String, Field)>) -> Self {
        Self {
            id: String::new(),
            fields: fields.into_iter().collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Field
// ---------------------------------------------------------------------------

/// One typed value inside a record.
///
/// Kinds that can be left blank carry an `Option`: `None` is the "not set"
/// state and goes over the wire as `"value": null`. For DROP_DOWN this is
/// distinct from `Some(String::new())`.
///
/// Numbers stay strings end to end so arbitrarily large or precise values
/// survive untouched.
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    SingleLineText(String),
    MultiLineText(String),
    RichText(String),
    /// A decimal number, kept in its wire spelling.
    Number(String),
    Calc(String),
    CheckBox(Vec<String>),
    RadioButton(String),
    DropDown(Option<String>),
    MultiSelect(Vec<String>),
    File(Vec<File>),
    Link(String),
    Date(Option<NaiveDate>),
    /// Whole seconds only; the wire format has no fraction.
    Time(Option<NaiveTime>),
    DateTime(Option<DateTime<Utc>>),
    UserSelect(Vec<User>),
    OrganizationSelect(Vec<User>),
    GroupSelect(Vec<User>),
    Category(Vec<String>),
    Status(String),
    StatusAssignee(Vec<User>),
    /// The display record number, possibly prefixed with an app code
    /// (`"INFRA-34"`).
    RecordNumber(String),
    Creator(User),
    CreatedTime(DateTime<Utc>),
    Modifier(User),
    UpdatedTime(DateTime<Utc>),
    SubTable(Vec<SubTableRow>),
    /// The numeric record id (`__ID__`).
    Id(u64),
    /// The optimistic-concurrency token (`__REVISION__`).
    Revision(u64),
}

impl Field {
    /// The wire tag of this value's kind.
    pub fn field_type(&self) -> FieldType {
        match self {
            Field::SingleLineText(_) => FieldType::SingleLineText,
            Field::MultiLineText(_) => FieldType::MultiLineText,
            Field::RichText(_) => FieldType::RichText,
            Field::Number(_) => FieldType::Number,
            Field::Calc(_) => FieldType::Calc,
            Field::CheckBox(_) => FieldType::CheckBox,
            Field::RadioButton(_) => FieldType::RadioButton,
            Field::DropDown(_) => FieldType::DropDown,
            Field::MultiSelect(_) => FieldType::MultiSelect,
            Field::File(_) => FieldType::File,
            Field::Link(_) => FieldType::Link,
            Field::Date(_) => FieldType::Date,
            Field::Time(_) => FieldType::Time,
            Field::DateTime(_) => FieldType::DateTime,
            Field::UserSelect(_) => FieldType::UserSelect,
            Field::OrganizationSelect(_) => FieldType::OrganizationSelect,
            Field::GroupSelect(_) => FieldType::GroupSelect,
            Field::Category(_) => FieldType::Category,
            Field::Status(_) => FieldType::Status,
            Field::StatusAssignee(_) => FieldType::StatusAssignee,
            Field::RecordNumber(_) => FieldType::RecordNumber,
            Field::Creator(_) => FieldType::Creator,
            Field::CreatedTime(_) => FieldType::CreatedTime,
            Field::Modifier(_) => FieldType::Modifier,
            Field::UpdatedTime(_) => FieldType::UpdatedTime,
            Field::SubTable(_) => FieldType::SubTable,
            Field::Id(_) => FieldType::Id,
            Field::Revision(_) => FieldType::Revision,
        }
    }

    /// Shorthand for `self.field_type().is_builtin()`.
    pub fn is_builtin(&self) -> bool {
        self.field_type().is_builtin()
    }

    /// The payload of a string-backed kind, e.g. to use a SINGLE_LINE_TEXT
    /// or NUMBER field as an update key. `None` for every other kind.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Field::SingleLineText(s)
            | Field::MultiLineText(s)
            | Field::RichText(s)
            | Field::Number(s)
            | Field::Calc(s)
            | Field::RadioButton(s)
            | Field::Link(s)
            | Field::Status(s)
            | Field::RecordNumber(s) => Some(s),
            Field::DropDown(s) => s.as_deref(),
            _ => None,
        }
    }

    /// Decodes one field from its tag and raw `value`.
    ///
    /// `name` is only used to label errors.
    ///
    /// # Errors
    /// - [`ProtocolError::UnknownFieldType`] if `tag` is not in the catalog.
    /// - [`ProtocolError::InvalidFieldValue`] if `value` does not fit `tag`.
    pub fn decode(name: &str, tag: &str, value: &Value) -> Result<Field, ProtocolError> {
        decode_field(name, tag, value, Nesting::Record)
    }
}

/// Where a field sits. Subtables may only appear at the record level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Nesting {
    Record,
    SubTableRow,
}

/// A field exactly as it arrives, before the tag has been looked at.
///
/// Extra keys next to `type`/`value` are ignored.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawField {
    #[serde(rename = "type")]
    pub(crate) tag: String,
    #[serde(default)]
    pub(crate) value: Value,
}

/// A field map exactly as it arrives, keyed by field code.
pub(crate) type RawFieldMap = BTreeMap<String, RawField>;

/// Decodes every entry of a field map. The first bad entry fails the map.
pub(crate) fn decode_field_map(raw: RawFieldMap) -> Result<BTreeMap<String, Field>, ProtocolError> {
    raw.into_iter()
        .map(|(name, field)| {
            let decoded = decode_field(&name, &field.tag, &field.value, Nesting::Record)?;
            Ok((name, decoded))
        })
        .collect()
}

fn decode_field(name: &str, tag: &str, value: &Value, nesting: Nesting) -> Result<Field, ProtocolError> {
    let field_type = FieldType::from_tag(tag).ok_or_else(|| ProtocolError::UnknownFieldType {
        field: name.to_string(),
        tag: tag.to_string(),
    })?;
    let payload = Payload {
        name,
        field_type,
        value,
    };

    let field = match field_type {
        FieldType::SingleLineText => Field::SingleLineText(payload.text()?),
        FieldType::MultiLineText => Field::MultiLineText(payload.text()?),
        FieldType::RichText => Field::RichText(payload.text()?),
        FieldType::Number => Field::Number(payload.text()?),
        FieldType::Calc => Field::Calc(payload.text()?),
        FieldType::CheckBox => Field::CheckBox(payload.string_list()?),
        FieldType::RadioButton => Field::RadioButton(payload.text()?),
        FieldType::DropDown => Field::DropDown(payload.optional_text()?),
        FieldType::MultiSelect => Field::MultiSelect(payload.string_list()?),
        FieldType::File => Field::File(payload.typed()?),
        FieldType::Link => Field::Link(payload.text()?),
        FieldType::Date => Field::Date(payload.optional_date()?),
        FieldType::Time => Field::Time(payload.optional_time()?),
        FieldType::DateTime => Field::DateTime(payload.optional_timestamp()?),
        FieldType::UserSelect => Field::UserSelect(payload.typed()?),
        FieldType::OrganizationSelect => Field::OrganizationSelect(payload.typed()?),
        FieldType::GroupSelect => Field::GroupSelect(payload.typed()?),
        FieldType::Category => Field::Category(payload.string_list()?),
        FieldType::Status => Field::Status(payload.text()?),
        FieldType::StatusAssignee => Field::StatusAssignee(payload.typed()?),
        FieldType::RecordNumber => Field::RecordNumber(payload.text()?),
        FieldType::Creator => Field::Creator(payload.typed()?),
        FieldType::CreatedTime => Field::CreatedTime(payload.timestamp()?),
        FieldType::Modifier => Field::Modifier(payload.typed()?),
        FieldType::UpdatedTime => Field::UpdatedTime(payload.timestamp()?),
        FieldType::SubTable => {
            if nesting == Nesting::SubTableRow {
                return Err(payload.mismatch("subtables cannot be nested"));
            }
            Field::SubTable(payload.sub_table()?)
        }
        FieldType::Id => Field::Id(payload.decimal()?),
        FieldType::Revision => Field::Revision(payload.decimal()?),
    };
    Ok(field)
}

/// A raw `value` together with what it claims to be, so every helper can
/// report a precise [`ProtocolError::InvalidFieldValue`].
struct Payload<'a> {
    name: &'a str,
    field_type: FieldType,
    value: &'a Value,
}

impl Payload<'_> {
    fn mismatch(&self, reason: impl Into<String>) -> ProtocolError {
        ProtocolError::invalid_value(self.name, self.field_type, self.value, reason)
    }

    fn text(&self) -> Result<String, ProtocolError> {
        self.value
            .as_str()
            .map(str::to_owned)
            .ok_or_else(|| self.mismatch("expected a string"))
    }

    fn optional_text(&self) -> Result<Option<String>, ProtocolError> {
        match self.value {
            Value::Null => Ok(None),
            Value::String(s) => Ok(Some(s.clone())),
            _ => Err(self.mismatch("expected a string or null")),
        }
    }

    /// Like [`optional_text`](Self::optional_text), but an empty string
    /// also means "not set". Used by the date and time kinds.
    fn optional_moment(&self) -> Result<Option<&str>, ProtocolError> {
        match self.value {
            Value::Null => Ok(None),
            Value::String(s) if s.is_empty() => Ok(None),
            Value::String(s) => Ok(Some(s.as_str())),
            _ => Err(self.mismatch("expected a string or null")),
        }
    }

    fn string_list(&self) -> Result<Vec<String>, ProtocolError> {
        let items = self
            .value
            .as_array()
            .ok_or_else(|| self.mismatch("expected an array of strings"))?;
        items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                item.as_str()
                    .map(str::to_owned)
                    .ok_or_else(|| self.mismatch(format!("element {i} is not a string")))
            })
            .collect()
    }

    /// Validates a structured payload against its own serde schema.
    fn typed<T: DeserializeOwned>(&self) -> Result<T, ProtocolError> {
        T::deserialize(self.value).map_err(|e| self.mismatch(e.to_string()))
    }

    fn decimal(&self) -> Result<u64, ProtocolError> {
        let text = self.text()?;
        text.parse()
            .map_err(|_| self.mismatch("expected a decimal integer"))
    }

    fn optional_date(&self) -> Result<Option<NaiveDate>, ProtocolError> {
        self.optional_moment()?
            .map(|s| {
                NaiveDate::parse_from_str(s, DATE_FORMAT)
                    .map_err(|_| self.mismatch("expected a YYYY-MM-DD date"))
            })
            .transpose()
    }

    /// Accepts `HH:MM` as well as `HH:MM:SS`; the service sends both.
    fn optional_time(&self) -> Result<Option<NaiveTime>, ProtocolError> {
        self.optional_moment()?
            .map(|s| {
                NaiveTime::parse_from_str(s, SHORT_TIME_FORMAT)
                    .or_else(|_| NaiveTime::parse_from_str(s, TIME_FORMAT))
                    .map_err(|_| self.mismatch("expected an HH:MM or HH:MM:SS time"))
            })
            .transpose()
    }

    fn optional_timestamp(&self) -> Result<Option<DateTime<Utc>>, ProtocolError> {
        self.optional_moment()?
            .map(|s| self.parse_timestamp(s))
            .transpose()
    }

    fn timestamp(&self) -> Result<DateTime<Utc>, ProtocolError> {
        let text = self.text()?;
        self.parse_timestamp(&text)
    }

    fn parse_timestamp(&self, s: &str) -> Result<DateTime<Utc>, ProtocolError> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|_| self.mismatch("expected an RFC 3339 timestamp"))
    }

    fn sub_table(&self) -> Result<Vec<SubTableRow>, ProtocolError> {
        #[derive(Deserialize)]
        struct RawRow {
            #[serde(default)]
            id: String,
            #[serde(default)]
            value: RawFieldMap,
        }

        let rows: Vec<RawRow> = self.typed()?;
        rows.into_iter()
            .enumerate()
            .map(|(i, row)| {
                let fields = row
                    .value
                    .into_iter()
                    .map(|(column, cell)| {
                        let label = format!("{}[{i}].{column}", self.name);
                        let decoded = decode_field(&label, &cell.tag, &cell.value, Nesting::SubTableRow)?;
                        Ok((column, decoded))
                    })
                    .collect::<Result<_, ProtocolError>>()?;
                Ok(SubTableRow { id: row.id, fields })
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

fn check_year(year: i32) -> Result<(), String> {
    if YEARS.contains(&year) {
        Ok(())
    } else {
        Err(format!("year {year} is outside 0000-9999"))
    }
}

fn format_date(date: &NaiveDate) -> Result<String, String> {
    check_year(date.year())?;
    Ok(date.format(DATE_FORMAT).to_string())
}

/// TIME has whole-second resolution on the wire, so anything finer is
/// refused rather than silently truncated.
fn format_time(time: &NaiveTime) -> Result<String, String> {
    if time.nanosecond() % 1_000_000_000 != 0 {
        return Err(format!("time {time} has sub-second precision"));
    }
    Ok(time.format(TIME_FORMAT).to_string())
}

fn format_timestamp(timestamp: &DateTime<Utc>) -> Result<String, String> {
    check_year(timestamp.year())?;
    Ok(timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true))
}

/// Writes `{"type": <tag>, "value": <payload>}`. Both keys are always
/// present, even for empty lists and unset values.
///
/// Dates and timestamps must fall in years 0000-9999 and times must be
/// whole seconds; anything else fails with a serializer error, which the
/// codec reports as [`ProtocolError::Encode`].
impl Serialize for Field {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let refuse = <S::Error as ser::Error>::custom::<String>;
        let mut out = serializer.serialize_struct("Field", 2)?;
        out.serialize_field("type", self.field_type().as_str())?;
        match self {
            Field::SingleLineText(s)
            | Field::MultiLineText(s)
            | Field::RichText(s)
            | Field::Number(s)
            | Field::Calc(s)
            | Field::RadioButton(s)
            | Field::Link(s)
            | Field::Status(s)
            | Field::RecordNumber(s) => out.serialize_field("value", s)?,
            Field::CheckBox(items) | Field::MultiSelect(items) | Field::Category(items) => {
                out.serialize_field("value", items)?
            }
            Field::DropDown(choice) => out.serialize_field("value", choice)?,
            Field::File(files) => out.serialize_field("value", files)?,
            Field::Date(date) => {
                let text = date.as_ref().map(format_date).transpose().map_err(refuse)?;
                out.serialize_field("value", &text)?
            }
            Field::Time(time) => {
                let text = time.as_ref().map(format_time).transpose().map_err(refuse)?;
                out.serialize_field("value", &text)?
            }
            Field::DateTime(ts) => {
                let text = ts.as_ref().map(format_timestamp).transpose().map_err(refuse)?;
                out.serialize_field("value", &text)?
            }
            Field::CreatedTime(ts) | Field::UpdatedTime(ts) => {
                out.serialize_field("value", &format_timestamp(ts).map_err(refuse)?)?
            }
            Field::UserSelect(users)
            | Field::OrganizationSelect(users)
            | Field::GroupSelect(users)
            | Field::StatusAssignee(users) => out.serialize_field("value", users)?,
            Field::Creator(user) | Field::Modifier(user) => out.serialize_field("value", user)?,
            Field::SubTable(rows) => out.serialize_field("value", rows)?,
            Field::Id(n) | Field::Revision(n) => out.serialize_field("value", &n.to_string())?,
        }
        out.end()
    }
}

// =========================================================================
// Tests
// =========================================================================
