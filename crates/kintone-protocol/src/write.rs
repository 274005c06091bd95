//! Request bodies for the record, comment, cursor, and settings endpoints,
//! and the small acknowledgements the write endpoints reply with.
//!
//! Every builder returns the encoded JSON body. Record bodies carry only
//! [`Record::writable_fields`]: the service rejects built-in and system
//! fields on writes.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::codec::{decode_json, encode_json};
use crate::{Mention, ProtocolError, Record};

/// Serializes the writable subset of a record as a field map.
struct Writable<'a>(&'a Record);

impl Serialize for Writable<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for (code, field) in self.0.writable_fields() {
            map.serialize_entry(code, field)?;
        }
        map.end()
    }
}

/// Like [`Writable`] but also leaves out one field (the update key).
struct WritableExcept<'a> {
    record: &'a Record,
    skip: &'a str,
}

impl Serialize for WritableExcept<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for (code, field) in self.record.writable_fields() {
            if code != self.skip {
                map.serialize_entry(code, field)?;
            }
        }
        map.end()
    }
}

fn record_id(record: &Record) -> Result<u64, ProtocolError> {
    record
        .try_id()
        .ok_or_else(|| ProtocolError::InvalidMessage("record has no id to update".into()))
}

fn revision_of(record: &Record, ignore_revision: bool) -> Option<u64> {
    if ignore_revision { None } else { record.revision() }
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct AppBody {
    app: u64,
}

#[derive(Serialize)]
struct GetRecordBody {
    app: u64,
    id: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GetRecordsBody<'a> {
    app: u64,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    fields: &'a [String],
    query: &'a str,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    total_count: bool,
}

/// `{"app"}`: form fields and other per-app settings.
pub fn app_body(app: u64) -> Result<Vec<u8>, ProtocolError> {
    encode_json(&AppBody { app })
}

/// `{"app", "id"}`
pub fn get_record_body(app: u64, id: u64) -> Result<Vec<u8>, ProtocolError> {
    encode_json(&GetRecordBody { app, id })
}

/// `{"app", "fields"?, "query", "totalCount"?}`. An empty `fields` slice
/// asks for every field.
pub fn get_records_body(
    app: u64,
    fields: &[String],
    query: &str,
    total_count: bool,
) -> Result<Vec<u8>, ProtocolError> {
    encode_json(&GetRecordsBody {
        app,
        fields,
        query,
        total_count,
    })
}

#[derive(Serialize)]
struct ProcessBody<'a> {
    app: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    lang: Option<&'a str>,
}

/// `{"app", "lang"?}`. Without `lang` the service answers in the
/// requesting user's language.
pub fn process_body(app: u64, lang: Option<&str>) -> Result<Vec<u8>, ProtocolError> {
    encode_json(&ProcessBody { app, lang })
}

// ---------------------------------------------------------------------------
// Record writes
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct AddRecordBody<'a> {
    app: u64,
    record: Writable<'a>,
}

#[derive(Serialize)]
struct AddRecordsBody<'a> {
    app: u64,
    records: Vec<Writable<'a>>,
}

/// `{"app", "record"}`
pub fn add_record_body(app: u64, record: &Record) -> Result<Vec<u8>, ProtocolError> {
    encode_json(&AddRecordBody {
        app,
        record: Writable(record),
    })
}

/// `{"app", "records": [...]}`
pub fn add_records_body(app: u64, records: &[Record]) -> Result<Vec<u8>, ProtocolError> {
    encode_json(&AddRecordsBody {
        app,
        records: records.iter().map(Writable).collect(),
    })
}

#[derive(Serialize)]
struct UpdateItem<'a> {
    id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    revision: Option<u64>,
    record: Writable<'a>,
}

#[derive(Serialize)]
struct UpdateRecordBody<'a> {
    app: u64,
    #[serde(flatten)]
    item: UpdateItem<'a>,
}

#[derive(Serialize)]
struct UpdateRecordsBody<'a> {
    app: u64,
    records: Vec<UpdateItem<'a>>,
}

fn update_item(record: &Record, ignore_revision: bool) -> Result<UpdateItem<'_>, ProtocolError> {
    Ok(UpdateItem {
        id: record_id(record)?,
        revision: revision_of(record, ignore_revision),
        record: Writable(record),
    })
}

/// `{"app", "id", "revision"?, "record"}`.
///
/// The id comes from the record itself. With `ignore_revision` (or when the
/// record carries no revision) the update is unconditional.
///
/// # Errors
/// [`ProtocolError::InvalidMessage`] if the record has no id.
pub fn update_record_body(
    app: u64,
    record: &Record,
    ignore_revision: bool,
) -> Result<Vec<u8>, ProtocolError> {
    encode_json(&UpdateRecordBody {
        app,
        item: update_item(record, ignore_revision)?,
    })
}

/// `{"app", "records": [{"id", "revision"?, "record"}, ...]}`
pub fn update_records_body(
    app: u64,
    records: &[Record],
    ignore_revision: bool,
) -> Result<Vec<u8>, ProtocolError> {
    let records = records
        .iter()
        .map(|r| update_item(r, ignore_revision))
        .collect::<Result<Vec<_>, _>>()?;
    encode_json(&UpdateRecordsBody { app, records })
}

#[derive(Serialize)]
struct UpdateKey<'a> {
    field: &'a str,
    value: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct KeyedItem<'a> {
    update_key: UpdateKey<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    revision: Option<u64>,
    record: WritableExcept<'a>,
}

#[derive(Serialize)]
struct UpdateByKeyBody<'a> {
    app: u64,
    #[serde(flatten)]
    item: KeyedItem<'a>,
}

#[derive(Serialize)]
struct UpdateManyByKeyBody<'a> {
    app: u64,
    records: Vec<KeyedItem<'a>>,
}

fn keyed_item<'a>(
    record: &'a Record,
    key: &'a str,
    ignore_revision: bool,
) -> Result<KeyedItem<'a>, ProtocolError> {
    let field = record
        .get(key)
        .ok_or_else(|| ProtocolError::InvalidMessage(format!("update key field {key:?} is not in the record")))?;
    let value = field.as_str().ok_or_else(|| {
        ProtocolError::InvalidMessage(format!(
            "update key field {key:?} ({}) has no text value",
            field.field_type()
        ))
    })?;
    Ok(KeyedItem {
        update_key: UpdateKey { field: key, value },
        revision: revision_of(record, ignore_revision),
        record: WritableExcept { record, skip: key },
    })
}

/// `{"app", "updateKey": {"field", "value"}, "revision"?, "record"}`.
///
/// The record is located by the value of its unique field `key`, which is
/// moved out of the record body into `updateKey`.
///
/// # Errors
/// [`ProtocolError::InvalidMessage`] if `key` is missing from the record or
/// holds no text value.
pub fn update_record_by_key_body(
    app: u64,
    record: &Record,
    key: &str,
    ignore_revision: bool,
) -> Result<Vec<u8>, ProtocolError> {
    encode_json(&UpdateByKeyBody {
        app,
        item: keyed_item(record, key, ignore_revision)?,
    })
}

/// Batch form of [`update_record_by_key_body`].
pub fn update_records_by_key_body(
    app: u64,
    records: &[Record],
    key: &str,
    ignore_revision: bool,
) -> Result<Vec<u8>, ProtocolError> {
    let records = records
        .iter()
        .map(|r| keyed_item(r, key, ignore_revision))
        .collect::<Result<Vec<_>, _>>()?;
    encode_json(&UpdateManyByKeyBody { app, records })
}

#[derive(Serialize)]
struct DeleteRecordsBody<'a> {
    app: u64,
    ids: &'a [u64],
    #[serde(skip_serializing_if = "Option::is_none")]
    revisions: Option<&'a [u64]>,
}

/// `{"app", "ids", "revisions"?}`. When given, `revisions` must pair up
/// with `ids`.
pub fn delete_records_body(
    app: u64,
    ids: &[u64],
    revisions: Option<&[u64]>,
) -> Result<Vec<u8>, ProtocolError> {
    if let Some(revisions) = revisions {
        if revisions.len() != ids.len() {
            return Err(ProtocolError::InvalidMessage(format!(
                "{} ids but {} revisions",
                ids.len(),
                revisions.len()
            )));
        }
    }
    encode_json(&DeleteRecordsBody { app, ids, revisions })
}

// ---------------------------------------------------------------------------
// Comments
// ---------------------------------------------------------------------------

/// A comment to post on a record.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct NewComment {
    pub text: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub mentions: Vec<Mention>,
}

impl NewComment {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            mentions: Vec::new(),
        }
    }

    pub fn mention(mut self, mention: Mention) -> Self {
        self.mentions.push(mention);
        self
    }
}

/// Listing order of comments, by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CommentOrder {
    Asc,
    #[default]
    Desc,
}

#[derive(Serialize)]
struct CommentsBody {
    app: u64,
    record: u64,
    order: CommentOrder,
    offset: u64,
    limit: u64,
}

#[derive(Serialize)]
struct AddCommentBody<'a> {
    app: u64,
    record: u64,
    comment: &'a NewComment,
}

#[derive(Serialize)]
struct DeleteCommentBody {
    app: u64,
    record: u64,
    comment: u64,
}

/// `{"app", "record", "order", "offset", "limit"}`
pub fn comments_body(
    app: u64,
    record: u64,
    order: CommentOrder,
    offset: u64,
    limit: u64,
) -> Result<Vec<u8>, ProtocolError> {
    encode_json(&CommentsBody {
        app,
        record,
        order,
        offset,
        limit,
    })
}

/// `{"app", "record", "comment": {"text", "mentions"?}}`
pub fn add_comment_body(app: u64, record: u64, comment: &NewComment) -> Result<Vec<u8>, ProtocolError> {
    encode_json(&AddCommentBody { app, record, comment })
}

/// `{"app", "record", "comment": <id>}`
pub fn delete_comment_body(app: u64, record: u64, comment: u64) -> Result<Vec<u8>, ProtocolError> {
    encode_json(&DeleteCommentBody { app, record, comment })
}

// ---------------------------------------------------------------------------
// Cursors
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct CreateCursorBody<'a> {
    app: u64,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    fields: &'a [String],
    query: &'a str,
    size: u64,
}

#[derive(Serialize)]
struct CursorIdBody<'a> {
    id: &'a str,
}

/// `{"app", "fields"?, "query", "size"}`
pub fn create_cursor_body(
    app: u64,
    fields: &[String],
    query: &str,
    size: u64,
) -> Result<Vec<u8>, ProtocolError> {
    encode_json(&CreateCursorBody {
        app,
        fields,
        query,
        size,
    })
}

/// `{"id"}`: reading from or deleting a cursor.
pub fn cursor_id_body(id: &str) -> Result<Vec<u8>, ProtocolError> {
    encode_json(&CursorIdBody { id })
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FileKeyBody<'a> {
    file_key: &'a str,
}

/// `{"fileKey"}`: downloading an uploaded or attached file.
pub fn file_key_body(file_key: &str) -> Result<Vec<u8>, ProtocolError> {
    encode_json(&FileKeyBody { file_key })
}

// ---------------------------------------------------------------------------
// Acknowledgements
// ---------------------------------------------------------------------------

/// Reply to adding one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct AddedRecord {
    #[serde(with = "crate::wire::decimal_u64")]
    pub id: u64,
    #[serde(with = "crate::wire::decimal_u64")]
    pub revision: u64,
}

/// Reply to adding several records; `ids[i]` pairs with `revisions[i]`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AddedRecords {
    #[serde(deserialize_with = "crate::wire::decimal_u64_list::deserialize")]
    pub ids: Vec<u64>,
    #[serde(deserialize_with = "crate::wire::decimal_u64_list::deserialize")]
    pub revisions: Vec<u64>,
}

/// Id and new revision of one updated record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct UpdatedRecord {
    #[serde(with = "crate::wire::decimal_u64")]
    pub id: u64,
    #[serde(with = "crate::wire::decimal_u64")]
    pub revision: u64,
}

#[derive(Deserialize)]
struct RevisionAck {
    #[serde(with = "crate::wire::decimal_u64")]
    revision: u64,
}

#[derive(Deserialize)]
struct UpdatedRecordsAck {
    records: Vec<UpdatedRecord>,
}

#[derive(Deserialize)]
struct IdAck {
    #[serde(with = "crate::wire::decimal_u64")]
    id: u64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileKeyAck {
    file_key: String,
}

pub fn decode_added_record(data: &[u8]) -> Result<AddedRecord, ProtocolError> {
    decode_json(data)
}

pub fn decode_added_records(data: &[u8]) -> Result<AddedRecords, ProtocolError> {
    let added: AddedRecords = decode_json(data)?;
    if added.ids.len() != added.revisions.len() {
        return Err(ProtocolError::InvalidMessage(format!(
            "{} ids but {} revisions",
            added.ids.len(),
            added.revisions.len()
        )));
    }
    Ok(added)
}

/// `{"revision"}` from a single update.
pub fn decode_revision(data: &[u8]) -> Result<u64, ProtocolError> {
    decode_json::<RevisionAck>(data).map(|ack| ack.revision)
}

/// `{"records": [{"id", "revision"}]}` from a batch update.
pub fn decode_updated_records(data: &[u8]) -> Result<Vec<UpdatedRecord>, ProtocolError> {
    decode_json::<UpdatedRecordsAck>(data).map(|ack| ack.records)
}

/// `{"id"}` from posting a comment.
pub fn decode_comment_id(data: &[u8]) -> Result<u64, ProtocolError> {
    decode_json::<IdAck>(data).map(|ack| ack.id)
}

/// `{"fileKey"}` from an upload.
pub fn decode_file_key(data: &[u8]) -> Result<String, ProtocolError> {
    decode_json::<FileKeyAck>(data).map(|ack| ack.file_key)
}
