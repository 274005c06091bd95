//! Server-side cursors for paging through large record sets.
//!
//! Creating a cursor returns `{"id": "...", "totalCount": ...}`. Older
//! deployments send the count as a decimal string, newer ones as a number;
//! both decode to the same `u64`. Reading from a cursor returns
//! `{"records": [...], "next": bool}`.

use serde::Deserialize;

use crate::codec::decode_json;
use crate::field::RawFieldMap;
use crate::record::decode_raw_records;
use crate::{ProtocolError, Record};

/// A handle to a server-side cursor.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cursor {
    pub id: String,
    /// Number of records the cursor will yield in total. Zero when the
    /// service did not report it.
    #[serde(default, with = "crate::wire::decimal_u64")]
    pub total_count: u64,
}

/// One batch read from a cursor.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CursorPage {
    pub records: Vec<Record>,
    /// `true` while the cursor has more records to hand out.
    pub next: bool,
}

#[derive(Deserialize)]
struct CursorPageEnvelope {
    records: Vec<RawFieldMap>,
    #[serde(default)]
    next: bool,
}

/// Decodes a cursor descriptor.
pub fn decode_cursor(data: &[u8]) -> Result<Cursor, ProtocolError> {
    decode_json(data)
}

/// Decodes one batch of records read from a cursor.
pub fn decode_cursor_page(data: &[u8]) -> Result<CursorPage, ProtocolError> {
    let envelope: CursorPageEnvelope = decode_json(data)?;
    let records = decode_raw_records(envelope.records)?;
    tracing::debug!(count = records.len(), next = envelope.next, "decoded cursor page");
    Ok(CursorPage {
        records,
        next: envelope.next,
    })
}
