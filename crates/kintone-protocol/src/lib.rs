//! Wire model for the kintone record REST API.
//!
//! This crate knows how application data looks on the wire and nothing
//! about how it gets there:
//!
//! - **Fields** ([`FieldType`], [`Field`]): the closed catalog of field
//!   kinds and the typed value each one carries.
//! - **Records** ([`Record`], [`decode_record`], [`decode_records`]): field
//!   maps and the `{"record"}` / `{"records"}` envelopes.
//! - **Auxiliary replies**: comments, cursors, process settings, and form
//!   field metadata.
//! - **Request bodies** ([`write`]): everything the command layer sends.
//!
//! ```text
//! Transport (bytes) → Protocol (Record, Comment, ...) → App (commands)
//! ```
//!
//! Decoding is strict about the catalog and lenient about spelling: an
//! unknown field tag is an error, but counts and ids are accepted as
//! decimal strings or JSON numbers alike.

// ---------------------------------------------------------------------------
// Module declarations
// ---------------------------------------------------------------------------

mod codec;
mod comment;
mod cursor;
mod error;
mod field;
mod form;
mod process;
mod record;
mod wire;
pub mod write;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

pub use comment::{Comment, CommentList, Mention, MentionType, decode_comment_list, decode_comments};
pub use cursor::{Cursor, CursorPage, decode_cursor, decode_cursor_page};
pub use error::ProtocolError;
pub use field::{Field, FieldType, File, SubTableRow, User};
pub use form::{FieldInfo, decode_field_infos};
pub use process::{
    AssigneeRule, Entity, Process, ProcessAction, ProcessAssignee, ProcessEntity, ProcessState,
    decode_process,
};
pub use record::{Record, RecordList, decode_record, decode_records, encode_record, numeric_id};
pub use write::{AddedRecord, AddedRecords, CommentOrder, NewComment, UpdatedRecord};
