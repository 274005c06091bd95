//! Record comments.
//!
//! ```text
//! { "comments": [ { "id": "3", "text": "...", "createdAt": "...",
//!                   "creator": {"code", "name"},
//!                   "mentions": [ {"code": "user14", "type": "USER"} ] } ],
//!   "older": false, "newer": false }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::codec::decode_json;
use crate::{ProtocolError, User};

/// What a mention points at.
///
/// The service spells departments `"ORGANIZATION"`. Any other tag fails
/// the decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MentionType {
    #[serde(rename = "USER")]
    User,
    #[serde(rename = "GROUP")]
    Group,
    #[serde(rename = "ORGANIZATION")]
    Department,
}

/// A user, group, or department mentioned in a comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mention {
    pub code: String,
    #[serde(rename = "type")]
    pub mention_type: MentionType,
}

impl Mention {
    pub fn new(code: impl Into<String>, mention_type: MentionType) -> Self {
        Self {
            code: code.into(),
            mention_type,
        }
    }
}

/// A comment posted on a record.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(with = "crate::wire::decimal_u64")]
    pub id: u64,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub creator: User,
    #[serde(default)]
    pub mentions: Vec<Mention>,
}

/// One page of comments, with flags telling whether more exist on either
/// side.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CommentList {
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub older: bool,
    #[serde(default)]
    pub newer: bool,
}

/// Decodes a comment page.
pub fn decode_comment_list(data: &[u8]) -> Result<CommentList, ProtocolError> {
    let list: CommentList = decode_json(data)?;
    tracing::debug!(count = list.comments.len(), older = list.older, newer = list.newer, "decoded comments");
    Ok(list)
}

/// Decodes a comment page, keeping only the comments.
pub fn decode_comments(data: &[u8]) -> Result<Vec<Comment>, ProtocolError> {
    decode_comment_list(data).map(|list| list.comments)
}
