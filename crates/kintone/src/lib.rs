//! # kintone
//!
//! Typed client for the kintone record REST API.
//!
//! Records are maps of field code to [`Field`](kintone_protocol::Field), a
//! closed set of typed values that decode from and encode to the service's
//! `{"type", "value"}` wire shape. [`App`] turns those into REST calls over
//! whatever [`Transport`](kintone_transport::Transport) the host provides.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use kintone::prelude::*;
//!
//! # async fn run(transport: impl Transport) -> Result<(), KintoneError> {
//! let config = AppConfig::new("example.cybozu.com", 12)
//!     .credentials(Credentials::api_token("token"));
//! let app = App::new(transport, config);
//!
//! let mut record = app.get_record(1).await?;
//! record.insert("title", Field::SingleLineText("renamed".into()));
//! app.update_record(&record, false).await?;
//! # Ok(())
//! # }
//! ```

mod app;
mod config;
mod error;
mod multipart;

pub use app::{ALL_RECORDS_PAGE_SIZE, App, FileData};
pub use config::AppConfig;
pub use error::KintoneError;

pub use kintone_protocol as protocol;
pub use kintone_transport as transport;

/// Everything needed to talk to an app.
pub mod prelude {
    pub use crate::{App, AppConfig, FileData, KintoneError};
    pub use kintone_protocol::{
        AddedRecord, AddedRecords, Comment, CommentOrder, Cursor, CursorPage, Field, FieldInfo,
        FieldType, File, Mention, MentionType, NewComment, Process, Record, RecordList,
        SubTableRow, UpdatedRecord, User,
    };
    pub use kintone_transport::{
        ApiRequest, ApiResponse, BasicAuth, Credentials, HttpMethod, Transport, TransportError,
    };
}
