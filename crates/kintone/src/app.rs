//! The command layer: one method per REST operation on an app.
//!
//! Each command builds a body with [`kintone_protocol::write`], wraps it in
//! an [`ApiRequest`] carrying the configured credentials, hands it to the
//! [`Transport`], and decodes the reply.
//!
//! ```text
//! App::get_record(7)
//!   → write::get_record_body   {"app":3,"id":7}
//!   → POST /k/v1/record.json   X-HTTP-Method-Override: GET
//!   → decode_record            Record
//! ```

use kintone_protocol::{
    AddedRecord, AddedRecords, Comment, CommentOrder, Cursor, CursorPage, FieldInfo, NewComment,
    Process, ProtocolError, Record, RecordList, UpdatedRecord, decode_comments, decode_cursor,
    decode_cursor_page, decode_field_infos, decode_process, decode_record, decode_records, write,
};
use kintone_transport::{ApiRequest, ApiResponse, HttpMethod, Transport};
use serde::Deserialize;

use crate::config::AppConfig;
use crate::error::KintoneError;
use crate::multipart;

/// Page size used by [`App::get_all_records`]; the service maximum.
pub const ALL_RECORDS_PAGE_SIZE: usize = 500;

const METHOD_OVERRIDE_HEADER: &str = "X-HTTP-Method-Override";

/// A downloaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileData {
    pub content_type: String,
    pub data: Vec<u8>,
}

#[derive(Deserialize)]
struct ErrorBody {
    code: String,
    #[serde(default)]
    id: String,
    message: String,
}

/// Client for one app.
///
/// Generic over the [`Transport`] so hosts bring their own HTTP stack.
pub struct App<T: Transport> {
    transport: T,
    config: AppConfig,
}

impl<T: Transport> App<T> {
    pub fn new(transport: T, config: AppConfig) -> Self {
        tracing::debug!(
            domain = %config.domain,
            app = config.app_id,
            guest_space = ?config.guest_space_id,
            credentials = ?config.credentials,
            "app client created"
        );
        Self { transport, config }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn app_id(&self) -> u64 {
        self.config.app_id
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    // -----------------------------------------------------------------------
    // Plumbing
    // -----------------------------------------------------------------------

    /// A request to `api` with the authentication headers attached.
    fn request(&self, method: HttpMethod, api: &str) -> ApiRequest {
        let mut request = ApiRequest::new(method, self.config.api_url(api))
            .header("User-Agent", self.config.user_agent.clone());
        let (name, value) = self.config.credentials.header();
        request = request.header(name, value);
        if let Some(auth) = &self.config.basic_auth {
            let (name, value) = auth.header();
            request = request.header(name, value);
        }
        request
    }

    /// A request with a JSON body. Reads are tunnelled through POST so the
    /// body survives proxies that drop GET bodies.
    fn json_request(&self, method: HttpMethod, api: &str, body: Vec<u8>) -> ApiRequest {
        let request = match method {
            HttpMethod::Get => self
                .request(HttpMethod::Post, api)
                .header(METHOD_OVERRIDE_HEADER, "GET"),
            other => self.request(other, api),
        };
        request
            .header("Content-Type", "application/json")
            .body(body)
    }

    /// Executes `request` under the configured timeout and turns non-2xx
    /// replies into errors.
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, KintoneError> {
        let method = request.method;
        let url = request.url.clone();
        tracing::debug!(%method, %url, bytes = request.body.len(), "sending request");

        let response = tokio::time::timeout(self.config.timeout, self.transport.execute(request))
            .await
            .map_err(|_| KintoneError::Timeout(self.config.timeout))??;

        if response.is_success() {
            tracing::debug!(%method, %url, status = response.status, "request succeeded");
            return Ok(response);
        }
        Err(error_from(response, method, &url))
    }

    /// Sends a JSON body to `api` and returns the reply body.
    async fn call(&self, method: HttpMethod, api: &str, body: Vec<u8>) -> Result<Vec<u8>, KintoneError> {
        let response = self.send(self.json_request(method, api, body)).await?;
        Ok(response.body)
    }

    // -----------------------------------------------------------------------
    // Records: read
    // -----------------------------------------------------------------------

    /// Fetches one record by id.
    pub async fn get_record(&self, id: u64) -> Result<Record, KintoneError> {
        let body = write::get_record_body(self.app_id(), id)?;
        let record = decode_record(&self.call(HttpMethod::Get, "record", body).await?)?;
        tracing::info!(app = self.app_id(), id, fields = record.len(), "fetched record");
        Ok(record)
    }

    /// Fetches the records matching `query` (at most 500 per call; use
    /// `limit`/`offset` in the query to page). An empty `fields` slice
    /// returns every field.
    pub async fn get_records(&self, fields: &[String], query: &str) -> Result<Vec<Record>, KintoneError> {
        Ok(self.fetch_records(fields, query, false).await?.records)
    }

    /// Like [`App::get_records`], also asking the service for the number
    /// of records matching `query` regardless of `limit`.
    pub async fn get_records_with_total_count(
        &self,
        fields: &[String],
        query: &str,
    ) -> Result<RecordList, KintoneError> {
        self.fetch_records(fields, query, true).await
    }

    async fn fetch_records(
        &self,
        fields: &[String],
        query: &str,
        total_count: bool,
    ) -> Result<RecordList, KintoneError> {
        let body = write::get_records_body(self.app_id(), fields, query, total_count)?;
        let list = decode_records(&self.call(HttpMethod::Get, "records", body).await?)?;
        tracing::info!(
            app = self.app_id(),
            query,
            count = list.records.len(),
            total_count = list.total_count.as_deref(),
            "fetched records"
        );
        Ok(list)
    }

    /// Fetches every record of the app, in id order.
    ///
    /// Pages through the app [`ALL_RECORDS_PAGE_SIZE`] records at a time
    /// by `$id`, so records added while paging may or may not show up.
    pub async fn get_all_records(&self, fields: &[String]) -> Result<Vec<Record>, KintoneError> {
        let mut fields = fields.to_vec();
        if !fields.is_empty() && !fields.iter().any(|f| f == "$id") {
            fields.push("$id".to_string());
        }

        let mut all = Vec::new();
        let mut last_id = 0;
        loop {
            let query = format!("$id > {last_id} order by $id asc limit {ALL_RECORDS_PAGE_SIZE}");
            let page = self.get_records(&fields, &query).await?;
            let full_page = page.len() == ALL_RECORDS_PAGE_SIZE;

            if let Some(last) = page.last() {
                last_id = last
                    .try_id()
                    .ok_or_else(|| ProtocolError::InvalidMessage("paged record has no $id".into()))?;
            }
            all.extend(page);
            if !full_page {
                break;
            }
        }
        tracing::info!(app = self.app_id(), count = all.len(), "fetched all records");
        Ok(all)
    }

    // -----------------------------------------------------------------------
    // Records: write
    // -----------------------------------------------------------------------

    /// Adds a record. Built-in fields in `record` are ignored.
    pub async fn add_record(&self, record: &Record) -> Result<AddedRecord, KintoneError> {
        let body = write::add_record_body(self.app_id(), record)?;
        let added = write::decode_added_record(&self.call(HttpMethod::Post, "record", body).await?)?;
        tracing::info!(app = self.app_id(), id = added.id, revision = added.revision, "added record");
        Ok(added)
    }

    /// Adds up to 100 records in one request.
    pub async fn add_records(&self, records: &[Record]) -> Result<AddedRecords, KintoneError> {
        let body = write::add_records_body(self.app_id(), records)?;
        let added = write::decode_added_records(&self.call(HttpMethod::Post, "records", body).await?)?;
        tracing::info!(app = self.app_id(), count = added.ids.len(), "added records");
        Ok(added)
    }

    /// Updates a stored record and returns its new revision.
    ///
    /// Unless `ignore_revision` is set, the update fails when the record
    /// changed on the service since `record` was read.
    pub async fn update_record(&self, record: &Record, ignore_revision: bool) -> Result<u64, KintoneError> {
        let body = write::update_record_body(self.app_id(), record, ignore_revision)?;
        let revision = write::decode_revision(&self.call(HttpMethod::Put, "record", body).await?)?;
        tracing::info!(app = self.app_id(), revision, "updated record");
        Ok(revision)
    }

    /// Updates up to 100 stored records in one request.
    pub async fn update_records(
        &self,
        records: &[Record],
        ignore_revision: bool,
    ) -> Result<Vec<UpdatedRecord>, KintoneError> {
        let body = write::update_records_body(self.app_id(), records, ignore_revision)?;
        let updated = write::decode_updated_records(&self.call(HttpMethod::Put, "records", body).await?)?;
        tracing::info!(app = self.app_id(), count = updated.len(), "updated records");
        Ok(updated)
    }

    /// Updates the record whose unique field `key` holds the same value as
    /// in `record`.
    pub async fn update_record_by_key(
        &self,
        record: &Record,
        key: &str,
        ignore_revision: bool,
    ) -> Result<u64, KintoneError> {
        let body = write::update_record_by_key_body(self.app_id(), record, key, ignore_revision)?;
        let revision = write::decode_revision(&self.call(HttpMethod::Put, "record", body).await?)?;
        tracing::info!(app = self.app_id(), key, revision, "updated record by key");
        Ok(revision)
    }

    /// Batch form of [`App::update_record_by_key`].
    pub async fn update_records_by_key(
        &self,
        records: &[Record],
        key: &str,
        ignore_revision: bool,
    ) -> Result<Vec<UpdatedRecord>, KintoneError> {
        let body = write::update_records_by_key_body(self.app_id(), records, key, ignore_revision)?;
        let updated = write::decode_updated_records(&self.call(HttpMethod::Put, "records", body).await?)?;
        tracing::info!(app = self.app_id(), key, count = updated.len(), "updated records by key");
        Ok(updated)
    }

    /// Deletes up to 100 records by id.
    pub async fn delete_records(&self, ids: &[u64]) -> Result<(), KintoneError> {
        let body = write::delete_records_body(self.app_id(), ids, None)?;
        self.call(HttpMethod::Delete, "records", body).await?;
        tracing::info!(app = self.app_id(), count = ids.len(), "deleted records");
        Ok(())
    }

    /// Deletes records only if each is still at the paired revision.
    pub async fn delete_records_with_revision(
        &self,
        ids: &[u64],
        revisions: &[u64],
    ) -> Result<(), KintoneError> {
        let body = write::delete_records_body(self.app_id(), ids, Some(revisions))?;
        self.call(HttpMethod::Delete, "records", body).await?;
        tracing::info!(app = self.app_id(), count = ids.len(), "deleted records");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Comments
    // -----------------------------------------------------------------------

    /// Lists up to `limit` (max 10) comments on a record.
    pub async fn get_record_comments(
        &self,
        record: u64,
        order: CommentOrder,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Comment>, KintoneError> {
        let body = write::comments_body(self.app_id(), record, order, offset, limit)?;
        let comments = decode_comments(&self.call(HttpMethod::Get, "record/comments", body).await?)?;
        tracing::info!(app = self.app_id(), record, count = comments.len(), "fetched comments");
        Ok(comments)
    }

    /// Posts a comment and returns its id.
    pub async fn add_record_comment(&self, record: u64, comment: &NewComment) -> Result<u64, KintoneError> {
        let body = write::add_comment_body(self.app_id(), record, comment)?;
        let id = write::decode_comment_id(&self.call(HttpMethod::Post, "record/comment", body).await?)?;
        tracing::info!(app = self.app_id(), record, comment = id, "added comment");
        Ok(id)
    }

    pub async fn delete_comment(&self, record: u64, comment: u64) -> Result<(), KintoneError> {
        let body = write::delete_comment_body(self.app_id(), record, comment)?;
        self.call(HttpMethod::Delete, "record/comment", body).await?;
        tracing::info!(app = self.app_id(), record, comment, "deleted comment");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Cursors
    // -----------------------------------------------------------------------

    /// Opens a cursor over the records matching `query`, `size` (max 500)
    /// records per read.
    pub async fn create_cursor(&self, fields: &[String], query: &str, size: u64) -> Result<Cursor, KintoneError> {
        let body = write::create_cursor_body(self.app_id(), fields, query, size)?;
        let cursor = decode_cursor(&self.call(HttpMethod::Post, "records/cursor", body).await?)?;
        tracing::info!(app = self.app_id(), cursor = %cursor.id, total = cursor.total_count, "created cursor");
        Ok(cursor)
    }

    /// Reads the next batch from a cursor. The service deletes the cursor
    /// once `next` comes back `false`.
    pub async fn get_records_by_cursor(&self, id: &str) -> Result<CursorPage, KintoneError> {
        let body = write::cursor_id_body(id)?;
        let page = decode_cursor_page(&self.call(HttpMethod::Get, "records/cursor", body).await?)?;
        tracing::debug!(cursor = id, count = page.records.len(), next = page.next, "read cursor");
        Ok(page)
    }

    /// Deletes a cursor before it is exhausted.
    pub async fn delete_cursor(&self, id: &str) -> Result<(), KintoneError> {
        let body = write::cursor_id_body(id)?;
        self.call(HttpMethod::Delete, "records/cursor", body).await?;
        tracing::info!(cursor = id, "deleted cursor");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Settings
    // -----------------------------------------------------------------------

    /// The app's form fields.
    pub async fn fields(&self) -> Result<Vec<FieldInfo>, KintoneError> {
        let body = write::app_body(self.app_id())?;
        let fields = decode_field_infos(&self.call(HttpMethod::Get, "form", body).await?)?;
        tracing::info!(app = self.app_id(), count = fields.len(), "fetched form fields");
        Ok(fields)
    }

    /// The app's process management settings. `lang` picks the language
    /// of state and action names (`"en"`, `"ja"`, ...).
    pub async fn get_process(&self, lang: Option<&str>) -> Result<Process, KintoneError> {
        let body = write::process_body(self.app_id(), lang)?;
        let process = decode_process(&self.call(HttpMethod::Get, "app/status", body).await?)?;
        tracing::info!(app = self.app_id(), enabled = process.enable, "fetched process settings");
        Ok(process)
    }

    // -----------------------------------------------------------------------
    // Files
    // -----------------------------------------------------------------------

    /// Uploads a file and returns the key to put in a FILE field.
    ///
    /// The key is valid for three days unless attached to a record.
    pub async fn upload(&self, file_name: &str, content_type: &str, data: &[u8]) -> Result<String, KintoneError> {
        let boundary = multipart::boundary();
        let body = multipart::file_body(&boundary, file_name, content_type, data)?;
        let request = self
            .request(HttpMethod::Post, "file")
            .header("Content-Type", format!("multipart/form-data; boundary={boundary}"))
            .body(body);
        let response = self.send(request).await?;
        let file_key = write::decode_file_key(&response.body)?;
        tracing::info!(file_name, bytes = data.len(), %file_key, "uploaded file");
        Ok(file_key)
    }

    /// Downloads the file stored under `file_key`.
    pub async fn download(&self, file_key: &str) -> Result<FileData, KintoneError> {
        let body = write::file_key_body(file_key)?;
        let response = self.send(self.json_request(HttpMethod::Get, "file", body)).await?;
        let content_type = response
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        tracing::info!(%file_key, bytes = response.body.len(), %content_type, "downloaded file");
        Ok(FileData {
            content_type,
            data: response.body,
        })
    }
}

/// Turns a non-2xx reply into the matching error.
fn error_from(response: ApiResponse, method: HttpMethod, url: &str) -> KintoneError {
    let status = response.status;
    match serde_json::from_slice::<ErrorBody>(&response.body) {
        Ok(body) => {
            tracing::warn!(%method, url, status, code = %body.code, id = %body.id, message = %body.message, "service error");
            KintoneError::Api {
                status,
                code: body.code,
                message: body.message,
                id: body.id,
            }
        }
        Err(_) => {
            let body = String::from_utf8_lossy(&response.body).into_owned();
            tracing::warn!(%method, url, status, "unexpected reply");
            KintoneError::Status { status, body }
        }
    }
}
