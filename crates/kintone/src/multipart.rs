//! `multipart/form-data` encoding for file uploads.

use kintone_protocol::ProtocolError;
use rand::Rng;

/// A random boundary that will not occur in practice inside file data.
pub(crate) fn boundary() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 16] = rng.random();
    let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
    format!("kintone-{hex}")
}

/// Quotes a file name for a `Content-Disposition` parameter.
fn escape_quotes(name: &str) -> String {
    name.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Part headers are line-delimited, so a line break in a header value
/// would start a new header.
fn header_value<'a>(what: &str, value: &'a str) -> Result<&'a str, ProtocolError> {
    if value.contains(['\r', '\n']) {
        return Err(ProtocolError::InvalidMessage(format!("{what} contains a line break")));
    }
    Ok(value)
}

/// Builds a body holding one `file` part.
pub(crate) fn file_body(
    boundary: &str,
    file_name: &str,
    content_type: &str,
    data: &[u8],
) -> Result<Vec<u8>, ProtocolError> {
    let head = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n\
         Content-Type: {}\r\n\r\n",
        escape_quotes(header_value("file name", file_name)?),
        header_value("content type", content_type)?,
    );
    let tail = format!("\r\n--{boundary}--\r\n");

    let mut body = Vec::with_capacity(head.len() + data.len() + tail.len());
    body.extend_from_slice(head.as_bytes());
    body.extend_from_slice(data);
    body.extend_from_slice(tail.as_bytes());
    Ok(body)
}
