//! Requests and responses described as plain data.
//!
//! The command layer builds an [`ApiRequest`] and hands it to a
//! [`Transport`](crate::Transport); whatever executes it on the network
//! answers with an [`ApiResponse`]. Nothing here touches a socket.

use std::fmt;

/// HTTP method of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Looks up a header by name, ignoring ASCII case.
fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// An HTTP request ready to be executed.
///
/// `url` is absolute. `body` is empty for requests without one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl ApiRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Appends a header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Appends several headers.
    pub fn headers<I>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.headers.extend(headers);
        self
    }

    /// Sets the body.
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// The value of header `name`, if set.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// The reply to an [`ApiRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// A `200 OK` carrying a JSON body.
    pub fn json(body: impl Into<Vec<u8>>) -> Self {
        Self::new(200, body).with_header("Content-Type", "application/json; charset=utf-8")
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// `true` for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn header_value(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// The media type of the body, without parameters.
    pub fn content_type(&self) -> Option<&str> {
        self.header_value("content-type")
            .map(|v| v.split(';').next().unwrap_or(v).trim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let req = ApiRequest::new(HttpMethod::Post, "https://example.cybozu.com/k/v1/record.json")
            .header("Content-Type", "application/json")
            .body(br#"{"app":1}"#.to_vec());
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.header_value("content-type"), Some("application/json"));
        assert_eq!(req.header_value("x-missing"), None);
        assert_eq!(req.body, br#"{"app":1}"#);
    }

    #[test]
    fn test_response_success_range() {
        assert!(ApiResponse::new(200, "").is_success());
        assert!(ApiResponse::new(204, "").is_success());
        assert!(!ApiResponse::new(302, "").is_success());
        assert!(!ApiResponse::new(520, "").is_success());
    }

    #[test]
    fn test_response_content_type_drops_parameters() {
        let resp = ApiResponse::json("{}");
        assert_eq!(resp.content_type(), Some("application/json"));
        assert_eq!(ApiResponse::new(200, "").content_type(), None);
    }

    #[test]
    fn test_method_display() {
        assert_eq!(HttpMethod::Delete.to_string(), "DELETE");
    }
}
