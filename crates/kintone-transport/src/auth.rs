//! Credentials and the headers that carry them.
//!
//! | Credentials        | Header                                        |
//! |--------------------|-----------------------------------------------|
//! | `Password`         | `X-Cybozu-Authorization: base64(user:pass)`   |
//! | `ApiToken`         | `X-Cybozu-API-Token: t1,t2`                   |
//! | `Session`          | `X-Requested-With: XMLHttpRequest`            |
//! | [`BasicAuth`]      | `Authorization: Basic base64(user:pass)`      |
//!
//! Basic auth is an outer layer some deployments put in front of the
//! service and is sent in addition to the credentials above.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

pub const PASSWORD_HEADER: &str = "X-Cybozu-Authorization";
pub const API_TOKEN_HEADER: &str = "X-Cybozu-API-Token";
pub const SESSION_HEADER: &str = "X-Requested-With";
pub const BASIC_AUTH_HEADER: &str = "Authorization";

fn encode_pair(user: &str, password: &str) -> String {
    STANDARD.encode(format!("{user}:{password}"))
}

/// How requests authenticate against the service.
#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Credentials {
    /// Login name and password of a user.
    Password { user: String, password: String },
    /// One or more API tokens. Several tokens are needed when a request
    /// touches more than one app (lookups, related records).
    ApiToken(Vec<String>),
    /// Reuse the session of a logged-in browser.
    #[default]
    Session,
}

impl Credentials {
    pub fn password(user: impl Into<String>, password: impl Into<String>) -> Self {
        Credentials::Password {
            user: user.into(),
            password: password.into(),
        }
    }

    pub fn api_token(token: impl Into<String>) -> Self {
        Credentials::ApiToken(vec![token.into()])
    }

    pub fn api_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Credentials::ApiToken(tokens.into_iter().map(Into::into).collect())
    }

    /// The header that authenticates a request.
    pub fn header(&self) -> (String, String) {
        match self {
            Credentials::Password { user, password } => {
                (PASSWORD_HEADER.to_string(), encode_pair(user, password))
            }
            Credentials::ApiToken(tokens) => (API_TOKEN_HEADER.to_string(), tokens.join(",")),
            Credentials::Session => (SESSION_HEADER.to_string(), "XMLHttpRequest".to_string()),
        }
    }
}

// Secrets stay out of logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Password { user, .. } => f
                .debug_struct("Password")
                .field("user", user)
                .field("password", &"***")
                .finish(),
            Credentials::ApiToken(tokens) => write!(f, "ApiToken([{} tokens])", tokens.len()),
            Credentials::Session => f.write_str("Session"),
        }
    }
}

/// HTTP basic authentication in front of the service.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicAuth {
    pub user: String,
    pub password: String,
}

impl BasicAuth {
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
        }
    }

    pub fn header(&self) -> (String, String) {
        (
            BASIC_AUTH_HEADER.to_string(),
            format!("Basic {}", encode_pair(&self.user, &self.password)),
        )
    }
}

impl fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuth")
            .field("user", &self.user)
            .field("password", &"***")
            .finish()
    }
}
