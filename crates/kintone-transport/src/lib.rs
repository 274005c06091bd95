//! Transport layer for the kintone client.
//!
//! Provides the [`Transport`] trait: one async call that executes an
//! [`ApiRequest`] and returns the [`ApiResponse`]. The crate does no HTTP
//! itself; hosts plug in whatever client they already use.
//!
//! Also home to [`Credentials`] and the headers they produce.
//!
//! # Feature Flags
//!
//! - `memory` (default): [`MemoryTransport`], a scripted in-process
//!   transport for tests.

#![allow(async_fn_in_trait)]

mod auth;
mod error;
mod http;
#[cfg(feature = "memory")]
mod memory;

pub use auth::{
    API_TOKEN_HEADER, BASIC_AUTH_HEADER, BasicAuth, Credentials, PASSWORD_HEADER, SESSION_HEADER,
};
pub use error::TransportError;
pub use http::{ApiRequest, ApiResponse, HttpMethod};
#[cfg(feature = "memory")]
pub use memory::MemoryTransport;

use std::sync::Arc;

/// Executes requests against the service.
///
/// A non-2xx status is not a transport error: return it as an
/// [`ApiResponse`] and let the caller decode the error body.
pub trait Transport: Send + Sync + 'static {
    /// Sends `request` and waits for the complete response.
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, TransportError>;
}

impl<T: Transport> Transport for Arc<T> {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        (**self).execute(request).await
    }
}
