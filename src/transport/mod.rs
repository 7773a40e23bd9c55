//! Transport layer: the wire-level request/response pair, the default `reqwest`
//! transport and the middleware wrapping it.

pub mod async_transport;
pub(crate) mod middleware;
pub mod request;

#[cfg(feature = "metrics")]
pub(crate) mod metrics;

use http::{HeaderMap, HeaderValue, Method, StatusCode};
use std::time::Duration;
use url::Url;

pub use async_transport::{AsyncTransport, DynAsyncTransport, ReqwestAsync};

/// Encoded request body plus its media type.
#[derive(Clone, Debug)]
pub struct TransportBody {
    pub bytes: Vec<u8>,
    pub content_type: Option<HeaderValue>,
}

/// Fully resolved request as handed to a transport and to request interceptors.
#[derive(Clone, Debug)]
pub struct TransportRequest {
    pub method: Method,
    /// Absolute URL; query pairs are kept separately in `query`.
    pub url: Url,
    pub headers: HeaderMap,
    pub query: Vec<(String, String)>,
    pub body: Option<TransportBody>,
    pub timeout: Duration,
}

impl TransportRequest {
    /// Body bytes as UTF-8, if there is a body and it is valid text.
    #[must_use]
    pub fn body_text(&self) -> Option<&str> {
        self.body
            .as_ref()
            .and_then(|body| std::str::from_utf8(&body.bytes).ok())
    }
}

/// Raw response as returned by a transport and seen by response interceptors.
#[derive(Clone, Debug)]
pub struct TransportResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}
