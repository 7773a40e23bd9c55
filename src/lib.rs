//! Thin async HTTP API facade.
//!
//! * [`Api`] wraps a transport (`reqwest` by default) and exposes `get`, `delete`,
//!   `post`, `put` and `patch`.
//! * Endpoints are registered once, at construction, under `group.name` and are
//!   reachable through [`Api::registry`], [`Api::endpoint`] or a typed
//!   [`EndpointKey`].
//! * Outbound JSON bodies can be snake_cased; inbound JSON bodies are always
//!   camelCased. Other bodies pass through untouched.
//! * Interceptors hook into the request and response phases.

pub mod auth;
pub mod case;
pub mod client;
pub mod endpoint;
pub mod error;
pub mod interceptor;
pub mod registry;
pub mod transport;

mod util;

pub use auth::{Auth, SecretString};
pub use client::{Api, ApiBuilder};
pub use endpoint::{BoundEndpoint, Endpoint, EndpointKey, FnEndpoint, endpoint};
pub use error::{BodySnippetConfig, Error, ErrorKind, HttpError, Result, TransportErrorKind};
pub use interceptor::{Interceptor, Phase, RequestInterceptor, ResponseInterceptor};
pub use registry::{Group, Registry};
pub use transport::{
    AsyncTransport, DynAsyncTransport, TransportBody, TransportRequest, TransportResponse,
    request::{BodyCase, RequestOptions, ResponseBody},
};
