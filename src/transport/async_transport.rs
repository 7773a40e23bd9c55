use super::{TransportRequest, TransportResponse};
use crate::error::{Error, TransportErrorKind};
use async_trait::async_trait;
use http::Method;
use reqwest::Client;
use std::{sync::Arc, time::Duration};

#[cfg(feature = "rustls")]
fn ensure_rustls_provider() {
    static ONCE: std::sync::Once = std::sync::Once::new();
    ONCE.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}

#[cfg(not(feature = "rustls"))]
fn ensure_rustls_provider() {}

/// Trait implemented by any async HTTP layer.
///
/// A transport returns every response it receives, whatever the status; turning
/// non-2xx statuses into errors is the job of the interceptor middleware.
#[async_trait]
pub trait AsyncTransport: Send + Sync + 'static {
    async fn send(&self, req: TransportRequest) -> Result<TransportResponse, Error>;
}

pub type DynAsyncTransport = Arc<dyn AsyncTransport>;

#[async_trait]
impl<T: AsyncTransport + ?Sized> AsyncTransport for Arc<T> {
    async fn send(&self, req: TransportRequest) -> Result<TransportResponse, Error> {
        (**self).send(req).await
    }
}

/// Default async transport built on `reqwest`.
#[derive(Clone)]
pub struct ReqwestAsync {
    client: Client,
}

impl ReqwestAsync {
    /// Construct a new transport.
    ///
    /// * `insecure` – accept invalid TLS certificates.
    /// * `ua` – User-Agent header.
    /// * `timeout` – per-request timeout.
    /// * `connect_timeout` – connection establishment timeout.
    /// * `no_proxy` – ignore system proxy environment variables.
    ///
    /// The cookie store is always on so session cookies set by the API are sent back.
    pub fn try_new(
        insecure: bool,
        ua: &str,
        timeout: Duration,
        connect_timeout: Duration,
        no_proxy: bool,
    ) -> Result<Self, Error> {
        ensure_rustls_provider();

        let mut builder = Client::builder()
            .danger_accept_invalid_certs(insecure)
            .user_agent(ua)
            .cookie_store(true)
            .connect_timeout(connect_timeout)
            .timeout(timeout);

        if no_proxy {
            builder = builder.no_proxy();
        }

        let client = builder.build().map_err(|err| Error::InvalidConfig {
            message: "failed to build async HTTP client".into(),
            source: Some(Box::new(err)),
        })?;

        Ok(Self { client })
    }

    /// Wrap an already configured `reqwest::Client`.
    #[must_use]
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

fn transport_error(method: &Method, path: &str, err: reqwest::Error) -> Error {
    let kind = if err.is_timeout() {
        TransportErrorKind::Timeout
    } else if err.is_connect() {
        TransportErrorKind::Connect
    } else {
        TransportErrorKind::Other
    };
    Error::Transport {
        method: method.clone(),
        path: path.into(),
        kind,
        source: Box::new(err),
    }
}

#[async_trait]
impl AsyncTransport for ReqwestAsync {
    async fn send(&self, req: TransportRequest) -> Result<TransportResponse, Error> {
        let TransportRequest {
            method,
            url,
            headers,
            query,
            body,
            timeout,
        } = req;
        let path = url.path().to_owned();

        let mut builder = self
            .client
            .request(method.clone(), url)
            .headers(headers)
            .timeout(timeout);
        if !query.is_empty() {
            builder = builder.query(&query);
        }
        if let Some(body) = body {
            if let Some(content_type) = body.content_type {
                builder = builder.header(http::header::CONTENT_TYPE, content_type);
            }
            builder = builder.body(body.bytes);
        }

        let resp = builder
            .send()
            .await
            .map_err(|e| transport_error(&method, &path, e))?;

        let status = resp.status();
        let headers = resp.headers().clone();
        let body = resp
            .bytes()
            .await
            .map_err(|e| transport_error(&method, &path, e))?;

        Ok(TransportResponse {
            status,
            headers,
            body: body.to_vec(),
        })
    }
}
