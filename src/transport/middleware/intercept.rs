//! Interceptor middleware (async).
//!
//! * Runs the request chain, then the inner transport.
//! * Turns non-2xx statuses into `Error::Status` before the response chain, so
//!   response interceptors can recover from them.

use crate::{
    Auth, BodySnippetConfig, Error,
    interceptor::InterceptorChain,
    transport::{TransportRequest, TransportResponse, async_transport::AsyncTransport},
    util::diagnostics,
};
use async_trait::async_trait;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct InterceptAsync<T> {
    inner: T,
    chain: Arc<InterceptorChain>,
    auth: Option<Auth>,
    body_snippet: BodySnippetConfig,
}

impl<T> InterceptAsync<T> {
    pub(crate) fn new(
        inner: T,
        chain: Arc<InterceptorChain>,
        auth: Option<Auth>,
        body_snippet: BodySnippetConfig,
    ) -> Self {
        Self {
            inner,
            chain,
            auth,
            body_snippet,
        }
    }
}

#[async_trait]
impl<T: AsyncTransport> AsyncTransport for InterceptAsync<T> {
    async fn send(&self, req: TransportRequest) -> Result<TransportResponse, Error> {
        let req = self.chain.run_request(req).await?;
        let method = req.method.clone();
        let url = req.url.clone();

        let outcome = self.inner.send(req).await.and_then(|resp| {
            if resp.status.is_success() {
                Ok(resp)
            } else {
                Err(diagnostics::status_error(
                    resp.status,
                    &method,
                    &url,
                    &resp.headers,
                    &resp.body,
                    self.body_snippet,
                    self.auth.as_ref(),
                ))
            }
        });

        self.chain.run_response(outcome).await
    }
}
