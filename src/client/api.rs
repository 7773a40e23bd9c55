//! The request facade and its builder.

use crate::{
    Auth, BodySnippetConfig, Endpoint, EndpointKey, Error, Interceptor, Phase, Registry, case,
    endpoint::BoundEndpoint,
    interceptor::InterceptorChain,
    transport::{
        TransportBody, TransportRequest, TransportResponse,
        async_transport::{DynAsyncTransport, ReqwestAsync},
        middleware::InterceptAsync,
        request::{BodyCase, RequestOptions, ResponseBody},
    },
    util::{
        diagnostics,
        url::{endpoint_url, normalize_base_url},
    },
};
use http::{HeaderMap, HeaderValue, Method};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::{sync::Arc, time::Duration};
use url::Url;

#[cfg(feature = "tracing")]
use tracing::{Instrument, field};

const DEFAULT_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Configures and constructs [`Api`].
pub struct ApiBuilder {
    base_url: Url,
    auth: Option<Auth>,
    insecure: bool,
    user_agent: String,
    timeout: Duration,
    connect_timeout: Duration,
    no_proxy: bool,
    default_headers: HeaderMap,
    body_snippet: BodySnippetConfig,
    transport: Option<DynAsyncTransport>,
    endpoints: Vec<Arc<dyn Endpoint>>,
    interceptors: Vec<Interceptor>,
}

impl ApiBuilder {
    fn try_new(base: impl AsRef<str>) -> Result<Self, Error> {
        let base_url = normalize_base_url(base.as_ref())?;
        Ok(Self {
            base_url,
            auth: None,
            insecure: false,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            no_proxy: false,
            default_headers: HeaderMap::new(),
            body_snippet: BodySnippetConfig::default(),
            transport: None,
            endpoints: Vec::new(),
            interceptors: Vec::new(),
        })
    }

    /// Apply an authentication strategy.
    pub fn auth(mut self, auth: Auth) -> Self {
        self.auth = Some(auth);
        self
    }

    pub fn auth_basic(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.auth = Some(Auth::basic(user, password));
        self
    }

    pub fn auth_bearer(mut self, token: impl Into<String>) -> Self {
        self.auth = Some(Auth::bearer(token));
        self
    }

    /// Ignore system proxy environment variables.
    pub fn no_system_proxy(mut self) -> Self {
        self.no_proxy = true;
        self
    }

    /// Accept invalid TLS certificates (**dangerous**).
    pub fn danger_accept_invalid_certs(mut self, yes: bool) -> Self {
        self.insecure = yes;
        self
    }

    /// Override the default `User-Agent` header.
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = ua.into();
        self
    }

    /// Adjust the per-request timeout.
    pub fn timeout(mut self, value: Duration) -> Self {
        self.timeout = value;
        self
    }

    pub fn connect_timeout(mut self, value: Duration) -> Self {
        self.connect_timeout = value;
        self
    }

    /// Add a default header applied to every request.
    pub fn default_header(
        mut self,
        name: http::header::HeaderName,
        value: http::HeaderValue,
    ) -> Self {
        self.default_headers.insert(name, value);
        self
    }

    pub fn default_headers(mut self, headers: HeaderMap) -> Self {
        self.default_headers.extend(headers);
        self
    }

    /// Enable/disable capturing `body_snippet` on errors and decode failures.
    pub fn capture_body_snippet(mut self, enabled: bool) -> Self {
        self.body_snippet.enabled = enabled;
        self
    }

    pub fn max_body_snippet_bytes(mut self, max_bytes: usize) -> Self {
        self.body_snippet.max_bytes = max_bytes;
        self
    }

    /// Send through a custom transport instead of the default `reqwest` one.
    ///
    /// TLS, proxy, user agent and connect-timeout settings only configure the
    /// default transport and are ignored when a custom one is set.
    pub fn transport(mut self, transport: DynAsyncTransport) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Queue an endpoint for registration.
    pub fn endpoint<E: Endpoint>(mut self, endpoint: E) -> Self {
        self.endpoints.push(Arc::new(endpoint));
        self
    }

    pub fn endpoints<I>(mut self, endpoints: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn Endpoint>>,
    {
        self.endpoints.extend(endpoints);
        self
    }

    /// Install an interceptor before the first request.
    pub fn intercept(mut self, interceptor: Interceptor) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    /// Register the queued endpoints and build the facade.
    ///
    /// Registration runs in insertion order and stops at the first duplicate
    /// `group.name`; no facade is returned in that case.
    pub fn build(self) -> Result<Api, Error> {
        let mut registry = Registry::new();
        registry.register_all(self.endpoints)?;

        #[cfg(feature = "metrics")]
        crate::transport::metrics::record_registry_size(registry.len());

        let base_transport: DynAsyncTransport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestAsync::try_new(
                self.insecure,
                &self.user_agent,
                self.timeout,
                self.connect_timeout,
                self.no_proxy,
            )?),
        };

        let interceptors = Arc::new(InterceptorChain::default());
        for interceptor in self.interceptors {
            interceptors.push(interceptor);
        }

        let transport: DynAsyncTransport = Arc::new(InterceptAsync::new(
            base_transport,
            interceptors.clone(),
            self.auth.clone(),
            self.body_snippet,
        ));

        Ok(Api {
            inner: Arc::new(Inner {
                base: self.base_url,
                auth: self.auth,
                timeout: self.timeout,
                default_headers: self.default_headers,
                body_snippet: self.body_snippet,
                registry,
                interceptors,
                transport,
            }),
        })
    }
}

/// HTTP API facade: endpoint registry plus verb helpers.
///
/// Cloning is cheap and clones share the registry, the interceptors and the
/// transport.
#[derive(Clone)]
pub struct Api {
    inner: Arc<Inner>,
}

struct Inner {
    base: Url,
    auth: Option<Auth>,
    timeout: Duration,
    default_headers: HeaderMap,
    body_snippet: BodySnippetConfig,
    registry: Registry,
    interceptors: Arc<InterceptorChain>,
    transport: DynAsyncTransport,
}

impl Api {
    pub fn builder(base: impl AsRef<str>) -> Result<ApiBuilder, Error> {
        ApiBuilder::try_new(base)
    }

    /// Build a facade for `base` with `endpoints` registered and default settings.
    pub fn new<I>(base: impl AsRef<str>, endpoints: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = Arc<dyn Endpoint>>,
    {
        Self::builder(base)?.endpoints(endpoints).build()
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base
    }

    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    /// Look up `group.name` and bind it to this facade.
    pub fn endpoint(&self, group: &str, name: &str) -> Result<BoundEndpoint, Error> {
        let endpoint = self
            .inner
            .registry
            .get(group, name)
            .cloned()
            .ok_or_else(|| Error::UnknownEndpoint {
                group: group.into(),
                name: name.into(),
            })?;
        Ok(BoundEndpoint::new(self.clone(), endpoint))
    }

    /// Invoke a registered endpoint through its typed key.
    pub async fn call<A, O>(&self, key: &EndpointKey<A, O>, args: &A) -> Result<O, Error>
    where
        A: Serialize + Sync,
        O: DeserializeOwned,
    {
        let args = serde_json::to_value(args).map_err(|source| Error::Encode { source })?;
        let body = self.endpoint(key.group(), key.name())?.call(args).await?;
        body.json().map_err(|source| Error::Payload {
            group: key.group().into(),
            name: key.name().into(),
            source: Box::new(source),
        })
    }

    /// Install an interceptor; it applies to every later request on every clone.
    pub fn intercept(&self, interceptor: Interceptor) {
        #[cfg(feature = "tracing")]
        tracing::debug!(phase = ?interceptor.phase(), "installed interceptor");
        self.inner.interceptors.push(interceptor);
    }

    #[must_use]
    pub fn interceptor_count(&self, phase: Phase) -> usize {
        self.inner.interceptors.count(phase)
    }

    /// `GET` with no body.
    pub async fn get(&self, options: impl Into<RequestOptions>) -> Result<ResponseBody, Error> {
        let options = options.into().method(Method::GET);
        self.request(options, BodyCase::Preserve).await
    }

    /// `DELETE` with no body.
    pub async fn delete(&self, options: impl Into<RequestOptions>) -> Result<ResponseBody, Error> {
        let options = options.into().method(Method::DELETE);
        self.request(options, BodyCase::Preserve).await
    }

    /// `POST` with a JSON body. `body_case` accepts a [`BodyCase`] or a plain `bool`.
    pub async fn post<B>(
        &self,
        options: impl Into<RequestOptions>,
        body: &B,
        body_case: impl Into<BodyCase>,
    ) -> Result<ResponseBody, Error>
    where
        B: Serialize + Sync + ?Sized,
    {
        self.send_with_body(Method::POST, options.into(), body, body_case.into())
            .await
    }

    pub async fn put<B>(
        &self,
        options: impl Into<RequestOptions>,
        body: &B,
        body_case: impl Into<BodyCase>,
    ) -> Result<ResponseBody, Error>
    where
        B: Serialize + Sync + ?Sized,
    {
        self.send_with_body(Method::PUT, options.into(), body, body_case.into())
            .await
    }

    pub async fn patch<B>(
        &self,
        options: impl Into<RequestOptions>,
        body: &B,
        body_case: impl Into<BodyCase>,
    ) -> Result<ResponseBody, Error>
    where
        B: Serialize + Sync + ?Sized,
    {
        self.send_with_body(Method::PATCH, options.into(), body, body_case.into())
            .await
    }

    async fn send_with_body<B>(
        &self,
        method: Method,
        options: RequestOptions,
        body: &B,
        body_case: BodyCase,
    ) -> Result<ResponseBody, Error>
    where
        B: Serialize + Sync + ?Sized,
    {
        let body = serde_json::to_value(body).map_err(|source| Error::Encode { source })?;
        let options = options.method(method).body(body);
        self.request(options, body_case).await
    }

    /// Issue one HTTP exchange and normalize the response body.
    ///
    /// A non-`null` body is sent as JSON, with keys rewritten to snake_case when
    /// `body_case` is [`BodyCase::Snake`]. JSON responses come back with camelCase keys;
    /// anything else is returned as is.
    pub async fn request(
        &self,
        options: RequestOptions,
        body_case: impl Into<BodyCase>,
    ) -> Result<ResponseBody, Error> {
        let req = self.prepare(options, body_case.into())?;
        let method = req.method.clone();
        let url = req.url.clone();
        let resp = self.execute(req).await?;
        parse_response_body(
            resp,
            &method,
            &url,
            self.inner.body_snippet,
            self.inner.auth.as_ref(),
        )
    }

    fn prepare(
        &self,
        options: RequestOptions,
        body_case: BodyCase,
    ) -> Result<TransportRequest, Error> {
        let RequestOptions {
            url: target,
            method,
            headers: call_headers,
            query,
            body,
            timeout_override,
        } = options;

        let url = endpoint_url(&self.inner.base, &target)?;

        let mut headers = self.inner.default_headers.clone();
        if let Some(auth) = &self.inner.auth {
            auth.apply(&mut headers)?;
        }
        headers.extend(call_headers);

        let body = match body {
            None | Some(Value::Null) => None,
            Some(value) => {
                let value = match body_case {
                    BodyCase::Snake => case::to_snake_keys(value),
                    BodyCase::Preserve => value,
                };
                let bytes = serde_json::to_vec(&value).map_err(|source| Error::Encode { source })?;
                Some(TransportBody {
                    bytes,
                    content_type: Some(HeaderValue::from_static("application/json")),
                })
            }
        };

        Ok(TransportRequest {
            method,
            url,
            headers,
            query,
            body,
            timeout: timeout_override.unwrap_or(self.inner.timeout),
        })
    }

    async fn execute(&self, req: TransportRequest) -> Result<TransportResponse, Error> {
        #[cfg(feature = "metrics")]
        let _inflight = crate::transport::metrics::InFlightGuard::new();
        #[cfg(any(feature = "tracing", feature = "metrics"))]
        let start = std::time::Instant::now();
        #[cfg(feature = "metrics")]
        let method = req.method.clone();

        #[cfg(feature = "tracing")]
        let span = tracing::info_span!(
            "api.request",
            http.method = %req.method,
            http.host = %req.url.host_str().unwrap_or_default(),
            http.path = %req.url.path(),
            http.status = field::Empty,
            request_id = field::Empty,
            latency_ms = field::Empty,
            error_kind = field::Empty,
        );

        let sent = self.inner.transport.send(req);
        #[cfg(feature = "tracing")]
        let sent = sent.instrument(span.clone());
        let result = sent.await;

        #[cfg(feature = "tracing")]
        {
            span.record("latency_ms", start.elapsed().as_millis() as i64);
            match &result {
                Ok(resp) => {
                    span.record("http.status", resp.status.as_u16() as i64);
                    if let Some(rid) = diagnostics::request_id(&resp.headers) {
                        span.record("request_id", field::display(rid));
                    }
                }
                Err(err) => {
                    span.record("error_kind", field::debug(err.kind()));
                    if let Some(status) = err.status() {
                        span.record("http.status", status.as_u16() as i64);
                    }
                }
            }
        }

        #[cfg(feature = "metrics")]
        match &result {
            Ok(resp) => crate::transport::metrics::record_outcome(
                &method,
                Some(resp.status),
                start.elapsed(),
                None,
            ),
            Err(err) => crate::transport::metrics::record_outcome(
                &method,
                err.status(),
                start.elapsed(),
                Some(err.kind()),
            ),
        }

        result
    }
}

/// Normalize a successful response body.
///
/// JSON media types are parsed and camelCased; other bodies are passed through.
fn parse_response_body(
    resp: TransportResponse,
    method: &Method,
    url: &Url,
    body_snippet: BodySnippetConfig,
    auth: Option<&Auth>,
) -> Result<ResponseBody, Error> {
    if diagnostics::is_json(&resp.headers) {
        if resp.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(ResponseBody::Empty);
        }
        let value: Value = serde_json::from_slice(&resp.body).map_err(|source| Error::Decode {
            status: resp.status,
            method: method.clone(),
            path: url.path().into(),
            request_id: diagnostics::request_id(&resp.headers),
            body_snippet: diagnostics::body_snippet(&resp.body, body_snippet, auth),
            source: Box::new(source),
        })?;
        return Ok(ResponseBody::Json(case::to_camel_keys(value)));
    }

    if resp.body.is_empty() {
        return Ok(ResponseBody::Empty);
    }

    Ok(match String::from_utf8(resp.body) {
        Ok(text) => ResponseBody::Text(text),
        Err(err) => ResponseBody::Binary(err.into_bytes()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::AsyncTransport;
    use async_trait::async_trait;
    use http::{StatusCode, header::CONTENT_TYPE};
    use serde_json::json;
    use std::sync::Mutex;

    /// Records requests and answers every one with a fixed response.
    struct Canned {
        seen: Mutex<Vec<TransportRequest>>,
        status: StatusCode,
        content_type: Option<&'static str>,
        body: &'static [u8],
    }

    impl Canned {
        fn new(
            status: StatusCode,
            content_type: Option<&'static str>,
            body: &'static [u8],
        ) -> Arc<Self> {
            Arc::new(Self {
                seen: Mutex::new(Vec::new()),
                status,
                content_type,
                body,
            })
        }

        fn last(&self) -> TransportRequest {
            self.seen.lock().unwrap().last().cloned().unwrap()
        }
    }

    #[async_trait]
    impl AsyncTransport for Canned {
        async fn send(&self, req: TransportRequest) -> Result<TransportResponse, Error> {
            self.seen.lock().unwrap().push(req);
            let mut headers = HeaderMap::new();
            if let Some(ct) = self.content_type {
                headers.insert(CONTENT_TYPE, HeaderValue::from_static(ct));
            }
            Ok(TransportResponse {
                status: self.status,
                headers,
                body: self.body.to_vec(),
            })
        }
    }

    fn api_with(transport: Arc<Canned>) -> Api {
        Api::builder("https://api.example.com/v1")
            .unwrap()
            .auth_bearer("t0k")
            .transport(transport)
            .build()
            .unwrap()
    }

    fn block_on<F: std::future::Future>(fut: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
            .block_on(fut)
    }

    #[test]
    fn prepare_merges_headers_and_snake_cases_body() {
        let transport = Canned::new(StatusCode::OK, None, b"");
        let api = api_with(transport.clone());

        block_on(api.post(
            RequestOptions::new("/items").query_pair("dry_run", "1"),
            &json!({ "itemName": "x" }),
            true,
        ))
        .unwrap();

        let req = transport.last();
        assert_eq!(req.method, Method::POST);
        assert_eq!(req.url.as_str(), "https://api.example.com/v1/items");
        assert_eq!(req.query, [("dry_run".to_owned(), "1".to_owned())]);
        assert_eq!(req.headers[http::header::AUTHORIZATION], "Bearer t0k");
        assert_eq!(req.body_text(), Some(r#"{"item_name":"x"}"#));
        assert_eq!(
            req.body.unwrap().content_type.unwrap(),
            "application/json"
        );
    }

    #[test]
    fn null_body_is_not_sent() {
        let transport = Canned::new(StatusCode::NO_CONTENT, None, b"");
        let api = api_with(transport.clone());

        let body = block_on(api.put("/items/1", &Value::Null, BodyCase::Snake)).unwrap();
        assert_eq!(body, ResponseBody::Empty);
        assert!(transport.last().body.is_none());
    }

    #[test]
    fn json_response_is_camelized() {
        let transport = Canned::new(
            StatusCode::OK,
            Some("application/json; charset=utf-8"),
            br#"{"item_id":5,"item_name":"x"}"#,
        );
        let api = api_with(transport);

        let body = block_on(api.get("/items/5")).unwrap();
        assert_eq!(body, ResponseBody::Json(json!({ "itemId": 5, "itemName": "x" })));
    }

    #[test]
    fn invalid_json_is_a_decode_error() {
        let transport = Canned::new(StatusCode::OK, Some("application/json"), b"{not json");
        let api = api_with(transport);

        let err = block_on(api.get("/broken")).unwrap_err();
        match err {
            Error::Decode { status, path, .. } => {
                assert_eq!(status, StatusCode::OK);
                assert_eq!(&*path, "/v1/broken");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn binary_response_passes_through() {
        let transport = Canned::new(
            StatusCode::OK,
            Some("application/octet-stream"),
            &[0xff, 0x00],
        );
        let api = api_with(transport);

        let body = block_on(api.delete("/blob")).unwrap();
        assert_eq!(body, ResponseBody::Binary(vec![0xff, 0x00]));
    }

    #[test]
    fn per_call_timeout_overrides_default() {
        let transport = Canned::new(StatusCode::OK, None, b"ok");
        let api = api_with(transport.clone());

        block_on(api.get(RequestOptions::new("/slow").timeout(Duration::from_secs(2)))).unwrap();
        assert_eq!(transport.last().timeout, Duration::from_secs(2));

        block_on(api.get("/fast")).unwrap();
        assert_eq!(transport.last().timeout, Duration::from_secs(30));
    }
}
