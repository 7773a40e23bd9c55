//! Endpoint descriptors.
//!
//! An endpoint names itself with a `(group, name)` pair and performs one HTTP
//! operation through the [`Api`] it is invoked with. Arguments travel as JSON;
//! [`EndpointKey`] layers a typed signature on top.

use crate::{Api, Error, ResponseBody};
use async_trait::async_trait;
use serde_json::Value;
use std::{fmt, future::Future, marker::PhantomData, sync::Arc};

/// Common trait implemented by every registered endpoint.
#[async_trait]
pub trait Endpoint: Send + Sync + 'static {
    /// Namespace the endpoint is registered under.
    fn group(&self) -> &str;

    /// Name of the endpoint, unique within its group.
    fn name(&self) -> &str;

    /// Perform the operation, issuing HTTP calls through `api`.
    async fn call(&self, api: &Api, args: Value) -> Result<ResponseBody, Error>;
}

/// Endpoint backed by an async closure.
///
/// The closure receives its own handle to the facade, so it can hold it across
/// `.await` points.
pub struct FnEndpoint<F> {
    group: String,
    name: String,
    f: F,
}

impl<F> fmt::Debug for FnEndpoint<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnEndpoint")
            .field("group", &self.group)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Build an [`FnEndpoint`].
///
/// ```no_run
/// use api_facade::{Api, RequestOptions, endpoint};
///
/// let ping = endpoint("health", "ping", |api: Api, _args| async move {
///     api.get(RequestOptions::new("/ping")).await
/// });
/// ```
pub fn endpoint<F, Fut>(group: impl Into<String>, name: impl Into<String>, f: F) -> FnEndpoint<F>
where
    F: Fn(Api, Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<ResponseBody, Error>> + Send + 'static,
{
    FnEndpoint {
        group: group.into(),
        name: name.into(),
        f,
    }
}

#[async_trait]
impl<F, Fut> Endpoint for FnEndpoint<F>
where
    F: Fn(Api, Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<ResponseBody, Error>> + Send + 'static,
{
    fn group(&self) -> &str {
        &self.group
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn call(&self, api: &Api, args: Value) -> Result<ResponseBody, Error> {
        (self.f)(api.clone(), args).await
    }
}

/// A registered endpoint bound to the facade that owns it.
#[derive(Clone)]
pub struct BoundEndpoint {
    api: Api,
    endpoint: Arc<dyn Endpoint>,
}

impl BoundEndpoint {
    pub(crate) fn new(api: Api, endpoint: Arc<dyn Endpoint>) -> Self {
        Self { api, endpoint }
    }

    #[must_use]
    pub fn group(&self) -> &str {
        self.endpoint.group()
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.endpoint.name()
    }

    pub async fn call(&self, args: Value) -> Result<ResponseBody, Error> {
        self.endpoint.call(&self.api, args).await
    }
}

impl fmt::Debug for BoundEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BoundEndpoint({}.{})", self.group(), self.name())
    }
}

/// Typed handle for a registered endpoint.
///
/// Declare one next to the descriptor to give call sites a checked signature:
///
/// ```
/// use api_facade::EndpointKey;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize)]
/// struct NewItem { item_name: String }
///
/// #[derive(Deserialize)]
/// #[serde(rename_all = "camelCase")]
/// struct Item { item_id: u64 }
///
/// const CREATE_ITEM: EndpointKey<NewItem, Item> = EndpointKey::new("items", "create");
/// assert_eq!(CREATE_ITEM.to_string(), "items.create");
/// ```
pub struct EndpointKey<A, O> {
    group: &'static str,
    name: &'static str,
    _signature: PhantomData<fn(A) -> O>,
}

impl<A, O> EndpointKey<A, O> {
    #[must_use]
    pub const fn new(group: &'static str, name: &'static str) -> Self {
        Self {
            group,
            name,
            _signature: PhantomData,
        }
    }

    #[must_use]
    pub const fn group(&self) -> &'static str {
        self.group
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl<A, O> Clone for EndpointKey<A, O> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<A, O> Copy for EndpointKey<A, O> {}

impl<A, O> fmt::Debug for EndpointKey<A, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EndpointKey({}.{})", self.group, self.name)
    }
}

impl<A, O> fmt::Display for EndpointKey<A, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.group, self.name)
    }
}
