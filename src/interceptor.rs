//! Request/response interceptors.
//!
//! Interceptors form two chains folded like promise chains: each link maps a
//! fulfilled value through `on_fulfilled` and an error through `on_rejected`.
//! A request-phase `on_rejected` only sees errors raised by earlier links; a
//! response-phase `on_rejected` also sees transport failures and non-2xx statuses,
//! and may recover by returning a response.
//!
//! Request interceptors run newest first; response interceptors run in
//! registration order.

use crate::{
    Error,
    transport::{TransportRequest, TransportResponse},
};
use async_trait::async_trait;
use std::sync::{Arc, PoisonError, RwLock};

/// Which chain an interceptor is installed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Request,
    Response,
}

/// Hook run before a request is handed to the transport.
#[async_trait]
pub trait RequestInterceptor: Send + Sync + 'static {
    async fn on_fulfilled(&self, request: TransportRequest) -> Result<TransportRequest, Error>;

    async fn on_rejected(&self, error: Error) -> Result<TransportRequest, Error> {
        Err(error)
    }
}

/// Hook run on the transport outcome before the body is normalized.
#[async_trait]
pub trait ResponseInterceptor: Send + Sync + 'static {
    async fn on_fulfilled(&self, response: TransportResponse) -> Result<TransportResponse, Error>;

    async fn on_rejected(&self, error: Error) -> Result<TransportResponse, Error> {
        Err(error)
    }
}

type Fulfilled<T> = Box<dyn Fn(&mut T) -> Result<(), Error> + Send + Sync>;
type Rejected<T> = Box<dyn Fn(Error) -> Result<T, Error> + Send + Sync>;

/// Closure-backed interceptor for either phase.
struct FnInterceptor<T> {
    fulfilled: Fulfilled<T>,
    rejected: Option<Rejected<T>>,
}

impl<T> FnInterceptor<T> {
    fn handle_fulfilled(&self, mut value: T) -> Result<T, Error> {
        (self.fulfilled)(&mut value)?;
        Ok(value)
    }

    fn handle_rejected(&self, error: Error) -> Result<T, Error> {
        match &self.rejected {
            Some(rejected) => rejected(error),
            None => Err(error),
        }
    }
}

#[async_trait]
impl RequestInterceptor for FnInterceptor<TransportRequest> {
    async fn on_fulfilled(&self, request: TransportRequest) -> Result<TransportRequest, Error> {
        self.handle_fulfilled(request)
    }

    async fn on_rejected(&self, error: Error) -> Result<TransportRequest, Error> {
        self.handle_rejected(error)
    }
}

#[async_trait]
impl ResponseInterceptor for FnInterceptor<TransportResponse> {
    async fn on_fulfilled(&self, response: TransportResponse) -> Result<TransportResponse, Error> {
        self.handle_fulfilled(response)
    }

    async fn on_rejected(&self, error: Error) -> Result<TransportResponse, Error> {
        self.handle_rejected(error)
    }
}

/// An interceptor bound to its phase, ready for [`crate::Api::intercept`].
#[derive(Clone)]
pub enum Interceptor {
    Request(Arc<dyn RequestInterceptor>),
    Response(Arc<dyn ResponseInterceptor>),
}

impl Interceptor {
    /// Request interceptor that may edit the outgoing request in place.
    pub fn request<F>(on_fulfilled: F) -> Self
    where
        F: Fn(&mut TransportRequest) -> Result<(), Error> + Send + Sync + 'static,
    {
        Self::Request(Arc::new(FnInterceptor {
            fulfilled: Box::new(on_fulfilled),
            rejected: None,
        }))
    }

    pub fn request_with<F, R>(on_fulfilled: F, on_rejected: R) -> Self
    where
        F: Fn(&mut TransportRequest) -> Result<(), Error> + Send + Sync + 'static,
        R: Fn(Error) -> Result<TransportRequest, Error> + Send + Sync + 'static,
    {
        Self::Request(Arc::new(FnInterceptor {
            fulfilled: Box::new(on_fulfilled),
            rejected: Some(Box::new(on_rejected)),
        }))
    }

    /// Response interceptor that may edit a successful response in place.
    pub fn response<F>(on_fulfilled: F) -> Self
    where
        F: Fn(&mut TransportResponse) -> Result<(), Error> + Send + Sync + 'static,
    {
        Self::Response(Arc::new(FnInterceptor {
            fulfilled: Box::new(on_fulfilled),
            rejected: None,
        }))
    }

    pub fn response_with<F, R>(on_fulfilled: F, on_rejected: R) -> Self
    where
        F: Fn(&mut TransportResponse) -> Result<(), Error> + Send + Sync + 'static,
        R: Fn(Error) -> Result<TransportResponse, Error> + Send + Sync + 'static,
    {
        Self::Response(Arc::new(FnInterceptor {
            fulfilled: Box::new(on_fulfilled),
            rejected: Some(Box::new(on_rejected)),
        }))
    }

    pub fn from_request<I: RequestInterceptor>(interceptor: I) -> Self {
        Self::Request(Arc::new(interceptor))
    }

    pub fn from_response<I: ResponseInterceptor>(interceptor: I) -> Self {
        Self::Response(Arc::new(interceptor))
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        match self {
            Self::Request(_) => Phase::Request,
            Self::Response(_) => Phase::Response,
        }
    }
}

/// Shared, append-only interceptor lists.
#[derive(Default)]
pub(crate) struct InterceptorChain {
    request: RwLock<Vec<Arc<dyn RequestInterceptor>>>,
    response: RwLock<Vec<Arc<dyn ResponseInterceptor>>>,
}

impl InterceptorChain {
    pub(crate) fn push(&self, interceptor: Interceptor) {
        match interceptor {
            Interceptor::Request(i) => self
                .request
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .push(i),
            Interceptor::Response(i) => self
                .response
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .push(i),
        }
    }

    pub(crate) fn count(&self, phase: Phase) -> usize {
        match phase {
            Phase::Request => self.request.read().unwrap_or_else(PoisonError::into_inner).len(),
            Phase::Response => self
                .response
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .len(),
        }
    }

    // Snapshots are taken so no lock is held across an `.await`.
    fn request_snapshot(&self) -> Vec<Arc<dyn RequestInterceptor>> {
        self.request
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn response_snapshot(&self) -> Vec<Arc<dyn ResponseInterceptor>> {
        self.response
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) async fn run_request(
        &self,
        request: TransportRequest,
    ) -> Result<TransportRequest, Error> {
        let mut state = Ok(request);
        for interceptor in self.request_snapshot().into_iter().rev() {
            state = match state {
                Ok(request) => interceptor.on_fulfilled(request).await,
                Err(error) => interceptor.on_rejected(error).await,
            };
        }
        state
    }

    pub(crate) async fn run_response(
        &self,
        outcome: Result<TransportResponse, Error>,
    ) -> Result<TransportResponse, Error> {
        let mut state = outcome;
        for interceptor in self.response_snapshot() {
            state = match state {
                Ok(response) => interceptor.on_fulfilled(response).await,
                Err(error) => interceptor.on_rejected(error).await,
            };
        }
        state
    }
}
