//! Re-exports for middleware layers.

pub(crate) mod intercept;

pub(crate) use intercept::InterceptAsync;
