//! Request facade.

pub mod api;

pub use api::{Api, ApiBuilder};
