//! Internal helpers shared by the client and middleware layers.

pub(crate) mod diagnostics;
pub(crate) mod redact;
pub(crate) mod url;
