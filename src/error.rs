use http::{Method, StatusCode};
use std::{error::Error as StdError, fmt};
use thiserror::Error;
use url::Url;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Copy)]
pub struct BodySnippetConfig {
    pub enabled: bool,
    pub max_bytes: usize,
}

impl Default for BodySnippetConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_bytes: 4096,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    DuplicateEndpoint,
    UnknownEndpoint,
    Status,
    Transport,
    Decode,
    Encode,
    Payload,
    Rejected,
    InvalidConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum TransportErrorKind {
    Timeout,
    Connect,
    Other,
}

/// Non-2xx response details.
#[derive(Debug, Clone)]
pub struct HttpError {
    pub status: StatusCode,
    pub method: Method,
    /// Sanitized URL: no query/fragment/userinfo.
    pub url: Box<Url>,
    pub message: Option<Box<str>>,
    pub request_id: Option<Box<str>>,
    pub body_snippet: Option<Box<str>>,
}

impl HttpError {
    #[must_use]
    pub fn path(&self) -> &str {
        self.url.path()
    }
}

/// All errors returned by the facade.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("Endpoint {group}.{name} already defined")]
    DuplicateEndpoint { group: Box<str>, name: Box<str> },

    #[error("Endpoint {group}.{name} is not registered")]
    UnknownEndpoint { group: Box<str>, name: Box<str> },

    #[error("{0}")]
    Status(HttpError),

    #[error("Transport error during {method} {path}: {source}")]
    Transport {
        method: Method,
        path: Box<str>,
        kind: TransportErrorKind,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    #[error("Decode error (HTTP {status}) during {method} {path}: {source}")]
    Decode {
        status: StatusCode,
        method: Method,
        path: Box<str>,
        request_id: Option<Box<str>>,
        body_snippet: Option<Box<str>>,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    #[error("Failed to encode request payload: {source}")]
    Encode {
        #[source]
        source: serde_json::Error,
    },

    #[error("Unexpected payload from {group}.{name}: {source}")]
    Payload {
        group: Box<str>,
        name: Box<str>,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    #[error("Rejected: {message}")]
    Rejected {
        message: Box<str>,
        #[source]
        source: Option<Box<dyn StdError + Send + Sync>>,
    },

    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        message: Box<str>,
        #[source]
        source: Option<Box<dyn StdError + Send + Sync>>,
    },
}

impl Error {
    /// Build the error an interceptor returns to abort a request.
    #[must_use]
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into().into_boxed_str(),
            source: None,
        }
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DuplicateEndpoint { .. } => ErrorKind::DuplicateEndpoint,
            Self::UnknownEndpoint { .. } => ErrorKind::UnknownEndpoint,
            Self::Status(_) => ErrorKind::Status,
            Self::Transport { .. } => ErrorKind::Transport,
            Self::Decode { .. } => ErrorKind::Decode,
            Self::Encode { .. } => ErrorKind::Encode,
            Self::Payload { .. } => ErrorKind::Payload,
            Self::Rejected { .. } => ErrorKind::Rejected,
            Self::InvalidConfig { .. } => ErrorKind::InvalidConfig,
        }
    }

    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status(e) => Some(e.status),
            Self::Decode { status, .. } => Some(*status),
            _ => None,
        }
    }

    #[must_use]
    pub fn request_id(&self) -> Option<&str> {
        match self {
            Self::Status(e) => e.request_id.as_deref(),
            Self::Decode { request_id, .. } => request_id.as_deref(),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_status(&self) -> bool {
        matches!(self, Self::Status(_))
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {} ({} {})", self.status, self.method, self.path())?;
        if let Some(message) = self.message.as_deref() {
            write!(f, ": {message}")?;
        }
        if let Some(request_id) = self.request_id.as_deref() {
            write!(f, " [request-id: {request_id}]")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_endpoint_names_group_and_endpoint() {
        let err = Error::DuplicateEndpoint {
            group: "items".into(),
            name: "create".into(),
        };
        assert_eq!(err.to_string(), "Endpoint items.create already defined");
        assert_eq!(err.kind(), ErrorKind::DuplicateEndpoint);
        assert_eq!(err.status(), None);
    }

    #[test]
    fn status_error_exposes_status_and_request_id() {
        let err = Error::Status(HttpError {
            status: StatusCode::NOT_FOUND,
            method: Method::GET,
            url: Box::new(Url::parse("https://api.example.com/items/1").unwrap()),
            message: Some("no such item".into()),
            request_id: Some("req-7".into()),
            body_snippet: None,
        });
        assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
        assert_eq!(err.request_id(), Some("req-7"));
        assert_eq!(
            err.to_string(),
            "HTTP 404 Not Found (GET /items/1): no such item [request-id: req-7]"
        );
    }
}
