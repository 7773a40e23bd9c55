use crate::{Auth, BodySnippetConfig, Error, HttpError};
use http::{
    HeaderMap, Method, StatusCode,
    header::CONTENT_TYPE,
};
use url::Url;

use super::{
    redact::{redact_text, truncate_utf8},
    url::sanitize_url_for_error,
};

pub(crate) fn request_id(headers: &HeaderMap) -> Option<Box<str>> {
    for name in [
        "x-request-id",
        "x-correlation-id",
        "x-amzn-requestid",
        "x-amz-request-id",
    ] {
        if let Some(value) = headers.get(name).and_then(|v| v.to_str().ok()) {
            let value = value.trim();
            if !value.is_empty() {
                return Some(value.to_string().into_boxed_str());
            }
        }
    }
    None
}

/// Whether the response declares a JSON media type (`application/json`, `*/*+json`).
///
/// `HeaderMap` lookups are case-insensitive, so `Content-Type` and `content-type`
/// are the same header here.
pub(crate) fn is_json(headers: &HeaderMap) -> bool {
    let Some(raw) = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok()) else {
        return false;
    };
    let essence = raw
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "application/json" || essence.ends_with("+json")
}

pub(crate) fn extract_message(body: &[u8]) -> Option<Box<str>> {
    let Ok(value) = serde_json::from_slice::<serde_json::Value>(body) else {
        return None;
    };

    let candidates = ["message", "error", "error_message", "errorMessage", "detail"];
    for key in candidates {
        if let Some(msg) = value.get(key).and_then(|v| v.as_str()) {
            let msg = msg.trim();
            if !msg.is_empty() {
                return Some(msg.to_string().into_boxed_str());
            }
        }
    }
    None
}

pub(crate) fn body_snippet(
    body: &[u8],
    config: BodySnippetConfig,
    auth: Option<&Auth>,
) -> Option<Box<str>> {
    if !config.enabled || body.is_empty() {
        return None;
    }

    let body = String::from_utf8_lossy(body);
    let snippet = truncate_utf8(&body, config.max_bytes).to_string();
    Some(redact_text(snippet, auth).into_boxed_str())
}

/// Build the `Error::Status` for a non-2xx response.
pub(crate) fn status_error(
    status: StatusCode,
    method: &Method,
    url: &Url,
    headers: &HeaderMap,
    body: &[u8],
    config: BodySnippetConfig,
    auth: Option<&Auth>,
) -> Error {
    let message = extract_message(body).map(|msg| redact_text(msg.into(), auth).into_boxed_str());
    Error::Status(HttpError {
        status,
        method: method.clone(),
        url: Box::new(sanitize_url_for_error(url)),
        message,
        request_id: request_id(headers),
        body_snippet: body_snippet(body, config, auth),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    fn with_content_type(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn json_detection_ignores_parameters_and_case() {
        assert!(is_json(&with_content_type("application/json")));
        assert!(is_json(&with_content_type("Application/JSON; charset=utf-8")));
        assert!(is_json(&with_content_type("application/problem+json")));
        assert!(!is_json(&with_content_type("text/plain")));
        assert!(!is_json(&HeaderMap::new()));
    }

    #[test]
    fn status_error_redacts_secrets() {
        let auth = Auth::bearer("hunter2");
        let url = Url::parse("https://u:p@example.com/items?q=1").unwrap();
        let err = status_error(
            StatusCode::BAD_REQUEST,
            &Method::POST,
            &url,
            &HeaderMap::new(),
            br#"{"message":"token hunter2 rejected"}"#,
            BodySnippetConfig::default(),
            Some(&auth),
        );
        let Error::Status(http) = err else {
            panic!("expected status error");
        };
        assert_eq!(http.url.as_str(), "https://example.com/items");
        assert_eq!(http.message.as_deref(), Some("token <redacted> rejected"));
        assert!(!http.body_snippet.unwrap_or_default().contains("hunter2"));
    }

    #[test]
    fn request_id_prefers_first_present_header() {
        let mut headers = HeaderMap::new();
        headers.insert("x-correlation-id", HeaderValue::from_static(" corr-1 "));
        assert_eq!(request_id(&headers).as_deref(), Some("corr-1"));
    }
}
