use http::{HeaderMap, HeaderName, HeaderValue, Method};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

/// How an outbound JSON body's keys are treated before sending.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BodyCase {
    /// Send the body exactly as given.
    #[default]
    Preserve,
    /// Rewrite every object key to snake_case first.
    Snake,
}

impl From<bool> for BodyCase {
    fn from(convert_to_snake_case: bool) -> Self {
        if convert_to_snake_case {
            Self::Snake
        } else {
            Self::Preserve
        }
    }
}

/// Per-call request description.
///
/// Built fresh for every call and consumed by [`crate::Api::request`].
#[derive(Clone, Debug)]
pub struct RequestOptions {
    /// Relative to the base address, or absolute.
    pub url: String,
    pub method: Method,
    pub headers: HeaderMap,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    pub timeout_override: Option<Duration>,
}

impl RequestOptions {
    /// `GET` request to `url`; the verb helpers override the method.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: Method::GET,
            headers: HeaderMap::new(),
            query: Vec::new(),
            body: None,
            timeout_override: None,
        }
    }

    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    #[must_use]
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    #[must_use]
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers.extend(headers);
        self
    }

    #[must_use]
    pub fn query_pair(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    #[must_use]
    pub fn query_pairs<I, K, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.query
            .extend(pairs.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    #[must_use]
    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout_override = Some(timeout);
        self
    }
}

impl From<&str> for RequestOptions {
    fn from(url: &str) -> Self {
        Self::new(url)
    }
}

impl From<String> for RequestOptions {
    fn from(url: String) -> Self {
        Self::new(url)
    }
}

/// Normalized response body.
#[derive(Clone, Debug, PartialEq)]
pub enum ResponseBody {
    /// JSON response with every object key converted to camelCase.
    Json(Value),
    /// Non-JSON response that is valid UTF-8, untouched.
    Text(String),
    /// Non-JSON response that is not valid UTF-8, untouched.
    Binary(Vec<u8>),
    /// Zero-length response.
    Empty,
}

impl ResponseBody {
    #[must_use]
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_json(&self) -> bool {
        matches!(self, Self::Json(_))
    }

    /// View the body as a JSON value: text becomes a JSON string and an empty body
    /// becomes `null`. Binary bodies have no JSON view.
    pub fn into_value(self) -> Option<Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::Text(text) => Some(Value::String(text)),
            Self::Empty => Some(Value::Null),
            Self::Binary(_) => None,
        }
    }

    /// Deserialize the JSON view of the body into `T`.
    pub fn json<T: DeserializeOwned>(self) -> Result<T, serde_json::Error> {
        match self.into_value() {
            Some(value) => serde_json::from_value(value),
            None => Err(serde::de::Error::custom("binary body has no JSON view")),
        }
    }

    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Self::Json(value) => value.to_string().into_bytes(),
            Self::Text(text) => text.into_bytes(),
            Self::Binary(bytes) => bytes,
            Self::Empty => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[test]
    fn body_case_from_flag() {
        assert_eq!(BodyCase::from(true), BodyCase::Snake);
        assert_eq!(BodyCase::from(false), BodyCase::Preserve);
        assert_eq!(BodyCase::default(), BodyCase::Preserve);
    }

    #[test]
    fn options_builder_accumulates_query_and_headers() {
        let opts = RequestOptions::new("/items")
            .query_pair("page", "2")
            .query_pairs([("sort", "name")])
            .header(
                http::header::ACCEPT,
                HeaderValue::from_static("application/json"),
            );
        assert_eq!(opts.method, Method::GET);
        assert_eq!(opts.query.len(), 2);
        assert_eq!(opts.headers[http::header::ACCEPT], "application/json");
    }

    #[test]
    fn typed_views_of_body() {
        #[derive(Deserialize, PartialEq, Debug)]
        #[serde(rename_all = "camelCase")]
        struct Item {
            item_id: u32,
        }

        let item: Item = ResponseBody::Json(json!({ "itemId": 5 })).json().unwrap();
        assert_eq!(item, Item { item_id: 5 });

        let text: String = ResponseBody::Text("pong".into()).json().unwrap();
        assert_eq!(text, "pong");

        ResponseBody::Empty.json::<()>().unwrap();
        let missing: Option<Item> = ResponseBody::Empty.json().unwrap();
        assert!(missing.is_none());

        assert!(ResponseBody::Binary(vec![0xff]).json::<Value>().is_err());
    }
}
