use crate::error::RequestError;
use crate::params::{DeclaredParameter, Location};
use crate::router::ParamVec;
use crate::schema::SchemaKind;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// An inbound request as the validation pipeline sees it.
///
/// The body can be taken once; a second attempt is [`RequestError::BodyConsumed`].
#[derive(Debug, Clone, Default)]
pub struct Request {
    method: String,
    url: String,
    /// Header names are stored lowercase.
    headers: HashMap<String, String>,
    path_params: ParamVec,
    query: Map<String, Value>,
    body: Option<Vec<u8>>,
    body_taken: bool,
}

impl Request {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        let url = url.into();
        let query = parse_query_params(&url);
        Self {
            method: method.into(),
            url,
            query,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    #[must_use]
    pub fn with_json(self, body: &Value) -> Self {
        let bytes = body.to_string().into_bytes();
        self.with_header("content-type", "application/json").with_body(bytes)
    }

    /// Bind a path parameter. Later bindings of the same name win.
    #[must_use]
    pub fn with_path_param(mut self, name: &str, value: impl Into<String>) -> Self {
        self.path_params.push((Arc::from(name), value.into()));
        self
    }

    pub(crate) fn set_path_params(&mut self, params: ParamVec) {
        self.path_params = params;
    }

    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// URL path without the query string.
    #[must_use]
    pub fn path(&self) -> &str {
        self.url.split('?').next().unwrap_or("/")
    }

    /// Header by name (case-insensitive).
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        match self.headers.get(name) {
            Some(v) => Some(v.as_str()),
            None => self.headers.get(&name.to_ascii_lowercase()).map(String::as_str),
        }
    }

    #[must_use]
    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn query(&self) -> &Map<String, Value> {
        &self.query
    }

    /// Take the body bytes. `Ok(None)` when the request has no body.
    pub fn take_body(&mut self) -> Result<Option<Vec<u8>>, RequestError> {
        if self.body_taken {
            return Err(RequestError::BodyConsumed);
        }
        self.body_taken = true;
        Ok(self.body.take())
    }
}

/// Parse the query string of a URL.
///
/// The whole URL is percent-decoded first, then split at the first `?`, on
/// `&`, and once on `=` per pair. A repeated key turns its value into a list
/// in arrival order. A pair without `=` has an empty value.
#[must_use]
pub fn parse_query_params(url: &str) -> Map<String, Value> {
    let decoded = match urlencoding::decode(url) {
        Ok(s) => s.into_owned(),
        Err(_) => String::from_utf8_lossy(&urlencoding::decode_binary(url.as_bytes())).into_owned(),
    };
    let mut params = Map::new();
    let Some((_, query)) = decoded.split_once('?') else {
        return params;
    };

    for pair in query.split('&').filter(|p| !p.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        let value = Value::String(value.to_string());
        match params.get_mut(key) {
            None => {
                params.insert(key.to_string(), value);
            }
            Some(Value::Array(list)) => list.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
        }
    }
    debug!(param_count = params.len(), "Query params parsed");
    params
}

/// Raw value of one declared parameter, or `None` when the request lacks it.
///
/// An array-kind parameter given a single value receives a one-element list.
pub fn extract_parameter(
    request: &Request,
    param: &DeclaredParameter,
) -> Result<Option<Value>, RequestError> {
    let name = param.name();
    let raw = match param.location() {
        Location::Query => request.query().get(name).cloned(),
        Location::Path => request.path_param(name).map(|v| Value::String(v.to_string())),
        Location::Header => request.header(name).map(|v| Value::String(v.to_string())),
        Location::Cookie => {
            return Err(RequestError::NotImplemented {
                feature: "cookie parameters".to_string(),
            })
        }
    };
    Ok(raw.map(|value| match value {
        Value::Array(_) => value,
        scalar if param.schema().kind() == SchemaKind::Array => Value::Array(vec![scalar]),
        scalar => scalar,
    }))
}
