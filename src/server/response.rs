use crate::validator::ValidationErrors;
use serde::Serialize;
use serde_json::{json, Value};
use smallvec::SmallVec;
use std::sync::Arc;

/// Response headers; inline for the handful most responses carry.
pub type HeaderVec = SmallVec<[(Arc<str>, String); 8]>;

pub const JSON_UTF8: &str = "application/json;charset=UTF-8";
pub const HTML_UTF8: &str = "text/html; charset=UTF-8";

/// Response produced by a handler or by the router itself.
#[derive(Debug, Clone, Serialize)]
pub struct HandlerResponse {
    pub status: u16,
    #[serde(skip_serializing)]
    pub headers: HeaderVec,
    /// JSON body. A string body under a non-JSON content type is sent as-is.
    pub body: Value,
}

impl HandlerResponse {
    #[must_use]
    pub fn new(status: u16, headers: HeaderVec, body: Value) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    #[must_use]
    pub fn json(status: u16, body: Value) -> Self {
        let mut headers = HeaderVec::new();
        headers.push((Arc::from("content-type"), "application/json".to_string()));
        Self {
            status,
            headers,
            body,
        }
    }

    #[must_use]
    pub fn html(body: String) -> Self {
        let mut headers = HeaderVec::new();
        headers.push((Arc::from("content-type"), HTML_UTF8.to_string()));
        Self {
            status: 200,
            headers,
            body: Value::String(body),
        }
    }

    #[must_use]
    pub fn error(status: u16, message: &str) -> Self {
        Self::json(status, json!({ "error": message }))
    }

    /// The 400 envelope for a request that failed validation.
    #[must_use]
    pub fn validation_error(errors: &ValidationErrors) -> Self {
        Self::json(
            400,
            json!({
                "errors": errors,
                "success": false,
                "result": {},
            }),
        )
    }

    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Add or replace a header.
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.headers.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(name)) {
            Some(slot) => slot.1 = value,
            None => self.headers.push((Arc::from(name), value)),
        }
    }

    #[must_use]
    pub fn is_json(&self) -> bool {
        self.get_header("content-type")
            .map_or(true, |ct| ct.contains("json"))
    }

    /// Serialized body bytes.
    #[must_use]
    pub fn body_bytes(&self) -> Vec<u8> {
        match &self.body {
            Value::String(s) if !self.is_json() => s.clone().into_bytes(),
            other => other.to_string().into_bytes(),
        }
    }
}

impl From<Value> for HandlerResponse {
    fn from(body: Value) -> Self {
        HandlerResponse::json(200, body)
    }
}
