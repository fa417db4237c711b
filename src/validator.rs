//! Request validation.
//!
//! [`validate`] extracts raw values for every declared parameter, reads the
//! JSON body when one is declared, and coerces the whole raw tree against the
//! endpoint's composite schema in a single pass. Field problems never become
//! errors: they are collected into a [`ValidationOutcome::Invalid`] that the
//! router turns into a 400 envelope.

use crate::endpoint::EndpointSchema;
use crate::error::RequestError;
use crate::params::Location;
use crate::server::request::{extract_parameter, Request};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, warn};

/// What went wrong with one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueKind {
    Required,
    InvalidType {
        expected: &'static str,
        received: String,
    },
    NotInteger,
    InvalidString {
        validation: &'static str,
    },
    PatternMismatch {
        pattern: String,
    },
    InvalidEnumValue {
        options: Vec<String>,
        received: String,
    },
    UnrecognizedKey {
        key: String,
    },
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueKind::Required => f.write_str("Required"),
            IssueKind::InvalidType { expected, received } => {
                write!(f, "Expected {expected}, received {received}")
            }
            IssueKind::NotInteger => f.write_str("Expected integer, received float"),
            IssueKind::InvalidString { validation } => write!(f, "Invalid {validation}"),
            IssueKind::PatternMismatch { pattern } => {
                write!(f, "Invalid string: must match pattern /{pattern}/")
            }
            IssueKind::InvalidEnumValue { options, received } => {
                let expected = options
                    .iter()
                    .map(|o| format!("'{o}'"))
                    .collect::<Vec<_>>()
                    .join(" | ");
                write!(f, "Invalid enum value. Expected {expected}, received '{received}'")
            }
            IssueKind::UnrecognizedKey { key } => write!(f, "Unrecognized key: '{key}'"),
        }
    }
}

/// One field-level problem. `location` is the dotted path of the field
/// (`query.page`, `body.address.zip`); an empty location is a form-level issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub location: String,
    pub kind: IssueKind,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(location: impl Into<String>, kind: IssueKind) -> Self {
        let message = kind.to_string();
        ValidationIssue {
            location: location.into(),
            kind,
            message,
        }
    }
}

/// Flattened error report: form-level messages plus messages keyed by field path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationErrors {
    pub form_errors: Vec<String>,
    pub field_errors: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    #[must_use]
    pub fn from_issues(issues: &[ValidationIssue]) -> Self {
        let mut out = ValidationErrors::default();
        for issue in issues {
            if issue.location.is_empty() {
                out.form_errors.push(issue.message.clone());
            } else {
                out.field_errors
                    .entry(issue.location.clone())
                    .or_default()
                    .push(issue.message.clone());
            }
        }
        out
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.form_errors.is_empty() && self.field_errors.is_empty()
    }

    /// Messages recorded for one field path.
    #[must_use]
    pub fn field(&self, path: &str) -> Option<&[String]> {
        self.field_errors.get(path).map(Vec::as_slice)
    }
}

/// Coerced request data, one object per location plus `body`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidatedData {
    inner: Map<String, Value>,
}

impl ValidatedData {
    #[must_use]
    pub fn new(inner: Map<String, Value>) -> Self {
        Self { inner }
    }

    fn section(&self, key: &str) -> Option<&Map<String, Value>> {
        self.inner.get(key).and_then(Value::as_object)
    }

    #[must_use]
    pub fn query(&self) -> Option<&Map<String, Value>> {
        self.section(Location::Query.as_str())
    }

    #[must_use]
    pub fn path(&self) -> Option<&Map<String, Value>> {
        self.section(Location::Path.as_str())
    }

    #[must_use]
    pub fn header(&self) -> Option<&Map<String, Value>> {
        self.section(Location::Header.as_str())
    }

    #[must_use]
    pub fn body(&self) -> Option<&Value> {
        self.inner.get("body")
    }

    /// A single coerced parameter.
    #[must_use]
    pub fn get(&self, location: Location, name: &str) -> Option<&Value> {
        self.section(location.as_str())?.get(name)
    }

    /// Deserialize one section (`"query"`, `"path"`, `"header"`, `"body"`) into `T`.
    /// A section with no declared values deserializes from an empty object.
    pub fn deserialize<T: DeserializeOwned>(&self, section: &str) -> Result<T, serde_json::Error> {
        let value = self
            .inner
            .get(section)
            .cloned()
            .unwrap_or_else(|| Value::Object(Map::new()));
        serde_json::from_value(value)
    }

    #[must_use]
    pub fn as_value(&self) -> Value {
        Value::Object(self.inner.clone())
    }

    #[must_use]
    pub fn into_inner(self) -> Map<String, Value> {
        self.inner
    }
}

/// Result of validating one request.
#[derive(Debug, Clone)]
pub enum ValidationOutcome {
    Valid(ValidatedData),
    Invalid(Vec<ValidationIssue>),
}

impl ValidationOutcome {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationOutcome::Valid(_))
    }

    #[must_use]
    pub fn data(&self) -> Option<&ValidatedData> {
        match self {
            ValidationOutcome::Valid(d) => Some(d),
            ValidationOutcome::Invalid(_) => None,
        }
    }

    #[must_use]
    pub fn issues(&self) -> &[ValidationIssue] {
        match self {
            ValidationOutcome::Valid(_) => &[],
            ValidationOutcome::Invalid(issues) => issues,
        }
    }

    /// Flattened report; empty on success.
    #[must_use]
    pub fn errors(&self) -> ValidationErrors {
        ValidationErrors::from_issues(self.issues())
    }
}

fn body_is_blank(bytes: &[u8]) -> bool {
    bytes.iter().all(u8::is_ascii_whitespace)
}

/// Validate `request` against `endpoint`.
///
/// With `strict` set, keys not declared at the top level of the composite
/// and at the root of the body object are reported as unrecognized.
///
/// # Errors
///
/// [`RequestError::BodyParse`] when a non-empty body is not JSON,
/// [`RequestError::NotImplemented`] for cookie parameters and
/// [`RequestError::BodyConsumed`] when the body was already taken.
pub fn validate(
    endpoint: &EndpointSchema,
    request: &mut Request,
    strict: bool,
) -> Result<ValidationOutcome, RequestError> {
    let mut raw = Map::new();

    for (location, params) in endpoint.parameters_by_location() {
        let mut group = Map::new();
        for param in params {
            if let Some(value) = extract_parameter(request, param)? {
                group.insert(param.name().to_string(), value);
            }
        }
        raw.insert(location.as_str().to_string(), Value::Object(group));
    }

    if let Some(body) = endpoint.body() {
        if !request.method().eq_ignore_ascii_case("get") && body.is_json() {
            match request.take_body()? {
                Some(bytes) if !body_is_blank(&bytes) => {
                    let parsed: Value = serde_json::from_slice(&bytes).map_err(|e| {
                        warn!(error = %e, "request body is not valid JSON");
                        RequestError::from(e)
                    })?;
                    raw.insert("body".to_string(), parsed);
                }
                _ => {}
            }
        }
    }

    let composite = endpoint.composite_schema(request.method());
    let mut issues = Vec::new();
    let raw = Value::Object(raw);

    let coerced = if strict {
        coerce_strict_root(composite, &raw, &mut issues)
    } else {
        composite.coerce(&raw, "", &mut issues)
    };

    match coerced {
        Some(Value::Object(data)) if issues.is_empty() => {
            Ok(ValidationOutcome::Valid(ValidatedData::new(data)))
        }
        _ => {
            debug!(issues = issues.len(), method = %request.method(), "request validation failed");
            Ok(ValidationOutcome::Invalid(issues))
        }
    }
}

/// Strict pass: the composite root rejects unknown sections and the body
/// root, when it is an object, rejects unknown keys. Nested objects drop them.
fn coerce_strict_root(
    composite: &crate::schema::FieldSchema,
    raw: &Value,
    issues: &mut Vec<ValidationIssue>,
) -> Option<Value> {
    let Some(fields) = composite.fields() else {
        return composite.coerce_strict(raw, "", issues);
    };
    let Some(input) = raw.as_object() else {
        return composite.coerce_strict(raw, "", issues);
    };

    let before = issues.len();
    let mut out = Map::new();
    for (name, schema) in fields {
        let coerced = match input.get(name) {
            Some(value) if name == "body" => schema.coerce_strict(value, name, issues),
            Some(value) => schema.coerce(value, name, issues),
            None => {
                if schema.is_required() {
                    issues.push(ValidationIssue::new(name.as_str(), IssueKind::Required));
                }
                None
            }
        };
        if let Some(v) = coerced {
            out.insert(name.clone(), v);
        }
    }
    for key in input.keys() {
        if !fields.iter().any(|(n, _)| n == key) {
            issues.push(ValidationIssue::new(
                "",
                IssueKind::UnrecognizedKey { key: key.clone() },
            ));
        }
    }
    (issues.len() == before).then_some(Value::Object(out))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flatten_splits_form_and_field_errors() {
        let issues = vec![
            ValidationIssue::new("", IssueKind::UnrecognizedKey { key: "x".into() }),
            ValidationIssue::new("query.page", IssueKind::Required),
            ValidationIssue::new("query.page", IssueKind::NotInteger),
        ];
        let errors = ValidationErrors::from_issues(&issues);
        assert_eq!(errors.form_errors, vec!["Unrecognized key: 'x'".to_string()]);
        assert_eq!(
            errors.field("query.page").unwrap(),
            &["Required".to_string(), "Expected integer, received float".to_string()]
        );
    }

    #[test]
    fn test_errors_serialize_camel_case() {
        let errors = ValidationErrors::from_issues(&[ValidationIssue::new(
            "body.id",
            IssueKind::Required,
        )]);
        let v = serde_json::to_value(&errors).unwrap();
        assert_eq!(
            v,
            serde_json::json!({"formErrors": [], "fieldErrors": {"body.id": ["Required"]}})
        );
    }

    #[test]
    fn test_validated_data_accessors() {
        let mut inner = Map::new();
        inner.insert("query".into(), serde_json::json!({"page": 2}));
        inner.insert("body".into(), serde_json::json!({"title": "t"}));
        let data = ValidatedData::new(inner);
        assert_eq!(data.get(Location::Query, "page"), Some(&serde_json::json!(2)));
        assert!(data.path().is_none());
        assert_eq!(data.body(), Some(&serde_json::json!({"title": "t"})));

        #[derive(serde::Deserialize)]
        struct Q {
            page: u32,
        }
        let q: Q = data.deserialize("query").unwrap();
        assert_eq!(q.page, 2);
    }
}
