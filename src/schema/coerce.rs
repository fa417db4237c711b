//! Coercion of raw request values into typed values.
//!
//! Request values arrive as strings (query, path, header) or as parsed JSON
//! (body). Every kind accepts both: a number field takes `"42"` and `42`, a
//! boolean field takes `"true"` and `true`. Each failing node pushes one
//! [`ValidationIssue`] and the walk carries on, so independent fields are all
//! reported together.

use super::types::{FieldSchema, SchemaType};
use crate::validator::{IssueKind, ValidationIssue};
use chrono::{DateTime, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Number, Value};
use std::borrow::Cow;
use std::net::{Ipv4Addr, Ipv6Addr};

#[allow(clippy::expect_used)]
static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9_'+\-]+(\.[A-Za-z0-9_'+\-]+)*@([A-Za-z0-9]([A-Za-z0-9\-]*[A-Za-z0-9])?\.)+[A-Za-z]{2,}$")
        .expect("email regex is valid")
});

#[allow(clippy::expect_used)]
static HOSTNAME_LABEL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9]([A-Za-z0-9\-]{0,61}[A-Za-z0-9])?$").expect("hostname regex is valid")
});

/// Join a child segment onto a dotted path.
pub(crate) fn child_path(parent: &str, segment: &str) -> String {
    if parent.is_empty() {
        segment.to_string()
    } else {
        format!("{parent}.{segment}")
    }
}

/// Short description of a raw value for "received ..." messages.
pub(crate) fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(_) => "boolean".to_string(),
        Value::Number(_) => "number".to_string(),
        Value::String(s) => format!("'{s}'"),
        Value::Array(_) => "array".to_string(),
        Value::Object(_) => "object".to_string(),
    }
}

fn scalar_text(raw: &Value) -> Option<Cow<'_, str>> {
    match raw {
        Value::String(s) => Some(Cow::Borrowed(s.as_str())),
        Value::Number(n) => Some(Cow::Owned(n.to_string())),
        Value::Bool(b) => Some(Cow::Owned(b.to_string())),
        _ => None,
    }
}

fn parse_number(raw: &Value) -> Option<Number> {
    match raw {
        Value::Number(n) => Some(n.clone()),
        Value::String(s) => {
            let t = s.trim();
            if t.is_empty() {
                return None;
            }
            if let Ok(i) = t.parse::<i64>() {
                return Some(Number::from(i));
            }
            if let Ok(u) = t.parse::<u64>() {
                return Some(Number::from(u));
            }
            t.parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .and_then(Number::from_f64)
        }
        _ => None,
    }
}

fn whole_number(n: &Number) -> Option<Number> {
    if n.is_i64() || n.is_u64() {
        return Some(n.clone());
    }
    let f = n.as_f64()?;
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Some(Number::from(f as i64))
    } else {
        None
    }
}

fn parse_bool(raw: &Value) -> Option<bool> {
    match raw {
        Value::Bool(b) => Some(*b),
        Value::String(s) => {
            let t = s.trim();
            if t.eq_ignore_ascii_case("true") || t == "1" {
                Some(true)
            } else if t.eq_ignore_ascii_case("false") || t == "0" {
                Some(false)
            } else {
                None
            }
        }
        _ => None,
    }
}

fn is_hostname(s: &str) -> bool {
    let s = s.strip_suffix('.').unwrap_or(s);
    !s.is_empty() && s.len() <= 253 && s.split('.').all(|l| HOSTNAME_LABEL_RE.is_match(l))
}

fn is_uuid(s: &str) -> bool {
    s.len() == 36 && uuid::Uuid::try_parse(s).is_ok()
}

fn date_prefix(s: &str) -> Option<String> {
    let head = s.get(..10)?;
    let date = NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()?;
    Some(date.format("%Y-%m-%d").to_string())
}

impl FieldSchema {
    /// Coerce a present raw value. Returns `None` when any issue was recorded
    /// for this node or below it.
    pub(crate) fn coerce(
        &self,
        raw: &Value,
        path: &str,
        issues: &mut Vec<ValidationIssue>,
    ) -> Option<Value> {
        self.coerce_node(raw, path, false, issues)
    }

    /// Like [`FieldSchema::coerce`], but an object node rejects keys it does not declare.
    pub(crate) fn coerce_strict(
        &self,
        raw: &Value,
        path: &str,
        issues: &mut Vec<ValidationIssue>,
    ) -> Option<Value> {
        self.coerce_node(raw, path, true, issues)
    }

    fn coerce_node(
        &self,
        raw: &Value,
        path: &str,
        strict: bool,
        issues: &mut Vec<ValidationIssue>,
    ) -> Option<Value> {
        let fail = |issues: &mut Vec<ValidationIssue>, kind: IssueKind| -> Option<Value> {
            issues.push(ValidationIssue::new(path, kind));
            None
        };
        let type_error = |expected: &'static str| IssueKind::InvalidType {
            expected,
            received: describe(raw),
        };

        match self.schema_type() {
            SchemaType::Number => match parse_number(raw) {
                Some(n) => Some(Value::Number(n)),
                None => fail(issues, type_error("number")),
            },
            SchemaType::Integer => match parse_number(raw) {
                Some(n) => match whole_number(&n) {
                    Some(i) => Some(Value::Number(i)),
                    None => fail(issues, IssueKind::NotInteger),
                },
                None => fail(issues, type_error("integer")),
            },
            SchemaType::Boolean => match parse_bool(raw) {
                Some(b) => Some(Value::Bool(b)),
                None => fail(issues, type_error("boolean")),
            },
            SchemaType::Array(element) => self.coerce_array(element, raw, path, issues),
            SchemaType::Object(fields) => coerce_object(fields, raw, path, strict, issues),
            string_like => {
                let Some(text) = scalar_text(raw) else {
                    return fail(issues, type_error("string"));
                };
                match string_like {
                    SchemaType::DateTime => {
                        if DateTime::parse_from_rfc3339(&text).is_ok() {
                            Some(Value::String(text.into_owned()))
                        } else {
                            fail(issues, IssueKind::InvalidString { validation: "datetime" })
                        }
                    }
                    SchemaType::DateOnly => match date_prefix(&text) {
                        Some(d) => Some(Value::String(d)),
                        None => fail(issues, IssueKind::InvalidString { validation: "date" }),
                    },
                    SchemaType::Regex(pattern) => {
                        if pattern.is_match(&text) {
                            Some(Value::String(text.into_owned()))
                        } else {
                            fail(
                                issues,
                                IssueKind::PatternMismatch {
                                    pattern: pattern.as_str().to_string(),
                                },
                            )
                        }
                    }
                    SchemaType::Email => check(&text, EMAIL_RE.is_match(&text), "email", path, issues),
                    SchemaType::Uuid => check(&text, is_uuid(&text), "uuid", path, issues),
                    SchemaType::Hostname => check(&text, is_hostname(&text), "hostname", path, issues),
                    SchemaType::Ipv4 => {
                        let ok = text.parse::<Ipv4Addr>().is_ok();
                        check(&text, ok, "ipv4 address", path, issues)
                    }
                    SchemaType::Ipv6 => {
                        let ok = text.parse::<Ipv6Addr>().is_ok();
                        check(&text, ok, "ipv6 address", path, issues)
                    }
                    SchemaType::Enum(members) => match members.lookup(&text) {
                        Some(label) => Some(Value::String(label.to_string())),
                        None => fail(
                            issues,
                            IssueKind::InvalidEnumValue {
                                options: members.labels().map(str::to_string).collect(),
                                received: text.into_owned(),
                            },
                        ),
                    },
                    _ => Some(Value::String(text.into_owned())),
                }
            }
        }
    }

    fn coerce_array(
        &self,
        element: &FieldSchema,
        raw: &Value,
        path: &str,
        issues: &mut Vec<ValidationIssue>,
    ) -> Option<Value> {
        let Value::Array(items) = raw else {
            issues.push(ValidationIssue::new(
                path,
                IssueKind::InvalidType {
                    expected: "array",
                    received: describe(raw),
                },
            ));
            return None;
        };
        let before = issues.len();
        let out: Vec<Value> = items
            .iter()
            .enumerate()
            .filter_map(|(i, item)| element.coerce(item, &child_path(path, &i.to_string()), issues))
            .collect();
        (issues.len() == before).then_some(Value::Array(out))
    }
}

fn check(
    text: &str,
    ok: bool,
    validation: &'static str,
    path: &str,
    issues: &mut Vec<ValidationIssue>,
) -> Option<Value> {
    if ok {
        Some(Value::String(text.to_string()))
    } else {
        issues.push(ValidationIssue::new(path, IssueKind::InvalidString { validation }));
        None
    }
}

fn coerce_object(
    fields: &[(String, FieldSchema)],
    raw: &Value,
    path: &str,
    strict: bool,
    issues: &mut Vec<ValidationIssue>,
) -> Option<Value> {
    let Value::Object(input) = raw else {
        issues.push(ValidationIssue::new(
            path,
            IssueKind::InvalidType {
                expected: "object",
                received: describe(raw),
            },
        ));
        return None;
    };
    let before = issues.len();
    let mut out = Map::new();

    for (name, schema) in fields {
        let field_path = child_path(path, name);
        let coerced = match input.get(name) {
            Some(value) => schema.coerce(value, &field_path, issues),
            None => match schema.default_value() {
                Some(default) => schema.coerce(default, &field_path, issues),
                None => {
                    if schema.is_required() {
                        issues.push(ValidationIssue::new(&field_path, IssueKind::Required));
                    }
                    None
                }
            },
        };
        if let Some(v) = coerced {
            out.insert(name.clone(), v);
        }
    }

    if strict {
        for key in input.keys() {
            if !fields.iter().any(|(n, _)| n == key) {
                issues.push(ValidationIssue::new(
                    path,
                    IssueKind::UnrecognizedKey { key: key.clone() },
                ));
            }
        }
    }

    (issues.len() == before).then_some(Value::Object(out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::types::EnumMembers;
    use serde_json::json;

    fn run(schema: &FieldSchema, raw: Value) -> Result<Value, Vec<ValidationIssue>> {
        let mut issues = Vec::new();
        match schema.coerce(&raw, "v", &mut issues) {
            Some(v) if issues.is_empty() => Ok(v),
            _ => Err(issues),
        }
    }

    #[test]
    fn test_number_from_string() {
        assert_eq!(run(&FieldSchema::number(), json!("3.5")).unwrap(), json!(3.5));
        assert_eq!(run(&FieldSchema::number(), json!(" 7 ")).unwrap(), json!(7));
        assert!(run(&FieldSchema::number(), json!("")).is_err());
        assert!(run(&FieldSchema::number(), json!("NaN")).is_err());
        assert!(run(&FieldSchema::number(), json!(null)).is_err());
    }

    #[test]
    fn test_integer_rejects_fraction() {
        assert_eq!(run(&FieldSchema::integer(), json!("42")).unwrap(), json!(42));
        assert_eq!(run(&FieldSchema::integer(), json!(4.0)).unwrap(), json!(4));
        let issues = run(&FieldSchema::integer(), json!("4.5")).unwrap_err();
        assert_eq!(issues[0].message, "Expected integer, received float");
    }

    #[test]
    fn test_integer_beyond_i64_is_not_clamped() {
        let i = FieldSchema::integer();
        assert_eq!(
            run(&i, json!("9223372036854775808")).unwrap(),
            json!(9_223_372_036_854_775_808_u64)
        );
        assert_eq!(run(&i, json!("18446744073709551615")).unwrap(), json!(u64::MAX));
        assert!(run(&i, json!("18446744073709551616")).is_err());
        assert!(run(&i, json!(9.3e18)).is_err());
    }

    #[test]
    fn test_boolean_forms() {
        let b = FieldSchema::boolean();
        assert_eq!(run(&b, json!("TRUE")).unwrap(), json!(true));
        assert_eq!(run(&b, json!("0")).unwrap(), json!(false));
        assert_eq!(run(&b, json!(false)).unwrap(), json!(false));
        let issues = run(&b, json!("yes")).unwrap_err();
        assert_eq!(issues[0].message, "Expected boolean, received 'yes'");
    }

    #[test]
    fn test_string_stringifies_scalars() {
        assert_eq!(run(&FieldSchema::string(), json!(12)).unwrap(), json!("12"));
        assert!(run(&FieldSchema::string(), json!({"a": 1})).is_err());
    }

    #[test]
    fn test_date_only_truncates_time() {
        let d = FieldSchema::date_only();
        assert_eq!(run(&d, json!("2024-01-15T10:00:00Z")).unwrap(), json!("2024-01-15"));
        assert!(run(&d, json!("2024-13-01")).is_err());
        assert!(run(&d, json!("2024")).is_err());
    }

    #[test]
    fn test_datetime_requires_rfc3339() {
        let d = FieldSchema::datetime();
        assert!(run(&d, json!("2024-01-15T10:00:00Z")).is_ok());
        let issues = run(&d, json!("2024-01-15")).unwrap_err();
        assert_eq!(issues[0].message, "Invalid datetime");
    }

    #[test]
    fn test_string_formats() {
        assert!(run(&FieldSchema::email(), json!("dev@example.com")).is_ok());
        assert!(run(&FieldSchema::email(), json!("not-an-email")).is_err());
        assert!(run(&FieldSchema::uuid(), json!("67e55044-10b1-426f-9247-bb680e5fe0c8")).is_ok());
        assert!(run(&FieldSchema::uuid(), json!("67e5504410b1426f9247bb680e5fe0c8")).is_err());
        assert!(run(&FieldSchema::hostname(), json!("api.example.com")).is_ok());
        assert!(run(&FieldSchema::hostname(), json!("-bad-.example.com")).is_err());
        assert!(run(&FieldSchema::ipv4(), json!("10.0.0.1")).is_ok());
        assert!(run(&FieldSchema::ipv4(), json!("10.0.0.256")).is_err());
        assert!(run(&FieldSchema::ipv6(), json!("::1")).is_ok());
        assert!(run(&FieldSchema::ipv6(), json!("10.0.0.1")).is_err());
    }

    #[test]
    fn test_regex_pattern() {
        let s = FieldSchema::regex(r"^\d{3}-\d{4}$").unwrap();
        assert!(run(&s, json!("555-1234")).is_ok());
        let issues = run(&s, json!("5551234")).unwrap_err();
        assert_eq!(issues[0].kind, IssueKind::PatternMismatch { pattern: r"^\d{3}-\d{4}$".into() });
    }

    #[test]
    fn test_enum_returns_canonical_label() {
        let members = EnumMembers::new(
            vec![("A".into(), json!("a")), ("B".into(), json!("b"))],
            false,
        )
        .unwrap();
        let e = FieldSchema::enumeration(members);
        assert_eq!(run(&e, json!("a")).unwrap(), json!("A"));
        let issues = run(&e, json!("c")).unwrap_err();
        assert_eq!(issues[0].message, "Invalid enum value. Expected 'A' | 'B', received 'c'");
    }

    #[test]
    fn test_array_collects_every_element_issue() {
        let s = FieldSchema::array(FieldSchema::integer());
        assert_eq!(run(&s, json!(["1", "2"])).unwrap(), json!([1, 2]));
        let issues = run(&s, json!(["x", "2", "y"])).unwrap_err();
        let paths: Vec<&str> = issues.iter().map(|i| i.location.as_str()).collect();
        assert_eq!(paths, vec!["v.0", "v.2"]);
    }

    #[test]
    fn test_object_required_default_and_unknown_keys() {
        let s = FieldSchema::object([
            ("id", FieldSchema::integer()),
            ("page", FieldSchema::integer().with_default(1)),
            ("note", FieldSchema::string().optional()),
        ]);
        assert_eq!(
            run(&s, json!({"id": "5", "extra": true})).unwrap(),
            json!({"id": 5, "page": 1})
        );

        let mut issues = Vec::new();
        assert!(s.coerce_strict(&json!({"id": 5, "extra": 2}), "", &mut issues).is_none());
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].message, "Unrecognized key: 'extra'");

        let issues = run(&s, json!({})).unwrap_err();
        assert_eq!(issues[0].location, "v.id");
        assert_eq!(issues[0].message, "Required");
    }

    #[test]
    fn test_nested_object_path() {
        let s = FieldSchema::object([
            ("name", FieldSchema::string()),
            (
                "address",
                FieldSchema::object([("city", FieldSchema::string()), ("zip", FieldSchema::string())]),
            ),
        ]);
        let issues = run(&s, json!({"name": "n", "address": {"city": "c"}})).unwrap_err();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].location, "v.address.zip");
    }
}
