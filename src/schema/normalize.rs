//! Type declarations and their normalization into [`FieldSchema`] trees.
//!
//! Declarations are explicit: a [`TypeSpec`] says which shape it is, and
//! [`normalize`] resolves it once, at definition time. Any shape that cannot
//! be resolved is a [`DefinitionError`] then, never a silent string default.

use super::types::{EnumMembers, FieldSchema, SchemaMeta};
use crate::error::DefinitionError;
use serde_json::Value;

/// Constructor-like markers for the basic kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    String,
    Number,
    Boolean,
    /// Full timestamp, validated as RFC 3339.
    Date,
}

/// Enumeration values: a plain list (each label is its value) or labelled values.
#[derive(Debug, Clone)]
pub enum EnumValues {
    List(Vec<String>),
    Mapping(Vec<(String, Value)>),
}

/// Specialised declarations that carry their own constructor parameters.
#[derive(Debug, Clone)]
pub enum NamedType {
    Integer,
    DateTime,
    DateOnly,
    Email,
    Uuid,
    Hostname,
    Ipv4,
    Ipv6,
    Regex {
        pattern: String,
    },
    Enum {
        values: EnumValues,
        case_sensitive: Option<bool>,
    },
}

/// A type declaration.
#[derive(Debug, Clone)]
pub enum TypeSpec {
    /// Already canonical; passed through untouched.
    Schema(FieldSchema),
    Primitive(Primitive),
    /// A sample value; the kind follows the literal and the literal becomes the example.
    Literal(Value),
    /// Array of the first element's type. Empty is a definition error.
    ArrayOf(Vec<TypeSpec>),
    ObjectOf(Vec<(String, TypeSpec)>),
    Named(NamedType),
}

impl TypeSpec {
    #[must_use]
    pub fn string() -> Self {
        TypeSpec::Primitive(Primitive::String)
    }

    #[must_use]
    pub fn number() -> Self {
        TypeSpec::Primitive(Primitive::Number)
    }

    #[must_use]
    pub fn boolean() -> Self {
        TypeSpec::Primitive(Primitive::Boolean)
    }

    #[must_use]
    pub fn date() -> Self {
        TypeSpec::Primitive(Primitive::Date)
    }

    #[must_use]
    pub fn integer() -> Self {
        TypeSpec::Named(NamedType::Integer)
    }

    #[must_use]
    pub fn datetime() -> Self {
        TypeSpec::Named(NamedType::DateTime)
    }

    #[must_use]
    pub fn date_only() -> Self {
        TypeSpec::Named(NamedType::DateOnly)
    }

    #[must_use]
    pub fn email() -> Self {
        TypeSpec::Named(NamedType::Email)
    }

    #[must_use]
    pub fn uuid() -> Self {
        TypeSpec::Named(NamedType::Uuid)
    }

    #[must_use]
    pub fn hostname() -> Self {
        TypeSpec::Named(NamedType::Hostname)
    }

    #[must_use]
    pub fn ipv4() -> Self {
        TypeSpec::Named(NamedType::Ipv4)
    }

    #[must_use]
    pub fn ipv6() -> Self {
        TypeSpec::Named(NamedType::Ipv6)
    }

    #[must_use]
    pub fn regex(pattern: impl Into<String>) -> Self {
        TypeSpec::Named(NamedType::Regex {
            pattern: pattern.into(),
        })
    }

    /// Enumeration from a list of labels.
    #[must_use]
    pub fn enumeration<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        TypeSpec::Named(NamedType::Enum {
            values: EnumValues::List(labels.into_iter().map(Into::into).collect()),
            case_sensitive: None,
        })
    }

    /// Enumeration from `label -> value` pairs.
    #[must_use]
    pub fn enum_map<I, S, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, V)>,
        S: Into<String>,
        V: Into<Value>,
    {
        TypeSpec::Named(NamedType::Enum {
            values: EnumValues::Mapping(
                pairs
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
            case_sensitive: None,
        })
    }

    #[must_use]
    pub fn array(element: impl Into<TypeSpec>) -> Self {
        TypeSpec::ArrayOf(vec![element.into()])
    }

    #[must_use]
    pub fn object<I, S, T>(fields: I) -> Self
    where
        I: IntoIterator<Item = (S, T)>,
        S: Into<String>,
        T: Into<TypeSpec>,
    {
        TypeSpec::ObjectOf(
            fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Read a declaration from JSON data.
    ///
    /// Strings, numbers and booleans are literals, arrays declare an array of
    /// their first element and objects declare an object. `null` names no type.
    pub fn from_json(value: &Value) -> Result<Self, DefinitionError> {
        match value {
            Value::Null => Err(DefinitionError::UnsupportedType {
                value: "null".to_string(),
            }),
            Value::Bool(_) | Value::Number(_) | Value::String(_) => {
                Ok(TypeSpec::Literal(value.clone()))
            }
            Value::Array(items) => items
                .iter()
                .map(TypeSpec::from_json)
                .collect::<Result<Vec<_>, _>>()
                .map(TypeSpec::ArrayOf),
            Value::Object(map) => map
                .iter()
                .map(|(k, v)| TypeSpec::from_json(v).map(|t| (k.clone(), t)))
                .collect::<Result<Vec<_>, _>>()
                .map(TypeSpec::ObjectOf),
        }
    }
}

impl From<FieldSchema> for TypeSpec {
    fn from(schema: FieldSchema) -> Self {
        TypeSpec::Schema(schema)
    }
}

impl From<Primitive> for TypeSpec {
    fn from(p: Primitive) -> Self {
        TypeSpec::Primitive(p)
    }
}

impl From<NamedType> for TypeSpec {
    fn from(n: NamedType) -> Self {
        TypeSpec::Named(n)
    }
}

impl From<&str> for TypeSpec {
    fn from(example: &str) -> Self {
        TypeSpec::Literal(Value::String(example.to_string()))
    }
}

impl From<String> for TypeSpec {
    fn from(example: String) -> Self {
        TypeSpec::Literal(Value::String(example))
    }
}

impl From<i64> for TypeSpec {
    fn from(example: i64) -> Self {
        TypeSpec::Literal(Value::from(example))
    }
}

impl From<f64> for TypeSpec {
    fn from(example: f64) -> Self {
        TypeSpec::Literal(Value::from(example))
    }
}

impl From<bool> for TypeSpec {
    fn from(example: bool) -> Self {
        TypeSpec::Literal(Value::Bool(example))
    }
}

impl<T: Into<TypeSpec>> From<Vec<T>> for TypeSpec {
    fn from(items: Vec<T>) -> Self {
        TypeSpec::ArrayOf(items.into_iter().map(Into::into).collect())
    }
}

/// Options recognised by the declaration functions.
#[derive(Debug, Clone, Default)]
pub struct ParamOptions {
    pub name: Option<String>,
    pub required: Option<bool>,
    pub description: Option<String>,
    pub example: Option<Value>,
    pub default: Option<Value>,
    pub deprecated: bool,
    pub enum_case_sensitive: Option<bool>,
    pub pattern: Option<String>,
}

impl ParamOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn required(mut self, required: bool) -> Self {
        self.required = Some(required);
        self
    }

    #[must_use]
    pub fn optional(self) -> Self {
        self.required(false)
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn example(mut self, example: impl Into<Value>) -> Self {
        self.example = Some(example.into());
        self
    }

    #[must_use]
    pub fn default_value(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    #[must_use]
    pub fn deprecated(mut self, deprecated: bool) -> Self {
        self.deprecated = deprecated;
        self
    }

    #[must_use]
    pub fn enum_case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.enum_case_sensitive = Some(case_sensitive);
        self
    }

    #[must_use]
    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    /// Options that shape a kind, without documentation or presence.
    fn kind_only(&self) -> ParamOptions {
        ParamOptions {
            enum_case_sensitive: self.enum_case_sensitive,
            pattern: self.pattern.clone(),
            ..ParamOptions::default()
        }
    }
}

/// Resolve a declaration into a canonical schema.
///
/// # Errors
///
/// [`DefinitionError::UnsupportedType`] for literals that are not scalars,
/// [`DefinitionError::EmptyArray`] for an array without element type, and the
/// pattern/enum/default errors of the named kinds.
pub fn normalize(spec: &TypeSpec, options: &ParamOptions) -> Result<FieldSchema, DefinitionError> {
    let schema = match spec {
        TypeSpec::Schema(schema) => return Ok(schema.clone()),
        TypeSpec::Primitive(p) => match p {
            Primitive::String => FieldSchema::string(),
            Primitive::Number => FieldSchema::number(),
            Primitive::Boolean => FieldSchema::boolean(),
            Primitive::Date => FieldSchema::datetime(),
        },
        TypeSpec::Literal(value) => {
            let base = match value {
                Value::String(_) => FieldSchema::string(),
                Value::Number(_) => FieldSchema::number(),
                Value::Bool(_) => FieldSchema::boolean(),
                other => {
                    return Err(DefinitionError::UnsupportedType {
                        value: other.to_string(),
                    })
                }
            };
            let literal = ParamOptions {
                example: Some(value.clone()),
                ..options.clone()
            };
            return apply_options(base, &literal);
        }
        TypeSpec::ArrayOf(items) => {
            let first = items.first().ok_or(DefinitionError::EmptyArray)?;
            let element = normalize(first, &options.kind_only())?;
            FieldSchema::array(element)
        }
        TypeSpec::ObjectOf(fields) => {
            let mut children = Vec::with_capacity(fields.len());
            for (name, child) in fields {
                children.push((name.clone(), normalize(child, &ParamOptions::default())?));
            }
            FieldSchema::object(children)
        }
        TypeSpec::Named(named) => named_schema(named, options)?,
    };
    apply_options(schema, options)
}

fn named_schema(named: &NamedType, options: &ParamOptions) -> Result<FieldSchema, DefinitionError> {
    Ok(match named {
        NamedType::Integer => FieldSchema::integer(),
        NamedType::DateTime => FieldSchema::datetime(),
        NamedType::DateOnly => FieldSchema::date_only(),
        NamedType::Email => FieldSchema::email(),
        NamedType::Uuid => FieldSchema::uuid(),
        NamedType::Hostname => FieldSchema::hostname(),
        NamedType::Ipv4 => FieldSchema::ipv4(),
        NamedType::Ipv6 => FieldSchema::ipv6(),
        NamedType::Regex { pattern } => {
            FieldSchema::regex(options.pattern.as_deref().unwrap_or(pattern))?
        }
        NamedType::Enum {
            values,
            case_sensitive,
        } => {
            let case_sensitive = options
                .enum_case_sensitive
                .or(*case_sensitive)
                .unwrap_or(true);
            let members = match values {
                EnumValues::List(labels) => EnumMembers::from_labels(labels.iter().cloned(), case_sensitive)?,
                EnumValues::Mapping(pairs) => EnumMembers::new(pairs.clone(), case_sensitive)?,
            };
            FieldSchema::enumeration(members)
        }
    })
}

fn apply_options(schema: FieldSchema, options: &ParamOptions) -> Result<FieldSchema, DefinitionError> {
    if let Some(default) = &options.default {
        let mut issues = Vec::new();
        if schema.coerce(default, "default", &mut issues).is_none() {
            let message = issues
                .iter()
                .map(|i| i.message.as_str())
                .collect::<Vec<_>>()
                .join("; ");
            return Err(DefinitionError::InvalidDefault { message });
        }
    }
    let meta = SchemaMeta {
        required: options.required.unwrap_or(true) && options.default.is_none(),
        description: options.description.clone(),
        example: options.example.clone(),
        default: options.default.clone(),
        deprecated: options.deprecated,
    };
    Ok(schema.with_meta(meta))
}
