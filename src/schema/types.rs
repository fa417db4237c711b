use crate::error::DefinitionError;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// The resolved kind of a [`FieldSchema`] node, without its kind-specific data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaKind {
    String,
    Number,
    Integer,
    Boolean,
    DateTime,
    DateOnly,
    RegexString,
    Email,
    Uuid,
    Hostname,
    Ipv4,
    Ipv6,
    Enum,
    Array,
    Object,
}

impl SchemaKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaKind::String => "string",
            SchemaKind::Number => "number",
            SchemaKind::Integer => "integer",
            SchemaKind::Boolean => "boolean",
            SchemaKind::DateTime => "datetime",
            SchemaKind::DateOnly => "date",
            SchemaKind::RegexString => "regex",
            SchemaKind::Email => "email",
            SchemaKind::Uuid => "uuid",
            SchemaKind::Hostname => "hostname",
            SchemaKind::Ipv4 => "ipv4",
            SchemaKind::Ipv6 => "ipv6",
            SchemaKind::Enum => "enum",
            SchemaKind::Array => "array",
            SchemaKind::Object => "object",
        }
    }
}

impl fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A compiled regex together with the source it was declared with.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    pub fn new(source: &str) -> Result<Self, DefinitionError> {
        let regex = Regex::new(source).map_err(|e| DefinitionError::InvalidPattern {
            pattern: source.to_string(),
            source: e,
        })?;
        Ok(Self {
            source: source.to_string(),
            regex,
        })
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn is_match(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }
}

/// Members of an enumeration: ordered `label -> raw value` pairs plus a lookup index.
///
/// When the enumeration is case-insensitive the index keys are lowercased once
/// here, so a lookup only lowercases the input.
#[derive(Debug, Clone)]
pub struct EnumMembers {
    members: Vec<(String, Value)>,
    case_sensitive: bool,
    index: HashMap<String, usize>,
}

impl EnumMembers {
    pub fn new(
        members: Vec<(String, Value)>,
        case_sensitive: bool,
    ) -> Result<Self, DefinitionError> {
        if members.is_empty() {
            return Err(DefinitionError::MissingEnumValues);
        }
        let index = members
            .iter()
            .enumerate()
            .map(|(i, (label, _))| {
                let key = if case_sensitive {
                    label.clone()
                } else {
                    label.to_lowercase()
                };
                (key, i)
            })
            .collect();
        Ok(Self {
            members,
            case_sensitive,
            index,
        })
    }

    /// Members declared as a plain list: each label is its own value.
    pub fn from_labels<I, S>(labels: I, case_sensitive: bool) -> Result<Self, DefinitionError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let members = labels
            .into_iter()
            .map(|l| {
                let label = l.into();
                let value = Value::String(label.clone());
                (label, value)
            })
            .collect();
        Self::new(members, case_sensitive)
    }

    /// Resolve an input to its canonical label.
    #[must_use]
    pub fn lookup(&self, input: &str) -> Option<&str> {
        let idx = if self.case_sensitive {
            self.index.get(input)
        } else {
            self.index.get(&input.to_lowercase())
        }?;
        self.members.get(*idx).map(|(label, _)| label.as_str())
    }

    /// Raw value mapped to a canonical label.
    #[must_use]
    pub fn value_of(&self, label: &str) -> Option<&Value> {
        self.members
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, v)| v)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(|(l, _)| l.as_str())
    }

    #[must_use]
    pub fn case_sensitive(&self) -> bool {
        self.case_sensitive
    }
}

/// Kind plus kind-specific data.
#[derive(Debug, Clone)]
pub enum SchemaType {
    String,
    Number,
    Integer,
    Boolean,
    DateTime,
    DateOnly,
    Regex(Pattern),
    Email,
    Uuid,
    Hostname,
    Ipv4,
    Ipv6,
    Enum(EnumMembers),
    Array(Box<FieldSchema>),
    Object(Vec<(String, FieldSchema)>),
}

impl SchemaType {
    #[must_use]
    pub fn kind(&self) -> SchemaKind {
        match self {
            SchemaType::String => SchemaKind::String,
            SchemaType::Number => SchemaKind::Number,
            SchemaType::Integer => SchemaKind::Integer,
            SchemaType::Boolean => SchemaKind::Boolean,
            SchemaType::DateTime => SchemaKind::DateTime,
            SchemaType::DateOnly => SchemaKind::DateOnly,
            SchemaType::Regex(_) => SchemaKind::RegexString,
            SchemaType::Email => SchemaKind::Email,
            SchemaType::Uuid => SchemaKind::Uuid,
            SchemaType::Hostname => SchemaKind::Hostname,
            SchemaType::Ipv4 => SchemaKind::Ipv4,
            SchemaType::Ipv6 => SchemaKind::Ipv6,
            SchemaType::Enum(_) => SchemaKind::Enum,
            SchemaType::Array(_) => SchemaKind::Array,
            SchemaType::Object(_) => SchemaKind::Object,
        }
    }
}

/// Documentation and presence metadata shared by every kind.
#[derive(Debug, Clone)]
pub struct SchemaMeta {
    pub required: bool,
    pub description: Option<String>,
    pub example: Option<Value>,
    pub default: Option<Value>,
    pub deprecated: bool,
}

impl Default for SchemaMeta {
    fn default() -> Self {
        Self {
            required: true,
            description: None,
            example: None,
            default: None,
            deprecated: false,
        }
    }
}

/// Canonical description of one value's type and constraints.
///
/// A node is never changed once built: every `with_*` method consumes the node
/// and returns a rebuilt one, so two endpoints that start from the same
/// declaration never observe each other's adjustments.
#[derive(Debug, Clone)]
pub struct FieldSchema {
    ty: SchemaType,
    meta: SchemaMeta,
}

impl FieldSchema {
    #[must_use]
    pub fn new(ty: SchemaType) -> Self {
        Self {
            ty,
            meta: SchemaMeta::default(),
        }
    }

    #[must_use]
    pub fn string() -> Self {
        Self::new(SchemaType::String)
    }

    #[must_use]
    pub fn number() -> Self {
        Self::new(SchemaType::Number)
    }

    #[must_use]
    pub fn integer() -> Self {
        Self::new(SchemaType::Integer)
    }

    #[must_use]
    pub fn boolean() -> Self {
        Self::new(SchemaType::Boolean)
    }

    #[must_use]
    pub fn datetime() -> Self {
        Self::new(SchemaType::DateTime)
    }

    #[must_use]
    pub fn date_only() -> Self {
        Self::new(SchemaType::DateOnly)
    }

    #[must_use]
    pub fn email() -> Self {
        Self::new(SchemaType::Email)
    }

    #[must_use]
    pub fn uuid() -> Self {
        Self::new(SchemaType::Uuid)
    }

    #[must_use]
    pub fn hostname() -> Self {
        Self::new(SchemaType::Hostname)
    }

    #[must_use]
    pub fn ipv4() -> Self {
        Self::new(SchemaType::Ipv4)
    }

    #[must_use]
    pub fn ipv6() -> Self {
        Self::new(SchemaType::Ipv6)
    }

    pub fn regex(pattern: &str) -> Result<Self, DefinitionError> {
        Ok(Self::new(SchemaType::Regex(Pattern::new(pattern)?)))
    }

    #[must_use]
    pub fn enumeration(members: EnumMembers) -> Self {
        Self::new(SchemaType::Enum(members))
    }

    #[must_use]
    pub fn array(element: FieldSchema) -> Self {
        Self::new(SchemaType::Array(Box::new(element)))
    }

    /// Object node. A repeated field name keeps its first position and last schema.
    #[must_use]
    pub fn object<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = (S, FieldSchema)>,
        S: Into<String>,
    {
        let mut out: Vec<(String, FieldSchema)> = Vec::new();
        for (name, schema) in fields {
            let name = name.into();
            if let Some(slot) = out.iter_mut().find(|(n, _)| *n == name) {
                slot.1 = schema;
            } else {
                out.push((name, schema));
            }
        }
        Self::new(SchemaType::Object(out))
    }

    #[must_use]
    pub fn kind(&self) -> SchemaKind {
        self.ty.kind()
    }

    #[must_use]
    pub fn schema_type(&self) -> &SchemaType {
        &self.ty
    }

    #[must_use]
    pub fn meta(&self) -> &SchemaMeta {
        &self.meta
    }

    #[must_use]
    pub fn is_required(&self) -> bool {
        self.meta.required
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.meta.description.as_deref()
    }

    #[must_use]
    pub fn example(&self) -> Option<&Value> {
        self.meta.example.as_ref()
    }

    #[must_use]
    pub fn default_value(&self) -> Option<&Value> {
        self.meta.default.as_ref()
    }

    #[must_use]
    pub fn is_deprecated(&self) -> bool {
        self.meta.deprecated
    }

    /// Element schema of an array node.
    #[must_use]
    pub fn element(&self) -> Option<&FieldSchema> {
        match &self.ty {
            SchemaType::Array(el) => Some(el),
            _ => None,
        }
    }

    /// Ordered fields of an object node.
    #[must_use]
    pub fn fields(&self) -> Option<&[(String, FieldSchema)]> {
        match &self.ty {
            SchemaType::Object(fields) => Some(fields),
            _ => None,
        }
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields()?
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, s)| s)
    }

    #[must_use]
    pub fn enum_members(&self) -> Option<&EnumMembers> {
        match &self.ty {
            SchemaType::Enum(m) => Some(m),
            _ => None,
        }
    }

    #[must_use]
    pub fn pattern(&self) -> Option<&str> {
        match &self.ty {
            SchemaType::Regex(p) => Some(p.as_str()),
            _ => None,
        }
    }

    #[must_use]
    pub fn with_required(mut self, required: bool) -> Self {
        self.meta.required = required;
        self
    }

    #[must_use]
    pub fn optional(self) -> Self {
        self.with_required(false)
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.meta.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_example(mut self, example: impl Into<Value>) -> Self {
        self.meta.example = Some(example.into());
        self
    }

    /// Attach a default. A field with a default is never required.
    #[must_use]
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.meta.default = Some(default.into());
        self.meta.required = false;
        self
    }

    #[must_use]
    pub fn with_deprecated(mut self, deprecated: bool) -> Self {
        self.meta.deprecated = deprecated;
        self
    }

    #[must_use]
    pub fn with_meta(mut self, meta: SchemaMeta) -> Self {
        self.meta = meta;
        self
    }
}
