//! Declaring endpoint inputs and outputs.
//!
//! `Parameter::query`, `Parameter::path`, `Parameter::header` and
//! `Parameter::cookie` wrap a [`TypeSpec`] with a location. A
//! [`ParameterList`] is then classified into [`DeclaredParameter`]s, each with
//! a resolved name.

use crate::error::DefinitionError;
use crate::schema::{normalize, FieldSchema, ParamOptions, TypeSpec};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Part of the request a parameter is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Location {
    Path,
    Query,
    Header,
    Cookie,
}

impl Location {
    pub const ALL: [Location; 4] = [
        Location::Path,
        Location::Query,
        Location::Header,
        Location::Cookie,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Location::Path => "path",
            Location::Query => "query",
            Location::Header => "header",
            Location::Cookie => "cookie",
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A located parameter declaration. The name may still be unresolved.
#[derive(Debug, Clone)]
pub struct Parameter {
    location: Location,
    name: Option<String>,
    required: bool,
    schema: FieldSchema,
}

impl Parameter {
    /// Declare a parameter. The schema is normalized here, so every
    /// declaration mistake surfaces before any request is seen.
    pub fn new(
        location: Location,
        spec: impl Into<TypeSpec>,
        options: ParamOptions,
    ) -> Result<Self, DefinitionError> {
        let spec = spec.into();
        let schema = normalize(&spec, &options)?;
        let required = match (&options.default, options.required) {
            (Some(_), _) => false,
            (None, Some(required)) => required,
            (None, None) => schema.is_required(),
        };
        Ok(Self {
            location,
            name: options.name,
            required,
            schema: schema.with_required(required),
        })
    }

    pub fn query(spec: impl Into<TypeSpec>) -> Result<Self, DefinitionError> {
        Self::new(Location::Query, spec, ParamOptions::default())
    }

    pub fn query_with(
        spec: impl Into<TypeSpec>,
        options: ParamOptions,
    ) -> Result<Self, DefinitionError> {
        Self::new(Location::Query, spec, options)
    }

    pub fn path(spec: impl Into<TypeSpec>) -> Result<Self, DefinitionError> {
        Self::new(Location::Path, spec, ParamOptions::default())
    }

    pub fn path_with(
        spec: impl Into<TypeSpec>,
        options: ParamOptions,
    ) -> Result<Self, DefinitionError> {
        Self::new(Location::Path, spec, options)
    }

    pub fn header(spec: impl Into<TypeSpec>) -> Result<Self, DefinitionError> {
        Self::new(Location::Header, spec, ParamOptions::default())
    }

    pub fn header_with(
        spec: impl Into<TypeSpec>,
        options: ParamOptions,
    ) -> Result<Self, DefinitionError> {
        Self::new(Location::Header, spec, options)
    }

    /// Cookie parameters can be declared and documented, but reading one from
    /// a request fails with `NotImplemented`.
    pub fn cookie(spec: impl Into<TypeSpec>) -> Result<Self, DefinitionError> {
        Self::new(Location::Cookie, spec, ParamOptions::default())
    }

    pub fn cookie_with(
        spec: impl Into<TypeSpec>,
        options: ParamOptions,
    ) -> Result<Self, DefinitionError> {
        Self::new(Location::Cookie, spec, options)
    }

    /// Set the name, overriding any mapping key it is declared under.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Force the parameter to be required.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self.schema = self.schema.with_required(true);
        self
    }

    #[must_use]
    pub fn location(&self) -> Location {
        self.location
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[must_use]
    pub fn schema(&self) -> &FieldSchema {
        &self.schema
    }
}

/// A parameter after classification: located and named.
#[derive(Debug, Clone)]
pub struct DeclaredParameter {
    name: String,
    location: Location,
    required: bool,
    schema: FieldSchema,
}

impl DeclaredParameter {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn location(&self) -> Location {
        self.location
    }

    #[must_use]
    pub fn is_required(&self) -> bool {
        self.required
    }

    #[must_use]
    pub fn schema(&self) -> &FieldSchema {
        &self.schema
    }
}

/// Parameters as declared on an endpoint.
///
/// In the mapping form the key names the parameter unless the declaration
/// carries its own name. In the list form every parameter must be named.
#[derive(Debug, Clone)]
pub enum ParameterList {
    Named(Vec<(String, Parameter)>),
    Positional(Vec<Parameter>),
}

impl Default for ParameterList {
    fn default() -> Self {
        ParameterList::Named(Vec::new())
    }
}

impl From<Vec<Parameter>> for ParameterList {
    fn from(params: Vec<Parameter>) -> Self {
        ParameterList::Positional(params)
    }
}

impl From<Vec<(String, Parameter)>> for ParameterList {
    fn from(params: Vec<(String, Parameter)>) -> Self {
        ParameterList::Named(params)
    }
}

impl<const N: usize> From<[(&str, Parameter); N]> for ParameterList {
    fn from(params: [(&str, Parameter); N]) -> Self {
        ParameterList::Named(
            params
                .into_iter()
                .map(|(k, p)| (k.to_string(), p))
                .collect(),
        )
    }
}

/// Resolve names and return the parameters in declaration order.
///
/// A name declared twice keeps its first position and its last declaration.
pub fn classify(list: ParameterList) -> Result<Vec<DeclaredParameter>, DefinitionError> {
    let mut out: Vec<DeclaredParameter> = Vec::new();
    let named = match list {
        ParameterList::Named(pairs) => pairs
            .into_iter()
            .map(|(key, p)| {
                let name = p.name.clone().unwrap_or(key);
                (name, p)
            })
            .collect::<Vec<_>>(),
        ParameterList::Positional(params) => params
            .into_iter()
            .enumerate()
            .map(|(index, p)| match p.name.clone() {
                Some(name) => Ok((name, p)),
                None => Err(DefinitionError::MissingParameterName { index }),
            })
            .collect::<Result<Vec<_>, _>>()?,
    };
    for (name, p) in named {
        let declared = DeclaredParameter {
            name,
            location: p.location,
            required: p.required,
            schema: p.schema,
        };
        match out.iter_mut().find(|d| d.name == declared.name) {
            Some(slot) => *slot = declared,
            None => out.push(declared),
        }
    }
    Ok(out)
}

/// Request body declaration.
#[derive(Debug, Clone)]
pub struct Body {
    schema: FieldSchema,
    content_type: String,
    description: Option<String>,
    required: bool,
}

impl Body {
    /// A JSON body. A plain mapping declares an object.
    pub fn new(spec: impl Into<TypeSpec>) -> Result<Self, DefinitionError> {
        let schema = normalize(&spec.into(), &ParamOptions::default())?;
        Ok(Self {
            required: schema.is_required(),
            schema,
            content_type: JSON_CONTENT_TYPE.to_string(),
            description: None,
        })
    }

    #[must_use]
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn optional(mut self) -> Self {
        self.required = false;
        self.schema = self.schema.with_required(false);
        self
    }

    #[must_use]
    pub fn schema(&self) -> &FieldSchema {
        &self.schema
    }

    #[must_use]
    pub fn media_type(&self) -> &str {
        &self.content_type
    }

    #[must_use]
    pub fn describe(&self) -> Option<&str> {
        self.description.as_deref()
    }

    #[must_use]
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Whether the body is read and validated as JSON.
    #[must_use]
    pub fn is_json(&self) -> bool {
        self.content_type.eq_ignore_ascii_case(JSON_CONTENT_TYPE)
    }
}

/// One documented response.
#[derive(Debug, Clone)]
pub struct ResponseDecl {
    schema: Option<FieldSchema>,
    content_type: String,
    description: Option<String>,
}

impl ResponseDecl {
    pub fn new(spec: impl Into<TypeSpec>) -> Result<Self, DefinitionError> {
        Ok(Self {
            schema: Some(normalize(&spec.into(), &ParamOptions::default())?),
            content_type: JSON_CONTENT_TYPE.to_string(),
            description: None,
        })
    }

    /// A response documented by description only.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            schema: None,
            content_type: JSON_CONTENT_TYPE.to_string(),
            description: None,
        }
    }

    #[must_use]
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn schema(&self) -> Option<&FieldSchema> {
        self.schema.as_ref()
    }

    #[must_use]
    pub fn media_type(&self) -> &str {
        &self.content_type
    }

    #[must_use]
    pub fn describe(&self) -> Option<&str> {
        self.description.as_deref()
    }
}
