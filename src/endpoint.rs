//! Endpoint declarations.
//!
//! An [`EndpointSchema`] is built once when the endpoint is defined and is
//! read-only afterwards. The composite validation schema and the rendered
//! operation fragment are derived from it on first use and cached; both are
//! pure functions of the declaration, so any number of requests may validate
//! against the same schema concurrently.

use crate::error::DefinitionError;
use crate::params::{classify, Body, DeclaredParameter, Location, Parameter, ParameterList, ResponseDecl};
use crate::schema::FieldSchema;
use crate::server::{HandlerResponse, Request};
use crate::validator::ValidatedData;
use serde_json::Value;
use std::sync::OnceLock;

/// The complete declaration of one endpoint.
#[derive(Debug, Clone)]
pub struct EndpointSchema {
    parameters: Vec<DeclaredParameter>,
    body: Option<Body>,
    responses: Vec<(String, ResponseDecl)>,
    summary: Option<String>,
    description: Option<String>,
    tags: Vec<String>,
    deprecated: bool,
    operation_id: Option<String>,
    composite: OnceLock<FieldSchema>,
    composite_with_body: OnceLock<FieldSchema>,
    rendered: OnceLock<Value>,
}

impl EndpointSchema {
    #[must_use]
    pub fn builder() -> EndpointSchemaBuilder {
        EndpointSchemaBuilder::default()
    }

    #[must_use]
    pub fn parameters(&self) -> &[DeclaredParameter] {
        &self.parameters
    }

    /// Parameters grouped by location, in `path`, `query`, `header`, `cookie`
    /// order. Locations without parameters are left out.
    #[must_use]
    pub fn parameters_by_location(&self) -> Vec<(Location, Vec<&DeclaredParameter>)> {
        Location::ALL
            .iter()
            .filter_map(|loc| {
                let group: Vec<&DeclaredParameter> = self
                    .parameters
                    .iter()
                    .filter(|p| p.location() == *loc)
                    .collect();
                (!group.is_empty()).then_some((*loc, group))
            })
            .collect()
    }

    #[must_use]
    pub fn body(&self) -> Option<&Body> {
        self.body.as_ref()
    }

    #[must_use]
    pub fn responses(&self) -> &[(String, ResponseDecl)] {
        &self.responses
    }

    #[must_use]
    pub fn response(&self, status: &str) -> Option<&ResponseDecl> {
        self.responses
            .iter()
            .find(|(s, _)| s == status)
            .map(|(_, r)| r)
    }

    #[must_use]
    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    #[must_use]
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    #[must_use]
    pub fn is_deprecated(&self) -> bool {
        self.deprecated
    }

    #[must_use]
    pub fn operation_id(&self) -> Option<&str> {
        self.operation_id.as_deref()
    }

    /// Whether a request with `method` has its body read and validated.
    #[must_use]
    pub fn reads_body(&self, method: &str) -> bool {
        !method.eq_ignore_ascii_case("get") && self.body.as_ref().is_some_and(Body::is_json)
    }

    /// One object with a child per location (and `body` when the method reads it).
    pub fn composite_schema(&self, method: &str) -> &FieldSchema {
        if self.reads_body(method) {
            self.composite_with_body
                .get_or_init(|| self.build_composite(true))
        } else {
            self.composite.get_or_init(|| self.build_composite(false))
        }
    }

    fn build_composite(&self, with_body: bool) -> FieldSchema {
        let mut sections: Vec<(String, FieldSchema)> = self
            .parameters_by_location()
            .into_iter()
            .map(|(loc, params)| {
                let fields = params
                    .into_iter()
                    .map(|p| (p.name().to_string(), p.schema().clone()));
                (loc.as_str().to_string(), FieldSchema::object(fields))
            })
            .collect();
        if with_body {
            if let Some(body) = &self.body {
                sections.push(("body".to_string(), body.schema().clone()));
            }
        }
        FieldSchema::object(sections)
    }

    /// Operation fragment for the API document, without `operationId`
    /// unless one was declared.
    pub fn rendered(&self) -> &Value {
        self.rendered
            .get_or_init(|| crate::openapi::render_operation(self))
    }
}

/// Builder for [`EndpointSchema`]. Declarations are checked in [`EndpointSchemaBuilder::build`].
#[derive(Debug, Default)]
pub struct EndpointSchemaBuilder {
    parameters: ParameterList,
    body: Option<Body>,
    responses: Vec<(String, ResponseDecl)>,
    summary: Option<String>,
    description: Option<String>,
    tags: Vec<String>,
    deprecated: bool,
    operation_id: Option<String>,
}

impl EndpointSchemaBuilder {
    /// Replace the parameter list.
    #[must_use]
    pub fn parameters(mut self, parameters: impl Into<ParameterList>) -> Self {
        self.parameters = parameters.into();
        self
    }

    /// Add one parameter under `name`.
    #[must_use]
    pub fn parameter(mut self, name: &str, parameter: Parameter) -> Self {
        match &mut self.parameters {
            ParameterList::Named(list) => list.push((name.to_string(), parameter)),
            ParameterList::Positional(list) => list.push(parameter.named(name)),
        }
        self
    }

    #[must_use]
    pub fn body(mut self, body: Body) -> Self {
        self.body = Some(body);
        self
    }

    /// Declare the response for a status code (`"200"`, `"404"`, `"default"`).
    #[must_use]
    pub fn response(mut self, status: impl ToString, response: ResponseDecl) -> Self {
        let status = status.to_string();
        match self.responses.iter_mut().find(|(s, _)| *s == status) {
            Some(slot) => slot.1 = response,
            None => self.responses.push((status, response)),
        }
        self
    }

    #[must_use]
    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    #[must_use]
    pub fn deprecated(mut self, deprecated: bool) -> Self {
        self.deprecated = deprecated;
        self
    }

    #[must_use]
    pub fn operation_id(mut self, operation_id: impl Into<String>) -> Self {
        self.operation_id = Some(operation_id.into());
        self
    }

    /// Classify parameters and freeze the declaration.
    pub fn build(self) -> Result<EndpointSchema, DefinitionError> {
        let parameters = classify(self.parameters)?;
        Ok(EndpointSchema {
            parameters,
            body: self.body,
            responses: self.responses,
            summary: self.summary,
            description: self.description,
            tags: self.tags,
            deprecated: self.deprecated,
            operation_id: self.operation_id,
            composite: OnceLock::new(),
            composite_with_body: OnceLock::new(),
            rendered: OnceLock::new(),
        })
    }
}

/// Business logic behind a declared endpoint. `handle` only ever sees data
/// that passed validation.
pub trait Endpoint: Send + Sync {
    fn schema(&self) -> &EndpointSchema;

    /// Handler name used to derive an operation id.
    fn name(&self) -> Option<&str> {
        None
    }

    fn handle(&self, request: &Request, data: ValidatedData) -> HandlerResponse;
}

/// [`Endpoint`] backed by a closure.
pub struct FnEndpoint<F> {
    schema: EndpointSchema,
    name: Option<String>,
    handler: F,
}

impl<F> FnEndpoint<F> {
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl<F, R> Endpoint for FnEndpoint<F>
where
    F: Fn(&Request, ValidatedData) -> R + Send + Sync,
    R: Into<HandlerResponse>,
{
    fn schema(&self) -> &EndpointSchema {
        &self.schema
    }

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn handle(&self, request: &Request, data: ValidatedData) -> HandlerResponse {
        (self.handler)(request, data).into()
    }
}

/// Wrap a closure as an endpoint.
pub fn endpoint_fn<F, R>(schema: EndpointSchema, handler: F) -> FnEndpoint<F>
where
    F: Fn(&Request, ValidatedData) -> R + Send + Sync,
    R: Into<HandlerResponse>,
{
    FnEndpoint {
        schema,
        name: None,
        handler,
    }
}
