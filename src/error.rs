//! Error types.
//!
//! Two families, matching the two lifetimes of the engine:
//!
//! - [`DefinitionError`] is raised while an endpoint is being declared or
//!   registered. It signals a programming mistake and is meant to abort
//!   registration.
//! - [`RequestError`] is raised while handling one request, for faults that are
//!   not field-level validation issues (an unparseable body, an unsupported
//!   parameter location). Field-level problems are never errors; they are
//!   reported through [`crate::validator::ValidationOutcome`].

use thiserror::Error;

/// A declaration the engine refuses to accept.
#[derive(Debug, Error)]
pub enum DefinitionError {
    /// The declaration shape cannot be resolved to a schema kind.
    #[error("unsupported type declaration: {value}")]
    UnsupportedType { value: String },

    /// An array declaration without an element type.
    #[error("array must declare an element type")]
    EmptyArray,

    /// A parameter in an array-form list carries no name.
    #[error("parameter at position {index} must have a defined name when parameters are declared as a list")]
    MissingParameterName { index: usize },

    /// Operation ids are required but the route does not define one.
    #[error("route {route} does not have an operationId set")]
    MissingOperationId { route: String },

    /// A regex-constrained string was declared with a pattern that does not compile.
    #[error("invalid pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// An enumeration was declared with no members.
    #[error("enumeration must declare at least one value")]
    MissingEnumValues,

    /// A declared default does not satisfy its own schema.
    #[error("default value does not satisfy its schema: {message}")]
    InvalidDefault { message: String },
}

/// A per-request fault that is not a field-level validation issue.
#[derive(Debug, Error)]
pub enum RequestError {
    /// The request body is not valid JSON.
    #[error("request body is not valid JSON: {0}")]
    BodyParse(#[from] serde_json::Error),

    /// The body stream was already read by an earlier validation pass.
    #[error("request body has already been consumed")]
    BodyConsumed,

    /// A parameter location that cannot be read from requests.
    #[error("{feature} not implemented")]
    NotImplemented { feature: String },
}

impl RequestError {
    /// HTTP status the router answers with when this error escapes validation.
    #[must_use]
    pub fn status(&self) -> u16 {
        match self {
            RequestError::BodyParse(_) => 400,
            RequestError::BodyConsumed | RequestError::NotImplemented { .. } => 500,
        }
    }
}
