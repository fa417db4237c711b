//! # schemaroute
//!
//! **schemaroute** declares HTTP endpoint inputs once and derives both request
//! validation and an [OpenAPI 3.1.0](https://spec.openapis.org/oas/v3.1.0)
//! document from that single declaration.
//!
//! ## Architecture
//!
//! - **[`schema`]** - canonical field schemas, the declaration normalizer and
//!   the coercing validator behind every check
//! - **[`params`]** - query/path/header/cookie parameters, request bodies and
//!   response declarations
//! - **[`endpoint`]** - endpoint schemas and the [`Endpoint`] handler trait
//! - **[`validator`]** - per-request extraction, coercion and error flattening
//! - **[`openapi`]** - rendering declarations into the API document and the
//!   Swagger UI / ReDoc pages
//! - **[`router`]** - route registration, nested routers and dispatch
//! - **[`server`]** - transport-neutral request and response types
//! - **[`config`]** - router options, loadable from YAML, JSON or TOML
//! - **[`logging`]** - `tracing` subscriber setup
//!
//! ## Example
//!
//! ```rust,no_run
//! use schemaroute::config::RouterOptions;
//! use schemaroute::endpoint::{endpoint_fn, EndpointSchema};
//! use schemaroute::params::Parameter;
//! use schemaroute::router::OpenApiRouter;
//! use schemaroute::schema::TypeSpec;
//! use schemaroute::server::{HandlerResponse, Request};
//! use serde_json::json;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let schema = EndpointSchema::builder()
//!     .parameter("id", Parameter::path(TypeSpec::integer())?)
//!     .summary("Fetch a todo")
//!     .build()?;
//!
//! let mut router = OpenApiRouter::new(RouterOptions::default())?;
//! router.get(
//!     "/todos/:id",
//!     endpoint_fn(schema, |_req, data| {
//!         HandlerResponse::json(200, json!({ "id": data.path().and_then(|p| p.get("id")) }))
//!     }),
//! )?;
//!
//! let response = router.handle(Request::new("GET", "/todos/7"));
//! assert_eq!(response.status, 200);
//! # Ok(())
//! # }
//! ```
//!
//! ## Validation errors
//!
//! A request that fails validation never reaches its handler. The router
//! answers with status 400 and
//!
//! ```json
//! {
//!   "errors": { "formErrors": [], "fieldErrors": { "query.page": ["Expected number, received 'abc'"] } },
//!   "success": false,
//!   "result": {}
//! }
//! ```

pub mod config;
pub mod endpoint;
pub mod error;
pub mod ids;
pub mod logging;
pub mod openapi;
pub mod params;
pub mod router;
pub mod schema;
pub mod server;
pub mod validator;

pub use config::RouterOptions;
pub use endpoint::{endpoint_fn, Endpoint, EndpointSchema};
pub use error::{DefinitionError, RequestError};
pub use params::{Body, Location, Parameter, ResponseDecl};
pub use router::{OpenApiRouter, RouteHandle};
pub use schema::{normalize, FieldSchema, ParamOptions, TypeSpec};
pub use server::{HandlerResponse, Request};
pub use validator::{validate, ValidatedData, ValidationErrors, ValidationOutcome};
