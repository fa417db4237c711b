use super::core::{normalize_route, path_param_names, Route, RouteTable};
use crate::config::RouterOptions;
use crate::endpoint::{Endpoint, EndpointSchema};
use crate::error::DefinitionError;
use crate::ids::{RequestId, REQUEST_ID_HEADER};
use crate::openapi::docs::{ai_plugin_manifest, redoc_ui, swagger_ui};
use crate::openapi::{derive_operation_id, json_schema, render_parameter, ApiDocument};
use crate::params::{classify, Parameter, ParameterList};
use crate::schema::TypeSpec;
use crate::server::{HandlerResponse, Request, JSON_UTF8};
use crate::validator::{validate, ValidationErrors, ValidationOutcome};
use http::Method;
use serde_json::{json, Value};
use std::any::Any;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, error, info, info_span, warn};

pub const AI_PLUGIN_PATH: &str = "/.well-known/ai-plugin.json";

type PlainHandler = Arc<dyn Fn(&Request) -> HandlerResponse + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DocsPage {
    SwaggerUi,
    ReDoc,
    OpenApiJson,
    AiPlugin,
}

struct RegisteredEndpoint {
    endpoint: Arc<dyn Endpoint>,
    operation_id: String,
    response_validators: HashMap<u16, jsonschema::Validator>,
}

enum Target {
    Endpoint(Arc<RegisteredEndpoint>),
    Plain {
        operation_id: String,
        handler: PlainHandler,
    },
    Docs(DocsPage),
}

/// Returned by every registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteHandle {
    pub method: Method,
    /// Documented path, with `base` and `{name}` parameters.
    pub path: String,
    pub operation_id: String,
}

/// Registers endpoints, documents them, and dispatches requests to them.
///
/// Every registration adds both a route and an operation to the API
/// document, so what is validated and what is documented come from the same
/// declaration.
pub struct OpenApiRouter {
    options: RouterOptions,
    routes: RouteTable<Target>,
    document: ApiDocument,
}

impl OpenApiRouter {
    /// Create a router and register its documentation endpoints.
    pub fn new(options: RouterOptions) -> Result<Self, DefinitionError> {
        let mut router = Self {
            document: ApiDocument::new(options.schema.clone()),
            options,
            routes: RouteTable::default(),
        };

        if let Some(openapi_url) = router.options.openapi_url.clone() {
            let mut pages = Vec::new();
            if let Some(url) = router.options.docs_url.clone() {
                pages.push((url, DocsPage::SwaggerUi));
            }
            if let Some(url) = router.options.redoc_url.clone() {
                pages.push((url, DocsPage::ReDoc));
            }
            pages.push((openapi_url, DocsPage::OpenApiJson));
            if router.options.ai_plugin.is_some() {
                pages.push((AI_PLUGIN_PATH.to_string(), DocsPage::AiPlugin));
            }
            for (url, page) in pages {
                let path = normalize_route(&router.options.base, &url);
                debug!(path = %path, page = ?page, "documentation endpoint registered");
                router
                    .routes
                    .push(Route::new(Method::GET, path, Target::Docs(page))?);
            }
        }
        Ok(router)
    }

    #[must_use]
    pub fn options(&self) -> &RouterOptions {
        &self.options
    }

    #[must_use]
    pub fn api_document(&self) -> &ApiDocument {
        &self.document
    }

    /// The API document as served at `openapi_url`.
    #[must_use]
    pub fn document(&self) -> Value {
        self.document.to_value()
    }

    /// Number of registered routes, documentation endpoints included.
    #[must_use]
    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    /// Register an endpoint for `method` at `route` (`/todos/:id` or `/todos/{id}`).
    ///
    /// # Errors
    ///
    /// [`DefinitionError::MissingOperationId`] when operation ids are not
    /// generated and the endpoint declares none.
    pub fn route<E>(&mut self, method: Method, route: &str, endpoint: E) -> Result<RouteHandle, DefinitionError>
    where
        E: Endpoint + 'static,
    {
        let path = normalize_route(&self.options.base, route);
        let derived = derive_operation_id(method.as_str(), endpoint.name(), route);
        let operation = endpoint.schema().rendered().clone();
        self.document.add_operation(
            &path,
            method.as_str(),
            operation,
            derived,
            self.options.generate_operation_ids,
            route,
        )?;
        let operation_id = self
            .document
            .operation(&path, method.as_str())
            .and_then(|op| op.get("operationId"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let response_validators = if self.options.validate_responses {
            compile_response_validators(endpoint.schema(), &operation_id)
        } else {
            HashMap::new()
        };

        let registered = RegisteredEndpoint {
            endpoint: Arc::new(endpoint),
            operation_id: operation_id.clone(),
            response_validators,
        };
        self.routes.push(Route::new(
            method.clone(),
            path.clone(),
            Target::Endpoint(Arc::new(registered)),
        )?);

        info!(method = %method, path = %path, operation_id = %operation_id, "route registered");
        Ok(RouteHandle {
            method,
            path,
            operation_id,
        })
    }

    pub fn get<E: Endpoint + 'static>(&mut self, route: &str, endpoint: E) -> Result<RouteHandle, DefinitionError> {
        self.route(Method::GET, route, endpoint)
    }

    pub fn post<E: Endpoint + 'static>(&mut self, route: &str, endpoint: E) -> Result<RouteHandle, DefinitionError> {
        self.route(Method::POST, route, endpoint)
    }

    pub fn put<E: Endpoint + 'static>(&mut self, route: &str, endpoint: E) -> Result<RouteHandle, DefinitionError> {
        self.route(Method::PUT, route, endpoint)
    }

    pub fn patch<E: Endpoint + 'static>(&mut self, route: &str, endpoint: E) -> Result<RouteHandle, DefinitionError> {
        self.route(Method::PATCH, route, endpoint)
    }

    pub fn delete<E: Endpoint + 'static>(&mut self, route: &str, endpoint: E) -> Result<RouteHandle, DefinitionError> {
        self.route(Method::DELETE, route, endpoint)
    }

    /// Register a handler without a declaration. Requests reach it
    /// unvalidated; its document entry has one required string parameter per
    /// path segment and a bare 200 response.
    pub fn route_plain<F, R>(
        &mut self,
        method: Method,
        route: &str,
        name: Option<&str>,
        handler: F,
    ) -> Result<RouteHandle, DefinitionError>
    where
        F: Fn(&Request) -> R + Send + Sync + 'static,
        R: Into<HandlerResponse>,
    {
        let path = normalize_route(&self.options.base, route);
        let operation_id = derive_operation_id(method.as_str(), name, route);

        let guessed = path_param_names(&path)
            .into_iter()
            .map(|n| Parameter::path(TypeSpec::string()).map(|p| p.named(n)))
            .collect::<Result<Vec<_>, _>>()?;
        let parameters: Vec<Value> = classify(ParameterList::Positional(guessed))?
            .iter()
            .map(render_parameter)
            .collect();
        let operation = json!({
            "operationId": operation_id,
            "parameters": parameters,
            "responses": { "200": { "description": "Successfully Response" } },
        });
        self.document
            .add_operation(&path, method.as_str(), operation, operation_id.clone(), true, route)?;

        let handler: PlainHandler = Arc::new(move |req: &Request| -> HandlerResponse { handler(req).into() });
        self.routes.push(Route::new(
            method.clone(),
            path.clone(),
            Target::Plain {
                operation_id: operation_id.clone(),
                handler,
            },
        )?);

        info!(method = %method, path = %path, operation_id = %operation_id, "plain route registered");
        Ok(RouteHandle {
            method,
            path,
            operation_id,
        })
    }

    /// Adopt the routes of `other` and copy its documented paths. Its
    /// documentation endpoints are dropped in favour of this router's.
    pub fn merge(&mut self, other: OpenApiRouter) {
        self.document.merge_paths(&other.document);
        let mut adopted = 0usize;
        for route in other.routes.into_routes() {
            if !matches!(route.target, Target::Docs(_)) {
                self.routes.push(route);
                adopted += 1;
            }
        }
        info!(routes = adopted, "nested router merged");
    }

    /// Dispatch one request. Never panics on bad input: unmatched routes are
    /// 404, validation failures are 400 and a panicking handler is 500.
    pub fn handle(&self, mut request: Request) -> HandlerResponse {
        let request_id = RequestId::from_header_or_new(request.header(REQUEST_ID_HEADER));
        let span = info_span!(
            "request",
            request_id = %request_id,
            method = %request.method(),
            path = %request.path()
        );
        let _guard = span.enter();

        let method = Method::from_bytes(request.method().to_ascii_uppercase().as_bytes()).ok();
        let path = request.path().to_string();
        let found = method.as_ref().and_then(|m| self.routes.find(m, &path));

        let mut response = match found {
            None => {
                warn!(method = %request.method(), path = %path, "No route matched");
                HandlerResponse::error(404, "Not Found")
            }
            Some((route, params)) => {
                request.set_path_params(params);
                match &route.target {
                    Target::Endpoint(registered) => self.dispatch_endpoint(registered, request),
                    Target::Plain {
                        operation_id,
                        handler,
                    } => run_guarded(operation_id, || handler(&request)),
                    Target::Docs(page) => self.serve_docs(*page, &request),
                }
            }
        };
        response.set_header(REQUEST_ID_HEADER, request_id.to_string());
        debug!(status = response.status, "request complete");
        response
    }

    fn dispatch_endpoint(&self, registered: &RegisteredEndpoint, mut request: Request) -> HandlerResponse {
        let schema = registered.endpoint.schema();
        let outcome = match validate(schema, &mut request, self.options.raise_unknown_parameters) {
            Ok(outcome) => outcome,
            Err(e) => {
                let status = e.status();
                if status >= 500 {
                    error!(operation_id = %registered.operation_id, error = %e, "request could not be validated");
                } else {
                    warn!(operation_id = %registered.operation_id, error = %e, "request rejected");
                }
                return HandlerResponse::error(status, &e.to_string());
            }
        };

        let data = match outcome {
            ValidationOutcome::Valid(data) => data,
            ValidationOutcome::Invalid(issues) => {
                debug!(
                    operation_id = %registered.operation_id,
                    issues = issues.len(),
                    "validation failed"
                );
                return HandlerResponse::validation_error(&ValidationErrors::from_issues(&issues));
            }
        };

        let endpoint = Arc::clone(&registered.endpoint);
        let response = run_guarded(&registered.operation_id, || endpoint.handle(&request, data));

        if let Some(validator) = registered.response_validators.get(&response.status) {
            if response.is_json() {
                let details: Vec<String> = validator
                    .iter_errors(&response.body)
                    .map(|e| e.to_string())
                    .collect();
                if !details.is_empty() {
                    error!(
                        operation_id = %registered.operation_id,
                        status = response.status,
                        errors = ?details,
                        "Response validation failed"
                    );
                    return HandlerResponse::json(
                        500,
                        json!({ "error": "Response validation failed", "details": details }),
                    );
                }
            }
        }
        response
    }

    fn serve_docs(&self, page: DocsPage, request: &Request) -> HandlerResponse {
        let openapi_path = self.options.openapi_path().unwrap_or_default();
        let title = &self.options.schema.info.title;
        let html = |rendered: Result<String, minijinja::Error>| match rendered {
            Ok(body) => HandlerResponse::html(body),
            Err(e) => {
                error!(error = %e, "documentation page failed to render");
                HandlerResponse::error(500, "documentation page failed to render")
            }
        };
        match page {
            DocsPage::SwaggerUi => html(swagger_ui(title, &openapi_path)),
            DocsPage::ReDoc => html(redoc_ui(title, &openapi_path)),
            DocsPage::OpenApiJson => {
                let mut resp = HandlerResponse::json(200, self.document());
                resp.set_header("content-type", JSON_UTF8);
                resp
            }
            DocsPage::AiPlugin => match &self.options.ai_plugin {
                Some(config) => {
                    let manifest = ai_plugin_manifest(config, &openapi_path, request.header("host"));
                    let mut resp = HandlerResponse::json(200, manifest);
                    resp.set_header("content-type", JSON_UTF8);
                    resp
                }
                None => HandlerResponse::error(404, "Not Found"),
            },
        }
    }
}

fn compile_response_validators(
    schema: &EndpointSchema,
    operation_id: &str,
) -> HashMap<u16, jsonschema::Validator> {
    let mut validators = HashMap::new();
    for (status, decl) in schema.responses() {
        let (Ok(code), Some(field)) = (status.parse::<u16>(), decl.schema()) else {
            continue;
        };
        if !decl.media_type().contains("json") {
            continue;
        }
        match jsonschema::validator_for(&json_schema(field)) {
            Ok(v) => {
                validators.insert(code, v);
            }
            Err(e) => {
                warn!(operation_id = %operation_id, status = code, error = %e, "response schema not compiled");
            }
        }
    }
    validators
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn run_guarded<F>(operation_id: &str, f: F) -> HandlerResponse
where
    F: FnOnce() -> HandlerResponse,
{
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(response) => response,
        Err(panic) => {
            let message = panic_message(panic.as_ref());
            error!(operation_id = %operation_id, panic_message = %message, "Handler panicked");
            HandlerResponse::error(500, &format!("Handler panicked: {message}"))
        }
    }
}
