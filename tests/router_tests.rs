#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use http::Method;
use schemaroute::config::{AiPluginApi, AiPluginConfig, RouterOptions};
use schemaroute::endpoint::{endpoint_fn, Endpoint, EndpointSchema};
use schemaroute::ids::REQUEST_ID_HEADER;
use schemaroute::params::{Body, Location, Parameter, ResponseDecl};
use schemaroute::router::OpenApiRouter;
use schemaroute::schema::TypeSpec;
use schemaroute::server::{HandlerResponse, Request};
use schemaroute::validator::ValidatedData;
use serde_json::json;

struct GetTodo {
    schema: EndpointSchema,
}

impl GetTodo {
    fn new() -> Self {
        Self {
            schema: EndpointSchema::builder()
                .parameters([
                    ("id", Parameter::path(TypeSpec::integer()).unwrap()),
                    ("verbose", Parameter::query(TypeSpec::boolean()).unwrap().named("verbose")),
                ])
                .response(
                    200,
                    ResponseDecl::new(TypeSpec::object([("id", TypeSpec::integer())])).unwrap(),
                )
                .build()
                .unwrap(),
        }
    }
}

impl Endpoint for GetTodo {
    fn schema(&self) -> &EndpointSchema {
        &self.schema
    }

    fn name(&self) -> Option<&str> {
        Some("GetTodo")
    }

    fn handle(&self, _request: &Request, data: ValidatedData) -> HandlerResponse {
        let id = data.get(Location::Path, "id").cloned().unwrap_or_default();
        let verbose = data.get(Location::Query, "verbose").cloned().unwrap_or_default();
        HandlerResponse::json(200, json!({ "id": id, "verbose": verbose }))
    }
}

fn router_with(options: RouterOptions) -> OpenApiRouter {
    let mut router = OpenApiRouter::new(options).unwrap();
    router.get("/todos/:id", GetTodo::new()).unwrap();
    router
}

#[test]
fn test_valid_request_reaches_handler_with_coerced_data() {
    let router = router_with(RouterOptions::default());
    let resp = router.handle(Request::new("GET", "/todos/42?verbose=1"));
    assert_eq!(resp.status, 200);
    assert_eq!(resp.body, json!({ "id": 42, "verbose": true }));
    assert!(resp.get_header(REQUEST_ID_HEADER).is_some());
}

#[test]
fn test_invalid_request_gets_error_envelope() {
    let router = router_with(RouterOptions::default());
    let resp = router.handle(Request::new("GET", "/todos/abc"));
    assert_eq!(resp.status, 400);
    assert_eq!(
        resp.body,
        json!({
            "errors": {
                "formErrors": [],
                "fieldErrors": {
                    "path.id": ["Expected integer, received 'abc'"],
                    "query.verbose": ["Required"]
                }
            },
            "success": false,
            "result": {}
        })
    );
}

#[test]
fn test_unmatched_route_is_404() {
    let router = router_with(RouterOptions::default());
    assert_eq!(router.handle(Request::new("GET", "/missing")).status, 404);
    assert_eq!(router.handle(Request::new("POST", "/todos/1")).status, 404);
}

#[test]
fn test_inbound_request_id_is_echoed() {
    let router = router_with(RouterOptions::default());
    let id = schemaroute::ids::RequestId::new().to_string();
    let resp = router.handle(Request::new("GET", "/todos/1?verbose=true").with_header("X-Request-Id", &id));
    assert_eq!(resp.get_header(REQUEST_ID_HEADER), Some(id.as_str()));
}

#[test]
fn test_docs_endpoints_are_served() {
    let router = router_with(RouterOptions::default().with_title("Todo API"));

    let swagger = router.handle(Request::new("GET", "/docs"));
    assert_eq!(swagger.status, 200);
    assert_eq!(swagger.get_header("content-type"), Some("text/html; charset=UTF-8"));
    let html = swagger.body.as_str().unwrap();
    assert!(html.contains("<title>Todo API - Swagger UI</title>"));
    assert!(html.contains("\"/openapi.json\""));

    let redoc = router.handle(Request::new("GET", "/redocs"));
    assert_eq!(redoc.status, 200);
    assert!(redoc.body.as_str().unwrap().contains("spec-url=\"/openapi.json\""));

    let doc = router.handle(Request::new("GET", "/openapi.json"));
    assert_eq!(doc.status, 200);
    assert_eq!(doc.get_header("content-type"), Some("application/json;charset=UTF-8"));
    assert_eq!(doc.body, router.document());
    assert_eq!(doc.body["paths"]["/todos/{id}"]["get"]["operationId"], json!("get_GetTodo"));
}

#[test]
fn test_docs_follow_base_and_can_be_disabled() {
    let options = RouterOptions {
        redoc_url: None,
        ..RouterOptions::default().with_base("/api")
    };
    let router = router_with(options);
    assert_eq!(router.handle(Request::new("GET", "/api/docs")).status, 200);
    assert_eq!(router.handle(Request::new("GET", "/api/redocs")).status, 404);
    assert_eq!(router.handle(Request::new("GET", "/api/openapi.json")).status, 200);
    assert_eq!(router.handle(Request::new("GET", "/api/todos/3?verbose=0")).status, 200);

    let no_docs = router_with(RouterOptions {
        openapi_url: None,
        ..RouterOptions::default()
    });
    assert_eq!(no_docs.handle(Request::new("GET", "/docs")).status, 404);
    assert_eq!(no_docs.route_count(), 1);
}

#[test]
fn test_ai_plugin_manifest() {
    let options = RouterOptions {
        ai_plugin: Some(AiPluginConfig {
            name_for_human: "Todo".into(),
            name_for_model: "todo".into(),
            description_for_human: "Manage todos".into(),
            description_for_model: "Manage the user's todos".into(),
            logo_url: "https://example.com/logo.png".into(),
            contact_email: "dev@example.com".into(),
            legal_info_url: "https://example.com/legal".into(),
            api: Some(AiPluginApi::default()),
            ..AiPluginConfig::default()
        }),
        ..RouterOptions::default()
    };
    let router = router_with(options);
    let resp = router.handle(
        Request::new("GET", "/.well-known/ai-plugin.json").with_header("Host", "todo.example.com"),
    );
    assert_eq!(resp.status, 200);
    assert_eq!(resp.body["schema_version"], json!("v1"));
    assert_eq!(resp.body["auth"], json!({ "type": "none" }));
    assert_eq!(resp.body["name_for_model"], json!("todo"));
    assert_eq!(
        resp.body["api"],
        json!({
            "type": "openapi",
            "has_user_authentication": false,
            "url": "https://todo.example.com/openapi.json"
        })
    );
}

#[test]
fn test_ai_plugin_manifest_points_at_served_document_under_base() {
    let options = RouterOptions {
        ai_plugin: Some(AiPluginConfig {
            api: Some(AiPluginApi::default()),
            ..AiPluginConfig::default()
        }),
        ..RouterOptions::default().with_base("/api")
    };
    let router = router_with(options);
    let resp = router.handle(
        Request::new("GET", "/api/.well-known/ai-plugin.json").with_header("Host", "todo.example.com"),
    );
    assert_eq!(resp.status, 200);
    assert_eq!(resp.body["api"]["url"], json!("https://todo.example.com/api/openapi.json"));
    assert_eq!(router.handle(Request::new("GET", "/api/openapi.json")).status, 200);
}

#[test]
fn test_handler_panic_becomes_500() {
    let schema = EndpointSchema::builder().build().unwrap();
    let mut router = OpenApiRouter::new(RouterOptions::default()).unwrap();
    router
        .get(
            "/boom",
            endpoint_fn(schema, |_req, _data| -> HandlerResponse { panic!("kaboom") }),
        )
        .unwrap();
    let resp = router.handle(Request::new("GET", "/boom"));
    assert_eq!(resp.status, 500);
    assert!(resp.body["error"].as_str().unwrap().contains("kaboom"));
}

#[test]
fn test_malformed_body_is_400() {
    let schema = EndpointSchema::builder()
        .body(Body::new(TypeSpec::object([("title", TypeSpec::string())])).unwrap())
        .build()
        .unwrap();
    let mut router = OpenApiRouter::new(RouterOptions::default()).unwrap();
    router
        .post("/todos", endpoint_fn(schema, |_req, data| json!(data.body())))
        .unwrap();

    let bad = router.handle(Request::new("POST", "/todos").with_body("{"));
    assert_eq!(bad.status, 400);

    let good = router.handle(Request::new("POST", "/todos").with_json(&json!({ "title": "x" })));
    assert_eq!(good.status, 200);
    assert_eq!(good.body, json!({ "title": "x" }));
}

#[test]
fn test_strictness_follows_options() {
    let schema = || {
        EndpointSchema::builder()
            .body(Body::new(TypeSpec::object([("title", TypeSpec::string())])).unwrap())
            .build()
            .unwrap()
    };
    let body = json!({ "title": "x", "extra": 1 });

    let mut strict = OpenApiRouter::new(RouterOptions::default()).unwrap();
    strict
        .post("/todos", endpoint_fn(schema(), |_req, data| json!(data.body())))
        .unwrap();
    let resp = strict.handle(Request::new("POST", "/todos").with_json(&body));
    assert_eq!(resp.status, 400);
    assert_eq!(
        resp.body["errors"]["fieldErrors"]["body"],
        json!(["Unrecognized key: 'extra'"])
    );

    let mut lenient = OpenApiRouter::new(RouterOptions::default().strict(false)).unwrap();
    lenient
        .post("/todos", endpoint_fn(schema(), |_req, data| json!(data.body())))
        .unwrap();
    let resp = lenient.handle(Request::new("POST", "/todos").with_json(&body));
    assert_eq!(resp.status, 200);
    assert_eq!(resp.body, json!({ "title": "x" }));
}

#[test]
fn test_response_validation() {
    let schema = || {
        EndpointSchema::builder()
            .response(
                200,
                ResponseDecl::new(TypeSpec::object([("id", TypeSpec::integer())])).unwrap(),
            )
            .build()
            .unwrap()
    };
    let options = RouterOptions {
        validate_responses: true,
        ..RouterOptions::default()
    };
    let mut router = OpenApiRouter::new(options).unwrap();
    router
        .get("/good", endpoint_fn(schema(), |_req, _data| json!({ "id": 1 })))
        .unwrap();
    router
        .get("/bad", endpoint_fn(schema(), |_req, _data| json!({ "id": "one" })))
        .unwrap();
    router
        .get(
            "/created",
            endpoint_fn(schema(), |_req, _data| HandlerResponse::json(201, json!("anything"))),
        )
        .unwrap();

    assert_eq!(router.handle(Request::new("GET", "/good")).status, 200);
    let bad = router.handle(Request::new("GET", "/bad"));
    assert_eq!(bad.status, 500);
    assert_eq!(bad.body["error"], json!("Response validation failed"));
    assert_eq!(router.handle(Request::new("GET", "/created")).status, 201);
}

#[test]
fn test_plain_route_is_unvalidated() {
    let mut router = OpenApiRouter::new(RouterOptions::default()).unwrap();
    router
        .route_plain(Method::GET, "/echo/:word", None, |req: &Request| {
            json!({ "word": req.path_param("word") })
        })
        .unwrap();
    let resp = router.handle(Request::new("GET", "/echo/hello%20world"));
    assert_eq!(resp.status, 200);
    assert_eq!(resp.body, json!({ "word": "hello world" }));
}

#[test]
fn test_merged_router_dispatches_nested_routes() {
    let mut nested = OpenApiRouter::new(RouterOptions::default().with_base("/v2")).unwrap();
    nested.get("/todos/:id", GetTodo::new()).unwrap();

    let mut root = router_with(RouterOptions::default());
    root.merge(nested);

    assert_eq!(root.handle(Request::new("GET", "/v2/todos/5?verbose=false")).status, 200);
    assert_eq!(root.handle(Request::new("GET", "/v2/docs")).status, 404);
    assert!(root.document()["paths"].get("/v2/todos/{id}").is_some());
}

#[test]
fn test_merged_router_keeps_methods_on_shared_path() {
    let create = || {
        endpoint_fn(
            EndpointSchema::builder()
                .body(Body::new(TypeSpec::object([("title", TypeSpec::string())])).unwrap())
                .build()
                .unwrap(),
            |_req, data| json!(data.body()),
        )
    };
    let list = || endpoint_fn(EndpointSchema::builder().build().unwrap(), |_req, _data| json!([]));

    let mut root = OpenApiRouter::new(RouterOptions::default()).unwrap();
    root.post("/todos", create()).unwrap();
    let mut nested = OpenApiRouter::new(RouterOptions::default()).unwrap();
    nested.get("/todos", list()).unwrap();
    root.merge(nested);

    let doc = root.document();
    let methods = doc["paths"]["/todos"].as_object().unwrap();
    assert!(methods.contains_key("post"));
    assert!(methods.contains_key("get"));
    assert_eq!(root.handle(Request::new("GET", "/todos")).status, 200);
    assert_eq!(
        root.handle(Request::new("POST", "/todos").with_json(&json!({ "title": "x" }))).status,
        200
    );
}

#[test]
fn test_head_is_served_by_get_routes() {
    let router = router_with(RouterOptions::default());
    assert_eq!(router.handle(Request::new("HEAD", "/todos/1?verbose=1")).status, 200);
}
