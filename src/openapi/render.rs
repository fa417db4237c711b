use crate::endpoint::EndpointSchema;
use crate::params::{Body, DeclaredParameter, ResponseDecl};
use crate::schema::{FieldSchema, SchemaType};
use serde_json::{json, Map, Value};

pub const DEFAULT_RESPONSE_DESCRIPTION: &str = "Successful Response";

/// JSON Schema (OpenAPI 3 dialect) for a field schema.
#[must_use]
pub fn json_schema(schema: &FieldSchema) -> Value {
    let mut out = Map::new();
    let mut put = |k: &str, v: Value| {
        out.insert(k.to_string(), v);
    };

    match schema.schema_type() {
        SchemaType::String => put("type", json!("string")),
        SchemaType::Number => put("type", json!("number")),
        SchemaType::Integer => put("type", json!("integer")),
        SchemaType::Boolean => put("type", json!("boolean")),
        SchemaType::DateTime => {
            put("type", json!("string"));
            put("format", json!("date-time"));
        }
        SchemaType::DateOnly => {
            put("type", json!("string"));
            put("format", json!("date"));
        }
        SchemaType::Regex(pattern) => {
            put("type", json!("string"));
            put("pattern", json!(pattern.as_str()));
        }
        SchemaType::Email => {
            put("type", json!("string"));
            put("format", json!("email"));
        }
        SchemaType::Uuid => {
            put("type", json!("string"));
            put("format", json!("uuid"));
        }
        SchemaType::Hostname => {
            put("type", json!("string"));
            put("format", json!("hostname"));
        }
        SchemaType::Ipv4 => {
            put("type", json!("string"));
            put("format", json!("ipv4"));
        }
        SchemaType::Ipv6 => {
            put("type", json!("string"));
            put("format", json!("ipv6"));
        }
        SchemaType::Enum(members) => {
            put("type", json!("string"));
            put("enum", Value::from(members.labels().collect::<Vec<_>>()));
        }
        SchemaType::Array(element) => {
            put("type", json!("array"));
            put("items", json_schema(element));
        }
        SchemaType::Object(fields) => {
            put("type", json!("object"));
            let properties: Map<String, Value> = fields
                .iter()
                .map(|(name, child)| (name.clone(), json_schema(child)))
                .collect();
            let required: Vec<&str> = fields
                .iter()
                .filter(|(_, child)| child.is_required())
                .map(|(name, _)| name.as_str())
                .collect();
            put("properties", Value::Object(properties));
            if !required.is_empty() {
                put("required", Value::from(required));
            }
        }
    }

    if let Some(d) = schema.description() {
        put("description", json!(d));
    }
    if let Some(e) = schema.example() {
        put("example", e.clone());
    }
    if let Some(d) = schema.default_value() {
        put("default", d.clone());
    }
    if schema.is_deprecated() {
        put("deprecated", json!(true));
    }
    Value::Object(out)
}

#[must_use]
pub fn render_parameter(param: &DeclaredParameter) -> Value {
    let mut out = Map::new();
    out.insert("name".into(), json!(param.name()));
    out.insert("in".into(), json!(param.location().as_str()));
    out.insert("required".into(), json!(param.is_required()));
    if let Some(d) = param.schema().description() {
        out.insert("description".into(), json!(d));
    }
    if param.schema().is_deprecated() {
        out.insert("deprecated".into(), json!(true));
    }
    out.insert("schema".into(), json_schema(param.schema()));
    Value::Object(out)
}

#[must_use]
pub fn render_body(body: &Body) -> Value {
    let mut out = Map::new();
    if let Some(d) = body.describe() {
        out.insert("description".into(), json!(d));
    }
    out.insert("required".into(), json!(body.is_required()));
    out.insert(
        "content".into(),
        json!({ body.media_type(): { "schema": json_schema(body.schema()) } }),
    );
    Value::Object(out)
}

#[must_use]
pub fn render_response(response: &ResponseDecl) -> Value {
    let mut out = Map::new();
    out.insert(
        "description".into(),
        json!(response.describe().unwrap_or(DEFAULT_RESPONSE_DESCRIPTION)),
    );
    if let Some(schema) = response.schema() {
        out.insert(
            "content".into(),
            json!({ response.media_type(): { "schema": json_schema(schema) } }),
        );
    }
    Value::Object(out)
}

/// Operation object for an endpoint. `operationId` is only present when the
/// endpoint declares one; the router fills in derived ids.
#[must_use]
pub fn render_operation(endpoint: &EndpointSchema) -> Value {
    let mut op = Map::new();
    if let Some(s) = endpoint.summary() {
        op.insert("summary".into(), json!(s));
    }
    if let Some(d) = endpoint.description() {
        op.insert("description".into(), json!(d));
    }
    if !endpoint.tags().is_empty() {
        op.insert("tags".into(), json!(endpoint.tags()));
    }
    if endpoint.is_deprecated() {
        op.insert("deprecated".into(), json!(true));
    }
    if let Some(id) = endpoint.operation_id() {
        op.insert("operationId".into(), json!(id));
    }
    op.insert(
        "parameters".into(),
        Value::Array(endpoint.parameters().iter().map(render_parameter).collect()),
    );
    if let Some(body) = endpoint.body() {
        op.insert("requestBody".into(), render_body(body));
    }

    let mut responses = Map::new();
    for (status, response) in endpoint.responses() {
        responses.insert(status.clone(), render_response(response));
    }
    if responses.is_empty() {
        responses.insert(
            "200".into(),
            json!({ "description": DEFAULT_RESPONSE_DESCRIPTION }),
        );
    }
    op.insert("responses".into(), Value::Object(responses));
    Value::Object(op)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::Parameter;
    use crate::schema::{EnumMembers, ParamOptions, TypeSpec};

    #[test]
    fn test_kind_rendering() {
        assert_eq!(json_schema(&FieldSchema::integer()), json!({"type": "integer"}));
        assert_eq!(
            json_schema(&FieldSchema::date_only()),
            json!({"type": "string", "format": "date"})
        );
        assert_eq!(
            json_schema(&FieldSchema::regex("^a+$").unwrap()),
            json!({"type": "string", "pattern": "^a+$"})
        );
        let e = FieldSchema::enumeration(EnumMembers::from_labels(["open", "closed"], true).unwrap());
        assert_eq!(json_schema(&e), json!({"type": "string", "enum": ["open", "closed"]}));
    }

    #[test]
    fn test_object_required_list_and_meta() {
        let s = FieldSchema::object([
            ("id", FieldSchema::integer()),
            ("note", FieldSchema::string().optional().with_description("free text")),
        ]);
        assert_eq!(
            json_schema(&s),
            json!({
                "type": "object",
                "properties": {
                    "id": {"type": "integer"},
                    "note": {"type": "string", "description": "free text"}
                },
                "required": ["id"]
            })
        );
    }

    #[test]
    fn test_parameter_rendering() {
        let ep = EndpointSchema::builder()
            .parameter(
                "page",
                Parameter::query_with(
                    TypeSpec::integer(),
                    ParamOptions::new().description("Page number").default_value(1),
                )
                .unwrap(),
            )
            .build()
            .unwrap();
        assert_eq!(
            render_parameter(&ep.parameters()[0]),
            json!({
                "name": "page",
                "in": "query",
                "required": false,
                "description": "Page number",
                "schema": {"type": "integer", "description": "Page number", "default": 1}
            })
        );
    }

    #[test]
    fn test_responses_default_description() {
        let ep = EndpointSchema::builder()
            .response(
                200,
                ResponseDecl::new(TypeSpec::object([("ok", TypeSpec::boolean())])).unwrap(),
            )
            .response(404, ResponseDecl::empty().description("Not found"))
            .build()
            .unwrap();
        let op = render_operation(&ep);
        assert_eq!(op["responses"]["200"]["description"], json!("Successful Response"));
        assert_eq!(
            op["responses"]["200"]["content"]["application/json"]["schema"]["type"],
            json!("object")
        );
        assert_eq!(op["responses"]["404"], json!({"description": "Not found"}));
    }

    #[test]
    fn test_no_responses_documents_200() {
        let ep = EndpointSchema::builder().build().unwrap();
        let op = render_operation(&ep);
        assert_eq!(op["responses"], json!({"200": {"description": "Successful Response"}}));
        assert!(op.get("operationId").is_none());
    }
}
