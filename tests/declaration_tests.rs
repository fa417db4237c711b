#![allow(clippy::unwrap_used, clippy::expect_used)]

use schemaroute::endpoint::EndpointSchema;
use schemaroute::params::{classify, Location, Parameter, ParameterList};
use schemaroute::schema::{normalize, FieldSchema, ParamOptions, SchemaKind, TypeSpec};
use schemaroute::DefinitionError;
use serde_json::json;

#[test]
fn test_declarations_from_json_data() {
    let spec = TypeSpec::from_json(&json!({
        "name": "Ada",
        "age": 36,
        "admin": false,
        "tags": ["x"],
        "address": { "zip": "10115" }
    }))
    .unwrap();
    let schema = normalize(&spec, &ParamOptions::default()).unwrap();
    assert_eq!(schema.kind(), SchemaKind::Object);
    assert_eq!(schema.field("name").unwrap().kind(), SchemaKind::String);
    assert_eq!(schema.field("name").unwrap().example(), Some(&json!("Ada")));
    assert_eq!(schema.field("age").unwrap().kind(), SchemaKind::Number);
    assert_eq!(schema.field("admin").unwrap().kind(), SchemaKind::Boolean);
    let tags = schema.field("tags").unwrap();
    assert_eq!(tags.kind(), SchemaKind::Array);
    assert_eq!(tags.element().unwrap().kind(), SchemaKind::String);
    let zip = schema.field("address").unwrap().field("zip").unwrap();
    assert_eq!(zip.kind(), SchemaKind::String);
}

#[test]
fn test_unsupported_declarations_fail_early() {
    assert!(matches!(
        TypeSpec::from_json(&json!(null)),
        Err(DefinitionError::UnsupportedType { .. })
    ));
    assert!(matches!(
        normalize(&TypeSpec::ArrayOf(vec![]), &ParamOptions::default()),
        Err(DefinitionError::EmptyArray)
    ));
    assert!(matches!(
        Parameter::query(TypeSpec::regex("([a-z")),
        Err(DefinitionError::InvalidPattern { .. })
    ));
    assert!(matches!(
        Parameter::query(TypeSpec::enumeration(Vec::<String>::new())),
        Err(DefinitionError::MissingEnumValues)
    ));
    assert!(matches!(
        Parameter::query_with(TypeSpec::integer(), ParamOptions::new().default_value("ten")),
        Err(DefinitionError::InvalidDefault { .. })
    ));
}

#[test]
fn test_canonical_schema_passes_through() {
    let canonical = FieldSchema::email().with_description("Contact address");
    let param = Parameter::query(TypeSpec::from(canonical)).unwrap();
    assert_eq!(param.schema().kind(), SchemaKind::Email);
    assert_eq!(param.schema().description(), Some("Contact address"));
}

#[test]
fn test_default_makes_parameter_optional() {
    let param =
        Parameter::query_with(TypeSpec::number(), ParamOptions::new().default_value(5)).unwrap();
    assert!(!param.schema().is_required());
    assert_eq!(param.schema().default_value(), Some(&json!(5)));

    let forced = Parameter::query_with(TypeSpec::number(), ParamOptions::new().optional())
        .unwrap()
        .required();
    assert!(forced.schema().is_required());
}

#[test]
fn test_positional_parameters_need_names() {
    let unnamed = ParameterList::Positional(vec![
        Parameter::query(TypeSpec::string()).unwrap().named("q"),
        Parameter::query(TypeSpec::string()).unwrap(),
    ]);
    assert!(matches!(
        classify(unnamed),
        Err(DefinitionError::MissingParameterName { index: 1 })
    ));

    let err = EndpointSchema::builder()
        .parameters(vec![Parameter::header(TypeSpec::string()).unwrap()])
        .build()
        .unwrap_err();
    assert!(matches!(err, DefinitionError::MissingParameterName { index: 0 }));
}

#[test]
fn test_explicit_name_overrides_mapping_key() {
    let declared = classify(ParameterList::from([(
        "key",
        Parameter::header(TypeSpec::string()).unwrap().named("x-api-key"),
    )]))
    .unwrap();
    assert_eq!(declared[0].name(), "x-api-key");
    assert_eq!(declared[0].location(), Location::Header);
}

#[test]
fn test_literal_array_declares_element_kind() {
    let param = Parameter::query(TypeSpec::from(vec![1i64])).unwrap();
    assert_eq!(param.schema().kind(), SchemaKind::Array);
    assert_eq!(param.schema().element().unwrap().kind(), SchemaKind::Number);
}
