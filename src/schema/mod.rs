//! Canonical schemas and the declarations that produce them.

mod coerce;
mod normalize;
mod types;

pub use normalize::{normalize, EnumValues, NamedType, ParamOptions, Primitive, TypeSpec};
pub use types::{EnumMembers, FieldSchema, Pattern, SchemaKind, SchemaMeta, SchemaType};
