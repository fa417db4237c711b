//! Rendering declarations into an OpenAPI document.

pub mod docs;
mod document;
mod render;

pub use document::{derive_operation_id, ApiDocument};
pub use render::{
    json_schema, render_body, render_operation, render_parameter, render_response,
    DEFAULT_RESPONSE_DESCRIPTION,
};
