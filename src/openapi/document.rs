use crate::config::DocumentInfo;
use crate::error::DefinitionError;
use serde_json::{json, Map, Value};
use tracing::debug;

/// Operation id for a route registered without one: `{method}_{handler}`
/// when the handler is named, otherwise `{method}_{route}` with every `/`
/// replaced by `_`.
#[must_use]
pub fn derive_operation_id(method: &str, handler_name: Option<&str>, route: &str) -> String {
    let method = method.to_ascii_lowercase();
    match handler_name {
        Some(name) if !name.is_empty() => format!("{method}_{name}"),
        _ => format!("{method}_{}", route.replace('/', "_")),
    }
}

/// The aggregated API document.
///
/// Operations are stored per path and per method; registering a second
/// method on a path adds to that path instead of replacing it.
#[derive(Debug, Clone)]
pub struct ApiDocument {
    info: DocumentInfo,
    paths: Map<String, Value>,
}

impl ApiDocument {
    #[must_use]
    pub fn new(info: DocumentInfo) -> Self {
        Self {
            info,
            paths: Map::new(),
        }
    }

    /// Insert the operation for `method` under `path`, filling in an
    /// operation id when the operation has none.
    ///
    /// # Errors
    ///
    /// [`DefinitionError::MissingOperationId`] when ids are not generated and
    /// the operation does not declare one.
    pub fn add_operation(
        &mut self,
        path: &str,
        method: &str,
        mut operation: Value,
        derived_id: String,
        generate_operation_ids: bool,
        route: &str,
    ) -> Result<(), DefinitionError> {
        let has_id = operation
            .get("operationId")
            .and_then(Value::as_str)
            .is_some_and(|id| !id.is_empty());
        if !has_id {
            if !generate_operation_ids {
                return Err(DefinitionError::MissingOperationId {
                    route: route.to_string(),
                });
            }
            if let Some(op) = operation.as_object_mut() {
                op.insert("operationId".into(), json!(derived_id));
            }
        }

        let entry = self
            .paths
            .entry(path.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if let Some(methods) = entry.as_object_mut() {
            methods.insert(method.to_ascii_lowercase(), operation);
        }
        debug!(path = %path, method = %method, "operation documented");
        Ok(())
    }

    /// Copy every operation of `other` into this document. Methods are merged
    /// under a shared path; a method present in both takes `other`'s operation.
    pub fn merge_paths(&mut self, other: &ApiDocument) {
        for (path, methods) in &other.paths {
            let Some(methods) = methods.as_object() else {
                continue;
            };
            let entry = self
                .paths
                .entry(path.clone())
                .or_insert_with(|| Value::Object(Map::new()));
            if let Some(existing) = entry.as_object_mut() {
                for (method, operation) in methods {
                    existing.insert(method.clone(), operation.clone());
                }
            }
        }
    }

    #[must_use]
    pub fn paths(&self) -> &Map<String, Value> {
        &self.paths
    }

    #[must_use]
    pub fn operation(&self, path: &str, method: &str) -> Option<&Value> {
        self.paths.get(path)?.get(method.to_ascii_lowercase())
    }

    #[must_use]
    pub fn info(&self) -> &DocumentInfo {
        &self.info
    }

    /// The complete document as JSON.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut doc = Map::new();
        doc.insert("openapi".into(), json!(self.info.openapi));
        doc.insert("info".into(), self.info.info_value());
        for (k, v) in &self.info.extra {
            if k != "paths" {
                doc.insert(k.clone(), v.clone());
            }
        }
        doc.insert("paths".into(), Value::Object(self.paths.clone()));
        Value::Object(doc)
    }
}
