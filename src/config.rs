//! Router configuration.
//!
//! [`RouterOptions`] can be built in code or loaded from a YAML, JSON or TOML
//! file with [`RouterOptions::from_file`]. Every field has a default, so a
//! file only needs the keys it changes:
//!
//! ```yaml
//! base: /api
//! redoc_url: null
//! raise_unknown_parameters: false
//! schema:
//!   info:
//!     title: Todo API
//!     version: "2.0"
//! ```

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

fn default_docs_url() -> Option<String> {
    Some("/docs".to_string())
}

fn default_redoc_url() -> Option<String> {
    Some("/redocs".to_string())
}

fn default_openapi_url() -> Option<String> {
    Some("/openapi.json".to_string())
}

fn default_true() -> bool {
    true
}

fn default_openapi_version() -> String {
    "3.1.0".to_string()
}

fn default_title() -> String {
    "OpenAPI".to_string()
}

fn default_version() -> String {
    "1.0".to_string()
}

/// `info` object of the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Info {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for Info {
    fn default() -> Self {
        Self {
            title: default_title(),
            version: default_version(),
            description: None,
            extra: Map::new(),
        }
    }
}

/// Top-level members of the document other than `paths`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentInfo {
    #[serde(default = "default_openapi_version")]
    pub openapi: String,
    #[serde(default)]
    pub info: Info,
    /// Any other member (`servers`, `tags`, `components`, ...), copied verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for DocumentInfo {
    fn default() -> Self {
        Self {
            openapi: default_openapi_version(),
            info: Info::default(),
            extra: Map::new(),
        }
    }
}

impl DocumentInfo {
    #[must_use]
    pub fn info_value(&self) -> Value {
        serde_json::to_value(&self.info).unwrap_or_else(|_| Value::Object(Map::new()))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthType {
    #[default]
    None,
    UserHttp,
    ServiceHttp,
    Oauth,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AiPluginAuth {
    #[serde(rename = "type", default)]
    pub auth_type: AuthType,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AiPluginApi {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub api_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_user_authentication: Option<bool>,
}

/// Plugin manifest served at `/.well-known/ai-plugin.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AiPluginConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_version: Option<String>,
    pub name_for_human: String,
    pub name_for_model: String,
    pub description_for_human: String,
    pub description_for_model: String,
    pub logo_url: String,
    pub contact_email: String,
    pub legal_info_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<AiPluginAuth>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api: Option<AiPluginApi>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Options for [`crate::router::OpenApiRouter`].
///
/// `docs_url`, `redoc_url` and `openapi_url` may be set to `None` (`null` in a
/// file) to disable the page. Without `openapi_url` neither documentation page
/// nor the plugin manifest is served.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouterOptions {
    /// Prefix for every route and documentation endpoint.
    #[serde(default)]
    pub base: String,
    #[serde(default = "default_docs_url")]
    pub docs_url: Option<String>,
    #[serde(default = "default_redoc_url")]
    pub redoc_url: Option<String>,
    #[serde(default = "default_openapi_url")]
    pub openapi_url: Option<String>,
    /// Reject keys that are not declared.
    #[serde(default = "default_true")]
    pub raise_unknown_parameters: bool,
    /// Derive missing operation ids; when off a missing id fails registration.
    #[serde(default = "default_true")]
    pub generate_operation_ids: bool,
    /// Check JSON handler responses against the declared response schema.
    #[serde(default)]
    pub validate_responses: bool,
    #[serde(default)]
    pub schema: DocumentInfo,
    #[serde(default)]
    pub ai_plugin: Option<AiPluginConfig>,
}

impl Default for RouterOptions {
    fn default() -> Self {
        Self {
            base: String::new(),
            docs_url: default_docs_url(),
            redoc_url: default_redoc_url(),
            openapi_url: default_openapi_url(),
            raise_unknown_parameters: true,
            generate_operation_ids: true,
            validate_responses: false,
            schema: DocumentInfo::default(),
            ai_plugin: None,
        }
    }
}

impl RouterOptions {
    /// Load options from a `.yaml`/`.yml`, `.json` or `.toml` file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read router options from {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        let options = match ext.as_str() {
            "yaml" | "yml" => serde_yaml::from_str(&content)
                .with_context(|| format!("Invalid YAML in {}", path.display()))?,
            "json" => serde_json::from_str(&content)
                .with_context(|| format!("Invalid JSON in {}", path.display()))?,
            "toml" => toml::from_str(&content)
                .with_context(|| format!("Invalid TOML in {}", path.display()))?,
            other => bail!("Unsupported options file extension '{other}' for {}", path.display()),
        };
        Ok(options)
    }

    #[must_use]
    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        self.base = base.into();
        self
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.schema.info.title = title.into();
        self
    }

    #[must_use]
    pub fn strict(mut self, raise_unknown_parameters: bool) -> Self {
        self.raise_unknown_parameters = raise_unknown_parameters;
        self
    }

    /// Served path of the JSON document, when enabled.
    #[must_use]
    pub fn openapi_path(&self) -> Option<String> {
        self.openapi_url.as_ref().map(|u| format!("{}{}", self.base, u))
    }
}
