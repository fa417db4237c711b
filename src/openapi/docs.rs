//! Documentation pages and the plugin manifest.

use crate::config::AiPluginConfig;
use minijinja::{context, Environment};
use serde_json::{json, Map, Value};

const SWAGGER_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1" />
  <title>{{ title }} - Swagger UI</title>
  <link rel="stylesheet" href="https://cdn.jsdelivr.net/npm/swagger-ui-dist@5/swagger-ui.css" />
</head>
<body>
  <div id="swagger-ui"></div>
  <script src="https://cdn.jsdelivr.net/npm/swagger-ui-dist@5/swagger-ui-bundle.js" crossorigin></script>
  <script>
    window.onload = () => {
      window.ui = SwaggerUIBundle({
        url: {{ openapi_url|tojson }},
        dom_id: '#swagger-ui',
        deepLinking: true,
        showExtensions: true,
        showCommonExtensions: true,
      });
    };
  </script>
</body>
</html>
"#;

const REDOC_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1" />
  <title>{{ title }} - ReDoc</title>
  <style>body { margin: 0; padding: 0; }</style>
</head>
<body>
  <redoc spec-url="{{ openapi_url }}"></redoc>
  <script src="https://cdn.jsdelivr.net/npm/redoc@2/bundles/redoc.standalone.js"></script>
</body>
</html>
"#;

fn render(name: &str, source: &str, title: &str, openapi_url: &str) -> Result<String, minijinja::Error> {
    let mut env = Environment::new();
    env.add_template(name, source)?;
    let tmpl = env.get_template(name)?;
    tmpl.render(context! { title => title, openapi_url => openapi_url })
}

/// Swagger UI page loading the document at `openapi_url`.
pub fn swagger_ui(title: &str, openapi_url: &str) -> Result<String, minijinja::Error> {
    render("swagger_ui", SWAGGER_TEMPLATE, title, openapi_url)
}

/// ReDoc page loading the document at `openapi_url`.
pub fn redoc_ui(title: &str, openapi_url: &str) -> Result<String, minijinja::Error> {
    render("redoc_ui", REDOC_TEMPLATE, title, openapi_url)
}

/// Plugin manifest. Configured members override the defaults; a relative
/// `api.url` becomes `https://{host}{url}`.
#[must_use]
pub fn ai_plugin_manifest(config: &AiPluginConfig, openapi_url: &str, host: Option<&str>) -> Value {
    let mut manifest = Map::new();
    manifest.insert("schema_version".into(), json!("v1"));
    manifest.insert("auth".into(), json!({ "type": "none" }));
    if let Value::Object(configured) = serde_json::to_value(config).unwrap_or(Value::Null) {
        for (k, v) in configured {
            if !v.is_null() {
                manifest.insert(k, v);
            }
        }
    }

    let mut api = Map::new();
    api.insert("type".into(), json!("openapi"));
    api.insert("has_user_authentication".into(), json!(false));
    api.insert("url".into(), json!(openapi_url));
    if let Some(Value::Object(configured)) = manifest.remove("api") {
        for (k, v) in configured {
            if !v.is_null() {
                api.insert(k, v);
            }
        }
    }
    let relative = api
        .get("url")
        .and_then(Value::as_str)
        .filter(|u| !u.starts_with("http"))
        .map(str::to_string);
    if let Some(url) = relative {
        api.insert(
            "url".into(),
            json!(format!("https://{}{}", host.unwrap_or_default(), url)),
        );
    }
    manifest.insert("api".into(), Value::Object(api));
    Value::Object(manifest)
}
