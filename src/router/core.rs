//! Route patterns and matching.

use crate::error::DefinitionError;
use http::Method;
use once_cell::sync::Lazy;
use regex::Regex;
use smallvec::SmallVec;
use std::sync::Arc;
use tracing::debug;

/// Maximum number of path parameters before heap allocation.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Path parameter bindings. Names are shared with the route table.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

#[allow(clippy::expect_used)]
static REPEATED_SLASHES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/+(/|$)").expect("slash regex is valid"));

#[allow(clippy::expect_used)]
static COLON_PARAM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r":(\w+)").expect("param regex is valid"));

/// Convert a registered route into its documented form: repeated and
/// trailing slashes are removed, `:name` becomes `{name}`, and `base` is
/// prepended. The root route stays `/`.
#[must_use]
pub fn normalize_route(base: &str, route: &str) -> String {
    let stripped = REPEATED_SLASHES.replace_all(route, "$1");
    let converted = COLON_PARAM.replace_all(&stripped, "{$1}");
    let full = format!("{base}{converted}");
    if full.is_empty() {
        "/".to_string()
    } else {
        full
    }
}

/// Names of the `{name}` segments of a normalized route, in order.
#[must_use]
pub fn path_param_names(path: &str) -> Vec<String> {
    path.split('/')
        .filter(|s| s.starts_with('{') && s.ends_with('}') && s.len() > 2)
        .map(|s| s[1..s.len() - 1].to_string())
        .collect()
}

/// Compile a normalized route into a matcher and its parameter names.
///
/// `/users/{id}` becomes `^/users/([^/]+)$`. A trailing `*` segment matches
/// any remainder.
pub(crate) fn path_to_regex(path: &str) -> Result<(Regex, Vec<Arc<str>>), DefinitionError> {
    let mut pattern = String::with_capacity(path.len() + 8);
    pattern.push('^');
    let mut names = Vec::new();

    for segment in path.split('/').filter(|s| !s.is_empty()) {
        if segment.starts_with('{') && segment.ends_with('}') && segment.len() > 2 {
            pattern.push_str("/([^/]+)");
            names.push(Arc::from(&segment[1..segment.len() - 1]));
        } else if segment == "*" {
            pattern.push_str("(?:/.*)?");
        } else {
            pattern.push('/');
            pattern.push_str(&regex::escape(segment));
        }
    }
    if names.is_empty() && pattern == "^" {
        pattern.push('/');
    }
    pattern.push_str("/?$");

    let regex = Regex::new(&pattern).map_err(|e| DefinitionError::InvalidPattern {
        pattern: path.to_string(),
        source: e,
    })?;
    Ok((regex, names))
}

/// One registered route.
#[derive(Debug, Clone)]
pub struct Route<T> {
    pub method: Method,
    /// Normalized pattern, e.g. `/api/todos/{id}`.
    pub pattern: String,
    regex: Regex,
    param_names: Vec<Arc<str>>,
    pub target: T,
}

impl<T> Route<T> {
    pub fn new(method: Method, pattern: String, target: T) -> Result<Self, DefinitionError> {
        let (regex, param_names) = path_to_regex(&pattern)?;
        Ok(Self {
            method,
            pattern,
            regex,
            param_names,
            target,
        })
    }

    /// Bindings when `path` matches this route.
    #[must_use]
    pub fn matches(&self, path: &str) -> Option<ParamVec> {
        let caps = self.regex.captures(path)?;
        let mut params = ParamVec::new();
        for (i, name) in self.param_names.iter().enumerate() {
            if let Some(m) = caps.get(i + 1) {
                let value = urlencoding::decode(m.as_str())
                    .map(|v| v.into_owned())
                    .unwrap_or_else(|_| m.as_str().to_string());
                params.push((Arc::clone(name), value));
            }
        }
        Some(params)
    }
}

/// Ordered route table. The first registered route that matches wins.
#[derive(Debug, Clone)]
pub struct RouteTable<T> {
    routes: Vec<Route<T>>,
}

impl<T> Default for RouteTable<T> {
    fn default() -> Self {
        Self { routes: Vec::new() }
    }
}

impl<T> RouteTable<T> {
    pub fn push(&mut self, route: Route<T>) {
        self.routes.push(route);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn into_routes(self) -> Vec<Route<T>> {
        self.routes
    }

    /// Find the route for `method` and `path`. `HEAD` falls back to `GET` routes.
    #[must_use]
    pub fn find(&self, method: &Method, path: &str) -> Option<(&Route<T>, ParamVec)> {
        let found = self
            .routes
            .iter()
            .filter(|r| r.method == *method || (*method == Method::HEAD && r.method == Method::GET))
            .find_map(|r| r.matches(path).map(|p| (r, p)));
        if found.is_none() {
            debug!(method = %method, path = %path, "No route matched");
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_route() {
        assert_eq!(normalize_route("", "/todos/:id"), "/todos/{id}");
        assert_eq!(normalize_route("", "//todos///:id/"), "/todos/{id}");
        assert_eq!(normalize_route("/api", "/todos/"), "/api/todos");
        assert_eq!(normalize_route("", "/"), "/");
        assert_eq!(normalize_route("/api", "/"), "/api");
        assert_eq!(normalize_route("", "/users/{id}"), "/users/{id}");
    }

    #[test]
    fn test_path_param_names() {
        assert_eq!(path_param_names("/orgs/{org}/users/{id}"), vec!["org", "id"]);
        assert!(path_param_names("/health").is_empty());
    }

    #[test]
    fn test_path_to_regex_extracts_params() {
        let route = Route::new(Method::GET, "/users/{id}/posts/{post}".into(), ()).unwrap();
        let params = route.matches("/users/7/posts/abc").unwrap();
        assert_eq!(params[0].0.as_ref(), "id");
        assert_eq!(params[0].1, "7");
        assert_eq!(params[1].1, "abc");
        assert!(route.matches("/users/7").is_none());
        assert!(route.matches("/users/7/posts/abc/").is_some());
    }

    #[test]
    fn test_literal_segments_are_escaped() {
        let route = Route::new(Method::GET, "/v1.0/items".into(), ()).unwrap();
        assert!(route.matches("/v1.0/items").is_some());
        assert!(route.matches("/v1x0/items").is_none());
    }

    #[test]
    fn test_root_and_wildcard() {
        let root = Route::new(Method::GET, "/".into(), ()).unwrap();
        assert!(root.matches("/").is_some());
        assert!(root.matches("/x").is_none());
        let wild = Route::new(Method::GET, "/api/*".into(), ()).unwrap();
        assert!(wild.matches("/api/todos/1").is_some());
    }

    #[test]
    fn test_first_match_wins_and_head_falls_back() {
        let mut table = RouteTable::default();
        table.push(Route::new(Method::GET, "/todos/{id}".into(), "by_id").unwrap());
        table.push(Route::new(Method::GET, "/todos/latest".into(), "latest").unwrap());
        let (route, _) = table.find(&Method::GET, "/todos/latest").unwrap();
        assert_eq!(route.target, "by_id");
        assert!(table.find(&Method::HEAD, "/todos/1").is_some());
        assert!(table.find(&Method::POST, "/todos/1").is_none());
    }

    #[test]
    fn test_path_values_are_decoded() {
        let route = Route::new(Method::GET, "/files/{name}".into(), ()).unwrap();
        let params = route.matches("/files/a%20b").unwrap();
        assert_eq!(params[0].1, "a b");
    }
}
