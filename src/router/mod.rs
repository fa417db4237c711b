//! # Router Module
//!
//! [`OpenApiRouter`] is the explicit registration builder: each call to
//! [`OpenApiRouter::route`] (or `get`, `post`, ...) compiles the route
//! pattern, adds the endpoint's operation to the API document and returns a
//! [`RouteHandle`]. Nested routers are combined with [`OpenApiRouter::merge`].
//!
//! ## Route patterns
//!
//! Routes may be written `/todos/:id` or `/todos/{id}`. Before use they are
//! normalized: repeated and trailing slashes are removed, `:id` becomes
//! `{id}`, and the configured `base` is prepended. The normalized form is the
//! documented path and the matched pattern.
//!
//! ## Dispatch
//!
//! [`OpenApiRouter::handle`] matches routes in registration order, validates
//! the request against the endpoint declaration and only then calls the
//! handler. Each request runs in a `request` span carrying its ULID
//! `request_id`.

mod core;
mod dispatch;

pub use self::core::{normalize_route, path_param_names, ParamVec, Route, RouteTable, MAX_INLINE_PARAMS};
pub use dispatch::{OpenApiRouter, RouteHandle, AI_PLUGIN_PATH};
