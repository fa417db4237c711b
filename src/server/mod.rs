pub mod request;
pub mod response;

pub use request::{extract_parameter, parse_query_params, Request};
pub use response::{HandlerResponse, HeaderVec, HTML_UTF8, JSON_UTF8};
