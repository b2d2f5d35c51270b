//! Request parsing.
//!
//! This module reads bounded lines off a connection and splits the request
//! line into its method, target and version tokens. Header lines are kept
//! raw; the server never interprets them.

mod error;
mod line;
mod method;
mod request;
mod tests;

// Re-export public items
pub use error::Error;
pub use line::{read_line, DEFAULT_MAX_LINE_LENGTH};
pub use method::Method;
pub use request::{read_headers, ParsedRequest, RequestLine, DEFAULT_VERSION};
