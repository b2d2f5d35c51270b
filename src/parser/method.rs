//! HTTP request methods.

use std::fmt;

/// The request method token.
///
/// Only `GET` and `TRACE` carry meaning for the server; every other token is
/// kept verbatim so it can be reported back in error bodies.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Method {
    /// GET method: Requests a representation of the specified resource.
    GET,
    /// TRACE method: Reflects the received request back to the client.
    TRACE,
    /// Any other method token.
    Other(String),
}

impl From<&str> for Method {
    fn from(s: &str) -> Self {
        match s {
            "GET" => Method::GET,
            "TRACE" => Method::TRACE,
            other => Method::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::GET => write!(f, "GET"),
            Method::TRACE => write!(f, "TRACE"),
            Method::Other(token) => write!(f, "{token}"),
        }
    }
}
