//! Error types for the request parser.

use thiserror::Error;

/// Errors that can occur while parsing a request line.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// Nothing was received before the peer stopped sending.
    #[error("Empty request")]
    EmptyRequest,

    /// The request line has more than three components.
    #[error("Malformed request line: {0}")]
    MalformedRequestLine(String),

    /// The protocol token does not name HTTP.
    #[error("Invalid HTTP version: {0}")]
    InvalidVersion(String),
}
