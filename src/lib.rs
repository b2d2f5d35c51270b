//! A minimal static file server.
//!
//! This library serves files and generated directory listings from a
//! document root over a small subset of HTTP/1.x, with optional per-user
//! home directories under `/~user/`.
//!
//! # Features
//!
//! - One request per connection; the connection is closed after the response
//! - `GET` for files and directories, `TRACE` (and the `/echo` path) to
//!   reflect the request back
//! - Dot-segment collapsing before any filesystem access
//! - Index files, symlink following and HTML directory listings
//! - Content types from a `mime.types` style table, with `.gz` handling
//! - A fixed pool of workers fed by a single accept loop
//!
//! # Examples
//!
//! ## Parsing a request line
//!
//! ```
//! use simplehttpd::{Method, RequestLine};
//!
//! let line = RequestLine::parse("GET /index.html HTTP/1.1").unwrap();
//! assert_eq!(line.method, Method::GET);
//! assert_eq!(line.path, "/index.html");
//! assert_eq!(line.version, "HTTP/1.1");
//!
//! // Without a version the request is taken as HTTP/1.0
//! let line = RequestLine::parse("GET /").unwrap();
//! assert_eq!(line.version, "HTTP/1.0");
//! ```
//!
//! ## Collapsing request paths
//!
//! ```
//! use simplehttpd::collapse_dot_segments;
//!
//! assert_eq!(collapse_dot_segments(b"/docs/./guide/../intro.html"), b"/docs/guide/intro.html");
//! assert_eq!(collapse_dot_segments(b"/../../etc/passwd"), b"/etc/passwd");
//! ```
//!
//! ## Running a server
//!
//! ```no_run
//! use simplehttpd::{HttpServer, ServerConfig};
//!
//! # async fn run() -> Result<(), simplehttpd::ServerError> {
//! let mut config = ServerConfig::default();
//! config.set_root("/srv/www").await?;
//! config.addr = "127.0.0.1:8001".parse().unwrap();
//!
//! HttpServer::new(config).start().await
//! # }
//! ```

// Export the parser module
pub mod parser;

// Export the server module
pub mod server;

// Re-export commonly used items for convenience
pub use parser::{Error as ParserError, Method, ParsedRequest, RequestLine};
pub use server::{
    collapse_dot_segments, handle_connection, resolve, Error as ServerError, HttpServer, MimeTable,
    RequestLog, ServerConfig, StatusCode,
};
