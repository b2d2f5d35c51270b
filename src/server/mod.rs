//! Static file server.
//!
//! This module resolves request paths below a document root (or a user's
//! home directory), writes files, directory listings, redirects and error
//! pages, and runs the accept loop with its pool of connection workers.

mod config;
mod error;
mod handler;
mod http_server;
mod listing;
mod request_log;
mod mime;
mod resolver;
mod response;
mod userdir;

// Re-export public items
pub use config::{canonical_root, ConfigFile, ServerConfig, DEFAULT_MAX_SYMLINK_HOPS, DEFAULT_PORT};
pub use error::Error;
pub use handler::handle_connection;
pub use http_server::HttpServer;
pub use listing::{DirectoryListing, ListingEntry};
pub use request_log::{format_request, timestamp, LogRequests, RequestLog, LOG_DATE_FORMAT};
pub use mime::{ContentType, MimeTable, FALLBACK_CONTENT_TYPE};
pub use resolver::{collapse_dot_segments, decode_path, filesystem_path, follow_symlinks, resolve, FsLocation, ResolvedTarget, TargetKind};
pub use response::{
    write_body, write_error, write_file, write_headers, write_status_line, Headers, StatusCode,
    DEFAULT_CONTENT_TYPE, FILE_CHUNK_SIZE,
};
pub use userdir::{user_docroot, HomeDirectories, PasswdHomes};
