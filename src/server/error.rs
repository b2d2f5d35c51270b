//! Error types for the HTTP server.

use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during HTTP server operation.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The listening socket could not be set up.
    #[error("Cannot listen on {addr}: {source}")]
    Listen {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// The document root is not usable.
    #[error("Cannot chdir to docroot {}: {source}", path.display())]
    Docroot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A mime.types file could not be read.
    #[error("Cannot read mime types from {}: {source}", path.display())]
    MimeTypes {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A configuration file could not be read.
    #[error("Cannot read config file {}: {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A configuration file is not valid.
    #[error("Invalid config file {}: {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A configuration value is not valid.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
