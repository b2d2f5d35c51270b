//! Server configuration.

use std::net::{IpAddr, Ipv6Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;

use crate::parser::DEFAULT_MAX_LINE_LENGTH;
use crate::server::error::Error;
use crate::server::mime::MimeTable;
use crate::server::userdir::{HomeDirectories, PasswdHomes};

/// Port the server listens on unless told otherwise.
pub const DEFAULT_PORT: u16 = 8001;

/// Symlink hops followed before the last link is used as it is.
pub const DEFAULT_MAX_SYMLINK_HOPS: usize = 32;

/// HTTP server configuration.
///
/// Built once before the listener starts and shared read-only by every
/// connection afterwards.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Absolute path of the document root.
    pub root: PathBuf,
    /// The address to bind to.
    pub addr: SocketAddr,
    /// File names served for a directory, first match wins.
    pub index_files: Vec<String>,
    /// Leave entries starting with a dot out of directory listings.
    pub hide_dotfiles: bool,
    /// Map `/~user/...` onto the user's home directory.
    pub enable_userdirs: bool,
    /// Directory below a user's home that `/~user/` serves.
    pub userdir_suffix: String,
    /// Where users' home directories are looked up.
    pub homes: Arc<dyn HomeDirectories>,
    /// Extension to content-type table.
    pub mime: MimeTable,
    /// Number of concurrent connection workers. Zero handles connections
    /// one after another on the accept loop.
    pub workers: usize,
    /// Upper bound on the length of request and header lines.
    pub max_line_length: usize,
    /// Symlink hops followed when resolving a target.
    pub max_symlink_hops: usize,
    /// Refuse targets that resolve outside the root they were joined to.
    pub strict_paths: bool,
    /// Listen backlog.
    pub backlog: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            addr: SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), DEFAULT_PORT),
            index_files: vec!["index.html".to_string(), "index.htm".to_string()],
            hide_dotfiles: true,
            enable_userdirs: false,
            userdir_suffix: "public_html".to_string(),
            homes: Arc::new(PasswdHomes),
            mime: MimeTable::builtin(),
            workers: 3,
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
            max_symlink_hops: DEFAULT_MAX_SYMLINK_HOPS,
            strict_paths: false,
            backlog: 128,
        }
    }
}

impl ServerConfig {
    /// Configuration serving `root` with every other setting at its default.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Point the server at `path`, which must be an existing directory.
    ///
    /// The stored root is the canonical absolute form of `path`.
    pub async fn set_root(&mut self, path: impl AsRef<Path>) -> Result<(), Error> {
        self.root = canonical_root(path.as_ref()).await?;
        Ok(())
    }
}

/// Canonicalize a document root, refusing anything but a directory.
pub async fn canonical_root(path: &Path) -> Result<PathBuf, Error> {
    let docroot_error = |source| Error::Docroot { path: path.to_path_buf(), source };

    let root = tokio::fs::canonicalize(path).await.map_err(docroot_error)?;
    let metadata = tokio::fs::metadata(&root).await.map_err(docroot_error)?;
    if !metadata.is_dir() {
        return Err(docroot_error(std::io::Error::new(
            std::io::ErrorKind::Other,
            "not a directory",
        )));
    }
    Ok(root)
}

/// Settings read from a JSON configuration file.
///
/// Every field is optional; only the ones present override the
/// configuration they are applied to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub docroot: Option<PathBuf>,
    pub listen: Option<String>,
    pub port: Option<u16>,
    pub index_files: Option<Vec<String>>,
    pub hide_dotfiles: Option<bool>,
    pub enable_userdirs: Option<bool>,
    pub userdir_suffix: Option<String>,
    pub workers: Option<usize>,
    pub strict_paths: Option<bool>,
    /// Additional `mime.types` files, merged in order.
    pub mime_types: Vec<PathBuf>,
}

impl ConfigFile {
    /// Parse a configuration from JSON text.
    pub fn from_json(path: &Path, text: &str) -> Result<Self, Error> {
        serde_json::from_str(text).map_err(|source| Error::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Read and parse a configuration file.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| Error::ConfigRead { path: path.to_path_buf(), source })?;
        Self::from_json(path, &text)
    }

    /// Override `config` with the settings present in this file.
    pub async fn apply(self, config: &mut ServerConfig) -> Result<(), Error> {
        if let Some(docroot) = self.docroot {
            config.set_root(docroot).await?;
        }
        if let Some(listen) = self.listen {
            let ip: IpAddr = listen
                .parse()
                .map_err(|_| Error::InvalidConfig(format!("bad listen address {listen:?}")))?;
            config.addr.set_ip(ip);
        }
        if let Some(port) = self.port {
            config.addr.set_port(port);
        }
        if let Some(index_files) = self.index_files {
            config.index_files = index_files;
        }
        if let Some(hide_dotfiles) = self.hide_dotfiles {
            config.hide_dotfiles = hide_dotfiles;
        }
        if let Some(enable_userdirs) = self.enable_userdirs {
            config.enable_userdirs = enable_userdirs;
        }
        if let Some(suffix) = self.userdir_suffix {
            config.userdir_suffix = suffix;
        }
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if let Some(strict_paths) = self.strict_paths {
            config.strict_paths = strict_paths;
        }
        for path in self.mime_types {
            config.mime.load_file(path).await?;
        }
        Ok(())
    }
}
