//! Extension to content-type mapping.

use std::collections::BTreeMap;
use std::path::Path;

use log::debug;

use crate::server::error::Error;

/// Content type for files whose extension is not in the table.
pub const FALLBACK_CONTENT_TYPE: &str = "text/plain";

const BUILTIN_TYPES: &[(&str, &str)] = &[
    ("css", "text/css"),
    ("gif", "image/gif"),
    ("htm", "text/html"),
    ("html", "text/html"),
    ("jpeg", "image/jpeg"),
    ("jpg", "image/jpeg"),
    ("js", "text/javascript"),
    ("m4a", "audio/mp4"),
    ("m4v", "video/mp4"),
    ("mp4", "application/mp4"),
    ("oga", "audio/ogg"),
    ("ogg", "audio/ogg"),
    ("ogv", "video/ogg"),
    ("ogm", "application/ogg"),
    ("png", "image/png"),
    ("tgz", "application/x-tar"),
];

/// The content type chosen for a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentType {
    /// The `Content-Type` value.
    pub mime: String,
    /// Whether the file is gzip-encoded and needs `Content-Encoding: gzip`.
    pub gzip: bool,
}

/// A table mapping file extensions to content types.
///
/// Extensions are matched exactly, without the leading dot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MimeTable {
    types: BTreeMap<String, String>,
}

impl Default for MimeTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl MimeTable {
    /// An empty table.
    pub fn empty() -> Self {
        Self { types: BTreeMap::new() }
    }

    /// The table of common web types every server starts with.
    pub fn builtin() -> Self {
        let types = BUILTIN_TYPES
            .iter()
            .map(|(ext, mime)| (ext.to_string(), mime.to_string()))
            .collect();
        Self { types }
    }

    /// Map `ext` to `mime`, replacing any earlier mapping.
    pub fn insert(&mut self, ext: impl Into<String>, mime: impl Into<String>) {
        self.types.insert(ext.into(), mime.into());
    }

    /// Look up the type for an extension.
    pub fn get(&self, ext: &str) -> Option<&str> {
        self.types.get(ext).map(String::as_str)
    }

    /// Number of known extensions.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Merge entries in `mime.types` format.
    ///
    /// Each line is a type followed by whitespace-separated extensions. Blank
    /// lines and lines starting with a space or `#` are skipped.
    ///
    /// # Returns
    ///
    /// The number of extensions read.
    pub fn parse(&mut self, contents: &str) -> usize {
        let mut count = 0;
        for line in contents.lines() {
            let line = line.trim_end();
            if line.is_empty() || line.starts_with(' ') || line.starts_with('#') {
                continue;
            }
            let mut fields = line.split_whitespace();
            let Some(mime) = fields.next() else { continue };
            for ext in fields {
                self.insert(ext, mime);
                count += 1;
            }
        }
        count
    }

    /// Merge a `mime.types` file from disk.
    pub async fn load_file(&mut self, path: impl AsRef<Path>) -> Result<usize, Error> {
        let path = path.as_ref();
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| Error::MimeTypes { path: path.to_path_buf(), source })?;
        let count = self.parse(&contents);
        debug!("Loaded {count} extensions from {}", path.display());
        Ok(count)
    }

    /// Choose the content type for a file by its name.
    ///
    /// A trailing `.gz` marks the file as gzip-encoded and the type is then
    /// taken from the extension before it. Unknown or missing extensions fall
    /// back to [`FALLBACK_CONTENT_TYPE`].
    pub fn content_type_for(&self, path: &Path) -> ContentType {
        let mut ext = path.extension().and_then(|e| e.to_str());
        let mut gzip = false;

        if ext == Some("gz") {
            gzip = true;
            ext = path
                .file_stem()
                .map(Path::new)
                .and_then(Path::extension)
                .and_then(|e| e.to_str());
        }

        let mime = ext
            .and_then(|ext| self.get(ext))
            .unwrap_or(FALLBACK_CONTENT_TYPE)
            .to_string();

        ContentType { mime, gzip }
    }
}
