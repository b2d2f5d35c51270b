//! Mapping request targets onto the filesystem.
//!
//! The request path is decoded to raw bytes and its dot segments are
//! collapsed before it is joined to a root, so no lookup ever sees the raw
//! target and file names need not be UTF-8. The collapse is textual: `/../`
//! and `/./` become `/` and trailing `/..` or `/.` lose their dots. It does
//! not cancel a segment against its parent, so `/a/../b` becomes `/a/b`.
//! With [`ServerConfig::strict_paths`] set, the final target must also lie
//! inside the root it was joined to once every symlink is resolved.

use std::ffi::OsStr;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

use log::debug;
use nix::unistd::{access, AccessFlags};
use percent_encoding::percent_decode_str;

use crate::server::config::ServerConfig;
use crate::server::response::StatusCode;
use crate::server::userdir::user_docroot;

/// What the handler should send for a resolved request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetKind {
    /// A directory was requested without its trailing slash.
    Redirect {
        /// The request path with a slash appended.
        location: String,
    },
    /// A directory to list.
    Directory,
    /// A regular file to send.
    File,
    /// Nothing can be served; the status says why.
    Error,
}

/// The outcome of resolving a request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    /// The request path without its query string, still percent-encoded.
    pub request_path: String,
    /// The filesystem path the response is generated from.
    pub path: PathBuf,
    /// The response status.
    pub status: StatusCode,
    /// What kind of response to generate.
    pub kind: TargetKind,
}

impl ResolvedTarget {
    fn error(request_path: &str, path: PathBuf, status: StatusCode) -> Self {
        Self {
            request_path: request_path.to_string(),
            path,
            status,
            kind: TargetKind::Error,
        }
    }
}

/// Decode a request path the way HTML forms encode it: `+` is a space and
/// `%XX` is a byte. Malformed escapes are kept as they are.
pub fn decode_path(path: &str) -> Vec<u8> {
    let spaced = path.replace('+', " ");
    percent_decode_str(&spaced).collect()
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|window| window == needle)
}

/// Replace every non-overlapping `pattern`, left to right, with a slash.
fn replace_with_slash(path: &[u8], pattern: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(path.len());
    let mut i = 0;
    while i < path.len() {
        if path[i..].starts_with(pattern) {
            out.push(b'/');
            i += pattern.len();
        } else {
            out.push(path[i]);
            i += 1;
        }
    }
    out
}

/// Collapse dot segments textually until nothing changes.
pub fn collapse_dot_segments(path: &[u8]) -> Vec<u8> {
    let mut path = path.to_vec();
    loop {
        let before = path.len();

        while contains(&path, b"/../") {
            path = replace_with_slash(&path, b"/../");
        }
        while contains(&path, b"/./") {
            path = replace_with_slash(&path, b"/./");
        }
        while path.ends_with(b"/..") {
            path.truncate(path.len() - 2);
        }
        while path.ends_with(b"/.") {
            path.truncate(path.len() - 1);
        }

        if path.len() == before {
            return path;
        }
    }
}

fn trim_leading_slashes(path: &[u8]) -> &[u8] {
    let start = path.iter().position(|&b| b != b'/').unwrap_or(path.len());
    &path[start..]
}

/// Join a virtual path below `base`.
fn join_below(base: &Path, virtual_path: &[u8]) -> PathBuf {
    let relative = trim_leading_slashes(virtual_path);
    if relative.is_empty() {
        base.to_path_buf()
    } else {
        base.join(OsStr::from_bytes(relative))
    }
}

async fn is_dir(path: &Path) -> bool {
    tokio::fs::metadata(path).await.map(|m| m.is_dir()).unwrap_or(false)
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path).await.map(|m| m.is_file()).unwrap_or(false)
}

async fn is_symlink(path: &Path) -> bool {
    tokio::fs::symlink_metadata(path)
        .await
        .map(|m| m.file_type().is_symlink())
        .unwrap_or(false)
}

async fn is_readable(path: &Path) -> bool {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || access(path.as_path(), AccessFlags::R_OK).is_ok())
        .await
        .unwrap_or(false)
}

/// Where a virtual path lives on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsLocation {
    /// The root the path was joined to.
    pub base: PathBuf,
    /// The joined path.
    pub path: PathBuf,
}

/// Map a collapsed virtual path to its filesystem location.
///
/// With userdirs enabled, `/~user/rest` maps to `<home>/<suffix>/rest` when
/// that directory exists. Everything else, including unknown users, lives
/// below the document root.
pub async fn filesystem_path(virtual_path: &[u8], config: &ServerConfig) -> FsLocation {
    if config.enable_userdirs {
        if let Some(rest) = virtual_path.strip_prefix(b"/~") {
            let rest = trim_leading_slashes(rest);
            let (user, remainder) = match rest.iter().position(|&b| b == b'/') {
                Some(at) => (&rest[..at], &rest[at..]),
                None => (rest, &[][..]),
            };

            // names that are not UTF-8 cannot be in the password database
            if let Ok(user) = std::str::from_utf8(user) {
                if !user.is_empty() {
                    if let Some(dir) = user_docroot(&config.homes, user, &config.userdir_suffix).await {
                        if is_dir(&dir).await {
                            let path = join_below(&dir, remainder);
                            return FsLocation { base: dir, path };
                        }
                    }
                }
            }
        }
    }
    FsLocation {
        base: config.root.clone(),
        path: join_below(&config.root, virtual_path),
    }
}

/// Whether `path` stays inside `base` once both are fully resolved.
async fn is_contained(path: &Path, base: &Path) -> bool {
    match (tokio::fs::canonicalize(path).await, tokio::fs::canonicalize(base).await) {
        (Ok(path), Ok(base)) => path.starts_with(base),
        _ => false,
    }
}

/// Follow `path` through symbolic links.
///
/// Relative link targets are taken relative to the link's directory. After
/// `max_hops` links, or when a link cannot be read, the current path is used
/// as it is.
pub async fn follow_symlinks(path: &Path, max_hops: usize) -> PathBuf {
    let mut current = path.to_path_buf();
    let mut hops = 0;

    while is_symlink(&current).await {
        hops += 1;
        if hops > max_hops {
            debug!("Giving up on symlinks at {}", current.display());
            break;
        }

        let target = match tokio::fs::read_link(&current).await {
            Ok(target) => target,
            Err(_) => break,
        };

        current = if target.is_absolute() {
            target
        } else {
            match current.parent() {
                Some(parent) => parent.join(target),
                None => target,
            }
        };
    }

    current
}

/// Resolve a request target to what should be served.
///
/// # Arguments
///
/// * `raw_path` - The request target as received, query string included
/// * `config` - The server configuration
pub async fn resolve(raw_path: &str, config: &ServerConfig) -> ResolvedTarget {
    let request_path = raw_path.split_once('?').map_or(raw_path, |(path, _)| path);

    if !request_path.starts_with('/') {
        return ResolvedTarget::error(request_path, PathBuf::new(), StatusCode::BAD_REQUEST);
    }

    let virtual_path = collapse_dot_segments(&decode_path(request_path));
    let FsLocation { base, mut path } = filesystem_path(&virtual_path, config).await;

    if is_dir(&path).await {
        if !request_path.ends_with('/') {
            return ResolvedTarget {
                request_path: request_path.to_string(),
                path,
                status: StatusCode::MOVED_PERMANENTLY,
                kind: TargetKind::Redirect {
                    location: format!("{request_path}/"),
                },
            };
        }

        for index in &config.index_files {
            let candidate = path.join(index);
            if is_file(&candidate).await {
                path = candidate;
                break;
            }
        }
    }

    let path = follow_symlinks(&path, config.max_symlink_hops).await;

    let metadata = match tokio::fs::metadata(&path).await {
        Ok(metadata) => metadata,
        Err(_) => return ResolvedTarget::error(request_path, path, StatusCode::NOT_FOUND),
    };

    if config.strict_paths && !is_contained(&path, &base).await {
        debug!("Refusing {}: outside {}", path.display(), base.display());
        return ResolvedTarget::error(request_path, path, StatusCode::FORBIDDEN);
    }

    if !is_readable(&path).await {
        return ResolvedTarget::error(request_path, path, StatusCode::FORBIDDEN);
    }

    let kind = if metadata.is_dir() {
        TargetKind::Directory
    } else if metadata.is_file() {
        TargetKind::File
    } else {
        return ResolvedTarget::error(request_path, path, StatusCode::FORBIDDEN);
    };

    ResolvedTarget {
        request_path: request_path.to_string(),
        path,
        status: StatusCode::OK,
        kind,
    }
}
