//! Generated directory listings.

use std::os::unix::ffi::OsStrExt;
use std::path::Path;

use html_escape::{encode_double_quoted_attribute, encode_text};
use percent_encoding::{percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::server::error::Error;

/// Characters left alone in listing links.
const LINK_SAFE: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.').remove(b'~');

/// Name of the parent directory entry.
const PARENT: &str = "..";

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    /// The entry's file name, for display.
    pub name: String,
    /// The file name bytes as stored on disk.
    pub raw_name: Vec<u8>,
    /// Where the entry points, if it is a symbolic link.
    pub link_target: Option<String>,
    /// Size in bytes of a non-empty file.
    pub size: Option<u64>,
}

/// The contents of a directory, split into directories and everything else.
///
/// Both halves are sorted by the bytes of their names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryListing {
    pub dirs: Vec<ListingEntry>,
    pub files: Vec<ListingEntry>,
}

async fn link_target(path: &Path) -> Option<String> {
    let metadata = tokio::fs::symlink_metadata(path).await.ok()?;
    if !metadata.file_type().is_symlink() {
        return None;
    }
    let target = tokio::fs::read_link(path).await.ok()?;
    Some(target.to_string_lossy().into_owned())
}

impl DirectoryListing {
    /// Read the entries of `dir`.
    ///
    /// The parent entry `..` is always present. With `hide_dotfiles` set,
    /// other names starting with a dot are left out. Entries that are, or
    /// link to, directories are listed as directories. Link targets and
    /// sizes that cannot be read are simply omitted.
    pub async fn read(dir: &Path, hide_dotfiles: bool) -> Result<Self, Error> {
        let mut listing = Self::default();
        listing.dirs.push(ListingEntry {
            name: PARENT.to_string(),
            raw_name: PARENT.as_bytes().to_vec(),
            link_target: None,
            size: None,
        });

        let mut entries = tokio::fs::read_dir(dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let file_name = entry.file_name();
            let raw_name = file_name.as_bytes().to_vec();
            if hide_dotfiles && raw_name.starts_with(b".") {
                continue;
            }
            let name = file_name.to_string_lossy().into_owned();

            let path = entry.path();
            let link_target = link_target(&path).await;
            let metadata = tokio::fs::metadata(&path).await.ok();

            match metadata {
                Some(metadata) if metadata.is_dir() => listing.dirs.push(ListingEntry {
                    name,
                    raw_name,
                    link_target,
                    size: None,
                }),
                metadata => listing.files.push(ListingEntry {
                    name,
                    raw_name,
                    link_target,
                    size: metadata.map(|m| m.len()).filter(|&len| len > 0),
                }),
            }
        }

        listing.dirs.sort_by(|a, b| a.raw_name.cmp(&b.raw_name));
        listing.files.sort_by(|a, b| a.raw_name.cmp(&b.raw_name));
        Ok(listing)
    }

    /// Render the listing as an HTML page titled after `request_path`.
    pub fn render(&self, request_path: &str) -> String {
        let title = encode_text(request_path);
        let mut page = format!(
            "<!DOCTYPE html>\n\
             <html>\n\
             <head>\n\
             \t<meta http-equiv=\"Content-Type\" content=\"text/html; charset=utf-8\" />\n\
             \t<title>index: {title}</title>\n\
             \t<style type=\"text/css\">\n\
             \ta {{ font-family: monospace; text-decoration: none; }}\n\
             \t.symlink, .size {{ color: gray; }}\n\
             \tfooter {{ font-size: smaller; color: gray; }}\n\
             \t</style>\n\
             </head>\n\
             <body>\n\
             <h1>{title}</h1>\n\
             <ul>\n"
        );

        for entry in &self.dirs {
            let label = if entry.name == PARENT {
                "(parent directory)".to_string()
            } else {
                encode_text(&entry.name).into_owned()
            };
            page.push_str(&format!("\t<li><a href=\"{}/\">{label}/</a>", link(&entry.raw_name)));
            push_symlink(&mut page, entry);
            page.push_str("</li>\n");
        }

        for entry in &self.files {
            page.push_str(&format!(
                "\t<li><a href=\"{}\">{}</a>",
                link(&entry.raw_name),
                encode_text(&entry.name)
            ));
            push_symlink(&mut page, entry);
            if let Some(size) = entry.size {
                page.push_str(&format!(" <span class=\"size\">({size})</span>"));
            }
            page.push_str("</li>\n");
        }

        page.push_str(&format!(
            "</ul>\n\
             <hr/>\n\
             <footer><p>{}</p></footer>\n\
             </body>\n\
             </html>\n",
            env!("CARGO_PKG_NAME")
        ));
        page
    }
}

fn link(name: &[u8]) -> String {
    let encoded = percent_encode(name, LINK_SAFE).to_string();
    encode_double_quoted_attribute(&encoded).into_owned()
}

fn push_symlink(page: &mut String, entry: &ListingEntry) {
    if let Some(target) = &entry.link_target {
        page.push_str(&format!(" <span class=\"symlink\">→ {}</span>", encode_text(target)));
    }
}
