//! Content type lookup for image attachments
//!
//! Maps the extension of an image file name onto its registered media type.
//! Anything not in the table is stored as `application/octet-stream`.

use std::path::Path;
use tracing::debug;

/// Content type used when the extension is missing or unknown
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

struct MimeEntry {
    ext: &'static str,
    mime_type: &'static str,
    desc: &'static str,
}

const fn entry(ext: &'static str, mime_type: &'static str, desc: &'static str) -> MimeEntry {
    MimeEntry {
        ext,
        mime_type,
        desc,
    }
}

const MIME_TABLE: &[MimeEntry] = &[
    entry("bmp", "image/bmp", "[Windows BMP]"),
    entry("fits", "image/fits", "[RFC4047]"),
    entry("gif", "image/gif", "[RFC2045][RFC2046]"),
    entry("jpeg", "image/jpeg", "[RFC2045][RFC2046]"),
    entry("png", "image/png", "[Portable Network Graphics]"),
    entry("svg", "image/svg+xml", "[W3C http://www.w3.org/TR/SVG/mimereg.html]"),
    entry("tiff", "image/tiff", "[Tag Image File Format: RFC3302]"),
    entry("wmf", "image/wmf", "[Windows WMF]"),
];

/// Lowercased extension of the file name, if it has one.
///
/// A name with nothing before the last dot (`.png`) or nothing after it
/// (`photo.`) has no extension.
pub fn extension(filename: &str) -> Option<String> {
    let name = Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(filename);

    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() || ext.chars().any(char::is_whitespace) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

fn lookup(ext: &str) -> Option<&'static MimeEntry> {
    MIME_TABLE.iter().find(|entry| entry.ext == ext)
}

/// Resolve the content type for a file name
pub fn resolve(filename: &str) -> &'static str {
    let Some(ext) = extension(filename) else {
        return DEFAULT_CONTENT_TYPE;
    };

    match lookup(&ext) {
        Some(entry) => {
            debug!(
                file = %filename,
                ext = %ext,
                mime_type = %entry.mime_type,
                registry = %entry.desc,
                "Resolved content type"
            );
            entry.mime_type
        }
        None => {
            debug!(file = %filename, ext = %ext, "Unknown extension, using default content type");
            DEFAULT_CONTENT_TYPE
        }
    }
}
