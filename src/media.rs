//! Local media source for uploads.

use std::path::{Path, PathBuf};

/// Content type sent for QuickTime uploads.
pub const QUICKTIME: &str = "video/quicktime";
/// Fallback content type for every other extension.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Lower-cased extension of `path` without the dot, or an empty string.
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default()
}

/// Maps an extension (with or without leading dot, any case) to a content type.
pub fn content_type_for_extension(extension: &str) -> &'static str {
    let ext = extension.trim_start_matches('.');
    if ext.eq_ignore_ascii_case("mov") {
        QUICKTIME
    } else {
        OCTET_STREAM
    }
}

pub fn content_type_for(path: &Path) -> &'static str {
    content_type_for_extension(&extension_of(path))
}

/// Bytes of a local file plus the extension used to pick its content type.
#[derive(Debug, Clone)]
pub struct MediaFile {
    pub path: PathBuf,
    pub bytes: Vec<u8>,
    pub extension: String,
}

impl MediaFile {
    pub async fn read(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        Ok(Self {
            path: path.to_path_buf(),
            extension: extension_of(path),
            bytes,
        })
    }

    pub fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn content_type(&self) -> &'static str {
        content_type_for_extension(&self.extension)
    }
}
