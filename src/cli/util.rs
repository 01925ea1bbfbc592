//! CLI Common Utilities
//!
//! Shared initialization and file helpers for command handlers.

use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::config::{Config, ConfigLoader};
use crate::mapper::FileUpload;
use crate::service::Services;
use crate::types::{HubError, InlineImage, Result};

/// Command execution context
///
/// Loads configuration and wires every action handler. Commands that only
/// touch configuration should not create one.
pub struct CommandContext {
    pub config: Config,
    pub services: Services,
}

impl CommandContext {
    pub fn load() -> Result<Self> {
        let config = ConfigLoader::load()?;
        let services = Services::from_config(&config)?;
        Ok(Self { config, services })
    }
}

/// MIME type guessed from the file extension
pub fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "mp4" | "m4v" => "video/mp4",
        "mov" => "video/quicktime",
        "webm" => "video/webm",
        "mkv" => "video/x-matroska",
        "avi" => "video/x-msvideo",
        "pdf" => "application/pdf",
        "txt" | "md" => "text/plain",
        "doc" | "docx" => "application/msword",
        _ => "application/octet-stream",
    }
}

/// Read an image file as an inline base64 attachment
pub fn read_image(path: &Path) -> Result<InlineImage> {
    let mime = mime_for_path(path);
    if !mime.starts_with("image/") {
        return Err(HubError::Config(format!(
            "{} is not a supported image (png, jpeg, webp, gif)",
            path.display()
        )));
    }
    let bytes = std::fs::read(path)?;
    Ok(InlineImage::new(mime, STANDARD.encode(bytes)))
}

/// Describe a local file for upload into the knowledge hub
pub fn file_upload(path: &Path) -> Result<FileUpload> {
    let metadata = std::fs::metadata(path)?;
    if !metadata.is_file() {
        return Err(HubError::Config(format!("{} is not a file", path.display())));
    }
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .ok_or_else(|| HubError::Config(format!("{} has no file name", path.display())))?;
    let location = std::fs::canonicalize(path)?.display().to_string();

    Ok(FileUpload {
        name,
        mime_type: mime_for_path(path).to_string(),
        size: metadata.len(),
        location,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_mime_for_path() {
        assert_eq!(mime_for_path(Path::new("a/b.MP4")), "video/mp4");
        assert_eq!(mime_for_path(Path::new("frame.webp")), "image/webp");
        assert_eq!(mime_for_path(Path::new("noext")), "application/octet-stream");
    }

    #[test]
    fn test_read_image_encodes_base64() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("shot.png");
        std::fs::write(&path, b"abc").unwrap();

        let image = read_image(&path).unwrap();
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.data, "YWJj");

        let doc = dir.path().join("notes.pdf");
        std::fs::write(&doc, b"%PDF").unwrap();
        assert!(read_image(&doc).is_err());
    }

    #[test]
    fn test_file_upload_metadata() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("talk.mov");
        std::fs::write(&path, vec![0u8; 42]).unwrap();

        let upload = file_upload(&path).unwrap();
        assert_eq!(upload.name, "talk.mov");
        assert_eq!(upload.mime_type, "video/quicktime");
        assert_eq!(upload.size, 42);
        assert!(upload.location.ends_with("talk.mov"));

        assert!(file_upload(dir.path()).is_err());
    }
}
