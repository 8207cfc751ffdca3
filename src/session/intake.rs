//! File intake: candidate gathering, validation and preview generation.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use log::warn;
use std::path::{Path, PathBuf};

use super::{SelectedFile, SessionError};

pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

// Extensions the server-side form accepts, mapped to the MIME type sent in
// the multipart part.
const IMAGE_TYPES: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("bmp", "image/bmp"),
    ("tif", "image/tiff"),
    ("tiff", "image/tiff"),
];

/// One dropped or picked file, before validation.
#[derive(Debug, Clone)]
pub struct FileCandidate {
    pub path: PathBuf,
    pub name: String,
    pub size: u64,
}

pub fn mime_for_name(name: &str) -> Option<&'static str> {
    let ext = Path::new(name).extension()?.to_str()?.to_ascii_lowercase();
    IMAGE_TYPES
        .iter()
        .find(|(known, _)| *known == ext)
        .map(|(_, mime)| *mime)
}

/// Stat every path into a candidate. Any unreadable entry fails the whole
/// intake; partial lists would silently change which file ends up first.
pub fn gather(paths: &[PathBuf]) -> Result<Vec<FileCandidate>, SessionError> {
    paths
        .iter()
        .map(|path| {
            let meta = std::fs::metadata(path).map_err(|e| {
                warn!("cannot stat {}: {e}", path.display());
                SessionError::ReadFailed
            })?;
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            Ok(FileCandidate {
                path: path.clone(),
                name,
                size: meta.len(),
            })
        })
        .collect()
}

/// Type first, then size caps, matching the upload form on the server.
pub fn validate(candidate: &FileCandidate) -> Result<SelectedFile, SessionError> {
    let mime = mime_for_name(&candidate.name).ok_or(SessionError::NotAnImage)?;
    if candidate.size > MAX_UPLOAD_BYTES {
        return Err(SessionError::TooLarge);
    }
    if candidate.size == 0 {
        return Err(SessionError::EmptyFile);
    }
    Ok(SelectedFile {
        name: candidate.name.clone(),
        path: candidate.path.clone(),
        mime: mime.to_string(),
        size: candidate.size,
        data: None,
    })
}

/// Data URL for the preview image. The format is sniffed from the bytes, so
/// a renamed non-image fails here rather than rendering a broken preview.
pub fn preview_data_url(bytes: &[u8]) -> Result<String, SessionError> {
    let format = image::guess_format(bytes).map_err(|e| {
        warn!("preview bytes are not a recognizable image: {e}");
        SessionError::PreviewFailed
    })?;
    Ok(format!(
        "data:{};base64,{}",
        format.to_mime_type(),
        BASE64.encode(bytes)
    ))
}
