use anyhow::{Result, anyhow};
use std::path::Path;

/// MIME types accepted for upload. Documents, media and archives only.
pub const ALLOWED_MIMES: &[&str] = &[
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "application/vnd.ms-powerpoint",
    "application/vnd.openxmlformats-officedocument.presentationml.presentation",
    "application/rtf",
    "text/plain",
    "text/csv",
    "text/markdown",
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "image/bmp",
    "image/tiff",
    "image/svg+xml",
    "audio/mpeg",
    "audio/wav",
    "audio/ogg",
    "audio/flac",
    "audio/aac",
    "audio/mp4",
    "video/mp4",
    "video/mpeg",
    "video/webm",
    "video/ogg",
    "video/quicktime",
    "video/x-msvideo",
    "application/zip",
    "application/gzip",
    "application/x-tar",
    "application/x-7z-compressed",
    "application/octet-stream",
];

/// Extensions never accepted regardless of declared MIME type.
const BLOCKED_EXTENSIONS: &[&str] = &[
    "exe", "dll", "bat", "cmd", "msi", "scr", "ps1", "vbs", "com", "pif", "jar",
];

const MAX_FILENAME_LEN: usize = 255;

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub code: &'static str,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Validates file size against the configured maximum
pub fn validate_file_size(size: usize, max_size: usize) -> Result<()> {
    if size > max_size {
        return Err(anyhow!(ValidationError {
            code: "FILE_TOO_LARGE",
            message: format!(
                "File size {} bytes exceeds maximum allowed {} bytes ({} MB)",
                size,
                max_size,
                max_size / 1024 / 1024
            ),
        }));
    }
    Ok(())
}

/// Validates MIME type against the allowlist
pub fn validate_mime_type(content_type: &str) -> Result<()> {
    let normalized = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_lowercase();

    // Frequent OS/browser variants mapped to their canonical form
    let normalized = match normalized.as_str() {
        "audio/mp3" => "audio/mpeg",
        "audio/x-m4a" | "audio/m4a" => "audio/mp4",
        "video/mov" => "video/quicktime",
        "video/m4v" | "video/x-m4v" => "video/mp4",
        "application/x-zip-compressed" | "application/x-zip" => "application/zip",
        "application/x-gzip" => "application/gzip",
        other => other,
    };

    if ALLOWED_MIMES.contains(&normalized) {
        return Ok(());
    }

    Err(anyhow!(ValidationError {
        code: "INVALID_MIME_TYPE",
        message: format!(
            "MIME type '{}' is not allowed. Only documents, media, and archives are permitted.",
            content_type
        ),
    }))
}

/// Broad media class for a MIME type, used for search filters and stats.
pub fn mime_class(mime_type: &str) -> &'static str {
    let mime = mime_type.split(';').next().unwrap_or("").trim();
    if mime.starts_with("image/") {
        "image"
    } else if mime.starts_with("video/") {
        "video"
    } else if mime.starts_with("audio/") {
        "audio"
    } else if matches!(
        mime,
        "application/zip"
            | "application/gzip"
            | "application/x-tar"
            | "application/x-7z-compressed"
    ) {
        "archive"
    } else if mime.starts_with("text/")
        || mime == "application/pdf"
        || mime == "application/rtf"
        || mime.starts_with("application/vnd.")
        || mime == "application/msword"
    {
        "document"
    } else {
        "other"
    }
}

/// Sanitizes a file or folder name: strips any path component, rejects
/// empty, traversal and blocked-extension names, trims control characters.
pub fn sanitize_filename(filename: &str) -> Result<String> {
    // Only the filename component survives; any directory part is dropped
    let name = Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");

    if name.is_empty() || name == "." || name == ".." {
        return Err(anyhow!(ValidationError {
            code: "INVALID_FILENAME",
            message: format!("'{}' is not a valid name", filename),
        }));
    }

    let cleaned: String = name
        .chars()
        .filter(|c| !c.is_control())
        .collect::<String>()
        .trim()
        .to_string();

    if cleaned.is_empty() {
        return Err(anyhow!(ValidationError {
            code: "INVALID_FILENAME",
            message: "Name is empty after sanitization".to_string(),
        }));
    }

    if cleaned.len() > MAX_FILENAME_LEN {
        return Err(anyhow!(ValidationError {
            code: "FILENAME_TOO_LONG",
            message: format!("Name exceeds {} characters", MAX_FILENAME_LEN),
        }));
    }

    if let Some(ext) = Path::new(&cleaned).extension().and_then(|e| e.to_str()) {
        let ext = ext.to_lowercase();
        if BLOCKED_EXTENSIONS.contains(&ext.as_str()) {
            return Err(anyhow!(ValidationError {
                code: "BLOCKED_EXTENSION",
                message: format!("Files with '.{}' extension are not accepted", ext),
            }));
        }
    }

    Ok(cleaned)
}
