//! Inbound resume file handling: multipart extraction and validation.
//!
//! Validation never touches the network. A request rejected here produces no
//! outbound call.

use axum::extract::multipart::{Multipart, MultipartError};
use axum::http::StatusCode;
use bytes::Bytes;
use tracing::{debug, warn};

use crate::errors::AppError;

/// Largest accepted resume, in bytes.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Multipart field the browser sends the file in.
pub const INBOUND_FIELD: &str = "file";

pub const MIME_PDF: &str = "application/pdf";
pub const MIME_DOC: &str = "application/msword";
pub const MIME_DOCX: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

const ACCEPTED_TYPES: &[&str] = &[MIME_PDF, MIME_DOC, MIME_DOCX];

/// The file part exactly as the browser sent it.
#[derive(Debug, Clone)]
pub struct RawUpload {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Bytes,
}

/// A file that passed validation and may be forwarded.
#[derive(Debug, Clone)]
pub struct ResumeUpload {
    pub file_name: String,
    pub content_type: &'static str,
    pub data: Bytes,
}

impl ResumeUpload {
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// Pulls the `file` field out of a multipart body. Other fields are ignored.
pub async fn read_file_field(multipart: &mut Multipart) -> Result<Option<RawUpload>, AppError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(INBOUND_FIELD) {
            debug!("Ignoring multipart field {:?}", field.name());
            continue;
        }

        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let data = field.bytes().await.map_err(multipart_error)?;

        return Ok(Some(RawUpload {
            file_name,
            content_type,
            data,
        }));
    }

    Ok(None)
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        too_large()
    } else {
        AppError::Validation(format!("Malformed multipart body: {}", err.body_text()))
    }
}

fn too_large() -> AppError {
    AppError::TooLarge(format!(
        "File too large. Maximum size is {}MB",
        MAX_UPLOAD_BYTES / (1024 * 1024)
    ))
}

/// Applies the missing → type → size checks, in that order.
pub fn validate_upload(raw: Option<RawUpload>) -> Result<ResumeUpload, AppError> {
    let raw = match raw {
        Some(raw) if !(raw.data.is_empty() && raw.file_name.as_deref().unwrap_or("").is_empty()) => {
            raw
        }
        _ => {
            warn!("Upload rejected: no file provided");
            return Err(AppError::MissingFile("No resume file provided".to_string()));
        }
    };

    let file_name = raw
        .file_name
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| "resume".to_string());

    let Some(content_type) = resolve_content_type(raw.content_type.as_deref(), &file_name) else {
        let received = raw.content_type.unwrap_or_else(|| "unknown".to_string());
        warn!("Upload rejected: invalid type {received} for {file_name}");
        return Err(AppError::InvalidType(format!(
            "Invalid file type '{received}'. Please upload PDF, DOC, or DOCX"
        )));
    };

    if raw.data.len() > MAX_UPLOAD_BYTES {
        warn!("Upload rejected: {} bytes exceeds limit", raw.data.len());
        return Err(too_large());
    }

    Ok(ResumeUpload {
        file_name,
        content_type,
        data: raw.data,
    })
}

/// Maps the declared type (or, failing that, the extension) onto an accepted type.
fn resolve_content_type(declared: Option<&str>, file_name: &str) -> Option<&'static str> {
    let declared = declared
        .map(|ct| ct.split(';').next().unwrap_or("").trim().to_ascii_lowercase())
        .filter(|ct| !ct.is_empty() && ct != "application/octet-stream");

    match declared {
        Some(ct) => ACCEPTED_TYPES.iter().copied().find(|accepted| *accepted == ct),
        None => {
            let lower = file_name.to_ascii_lowercase();
            if lower.ends_with(".pdf") {
                Some(MIME_PDF)
            } else if lower.ends_with(".docx") {
                Some(MIME_DOCX)
            } else if lower.ends_with(".doc") {
                Some(MIME_DOC)
            } else {
                None
            }
        }
    }
}
