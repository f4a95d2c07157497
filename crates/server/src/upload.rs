//! Text file uploads
//!
//! Uploaded files are decoded as UTF-8 text and handed back to the client.
//! Binary document formats are rejected up front; there is no document
//! parsing.

use std::path::Path;

use serde::Serialize;
use thiserror::Error;

/// Document formats that are known not to be plain text
pub const REJECTED_EXTENSIONS: [&str; 6] = ["pdf", "doc", "docx", "odt", "rtf", "epub"];

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Upload errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UploadError {
    #[error("No file uploaded")]
    NoFile,

    #[error("{} files are not supported yet. Please convert to .txt file.", .0.to_uppercase())]
    UnsupportedFormat(String),

    #[error("File is not valid UTF-8 text")]
    InvalidEncoding,

    #[error("File is empty or could not be read")]
    Empty,

    #[error("File exceeds the upload limit of {limit} bytes")]
    TooLarge { limit: usize },

    #[error("Malformed upload: {0}")]
    Malformed(String),
}

/// A decoded text upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedUpload {
    pub text: String,
    pub filename: String,
}

/// Response body for a successful upload
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub text: String,
    pub filename: String,
    /// Length in characters
    pub length: usize,
}

impl From<DecodedUpload> for UploadResponse {
    fn from(upload: DecodedUpload) -> Self {
        Self {
            success: true,
            length: upload.text.chars().count(),
            text: upload.text,
            filename: upload.filename,
        }
    }
}

/// Decode an uploaded file as text
pub fn decode_upload(filename: &str, bytes: &[u8]) -> Result<DecodedUpload, UploadError> {
    let extension = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    if let Some(ext) = extension {
        if REJECTED_EXTENSIONS.contains(&ext.as_str()) {
            return Err(UploadError::UnsupportedFormat(ext));
        }
    }

    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let text = std::str::from_utf8(bytes).map_err(|_| UploadError::InvalidEncoding)?;

    if text.trim().is_empty() {
        return Err(UploadError::Empty);
    }

    Ok(DecodedUpload {
        text: text.to_string(),
        filename: filename.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text() {
        let upload = decode_upload("story.txt", "Once upon a time.".as_bytes()).unwrap();
        assert_eq!(upload.text, "Once upon a time.");
        assert_eq!(upload.filename, "story.txt");
    }

    #[test]
    fn test_any_extension_read_as_text() {
        assert!(decode_upload("notes.md", b"# Title").is_ok());
        assert!(decode_upload("README", b"hello").is_ok());
    }

    #[test]
    fn test_bom_stripped() {
        let upload = decode_upload("bom.txt", b"\xEF\xBB\xBFhello").unwrap();
        assert_eq!(upload.text, "hello");
    }

    #[test]
    fn test_document_formats_rejected() {
        let err = decode_upload("Report.PDF", b"%PDF-1.7").unwrap_err();
        assert_eq!(err, UploadError::UnsupportedFormat("pdf".into()));
        assert_eq!(
            err.to_string(),
            "PDF files are not supported yet. Please convert to .txt file."
        );
        assert!(decode_upload("letter.docx", b"PK").is_err());
    }

    #[test]
    fn test_empty_and_invalid() {
        assert_eq!(decode_upload("blank.txt", b"  \n "), Err(UploadError::Empty));
        assert_eq!(decode_upload("blank.txt", b""), Err(UploadError::Empty));
        assert_eq!(
            decode_upload("binary.txt", &[0xFF, 0xFE, 0x00]),
            Err(UploadError::InvalidEncoding)
        );
    }

    #[test]
    fn test_response_counts_characters() {
        let response = UploadResponse::from(decode_upload("u.txt", "héllo".as_bytes()).unwrap());
        assert!(response.success);
        assert_eq!(response.length, 5);
    }
}
