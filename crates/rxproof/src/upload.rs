//! Upload contract: which files are accepted for fingerprinting.
//!
//! Content type is sniffed from the bytes, not taken from the file name.

use serde::{Deserialize, Serialize};

use crate::error::InputError;
use crate::producer::DEFAULT_MAX_BYTES;

/// Reported for content `infer` cannot classify and that is not UTF-8.
pub const OCTET_STREAM: &str = "application/octet-stream";

const TEXT_PLAIN: &str = "text/plain";

/// Size cap plus MIME allow-list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadPolicy {
    pub max_bytes: u64,
    pub allowed_mime_types: Vec<String>,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_BYTES,
            allowed_mime_types: [
                "application/pdf",
                "image/png",
                "image/jpeg",
                "image/gif",
                "image/webp",
                "image/tiff",
                TEXT_PLAIN,
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

impl UploadPolicy {
    /// Sniff the content type of `bytes`.
    pub fn detect(bytes: &[u8]) -> &'static str {
        match infer::get(bytes) {
            Some(kind) => kind.mime_type(),
            None if std::str::from_utf8(bytes).is_ok() => TEXT_PLAIN,
            None => OCTET_STREAM,
        }
    }

    /// Accept or reject `bytes`, returning the detected type on success.
    pub fn check(&self, bytes: &[u8]) -> Result<&'static str, InputError> {
        if bytes.len() as u64 > self.max_bytes {
            return Err(InputError::TooLarge {
                limit: self.max_bytes,
            });
        }

        let mime = Self::detect(bytes);
        if !self.allowed_mime_types.iter().any(|m| m == mime) {
            return Err(InputError::UnsupportedType(mime.to_string()));
        }
        Ok(mime)
    }
}
