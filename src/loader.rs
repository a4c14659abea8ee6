use std::fs;
use std::path::Path;

use encoding_rs::GBK;
use serde::Serialize;
use tracing::debug;

use crate::error::LocalizeError;

/// Encoding the input document was decoded with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceEncoding {
    Utf8,
    Gbk,
}

impl std::fmt::Display for SourceEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceEncoding::Utf8 => f.write_str("UTF-8"),
            SourceEncoding::Gbk => f.write_str("GBK"),
        }
    }
}

/// An HTML document held as text.
#[derive(Debug, Clone)]
pub struct Document {
    pub text: String,
    pub encoding: SourceEncoding,
}

/// Read `path` as UTF-8, falling back to GBK once.
pub fn load_document(path: &Path) -> Result<Document, LocalizeError> {
    if !path.exists() {
        return Err(LocalizeError::InputNotFound(path.to_path_buf()));
    }

    let bytes = fs::read(path)
        .map_err(|e| LocalizeError::io(format!("failed to read {}", path.display()), e))?;

    let document = decode(&bytes).ok_or_else(|| LocalizeError::Decode(path.to_path_buf()))?;
    debug!(path = %path.display(), encoding = %document.encoding, "loaded document");
    Ok(document)
}

pub fn decode(bytes: &[u8]) -> Option<Document> {
    if let Ok(text) = std::str::from_utf8(bytes) {
        return Some(Document {
            text: text.to_string(),
            encoding: SourceEncoding::Utf8,
        });
    }

    GBK.decode_without_bom_handling_and_without_replacement(bytes)
        .map(|text| Document {
            text: text.into_owned(),
            encoding: SourceEncoding::Gbk,
        })
}
