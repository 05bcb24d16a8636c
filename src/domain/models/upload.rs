use crate::domain::models::format::MediaFormat;

/// The in-flight upload as the host hands it to the interception points.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub content: Vec<u8>,
    pub filename: String,
    pub mime_type: String,
    pub size: u64,
}

impl UploadFile {
    pub fn new(content: Vec<u8>, filename: String, mime_type: String) -> Self {
        let size = content.len() as u64;
        Self {
            content,
            filename,
            mime_type,
            size,
        }
    }

    pub fn replace_content(&mut self, content: Vec<u8>) {
        self.size = content.len() as u64;
        self.content = content;
    }
}

/// Host operation that triggered the interception.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Update,
}

/// Outcome of the upload interceptor, carried by value to the persistence reconciler
/// within the same request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadDecision {
    pub format: MediaFormat,
    /// Declared type before any substitution.
    pub original_mime_type: String,
    /// Set when the host's automatic conversion must not touch the bytes.
    pub skip_auto_convert: bool,
}

impl UploadDecision {
    pub fn passthrough(format: MediaFormat, mime_type: &str) -> Self {
        Self {
            format,
            original_mime_type: mime_type.to_string(),
            skip_auto_convert: false,
        }
    }
}
