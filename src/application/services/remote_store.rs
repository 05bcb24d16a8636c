use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::application::error::ApplicationError;

/// Transfer layer to the object store. Keys are filenames.
///
/// No retries beyond what the transport does; callers decide whether
/// `ApplicationError::NotFound` is fatal.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn exists(&self, name: &str) -> Result<bool, ApplicationError>;

    /// Downloads `name` into `dest_dir` and returns the local path.
    async fn download(&self, name: &str, dest_dir: &Path) -> Result<PathBuf, ApplicationError>;

    async fn upload(
        &self,
        local_path: &Path,
        name: &str,
        content_type: &str,
    ) -> Result<(), ApplicationError>;

    async fn put(
        &self,
        name: &str,
        content: Vec<u8>,
        content_type: &str,
    ) -> Result<(), ApplicationError>;

    async fn delete(&self, name: &str) -> Result<(), ApplicationError>;

    fn public_url(&self, name: &str) -> String;
}

/// File name used for a downloaded object inside a scratch directory.
pub fn local_file_name(name: &str) -> String {
    let flattened: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' => '_',
            c => c,
        })
        .collect();

    match flattened.trim_start_matches('.') {
        "" => "object".to_string(),
        trimmed => trimmed.to_string(),
    }
}
