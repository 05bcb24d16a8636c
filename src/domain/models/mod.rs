pub mod batch;
pub mod format;
pub mod media;
pub mod optimization;
pub mod upload;
