use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct RecompressAccepted {
    pub status: &'static str,
}
