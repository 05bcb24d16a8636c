use serde::{Deserialize, Serialize};

pub const GCS_PUBLIC_BASE_URL: &str = "https://storage.googleapis.com";

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    #[serde(rename = "gcs")]
    Gcs,
    #[serde(rename = "s3")]
    S3,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Gcs => "gcs",
            Provider::S3 => "s3",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StoreConfig {
    pub provider: Provider,
    #[serde(rename = "bucketName")]
    pub bucket_name: String,
    #[serde(rename = "publicBaseUrl")]
    pub public_base_url: String,
}

impl StoreConfig {
    /// Public URL of an object: `<public-base>/<bucket>/<filename>`.
    pub fn object_url(&self, filename: &str) -> String {
        format!(
            "{}/{}/{}",
            self.public_base_url.trim_end_matches('/'),
            self.bucket_name,
            filename
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_url_joins_base_bucket_and_name() {
        let config = StoreConfig {
            provider: Provider::Gcs,
            bucket_name: "cms-media".to_string(),
            public_base_url: "https://storage.googleapis.com/".to_string(),
        };

        assert_eq!(
            config.object_url("beach-vacation.GIF"),
            "https://storage.googleapis.com/cms-media/beach-vacation.GIF"
        );
    }
}
