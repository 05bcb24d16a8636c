use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GcsSecrets {
    #[serde(rename = "clientEmail")]
    pub client_email: String,
    #[serde(rename = "privateKey")]
    pub private_key: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct S3Secrets {
    #[serde(rename = "endpoint")]
    pub endpoint: String,
    #[serde(rename = "region")]
    pub region: String,
    #[serde(rename = "accessKeyId")]
    pub access_key_id: String,
    #[serde(rename = "secretAccessKey")]
    pub secret_access_key: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Secrets {
    #[serde(rename = "appSecret")]
    pub app_secret: String,
    #[serde(rename = "databaseUrl")]
    pub database_url: String,
    #[serde(rename = "gcsSecrets")]
    pub gcs_secrets: Option<GcsSecrets>,
    #[serde(rename = "s3Secrets")]
    pub s3_secrets: Option<S3Secrets>,
}
