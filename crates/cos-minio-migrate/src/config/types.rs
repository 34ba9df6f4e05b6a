//! Configuration type definitions.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Source storage identities (COS). Kept as a list so that "first match
    /// wins" during bucket resolution is stable across config reloads.
    pub sources: Vec<SourceConfig>,

    /// Destination storage configuration (MinIO).
    pub sink: SinkConfig,

    /// Migration behavior configuration.
    #[serde(default)]
    pub migration: MigrationConfig,
}

/// One source storage identity: credentials plus the bucket they address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Logical name for this identity (used by `--source` and in logs).
    pub name: String,

    /// Region, e.g. "ap-shanghai".
    pub region: String,

    /// Access key id.
    pub access_key: String,

    /// Secret access key.
    pub secret_key: String,

    /// Bucket name, e.g. "video-storage-1251973116".
    pub bucket: String,

    /// Endpoint override. Defaults to the regional COS endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

impl SourceConfig {
    /// Endpoint URL for this identity's S3 API.
    pub fn endpoint_url(&self) -> String {
        self.endpoint
            .clone()
            .unwrap_or_else(|| format!("https://cos.{}.myqcloud.com", self.region))
    }
}

/// Destination storage (MinIO) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Server address as host:port, e.g. "minio.internal:9000".
    pub endpoint: String,

    /// Access key.
    pub access_key: String,

    /// Secret key.
    pub secret_key: String,

    /// Use TLS when talking to the endpoint (default: false).
    #[serde(default)]
    pub secure: bool,

    /// Default destination bucket for rows without a bucket override.
    pub bucket: String,

    /// Region to sign requests with (default: "us-east-1").
    #[serde(default = "default_sink_region")]
    pub region: String,
}

impl SinkConfig {
    /// Endpoint URL including scheme.
    pub fn endpoint_url(&self) -> String {
        let scheme = if self.secure { "https" } else { "http" };
        format!("{}://{}", scheme, self.endpoint)
    }
}

/// Migration behavior configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationConfig {
    /// Number of parallel workers (default: 5).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,

    /// Directory for scratch downloads (default: "./temp_downloads").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp_dir: Option<PathBuf>,

    /// Manifest column holding object URLs (default: "url").
    #[serde(default = "default_url_column")]
    pub url_column: String,

    /// Manifest column holding per-row status (default: "status").
    #[serde(default = "default_status_column")]
    pub status_column: String,

    /// Manifest column holding the bucket hint / destination override
    /// (default: "buckets").
    #[serde(default = "default_bucket_column")]
    pub bucket_column: String,

    /// Manifest column holding failure messages (default: "error_msg").
    #[serde(default = "default_error_column")]
    pub error_column: String,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            workers: None,
            temp_dir: None,
            url_column: default_url_column(),
            status_column: default_status_column(),
            bucket_column: default_bucket_column(),
            error_column: default_error_column(),
        }
    }
}

impl MigrationConfig {
    pub fn get_workers(&self) -> usize {
        self.workers.unwrap_or(5)
    }

    pub fn get_temp_dir(&self) -> PathBuf {
        self.temp_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("./temp_downloads"))
    }
}

// Default value functions for serde

fn default_sink_region() -> String {
    "us-east-1".to_string()
}

fn default_url_column() -> String {
    "url".to_string()
}

fn default_status_column() -> String {
    "status".to_string()
}

fn default_bucket_column() -> String {
    "buckets".to_string()
}

fn default_error_column() -> String {
    "error_msg".to_string()
}
