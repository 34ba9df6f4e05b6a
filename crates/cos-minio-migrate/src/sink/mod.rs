//! Destination storage port (MinIO over the S3 API).

use crate::config::SinkConfig;
use crate::error::{MigrateError, Result};
use async_trait::async_trait;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use std::path::Path;
use tracing::{debug, info};

/// Capability interface for the destination side of a transfer.
#[async_trait]
pub trait SinkStore: Send + Sync {
    /// Bucket used for rows without a destination override.
    fn default_bucket(&self) -> &str;

    /// Create the bucket when it does not exist yet.
    async fn ensure_bucket(&self, bucket: &str) -> Result<()>;

    /// Check whether an object already exists at the destination.
    async fn exists(&self, bucket: &str, key: &str) -> Result<bool>;

    /// Upload a local file under `bucket`/`key`.
    async fn publish(
        &self,
        local_path: &Path,
        bucket: &str,
        key: &str,
        content_type: &str,
    ) -> Result<()>;
}

/// MinIO-backed sink store.
pub struct MinioStore {
    client: Client,
    default_bucket: String,
}

impl MinioStore {
    /// Connect to the sink and make sure the default bucket exists.
    ///
    /// An unreachable endpoint or an uncreatable bucket is a configuration
    /// problem and aborts the run before any transfer is dispatched.
    pub async fn connect(config: &SinkConfig) -> Result<Self> {
        let credentials = Credentials::new(
            config.access_key.clone(),
            config.secret_key.clone(),
            None,
            None,
            "minio-static",
        );
        let client_config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .endpoint_url(config.endpoint_url())
            .credentials_provider(credentials)
            .force_path_style(true)
            .build();

        let store = Self {
            client: Client::from_conf(client_config),
            default_bucket: config.bucket.clone(),
        };

        store
            .ensure_bucket(&store.default_bucket)
            .await
            .map_err(|e| MigrateError::Config(format!("sink not usable: {}", e)))?;

        info!(
            "sink ready: {} (default bucket: {})",
            config.endpoint_url(),
            store.default_bucket
        );
        Ok(store)
    }
}

#[async_trait]
impl SinkStore for MinioStore {
    fn default_bucket(&self) -> &str {
        &self.default_bucket
    }

    async fn ensure_bucket(&self, bucket: &str) -> Result<()> {
        match self.client.head_bucket().bucket(bucket).send().await {
            Ok(_) => {
                debug!("bucket exists: {}", bucket);
                Ok(())
            }
            Err(_) => {
                self.client
                    .create_bucket()
                    .bucket(bucket)
                    .send()
                    .await
                    .map_err(|err| {
                        MigrateError::storage(format!(
                            "create bucket {}: {}",
                            bucket,
                            err.into_service_error()
                        ))
                    })?;
                info!("created bucket: {}", bucket);
                Ok(())
            }
        }
    }

    async fn exists(&self, bucket: &str, key: &str) -> Result<bool> {
        match self
            .client
            .head_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(err) => {
                let service_err = err.into_service_error();
                if !service_err.is_not_found() {
                    // A missing bucket or a transient error reads as absent;
                    // the subsequent publish will surface anything real.
                    debug!("head {}/{}: {}", bucket, key, service_err);
                }
                Ok(false)
            }
        }
    }

    async fn publish(
        &self,
        local_path: &Path,
        bucket: &str,
        key: &str,
        content_type: &str,
    ) -> Result<()> {
        self.ensure_bucket(bucket).await?;

        let size = std::fs::metadata(local_path)?.len();
        info!(
            "uploading {} -> {}/{} ({} bytes)",
            local_path.display(),
            bucket,
            key,
            size
        );

        let body = ByteStream::from_path(local_path)
            .await
            .map_err(|e| MigrateError::transfer(key, format!("open {}: {}", local_path.display(), e)))?;

        let result = self
            .client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(body)
            .content_type(content_type)
            .send()
            .await
            .map_err(|err| {
                MigrateError::transfer(
                    key,
                    format!("upload to {}/{}: {}", bucket, key, err.into_service_error()),
                )
            })?;

        debug!(
            "uploaded {}: etag {}",
            key,
            result.e_tag().unwrap_or("<none>")
        );
        Ok(())
    }
}

/// Content type for a file, inferred from its extension.
pub fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("mp4") => "video/mp4",
        Some("webm") => "video/webm",
        Some("mov") => "video/quicktime",
        Some("mp3") => "audio/mpeg",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("pdf") => "application/pdf",
        Some("json") => "application/json",
        Some("xml") => "application/xml",
        Some("txt") => "text/plain",
        Some("html") | Some("htm") => "text/html",
        Some("csv") => "text/csv",
        Some("xlsx") => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        Some("zip") => "application/zip",
        Some("gz") => "application/gzip",
        _ => "application/octet-stream",
    }
}
