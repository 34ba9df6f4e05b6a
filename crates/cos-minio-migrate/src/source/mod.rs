//! Source storage port (Tencent COS over the S3 API).

use crate::config::SourceConfig;
use crate::error::{MigrateError, Result};
use crate::resolver::{resolve_identity, SourceIdentity};
use async_trait::async_trait;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::Client;
use std::collections::HashMap;
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, info};

/// Capability interface for the source side of a transfer.
#[async_trait]
pub trait SourceStore: Send + Sync {
    /// Resolve the identity an item will be fetched with.
    fn resolve(&self, url: &str, bucket_hint: Option<&str>) -> Option<SourceIdentity>;

    /// Check whether an object exists at the source.
    async fn exists(&self, identity: &SourceIdentity, key: &str) -> Result<bool>;

    /// Download an object to a local path, returning the byte count.
    async fn fetch(&self, identity: &SourceIdentity, key: &str, dest: &Path) -> Result<u64>;

    /// Best-effort listing of keys near `key`, for operator-visible
    /// diagnostics when an object is missing. Never fails the item.
    async fn list_similar(&self, identity: &SourceIdentity, key: &str) -> Vec<String>;
}

/// COS-backed source store with one prebuilt client per configured identity.
///
/// Clients are built once and only read afterwards; resolution hands out
/// immutable [`SourceIdentity`] values, so workers never share mutable
/// client-selection state.
pub struct CosStore {
    sources: Vec<SourceConfig>,
    clients: HashMap<String, Client>,
}

impl CosStore {
    /// Build clients for every configured source identity.
    pub fn new(sources: Vec<SourceConfig>) -> Self {
        let clients = sources
            .iter()
            .map(|source| {
                let credentials = Credentials::new(
                    source.access_key.clone(),
                    source.secret_key.clone(),
                    None,
                    None,
                    "cos-static",
                );
                let config = aws_sdk_s3::Config::builder()
                    .behavior_version(BehaviorVersion::latest())
                    .region(Region::new(source.region.clone()))
                    .endpoint_url(source.endpoint_url())
                    .credentials_provider(credentials)
                    .build();
                info!(
                    "source '{}': bucket {} via {}",
                    source.name,
                    source.bucket,
                    source.endpoint_url()
                );
                (source.name.clone(), Client::from_conf(config))
            })
            .collect();

        Self { sources, clients }
    }

    fn client(&self, identity: &SourceIdentity) -> Result<&Client> {
        self.clients
            .get(&identity.name)
            .ok_or_else(|| MigrateError::storage(format!("no client for source '{}'", identity.name)))
    }
}

#[async_trait]
impl SourceStore for CosStore {
    fn resolve(&self, url: &str, bucket_hint: Option<&str>) -> Option<SourceIdentity> {
        let identity = resolve_identity(&self.sources, url, bucket_hint)?;
        debug!(
            "resolved {} -> source '{}' (bucket {})",
            url, identity.name, identity.bucket
        );
        Some(identity)
    }

    async fn exists(&self, identity: &SourceIdentity, key: &str) -> Result<bool> {
        let result = self
            .client(identity)?
            .head_object()
            .bucket(&identity.bucket)
            .key(key)
            .send()
            .await;

        match result {
            Ok(_) => Ok(true),
            Err(err) => {
                let service_err = err.into_service_error();
                if service_err.is_not_found() {
                    Ok(false)
                } else {
                    Err(MigrateError::storage(format!(
                        "head {}/{}: {}",
                        identity.bucket, key, service_err
                    )))
                }
            }
        }
    }

    async fn fetch(&self, identity: &SourceIdentity, key: &str, dest: &Path) -> Result<u64> {
        debug!("downloading {}/{} -> {}", identity.bucket, key, dest.display());

        let response = self
            .client(identity)?
            .get_object()
            .bucket(&identity.bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| {
                let service_err = err.into_service_error();
                if service_err.is_no_such_key() {
                    MigrateError::NotFound {
                        bucket: identity.bucket.clone(),
                        key: key.to_string(),
                    }
                } else {
                    MigrateError::storage(format!(
                        "get {}/{}: {}",
                        identity.bucket, key, service_err
                    ))
                }
            })?;

        let mut file = tokio::fs::File::create(dest).await?;
        let mut body = response.body;
        let mut written: u64 = 0;
        while let Some(chunk) = body
            .try_next()
            .await
            .map_err(|e| MigrateError::transfer(key, format!("read body: {}", e)))?
        {
            written += chunk.len() as u64;
            file.write_all(&chunk).await?;
        }
        file.flush().await?;

        debug!("downloaded {}/{} ({} bytes)", identity.bucket, key, written);
        Ok(written)
    }

    async fn list_similar(&self, identity: &SourceIdentity, key: &str) -> Vec<String> {
        // Search under the first two path segments, then fall back to the
        // bucket root, capped at 20 entries either way.
        let parts: Vec<&str> = key.split('/').collect();
        let prefix = if parts.len() > 2 {
            format!("{}/", parts[..2].join("/"))
        } else {
            String::new()
        };

        info!(
            "searching bucket {} for keys under prefix '{}'...",
            identity.bucket, prefix
        );

        let mut keys = self.list_prefix(identity, &prefix).await;
        if keys.is_empty() && !prefix.is_empty() {
            info!("nothing under '{}', listing bucket root instead", prefix);
            keys = self.list_prefix(identity, "").await;
        }

        for found in &keys {
            info!("  found: {}", found);
        }
        if keys.is_empty() {
            info!("  bucket {} returned no keys", identity.bucket);
        }
        keys
    }
}

impl CosStore {
    async fn list_prefix(&self, identity: &SourceIdentity, prefix: &str) -> Vec<String> {
        let client = match self.client(identity) {
            Ok(client) => client,
            Err(e) => {
                error!("diagnostic listing failed: {}", e);
                return Vec::new();
            }
        };

        let mut request = client
            .list_objects_v2()
            .bucket(&identity.bucket)
            .max_keys(20);
        if !prefix.is_empty() {
            request = request.prefix(prefix);
        }

        match request.send().await {
            Ok(response) => response
                .contents()
                .iter()
                .filter_map(|object| object.key())
                .map(str::to_string)
                .collect(),
            Err(err) => {
                error!(
                    "diagnostic listing of {} failed: {}",
                    identity.bucket,
                    err.into_service_error()
                );
                Vec::new()
            }
        }
    }
}
