//! # cos-minio-migrate
//!
//! Manifest-driven migration of objects from Tencent COS to MinIO.
//!
//! This library provides the core functionality for draining a CSV manifest
//! of object URLs into an S3-compatible destination with support for:
//!
//! - **Parallel transfers** with a configurable worker pool
//! - **Resumable runs** via per-row status tracked in the manifest itself
//! - **Skip fast-path** for objects already present at the destination
//! - **Bucket resolution** from manifest hints or URL host labels
//! - **Destination fan-out** with a per-row bucket override
//!
//! ## Example
//!
//! ```rust,no_run
//! use cos_minio_migrate::{Config, CosStore, Manifest, MinioStore, Migrator};
//! use cos_minio_migrate::manifest::ItemStatus;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> cos_minio_migrate::Result<()> {
//!     let config = Config::load("config.yaml")?;
//!     let manifest = Arc::new(Manifest::load("manifest.csv", &config.migration)?);
//!     let source = Arc::new(CosStore::new(config.sources.clone()));
//!     let sink = Arc::new(MinioStore::connect(&config.sink).await?);
//!
//!     let migrator = Migrator::new(
//!         manifest,
//!         source,
//!         sink,
//!         config.migration.get_workers(),
//!         config.migration.get_temp_dir(),
//!     );
//!     let report = migrator.run(&[ItemStatus::Pending], false, None).await?;
//!     println!("migrated {} objects", report.success);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod manifest;
pub mod orchestrator;
pub mod resolver;
pub mod scratch;
pub mod sink;
pub mod source;
pub mod stats;

// Re-exports for convenient access
pub use config::{Config, MigrationConfig, SinkConfig, SourceConfig};
pub use error::{MigrateError, Result};
pub use manifest::{ItemStatus, Manifest, ManifestStats, MigrationItem};
pub use orchestrator::{Migrator, RunReport, TransferResult};
pub use resolver::{object_key, resolve_identity, SourceIdentity};
pub use scratch::ScratchFile;
pub use sink::{content_type_for, MinioStore, SinkStore};
pub use source::{CosStore, SourceStore};
pub use stats::{RunStats, StatsSnapshot};
