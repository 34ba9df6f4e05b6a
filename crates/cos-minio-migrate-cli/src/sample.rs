//! Sample manifest generation.

use cos_minio_migrate::{MigrateError, Result};
use std::path::Path;

struct SampleRow {
    id: &'static str,
    name: &'static str,
    url: &'static str,
    kind: &'static str,
    bucket: &'static str,
}

const SAMPLE_ROWS: &[SampleRow] = &[
    SampleRow {
        id: "1",
        name: "Course video 1",
        url: "https://video-10074222.cos.ap-shanghai.myqcloud.com/course/video/20240124/lesson1.mp4",
        kind: "video",
        bucket: "video-storage",
    },
    SampleRow {
        id: "2",
        name: "Product image 1",
        url: "https://upload-10051630.cos.ap-shanghai.myqcloud.com/2022/products/phone.jpg",
        kind: "image",
        bucket: "product-images",
    },
    SampleRow {
        id: "3",
        name: "User manual",
        url: "https://dop-pro-1251973116.file.myqcloud.com/upload/docs/user-manual.pdf",
        kind: "document",
        bucket: "documents",
    },
    SampleRow {
        id: "4",
        name: "System config",
        url: "https://scrm-pro-1251973116.file.myqcloud.com/config/system-config.json",
        kind: "config",
        // Empty override: this row lands in the sink's default bucket.
        bucket: "",
    },
    SampleRow {
        id: "5",
        name: "Marketing banner",
        url: "https://upload-10051630.cos.ap-shanghai.myqcloud.com/2023/marketing/banner.png",
        kind: "image",
        bucket: "marketing-assets",
    },
    SampleRow {
        id: "6",
        name: "Monthly report",
        url: "https://dop-pro-1251973116.file.myqcloud.com/reports/2024/monthly-report.xlsx",
        kind: "document",
        bucket: "reports",
    },
];

/// Write an example manifest to `path`.
///
/// With `with_buckets`, rows carry per-row destination bucket overrides;
/// otherwise the bucket column is left out and every row targets the
/// sink's default bucket.
pub fn write_sample_manifest(path: &Path, with_buckets: bool) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;

    if with_buckets {
        writer.write_record(["id", "name", "url", "type", "buckets", "status"])?;
        for row in SAMPLE_ROWS {
            writer.write_record([row.id, row.name, row.url, row.kind, row.bucket, "pending"])?;
        }
    } else {
        writer.write_record(["id", "name", "url", "type", "status"])?;
        for row in SAMPLE_ROWS {
            writer.write_record([row.id, row.name, row.url, row.kind, "pending"])?;
        }
    }

    writer
        .flush()
        .map_err(|e| MigrateError::Manifest(format!("write sample manifest: {}", e)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cos_minio_migrate::{ItemStatus, Manifest, MigrationConfig};
    use tempfile::tempdir;

    #[test]
    fn test_sample_manifest_loads() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sample.csv");
        write_sample_manifest(&path, true).unwrap();

        let manifest = Manifest::load(&path, &MigrationConfig::default()).unwrap();
        let stats = manifest.statistics();
        assert_eq!(stats.total, 6);
        assert_eq!(stats.pending, 6);

        let items = manifest.items(&[ItemStatus::Pending]);
        assert_eq!(items.len(), 6);
        assert_eq!(items[0].bucket_hint.as_deref(), Some("video-storage"));
        assert_eq!(items[3].bucket_hint, None);
    }

    #[test]
    fn test_sample_manifest_without_buckets() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sample.csv");
        write_sample_manifest(&path, false).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(!content.contains("buckets"));

        // The bucket column is auto-created empty on load.
        let manifest = Manifest::load(&path, &MigrationConfig::default()).unwrap();
        let items = manifest.items(&[ItemStatus::Pending]);
        assert!(items.iter().all(|i| i.bucket_hint.is_none()));
    }
}
