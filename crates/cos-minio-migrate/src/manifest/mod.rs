//! CSV manifest adapter.
//!
//! The manifest is the durable progress record: one row per object, with a
//! URL column, a status column, an optional bucket column (source hint and
//! destination override), and an error column. Missing bookkeeping columns
//! are created on load; the file is rewritten atomically after a run.

use crate::config::MigrationConfig;
use crate::error::{MigrateError, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{error, info, warn};
use url::Url;

/// Per-row migration status as persisted in the status column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemStatus {
    Pending,
    Processing,
    Success,
    Failed,
}

impl ItemStatus {
    /// The column value for this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Pending => "pending",
            ItemStatus::Processing => "processing",
            ItemStatus::Success => "success",
            ItemStatus::Failed => "failed",
        }
    }

    /// Parse a status cell. Unknown values return `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" | "" => Some(ItemStatus::Pending),
            "processing" => Some(ItemStatus::Processing),
            "success" => Some(ItemStatus::Success),
            "failed" => Some(ItemStatus::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ItemStatus {
    type Err = MigrateError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s).ok_or_else(|| {
            MigrateError::Manifest(format!(
                "unknown status '{}' (expected pending, processing, success or failed)",
                s
            ))
        })
    }
}

/// One manifest row selected for migration.
#[derive(Debug, Clone)]
pub struct MigrationItem {
    /// Zero-based data-row index; stable identity within one manifest.
    pub index: usize,
    /// Object URL.
    pub url: String,
    /// Bucket hint / destination override from the bucket column.
    pub bucket_hint: Option<String>,
}

impl MigrationItem {
    /// 1-based row number as a spreadsheet user sees it (header is row 1).
    pub fn display_row(&self) -> usize {
        display_row(self.index)
    }
}

/// 1-based display row for a zero-based data-row index.
pub fn display_row(index: usize) -> usize {
    index + 2
}

/// Per-status row counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ManifestStats {
    pub total: usize,
    pub pending: usize,
    pub processing: usize,
    pub success: usize,
    pub failed: usize,
}

struct Rows {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    url_idx: usize,
    status_idx: usize,
    bucket_idx: usize,
    error_idx: usize,
}

/// Loaded manifest with interior locking so concurrent workers can write
/// back status for disjoint rows.
pub struct Manifest {
    path: PathBuf,
    inner: Mutex<Rows>,
}

impl Manifest {
    /// Load a manifest from a CSV file.
    ///
    /// The URL column is required. Status, bucket and error columns are
    /// created when missing (status defaults to `pending`).
    pub fn load<P: AsRef<Path>>(path: P, columns: &MigrationConfig) -> Result<Self> {
        let path = path.as_ref();
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(path)
            .map_err(|e| MigrateError::Manifest(format!("cannot read {}: {}", path.display(), e)))?;

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| MigrateError::Manifest(format!("cannot read headers: {}", e)))?
            .iter()
            .map(str::to_string)
            .collect();

        let mut rows: Vec<Vec<String>> = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        let mut rows = Rows {
            url_idx: find_column(&headers, &columns.url_column).ok_or_else(|| {
                MigrateError::Manifest(format!(
                    "manifest has no '{}' column: {}",
                    columns.url_column,
                    path.display()
                ))
            })?,
            status_idx: 0,
            bucket_idx: 0,
            error_idx: 0,
            headers,
            rows,
        };

        rows.status_idx = match find_column(&rows.headers, &columns.status_column) {
            Some(idx) => idx,
            None => append_column(&mut rows, &columns.status_column, ItemStatus::Pending.as_str()),
        };
        rows.bucket_idx = match find_column(&rows.headers, &columns.bucket_column) {
            Some(idx) => idx,
            None => {
                warn!(
                    "manifest has no '{}' column, using the default sink bucket for all rows",
                    columns.bucket_column
                );
                append_column(&mut rows, &columns.bucket_column, "")
            }
        };
        rows.error_idx = match find_column(&rows.headers, &columns.error_column) {
            Some(idx) => idx,
            None => append_column(&mut rows, &columns.error_column, ""),
        };

        // Flexible CSVs may have short rows; pad so every cell is addressable.
        let width = rows.headers.len();
        for row in &mut rows.rows {
            row.resize(width, String::new());
        }

        info!("loaded manifest {} ({} rows)", path.display(), rows.rows.len());

        Ok(Self {
            path: path.to_path_buf(),
            inner: Mutex::new(rows),
        })
    }

    /// Rows whose status is in `filter`, with valid non-empty URLs.
    ///
    /// Rows with empty URL cells are ignored; rows with malformed URLs are
    /// logged and skipped. An empty filter selects every row.
    pub fn items(&self, filter: &[ItemStatus]) -> Vec<MigrationItem> {
        let inner = self.inner.lock().expect("manifest lock poisoned");
        let mut items = Vec::new();

        for (index, row) in inner.rows.iter().enumerate() {
            let url = row[inner.url_idx].trim();
            if url.is_empty() {
                continue;
            }

            if !filter.is_empty() {
                let status = ItemStatus::parse(&row[inner.status_idx]);
                if !status.map_or(false, |s| filter.contains(&s)) {
                    continue;
                }
            }

            if !is_valid_url(url) {
                warn!("invalid URL (row {}): {}", display_row(index), url);
                continue;
            }

            let bucket = row[inner.bucket_idx].trim();
            items.push(MigrationItem {
                index,
                url: url.to_string(),
                bucket_hint: (!bucket.is_empty()).then(|| bucket.to_string()),
            });
        }

        info!("selected {} manifest rows", items.len());
        items
    }

    /// Write a status (and error message) into a row.
    ///
    /// Out-of-range indices are logged and ignored so one bad write-back
    /// cannot take down the run.
    pub fn set_status(&self, index: usize, status: ItemStatus, error_msg: Option<&str>) {
        let mut inner = self.inner.lock().expect("manifest lock poisoned");
        let (status_idx, error_idx) = (inner.status_idx, inner.error_idx);
        match inner.rows.get_mut(index) {
            Some(row) => {
                row[status_idx] = status.as_str().to_string();
                row[error_idx] = error_msg.unwrap_or_default().to_string();
            }
            None => error!("status write-back for unknown row index {}", index),
        }
    }

    /// Persist the manifest, in place or to an explicit output path.
    ///
    /// The file is written to a temp sibling and renamed into place.
    pub fn persist(&self, output: Option<&Path>) -> Result<()> {
        let target = output.unwrap_or(&self.path);
        let inner = self.inner.lock().expect("manifest lock poisoned");

        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(&inner.headers)?;
        for row in &inner.rows {
            writer.write_record(row)?;
        }
        let content = writer
            .into_inner()
            .map_err(|e| MigrateError::Manifest(format!("serialize manifest: {}", e)))?;

        let temp_path = target.with_extension("tmp");
        std::fs::write(&temp_path, &content)?;
        std::fs::rename(&temp_path, target)?;

        info!("manifest saved: {}", target.display());
        Ok(())
    }

    /// Per-status row counts.
    pub fn statistics(&self) -> ManifestStats {
        let inner = self.inner.lock().expect("manifest lock poisoned");
        let mut stats = ManifestStats {
            total: inner.rows.len(),
            ..ManifestStats::default()
        };
        for row in &inner.rows {
            match ItemStatus::parse(&row[inner.status_idx]) {
                Some(ItemStatus::Pending) => stats.pending += 1,
                Some(ItemStatus::Processing) => stats.processing += 1,
                Some(ItemStatus::Success) => stats.success += 1,
                Some(ItemStatus::Failed) => stats.failed += 1,
                None => {}
            }
        }
        stats
    }
}

fn find_column(headers: &[String], name: &str) -> Option<usize> {
    headers.iter().position(|h| h.trim() == name)
}

fn append_column(rows: &mut Rows, name: &str, fill: &str) -> usize {
    rows.headers.push(name.to_string());
    for row in &mut rows.rows {
        row.push(fill.to_string());
    }
    rows.headers.len() - 1
}

/// A URL is usable when it parses with both a scheme and an authority.
fn is_valid_url(url: &str) -> bool {
    Url::parse(url).map_or(false, |u| u.has_host())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn columns() -> MigrationConfig {
        MigrationConfig::default()
    }

    fn write_manifest(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_creates_missing_columns() {
        let file = write_manifest("url\nhttps://video-1001.cos.ap-shanghai.myqcloud.com/a.mp4\n");
        let manifest = Manifest::load(file.path(), &columns()).unwrap();

        let items = manifest.items(&[ItemStatus::Pending]);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].index, 0);
        assert_eq!(items[0].bucket_hint, None);

        let stats = manifest.statistics();
        assert_eq!(stats.total, 1);
        assert_eq!(stats.pending, 1);
    }

    #[test]
    fn test_missing_url_column_is_an_error() {
        let file = write_manifest("name,status\nfirst,pending\n");
        assert!(Manifest::load(file.path(), &columns()).is_err());
    }

    #[test]
    fn test_items_filters_by_status() {
        let file = write_manifest(
            "url,status\n\
             https://a.cos.ap-shanghai.myqcloud.com/1.bin,success\n\
             https://a.cos.ap-shanghai.myqcloud.com/2.bin,failed\n\
             https://a.cos.ap-shanghai.myqcloud.com/3.bin,pending\n",
        );
        let manifest = Manifest::load(file.path(), &columns()).unwrap();

        let resume = manifest.items(&[ItemStatus::Pending, ItemStatus::Failed]);
        assert_eq!(resume.len(), 2);
        assert_eq!(resume[0].index, 1);
        assert_eq!(resume[1].index, 2);

        // Already-successful rows are never re-selected on resume.
        assert!(resume.iter().all(|i| i.index != 0));
    }

    #[test]
    fn test_items_skips_empty_and_invalid_urls() {
        let file = write_manifest(
            "url,status\n\
             ,pending\n\
             not-a-url,pending\n\
             https://a.cos.ap-shanghai.myqcloud.com/ok.bin,pending\n",
        );
        let manifest = Manifest::load(file.path(), &columns()).unwrap();
        let items = manifest.items(&[ItemStatus::Pending]);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].url, "https://a.cos.ap-shanghai.myqcloud.com/ok.bin");
    }

    #[test]
    fn test_bucket_hint_round_trip() {
        let file = write_manifest(
            "url,buckets\n\
             https://a.cos.ap-shanghai.myqcloud.com/1.mp4,video-storage\n\
             https://a.cos.ap-shanghai.myqcloud.com/2.pdf,\n",
        );
        let manifest = Manifest::load(file.path(), &columns()).unwrap();
        let items = manifest.items(&[ItemStatus::Pending]);
        assert_eq!(items[0].bucket_hint.as_deref(), Some("video-storage"));
        assert_eq!(items[1].bucket_hint, None);
    }

    #[test]
    fn test_set_status_and_persist_round_trip() {
        let file = write_manifest(
            "url\n\
             https://a.cos.ap-shanghai.myqcloud.com/1.bin\n\
             https://a.cos.ap-shanghai.myqcloud.com/2.bin\n",
        );
        let manifest = Manifest::load(file.path(), &columns()).unwrap();
        manifest.set_status(0, ItemStatus::Success, None);
        manifest.set_status(1, ItemStatus::Failed, Some("connection reset"));
        manifest.persist(None).unwrap();

        let reloaded = Manifest::load(file.path(), &columns()).unwrap();
        let stats = reloaded.statistics();
        assert_eq!(stats.success, 1);
        assert_eq!(stats.failed, 1);

        let content = std::fs::read_to_string(file.path()).unwrap();
        assert!(content.contains("connection reset"));
    }

    #[test]
    fn test_success_clears_previous_error() {
        let file = write_manifest(
            "url,status,error_msg\n\
             https://a.cos.ap-shanghai.myqcloud.com/1.bin,failed,timeout\n",
        );
        let manifest = Manifest::load(file.path(), &columns()).unwrap();
        manifest.set_status(0, ItemStatus::Success, None);
        manifest.persist(None).unwrap();

        let content = std::fs::read_to_string(file.path()).unwrap();
        assert!(!content.contains("timeout"));
    }

    #[test]
    fn test_set_status_out_of_range_is_ignored() {
        let file = write_manifest("url\nhttps://a.cos.ap-shanghai.myqcloud.com/1.bin\n");
        let manifest = Manifest::load(file.path(), &columns()).unwrap();
        manifest.set_status(42, ItemStatus::Failed, Some("nope"));
        assert_eq!(manifest.statistics().failed, 0);
    }

    #[test]
    fn test_persist_to_explicit_output() {
        let file = write_manifest("url\nhttps://a.cos.ap-shanghai.myqcloud.com/1.bin\n");
        let manifest = Manifest::load(file.path(), &columns()).unwrap();

        let out = NamedTempFile::new().unwrap();
        manifest.persist(Some(out.path())).unwrap();
        let reloaded = Manifest::load(out.path(), &columns()).unwrap();
        assert_eq!(reloaded.statistics().total, 1);
    }

    #[test]
    fn test_display_row_accounts_for_header() {
        let item = MigrationItem {
            index: 0,
            url: "https://a.cos.ap-shanghai.myqcloud.com/1.bin".into(),
            bucket_hint: None,
        };
        assert_eq!(item.display_row(), 2);
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(ItemStatus::parse("Success"), Some(ItemStatus::Success));
        assert_eq!(ItemStatus::parse(""), Some(ItemStatus::Pending));
        assert_eq!(ItemStatus::parse("bogus"), None);
        assert!("failed".parse::<ItemStatus>().is_ok());
        assert!("bogus".parse::<ItemStatus>().is_err());
    }
}
