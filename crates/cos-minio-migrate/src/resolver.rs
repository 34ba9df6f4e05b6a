//! Source bucket resolution.
//!
//! Maps a manifest row (URL plus optional bucket hint) to one of the
//! configured source identities. Resolution is a pure function of the
//! configured source list: the hint is tried first, then the first
//! dot-delimited label of the URL host. Hints come from the manifest and
//! are more reliable than host naming conventions, but older manifests
//! lack the bucket column, so neither tier is mandatory.

use crate::config::SourceConfig;
use url::Url;

/// An immutable, resolved source identity for one item.
///
/// Recomputed per row; never shared mutable state between workers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceIdentity {
    /// Logical name of the matched source configuration.
    pub name: String,
    /// Region of the matched source.
    pub region: String,
    /// Bucket the item will be fetched from.
    pub bucket: String,
}

impl SourceIdentity {
    fn from_config(config: &SourceConfig) -> Self {
        Self {
            name: config.name.clone(),
            region: config.region.clone(),
            bucket: config.bucket.clone(),
        }
    }
}

/// Resolve the source identity for a URL and optional bucket hint.
///
/// First match wins on both tiers; overlapping hint substrings in the
/// configuration make the outcome order-dependent.
pub fn resolve_identity(
    sources: &[SourceConfig],
    url: &str,
    bucket_hint: Option<&str>,
) -> Option<SourceIdentity> {
    if let Some(hint) = bucket_hint.map(str::trim).filter(|h| !h.is_empty()) {
        if let Some(config) = sources.iter().find(|s| s.bucket.contains(hint)) {
            return Some(SourceIdentity::from_config(config));
        }
    }

    let label = host_label(url)?;
    sources
        .iter()
        .find(|s| s.bucket.contains(&label))
        .map(SourceIdentity::from_config)
}

/// First dot-delimited label of the URL's host, e.g.
/// "video-1001" for "https://video-1001.cos.ap-shanghai.myqcloud.com/...".
fn host_label(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    host.split('.').next().map(str::to_string)
}

/// Object key for a URL: the path with leading slashes stripped.
///
/// Returns `None` when the URL does not parse or has an empty path.
pub fn object_key(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let key = parsed.path().trim_start_matches('/');
    (!key.is_empty()).then(|| key.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sources() -> Vec<SourceConfig> {
        vec![
            SourceConfig {
                name: "video".into(),
                region: "ap-shanghai".into(),
                access_key: "AKIDvideo".into(),
                secret_key: "secret".into(),
                bucket: "video-storage-1251973116".into(),
                endpoint: None,
            },
            SourceConfig {
                name: "docs".into(),
                region: "ap-guangzhou".into(),
                access_key: "AKIDdocs".into(),
                secret_key: "secret".into(),
                bucket: "documents-1251973116".into(),
                endpoint: None,
            },
        ]
    }

    #[test]
    fn test_hint_match() {
        let identity = resolve_identity(
            &sources(),
            "https://unrelated.example.com/a.mp4",
            Some("video-storage"),
        )
        .unwrap();
        assert_eq!(identity.name, "video");
        assert_eq!(identity.bucket, "video-storage-1251973116");
    }

    #[test]
    fn test_hint_takes_precedence_over_url() {
        // URL authority points at documents, hint at video: hint wins.
        let identity = resolve_identity(
            &sources(),
            "https://documents-1251973116.cos.ap-guangzhou.myqcloud.com/report.pdf",
            Some("video-storage"),
        )
        .unwrap();
        assert_eq!(identity.name, "video");
    }

    #[test]
    fn test_url_fallback_when_no_hint() {
        let identity = resolve_identity(
            &sources(),
            "https://documents-1251973116.cos.ap-guangzhou.myqcloud.com/report.pdf",
            None,
        )
        .unwrap();
        assert_eq!(identity.name, "docs");
    }

    #[test]
    fn test_url_fallback_when_hint_matches_nothing() {
        let identity = resolve_identity(
            &sources(),
            "https://video-storage-1251973116.cos.ap-shanghai.myqcloud.com/a.mp4",
            Some("no-such-bucket"),
        )
        .unwrap();
        assert_eq!(identity.name, "video");
    }

    #[test]
    fn test_empty_hint_is_ignored() {
        let identity = resolve_identity(
            &sources(),
            "https://video-storage-1251973116.cos.ap-shanghai.myqcloud.com/a.mp4",
            Some("  "),
        )
        .unwrap();
        assert_eq!(identity.name, "video");
    }

    #[test]
    fn test_no_match_is_none() {
        assert!(resolve_identity(&sources(), "https://other.example.com/a.mp4", None).is_none());
        assert!(resolve_identity(&sources(), "not a url", None).is_none());
    }

    #[test]
    fn test_object_key_strips_authority_and_slash() {
        assert_eq!(
            object_key("https://video-1001.cos.ap-shanghai.myqcloud.com/course/video/lesson1.mp4"),
            Some("course/video/lesson1.mp4".to_string())
        );
    }

    #[test]
    fn test_object_key_empty_path() {
        assert_eq!(object_key("https://video-1001.cos.ap-shanghai.myqcloud.com"), None);
        assert_eq!(object_key("https://video-1001.cos.ap-shanghai.myqcloud.com/"), None);
        assert_eq!(object_key("not a url"), None);
    }
}
