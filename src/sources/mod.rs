// 🏗️ Source Adapters - One upstream format in, candidate vendors out
//
// Each adapter is independent: no shared state, no knowledge of the merge.
// Missing input is not an error (the source simply contributes nothing);
// malformed entries are skipped and counted.

pub mod disconnect;
pub mod duckduckgo;

use crate::vendor::CandidateVendor;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

pub use disconnect::DisconnectAdapter;
pub use duckduckgo::DuckDuckGoAdapter;

// ============================================================================
// CORE TYPES
// ============================================================================

/// Which upstream dataset a batch came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    DuckDuckGo,
    Disconnect,
}

impl SourceKind {
    /// Human-readable name for display
    pub fn name(&self) -> &'static str {
        match self {
            SourceKind::DuckDuckGo => "DuckDuckGo Tracker Radar",
            SourceKind::Disconnect => "Disconnect Tracking Protection",
        }
    }

    /// Value written to the `source` passenger field
    pub fn source_field(&self) -> &'static str {
        match self {
            SourceKind::DuckDuckGo => "duckduckgo-tracker-radar",
            SourceKind::Disconnect => "disconnect",
        }
    }

    /// Default suffix for id collisions during merge
    pub fn default_tag(&self) -> &'static str {
        match self {
            SourceKind::DuckDuckGo => "ddg",
            SourceKind::Disconnect => "dc",
        }
    }
}

/// Output of one adapter run
#[derive(Debug, Clone, Default)]
pub struct SourceBatch {
    pub vendors: Vec<CandidateVendor>,

    /// Upstream entries that could not be turned into a candidate
    pub skipped: usize,
}

impl SourceBatch {
    pub fn total_domains(&self) -> usize {
        self.vendors.iter().map(|v| v.domains.len()).sum()
    }
}

/// SourceAdapter - turns one upstream raw format into candidate vendors
pub trait SourceAdapter {
    /// Parse the upstream data found at `path` (a file or a directory,
    /// depending on the source). A missing path yields an empty batch.
    fn parse(&self, path: &Path) -> Result<SourceBatch>;

    /// The dataset this adapter understands
    fn kind(&self) -> SourceKind;

    /// Adapter version (for provenance)
    fn version(&self) -> &str {
        "1.0.0"
    }
}

/// Get adapter for a source kind
pub fn get_adapter(kind: SourceKind) -> Box<dyn SourceAdapter> {
    match kind {
        SourceKind::DuckDuckGo => Box::new(DuckDuckGoAdapter),
        SourceKind::Disconnect => Box::new(DisconnectAdapter),
    }
}

// ============================================================================
// HELPERS
// ============================================================================

/// Vendor id slug: lowercase, anything outside `[a-z0-9-]` becomes `-`,
/// leading and trailing dashes trimmed.
///
/// Example: "Amazon.com, Inc." → "amazon-com--inc"
pub fn slugify(value: &str) -> String {
    value
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' {
                c
            } else {
                '-'
            }
        })
        .collect::<String>()
        .trim_matches('-')
        .to_string()
}

/// Persist adapter output as a bare JSON array, ready for the merge
pub fn write_candidates(path: &Path, vendors: &[CandidateVendor]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
    }

    let json = serde_json::to_string_pretty(vendors).context("Failed to serialize vendors")?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;

    info!("Saved {} vendors to {}", vendors.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Google"), "google");
        assert_eq!(slugify("Amazon.com, Inc."), "amazon-com--inc");
        assert_eq!(slugify("  --Yandex--  "), "yandex");
        assert_eq!(slugify("doubleclick.net"), "doubleclick-net");
        assert_eq!(slugify("Ñandú"), "and");
        assert_eq!(slugify("..."), "");
    }

    #[test]
    fn test_get_adapter() {
        assert_eq!(get_adapter(SourceKind::Disconnect).kind(), SourceKind::Disconnect);
        assert_eq!(get_adapter(SourceKind::DuckDuckGo).kind(), SourceKind::DuckDuckGo);
        assert_eq!(SourceKind::DuckDuckGo.default_tag(), "ddg");
    }

    #[test]
    fn test_write_candidates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("vendors-test.json");
        let vendors = vec![CandidateVendor::new("a", &["a.com"])];

        write_candidates(&path, &vendors).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let back: Vec<CandidateVendor> = serde_json::from_str(&text).unwrap();
        assert_eq!(back, vendors);
    }
}
