// 🔌 Disconnect Tracking Protection - services.json → candidate vendors
//
// Layout:
//   { "categories": { "<Category>": [ { "<Company>": { "<http url>": ["d1", ...], "<flag>": "true" } } ] } }
//
// A company listed under several categories becomes one vendor; the first
// category it appears under wins, domains are unioned.

use super::{slugify, SourceAdapter, SourceBatch, SourceKind};
use crate::vendor::{CandidateVendor, Category};
use anyhow::{Context, Result};
use serde_json::{Map, Number, Value};
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

pub struct DisconnectAdapter;

/// Disconnect category → vendor category
pub fn map_category(disconnect_category: &str) -> Category {
    match disconnect_category {
        "Advertising" => Category::Advertising,
        "Analytics" => Category::Analytics,
        "Social" => Category::Social,
        "Content" => Category::Cdn,
        "Email" | "EmailAggressive" => Category::EmailMarketing,
        "FingerprintingInvasive" | "FingerprintingGeneral" | "Anti-fraud" => Category::Security,
        "ConsentManagers" => Category::Consent,
        _ => Category::Other,
    }
}

/// Baseline risk score for a Disconnect category
pub fn risk_for_category(disconnect_category: &str) -> u8 {
    match disconnect_category {
        "Advertising" => 6,
        "Analytics" => 4,
        "Social" => 5,
        "Content" => 2,
        "Email" => 4,
        "EmailAggressive" => 5,
        "FingerprintingInvasive" => 8,
        "FingerprintingGeneral" => 6,
        "Anti-fraud" => 3,
        "ConsentManagers" => 1,
        "Cryptomining" => 9,
        _ => 5,
    }
}

/// Domains and website found in one company entry
fn collect_company(company_data: &Map<String, Value>) -> (BTreeSet<String>, Option<String>) {
    let mut domains = BTreeSet::new();
    let mut website = None;

    for (key, value) in company_data {
        if key.starts_with("http") {
            website = Some(key.clone());
        }

        if let Value::Array(items) = value {
            for item in items {
                if let Value::String(domain) = item {
                    if domain.contains('.') && domain.chars().count() > 3 {
                        domains.insert(domain.to_lowercase());
                    }
                }
            }
        }
    }

    (domains, website)
}

impl DisconnectAdapter {
    /// Parse an already-loaded services.json document
    pub fn parse_document(&self, data: &Value) -> SourceBatch {
        let mut batch = SourceBatch::default();
        let mut index: HashMap<String, usize> = HashMap::new();

        let Some(categories) = data.get("categories").and_then(Value::as_object) else {
            warn!("services.json has no 'categories' object");
            return batch;
        };

        for (category_name, entries) in categories {
            let category = map_category(category_name);
            let risk_score = risk_for_category(category_name);

            let Some(entries) = entries.as_array() else {
                batch.skipped += 1;
                continue;
            };

            for entry in entries {
                let Some(entry) = entry.as_object() else {
                    batch.skipped += 1;
                    continue;
                };

                for (company_name, company_data) in entry {
                    let vendor_id = slugify(company_name);
                    if vendor_id.len() < 2 {
                        debug!("Skipping company '{}': id too short", company_name);
                        batch.skipped += 1;
                        continue;
                    }

                    let Some(company_data) = company_data.as_object() else {
                        batch.skipped += 1;
                        continue;
                    };

                    let (domains, website) = collect_company(company_data);
                    if domains.is_empty() {
                        batch.skipped += 1;
                        continue;
                    }

                    if let Some(&position) = index.get(&vendor_id) {
                        let existing = &mut batch.vendors[position];
                        let merged: BTreeSet<String> = existing
                            .domains
                            .drain(..)
                            .chain(domains)
                            .collect();
                        existing.domains = merged.into_iter().collect();
                        continue;
                    }

                    index.insert(vendor_id.clone(), batch.vendors.len());
                    batch.vendors.push(CandidateVendor {
                        id: Some(vendor_id),
                        domains: domains.into_iter().collect(),
                        name: Some(company_name.clone()),
                        company: Some(company_name.clone()),
                        category: Some(category.as_str().to_string()),
                        gdpr_compliant: Some(false),
                        risk_score: Some(Number::from(risk_score)),
                        tier: Some("standard".to_string()),
                        source: Some(SourceKind::Disconnect.source_field().to_string()),
                        disconnect_category: Some(category_name.clone()),
                        website,
                        ..Default::default()
                    });
                }
            }
        }

        batch
    }
}

impl SourceAdapter for DisconnectAdapter {
    fn parse(&self, path: &Path) -> Result<SourceBatch> {
        if !path.exists() {
            warn!("Disconnect data not found at {}", path.display());
            return Ok(SourceBatch::default());
        }

        info!("Reading Disconnect services.json from {}", path.display());
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let data: Value = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        let batch = self.parse_document(&data);
        info!(
            "Imported {} vendors from Disconnect ({} domains, {} entries skipped)",
            batch.vendors.len(),
            batch.total_domains(),
            batch.skipped
        );
        Ok(batch)
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Disconnect
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "license": "GPL-3.0",
            "categories": {
                "Advertising": [
                    { "Criteo": { "http://www.criteo.com/": ["criteo.com", "Criteo.NET", "x.y", 7] } },
                    { "Google": { "http://www.google.com/": ["doubleclick.net", "googlesyndication.com"] } },
                    { "X": { "http://x.example/": ["x-tracker.com"] } },
                    { "Empty Co": { "http://empty.example/": [] } }
                ],
                "Analytics": [
                    { "Google": { "http://www.google.com/": ["google-analytics.com"], "performance": "true" } }
                ],
                "Cryptomining": [
                    { "CoinHive": { "https://coinhive.com/": ["coinhive.com"] } }
                ]
            }
        })
    }

    #[test]
    fn test_category_mapping() {
        assert_eq!(map_category("Content"), Category::Cdn);
        assert_eq!(map_category("EmailAggressive"), Category::EmailMarketing);
        assert_eq!(map_category("Anti-fraud"), Category::Security);
        assert_eq!(map_category("Cryptomining"), Category::Other);
        assert_eq!(map_category("Brand New"), Category::Other);
        assert_eq!(risk_for_category("FingerprintingInvasive"), 8);
        assert_eq!(risk_for_category("Brand New"), 5);
    }

    #[test]
    fn test_parse_document() {
        let batch = DisconnectAdapter.parse_document(&sample());

        let ids: Vec<&str> = batch
            .vendors
            .iter()
            .map(|v| v.id.as_deref().unwrap())
            .collect();
        assert_eq!(ids, vec!["criteo", "google", "coinhive"]);

        // "X" → id too short, "Empty Co" → no domains
        assert_eq!(batch.skipped, 2);

        let criteo = &batch.vendors[0];
        assert_eq!(criteo.domains, vec!["criteo.com", "criteo.net"]);
        assert_eq!(criteo.category.as_deref(), Some("advertising"));
        assert_eq!(criteo.risk_score, Some(Number::from(6)));
        assert_eq!(criteo.website.as_deref(), Some("http://www.criteo.com/"));
        assert_eq!(criteo.source.as_deref(), Some("disconnect"));
        assert_eq!(criteo.disconnect_category.as_deref(), Some("Advertising"));
    }

    #[test]
    fn test_company_in_two_categories_merged() {
        let batch = DisconnectAdapter.parse_document(&sample());
        let google = batch
            .vendors
            .iter()
            .find(|v| v.id.as_deref() == Some("google"))
            .unwrap();

        assert_eq!(
            google.domains,
            vec!["doubleclick.net", "google-analytics.com", "googlesyndication.com"]
        );
        assert_eq!(google.category.as_deref(), Some("advertising"));
        assert_eq!(google.disconnect_category.as_deref(), Some("Advertising"));
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let batch = DisconnectAdapter
            .parse(&dir.path().join("services.json"))
            .unwrap();
        assert!(batch.vendors.is_empty());
    }

    #[test]
    fn test_parse_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("services.json");
        fs::write(&path, serde_json::to_string(&sample()).unwrap()).unwrap();

        let batch = DisconnectAdapter.parse(&path).unwrap();
        assert_eq!(batch.vendors.len(), 3);
        assert_eq!(batch.total_domains(), 6);
    }

    #[test]
    fn test_corrupt_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("services.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(DisconnectAdapter.parse(&path).is_err());
    }
}
