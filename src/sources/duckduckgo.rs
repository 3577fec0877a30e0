// 🦆 DuckDuckGo Tracker Radar - per-domain JSON corpus → candidate vendors
//
// Layout: <domains dir>/<country>/<domain>.json, one tracker per file. The
// same tracker shows up under many countries; those copies collapse into one
// vendor keyed by tracker domain.

use super::{slugify, SourceAdapter, SourceBatch, SourceKind};
use crate::vendor::{CandidateVendor, Category};
use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Number;
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub struct DuckDuckGoAdapter;

// ============================================================================
// RAW FORMAT
// ============================================================================

#[derive(Debug, Default, Deserialize)]
struct TrackerOwner {
    #[serde(default)]
    name: Option<String>,

    #[serde(default, rename = "displayName")]
    display_name: Option<String>,

    #[serde(default, rename = "privacyPolicy")]
    privacy_policy: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct TrackerResource {
    #[serde(default)]
    cookies: f64,
}

/// One `<domain>.json` file (only the fields we use)
#[derive(Debug, Default, Deserialize)]
struct TrackerDomain {
    #[serde(default)]
    domain: Option<String>,

    #[serde(default)]
    owner: Option<TrackerOwner>,

    #[serde(default)]
    prevalence: f64,

    #[serde(default)]
    sites: u64,

    #[serde(default)]
    fingerprinting: u8,

    #[serde(default)]
    subdomains: Vec<Option<String>>,

    #[serde(default)]
    resources: Vec<TrackerResource>,

    #[serde(default)]
    categories: Vec<String>,
}

// ============================================================================
// HEURISTICS
// ============================================================================

const HIGH_RISK_CATEGORIES: [&str; 5] = [
    "Advertising",
    "Ad Motivated Tracking",
    "Ad Fraud",
    "Session Replay",
    "Fingerprinting",
];

/// Tracker Radar category → vendor category (None when unmapped)
pub fn map_radar_category(category: &str) -> Option<Category> {
    let mapped = match category {
        "Advertising" | "Ad Fraud" | "Ad Motivated Tracking" | "Action Pixels"
        | "Pornvertising" => Category::Advertising,
        "Analytics" | "Audience Measurement" | "Third-Party Analytics Marketing"
        | "Performance" => Category::Analytics,
        "Session Replay" => Category::Heatmaps,
        "Online Payment" => Category::Payments,
        "SSO" | "Federated Login" | "Fingerprinting" | "Malware" => Category::Security,
        "Badge" | "Social - Comment" | "Social - Share" | "Social Network" => Category::Social,
        "Content Delivery" | "CDN" => Category::Cdn,
        "Embedded Content" => Category::Video,
        "Non-Tracking" | "Unknown High Risk Behavior" | "Obscure Ownership" => Category::Other,
        "Consent Management" => Category::Consent,
        "Customer Interaction" => Category::Chat,
        "Tag Manager" => Category::TagManager,
        "Email" => Category::EmailMarketing,
        _ => return None,
    };
    Some(mapped)
}

/// First mapped category wins; nothing mapped → other
pub fn primary_category(categories: &[String]) -> Category {
    categories
        .iter()
        .find_map(|c| map_radar_category(c))
        .unwrap_or(Category::Other)
}

/// Risk score from tracker signals.
///
/// Base 5; prevalence >0.4 +2, >0.2 +1, >0.1 +0.5; plus the fingerprinting
/// level (0-3); cookies >0.8 +1, >0.5 +0.5; +1 for a high-risk category.
/// Rounded half-to-even, capped at 10.
pub fn calculate_risk_score(
    prevalence: f64,
    fingerprinting: u8,
    cookies: f64,
    categories: &[String],
) -> u8 {
    let mut score = 5.0_f64;

    if prevalence > 0.4 {
        score += 2.0;
    } else if prevalence > 0.2 {
        score += 1.0;
    } else if prevalence > 0.1 {
        score += 0.5;
    }

    score += f64::from(fingerprinting);

    if cookies > 0.8 {
        score += 1.0;
    } else if cookies > 0.5 {
        score += 0.5;
    }

    if categories
        .iter()
        .any(|c| HIGH_RISK_CATEGORIES.contains(&c.as_str()))
    {
        score += 1.0;
    }

    score.round_ties_even().min(10.0) as u8
}

fn is_ipv4(domain: &str) -> bool {
    let parts: Vec<&str> = domain.split('.').collect();
    parts.len() == 4
        && parts
            .iter()
            .all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()))
}

// ============================================================================
// PARSING
// ============================================================================

/// A parsed tracker file: its own domain plus the candidate built from it
#[derive(Debug, Clone)]
pub struct RadarTracker {
    pub domain: String,
    pub vendor: CandidateVendor,
}

impl DuckDuckGoAdapter {
    /// Parse one tracker file. `None` for unreadable or skipped entries.
    pub fn parse_domain_file(&self, path: &Path) -> Option<RadarTracker> {
        let text = fs::read_to_string(path).ok()?;
        let stem = path.file_stem()?.to_string_lossy().into_owned();
        self.parse_domain_json(&text, &stem)
    }

    /// Parse one tracker document; `fallback_domain` is used when it has no `domain`
    pub fn parse_domain_json(&self, text: &str, fallback_domain: &str) -> Option<RadarTracker> {
        let data: TrackerDomain = match serde_json::from_str(text) {
            Ok(data) => data,
            Err(e) => {
                debug!("Unparseable tracker file for {}: {}", fallback_domain, e);
                return None;
            }
        };

        let domain = data
            .domain
            .clone()
            .unwrap_or_else(|| fallback_domain.to_string());

        if is_ipv4(&domain) || domain.starts_with('_') || domain.chars().count() < 4 {
            return None;
        }

        let owner = data.owner.unwrap_or_default();
        let company = owner.name.unwrap_or_else(|| "Unknown".to_string());
        let display_name = owner.display_name.unwrap_or_else(|| company.clone());
        let name = if display_name != "Unknown" {
            display_name
        } else {
            domain.clone()
        };

        let mut domains = BTreeSet::new();
        domains.insert(domain.clone());
        for sub in data.subdomains.iter().flatten() {
            if !sub.is_empty() {
                domains.insert(format!("{}.{}", sub, domain));
            }
        }

        let cookies = data
            .resources
            .iter()
            .map(|r| r.cookies)
            .fold(0.0_f64, f64::max);

        let risk_score =
            calculate_risk_score(data.prevalence, data.fingerprinting, cookies, &data.categories);

        let vendor = CandidateVendor {
            id: Some(slugify(&domain)),
            domains: domains.into_iter().collect(),
            name: Some(name),
            company: Some(company),
            category: Some(primary_category(&data.categories).as_str().to_string()),
            gdpr_compliant: Some(false),
            risk_score: Some(Number::from(risk_score)),
            tier: Some("standard".to_string()),
            privacy_policy: owner.privacy_policy.filter(|p| !p.is_empty()),
            source: Some(SourceKind::DuckDuckGo.source_field().to_string()),
            prevalence: Some(data.prevalence),
            fingerprinting: Some(data.fingerprinting),
            cookies: Some(cookies),
            sites: Some(data.sites),
            ..Default::default()
        };

        Some(RadarTracker { domain, vendor })
    }

    /// All `*.json` files under every country directory, in sorted order
    fn collect_files(&self, domains_dir: &Path) -> Result<Vec<PathBuf>> {
        let mut countries: Vec<PathBuf> = fs::read_dir(domains_dir)
            .with_context(|| format!("Failed to list {}", domains_dir.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_dir())
            .collect();
        countries.sort();

        let mut all_files = Vec::new();
        for country in countries {
            let mut files: Vec<PathBuf> = fs::read_dir(&country)
                .with_context(|| format!("Failed to list {}", country.display()))?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.extension().map_or(false, |ext| ext == "json"))
                .collect();
            files.sort();

            debug!(
                "{}: {} domain files",
                country.file_name().unwrap_or_default().to_string_lossy(),
                files.len()
            );
            all_files.extend(files);
        }

        Ok(all_files)
    }
}

/// Fold one tracker into the batch, collapsing copies of the same tracker domain
fn fold_tracker(batch: &mut SourceBatch, index: &mut HashMap<String, usize>, tracker: RadarTracker) {
    let RadarTracker { domain, vendor } = tracker;

    let Some(&position) = index.get(&domain) else {
        index.insert(domain, batch.vendors.len());
        batch.vendors.push(vendor);
        return;
    };

    let existing = &mut batch.vendors[position];
    let all_domains: BTreeSet<String> = existing
        .domains
        .iter()
        .chain(vendor.domains.iter())
        .cloned()
        .collect();

    if vendor.prevalence.unwrap_or(0.0) > existing.prevalence.unwrap_or(0.0) {
        *existing = vendor;
    }
    existing.domains = all_domains.into_iter().collect();
}

impl SourceAdapter for DuckDuckGoAdapter {
    fn parse(&self, path: &Path) -> Result<SourceBatch> {
        if !path.is_dir() {
            warn!("DuckDuckGo data not found at {}", path.display());
            return Ok(SourceBatch::default());
        }

        info!("Reading DuckDuckGo Tracker Radar from {}", path.display());
        let files = self.collect_files(path)?;
        info!("Total: {} domain files across all countries", files.len());

        let mut batch = SourceBatch::default();
        let mut index: HashMap<String, usize> = HashMap::new();

        for (i, file) in files.iter().enumerate() {
            if i > 0 && i % 5000 == 0 {
                info!("Processed {}/{}...", i, files.len());
            }

            let Some(tracker) = self.parse_domain_file(file) else {
                batch.skipped += 1;
                continue;
            };

            fold_tracker(&mut batch, &mut index, tracker);
        }

        info!(
            "Imported {} unique vendors from DuckDuckGo ({} domains, {} entries skipped)",
            batch.vendors.len(),
            batch.total_domains(),
            batch.skipped
        );
        Ok(batch)
    }

    fn kind(&self) -> SourceKind {
        SourceKind::DuckDuckGo
    }
}

// ============================================================================
// TESTS
// ============================================================================
