// 🧹 Normalizer - Candidate vendor → normalized vendor record
//
// Total function: every gap gets a default, every out-of-range value gets
// clamped, unknown categories collapse to `other`. Nothing here can fail.

use crate::vendor::{
    CandidateVendor, Category, Tier, VendorRecord, RISK_SCORE_DEFAULT, RISK_SCORE_MAX,
    RISK_SCORE_MIN,
};
use serde_json::Number;
use std::collections::BTreeSet;

pub const DEFAULT_ID: &str = "unknown";
pub const DEFAULT_COMPANY: &str = "Unknown";

/// Normalize one candidate into a [`VendorRecord`].
///
/// - `id` defaults to `"unknown"` (blank counts as missing), `name` to the id,
///   `company` to `"Unknown"`, `gdpr_compliant` to `false`
/// - `risk_score` defaults to 5, is rounded, then clamped into `[1, 10]`
/// - `category` outside the closed set becomes [`Category::Other`]
/// - domains are lowercased, empty entries dropped, result sorted and deduplicated
/// - top-level source passengers move under `_import_metadata`
/// - `tier` is kept when it names a known tier, otherwise `standard`
pub fn normalize(candidate: CandidateVendor) -> VendorRecord {
    let passengers = candidate.passengers();

    let id = candidate
        .id
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| DEFAULT_ID.to_string());

    let name = candidate.name.unwrap_or_else(|| id.clone());

    let import_metadata = candidate
        .import_metadata
        .unwrap_or_default()
        .overlay(passengers);

    VendorRecord {
        domains: normalize_domains(&candidate.domains),
        name,
        company: candidate
            .company
            .unwrap_or_else(|| DEFAULT_COMPANY.to_string()),
        category: candidate
            .category
            .as_deref()
            .map(Category::parse_or_other)
            .unwrap_or_default(),
        gdpr_compliant: candidate.gdpr_compliant.unwrap_or(false),
        risk_score: clamp_risk_score(candidate.risk_score.as_ref()),
        tier: candidate
            .tier
            .as_deref()
            .and_then(Tier::parse)
            .unwrap_or_default(),
        privacy_policy: candidate.privacy_policy,
        extra: candidate.extra,
        import_metadata: if import_metadata.is_empty() {
            None
        } else {
            Some(import_metadata)
        },
        id,
    }
}

/// Lowercase, drop empty entries, sort ascending, dedupe
pub fn normalize_domains(domains: &[String]) -> BTreeSet<String> {
    domains
        .iter()
        .filter(|d| !d.is_empty())
        .map(|d| d.to_lowercase())
        .collect()
}

/// Round to nearest, clamp into `[1, 10]`; missing or non-finite → 5
pub fn clamp_risk_score(score: Option<&Number>) -> u8 {
    let raw = match score.and_then(Number::as_f64) {
        Some(value) if value.is_finite() => value.round(),
        _ => return RISK_SCORE_DEFAULT,
    };

    raw.clamp(f64::from(RISK_SCORE_MIN), f64::from(RISK_SCORE_MAX)) as u8
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vendor::ImportMetadata;
    use serde_json::json;

    fn candidate(value: serde_json::Value) -> CandidateVendor {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_fills_defaults() {
        let record = normalize(CandidateVendor::default());

        assert_eq!(record.id, "unknown");
        assert_eq!(record.name, "unknown");
        assert_eq!(record.company, "Unknown");
        assert_eq!(record.category, Category::Other);
        assert!(!record.gdpr_compliant);
        assert_eq!(record.risk_score, 5);
        assert_eq!(record.tier, Tier::Standard);
        assert!(record.domains.is_empty());
        assert!(record.import_metadata.is_none());
    }

    #[test]
    fn test_name_defaults_to_id() {
        let record = normalize(CandidateVendor::new("hotjar", &["hotjar.com"]));
        assert_eq!(record.name, "hotjar");

        let record = normalize(candidate(json!({ "id": "", "name": "Nameless" })));
        assert_eq!(record.id, "unknown");
        assert_eq!(record.name, "Nameless");
    }

    #[test]
    fn test_risk_score_clamped() {
        let low = normalize(candidate(json!({ "id": "a", "risk_score": -3 })));
        let high = normalize(candidate(json!({ "id": "b", "risk_score": 47 })));
        let zero = normalize(candidate(json!({ "id": "c", "risk_score": 0 })));
        let inside = normalize(candidate(json!({ "id": "d", "risk_score": 7 })));

        assert_eq!(low.risk_score, 1);
        assert_eq!(high.risk_score, 10);
        assert_eq!(zero.risk_score, 1);
        assert_eq!(inside.risk_score, 7);
    }

    #[test]
    fn test_risk_score_fractional_rounds() {
        let record = normalize(candidate(json!({ "id": "a", "risk_score": 7.6 })));
        assert_eq!(record.risk_score, 8);

        let record = normalize(candidate(json!({ "id": "a", "risk_score": 10.4 })));
        assert_eq!(record.risk_score, 10);
    }

    #[test]
    fn test_unknown_category_becomes_other() {
        let record = normalize(candidate(json!({ "id": "a", "category": "cryptomining" })));
        assert_eq!(record.category, Category::Other);

        let record = normalize(candidate(json!({ "id": "a", "category": "heatmaps" })));
        assert_eq!(record.category, Category::Heatmaps);
    }

    #[test]
    fn test_domains_lowercased_sorted_deduped() {
        let record = normalize(candidate(json!({
            "id": "a",
            "domains": ["T.Acme.com", "", "acme.COM", null, "acme.com"]
        })));

        let domains: Vec<&str> = record.domains.iter().map(String::as_str).collect();
        assert_eq!(domains, vec!["acme.com", "t.acme.com"]);
    }

    #[test]
    fn test_passengers_relocated() {
        let record = normalize(candidate(json!({
            "id": "doubleclick-net",
            "domains": ["doubleclick.net"],
            "source": "duckduckgo-tracker-radar",
            "prevalence": 0.52,
            "fingerprinting": 2,
            "sites": 1200,
            "privacy_policy": "https://policies.google.com/privacy"
        })));

        let encoded = serde_json::to_value(&record).unwrap();
        assert!(encoded.get("prevalence").is_none());
        assert!(encoded.get("source").is_none());
        assert_eq!(encoded["_import_metadata"]["sites"], json!(1200));
        assert_eq!(
            encoded["privacy_policy"],
            json!("https://policies.google.com/privacy")
        );

        let meta = record.import_metadata.expect("metadata present");
        assert_eq!(meta.source.as_deref(), Some("duckduckgo-tracker-radar"));
        assert_eq!(meta.prevalence, Some(0.52));
        assert_eq!(meta.fingerprinting, Some(2));
    }

    #[test]
    fn test_existing_metadata_kept_and_overlaid() {
        let record = normalize(candidate(json!({
            "id": "a",
            "website": "https://a.example/",
            "_import_metadata": { "source": "disconnect", "website": "https://old.example/" }
        })));

        assert_eq!(
            record.import_metadata,
            Some(ImportMetadata {
                source: Some("disconnect".into()),
                website: Some("https://a.example/".into()),
                ..Default::default()
            })
        );
    }

    #[test]
    fn test_tier_kept_or_defaulted() {
        let record = normalize(candidate(json!({ "id": "a", "tier": "basic" })));
        assert_eq!(record.tier, Tier::Basic);

        let record = normalize(candidate(json!({ "id": "a", "tier": "platinum" })));
        assert_eq!(record.tier, Tier::Standard);
    }

    #[test]
    fn test_input_left_untouched() {
        let input = candidate(json!({ "id": "A", "domains": ["UPPER.com"], "risk_score": 99 }));
        let before = input.clone();
        let _ = normalize(input.clone());
        assert_eq!(input, before);
    }

    #[test]
    fn test_normalize_is_stable() {
        let record = normalize(candidate(json!({
            "id": "acme",
            "domains": ["Acme.com"],
            "category": "nope",
            "risk_score": 12,
            "description": "kept"
        })));
        let again = normalize(CandidateVendor::from(record.clone()));
        assert_eq!(record, again);
    }
}
