// 🏷️ Vendor Model - Candidate records, normalized records, categories and tiers
//
// A CandidateVendor is whatever an adapter (or an older vendors.json) hands us:
// every field optional, unknown fields carried along. A VendorRecord is the
// normalized shape the merge engine works on and the database persists.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Number, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

// ============================================================================
// CATEGORY
// ============================================================================

/// Closed set of tracker categories.
///
/// Anything outside this set normalizes to [`Category::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Analytics,
    Advertising,
    Social,
    Cdn,
    Payments,
    Chat,
    Heatmaps,
    AbTesting,
    ErrorTracking,
    TagManager,
    Consent,
    Video,
    Fonts,
    Security,
    Push,
    Forms,
    Referral,
    Booking,
    Maps,
    Web3,
    B2bIntelligence,
    EmailMarketing,
    Other,
}

/// Built-in catalog entry for a category (used when the catalog lacks it)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub risk_level: &'static str,
}

impl Category {
    pub const ALL: [Category; 23] = [
        Category::Analytics,
        Category::Advertising,
        Category::Social,
        Category::Cdn,
        Category::Payments,
        Category::Chat,
        Category::Heatmaps,
        Category::AbTesting,
        Category::ErrorTracking,
        Category::TagManager,
        Category::Consent,
        Category::Video,
        Category::Fonts,
        Category::Security,
        Category::Push,
        Category::Forms,
        Category::Referral,
        Category::Booking,
        Category::Maps,
        Category::Web3,
        Category::B2bIntelligence,
        Category::EmailMarketing,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Analytics => "analytics",
            Category::Advertising => "advertising",
            Category::Social => "social",
            Category::Cdn => "cdn",
            Category::Payments => "payments",
            Category::Chat => "chat",
            Category::Heatmaps => "heatmaps",
            Category::AbTesting => "ab_testing",
            Category::ErrorTracking => "error_tracking",
            Category::TagManager => "tag_manager",
            Category::Consent => "consent",
            Category::Video => "video",
            Category::Fonts => "fonts",
            Category::Security => "security",
            Category::Push => "push",
            Category::Forms => "forms",
            Category::Referral => "referral",
            Category::Booking => "booking",
            Category::Maps => "maps",
            Category::Web3 => "web3",
            Category::B2bIntelligence => "b2b_intelligence",
            Category::EmailMarketing => "email_marketing",
            Category::Other => "other",
        }
    }

    /// Exact (case-sensitive) lookup of a category id
    pub fn parse(value: &str) -> Option<Category> {
        Category::ALL.iter().copied().find(|c| c.as_str() == value)
    }

    /// Parse, falling back to the catch-all category
    pub fn parse_or_other(value: &str) -> Category {
        Category::parse(value).unwrap_or(Category::Other)
    }

    pub fn definition(&self) -> CategoryDefinition {
        let (name, description, risk_level) = match self {
            Category::Analytics => (
                "Analytics",
                "Website analytics, audience measurement and performance monitoring",
                "medium",
            ),
            Category::Advertising => (
                "Advertising",
                "Ad networks, ad exchanges, retargeting and conversion pixels",
                "high",
            ),
            Category::Social => (
                "Social Media",
                "Social network widgets, share buttons, comments and social logins",
                "medium",
            ),
            Category::Cdn => (
                "CDN & Content",
                "Content delivery networks and third-party content hosting",
                "low",
            ),
            Category::Payments => (
                "Payments",
                "Payment processors and checkout providers",
                "low",
            ),
            Category::Chat => (
                "Chat & Support",
                "Live chat, customer support and customer interaction widgets",
                "medium",
            ),
            Category::Heatmaps => (
                "Heatmaps & Session Replay",
                "Session recording, heatmaps and user behaviour replay",
                "high",
            ),
            Category::AbTesting => (
                "A/B Testing",
                "Experimentation and personalization platforms",
                "medium",
            ),
            Category::ErrorTracking => (
                "Error Tracking",
                "Crash reporting and application error monitoring",
                "low",
            ),
            Category::TagManager => (
                "Tag Manager",
                "Tag management systems that load other third-party scripts",
                "medium",
            ),
            Category::Consent => (
                "Consent Management",
                "Cookie banners and consent management platforms",
                "low",
            ),
            Category::Video => (
                "Video & Embeds",
                "Embedded video players and other embedded content",
                "medium",
            ),
            Category::Fonts => (
                "Fonts",
                "Hosted web font services",
                "low",
            ),
            Category::Security => (
                "Security & Fingerprinting",
                "Bot detection, anti-fraud, login providers and fingerprinting",
                "high",
            ),
            Category::Push => (
                "Push Notifications",
                "Web push notification services",
                "medium",
            ),
            Category::Forms => (
                "Forms",
                "Hosted forms and survey tools",
                "medium",
            ),
            Category::Referral => (
                "Referral & Affiliate",
                "Affiliate networks and referral tracking",
                "medium",
            ),
            Category::Booking => (
                "Booking",
                "Reservation and scheduling widgets",
                "low",
            ),
            Category::Maps => (
                "Maps",
                "Embedded maps and geolocation services",
                "low",
            ),
            Category::Web3 => (
                "Web3",
                "Wallet connectors and blockchain providers",
                "medium",
            ),
            Category::B2bIntelligence => (
                "B2B Intelligence",
                "Visitor identification and B2B lead enrichment",
                "high",
            ),
            Category::EmailMarketing => (
                "Email Marketing",
                "Email tracking pixels, open tracking, and email marketing platforms",
                "medium",
            ),
            Category::Other => (
                "Other",
                "Trackers that do not fit any other category",
                "medium",
            ),
        };

        CategoryDefinition {
            name,
            description,
            risk_level,
        }
    }
}

impl Default for Category {
    fn default() -> Self {
        Category::Other
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// TIER
// ============================================================================

/// Merge priority class. Premium records always win conflicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Premium,
    Standard,
    Basic,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Premium => "premium",
            Tier::Standard => "standard",
            Tier::Basic => "basic",
        }
    }

    pub fn parse(value: &str) -> Option<Tier> {
        match value {
            "premium" => Some(Tier::Premium),
            "standard" => Some(Tier::Standard),
            "basic" => Some(Tier::Basic),
            _ => None,
        }
    }
}

impl Default for Tier {
    fn default() -> Self {
        Tier::Standard
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// IMPORT METADATA
// ============================================================================

/// Source-only passengers. They never take part in identity or merging and
/// live under `_import_metadata` in the persisted record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportMetadata {
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub prevalence: Option<f64>,

    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub fingerprinting: Option<u8>,

    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub cookies: Option<f64>,

    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub sites: Option<u64>,

    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub disconnect_category: Option<String>,

    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

impl ImportMetadata {
    pub fn is_empty(&self) -> bool {
        self.source.is_none()
            && self.prevalence.is_none()
            && self.fingerprinting.is_none()
            && self.cookies.is_none()
            && self.sites.is_none()
            && self.disconnect_category.is_none()
            && self.website.is_none()
    }

    /// Overlay `newer` on top of `self`; fields set in `newer` win.
    pub fn overlay(self, newer: ImportMetadata) -> ImportMetadata {
        ImportMetadata {
            source: newer.source.or(self.source),
            prevalence: newer.prevalence.or(self.prevalence),
            fingerprinting: newer.fingerprinting.or(self.fingerprinting),
            cookies: newer.cookies.or(self.cookies),
            sites: newer.sites.or(self.sites),
            disconnect_category: newer.disconnect_category.or(self.disconnect_category),
            website: newer.website.or(self.website),
        }
    }
}

// ============================================================================
// CANDIDATE VENDOR (raw input)
// ============================================================================

/// A vendor as produced by a source adapter or read from an existing database.
///
/// Nothing is guaranteed here; [`crate::normalizer::normalize`] turns it into a
/// [`VendorRecord`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateVendor {
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, deserialize_with = "lenient_domains")]
    pub domains: Vec<String>,

    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,

    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub gdpr_compliant: Option<bool>,

    /// Any JSON number or numeric string; rounded and clamped on normalization
    #[serde(
        default,
        deserialize_with = "lenient_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub risk_score: Option<Number>,

    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub tier: Option<String>,

    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub privacy_policy: Option<String>,

    // Top-level passengers as written by the adapters
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub prevalence: Option<f64>,

    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub fingerprinting: Option<u8>,

    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub cookies: Option<f64>,

    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub sites: Option<u64>,

    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub disconnect_category: Option<String>,

    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,

    /// Passengers relocated by an earlier run
    #[serde(
        rename = "_import_metadata",
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub import_metadata: Option<ImportMetadata>,

    /// Curated fields this crate does not interpret (descriptions, DPO links, ...)
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl CandidateVendor {
    /// Minimal candidate: an id and its domains
    pub fn new(id: &str, domains: &[&str]) -> Self {
        CandidateVendor {
            id: Some(id.to_string()),
            domains: domains.iter().map(|d| d.to_string()).collect(),
            ..Default::default()
        }
    }

    /// Top-level passenger fields gathered into one value
    pub fn passengers(&self) -> ImportMetadata {
        ImportMetadata {
            source: self.source.clone(),
            prevalence: self.prevalence,
            fingerprinting: self.fingerprinting,
            cookies: self.cookies,
            sites: self.sites,
            disconnect_category: self.disconnect_category.clone(),
            website: self.website.clone(),
        }
    }
}

// Field-level leniency: a value of the wrong JSON type reads as absent, so one
// bad field never costs the whole record.

/// Any value that does not fit `T` becomes `None`.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(raw).ok())
}

/// A JSON number, or a string holding one (`"7"`, `" 6.5 "`).
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<Number>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => Some(n),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .map(Number::from)
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(Number::from_f64))
        }
        _ => None,
    })
}

/// A list (non-string entries dropped) or a single domain string; anything else is empty.
fn lenient_domains<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(domain) => vec![domain],
        Value::Array(items) => items
            .into_iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}

/// Text that tolerates `null` and non-string values (read as empty).
pub(crate) fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        _ => String::new(),
    })
}

// ============================================================================
// VENDOR RECORD (normalized)
// ============================================================================

/// A normalized vendor, as merged and persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorRecord {
    pub id: String,

    /// Lowercase, ascending, no duplicates
    pub domains: BTreeSet<String>,

    pub name: String,
    pub company: String,
    pub category: Category,
    pub gdpr_compliant: bool,

    /// Always within [`RISK_SCORE_MIN`, `RISK_SCORE_MAX`]
    pub risk_score: u8,

    pub tier: Tier,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub privacy_policy: Option<String>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,

    #[serde(
        rename = "_import_metadata",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub import_metadata: Option<ImportMetadata>,
}

pub const RISK_SCORE_MIN: u8 = 1;
pub const RISK_SCORE_MAX: u8 = 10;
pub const RISK_SCORE_DEFAULT: u8 = 5;

impl VendorRecord {
    pub fn is_premium(&self) -> bool {
        self.tier == Tier::Premium
    }

    /// Everything except the domain set, for "descriptive fields unchanged" checks
    pub fn same_description(&self, other: &VendorRecord) -> bool {
        self.id == other.id
            && self.name == other.name
            && self.company == other.company
            && self.category == other.category
            && self.gdpr_compliant == other.gdpr_compliant
            && self.risk_score == other.risk_score
            && self.tier == other.tier
            && self.privacy_policy == other.privacy_policy
            && self.extra == other.extra
            && self.import_metadata == other.import_metadata
    }
}

impl From<VendorRecord> for CandidateVendor {
    fn from(record: VendorRecord) -> Self {
        CandidateVendor {
            id: Some(record.id),
            domains: record.domains.into_iter().collect(),
            name: Some(record.name),
            company: Some(record.company),
            category: Some(record.category.as_str().to_string()),
            gdpr_compliant: Some(record.gdpr_compliant),
            risk_score: Some(Number::from(record.risk_score)),
            tier: Some(record.tier.as_str().to_string()),
            privacy_policy: record.privacy_policy,
            import_metadata: record.import_metadata,
            extra: record.extra,
            ..Default::default()
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
