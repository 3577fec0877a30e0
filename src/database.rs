// 🗄️ Vendor Database - the persisted aggregate around the merged vendor list
//
// Read at merge start (premium list + prior category catalog), rebuilt and
// rewritten at merge end. The previous file is kept as a timestamped backup.

use crate::vendor::{lenient_text, CandidateVendor, Category, VendorRecord};
use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Categories every catalog must carry, even when no vendor uses them yet
pub const REQUIRED_CATEGORIES: [Category; 1] = [Category::EmailMarketing];

// ============================================================================
// DOCUMENT TYPES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryMetadata {
    pub id: String,

    #[serde(default, deserialize_with = "lenient_text")]
    pub name: String,

    #[serde(default, deserialize_with = "lenient_text")]
    pub description: String,

    #[serde(default, deserialize_with = "lenient_text")]
    pub risk_level: String,

    /// Curated extras (icons, colours, ...) carried through untouched
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl CategoryMetadata {
    pub fn builtin(category: Category) -> Self {
        let definition = category.definition();
        CategoryMetadata {
            id: category.as_str().to_string(),
            name: definition.name.to_string(),
            description: definition.description.to_string(),
            risk_level: definition.risk_level.to_string(),
            extra: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorDatabase {
    pub version: String,

    /// UTC, RFC 3339, millisecond precision
    pub last_updated: String,

    pub vendors: Vec<VendorRecord>,

    #[serde(default)]
    pub categories: Vec<CategoryMetadata>,
}

impl VendorDatabase {
    /// Wrap merged vendors with metadata and the extended category catalog
    pub fn assemble(
        vendors: Vec<VendorRecord>,
        prior_categories: Vec<CategoryMetadata>,
        version: &str,
        now: DateTime<Utc>,
    ) -> Self {
        let categories = extend_catalog(prior_categories, &vendors);
        VendorDatabase {
            version: version.to_string(),
            last_updated: format_timestamp(now),
            vendors,
            categories,
        }
    }

    /// Strict load of a database written by this crate
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn total_domains(&self) -> usize {
        self.vendors.iter().map(|v| v.domains.len()).sum()
    }

    /// Pretty JSON with 4-space indentation
    pub fn to_json(&self) -> Result<String> {
        let mut buffer = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
        self.serialize(&mut serializer)
            .context("Failed to serialize vendor database")?;
        String::from_utf8(buffer).context("Serialized database is not UTF-8")
    }

    /// Write to `path`, creating parent directories as needed
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory {}", parent.display()))?;
            }
        }

        fs::write(path, self.to_json()?)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Saved vendor database to {}", path.display());
        Ok(())
    }
}

pub fn format_timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Millis, true)
}

// ============================================================================
// LOADING (tolerant)
// ============================================================================

/// Result of reading a vendor list leniently
#[derive(Debug, Clone, Default)]
pub struct LoadedVendors {
    pub vendors: Vec<CandidateVendor>,

    /// Elements that were not vendor objects
    pub skipped: usize,
}

/// Pull the vendor array out of a bare list or a `{ "vendors": [...] }` document
pub fn extract_vendors(document: Value) -> Option<Vec<Value>> {
    match document {
        Value::Array(items) => Some(items),
        Value::Object(mut map) => match map.remove("vendors") {
            Some(Value::Array(items)) => Some(items),
            _ => None,
        },
        _ => None,
    }
}

/// Read a vendor list. Never fails: missing files, unparseable JSON and
/// unexpected shapes all yield an empty list with a warning.
pub fn load_vendor_list(path: &Path) -> LoadedVendors {
    let mut loaded = LoadedVendors::default();

    if !path.exists() {
        warn!("{} not found, skipping", path.display());
        return loaded;
    }

    let document: Value = match fs::read_to_string(path)
        .map_err(anyhow::Error::from)
        .and_then(|text| serde_json::from_str(&text).map_err(anyhow::Error::from))
    {
        Ok(document) => document,
        Err(e) => {
            warn!("Could not read {}: {}", path.display(), e);
            return loaded;
        }
    };

    let Some(items) = extract_vendors(document) else {
        warn!("Unexpected format in {}", path.display());
        return loaded;
    };

    for item in items {
        if !item.is_object() {
            debug!("Skipping non-object vendor entry in {}", path.display());
            loaded.skipped += 1;
            continue;
        }

        match serde_json::from_value::<CandidateVendor>(item) {
            Ok(vendor) => loaded.vendors.push(vendor),
            Err(e) => {
                debug!("Skipping malformed vendor in {}: {}", path.display(), e);
                loaded.skipped += 1;
            }
        }
    }

    if loaded.skipped > 0 {
        warn!(
            "Skipped {} malformed vendors in {}",
            loaded.skipped,
            path.display()
        );
    }

    loaded
}

/// Category catalog of an existing database; empty when absent or unreadable.
///
/// Entries are read one by one: an entry without a string `id` is dropped
/// with a warning, the rest of the catalog survives.
pub fn load_categories(path: &Path) -> Vec<CategoryMetadata> {
    let Ok(text) = fs::read_to_string(path) else {
        return Vec::new();
    };

    let entries = match serde_json::from_str::<Value>(&text) {
        Ok(mut document) => match document.get_mut("categories").map(Value::take) {
            Some(Value::Array(entries)) => entries,
            Some(Value::Null) | None => return Vec::new(),
            Some(_) => {
                warn!("Ignoring non-list category catalog in {}", path.display());
                return Vec::new();
            }
        },
        Err(_) => return Vec::new(),
    };

    let mut catalog = Vec::with_capacity(entries.len());
    for entry in entries {
        match serde_json::from_value::<CategoryMetadata>(entry) {
            Ok(category) => catalog.push(category),
            Err(e) => warn!("Dropping unreadable category entry in {}: {}", path.display(), e),
        }
    }
    catalog
}

// ============================================================================
// CATEGORY CATALOG
// ============================================================================

/// Append-only catalog update.
///
/// Prior entries keep their order and content. Built-in definitions are
/// appended, in enum order, for every required category and every category
/// used by `vendors` that the catalog does not list yet.
pub fn extend_catalog(
    mut catalog: Vec<CategoryMetadata>,
    vendors: &[VendorRecord],
) -> Vec<CategoryMetadata> {
    let known: HashSet<String> = catalog.iter().map(|c| c.id.clone()).collect();

    let needed: BTreeSet<Category> = vendors
        .iter()
        .map(|v| v.category)
        .chain(REQUIRED_CATEGORIES)
        .collect();

    for category in Category::ALL {
        if needed.contains(&category) && !known.contains(category.as_str()) {
            info!("Added new category: {}", category);
            catalog.push(CategoryMetadata::builtin(category));
        }
    }

    catalog
}

// ============================================================================
// BACKUP, DISTRIBUTION, DIGEST
// ============================================================================

/// `vendors.json` → `vendors-backup-20250101T120000Z.json` in the same directory
pub fn backup_path(path: &Path, now: DateTime<Utc>) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "vendors".to_string());
    let file_name = format!("{}-backup-{}.json", stem, now.format("%Y%m%dT%H%M%SZ"));
    path.with_file_name(file_name)
}

/// Copy the current database aside before it is overwritten
pub fn backup(path: &Path, now: DateTime<Utc>) -> Result<Option<PathBuf>> {
    if !path.exists() {
        return Ok(None);
    }

    let target = backup_path(path, now);
    fs::copy(path, &target).with_context(|| {
        format!("Failed to back up {} to {}", path.display(), target.display())
    })?;
    info!("Backed up existing database to {}", target.display());
    Ok(Some(target))
}

/// Copy `source` to every target whose parent directory already exists
pub fn distribute(source: &Path, targets: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut copied = Vec::new();

    for target in targets {
        let parent_exists = target
            .parent()
            .map_or(false, |p| p.as_os_str().is_empty() || p.is_dir());
        if !parent_exists {
            debug!("Skipping distribution target {} (no parent dir)", target.display());
            continue;
        }

        fs::copy(source, target)
            .with_context(|| format!("Failed to copy database to {}", target.display()))?;
        info!("Copied to: {}", target.display());
        copied.push(target.clone());
    }

    Ok(copied)
}

/// SHA-256 over the canonical (compact) JSON of the vendor list
pub fn content_digest(vendors: &[VendorRecord]) -> String {
    let mut hasher = Sha256::new();
    // Serializing plain data structs into a Vec cannot fail
    let bytes = serde_json::to_vec(vendors).unwrap_or_default();
    hasher.update(&bytes);
    format!("{:x}", hasher.finalize())
}

// ============================================================================
// TESTS
// ============================================================================
