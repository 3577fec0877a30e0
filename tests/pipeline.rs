// End-to-end: upstream files → adapters → merge → assembled database on disk

use chrono::{TimeZone, Utc};
use serde_json::json;
use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::Path;
use tracker_vendor_db::database::{self, VendorDatabase};
use tracker_vendor_db::sources::write_candidates;
use tracker_vendor_db::{
    content_digest, get_adapter, load_categories, load_vendor_list, merge, CandidateVendor,
    Category, SourceKind, SourceList, Tier, VendorIndex, VendorRecord,
};

fn write_json(path: &Path, value: serde_json::Value) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, serde_json::to_string_pretty(&value).unwrap()).unwrap();
}

/// Premium database, a Disconnect services.json and a two-file Tracker Radar dump
fn seed(root: &Path) {
    write_json(
        &root.join("vendors.json"),
        json!({
            "version": "2.0.0",
            "last_updated": "2024-01-01T00:00:00.000Z",
            "vendors": [{
                "id": "google",
                "name": "Google",
                "company": "Alphabet",
                "category": "advertising",
                "domains": ["doubleclick.net"],
                "risk_score": 7,
                "tier": "premium",
                "gdpr_compliant": true,
                "privacy_policy": "https://policies.google.com/privacy"
            }],
            "categories": [{
                "id": "advertising",
                "name": "Ads",
                "description": "Curated by hand",
                "risk_level": "high",
                "icon": "📢"
            }]
        }),
    );

    write_json(
        &root.join("imports/disconnect/services.json"),
        json!({
            "categories": {
                "Advertising": [
                    { "Google": { "http://www.google.com/": ["doubleclick.net", "googlesyndication.com"] } },
                    { "Criteo": { "http://www.criteo.com/": ["criteo.com"] } }
                ]
            }
        }),
    );

    write_json(
        &root.join("imports/duckduckgo/domains/US/criteo.com.json"),
        json!({
            "domain": "criteo.com",
            "owner": { "name": "Criteo SA", "displayName": "Criteo" },
            "prevalence": 0.3,
            "sites": 1200,
            "subdomains": ["static"],
            "categories": ["Advertising"]
        }),
    );
    write_json(
        &root.join("imports/duckduckgo/domains/US/hotjar.com.json"),
        json!({
            "domain": "hotjar.com",
            "owner": { "name": "Hotjar Ltd", "displayName": "Hotjar" },
            "prevalence": 0.05,
            "categories": ["Session Replay"]
        }),
    );
}

/// Run both importers, then merge DuckDuckGo before Disconnect
fn import_and_merge(root: &Path) -> (VendorDatabase, tracker_vendor_db::MergeReport) {
    let ddg = get_adapter(SourceKind::DuckDuckGo)
        .parse(&root.join("imports/duckduckgo/domains"))
        .unwrap();
    write_candidates(&root.join("vendors-duckduckgo.json"), &ddg.vendors).unwrap();

    let dc = get_adapter(SourceKind::Disconnect)
        .parse(&root.join("imports/disconnect/services.json"))
        .unwrap();
    write_candidates(&root.join("vendors-disconnect.json"), &dc.vendors).unwrap();

    let db_path = root.join("vendors.json");
    let premium = load_vendor_list(&db_path);
    let categories = load_categories(&db_path);

    let sources = vec![
        SourceList::new(
            "duckduckgo",
            "ddg",
            load_vendor_list(&root.join("vendors-duckduckgo.json")).vendors,
        ),
        SourceList::new(
            "disconnect",
            "dc",
            load_vendor_list(&root.join("vendors-disconnect.json")).vendors,
        ),
    ];

    let outcome = merge(premium.vendors, sources);
    let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
    let db = VendorDatabase::assemble(outcome.vendors, categories, "3.0.0", now);
    (db, outcome.report)
}

fn assert_domains_unique(vendors: &[VendorRecord]) {
    let mut seen = HashSet::new();
    for vendor in vendors {
        for domain in &vendor.domains {
            assert!(seen.insert(domain.clone()), "{} listed twice", domain);
        }
    }
}

#[test]
fn test_full_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    seed(dir.path());

    let (db, report) = import_and_merge(dir.path());

    let ids: Vec<&str> = db.vendors.iter().map(|v| v.id.as_str()).collect();
    assert_eq!(ids, vec!["criteo-com", "google", "hotjar-com"]);
    assert_domains_unique(&db.vendors);

    // Premium record: only the domain set grew
    let google = &db.vendors[1];
    assert_eq!(google.tier, Tier::Premium);
    assert_eq!(google.name, "Google");
    assert_eq!(google.company, "Alphabet");
    assert!(google.gdpr_compliant);
    assert_eq!(
        google.privacy_policy.as_deref(),
        Some("https://policies.google.com/privacy")
    );
    assert_eq!(
        google.domains,
        BTreeSet::from(["doubleclick.net".to_string(), "googlesyndication.com".to_string()])
    );

    // Disconnect's criteo collapsed into the higher-priority DuckDuckGo record
    let criteo = &db.vendors[0];
    assert_eq!(criteo.name, "Criteo");
    assert_eq!(criteo.category, Category::Advertising);
    assert_eq!(criteo.risk_score, 7);
    assert_eq!(criteo.domains.len(), 2);
    let metadata = criteo.import_metadata.as_ref().unwrap();
    assert_eq!(metadata.source.as_deref(), Some("duckduckgo-tracker-radar"));
    assert_eq!(metadata.sites, Some(1200));

    assert_eq!(db.vendors[2].category, Category::Heatmaps);

    let dc = &report.passes[1];
    assert_eq!((dc.enriched_premium, dc.merged, dc.added), (1, 1, 0));

    // Catalog: curated entry untouched, missing ones appended in enum order
    let catalog: Vec<&str> = db.categories.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(catalog, vec!["advertising", "heatmaps", "email_marketing"]);
    assert_eq!(db.categories[0].name, "Ads");
    assert!(db.categories[0].extra.contains_key("icon"));
}

#[test]
fn test_write_backup_and_reload() {
    let dir = tempfile::tempdir().unwrap();
    seed(dir.path());
    let db_path = dir.path().join("vendors.json");

    let (db, _) = import_and_merge(dir.path());
    let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();

    let backup = database::backup(&db_path, now).unwrap().unwrap();
    assert!(backup.ends_with("vendors-backup-20250601T120000Z.json"));
    db.save(&db_path).unwrap();

    let previous: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&backup).unwrap()).unwrap();
    assert_eq!(previous["version"], "2.0.0");

    let reloaded = VendorDatabase::load(&db_path).unwrap();
    assert_eq!(reloaded, db);
    assert_eq!(reloaded.last_updated, "2025-06-01T12:00:00.000Z");

    let index = VendorIndex::new(reloaded.vendors);
    assert_eq!(index.find("static.criteo.com").unwrap().id, "criteo-com");
    assert_eq!(index.find("ads.googlesyndication.com").unwrap().id, "google");
}

#[test]
fn test_remerge_of_own_output_is_identity() {
    let dir = tempfile::tempdir().unwrap();
    seed(dir.path());

    let (db, _) = import_and_merge(dir.path());
    let as_premium: Vec<CandidateVendor> =
        db.vendors.iter().cloned().map(CandidateVendor::from).collect();

    let again = merge(as_premium, Vec::new());

    assert_eq!(again.vendors.len(), db.vendors.len());
    for (before, after) in db.vendors.iter().zip(&again.vendors) {
        // Pass 0 forces the tier; everything else must survive untouched
        let mut expected = before.clone();
        expected.tier = Tier::Premium;
        assert_eq!(after, &expected);
    }
}

#[test]
fn test_rerun_with_same_sources_is_stable() {
    let dir = tempfile::tempdir().unwrap();
    seed(dir.path());

    let (first, _) = import_and_merge(dir.path());
    first.save(&dir.path().join("vendors.json")).unwrap();

    let (second, report) = import_and_merge(dir.path());

    let ids = |db: &VendorDatabase| -> Vec<(String, BTreeSet<String>)> {
        db.vendors
            .iter()
            .map(|v| (v.id.clone(), v.domains.clone()))
            .collect()
    };
    assert_eq!(ids(&first), ids(&second));
    assert!(report.passes.iter().all(|p| p.added == 0));
    assert_eq!(first.categories, second.categories);
}

#[test]
fn test_merge_is_deterministic() {
    let dir = tempfile::tempdir().unwrap();
    seed(dir.path());

    let (a, _) = import_and_merge(dir.path());
    let (b, _) = import_and_merge(dir.path());

    assert_eq!(content_digest(&a.vendors), content_digest(&b.vendors));
    assert_eq!(a.to_json().unwrap(), b.to_json().unwrap());
}

#[test]
fn test_missing_sources_contribute_nothing() {
    let dir = tempfile::tempdir().unwrap();

    let premium = load_vendor_list(&dir.path().join("vendors.json"));
    let ddg = get_adapter(SourceKind::DuckDuckGo)
        .parse(&dir.path().join("nope"))
        .unwrap();

    let outcome = merge(
        premium.vendors,
        vec![SourceList::new("duckduckgo", "ddg", ddg.vendors)],
    );
    assert!(outcome.vendors.is_empty());

    let db = VendorDatabase::assemble(outcome.vendors, Vec::new(), "3.0.0", Utc::now());
    assert_eq!(db.categories.len(), 1);
    assert_eq!(db.categories[0].id, "email_marketing");
}
