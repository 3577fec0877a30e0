// 📤 Domain Export - flat domain → vendor table as CSV

use crate::vendor::VendorRecord;
use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomainRow<'a> {
    pub domain: &'a str,
    pub vendor_id: &'a str,
    pub category: &'a str,
    pub risk_score: u8,
    pub tier: &'a str,
}

/// One row per owned domain, sorted by domain
pub fn domain_rows(vendors: &[VendorRecord]) -> Vec<DomainRow<'_>> {
    let mut rows: Vec<DomainRow> = vendors
        .iter()
        .flat_map(|vendor| {
            vendor.domains.iter().map(move |domain| DomainRow {
                domain,
                vendor_id: &vendor.id,
                category: vendor.category.as_str(),
                risk_score: vendor.risk_score,
                tier: vendor.tier.as_str(),
            })
        })
        .collect();
    rows.sort_by(|a, b| a.domain.cmp(b.domain).then_with(|| a.vendor_id.cmp(b.vendor_id)));
    rows
}

pub fn write_domain_rows<W: Write>(writer: W, vendors: &[VendorRecord]) -> Result<usize> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    let rows = domain_rows(vendors);

    for row in &rows {
        csv_writer.serialize(row).context("Failed to write CSV row")?;
    }
    csv_writer.flush().context("Failed to flush CSV output")?;

    Ok(rows.len())
}

pub fn write_domain_csv(path: &Path, vendors: &[VendorRecord]) -> Result<usize> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    let count = write_domain_rows(file, vendors)
        .with_context(|| format!("Failed to export domains to {}", path.display()))?;

    info!("Exported {} domains to {}", count, path.display());
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::normalize;
    use crate::vendor::CandidateVendor;

    #[test]
    fn test_rows_sorted_by_domain() {
        let mut criteo = CandidateVendor::new("criteo", &["criteo.net", "criteo.com"]);
        criteo.category = Some("advertising".to_string());
        let vendors = vec![
            normalize(criteo),
            normalize(CandidateVendor::new("akamai", &["akamai.net"])),
        ];

        let mut out = Vec::new();
        let count = write_domain_rows(&mut out, &vendors).unwrap();
        assert_eq!(count, 3);

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "domain,vendor_id,category,risk_score,tier");
        assert_eq!(lines[1], "akamai.net,akamai,other,5,standard");
        assert_eq!(lines[2], "criteo.com,criteo,advertising,5,standard");
        assert_eq!(lines[3], "criteo.net,criteo,advertising,5,standard");
    }

    #[test]
    fn test_write_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("domains.csv");
        let vendors = vec![normalize(CandidateVendor::new("a", &["a.com"]))];

        assert_eq!(write_domain_csv(&path, &vendors).unwrap(), 1);
        let mut reader = csv::Reader::from_path(&path).unwrap();
        assert_eq!(reader.records().count(), 1);
    }
}
