// 📊 Database Statistics - tier, risk and category distribution

use crate::vendor::{Category, Tier, VendorRecord};
use serde::Serialize;
use std::collections::BTreeMap;

/// Risk score buckets: critical 8-10, high 6-7, medium 4-5, low 1-3
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RiskDistribution {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl RiskDistribution {
    fn record(&mut self, risk_score: u8) {
        match risk_score {
            8..=u8::MAX => self.critical += 1,
            6..=7 => self.high += 1,
            4..=5 => self.medium += 1,
            _ => self.low += 1,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DatabaseStats {
    pub total_vendors: usize,
    pub total_domains: usize,
    pub premium: usize,
    pub standard: usize,
    pub basic: usize,
    pub risk: RiskDistribution,
    pub categories: BTreeMap<Category, usize>,
}

impl DatabaseStats {
    pub fn from_vendors(vendors: &[VendorRecord]) -> Self {
        let mut stats = DatabaseStats {
            total_vendors: vendors.len(),
            ..Default::default()
        };

        for vendor in vendors {
            stats.total_domains += vendor.domains.len();

            match vendor.tier {
                Tier::Premium => stats.premium += 1,
                Tier::Standard => stats.standard += 1,
                Tier::Basic => stats.basic += 1,
            }

            stats.risk.record(vendor.risk_score);
            *stats.categories.entry(vendor.category).or_insert(0) += 1;
        }

        stats
    }

    /// Most common categories: count descending, then id ascending
    pub fn top_categories(&self, n: usize) -> Vec<(Category, usize)> {
        let mut ranked: Vec<(Category, usize)> =
            self.categories.iter().map(|(c, n)| (*c, *n)).collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.as_str().cmp(b.0.as_str())));
        ranked.truncate(n);
        ranked
    }

    /// Console report, as printed by `vendor-db stats`
    pub fn render(&self, top: usize) -> String {
        let mut out = String::new();
        out.push_str(&format!("Total vendors:  {}\n", self.total_vendors));
        out.push_str(&format!("  Premium:      {}\n", self.premium));
        out.push_str(&format!("  Standard:     {}\n", self.standard));
        out.push_str(&format!("  Basic:        {}\n", self.basic));
        out.push_str(&format!("Total domains:  {}\n", self.total_domains));
        out.push_str("\nRisk distribution:\n");
        out.push_str(&format!("  Critical (8-10): {}\n", self.risk.critical));
        out.push_str(&format!("  High (6-7):      {}\n", self.risk.high));
        out.push_str(&format!("  Medium (4-5):    {}\n", self.risk.medium));
        out.push_str(&format!("  Low (1-3):       {}\n", self.risk.low));

        let ranked = self.top_categories(top);
        if !ranked.is_empty() {
            out.push_str(&format!("\nTop {} categories:\n", ranked.len()));
            for (category, count) in ranked {
                out.push_str(&format!("  {:<20} {}\n", category.as_str(), count));
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::normalize;
    use crate::vendor::CandidateVendor;
    use serde_json::Number;

    fn vendor(id: &str, category: &str, risk: u8, tier: &str, domains: &[&str]) -> VendorRecord {
        let mut candidate = CandidateVendor::new(id, domains);
        candidate.category = Some(category.to_string());
        candidate.risk_score = Some(Number::from(risk));
        candidate.tier = Some(tier.to_string());
        normalize(candidate)
    }

    fn sample() -> Vec<VendorRecord> {
        vec![
            vendor("a", "advertising", 9, "premium", &["a.com", "a.net"]),
            vendor("b", "advertising", 6, "standard", &["b.com"]),
            vendor("c", "analytics", 4, "standard", &["c.com"]),
            vendor("d", "cdn", 2, "basic", &["d.com"]),
            vendor("e", "analytics", 8, "standard", &["e.com"]),
        ]
    }

    #[test]
    fn test_from_vendors() {
        let stats = DatabaseStats::from_vendors(&sample());

        assert_eq!(stats.total_vendors, 5);
        assert_eq!(stats.total_domains, 6);
        assert_eq!((stats.premium, stats.standard, stats.basic), (1, 3, 1));
        assert_eq!(
            stats.risk,
            RiskDistribution {
                critical: 2,
                high: 1,
                medium: 1,
                low: 1
            }
        );
    }

    #[test]
    fn test_top_categories_tie_break() {
        let stats = DatabaseStats::from_vendors(&sample());

        assert_eq!(
            stats.top_categories(10),
            vec![
                (Category::Advertising, 2),
                (Category::Analytics, 2),
                (Category::Cdn, 1)
            ]
        );
        assert_eq!(stats.top_categories(1), vec![(Category::Advertising, 2)]);
    }

    #[test]
    fn test_empty() {
        let stats = DatabaseStats::from_vendors(&[]);
        assert_eq!(stats, DatabaseStats::default());
        assert!(stats.render(5).contains("Total vendors:  0"));
    }
}
