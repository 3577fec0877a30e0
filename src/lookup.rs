// 🔎 Vendor Lookup - which vendor owns this host?
//
// Read-side index over a merged database. Hosts are matched exactly first,
// then by walking up parent domains.

use crate::vendor::VendorRecord;
use std::collections::HashMap;

pub struct VendorIndex {
    vendors: Vec<VendorRecord>,
    by_domain: HashMap<String, usize>,
    by_id: HashMap<String, usize>,
}

impl VendorIndex {
    /// Build the index. If a domain were listed twice the first vendor keeps it.
    pub fn new(vendors: Vec<VendorRecord>) -> Self {
        let mut by_domain = HashMap::new();
        let mut by_id = HashMap::new();

        for (position, vendor) in vendors.iter().enumerate() {
            by_id.entry(vendor.id.clone()).or_insert(position);
            for domain in &vendor.domains {
                by_domain.entry(domain.clone()).or_insert(position);
            }
        }

        VendorIndex {
            vendors,
            by_domain,
            by_id,
        }
    }

    /// `a.b.example.com` → tries `a.b.example.com`, `b.example.com`, `example.com`
    pub fn find(&self, host: &str) -> Option<&VendorRecord> {
        let host = host.trim().trim_end_matches('.').to_lowercase();
        let mut candidate = host.as_str();

        loop {
            if let Some(&position) = self.by_domain.get(candidate) {
                return Some(&self.vendors[position]);
            }
            match candidate.split_once('.') {
                Some((_, parent)) if parent.contains('.') => candidate = parent,
                _ => return None,
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&VendorRecord> {
        self.by_id.get(id).map(|&position| &self.vendors[position])
    }

    pub fn vendors(&self) -> &[VendorRecord] {
        &self.vendors
    }

    pub fn domain_count(&self) -> usize {
        self.by_domain.len()
    }
}
