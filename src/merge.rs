// 🔀 Merge Engine - Domain-overlap reconciliation across vendor sources
//
// Priority is pass order: the premium list is indexed first, then every
// secondary source is folded in, highest priority first. Two records are the
// same vendor when they share a domain string. The first owned domain found
// (in ascending order) decides which existing record a candidate attaches to.

use crate::normalizer::normalize;
use crate::vendor::{CandidateVendor, Tier, VendorRecord};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};

// ============================================================================
// INPUTS & OUTPUTS
// ============================================================================

/// One secondary source: its candidates plus the tag used to rename colliding ids
#[derive(Debug, Clone)]
pub struct SourceList {
    /// Human-readable source name (for reports)
    pub name: String,

    /// Short suffix appended on id collisions, e.g. `ddg` → `foo-ddg`
    pub tag: String,

    pub vendors: Vec<CandidateVendor>,
}

impl SourceList {
    pub fn new(name: &str, tag: &str, vendors: Vec<CandidateVendor>) -> Self {
        SourceList {
            name: name.to_string(),
            tag: tag.to_string(),
            vendors,
        }
    }
}

/// Counters for a single pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassReport {
    pub source: String,
    pub candidates: usize,

    /// Inserted as brand-new records
    pub added: usize,

    /// Of `added`, how many needed an id rename
    pub renamed: usize,

    /// Attached to an existing premium record
    pub enriched_premium: usize,

    /// Attached to an existing non-premium record
    pub merged: usize,

    /// Dropped because no domain survived normalization
    pub skipped_no_domains: usize,

    /// Domains added to existing owners by enrichment or merge
    pub domains_gained: usize,

    /// Candidate domains left with a different owner than the one the candidate joined
    pub contested_domains: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeReport {
    pub premium_vendors: usize,
    pub premium_domains: usize,
    pub passes: Vec<PassReport>,
    pub total_vendors: usize,
    pub total_domains: usize,
}

impl MergeReport {
    pub fn summary(&self) -> String {
        let merged: usize = self
            .passes
            .iter()
            .map(|p| p.merged + p.enriched_premium)
            .sum();
        format!(
            "{} vendors, {} domains ({} premium, {} collisions resolved)",
            self.total_vendors, self.total_domains, self.premium_vendors, merged
        )
    }
}

#[derive(Debug, Clone)]
pub struct MergeOutcome {
    /// Sorted ascending by id
    pub vendors: Vec<VendorRecord>,
    pub report: MergeReport,
}

// ============================================================================
// MERGE SESSION
// ============================================================================

/// What happened to one candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Domains folded into the premium record with this id
    EnrichedPremium(String),
    /// Domains folded into the non-premium record with this id
    Merged(String),
    /// Inserted under this id (renamed when `renamed` is set)
    Added { id: String, renamed: bool },
    /// Nothing to reconcile on
    Skipped,
}

/// State of one merge invocation.
///
/// Owns the record table and the domain index exclusively; every domain key
/// in `domain_owner` names an id present in `records`.
#[derive(Debug, Default)]
pub struct MergeSession {
    records: BTreeMap<String, VendorRecord>,
    domain_owner: HashMap<String, String>,
    report: MergeReport,
}

impl MergeSession {
    /// Pass 0: index the premium list.
    ///
    /// Premium ids are never renamed and premium domains are assumed unique
    /// across the premium list; neither is checked here.
    pub fn with_premium(premium: Vec<CandidateVendor>) -> Self {
        let mut session = MergeSession::default();

        for candidate in premium {
            let mut record = normalize(candidate);
            record.tier = Tier::Premium;

            for domain in &record.domains {
                session
                    .domain_owner
                    .insert(domain.clone(), record.id.clone());
            }
            session.records.insert(record.id.clone(), record);
        }

        session.report.premium_vendors = session.records.len();
        session.report.premium_domains = session.domain_owner.len();
        info!(
            "Indexed {} premium vendors ({} domains)",
            session.report.premium_vendors, session.report.premium_domains
        );

        session
    }

    /// Fold one secondary source into the session. Call in priority order.
    pub fn absorb(&mut self, source: SourceList) -> &PassReport {
        let mut pass = PassReport {
            source: source.name.clone(),
            candidates: source.vendors.len(),
            ..Default::default()
        };

        for candidate in source.vendors {
            match self.resolve(candidate, &source.tag, &mut pass) {
                Resolution::EnrichedPremium(_) => pass.enriched_premium += 1,
                Resolution::Merged(_) => pass.merged += 1,
                Resolution::Added { renamed, .. } => {
                    pass.added += 1;
                    if renamed {
                        pass.renamed += 1;
                    }
                }
                Resolution::Skipped => pass.skipped_no_domains += 1,
            }
        }

        info!(
            "{}: added {} vendors ({} renamed), merged {} into existing ({} into premium)",
            pass.source,
            pass.added,
            pass.renamed,
            pass.merged + pass.enriched_premium,
            pass.enriched_premium
        );

        self.report.passes.push(pass);
        let last = self.report.passes.len() - 1;
        &self.report.passes[last]
    }

    /// Resolve a single candidate against the current state
    fn resolve(&mut self, candidate: CandidateVendor, tag: &str, pass: &mut PassReport) -> Resolution {
        let mut record = normalize(candidate);
        if record.tier == Tier::Premium {
            record.tier = Tier::Standard;
        }

        if record.domains.is_empty() {
            debug!("Skipping '{}': no domains", record.id);
            return Resolution::Skipped;
        }

        if let Some(owner) = self.first_premium_owner(&record) {
            self.attach_domains(&owner, &record, pass);
            return Resolution::EnrichedPremium(owner);
        }

        if let Some(owner) = self.first_owner(&record) {
            self.attach_domains(&owner, &record, pass);
            return Resolution::Merged(owner);
        }

        let (id, renamed) = self.unique_id(&record.id, tag);
        if renamed {
            debug!("Id collision: '{}' renamed to '{}'", record.id, id);
        }
        record.id = id.clone();

        for domain in &record.domains {
            self.domain_owner.insert(domain.clone(), id.clone());
        }
        self.records.insert(id.clone(), record);

        Resolution::Added { id, renamed }
    }

    /// First domain (ascending) owned by a premium record
    fn first_premium_owner(&self, record: &VendorRecord) -> Option<String> {
        record.domains.iter().find_map(|domain| {
            let owner = self.domain_owner.get(domain)?;
            match self.records.get(owner) {
                Some(existing) if existing.is_premium() => Some(owner.clone()),
                _ => None,
            }
        })
    }

    /// First domain (ascending) owned by any record
    fn first_owner(&self, record: &VendorRecord) -> Option<String> {
        record
            .domains
            .iter()
            .find_map(|domain| self.domain_owner.get(domain).cloned())
    }

    /// Give `owner` every candidate domain nobody owns yet.
    ///
    /// Domains already owned by a different record stay where they are, so a
    /// candidate straddling two owners only extends the first one found.
    fn attach_domains(&mut self, owner: &str, candidate: &VendorRecord, pass: &mut PassReport) {
        let Some(target) = self.records.get_mut(owner) else {
            return;
        };

        for domain in &candidate.domains {
            match self.domain_owner.get(domain) {
                None => {
                    target.domains.insert(domain.clone());
                    self.domain_owner.insert(domain.clone(), owner.to_string());
                    pass.domains_gained += 1;
                }
                Some(current) if current != owner => pass.contested_domains += 1,
                Some(_) => {}
            }
        }
    }

    /// `id`, or `id-tag`, `id-tag-2`, ... whichever is free first
    fn unique_id(&self, id: &str, tag: &str) -> (String, bool) {
        if !self.records.contains_key(id) {
            return (id.to_string(), false);
        }

        let base = format!("{}-{}", id, tag);
        let mut candidate = base.clone();
        let mut n = 2;
        while self.records.contains_key(&candidate) {
            candidate = format!("{}-{}", base, n);
            n += 1;
        }
        (candidate, true)
    }

    /// Id currently owning `domain`
    pub fn owner_of(&self, domain: &str) -> Option<&str> {
        self.domain_owner.get(domain).map(String::as_str)
    }

    pub fn get(&self, id: &str) -> Option<&VendorRecord> {
        self.records.get(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Final collection, sorted by id
    pub fn finish(mut self) -> MergeOutcome {
        let vendors: Vec<VendorRecord> = self.records.into_values().collect();

        self.report.total_vendors = vendors.len();
        self.report.total_domains = vendors.iter().map(|v| v.domains.len()).sum();

        MergeOutcome {
            vendors,
            report: self.report,
        }
    }
}

/// Merge the premium list with secondary sources given in priority order (high → low)
pub fn merge(premium: Vec<CandidateVendor>, sources: Vec<SourceList>) -> MergeOutcome {
    let mut session = MergeSession::with_premium(premium);
    for source in sources {
        session.absorb(source);
    }
    session.finish()
}

// ============================================================================
// TESTS
// ============================================================================
