// Tracker Vendor Database - Core Library
// Exposes all modules for use in CLI, API server, and tests

pub mod config;
pub mod database;  // Assembler: load, catalog, backup, write, distribute
pub mod export;
pub mod logging;   // tracing subscriber setup for the binaries
pub mod lookup;
pub mod merge;     // Priority-ordered reconciliation by domain overlap
pub mod normalizer;
pub mod sources;   // Upstream adapters (Disconnect, DuckDuckGo Tracker Radar)
pub mod stats;
pub mod vendor;

// Re-export commonly used types
pub use config::{PipelineConfig, SourceConfig};
pub use database::{
    content_digest, extend_catalog, load_categories, load_vendor_list, CategoryMetadata,
    VendorDatabase,
};
pub use lookup::VendorIndex;
pub use merge::{merge, MergeOutcome, MergeReport, MergeSession, PassReport, SourceList};
pub use normalizer::normalize;
pub use sources::{get_adapter, SourceAdapter, SourceBatch, SourceKind};
pub use stats::DatabaseStats;
pub use vendor::{CandidateVendor, Category, ImportMetadata, Tier, VendorRecord};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
