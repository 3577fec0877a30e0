// 🛡️ vendor-db - build and inspect the tracker vendor database
//
//   vendor-db import duckduckgo     # Tracker Radar dump → vendors-duckduckgo.json
//   vendor-db import disconnect     # services.json → vendors-disconnect.json
//   vendor-db merge                 # premium + sources → vendors.json
//   vendor-db stats | lookup <host> | export-domains <out.csv>

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::{info, warn, Level};

use tracker_vendor_db::config::DEFAULT_CONFIG_FILE;
use tracker_vendor_db::database::{self, VendorDatabase};
use tracker_vendor_db::export::write_domain_csv;
use tracker_vendor_db::logging;
use tracker_vendor_db::sources::write_candidates;
use tracker_vendor_db::{
    get_adapter, load_categories, load_vendor_list, merge, DatabaseStats, PipelineConfig,
    SourceKind, SourceList, VendorIndex,
};

#[derive(Parser)]
#[command(name = "vendor-db")]
#[command(version, about = "Tracker vendor database pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Pipeline config file (TOML)
    #[arg(long, global = true, env = "VENDOR_DB_CONFIG")]
    config: Option<PathBuf>,

    /// Base data directory (overrides the config file)
    #[arg(long, global = true, env = "VENDOR_DB_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert an upstream dataset into a candidate vendor list
    Import {
        #[arg(value_enum)]
        source: ImportSource,

        /// Upstream file or directory (defaults to the configured input)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Where to write the candidate list (defaults to the configured output)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Merge premium and secondary vendor lists into the database
    Merge {
        /// Report what would change without writing anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Show database statistics
    Stats {
        /// Number of categories to list
        #[arg(long, default_value = "10")]
        top: usize,
    },

    /// Find the vendor that owns a host
    Lookup { host: String },

    /// Write the domain → vendor table as CSV
    ExportDomains { output: PathBuf },
}

#[derive(Clone, Copy, ValueEnum)]
enum ImportSource {
    Duckduckgo,
    Disconnect,
}

impl From<ImportSource> for SourceKind {
    fn from(source: ImportSource) -> Self {
        match source {
            ImportSource::Duckduckgo => SourceKind::DuckDuckGo,
            ImportSource::Disconnect => SourceKind::Disconnect,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let config = load_config(&cli)?;

    match cli.command {
        Commands::Import {
            source,
            input,
            output,
        } => run_import(&config, source.into(), input, output),
        Commands::Merge { dry_run } => run_merge(&config, dry_run),
        Commands::Stats { top } => run_stats(&config, top),
        Commands::Lookup { host } => run_lookup(&config, &host),
        Commands::ExportDomains { output } => run_export(&config, &output),
    }
}

fn init_logging(verbose: bool, quiet: bool) {
    let flag = if verbose {
        Some(Level::DEBUG)
    } else if quiet {
        Some(Level::WARN)
    } else {
        None
    };
    logging::init(flag);
}

/// flag > env > TOML > default
fn load_config(cli: &Cli) -> Result<PipelineConfig> {
    let (path, required) = match &cli.config {
        Some(path) => (path.clone(), true),
        None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
    };

    let mut config = PipelineConfig::load(&path, required)?;
    if let Some(data_dir) = &cli.data_dir {
        config.data_dir = data_dir.clone();
    }
    Ok(config)
}

// ============================================================================
// COMMANDS
// ============================================================================

fn run_import(
    config: &PipelineConfig,
    kind: SourceKind,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
) -> Result<()> {
    let defaults = config.imports.for_kind(kind);
    let input = input.unwrap_or_else(|| config.resolve(&defaults.input));
    let output = output.unwrap_or_else(|| config.resolve(&defaults.output));

    let adapter = get_adapter(kind);
    info!("Importing {} (adapter v{})", kind.name(), adapter.version());

    let batch = adapter.parse(&input)?;
    write_candidates(&output, &batch.vendors)?;

    println!("📥 {}", kind.name());
    println!("   Vendors:  {}", batch.vendors.len());
    println!("   Domains:  {}", batch.total_domains());
    println!("   Skipped:  {}", batch.skipped);
    println!("   Output:   {}", output.display());
    Ok(())
}

fn run_merge(config: &PipelineConfig, dry_run: bool) -> Result<()> {
    let db_path = config.database_path();

    let premium = load_vendor_list(&db_path);
    let prior_categories = load_categories(&db_path);
    info!(
        "Loaded {} premium vendors from {}",
        premium.vendors.len(),
        db_path.display()
    );

    let mut sources = Vec::new();
    for source in &config.sources {
        let path = config.resolve(&source.file);
        if !path.exists() {
            warn!("Source '{}' not found at {}, skipping", source.name, path.display());
            continue;
        }
        let loaded = load_vendor_list(&path);
        info!("Loaded {} vendors from {}", loaded.vendors.len(), source.name);
        sources.push(SourceList::new(&source.name, &source.tag, loaded.vendors));
    }

    let outcome = merge(premium.vendors, sources);
    let report = outcome.report.clone();

    let now = Utc::now();
    let db = VendorDatabase::assemble(
        outcome.vendors,
        prior_categories,
        &config.schema_version,
        now,
    );

    if dry_run {
        println!("🔍 Dry run: {}", report.summary());
        print_passes(&report);
        return Ok(());
    }

    if config.backup {
        database::backup(&db_path, now)?;
    }
    db.save(&db_path)?;

    let targets: Vec<PathBuf> = config
        .distribute_to
        .iter()
        .map(|target| config.resolve(target))
        .collect();
    database::distribute(&db_path, &targets)?;

    info!("Content digest: {}", database::content_digest(&db.vendors));

    println!("✅ Merged database: {}", report.summary());
    print_passes(&report);
    println!("   Categories: {}", db.categories.len());
    println!("   Written to: {}", db_path.display());
    Ok(())
}

fn print_passes(report: &tracker_vendor_db::MergeReport) {
    for pass in &report.passes {
        println!(
            "   {:<12} +{} new ({} renamed), {} merged, {} into premium, {} skipped",
            pass.source,
            pass.added,
            pass.renamed,
            pass.merged,
            pass.enriched_premium,
            pass.skipped_no_domains
        );
    }
}

fn load_database(config: &PipelineConfig) -> Result<VendorDatabase> {
    let path = config.database_path();
    VendorDatabase::load(&path)
        .with_context(|| format!("No usable vendor database at {}", path.display()))
}

fn run_stats(config: &PipelineConfig, top: usize) -> Result<()> {
    let db = load_database(config)?;
    let stats = DatabaseStats::from_vendors(&db.vendors);

    println!("📊 Vendor database v{} ({})", db.version, db.last_updated);
    print!("{}", stats.render(top));
    Ok(())
}

fn run_lookup(config: &PipelineConfig, host: &str) -> Result<()> {
    let db = load_database(config)?;
    let index = VendorIndex::new(db.vendors);

    match index.find(host) {
        Some(vendor) => {
            println!("{} → {} ({})", host, vendor.name, vendor.id);
            println!("   Company:  {}", vendor.company);
            println!("   Category: {}", vendor.category);
            println!("   Risk:     {}/10", vendor.risk_score);
            println!("   Tier:     {}", vendor.tier);
        }
        None => println!("{} → no known vendor", host),
    }
    Ok(())
}

fn run_export(config: &PipelineConfig, output: &Path) -> Result<()> {
    let db = load_database(config)?;
    let count = write_domain_csv(output, &db.vendors)?;
    println!("📤 Exported {} domains to {}", count, output.display());
    Ok(())
}
