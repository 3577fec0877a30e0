// ⚙️ Pipeline Configuration - where the data lives and which sources to merge
//
// Every field has a default, so running without a config file works against
// the conventional `data/` layout. Precedence is applied by the CLI:
// flag > env var > TOML file > default.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::sources::SourceKind;

pub const DEFAULT_CONFIG_FILE: &str = "vendor-db.toml";
pub const DEFAULT_SCHEMA_VERSION: &str = "3.0.0";

// ============================================================================
// TOP-LEVEL CONFIG
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Base directory; every other relative path is resolved against it
    pub data_dir: PathBuf,

    /// Premium input and merged output
    pub database: PathBuf,

    pub schema_version: String,

    /// Keep a timestamped copy of the database before overwriting it
    pub backup: bool,

    /// Extra copies of the merged database (skipped when the parent dir is missing)
    pub distribute_to: Vec<PathBuf>,

    /// Secondary sources, highest priority first
    pub sources: Vec<SourceConfig>,

    pub imports: ImportsConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            data_dir: PathBuf::from("data"),
            database: PathBuf::from("vendors.json"),
            schema_version: DEFAULT_SCHEMA_VERSION.to_string(),
            backup: true,
            distribute_to: vec![PathBuf::from("../packages/core/data/vendors.json")],
            sources: vec![
                SourceConfig {
                    name: "duckduckgo".to_string(),
                    file: PathBuf::from("vendors-duckduckgo.json"),
                    tag: SourceKind::DuckDuckGo.default_tag().to_string(),
                },
                SourceConfig {
                    name: "disconnect".to_string(),
                    file: PathBuf::from("vendors-disconnect.json"),
                    tag: SourceKind::Disconnect.default_tag().to_string(),
                },
            ],
            imports: ImportsConfig::default(),
        }
    }
}

// ============================================================================
// SOURCES & IMPORTS
// ============================================================================

/// One secondary vendor list fed to the merge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    pub name: String,
    pub file: PathBuf,

    /// Suffix for renamed ids, e.g. `ddg`
    pub tag: String,
}

/// Upstream location and adapter output path for one importer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportConfig {
    pub input: PathBuf,
    pub output: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportsConfig {
    pub duckduckgo: ImportConfig,
    pub disconnect: ImportConfig,
}

impl Default for ImportsConfig {
    fn default() -> Self {
        ImportsConfig {
            duckduckgo: ImportConfig {
                input: PathBuf::from("imports/duckduckgo/domains"),
                output: PathBuf::from("vendors-duckduckgo.json"),
            },
            disconnect: ImportConfig {
                input: PathBuf::from("imports/disconnect/services.json"),
                output: PathBuf::from("vendors-disconnect.json"),
            },
        }
    }
}

impl ImportsConfig {
    pub fn for_kind(&self, kind: SourceKind) -> &ImportConfig {
        match kind {
            SourceKind::DuckDuckGo => &self.duckduckgo,
            SourceKind::Disconnect => &self.disconnect,
        }
    }
}

// ============================================================================
// LOAD + VALIDATE
// ============================================================================

impl PipelineConfig {
    pub fn from_toml(input: &str) -> Result<Self> {
        let config: PipelineConfig = toml::from_str(input).context("Invalid pipeline config")?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path`; a missing file means defaults when `required` is false
    pub fn load(path: &Path, required: bool) -> Result<Self> {
        if !path.exists() {
            if required {
                bail!("Config file not found: {}", path.display());
            }
            debug!("No config at {}, using defaults", path.display());
            return Ok(PipelineConfig::default());
        }

        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        PipelineConfig::from_toml(&text)
            .with_context(|| format!("Failed to load config {}", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        let mut tags = HashSet::new();
        let mut names = HashSet::new();

        for source in &self.sources {
            if source.tag.trim().is_empty() {
                bail!("source '{}' has an empty tag", source.name);
            }
            if !tags.insert(source.tag.as_str()) {
                bail!("duplicate source tag '{}'", source.tag);
            }
            if !names.insert(source.name.as_str()) {
                bail!("duplicate source name '{}'", source.name);
            }
        }

        if self.schema_version.trim().is_empty() {
            bail!("schema_version must not be empty");
        }

        Ok(())
    }

    /// Resolve a path against `data_dir` (absolute paths pass through)
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.data_dir.join(path)
        }
    }

    pub fn database_path(&self) -> PathBuf {
        self.resolve(&self.database)
    }
}
