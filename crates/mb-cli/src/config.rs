//! Application configuration
//!
//! One JSON document aggregating lottery, geometry and timing settings.
//! Every section falls back to its defaults when absent.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use mb_core::{CatalogRecord, DemoCatalog, Prize};
use mb_lottery::LotteryConfig;
use mb_reveal::{RevealTiming, StripGeometry};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub lottery: LotteryConfig,
    pub geometry: StripGeometry,
    pub timing: RevealTiming,
    /// Fixed RNG seed for reproducible runs
    pub seed: Option<u64>,
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Self = serde_json::from_str(&json)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        config.lottery.layout.validate()?;
        Ok(config)
    }

    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}

/// Load a full catalog from exported records, or the demo catalog
pub fn load_catalog(path: Option<&Path>) -> Result<Vec<Prize>> {
    let Some(path) = path else {
        return Ok(DemoCatalog::standard());
    };

    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read catalog {}", path.display()))?;
    let records: Vec<CatalogRecord> = serde_json::from_str(&json)
        .with_context(|| format!("Invalid catalog {}", path.display()))?;

    Ok(records
        .into_iter()
        .map(|r| Prize::new(r.id, r.name, r.rarity, r.odds).with_value(r.price))
        .collect())
}
