//! Catalog import/export schema
//!
//! Backups are a flat JSON list of `{id, name, odds, price, rarity}` records.
//! Re-import only ever touches the `odds` of prizes whose `id` already exists,
//! so only `id` and `odds` are required when reading.

use serde::{Deserialize, Serialize};

use crate::prize::{Prize, Rarity};

/// Exported catalog record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogRecord {
    pub id: String,
    pub name: String,
    pub odds: f64,
    pub price: f64,
    pub rarity: Rarity,
}

impl From<&Prize> for CatalogRecord {
    fn from(prize: &Prize) -> Self {
        Self {
            id: prize.id.clone(),
            name: prize.name.clone(),
            odds: prize.weight,
            price: prize.value,
            rarity: prize.rarity,
        }
    }
}

/// Record as accepted on import
///
/// Unknown fields are ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ImportRecord {
    pub id: String,
    pub odds: f64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub rarity: Option<Rarity>,
}

/// Why an import record cannot be applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordIssue {
    EmptyId,
    NegativeOdds,
    NonFiniteOdds,
}

impl RecordIssue {
    pub fn describe(&self) -> &'static str {
        match self {
            RecordIssue::EmptyId => "empty id",
            RecordIssue::NegativeOdds => "negative odds",
            RecordIssue::NonFiniteOdds => "non-finite odds",
        }
    }
}

impl ImportRecord {
    pub fn validate(&self) -> Result<(), RecordIssue> {
        if self.id.trim().is_empty() {
            return Err(RecordIssue::EmptyId);
        }
        if !self.odds.is_finite() {
            return Err(RecordIssue::NonFiniteOdds);
        }
        if self.odds < 0.0 {
            return Err(RecordIssue::NegativeOdds);
        }
        Ok(())
    }
}

impl From<CatalogRecord> for ImportRecord {
    fn from(record: CatalogRecord) -> Self {
        Self {
            id: record.id,
            odds: record.odds,
            name: Some(record.name),
            price: Some(record.price),
            rarity: Some(record.rarity),
        }
    }
}
