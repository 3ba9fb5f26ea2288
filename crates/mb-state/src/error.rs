//! Error types for the catalog store

use mb_lottery::LotteryError;
use thiserror::Error;

/// Catalog store error
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Lottery error: {0}")]
    Lottery(#[from] LotteryError),

    #[error("Unknown prize: {0}")]
    UnknownPrize(String),

    #[error("Duplicate prize id: {0}")]
    DuplicatePrize(String),

    #[error("Invalid odds for '{id}': {odds}")]
    InvalidOdds { id: String, odds: f64 },
}

/// Result type alias
pub type CatalogResult<T> = Result<T, CatalogError>;
