//! Immutable catalog snapshots
//!
//! The ticket table derived from a snapshot is cached inside the snapshot
//! itself. Replacing the snapshot therefore drops the cache in the same
//! pointer swap, and a reader holding a snapshot always sees prizes and
//! ticket ranges that belong together.

use std::sync::{Arc, OnceLock};

use serde::Serialize;

use mb_core::{CatalogRecord, Prize};
use mb_lottery::{LotteryError, OddsReport, TicketTable, calculate_ticket_ranges, validate_odds};

/// One published version of the catalog
#[derive(Debug, Serialize)]
pub struct CatalogSnapshot {
    version: u64,
    ticket_space: u64,
    prizes: Vec<Prize>,
    #[serde(skip)]
    table: OnceLock<Result<Arc<TicketTable>, LotteryError>>,
}

impl CatalogSnapshot {
    pub(crate) fn new(version: u64, ticket_space: u64, prizes: Vec<Prize>) -> Self {
        Self {
            version,
            ticket_space,
            prizes,
            table: OnceLock::new(),
        }
    }

    /// Monotonic version, bumped by every mutation
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn ticket_space(&self) -> u64 {
        self.ticket_space
    }

    pub fn prizes(&self) -> &[Prize] {
        &self.prizes
    }

    pub fn len(&self) -> usize {
        self.prizes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prizes.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Prize> {
        self.prizes.iter().find(|p| p.id == id)
    }

    /// Ticket table for this version, computed on first use
    pub fn ticket_table(&self) -> Result<Arc<TicketTable>, LotteryError> {
        self.table
            .get_or_init(|| {
                log::debug!("Computing ticket table for catalog v{}", self.version);
                calculate_ticket_ranges(&self.prizes, self.ticket_space).map(Arc::new)
            })
            .clone()
    }

    /// Whether the ticket table has been computed yet
    pub fn is_table_cached(&self) -> bool {
        self.table.get().is_some()
    }

    pub fn odds_report(&self) -> OddsReport {
        validate_odds(&self.prizes)
    }

    pub fn records(&self) -> Vec<CatalogRecord> {
        self.prizes.iter().map(CatalogRecord::from).collect()
    }
}
