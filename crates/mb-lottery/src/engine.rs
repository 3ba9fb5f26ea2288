//! Lottery Engine: uniform tickets resolved through the ticket table

use std::collections::{BTreeMap, HashMap};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use mb_core::{Prize, Rarity};

use crate::error::{LotteryError, LotteryResult};
use crate::odds::{Resolution, TicketTable};

/// A completed draw
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Draw {
    pub winner: Prize,
    pub ticket: u64,
}

/// Draw statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DrawStats {
    pub total_draws: u64,
    pub wins_by_prize: HashMap<String, u64>,
    pub wins_by_rarity: BTreeMap<Rarity, u64>,
    /// Draws that needed the linear-scan fallback
    pub fallback_resolutions: u64,
}

impl DrawStats {
    /// Observed frequency of a prize in percent
    pub fn frequency(&self, id: &str) -> f64 {
        if self.total_draws == 0 {
            return 0.0;
        }
        let wins = self.wins_by_prize.get(id).copied().unwrap_or(0);
        wins as f64 / self.total_draws as f64 * 100.0
    }

    fn record(&mut self, prize: &Prize, by_scan: bool) {
        self.total_draws += 1;
        *self.wins_by_prize.entry(prize.id.clone()).or_insert(0) += 1;
        *self.wins_by_rarity.entry(prize.rarity).or_insert(0) += 1;
        if by_scan {
            self.fallback_resolutions += 1;
        }
    }
}

/// Weighted Lottery Engine
///
/// Draws a uniform ticket in `[1, T]` and resolves it against a `TicketTable`.
/// Seeded from the OS by default; `seed()` switches to a reproducible stream.
pub struct LotteryEngine {
    /// Random number generator
    rng: StdRng,
    /// Statistics for winner draws (decoys excluded)
    stats: DrawStats,
}

impl LotteryEngine {
    /// Create an engine seeded from the operating system
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
            stats: DrawStats::default(),
        }
    }

    /// Create a reproducible engine
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            stats: DrawStats::default(),
        }
    }

    /// Seed RNG for reproducible results
    pub fn seed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    pub fn stats(&self) -> &DrawStats {
        &self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = DrawStats::default();
    }

    /// Uniform ticket in `[1, ticket_space]`
    pub fn draw_ticket(&mut self, ticket_space: u64) -> u64 {
        self.rng.random_range(1..=ticket_space.max(1))
    }

    /// Draw a winner from the ticketed catalog
    pub fn select_weighted_winner(&mut self, table: &TicketTable) -> LotteryResult<Draw> {
        self.select(table, true)
    }

    /// Same distribution as a winner draw, but left out of the statistics
    pub(crate) fn draw_decoy(&mut self, table: &TicketTable) -> LotteryResult<Prize> {
        self.select(table, false).map(|draw| draw.winner)
    }

    /// Fair coin for presentation choices
    pub(crate) fn coin_flip(&mut self) -> bool {
        self.rng.random_bool(0.5)
    }

    fn select(&mut self, table: &TicketTable, record: bool) -> LotteryResult<Draw> {
        if table.is_empty() {
            return Err(LotteryError::EmptyCatalog);
        }

        let ticket = self.draw_ticket(table.ticket_space());

        let (entry, by_scan) = match table.resolve(ticket) {
            Resolution::Found(_, entry) => (entry, false),
            Resolution::FoundByScan(_, entry) => (entry, true),
            Resolution::NotFound => return Err(LotteryError::TicketNotFound { ticket }),
        };

        if record {
            self.stats.record(&entry.prize, by_scan);
        }

        Ok(Draw {
            winner: entry.prize.clone(),
            ticket,
        })
    }
}

impl Default for LotteryEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::odds::calculate_ticket_ranges;
    use mb_core::DemoCatalog;

    #[test]
    fn test_fallback_resolutions_counted() {
        let mut entries = calculate_ticket_ranges(&DemoCatalog::simple(), 1_000_000)
            .unwrap()
            .entries()
            .to_vec();
        entries.swap(0, 2);
        let table = TicketTable::from_entries_unchecked(entries, 1_000_000);

        let mut engine = LotteryEngine::seeded(11);
        for _ in 0..500 {
            engine.select_weighted_winner(&table).unwrap();
        }

        // Binary search can never land on the outer entries
        let stats = engine.stats();
        let outer: u64 = ["a", "c"]
            .iter()
            .map(|id| stats.wins_by_prize.get(*id).copied().unwrap_or(0))
            .sum();
        assert!(outer > 0);
        assert!(stats.fallback_resolutions >= outer);
        assert!(stats.fallback_resolutions <= stats.total_draws);
        assert_eq!(stats.total_draws, 500);
    }

    #[test]
    fn test_draw_ticket_bounds() {
        let mut engine = LotteryEngine::seeded(7);
        for _ in 0..10_000 {
            let t = engine.draw_ticket(10);
            assert!((1..=10).contains(&t));
        }
        assert_eq!(engine.draw_ticket(1), 1);
    }

    #[test]
    fn test_seeded_reproducible() {
        let table = calculate_ticket_ranges(&DemoCatalog::standard(), 1_000_000).unwrap();
        let mut a = LotteryEngine::seeded(42);
        let mut b = LotteryEngine::seeded(42);
        for _ in 0..100 {
            assert_eq!(
                a.select_weighted_winner(&table).unwrap(),
                b.select_weighted_winner(&table).unwrap()
            );
        }
    }

    #[test]
    fn test_draw_matches_ticket() {
        let table = calculate_ticket_ranges(&DemoCatalog::simple(), 1_000_000).unwrap();
        let mut engine = LotteryEngine::seeded(3);
        for _ in 0..1000 {
            let draw = engine.select_weighted_winner(&table).unwrap();
            let entry = table.get(&draw.winner.id).unwrap();
            assert!(entry.contains(draw.ticket));
        }
    }

    #[test]
    fn test_empty_catalog() {
        let mut engine = LotteryEngine::seeded(1);
        assert_eq!(
            engine.select_weighted_winner(&TicketTable::empty(100)),
            Err(LotteryError::EmptyCatalog)
        );
    }

    #[test]
    fn test_stats() {
        let table = calculate_ticket_ranges(&DemoCatalog::simple(), 1000).unwrap();
        let mut engine = LotteryEngine::seeded(11);
        for _ in 0..500 {
            engine.select_weighted_winner(&table).unwrap();
        }
        engine.draw_decoy(&table).unwrap();

        let stats = engine.stats();
        assert_eq!(stats.total_draws, 500);
        assert_eq!(stats.wins_by_prize.values().sum::<u64>(), 500);
        assert_eq!(stats.wins_by_rarity.values().sum::<u64>(), 500);
        assert_eq!(stats.fallback_resolutions, 0);

        let total: f64 = ["a", "b", "c"].iter().map(|id| stats.frequency(id)).sum();
        assert!((total - 100.0).abs() < 1e-9);

        engine.reset_stats();
        assert_eq!(engine.stats().total_draws, 0);
    }
}
