//! Batch draw simulator
//!
//! Runs large numbers of draws in parallel to check that empirical
//! frequencies converge on the configured odds. Each chunk owns a ChaCha8
//! stream seeded from `seed + chunk`, so reports are reproducible no matter
//! how rayon schedules the chunks.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::Serialize;

use crate::error::{LotteryError, LotteryResult};
use crate::odds::TicketTable;

/// Draws per parallel chunk
pub const SIM_CHUNK_SIZE: u64 = 100_000;

/// Per-prize simulation outcome
#[derive(Debug, Clone, Serialize)]
pub struct PrizeOutcome {
    pub id: String,
    pub hits: u64,
    /// Configured odds in percent
    pub configured_odds: f64,
    /// Observed frequency in percent
    pub observed_odds: f64,
    /// `observed - configured`, percentage points
    pub deviation: f64,
}

/// Simulation summary
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub draws: u64,
    pub seed: u64,
    pub outcomes: Vec<PrizeOutcome>,
    /// Tickets that resolved to nothing (expected 0)
    pub unresolved: u64,
    /// Largest absolute deviation, percentage points
    pub max_abs_deviation: f64,
}

impl SimulationReport {
    pub fn outcome(&self, id: &str) -> Option<&PrizeOutcome> {
        self.outcomes.iter().find(|o| o.id == id)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Run `draws` draws against `table`
pub fn simulate(table: &TicketTable, draws: u64, seed: u64) -> LotteryResult<SimulationReport> {
    if table.is_empty() {
        return Err(LotteryError::EmptyCatalog);
    }

    let ticket_space = table.ticket_space().max(1);
    let chunks = draws.div_ceil(SIM_CHUNK_SIZE);
    let width = table.len();

    let (counts, unresolved) = (0..chunks)
        .into_par_iter()
        .map(|chunk| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(chunk));
            let n = SIM_CHUNK_SIZE.min(draws - chunk * SIM_CHUNK_SIZE);
            let mut counts = vec![0u64; width];
            let mut unresolved = 0u64;

            for _ in 0..n {
                let ticket = rng.random_range(1..=ticket_space);
                match table.resolve(ticket).index() {
                    Some(index) => counts[index] += 1,
                    None => unresolved += 1,
                }
            }
            (counts, unresolved)
        })
        .reduce(
            || (vec![0u64; width], 0u64),
            |(mut acc, miss_a), (part, miss_b)| {
                for (a, b) in acc.iter_mut().zip(part) {
                    *a += b;
                }
                (acc, miss_a + miss_b)
            },
        );

    let outcomes: Vec<PrizeOutcome> = table
        .entries()
        .iter()
        .zip(&counts)
        .map(|(entry, &hits)| {
            let observed_odds = if draws > 0 {
                hits as f64 / draws as f64 * 100.0
            } else {
                0.0
            };
            PrizeOutcome {
                id: entry.prize.id.clone(),
                hits,
                configured_odds: entry.normalized_odds,
                observed_odds,
                deviation: observed_odds - entry.normalized_odds,
            }
        })
        .collect();

    let max_abs_deviation = outcomes
        .iter()
        .map(|o| o.deviation.abs())
        .fold(0.0, f64::max);

    if unresolved > 0 {
        log::warn!("{} simulated tickets resolved to no prize", unresolved);
    }
    log::info!(
        "Simulated {} draws (seed {}), max deviation {:.4} pp",
        draws,
        seed,
        max_abs_deviation
    );

    Ok(SimulationReport {
        draws,
        seed,
        outcomes,
        unresolved,
        max_abs_deviation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::odds::calculate_ticket_ranges;
    use mb_core::DemoCatalog;

    #[test]
    fn test_simulation_deterministic() {
        let table = calculate_ticket_ranges(&DemoCatalog::standard(), 1_000_000).unwrap();
        let a = simulate(&table, 250_000, 99).unwrap();
        let b = simulate(&table, 250_000, 99).unwrap();

        let hits_a: Vec<u64> = a.outcomes.iter().map(|o| o.hits).collect();
        let hits_b: Vec<u64> = b.outcomes.iter().map(|o| o.hits).collect();
        assert_eq!(hits_a, hits_b);
        assert_eq!(hits_a.iter().sum::<u64>(), 250_000);
        assert_eq!(a.unresolved, 0);
    }

    #[test]
    fn test_simulation_partial_chunk() {
        let table = calculate_ticket_ranges(&DemoCatalog::simple(), 1000).unwrap();
        let report = simulate(&table, 12_345, 1).unwrap();
        assert_eq!(report.outcomes.iter().map(|o| o.hits).sum::<u64>(), 12_345);
    }

    #[test]
    fn test_simulation_zero_draws() {
        let table = calculate_ticket_ranges(&DemoCatalog::simple(), 1000).unwrap();
        let report = simulate(&table, 0, 1).unwrap();
        assert_eq!(report.draws, 0);
        assert!(report.outcomes.iter().all(|o| o.hits == 0));
    }

    #[test]
    fn test_simulation_empty_table() {
        assert!(simulate(&TicketTable::empty(10), 10, 0).is_err());
    }
}
