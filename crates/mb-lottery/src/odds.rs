//! Odds Normalizer: weights to ticket ranges
//!
//! Turns raw prize weights into a partition of the integer ticket space
//! `[1, T]`. Ranges follow catalog order, are contiguous, never overlap, and
//! cover the whole space: the last drawable prize absorbs rounding drift.

use serde::{Deserialize, Serialize};

use mb_core::Prize;

use crate::error::{LotteryError, LotteryResult};

/// Tolerance for the 100-sum weight convention
pub const ODDS_SUM_EPSILON: f64 = 0.01;

/// Guards `floor()` against shares like 0.7 * 1e6 landing a hair below the integer
const TICKET_FLOOR_EPSILON: f64 = 1e-7;

/// A prize with its slice of the ticket space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketedPrize {
    pub prize: Prize,
    /// First ticket (inclusive)
    pub ticket_start: u64,
    /// Last ticket (inclusive); `ticket_start - 1` for an empty range
    pub ticket_end: u64,
    /// Configured share in percent
    pub normalized_odds: f64,
}

impl TicketedPrize {
    /// Number of tickets owned
    pub fn ticket_count(&self) -> u64 {
        (self.ticket_end + 1).saturating_sub(self.ticket_start)
    }

    pub fn contains(&self, ticket: u64) -> bool {
        ticket >= self.ticket_start && ticket <= self.ticket_end
    }

    /// Realised share of the ticket space in percent
    pub fn effective_odds(&self, ticket_space: u64) -> f64 {
        if ticket_space == 0 {
            return 0.0;
        }
        self.ticket_count() as f64 / ticket_space as f64 * 100.0
    }
}

/// Outcome of looking a ticket up in a `TicketTable`
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolution<'a> {
    /// Found by binary search
    Found(usize, &'a TicketedPrize),
    /// Binary search missed but the linear scan found it
    FoundByScan(usize, &'a TicketedPrize),
    /// No range contains the ticket
    NotFound,
}

impl<'a> Resolution<'a> {
    pub fn prize(&self) -> Option<&'a TicketedPrize> {
        match *self {
            Resolution::Found(_, p) | Resolution::FoundByScan(_, p) => Some(p),
            Resolution::NotFound => None,
        }
    }

    pub fn index(&self) -> Option<usize> {
        match *self {
            Resolution::Found(i, _) | Resolution::FoundByScan(i, _) => Some(i),
            Resolution::NotFound => None,
        }
    }
}

/// Ticketed catalog: the partition of `[1, T]`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TicketTable {
    entries: Vec<TicketedPrize>,
    ticket_space: u64,
    total_weight: f64,
}

impl TicketTable {
    /// Table with no prizes; every draw against it fails with `EmptyCatalog`
    pub fn empty(ticket_space: u64) -> Self {
        Self {
            entries: Vec::new(),
            ticket_space,
            total_weight: 0.0,
        }
    }

    /// Table with entries taken as-is, partition invariants unchecked
    #[cfg(test)]
    pub(crate) fn from_entries_unchecked(entries: Vec<TicketedPrize>, ticket_space: u64) -> Self {
        Self {
            entries,
            ticket_space,
            total_weight: 100.0,
        }
    }

    pub fn entries(&self) -> &[TicketedPrize] {
        &self.entries
    }

    pub fn ticket_space(&self) -> u64 {
        self.ticket_space
    }

    pub fn total_weight(&self) -> f64 {
        self.total_weight
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&TicketedPrize> {
        self.entries.iter().find(|e| e.prize.id == id)
    }

    pub fn prizes(&self) -> impl Iterator<Item = &Prize> {
        self.entries.iter().map(|e| &e.prize)
    }

    /// Look up the range containing `ticket`
    ///
    /// Binary search over the range-sorted entries. A miss falls back to a
    /// linear scan and logs a consistency warning; given the partition
    /// invariants the fallback should never find anything the search missed.
    pub fn resolve(&self, ticket: u64) -> Resolution<'_> {
        let search = self.entries.binary_search_by(|entry| {
            if ticket < entry.ticket_start {
                std::cmp::Ordering::Greater
            } else if ticket > entry.ticket_end {
                std::cmp::Ordering::Less
            } else {
                std::cmp::Ordering::Equal
            }
        });

        if let Ok(index) = search {
            return Resolution::Found(index, &self.entries[index]);
        }

        match self.entries.iter().position(|e| e.contains(ticket)) {
            Some(index) => {
                log::warn!(
                    "Ticket {} resolved by linear scan (binary search missed), table is inconsistent",
                    ticket
                );
                Resolution::FoundByScan(index, &self.entries[index])
            }
            None => {
                log::warn!(
                    "Ticket {} not covered by any range (space 1..={})",
                    ticket,
                    self.ticket_space
                );
                Resolution::NotFound
            }
        }
    }
}

/// Resolve a ticket against a ticketed catalog
pub fn resolve_ticket(ticket: u64, table: &TicketTable) -> Option<&TicketedPrize> {
    table.resolve(ticket).prize()
}

/// Partition `[1, ticket_space]` among `prizes` in catalog order
///
/// - Negative and non-finite weights count as zero and get an empty range.
/// - Every positive weight gets at least one ticket.
/// - The last drawable prize is extended to `ticket_space`.
pub fn calculate_ticket_ranges(prizes: &[Prize], ticket_space: u64) -> LotteryResult<TicketTable> {
    if prizes.is_empty() {
        return Err(LotteryError::EmptyCatalog);
    }

    let weights: Vec<f64> = prizes.iter().map(Prize::effective_weight).collect();
    let total_weight: f64 = weights.iter().sum();

    if total_weight <= 0.0 || !total_weight.is_finite() {
        return Err(LotteryError::TotalWeightNotPositive {
            total: total_weight,
        });
    }

    let drawable = weights.iter().filter(|&&w| w > 0.0).count();
    if ticket_space < drawable as u64 {
        return Err(LotteryError::TicketSpaceTooSmall {
            ticket_space,
            required: drawable,
        });
    }

    let normalized: Vec<f64> = weights.iter().map(|w| w / total_weight * 100.0).collect();

    let mut counts: Vec<u64> = weights
        .iter()
        .zip(&normalized)
        .map(|(&weight, &odds)| {
            if weight <= 0.0 {
                return 0;
            }
            let share = (odds / 100.0 * ticket_space as f64 + TICKET_FLOOR_EPSILON).floor() as u64;
            share.max(1)
        })
        .collect();

    rebalance_overflow(&mut counts, ticket_space);

    // `drawable > 0` is implied by total_weight > 0
    let last_drawable = weights.iter().rposition(|&w| w > 0.0).unwrap_or(prizes.len() - 1);

    let mut entries = Vec::with_capacity(prizes.len());
    let mut next_start = 1u64;

    for (index, prize) in prizes.iter().enumerate() {
        let ticket_start = next_start;
        let ticket_end = if index == last_drawable {
            ticket_space
        } else {
            ticket_start + counts[index] - 1
        };

        entries.push(TicketedPrize {
            prize: prize.clone(),
            ticket_start,
            ticket_end,
            normalized_odds: normalized[index],
        });

        next_start = ticket_end + 1;
    }

    log::debug!(
        "Ticket table built: {} prizes ({} drawable) over 1..={}",
        entries.len(),
        drawable,
        ticket_space
    );

    Ok(TicketTable {
        entries,
        ticket_space,
        total_weight,
    })
}

/// Take any surplus created by minimum-one bumps from the largest allocations
fn rebalance_overflow(counts: &mut [u64], ticket_space: u64) {
    let allocated: u64 = counts.iter().sum();
    if allocated <= ticket_space {
        return;
    }

    let mut surplus = allocated - ticket_space;
    log::warn!(
        "Minimum-ticket bumps overflow the ticket space by {}, rebalancing",
        surplus
    );

    while surplus > 0 {
        let Some((index, &largest)) = counts.iter().enumerate().max_by_key(|&(_, c)| *c) else {
            break;
        };
        let reducible = largest.saturating_sub(1);
        if reducible == 0 {
            break;
        }
        let take = reducible.min(surplus);
        counts[index] -= take;
        surplus -= take;
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// VALIDATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Non-fatal finding about a catalog's weights
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OddsWarning {
    /// Weight is zero: the prize will never be drawn
    ZeroWeight { id: String },
    /// Weight is negative: invalid, treated as zero
    NegativeWeight { id: String, weight: f64 },
    /// Weight is NaN or infinite: invalid, treated as zero
    NonFiniteWeight { id: String },
    /// Weights do not add up to 100
    SumDeviation { total: f64 },
}

impl OddsWarning {
    pub fn describe(&self) -> String {
        match self {
            OddsWarning::ZeroWeight { id } => format!("{id}: zero weight, will never be drawn"),
            OddsWarning::NegativeWeight { id, weight } => {
                format!("{id}: negative weight {weight}, treated as zero")
            }
            OddsWarning::NonFiniteWeight { id } => {
                format!("{id}: non-finite weight, treated as zero")
            }
            OddsWarning::SumDeviation { total } => {
                format!("weights sum to {total:.4}, not 100 (normalized anyway)")
            }
        }
    }
}

/// Result of `validate_odds`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OddsReport {
    /// Sum of effective weights
    pub total_weight: f64,
    pub warnings: Vec<OddsWarning>,
}

impl OddsReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn deviates_from_hundred(&self) -> bool {
        self.warnings
            .iter()
            .any(|w| matches!(w, OddsWarning::SumDeviation { .. }))
    }
}

/// Flag suspicious weights without failing
pub fn validate_odds(prizes: &[Prize]) -> OddsReport {
    let mut warnings = Vec::new();

    for prize in prizes {
        let w = prize.weight;
        if !w.is_finite() {
            warnings.push(OddsWarning::NonFiniteWeight {
                id: prize.id.clone(),
            });
        } else if w < 0.0 {
            warnings.push(OddsWarning::NegativeWeight {
                id: prize.id.clone(),
                weight: w,
            });
        } else if w == 0.0 {
            warnings.push(OddsWarning::ZeroWeight {
                id: prize.id.clone(),
            });
        }
    }

    let total_weight: f64 = prizes.iter().map(Prize::effective_weight).sum();
    if (total_weight - 100.0).abs() > ODDS_SUM_EPSILON {
        log::warn!(
            "Catalog weights sum to {:.4} instead of 100, normalizing",
            total_weight
        );
        warnings.push(OddsWarning::SumDeviation {
            total: total_weight,
        });
    }

    OddsReport {
        total_weight,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use mb_core::{DemoCatalog, Rarity};

    fn prize(id: &str, weight: f64) -> Prize {
        Prize::new(id, id.to_uppercase(), Rarity::Common, weight)
    }

    fn assert_partition(table: &TicketTable) {
        let mut expected_start = 1;
        let mut total = 0;
        for entry in table.entries() {
            assert_eq!(entry.ticket_start, expected_start, "{}", entry.prize.id);
            total += entry.ticket_count();
            expected_start = entry.ticket_end + 1;
        }
        assert_eq!(total, table.ticket_space());
        assert_eq!(expected_start, table.ticket_space() + 1);
    }

    #[test]
    fn test_reference_ranges() {
        let prizes = vec![prize("a", 70.0), prize("b", 20.0), prize("c", 10.0)];
        let table = calculate_ticket_ranges(&prizes, 1_000_000).unwrap();

        let e = table.entries();
        assert_eq!((e[0].ticket_start, e[0].ticket_end), (1, 700_000));
        assert_eq!((e[1].ticket_start, e[1].ticket_end), (700_001, 900_000));
        assert_eq!((e[2].ticket_start, e[2].ticket_end), (900_001, 1_000_000));

        assert_eq!(resolve_ticket(700_000, &table).unwrap().prize.id, "a");
        assert_eq!(resolve_ticket(700_001, &table).unwrap().prize.id, "b");
        assert_eq!(resolve_ticket(1_000_000, &table).unwrap().prize.id, "c");
    }

    #[test]
    fn test_normalized_odds_sum_to_hundred() {
        let table = calculate_ticket_ranges(&DemoCatalog::standard(), 1_000_000).unwrap();
        let sum: f64 = table.entries().iter().map(|e| e.normalized_odds).sum();
        assert_abs_diff_eq!(sum, 100.0, epsilon = 1e-9);
        assert_partition(&table);
    }

    #[test]
    fn test_unnormalized_weights() {
        let prizes = vec![prize("x", 3.0), prize("y", 1.0)];
        let table = calculate_ticket_ranges(&prizes, 1000).unwrap();
        assert_abs_diff_eq!(table.entries()[0].normalized_odds, 75.0, epsilon = 1e-12);
        assert_eq!(table.entries()[0].ticket_count(), 750);
        assert_eq!(table.entries()[1].ticket_count(), 250);
    }

    #[test]
    fn test_tiny_weight_gets_one_ticket() {
        let prizes = vec![prize("big", 1_000_000.0), prize("tiny", 0.0001), prize("mid", 50.0)];
        let table = calculate_ticket_ranges(&prizes, 1000).unwrap();
        assert_eq!(table.get("tiny").unwrap().ticket_count(), 1);
        assert_partition(&table);
    }

    #[test]
    fn test_rounding_drift_absorbed_by_last() {
        let prizes = vec![prize("a", 1.0), prize("b", 1.0), prize("c", 1.0)];
        let table = calculate_ticket_ranges(&prizes, 100).unwrap();
        assert_eq!(table.entries()[0].ticket_count(), 33);
        assert_eq!(table.entries()[1].ticket_count(), 33);
        assert_eq!(table.entries()[2].ticket_count(), 34);
        assert_partition(&table);
    }

    #[test]
    fn test_bump_overflow_rebalanced() {
        let mut prizes = vec![prize("whale", 1e9)];
        for i in 0..9 {
            prizes.push(prize(&format!("p{i}"), 1e-6));
        }
        let table = calculate_ticket_ranges(&prizes, 10).unwrap();
        for entry in table.entries() {
            assert_eq!(entry.ticket_count(), 1, "{}", entry.prize.id);
        }
        assert_partition(&table);
    }

    #[test]
    fn test_zero_weight_never_drawable() {
        let prizes = vec![prize("a", 5.0), prize("ghost", 0.0), prize("b", 5.0), prize("tail", 0.0)];
        let table = calculate_ticket_ranges(&prizes, 100).unwrap();

        assert_eq!(table.get("ghost").unwrap().ticket_count(), 0);
        assert_eq!(table.get("tail").unwrap().ticket_count(), 0);
        assert_eq!(table.get("b").unwrap().ticket_end, 100);
        assert_partition(&table);

        for ticket in 1..=100 {
            let id = &resolve_ticket(ticket, &table).unwrap().prize.id;
            assert!(id == "a" || id == "b");
        }
    }

    #[test]
    fn test_negative_weight_treated_as_zero() {
        let prizes = vec![prize("a", 10.0), prize("neg", -5.0)];
        let table = calculate_ticket_ranges(&prizes, 50).unwrap();
        assert_eq!(table.get("neg").unwrap().ticket_count(), 0);
        assert_eq!(table.get("a").unwrap().ticket_count(), 50);
    }

    #[test]
    fn test_configuration_errors() {
        assert_eq!(calculate_ticket_ranges(&[], 100), Err(LotteryError::EmptyCatalog));
        assert_eq!(
            calculate_ticket_ranges(&[prize("a", 0.0), prize("b", -1.0)], 100),
            Err(LotteryError::TotalWeightNotPositive { total: 0.0 })
        );
        assert_eq!(
            calculate_ticket_ranges(&[prize("a", 1.0), prize("b", 1.0)], 1),
            Err(LotteryError::TicketSpaceTooSmall {
                ticket_space: 1,
                required: 2
            })
        );
    }

    #[test]
    fn test_out_of_order_table_falls_back_to_scan() {
        let mut entries = calculate_ticket_ranges(&DemoCatalog::simple(), 1_000_000)
            .unwrap()
            .entries()
            .to_vec();
        entries.swap(0, 2);
        let table = TicketTable::from_entries_unchecked(entries, 1_000_000);

        match table.resolve(100) {
            Resolution::FoundByScan(index, entry) => {
                assert_eq!(index, 2);
                assert_eq!(entry.prize.id, "a");
            }
            other => panic!("expected scan fallback, got {other:?}"),
        }
        assert_eq!(resolve_ticket(950_000, &table).map(|e| e.prize.id.as_str()), Some("c"));
        assert_eq!(table.resolve(1_000_001), Resolution::NotFound);
    }

    #[test]
    fn test_resolve_out_of_space() {
        let table = calculate_ticket_ranges(&[prize("a", 1.0)], 10).unwrap();
        assert_eq!(table.resolve(0), Resolution::NotFound);
        assert_eq!(table.resolve(11), Resolution::NotFound);
        assert!(matches!(table.resolve(5), Resolution::Found(0, _)));
    }

    #[test]
    fn test_effective_odds() {
        let table = calculate_ticket_ranges(&[prize("a", 1.0), prize("b", 3.0)], 8).unwrap();
        assert_abs_diff_eq!(table.entries()[0].effective_odds(8), 25.0);
        assert_abs_diff_eq!(table.entries()[1].effective_odds(8), 75.0);
    }

    #[test]
    fn test_validate_odds() {
        let prizes = vec![prize("a", 60.0), prize("zero", 0.0), prize("neg", -2.0), prize("nan", f64::NAN)];
        let report = validate_odds(&prizes);

        assert_eq!(report.total_weight, 60.0);
        assert!(report.deviates_from_hundred());
        assert!(report.warnings.contains(&OddsWarning::ZeroWeight { id: "zero".into() }));
        assert!(report.warnings.contains(&OddsWarning::NegativeWeight {
            id: "neg".into(),
            weight: -2.0
        }));
        assert!(report.warnings.contains(&OddsWarning::NonFiniteWeight { id: "nan".into() }));

        assert!(validate_odds(&DemoCatalog::standard()).is_clean());
    }
}
