//! Reveal Sequencer: decoy strip around a known winner

use serde::{Deserialize, Serialize};

use mb_core::Prize;

use crate::config::RevealLayout;
use crate::engine::{Draw, LotteryEngine};
use crate::error::{LotteryError, LotteryResult};
use crate::odds::TicketTable;

/// Bait placed next to the winning slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NearMiss {
    /// Substituted slot (always adjacent to the winning slot)
    pub index: usize,
    /// Prize placed there
    pub bait_id: String,
}

/// Ordered decoy sequence with the winner at a fixed slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevealStrip {
    slots: Vec<Prize>,
    winning_index: usize,
    near_miss: Option<NearMiss>,
}

impl RevealStrip {
    pub fn slots(&self) -> &[Prize] {
        &self.slots
    }

    pub fn slot(&self, index: usize) -> Option<&Prize> {
        self.slots.get(index)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn winning_index(&self) -> usize {
        self.winning_index
    }

    /// Prize at the winning slot
    pub fn winner(&self) -> Option<&Prize> {
        self.slots.get(self.winning_index)
    }

    pub fn near_miss(&self) -> Option<&NearMiss> {
        self.near_miss.as_ref()
    }
}

/// Builds reveal strips for a fixed layout
#[derive(Debug, Clone)]
pub struct RevealSequencer {
    layout: RevealLayout,
}

impl RevealSequencer {
    pub fn new(layout: RevealLayout) -> LotteryResult<Self> {
        layout.validate()?;
        Ok(Self { layout })
    }

    pub fn layout(&self) -> RevealLayout {
        self.layout
    }

    /// Build a strip around `winner`
    ///
    /// The winner may come from a trusted authority or from the engine itself.
    /// Decoys are drawn with the catalog's own odds.
    pub fn build_reveal_strip(
        &self,
        engine: &mut LotteryEngine,
        winner: Prize,
        table: &TicketTable,
    ) -> LotteryResult<RevealStrip> {
        if table.is_empty() {
            return Err(LotteryError::EmptyCatalog);
        }

        let RevealLayout {
            strip_length,
            winning_index,
        } = self.layout;

        let mut slots = Vec::with_capacity(strip_length);
        for index in 0..strip_length {
            if index == winning_index {
                slots.push(winner.clone());
            } else {
                slots.push(engine.draw_decoy(table)?);
            }
        }

        let near_miss = if winner.rarity.is_top_tier() {
            None
        } else {
            self.place_bait(engine, &mut slots, table)
        };

        if let Some(ref miss) = near_miss {
            log::debug!("Near-miss bait '{}' at slot {}", miss.bait_id, miss.index);
        }

        Ok(RevealStrip {
            slots,
            winning_index,
            near_miss,
        })
    }

    /// Self-contained play: draw the winner, then build its strip
    pub fn draw_and_build(
        &self,
        engine: &mut LotteryEngine,
        table: &TicketTable,
    ) -> LotteryResult<(Draw, RevealStrip)> {
        let draw = engine.select_weighted_winner(table)?;
        let strip = self.build_reveal_strip(engine, draw.winner.clone(), table)?;
        Ok((draw, strip))
    }

    /// Overwrite one neighbour of the winning slot with a bait prize
    fn place_bait(
        &self,
        engine: &mut LotteryEngine,
        slots: &mut [Prize],
        table: &TicketTable,
    ) -> Option<NearMiss> {
        let bait = pick_bait(table)?;
        let winning_index = self.layout.winning_index;

        let index = if engine.coin_flip() {
            winning_index.checked_sub(1)?
        } else {
            winning_index + 1
        };

        if index >= slots.len() || index == winning_index {
            return None;
        }

        slots[index] = bait.clone();
        Some(NearMiss {
            index,
            bait_id: bait.id.clone(),
        })
    }
}

/// First top-tier prize in the catalog, otherwise the last entry
fn pick_bait(table: &TicketTable) -> Option<&Prize> {
    table
        .prizes()
        .find(|p| p.rarity.is_top_tier())
        .or_else(|| table.prizes().last())
}
