//! Lottery configuration

use serde::{Deserialize, Serialize};

use crate::error::{LotteryError, LotteryResult};

/// Default ticket space (1..=1,000,000)
pub const DEFAULT_TICKET_SPACE: u64 = 1_000_000;

/// Shape of the reveal strip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealLayout {
    /// Number of slots in a strip
    pub strip_length: usize,
    /// Slot that always holds the drawn prize
    pub winning_index: usize,
}

impl RevealLayout {
    /// Standard 60-slot strip, winner at slot 35
    pub fn standard() -> Self {
        Self {
            strip_length: 60,
            winning_index: 35,
        }
    }

    /// Short strip for quick previews
    pub fn compact() -> Self {
        Self {
            strip_length: 30,
            winning_index: 20,
        }
    }

    pub fn validate(&self) -> LotteryResult<()> {
        if self.winning_index >= self.strip_length {
            return Err(LotteryError::InvalidLayout {
                strip_length: self.strip_length,
                winning_index: self.winning_index,
            });
        }
        Ok(())
    }
}

impl Default for RevealLayout {
    fn default() -> Self {
        Self::standard()
    }
}

/// Complete lottery configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LotteryConfig {
    /// Total ticket space `T`
    #[serde(default = "default_ticket_space")]
    pub ticket_space: u64,
    /// Reveal strip layout
    #[serde(default)]
    pub layout: RevealLayout,
}

fn default_ticket_space() -> u64 {
    DEFAULT_TICKET_SPACE
}

impl Default for LotteryConfig {
    fn default() -> Self {
        Self {
            ticket_space: DEFAULT_TICKET_SPACE,
            layout: RevealLayout::standard(),
        }
    }
}
