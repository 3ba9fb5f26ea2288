//! Lottery error types

use thiserror::Error;

/// Configuration errors that make a draw impossible
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LotteryError {
    #[error("total weight not positive: {total}")]
    TotalWeightNotPositive { total: f64 },

    #[error("empty catalog")]
    EmptyCatalog,

    #[error("ticket {ticket} not covered by any prize range")]
    TicketNotFound { ticket: u64 },

    #[error("ticket space {ticket_space} too small for {required} drawable prizes")]
    TicketSpaceTooSmall { ticket_space: u64, required: usize },

    #[error("winning index {winning_index} outside strip of length {strip_length}")]
    InvalidLayout {
        strip_length: usize,
        winning_index: usize,
    },
}

/// Result type alias
pub type LotteryResult<T> = Result<T, LotteryError>;
