//! # mb-lottery: Weighted Lottery Engine
//!
//! Auditable prize selection for mystery boxes, plus the decoy strip shown
//! while the result is revealed.
//!
//! ## Architecture
//!
//! ```text
//! &[Prize] (weights)
//!     │
//!     v
//! calculate_ticket_ranges ──► TicketTable  (contiguous ranges over [1, T])
//!                                 │
//!                                 v
//!                  LotteryEngine::select_weighted_winner ──► Draw { winner, ticket }
//!                                 │
//!                                 v
//!                  RevealSequencer::build_reveal_strip ──► RevealStrip (winner at W)
//! ```
//!
//! Ticket resolution is integer-only, so slot boundaries never depend on
//! floating point comparisons.

pub mod config;
pub mod engine;
pub mod error;
pub mod odds;
pub mod sim;
pub mod strip;

pub use config::*;
pub use engine::*;
pub use error::*;
pub use odds::*;
pub use sim::*;
pub use strip::*;
