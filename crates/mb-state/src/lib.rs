//! mb-state: Reactive catalog store
//!
//! Publish/subscribe container for the prize catalog:
//! - Atomic snapshot swap on every mutation (readers never see a half-updated catalog)
//! - Ticket table cached per snapshot, invalidated by the swap
//! - Subscriptions released on drop
//! - JSON import/export and file backup of `{id, name, odds, price, rarity}` records

mod error;
mod snapshot;
mod store;

pub use error::*;
pub use snapshot::*;
pub use store::*;
